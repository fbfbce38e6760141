//! Client-side studio: view state, dialogs and the action controller.
pub mod controller;
pub mod dialogs;
pub mod view;

pub use controller::{Outcome, Studio};
pub use dialogs::{Dialogs, TerminalDialogs};
pub use view::{ImageModal, StudioView};
