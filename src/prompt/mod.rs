//! `{{placeholder}}` substitution for workflow templates.
pub mod constructor;

pub use constructor::PromptConstructor;
