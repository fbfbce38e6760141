//! ComfyUI REST client used by the server-side generator.
pub mod client;

pub use client::ComfyUIClient;
