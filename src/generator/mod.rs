//! Image generation backends.
//!
//! The server only needs "prompt in, PNG bytes out"; the ComfyUI bridge is the
//! production backend and tests plug in their own.
use async_trait::async_trait;

use crate::error::AppResult;

pub mod comfyui;

pub use comfyui::ComfyUiGenerator;

#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Render `prompt` and return the encoded image.
    async fn generate(&self, prompt: &str) -> AppResult<Vec<u8>>;
}
