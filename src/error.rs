//! Common error type and result alias shared by the client, the server and
//! the ComfyUI bridge.
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Transport-level failure talking to the studio server or ComfyUI.
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Studio server answered with a non-success status.
    #[error("{message} (status {status})")]
    Api { status: u16, message: String },

    #[error("ComfyUI error: {0}")]
    ComfyUI(String),

    #[error("image generation failed: {0}")]
    Generation(String),

    #[error("image generation timed out after {0:?}")]
    Timeout(Duration),

    #[error("prompt construction failed: {0}")]
    PromptConstruction(String),

    /// Rejected user input, surfaced as a 400.
    #[error("{0}")]
    InvalidPrompt(String),

    #[error("{0}")]
    NotFound(String),

    /// Bulk delete that could not remove every image; those records were kept.
    #[error("Deleted {removed} prompts; {failed} images could not be removed and their prompts were kept")]
    PartialDelete { removed: usize, failed: usize },

    #[error("server error: {0}")]
    Server(#[from] hyper::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// Server-reported message for `Api` errors, the display text otherwise.
    pub fn message(&self) -> String {
        match self {
            AppError::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_display_carries_status() {
        let err = AppError::Api { status: 404, message: "Prompt 3 not found".into() };
        assert_eq!(err.to_string(), "Prompt 3 not found (status 404)");
        assert_eq!(err.message(), "Prompt 3 not found");
    }

    #[test]
    fn timeout_display() {
        let err = AppError::Timeout(Duration::from_secs(60));
        assert_eq!(err.to_string(), "image generation timed out after 60s");
    }
}
