//! Prompt Studio library
//!
//! Modules:
//! - `client`: Typed HTTP client for the studio server's REST endpoints.
//! - `studio`: View state, dialogs and actions driving the client.
//! - `api`: Axum handlers and router for the studio server.
//! - `store`: JSON-file persistence of saved prompts.
//! - `generator`: Image generation backends (ComfyUI).
//! - `comfyui`: Thin client for ComfyUI REST endpoints.
//! - `workflow`: Loading and editing ComfyUI workflow graphs.
//! - `prompt`: `{{placeholder}}` substitution for workflow templates.
//! - `config`: Env-driven configuration loader.
//! - `error`: Common error type and alias.
//!
//! Re-exports are provided for common types: `Config`, `StudioClient`,
//! `Studio`, `PromptStore` and `ComfyUIClient`.
pub mod api;
pub mod client;
pub mod comfyui;
pub mod config;
pub mod error;
pub mod generator;
pub mod prompt;
pub mod store;
pub mod studio;
pub mod workflow;

pub use client::StudioClient;
pub use comfyui::client::ComfyUIClient;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use store::{PromptStore, SavedPrompt};
pub use studio::Studio;
