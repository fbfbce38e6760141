//! Axum request handlers for the HTTP API.
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;

use crate::api::AppState;
use crate::error::{AppError, AppResult};
use crate::store::{SavedPrompt, MAX_PROMPT_LEN};

/// Public prefix under which generated images are served.
pub const STATIC_PREFIX: &str = "static/";

pub async fn root() -> &'static str {
    "Prompt Studio"
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub prompt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub prompt: String,
    pub image_url: String,
}

pub async fn generate(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> AppResult<Json<GenerateResponse>> {
    let Json(payload) = payload.map_err(|rejection| AppError::Api {
        status: rejection.status().as_u16(),
        message: rejection.body_text(),
    })?;
    let prompt = payload.prompt.trim().to_string();
    if prompt.is_empty() {
        return Err(AppError::InvalidPrompt("Prompt is required".to_string()));
    }
    if prompt.chars().count() > MAX_PROMPT_LEN {
        return Err(AppError::InvalidPrompt(format!(
            "Prompt must be at most {} characters",
            MAX_PROMPT_LEN
        )));
    }

    // The time limit covers waiting for a worker as well as the generation.
    let work = async {
        let _permit = state
            .workers
            .acquire()
            .await
            .map_err(|_| AppError::Generation("generation workers closed".to_string()))?;
        tracing::info!(prompt = %prompt, "generating image");
        state.generator.generate(&prompt).await
    };
    let bytes = tokio::time::timeout(state.generation_timeout, work)
        .await
        .map_err(|_| AppError::Timeout(state.generation_timeout))??;

    let file_name = format!("{}.png", uuid::Uuid::new_v4().simple());
    let file_path = state.static_dir.join(&file_name);
    tokio::fs::create_dir_all(&state.static_dir).await?;
    tokio::fs::write(&file_path, &bytes).await?;
    let image_url = format!("{}{}", STATIC_PREFIX, file_name);

    let saved = match state.store.insert(&prompt, &image_url).await {
        Ok(saved) => saved,
        Err(e) => {
            if let Err(rm) = tokio::fs::remove_file(&file_path).await {
                tracing::warn!(path = %file_path.display(), "failed to remove unrecorded image: {}", rm);
            }
            return Err(e);
        }
    };
    tracing::info!(id = saved.id, image_url = %saved.image_url, bytes = bytes.len(), "saved generated image");
    Ok(Json(GenerateResponse { prompt, image_url }))
}

pub async fn view_prompts(State(state): State<Arc<AppState>>) -> Json<Vec<SavedPrompt>> {
    Json(state.store.list().await)
}

pub async fn delete_prompt(
    State(state): State<Arc<AppState>>,
    Path(prompt_id): Path<i64>,
) -> AppResult<Json<Value>> {
    let prompt = state
        .store
        .get(prompt_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Prompt {} not found", prompt_id)))?;
    // Image first: if it cannot be removed the record stays and the delete can be retried.
    remove_image(&state, &prompt).await?;
    state.store.remove(prompt_id).await?;
    tracing::info!(id = prompt_id, "deleted prompt");
    Ok(Json(json!({"message": "Prompt and image deleted successfully"})))
}

pub async fn delete_all_prompts(State(state): State<Arc<AppState>>) -> AppResult<Json<Value>> {
    let prompts = state.store.list().await;
    let mut cleared = Vec::with_capacity(prompts.len());
    let mut failed = 0usize;
    for prompt in &prompts {
        match remove_image(&state, prompt).await {
            Ok(()) => cleared.push(prompt.id),
            Err(e) => {
                tracing::error!(id = prompt.id, "failed to remove image: {}", e);
                failed += 1;
            }
        }
    }
    let removed = state.store.remove_many(&cleared).await?;
    tracing::info!(count = removed.len(), failed, "deleted all prompts");
    if failed > 0 {
        return Err(AppError::PartialDelete { removed: removed.len(), failed });
    }
    Ok(Json(json!({
        "message": format!("Deleted {} prompts and their images successfully", removed.len())
    })))
}

pub async fn shutdown(State(state): State<Arc<AppState>>) -> Json<Value> {
    state.shutdown.notify_one();
    Json(json!({"message": "Server shutting down..."}))
}

/// Disk location of a stored image. Only the final path component of the URL
/// is used, so a record can never point outside the static directory.
pub fn image_path(static_dir: &std::path::Path, image_url: &str) -> Option<PathBuf> {
    let name = image_url.rsplit('/').next().filter(|n| !n.is_empty() && *n != "." && *n != "..")?;
    Some(static_dir.join(name))
}

async fn remove_image(state: &AppState, prompt: &SavedPrompt) -> AppResult<()> {
    let Some(path) = image_path(&state.static_dir, &prompt.image_url) else {
        return Ok(());
    };
    match tokio::fs::remove_file(&path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "image already missing");
            Ok(())
        }
        Err(e) => Err(AppError::Io(e)),
    }
}
