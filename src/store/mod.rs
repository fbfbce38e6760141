//! Saved prompt records, persisted as a single JSON document.
//!
//! Every mutation is written through to disk (temp file + rename) before the
//! call returns, so a restarted server sees exactly what clients last saw.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;

use crate::error::{AppError, AppResult};

/// Longest prompt text accepted for storage.
pub const MAX_PROMPT_LEN: usize = 500;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedPrompt {
    pub id: i64,
    pub prompt_text: String,
    pub image_url: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct StoreState {
    next_id: i64,
    prompts: Vec<SavedPrompt>,
}

pub struct PromptStore {
    path: PathBuf,
    state: RwLock<StoreState>,
}

impl PromptStore {
    /// Open the store at `path`, starting empty when the file does not exist.
    pub async fn open(path: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();
        let state = match fs::read_to_string(&path).await {
            Ok(raw) if raw.trim().is_empty() => StoreState::default(),
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoreState::default(),
            Err(e) => return Err(AppError::Io(e)),
        };
        tracing::info!(path = %path.display(), count = state.prompts.len(), "opened prompt store");
        Ok(PromptStore { path, state: RwLock::new(state) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn insert(&self, prompt_text: &str, image_url: &str) -> AppResult<SavedPrompt> {
        if prompt_text.chars().count() > MAX_PROMPT_LEN {
            return Err(AppError::InvalidPrompt(format!(
                "Prompt must be at most {} characters",
                MAX_PROMPT_LEN
            )));
        }
        let mut state = self.state.write().await;
        let mut next = state.clone();
        next.next_id = next.next_id.max(next.prompts.iter().map(|p| p.id).max().unwrap_or(0)) + 1;
        let saved = SavedPrompt {
            id: next.next_id,
            prompt_text: prompt_text.to_string(),
            image_url: image_url.to_string(),
            timestamp: Utc::now(),
        };
        next.prompts.push(saved.clone());
        self.commit(&mut state, next).await?;
        Ok(saved)
    }

    /// All prompts, newest first. Equal timestamps fall back to id order.
    pub async fn list(&self) -> Vec<SavedPrompt> {
        let state = self.state.read().await;
        let mut prompts = state.prompts.clone();
        prompts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        prompts
    }

    pub async fn get(&self, id: i64) -> Option<SavedPrompt> {
        self.state.read().await.prompts.iter().find(|p| p.id == id).cloned()
    }

    pub async fn remove(&self, id: i64) -> AppResult<SavedPrompt> {
        let mut state = self.state.write().await;
        let idx = state
            .prompts
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Prompt {} not found", id)))?;
        let mut next = state.clone();
        let removed = next.prompts.remove(idx);
        self.commit(&mut state, next).await?;
        Ok(removed)
    }

    /// Drop the records with the given ids and return them. Unknown ids are ignored.
    pub async fn remove_many(&self, ids: &[i64]) -> AppResult<Vec<SavedPrompt>> {
        let mut state = self.state.write().await;
        let mut next = state.clone();
        let (removed, kept): (Vec<_>, Vec<_>) =
            next.prompts.into_iter().partition(|p| ids.contains(&p.id));
        next.prompts = kept;
        self.commit(&mut state, next).await?;
        Ok(removed)
    }

    /// Write `next` to disk, then make it the live state. A failed write
    /// leaves the live state untouched.
    async fn commit(&self, live: &mut StoreState, next: StoreState) -> AppResult<()> {
        self.persist(&next).await?;
        *live = next;
        Ok(())
    }

    async fn persist(&self, state: &StoreState) -> AppResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let body = serde_json::to_vec_pretty(state)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, body).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}
