//! Thin HTTP client for the ComfyUI endpoints the generator needs.
//!
//! - `queue_prompt` posts a workflow graph to `/prompt`.
//! - `get_history_for` fetches `/history/<prompt_id>` as JSON.
//! - `get_image` downloads an output via `/view?filename=...`.
use reqwest::Client;
use serde_json::Value;
use crate::error::{AppResult, AppError};

#[derive(Clone)]
pub struct ComfyUIClient {
    client: Client,
    base_url: String,
}

impl ComfyUIClient {
    pub fn new(base_url: String) -> Self {
        let base = base_url.trim_end_matches('/').to_string();
        ComfyUIClient { client: Client::new(), base_url: base }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Queue a `{"prompt": graph}` body and return the prompt id ComfyUI assigned.
    pub async fn queue_prompt(&self, body: Value) -> AppResult<String> {
        let url = format!("{}/prompt", self.base_url);
        tracing::debug!("Queueing prompt at {}", url);

        let response = self.client.post(&url).json(&body).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_else(|_| "Unable to read error body".to_string());
            let error_message = format!("Failed to queue prompt. Status: {}, Body: {}", status, error_body);
            tracing::error!("{}", error_message);
            return Err(AppError::ComfyUI(error_message));
        }

        let json: Value = response.json().await?;
        json.get("prompt_id")
            .and_then(|v| v.as_str())
            .map(String::from)
            .ok_or_else(|| AppError::ComfyUI(format!("Queue response has no prompt_id: {}", json)))
    }

    /// History entry for a single prompt. Empty object while still running.
    pub async fn get_history_for(&self, prompt_id: &str) -> AppResult<Value> {
        let url = format!("{}/history/{}", self.base_url, prompt_id);
        let response = self.client.get(&url).send().await?;
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(AppError::ComfyUI(format!("Failed to get history: {:?}", response.status())))
        }
    }

    /// Fetch output image bytes.
    pub async fn get_image(&self, filename: &str, subfolder: &str, kind: &str) -> AppResult<Vec<u8>> {
        let url = format!("{}/view", self.base_url);
        let response = self.client.get(&url)
            .query(&[("filename", filename), ("subfolder", subfolder), ("type", kind)])
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response.bytes().await?.to_vec())
        } else {
            Err(AppError::ComfyUI(format!("Failed to get image {}: {:?}", filename, response.status())))
        }
    }
}
