//! Typed HTTP client for a running Prompt Studio server.
//!
//! One method per endpoint. Non-success statuses surface as
//! [`AppError::Api`] carrying the server's `{"error": ...}` text when it sent
//! one, or a fixed per-call message otherwise.
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::store::SavedPrompt;

pub use crate::api::handlers::GenerateResponse as GeneratedImage;

#[derive(Clone)]
pub struct StudioClient {
    client: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct MessageBody {
    message: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

impl StudioClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base = base_url.into().trim_end_matches('/').to_string();
        StudioClient { client: Client::new(), base_url: base }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST `/generate`.
    pub async fn generate(&self, prompt: &str) -> AppResult<GeneratedImage> {
        let url = format!("{}/generate", self.base_url);
        tracing::debug!("Requesting generation at {}", url);
        let response = self.client.post(&url).json(&json!({ "prompt": prompt })).send().await?;
        parse_json(response, "Failed to generate image").await
    }

    /// GET `/view-prompts`, newest first.
    pub async fn list_prompts(&self) -> AppResult<Vec<SavedPrompt>> {
        let url = format!("{}/view-prompts", self.base_url);
        let response = self.client.get(&url).send().await?;
        parse_json(response, "Failed to fetch prompts").await
    }

    /// DELETE `/delete-prompt/<id>`, returning the server's confirmation message.
    pub async fn delete_prompt(&self, id: i64) -> AppResult<String> {
        let url = format!("{}/delete-prompt/{}", self.base_url, id);
        let response = self.client.delete(&url).send().await?;
        let body: MessageBody = parse_json(response, "Failed to delete prompt").await?;
        Ok(body.message)
    }

    /// DELETE `/delete-all-prompts`.
    pub async fn delete_all_prompts(&self) -> AppResult<String> {
        let url = format!("{}/delete-all-prompts", self.base_url);
        let response = self.client.delete(&url).send().await?;
        let body: MessageBody = parse_json(response, "Failed to delete all prompts").await?;
        Ok(body.message)
    }

    pub async fn shutdown(&self) -> AppResult<String> {
        let url = format!("{}/shutdown", self.base_url);
        let response = self.client.post(&url).send().await?;
        let body: MessageBody = parse_json(response, "Failed to shut down server").await?;
        Ok(body.message)
    }

    /// Download an image by the `image_url` the server reported.
    pub async fn fetch_image(&self, image_url: &str) -> AppResult<Vec<u8>> {
        let url = self.resolve(image_url);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(api_error(response, "Failed to fetch image").await);
        }
        Ok(response.bytes().await?.to_vec())
    }

    /// Absolute URL for a possibly server-relative path such as `static/x.png`.
    pub fn resolve(&self, image_url: &str) -> String {
        if image_url.starts_with("http://") || image_url.starts_with("https://") {
            image_url.to_string()
        } else {
            format!("{}/{}", self.base_url, image_url.trim_start_matches('/'))
        }
    }
}

async fn parse_json<T: DeserializeOwned>(response: Response, fallback: &str) -> AppResult<T> {
    if response.status().is_success() {
        Ok(response.json().await?)
    } else {
        Err(api_error(response, fallback).await)
    }
}

async fn api_error(response: Response, fallback: &str) -> AppError {
    let status = response.status().as_u16();
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|b| b.error)
        .unwrap_or_else(|_| fallback.to_string());
    AppError::Api { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_relative_image_urls() {
        let client = StudioClient::new("http://127.0.0.1:5001/");
        assert_eq!(client.base_url(), "http://127.0.0.1:5001");
        assert_eq!(client.resolve("static/a.png"), "http://127.0.0.1:5001/static/a.png");
        assert_eq!(client.resolve("/static/a.png"), "http://127.0.0.1:5001/static/a.png");
        assert_eq!(client.resolve("https://cdn.example.com/a.png"), "https://cdn.example.com/a.png");
    }
}
