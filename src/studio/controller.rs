//! User actions wired to network calls and view updates.
//!
//! Every mutation re-fetches the saved list, so `view.prompt_list` always
//! reflects the last successful `GET /view-prompts`. Failures go to the
//! alert surface; list fetch failures are only logged.
use crate::client::StudioClient;
use crate::error::AppResult;
use crate::studio::dialogs::Dialogs;
use crate::studio::view::{ImageModal, StudioView};

pub const CONFIRM_DELETE: &str = "Are you sure you want to delete this prompt?";
pub const CONFIRM_DELETE_ALL: &str = "Are you sure you want to delete all prompts?";
pub const GENERATE_FAILED: &str = "Failed to generate image. Please try again.";

/// What an action ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Done,
    /// The user declined the confirmation; nothing was sent.
    Cancelled,
    /// The request failed and the user was alerted.
    Failed,
    /// Nothing to do (e.g. an empty prompt).
    Skipped,
}

pub struct Studio<D: Dialogs> {
    client: StudioClient,
    dialogs: D,
    view: StudioView,
}

impl<D: Dialogs> Studio<D> {
    pub fn new(client: StudioClient, dialogs: D) -> Self {
        Studio { client, dialogs, view: StudioView::new() }
    }

    pub fn view(&self) -> &StudioView {
        &self.view
    }

    pub fn dialogs(&self) -> &D {
        &self.dialogs
    }

    pub fn client(&self) -> &StudioClient {
        &self.client
    }

    pub fn set_prompt_input(&mut self, text: impl Into<String>) {
        self.view.prompt_input = text.into();
    }

    /// Reload the saved list. On failure the previous list is kept.
    pub async fn fetch_saved_prompts(&mut self) -> AppResult<()> {
        match self.client.list_prompts().await {
            Ok(prompts) => {
                tracing::debug!(count = prompts.len(), "fetched saved prompts");
                self.view.prompt_list = prompts;
                Ok(())
            }
            Err(e) => {
                tracing::error!("Error fetching prompts: {}", e);
                Err(e)
            }
        }
    }

    pub fn show_prompt(&mut self, prompt_text: &str, image_url: &str) {
        self.view.prompt_input = prompt_text.to_string();
        self.view.modal = Some(ImageModal {
            prompt_text: prompt_text.to_string(),
            image_url: image_url.to_string(),
        });
    }

    /// Open a listed prompt by id. Returns false if it is not in the list.
    pub fn show_saved(&mut self, id: i64) -> bool {
        let Some(saved) = self.view.find(id).cloned() else { return false };
        self.show_prompt(&saved.prompt_text, &saved.image_url);
        true
    }

    pub fn close_image(&mut self) {
        self.view.modal = None;
    }

    pub async fn delete_prompt(&mut self, id: i64) -> Outcome {
        if !self.dialogs.confirm(CONFIRM_DELETE) {
            return Outcome::Cancelled;
        }
        match self.client.delete_prompt(id).await {
            Ok(message) => {
                self.dialogs.alert(&message);
                self.refresh().await;
                Outcome::Done
            }
            Err(e) => {
                tracing::error!("Error deleting prompt {}: {}", id, e);
                self.dialogs.alert(&format!("Failed to delete prompt: {}", e.message()));
                Outcome::Failed
            }
        }
    }

    pub async fn remove_all_prompts(&mut self) -> Outcome {
        if !self.dialogs.confirm(CONFIRM_DELETE_ALL) {
            return Outcome::Cancelled;
        }
        match self.client.delete_all_prompts().await {
            Ok(message) => {
                self.dialogs.alert(&message);
                self.refresh().await;
                Outcome::Done
            }
            Err(e) => {
                tracing::error!("Error deleting all prompts: {}", e);
                self.dialogs.alert(&format!("Failed to delete all prompts: {}", e.message()));
                Outcome::Failed
            }
        }
    }

    /// Submit the prompt input for generation.
    pub async fn submit(&mut self) -> Outcome {
        let prompt = self.view.prompt_input.trim().to_string();
        if prompt.is_empty() {
            return Outcome::Skipped;
        }

        self.set_loading(true);
        let result = self.client.generate(&prompt).await;
        let outcome = match result {
            Ok(generated) => {
                self.show_prompt(&prompt, &generated.image_url);
                self.refresh().await;
                Outcome::Done
            }
            Err(e) => {
                tracing::error!("Error generating image: {}", e);
                self.dialogs.alert(GENERATE_FAILED);
                Outcome::Failed
            }
        };
        self.set_loading(false);
        outcome
    }

    fn set_loading(&mut self, active: bool) {
        self.view.loading = active;
        self.dialogs.loading(active);
    }

    async fn refresh(&mut self) {
        // Already logged; the mutation itself succeeded.
        let _ = self.fetch_saved_prompts().await;
    }
}
