//! View model for the studio screen and its plain-text rendering.
use std::fmt::Write;

use crate::store::SavedPrompt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageModal {
    pub prompt_text: String,
    pub image_url: String,
}

#[derive(Debug, Default, Clone)]
pub struct StudioView {
    /// Contents of the prompt input box.
    pub prompt_input: String,
    /// Saved prompts as of the last successful fetch.
    pub prompt_list: Vec<SavedPrompt>,
    /// Open image modal, if any.
    pub modal: Option<ImageModal>,
    pub loading: bool,
}

impl StudioView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find(&self, id: i64) -> Option<&SavedPrompt> {
        self.prompt_list.iter().find(|p| p.id == id)
    }
}

pub fn render_prompt_list(prompts: &[SavedPrompt]) -> String {
    if prompts.is_empty() {
        return "No saved prompts.\n".to_string();
    }
    let width = prompts.iter().map(|p| p.id.to_string().len()).max().unwrap_or(1);
    let mut out = String::new();
    for p in prompts {
        let _ = writeln!(
            out,
            "[{:>width$}] {}  ({})",
            p.id,
            single_line(&p.prompt_text),
            p.timestamp.format("%Y-%m-%d %H:%M"),
            width = width
        );
    }
    out
}

pub fn render_modal(modal: &ImageModal) -> String {
    format!("Prompt: {}\nImage:  {}\n", modal.prompt_text, modal.image_url)
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
