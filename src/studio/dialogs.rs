//! Confirmation, alert and loading-indicator surfaces.
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::time::Duration;

pub const LOADING_MESSAGE: &str = "Generating image...";

pub trait Dialogs {
    /// Ask a yes/no question; `false` cancels the action.
    fn confirm(&mut self, message: &str) -> bool;
    fn alert(&mut self, message: &str);
    /// Show or hide the loading indicator.
    fn loading(&mut self, _active: bool) {}
}

/// Terminal dialogs: questions on stderr, answers from stdin, alerts on stdout,
/// a spinner on stderr while loading.
#[derive(Debug, Default)]
pub struct TerminalDialogs {
    assume_yes: bool,
    spinner: Option<ProgressBar>,
}

impl TerminalDialogs {
    pub fn new(assume_yes: bool) -> Self {
        TerminalDialogs { assume_yes, spinner: None }
    }

    pub fn is_loading(&self) -> bool {
        self.spinner.is_some()
    }
}

fn spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg} {elapsed}") {
        spinner.set_style(style.tick_strings(&["-", "\\", "|", "/", "-"]));
    }
    spinner.set_message(LOADING_MESSAGE);
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

impl Dialogs for TerminalDialogs {
    fn confirm(&mut self, message: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        eprint!("{} [y/N] ", message);
        io::stderr().flush().ok();
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        is_yes(&answer)
    }

    fn alert(&mut self, message: &str) {
        match &self.spinner {
            Some(spinner) => spinner.suspend(|| println!("{}", message)),
            None => println!("{}", message),
        }
    }

    fn loading(&mut self, active: bool) {
        match (active, self.spinner.take()) {
            (true, Some(existing)) => self.spinner = Some(existing),
            (true, None) => self.spinner = Some(spinner()),
            (false, Some(existing)) => existing.finish_and_clear(),
            (false, None) => {}
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_explicit_yes_confirms() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes(""));
        assert!(!is_yes("no"));
        assert!(!is_yes("yep"));
    }

    #[test]
    fn assume_yes_skips_the_question() {
        assert!(TerminalDialogs::new(true).confirm("Delete everything?"));
    }

    #[test]
    fn loading_toggles_spinner() {
        let mut dialogs = TerminalDialogs::new(false);
        dialogs.loading(true);
        dialogs.loading(true);
        assert!(dialogs.is_loading());
        dialogs.loading(false);
        assert!(!dialogs.is_loading());
        dialogs.loading(false);
        assert!(!dialogs.is_loading());
    }
}
