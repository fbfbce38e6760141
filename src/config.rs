//! Env-driven configuration for the server and the `studio` CLI.
//!
//! Values are read from the process environment; `dotenv` is loaded on demand
//! by the binaries. Defaults match a local development setup.
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub comfyui_url: String,
    pub static_dir: String,
    pub prompts_db: String,
    pub workflow_path: String,
    pub api_host: String,
    pub api_port: String,
    pub generation_timeout_secs: u64,
    pub generation_workers: usize,
    pub studio_url: String,
}

const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_WORKERS: usize = 4;

impl Config {
    pub fn dotenv_load() {
        dotenv::dotenv().ok();
    }

    pub fn new() -> Self {
        Config {
            comfyui_url: var_or("COMFYUI_URL", "http://localhost:8188"),
            static_dir: var_or("STATIC_DIR", "./static"),
            prompts_db: var_or("PROMPTS_DB", "./prompts.json"),
            workflow_path: var_or("WORKFLOW_PATH", "./workflows/txt2img.json"),
            api_host: var_or("API_HOST", "127.0.0.1"),
            api_port: var_or("API_PORT", "5001"),
            generation_timeout_secs: parse_or("GENERATION_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS),
            generation_workers: parse_or("GENERATION_WORKERS", DEFAULT_WORKERS).max(1),
            studio_url: var_or("STUDIO_URL", "http://127.0.0.1:5001"),
        }
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }

    pub fn log_summary(&self) {
        tracing::info!(
            comfyui_url = %self.comfyui_url,
            static_dir = %self.static_dir,
            prompts_db = %self.prompts_db,
            workflow_path = %self.workflow_path,
            timeout_secs = self.generation_timeout_secs,
            workers = self.generation_workers,
            "loaded configuration"
        );
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid {} '{}', falling back to default", key, raw);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_or_falls_back_on_garbage() {
        env::set_var("PROMPT_STUDIO_TEST_WORKERS", "lots");
        assert_eq!(parse_or("PROMPT_STUDIO_TEST_WORKERS", 4usize), 4);
        env::set_var("PROMPT_STUDIO_TEST_WORKERS", " 8 ");
        assert_eq!(parse_or("PROMPT_STUDIO_TEST_WORKERS", 4usize), 8);
        env::remove_var("PROMPT_STUDIO_TEST_WORKERS");
        assert_eq!(parse_or("PROMPT_STUDIO_TEST_WORKERS", 4usize), 4);
    }
}
