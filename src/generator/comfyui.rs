use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::path::Path;
use std::time::Duration;

use crate::comfyui::ComfyUIClient;
use crate::error::{AppError, AppResult};
use crate::prompt::PromptConstructor;
use crate::workflow::graph::{self, execution_error};

use super::ImageGenerator;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);
const FILENAME_PREFIX: &str = "prompt-studio";

/// Runs a text-to-image workflow on a ComfyUI instance.
///
/// The prompt reaches the graph two ways: `{{prompt}}` / `{{seed}}`
/// placeholders are substituted when the workflow has them, otherwise the text
/// is routed into the sampler's positive conditioning node.
pub struct ComfyUiGenerator {
    client: ComfyUIClient,
    workflow: Value,
    constructor: PromptConstructor,
    poll_interval: Duration,
}

impl ComfyUiGenerator {
    pub fn new(client: ComfyUIClient, workflow: Value) -> Self {
        ComfyUiGenerator {
            client,
            workflow,
            constructor: PromptConstructor::new(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub async fn from_workflow_file(client: ComfyUIClient, path: &Path) -> AppResult<Self> {
        let workflow = graph::load_workflow(path).await?;
        tracing::info!(path = %path.display(), "loaded generation workflow");
        Ok(Self::new(client, workflow))
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Build the `{"prompt": graph}` body for one generation.
    pub fn build_request(&self, prompt: &str, seed: u64) -> AppResult<Value> {
        let mut graph = if self.constructor.has_placeholders(&self.workflow) {
            let mut inputs = Map::new();
            inputs.insert("prompt".into(), Value::String(prompt.to_string()));
            inputs.insert("seed".into(), Value::from(seed));
            self.constructor.construct(&self.workflow, &inputs)?
        } else {
            let mut graph = self.workflow.clone();
            let mut params = Map::new();
            params.insert("text_positive".into(), Value::String(prompt.to_string()));
            params.insert("seed".into(), Value::from(seed));
            graph::apply_params_map(&mut graph, &params);
            graph
        };
        graph::ensure_filename_prefix(&mut graph, FILENAME_PREFIX);
        Ok(json!({ "prompt": graph }))
    }

    async fn wait_for_output(&self, prompt_id: &str) -> AppResult<graph::OutputImage> {
        loop {
            let history = self.client.get_history_for(prompt_id).await?;
            if let Some(message) = execution_error(&history, prompt_id) {
                return Err(AppError::Generation(message));
            }
            if let Some(image) = graph::collect_output_images(&history, prompt_id).into_iter().next() {
                return Ok(image);
            }
            if history.get(prompt_id).is_some() {
                // Finished without an image-producing node.
                let completed = history[prompt_id]["status"]["completed"].as_bool().unwrap_or(false);
                if completed {
                    return Err(AppError::Generation("workflow produced no images".to_string()));
                }
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[async_trait]
impl ImageGenerator for ComfyUiGenerator {
    async fn generate(&self, prompt: &str) -> AppResult<Vec<u8>> {
        let body = self.build_request(prompt, random_seed())?;
        let prompt_id = self.client.queue_prompt(body).await?;
        tracing::info!(%prompt_id, "queued generation with ComfyUI");

        let image = self.wait_for_output(&prompt_id).await?;
        tracing::debug!(%prompt_id, filename = %image.filename, "generation finished");
        self.client.get_image(&image.filename, &image.subfolder, &image.kind).await
    }
}

fn random_seed() -> u64 {
    // 53 bits keeps the value exact when ComfyUI round-trips it through JSON floats.
    (uuid::Uuid::new_v4().as_u128() >> 75) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ComfyUIClient {
        ComfyUIClient::new("http://localhost:8188".to_string())
    }

    #[test]
    fn routes_prompt_into_positive_node() {
        let workflow = json!({
            "3": {"class_type": "KSampler", "inputs": {"seed": 0, "positive": ["6", 0], "negative": ["7", 0]}},
            "6": {"class_type": "CLIPTextEncode", "inputs": {"text": ""}},
            "7": {"class_type": "CLIPTextEncode", "inputs": {"text": "blurry"}},
            "9": {"class_type": "SaveImage", "inputs": {}}
        });
        let gen = ComfyUiGenerator::new(client(), workflow);
        let body = gen.build_request("an astronaut riding a horse", 7).unwrap();
        let graph = &body["prompt"];
        assert_eq!(graph["6"]["inputs"]["text"], "an astronaut riding a horse");
        assert_eq!(graph["7"]["inputs"]["text"], "blurry");
        assert_eq!(graph["3"]["inputs"]["seed"], 7);
        assert_eq!(graph["9"]["inputs"]["filename_prefix"], FILENAME_PREFIX);
    }

    #[test]
    fn substitutes_placeholders_when_present() {
        let workflow = json!({
            "3": {"class_type": "KSampler", "inputs": {"seed": "{{seed}}", "positive": ["6", 0]}},
            "6": {"class_type": "CLIPTextEncode", "inputs": {"text": "{{prompt}}, highly detailed"}}
        });
        let gen = ComfyUiGenerator::new(client(), workflow);
        let body = gen.build_request("a castle", 42).unwrap();
        assert_eq!(body["prompt"]["6"]["inputs"]["text"], "a castle, highly detailed");
        assert_eq!(body["prompt"]["3"]["inputs"]["seed"], 42);
    }

    #[tokio::test]
    async fn shipped_workflow_takes_prompt_and_seed() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("workflows/txt2img.json");
        let gen = ComfyUiGenerator::from_workflow_file(client(), &path).await.unwrap();
        let body = gen.build_request("a red bicycle", 5).unwrap();
        let graph = &body["prompt"];
        assert_eq!(graph["6"]["inputs"]["text"], "a red bicycle");
        assert_eq!(graph["3"]["inputs"]["seed"], 5);
        assert_eq!(graph["9"]["inputs"]["filename_prefix"], FILENAME_PREFIX);
    }

    #[test]
    fn seeds_fit_in_53_bits() {
        for _ in 0..32 {
            assert!(random_seed() < (1u64 << 53));
        }
    }
}
