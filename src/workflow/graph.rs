//! Edits on a ComfyUI API-format graph: `{"<node id>": {"class_type", "inputs"}}`.
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;

use crate::error::{AppError, AppResult};

/// Sampler-level inputs a request may override by name.
const SAMPLER_KEYS: &[&str] = &[
    "seed",
    "steps",
    "cfg",
    "sampler_name",
    "scheduler",
    "denoise",
    "width",
    "height",
    "batch_size",
    "ckpt_name",
];

/// Read a workflow file, accepting both a bare graph and `{"prompt": graph}`.
pub async fn load_workflow(path: &Path) -> AppResult<Value> {
    let raw = tokio::fs::read_to_string(path).await?;
    let mut doc: Value = serde_json::from_str(&raw)?;
    let graph = if doc.get("prompt").is_some() { doc["prompt"].take() } else { doc };
    if !is_graph(&graph) {
        return Err(AppError::ComfyUI(format!(
            "{} does not look like an API-format workflow",
            path.display()
        )));
    }
    Ok(graph)
}

pub fn is_graph(graph: &Value) -> bool {
    graph
        .as_object()
        .map(|nodes| nodes.values().any(|n| n.get("class_type").and_then(|c| c.as_str()).is_some()))
        .unwrap_or(false)
}

/// Apply named overrides to every node input carrying that name.
///
/// `text_positive` / `text_negative` are routed through the KSampler's
/// conditioning links; if there is no sampler they go to the first and second
/// CLIPTextEncode nodes in id order.
pub fn apply_params_map(graph: &mut Value, params: &Map<String, Value>) {
    let pos = params.get("text_positive");
    let neg = params.get("text_negative");
    if pos.is_some() || neg.is_some() {
        route_text(graph, pos, neg);
    }

    let overrides: Vec<(&str, &Value)> = SAMPLER_KEYS
        .iter()
        .filter_map(|k| params.get(*k).map(|v| (*k, v)))
        .collect();
    if overrides.is_empty() {
        return;
    }
    let Some(nodes) = graph.as_object_mut() else { return };
    for node in nodes.values_mut() {
        if let Some(inputs) = node.get_mut("inputs").and_then(|i| i.as_object_mut()) {
            for (key, value) in &overrides {
                if inputs.contains_key(*key) {
                    inputs.insert((*key).to_string(), (*value).clone());
                }
            }
        }
    }
}

fn route_text(graph: &mut Value, pos: Option<&Value>, neg: Option<&Value>) {
    let sampler = node_ids_by_class(graph, "KSampler").into_iter().next();
    let mut pos_done = false;
    let mut neg_done = false;

    if let Some(ks) = sampler.as_deref() {
        if let (Some(v), Some(src)) = (pos, linked_source(graph, ks, "positive")) {
            pos_done = set_text(graph, &src, v);
        }
        if let (Some(v), Some(src)) = (neg, linked_source(graph, ks, "negative")) {
            neg_done = set_text(graph, &src, v);
        }
    }

    let encoders = node_ids_by_class(graph, "CLIPTextEncode");
    if let (Some(v), false, Some(first)) = (pos, pos_done, encoders.first()) {
        set_text(graph, first, v);
    }
    if let (Some(v), false, Some(second)) = (neg, neg_done, encoders.get(1)) {
        set_text(graph, second, v);
    }
}

fn node_ids_by_class(graph: &Value, class_type: &str) -> Vec<String> {
    let mut ids: Vec<String> = graph
        .as_object()
        .into_iter()
        .flat_map(|o| o.iter())
        .filter(|(_, node)| node.get("class_type").and_then(|c| c.as_str()) == Some(class_type))
        .map(|(id, _)| id.clone())
        .collect();
    ids.sort_by(|a, b| match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.cmp(b),
    });
    ids
}

/// Node id on the other end of a `[id, slot]` link input.
fn linked_source(graph: &Value, node_id: &str, input: &str) -> Option<String> {
    let link = graph.get(node_id)?.get("inputs")?.get(input)?.as_array()?;
    match link.first()? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn set_text(graph: &mut Value, node_id: &str, text: &Value) -> bool {
    match graph.get_mut(node_id).and_then(|n| n.get_mut("inputs")).and_then(|i| i.as_object_mut()) {
        Some(inputs) => {
            inputs.insert("text".to_string(), text.clone());
            true
        }
        None => false,
    }
}

/// Give every SaveImage node a filename prefix unless the workflow sets one.
pub fn ensure_filename_prefix(graph: &mut Value, prefix: &str) {
    let Some(nodes) = graph.as_object_mut() else { return };
    for node in nodes.values_mut() {
        if node.get("class_type").and_then(|c| c.as_str()) != Some("SaveImage") {
            continue;
        }
        if let Some(inputs) = node.get_mut("inputs").and_then(|i| i.as_object_mut()) {
            inputs
                .entry("filename_prefix")
                .or_insert_with(|| Value::String(prefix.to_string()));
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OutputImage {
    pub filename: String,
    #[serde(default)]
    pub subfolder: String,
    #[serde(rename = "type", default = "default_output_type")]
    pub kind: String,
}

fn default_output_type() -> String {
    "output".to_string()
}

/// Images listed under `history[prompt_id].outputs.*.images`, in node id order.
pub fn collect_output_images(history: &Value, prompt_id: &str) -> Vec<OutputImage> {
    let Some(outputs) = history
        .get(prompt_id)
        .and_then(|entry| entry.get("outputs"))
        .and_then(|o| o.as_object())
    else {
        return Vec::new();
    };
    let mut node_ids: Vec<&String> = outputs.keys().collect();
    node_ids.sort();
    node_ids
        .into_iter()
        .filter_map(|id| outputs[id].get("images").and_then(|i| i.as_array()))
        .flatten()
        .filter_map(|img| serde_json::from_value::<OutputImage>(img.clone()).ok())
        .collect()
}

/// ComfyUI's error text for a prompt that finished unsuccessfully.
pub fn execution_error(history: &Value, prompt_id: &str) -> Option<String> {
    let status = history.get(prompt_id)?.get("status")?;
    if status.get("status_str").and_then(|s| s.as_str()) != Some("error") {
        return None;
    }
    let detail = status
        .get("messages")
        .and_then(|m| m.as_array())
        .and_then(|msgs| {
            msgs.iter().find(|m| m.get(0).and_then(|k| k.as_str()) == Some("execution_error"))
        })
        .and_then(|m| m.get(1))
        .and_then(|d| d.get("exception_message"))
        .and_then(|s| s.as_str())
        .unwrap_or("execution failed");
    Some(detail.trim().to_string())
}
