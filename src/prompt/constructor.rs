//! Placeholder substitution over a JSON template.
//!
//! A string value of the exact form `{{ key }}` is replaced by `inputs[key]`,
//! keeping the input's JSON type (so `{{seed}}` can become a number).
//! Placeholders embedded inside longer strings are expanded as text.
use serde_json::{Map, Value};
use crate::error::{AppResult, AppError};

#[derive(Debug, Default, Clone, Copy)]
pub struct PromptConstructor;

impl PromptConstructor {
    pub fn new() -> Self {
        PromptConstructor
    }

    pub fn construct(&self, template: &Value, inputs: &Map<String, Value>) -> AppResult<Value> {
        let mut constructed = template.clone();
        self.replace_placeholders(&mut constructed, inputs)?;
        Ok(constructed)
    }

    /// True when `template` contains at least one placeholder.
    pub fn has_placeholders(&self, template: &Value) -> bool {
        match template {
            Value::Object(map) => map.values().any(|v| self.has_placeholders(v)),
            Value::Array(arr) => arr.iter().any(|v| self.has_placeholders(v)),
            Value::String(s) => s.find("{{").map_or(false, |i| s[i..].contains("}}")),
            _ => false,
        }
    }

    fn replace_placeholders(&self, value: &mut Value, inputs: &Map<String, Value>) -> AppResult<()> {
        match value {
            Value::Object(map) => {
                for v in map.values_mut() {
                    self.replace_placeholders(v, inputs)?;
                }
            }
            Value::Array(arr) => {
                for v in arr.iter_mut() {
                    self.replace_placeholders(v, inputs)?;
                }
            }
            Value::String(s) => {
                if let Some(key) = whole_placeholder(s) {
                    *value = lookup(inputs, key)?.clone();
                } else if s.contains("{{") {
                    *s = expand_inline(s, inputs)?;
                }
            }
            _ => {}
        }
        Ok(())
    }
}

fn whole_placeholder(s: &str) -> Option<&str> {
    let inner = s.strip_prefix("{{")?.strip_suffix("}}")?;
    if inner.contains("{{") || inner.contains("}}") {
        return None;
    }
    Some(inner.trim())
}

fn lookup<'a>(inputs: &'a Map<String, Value>, key: &str) -> AppResult<&'a Value> {
    inputs
        .get(key)
        .ok_or_else(|| AppError::PromptConstruction(format!("Missing input for placeholder: {}", key)))
}

fn expand_inline(s: &str, inputs: &Map<String, Value>) -> AppResult<String> {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("{{") {
        let Some(len) = rest[start..].find("}}") else { break };
        out.push_str(&rest[..start]);
        let key = rest[start + 2..start + len].trim();
        match lookup(inputs, key)? {
            Value::String(text) => out.push_str(text),
            other => out.push_str(&other.to_string()),
        }
        rest = &rest[start + len + 2..];
    }
    out.push_str(rest);
    Ok(out)
}
