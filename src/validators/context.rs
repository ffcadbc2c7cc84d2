//! Evaluation inputs and per-step validator configuration

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;

use super::ValidationError;

/// The value a validator evaluates.
///
/// Pipelines start from either raw text or a structured JSON value. Once a
/// step rewrites the value (FIX / FILTER) it is always text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValidationInput {
    Text(String),
    Structured(Value),
}

impl ValidationInput {
    /// Text view of the input; structured values are serialized compactly
    pub fn text(&self) -> Cow<'_, str> {
        match self {
            ValidationInput::Text(s) => Cow::Borrowed(s),
            ValidationInput::Structured(v) => Cow::Owned(v.to_string()),
        }
    }

    /// JSON view of the input; text is parsed
    pub fn json(&self) -> Result<Cow<'_, Value>, serde_json::Error> {
        match self {
            ValidationInput::Text(s) => serde_json::from_str(s).map(Cow::Owned),
            ValidationInput::Structured(v) => Ok(Cow::Borrowed(v)),
        }
    }

    pub fn into_text(self) -> String {
        match self {
            ValidationInput::Text(s) => s,
            ValidationInput::Structured(v) => v.to_string(),
        }
    }

    /// Build from a request value: JSON strings become text, anything else
    /// stays structured
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(s) => ValidationInput::Text(s),
            other => ValidationInput::Structured(other),
        }
    }
}

impl From<String> for ValidationInput {
    fn from(s: String) -> Self {
        ValidationInput::Text(s)
    }
}

impl From<&str> for ValidationInput {
    fn from(s: &str) -> Self {
        ValidationInput::Text(s.to_string())
    }
}

impl From<Value> for ValidationInput {
    fn from(v: Value) -> Self {
        ValidationInput::from_value(v)
    }
}

/// Parameter name → value mapping for one pipeline step.
///
/// Checked against the descriptor's schema when the pipeline is built, so the
/// typed getters only report problems a schema cannot express.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidatorConfig {
    params: Map<String, Value>,
}

impl ValidatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a JSON value; `null` is an empty config
    pub fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Null => Ok(Self::new()),
            Value::Object(params) => Ok(Self { params }),
            other => Err(format!("config must be an object, got {}", json_type_name(&other))),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.params.get(key).filter(|v| !v.is_null())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.params.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.params.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Overlay `self` on top of `defaults` (keys in `self` win)
    pub fn merged_over(&self, defaults: &ValidatorConfig) -> ValidatorConfig {
        let mut params = defaults.params.clone();
        for (k, v) in &self.params {
            params.insert(k.clone(), v.clone());
        }
        ValidatorConfig { params }
    }

    pub fn str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn f64_or(&self, key: &str, default: f64) -> f64 {
        self.get(key).and_then(Value::as_f64).unwrap_or(default)
    }

    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        self.get(key).and_then(Value::as_bool).unwrap_or(default)
    }

    /// A list of strings, given either as an array or as a comma/newline
    /// separated string. Entries are trimmed and empties dropped.
    pub fn string_list(&self, key: &str) -> Result<Vec<String>, ValidationError> {
        match self.get(key) {
            None => Ok(Vec::new()),
            Some(Value::String(s)) => Ok(s
                .split([',', '\n'])
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(|s| s.trim().to_string())
                        .ok_or_else(|| {
                            ValidationError::Config(format!("'{}' must contain only strings", key))
                        })
                })
                .filter(|r| !matches!(r, Ok(s) if s.is_empty()))
                .collect(),
            Some(other) => Err(ValidationError::Config(format!(
                "'{}' must be a list of strings, got {}",
                key,
                json_type_name(other)
            ))),
        }
    }

    pub fn as_value(&self) -> Value {
        Value::Object(self.params.clone())
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_input_views() {
        let structured = ValidationInput::from_value(json!({"a": 1}));
        assert_eq!(structured.text(), r#"{"a":1}"#);
        assert_eq!(*structured.json().unwrap(), json!({"a": 1}));

        let text = ValidationInput::from("not json");
        assert!(text.json().is_err());
        assert_eq!(ValidationInput::from_value(json!("plain")), ValidationInput::Text("plain".into()));
    }

    #[test]
    fn test_config_merge_prefers_step_values() {
        let defaults = ValidatorConfig::new().with("threshold", 0.5).with("mode", "deny");
        let step = ValidatorConfig::new().with("threshold", 0.9);
        let merged = step.merged_over(&defaults);
        assert_eq!(merged.f64_or("threshold", 0.0), 0.9);
        assert_eq!(merged.str("mode"), Some("deny"));
    }

    #[test]
    fn test_string_list_forms() {
        let config = ValidatorConfig::new()
            .with("words", "alpha, beta\ngamma,,")
            .with("list", json!(["x", " y ", ""]))
            .with("bad", json!([1, 2]));
        assert_eq!(config.string_list("words").unwrap(), vec!["alpha", "beta", "gamma"]);
        assert_eq!(config.string_list("list").unwrap(), vec!["x", "y"]);
        assert!(config.string_list("missing").unwrap().is_empty());
        assert!(config.string_list("bad").is_err());
    }

    #[test]
    fn test_from_value_rejects_non_objects() {
        assert!(ValidatorConfig::from_value(json!(null)).unwrap().is_empty());
        assert!(ValidatorConfig::from_value(json!([1])).is_err());
    }
}
