//! Config schemas declared by validator descriptors

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::context::json_type_name;
use super::ValidatorConfig;

/// Expected JSON type of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
    /// Array of strings, or a comma/newline separated string
    StringList,
    Any,
}

impl ParamType {
    fn accepts(&self, value: &Value) -> bool {
        match self {
            ParamType::String => value.is_string(),
            ParamType::Number => value.is_number(),
            ParamType::Integer => value.is_i64() || value.is_u64(),
            ParamType::Boolean => value.is_boolean(),
            ParamType::Object => value.is_object(),
            ParamType::Array => value.is_array(),
            ParamType::StringList => match value {
                Value::String(_) => true,
                Value::Array(items) => items.iter().all(Value::is_string),
                _ => false,
            },
            ParamType::Any => true,
        }
    }
}

impl std::fmt::Display for ParamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ParamType::String => "string",
            ParamType::Number => "number",
            ParamType::Integer => "integer",
            ParamType::Boolean => "boolean",
            ParamType::Object => "object",
            ParamType::Array => "array",
            ParamType::StringList => "string list",
            ParamType::Any => "any",
        };
        f.write_str(name)
    }
}

/// Type and constraints of one parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    #[serde(rename = "type")]
    pub param_type: ParamType,

    #[serde(default)]
    pub required: bool,

    /// Inclusive lower bound for numeric parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,

    /// Inclusive upper bound for numeric parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,

    /// Allowed values for string parameters (compared case-insensitively)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub one_of: Option<Vec<String>>,
}

impl ParamSpec {
    pub fn new(param_type: ParamType) -> Self {
        Self {
            param_type,
            required: false,
            min: None,
            max: None,
            one_of: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    pub fn one_of(mut self, values: &[&str]) -> Self {
        self.one_of = Some(values.iter().map(|v| v.to_string()).collect());
        self
    }

    fn check(&self, name: &str, value: &Value, problems: &mut Vec<String>) {
        if !self.param_type.accepts(value) {
            problems.push(format!(
                "'{}' must be of type {}, got {}",
                name,
                self.param_type,
                json_type_name(value)
            ));
            return;
        }
        if let Some(n) = value.as_f64() {
            if let Some(min) = self.min {
                if n < min {
                    problems.push(format!("'{}' must be >= {}, got {}", name, min, n));
                }
            }
            if let Some(max) = self.max {
                if n > max {
                    problems.push(format!("'{}' must be <= {}, got {}", name, max, n));
                }
            }
        }
        if let (Some(allowed), Some(s)) = (&self.one_of, value.as_str()) {
            if !allowed.iter().any(|a| a.eq_ignore_ascii_case(s.trim())) {
                problems.push(format!(
                    "'{}' must be one of [{}], got '{}'",
                    name,
                    allowed.join(", "),
                    s
                ));
            }
        }
    }
}

/// Parameter name → spec mapping.
///
/// Unknown parameters are rejected so that typos surface at build time
/// rather than being silently ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigSchema {
    #[serde(flatten)]
    params: BTreeMap<String, ParamSpec>,
}

impl ConfigSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, name: &str, spec: ParamSpec) -> Self {
        self.params.insert(name.to_string(), spec);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ParamSpec> {
        self.params.get(name)
    }

    /// Check a config; returns every problem found, not just the first
    pub fn validate(&self, config: &ValidatorConfig) -> Result<(), Vec<String>> {
        let mut problems = self.check_present(config);

        for (name, spec) in &self.params {
            if spec.required && !config.contains(name) {
                problems.push(format!("missing required parameter '{}'", name));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems)
        }
    }

    /// Like [`validate`](Self::validate) but without requiring anything;
    /// used for descriptor defaults, which steps complete later
    pub fn validate_partial(&self, config: &ValidatorConfig) -> Result<(), Vec<String>> {
        let problems = self.check_present(config);
        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems)
        }
    }

    fn check_present(&self, config: &ValidatorConfig) -> Vec<String> {
        let mut problems = Vec::new();
        for (name, value) in config.iter() {
            match self.params.get(name) {
                None => problems.push(format!("unknown parameter '{}'", name)),
                Some(_) if value.is_null() => {}
                Some(spec) => spec.check(name, value, &mut problems),
            }
        }
        problems
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> ConfigSchema {
        ConfigSchema::new()
            .param("threshold", ParamSpec::new(ParamType::Number).range(0.0, 1.0))
            .param("regex", ParamSpec::new(ParamType::String).required())
            .param("mode", ParamSpec::new(ParamType::String).one_of(&["allow", "deny"]))
            .param("words", ParamSpec::new(ParamType::StringList))
    }

    #[test]
    fn test_valid_config() {
        let config = ValidatorConfig::from_value(json!({
            "threshold": 0.3,
            "regex": "^a",
            "mode": "DENY",
            "words": "a, b"
        }))
        .unwrap();
        assert!(schema().validate(&config).is_ok());
    }

    #[test]
    fn test_collects_all_problems() {
        let config = ValidatorConfig::from_value(json!({
            "threshold": 1.5,
            "mode": "maybe",
            "words": [1],
            "typo": true
        }))
        .unwrap();
        let problems = schema().validate(&config).unwrap_err();
        assert_eq!(problems.len(), 5);
        assert!(problems.iter().any(|p| p.contains("unknown parameter 'typo'")));
        assert!(problems.iter().any(|p| p.contains("missing required parameter 'regex'")));
        assert!(problems.iter().any(|p| p.contains("<= 1")));
    }

    #[test]
    fn test_integer_type_rejects_float() {
        let schema = ConfigSchema::new().param("n", ParamSpec::new(ParamType::Integer));
        let ok = ValidatorConfig::new().with("n", 3);
        let bad = ValidatorConfig::new().with("n", 3.5);
        assert!(schema.validate(&ok).is_ok());
        assert!(schema.validate(&bad).is_err());
    }

    #[test]
    fn test_partial_skips_required() {
        let defaults = ValidatorConfig::new().with("mode", "allow");
        assert!(schema().validate_partial(&defaults).is_ok());
        assert!(schema().validate(&defaults).is_err());
        assert!(schema()
            .validate_partial(&ValidatorConfig::new().with("typo", 1))
            .is_err());
    }
}
