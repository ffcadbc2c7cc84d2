//! JSON / JSON-schema validator

use crate::validators::schema::{ConfigSchema, ParamSpec, ParamType};
use crate::validators::*;
use async_trait::async_trait;
use jsonschema::Validator as JsonSchemaValidator;

pub fn schema() -> ConfigSchema {
    ConfigSchema::new().param("schema", ParamSpec::new(ParamType::Object))
}

/// Checks that the input is JSON and, if a `schema` is configured, that it
/// conforms to it. Deterministic; no remote calls.
pub struct JsonSchemaCheck;

impl JsonSchemaCheck {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonSchemaCheck {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Validator for JsonSchemaCheck {
    async fn evaluate(
        &self,
        input: &ValidationInput,
        config: &ValidatorConfig,
    ) -> Result<Verdict, ValidationError> {
        let name = self.kind().as_str();

        let value = match input.json() {
            Ok(v) => v,
            Err(e) => {
                return Ok(Verdict::fail(name).with_detail(serde_json::json!({
                    "reason": "invalid_json",
                    "message": e.to_string(),
                })));
            }
        };

        let Some(schema) = config.get("schema") else {
            return Ok(Verdict::pass(name));
        };

        let validator = JsonSchemaValidator::new(schema)
            .map_err(|e| ValidationError::Config(format!("invalid JSON schema: {}", e)))?;

        let errors: Vec<serde_json::Value> = validator
            .iter_errors(&*value)
            .map(|err| {
                serde_json::json!({
                    "path": err.instance_path.to_string(),
                    "message": err.to_string(),
                })
            })
            .collect();

        if errors.is_empty() {
            Ok(Verdict::pass(name))
        } else {
            Ok(Verdict::fail(name)
                .with_score(errors.len() as f64)
                .with_detail(serde_json::json!({
                    "reason": "schema_violation",
                    "errors": errors,
                })))
        }
    }

    fn kind(&self) -> ValidatorKind {
        ValidatorKind::JsonSchema
    }

    fn check_config(&self, config: &ValidatorConfig) -> Result<(), String> {
        if let Some(schema) = config.get("schema") {
            JsonSchemaValidator::new(schema).map_err(|e| format!("invalid JSON schema: {}", e))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn person_schema() -> ValidatorConfig {
        ValidatorConfig::new().with(
            "schema",
            json!({
                "type": "object",
                "required": ["name", "age"],
                "properties": {
                    "name": {"type": "string"},
                    "age": {"type": "integer", "minimum": 0}
                }
            }),
        )
    }

    #[tokio::test]
    async fn test_plain_json_check() {
        let v = JsonSchemaCheck::new();
        let ok = v
            .evaluate(&ValidationInput::from(r#"{"a": [1, 2]}"#), &ValidatorConfig::new())
            .await
            .unwrap();
        assert!(ok.passed);

        let bad = v
            .evaluate(&ValidationInput::from("{not json"), &ValidatorConfig::new())
            .await
            .unwrap();
        assert!(!bad.passed);
        assert_eq!(bad.detail.unwrap()["reason"], "invalid_json");
    }

    #[tokio::test]
    async fn test_schema_violations_reported() {
        let v = JsonSchemaCheck::new();
        let verdict = v
            .evaluate(&ValidationInput::from(r#"{"name": 5}"#), &person_schema())
            .await
            .unwrap();
        assert!(!verdict.passed);
        let detail = verdict.detail.unwrap();
        assert_eq!(detail["reason"], "schema_violation");
        assert_eq!(detail["errors"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_structured_input_checked_directly() {
        let v = JsonSchemaCheck::new();
        let input = ValidationInput::from_value(json!({"name": "Ada", "age": 36}));
        let verdict = v.evaluate(&input, &person_schema()).await.unwrap();
        assert!(verdict.passed);
    }

    #[test]
    fn test_invalid_schema_rejected_at_build() {
        let config = ValidatorConfig::new().with("schema", json!({"type": 12}));
        assert!(JsonSchemaCheck::new().check_config(&config).is_err());
    }
}
