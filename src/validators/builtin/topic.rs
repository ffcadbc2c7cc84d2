//! Topic restriction validator

use crate::validators::schema::{ConfigSchema, ParamSpec, ParamType};
use crate::validators::text::{find_phrase, word_regex, Span};
use crate::validators::*;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Pass only if at least one listed topic is detected
    Allow,
    /// Pass only if no listed topic is detected
    Deny,
}

impl Mode {
    fn parse(s: Option<&str>) -> Result<Self, ValidationError> {
        match s.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            None | Some("deny") => Ok(Mode::Deny),
            Some("allow") => Ok(Mode::Allow),
            Some(other) => Err(ValidationError::Config(format!(
                "mode must be 'allow' or 'deny', got '{}'",
                other
            ))),
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Mode::Allow => "allow",
            Mode::Deny => "deny",
        }
    }
}

pub fn schema() -> ConfigSchema {
    ConfigSchema::new()
        .param(
            "mode",
            ParamSpec::new(ParamType::String).one_of(&["allow", "deny"]),
        )
        .param("topics", ParamSpec::new(ParamType::StringList).required())
        .param("keywords", ParamSpec::new(ParamType::Object))
}

/// Restricts text to (or away from) a set of topics.
///
/// Each topic is detected by whole-word, case-insensitive keyword matching.
/// A topic's keywords come from the `keywords` map (topic → list of words);
/// a topic without an entry uses its own name as the only keyword.
pub struct TopicRestriction;

impl TopicRestriction {
    pub fn new() -> Self {
        Self
    }

    fn topic_keywords(
        config: &ValidatorConfig,
    ) -> Result<BTreeMap<String, Vec<String>>, ValidationError> {
        let topics = config.string_list("topics")?;
        let keyword_map = match config.get("keywords") {
            Some(Value::Object(map)) => Some(map),
            Some(_) => {
                return Err(ValidationError::Config(
                    "'keywords' must be an object".to_string(),
                ))
            }
            None => None,
        };

        let mut out = BTreeMap::new();
        for topic in topics {
            let words = match keyword_map.and_then(|m| m.get(&topic)) {
                Some(v) => {
                    let entry = ValidatorConfig::new().with("words", v.clone());
                    entry.string_list("words")?
                }
                None => vec![topic.clone()],
            };
            out.insert(topic.to_lowercase(), words);
        }
        Ok(out)
    }

    fn detect(text: &str, topics: &BTreeMap<String, Vec<String>>) -> (Vec<String>, Vec<Span>) {
        let mut detected = Vec::new();
        let mut spans = Vec::new();
        for (topic, words) in topics {
            let found: Vec<Span> = words.iter().flat_map(|w| find_phrase(text, w)).collect();
            if !found.is_empty() {
                detected.push(topic.clone());
                spans.extend(found);
            }
        }
        (detected, spans)
    }
}

impl Default for TopicRestriction {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Validator for TopicRestriction {
    async fn evaluate(
        &self,
        input: &ValidationInput,
        config: &ValidatorConfig,
    ) -> Result<Verdict, ValidationError> {
        let mode = Mode::parse(config.str("mode"))?;
        let topics = Self::topic_keywords(config)?;
        let text = input.text();
        let (detected, spans) = Self::detect(&text, &topics);

        let passed = match mode {
            Mode::Allow => !detected.is_empty(),
            Mode::Deny => detected.is_empty(),
        };

        let verdict = Verdict::from_outcome(self.kind().as_str(), passed).with_detail(
            serde_json::json!({
                "mode": mode.as_str(),
                "detected_topics": detected,
            }),
        );

        // Only deny-mode hits point at offending text
        if !passed && mode == Mode::Deny {
            Ok(verdict.with_spans(spans))
        } else {
            Ok(verdict)
        }
    }

    fn kind(&self) -> ValidatorKind {
        ValidatorKind::TopicRestriction
    }

    fn check_config(&self, config: &ValidatorConfig) -> Result<(), String> {
        Mode::parse(config.str("mode")).map_err(|e| e.to_string())?;
        let topics = Self::topic_keywords(config).map_err(|e| e.to_string())?;
        if topics.is_empty() {
            return Err("'topics' must name at least one topic".to_string());
        }
        for word in topics.values().flatten() {
            word_regex(word).map_err(|e| format!("invalid keyword '{}': {}", word, e))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn run(text: &str, config: ValidatorConfig) -> Verdict {
        TopicRestriction::new()
            .evaluate(&ValidationInput::from(text), &config)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_deny_mode() {
        let config = ValidatorConfig::new()
            .with("mode", "deny")
            .with("topics", json!(["politics"]))
            .with("keywords", json!({"politics": ["election", "senator"]}));

        let verdict = run("Who won the election?", config.clone()).await;
        assert!(!verdict.passed);
        assert_eq!(verdict.detail.unwrap()["detected_topics"], json!(["politics"]));
        assert_eq!(verdict.spans.len(), 1);

        assert!(run("How do I bake bread?", config).await.passed);
    }

    #[tokio::test]
    async fn test_allow_mode() {
        let config = ValidatorConfig::new()
            .with("mode", "allow")
            .with("topics", "cooking, baking");

        assert!(run("Tips for baking at altitude", config.clone()).await.passed);
        let verdict = run("Tell me about football", config).await;
        assert!(!verdict.passed);
        assert!(verdict.spans.is_empty());
    }

    #[test]
    fn test_check_config() {
        let v = TopicRestriction::new();
        assert!(v
            .check_config(&ValidatorConfig::new().with("topics", "sports"))
            .is_ok());
        assert!(v
            .check_config(&ValidatorConfig::new().with("topics", ""))
            .is_err());
        assert!(v
            .check_config(
                &ValidatorConfig::new()
                    .with("topics", "sports")
                    .with("mode", "maybe")
            )
            .is_err());
    }
}
