//! Core validator traits and interfaces
//!
//! This module defines the capability contract every validator variant implements.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{ValidationError, ValidationInput, ValidatorConfig, Verdict};

/// The capability every validator implements.
///
/// Implementations are stateless: a verdict depends only on the input and the
/// config passed in, so one instance can serve any number of concurrent runs.
#[async_trait]
pub trait Validator: Send + Sync {
    /// Evaluate an input under a step's config
    ///
    /// # Returns
    /// * `Ok(Verdict)` - The rule was evaluated (pass or fail)
    /// * `Err(ValidationError)` - The rule could not be evaluated
    async fn evaluate(
        &self,
        input: &ValidationInput,
        config: &ValidatorConfig,
    ) -> Result<Verdict, ValidationError>;

    /// Implementation key (for logging and manifest lookup)
    fn kind(&self) -> ValidatorKind;

    /// Checks a config beyond what the descriptor schema can express
    /// (regex compilation, JSON schema compilation, ...)
    ///
    /// Called once per step when a pipeline is built.
    fn check_config(&self, config: &ValidatorConfig) -> Result<(), String> {
        let _ = config;
        Ok(())
    }
}

/// Built-in validator implementations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidatorKind {
    PiiDetector,
    JailbreakDetector,
    TopicRestriction,
    JsonSchema,
    RegexMatch,
    ToxicityClassifier,
    UrlValidator,
    HallucinationDetector,
    SensitiveTopicDetector,
    Blocklist,
    CompetitorCheck,
}

impl ValidatorKind {
    pub const ALL: [ValidatorKind; 11] = [
        ValidatorKind::PiiDetector,
        ValidatorKind::JailbreakDetector,
        ValidatorKind::TopicRestriction,
        ValidatorKind::JsonSchema,
        ValidatorKind::RegexMatch,
        ValidatorKind::ToxicityClassifier,
        ValidatorKind::UrlValidator,
        ValidatorKind::HallucinationDetector,
        ValidatorKind::SensitiveTopicDetector,
        ValidatorKind::Blocklist,
        ValidatorKind::CompetitorCheck,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ValidatorKind::PiiDetector => "pii_detector",
            ValidatorKind::JailbreakDetector => "jailbreak_detector",
            ValidatorKind::TopicRestriction => "topic_restriction",
            ValidatorKind::JsonSchema => "json_schema",
            ValidatorKind::RegexMatch => "regex_match",
            ValidatorKind::ToxicityClassifier => "toxicity_classifier",
            ValidatorKind::UrlValidator => "url_validator",
            ValidatorKind::HallucinationDetector => "hallucination_detector",
            ValidatorKind::SensitiveTopicDetector => "sensitive_topic_detector",
            ValidatorKind::Blocklist => "blocklist",
            ValidatorKind::CompetitorCheck => "competitor_check",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        let key = name.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|k| k.as_str() == key)
    }
}

impl std::fmt::Display for ValidatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
