//! Built-in validators
//!
//! One module per catalog entry. Each exposes a `schema()` describing the
//! parameters it accepts; [`create`] and [`schema_for`] map a
//! [`ValidatorKind`] onto them.

mod blocklist;
mod competitor;
mod hallucination;
mod jailbreak;
mod json_schema;
mod pii;
mod regex_match;
mod sensitive_topic;
mod topic;
mod toxicity;
mod valid_url;

#[cfg(test)]
pub(crate) mod testing;

pub use blocklist::Blocklist;
pub use competitor::CompetitorCheck;
pub use hallucination::HallucinationDetector;
pub use jailbreak::JailbreakDetector;
pub use json_schema::JsonSchemaCheck;
pub use pii::{PiiDetector, PII_TYPES};
pub use regex_match::RegexMatch;
pub use sensitive_topic::SensitiveTopicDetector;
pub use topic::TopicRestriction;
pub use toxicity::ToxicityClassifier;
pub use valid_url::UrlValidator;

use super::schema::ConfigSchema;
use super::{Validator, ValidatorKind};
use std::sync::Arc;

/// Instantiate the implementation behind a kind
pub fn create(kind: ValidatorKind) -> Arc<dyn Validator> {
    match kind {
        ValidatorKind::PiiDetector => Arc::new(PiiDetector::new()),
        ValidatorKind::JailbreakDetector => Arc::new(JailbreakDetector::new()),
        ValidatorKind::TopicRestriction => Arc::new(TopicRestriction::new()),
        ValidatorKind::JsonSchema => Arc::new(JsonSchemaCheck::new()),
        ValidatorKind::RegexMatch => Arc::new(RegexMatch::new()),
        ValidatorKind::ToxicityClassifier => Arc::new(ToxicityClassifier::new()),
        ValidatorKind::UrlValidator => Arc::new(UrlValidator::new()),
        ValidatorKind::HallucinationDetector => Arc::new(HallucinationDetector::new()),
        ValidatorKind::SensitiveTopicDetector => Arc::new(SensitiveTopicDetector::new()),
        ValidatorKind::Blocklist => Arc::new(Blocklist::new()),
        ValidatorKind::CompetitorCheck => Arc::new(CompetitorCheck::new()),
    }
}

/// Config schema of a kind
pub fn schema_for(kind: ValidatorKind) -> ConfigSchema {
    match kind {
        ValidatorKind::PiiDetector => pii::schema(),
        ValidatorKind::JailbreakDetector => jailbreak::schema(),
        ValidatorKind::TopicRestriction => topic::schema(),
        ValidatorKind::JsonSchema => json_schema::schema(),
        ValidatorKind::RegexMatch => regex_match::schema(),
        ValidatorKind::ToxicityClassifier => toxicity::schema(),
        ValidatorKind::UrlValidator => valid_url::schema(),
        ValidatorKind::HallucinationDetector => hallucination::schema(),
        ValidatorKind::SensitiveTopicDetector => sensitive_topic::schema(),
        ValidatorKind::Blocklist => blocklist::schema(),
        ValidatorKind::CompetitorCheck => competitor::schema(),
    }
}

/// Hub identifier of a built-in catalog entry
pub fn source_id(kind: ValidatorKind) -> &'static str {
    match kind {
        ValidatorKind::PiiDetector => "guardrails/detect_pii",
        ValidatorKind::JailbreakDetector => "guardrails/unusual_prompt",
        ValidatorKind::TopicRestriction => "guardrails/restrict_to_topic",
        ValidatorKind::JsonSchema => "guardrails/valid_json",
        ValidatorKind::RegexMatch => "guardrails/regex_match",
        ValidatorKind::ToxicityClassifier => "guardrails/toxic_language",
        ValidatorKind::UrlValidator => "guardrails/valid_url",
        ValidatorKind::HallucinationDetector => "guardrails/provenance_llm",
        ValidatorKind::SensitiveTopicDetector => "guardrails/sensitive_topics",
        ValidatorKind::Blocklist => "guardrails/blocklist",
        ValidatorKind::CompetitorCheck => "guardrails/competitor_check",
    }
}

/// Extra short names a built-in answers to, besides its name and hub slug
pub fn aliases(kind: ValidatorKind) -> &'static [&'static str] {
    match kind {
        ValidatorKind::PiiDetector => &["pii", "contains_pii", "personal_data"],
        ValidatorKind::JsonSchema => &["json"],
        ValidatorKind::RegexMatch => &["regex"],
        ValidatorKind::UrlValidator => &["url"],
        ValidatorKind::Blocklist => &["blacklist", "denylist", "block_list"],
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_has_matching_implementation() {
        for kind in ValidatorKind::ALL {
            assert_eq!(create(kind).kind(), kind);
            assert!(source_id(kind).starts_with("guardrails/"));
        }
    }

    #[test]
    fn test_schemas_reject_unknown_params() {
        let config = crate::validators::ValidatorConfig::new().with("bogus", 1);
        for kind in ValidatorKind::ALL {
            assert!(schema_for(kind).validate(&config).is_err(), "{}", kind);
        }
    }
}
