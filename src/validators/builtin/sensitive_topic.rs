//! Sensitive topic detector

use crate::validators::schema::{ConfigSchema, ParamSpec, ParamType};
use crate::validators::text::{find_phrase, remove_spans, sentence_spans, Span};
use crate::validators::*;
use async_trait::async_trait;

type Category = (&'static str, &'static [&'static str]);

const CATEGORIES: &[Category] = &[
    (
        "violence",
        &["kill", "murder", "assault", "stab", "shooting", "massacre", "torture", "beat up"],
    ),
    (
        "self_harm",
        &["suicide", "self-harm", "self harm", "cut myself", "end my life", "overdose"],
    ),
    (
        "weapons",
        &["gun", "rifle", "pistol", "ammunition", "explosive", "bomb", "grenade", "firearm"],
    ),
    (
        "drugs",
        &["cocaine", "heroin", "meth", "methamphetamine", "fentanyl", "lsd", "narcotics"],
    ),
    (
        "politics",
        &["election", "democrat", "republican", "senator", "parliament", "ballot", "campaign"],
    ),
    (
        "religion",
        &["religion", "church", "mosque", "synagogue", "bible", "quran", "atheism"],
    ),
    (
        "medical",
        &["diagnosis", "prescription", "dosage", "chemotherapy", "symptoms", "medication"],
    ),
];

pub fn schema() -> ConfigSchema {
    ConfigSchema::new().param("categories", ParamSpec::new(ParamType::StringList))
}

fn selected(config: &ValidatorConfig) -> Result<Vec<&'static Category>, ValidationError> {
    let wanted = config.string_list("categories")?;
    if wanted.is_empty() {
        return Ok(CATEGORIES.iter().collect());
    }
    wanted
        .iter()
        .map(|w| {
            let key = w.trim().to_ascii_lowercase().replace('-', "_");
            CATEGORIES
                .iter()
                .find(|(name, _)| *name == key)
                .ok_or_else(|| ValidationError::Config(format!("unknown category '{}'", w)))
        })
        .collect()
}

/// Flags text touching sensitive subjects.
///
/// Each category is a built-in keyword lexicon matched whole-word and
/// case-insensitively. `categories` narrows the set. Any hit fails the
/// verdict; the corrected value drops the sentences containing hits.
pub struct SensitiveTopicDetector;

impl SensitiveTopicDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SensitiveTopicDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Validator for SensitiveTopicDetector {
    async fn evaluate(
        &self,
        input: &ValidationInput,
        config: &ValidatorConfig,
    ) -> Result<Verdict, ValidationError> {
        let categories = selected(config)?;
        let text = input.text();

        let mut detected = Vec::new();
        let mut hits: Vec<Span> = Vec::new();
        for (category, words) in categories {
            let found: Vec<Span> = words.iter().flat_map(|w| find_phrase(&text, w)).collect();
            if !found.is_empty() {
                detected.push(*category);
                hits.extend(found);
            }
        }

        let verdict = Verdict::from_outcome(self.kind().as_str(), hits.is_empty())
            .with_score(detected.len() as f64)
            .with_detail(serde_json::json!({ "detected_categories": detected }));
        if hits.is_empty() {
            return Ok(verdict);
        }

        let flagged: Vec<Span> = sentence_spans(&text)
            .into_iter()
            .filter(|s| hits.iter().any(|h| h.start >= s.start && h.end <= s.end))
            .collect();
        let cleaned = remove_spans(&text, &flagged);
        Ok(verdict.with_corrected_value(cleaned).with_spans(flagged))
    }

    fn kind(&self) -> ValidatorKind {
        ValidatorKind::SensitiveTopicDetector
    }

    fn check_config(&self, config: &ValidatorConfig) -> Result<(), String> {
        selected(config).map(|_| ()).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn run(text: &str, config: ValidatorConfig) -> Verdict {
        SensitiveTopicDetector::new()
            .evaluate(&ValidationInput::from(text), &config)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_detects_and_drops_sentence() {
        let verdict = run(
            "Our store opens at nine. Ask about the election results.",
            ValidatorConfig::new(),
        )
        .await;
        assert!(!verdict.passed);
        assert_eq!(verdict.detail.unwrap()["detected_categories"], json!(["politics"]));
        assert_eq!(
            verdict.corrected_value.as_deref(),
            Some("Our store opens at nine.")
        );
    }

    #[tokio::test]
    async fn test_category_subset() {
        let config = ValidatorConfig::new().with("categories", json!(["weapons"]));
        assert!(run("Vote in the election!", config.clone()).await.passed);
        assert!(!run("He bought a rifle.", config).await.passed);
    }

    #[test]
    fn test_unknown_category_rejected() {
        let config = ValidatorConfig::new().with("categories", "gardening");
        assert!(SensitiveTopicDetector::new().check_config(&config).is_err());
    }
}
