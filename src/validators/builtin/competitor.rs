//! Competitor mentions

use crate::validators::schema::{ConfigSchema, ParamSpec, ParamType};
use crate::validators::text::{find_phrase, remove_spans, sentence_spans, word_regex, Span};
use crate::validators::*;
use async_trait::async_trait;

pub fn schema() -> ConfigSchema {
    ConfigSchema::new().param("competitors", ParamSpec::new(ParamType::StringList).required())
}

/// Fails when the text names a competitor.
///
/// Names match whole-word and case-insensitively. Spans cover the mentions
/// themselves; the corrected value drops every sentence containing one.
pub struct CompetitorCheck;

impl CompetitorCheck {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CompetitorCheck {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Validator for CompetitorCheck {
    async fn evaluate(
        &self,
        input: &ValidationInput,
        config: &ValidatorConfig,
    ) -> Result<Verdict, ValidationError> {
        let competitors = config.string_list("competitors")?;
        let text = input.text();

        let mut found = Vec::new();
        let mut mentions: Vec<Span> = Vec::new();
        for name in &competitors {
            let hits = find_phrase(&text, name);
            if !hits.is_empty() {
                found.push(name.trim().to_string());
                mentions.extend(hits);
            }
        }

        if mentions.is_empty() {
            return Ok(Verdict::pass(self.kind().as_str()));
        }

        let flagged: Vec<Span> = sentence_spans(&text)
            .into_iter()
            .filter(|s| mentions.iter().any(|m| m.start >= s.start && m.end <= s.end))
            .collect();
        let cleaned = remove_spans(&text, &flagged);

        mentions.sort();
        Ok(Verdict::fail(self.kind().as_str())
            .with_score(mentions.len() as f64)
            .with_detail(serde_json::json!({ "competitors_found": found }))
            .with_corrected_value(cleaned)
            .with_spans(mentions))
    }

    fn kind(&self) -> ValidatorKind {
        ValidatorKind::CompetitorCheck
    }

    fn check_config(&self, config: &ValidatorConfig) -> Result<(), String> {
        let competitors = config.string_list("competitors").map_err(|e| e.to_string())?;
        if competitors.is_empty() {
            return Err("'competitors' must name at least one competitor".to_string());
        }
        for name in &competitors {
            word_regex(name).map_err(|e| format!("invalid competitor '{}': {}", name, e))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn run(text: &str, config: ValidatorConfig) -> Verdict {
        CompetitorCheck::new()
            .evaluate(&ValidationInput::from(text), &config)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_mentions_located_and_sentences_dropped() {
        let config = ValidatorConfig::new().with("competitors", json!(["Acme Corp", "Globex"]));
        let text = "Our plan is cheapest. Unlike ACME corp, we ship daily. Ask anyone.";
        let verdict = run(text, config).await;

        assert!(!verdict.passed);
        assert_eq!(verdict.score, Some(1.0));
        assert_eq!(verdict.detail.unwrap()["competitors_found"], json!(["Acme Corp"]));
        assert_eq!(verdict.spans, vec![Span::new(29, 38)]);
        assert_eq!(
            verdict.corrected_value.as_deref(),
            Some("Our plan is cheapest. Ask anyone.")
        );
    }

    #[tokio::test]
    async fn test_partial_words_do_not_match() {
        let config = ValidatorConfig::new().with("competitors", "globex");
        assert!(run("Globexian tariffs are unrelated.", config).await.passed);
    }

    #[test]
    fn test_empty_competitor_list_rejected() {
        let config = ValidatorConfig::new().with("competitors", json!([]));
        assert!(CompetitorCheck::new().check_config(&config).is_err());
    }
}
