//! Word blocklist

use crate::validators::schema::{ConfigSchema, ParamSpec, ParamType};
use crate::validators::text::{find_phrase, remove_spans, replace_spans, word_regex, Span};
use crate::validators::*;
use async_trait::async_trait;

pub fn schema() -> ConfigSchema {
    ConfigSchema::new()
        .param("words", ParamSpec::new(ParamType::StringList).required())
        .param("replacement", ParamSpec::new(ParamType::String))
}

/// Fails when any listed word or phrase occurs (whole word, any case).
///
/// The correction removes the hits, or replaces them with `replacement`
/// when one is configured.
pub struct Blocklist;

impl Blocklist {
    pub fn new() -> Self {
        Self
    }
}

impl Default for Blocklist {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Validator for Blocklist {
    async fn evaluate(
        &self,
        input: &ValidationInput,
        config: &ValidatorConfig,
    ) -> Result<Verdict, ValidationError> {
        let words = config.string_list("words")?;
        let text = input.text();

        let mut matched = Vec::new();
        let mut spans: Vec<Span> = Vec::new();
        for word in &words {
            let found = find_phrase(&text, word);
            if !found.is_empty() {
                matched.push(word.to_lowercase());
                spans.extend(found);
            }
        }

        if spans.is_empty() {
            return Ok(Verdict::pass(self.kind().as_str()));
        }

        let corrected = match config.str("replacement") {
            Some(r) => replace_spans(&text, &spans, |_| r.to_string()),
            None => remove_spans(&text, &spans),
        };
        Ok(Verdict::fail(self.kind().as_str())
            .with_score(spans.len() as f64)
            .with_detail(serde_json::json!({ "matched": matched }))
            .with_corrected_value(corrected)
            .with_spans(spans))
    }

    fn kind(&self) -> ValidatorKind {
        ValidatorKind::Blocklist
    }

    fn check_config(&self, config: &ValidatorConfig) -> Result<(), String> {
        let words = config.string_list("words").map_err(|e| e.to_string())?;
        if words.is_empty() {
            return Err("'words' must contain at least one entry".to_string());
        }
        for word in &words {
            word_regex(word).map_err(|e| format!("invalid word '{}': {}", word, e))?;
        }
        Ok(())
    }
}
