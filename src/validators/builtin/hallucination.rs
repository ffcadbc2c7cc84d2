//! Provenance / hallucination detector

use crate::validators::schema::{ConfigSchema, ParamSpec, ParamType};
use crate::validators::text::{content_tokens, remove_spans, sentence_spans, Span};
use crate::validators::*;
use async_trait::async_trait;
use std::collections::HashSet;

const DEFAULT_THRESHOLD: f64 = 0.6;

pub fn schema() -> ConfigSchema {
    ConfigSchema::new()
        .param("reference", ParamSpec::new(ParamType::String).required())
        .param("threshold", ParamSpec::new(ParamType::Number).range(0.0, 1.0))
}

/// Checks that every sentence is grounded in a reference document.
///
/// A sentence's support is the share of its content tokens that also occur
/// in `reference`. Sentences without content tokens count as supported.
/// The score is the lowest support seen.
pub struct HallucinationDetector;

impl HallucinationDetector {
    pub fn new() -> Self {
        Self
    }

    fn support(sentence: &str, reference: &HashSet<String>) -> Option<f64> {
        let tokens = content_tokens(sentence);
        if tokens.is_empty() {
            return None;
        }
        let supported = tokens.iter().filter(|t| reference.contains(*t)).count();
        Some(supported as f64 / tokens.len() as f64)
    }
}

impl Default for HallucinationDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Validator for HallucinationDetector {
    async fn evaluate(
        &self,
        input: &ValidationInput,
        config: &ValidatorConfig,
    ) -> Result<Verdict, ValidationError> {
        let reference = config
            .str("reference")
            .ok_or_else(|| ValidationError::Config("missing 'reference'".to_string()))?;
        let threshold = config.f64_or("threshold", DEFAULT_THRESHOLD);
        let reference: HashSet<String> = content_tokens(reference).into_iter().collect();

        let text = input.text();
        let mut min_support: f64 = 1.0;
        let mut unsupported: Vec<Span> = Vec::new();
        for span in sentence_spans(&text) {
            let Some(support) = Self::support(span.slice(&text), &reference) else {
                continue;
            };
            min_support = min_support.min(support);
            if support < threshold {
                unsupported.push(span);
            }
        }

        let verdict = Verdict::from_outcome(self.kind().as_str(), unsupported.is_empty())
            .with_score(min_support)
            .with_detail(serde_json::json!({
                "threshold": threshold,
                "unsupported_sentences":
                    unsupported.iter().map(|s| s.slice(&text)).collect::<Vec<_>>(),
            }));
        if unsupported.is_empty() {
            return Ok(verdict);
        }
        let grounded = remove_spans(&text, &unsupported);
        Ok(verdict.with_corrected_value(grounded).with_spans(unsupported))
    }

    fn kind(&self) -> ValidatorKind {
        ValidatorKind::HallucinationDetector
    }

    fn check_config(&self, config: &ValidatorConfig) -> Result<(), String> {
        match config.str("reference") {
            Some(r) if !r.trim().is_empty() => Ok(()),
            _ => Err("'reference' must be a non-empty document".to_string()),
        }
    }
}
