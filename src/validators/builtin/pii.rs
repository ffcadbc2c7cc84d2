//! PII detector with redaction

use crate::validators::schema::{ConfigSchema, ParamSpec, ParamType};
use crate::validators::text::{replace_spans, Span};
use crate::validators::*;
use async_trait::async_trait;
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// PII categories the detector knows about
pub const PII_TYPES: &[&str] = &[
    "email",
    "phone_number",
    "ssn",
    "credit_card",
    "ip",
    "url",
    "api_key",
];

/// Categories scanned when the config does not name any
const DEFAULT_TYPES: &[&str] = &["email", "phone_number", "ssn", "credit_card", "ip", "api_key"];

struct PiiPattern {
    pii_type: &'static str,
    regex: Regex,
}

fn patterns() -> &'static [PiiPattern] {
    static PATTERNS: OnceLock<Vec<PiiPattern>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            ("email", r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}"),
            ("ssn", r"\b\d{3}-\d{2}-\d{4}\b"),
            ("credit_card", r"\b(?:\d[ -]?){12,18}\d\b"),
            (
                "phone_number",
                r"(?:\+\d{1,3}[-.\s]?)?(?:\(\d{3}\)\s?|\b\d{3}[-.\s])\d{3}[-.\s]\d{4}\b",
            ),
            ("ip", r"\b(?:(?:25[0-5]|2[0-4]\d|1?\d?\d)\.){3}(?:25[0-5]|2[0-4]\d|1?\d?\d)\b"),
            ("url", r"(?i)\bhttps?://[^\s]+"),
            ("api_key", r"\bsk-[A-Za-z0-9]{32,}\b"),
        ]
        .into_iter()
        .filter_map(|(pii_type, pattern)| {
            Regex::new(pattern).ok().map(|regex| PiiPattern { pii_type, regex })
        })
        .collect()
    })
}

#[derive(Debug, Serialize)]
struct PiiMatch {
    #[serde(rename = "type")]
    pii_type: &'static str,
    start: usize,
    end: usize,
}

pub fn schema() -> ConfigSchema {
    ConfigSchema::new().param("pii_types", ParamSpec::new(ParamType::StringList))
}

/// Detects emails, phone numbers, SSNs, card numbers, IPs, URLs and API keys.
///
/// Score is the number of matches. Failing verdicts carry a corrected value
/// with each match replaced by `<TYPE>`.
pub struct PiiDetector;

impl PiiDetector {
    pub fn new() -> Self {
        Self
    }

    fn selected_types(config: &ValidatorConfig) -> Result<Vec<String>, ValidationError> {
        let types: Vec<String> = config
            .string_list("pii_types")?
            .into_iter()
            .map(|t| normalize_type(&t))
            .collect();
        if types.is_empty() {
            Ok(DEFAULT_TYPES.iter().map(|t| t.to_string()).collect())
        } else {
            Ok(types)
        }
    }

    fn scan(text: &str, types: &[String]) -> Vec<PiiMatch> {
        let mut matches: Vec<PiiMatch> = Vec::new();
        for pattern in patterns() {
            if !types.iter().any(|t| t == pattern.pii_type) {
                continue;
            }
            for m in pattern.regex.find_iter(text) {
                // An SSN also looks like a phone fragment; keep the first claim
                let overlaps = matches.iter().any(|x| m.start() < x.end && x.start < m.end());
                if !overlaps {
                    matches.push(PiiMatch {
                        pii_type: pattern.pii_type,
                        start: m.start(),
                        end: m.end(),
                    });
                }
            }
        }
        matches.sort_by_key(|m| m.start);
        matches
    }
}

fn normalize_type(t: &str) -> String {
    match t.trim().to_ascii_lowercase().as_str() {
        "phone" | "phonenumber" | "phone_number" => "phone_number".to_string(),
        "email_address" => "email".to_string(),
        "us_ssn" => "ssn".to_string(),
        "ip_address" => "ip".to_string(),
        other => other.to_string(),
    }
}

impl Default for PiiDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Validator for PiiDetector {
    async fn evaluate(
        &self,
        input: &ValidationInput,
        config: &ValidatorConfig,
    ) -> Result<Verdict, ValidationError> {
        let types = Self::selected_types(config)?;
        let text = input.text();
        let matches = Self::scan(&text, &types);

        if matches.is_empty() {
            return Ok(Verdict::pass(self.kind().as_str()).with_score(0.0));
        }

        let spans: Vec<Span> = matches.iter().map(|m| Span::new(m.start, m.end)).collect();
        let redacted = replace_spans(&text, &spans, |span| {
            let pii_type = matches
                .iter()
                .find(|m| m.start == span.start)
                .map(|m| m.pii_type)
                .unwrap_or("pii");
            format!("<{}>", pii_type.to_ascii_uppercase())
        });

        Ok(Verdict::fail(self.kind().as_str())
            .with_score(matches.len() as f64)
            .with_detail(serde_json::json!({
                "pii_types": types,
                "matches": matches,
            }))
            .with_corrected_value(redacted)
            .with_spans(spans))
    }

    fn kind(&self) -> ValidatorKind {
        ValidatorKind::PiiDetector
    }

    fn check_config(&self, config: &ValidatorConfig) -> Result<(), String> {
        let types = Self::selected_types(config).map_err(|e| e.to_string())?;
        match types.iter().find(|t| !PII_TYPES.contains(&t.as_str())) {
            Some(unknown) => Err(format!(
                "unknown pii type '{}' (known: {})",
                unknown,
                PII_TYPES.join(", ")
            )),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn run(text: &str, config: ValidatorConfig) -> Verdict {
        PiiDetector::new()
            .evaluate(&ValidationInput::from(text), &config)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_redacts_ssn() {
        let verdict = run("My SSN is 123-45-6789", ValidatorConfig::new()).await;
        assert!(!verdict.passed);
        assert_eq!(verdict.score, Some(1.0));
        assert_eq!(verdict.corrected_value.as_deref(), Some("My SSN is <SSN>"));
        assert_eq!(verdict.spans, vec![Span::new(10, 21)]);
    }

    #[tokio::test]
    async fn test_clean_text_passes() {
        let verdict = run("Nothing personal here.", ValidatorConfig::new()).await;
        assert!(verdict.passed);
        assert!(verdict.corrected_value.is_none());
    }

    #[tokio::test]
    async fn test_email_and_phone() {
        let verdict = run(
            "Mail jane.doe@example.com or call 555-123-4567.",
            ValidatorConfig::new(),
        )
        .await;
        assert_eq!(verdict.score, Some(2.0));
        assert_eq!(
            verdict.corrected_value.as_deref(),
            Some("Mail <EMAIL> or call <PHONE_NUMBER>.")
        );
    }

    #[tokio::test]
    async fn test_type_selection() {
        let config = ValidatorConfig::new().with("pii_types", "email");
        let verdict = run("SSN 123-45-6789", config).await;
        assert!(verdict.passed);

        let config = ValidatorConfig::new().with("pii_types", serde_json::json!(["phone"]));
        let verdict = run("call (555) 123-4567", config).await;
        assert!(!verdict.passed);
    }

    #[test]
    fn test_check_config_rejects_unknown_type() {
        let detector = PiiDetector::new();
        assert!(detector
            .check_config(&ValidatorConfig::new().with("pii_types", "email, ssn"))
            .is_ok());
        assert!(detector
            .check_config(&ValidatorConfig::new().with("pii_types", "passport"))
            .is_err());
    }
}
