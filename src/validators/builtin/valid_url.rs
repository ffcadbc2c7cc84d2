//! URL validator

use crate::validators::schema::{ConfigSchema, ParamSpec, ParamType};
use crate::validators::text::{remove_spans, Span};
use crate::validators::*;
use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;
use url::Url;

const DEFAULT_SCHEMES: &[&str] = &["http", "https"];

fn url_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?i)\b[a-z][a-z0-9+.\-]*://[^\s<>"'`]+"#).ok())
        .as_ref()
}

pub fn schema() -> ConfigSchema {
    ConfigSchema::new()
        .param("whole_value", ParamSpec::new(ParamType::Boolean))
        .param("allowed_schemes", ParamSpec::new(ParamType::StringList))
        .param("allowed_domains", ParamSpec::new(ParamType::StringList))
        .param("require_url", ParamSpec::new(ParamType::Boolean))
}

/// Candidate URLs in the text, with trailing sentence punctuation trimmed
fn extract(text: &str) -> Vec<Span> {
    let Some(re) = url_regex() else {
        return Vec::new();
    };
    re.find_iter(text)
        .map(|m| {
            let trimmed = m.as_str().trim_end_matches(['.', ',', ';', ':', '!', '?', ')']);
            Span::new(m.start(), m.start() + trimmed.len())
        })
        .collect()
}

fn domain_allowed(host: &str, allowed: &[String]) -> bool {
    let host = host.to_ascii_lowercase();
    allowed.iter().any(|d| {
        let d = d.trim_start_matches("*.").to_ascii_lowercase();
        host == d || host.ends_with(&format!(".{}", d))
    })
}

/// Why a URL was rejected, or `None` if it is acceptable
fn check_url(raw: &str, schemes: &[String], domains: &[String]) -> Option<String> {
    let url = match Url::parse(raw) {
        Ok(u) => u,
        Err(e) => return Some(format!("unparseable: {}", e)),
    };
    if !schemes.iter().any(|s| s.eq_ignore_ascii_case(url.scheme())) {
        return Some(format!("scheme '{}' not allowed", url.scheme()));
    }
    let Some(host) = url.host_str() else {
        return Some("missing host".to_string());
    };
    if !domains.is_empty() && !domain_allowed(host, domains) {
        return Some(format!("domain '{}' not allowed", host));
    }
    None
}

/// Checks URLs for well-formedness, scheme and domain.
///
/// By default every URL found in the text is checked; with `whole_value` the
/// trimmed value itself must be a single valid URL. `allowed_domains` also
/// admits subdomains. With `require_url`, text containing no URL fails.
/// Rejected URLs are localized so FILTER/FIX can remove them.
pub struct UrlValidator;

impl UrlValidator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for UrlValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Validator for UrlValidator {
    async fn evaluate(
        &self,
        input: &ValidationInput,
        config: &ValidatorConfig,
    ) -> Result<Verdict, ValidationError> {
        let mut schemes = config.string_list("allowed_schemes")?;
        if schemes.is_empty() {
            schemes = DEFAULT_SCHEMES.iter().map(|s| s.to_string()).collect();
        }
        let domains = config.string_list("allowed_domains")?;
        let text = input.text();
        let name = self.kind().as_str();

        if config.bool_or("whole_value", false) {
            let value = text.trim();
            return Ok(match check_url(value, &schemes, &domains) {
                None => Verdict::pass(name),
                Some(reason) => Verdict::fail(name).with_detail(serde_json::json!({
                    "invalid_urls": [{"url": value, "reason": reason}],
                })),
            });
        }

        let candidates = extract(&text);
        if candidates.is_empty() {
            let required = config.bool_or("require_url", false);
            return Ok(Verdict::from_outcome(name, !required).with_detail(serde_json::json!({
                "url_count": 0,
            })));
        }

        let mut invalid = Vec::new();
        let mut spans = Vec::new();
        for span in &candidates {
            let raw = span.slice(&text);
            if let Some(reason) = check_url(raw, &schemes, &domains) {
                invalid.push(serde_json::json!({"url": raw, "reason": reason}));
                spans.push(*span);
            }
        }

        let detail = serde_json::json!({
            "url_count": candidates.len(),
            "invalid_urls": invalid,
        });
        if spans.is_empty() {
            return Ok(Verdict::pass(name).with_detail(detail));
        }
        let cleaned = remove_spans(&text, &spans);
        Ok(Verdict::fail(name)
            .with_score(spans.len() as f64)
            .with_detail(detail)
            .with_corrected_value(cleaned)
            .with_spans(spans))
    }

    fn kind(&self) -> ValidatorKind {
        ValidatorKind::UrlValidator
    }
}
