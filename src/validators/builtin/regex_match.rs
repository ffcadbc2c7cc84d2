//! Regex matcher

use crate::validators::schema::{ConfigSchema, ParamSpec, ParamType};
use crate::validators::text::{replace_spans, Span};
use crate::validators::*;
use async_trait::async_trait;
use regex::{Regex, RegexBuilder};

pub fn schema() -> ConfigSchema {
    ConfigSchema::new()
        .param("regex", ParamSpec::new(ParamType::String).required())
        .param(
            "match_type",
            ParamSpec::new(ParamType::String).one_of(&["search", "fullmatch"]),
        )
        .param(
            "mode",
            ParamSpec::new(ParamType::String).one_of(&["require", "forbid"]),
        )
        .param("replacement", ParamSpec::new(ParamType::String))
        .param("case_insensitive", ParamSpec::new(ParamType::Boolean))
}

/// Strip one layer of matching quotes that UIs tend to leave around patterns
fn unquote(pattern: &str) -> &str {
    let p = pattern.trim();
    for q in ['"', '\''] {
        if p.len() >= 2 && p.starts_with(q) && p.ends_with(q) {
            return &p[1..p.len() - 1];
        }
    }
    p
}

fn compile(config: &ValidatorConfig) -> Result<Regex, ValidationError> {
    let pattern = config
        .str("regex")
        .ok_or_else(|| ValidationError::Config("missing 'regex'".to_string()))?;
    let pattern = unquote(pattern);
    let full = config
        .str("match_type")
        .map(|m| m.eq_ignore_ascii_case("fullmatch"))
        .unwrap_or(false);
    let source = if full {
        format!(r"\A(?:{})\z", pattern)
    } else {
        pattern.to_string()
    };
    RegexBuilder::new(&source)
        .case_insensitive(config.bool_or("case_insensitive", true))
        .multi_line(true)
        .build()
        .map_err(|e| ValidationError::Config(format!("invalid regex '{}': {}", pattern, e)))
}

/// Matches the input against a regular expression.
///
/// Patterns are case-insensitive unless `case_insensitive = false`, and `^`/`$`
/// match at line boundaries.
///
/// * `require` mode (default): passes when the pattern matches.
/// * `forbid` mode: fails when it matches; the matches are localized and a
///   corrected value replaces them with `replacement` (default empty).
pub struct RegexMatch;

impl RegexMatch {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RegexMatch {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Validator for RegexMatch {
    async fn evaluate(
        &self,
        input: &ValidationInput,
        config: &ValidatorConfig,
    ) -> Result<Verdict, ValidationError> {
        let regex = compile(config)?;
        let text = input.text();
        let spans: Vec<Span> = regex
            .find_iter(&text)
            .map(|m| Span::new(m.start(), m.end()))
            .collect();
        let forbid = config
            .str("mode")
            .map(|m| m.eq_ignore_ascii_case("forbid"))
            .unwrap_or(false);

        let detail = serde_json::json!({
            "pattern": regex.as_str(),
            "mode": if forbid { "forbid" } else { "require" },
            "match_count": spans.len(),
        });

        if !forbid {
            return Ok(Verdict::from_outcome(self.kind().as_str(), !spans.is_empty())
                .with_detail(detail));
        }

        if spans.is_empty() {
            return Ok(Verdict::pass(self.kind().as_str()).with_detail(detail));
        }

        let replacement = config.str("replacement").unwrap_or("");
        let corrected = replace_spans(&text, &spans, |_| replacement.to_string());
        Ok(Verdict::fail(self.kind().as_str())
            .with_score(spans.len() as f64)
            .with_detail(detail)
            .with_corrected_value(corrected)
            .with_spans(spans))
    }

    fn kind(&self) -> ValidatorKind {
        ValidatorKind::RegexMatch
    }

    fn check_config(&self, config: &ValidatorConfig) -> Result<(), String> {
        compile(config).map(|_| ()).map_err(|e| e.to_string())
    }
}
