//! Jailbreak / unusual-prompt detector

use crate::validators::remote::RemoteClassifier;
use crate::validators::schema::{ConfigSchema, ParamSpec, ParamType};
use crate::validators::text::Span;
use crate::validators::*;
use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

const DEFAULT_THRESHOLD: f64 = 0.5;

struct Signal {
    name: &'static str,
    weight: f64,
    regex: Regex,
}

fn signals() -> &'static [Signal] {
    static SIGNALS: OnceLock<Vec<Signal>> = OnceLock::new();
    SIGNALS.get_or_init(|| {
        [
            (
                "ignore_instructions",
                0.6,
                r"(?i)\b(ignore|disregard|forget)\s+(all\s+|any\s+)?(the\s+)?(previous|prior|above|earlier|your)\s+(instructions|rules|directions|prompts?)",
            ),
            (
                "reveal_system_prompt",
                0.5,
                r"(?i)\b(reveal|show|print|repeat|leak)\s+(me\s+)?(your|the)\s+(system|hidden|initial)\s+(prompt|instructions)",
            ),
            ("dan_persona", 0.6, r"(?i)\b(you\s+are\s+now\s+DAN|do\s+anything\s+now)\b"),
            ("developer_mode", 0.4, r"(?i)\b(developer|god|jailbreak)\s+mode\b"),
            (
                "no_restrictions",
                0.4,
                r"(?i)\b(without|no|ignore\s+all)\s+(any\s+)?(restrictions|limitations|filters|guidelines|rules)\b",
            ),
            (
                "roleplay_override",
                0.3,
                r"(?i)\b(pretend|act\s+as\s+if|imagine)\s+(that\s+)?you\s+(are|have|were)\b",
            ),
            (
                "bypass_safety",
                0.5,
                r"(?i)\b(bypass|circumvent|disable|override)\s+(your\s+|the\s+)?(safety|security|content)\s*(filters?|policy|policies|guidelines|measures)?",
            ),
            ("jailbreak_keyword", 0.3, r"(?i)\bjailbreak(ing)?\b"),
        ]
        .into_iter()
        .filter_map(|(name, weight, pattern)| {
            Regex::new(pattern).ok().map(|regex| Signal { name, weight, regex })
        })
        .collect()
    })
}

pub fn schema() -> ConfigSchema {
    ConfigSchema::new()
        .param("threshold", ParamSpec::new(ParamType::Number).range(0.0, 1.0))
        .param("endpoint", ParamSpec::new(ParamType::String))
}

/// Scores input against known adversarial-prompt phrasing.
///
/// Local scoring sums the weights of the signals present (each counted once)
/// and caps at 1.0. With an `endpoint`, the remote classifier's score is used
/// instead. The input passes when the score stays below `threshold`.
pub struct JailbreakDetector {
    remote: RemoteClassifier,
}

impl JailbreakDetector {
    pub fn new() -> Self {
        Self {
            remote: RemoteClassifier::new(),
        }
    }

    fn local_score(text: &str) -> (f64, Vec<&'static str>, Vec<Span>) {
        let mut score = 0.0;
        let mut hits = Vec::new();
        let mut spans = Vec::new();
        for signal in signals() {
            let found: Vec<Span> = signal
                .regex
                .find_iter(text)
                .map(|m| Span::new(m.start(), m.end()))
                .collect();
            if !found.is_empty() {
                score += signal.weight;
                hits.push(signal.name);
                spans.extend(found);
            }
        }
        (f64::min(score, 1.0), hits, spans)
    }
}

impl Default for JailbreakDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Validator for JailbreakDetector {
    async fn evaluate(
        &self,
        input: &ValidationInput,
        config: &ValidatorConfig,
    ) -> Result<Verdict, ValidationError> {
        let threshold = config.f64_or("threshold", DEFAULT_THRESHOLD);
        let text = input.text();

        if let Some(endpoint) = config.str("endpoint") {
            let score = self
                .remote
                .classify(endpoint, &text, Some("jailbreak"), None)
                .await?;
            debug!(score, threshold, "Remote jailbreak score");
            return Ok(Verdict::from_outcome(self.kind().as_str(), score < threshold)
                .with_score(score)
                .with_detail(serde_json::json!({
                    "source": "remote",
                    "threshold": threshold,
                })));
        }

        let (score, hits, spans) = Self::local_score(&text);
        let verdict = Verdict::from_outcome(self.kind().as_str(), score < threshold)
            .with_score(score)
            .with_detail(serde_json::json!({
                "source": "local",
                "threshold": threshold,
                "signals": hits,
            }));
        if verdict.passed {
            Ok(verdict)
        } else {
            Ok(verdict.with_spans(spans))
        }
    }

    fn kind(&self) -> ValidatorKind {
        ValidatorKind::JailbreakDetector
    }
}
