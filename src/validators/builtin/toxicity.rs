//! Toxic language classifier

use crate::validators::remote::RemoteClassifier;
use crate::validators::schema::{ConfigSchema, ParamSpec, ParamType};
use crate::validators::text::{remove_spans, sentence_spans, tokenize, Span};
use crate::validators::*;
use async_trait::async_trait;

const DEFAULT_THRESHOLD: f64 = 0.5;

/// Severe terms score a sentence on their own; mild ones need company.
const SEVERE: &[&str] = &[
    "kill yourself",
    "kys",
    "retard",
    "retarded",
    "subhuman",
    "worthless piece",
    "die in a fire",
];

const MILD: &[&str] = &[
    "idiot", "idiots", "stupid", "moron", "morons", "dumb", "loser", "losers", "shut up",
    "hate you", "pathetic", "disgusting", "trash", "garbage", "useless", "jerk", "damn",
    "crap", "ugly", "fool",
];

const SEVERE_WEIGHT: f64 = 1.0;
const MILD_WEIGHT: f64 = 0.5;

pub fn schema() -> ConfigSchema {
    ConfigSchema::new()
        .param("threshold", ParamSpec::new(ParamType::Number).range(0.0, 1.0))
        .param("endpoint", ParamSpec::new(ParamType::String))
        .param("extra_terms", ParamSpec::new(ParamType::StringList))
}

/// Scores each sentence for toxic language.
///
/// Locally a sentence scores the capped sum of its lexicon hits (severe 1.0,
/// mild 0.5; `extra_terms` count as mild). With an `endpoint`, each sentence
/// is scored remotely. The verdict fails if any sentence reaches
/// `threshold`; the corrected value drops the toxic sentences.
pub struct ToxicityClassifier {
    remote: RemoteClassifier,
}

impl ToxicityClassifier {
    pub fn new() -> Self {
        Self {
            remote: RemoteClassifier::new(),
        }
    }

    fn local_sentence_score(sentence: &str, extra: &[String]) -> f64 {
        let tokens = tokenize(sentence);
        let joined = format!(" {} ", tokens.join(" "));
        let hits = |term: &str| -> usize {
            let needle = format!(" {} ", tokenize(term).join(" "));
            joined.matches(&needle).count()
        };
        let severe: usize = SEVERE.iter().map(|&t| hits(t)).sum();
        let mild: usize = MILD.iter().map(|&t| hits(t)).sum::<usize>()
            + extra.iter().map(|t| hits(t.as_str())).sum::<usize>();
        f64::min(
            severe as f64 * SEVERE_WEIGHT + mild as f64 * MILD_WEIGHT,
            1.0,
        )
    }
}

impl Default for ToxicityClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Validator for ToxicityClassifier {
    async fn evaluate(
        &self,
        input: &ValidationInput,
        config: &ValidatorConfig,
    ) -> Result<Verdict, ValidationError> {
        let threshold = config.f64_or("threshold", DEFAULT_THRESHOLD);
        let extra = config.string_list("extra_terms")?;
        let text = input.text();
        let sentences = sentence_spans(&text);

        let mut max_score: f64 = 0.0;
        let mut toxic: Vec<Span> = Vec::new();
        for span in &sentences {
            let sentence = span.slice(&text);
            let score = match config.str("endpoint") {
                Some(endpoint) => {
                    self.remote
                        .classify(endpoint, sentence, Some("toxicity"), None)
                        .await?
                }
                None => Self::local_sentence_score(sentence, &extra),
            };
            max_score = max_score.max(score);
            if score >= threshold {
                toxic.push(*span);
            }
        }

        let verdict = Verdict::from_outcome(self.kind().as_str(), toxic.is_empty())
            .with_score(max_score)
            .with_detail(serde_json::json!({
                "threshold": threshold,
                "sentences": sentences.len(),
                "toxic_sentences": toxic.iter().map(|s| s.slice(&text)).collect::<Vec<_>>(),
            }));

        if toxic.is_empty() {
            return Ok(verdict);
        }
        let cleaned = remove_spans(&text, &toxic);
        Ok(verdict.with_corrected_value(cleaned).with_spans(toxic))
    }

    fn kind(&self) -> ValidatorKind {
        ValidatorKind::ToxicityClassifier
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    async fn run(text: &str, config: ValidatorConfig) -> Verdict {
        ToxicityClassifier::new()
            .evaluate(&ValidationInput::from(text), &config)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_drops_toxic_sentence() {
        let verdict = run(
            "Thanks for the report. You are a stupid idiot. See you tomorrow.",
            ValidatorConfig::new(),
        )
        .await;
        assert!(!verdict.passed);
        assert_eq!(verdict.score, Some(1.0));
        assert_eq!(
            verdict.corrected_value.as_deref(),
            Some("Thanks for the report. See you tomorrow.")
        );
    }

    #[tokio::test]
    async fn test_polite_text_passes() {
        let verdict = run("Have a lovely day, friend.", ValidatorConfig::new()).await;
        assert!(verdict.passed);
        assert_eq!(verdict.score, Some(0.0));
    }

    #[tokio::test]
    async fn test_single_mild_term_reaches_default_threshold() {
        assert!(!run("That was dumb.", ValidatorConfig::new()).await.passed);
        let lenient = ValidatorConfig::new().with("threshold", 0.8);
        assert!(run("That was dumb.", lenient).await.passed);
    }

    #[tokio::test]
    async fn test_extra_terms() {
        let config = ValidatorConfig::new().with("extra_terms", "muppet");
        assert!(!run("What a muppet.", config).await.passed);
    }

    #[tokio::test]
    async fn test_remote_scores_each_sentence() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/tox")
                    .json_body_partial(r#"{"text": "Bad one."}"#);
                then.status(200).json_body(serde_json::json!({"score": 0.95}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/tox")
                    .json_body_partial(r#"{"text": "Good one."}"#);
                then.status(200).json_body(serde_json::json!({"score": 0.05}));
            })
            .await;

        let config = ValidatorConfig::new().with("endpoint", server.url("/tox"));
        let verdict = run("Good one. Bad one.", config).await;
        assert!(!verdict.passed);
        assert_eq!(verdict.score, Some(0.95));
        assert_eq!(verdict.corrected_value.as_deref(), Some("Good one."));
    }
}
