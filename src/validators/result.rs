//! Verdict types produced by validators

use serde::{Deserialize, Serialize};
use std::fmt;

use super::text::Span;

/// Machine-readable reason attached to a verdict that did not come from the
/// validator's own rule evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DetailCode {
    /// The step exceeded its time budget
    Timeout,

    /// A remote classification resource could not be reached or answered garbage
    RemoteUnavailable,

    /// The validator failed or panicked while evaluating
    InternalError,
}

impl DetailCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetailCode::Timeout => "TIMEOUT",
            DetailCode::RemoteUnavailable => "REMOTE_UNAVAILABLE",
            DetailCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for DetailCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one validator evaluating one input.
///
/// Immutable once produced; the executor records it as-is and applies the
/// step's on-fail policy on top.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    /// Name of the validator that produced this verdict
    pub validator_name: String,

    /// Whether the input satisfied the rule
    pub passed: bool,

    /// Optional numeric score (meaning is validator-specific)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,

    /// Optional structured metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<serde_json::Value>,

    /// Auto-fixed version of the input, only for validators that can fix
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corrected_value: Option<String>,

    /// Byte ranges of the offending segments, when the validator can localize them
    #[serde(skip)]
    pub spans: Vec<Span>,
}

impl Verdict {
    /// Create a passing verdict
    pub fn pass(validator_name: impl Into<String>) -> Self {
        Self {
            validator_name: validator_name.into(),
            passed: true,
            score: None,
            detail: None,
            corrected_value: None,
            spans: Vec::new(),
        }
    }

    /// Create a failing verdict
    pub fn fail(validator_name: impl Into<String>) -> Self {
        Self {
            passed: false,
            ..Self::pass(validator_name)
        }
    }

    /// Create a pass or fail verdict from a boolean
    pub fn from_outcome(validator_name: impl Into<String>, passed: bool) -> Self {
        Self {
            passed,
            ..Self::pass(validator_name)
        }
    }

    /// Failing verdict carrying one of the fixed detail codes
    pub fn from_code(
        validator_name: impl Into<String>,
        code: DetailCode,
        message: impl Into<String>,
    ) -> Self {
        Self::fail(validator_name).with_detail(serde_json::json!({
            "code": code,
            "message": message.into(),
        }))
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.detail = Some(detail);
        self
    }

    pub fn with_corrected_value(mut self, value: impl Into<String>) -> Self {
        self.corrected_value = Some(value.into());
        self
    }

    pub fn with_spans(mut self, spans: Vec<Span>) -> Self {
        self.spans = spans;
        self
    }

    /// The detail code, if the verdict carries one
    pub fn code(&self) -> Option<DetailCode> {
        self.detail
            .as_ref()
            .and_then(|d| d.get("code"))
            .and_then(|c| serde_json::from_value(c.clone()).ok())
    }
}

/// Error type for validator faults.
///
/// None of these escape a pipeline run directly: the executor turns each into
/// a failing verdict with the matching [`DetailCode`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// Validator configuration could not be used at evaluation time
    #[error("Config error: {0}")]
    Config(String),

    /// External classification resource unreachable or misbehaving
    #[error("Remote error: {0}")]
    Remote(String),

    /// Unexpected validator behavior
    #[error("Internal error: {0}")]
    Internal(String),

    /// The validator gave up waiting on its own
    #[error("Validation timeout")]
    Timeout,
}

impl ValidationError {
    /// Map the fault onto the verdict detail code it produces
    pub fn detail_code(&self) -> DetailCode {
        match self {
            ValidationError::Config(_) | ValidationError::Internal(_) => DetailCode::InternalError,
            ValidationError::Remote(_) => DetailCode::RemoteUnavailable,
            ValidationError::Timeout => DetailCode::Timeout,
        }
    }

    /// Convert into the failing verdict recorded for the step
    pub fn into_verdict(self, validator_name: &str) -> Verdict {
        Verdict::from_code(validator_name, self.detail_code(), self.to_string())
    }
}
