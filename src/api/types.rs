//! Request and response bodies

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{OrchestratorError, Result};
use crate::pipeline::{ExecutionReport, OnFailPolicy, RunOutcome, Scope, StepAction, StepSpec};
use crate::validators::{ValidationInput, ValidatorConfig};
use std::time::Duration;

/// `POST /validate` body
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateRequest {
    /// Text to validate; any other JSON value is validated as structured input
    pub text: Value,
    pub pipeline: Vec<StepRequest>,
    #[serde(default)]
    pub scope: Option<Scope>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRequest {
    pub validator: String,
    #[serde(default)]
    pub config: Value,
    /// Policy name, any case; EXCEPTION when omitted
    #[serde(default)]
    pub on_fail: Option<String>,
    #[serde(default)]
    pub scope: Option<Scope>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl ValidateRequest {
    pub fn input(&self) -> ValidationInput {
        ValidationInput::from_value(self.text.clone())
    }

    /// Size of the text to validate, in bytes
    pub fn text_len(&self) -> usize {
        match &self.text {
            Value::String(s) => s.len(),
            other => other.to_string().len(),
        }
    }
}

impl StepRequest {
    pub fn to_step_spec(&self) -> Result<StepSpec> {
        let config = ValidatorConfig::from_value(self.config.clone()).map_err(|e| {
            OrchestratorError::Configuration(format!("step '{}': {}", self.validator, e))
        })?;
        let on_fail = match &self.on_fail {
            Some(policy) => OnFailPolicy::parse(policy)?,
            None => OnFailPolicy::default(),
        };

        let mut step = StepSpec::new(&self.validator)
            .config(config)
            .on_fail(on_fail)
            .scope(self.scope.unwrap_or_default());
        if let Some(ms) = self.timeout_ms {
            step = step.timeout(Duration::from_millis(ms));
        }
        Ok(step)
    }
}

/// One verdict as reported to callers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerdictView {
    pub validator: String,
    pub passed: bool,
    pub score: Option<f64>,
    pub detail: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corrected_value: Option<String>,
    pub action: StepAction,
}

/// Response body
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateResponse {
    pub passed: bool,
    /// `null` when the request was rejected before running
    pub final_text: Option<String>,
    pub verdicts: Vec<VerdictView>,
    pub error: Option<String>,
    pub reask: bool,
    pub outcome: Option<RunOutcome>,
    pub request_id: String,
}

impl ValidateResponse {
    pub fn from_report(report: &ExecutionReport, request_id: &str) -> Self {
        Self {
            passed: report.overall_passed,
            final_text: Some(report.final_text.clone()),
            verdicts: report
                .steps
                .iter()
                .map(|step| VerdictView {
                    validator: step.verdict.validator_name.clone(),
                    passed: step.verdict.passed,
                    score: step.verdict.score,
                    detail: step.verdict.detail.clone(),
                    corrected_value: step.verdict.corrected_value.clone(),
                    action: step.action,
                })
                .collect(),
            error: report.raised_exception.clone(),
            reask: report.reask(),
            outcome: Some(report.outcome),
            request_id: request_id.to_string(),
        }
    }

    /// Response for a request that never ran
    pub fn rejected(error: impl Into<String>, request_id: &str) -> Self {
        Self {
            passed: false,
            final_text: None,
            verdicts: Vec::new(),
            error: Some(error.into()),
            reask: false,
            outcome: None,
            request_id: request_id.to_string(),
        }
    }
}

/// Status code plus body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceResponse {
    pub status: u16,
    pub body: ValidateResponse,
}
