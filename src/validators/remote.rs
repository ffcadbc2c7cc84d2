//! Client for remote classification endpoints
//!
//! Validators that can delegate scoring to a model server accept an
//! `endpoint` parameter. The endpoint receives `{"text": "...", "label": "..."}`
//! and must answer `{"score": <number in [0, 1]>}`. `label` names the check
//! asking (`jailbreak`, `toxicity`) so one model server can host several
//! classifiers; it is omitted when the caller passes none.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use super::ValidationError;

#[derive(Debug, Serialize)]
struct ClassifyRequest<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ClassifyResponse {
    score: f64,
}

/// HTTP classifier client
#[derive(Debug, Clone)]
pub struct RemoteClassifier {
    client: reqwest::Client,
}

impl RemoteClassifier {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Score `text` against `endpoint`.
    ///
    /// Transport errors, non-2xx statuses, undecodable bodies and scores
    /// outside `[0, 1]` are all reported as [`ValidationError::Remote`].
    pub async fn classify(
        &self,
        endpoint: &str,
        text: &str,
        label: Option<&str>,
        timeout: Option<Duration>,
    ) -> Result<f64, ValidationError> {
        debug!(endpoint, "Calling remote classifier");

        let mut request = self
            .client
            .post(endpoint)
            .json(&ClassifyRequest { text, label });
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|e| {
            warn!(endpoint, error = %e, "Remote classifier unreachable");
            ValidationError::Remote(format!("request to {} failed: {}", endpoint, e))
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(endpoint, %status, "Remote classifier returned error status");
            return Err(ValidationError::Remote(format!(
                "{} answered with status {}",
                endpoint, status
            )));
        }

        let body: ClassifyResponse = response.json().await.map_err(|e| {
            ValidationError::Remote(format!("invalid response from {}: {}", endpoint, e))
        })?;

        if !(0.0..=1.0).contains(&body.score) {
            return Err(ValidationError::Remote(format!(
                "score {} from {} is outside [0, 1]",
                body.score, endpoint
            )));
        }

        Ok(body.score)
    }
}

impl Default for RemoteClassifier {
    fn default() -> Self {
        Self::new()
    }
}
