//! Pipeline executor
//!
//! Runs the steps of a [`PipelineSpec`] strictly in order. Each evaluation
//! runs in its own tokio task under the step timeout, so a validator that
//! hangs becomes a TIMEOUT verdict and one that panics becomes an
//! INTERNAL_ERROR verdict instead of taking the run down with it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use super::report::{ExecutionReport, RunOutcome, RunTimings, StepAction, StepRecord};
use super::{OnFailPolicy, PipelineSpec, PipelineStep, Scope};
use crate::config::OrchestratorSettings;
use crate::error::{OrchestratorError, Result};
use crate::validators::text::remove_spans;
use crate::validators::{DetailCode, ValidationInput, Verdict};

/// Cooperative cancellation flag, checked before every step
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub struct ExecutorSettings {
    /// Used when neither the step nor its descriptor sets a timeout
    pub default_timeout: Duration,
    /// finalText after a REFRAIN abort
    pub refusal_marker: String,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        (&OrchestratorSettings::default()).into()
    }
}

impl From<&OrchestratorSettings> for ExecutorSettings {
    fn from(settings: &OrchestratorSettings) -> Self {
        Self {
            default_timeout: settings.default_timeout(),
            refusal_marker: settings.refusal_marker.clone(),
        }
    }
}

/// Mutable state of one run
struct Run {
    current: ValidationInput,
    steps: Vec<StepRecord>,
    timings: RunTimings,
    overall_passed: bool,
    started: Instant,
}

impl Run {
    fn new(input: ValidationInput) -> Self {
        Self {
            current: input,
            steps: Vec::new(),
            timings: RunTimings::default(),
            overall_passed: true,
            started: Instant::now(),
        }
    }

    fn record(&mut self, verdict: Verdict, action: StepAction, elapsed: Duration) {
        self.steps.push(StepRecord { verdict, action });
        self.timings.steps.push(elapsed);
    }

    fn finish(
        mut self,
        outcome: RunOutcome,
        final_text: Option<String>,
        raised_exception: Option<String>,
    ) -> ExecutionReport {
        self.timings.total = self.started.elapsed();
        let overall_passed = self.overall_passed && outcome == RunOutcome::Completed;
        ExecutionReport {
            overall_passed,
            outcome,
            steps: self.steps,
            final_text: final_text.unwrap_or_else(|| self.current.into_text()),
            raised_exception,
            timings: self.timings,
        }
    }
}

/// Runs pipelines. Holds no per-run state, so one executor serves any
/// number of concurrent runs.
#[derive(Debug, Clone, Default)]
pub struct PipelineExecutor {
    settings: ExecutorSettings,
}

impl PipelineExecutor {
    pub fn new(settings: ExecutorSettings) -> Self {
        Self { settings }
    }

    /// Run every step regardless of scope, without cancellation
    pub async fn execute(
        &self,
        spec: &PipelineSpec,
        input: impl Into<ValidationInput>,
    ) -> Result<ExecutionReport> {
        self.run(spec, input.into(), Scope::Both, &CancelHandle::new())
            .await
    }

    /// Run a pipeline.
    ///
    /// # Returns
    /// * `Ok(report)` - The run completed, refrained or requires a reask
    /// * `Err(PipelineExecution)` - An EXCEPTION step failed; the error carries the report
    /// * `Err(Cancelled)` - `cancel` fired before a step started
    pub async fn run(
        &self,
        spec: &PipelineSpec,
        input: ValidationInput,
        scope: Scope,
        cancel: &CancelHandle,
    ) -> Result<ExecutionReport> {
        let mut run = Run::new(input);

        for (index, step) in spec.steps().iter().enumerate() {
            if cancel.is_cancelled() {
                info!(step = index, "Pipeline run cancelled");
                return Err(OrchestratorError::Cancelled);
            }
            if !step.scope.applies_to(scope) {
                debug!(step = index, validator = step.name(), "Step out of scope, skipping");
                continue;
            }

            let step_started = Instant::now();
            let mut verdict = self.evaluate_step(step, &run.current).await;
            verdict.validator_name = step.name().to_string();
            let elapsed = step_started.elapsed();

            debug!(
                step = index,
                validator = step.name(),
                passed = verdict.passed,
                policy = %step.on_fail,
                elapsed_ms = elapsed.as_millis() as u64,
                "Step evaluated"
            );

            if verdict.passed {
                run.record(verdict, StepAction::Passed, elapsed);
                continue;
            }

            match step.on_fail {
                OnFailPolicy::Noop => {
                    run.overall_passed = false;
                    run.record(verdict, StepAction::Ignored, elapsed);
                }
                OnFailPolicy::Fix => match verdict.corrected_value.clone() {
                    Some(fixed) => {
                        run.current = ValidationInput::Text(fixed);
                        run.record(verdict, StepAction::Fixed, elapsed);
                    }
                    None => {
                        run.overall_passed = false;
                        run.record(verdict, StepAction::Unresolved, elapsed);
                    }
                },
                OnFailPolicy::Filter => {
                    run.overall_passed = false;
                    if verdict.spans.is_empty() {
                        run.record(verdict, StepAction::Unresolved, elapsed);
                    } else {
                        let filtered = remove_spans(&run.current.text(), &verdict.spans);
                        run.current = ValidationInput::Text(filtered);
                        run.record(verdict, StepAction::Filtered, elapsed);
                    }
                }
                OnFailPolicy::Refrain => {
                    run.record(verdict, StepAction::Refrained, elapsed);
                    let report = run.finish(
                        RunOutcome::Refrained,
                        Some(self.settings.refusal_marker.clone()),
                        None,
                    );
                    info!(validator = step.name(), "Pipeline refrained");
                    return Ok(report);
                }
                OnFailPolicy::Reask => {
                    run.record(verdict, StepAction::Reasked, elapsed);
                    let report = run.finish(RunOutcome::ReaskRequired, None, None);
                    info!(validator = step.name(), "Pipeline requires reask");
                    return Ok(report);
                }
                OnFailPolicy::Exception => {
                    let message = failure_message(&verdict);
                    run.record(verdict, StepAction::Raised, elapsed);
                    let report = run.finish(RunOutcome::Aborted, None, Some(message.clone()));
                    warn!(validator = step.name(), %message, "Pipeline aborted");
                    return Err(OrchestratorError::PipelineExecution {
                        validator: step.name().to_string(),
                        message,
                        report: Box::new(report),
                    });
                }
            }
        }

        let report = run.finish(RunOutcome::Completed, None, None);
        info!(
            steps = report.steps.len(),
            passed = report.overall_passed,
            elapsed_ms = report.timings.total.as_millis() as u64,
            "Pipeline completed"
        );
        Ok(report)
    }

    /// Evaluate one step, converting timeouts, errors and panics into verdicts
    async fn evaluate_step(&self, step: &PipelineStep, input: &ValidationInput) -> Verdict {
        let name = step.name();
        let timeout = step.timeout.unwrap_or(self.settings.default_timeout);

        let validator = Arc::clone(step.descriptor.validator());
        let input = input.clone();
        let config = step.config.clone();
        let mut task = tokio::spawn(async move { validator.evaluate(&input, &config).await });

        let outcome = tokio::time::timeout(timeout, &mut task).await;
        match outcome {
            Err(_) => {
                task.abort();
                warn!(
                    validator = name,
                    timeout_ms = timeout.as_millis() as u64,
                    "Validator timed out"
                );
                Verdict::from_code(
                    name,
                    DetailCode::Timeout,
                    format!("validator did not finish within {} ms", timeout.as_millis()),
                )
            }
            Ok(Err(join_error)) => {
                let message = if join_error.is_panic() {
                    panic_message(join_error.into_panic())
                } else {
                    join_error.to_string()
                };
                error!(validator = name, %message, "Validator crashed");
                Verdict::from_code(name, DetailCode::InternalError, message)
            }
            Ok(Ok(Err(validation_error))) => {
                warn!(validator = name, error = %validation_error, "Validator could not evaluate");
                validation_error.into_verdict(name)
            }
            Ok(Ok(Ok(verdict))) => verdict,
        }
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("validator panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("validator panicked: {}", s)
    } else {
        "validator panicked".to_string()
    }
}

fn failure_message(verdict: &Verdict) -> String {
    verdict
        .detail
        .as_ref()
        .and_then(|d| d.get("message"))
        .and_then(|m| m.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| format!("validator '{}' failed", verdict.validator_name))
}
