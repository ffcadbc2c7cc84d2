//! Pipelines: ordered validator steps with per-step on-fail policies
//!
//! A [`PipelineSpec`] is built from caller-supplied [`StepSpec`]s against a
//! [`ValidatorRegistry`]. Building resolves every validator, merges descriptor
//! defaults under the step config and checks the result, so a spec that exists
//! is always runnable. [`PipelineExecutor`] then runs it.

pub mod executor;
pub mod report;

pub use executor::{CancelHandle, ExecutorSettings, PipelineExecutor};
pub use report::{ExecutionReport, RunOutcome, StepAction, StepRecord};

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{OrchestratorError, Result};
use crate::validators::{ValidatorConfig, ValidatorDescriptor, ValidatorRegistry};

/// What the executor does when a step's verdict fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OnFailPolicy {
    /// Abort the run and surface a pipeline execution error
    #[default]
    Exception,
    /// Remove the offending segments and continue
    Filter,
    /// Abort and replace the output with the refusal marker
    Refrain,
    /// Continue with the validator's corrected value
    Fix,
    /// Abort and ask the caller to regenerate the input
    Reask,
    /// Record the failure and continue unchanged
    Noop,
}

impl OnFailPolicy {
    pub const ALL: [OnFailPolicy; 6] = [
        OnFailPolicy::Exception,
        OnFailPolicy::Filter,
        OnFailPolicy::Refrain,
        OnFailPolicy::Fix,
        OnFailPolicy::Reask,
        OnFailPolicy::Noop,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OnFailPolicy::Exception => "EXCEPTION",
            OnFailPolicy::Filter => "FILTER",
            OnFailPolicy::Refrain => "REFRAIN",
            OnFailPolicy::Fix => "FIX",
            OnFailPolicy::Reask => "REASK",
            OnFailPolicy::Noop => "NOOP",
        }
    }

    /// Case-insensitive parse
    pub fn parse(value: &str) -> Result<Self> {
        let wanted = value.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                OrchestratorError::Configuration(format!("unknown onFail policy '{}'", value))
            })
    }
}

impl std::fmt::Display for OnFailPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side of a model call a step guards
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Input,
    Output,
    #[default]
    Both,
}

impl Scope {
    /// Whether a step with this scope runs during a run with `runtime` scope
    pub fn applies_to(&self, runtime: Scope) -> bool {
        *self == Scope::Both || runtime == Scope::Both || *self == runtime
    }
}

/// A step as declared by the caller, before resolution
#[derive(Debug, Clone, PartialEq)]
pub struct StepSpec {
    pub validator: String,
    pub config: ValidatorConfig,
    pub on_fail: OnFailPolicy,
    pub scope: Scope,
    pub timeout: Option<Duration>,
}

impl StepSpec {
    pub fn new(validator: impl Into<String>) -> Self {
        Self {
            validator: validator.into(),
            config: ValidatorConfig::new(),
            on_fail: OnFailPolicy::default(),
            scope: Scope::default(),
            timeout: None,
        }
    }

    pub fn config(mut self, config: ValidatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn on_fail(mut self, policy: OnFailPolicy) -> Self {
        self.on_fail = policy;
        self
    }

    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// A resolved, checked step
#[derive(Debug, Clone)]
pub struct PipelineStep {
    pub descriptor: Arc<ValidatorDescriptor>,
    /// Descriptor defaults with the step's own config on top
    pub config: ValidatorConfig,
    pub on_fail: OnFailPolicy,
    pub scope: Scope,
    /// Step override, else the descriptor's timeout
    pub timeout: Option<Duration>,
}

impl PipelineStep {
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }
}

/// Ordered, non-empty sequence of resolved steps. Immutable once built.
#[derive(Debug, Clone)]
pub struct PipelineSpec {
    steps: Vec<PipelineStep>,
}

impl PipelineSpec {
    /// Resolve and check every step
    ///
    /// # Returns
    /// * `Err(UnknownValidator)` - A step names a validator the registry lacks
    /// * `Err(Configuration)` - Empty pipeline, or a step config fails its schema
    pub fn build(registry: &ValidatorRegistry, steps: Vec<StepSpec>) -> Result<Self> {
        if steps.is_empty() {
            return Err(OrchestratorError::Configuration(
                "pipeline must contain at least one step".to_string(),
            ));
        }

        let steps = steps
            .into_iter()
            .enumerate()
            .map(|(index, step)| Self::resolve_step(registry, index, step))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { steps })
    }

    fn resolve_step(
        registry: &ValidatorRegistry,
        index: usize,
        step: StepSpec,
    ) -> Result<PipelineStep> {
        let descriptor = registry.resolve(&step.validator)?;
        let config = step.config.merged_over(&descriptor.defaults);

        descriptor
            .config_schema
            .validate(&config)
            .map_err(|problems| {
                OrchestratorError::Configuration(format!(
                    "step {} ({}): {}",
                    index,
                    descriptor.name,
                    problems.join("; ")
                ))
            })?;
        descriptor.validator().check_config(&config).map_err(|problem| {
            OrchestratorError::Configuration(format!(
                "step {} ({}): {}",
                index, descriptor.name, problem
            ))
        })?;

        if step.timeout == Some(Duration::ZERO) {
            return Err(OrchestratorError::Configuration(format!(
                "step {} ({}): timeout must be greater than 0",
                index, descriptor.name
            )));
        }
        let timeout = step.timeout.or(descriptor.timeout);

        Ok(PipelineStep {
            descriptor,
            config,
            on_fail: step.on_fail,
            scope: step.scope,
            timeout,
        })
    }

    pub fn steps(&self) -> &[PipelineStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_policy_parse_is_case_insensitive() {
        assert_eq!(OnFailPolicy::parse("fix").unwrap(), OnFailPolicy::Fix);
        assert_eq!(OnFailPolicy::parse(" Noop ").unwrap(), OnFailPolicy::Noop);
        assert_eq!(OnFailPolicy::parse("REASK").unwrap(), OnFailPolicy::Reask);
        assert!(OnFailPolicy::parse("retry").is_err());
        assert_eq!(OnFailPolicy::default(), OnFailPolicy::Exception);
    }

    #[test]
    fn test_scope_applies() {
        assert!(Scope::Both.applies_to(Scope::Input));
        assert!(Scope::Input.applies_to(Scope::Both));
        assert!(Scope::Output.applies_to(Scope::Output));
        assert!(!Scope::Input.applies_to(Scope::Output));
    }

    #[test]
    fn test_empty_pipeline_rejected() {
        let registry = ValidatorRegistry::with_builtins();
        let err = PipelineSpec::build(&registry, vec![]).unwrap_err();
        assert!(matches!(err, OrchestratorError::Configuration(_)));
    }

    #[test]
    fn test_unknown_validator_rejected_at_build() {
        let registry = ValidatorRegistry::with_builtins();
        let err = PipelineSpec::build(
            &registry,
            vec![StepSpec::new("pii_detector"), StepSpec::new("nope")],
        )
        .unwrap_err();
        assert!(matches!(err, OrchestratorError::UnknownValidator(name) if name == "nope"));
    }

    #[test]
    fn test_schema_violations_rejected_at_build() {
        let registry = ValidatorRegistry::with_builtins();
        let step = StepSpec::new("regex_match")
            .config(ValidatorConfig::new().with("mode", "forbid"));
        let err = PipelineSpec::build(&registry, vec![step]).unwrap_err();
        assert!(err.to_string().contains("missing required parameter 'regex'"));

        let step = StepSpec::new("regex_match")
            .config(ValidatorConfig::new().with("regex", "(unclosed"));
        assert!(PipelineSpec::build(&registry, vec![step]).is_err());
    }

    #[test]
    fn test_defaults_and_timeouts_resolved() {
        let mut registry = ValidatorRegistry::new();
        registry
            .register(
                ValidatorDescriptor::builtin(crate::validators::ValidatorKind::Blocklist)
                    .with_defaults(ValidatorConfig::new().with("words", json!(["acme"])))
                    .with_timeout(Some(Duration::from_millis(700))),
            )
            .unwrap();

        let spec = PipelineSpec::build(
            &registry,
            vec![
                StepSpec::new("blocklist"),
                StepSpec::new("blocklist")
                    .config(ValidatorConfig::new().with("replacement", "***"))
                    .timeout(Duration::from_millis(50)),
            ],
        )
        .unwrap();

        let steps = spec.steps();
        assert_eq!(steps[0].timeout, Some(Duration::from_millis(700)));
        assert_eq!(steps[1].timeout, Some(Duration::from_millis(50)));
        assert_eq!(steps[1].config.str("replacement"), Some("***"));
        assert_eq!(steps[1].config.string_list("words").unwrap(), vec!["acme"]);
    }
}
