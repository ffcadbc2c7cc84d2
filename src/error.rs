//! Top-level error type

use crate::pipeline::ExecutionReport;

/// Errors surfaced to callers of the orchestrator.
///
/// Build-time variants reject a request before any validator runs. Per-step
/// faults never appear here unless the step's policy is EXCEPTION, in which
/// case the run's report travels inside [`OrchestratorError::PipelineExecution`].
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    /// Invalid pipeline, step config or service configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unknown validator: {0}")]
    UnknownValidator(String),

    #[error("Validator '{0}' is already registered")]
    DuplicateName(String),

    /// A step with the EXCEPTION policy failed
    #[error("Validation failed for '{validator}': {message}")]
    PipelineExecution {
        validator: String,
        message: String,
        report: Box<ExecutionReport>,
    },

    #[error("Pipeline run cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

impl OrchestratorError {
    /// True for errors caused by the request rather than by a run
    pub fn is_build_error(&self) -> bool {
        matches!(
            self,
            OrchestratorError::Configuration(_)
                | OrchestratorError::UnknownValidator(_)
                | OrchestratorError::DuplicateName(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;
