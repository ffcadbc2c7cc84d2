//! Configuration structures for the guardrail orchestrator.
//!
//! The service reads one TOML file at startup: orchestrator limits, logging,
//! and the manifest of validators to register on top of the built-in
//! catalog. Every field has a default, so an empty file is a valid config.

use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{OrchestratorError, Result};
use crate::validators::{ValidatorConfig, ValidatorKind};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub orchestrator: OrchestratorSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
    /// Startup manifest
    #[serde(default)]
    pub validators: Vec<ValidatorEntry>,
}

/// Execution limits and defaults
#[derive(Debug, Clone, Deserialize)]
pub struct OrchestratorSettings {
    /// Per-step timeout when neither the step nor its descriptor sets one
    #[serde(default = "default_timeout_ms")]
    pub default_timeout_ms: u64,

    /// finalText reported after a REFRAIN abort
    #[serde(default = "default_refusal_marker")]
    pub refusal_marker: String,

    /// Largest accepted request text, in bytes
    #[serde(default = "default_max_text_bytes")]
    pub max_text_bytes: usize,

    /// Register the built-in catalog before the manifest
    #[serde(default = "default_true")]
    pub include_builtins: bool,
}

/// Logging settings
///
/// # Example TOML
/// ```toml
/// [logging]
/// level = "debug,reqwest=warn"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    #[serde(default = "default_level")]
    pub level: String,
}

/// One validator declared in the startup manifest
#[derive(Debug, Clone, Deserialize)]
pub struct ValidatorEntry {
    /// Name pipeline steps refer to
    pub name: String,

    /// Hub identifier; defaults to `hub://<name>`
    #[serde(default)]
    pub source_id: Option<String>,

    /// Built-in implementation backing this entry
    pub kind: String,

    /// Descriptor-level step timeout
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// Config merged under every step's own config
    #[serde(default)]
    pub defaults: ValidatorConfig,
}

fn default_timeout_ms() -> u64 {
    3000
}

fn default_refusal_marker() -> String {
    "[REFRAINED]".to_string()
}

fn default_max_text_bytes() -> usize {
    1024 * 1024
}

fn default_true() -> bool {
    true
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            default_timeout_ms: default_timeout_ms(),
            refusal_marker: default_refusal_marker(),
            max_text_bytes: default_max_text_bytes(),
            include_builtins: true,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

impl OrchestratorSettings {
    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }
}

impl ValidatorEntry {
    pub fn kind(&self) -> Result<ValidatorKind> {
        ValidatorKind::parse(&self.kind).ok_or_else(|| {
            OrchestratorError::Configuration(format!(
                "validator '{}' has unknown kind '{}'",
                self.name, self.kind
            ))
        })
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    pub fn source_id(&self) -> String {
        match &self.source_id {
            Some(id) => id.clone(),
            None => format!("hub://{}", self.name),
        }
    }
}

impl Config {
    /// Load and validate configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the service cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.orchestrator.default_timeout_ms == 0 {
            return Err(OrchestratorError::Configuration(
                "orchestrator.default_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.orchestrator.max_text_bytes == 0 {
            return Err(OrchestratorError::Configuration(
                "orchestrator.max_text_bytes must be greater than 0".to_string(),
            ));
        }
        for entry in &self.validators {
            if entry.name.trim().is_empty() {
                return Err(OrchestratorError::Configuration(
                    "validator entries need a non-empty name".to_string(),
                ));
            }
            entry.kind()?;
            if entry.timeout_ms == Some(0) {
                return Err(OrchestratorError::Configuration(format!(
                    "validator '{}': timeout_ms must be greater than 0",
                    entry.name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml_str = r#"
[orchestrator]
default_timeout_ms = 1500
refusal_marker = "Sorry, I can't help with that."

[logging]
level = "debug"

[[validators]]
name = "detect_pii"
source_id = "hub://guardrails/detect_pii"
kind = "pii_detector"
timeout_ms = 2000

[validators.defaults]
pii_types = ["email", "ssn"]

[[validators]]
name = "no_competitors"
kind = "blocklist"
"#;

        let config = Config::from_toml(toml_str).unwrap();
        assert_eq!(config.orchestrator.default_timeout_ms, 1500);
        assert_eq!(config.orchestrator.max_text_bytes, 1024 * 1024);
        assert!(config.orchestrator.include_builtins);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.validators.len(), 2);

        let pii = &config.validators[0];
        assert_eq!(pii.kind().unwrap(), ValidatorKind::PiiDetector);
        assert_eq!(pii.timeout(), Some(Duration::from_millis(2000)));
        assert_eq!(
            pii.defaults.string_list("pii_types").unwrap(),
            vec!["email", "ssn"]
        );
        assert_eq!(config.validators[1].source_id(), "hub://no_competitors");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.orchestrator.default_timeout(), Duration::from_secs(3));
        assert_eq!(config.orchestrator.refusal_marker, "[REFRAINED]");
        assert_eq!(config.logging.level, "info");
        assert!(config.validators.is_empty());
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let err = Config::from_toml("[orchestrator]\ndefault_timeout_ms = 0\n").unwrap_err();
        assert!(matches!(err, OrchestratorError::Configuration(_)));
    }

    #[test]
    fn test_rejects_unknown_kind() {
        let toml_str = r#"
[[validators]]
name = "mystery"
kind = "crystal_ball"
"#;
        let err = Config::from_toml(toml_str).unwrap_err();
        assert!(err.to_string().contains("crystal_ball"));
    }

    #[test]
    fn test_rejects_empty_name() {
        let toml_str = r#"
[[validators]]
name = "  "
kind = "blocklist"
"#;
        assert!(Config::from_toml(toml_str).is_err());
    }

    #[test]
    fn test_malformed_toml() {
        let err = Config::from_toml("[orchestrator\n").unwrap_err();
        assert!(matches!(err, OrchestratorError::ConfigParse(_)));
    }
}
