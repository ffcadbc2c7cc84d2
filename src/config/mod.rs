//! Configuration module for the guardrail orchestrator.
//!
//! This module handles loading the TOML configuration file: orchestrator
//! limits, logging and the startup validator manifest.

mod config;

pub use config::{Config, LoggingSettings, OrchestratorSettings, ValidatorEntry};
