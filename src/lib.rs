//! # Guardrail Orchestrator
//!
//! Applies ordered pipelines of content validators (PII, jailbreak, topic,
//! JSON schema, regex, toxicity, URL, provenance, sensitive topics,
//! blocklist, competitor mentions) to text and aggregates their verdicts under per-step on-fail
//! policies.
//!
//! ## Layout
//! - [`validators`] - the validator contract, built-in catalog and registry
//! - [`pipeline`] - pipeline specs, the executor and execution reports
//! - [`api`] - request/response bodies and the service handler
//! - [`config`] - TOML configuration and the startup manifest

pub mod api;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod validators;

pub use error::{OrchestratorError, Result};
