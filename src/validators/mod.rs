//! Validator framework
//!
//! This module provides the capability contract every content check
//! implements, the values flowing through it, and the registry that maps
//! pipeline step names onto implementations.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │       Validator Registry                │
//! ├─────────────────────────────────────────┤
//! │  • Built-in catalog + startup manifest  │
//! │  • Name / hub id resolution             │
//! │  • Descriptor schemas and timeouts      │
//! └────────┬────────────────────────────────┘
//!          │
//!          ├──> Local validators (PII, regex, JSON schema, URL, ...)
//!          └──> Remote-capable validators (jailbreak, toxicity)
//! ```
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use guardrail_orchestrator::validators::*;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = ValidatorRegistry::with_builtins();
//! let descriptor = registry.resolve("hub://guardrails/detect_pii")?;
//!
//! let verdict = descriptor
//!     .validator()
//!     .evaluate(&ValidationInput::from("mail me at a@b.io"), &ValidatorConfig::new())
//!     .await?;
//! assert!(!verdict.passed);
//! # Ok(())
//! # }
//! ```

pub mod builtin;
pub mod context;
pub mod registry;
pub mod remote;
pub mod result;
pub mod schema;
pub mod text;
pub mod traits;

// Re-export commonly used types
pub use context::{ValidationInput, ValidatorConfig};
pub use registry::{ValidatorDescriptor, ValidatorRegistry};
pub use result::{DetailCode, ValidationError, Verdict};
pub use schema::{ConfigSchema, ParamSpec, ParamType};
pub use text::Span;
pub use traits::{Validator, ValidatorKind};
