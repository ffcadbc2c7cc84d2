//! Validator registry - central catalog of available validators

use super::*;
use crate::config::ValidatorEntry;
use crate::error::{OrchestratorError, Result};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const HUB_PREFIX: &str = "hub://";

/// An installed validator: identity, config schema and implementation.
///
/// Immutable once registered.
#[derive(Clone)]
pub struct ValidatorDescriptor {
    /// Name pipeline steps refer to
    pub name: String,

    /// Remote hub identifier (e.g. `hub://guardrails/detect_pii`)
    pub source_id: String,

    /// Built-in implementation key
    pub kind: ValidatorKind,

    /// Parameters accepted by step configs
    pub config_schema: ConfigSchema,

    /// Config merged under every step's own config
    pub defaults: ValidatorConfig,

    /// Step timeout; falls back to the orchestrator default when unset
    pub timeout: Option<Duration>,

    /// Short names accepted besides the name and the hub slug
    pub aliases: Vec<String>,

    validator: Arc<dyn Validator>,
}

impl ValidatorDescriptor {
    pub fn new(
        name: impl Into<String>,
        source_id: impl Into<String>,
        validator: Arc<dyn Validator>,
        config_schema: ConfigSchema,
    ) -> Self {
        Self {
            name: name.into(),
            source_id: source_id.into(),
            kind: validator.kind(),
            config_schema,
            defaults: ValidatorConfig::new(),
            timeout: None,
            aliases: Vec::new(),
            validator,
        }
    }

    /// Descriptor for a built-in catalog entry
    pub fn builtin(kind: ValidatorKind) -> Self {
        Self::new(
            kind.as_str(),
            format!("{}{}", HUB_PREFIX, builtin::source_id(kind)),
            builtin::create(kind),
            builtin::schema_for(kind),
        )
        .with_aliases(builtin::aliases(kind).iter().map(|a| a.to_string()).collect())
    }

    /// Descriptor for a manifest entry
    pub fn from_entry(entry: &ValidatorEntry) -> Result<Self> {
        let kind = entry.kind()?;
        let descriptor = Self::new(
            entry.name.trim(),
            entry.source_id(),
            builtin::create(kind),
            builtin::schema_for(kind),
        )
        .with_timeout(entry.timeout())
        .with_defaults(entry.defaults.clone());

        descriptor
            .config_schema
            .validate_partial(&descriptor.defaults)
            .map_err(|problems| {
                OrchestratorError::Configuration(format!(
                    "validator '{}' defaults: {}",
                    entry.name,
                    problems.join("; ")
                ))
            })?;
        Ok(descriptor)
    }

    pub fn with_defaults(mut self, defaults: ValidatorConfig) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_aliases(mut self, aliases: Vec<String>) -> Self {
        self.aliases = aliases;
        self
    }

    /// Last segment of the hub id (`hub://guardrails/detect_pii:1.0` → `detect_pii`)
    pub fn slug(&self) -> String {
        let source = normalize_source(&self.source_id);
        let last = source.rsplit('/').next().unwrap_or_default();
        normalize_name(last.split(':').next().unwrap_or_default())
    }

    /// The implementation behind this descriptor
    pub fn validator(&self) -> &Arc<dyn Validator> {
        &self.validator
    }
}

impl std::fmt::Debug for ValidatorDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidatorDescriptor")
            .field("name", &self.name)
            .field("source_id", &self.source_id)
            .field("kind", &self.kind)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Lookup key for names: trimmed, lowercased, spaces and dashes as underscores
fn normalize_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_whitespace() || c == '-' { '_' } else { c })
        .collect()
}

/// Lookup key for hub ids: prefix dropped, lowercased
fn normalize_source(source_id: &str) -> String {
    let id = source_id.trim();
    id.strip_prefix(HUB_PREFIX).unwrap_or(id).to_lowercase()
}

/// Registry of all installed validators.
///
/// Populated once at startup and read-only afterwards, so it is shared
/// across requests behind an `Arc` without locking.
pub struct ValidatorRegistry {
    /// Descriptors in registration order
    descriptors: Vec<Arc<ValidatorDescriptor>>,

    /// Normalized name → position
    by_name: HashMap<String, usize>,

    /// Normalized source id → position (latest registration wins)
    by_source: HashMap<String, usize>,

    /// Hub slug or alias → position (latest registration wins)
    by_alias: HashMap<String, usize>,
}

impl ValidatorRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            descriptors: Vec::new(),
            by_name: HashMap::new(),
            by_source: HashMap::new(),
            by_alias: HashMap::new(),
        }
    }

    /// Create a registry holding the built-in catalog
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_builtin_validators();
        registry
    }

    /// Register all built-in validators
    fn register_builtin_validators(&mut self) {
        info!("🔧 Registering built-in validators");

        for kind in ValidatorKind::ALL {
            if let Err(e) = self.register(ValidatorDescriptor::builtin(kind)) {
                debug!("Skipping built-in validator {}: {}", kind, e);
            }
        }

        info!("✅ Registered {} built-in validators", self.descriptors.len());
    }

    /// Register a descriptor
    ///
    /// # Returns
    /// * `Ok(())` - Descriptor added
    /// * `Err(DuplicateName)` - A descriptor with the same (normalized) name exists
    pub fn register(&mut self, descriptor: ValidatorDescriptor) -> Result<()> {
        let key = normalize_name(&descriptor.name);
        if key.is_empty() {
            return Err(OrchestratorError::Configuration(
                "validator name must not be empty".to_string(),
            ));
        }
        if self.by_name.contains_key(&key) {
            return Err(OrchestratorError::DuplicateName(descriptor.name));
        }

        debug!(
            "Registering validator: {} ({}, {})",
            descriptor.name, descriptor.kind, descriptor.source_id
        );

        let position = self.descriptors.len();
        self.by_name.insert(key, position);
        self.by_source
            .insert(normalize_source(&descriptor.source_id), position);
        let slug = descriptor.slug();
        if !slug.is_empty() {
            self.by_alias.insert(slug, position);
        }
        for alias in &descriptor.aliases {
            self.by_alias.insert(normalize_name(alias), position);
        }
        self.descriptors.push(Arc::new(descriptor));
        Ok(())
    }

    /// Resolve a step's validator reference.
    ///
    /// Accepts the registered name, the name in another case/spacing, the
    /// descriptor's source id with or without the `hub://` prefix, or the
    /// last segment of that id (`detect_pii`) and the built-in aliases.
    pub fn resolve(&self, name: &str) -> Result<Arc<ValidatorDescriptor>> {
        if let Some(found) = self.descriptors.iter().find(|d| d.name == name) {
            return Ok(Arc::clone(found));
        }

        let key = normalize_name(name);
        self.by_name
            .get(&key)
            .or_else(|| self.by_source.get(&normalize_source(name)))
            .or_else(|| self.by_alias.get(&key))
            .and_then(|&i| self.descriptors.get(i))
            .cloned()
            .ok_or_else(|| OrchestratorError::UnknownValidator(name.to_string()))
    }

    /// All descriptors in registration order
    pub fn list_all(&self) -> &[Arc<ValidatorDescriptor>] {
        &self.descriptors
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Register the validators of a startup manifest
    ///
    /// Stops at the first entry that cannot be registered.
    pub fn load_from_manifest(&mut self, entries: &[ValidatorEntry]) -> Result<()> {
        info!("🔧 Loading {} validators from manifest", entries.len());

        for entry in entries {
            let descriptor = ValidatorDescriptor::from_entry(entry)?;
            self.register(descriptor)?;
        }

        info!("✅ Successfully loaded {} validators", entries.len());
        Ok(())
    }
}

impl Default for ValidatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ValidatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidatorRegistry")
            .field(
                "validators",
                &self.descriptors.iter().map(|d| &d.name).collect::<Vec<_>>(),
            )
            .finish()
    }
}
