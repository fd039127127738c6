//! Rule metadata and the registry rules are explicitly registered into

use serde::Serialize;
use std::collections::BTreeMap;

use sharplint_core::{DiagnosticCategory, Diagnostic, Result, SemanticModel, Severity, SharplintError};

/// Metadata describing a rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleMetadata {
    /// Unique identifier for the rule, e.g. `readability/prefer-nameof`
    pub id: &'static str,
    /// Human-readable name for the rule
    pub name: &'static str,
    /// Detailed description of what the rule checks
    pub description: &'static str,
    /// Default severity level
    pub severity: Severity,
    /// Category this rule belongs to
    pub category: DiagnosticCategory,
    /// Tags for organizing and filtering rules
    pub tags: Vec<&'static str>,
    /// Runs without explicit configuration when recommended rules are on
    pub recommended: bool,
    /// Whether diagnostics carry safe fixes
    pub fixable: bool,
}

/// What a rule sees while checking one file
pub struct RuleContext<'a> {
    pub model: &'a SemanticModel,
    /// Effective severity after configuration overrides
    pub severity: Severity,
    /// Rule options from the configuration file
    pub options: Option<&'a serde_json::Value>,
}

impl RuleContext<'_> {
    /// Read a string option, e.g. `{"typeIdentity": "qualified"}`
    pub fn string_option(&self, key: &str) -> Option<&str> {
        self.options
            .and_then(|options| options.get(key))
            .and_then(|value| value.as_str())
    }
}

/// Entry point of a rule
pub type RuleCheckFn = fn(&RuleContext<'_>) -> Result<Vec<Diagnostic>>;

/// A registered rule: its metadata and its check function
#[derive(Clone)]
pub struct RuleDefinition {
    pub metadata: RuleMetadata,
    pub check: RuleCheckFn,
}

impl RuleDefinition {
    pub fn new(metadata: RuleMetadata, check: RuleCheckFn) -> Self {
        Self { metadata, check }
    }

    pub fn id(&self) -> &'static str {
        self.metadata.id
    }
}

impl std::fmt::Debug for RuleDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleDefinition")
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

/// Registry for managing rules
#[derive(Debug, Default, Clone)]
pub struct RuleRegistry {
    rules: BTreeMap<&'static str, RuleDefinition>,
}

impl RuleRegistry {
    /// Create a new, empty rule registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule; ids must be unique
    pub fn register_rule(&mut self, rule: RuleDefinition) -> Result<()> {
        let id = rule.id();
        if id.trim().is_empty() {
            return Err(SharplintError::rule_error(id, "Rule id cannot be empty"));
        }
        if self.rules.contains_key(id) {
            return Err(SharplintError::rule_error(
                id,
                "Rule with this ID is already registered",
            ));
        }
        tracing::debug!("Registered rule '{}'", id);
        self.rules.insert(id, rule);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&RuleDefinition> {
        self.rules.get(id)
    }

    /// All rules, ordered by id
    pub fn rules(&self) -> impl Iterator<Item = &RuleDefinition> {
        self.rules.values()
    }

    pub fn ids(&self) -> Vec<&'static str> {
        self.rules.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
