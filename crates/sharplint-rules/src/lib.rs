//! Sharplint Rules
//!
//! Built-in rules and rule engine for sharplint.
//! This crate provides the default rule set, the registry rules are
//! explicitly registered into, and the engine that runs them over files.

pub mod builtin;
pub mod engine;
pub mod registry;

// Re-export commonly used types
pub use builtin::prefer_nameof::{self, Finding, TypeMatchPolicy};
pub use builtin::register_builtin_rules;
pub use engine::{
    FileError, FileFixReport, FileReport, FixOutcome, FixReport, LintReport, MAX_FIX_PASSES,
    RuleEngine,
};
pub use registry::{RuleCheckFn, RuleContext, RuleDefinition, RuleMetadata, RuleRegistry};

/// Initialize a registry holding every built-in rule
pub fn init_builtin_rules() -> sharplint_core::Result<RuleRegistry> {
    let mut registry = RuleRegistry::new();
    register_builtin_rules(&mut registry)?;
    tracing::debug!("Initialized built-in rules registry with {} rules", registry.len());
    Ok(registry)
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
