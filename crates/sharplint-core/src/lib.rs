//! Sharplint Core
//!
//! Core analysis engine for C# source files.
//! This crate provides the lossless syntax tree, the semantic model, the
//! diagnostic and autofix machinery, and configuration loading that rules
//! and front ends build on.

pub mod autofix;
pub mod cancellation;
pub mod config;
pub mod cst; // Concrete Syntax Tree (lossless, Rowan-based)
pub mod diagnostics;
pub mod discovery;
pub mod error;
pub mod result;
pub mod semantic;

// Re-export commonly used types
pub use autofix::{
    AppliedFixes, AutofixEngine, DefaultAutofixEngine, Fix, FixConfig, FixResult,
};
pub use cancellation::CancellationToken;
pub use config::{
    ConfigLoader, FilesConfiguration, LinterConfiguration, RuleConfig, RuleSetting, RuleSeverity,
    RulesConfiguration, SharplintConfig,
};
pub use diagnostics::{
    Applicability, CodeSuggestion, Diagnostic, DiagnosticCategory, DiagnosticRenderer,
    DiffRenderer, Location, OutputFormat, Severity, SourceMap,
};
pub use discovery::{DefaultFileDiscovery, FileDiscovery, discover_paths};
pub use error::{ErrorKind, SharplintError};
pub use result::{Result, ResultExt};
pub use semantic::{SemanticModel, SemanticQueries, TypeIdentity};

/// Initialize the tracing subscriber for logging
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sharplint=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true),
        )
        .init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
