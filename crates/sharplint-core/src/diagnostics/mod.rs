//! Diagnostic types and rendering
//!
//! - `types`: diagnostics, locations, suggestions and the source map
//! - `renderer`: terminal code frames and JSON output
//! - `diff`: unified diffs for dry-run previews

pub mod diff;
pub mod renderer;
pub mod types;

pub use diff::DiffRenderer;
pub use renderer::{DiagnosticRenderer, OutputFormat};
pub use types::*;
