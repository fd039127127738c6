//! Diagnostic types for C# linting
//!
//! Provides diagnostics with precise positions, code suggestions with
//! applicability levels, and a source map for offset conversion.

use rowan::TextRange;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Represents a diagnostic message from linting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Unique identifier for the rule that generated this diagnostic
    pub rule_id: String,
    /// Severity level of the diagnostic
    pub severity: Severity,
    /// Human-readable message
    pub message: String,
    /// Location in the source file
    pub location: Location,
    /// Code suggestions for fixing the issue
    pub suggestions: Vec<CodeSuggestion>,
    /// Optional error code
    pub code: Option<String>,
    /// Optional source of the diagnostic (e.g., "parser", "rule-engine")
    pub source: Option<String>,
    /// Category of the diagnostic
    pub category: Option<DiagnosticCategory>,
}

/// Severity levels for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Hint,
    Info,
    Warning,
    Error,
}

/// Location information for diagnostics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// File path
    pub file: PathBuf,
    /// Line number (1-based)
    pub line: usize,
    /// Column number (1-based, in characters)
    pub column: usize,
    pub end_line: Option<usize>,
    pub end_column: Option<usize>,
    /// Byte offset in the file
    pub offset: usize,
    /// Length of the span in bytes
    pub length: usize,
}

/// Indicates how a tool should manage this suggestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Applicability {
    /// The suggestion is definitely correct and may be applied automatically
    Always,
    /// The suggestion may change behavior and requires review
    MaybeIncorrect,
}

impl fmt::Display for Applicability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Applicability::Always => write!(f, "safe"),
            Applicability::MaybeIncorrect => write!(f, "unsafe"),
        }
    }
}

/// A code suggestion that can be automatically applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeSuggestion {
    /// Description of the suggested fix
    pub message: String,
    /// The replacement text to apply
    pub replacement: String,
    /// Location to apply the replacement
    pub location: Location,
    /// When this suggestion should be applied
    pub applicability: Applicability,
}

/// Rule categories
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DiagnosticCategory {
    Readability,
    Correctness,
    Style,
    Syntax,
    Custom(String),
}

impl DiagnosticCategory {
    pub fn slug(&self) -> &str {
        match self {
            DiagnosticCategory::Readability => "readability",
            DiagnosticCategory::Correctness => "correctness",
            DiagnosticCategory::Style => "style",
            DiagnosticCategory::Syntax => "syntax",
            DiagnosticCategory::Custom(name) => name,
        }
    }
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl Diagnostic {
    /// Create a new diagnostic
    pub fn new(
        rule_id: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
        location: Location,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            severity,
            message: message.into(),
            location,
            suggestions: Vec::new(),
            code: None,
            source: None,
            category: None,
        }
    }

    /// Add a code suggestion to this diagnostic
    pub fn with_suggestion(mut self, suggestion: CodeSuggestion) -> Self {
        self.suggestions.push(suggestion);
        self
    }

    pub fn with_category(mut self, category: DiagnosticCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Check if this diagnostic has any safe fixes
    pub fn has_safe_fixes(&self) -> bool {
        self.suggestions
            .iter()
            .any(|s| s.applicability == Applicability::Always)
    }

    /// Get all safe fixes for this diagnostic
    pub fn safe_fixes(&self) -> Vec<&CodeSuggestion> {
        self.suggestions
            .iter()
            .filter(|s| s.applicability == Applicability::Always)
            .collect()
    }
}

impl Location {
    pub fn new(file: PathBuf, line: usize, column: usize, offset: usize, length: usize) -> Self {
        Self {
            file,
            line,
            column,
            end_line: None,
            end_column: None,
            offset,
            length,
        }
    }

    /// Byte range covered by this location
    pub fn byte_range(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.length
    }
}

impl CodeSuggestion {
    pub fn new(
        message: impl Into<String>,
        replacement: impl Into<String>,
        location: Location,
        applicability: Applicability,
    ) -> Self {
        Self {
            message: message.into(),
            replacement: replacement.into(),
            location,
            applicability,
        }
    }

    /// Create a safe (always applicable) suggestion
    pub fn safe(
        message: impl Into<String>,
        replacement: impl Into<String>,
        location: Location,
    ) -> Self {
        Self::new(message, replacement, location, Applicability::Always)
    }

    /// Create an unsafe (maybe incorrect) suggestion
    pub fn unsafe_fix(
        message: impl Into<String>,
        replacement: impl Into<String>,
        location: Location,
    ) -> Self {
        Self::new(
            message,
            replacement,
            location,
            Applicability::MaybeIncorrect,
        )
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Hint => write!(f, "hint"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file.display(), self.line, self.column)
    }
}

/// Count diagnostics per severity
pub fn count_by_severity(diagnostics: &[Diagnostic]) -> HashMap<Severity, usize> {
    let mut counts = HashMap::new();
    for diagnostic in diagnostics {
        *counts.entry(diagnostic.severity).or_insert(0) += 1;
    }
    counts
}

/// Sort diagnostics by file, then line, then column
pub fn sort_by_location(diagnostics: &mut [Diagnostic]) {
    diagnostics.sort_by(|a, b| {
        a.location
            .file
            .cmp(&b.location.file)
            .then_with(|| a.location.line.cmp(&b.location.line))
            .then_with(|| a.location.column.cmp(&b.location.column))
            .then_with(|| a.rule_id.cmp(&b.rule_id))
    });
}

/// Source map for byte offset to line/column conversion
///
/// Keeps a table of line start offsets, so lookups are a binary search.
#[derive(Debug, Clone)]
pub struct SourceMap {
    line_starts: Vec<usize>,
}

impl SourceMap {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (idx, ch) in source.char_indices() {
            if ch == '\n' {
                line_starts.push(idx + 1);
            }
        }
        Self { line_starts }
    }

    /// Convert a byte offset to a 1-based `(line, column)` pair
    ///
    /// Columns count characters, not bytes.
    pub fn offset_to_position(&self, offset: usize, source: &str) -> (usize, usize) {
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx.saturating_sub(1),
        };
        let line_start = self.line_starts[line_idx];
        let end = offset.min(source.len()).max(line_start);
        let column = source
            .get(line_start..end)
            .map(|text| text.chars().count())
            .unwrap_or(0)
            + 1;
        (line_idx + 1, column)
    }

    /// Build a full `Location` for a byte span
    pub fn span_to_location(
        &self,
        span: std::ops::Range<usize>,
        source: &str,
        file: &Path,
    ) -> Location {
        let (line, column) = self.offset_to_position(span.start, source);
        let (end_line, end_column) = self.offset_to_position(span.end, source);
        Location {
            file: file.to_path_buf(),
            line,
            column,
            end_line: Some(end_line),
            end_column: Some(end_column),
            offset: span.start,
            length: span.end.saturating_sub(span.start),
        }
    }

    pub fn range_to_location(&self, range: TextRange, source: &str, file: &Path) -> Location {
        self.span_to_location(
            usize::from(range.start())..usize::from(range.end()),
            source,
            file,
        )
    }
}
