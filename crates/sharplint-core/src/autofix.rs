//! Autofix engine for automatic code corrections
//!
//! - Safe-by-default fix application (`Applicability::Always`)
//! - Unsafe fixes only with `apply_unsafe`
//! - Conflict resolution that keeps the higher-priority fix
//! - Reverse-offset application against a single snapshot
//! - Syntax validation and dry-run previews

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::cst::parse_csharp;
use crate::{Applicability, CodeSuggestion, Diagnostic, Location, Result, SharplintError};

/// Represents a fix that can be applied to source code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fix {
    /// Unique identifier for this fix
    pub id: String,
    /// Description of what this fix does
    pub description: String,
    /// Location where the fix should be applied
    pub location: Location,
    /// The replacement text
    pub replacement: String,
    /// Applicability level (Always = safe, MaybeIncorrect = unsafe)
    pub applicability: Applicability,
    /// Rule ID that generated this fix
    pub rule_id: String,
    /// Priority for conflict resolution (higher = more important)
    pub priority: u32,
}

impl Fix {
    pub fn new(
        id: impl Into<String>,
        description: impl Into<String>,
        location: Location,
        replacement: impl Into<String>,
        applicability: Applicability,
        rule_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            location,
            replacement: replacement.into(),
            applicability,
            rule_id: rule_id.into(),
            priority: default_priority(applicability),
        }
    }

    /// Create a fix from a diagnostic's code suggestion
    pub fn from_code_suggestion(suggestion: &CodeSuggestion, diagnostic: &Diagnostic) -> Self {
        Self::new(
            format!(
                "{}@{}:{}",
                diagnostic.rule_id, suggestion.location.line, suggestion.location.column
            ),
            suggestion.message.clone(),
            suggestion.location.clone(),
            suggestion.replacement.clone(),
            suggestion.applicability,
            diagnostic.rule_id.clone(),
        )
    }

    /// Create a fix with custom priority
    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    pub fn is_safe(&self) -> bool {
        matches!(self.applicability, Applicability::Always)
    }

    /// Fixes conflict when their byte ranges overlap in the same file
    pub fn conflicts_with(&self, other: &Fix) -> bool {
        if self.location.file != other.location.file {
            return false;
        }
        let (self_start, self_end) = self.span();
        let (other_start, other_end) = other.span();
        self_start < other_end && other_start < self_end
    }

    /// Get the span of this fix as (start, end) byte offsets
    pub fn span(&self) -> (usize, usize) {
        (
            self.location.offset,
            self.location.offset + self.location.length,
        )
    }
}

fn default_priority(applicability: Applicability) -> u32 {
    match applicability {
        Applicability::Always => 10,
        Applicability::MaybeIncorrect => 5,
    }
}

/// Configuration for fix application
#[derive(Debug, Clone)]
pub struct FixConfig {
    /// Whether to apply unsafe fixes
    pub apply_unsafe: bool,
    /// Compute results without writing files
    pub dry_run: bool,
    /// Maximum number of fixes to apply per file
    pub max_fixes_per_file: Option<usize>,
    /// Reject fixes that add parse errors
    pub validate_syntax: bool,
}

impl Default for FixConfig {
    fn default() -> Self {
        Self {
            apply_unsafe: false,
            dry_run: false,
            max_fixes_per_file: None,
            validate_syntax: true,
        }
    }
}

impl FixConfig {
    pub fn safe_only() -> Self {
        Self::default()
    }

    pub fn with_unsafe() -> Self {
        Self {
            apply_unsafe: true,
            ..Default::default()
        }
    }

    pub fn dry_run() -> Self {
        Self {
            dry_run: true,
            ..Default::default()
        }
    }
}

/// Result of applying fixes to a file
#[derive(Debug, Clone)]
pub struct FixResult {
    pub file: PathBuf,
    pub applied_count: usize,
    pub failed_count: usize,
    pub errors: Vec<String>,
    pub original_content: String,
    pub modified_content: String,
}

impl FixResult {
    pub fn changed(&self) -> bool {
        self.original_content != self.modified_content
    }
}

/// Content after applying a set of fixes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedFixes {
    pub content: String,
    pub applied_count: usize,
    pub errors: Vec<String>,
}

/// Autofix engine trait
pub trait AutofixEngine {
    /// Turn diagnostic suggestions into fixes
    fn generate_fixes(&self, diagnostics: &[Diagnostic]) -> Vec<Fix>;

    /// Drop overlapping fixes, keeping the higher-priority one
    fn resolve_conflicts(&self, fixes: &[Fix]) -> Vec<Fix>;

    /// Apply fixes to in-memory content of one file
    fn apply_to_content(&self, content: &str, fixes: &[Fix], config: &FixConfig) -> AppliedFixes;

    /// Apply fixes to a file on disk (unless dry-run)
    fn apply_fixes_to_file(&self, file: &Path, fixes: &[Fix], config: &FixConfig)
    -> Result<FixResult>;
}

/// Default autofix engine
#[derive(Debug, Clone, Default)]
pub struct DefaultAutofixEngine;

impl DefaultAutofixEngine {
    pub fn new() -> Self {
        Self
    }

    fn select_fixes<'a>(&self, fixes: &'a [Fix], config: &FixConfig) -> Vec<&'a Fix> {
        let mut selected: Vec<&Fix> = fixes
            .iter()
            .filter(|fix| config.apply_unsafe || fix.is_safe())
            .collect();
        if let Some(max) = config.max_fixes_per_file {
            selected.truncate(max);
        }
        selected
    }

    fn apply_single_fix(&self, content: &mut String, fix: &Fix) -> Result<()> {
        let (start, end) = fix.span();
        if end > content.len()
            || !content.is_char_boundary(start)
            || !content.is_char_boundary(end)
        {
            return Err(SharplintError::autofix_error(format!(
                "Fix {} has invalid bounds {start}..{end}",
                fix.id
            )));
        }
        content.replace_range(start..end, &fix.replacement);
        Ok(())
    }
}

impl AutofixEngine for DefaultAutofixEngine {
    fn generate_fixes(&self, diagnostics: &[Diagnostic]) -> Vec<Fix> {
        diagnostics
            .iter()
            .flat_map(|diagnostic| {
                diagnostic
                    .suggestions
                    .iter()
                    .map(move |suggestion| Fix::from_code_suggestion(suggestion, diagnostic))
            })
            .collect()
    }

    fn resolve_conflicts(&self, fixes: &[Fix]) -> Vec<Fix> {
        let mut by_file: HashMap<&Path, Vec<&Fix>> = HashMap::new();
        for fix in fixes {
            by_file.entry(fix.location.file.as_path()).or_default().push(fix);
        }

        let mut resolved = Vec::new();
        for (_, mut file_fixes) in by_file {
            file_fixes.sort_by(|a, b| {
                b.priority
                    .cmp(&a.priority)
                    .then_with(|| a.location.offset.cmp(&b.location.offset))
            });
            let mut kept: Vec<&Fix> = Vec::new();
            for fix in file_fixes {
                if kept.iter().any(|k| k.conflicts_with(fix)) {
                    tracing::debug!("Dropping conflicting fix {}", fix.id);
                    continue;
                }
                kept.push(fix);
            }
            resolved.extend(kept.into_iter().cloned());
        }

        resolved.sort_by(|a, b| {
            a.location
                .file
                .cmp(&b.location.file)
                .then_with(|| a.location.offset.cmp(&b.location.offset))
        });
        resolved
    }

    fn apply_to_content(&self, content: &str, fixes: &[Fix], config: &FixConfig) -> AppliedFixes {
        let mut selected = self.select_fixes(fixes, config);
        // Later offsets first, so earlier offsets stay valid
        selected.sort_by(|a, b| b.location.offset.cmp(&a.location.offset));

        let mut modified = content.to_string();
        let mut applied_count = 0;
        let mut errors = Vec::new();
        for fix in selected {
            match self.apply_single_fix(&mut modified, fix) {
                Ok(()) => applied_count += 1,
                Err(e) => errors.push(e.to_string()),
            }
        }

        if config.validate_syntax && applied_count > 0 {
            let before = parse_csharp(content).errors().len();
            let after = parse_csharp(&modified).errors().len();
            if after > before {
                errors.push(format!(
                    "Fixes introduced {} new syntax error(s); changes discarded",
                    after - before
                ));
                return AppliedFixes {
                    content: content.to_string(),
                    applied_count: 0,
                    errors,
                };
            }
        }

        AppliedFixes {
            content: modified,
            applied_count,
            errors,
        }
    }

    fn apply_fixes_to_file(
        &self,
        file: &Path,
        fixes: &[Fix],
        config: &FixConfig,
    ) -> Result<FixResult> {
        let original = fs::read_to_string(file).map_err(|e| SharplintError::io_error(file, e))?;
        let applied = self.apply_to_content(&original, fixes, config);

        if !config.dry_run && applied.applied_count > 0 && applied.content != original {
            fs::write(file, &applied.content).map_err(|e| SharplintError::io_error(file, e))?;
            tracing::info!("Applied {} fix(es) to {}", applied.applied_count, file.display());
        }

        Ok(FixResult {
            file: file.to_path_buf(),
            applied_count: applied.applied_count,
            failed_count: applied.errors.len(),
            errors: applied.errors,
            original_content: original,
            modified_content: applied.content,
        })
    }
}
