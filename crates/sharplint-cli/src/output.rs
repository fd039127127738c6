//! Output formatting and reporting
//!
//! This module handles the different output formats for lint results

use colored::*;
use serde::Serialize;
use sharplint_core::{Diagnostic, DiagnosticRenderer, Severity};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::OutputFormat;

/// Summary statistics for linting results
#[derive(Debug, Clone, Default, Serialize)]
pub struct LintSummary {
    pub files_checked: usize,
    pub errors: usize,
    pub warnings: usize,
    pub info: usize,
    pub hints: usize,
    pub fixes_applied: usize,
    pub files_failed: usize,
}

impl LintSummary {
    pub fn new(files_checked: usize) -> Self {
        Self {
            files_checked,
            ..Self::default()
        }
    }

    pub fn record(&mut self, diagnostic: &Diagnostic) {
        match diagnostic.severity {
            Severity::Error => self.errors += 1,
            Severity::Warning => self.warnings += 1,
            Severity::Info => self.info += 1,
            Severity::Hint => self.hints += 1,
        }
    }

    pub fn total_issues(&self) -> usize {
        self.errors + self.warnings + self.info + self.hints
    }

    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    pub fn has_issues(&self) -> bool {
        self.total_issues() > 0
    }
}

/// Output formatter for different formats
pub struct OutputFormatter {
    format: OutputFormat,
    use_colors: bool,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat, use_colors: bool) -> Self {
        Self { format, use_colors }
    }

    /// Format and print linting results
    ///
    /// `sources` holds the text each diagnostic was computed against, so code
    /// frames stay correct after files have been rewritten.
    pub fn print_results(
        &self,
        diagnostics: &[Diagnostic],
        sources: &HashMap<PathBuf, String>,
        summary: &LintSummary,
    ) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Human => self.print_human_format(diagnostics, sources, summary),
            OutputFormat::Compact => {
                self.print_compact_format(diagnostics, summary);
                Ok(())
            }
            OutputFormat::Json => self.print_json_format(diagnostics, summary),
            OutputFormat::Github => {
                self.print_github_format(diagnostics);
                Ok(())
            }
        }
    }

    fn print_human_format(
        &self,
        diagnostics: &[Diagnostic],
        sources: &HashMap<PathBuf, String>,
        summary: &LintSummary,
    ) -> anyhow::Result<()> {
        let renderer = if self.use_colors {
            DiagnosticRenderer::new()
        } else {
            DiagnosticRenderer::no_colors()
        };

        for diagnostic in diagnostics {
            let source = sources.get(&diagnostic.location.file).map(String::as_str);
            println!("{}", renderer.render_with_source(diagnostic, source));
        }

        self.print_summary_human(summary);
        Ok(())
    }

    fn print_summary_human(&self, summary: &LintSummary) {
        println!("{}", "Summary:".bold());
        println!("  Files checked: {}", summary.files_checked);

        if summary.has_issues() {
            println!("  Issues found:");
            if summary.errors > 0 {
                println!("    Errors: {}", summary.errors.to_string().red());
            }
            if summary.warnings > 0 {
                println!("    Warnings: {}", summary.warnings.to_string().yellow());
            }
            if summary.info > 0 {
                println!("    Info: {}", summary.info.to_string().blue());
            }
            if summary.hints > 0 {
                println!("    Hints: {}", summary.hints.to_string().cyan());
            }
        } else {
            println!("  {}", "No issues found".green());
        }

        if summary.fixes_applied > 0 {
            println!(
                "  Fixes applied: {}",
                summary.fixes_applied.to_string().green()
            );
        }
        if summary.files_failed > 0 {
            println!(
                "  Files skipped: {}",
                summary.files_failed.to_string().red()
            );
        }
    }

    fn print_compact_format(&self, diagnostics: &[Diagnostic], summary: &LintSummary) {
        for diagnostic in diagnostics {
            println!(
                "{}:{}:{}: {}[{}] {}",
                display_path(&diagnostic.location.file),
                diagnostic.location.line,
                diagnostic.location.column,
                severity_label(diagnostic.severity),
                diagnostic.rule_id,
                diagnostic.message
            );
        }

        if summary.has_issues() {
            println!(
                "sharplint: {} files, {} issues ({} errors, {} warnings)",
                summary.files_checked,
                summary.total_issues(),
                summary.errors,
                summary.warnings
            );
        } else {
            println!(
                "sharplint: {} files checked, no issues",
                summary.files_checked
            );
        }

        if summary.fixes_applied > 0 {
            println!("sharplint: {} fixes applied", summary.fixes_applied);
        }
    }

    fn print_json_format(
        &self,
        diagnostics: &[Diagnostic],
        summary: &LintSummary,
    ) -> anyhow::Result<()> {
        let result = serde_json::json!({
            "files_checked": summary.files_checked,
            "diagnostics": diagnostics,
            "summary": {
                "errors": summary.errors,
                "warnings": summary.warnings,
                "info": summary.info,
                "hints": summary.hints,
                "total": summary.total_issues(),
                "fixes_applied": summary.fixes_applied,
                "files_failed": summary.files_failed,
            }
        });

        println!("{}", serde_json::to_string_pretty(&result)?);
        Ok(())
    }

    fn print_github_format(&self, diagnostics: &[Diagnostic]) {
        for diagnostic in diagnostics {
            let level = match diagnostic.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
                Severity::Info | Severity::Hint => "notice",
            };
            let location = &diagnostic.location;
            let mut properties = format!(
                "file={},line={},col={}",
                display_path(&location.file),
                location.line,
                location.column
            );
            if let (Some(end_line), Some(end_column)) = (location.end_line, location.end_column) {
                properties.push_str(&format!(",endLine={end_line},endColumn={end_column}"));
            }

            println!(
                "::{} {},title={}::{}",
                level,
                properties,
                diagnostic.rule_id,
                escape_workflow_message(&diagnostic.message)
            );
        }
    }
}

fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
        Severity::Info => "info",
        Severity::Hint => "hint",
    }
}

fn display_path(path: &Path) -> String {
    path.strip_prefix(".")
        .unwrap_or(path)
        .display()
        .to_string()
}

// Workflow commands treat %, CR and LF specially in the message part
fn escape_workflow_message(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
