//! Rule engine implementation
//!
//! Applies the configuration to the registry (severity overrides, `off`,
//! rule options), runs the active rules over files in parallel, and drives
//! the fix-all loop.

use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use sharplint_core::diagnostics::sort_by_location;
use sharplint_core::{
    AutofixEngine, CancellationToken, DefaultAutofixEngine, Diagnostic, Fix, FixConfig, FixResult,
    Result, ResultExt, SemanticModel, Severity, SharplintConfig, SharplintError,
};

use crate::registry::{RuleContext, RuleDefinition, RuleRegistry};

/// Upper bound on lint-and-fix rounds per file
pub const MAX_FIX_PASSES: usize = 10;

/// Diagnostics for one file
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub file: PathBuf,
    pub diagnostics: Vec<Diagnostic>,
    /// Syntax the parser could not handle; rules still ran on the rest
    pub parse_errors: usize,
}

/// A file that could not be processed
#[derive(Debug, Clone, Serialize)]
pub struct FileError {
    pub file: PathBuf,
    pub message: String,
}

/// Result of linting a set of files
#[derive(Debug, Clone, Default, Serialize)]
pub struct LintReport {
    pub files: Vec<FileReport>,
    pub errors: Vec<FileError>,
}

impl LintReport {
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.files.iter().flat_map(|file| file.diagnostics.iter())
    }

    pub fn diagnostic_count(&self) -> usize {
        self.files.iter().map(|file| file.diagnostics.len()).sum()
    }

    pub fn count_by_severity(&self) -> HashMap<Severity, usize> {
        let mut counts = HashMap::new();
        for diagnostic in self.diagnostics() {
            *counts.entry(diagnostic.severity).or_insert(0) += 1;
        }
        counts
    }

    /// Whether any diagnostic is at least `threshold`
    pub fn has_severity_at_least(&self, threshold: Severity) -> bool {
        self.diagnostics().any(|d| d.severity >= threshold)
    }
}

/// Outcome of the fix-all loop on in-memory content
#[derive(Debug, Clone)]
pub struct FixOutcome {
    pub content: String,
    pub applied: usize,
    pub passes: usize,
    pub errors: Vec<String>,
    /// Diagnostics still present after the last pass
    pub remaining: Vec<Diagnostic>,
}

/// Fix-all outcome for one file on disk
#[derive(Debug, Clone)]
pub struct FileFixReport {
    pub result: FixResult,
    pub passes: usize,
    pub remaining: Vec<Diagnostic>,
}

/// Result of fixing a set of files
#[derive(Debug, Clone, Default)]
pub struct FixReport {
    pub files: Vec<FileFixReport>,
    pub errors: Vec<FileError>,
}

impl FixReport {
    pub fn applied_count(&self) -> usize {
        self.files.iter().map(|file| file.result.applied_count).sum()
    }

    pub fn changed_files(&self) -> impl Iterator<Item = &FileFixReport> {
        self.files.iter().filter(|file| file.result.changed())
    }
}

/// A rule as configured for this run
struct ActiveRule<'a> {
    definition: &'a RuleDefinition,
    severity: Severity,
    options: Option<&'a serde_json::Value>,
}

/// Runs registered rules under a configuration
#[derive(Debug)]
pub struct RuleEngine {
    registry: RuleRegistry,
    config: SharplintConfig,
    cancellation: CancellationToken,
}

impl RuleEngine {
    pub fn new(registry: RuleRegistry, config: SharplintConfig) -> Self {
        Self {
            registry,
            config,
            cancellation: CancellationToken::new(),
        }
    }

    /// Share a cancellation token with the host
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    pub fn config(&self) -> &SharplintConfig {
        &self.config
    }

    /// Severity a rule runs with, or `None` when it is disabled
    pub fn effective_severity(&self, rule_id: &str) -> Option<Severity> {
        let rule = self.registry.get(rule_id)?;
        if !self.config.linter_enabled() {
            return None;
        }
        match self.config.rule_setting(rule_id) {
            Some(setting) => match setting.severity() {
                Some(severity) => severity.to_severity(),
                // Options without a severity keep the rule on at its default
                None => Some(rule.metadata.severity),
            },
            None if rule.metadata.recommended && self.config.recommended_enabled() => {
                Some(rule.metadata.severity)
            }
            None => None,
        }
    }

    fn active_rules(&self) -> Vec<ActiveRule<'_>> {
        self.registry
            .rules()
            .filter_map(|definition| {
                let Some(severity) = self.effective_severity(definition.id()) else {
                    tracing::debug!("Skipping disabled rule '{}'", definition.id());
                    return None;
                };
                Some(ActiveRule {
                    definition,
                    severity,
                    options: self
                        .config
                        .rule_setting(definition.id())
                        .and_then(|setting| setting.options()),
                })
            })
            .collect()
    }

    /// Lint in-memory source text
    pub fn lint_source(&self, source: &str, file: &Path) -> Result<Vec<Diagnostic>> {
        self.cancellation.check()?;
        let model = SemanticModel::new(source, file).with_cancellation(self.cancellation.clone());
        self.run_rules(&model)
    }

    fn run_rules(&self, model: &SemanticModel) -> Result<Vec<Diagnostic>> {
        if !model.parse_errors.is_empty() {
            tracing::debug!(
                "{} parse error(s) in {}; first: {}",
                model.parse_errors.len(),
                model.source_file.display(),
                model.parse_errors[0].message
            );
        }

        let mut diagnostics = Vec::new();
        for rule in self.active_rules() {
            let ctx = RuleContext {
                model,
                severity: rule.severity,
                options: rule.options,
            };
            tracing::debug!(
                "Executing rule '{}' on '{}'",
                rule.definition.id(),
                model.source_file.display()
            );
            // Rule failures are skipped; cancellation is not recoverable
            if let Some(mut found) = (rule.definition.check)(&ctx).recoverable()? {
                diagnostics.append(&mut found);
            }
        }

        sort_by_location(&mut diagnostics);
        Ok(diagnostics)
    }

    /// Lint one file on disk
    pub fn lint_file(&self, path: &Path) -> Result<FileReport> {
        self.cancellation.check()?;
        let source = fs::read_to_string(path).map_err(|e| SharplintError::io_error(path, e))?;
        let model =
            SemanticModel::new(source, path).with_cancellation(self.cancellation.clone());
        let diagnostics = self.run_rules(&model)?;
        Ok(FileReport {
            file: path.to_path_buf(),
            diagnostics,
            parse_errors: model.parse_errors.len(),
        })
    }

    /// Lint files in parallel
    ///
    /// Unreadable files are reported in `errors`; cancellation aborts the run.
    pub fn lint_files(&self, paths: &[PathBuf]) -> Result<LintReport> {
        tracing::info!("Linting {} file(s)", paths.len());
        let results: Vec<(PathBuf, Result<FileReport>)> = paths
            .par_iter()
            .map(|path| (path.clone(), self.lint_file(path)))
            .collect();

        let mut report = LintReport::default();
        for (path, result) in results {
            match result {
                Ok(file_report) => report.files.push(file_report),
                Err(err) => report.errors.push(self.file_error(path, err)?),
            }
        }
        Ok(report)
    }

    fn file_error(&self, file: PathBuf, err: SharplintError) -> Result<FileError> {
        if !err.is_recoverable() {
            return Err(err);
        }
        tracing::warn!("Skipping {}: {}", file.display(), err);
        Ok(FileError {
            file,
            message: err.to_string(),
        })
    }

    /// Lint and fix until no fixable diagnostics remain
    ///
    /// Each pass applies non-overlapping fixes against one snapshot, then
    /// re-parses the result. Stops after [`MAX_FIX_PASSES`].
    pub fn fix_source(&self, source: &str, file: &Path, config: &FixConfig) -> Result<FixOutcome> {
        let autofix = DefaultAutofixEngine::new();
        let mut content = source.to_string();
        let mut applied = 0;
        let mut passes = 0;
        let mut errors = Vec::new();

        let remaining = loop {
            let diagnostics = self.lint_source(&content, file)?;
            let fixes: Vec<Fix> = autofix
                .generate_fixes(&diagnostics)
                .into_iter()
                .filter(|fix| config.apply_unsafe || fix.is_safe())
                .collect();
            if fixes.is_empty() || passes == MAX_FIX_PASSES {
                break diagnostics;
            }

            passes += 1;
            let resolved = autofix.resolve_conflicts(&fixes);
            let result = autofix.apply_to_content(&content, &resolved, config);
            errors.extend(result.errors);
            if result.applied_count == 0 || result.content == content {
                break diagnostics;
            }
            tracing::debug!(
                "Pass {}: applied {} fix(es) to {}",
                passes,
                result.applied_count,
                file.display()
            );
            applied += result.applied_count;
            content = result.content;
        };

        Ok(FixOutcome {
            content,
            applied,
            passes,
            errors,
            remaining,
        })
    }

    /// Fix one file, writing it back unless `config.dry_run`
    pub fn fix_file(&self, path: &Path, config: &FixConfig) -> Result<FileFixReport> {
        self.cancellation.check()?;
        let original = fs::read_to_string(path).map_err(|e| SharplintError::io_error(path, e))?;
        let outcome = self.fix_source(&original, path, config)?;

        if !config.dry_run && outcome.content != original {
            fs::write(path, &outcome.content).map_err(|e| SharplintError::io_error(path, e))?;
            tracing::info!("Applied {} fix(es) to {}", outcome.applied, path.display());
        }

        Ok(FileFixReport {
            result: FixResult {
                file: path.to_path_buf(),
                applied_count: outcome.applied,
                failed_count: outcome.errors.len(),
                errors: outcome.errors,
                original_content: original,
                modified_content: outcome.content,
            },
            passes: outcome.passes,
            remaining: outcome.remaining,
        })
    }

    /// Fix files in parallel
    pub fn fix_files(&self, paths: &[PathBuf], config: &FixConfig) -> Result<FixReport> {
        let results: Vec<(PathBuf, Result<FileFixReport>)> = paths
            .par_iter()
            .map(|path| (path.clone(), self.fix_file(path, config)))
            .collect();

        let mut report = FixReport::default();
        for (path, result) in results {
            match result {
                Ok(file_report) => report.files.push(file_report),
                Err(err) => report.errors.push(self.file_error(path, err)?),
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::prefer_nameof::PREFER_NAMEOF;
    use crate::init_builtin_rules;
    use crate::registry::RuleMetadata;
    use sharplint_core::{
        CodeSuggestion, DiagnosticCategory, RuleConfig, RuleSetting, RuleSeverity,
        RulesConfiguration,
    };
    use tempfile::TempDir;

    const GUARDS: &str = r#"using System;

class C
{
    void A(string a)
    {
        if (a == null) throw new ArgumentNullException("a");
    }

    void B(string b)
    {
        if (b == null) throw new ArgumentNullException("b", "b is required");
    }
}
"#;

    fn config_with(rule_id: &str, setting: RuleSetting) -> SharplintConfig {
        let mut rules = RulesConfiguration::default();
        rules.rules.insert(rule_id.to_string(), setting);
        let mut config = SharplintConfig::default();
        if let Some(linter) = config.linter.as_mut() {
            linter.rules = Some(rules);
        }
        config
    }

    fn engine(config: SharplintConfig) -> RuleEngine {
        RuleEngine::new(init_builtin_rules().unwrap(), config)
    }

    #[test]
    fn test_default_config_runs_recommended_rules() {
        let engine = engine(SharplintConfig::default());
        let diagnostics = engine.lint_source(GUARDS, Path::new("C.cs")).unwrap();
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics.iter().all(|d| d.severity == Severity::Info));
        assert!(diagnostics[0].location.offset < diagnostics[1].location.offset);
    }

    #[test]
    fn test_severity_override_and_off() {
        let warn = engine(config_with(
            PREFER_NAMEOF,
            RuleSetting::Severity(RuleSeverity::Error),
        ));
        let diagnostics = warn.lint_source(GUARDS, Path::new("C.cs")).unwrap();
        assert!(diagnostics.iter().all(|d| d.severity == Severity::Error));

        let off = engine(config_with(PREFER_NAMEOF, RuleSetting::Severity(RuleSeverity::Off)));
        assert!(off.lint_source(GUARDS, Path::new("C.cs")).unwrap().is_empty());
        assert_eq!(off.effective_severity(PREFER_NAMEOF), None);
    }

    #[test]
    fn test_linter_disabled_and_recommended_off() {
        let mut config = SharplintConfig::default();
        if let Some(linter) = config.linter.as_mut() {
            linter.enabled = Some(false);
        }
        assert!(engine(config).lint_source(GUARDS, Path::new("C.cs")).unwrap().is_empty());

        let mut config = SharplintConfig::default();
        if let Some(rules) = config.linter.as_mut().and_then(|l| l.rules.as_mut()) {
            rules.recommended = Some(false);
        }
        assert!(engine(config).lint_source(GUARDS, Path::new("C.cs")).unwrap().is_empty());
    }

    #[test]
    fn test_options_reach_the_rule() {
        let source = "namespace Acme.System { class ArgumentNullException { public ArgumentNullException(string s) { } } class C { void M(string p) { if (p == null) throw new ArgumentNullException(\"p\"); } } }";
        let loose = engine(SharplintConfig::default());
        assert_eq!(loose.lint_source(source, Path::new("C.cs")).unwrap().len(), 1);

        let strict = engine(config_with(
            PREFER_NAMEOF,
            RuleSetting::Config(RuleConfig {
                severity: None,
                options: Some(serde_json::json!({ "typeIdentity": "qualified" })),
            }),
        ));
        assert_eq!(strict.effective_severity(PREFER_NAMEOF), Some(Severity::Info));
        assert!(strict.lint_source(source, Path::new("C.cs")).unwrap().is_empty());
    }

    #[test]
    fn test_fix_source_rewrites_all_guards() {
        let engine = engine(SharplintConfig::default());
        let outcome = engine
            .fix_source(GUARDS, Path::new("C.cs"), &FixConfig::safe_only())
            .unwrap();
        assert_eq!(outcome.applied, 2);
        assert_eq!(outcome.passes, 1);
        assert!(outcome.remaining.is_empty());
        assert!(outcome.content.contains("throw new ArgumentNullException(nameof(a));"));
        assert!(outcome.content.contains(
            r#"throw new ArgumentNullException(nameof(b), string.Format("{0} is required", nameof(b)));"#
        ));
    }

    fn overlapping_pairs(ctx: &RuleContext<'_>) -> Result<Vec<Diagnostic>> {
        let model = ctx.model;
        let bytes = model.source.as_bytes();
        let mut diagnostics = Vec::new();
        for offset in (0..bytes.len()).filter(|&i| bytes[i..].starts_with(b"aa")) {
            let location =
                model
                    .source_map
                    .span_to_location(offset..offset + 2, &model.source, &model.source_file);
            diagnostics.push(
                Diagnostic::new("test/pairs", ctx.severity, "pair", location.clone())
                    .with_suggestion(CodeSuggestion::safe("collapse", "a", location)),
            );
        }
        Ok(diagnostics)
    }

    #[test]
    fn test_fix_all_needs_several_passes_for_overlaps() {
        let mut registry = RuleRegistry::new();
        registry
            .register_rule(RuleDefinition::new(
                RuleMetadata {
                    id: "test/pairs",
                    name: "Pairs",
                    description: "Collapses aa into a",
                    severity: Severity::Warning,
                    category: DiagnosticCategory::Style,
                    tags: Vec::new(),
                    recommended: true,
                    fixable: true,
                },
                overlapping_pairs,
            ))
            .unwrap();
        let engine = RuleEngine::new(registry, SharplintConfig::default());
        let config = FixConfig {
            validate_syntax: false,
            ..FixConfig::safe_only()
        };

        // Pairs at 0, 1 and 2 overlap: the first pass keeps 0 and 2
        let outcome = engine.fix_source("aaaa", Path::new("t.cs"), &config).unwrap();
        assert_eq!(outcome.content, "a");
        assert_eq!(outcome.passes, 2);
        assert_eq!(outcome.applied, 3);
        assert!(outcome.remaining.is_empty());

        let outcome = engine.fix_source("aaa", Path::new("t.cs"), &config).unwrap();
        assert_eq!(outcome.content, "a");
        assert_eq!(outcome.passes, 2);
    }

    fn grows(ctx: &RuleContext<'_>) -> Result<Vec<Diagnostic>> {
        let model = ctx.model;
        let location = model
            .source_map
            .span_to_location(0..0, &model.source, &model.source_file);
        Ok(vec![
            Diagnostic::new("test/grows", ctx.severity, "grow", location.clone())
                .with_suggestion(CodeSuggestion::safe("grow", "x", location)),
        ])
    }

    #[test]
    fn test_fix_all_stops_after_max_passes() {
        let mut registry = RuleRegistry::new();
        registry
            .register_rule(RuleDefinition::new(
                RuleMetadata {
                    id: "test/grows",
                    name: "Grows",
                    description: "Always has a fix",
                    severity: Severity::Warning,
                    category: DiagnosticCategory::Style,
                    tags: Vec::new(),
                    recommended: true,
                    fixable: true,
                },
                grows,
            ))
            .unwrap();
        let engine = RuleEngine::new(registry, SharplintConfig::default());
        let config = FixConfig {
            validate_syntax: false,
            ..FixConfig::safe_only()
        };
        let outcome = engine.fix_source("", Path::new("t.cs"), &config).unwrap();
        assert_eq!(outcome.passes, MAX_FIX_PASSES);
        assert_eq!(outcome.content, "x".repeat(MAX_FIX_PASSES));
        assert_eq!(outcome.remaining.len(), 1);
    }

    fn renames(ctx: &RuleContext<'_>) -> Result<Vec<Diagnostic>> {
        let model = ctx.model;
        Ok(model
            .source
            .match_indices("old")
            .map(|(offset, text)| {
                let location = model.source_map.span_to_location(
                    offset..offset + text.len(),
                    &model.source,
                    &model.source_file,
                );
                Diagnostic::new("test/renames", ctx.severity, "rename", location.clone())
                    .with_suggestion(CodeSuggestion::unsafe_fix("rename", "fresh", location))
            })
            .collect())
    }

    #[test]
    fn test_unsafe_fixes_need_opt_in() {
        let mut registry = RuleRegistry::new();
        registry
            .register_rule(RuleDefinition::new(
                RuleMetadata {
                    id: "test/renames",
                    name: "Renames",
                    description: "Offers a fix that may change behavior",
                    severity: Severity::Warning,
                    category: DiagnosticCategory::Style,
                    tags: Vec::new(),
                    recommended: true,
                    fixable: true,
                },
                renames,
            ))
            .unwrap();
        let engine = RuleEngine::new(registry, SharplintConfig::default());
        let source = "class old { }";

        let outcome = engine
            .fix_source(source, Path::new("t.cs"), &FixConfig::safe_only())
            .unwrap();
        assert_eq!(outcome.applied, 0);
        assert_eq!(outcome.content, source);
        assert_eq!(outcome.remaining.len(), 1);

        let outcome = engine
            .fix_source(source, Path::new("t.cs"), &FixConfig::with_unsafe())
            .unwrap();
        assert_eq!(outcome.applied, 1);
        assert_eq!(outcome.content, "class fresh { }");
        assert!(outcome.remaining.is_empty());
    }

    #[test]
    fn test_lint_files_in_parallel_and_report_unreadable() {
        let temp = TempDir::new().unwrap();
        let mut paths = Vec::new();
        for i in 0..4 {
            let path = temp.path().join(format!("F{i}.cs"));
            fs::write(&path, GUARDS).unwrap();
            paths.push(path);
        }
        paths.push(temp.path().join("Missing.cs"));

        let report = engine(SharplintConfig::default()).lint_files(&paths).unwrap();
        assert_eq!(report.files.len(), 4);
        assert_eq!(report.diagnostic_count(), 8);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.count_by_severity().get(&Severity::Info), Some(&8));
        assert!(!report.has_severity_at_least(Severity::Warning));
    }

    #[test]
    fn test_fix_file_dry_run_and_write() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("C.cs");
        fs::write(&path, GUARDS).unwrap();
        let engine = engine(SharplintConfig::default());

        let dry = engine.fix_file(&path, &FixConfig::dry_run()).unwrap();
        assert!(dry.result.changed());
        assert_eq!(fs::read_to_string(&path).unwrap(), GUARDS);

        let written = engine.fix_file(&path, &FixConfig::safe_only()).unwrap();
        assert_eq!(written.result.applied_count, 2);
        assert_eq!(fs::read_to_string(&path).unwrap(), written.result.modified_content);
        assert!(engine.lint_file(&path).unwrap().diagnostics.is_empty());
    }

    #[test]
    fn test_cancellation_stops_the_run() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("C.cs");
        fs::write(&path, GUARDS).unwrap();

        let token = CancellationToken::new();
        let engine = engine(SharplintConfig::default()).with_cancellation(token.clone());
        token.cancel();

        assert!(matches!(
            engine.lint_source(GUARDS, Path::new("C.cs")),
            Err(SharplintError::Cancelled)
        ));
        assert!(matches!(
            engine.lint_files(&[path]),
            Err(SharplintError::Cancelled)
        ));
    }
}
