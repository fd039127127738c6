//! CLI command implementations
//!
//! This module contains the implementation of all CLI commands.

use anyhow::{Context, bail};
use colored::Colorize;
use sharplint_core::{
    ConfigLoader, Diagnostic, DiffRenderer, FixConfig, Severity, SharplintConfig, discover_paths,
};
use sharplint_rules::{FileError, RuleEngine, init_builtin_rules};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

use crate::output::{LintSummary, OutputFormatter};
use crate::{ConfigFormat, OutputFormat};

/// Options of the lint command
pub struct LintOptions {
    pub paths: Vec<PathBuf>,
    pub format: OutputFormat,
    pub write: bool,
    pub dry_run: bool,
    pub apply_unsafe: bool,
    pub min_severity: Severity,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub error_on_warnings: bool,
    pub config_path: Option<PathBuf>,
}

/// Lint command implementation
///
/// Returns `Ok(false)` when the run should exit with a failure code.
pub fn lint_command(options: LintOptions) -> anyhow::Result<bool> {
    let start = Instant::now();
    debug!("Starting lint command with paths: {:?}", options.paths);

    let mut config = load_config(options.config_path.as_deref(), &options.paths)?;
    apply_file_overrides(&mut config, &options.include, &options.exclude)?;

    let files = discover_paths(&options.paths, &config)?;
    if files.is_empty() {
        println!("No C# files found in specified paths.");
        return Ok(true);
    }
    info!("Found {} files to lint", files.len());

    let engine = RuleEngine::new(init_builtin_rules()?, config);
    let use_colors = colored::control::SHOULD_COLORIZE.should_colorize();

    let mut summary = LintSummary::new(files.len());
    let mut sources = HashMap::new();
    let mut file_errors: Vec<FileError> = Vec::new();
    let mut diagnostics: Vec<Diagnostic> = Vec::new();

    if options.write || options.dry_run {
        let fix_config = FixConfig {
            apply_unsafe: options.apply_unsafe,
            dry_run: options.dry_run,
            ..FixConfig::default()
        };
        let report = engine.fix_files(&files, &fix_config)?;
        summary.fixes_applied = report.applied_count();

        let diff_renderer = if use_colors {
            DiffRenderer::new()
        } else {
            DiffRenderer::no_colors()
        };
        let show_diffs = options.dry_run
            && matches!(options.format, OutputFormat::Human | OutputFormat::Compact);

        for file_report in report.files {
            let result = file_report.result;
            for error in &result.errors {
                eprintln!("{} {}: {}", "warning:".yellow(), result.file.display(), error);
            }
            if show_diffs && result.changed() {
                print!(
                    "{}",
                    diff_renderer.render_unified(
                        &result.file.display().to_string(),
                        &result.original_content,
                        &result.modified_content
                    )
                );
            }
            diagnostics.extend(file_report.remaining);
            sources.insert(result.file, result.modified_content);
        }
        file_errors.extend(report.errors);

        if matches!(options.format, OutputFormat::Human) {
            if options.dry_run {
                println!("Would apply {} fixes (dry run)", summary.fixes_applied);
            } else {
                println!("Applied {} fixes", summary.fixes_applied);
            }
        }
    } else {
        let report = engine.lint_files(&files)?;
        for file_report in report.files {
            if file_report.parse_errors > 0 {
                debug!(
                    "{} has {} parse error(s)",
                    file_report.file.display(),
                    file_report.parse_errors
                );
            }
            if !file_report.diagnostics.is_empty()
                && matches!(options.format, OutputFormat::Human)
                && let Ok(source) = fs::read_to_string(&file_report.file)
            {
                sources.insert(file_report.file.clone(), source);
            }
            diagnostics.extend(file_report.diagnostics);
        }
        file_errors.extend(report.errors);
    }

    for error in &file_errors {
        eprintln!("{} {}: {}", "error:".red(), error.file.display(), error.message);
    }
    summary.files_failed = file_errors.len();

    diagnostics.retain(|d| d.severity >= options.min_severity);
    sharplint_core::diagnostics::sort_by_location(&mut diagnostics);
    for diagnostic in &diagnostics {
        summary.record(diagnostic);
    }

    OutputFormatter::new(options.format, use_colors).print_results(
        &diagnostics,
        &sources,
        &summary,
    )?;

    debug!("Linting completed in {:?}", start.elapsed());

    let failed = summary.has_errors()
        || summary.files_failed > 0
        || (options.error_on_warnings && summary.warnings > 0);
    Ok(!failed)
}

/// Explicit `--config`, else the nearest config above the first path
fn load_config(config_path: Option<&Path>, paths: &[PathBuf]) -> anyhow::Result<SharplintConfig> {
    let start_dir = paths.first().map(|path| {
        if path.is_dir() {
            path.clone()
        } else {
            path.parent()
                .filter(|parent| !parent.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."))
        }
    });
    Ok(ConfigLoader::load(config_path, start_dir.as_deref())?)
}

fn apply_file_overrides(
    config: &mut SharplintConfig,
    include: &[String],
    exclude: &[String],
) -> anyhow::Result<()> {
    if include.is_empty() && exclude.is_empty() {
        return Ok(());
    }

    let mut files = config.files_config();
    if !include.is_empty() {
        files.include = Some(include.to_vec());
    }
    if !exclude.is_empty() {
        let mut patterns = files.exclude.unwrap_or_default();
        patterns.extend(exclude.iter().cloned());
        files.exclude = Some(patterns);
    }
    config.files = Some(files);
    config.validate()?;
    Ok(())
}

/// Rules list command implementation
pub fn rules_list_command(
    detailed: bool,
    category: Option<String>,
    tag: Option<String>,
    config_path: Option<PathBuf>,
) -> anyhow::Result<()> {
    let config = ConfigLoader::load(config_path.as_deref(), None)?;
    let engine = RuleEngine::new(init_builtin_rules()?, config);

    println!("Available Rules:");
    println!("================");

    let mut count = 0;
    for rule in engine.registry().rules() {
        let meta = &rule.metadata;
        if category
            .as_deref()
            .is_some_and(|c| !meta.category.slug().eq_ignore_ascii_case(c))
        {
            continue;
        }
        if tag
            .as_deref()
            .is_some_and(|t| !meta.tags.iter().any(|tag| *tag == t))
        {
            continue;
        }
        count += 1;

        if detailed {
            println!("\n{}", meta.id);
            println!("  Name: {}", meta.name);
            println!("  Description: {}", meta.description);
            println!("  Category: {}", meta.category);
            println!("  Default severity: {}", severity_name(meta.severity));
            println!(
                "  Configured severity: {}",
                engine
                    .effective_severity(meta.id)
                    .map(severity_name)
                    .unwrap_or("off")
            );
            if !meta.tags.is_empty() {
                println!("  Tags: {}", meta.tags.join(", "));
            }
            if meta.recommended {
                println!("  Recommended: yes");
            }
            if meta.fixable {
                println!("  Autofix: available");
            }
        } else {
            println!("  {} - {}", meta.id, meta.name);
        }
    }

    if count == 0 {
        println!("\nNo rules found matching the specified filters.");
    } else {
        println!("\nTotal: {count} rules");
    }

    Ok(())
}

/// Rules explain command implementation
pub fn rules_explain_command(rule_id: &str, config_path: Option<PathBuf>) -> anyhow::Result<bool> {
    let config = ConfigLoader::load(config_path.as_deref(), None)?;
    let engine = RuleEngine::new(init_builtin_rules()?, config);

    let Some(rule) = engine.registry().get(rule_id) else {
        println!("Rule '{rule_id}' not found.");
        println!();
        println!("Use 'sharplint rules' to list all available rules.");
        return Ok(false);
    };

    let meta = &rule.metadata;
    println!("Rule: {}", meta.id);
    println!("{}", "=".repeat(meta.id.len() + 6));
    println!();
    println!("Name: {}", meta.name);
    println!("Category: {}", meta.category);
    println!("Description: {}", meta.description);
    println!("Default severity: {}", severity_name(meta.severity));
    println!(
        "Configured severity: {}",
        engine
            .effective_severity(meta.id)
            .map(severity_name)
            .unwrap_or("off")
    );
    if meta.fixable {
        println!();
        println!("Autofix available: safe");
    }

    Ok(true)
}

fn severity_name(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "error",
        Severity::Warning => "warn",
        Severity::Info => "info",
        Severity::Hint => "hint",
    }
}

/// Config init command implementation
pub fn config_init_command(
    format: ConfigFormat,
    force: bool,
    with_examples: bool,
) -> anyhow::Result<()> {
    debug!("Initializing configuration file with format: {:?}", format);

    let filename = match format {
        ConfigFormat::Json => ".sharplintrc.json",
        ConfigFormat::Toml => ".sharplintrc.toml",
    };
    let config_path = PathBuf::from(filename);

    if config_path.exists() && !force {
        bail!("Configuration file '{filename}' already exists. Use --force to overwrite.");
    }

    let default_config = if with_examples {
        create_example_config()
    } else {
        create_minimal_config()
    };

    let config_content = match format {
        ConfigFormat::Json => serde_json::to_string_pretty(&default_config)
            .context("Failed to serialize JSON")?,
        ConfigFormat::Toml => {
            toml::to_string_pretty(&default_config).context("Failed to serialize TOML")?
        }
    };

    fs::write(&config_path, config_content)
        .with_context(|| format!("Failed to write {filename}"))?;

    println!("Created configuration file: {filename}");
    if with_examples {
        println!("   The file includes example rules and settings.");
    }
    println!("   Edit the file to customize your linting rules.");

    Ok(())
}

/// Config validate command implementation
pub fn config_validate_command(path: Option<PathBuf>) -> anyhow::Result<bool> {
    debug!("Validating configuration file: {:?}", path);

    let loaded = match path {
        Some(p) => ConfigLoader::load_from_file(&p),
        None => ConfigLoader::load(None, None),
    };

    match loaded {
        Ok(config) => {
            println!("Configuration is valid");
            println!("   Linter enabled: {}", config.linter_enabled());
            println!("   Recommended rules: {}", config.recommended_enabled());
            let configured = config.configured_rule_ids();
            if !configured.is_empty() {
                println!("   Configured rules: {}", configured.join(", "));
            }
            Ok(true)
        }
        Err(e) => {
            eprintln!("{} Configuration validation failed: {}", "error:".red(), e);
            Ok(false)
        }
    }
}

/// Config show command implementation
pub fn config_show_command(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config = ConfigLoader::load(config_path.as_deref(), None)?;

    println!("Resolved Configuration:");
    println!("======================");
    println!(
        "{}",
        serde_json::to_string_pretty(&config).context("Failed to serialize config")?
    );

    Ok(())
}

/// Config schema command implementation
pub fn config_schema_command() -> anyhow::Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(&SharplintConfig::json_schema())
            .context("Failed to serialize schema")?
    );
    Ok(())
}

/// Create a minimal default configuration
fn create_minimal_config() -> serde_json::Value {
    serde_json::json!({
        "linter": {
            "enabled": true,
            "rules": {
                "recommended": true
            }
        },
        "files": {
            "include": ["**/*.cs"],
            "exclude": ["**/bin/**", "**/obj/**"]
        }
    })
}

/// Create an example configuration with sample rules
fn create_example_config() -> serde_json::Value {
    serde_json::json!({
        "linter": {
            "enabled": true,
            "rules": {
                "recommended": true,
                "readability/prefer-nameof": {
                    "severity": "warn",
                    "options": {
                        "typeIdentity": "simple"
                    }
                }
            }
        },
        "files": {
            "include": ["**/*.cs"],
            "exclude": ["**/bin/**", "**/obj/**", "**/*.Designer.cs", "**/*.g.cs"]
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_overrides_replace_include_and_extend_exclude() {
        let mut config = SharplintConfig::default();
        apply_file_overrides(
            &mut config,
            &["src/**/*.cs".to_string()],
            &["**/Generated/**".to_string()],
        )
        .unwrap();

        let files = config.files_config();
        assert_eq!(files.include, Some(vec!["src/**/*.cs".to_string()]));
        let exclude = files.exclude.unwrap();
        assert!(exclude.contains(&"**/bin/**".to_string()));
        assert!(exclude.contains(&"**/Generated/**".to_string()));
    }

    #[test]
    fn test_invalid_override_pattern_is_rejected() {
        let mut config = SharplintConfig::default();
        assert!(apply_file_overrides(&mut config, &["[".to_string()], &[]).is_err());
    }

    #[test]
    fn test_generated_configs_parse() {
        for value in [create_minimal_config(), create_example_config()] {
            let config: SharplintConfig = serde_json::from_value(value).unwrap();
            config.validate().unwrap();
            assert!(config.linter_enabled());
        }
    }
}
