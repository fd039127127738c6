//! Sharplint CLI
//!
//! Command-line interface for the sharplint C# analyzer

mod commands; // lint, rules, config
mod output;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use sharplint_core::init_tracing;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;

#[derive(Parser)]
#[command(name = "sharplint")]
#[command(about = "sharplint: C# analyzer that replaces parameter-name strings with nameof")]
#[command(version = sharplint_core::VERSION)]
#[command(
    long_about = "sharplint finds null guards that repeat a parameter name as a string literal\n\
and rewrites them to use nameof expressions.\n\
\n\
Examples:\n  \
sharplint lint                      # Lint current directory\n  \
sharplint lint --write src/         # Apply safe fixes to files in src/\n  \
sharplint lint --dry-run Foo.cs     # Show the fixes as a diff\n  \
sharplint rules explain readability/prefer-nameof\n  \
sharplint config init               # Initialize configuration file"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(
        short,
        long,
        global = true,
        help = "Path to configuration file (.sharplintrc.json/.sharplintrc.toml)"
    )]
    config: Option<PathBuf>,

    /// Verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Number of threads to use for parallel processing
    #[arg(
        short = 'j',
        long,
        global = true,
        help = "Number of threads (default: number of CPU cores)"
    )]
    threads: Option<usize>,

    /// Generate shell completion script
    #[arg(
        long,
        value_enum,
        help = "Generate completion script for specified shell"
    )]
    generate_completion: Option<Shell>,
}

#[derive(Subcommand)]
enum Commands {
    /// Lint C# files and optionally apply fixes
    #[command(alias = "check")]
    Lint {
        /// Files or directories to lint
        #[arg(help = "Files or directories to process (default: current directory)")]
        paths: Vec<PathBuf>,

        /// Output format
        #[arg(
            short,
            long,
            default_value = "human",
            help = "Output format for diagnostics"
        )]
        format: OutputFormat,

        /// Write fixes to files (applies safe fixes by default)
        #[arg(long, help = "Write fixes to files")]
        write: bool,

        /// Show fixes without applying them
        #[arg(
            long,
            help = "Show proposed fixes as a diff without applying them",
            conflicts_with = "write"
        )]
        dry_run: bool,

        /// Apply unsafe fixes (use with --write)
        #[arg(long, help = "Apply unsafe fixes (requires --write or --dry-run)")]
        r#unsafe: bool,

        /// Minimum severity level to report
        #[arg(long, default_value = "info", help = "Minimum severity level to report")]
        min_severity: Severity,

        /// Include patterns (glob syntax)
        #[arg(
            long,
            help = "Include files matching pattern (can be used multiple times)"
        )]
        include: Vec<String>,

        /// Exclude patterns (glob syntax)
        #[arg(
            long,
            help = "Exclude files matching pattern (can be used multiple times)"
        )]
        exclude: Vec<String>,

        /// Treat warnings as failures for the exit code
        #[arg(long, help = "Exit with non-zero code on warnings as well as errors")]
        error_on_warnings: bool,
    },

    /// Manage and inspect linting rules
    Rules {
        #[command(subcommand)]
        action: Option<RulesAction>,

        /// Show detailed rule information
        #[arg(long, help = "Show detailed information for each rule")]
        detailed: bool,

        /// Filter rules by category
        #[arg(long, help = "Filter rules by category (readability, style, ...)")]
        category: Option<String>,

        /// Filter rules by tag
        #[arg(long, help = "Filter rules by tag")]
        tag: Option<String>,
    },

    /// Configuration file management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show version information
    #[command(alias = "ver")]
    Version {
        /// Show detailed version information
        #[arg(long, help = "Show detailed version and build information")]
        detailed: bool,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Initialize a new configuration file
    Init {
        /// Configuration file format
        #[arg(long, default_value = "json", help = "Configuration file format")]
        format: ConfigFormat,

        /// Overwrite existing configuration file
        #[arg(long, help = "Overwrite existing configuration file")]
        force: bool,

        /// Include example rules and settings
        #[arg(long, help = "Include example rules and settings")]
        with_examples: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to configuration file to validate
        #[arg(help = "Path to configuration file (default: search for .sharplintrc)")]
        path: Option<PathBuf>,
    },

    /// Show current configuration
    Show,

    /// Print the JSON schema for configuration files
    Schema,
}

#[derive(Subcommand)]
enum RulesAction {
    /// List all available rules
    List,

    /// Show detailed information about a specific rule
    Explain {
        /// Rule ID to explain
        #[arg(help = "Rule ID to show detailed information for")]
        rule_id: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Human-readable output with colors and code frames
    Human,
    /// One line per diagnostic
    Compact,
    /// JSON format for programmatic consumption
    Json,
    /// GitHub Actions workflow commands
    Github,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Severity {
    /// Only show errors
    Error,
    /// Show warnings and errors
    Warning,
    /// Show info, warnings, and errors
    Info,
    /// Show all diagnostics including hints
    Hint,
}

impl Severity {
    fn to_core(self) -> sharplint_core::Severity {
        match self {
            Severity::Error => sharplint_core::Severity::Error,
            Severity::Warning => sharplint_core::Severity::Warning,
            Severity::Info => sharplint_core::Severity::Info,
            Severity::Hint => sharplint_core::Severity::Hint,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ConfigFormat {
    /// JSON configuration format
    Json,
    /// TOML configuration format
    Toml,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Handle shell completion generation
    if let Some(shell) = cli.generate_completion {
        generate_completion_script(shell);
        return ExitCode::SUCCESS;
    }

    if cli.no_color || std::env::var_os("NO_COLOR").is_some() || !io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    // Initialize tracing based on verbosity
    if cli.verbose > 0 || std::env::var_os("RUST_LOG").is_none() {
        let log_level = match cli.verbose {
            0 => "sharplint=error", // Only errors by default
            1 => "sharplint=warn",  // Warnings on first -v
            2 => "sharplint=info",  // Info on -vv
            3 => "sharplint=debug", // Debug on -vvv
            _ => "sharplint=trace", // Trace on -vvvv+
        };
        // SAFETY: single-threaded here; no other thread reads the environment yet
        unsafe {
            std::env::set_var("RUST_LOG", log_level);
        }
    }
    init_tracing();

    // Set thread pool size if specified
    if let Some(threads) = cli.threads
        && let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
    {
        error!("Failed to set thread pool size: {}", e);
        return ExitCode::FAILURE;
    }

    match run_command(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn generate_completion_script(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
}

/// Run the selected command; `Ok(false)` means the run found failing diagnostics
fn run_command(cli: Cli) -> anyhow::Result<bool> {
    match cli.command {
        Some(Commands::Lint {
            paths,
            format,
            write,
            dry_run,
            r#unsafe,
            min_severity,
            include,
            exclude,
            error_on_warnings,
        }) => {
            let paths = if paths.is_empty() {
                vec![PathBuf::from(".")]
            } else {
                paths
            };
            commands::lint_command(commands::LintOptions {
                paths,
                format,
                write,
                dry_run,
                apply_unsafe: r#unsafe,
                min_severity: min_severity.to_core(),
                include,
                exclude,
                error_on_warnings,
                config_path: cli.config,
            })
        }

        Some(Commands::Rules {
            action,
            detailed,
            category,
            tag,
        }) => match action {
            Some(RulesAction::List) | None => {
                commands::rules_list_command(detailed, category, tag, cli.config).map(|()| true)
            }
            Some(RulesAction::Explain { rule_id }) => {
                commands::rules_explain_command(&rule_id, cli.config)
            }
        },

        Some(Commands::Config { action }) => match action {
            ConfigAction::Init {
                format,
                force,
                with_examples,
            } => commands::config_init_command(format, force, with_examples).map(|()| true),
            ConfigAction::Validate { path } => {
                commands::config_validate_command(path.or(cli.config))
            }
            ConfigAction::Show => commands::config_show_command(cli.config).map(|()| true),
            ConfigAction::Schema => commands::config_schema_command().map(|()| true),
        },

        Some(Commands::Version { detailed }) => {
            if detailed {
                println!("sharplint {}", sharplint_core::VERSION);
                println!("Build information:");
                println!("  Target: {}", std::env::consts::ARCH);
                println!("  OS: {}", std::env::consts::OS);
                println!("  Rules: {}", sharplint_rules::VERSION);
            } else {
                println!("{}", sharplint_core::VERSION);
            }
            Ok(true)
        }

        None => {
            // No subcommand provided, show help
            let mut cmd = Cli::command();
            cmd.print_help()?;
            Ok(true)
        }
    }
}
