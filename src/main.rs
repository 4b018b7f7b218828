//! devdesc-tools: Device description round-trip fidelity tool
//!
//! Parses EDS and IODD device descriptions into a shared model, rebuilds
//! them, and scores how much of the original survives the round trip.

#![allow(
    clippy::too_many_lines,
    clippy::struct_excessive_bools,
    clippy::needless_pass_by_value
)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use devdesc_tools::{
    cli,
    config::{self, AppConfig},
    reports::ReportFormat,
};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Build long version string with format support info
const fn build_long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        "\n\nSupported Device Description Formats:",
        "\n  EDS:  sectioned key/value text (electronic data sheets)",
        "\n  IODD: XML device descriptions (IO-Link)",
        "\n\nOutput Formats:",
        "\n  auto, json, summary",
        "\n\nFeatures:",
        "\n  Normalization, reconstruction, round-trip scoring, phase gating"
    )
}

#[derive(Parser)]
#[command(name = "devdesc-tools")]
#[command(author = "Binarly.io")]
#[command(version, long_version = build_long_version())]
#[command(about = "Device description round-trip fidelity and gating tool", long_about = None)]
#[command(after_help = "EXIT CODES:
    0  Success (and the requested gate, if any, was met)
    1  A document scored below the requested phase gate
    2  One or more documents failed to parse
    3  Error occurred

EXAMPLES:
    # Inspect the normalized model of one file
    devdesc-tools parse drive.eds

    # Round-trip fidelity report
    devdesc-tools evaluate drive.eds

    # CI/CD gate: fail unless the file reaches the candidate phase
    devdesc-tools evaluate drive.eds --gate candidate -o summary

    # Evaluate a vendor drop in parallel, appending score history
    devdesc-tools batch vendor-drop/ --gate production --history scores.jsonl

    # Rebuild canonical text from the normalized model
    devdesc-tools reconstruct sensor.xml > rebuilt.xml")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored output (also respects `NO_COLOR` env)
    #[arg(long, global = true)]
    no_color: bool,

    /// Path to configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

// ============================================================================
// Command argument structs (extracted for readability)
// ============================================================================

/// Arguments for the `parse` subcommand
#[derive(Parser)]
struct ParseArgs {
    /// Path to the device description file
    file: PathBuf,

    /// Source format (eds, iodd); detected from extension and content if omitted
    #[arg(long)]
    format: Option<String>,

    /// Output format (auto detects TTY: summary if interactive, json otherwise)
    #[arg(short, long, default_value = "auto")]
    output: ReportFormat,

    /// Output file path (stdout if not specified)
    #[arg(short = 'O', long)]
    output_file: Option<PathBuf>,
}

/// Arguments for the `reconstruct` subcommand
#[derive(Parser)]
struct ReconstructArgs {
    /// Path to the device description file
    file: PathBuf,

    /// Source format (eds, iodd); detected from extension and content if omitted
    #[arg(long)]
    format: Option<String>,

    /// Output file path (stdout if not specified)
    #[arg(short = 'O', long)]
    output_file: Option<PathBuf>,
}

/// Arguments for the `evaluate` subcommand
#[derive(Parser)]
struct EvaluateArgs {
    /// Path to the device description file
    file: PathBuf,

    /// Source format (eds, iodd); detected from extension and content if omitted
    #[arg(long)]
    format: Option<String>,

    /// Output format (auto detects TTY: summary if interactive, json otherwise)
    #[arg(short, long, default_value = "auto")]
    output: ReportFormat,

    /// Output file path (stdout if not specified)
    #[arg(short = 'O', long)]
    output_file: Option<PathBuf>,

    /// Exit with code 1 unless the document reaches this phase
    #[arg(long)]
    gate: Option<String>,
}

/// Arguments for the `batch` subcommand
#[derive(Parser)]
struct BatchArgs {
    /// Directory to scan recursively for *.eds, *.xml and *.iodd files
    dir: PathBuf,

    /// Output format (auto detects TTY: summary if interactive, json otherwise)
    #[arg(short, long, default_value = "auto")]
    output: ReportFormat,

    /// Output file path (stdout if not specified)
    #[arg(short = 'O', long)]
    output_file: Option<PathBuf>,

    /// Exit with code 1 unless every document reaches this phase
    #[arg(long)]
    gate: Option<String>,

    /// Worker threads for parallel evaluation (default: one per core)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Append per-document quality metrics to this JSONL file
    #[arg(long)]
    history: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse one device description and print the normalized model
    Parse(ParseArgs),

    /// Rebuild canonical text from a parsed device description
    Reconstruct(ReconstructArgs),

    /// Score round-trip fidelity for one device description
    Evaluate(EvaluateArgs),

    /// Evaluate every device description under a directory
    Batch(BatchArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Show, discover, or initialize configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Sub-subcommands for the `config` command
#[derive(Subcommand)]
enum ConfigAction {
    /// Print current effective configuration (merged from defaults + file)
    Show,
    /// Print config file search paths and discovered config file
    Path,
    /// Generate an example .devdesc-tools.yaml in the current directory
    Init,
    /// Generate JSON Schema for the config file format
    Schema {
        /// Write schema to file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Dispatch to command handlers
    match cli.command {
        Commands::Parse(args) => {
            let overrides = AppConfig::builder()
                .output_format(args.output)
                .output_file(args.output_file)
                .no_color(cli.no_color)
                .build();
            let (app, _) = AppConfig::from_file_with_overrides(cli.config.as_deref(), &overrides);
            let format = args
                .format
                .as_deref()
                .map(cli::parse_format_override)
                .transpose()?;

            let exit_code = cli::run_parse(args.file, format, &app, cli.quiet)?;
            if exit_code != 0 {
                std::process::exit(exit_code);
            }
            Ok(())
        }

        Commands::Reconstruct(args) => {
            let overrides = AppConfig::builder()
                .output_file(args.output_file)
                .no_color(cli.no_color)
                .build();
            let (app, _) = AppConfig::from_file_with_overrides(cli.config.as_deref(), &overrides);
            let format = args
                .format
                .as_deref()
                .map(cli::parse_format_override)
                .transpose()?;

            let exit_code = cli::run_reconstruct(args.file, format, &app, cli.quiet)?;
            if exit_code != 0 {
                std::process::exit(exit_code);
            }
            Ok(())
        }

        Commands::Evaluate(args) => {
            let overrides = AppConfig::builder()
                .output_format(args.output)
                .output_file(args.output_file)
                .no_color(cli.no_color)
                .build();
            let (app, _) = AppConfig::from_file_with_overrides(cli.config.as_deref(), &overrides);
            let format = args
                .format
                .as_deref()
                .map(cli::parse_format_override)
                .transpose()?;

            let exit_code = cli::run_evaluate(args.file, format, args.gate, &app, cli.quiet)?;
            if exit_code != 0 {
                std::process::exit(exit_code);
            }
            Ok(())
        }

        Commands::Batch(args) => {
            let overrides = AppConfig::builder()
                .output_format(args.output)
                .output_file(args.output_file)
                .no_color(cli.no_color)
                .jobs(args.jobs)
                .history(args.history)
                .build();
            let (app, _) = AppConfig::from_file_with_overrides(cli.config.as_deref(), &overrides);

            let exit_code = cli::run_batch(args.dir, args.gate, &app, cli.quiet)?;
            if exit_code != 0 {
                std::process::exit(exit_code);
            }
            Ok(())
        }

        Commands::Completions { shell } => {
            generate(
                shell,
                &mut Cli::command(),
                "devdesc-tools",
                &mut io::stdout(),
            );
            Ok(())
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                let (config, loaded_from) = config::load_or_default(cli.config.as_deref());
                if let Some(path) = &loaded_from {
                    eprintln!("# Loaded from: {}", path.display());
                } else {
                    eprintln!("# No config file found; showing defaults");
                }
                let yaml = serde_yaml::to_string(&config).context("failed to serialize config")?;
                print!("{yaml}");
                Ok(())
            }
            ConfigAction::Path => {
                let search_paths: [Option<String>; 3] = [
                    std::env::current_dir()
                        .ok()
                        .map(|p| p.display().to_string()),
                    dirs::config_dir().map(|p| p.join("devdesc-tools").display().to_string()),
                    dirs::home_dir().map(|p| p.display().to_string()),
                ];
                eprintln!("Config file search paths (in order):");
                for path in search_paths.into_iter().flatten() {
                    eprintln!("  {path}");
                }
                eprintln!();
                eprintln!("Recognized file names:");
                for name in config::CONFIG_FILE_NAMES {
                    eprintln!("  {name}");
                }
                eprintln!();
                match config::discover_config_file(cli.config.as_deref()) {
                    Some(path) => eprintln!("Active config file: {}", path.display()),
                    None => eprintln!("No config file found."),
                }
                Ok(())
            }
            ConfigAction::Init => {
                let target = std::env::current_dir()
                    .context("cannot determine current directory")?
                    .join(".devdesc-tools.yaml");
                if target.exists() {
                    anyhow::bail!(
                        "{} already exists. Remove it first to re-initialize.",
                        target.display()
                    );
                }
                let content = config::generate_full_example_config();
                std::fs::write(&target, content)
                    .with_context(|| format!("failed to write {}", target.display()))?;
                eprintln!("Created {}", target.display());
                Ok(())
            }
            ConfigAction::Schema { output } => {
                let schema = config::generate_json_schema();
                match output {
                    Some(path) => {
                        std::fs::write(&path, &schema)?;
                        eprintln!("Schema written to {}", path.display());
                    }
                    None => {
                        println!("{schema}");
                    }
                }
                Ok(())
            }
        },
    }
}
