//! repogate - repository hygiene gates
//!
//! Each subcommand runs one gate and exits `0` on success or `1` on any
//! violation. Strict (release) mode is selected with `RELEASE_GATE=1`.

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use repogate::gates::{execute, EncodingGate, Gate, InventoryGate, LedgerGate};
use repogate::{GateConfig, Mode};

#[derive(Parser)]
#[command(name = "repogate")]
#[command(version = "0.1.0")]
#[command(about = "Read-only repository hygiene gates for build pipelines", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Repository root (defaults to current directory)
    #[arg(short, long, global = true, default_value = ".")]
    project: PathBuf,

    /// Configuration file (defaults to <project>/repogate.json when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check required artifacts exist, have content, and hold no placeholders
    Inventory,

    /// Check scanned text files for BOMs, invalid UTF-8 and mojibake
    Encoding,

    /// Check the status ledger grammar and, in strict mode, completion
    Ledger,

    /// Show or validate gate configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show effective configuration
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Paths,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries only the gate verdict.
    let filter = if cli.verbose {
        "repogate=debug"
    } else {
        "repogate=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let project_path = cli.project.canonicalize().unwrap_or(cli.project.clone());
    if !project_path.is_dir() {
        eprintln!(
            "{} Project directory does not exist: {}",
            "Error:".red().bold(),
            project_path.display()
        );
        return ExitCode::FAILURE;
    }

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Config { action } => match run_config(action, &project_path, config_path) {
            Ok(code) => code,
            Err(e) => {
                eprintln!("{} {:#}", "Error:".red().bold(), e);
                ExitCode::FAILURE
            }
        },
        Commands::Inventory => run_gate(&project_path, config_path, |config| {
            config.inventory.validate().into_result()?;
            InventoryGate::from_config(&config.inventory)
        }),
        Commands::Encoding => run_gate(&project_path, config_path, |config| {
            config.encoding.validate().into_result()?;
            EncodingGate::from_config(&config.encoding)
        }),
        Commands::Ledger => run_gate(&project_path, config_path, |config| {
            config.ledger.validate().into_result()?;
            LedgerGate::from_config(&config.ledger)
        }),
    }
}

/// Load configuration, build one gate from its own section, and run it.
fn run_gate<G, F>(project_path: &Path, config_path: Option<&Path>, build: F) -> ExitCode
where
    G: Gate,
    F: FnOnce(&GateConfig) -> repogate::Result<G>,
{
    let gate = match GateConfig::load(project_path, config_path).and_then(|config| build(&config))
    {
        Ok(gate) => gate,
        Err(e) => {
            eprintln!("GATE FAIL: {}", e);
            if e.is_config() {
                eprintln!("Run `repogate config validate` for details.");
            }
            return ExitCode::from(e.exit_code());
        }
    };

    execute(&gate, project_path, Mode::from_env())
}

fn run_config(
    action: ConfigAction,
    project_path: &Path,
    config_path: Option<&Path>,
) -> anyhow::Result<ExitCode> {
    let source = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| GateConfig::config_path(project_path));

    match action {
        ConfigAction::Paths => {
            let state = if source.exists() {
                "present".green()
            } else {
                "absent, using defaults".yellow()
            };
            println!("{} ({})", source.display(), state);
            Ok(ExitCode::SUCCESS)
        }

        ConfigAction::Show { json } => {
            let config = GateConfig::load(project_path, config_path)
                .with_context(|| format!("Failed to load {}", source.display()))?;

            if json {
                let text = serde_json::to_string_pretty(&config)
                    .context("Failed to serialize configuration")?;
                println!("{}", text);
            } else {
                println!("\n{} Gate Configuration", "Config:".cyan().bold());
                println!("{}", "─".repeat(40));
                println!("   Source: {}", source.display());
                println!(
                    "   Required artifacts: {}",
                    config.inventory.required.len()
                );
                println!("   Key artifacts: {}", config.inventory.key_artifacts.len());
                println!(
                    "   Placeholder patterns: {}",
                    config.inventory.placeholder_patterns.len()
                );
                println!("   Scan roots: {}", config.encoding.roots.len());
                println!(
                    "   Mojibake signatures: {}",
                    config.encoding.mojibake_signatures.len()
                );
                println!("   Ledger: {}", config.ledger.path.display());
                println!("   Statuses: {}", config.ledger.statuses.join(", "));
            }
            Ok(ExitCode::SUCCESS)
        }

        ConfigAction::Validate => {
            let config = GateConfig::load(project_path, config_path)
                .with_context(|| format!("Failed to load {}", source.display()))?;

            let report = config.validate();
            for warning in &report.warnings {
                println!("{} {}", "Warning:".yellow(), warning);
            }
            for error in &report.errors {
                eprintln!("{} {}", "Error:".red(), error);
            }

            if report.is_valid() {
                println!("{} configuration is valid", "OK".green());
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
    }
}
