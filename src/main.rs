//! Binary entry point for delulu.
//!
//! This binary provides the CLI interface for conjuring daily horoscopes
//! into markdown notes.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use clap::{Parser, Subcommand};
use delulu::cli::{
    ConfigAction, cmd_config, cmd_context, cmd_generate, cmd_system_message,
};
use delulu::config::DeluluConfig;
use delulu::observability::{self, LogFormat, LoggingConfig};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Delulu - daily horoscopes conjured from your recent journal notes.
#[derive(Parser)]
#[command(name = "delulu")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log format (pretty or json).
    #[arg(long, global = true, default_value = "pretty")]
    log_format: LogFormat,

    /// Append log events to this file instead of stderr.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Generate a horoscope and insert it into a note.
    Generate {
        /// Root directory of the markdown vault.
        #[arg(long, env = "DELULU_VAULT")]
        vault: PathBuf,

        /// Note to insert into, relative to the vault unless absolute.
        note: PathBuf,

        /// Zero-based cursor line (default: last line).
        #[arg(long)]
        line: Option<usize>,

        /// Zero-based cursor column in characters (default: end of line).
        #[arg(long)]
        ch: Option<usize>,
    },

    /// Print the journal context sent with the request.
    Context {
        /// Root directory of the markdown vault.
        #[arg(long, env = "DELULU_VAULT")]
        vault: PathBuf,
    },

    /// Print the rendered system message.
    SystemMessage,

    /// Manage settings.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    if let Err(e) = observability::init(LoggingConfig::new(
        cli.log_format,
        cli.verbose,
        cli.log_file.clone(),
    )) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config.with_env_overrides(),
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    match run_command(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
async fn run_command(cli: Cli, config: DeluluConfig) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Generate {
            vault,
            note,
            line,
            ch,
        } => cmd_generate(&config, &vault, &note, line, ch).await,

        Commands::Context { vault } => cmd_context(&config, &vault).await,

        Commands::SystemMessage => cmd_system_message(&config),

        Commands::Config { action } => cmd_config(&config, action, cli.config.as_deref()),
    }
}

/// Loads configuration.
///
/// An explicit `--config` or `DELULU_CONFIG_PATH` file that does not exist yet
/// yields defaults, so `config set` can create it.
fn load_config(path: Option<&Path>) -> Result<DeluluConfig, Box<dyn std::error::Error>> {
    let explicit = path.map(Path::to_path_buf).or_else(|| {
        std::env::var("DELULU_CONFIG_PATH")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
    });

    match explicit {
        Some(config_path) if config_path.exists() => {
            DeluluConfig::load_from_file(&config_path).map_err(std::convert::Into::into)
        },
        Some(_) => Ok(DeluluConfig::default()),
        None => Ok(DeluluConfig::load_default()),
    }
}
