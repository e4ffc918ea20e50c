//! Rowform CLI
//!
//! Command-line interface for Rowform - inspect delimited files and replay
//! edit scripts through the sync engine.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "rowform")]
#[command(about = "Rowform - keep a delimited text buffer and a row form in sync")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a delimited file and show its table structure
    Inspect {
        /// File to inspect
        file: PathBuf,
        /// 1-based line holding the column labels
        #[arg(long, default_value_t = 1)]
        header_row: usize,
        /// Show one 1-based buffer line as label/value pairs
        #[arg(long)]
        row: Option<usize>,
    },
    /// Replay a script of edits through the sync engine
    Replay {
        /// File providing the initial buffer
        file: PathBuf,
        /// JSON script of edit actions
        script: PathBuf,
        /// 1-based line holding the column labels
        #[arg(long, default_value_t = 1)]
        header_row: usize,
        /// Print every call the engine made on the form
        #[arg(long)]
        trace: bool,
        /// Write the resulting buffer to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (field_debounce_ms, guard_hold_ms, ...)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    match cli.command {
        Commands::Inspect {
            file,
            header_row,
            row,
        } => commands::inspect::run(&file, header_row, row, &output),
        Commands::Replay {
            file,
            script,
            header_row,
            trace,
            output: out_file,
        } => commands::replay::run(&file, &script, header_row, trace, out_file.as_deref(), &output).await,
        Commands::Config { command } => handle_config_command(command, &output),
    }
}

fn handle_config_command(command: Option<ConfigCommands>, output: &Output) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(output),
        Some(ConfigCommands::Set { key, value }) => commands::config::set(key, value, output),
    }
}

/// Log to stderr so stdout stays parseable; RUST_LOG overrides the default
fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("rowform_core=warn,rowform_cli=warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .try_init();
}
