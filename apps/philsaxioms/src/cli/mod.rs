//! # PhilsAxioms CLI Module
//!
//! This module implements the CLI interface for PhilsAxioms.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `status` - Show dataset counts
//! - `check` - Run the consistency report (non-zero exit when invalid)
//! - `evaluate` - Print the valid arguments for a selection of axioms
//! - `layout` - Print level and coordinates per node
//! - `build-static` - Write the JSON bundle for the static front end

mod commands;

use crate::{AppError, Config};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// PhilsAxioms - explore which arguments follow from the axioms you accept
#[derive(Parser, Debug)]
#[command(name = "philsaxioms")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Directory containing categories.yaml and nodes.yaml
    #[arg(short = 'd', long, global = true)]
    pub data: Option<PathBuf>,

    /// Path to a TOML configuration file
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,

        /// Reload the dataset when files in the data directory change
        #[arg(short, long)]
        watch: bool,
    },

    /// Show dataset counts
    Status,

    /// Check dataset consistency
    Check,

    /// Evaluate a selection of axioms
    Evaluate {
        /// Accepted axiom ids (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        accept: Vec<String>,

        /// Rejected axiom ids (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        reject: Vec<String>,
    },

    /// Print the layered layout
    Layout,

    /// Write graph-data.json and questionnaire.json for the static front end
    BuildStatic {
        /// Output directory
        #[arg(short, long)]
        output: PathBuf,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Resolve the configuration: file and environment, then flags.
pub fn resolve_config(cli: &Cli) -> Result<Config, AppError> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(data) = &cli.data {
        config.data_dir.clone_from(data);
    }
    if let Some(Commands::Server { host, port, watch }) = &cli.command {
        if let Some(host) = host {
            config.host.clone_from(host);
        }
        if let Some(port) = port {
            config.port = *port;
        }
        config.watch |= *watch;
    }
    Ok(config)
}

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), AppError> {
    let config = resolve_config(&cli)?;
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server { .. }) => cmd_server(&config).await,
        Some(Commands::Check) => cmd_check(&config, json_mode).await,
        Some(Commands::Evaluate { accept, reject }) => {
            cmd_evaluate(&config, json_mode, &accept, &reject).await
        }
        Some(Commands::Layout) => cmd_layout(&config, json_mode).await,
        Some(Commands::BuildStatic { output }) => cmd_build_static(&config, &output).await,
        Some(Commands::Status) | None => cmd_status(&config, json_mode).await,
    }
}
