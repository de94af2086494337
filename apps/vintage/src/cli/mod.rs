//! # Vintage CLI Module
//!
//! This module implements the CLI interface for Vintage.
//!
//! ## Available Commands
//!
//! - `init` - Create an empty store
//! - `dataset` - Reconcile datasets from a JSON file
//! - `series` - Reconcile series from a JSON file
//! - `category` - Reconcile category nodes from a JSON file
//! - `show` - Print a stored series
//! - `history` - Print the revision history of a series
//! - `status` - Show store metrics

mod commands;

use crate::config::{self, Overrides};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use vintage_core::VintageError;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Vintage - revision-aware statistical series store
///
/// Reconciles provider datasets and series by key, keeping the release
/// date of every value and every value it superseded.
#[derive(Parser, Debug)]
#[command(name = "vintage")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a TOML configuration file (default: ./vintage.toml if present)
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the store
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Storage backend: "redb" (ACID database), "file" (snapshot file) or "memory"
    #[arg(short = 'B', long, global = true)]
    pub backend: Option<String>,

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
    /// Initialize a new empty store
    Init {
        /// Force initialization even if the store exists
        #[arg(short, long)]
        force: bool,
    },

    /// Reconcile datasets from a JSON file (object or array)
    Dataset {
        /// Path to the input file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Reconcile series from a JSON file (object or array)
    Series {
        /// Path to the input file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Reconcile category nodes from a JSON file (object or array)
    Category {
        /// Path to the input file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Print a stored series
    Show {
        /// Series key
        #[arg(short, long)]
        key: String,
    },

    /// Print the revision history of a stored series
    History {
        /// Series key
        #[arg(short, long)]
        key: String,

        /// Include periods that were never revised
        #[arg(short, long)]
        all: bool,
    },

    /// Show store status
    Status,
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), VintageError> {
    let config = config::load(&Overrides {
        config: cli.config,
        database: cli.database,
        backend: cli.backend,
    })?;
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Init { force }) => cmd_init(&config, force),
        Some(Commands::Dataset { file }) => cmd_dataset(&config, json_mode, &file),
        Some(Commands::Series { file }) => cmd_series(&config, json_mode, &file),
        Some(Commands::Category { file }) => cmd_category(&config, json_mode, &file),
        Some(Commands::Show { key }) => cmd_show(&config, json_mode, &key),
        Some(Commands::History { key, all }) => cmd_history(&config, json_mode, &key, all),
        Some(Commands::Status) => cmd_status(&config, json_mode),
        None => {
            // No subcommand - show status by default
            cmd_status(&config, json_mode)
        }
    }
}
