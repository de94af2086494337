//! # Vintage
//!
//! The command line front end of the Vintage reconciliation engine.
//!
//! Fetchers write candidate records as JSON files; this binary reconciles
//! them into the configured store and reports what changed.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                apps/vintage (THE BINARY)             │
//! │                                                      │
//! │  ┌─────────────┐             ┌──────────────────┐    │
//! │  │   CLI       │             │  Configuration   │    │
//! │  │  (clap)     │             │  (toml + env)    │    │
//! │  └──────┬──────┘             └────────┬─────────┘    │
//! │         └──────────────┬──────────────┘              │
//! │                        ▼                             │
//! │                ┌───────────────┐                     │
//! │                │ vintage-core  │                     │
//! │                │ (THE ENGINE)  │                     │
//! │                └───────────────┘                     │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! vintage init
//! vintage dataset -f datasets.json
//! vintage series -f series.json
//! vintage history -k CPI.M.US
//! vintage status --json-mode
//! ```

mod cli;
mod config;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    // Parse first so --verbose can raise the default level.
    let cli = cli::Cli::parse();

    // VINTAGE_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("VINTAGE_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_filter = if cli.verbose {
        "vintage=debug,vintage_core=debug"
    } else {
        "vintage=info,vintage_core=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the Vintage startup banner.
fn print_banner() {
    println!(
        r#"
  ██╗   ██╗██╗███╗   ██╗████████╗ █████╗  ██████╗ ███████╗
  ██║   ██║██║████╗  ██║╚══██╔══╝██╔══██╗██╔════╝ ██╔════╝
  ██║   ██║██║██╔██╗ ██║   ██║   ███████║██║  ███╗█████╗
  ╚██╗ ██╔╝██║██║╚██╗██║   ██║   ██╔══██║██║   ██║██╔══╝
   ╚████╔╝ ██║██║ ╚████║   ██║   ██║  ██║╚██████╔╝███████╗
    ╚═══╝  ╚═╝╚═╝  ╚═══╝   ╚═╝   ╚═╝  ╚═╝ ╚═════╝ ╚══════╝

  Revision-aware series store v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
