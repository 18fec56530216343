//! # PhilsAxioms
//!
//! The main binary: HTTP API server and command line tools over a YAML
//! dataset of axioms and arguments.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                 apps/philsaxioms (THE BINARY)             │
//! │                                                           │
//! │   ┌─────────────┐    ┌─────────────┐    ┌─────────────┐   │
//! │   │    CLI      │    │  HTTP API   │    │   Dataset   │   │
//! │   │   (clap)    │    │   (axum)    │    │    Store    │   │
//! │   └──────┬──────┘    └──────┬──────┘    └──────┬──────┘   │
//! │          └──────────────────┼──────────────────┘          │
//! │                             ▼                             │
//! │                  ┌────────────────────┐                   │
//! │                  │  philsaxioms-core  │                   │
//! │                  │    (THE ENGINE)    │                   │
//! │                  └────────────────────┘                   │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server, reloading on file changes
//! philsaxioms --data ./data server --port 3001 --watch
//!
//! # Authoring tools
//! philsaxioms check
//! philsaxioms evaluate --accept realism,induction
//! philsaxioms build-static --output ./public/data
//! ```

use clap::Parser;
use philsaxioms::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // PHILSAXIOMS_LOG_FORMAT=json enables machine-parseable output.
    let log_format =
        std::env::var("PHILSAXIOMS_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "philsaxioms=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the PhilsAxioms startup banner.
fn print_banner() {
    println!(
        r#"
  PhilsAxioms v{}

  What follows from what you accept?
"#,
        env!("CARGO_PKG_VERSION")
    );
}
