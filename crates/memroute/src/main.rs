// SPDX-FileCopyrightText: 2026 Memroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! memroute - route memory operations across graph, cache and document stores.
//!
//! This is the binary entry point. It loads configuration, then classifies
//! or routes a piece of text without touching any backend.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod analyze;
mod show_config;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use memroute_core::Operation;

/// memroute - route memory operations across graph, cache and document stores.
#[derive(Parser, Debug)]
#[command(name = "memroute", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit JSON instead of human-readable output.
    #[arg(long, global = true)]
    json: bool,

    /// Disable colors.
    #[arg(long, global = true)]
    plain: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify the intent of a piece of text.
    Classify {
        text: String,
    },
    /// Show where a request would be routed.
    Route {
        text: String,
        /// Request urgency (e.g. "high").
        #[arg(long)]
        urgency: Option<String>,
        /// Memory operation (store, query, retrieve, search).
        #[arg(long, default_value = "query")]
        operation: Operation,
    },
    /// Print the effective configuration.
    Config,
}

impl Commands {
    /// Subcommand name as typed on the command line.
    fn name(&self) -> &'static str {
        match self {
            Commands::Classify { .. } => "classify",
            Commands::Route { .. } => "route",
            Commands::Config => "config",
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => memroute_config::load_and_validate_path(path),
        None => memroute_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            memroute_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.general.log_level);
    memroute_resilience::recording::register_metrics();

    tracing::debug!(
        command = cli.command.as_ref().map_or("none", Commands::name),
        log_level = %config.general.log_level,
        "memroute starting"
    );

    let result = match cli.command {
        Some(Commands::Classify { text }) => {
            analyze::run_classify(&config, &text, cli.json, cli.plain)
        }
        Some(Commands::Route {
            text,
            urgency,
            operation,
        }) => analyze::run_route(
            &config,
            &text,
            operation,
            urgency.as_deref(),
            cli.json,
            cli.plain,
        ),
        Some(Commands::Config) => show_config::run_config(&config, cli.json),
        None => {
            println!("memroute: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

/// Initialize the tracing subscriber with an env filter.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("memroute={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}
