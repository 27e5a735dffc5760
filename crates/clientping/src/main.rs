// SPDX-FileCopyrightText: 2026 ClientPing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! ClientPing - customer messaging automation for Telegram and WhatsApp.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod import;
mod serve;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use clientping_config::ClientPingConfig;

/// ClientPing - customer messaging automation for Telegram and WhatsApp.
#[derive(Parser, Debug)]
#[command(name = "clientping", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the webhook and API server (default).
    Serve,
    /// Validate configuration and print it with secrets redacted.
    CheckConfig,
    /// Manage automation flows.
    Flows {
        #[command(subcommand)]
        command: FlowsCommand,
    },
}

#[derive(Subcommand, Debug)]
enum FlowsCommand {
    /// Load flows from a JSON array file, replacing flows with the same id.
    Import { file: PathBuf },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => clientping_config::load_and_validate_path(path),
        None => clientping_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            clientping_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.logging.level);

    let result = match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve::run_serve(config).await,
        Commands::CheckConfig => {
            print_config(&config);
            Ok(())
        }
        Commands::Flows {
            command: FlowsCommand::Import { file },
        } => import::import_flows(&config, &file).await.map(|n| {
            println!("imported {n} flow(s) from {}", file.display());
        }),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn print_config(config: &ClientPingConfig) {
    match toml::to_string_pretty(&config.redacted()) {
        Ok(rendered) => {
            println!("configuration is valid\n");
            print!("{rendered}");
        }
        Err(e) => eprintln!("configuration is valid but could not be printed: {e}"),
    }
}

/// `RUST_LOG` wins over `logging.level`.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("clientping={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
