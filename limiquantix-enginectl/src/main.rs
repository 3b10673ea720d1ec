//! # limiquantix Engine CLI
//!
//! Command-line front end for the engine client. Talks to a live engine over
//! REST, or to the in-memory mock with `--mock`.
//!
//! ## Usage
//! ```bash
//! limiquantix-enginectl --config /etc/limiquantix/engine.yaml vms list
//! limiquantix-enginectl --mock templates blank
//! limiquantix-enginectl nics update <vm-id> <nic-id> --mac 00:1a:4a:16:01:51
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use tracing::{debug, error, info};

mod cli;
mod commands;
mod config;

use cli::Args;
use config::{Config, DEFAULT_CONFIG_PATH};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Load configuration
    let (config, source) = match &args.config {
        Some(config_path) => (Config::load(config_path)?, Some(config_path.as_str())),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            (Config::load(DEFAULT_CONFIG_PATH)?, Some(DEFAULT_CONFIG_PATH))
        }
        None => (Config::default(), None),
    };
    let config = config.with_cli_overrides(&args);

    // Initialize logging
    limiquantix_common::init_logging(&config.log.level, config.log.format)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting limiquantix engine CLI"
    );
    match source {
        Some(path) => info!(config_path = %path, "Configuration loaded"),
        None => info!("No config file found, using CLI arguments and defaults"),
    }

    let client = limiquantix_engine::connect(&config.engine).context("Failed to create engine client")?;
    debug!(backend = ?config.engine.backend, "Engine client ready");

    let output = match commands::run(client.as_ref(), &args.command).await {
        Ok(output) => output,
        Err(e) => {
            error!(error = %e, "Command failed");
            return Err(e);
        }
    };

    println!(
        "{}",
        serde_json::to_string_pretty(&output).context("Failed to format output")?
    );

    Ok(())
}
