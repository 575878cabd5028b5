// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! treelock - fair read/write locks over a coordination tree

mod commands;
mod output;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use commands::{config, scenario, simulate};
use std::path::{Path, PathBuf};
use treelock_core::LockConfig;

#[derive(Parser)]
#[command(
    name = "treelock",
    version,
    about = "treelock - Fair shared/exclusive locks on a coordination tree"
)]
struct Cli {
    /// Lock configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run concurrent readers and writers against one in-memory tree
    Simulate(simulate::SimulateArgs),
    /// Walk through a writer, reader, writer hand-off step by step
    Scenario(scenario::ScenarioArgs),
    /// Print the effective lock configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let lock_config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Simulate(args) => simulate::handle(args, lock_config).await,
        Commands::Scenario(args) => scenario::handle(args, lock_config).await,
        Commands::Config(args) => config::handle(args, &lock_config),
    }
}

fn load_config(path: Option<&Path>) -> Result<LockConfig> {
    match path {
        Some(path) => LockConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(LockConfig::default()),
    }
}

fn setup_logging(verbose: u8) {
    use tracing_subscriber::EnvFilter;

    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
