// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Print the effective configuration

use crate::output::OutputFormat;
use anyhow::Result;
use treelock_core::LockConfig;

#[derive(clap::Args)]
pub struct ConfigArgs {
    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

pub fn handle(args: ConfigArgs, config: &LockConfig) -> Result<()> {
    match args.format {
        OutputFormat::Text => print!("{}", config.to_toml_string()?),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
    }
    Ok(())
}
