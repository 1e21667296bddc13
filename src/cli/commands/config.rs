//! Configuration inspection commands.

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;
use crate::infrastructure::config::ConfigLoader;
use crate::services::total_steps;

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration, passwords redacted
    Show {
        /// Configuration file (defaults to ringscan.yaml + ringscan.local.yaml)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Load and validate the configuration
    Validate {
        /// Configuration file (defaults to ringscan.yaml + ringscan.local.yaml)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Load from `file` when given, otherwise from the default locations
pub fn load_config(file: Option<&Path>) -> Result<Config> {
    match file {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}

#[derive(Debug, Serialize)]
pub struct ConfigShowOutput {
    #[serde(flatten)]
    pub config: Config,
}

impl CommandOutput for ConfigShowOutput {
    fn to_human(&self) -> String {
        serde_yaml::to_string(&self.config)
            .unwrap_or_else(|e| format!("Failed to render configuration: {e}"))
    }
}

#[derive(Debug, Serialize)]
pub struct ConfigValidateOutput {
    pub valid: bool,
    pub source: String,
    pub accounts: usize,
    pub workers: usize,
    pub grid_points: usize,
}

impl CommandOutput for ConfigValidateOutput {
    fn to_human(&self) -> String {
        format!(
            "Configuration valid ({})\n  Accounts: {}\n  Workers: {}\n  Grid points per iteration: {}",
            self.source, self.accounts, self.workers, self.grid_points
        )
    }
}

pub async fn execute(args: ConfigArgs, json_mode: bool) -> Result<()> {
    match args.command {
        ConfigCommand::Show { file } => {
            let config = load_config(file.as_deref())?;
            output(&ConfigShowOutput { config: config.redacted() }, json_mode);
        }
        ConfigCommand::Validate { file } => {
            let config = load_config(file.as_deref())?;
            let source = file.map_or_else(
                || "ringscan.yaml".to_string(),
                |path| path.display().to_string(),
            );
            output(
                &ConfigValidateOutput {
                    valid: true,
                    source,
                    accounts: config.accounts.len(),
                    workers: config.scan.workers,
                    grid_points: total_steps(config.scan.step_limit),
                },
                json_mode,
            );
        }
    }
    Ok(())
}
