//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use clap::{Parser, Subcommand};

use super::commands::config::ConfigArgs;
use super::commands::plan::PlanArgs;
use super::commands::simulate::SimulateArgs;

#[derive(Parser)]
#[command(name = "ringscan")]
#[command(about = "Ringscan - hex-ring area scanner", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Override the configured log level
    #[arg(long, global = true, env = "RINGSCAN_LOG_LEVEL")]
    pub log_level: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the scan grid for an origin
    Plan(PlanArgs),

    /// Configuration commands
    Config(ConfigArgs),

    /// Run the engine against the simulated API
    Simulate(SimulateArgs),
}
