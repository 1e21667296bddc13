//! Offline simulation command.
//!
//! Runs the full engine against simulated API clients and writes every
//! persisted step to a JSON-lines file.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::config::load_config;
use crate::adapters::{JsonLinesSink, SimulatedApiClient, SimulationProfile};
use crate::application::ScanEngine;
use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::domain::models::{AuthService, Config, Credentials};
use crate::domain::ports::GameApiClient;
use crate::services::ScanStatsSnapshot;

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Configuration file (defaults to ringscan.yaml + ringscan.local.yaml)
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Iterations to run before stopping
    #[arg(short, long, default_value = "1")]
    pub iterations: u64,

    /// JSON-lines output file
    #[arg(short, long, default_value = "ringscan-simulation.jsonl")]
    pub output: PathBuf,

    /// Make every n-th simulated request fail
    #[arg(long)]
    pub fail_every: Option<u64>,

    /// Simulated request latency in milliseconds
    #[arg(long, default_value = "0")]
    pub latency_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct SimulateOutput {
    pub iterations: u64,
    pub output: PathBuf,
    pub stats: ScanStatsSnapshot,
}

impl CommandOutput for SimulateOutput {
    fn to_human(&self) -> String {
        format!(
            "Simulation finished after {} iteration(s), records written to {}\n{}",
            self.iterations,
            self.output.display(),
            TableFormatter::new().format_stats(&self.stats)
        )
    }
}

/// Accounts from the configuration, or a single stand-in when none are set
fn simulated_accounts(
    config: &Config,
    profile: &SimulationProfile,
) -> Vec<(Credentials, Box<dyn GameApiClient>)> {
    let credentials = if config.accounts.is_empty() {
        vec![Credentials::new(AuthService::Ptc, "simulated", "simulated")]
    } else {
        config.accounts.clone()
    };

    credentials
        .into_iter()
        .map(|creds| {
            let client: Box<dyn GameApiClient> = Box::new(SimulatedApiClient::new(profile.clone()));
            (creds, client)
        })
        .collect()
}

pub async fn simulate(args: &SimulateArgs, config: Config) -> Result<SimulateOutput> {
    let profile = SimulationProfile {
        fail_every: args.fail_every,
        latency: Duration::from_millis(args.latency_ms),
        ..SimulationProfile::default()
    };
    let accounts = simulated_accounts(&config, &profile);

    let mut scan = config.scan;
    scan.max_iterations = Some(args.iterations);

    let sink = JsonLinesSink::create(&args.output)
        .await
        .with_context(|| format!("Failed to open {}", args.output.display()))?;

    let mut engine = ScanEngine::new(scan, accounts, Arc::new(sink))?;
    engine.start().await?;

    let iterations = tokio::select! {
        completed = engine.wait() => completed?,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, stopping scan engine");
            engine.stop().await?;
            engine.stats().iterations_completed
        }
    };

    Ok(SimulateOutput {
        iterations,
        output: args.output.clone(),
        stats: engine.stats(),
    })
}

pub async fn execute(args: SimulateArgs, json_mode: bool) -> Result<()> {
    let config = load_config(args.file.as_deref())?;
    let result = simulate(&args, config).await?;
    output(&result, json_mode);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::ScanConfig;
    use tempfile::TempDir;

    fn fast_config(step_limit: u32) -> Config {
        Config {
            scan: ScanConfig {
                step_limit,
                workers: 2,
                request_delay_ms: 0,
                iteration_delay_ms: 0,
                drain_poll_interval_ms: 5,
                ..ScanConfig::default()
            },
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_simulate_writes_every_step() {
        let dir = TempDir::new().unwrap();
        let args = SimulateArgs {
            file: None,
            iterations: 2,
            output: dir.path().join("sim.jsonl"),
            fail_every: None,
            latency_ms: 0,
        };

        let result = simulate(&args, fast_config(3)).await.unwrap();

        assert_eq!(result.iterations, 2);
        assert_eq!(result.stats.tasks_processed, 38);
        let lines = std::fs::read_to_string(&args.output).unwrap().lines().count();
        assert_eq!(lines, 38);
    }

    #[tokio::test]
    async fn test_simulated_failures_are_retried() {
        let dir = TempDir::new().unwrap();
        let args = SimulateArgs {
            file: None,
            iterations: 1,
            output: dir.path().join("sim.jsonl"),
            fail_every: Some(4),
            latency_ms: 0,
        };

        let result = simulate(&args, fast_config(3)).await.unwrap();

        assert_eq!(result.stats.tasks_processed, 19);
        assert!(result.stats.request_failures > 0);
    }

    #[test]
    fn test_stand_in_account_when_none_configured() {
        let accounts = simulated_accounts(&Config::default(), &SimulationProfile::default());
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].0.username, "simulated");
    }
}
