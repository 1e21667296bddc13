//! Ringscan CLI entry point.

use clap::Parser;

use ringscan::cli::{Cli, Commands};
use ringscan::infrastructure::config::ConfigLoader;
use ringscan::infrastructure::logging::{LogConfig, LoggerImpl};

/// Logging comes from the default configuration files when they load, so a
/// broken file still lets `config validate` report the problem.
fn init_logging(cli: &Cli) -> Option<LoggerImpl> {
    let logging = ConfigLoader::load().map(|c| c.logging).unwrap_or_default();
    let mut log_config = LogConfig::try_from(&logging).unwrap_or_default();
    if let Some(level) = &cli.log_level {
        log_config.level.clone_from(level);
    }

    match LoggerImpl::init(&log_config) {
        Ok(logger) => Some(logger),
        Err(err) => {
            eprintln!("Failed to initialise logging: {err:#}");
            None
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let _logger = init_logging(&cli);

    let result = match cli.command {
        Commands::Plan(args) => ringscan::cli::commands::plan::execute(args, cli.json).await,
        Commands::Config(args) => ringscan::cli::commands::config::execute(args, cli.json).await,
        Commands::Simulate(args) => {
            ringscan::cli::commands::simulate::execute(args, cli.json).await
        }
    };

    if let Err(err) = result {
        ringscan::cli::handle_error(err, cli.json);
    }
}
