use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::{BackoffStrategy, Config, RetryConfig};
use crate::services::step_generator::MAX_STEP_LIMIT;

const MAX_WORKERS: usize = 256;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid workers: {0}. Must be between 1 and {MAX_WORKERS}")]
    InvalidWorkers(usize),

    #[error("Invalid step_limit: {0}. Must be at most {MAX_STEP_LIMIT}")]
    InvalidStepLimit(u32),

    #[error("Invalid latitude: {0}. Must be between -90 and 90")]
    InvalidLatitude(f64),

    #[error("Invalid longitude: {0}. Must be between -180 and 180")]
    InvalidLongitude(f64),

    #[error("Invalid detection_radius_km: {0}. Must be positive")]
    InvalidDetectionRadius(f64),

    #[error("Invalid max_consecutive_failures: {0}. Must be at least 1")]
    InvalidFailureThreshold(u32),

    #[error("Account {0} has an empty username")]
    EmptyUsername(usize),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidLogRotation(String),

    #[error("Invalid {0}.max_attempts: 0. Omit it for unbounded retries")]
    InvalidMaxAttempts(&'static str),

    #[error(
        "Invalid {0} backoff configuration: initial backoff ({1} ms) must be less than max_backoff_ms ({2})"
    )]
    InvalidBackoff(&'static str, u64, u64),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. ringscan.yaml
    /// 3. ringscan.local.yaml (optional local overrides)
    /// 4. Environment variables (RINGSCAN_* prefix, `__` separates nested keys)
    pub fn load() -> Result<Config> {
        let config: Config = Self::figment()
            .merge(Yaml::file("ringscan.yaml"))
            .merge(Yaml::file("ringscan.local.yaml"))
            .merge(Env::prefixed("RINGSCAN_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    ///
    /// Environment overrides still apply on top of the file.
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Self::figment()
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed("RINGSCAN_").split("__"))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.as_ref().display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    fn figment() -> Figment {
        Figment::new().merge(Serialized::defaults(Config::default()))
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let scan = &config.scan;

        if scan.workers == 0 || scan.workers > MAX_WORKERS {
            return Err(ConfigError::InvalidWorkers(scan.workers));
        }

        if scan.step_limit > MAX_STEP_LIMIT {
            return Err(ConfigError::InvalidStepLimit(scan.step_limit));
        }

        if !(-90.0..=90.0).contains(&scan.latitude) {
            return Err(ConfigError::InvalidLatitude(scan.latitude));
        }
        if !(-180.0..=180.0).contains(&scan.longitude) {
            return Err(ConfigError::InvalidLongitude(scan.longitude));
        }

        if scan.detection_radius_km.is_nan() || scan.detection_radius_km <= 0.0 {
            return Err(ConfigError::InvalidDetectionRadius(scan.detection_radius_km));
        }

        if scan.max_consecutive_failures == 0 {
            return Err(ConfigError::InvalidFailureThreshold(0));
        }

        Self::validate_retry("request_retry", &scan.request_retry, scan.request_delay_ms)?;
        Self::validate_retry("login_retry", &scan.login_retry, scan.login_delay_ms)?;

        if let Some(index) = config.accounts.iter().position(|a| a.username.trim().is_empty()) {
            return Err(ConfigError::EmptyUsername(index));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidLogRotation(config.logging.rotation.clone()));
        }

        Ok(())
    }

    fn validate_retry(
        name: &'static str,
        retry: &RetryConfig,
        initial_ms: u64,
    ) -> Result<(), ConfigError> {
        if retry.max_attempts == Some(0) {
            return Err(ConfigError::InvalidMaxAttempts(name));
        }
        if retry.backoff == BackoffStrategy::Exponential && initial_ms >= retry.max_backoff_ms {
            return Err(ConfigError::InvalidBackoff(name, initial_ms, retry.max_backoff_ms));
        }
        Ok(())
    }
}
