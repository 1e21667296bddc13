use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::account::Credentials;
use super::location::Coordinate;

/// Main configuration structure for ringscan
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Scan orchestration parameters
    #[serde(default)]
    pub scan: ScanConfig,

    /// Accounts rotated across by the workers
    #[serde(default)]
    pub accounts: Vec<Credentials>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scan: ScanConfig::default(),
            accounts: vec![],
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Copy of this configuration that is safe to print
    pub fn redacted(&self) -> Self {
        Self {
            accounts: self.accounts.iter().map(Credentials::redacted).collect(),
            ..self.clone()
        }
    }
}

/// Whether the persistence backend tolerates concurrent writers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageConcurrency {
    /// Writes are serialized through a shared lock (e.g. an embedded database)
    #[default]
    SingleWriter,
    /// Workers persist concurrently
    Concurrent,
}

/// Scan orchestration configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ScanConfig {
    /// Origin latitude in degrees
    #[serde(default)]
    pub latitude: f64,

    /// Origin longitude in degrees
    #[serde(default)]
    pub longitude: f64,

    /// Number of hex rings to scan, counting the origin as ring 0
    #[serde(default = "default_step_limit")]
    pub step_limit: u32,

    /// Number of concurrent workers
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Pause after each task and between request retries, in milliseconds
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    /// Pause between scan iterations, in milliseconds
    #[serde(default = "default_iteration_delay_ms")]
    pub iteration_delay_ms: u64,

    /// Pause between login attempts, in milliseconds
    #[serde(default = "default_login_delay_ms")]
    pub login_delay_ms: u64,

    /// Consecutive persistence failures that trigger a heavy backoff
    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: u32,

    /// Heavy backoff duration, in milliseconds
    #[serde(default = "default_heavy_backoff_ms")]
    pub heavy_backoff_ms: u64,

    /// Storage concurrency mode
    #[serde(default)]
    pub storage: StorageConcurrency,

    /// Sessions with this much validity left (or less) are renewed
    #[serde(default = "default_session_refresh_threshold_secs")]
    pub session_refresh_threshold_secs: u64,

    /// How often the overseer checks whether the queue has emptied
    #[serde(default = "default_drain_poll_interval_ms")]
    pub drain_poll_interval_ms: u64,

    /// Detection radius of a single query, in kilometres
    #[serde(default = "default_detection_radius_km")]
    pub detection_radius_km: f64,

    /// Stop after this many successful iterations (unbounded when absent)
    #[serde(default)]
    pub max_iterations: Option<u64>,

    /// Retry policy for map requests
    #[serde(default)]
    pub request_retry: RetryConfig,

    /// Retry policy for logins
    #[serde(default)]
    pub login_retry: RetryConfig,
}

const fn default_step_limit() -> u32 {
    12
}

const fn default_workers() -> usize {
    1
}

const fn default_request_delay_ms() -> u64 {
    1000
}

const fn default_iteration_delay_ms() -> u64 {
    1000
}

const fn default_login_delay_ms() -> u64 {
    5000
}

const fn default_max_consecutive_failures() -> u32 {
    5
}

const fn default_heavy_backoff_ms() -> u64 {
    30_000
}

const fn default_session_refresh_threshold_secs() -> u64 {
    120
}

const fn default_drain_poll_interval_ms() -> u64 {
    1000
}

const fn default_detection_radius_km() -> f64 {
    0.07
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            latitude: 0.0,
            longitude: 0.0,
            step_limit: default_step_limit(),
            workers: default_workers(),
            request_delay_ms: default_request_delay_ms(),
            iteration_delay_ms: default_iteration_delay_ms(),
            login_delay_ms: default_login_delay_ms(),
            max_consecutive_failures: default_max_consecutive_failures(),
            heavy_backoff_ms: default_heavy_backoff_ms(),
            storage: StorageConcurrency::default(),
            session_refresh_threshold_secs: default_session_refresh_threshold_secs(),
            drain_poll_interval_ms: default_drain_poll_interval_ms(),
            detection_radius_km: default_detection_radius_km(),
            max_iterations: None,
            request_retry: RetryConfig::default(),
            login_retry: RetryConfig::default(),
        }
    }
}

impl ScanConfig {
    /// Initial scan origin
    pub const fn origin(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    pub const fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub const fn iteration_delay(&self) -> Duration {
        Duration::from_millis(self.iteration_delay_ms)
    }

    pub const fn login_delay(&self) -> Duration {
        Duration::from_millis(self.login_delay_ms)
    }

    pub const fn heavy_backoff(&self) -> Duration {
        Duration::from_millis(self.heavy_backoff_ms)
    }

    pub const fn drain_poll_interval(&self) -> Duration {
        Duration::from_millis(self.drain_poll_interval_ms)
    }

    pub const fn session_refresh_threshold(&self) -> Duration {
        Duration::from_secs(self.session_refresh_threshold_secs)
    }
}

/// Backoff growth between retry attempts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffStrategy {
    /// Same delay before every attempt
    #[default]
    Fixed,
    /// Delay doubles each attempt up to `max_backoff_ms`
    Exponential,
}

/// Retry policy configuration
///
/// The base delay comes from the owning operation (`request_delay_ms` for
/// map requests, `login_delay_ms` for logins).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RetryConfig {
    /// Maximum number of attempts; retries forever when absent
    #[serde(default)]
    pub max_attempts: Option<u32>,

    /// Backoff growth
    #[serde(default)]
    pub backoff: BackoffStrategy,

    /// Cap for exponential backoff, in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

const fn default_max_backoff_ms() -> u64 {
    300_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: None,
            backoff: BackoffStrategy::default(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rotated log files; console only when absent
    #[serde(default)]
    pub log_dir: Option<String>,

    /// Also log to the console when writing to files
    #[serde(default = "default_enable_stdout")]
    pub enable_stdout: bool,

    /// Log file rotation: daily, hourly or never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

const fn default_enable_stdout() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            enable_stdout: default_enable_stdout(),
            rotation: default_rotation(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::account::AuthService;

    #[test]
    fn test_scan_defaults() {
        let scan = ScanConfig::default();
        assert_eq!(scan.step_limit, 12);
        assert_eq!(scan.workers, 1);
        assert_eq!(scan.request_delay(), Duration::from_secs(1));
        assert_eq!(scan.heavy_backoff(), Duration::from_secs(30));
        assert_eq!(scan.max_consecutive_failures, 5);
        assert_eq!(scan.session_refresh_threshold(), Duration::from_secs(120));
        assert_eq!(scan.storage, StorageConcurrency::SingleWriter);
        assert!(scan.max_iterations.is_none());
        assert!(scan.request_retry.max_attempts.is_none());
        assert_eq!(scan.request_retry.backoff, BackoffStrategy::Fixed);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = r"
scan:
  latitude: 51.5
  longitude: -0.12
  workers: 4
  storage: concurrent
accounts:
  - auth_service: google
    username: ash
    password: secret
";
        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");
        assert_eq!(config.scan.workers, 4);
        assert_eq!(config.scan.step_limit, 12);
        assert_eq!(config.scan.storage, StorageConcurrency::Concurrent);
        assert_eq!(config.scan.origin(), Coordinate::new(51.5, -0.12));
        assert_eq!(config.accounts.len(), 1);
        assert_eq!(config.accounts[0].auth_service, AuthService::Google);
        assert_eq!(config.logging.level, "info");
        assert!(config.logging.enable_stdout);
    }

    #[test]
    fn test_logging_console_can_be_disabled() {
        let yaml = "logging:\n  log_dir: /var/log/ringscan\n  enable_stdout: false\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(!config.logging.enable_stdout);
        assert_eq!(config.logging.log_dir.as_deref(), Some("/var/log/ringscan"));
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_redacted_config_hides_passwords() {
        let config = Config {
            accounts: vec![Credentials::new(AuthService::Ptc, "ash", "secret")],
            ..Default::default()
        };
        let redacted = config.redacted();
        assert_eq!(redacted.accounts[0].password, "********");
        assert_eq!(config.accounts[0].password, "secret");
    }

    #[test]
    fn test_retry_config_parsing() {
        let yaml = "max_attempts: 3\nbackoff: exponential\nmax_backoff_ms: 8000\n";
        let retry: RetryConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(retry.max_attempts, Some(3));
        assert_eq!(retry.backoff, BackoffStrategy::Exponential);
        assert_eq!(retry.max_backoff_ms, 8000);
    }
}
