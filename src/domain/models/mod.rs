pub mod account;
pub mod config;
pub mod location;
pub mod task;

pub use account::{AuthService, Credentials};
pub use config::{
    BackoffStrategy, Config, LoggingConfig, RetryConfig, ScanConfig, StorageConcurrency,
};
pub use location::{Coordinate, LocationStep};
pub use task::{ScanTask, WriteLock};
