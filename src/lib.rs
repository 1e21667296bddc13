//! Ringscan - hex-ring area scanner
//!
//! Scans a hexagonal area around an origin in repeated iterations. An
//! overseer generates the grid and enqueues one task per point, a pool of
//! workers queries the game API through a round-robin pool of authenticated
//! sessions and hands each response to a persistence hook. The origin can be
//! moved while a scan runs; queued work for the old origin is dropped.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): Scan data model and port traits
//! - **Service Layer** (`services`): Grid generation, queue, sessions, workers, overseer
//! - **Application Layer** (`application`): Engine lifecycle
//! - **Infrastructure Layer** (`infrastructure`): Configuration and logging
//! - **Adapters** (`adapters`): Simulated API client and JSON-lines sink
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```
//! use ringscan::domain::models::Coordinate;
//! use ringscan::services::generate_location_steps;
//!
//! let steps: Vec<_> = generate_location_steps(Coordinate::new(0.0, 0.0), 3).collect();
//! assert_eq!(steps.len(), 19);
//! ```

pub mod adapters;
pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use application::{EngineState, ScanEngine};
pub use domain::models::{Config, Coordinate, Credentials, LocationStep, ScanConfig};
pub use domain::ports::{GameApiClient, ScanSink};
pub use domain::ScanError;
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{generate_location_steps, ScanStatsSnapshot};
