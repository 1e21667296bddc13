//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines async trait interfaces that adapters must implement:
//! - GameApiClient: login and map requests against the game API
//! - ScanSink: persistence of map responses
//!
//! These traits keep the scan engine independent of the concrete client and
//! storage backend.

pub mod api_client;
pub mod errors;
pub mod scan_sink;

pub use api_client::{GameApiClient, NearbyQuery, RawResponse};
pub use errors::{ApiClientError, PersistError, QueueError};
pub use scan_sink::ScanSink;
