//! Domain layer for the ringscan engine
//!
//! This module contains the scan data model and the ports to external collaborators.

pub mod error;
pub mod models;
pub mod ports;

pub use error::ScanError;
