//! CLI command implementations.

pub mod config;
pub mod plan;
pub mod simulate;
