//! Adapters implementing the domain ports.

pub mod jsonl_sink;
pub mod simulated;

pub use jsonl_sink::{JsonLinesSink, ScanRecord};
pub use simulated::{SimulatedApiClient, SimulationProfile};
