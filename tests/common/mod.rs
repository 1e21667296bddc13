//! Common test utilities for integration tests
//!
//! Provides shared fakes and helpers used across multiple integration test
//! files.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use ringscan::adapters::{SimulatedApiClient, SimulationProfile};
use ringscan::domain::models::{AuthService, Credentials, LocationStep, ScanConfig};
use ringscan::domain::ports::{GameApiClient, PersistError, RawResponse, ScanSink};

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
/// Call this at the beginning of tests that need logging.
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Sink keeping every persisted step in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    failures_remaining: AtomicU32,
    records: Mutex<Vec<LocationStep>>,
}

impl MemorySink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Sink whose first `failures` persist calls fail
    pub fn failing(failures: u32) -> Arc<Self> {
        let sink = Self::default();
        sink.failures_remaining.store(failures, Ordering::SeqCst);
        Arc::new(sink)
    }

    pub fn records(&self) -> Vec<LocationStep> {
        self.records.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }
}

#[async_trait]
impl ScanSink for MemorySink {
    async fn persist(
        &self,
        _response: &RawResponse,
        location: &LocationStep,
    ) -> Result<(), PersistError> {
        let fail = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if fail {
            return Err(PersistError::Storage("database is locked".to_string()));
        }
        self.records.lock().push(*location);
        Ok(())
    }
}

/// `count` accounts, each with its own simulated client
pub fn simulated_accounts(
    count: usize,
    profile: &SimulationProfile,
) -> Vec<(Credentials, Box<dyn GameApiClient>)> {
    (0..count)
        .map(|i| {
            let client: Box<dyn GameApiClient> = Box::new(SimulatedApiClient::new(profile.clone()));
            (Credentials::new(AuthService::Ptc, format!("scanner{i}"), "secret"), client)
        })
        .collect()
}

/// Scan settings with short delays for tests
pub fn fast_scan(step_limit: u32, workers: usize) -> ScanConfig {
    ScanConfig {
        step_limit,
        workers,
        request_delay_ms: 10,
        iteration_delay_ms: 500,
        drain_poll_interval_ms: 20,
        login_delay_ms: 100,
        ..ScanConfig::default()
    }
}
