//! Scripted collaborators shared by the service unit tests

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde_json::json;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::domain::models::{Coordinate, Credentials, LocationStep};
use crate::domain::ports::{
    ApiClientError, GameApiClient, NearbyQuery, PersistError, RawResponse, ScanSink,
};

/// State shared by a scripted client and all of its forks
#[derive(Debug, Default)]
pub struct ClientState {
    login_failures_remaining: AtomicU32,
    login_attempts: AtomicU32,
    request_failures_remaining: AtomicU32,
    expires_at: Mutex<Option<DateTime<Utc>>>,
    last_position: Mutex<Option<Coordinate>>,
    requests: Mutex<Vec<Coordinate>>,
}

impl ClientState {
    pub fn login_attempts(&self) -> u32 {
        self.login_attempts.load(Ordering::SeqCst)
    }

    pub fn last_position(&self) -> Option<Coordinate> {
        *self.last_position.lock()
    }

    pub fn requests(&self) -> Vec<Coordinate> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

/// Client whose logins and requests fail a scripted number of times
#[derive(Debug, Clone, Default)]
pub struct ScriptedClient {
    state: Arc<ClientState>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(self, expires_at: DateTime<Utc>) -> Self {
        *self.state.expires_at.lock() = Some(expires_at);
        self
    }

    pub fn with_login_failures(self, failures: u32) -> Self {
        self.state.login_failures_remaining.store(failures, Ordering::SeqCst);
        self
    }

    pub fn with_request_failures(self, failures: u32) -> Self {
        self.state.request_failures_remaining.store(failures, Ordering::SeqCst);
        self
    }

    pub fn state(&self) -> Arc<ClientState> {
        Arc::clone(&self.state)
    }
}

fn take_one(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

#[async_trait]
impl GameApiClient for ScriptedClient {
    fn fork(&self) -> Box<dyn GameApiClient> {
        Box::new(self.clone())
    }

    fn set_position(&mut self, position: Coordinate) {
        *self.state.last_position.lock() = Some(position);
    }

    async fn login(&mut self, _credentials: &Credentials) -> Result<bool, ApiClientError> {
        self.state.login_attempts.fetch_add(1, Ordering::SeqCst);
        if take_one(&self.state.login_failures_remaining) {
            return Ok(false);
        }
        *self.state.expires_at.lock() = Some(Utc::now() + chrono::Duration::hours(1));
        Ok(true)
    }

    fn session_expiry(&self) -> Option<DateTime<Utc>> {
        *self.state.expires_at.lock()
    }

    async fn request_nearby_entities(
        &self,
        query: &NearbyQuery,
    ) -> Result<Option<RawResponse>, ApiClientError> {
        self.state.requests.lock().push(query.coordinate);
        if take_one(&self.state.request_failures_remaining) {
            return Err(ApiClientError::Transport("connection reset".to_string()));
        }
        Ok(Some(RawResponse::new(json!({
            "latitude": query.coordinate.latitude,
            "longitude": query.coordinate.longitude,
        }))))
    }
}

/// Sink recording every persisted step, optionally failing first
#[derive(Debug, Default)]
pub struct RecordingSink {
    failures_remaining: AtomicU32,
    attempts: AtomicU32,
    persisted: Mutex<Vec<LocationStep>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(failures: u32) -> Self {
        let sink = Self::default();
        sink.failures_remaining.store(failures, Ordering::SeqCst);
        sink
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn persisted(&self) -> Vec<LocationStep> {
        self.persisted.lock().clone()
    }
}

#[async_trait]
impl ScanSink for RecordingSink {
    async fn persist(
        &self,
        _response: &RawResponse,
        location: &LocationStep,
    ) -> Result<(), PersistError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if take_one(&self.failures_remaining) {
            return Err(PersistError::Storage("database is locked".to_string()));
        }
        self.persisted.lock().push(*location);
        Ok(())
    }
}
