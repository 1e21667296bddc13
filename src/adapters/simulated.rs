//! In-process game API client
//!
//! Answers every call locally and deterministically. Used by the `simulate`
//! command to exercise the whole engine without network access, and by the
//! integration tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde_json::json;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::domain::models::{Coordinate, Credentials};
use crate::domain::ports::{ApiClientError, GameApiClient, NearbyQuery, RawResponse};

/// Size of a cell in the synthetic cell grid, in degrees
const CELL_SIZE_DEG: f64 = 0.01;

/// Behaviour of a simulated client
#[derive(Debug, Clone)]
pub struct SimulationProfile {
    /// Logins refused before the first one succeeds
    pub login_failures: u32,
    /// Validity of a granted session
    pub session_lifetime: chrono::Duration,
    /// Fail every n-th request when set
    pub fail_every: Option<u64>,
    /// Artificial latency added to each request
    pub latency: Duration,
}

impl Default for SimulationProfile {
    fn default() -> Self {
        Self {
            login_failures: 0,
            session_lifetime: chrono::Duration::minutes(30),
            fail_every: None,
            latency: Duration::ZERO,
        }
    }
}

#[derive(Debug, Default)]
struct SharedState {
    login_failures_remaining: AtomicU32,
    logins: AtomicU32,
    requests: AtomicU64,
    expires_at: Mutex<Option<DateTime<Utc>>>,
}

/// Deterministic stand-in for the game API
///
/// Forks share the session and request counter of their base client but
/// keep their own position.
#[derive(Debug, Clone)]
pub struct SimulatedApiClient {
    profile: Arc<SimulationProfile>,
    shared: Arc<SharedState>,
    position: Option<Coordinate>,
}

impl Default for SimulatedApiClient {
    fn default() -> Self {
        Self::new(SimulationProfile::default())
    }
}

impl SimulatedApiClient {
    pub fn new(profile: SimulationProfile) -> Self {
        let shared = SharedState::default();
        shared
            .login_failures_remaining
            .store(profile.login_failures, Ordering::Relaxed);
        Self {
            profile: Arc::new(profile),
            shared: Arc::new(shared),
            position: None,
        }
    }

    /// Default client, boxed for a session pool
    pub fn boxed() -> Box<dyn GameApiClient> {
        Box::new(Self::default())
    }

    /// Requests answered or failed so far, across all forks
    pub fn request_count(&self) -> u64 {
        self.shared.requests.load(Ordering::Relaxed)
    }

    /// Successful logins so far
    pub fn login_count(&self) -> u32 {
        self.shared.logins.load(Ordering::Relaxed)
    }
}

/// Synthetic cell id for a coordinate
///
/// Packs the row and column of a fixed-size degree grid into one integer.
pub fn cell_id(coordinate: Coordinate) -> u64 {
    let rows = (180.0 / CELL_SIZE_DEG) as u64;
    let row = ((coordinate.latitude + 90.0) / CELL_SIZE_DEG).floor().clamp(0.0, (rows - 1) as f64) as u64;
    let columns = (360.0 / CELL_SIZE_DEG) as u64;
    let column = ((coordinate.longitude + 180.0) / CELL_SIZE_DEG)
        .floor()
        .clamp(0.0, (columns - 1) as f64) as u64;
    row * columns + column
}

#[async_trait]
impl GameApiClient for SimulatedApiClient {
    fn fork(&self) -> Box<dyn GameApiClient> {
        Box::new(self.clone())
    }

    fn set_position(&mut self, position: Coordinate) {
        self.position = Some(position);
    }

    async fn login(&mut self, credentials: &Credentials) -> Result<bool, ApiClientError> {
        let refused = self
            .shared
            .login_failures_remaining
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1))
            .is_ok();
        if refused {
            tracing::debug!(username = %credentials.username, "Simulated login refused");
            return Ok(false);
        }

        *self.shared.expires_at.lock() = Some(Utc::now() + self.profile.session_lifetime);
        self.shared.logins.fetch_add(1, Ordering::Relaxed);
        Ok(true)
    }

    fn session_expiry(&self) -> Option<DateTime<Utc>> {
        *self.shared.expires_at.lock()
    }

    async fn request_nearby_entities(
        &self,
        query: &NearbyQuery,
    ) -> Result<Option<RawResponse>, ApiClientError> {
        let request = self.shared.requests.fetch_add(1, Ordering::Relaxed) + 1;

        if !self.profile.latency.is_zero() {
            tokio::time::sleep(self.profile.latency).await;
        }

        if self.session_expiry().is_none() {
            return Err(ApiClientError::Rejected("not logged in".to_string()));
        }
        if self.profile.fail_every.is_some_and(|n| n > 0 && request % n == 0) {
            return Err(ApiClientError::Transport(format!(
                "simulated failure on request {request}"
            )));
        }

        let coordinate = Coordinate::new(
            f64::from_bits(query.latitude_bits),
            f64::from_bits(query.longitude_bits),
        );
        Ok(Some(RawResponse::new(json!({
            "request": request,
            "cell_id": cell_id(coordinate),
            "latitude": coordinate.latitude,
            "longitude": coordinate.longitude,
            "reported_position": self.position,
            "entities": [],
        }))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::AuthService;

    fn credentials() -> Credentials {
        Credentials::new(AuthService::Ptc, "sim", "pw")
    }

    #[tokio::test]
    async fn test_requests_require_login() {
        let client = SimulatedApiClient::default();
        let result = client
            .request_nearby_entities(&NearbyQuery::at(Coordinate::new(0.0, 0.0)))
            .await;
        assert!(matches!(result, Err(ApiClientError::Rejected(_))));
    }

    #[tokio::test]
    async fn test_login_grants_session_for_lifetime() {
        let mut client = SimulatedApiClient::new(SimulationProfile {
            session_lifetime: chrono::Duration::minutes(10),
            ..SimulationProfile::default()
        });

        assert!(client.login(&credentials()).await.unwrap());

        let remaining = client.session_expiry().unwrap() - Utc::now();
        assert!(remaining <= chrono::Duration::minutes(10));
        assert!(remaining > chrono::Duration::minutes(9));
    }

    #[tokio::test]
    async fn test_configured_login_failures() {
        let mut client = SimulatedApiClient::new(SimulationProfile {
            login_failures: 2,
            ..SimulationProfile::default()
        });

        assert!(!client.login(&credentials()).await.unwrap());
        assert!(!client.login(&credentials()).await.unwrap());
        assert!(client.login(&credentials()).await.unwrap());
        assert_eq!(client.login_count(), 1);
    }

    #[tokio::test]
    async fn test_response_describes_query() {
        let mut client = SimulatedApiClient::default();
        client.login(&credentials()).await.unwrap();
        let mut fork = client.fork();
        fork.set_position(Coordinate::new(51.5, -0.12));

        let response = fork
            .request_nearby_entities(&NearbyQuery::at(Coordinate::new(51.5, -0.12)))
            .await
            .unwrap()
            .unwrap();

        let value = response.as_value();
        assert_eq!(value["latitude"], 51.5);
        assert_eq!(value["longitude"], -0.12);
        assert_eq!(value["reported_position"]["latitude"], 51.5);
        assert_eq!(value["cell_id"], cell_id(Coordinate::new(51.5, -0.12)));
        assert_eq!(client.request_count(), 1, "forks share the request counter");
    }

    #[tokio::test]
    async fn test_fail_every_nth_request() {
        let mut client = SimulatedApiClient::new(SimulationProfile {
            fail_every: Some(3),
            ..SimulationProfile::default()
        });
        client.login(&credentials()).await.unwrap();
        let query = NearbyQuery::at(Coordinate::new(0.0, 0.0));

        let outcomes: Vec<bool> = futures::future::join_all(
            (0..6).map(|_| client.request_nearby_entities(&query)),
        )
        .await
        .into_iter()
        .map(|r| r.is_ok())
        .collect();

        assert_eq!(outcomes.iter().filter(|ok| !**ok).count(), 2);
    }

    #[test]
    fn test_cell_id_groups_nearby_points() {
        let a = cell_id(Coordinate::new(10.001, 20.001));
        let b = cell_id(Coordinate::new(10.002, 20.003));
        let c = cell_id(Coordinate::new(10.02, 20.001));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(cell_id(Coordinate::new(-90.0, -180.0)), 0);
    }
}
