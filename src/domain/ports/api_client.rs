use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::ApiClientError;
use crate::domain::models::account::Credentials;
use crate::domain::models::location::Coordinate;

/// Number of zeroed "since" timestamps sent with each map request.
const SINCE_TIMESTAMP_SLOTS: usize = 21;

/// Parameters of a nearby-entities map request
///
/// Coordinates travel as the raw IEEE-754 bit patterns of their `f64`
/// values. Cell ids are derived by the client adapter from `coordinate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearbyQuery {
    pub coordinate: Coordinate,
    pub latitude_bits: u64,
    pub longitude_bits: u64,
    pub since_timestamp_ms: Vec<u64>,
}

impl NearbyQuery {
    /// Build a full-refresh query centred on `coordinate`
    pub fn at(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            latitude_bits: coordinate.latitude.to_bits(),
            longitude_bits: coordinate.longitude.to_bits(),
            since_timestamp_ms: vec![0; SINCE_TIMESTAMP_SLOTS],
        }
    }
}

/// Undecoded payload returned by a successful map request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawResponse(pub serde_json::Value);

impl RawResponse {
    pub const fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub const fn as_value(&self) -> &serde_json::Value {
        &self.0
    }
}

/// Port for the external game API client
///
/// One base handle is kept per account and holds that account's session.
/// Map requests run on forked handles so concurrent workers never share
/// per-request position state.
#[async_trait]
pub trait GameApiClient: Send + Sync {
    /// Independent handle sharing this handle's session
    fn fork(&self) -> Box<dyn GameApiClient>;

    /// Set the position reported with subsequent calls
    fn set_position(&mut self, position: Coordinate);

    /// Authenticate; `Ok(false)` means the server refused the login
    async fn login(&mut self, credentials: &Credentials) -> Result<bool, ApiClientError>;

    /// Expiry of the current session ticket, if logged in
    fn session_expiry(&self) -> Option<DateTime<Utc>>;

    /// Fetch entities around the query position
    ///
    /// # Returns
    ///
    /// * `Ok(Some(response))` - Request succeeded
    /// * `Ok(None)` - Server returned an empty answer; treated as a transient failure
    /// * `Err` - Transport or API failure; treated as transient
    async fn request_nearby_entities(
        &self,
        query: &NearbyQuery,
    ) -> Result<Option<RawResponse>, ApiClientError>;
}
