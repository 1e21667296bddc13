use async_trait::async_trait;

use super::api_client::RawResponse;
use super::errors::PersistError;
use crate::domain::models::location::LocationStep;

/// Port for the persistence hook fed by the workers
///
/// Implementations are not assumed idempotent: the scanner calls `persist`
/// once per successful request. An `Err` is treated as recoverable and the
/// position is queried again.
#[async_trait]
pub trait ScanSink: Send + Sync {
    async fn persist(
        &self,
        response: &RawResponse,
        location: &LocationStep,
    ) -> Result<(), PersistError>;
}
