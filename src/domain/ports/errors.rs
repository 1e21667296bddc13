use thiserror::Error;

/// Failures reported by the game API client
///
/// Every variant is treated as transient by the scanner.
#[derive(Debug, Clone, Error)]
pub enum ApiClientError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request rejected by server: {0}")]
    Rejected(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Server returned an empty response")]
    EmptyResponse,

    #[error("Login refused for account '{0}'")]
    LoginRefused(String),
}

/// Recoverable failures reported by the persistence hook
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Work queue bookkeeping errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("mark_done called more times than tasks were put")]
    TaskDoneOverflow,
}
