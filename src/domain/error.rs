use thiserror::Error;

/// Errors that fail a scan iteration
///
/// None of these stop the overseer; a failed iteration is logged and the
/// loop carries on after the inter-iteration delay.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Login for account '{username}' gave up after {attempts} attempts")]
    LoginExhausted { username: String, attempts: u32 },

    #[error("Request for step {step} gave up after {attempts} attempts")]
    RequestExhausted { step: usize, attempts: u32 },

    #[error("Account index {index} out of range for pool of {size}")]
    UnknownAccount { index: usize, size: usize },

    #[error("Session pool requires at least one account")]
    NoAccounts,
}
