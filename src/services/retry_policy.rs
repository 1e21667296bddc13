use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::domain::models::{BackoffStrategy, RetryConfig};

/// Retry policy for transient failures
///
/// Without a maximum the policy retries forever. Map requests and logins
/// use unbounded policies unless configured otherwise.
///
/// Exponential backoff doubles each attempt: 1s → 2s → 4s → ... → max.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: Option<u32>,
    strategy: BackoffStrategy,
    initial_backoff: Duration,
    max_backoff: Duration,
}

/// Returned when a bounded policy runs out of attempts
#[derive(Debug)]
pub struct RetryExhausted<E> {
    pub last_error: E,
    pub attempts: u32,
}

impl RetryPolicy {
    /// Retry forever with the same delay before every attempt
    pub const fn fixed(delay: Duration) -> Self {
        Self {
            max_attempts: None,
            strategy: BackoffStrategy::Fixed,
            initial_backoff: delay,
            max_backoff: delay,
        }
    }

    /// Retry forever with a doubling delay capped at `max`
    pub fn exponential(initial: Duration, max: Duration) -> Self {
        Self {
            max_attempts: None,
            strategy: BackoffStrategy::Exponential,
            initial_backoff: initial,
            max_backoff: max.max(initial),
        }
    }

    /// Build a policy from configuration around the operation's base delay
    pub fn from_config(config: &RetryConfig, base_delay: Duration) -> Self {
        let policy = match config.backoff {
            BackoffStrategy::Fixed => Self::fixed(base_delay),
            BackoffStrategy::Exponential => {
                Self::exponential(base_delay, Duration::from_millis(config.max_backoff_ms))
            }
        };

        match config.max_attempts {
            Some(max) => policy.with_max_attempts(max),
            None => policy,
        }
    }

    /// Give up after `max_attempts` attempts in total
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub const fn max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }

    /// Whether another attempt may follow `attempts_made` failed attempts
    pub fn allows_retry(&self, attempts_made: u32) -> bool {
        self.max_attempts.is_none_or(|max| attempts_made < max)
    }

    /// Delay after the failed attempt numbered `attempt` (0-indexed)
    ///
    /// Formula for exponential backoff: min(initial * 2^attempt, max)
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        match self.strategy {
            BackoffStrategy::Fixed => self.initial_backoff,
            BackoffStrategy::Exponential => {
                let initial_ms = u64::try_from(self.initial_backoff.as_millis()).unwrap_or(u64::MAX);
                let max_ms = u64::try_from(self.max_backoff.as_millis()).unwrap_or(u64::MAX);
                let backoff_ms = initial_ms
                    .saturating_mul(2_u64.saturating_pow(attempt))
                    .min(max_ms);
                Duration::from_millis(backoff_ms)
            }
        }
    }

    /// Run `operation` until it succeeds or the policy gives up
    ///
    /// `label` names the operation in log output.
    ///
    /// # Returns
    /// * `Ok(T)` - Operation succeeded
    /// * `Err(RetryExhausted)` - Bounded policy ran out of attempts
    pub async fn execute<F, Fut, T, E>(
        &self,
        label: &str,
        mut operation: F,
    ) -> Result<T, RetryExhausted<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let mut attempt: u32 = 0;

        loop {
            match operation().await {
                Ok(result) => {
                    if attempt > 0 {
                        debug!(operation = label, retries = attempt, "Operation succeeded after retries");
                    }
                    return Ok(result);
                }
                Err(err) => {
                    let attempts_made = attempt.saturating_add(1);
                    if !self.allows_retry(attempts_made) {
                        warn!(operation = label, attempts = attempts_made, error = %err, "Giving up");
                        return Err(RetryExhausted {
                            last_error: err,
                            attempts: attempts_made,
                        });
                    }

                    let backoff = self.backoff_for(attempt);
                    warn!(
                        operation = label,
                        attempt = attempts_made,
                        error = %err,
                        backoff_ms = u64::try_from(backoff.as_millis()).unwrap_or(u64::MAX),
                        "Attempt failed, retrying"
                    );

                    sleep(backoff).await;
                    attempt = attempts_made;
                }
            }
        }
    }
}
