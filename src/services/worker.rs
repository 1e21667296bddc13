//! Search worker
//!
//! Each worker loops forever: take a task, drop it if a relocation is
//! pending, otherwise query the API for the task's position and hand the
//! response to the persistence hook. Persistence failures are retried on
//! the same position; every `max_consecutive_failures` of them in a row the
//! worker backs off for `heavy_backoff` first.

use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info, instrument, warn};

use super::context::{ScanContext, ScanStats};
use super::session_pool::Account;
use crate::domain::models::{LocationStep, ScanTask};
use crate::domain::ports::{ApiClientError, NearbyQuery, PersistError, RawResponse};
use crate::domain::ScanError;

/// How a single task ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Response persisted after `persist_attempts` tries
    Persisted { persist_attempts: u32 },
    /// Skipped because a relocation was pending
    Drained,
    /// Request retries ran out under a bounded policy
    Abandoned,
}

/// Counts consecutive persistence failures within one task
#[derive(Debug, Clone, Copy)]
pub struct FailureTracker {
    consecutive: u32,
    threshold: u32,
}

impl FailureTracker {
    pub const fn new(threshold: u32) -> Self {
        Self {
            consecutive: 0,
            threshold,
        }
    }

    /// Record one failure
    ///
    /// Returns `true` when the threshold is reached; the counter is then
    /// reset so the next heavy backoff needs another full run of failures.
    pub fn record_failure(&mut self) -> bool {
        self.consecutive += 1;
        if self.consecutive >= self.threshold {
            self.consecutive = 0;
            true
        } else {
            false
        }
    }

    pub const fn consecutive(&self) -> u32 {
        self.consecutive
    }
}

/// One member of the worker pool
#[derive(Debug)]
pub struct Worker {
    id: usize,
    context: Arc<ScanContext>,
}

impl Worker {
    pub fn new(id: usize, context: Arc<ScanContext>) -> Self {
        Self { id, context }
    }

    /// Process tasks until a shutdown signal arrives
    ///
    /// Shutdown is only observed between tasks; a task already taken runs
    /// to completion.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        info!(worker = self.id, "Search worker started");
        loop {
            tokio::select! {
                task = self.context.queue.get() => {
                    self.handle(task).await;
                }
                _ = shutdown.recv() => {
                    info!(worker = self.id, "Search worker shutting down");
                    break;
                }
            }
        }
    }

    /// Process one task taken from the queue and mark it done
    #[instrument(skip(self, task), fields(worker = self.id, task_id = %task.id, step = task.step()))]
    pub async fn handle(&self, task: ScanTask) -> TaskOutcome {
        let outcome = self.process(&task).await;

        if outcome != TaskOutcome::Drained {
            tokio::time::sleep(self.context.config.request_delay()).await;
        }

        if let Err(e) = self.context.queue.mark_done() {
            error!(error = %e, "Failed to mark task done");
        }
        outcome
    }

    async fn process(&self, task: &ScanTask) -> TaskOutcome {
        let ctx = &self.context;

        if ctx.relocation.is_pending() {
            debug!("Relocation pending, dropping task");
            ScanStats::incr(&ctx.stats.tasks_drained);
            return TaskOutcome::Drained;
        }

        let account = ctx.sessions.next();
        let mut failures = FailureTracker::new(ctx.config.max_consecutive_failures);
        let mut persist_attempts = 0;

        loop {
            debug!(
                username = account.username(),
                position = %task.location.coordinate,
                "Requesting nearby entities"
            );

            let Some(response) = self.request(&account, &task.location).await else {
                ScanStats::incr(&ctx.stats.tasks_abandoned);
                return TaskOutcome::Abandoned;
            };

            persist_attempts += 1;
            match self.persist(task, &response).await {
                Ok(()) => {
                    ScanStats::incr(&ctx.stats.tasks_processed);
                    debug!(persist_attempts, "Step persisted");
                    return TaskOutcome::Persisted { persist_attempts };
                }
                Err(e) => {
                    ScanStats::incr(&ctx.stats.persist_failures);
                    error!(error = %e, consecutive = failures.consecutive() + 1, "Failed to persist response");
                    if failures.record_failure() {
                        warn!(
                            backoff_ms = ctx.config.heavy_backoff_ms,
                            "Too many consecutive failures, backing off"
                        );
                        ScanStats::incr(&ctx.stats.heavy_backoffs);
                        tokio::time::sleep(ctx.config.heavy_backoff()).await;
                    }
                }
            }
        }
    }

    /// Query the API for `location`, retrying per the request policy
    ///
    /// `None` means a bounded policy gave up.
    async fn request(&self, account: &Account, location: &LocationStep) -> Option<RawResponse> {
        let ctx: &ScanContext = &self.context;
        let query = NearbyQuery::at(location.coordinate);
        let query = &query;
        let label = format!("request step {}", location.step);

        let result = ctx
            .request_policy()
            .execute(&label, move || async move {
                let mut client = account.fork_client().await;
                client.set_position(query.coordinate);
                let outcome = match client.request_nearby_entities(query).await {
                    Ok(Some(response)) => Ok(response),
                    Ok(None) => Err(ApiClientError::EmptyResponse),
                    Err(e) => Err(e),
                };
                if outcome.is_err() {
                    ScanStats::incr(&ctx.stats.request_failures);
                }
                outcome
            })
            .await;

        match result {
            Ok(response) => Some(response),
            Err(exhausted) => {
                let err = ScanError::RequestExhausted {
                    step: location.step,
                    attempts: exhausted.attempts,
                };
                error!(error = %err, last_error = %exhausted.last_error, "Abandoning task");
                None
            }
        }
    }

    async fn persist(&self, task: &ScanTask, response: &RawResponse) -> Result<(), PersistError> {
        let sink = &self.context.sink;
        match &task.write_lock {
            Some(lock) => {
                let _guard = lock.lock().await;
                sink.persist(response, &task.location).await
            }
            None => sink.persist(response, &task.location).await,
        }
    }
}
