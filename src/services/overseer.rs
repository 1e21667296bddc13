//! Search overseer
//!
//! Drives the scan in iterations. Each iteration adopts any pending
//! relocation, renews sessions close to expiry, enqueues the hex-ring grid
//! around the current origin and waits until every task has been marked
//! done. A failed iteration is logged and retried with the same iteration
//! number.

use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info, instrument};

use super::context::{ScanContext, ScanStats};
use crate::domain::models::{Coordinate, ScanTask, StorageConcurrency, WriteLock};
use crate::domain::ScanError;

/// Summary of one completed iteration
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IterationReport {
    pub iteration: u64,
    pub origin: Coordinate,
    /// Tasks enqueued for the iteration
    pub steps: usize,
    /// Accounts that had to log in again
    pub sessions_renewed: usize,
    pub elapsed_ms: u64,
}

#[derive(Debug)]
pub struct Overseer {
    context: Arc<ScanContext>,
}

impl Overseer {
    pub fn new(context: Arc<ScanContext>) -> Self {
        Self { context }
    }

    /// Run iterations until `max_iterations` have completed or shutdown
    ///
    /// Returns the number of completed iterations.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) -> u64 {
        let ctx = &self.context;
        let max_iterations = ctx.config.max_iterations;
        let mut iteration: u64 = 0;

        info!(origin = %ctx.origin(), ?max_iterations, "Search overseer starting");

        loop {
            if max_iterations.is_some_and(|max| iteration >= max) {
                break;
            }

            let result = tokio::select! {
                result = self.run_iteration(iteration) => result,
                _ = shutdown.recv() => {
                    info!(iteration, "Shutdown requested during iteration");
                    break;
                }
            };

            match result {
                Ok(report) => {
                    info!(
                        iteration,
                        steps = report.steps,
                        elapsed_ms = report.elapsed_ms,
                        "Iteration complete"
                    );
                    ScanStats::incr(&ctx.stats.iterations_completed);
                    iteration += 1;
                }
                Err(e) => {
                    error!(iteration, error = %e, "Iteration failed");
                    ScanStats::incr(&ctx.stats.iterations_failed);
                }
            }

            if max_iterations.is_some_and(|max| iteration >= max) {
                break;
            }

            tokio::select! {
                () = tokio::time::sleep(ctx.config.iteration_delay()) => {}
                _ = shutdown.recv() => break,
            }
        }

        info!(completed = iteration, "Search overseer stopped");
        iteration
    }

    /// Run a single iteration to completion
    #[instrument(skip(self))]
    pub async fn run_iteration(&self, iteration: u64) -> Result<IterationReport, ScanError> {
        let ctx = &self.context;
        let started = Instant::now();

        if let Some(origin) = ctx.relocation.take() {
            info!(%origin, "Relocating scan origin");
            ctx.set_origin(origin);
        }
        let origin = ctx.origin();

        let mut sessions_renewed = 0;
        for index in 0..ctx.sessions.len() {
            if ctx.sessions.ensure_valid(index, origin).await? {
                sessions_renewed += 1;
            }
        }

        let write_lock: Option<WriteLock> = match ctx.config.storage {
            StorageConcurrency::SingleWriter => Some(Arc::new(Mutex::new(()))),
            StorageConcurrency::Concurrent => None,
        };

        let mut steps = 0;
        for location in ctx.grid().steps(origin, ctx.config.step_limit) {
            ctx.queue.put(ScanTask::new(
                iteration,
                location,
                write_lock.clone(),
                ctx.config.login_delay(),
            ));
            steps += 1;
        }
        info!(steps, %origin, "Grid enqueued");

        loop {
            let remaining = ctx.queue.pending_count();
            if remaining == 0 {
                break;
            }
            debug!(remaining, "Waiting for workers");
            tokio::time::sleep(ctx.config.drain_poll_interval()).await;
        }
        ctx.queue.join().await;

        Ok(IterationReport {
            iteration,
            origin,
            steps,
            sessions_renewed,
            elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        })
    }
}
