//! Shared scan context
//!
//! Everything the overseer and the workers share lives here and is passed
//! around behind one `Arc`: configuration, the work queue, the session pool,
//! the persistence hook, the relocation cell, the current origin and the
//! running counters.

use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::relocation::RelocationCell;
use super::retry_policy::RetryPolicy;
use super::session_pool::SessionPool;
use super::step_generator::HexGrid;
use super::work_queue::WorkQueue;
use crate::domain::models::{Coordinate, ScanConfig, ScanTask};
use crate::domain::ports::ScanSink;

/// Running counters updated by the overseer and workers
#[derive(Debug, Default)]
pub struct ScanStats {
    pub iterations_completed: AtomicU64,
    pub iterations_failed: AtomicU64,
    pub tasks_processed: AtomicU64,
    pub tasks_drained: AtomicU64,
    pub tasks_abandoned: AtomicU64,
    pub request_failures: AtomicU64,
    pub persist_failures: AtomicU64,
    pub heavy_backoffs: AtomicU64,
}

/// Point-in-time copy of [`ScanStats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ScanStatsSnapshot {
    pub iterations_completed: u64,
    pub iterations_failed: u64,
    pub tasks_processed: u64,
    pub tasks_drained: u64,
    pub tasks_abandoned: u64,
    pub request_failures: u64,
    pub persist_failures: u64,
    pub heavy_backoffs: u64,
    pub logins: u64,
}

impl ScanStats {
    pub(crate) fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self, logins: u64) -> ScanStatsSnapshot {
        ScanStatsSnapshot {
            iterations_completed: self.iterations_completed.load(Ordering::Relaxed),
            iterations_failed: self.iterations_failed.load(Ordering::Relaxed),
            tasks_processed: self.tasks_processed.load(Ordering::Relaxed),
            tasks_drained: self.tasks_drained.load(Ordering::Relaxed),
            tasks_abandoned: self.tasks_abandoned.load(Ordering::Relaxed),
            request_failures: self.request_failures.load(Ordering::Relaxed),
            persist_failures: self.persist_failures.load(Ordering::Relaxed),
            heavy_backoffs: self.heavy_backoffs.load(Ordering::Relaxed),
            logins,
        }
    }
}

/// State shared by the overseer and every worker
pub struct ScanContext {
    pub config: ScanConfig,
    pub queue: WorkQueue<ScanTask>,
    pub sessions: SessionPool,
    pub sink: Arc<dyn ScanSink>,
    pub relocation: RelocationCell,
    pub stats: ScanStats,
    origin: Mutex<Coordinate>,
    request_policy: RetryPolicy,
    grid: HexGrid,
}

impl std::fmt::Debug for ScanContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanContext")
            .field("origin", &self.origin())
            .field("pending", &self.queue.pending_count())
            .field("sessions", &self.sessions)
            .finish_non_exhaustive()
    }
}

impl ScanContext {
    pub fn new(config: ScanConfig, sessions: SessionPool, sink: Arc<dyn ScanSink>) -> Self {
        let request_policy = RetryPolicy::from_config(&config.request_retry, config.request_delay());
        let grid = HexGrid::new(config.detection_radius_km);
        let origin = config.origin();

        Self {
            config,
            queue: WorkQueue::new(),
            sessions,
            sink,
            relocation: RelocationCell::new(),
            stats: ScanStats::default(),
            origin: Mutex::new(origin),
            request_policy,
            grid,
        }
    }

    /// Origin used for the next generated grid
    pub fn origin(&self) -> Coordinate {
        *self.origin.lock()
    }

    pub(crate) fn set_origin(&self, origin: Coordinate) {
        *self.origin.lock() = origin;
    }

    pub const fn request_policy(&self) -> &RetryPolicy {
        &self.request_policy
    }

    pub const fn grid(&self) -> &HexGrid {
        &self.grid
    }

    pub fn stats(&self) -> ScanStatsSnapshot {
        self.stats.snapshot(self.sessions.login_count())
    }
}
