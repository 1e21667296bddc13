use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::location::LocationStep;

/// Lock serializing persistence calls for single-writer storage backends
pub type WriteLock = Arc<Mutex<()>>;

/// A single scan position queued for a worker
///
/// Created by the overseer for one iteration and consumed exactly once.
#[derive(Debug, Clone)]
pub struct ScanTask {
    /// Identifier used to correlate log lines for this task
    pub id: Uuid,
    /// Overseer iteration that produced the task
    pub iteration: u64,
    /// Position to query
    pub location: LocationStep,
    /// Held around persistence when present
    pub write_lock: Option<WriteLock>,
    /// Configured login retry delay
    pub login_delay: Duration,
}

impl ScanTask {
    pub fn new(
        iteration: u64,
        location: LocationStep,
        write_lock: Option<WriteLock>,
        login_delay: Duration,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            iteration,
            location,
            write_lock,
            login_delay,
        }
    }

    /// 1-based step number within the iteration
    pub const fn step(&self) -> usize {
        self.location.step
    }
}
