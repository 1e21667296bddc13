pub mod context;
pub mod overseer;
pub mod relocation;
pub mod retry_policy;
pub mod session_pool;
pub mod step_generator;
pub mod work_queue;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

pub use context::{ScanContext, ScanStats, ScanStatsSnapshot};
pub use overseer::{IterationReport, Overseer};
pub use relocation::RelocationCell;
pub use retry_policy::{RetryExhausted, RetryPolicy};
pub use session_pool::{needs_renewal, Account, SessionPool};
pub use step_generator::{
    generate_location_steps, total_steps, HexGrid, LocationSteps, MAX_STEP_LIMIT,
};
pub use work_queue::WorkQueue;
pub use worker::{FailureTracker, TaskOutcome, Worker};
