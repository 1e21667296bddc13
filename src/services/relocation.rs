use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::domain::models::Coordinate;

/// Single-slot cell holding a pending origin replacement
///
/// Workers only ask whether a request is pending, which is a lock-free
/// atomic read. Setting a new request before the overseer has consumed the
/// previous one replaces it. Only undispatched tasks observe the flag;
/// requests already in flight always complete.
#[derive(Debug, Default)]
pub struct RelocationCell {
    pending: AtomicBool,
    target: Mutex<Option<Coordinate>>,
}

impl RelocationCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the overseer to move the scan origin to `coordinate`
    pub fn request(&self, coordinate: Coordinate) {
        let mut target = self.target.lock();
        *target = Some(coordinate);
        self.pending.store(true, Ordering::Release);
    }

    /// Whether a relocation is waiting to be adopted
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Pending coordinate, without clearing it
    pub fn peek(&self) -> Option<Coordinate> {
        *self.target.lock()
    }

    /// Take and clear the pending request
    pub fn take(&self) -> Option<Coordinate> {
        let mut target = self.target.lock();
        self.pending.store(false, Ordering::Release);
        target.take()
    }
}
