//! Unbounded FIFO work queue with join semantics
//!
//! Tracks two counts: tasks still queued (`pending_count`) and tasks put but
//! not yet marked done (`unfinished_count`). `join` waits on the second, so
//! tasks taken by a worker but still being retried keep it blocked even when
//! the queue itself is empty.

use parking_lot::Mutex;
use std::collections::VecDeque;
use tokio::sync::{watch, Notify};

use crate::domain::ports::QueueError;

/// Thread-safe FIFO queue shared by the overseer and the workers
#[derive(Debug)]
pub struct WorkQueue<T> {
    items: Mutex<VecDeque<T>>,
    item_available: Notify,
    unfinished: watch::Sender<usize>,
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> WorkQueue<T> {
    pub fn new() -> Self {
        let (unfinished, _) = watch::channel(0);
        Self {
            items: Mutex::new(VecDeque::new()),
            item_available: Notify::new(),
            unfinished,
        }
    }

    /// Append a task and wake one waiting worker
    pub fn put(&self, item: T) {
        // Count first so a fast worker can never mark it done before it exists.
        self.unfinished.send_modify(|count| *count += 1);
        self.items.lock().push_back(item);
        self.item_available.notify_one();
    }

    /// Take the oldest task, waiting until one is available
    pub async fn get(&self) -> T {
        loop {
            if let Some(item) = self.try_get() {
                return item;
            }
            self.item_available.notified().await;
        }
    }

    /// Take the oldest task if one is queued
    pub fn try_get(&self) -> Option<T> {
        let mut items = self.items.lock();
        let item = items.pop_front()?;
        if !items.is_empty() {
            // Notify stores at most one permit; pass the wakeup on so
            // another idle worker picks up the remaining tasks.
            self.item_available.notify_one();
        }
        Some(item)
    }

    /// Record that a previously taken task has finished
    pub fn mark_done(&self) -> Result<(), QueueError> {
        let mut result = Ok(());
        self.unfinished.send_if_modified(|count| {
            if *count == 0 {
                result = Err(QueueError::TaskDoneOverflow);
                false
            } else {
                *count -= 1;
                true
            }
        });
        result
    }

    /// Tasks queued and not yet taken by a worker
    pub fn pending_count(&self) -> usize {
        self.items.lock().len()
    }

    /// Tasks put and not yet marked done
    pub fn unfinished_count(&self) -> usize {
        *self.unfinished.borrow()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Wait until every task put so far has been marked done
    pub async fn join(&self) {
        let mut rx = self.unfinished.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|count| *count == 0).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_test::{assert_pending, assert_ready};

    #[test]
    fn test_fifo_order() {
        let queue = WorkQueue::new();
        queue.put(1);
        queue.put(2);
        queue.put(3);

        assert_eq!(queue.try_get(), Some(1));
        assert_eq!(queue.try_get(), Some(2));
        assert_eq!(queue.try_get(), Some(3));
        assert_eq!(queue.try_get(), None);
    }

    #[test]
    fn test_pending_and_unfinished_counts() {
        let queue = WorkQueue::new();
        queue.put("a");
        queue.put("b");
        assert_eq!(queue.pending_count(), 2);
        assert_eq!(queue.unfinished_count(), 2);

        queue.try_get();
        assert_eq!(queue.pending_count(), 1);
        assert_eq!(queue.unfinished_count(), 2);

        queue.mark_done().unwrap();
        assert_eq!(queue.unfinished_count(), 1);
    }

    #[test]
    fn test_mark_done_without_task_is_an_error() {
        let queue: WorkQueue<u8> = WorkQueue::new();
        assert_eq!(queue.mark_done(), Err(QueueError::TaskDoneOverflow));
        assert_eq!(queue.unfinished_count(), 0);
    }

    #[test]
    fn test_join_returns_immediately_when_idle() {
        let queue: WorkQueue<u8> = WorkQueue::new();
        let mut join = tokio_test::task::spawn(queue.join());
        assert_ready!(join.poll());
    }

    #[test]
    fn test_join_blocks_on_taken_but_unfinished_task() {
        let queue = WorkQueue::new();
        queue.put(7);
        let taken = queue.try_get();
        assert_eq!(taken, Some(7));
        assert!(queue.is_empty());

        let mut join = tokio_test::task::spawn(queue.join());
        // Empty but not finished: join must keep waiting.
        assert_pending!(join.poll());

        queue.mark_done().unwrap();
        assert!(join.is_woken());
        assert_ready!(join.poll());
    }

    #[tokio::test]
    async fn test_get_waits_for_put() {
        let queue = Arc::new(WorkQueue::new());

        let consumer = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.get().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        queue.put("late");

        let item = tokio::time::timeout(Duration::from_secs(1), consumer)
            .await
            .expect("consumer should be woken")
            .unwrap();
        assert_eq!(item, "late");
    }

    #[tokio::test]
    async fn test_join_waits_for_concurrent_workers() {
        let queue = Arc::new(WorkQueue::new());
        let processed = Arc::new(Mutex::new(Vec::new()));

        let mut workers = Vec::new();
        for _ in 0..4 {
            let queue = Arc::clone(&queue);
            let processed = Arc::clone(&processed);
            workers.push(tokio::spawn(async move {
                loop {
                    let item: u32 = queue.get().await;
                    tokio::time::sleep(Duration::from_millis(1)).await;
                    processed.lock().push(item);
                    queue.mark_done().unwrap();
                }
            }));
        }

        for i in 0..50 {
            queue.put(i);
        }

        tokio::time::timeout(Duration::from_secs(5), queue.join())
            .await
            .expect("join should complete");

        let mut seen = processed.lock().clone();
        seen.sort_unstable();
        assert_eq!(seen, (0..50).collect::<Vec<_>>());
        assert_eq!(queue.unfinished_count(), 0);

        for worker in workers {
            worker.abort();
        }
    }
}
