//! Work queue behaviour under concurrent producers and consumers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ringscan::services::WorkQueue;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_every_item_is_taken_exactly_once() {
    let queue = Arc::new(WorkQueue::new());
    let taken = Arc::new(parking_lot::Mutex::new(Vec::new()));

    let consumers: Vec<_> = (0..8)
        .map(|_| {
            let queue = Arc::clone(&queue);
            let taken = Arc::clone(&taken);
            tokio::spawn(async move {
                loop {
                    let item: usize = queue.get().await;
                    taken.lock().push(item);
                    queue.mark_done().unwrap();
                }
            })
        })
        .collect();

    let producers: Vec<_> = (0..4)
        .map(|p| {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move {
                for i in 0..250 {
                    queue.put(p * 1_000 + i);
                    if i % 50 == 0 {
                        tokio::task::yield_now().await;
                    }
                }
            })
        })
        .collect();
    for producer in producers {
        producer.await.unwrap();
    }

    tokio::time::timeout(Duration::from_secs(10), queue.join())
        .await
        .expect("join should return once all items are done");

    let mut items = taken.lock().clone();
    items.sort_unstable();
    let mut expected: Vec<usize> = (0..4)
        .flat_map(|p| (0..250).map(move |i| p * 1_000 + i))
        .collect();
    expected.sort_unstable();
    assert_eq!(items, expected);

    for consumer in consumers {
        consumer.abort();
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_join_waits_for_slow_task_after_queue_empties() {
    let queue = Arc::new(WorkQueue::new());
    let finished = Arc::new(AtomicUsize::new(0));
    queue.put("slow");

    let worker = {
        let queue = Arc::clone(&queue);
        let finished = Arc::clone(&finished);
        tokio::spawn(async move {
            let _item = queue.get().await;
            tokio::time::sleep(Duration::from_millis(200)).await;
            finished.fetch_add(1, Ordering::SeqCst);
            queue.mark_done().unwrap();
        })
    };

    while queue.pending_count() > 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    queue.join().await;

    assert_eq!(finished.load(Ordering::SeqCst), 1);
    worker.await.unwrap();
}

#[tokio::test]
async fn test_join_can_be_reused_across_batches() {
    let queue = Arc::new(WorkQueue::new());
    let worker = {
        let queue = Arc::clone(&queue);
        tokio::spawn(async move {
            loop {
                let _: u8 = queue.get().await;
                queue.mark_done().unwrap();
            }
        })
    };

    for batch in 0..3u8 {
        for i in 0..10 {
            queue.put(batch * 10 + i);
        }
        tokio::time::timeout(Duration::from_secs(5), queue.join())
            .await
            .expect("batch should drain");
        assert_eq!(queue.unfinished_count(), 0);
    }

    worker.abort();
}
