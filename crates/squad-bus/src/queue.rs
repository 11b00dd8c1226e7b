//! A bounded, drop-oldest, multi-producer single-consumer queue.
//!
//! `tokio::sync::mpsc` doesn't support evicting from the front on overflow,
//! and `tokio::sync::broadcast`'s single shared ring buffer bounds the
//! union of *all* published events rather than the subset a given
//! subscription actually cares about — a subscriber on a rare event kind
//! could have its own backlog evicted by unrelated high-volume kinds well
//! before it ever reaches 1024 matching events. This type bounds exactly
//! what's enqueued for one subscription.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use tokio::sync::Notify;

pub struct DropOldestQueue<T> {
    capacity: usize,
    items: Mutex<VecDeque<T>>,
    notify: Notify,
    dropped: AtomicU64,
    closed: std::sync::atomic::AtomicBool,
}

impl<T> DropOldestQueue<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            items: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
            dropped: AtomicU64::new(0),
            closed: std::sync::atomic::AtomicBool::new(false),
        }
    }

    /// Push a value, evicting the oldest queued value if already at
    /// capacity and recording the drop.
    pub fn push(&self, value: T) {
        let mut items = self.items.lock().expect("queue mutex poisoned");
        if items.len() >= self.capacity {
            items.pop_front();
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
        items.push_back(value);
        drop(items);
        self.notify.notify_one();
    }

    /// Wait for and pop the next value, or `None` once `close()` has been
    /// called and the queue has drained.
    pub async fn pop(&self) -> Option<T> {
        loop {
            {
                let mut items = self.items.lock().expect("queue mutex poisoned");
                if let Some(value) = items.pop_front() {
                    return Some(value);
                }
                if self.closed.load(Ordering::Relaxed) {
                    return None;
                }
            }
            self.notify.notified().await;
        }
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::Relaxed);
        self.notify.notify_one();
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn pop_returns_values_in_fifo_order() {
        let q = DropOldestQueue::new(4);
        q.push(1);
        q.push(2);
        assert_eq!(q.pop().await, Some(1));
        assert_eq!(q.pop().await, Some(2));
    }

    #[tokio::test]
    async fn overflow_drops_oldest_and_counts_it() {
        let q = DropOldestQueue::new(2);
        q.push(1);
        q.push(2);
        q.push(3); // evicts 1
        assert_eq!(q.pop().await, Some(2));
        assert_eq!(q.pop().await, Some(3));
        assert_eq!(q.dropped(), 1);
    }

    #[tokio::test]
    async fn close_unblocks_pending_pop_with_none() {
        let q: DropOldestQueue<i32> = DropOldestQueue::new(2);
        q.close();
        assert_eq!(q.pop().await, None);
    }
}
