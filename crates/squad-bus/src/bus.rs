//! Typed pub/sub over the event taxonomy.
//!
//! `emit` is synchronous from the publisher's viewpoint: it fans the event
//! out to every matching subscription's own bounded queue and returns.
//! Each subscription owns a dedicated dispatch task that pops its queue in
//! order and awaits the handler before moving on — per-subscription
//! ordering and back-pressure, with no subscription able to stall another.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use squad_core::Event;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::queue::DropOldestQueue;

pub type HandlerFuture = Pin<Box<dyn Future<Output = ()> + Send>>;
pub type Handler = Arc<dyn Fn(Event) -> HandlerFuture + Send + Sync>;

const DEFAULT_QUEUE_BOUND: usize = 1024;

struct Subscriber {
    kind: &'static str,
    queue: Arc<DropOldestQueue<Event>>,
    cancelled: Arc<AtomicBool>,
}

/// A handle returned from `subscribe`. Dropping it does not unsubscribe —
/// call `unsubscribe()` explicitly, matching the contract's idempotent,
/// dispatch-safe unsubscribe.
pub struct Subscription {
    cancelled: Arc<AtomicBool>,
    queue: Arc<DropOldestQueue<Event>>,
    task: JoinHandle<()>,
}

impl Subscription {
    pub fn unsubscribe(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
        self.queue.close();
    }

    pub fn dropped(&self) -> u64 {
        self.queue.dropped()
    }

    pub async fn join(self) {
        let _ = self.task.await;
    }
}

#[derive(Default)]
pub struct EventBus {
    subscribers: Mutex<Vec<Subscriber>>,
    queue_bound: usize,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_queue_bound(DEFAULT_QUEUE_BOUND)
    }

    pub fn with_queue_bound(queue_bound: usize) -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
            queue_bound: queue_bound.max(1),
        }
    }

    /// Fan `event` out to every live subscription registered for its kind,
    /// in subscription-registration order. Dead (unsubscribed) entries are
    /// swept out as they're encountered.
    pub fn emit(&self, event: Event) {
        let kind = event.kind();
        let mut subscribers = self.subscribers.lock().expect("bus mutex poisoned");
        subscribers.retain(|s| !s.cancelled.load(Ordering::Relaxed));
        for subscriber in subscribers.iter() {
            if subscriber.kind == kind {
                subscriber.queue.push(event.clone());
            }
        }
    }

    /// Register `handler` to run, in order, for every event of `kind`.
    /// Returns a `Subscription` whose `unsubscribe()` stops further
    /// dispatch; already-queued events still in flight are dropped rather
    /// than delivered once unsubscribed.
    pub fn subscribe(&self, kind: &'static str, handler: Handler) -> Subscription {
        let queue = Arc::new(DropOldestQueue::new(self.queue_bound));
        let cancelled = Arc::new(AtomicBool::new(false));

        let dispatch_queue = queue.clone();
        let dispatch_cancelled = cancelled.clone();
        let task = tokio::spawn(async move {
            while let Some(event) = dispatch_queue.pop().await {
                if dispatch_cancelled.load(Ordering::Relaxed) {
                    return;
                }
                (handler)(event).await;
            }
        });

        self.subscribers.lock().expect("bus mutex poisoned").push(Subscriber {
            kind,
            queue: queue.clone(),
            cancelled: cancelled.clone(),
        });

        debug!(kind, "subscription registered");
        Subscription { cancelled, queue, task }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    fn chat(message: &str) -> Event {
        Event::ChatMessage {
            time: chrono::Utc::now(),
            raw: String::new(),
            channel: squad_core::ChatChannel::ChatAll,
            eos_id: squad_core::EosId::new("0123456789abcdef0123456789abcdef").unwrap(),
            steam_id: None,
            name: "Alice".to_string(),
            message: message.to_string(),
        }
    }

    #[tokio::test]
    async fn handler_only_sees_matching_kind() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let notify = Arc::new(Notify::new());
        let notify_clone = notify.clone();

        let sub = bus.subscribe(
            "CHAT_MESSAGE",
            Arc::new(move |event| {
                let seen = seen_clone.clone();
                let notify = notify_clone.clone();
                Box::pin(async move {
                    if let Event::ChatMessage { message, .. } = event {
                        seen.lock().unwrap().push(message);
                    }
                    notify.notify_one();
                })
            }),
        );

        bus.emit(Event::RconConnected {
            time: chrono::Utc::now(),
            raw: String::new(),
            reconnect: false,
        });
        bus.emit(chat("hello"));
        notify.notified().await;

        assert_eq!(*seen.lock().unwrap(), vec!["hello".to_string()]);
        sub.unsubscribe();
    }

    #[tokio::test]
    async fn dispatch_order_matches_publish_order_within_a_subscription() {
        let bus = EventBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        let order_clone = order.clone();
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        let notify = Arc::new(Notify::new());
        let notify_clone = notify.clone();

        let sub = bus.subscribe(
            "CHAT_MESSAGE",
            Arc::new(move |event| {
                let order = order_clone.clone();
                let count = count_clone.clone();
                let notify = notify_clone.clone();
                Box::pin(async move {
                    if let Event::ChatMessage { message, .. } = event {
                        order.lock().unwrap().push(message);
                    }
                    if count.fetch_add(1, Ordering::SeqCst) == 2 {
                        notify.notify_one();
                    }
                })
            }),
        );

        bus.emit(chat("one"));
        bus.emit(chat("two"));
        bus.emit(chat("three"));
        notify.notified().await;

        assert_eq!(
            *order.lock().unwrap(),
            vec!["one".to_string(), "two".to_string(), "three".to_string()]
        );
        sub.unsubscribe();
    }

    #[tokio::test]
    async fn overflow_drops_oldest_for_this_subscription_only() {
        let bus = EventBus::with_queue_bound(1);
        let gate = Arc::new(Notify::new());
        let gate_clone = gate.clone();
        let proceed = Arc::new(Notify::new());
        let proceed_clone = proceed.clone();

        // A handler that blocks on the first event until told to proceed,
        // so the next two emits are guaranteed to queue up and collide.
        let first = Arc::new(AtomicBool::new(true));
        let sub = bus.subscribe(
            "CHAT_MESSAGE",
            Arc::new(move |_event| {
                let gate = gate_clone.clone();
                let proceed = proceed_clone.clone();
                let first = first.clone();
                Box::pin(async move {
                    if first.swap(false, Ordering::SeqCst) {
                        gate.notify_one();
                        proceed.notified().await;
                    }
                })
            }),
        );

        bus.emit(chat("one"));
        gate.notified().await; // handler is now blocked inside "one"
        bus.emit(chat("two"));
        bus.emit(chat("three")); // queue bound 1: evicts "two"
        proceed.notify_one();

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(sub.dropped(), 1);
        sub.unsubscribe();
    }
}
