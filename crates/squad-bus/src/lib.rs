//! Typed pub/sub event bus: one bounded, drop-oldest dispatch queue per
//! subscription, each driven by its own serial dispatch task.

mod bus;
mod queue;

pub use bus::{EventBus, Handler, HandlerFuture, Subscription};
