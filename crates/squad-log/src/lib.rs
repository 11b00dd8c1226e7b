//! Streaming parser for the Squad game server log and the correlation
//! state it needs to turn single lines into cross-referenced events.
//!
//! - `timestamp`: the standard `[time][chain]` prefix grammar
//! - `store`: short-lived correlation tables, cleared on `new-game`
//! - `rules`: the ordered, first-match-wins regex catalog
//! - `engine`: drives lines through the catalog and owns the store
//! - `reader`: tails a local log file, detecting rotation/truncation

pub mod engine;
pub mod reader;
pub mod rules;
pub mod store;
pub mod timestamp;

pub use engine::{DropCounters, Engine};
pub use reader::{LocalTailSource, TailedLine};
pub use store::EventStore;
