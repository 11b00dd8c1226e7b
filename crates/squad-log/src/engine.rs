//! Drives lines through the rule catalog, first-match-wins, in a fixed
//! order. Never panics on malformed input: a line that fails the prefix
//! grammar, or matches no rule, is simply dropped (and counted).

use squad_core::Event;

use crate::rules::{self, Rule};
use crate::store::EventStore;
use crate::timestamp;

/// Tallies lines the engine saw but could not turn into an event, broken
/// down by why. Exposed for operational visibility; nothing in the engine
/// reads it back.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DropCounters {
    pub no_prefix: u64,
    pub unmatched: u64,
}

/// Owns the correlation store and runs lines through the rule catalog.
pub struct Engine {
    store: EventStore,
    rules: &'static [Rule],
    drops: DropCounters,
}

impl Engine {
    pub fn new() -> Self {
        Self {
            store: EventStore::new(),
            rules: rules::rules(),
            drops: DropCounters::default(),
        }
    }

    pub fn drop_counters(&self) -> DropCounters {
        self.drops
    }

    pub fn store(&self) -> &EventStore {
        &self.store
    }

    /// Feed one raw line (no trailing newline assumed either way). Returns
    /// every event the line produced, in rule-catalog order — almost always
    /// zero or one, except `round-tickets` which may yield up to three.
    pub fn process_line(&mut self, line: &str) -> Vec<Event> {
        let Some(prefixed) = timestamp::split_prefix(line) else {
            self.drops.no_prefix += 1;
            return Vec::new();
        };

        for rule in self.rules {
            if let Some(caps) = rule.regex.captures(prefixed.tail) {
                return (rule.apply)(&caps, prefixed.time, prefixed.chain_id, line, &mut self.store);
            }
        }

        self.drops.unmatched += 1;
        Vec::new()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unprefixed_line_is_dropped_and_counted() {
        let mut engine = Engine::new();
        assert!(engine.process_line("not a log line").is_empty());
        assert_eq!(engine.drop_counters().no_prefix, 1);
    }

    #[test]
    fn unmatched_prefixed_line_is_dropped_and_counted() {
        let mut engine = Engine::new();
        let line = "[2024.01.15-12.30.45:123][ 1]LogTemp: nothing we care about";
        assert!(engine.process_line(line).is_empty());
        assert_eq!(engine.drop_counters().unmatched, 1);
    }

    #[test]
    fn connected_then_join_succeeded_correlate_by_chain_id() {
        let mut engine = Engine::new();
        let connect_line = "[2024.01.15-12.30.45:123][ 7]LogSquad: PostLogin: NewPlayer: BP_PlayerController_C /Game/Maps/World.PersistentLevel.Alice_C_1 (IP: 1.2.3.4 | Online IDs: EOS:0123456789abcdef0123456789abcdef steam: 765611)";
        let events = engine.process_line(connect_line);
        assert_eq!(events.len(), 1);
        match &events[0] {
            Event::PlayerConnected { chain_id, .. } => assert_eq!(chain_id.0, 7),
            other => panic!("expected PlayerConnected, got {other:?}"),
        }

        let join_line = "[2024.01.15-12.30.46:000][ 7]LogNet: Join succeeded: Alice";
        let events = engine.process_line(join_line);
        assert_eq!(events.len(), 1);
        match &events[0] {
            Event::PlayerJoinSucceeded { name, .. } => assert_eq!(name, "Alice"),
            other => panic!("expected PlayerJoinSucceeded, got {other:?}"),
        }
    }

    #[test]
    fn join_succeeded_without_prior_connect_is_suppressed() {
        let mut engine = Engine::new();
        let join_line = "[2024.01.15-12.30.46:000][ 99]LogNet: Join succeeded: Ghost";
        assert!(engine.process_line(join_line).is_empty());
    }
}
