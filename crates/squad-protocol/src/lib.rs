//! Source-RCON wire protocol and transport.
//!
//! This crate provides:
//! - The packet codec (encode/decode, size bounds, packet type constants)
//! - The duplex TCP transport that decodes packets off the wire
//!   incrementally and forwards them to the session layer in order

pub mod codec;
pub mod transport;

pub use codec::{packet_type, Decoded, Packet, MAX_PACKET_SIZE, MIN_PACKET_SIZE};
pub use transport::{Incoming, RconTransport};
