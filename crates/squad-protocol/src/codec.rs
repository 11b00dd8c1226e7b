//! Source-RCON packet framing.
//!
//! Wire layout, little-endian: `int32 size | int32 id | int32 type | cstring
//! body (null-terminated) | byte 0x00 (terminator)`. `size` counts everything
//! after itself. Valid sizes are `[10, 4096]`.

use squad_core::SquadError;

/// Packet type constants. `Exec`/`AuthResponse` share the wire value `0x02`;
/// direction disambiguates them.
pub mod packet_type {
    pub const AUTH: i32 = 0x03;
    pub const EXEC_OR_AUTH_RESPONSE: i32 = 0x02;
    pub const RESPONSE_VALUE: i32 = 0x00;
    pub const CHAT_VALUE: i32 = 0x01;
}

/// Smallest legal frame: id(4) + type(4) + empty body + null(1) + null(1).
pub const MIN_PACKET_SIZE: i32 = 10;
/// Largest legal frame.
pub const MAX_PACKET_SIZE: i32 = 4096;

/// A fully decoded Source-RCON packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub id: i32,
    pub packet_type: i32,
    pub body: Vec<u8>,
}

impl Packet {
    pub fn new(id: i32, packet_type: i32, body: impl Into<Vec<u8>>) -> Self {
        Self {
            id,
            packet_type,
            body: body.into(),
        }
    }

    /// Body decoded as UTF-8, lossily — RCON payloads are ASCII but chat
    /// bodies may carry arbitrary bytes.
    pub fn body_str(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// The outcome of attempting to decode one packet from the front of a
/// buffer.
#[derive(Debug)]
pub enum Decoded {
    /// A complete packet, plus the number of bytes consumed from the front
    /// of the buffer.
    Packet(Packet, usize),
    /// Not enough bytes yet; no bytes were consumed.
    NeedMore,
}

/// Encode a packet to its wire representation.
pub fn encode(id: i32, packet_type: i32, body: &[u8]) -> Vec<u8> {
    let size = 4 + 4 + body.len() + 2;
    let mut buf = Vec::with_capacity(4 + size);
    buf.extend_from_slice(&(size as i32).to_le_bytes());
    buf.extend_from_slice(&id.to_le_bytes());
    buf.extend_from_slice(&packet_type.to_le_bytes());
    buf.extend_from_slice(body);
    buf.push(0);
    buf.push(0);
    buf
}

/// Attempt to decode one packet from the front of `buf`. Incremental: never
/// consumes bytes unless a whole, valid frame is present. A malformed frame
/// (`size` out of bounds or a missing terminator byte) is reported eagerly
/// once enough bytes to identify it have arrived, so the caller can drop the
/// connection instead of spinning on garbage.
pub fn decode(buf: &[u8]) -> Result<Decoded, SquadError> {
    if buf.len() < 4 {
        return Ok(Decoded::NeedMore);
    }
    let size = i32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
    if size < MIN_PACKET_SIZE || size > MAX_PACKET_SIZE {
        return Err(SquadError::MalformedFrame(format!(
            "packet size {} out of bounds [{}, {}]",
            size, MIN_PACKET_SIZE, MAX_PACKET_SIZE
        )));
    }
    let total = 4 + size as usize;
    if buf.len() < total {
        return Ok(Decoded::NeedMore);
    }

    let id = i32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]);
    let packet_type = i32::from_le_bytes([buf[8], buf[9], buf[10], buf[11]]);

    if buf[total - 1] != 0 {
        return Err(SquadError::MalformedFrame(
            "missing packet terminator byte".to_string(),
        ));
    }
    let body_end = total - 2;
    let body = buf[12..body_end].to_vec();

    Ok(Decoded::Packet(Packet::new(id, packet_type, body), total))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_roundtrip() {
        let bytes = encode(7, packet_type::AUTH, b"hunter2");
        match decode(&bytes).unwrap() {
            Decoded::Packet(p, consumed) => {
                assert_eq!(consumed, bytes.len());
                assert_eq!(p.id, 7);
                assert_eq!(p.packet_type, packet_type::AUTH);
                assert_eq!(p.body, b"hunter2");
            }
            Decoded::NeedMore => panic!("expected a full packet"),
        }
    }

    #[test]
    fn decode_is_incremental() {
        let bytes = encode(1, packet_type::RESPONSE_VALUE, b"hello world");
        for cut in 0..bytes.len() {
            match decode(&bytes[..cut]).unwrap() {
                Decoded::NeedMore => {}
                Decoded::Packet(_, _) => panic!("decoded prematurely at {} bytes", cut),
            }
        }
        match decode(&bytes).unwrap() {
            Decoded::Packet(_, consumed) => assert_eq!(consumed, bytes.len()),
            Decoded::NeedMore => panic!("expected a full packet at full length"),
        }
    }

    #[test]
    fn decode_concatenated_stream_yields_same_sequence() {
        let a = encode(1, packet_type::AUTH, b"one");
        let b = encode(2, packet_type::RESPONSE_VALUE, b"two");
        let mut stream = Vec::new();
        stream.extend_from_slice(&a);
        stream.extend_from_slice(&b);

        let mut cursor = 0;
        let mut ids = Vec::new();
        while cursor < stream.len() {
            match decode(&stream[cursor..]).unwrap() {
                Decoded::Packet(p, consumed) => {
                    ids.push(p.id);
                    cursor += consumed;
                }
                Decoded::NeedMore => break,
            }
        }
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn oversize_payload_rejected() {
        let max_body_len = (MAX_PACKET_SIZE - 4 - 4 - 2) as usize;
        let body = vec![b'a'; max_body_len];
        let bytes = encode(1, packet_type::EXEC_OR_AUTH_RESPONSE, &body);
        assert!(decode(&bytes).is_ok());

        let too_big = vec![b'a'; max_body_len + 1];
        let oversize = encode(1, packet_type::EXEC_OR_AUTH_RESPONSE, &too_big);
        assert!(matches!(
            decode(&oversize),
            Err(SquadError::MalformedFrame(_))
        ));
    }

    #[test]
    fn rejects_missing_terminator() {
        let mut bytes = encode(1, packet_type::AUTH, b"x");
        let last = bytes.len() - 1;
        bytes[last] = 1;
        assert!(matches!(decode(&bytes), Err(SquadError::MalformedFrame(_))));
    }
}
