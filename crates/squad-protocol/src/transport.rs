//! Duplex transport for a single RCON TCP connection.
//!
//! Owns the socket. The read half runs as its own task, decoding packets
//! incrementally from the growing byte stream and forwarding each complete
//! packet to the session layer in wire order; the write half is driven
//! directly by `send_packet` so a caller gets backpressure instead of an
//! unbounded queue.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use squad_core::{Result, SquadError};

use crate::codec::{self, Decoded, Packet};

/// Something the read loop delivers to the session layer.
#[derive(Debug)]
pub enum Incoming {
    Packet(Packet),
    /// The connection ended; carries a human-readable reason.
    Closed(String),
}

/// One live RCON connection. Dropping this closes the write half; the read
/// task notices on its next read and emits `Incoming::Closed`.
pub struct RconTransport {
    writer: OwnedWriteHalf,
}

impl RconTransport {
    /// Connect to `addr` and start the background read loop. Returns the
    /// transport (for writes) and the channel the read loop publishes
    /// decoded packets and the eventual close notification to.
    pub async fn connect(addr: &str) -> Result<(Self, mpsc::Receiver<Incoming>)> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true).ok();
        let (read_half, write_half) = stream.into_split();

        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(read_loop(read_half, tx));

        Ok((Self { writer: write_half }, rx))
    }

    /// Encode and write one packet. Any error here means the connection is
    /// dead; the caller treats it as such.
    pub async fn send_packet(&mut self, id: i32, packet_type: i32, body: &[u8]) -> Result<()> {
        let bytes = codec::encode(id, packet_type, body);
        self.writer.write_all(&bytes).await?;
        self.writer.flush().await?;
        Ok(())
    }
}

async fn read_loop(mut reader: OwnedReadHalf, tx: mpsc::Sender<Incoming>) {
    let mut buf: Vec<u8> = Vec::with_capacity(4096);
    let mut scratch = [0u8; 4096];

    loop {
        // Drain every complete packet the buffer already holds before
        // reading more bytes off the wire.
        loop {
            match codec::decode(&buf) {
                Ok(Decoded::Packet(packet, consumed)) => {
                    buf.drain(..consumed);
                    if tx.send(Incoming::Packet(packet)).await.is_err() {
                        return; // session layer gone
                    }
                }
                Ok(Decoded::NeedMore) => break,
                Err(SquadError::MalformedFrame(reason)) => {
                    warn!("malformed RCON frame, closing connection: {}", reason);
                    let _ = tx.send(Incoming::Closed(reason)).await;
                    return;
                }
                Err(other) => {
                    let _ = tx.send(Incoming::Closed(other.to_string())).await;
                    return;
                }
            }
        }

        match reader.read(&mut scratch).await {
            Ok(0) => {
                debug!("RCON connection closed by peer");
                let _ = tx
                    .send(Incoming::Closed("connection closed by peer".to_string()))
                    .await;
                return;
            }
            Ok(n) => buf.extend_from_slice(&scratch[..n]),
            Err(e) => {
                let _ = tx.send(Incoming::Closed(e.to_string())).await;
                return;
            }
        }
    }
}
