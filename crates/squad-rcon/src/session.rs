//! The RCON session supervisor: authentication, request/response
//! correlation, multi-packet reassembly, chat routing, and the
//! reconnect/backoff/keep-alive state machine.
//!
//! This is one long-running task (spawned by [`spawn`]); callers interact
//! with it only through the cheaply-cloneable [`SessionHandle`].

use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use squad_core::{ChatChannel, Event, Result, SquadError};
use squad_protocol::{packet_type, Incoming, Packet, RconTransport};

use crate::parsers;

const BACKOFF_SCHEDULE: [Duration; 4] = [
    Duration::from_secs(1),
    Duration::from_secs(2),
    Duration::from_secs(5),
    Duration::from_secs(10),
];
const DEFAULT_BACKOFF_CAP: Duration = Duration::from_secs(30);
const KEEPALIVE_COMMAND: &str = "ListPlayers";
/// Trailer bytes the game server sometimes appends to the end-of-response
/// sentinel; stripped before testing for emptiness.
const KNOWN_TRAILER: [u8; 5] = [0, 1, 0, 0, 0];

fn backoff_delay(attempt: u32, cap: Duration) -> Duration {
    BACKOFF_SCHEDULE
        .get(attempt as usize)
        .copied()
        .unwrap_or(cap)
}

/// Tunables for the session supervisor.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub addr: String,
    pub password: String,
    pub queue_bound: usize,
    pub command_timeout: Duration,
    pub connect_timeout: Duration,
    pub keepalive_idle: Duration,
    /// Ceiling the exponential reconnect backoff schedule saturates to.
    pub backoff_cap: Duration,
}

impl SessionConfig {
    pub fn new(addr: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            password: password.into(),
            queue_bound: 256,
            command_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(10),
            keepalive_idle: Duration::from_secs(30),
            backoff_cap: DEFAULT_BACKOFF_CAP,
        }
    }
}

struct Request {
    command: String,
    respond_to: Option<oneshot::Sender<Result<String>>>,
}

/// Cheaply-cloneable front for a running session task.
#[derive(Clone)]
pub struct SessionHandle {
    cmd_tx: mpsc::Sender<Request>,
}

impl SessionHandle {
    /// Enqueue a command and await its result. Fails immediately with
    /// `QueueFull` if the bounded queue is already at capacity.
    pub async fn execute(&self, command: impl Into<String>) -> Result<String> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .try_send(Request {
                command: command.into(),
                respond_to: Some(tx),
            })
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => SquadError::QueueFull,
                mpsc::error::TrySendError::Closed(_) => {
                    SquadError::Disconnected("session task is gone".to_string())
                }
            })?;
        rx.await.map_err(|_| SquadError::Cancelled)?
    }
}

struct InFlight {
    id: i32,
    respond_to: Option<oneshot::Sender<Result<String>>>,
    buffer: String,
    deadline: Instant,
}

/// Spawn the session supervisor. Returns a handle for issuing commands and
/// the driver task's join handle; events (`RCON_CONNECTED`,
/// `RCON_DISCONNECTED`, `RCON_ERROR`, `CHAT_MESSAGE`, `CHAT_COMMAND`) are
/// published to `events` as they occur.
pub fn spawn(config: SessionConfig, events: mpsc::Sender<Event>) -> (SessionHandle, JoinHandle<()>) {
    let (cmd_tx, cmd_rx) = mpsc::channel(config.queue_bound.max(1));
    let driver = SessionDriver {
        config,
        events,
        cmd_rx,
        next_id: 2,
        attempt: 0,
        was_previously_connected: false,
        consecutive_timeouts: 0,
    };
    let join = tokio::spawn(driver.run());
    (SessionHandle { cmd_tx }, join)
}

struct SessionDriver {
    config: SessionConfig,
    events: mpsc::Sender<Event>,
    cmd_rx: mpsc::Receiver<Request>,
    next_id: i32,
    attempt: u32,
    was_previously_connected: bool,
    consecutive_timeouts: u32,
}

impl SessionDriver {
    async fn run(mut self) {
        loop {
            match self.connect_and_auth().await {
                Ok((transport, incoming)) => {
                    self.attempt = 0;
                    self.consecutive_timeouts = 0;
                    self.emit(Event::RconConnected {
                        time: Utc::now(),
                        raw: String::new(),
                        reconnect: self.was_previously_connected,
                    })
                    .await;
                    self.was_previously_connected = true;

                    let reason = self.serve_ready(transport, incoming).await;
                    self.emit(Event::RconDisconnected {
                        time: Utc::now(),
                        raw: String::new(),
                        reason,
                        will_reconnect: true,
                    })
                    .await;
                }
                Err(SquadError::AuthFailed) => {
                    warn!("RCON authentication failed, backing off before retry");
                    self.emit(Event::RconError {
                        time: Utc::now(),
                        raw: String::new(),
                        fatal: true,
                        reason: "auth failed".to_string(),
                    })
                    .await;
                }
                Err(e) => {
                    debug!("RCON connect attempt failed: {}", e);
                }
            }

            let delay = backoff_delay(self.attempt, self.config.backoff_cap);
            self.attempt = self.attempt.saturating_add(1);
            tokio::time::sleep(delay).await;
        }
    }

    async fn connect_and_auth(&mut self) -> Result<(RconTransport, mpsc::Receiver<Incoming>)> {
        let (mut transport, mut incoming) =
            tokio::time::timeout(self.config.connect_timeout, RconTransport::connect(&self.config.addr))
                .await
                .map_err(|_| SquadError::Timeout)??;

        transport
            .send_packet(1, packet_type::AUTH, self.config.password.as_bytes())
            .await?;

        loop {
            match incoming.recv().await {
                Some(Incoming::Packet(p)) if p.packet_type == packet_type::RESPONSE_VALUE && p.id == 1 => {
                    continue; // optional empty ack before AUTH_RESPONSE; ignored
                }
                Some(Incoming::Packet(p)) if p.packet_type == packet_type::EXEC_OR_AUTH_RESPONSE => {
                    if p.id == -1 {
                        return Err(SquadError::AuthFailed);
                    }
                    if p.id != 1 {
                        warn!("RCON auth response id mismatch: expected 1, got {}", p.id);
                    }
                    info!("RCON authenticated against {}", self.config.addr);
                    return Ok((transport, incoming));
                }
                Some(Incoming::Packet(p)) => {
                    debug!("unexpected packet during auth: type={}", p.packet_type);
                }
                Some(Incoming::Closed(reason)) => return Err(SquadError::Disconnected(reason)),
                None => return Err(SquadError::Disconnected("transport channel closed".to_string())),
            }
        }
    }

    async fn serve_ready(&mut self, mut transport: RconTransport, mut incoming: mpsc::Receiver<Incoming>) -> String {
        let mut in_flight: Option<InFlight> = None;
        let mut last_activity = Instant::now();

        loop {
            let deadline = match &in_flight {
                Some(flight) => flight.deadline,
                None => last_activity + self.config.keepalive_idle,
            };

            tokio::select! {
                biased;

                maybe_incoming = incoming.recv() => {
                    match maybe_incoming {
                        Some(Incoming::Packet(p)) => {
                            last_activity = Instant::now();
                            self.handle_packet(p, &mut in_flight).await;
                        }
                        Some(Incoming::Closed(reason)) => {
                            self.fail_in_flight(in_flight.take(), &reason);
                            self.fail_queued(&reason);
                            return reason;
                        }
                        None => {
                            let reason = "transport channel closed".to_string();
                            self.fail_in_flight(in_flight.take(), &reason);
                            self.fail_queued(&reason);
                            return reason;
                        }
                    }
                }

                _ = tokio::time::sleep_until(deadline) => {
                    if let Some(mut flight) = in_flight.take() {
                        if let Some(tx) = flight.respond_to.take() {
                            let _ = tx.send(Err(SquadError::Timeout));
                        }
                        self.consecutive_timeouts += 1;
                        if self.consecutive_timeouts >= 3 {
                            let reason = "three consecutive command timeouts".to_string();
                            self.fail_queued(&reason);
                            return reason;
                        }
                    } else {
                        match self.issue(&mut transport, KEEPALIVE_COMMAND.to_string(), None).await {
                            Ok(flight) => in_flight = Some(flight),
                            Err(e) => return e.to_string(),
                        }
                        last_activity = Instant::now();
                    }
                }

                maybe_req = self.cmd_rx.recv(), if in_flight.is_none() => {
                    match maybe_req {
                        Some(req) => {
                            match self.issue(&mut transport, req.command, req.respond_to).await {
                                Ok(flight) => in_flight = Some(flight),
                                Err(e) => return e.to_string(),
                            }
                        }
                        None => {
                            // All handles dropped; keep serving until the
                            // connection itself goes away.
                        }
                    }
                }
            }
        }
    }

    async fn issue(
        &mut self,
        transport: &mut RconTransport,
        command: String,
        respond_to: Option<oneshot::Sender<Result<String>>>,
    ) -> Result<InFlight> {
        let id = self.alloc_request_id();
        debug!("RCON exec[{}]: {}", id, command);
        transport.send_packet(id, packet_type::EXEC_OR_AUTH_RESPONSE, command.as_bytes()).await?;
        transport.send_packet(id, packet_type::RESPONSE_VALUE, b"").await?;
        Ok(InFlight {
            id,
            respond_to,
            buffer: String::new(),
            deadline: Instant::now() + self.config.command_timeout,
        })
    }

    fn alloc_request_id(&mut self) -> i32 {
        let id = self.next_id;
        self.next_id = if self.next_id >= i32::MAX - 1 { 2 } else { self.next_id + 1 };
        id
    }

    async fn handle_packet(&mut self, packet: Packet, in_flight: &mut Option<InFlight>) {
        match packet.packet_type {
            t if t == packet_type::RESPONSE_VALUE => self.handle_response_value(packet, in_flight),
            t if t == packet_type::CHAT_VALUE => self.handle_chat(packet).await,
            t => debug!("ignoring packet of type {} in Ready state", t),
        }
    }

    fn handle_response_value(&mut self, packet: Packet, in_flight: &mut Option<InFlight>) {
        let Some(flight) = in_flight.as_mut() else {
            debug!("RESPONSE_VALUE id={} with no in-flight request, dropped", packet.id);
            return;
        };
        if flight.id != packet.id {
            warn!(
                "RESPONSE_VALUE id mismatch: in-flight={}, received={}, dropped",
                flight.id, packet.id
            );
            return;
        }

        let trimmed = strip_known_trailer(&packet.body);
        if trimmed.is_empty() {
            let flight = in_flight.take().expect("checked Some above");
            self.consecutive_timeouts = 0;
            if let Some(tx) = flight.respond_to {
                let _ = tx.send(Ok(flight.buffer));
            }
        } else {
            flight.buffer.push_str(&String::from_utf8_lossy(trimmed));
        }
    }

    async fn handle_chat(&mut self, packet: Packet) {
        let body = packet.body_str();
        let Some(chat) = parsers::parse_chat(&body) else {
            warn!("unparseable CHAT_VALUE body: {}", body);
            return;
        };

        let time = Utc::now();
        let prefix = chat.message.chars().next();
        let event = if matches!(prefix, Some('!') | Some('/')) {
            let mut parts = chat.message[1..].split_whitespace();
            let command = parts.next().unwrap_or_default().to_string();
            let args = parts.map(|s| s.to_string()).collect();
            Event::ChatCommand {
                time,
                raw: body,
                channel: chat.channel,
                eos_id: chat.eos_id,
                steam_id: chat.steam_id,
                name: chat.name,
                command,
                args,
            }
        } else {
            Event::ChatMessage {
                time,
                raw: body,
                channel: chat.channel,
                eos_id: chat.eos_id,
                steam_id: chat.steam_id,
                name: chat.name,
                message: chat.message,
            }
        };
        self.emit(event).await;
    }

    fn fail_in_flight(&self, flight: Option<InFlight>, reason: &str) {
        if let Some(flight) = flight {
            if let Some(tx) = flight.respond_to {
                let _ = tx.send(Err(SquadError::Disconnected(reason.to_string())));
            }
        }
    }

    fn fail_queued(&mut self, reason: &str) {
        while let Ok(req) = self.cmd_rx.try_recv() {
            if let Some(tx) = req.respond_to {
                let _ = tx.send(Err(SquadError::Disconnected(reason.to_string())));
            }
        }
    }

    async fn emit(&self, event: Event) {
        let _ = self.events.send(event).await;
    }
}

fn strip_known_trailer(body: &[u8]) -> &[u8] {
    body.strip_suffix(&KNOWN_TRAILER).unwrap_or(body)
}

/// Splits a chat channel out of a `ChatCommand`/`ChatMessage`'s channel
/// field for callers that want a human-readable label rather than the raw
/// enum.
pub fn channel_label(channel: ChatChannel) -> &'static str {
    match channel {
        ChatChannel::ChatAll => "ChatAll",
        ChatChannel::ChatTeam => "ChatTeam",
        ChatChannel::ChatSquad => "ChatSquad",
        ChatChannel::ChatAdmin => "ChatAdmin",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_known_trailer_bytes() {
        let mut body = b"some output".to_vec();
        body.extend_from_slice(&KNOWN_TRAILER);
        assert_eq!(strip_known_trailer(&body), b"some output");
    }

    #[test]
    fn empty_sentinel_detected_even_with_trailer() {
        assert!(strip_known_trailer(&KNOWN_TRAILER).is_empty());
        assert!(strip_known_trailer(&[]).is_empty());
    }

    #[tokio::test]
    async fn three_consecutive_timeouts_triggers_reconnect() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            // Accept and hold the connection open without ever reading or
            // writing, so every command issued against it times out.
            let (_socket, _peer) = listener.accept().await.unwrap();
            std::future::pending::<()>().await
        });

        let (transport, incoming) = RconTransport::connect(&addr.to_string()).await.unwrap();

        let mut config = SessionConfig::new(addr.to_string(), "pw");
        config.command_timeout = Duration::from_millis(20);
        config.keepalive_idle = Duration::from_millis(10);

        // Kept alive for the whole test so `cmd_rx.recv()` pends instead of
        // resolving to `None` and starving the timeout branch.
        let (_cmd_tx, cmd_rx) = mpsc::channel(1);
        let mut driver = SessionDriver {
            config,
            events: mpsc::channel(1).0,
            cmd_rx,
            next_id: 2,
            attempt: 0,
            was_previously_connected: false,
            consecutive_timeouts: 0,
        };

        let reason = driver.serve_ready(transport, incoming).await;
        assert_eq!(reason, "three consecutive command timeouts");
    }

    #[test]
    fn request_id_allocator_wraps_before_i32_max() {
        let (_tx, rx) = mpsc::channel(1);
        let mut driver = SessionDriver {
            config: SessionConfig::new("127.0.0.1:27015", "pw"),
            events: mpsc::channel(1).0,
            cmd_rx: rx,
            next_id: i32::MAX - 1,
            attempt: 0,
            was_previously_connected: false,
            consecutive_timeouts: 0,
        };
        let first = driver.alloc_request_id();
        let second = driver.alloc_request_id();
        assert_eq!(first, i32::MAX - 1);
        assert_eq!(second, 2);
    }
}
