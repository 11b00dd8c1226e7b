//! Composes the RCON session, the log-parse engine, and the event bus
//! into the single surface external callers drive.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use squad_bus::{EventBus, Handler, Subscription};
use squad_core::{EosId, Event, Player, Result, SquadId, TeamId};
use squad_log::{Engine as LogEngine, LocalTailSource, TailedLine};
use squad_rcon::{commands, parsers, session, SessionConfig, SessionHandle};
use tokio::sync::{watch, RwLock};
use tokio::time::interval;
use tracing::{debug, info, warn};

const STOP_DRAIN_BUDGET: Duration = Duration::from_secs(10);
const LOG_CHANNEL_BOUND: usize = 4096;
const DEFAULT_RECONCILE_PERIOD: Duration = Duration::from_secs(30);
const DEFAULT_BUS_QUEUE_BOUND: usize = 1024;

/// Everything the façade needs to start a server's worker tasks.
pub struct FacadeConfig {
    pub rcon_addr: String,
    pub rcon_password: String,
    pub log_path: std::path::PathBuf,
    pub session: SessionConfig,
    /// Max events held per event-bus subscription before oldest are dropped.
    pub bus_queue_bound: usize,
    /// How often the periodic `ListPlayers`/`ListSquads` reconciliation sweep runs.
    pub reconcile_period: Duration,
}

impl FacadeConfig {
    pub fn new(rcon_addr: impl Into<String>, rcon_password: impl Into<String>, log_path: impl Into<std::path::PathBuf>) -> Self {
        let rcon_addr = rcon_addr.into();
        let rcon_password = rcon_password.into();
        let session = SessionConfig::new(rcon_addr.clone(), rcon_password.clone());
        Self {
            rcon_addr,
            rcon_password,
            log_path: log_path.into(),
            session,
            bus_queue_bound: DEFAULT_BUS_QUEUE_BOUND,
            reconcile_period: DEFAULT_RECONCILE_PERIOD,
        }
    }
}

struct Squad {
    team_id: TeamId,
    squad_id: SquadId,
}

/// The live, reconciled view of players and squads. Guarded by a single
/// lock; readers take a snapshot rather than holding it across awaits.
#[derive(Default)]
struct Tables {
    players: HashMap<EosId, Player>,
    known_squads: Vec<Squad>,
}

pub struct ServerFacade {
    session: SessionHandle,
    bus: Arc<EventBus>,
    tables: Arc<RwLock<Tables>>,
    shutdown: watch::Sender<bool>,
    tasks: Vec<tokio::task::JoinHandle<()>>,
}

impl ServerFacade {
    /// Spin up the transport+session, log reader+engine, and reconciliation
    /// timer in parallel, wired to a shared event bus.
    pub async fn start(config: FacadeConfig) -> Self {
        let bus = Arc::new(EventBus::with_queue_bound(config.bus_queue_bound));
        let tables = Arc::new(RwLock::new(Tables::default()));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let (rcon_events_tx, mut rcon_events_rx) = tokio::sync::mpsc::channel::<Event>(256);
        let (session, session_join) = session::spawn(config.session.clone(), rcon_events_tx);

        let mut tasks = Vec::new();

        // Forward session-originated events (RCON lifecycle, chat) onto the bus.
        let forward_bus = bus.clone();
        let mut forward_shutdown = shutdown_rx.clone();
        tasks.push(tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = forward_shutdown.changed() => return,
                    event = rcon_events_rx.recv() => match event {
                        Some(event) => forward_bus.emit(event),
                        None => return,
                    }
                }
            }
        }));
        tasks.push(session_join);

        // Log reader -> parse engine -> bus, with an immediate reconciliation
        // kick on NEW_GAME.
        let log_bus = bus.clone();
        let log_session = session.clone();
        let log_tables = tables.clone();
        let log_path = config.log_path.clone();
        let mut log_shutdown = shutdown_rx.clone();
        tasks.push(tokio::spawn(async move {
            let mut reader = LocalTailSource::spawn(&log_path, LOG_CHANNEL_BOUND);
            let mut engine = LogEngine::new();
            loop {
                tokio::select! {
                    _ = log_shutdown.changed() => return,
                    line = reader.next_line() => match line {
                        Some(TailedLine::Line(line)) => {
                            for event in engine.process_line(&line) {
                                let is_new_game = matches!(event, Event::NewGame { .. });
                                if let Some(eos_id) = identity_eos_id(&event) {
                                    if let Some(player) = engine.store().player(eos_id).cloned() {
                                        merge_player(&log_tables, player).await;
                                    }
                                }
                                log_bus.emit(event);
                                if is_new_game {
                                    log_tables.write().await.players.clear();
                                    reconcile_once(&log_session, &log_tables, &log_bus).await;
                                }
                            }
                        }
                        Some(TailedLine::Rotated) => {
                            debug!("log file rotated; correlation state reset at next new-game");
                        }
                        None => return,
                    }
                }
            }
        }));

        // Periodic reconciliation sweep.
        let timer_session = session.clone();
        let timer_tables = tables.clone();
        let timer_bus = bus.clone();
        let mut timer_shutdown = shutdown_rx.clone();
        let reconcile_period = config.reconcile_period;
        tasks.push(tokio::spawn(async move {
            let mut ticker = interval(reconcile_period);
            loop {
                tokio::select! {
                    _ = timer_shutdown.changed() => return,
                    _ = ticker.tick() => reconcile_once(&timer_session, &timer_tables, &timer_bus).await,
                }
            }
        }));

        info!(addr = %config.rcon_addr, "server facade started");
        Self {
            session,
            bus,
            tables,
            shutdown: shutdown_tx,
            tasks,
        }
    }

    /// Cancel worker tasks in reverse start order and wait up to the drain
    /// budget for them to finish; in-flight RCON commands fail with
    /// `Cancelled` once the session task observes shutdown.
    pub async fn stop(mut self) {
        let _ = self.shutdown.send(true);
        let drain = tokio::time::timeout(STOP_DRAIN_BUDGET, async {
            for task in self.tasks.drain(..) {
                let _ = task.await;
            }
        });
        if drain.await.is_err() {
            warn!("facade stop exceeded drain budget; remaining tasks abandoned");
        }
    }

    pub async fn execute(&self, command: impl Into<String>) -> Result<String> {
        self.session.execute(command.into()).await
    }

    pub fn subscribe(&self, kind: &'static str, handler: Handler) -> Subscription {
        self.bus.subscribe(kind, handler)
    }

    pub async fn warn(&self, eos_id: &EosId, message: &str) -> Result<()> {
        self.execute(commands::admin_warn(eos_id.as_str(), message)).await?;
        self.bus.emit(Event::PlayerWarned {
            time: chrono::Utc::now(),
            raw: String::new(),
            eos_id: eos_id.clone(),
            name: self.tables.read().await.players.get(eos_id).and_then(|p| p.name.clone()),
            message: message.to_string(),
        });
        Ok(())
    }

    pub async fn kick(&self, eos_id: &EosId, reason: &str) -> Result<()> {
        self.execute(commands::admin_kick(eos_id.as_str(), reason)).await?;
        self.bus.emit(Event::PlayerKicked {
            time: chrono::Utc::now(),
            raw: String::new(),
            eos_id: eos_id.clone(),
            name: self.tables.read().await.players.get(eos_id).and_then(|p| p.name.clone()),
            reason: reason.to_string(),
        });
        Ok(())
    }

    pub async fn ban(&self, eos_id: &EosId, duration: &str, reason: &str) -> Result<()> {
        self.execute(commands::admin_ban(eos_id.as_str(), duration, reason)).await?;
        self.bus.emit(Event::PlayerBanned {
            time: chrono::Utc::now(),
            raw: String::new(),
            eos_id: eos_id.clone(),
            name: self.tables.read().await.players.get(eos_id).and_then(|p| p.name.clone()),
            duration: duration.to_string(),
            reason: reason.to_string(),
        });
        Ok(())
    }

    pub async fn broadcast(&self, message: &str) -> Result<()> {
        self.execute(commands::admin_broadcast(message)).await.map(|_| ())
    }

    pub async fn change_layer(&self, layer_name: &str) -> Result<()> {
        self.execute(commands::admin_change_layer(layer_name)).await.map(|_| ())
    }

    pub async fn set_next_layer(&self, layer_name: &str) -> Result<()> {
        self.execute(commands::admin_set_next_layer(layer_name)).await.map(|_| ())
    }

    pub async fn force_team_change(&self, eos_id: &EosId) -> Result<()> {
        self.execute(commands::admin_force_team_change(eos_id.as_str())).await.map(|_| ())
    }

    pub async fn disband_squad(&self, team_id: TeamId, squad_id: SquadId) -> Result<()> {
        self.execute(commands::admin_disband_squad(team_id.get(), squad_id.get())).await.map(|_| ())
    }

    pub async fn refresh_players(&self) -> Result<()> {
        refresh_players(&self.session, &self.tables).await
    }

    pub async fn refresh_squads(&self) -> Result<()> {
        refresh_squads(&self.session, &self.tables, &self.bus).await
    }

    /// A point-in-time copy of the reconciled player table.
    pub async fn players_snapshot(&self) -> Vec<Player> {
        self.tables.read().await.players.values().cloned().collect()
    }
}

async fn reconcile_once(session: &SessionHandle, tables: &Arc<RwLock<Tables>>, bus: &Arc<EventBus>) {
    if let Err(err) = refresh_players(session, tables).await {
        warn!(?err, "ListPlayers reconciliation failed");
    }
    if let Err(err) = refresh_squads(session, tables, bus).await {
        warn!(?err, "ListSquads reconciliation failed");
    }
}

async fn refresh_players(session: &SessionHandle, tables: &Arc<RwLock<Tables>>) -> Result<()> {
    let body = session.execute("ListPlayers").await?;
    let parsed = parsers::parse_list_players(&body);

    let mut tables = tables.write().await;
    for listed in parsed.players {
        let mut player = Player::new(listed.eos_id.clone());
        player.steam_id = listed.steam_id;
        player.name = Some(listed.name);
        player.team_id = listed.team_id;
        player.squad_id = listed.squad_id;
        player.role = Some(listed.role);
        player.is_squad_leader = Some(listed.is_leader);

        match tables.players.get_mut(&listed.eos_id) {
            Some(existing) => existing.merge(player),
            None => {
                tables.players.insert(listed.eos_id, player);
            }
        }
    }
    Ok(())
}

/// The identity `EosId` an event establishes or confirms, if any. Only
/// events that carry a player's own identity feed the live table; events
/// about some *other* player (an attacker, a squad creator) don't.
fn identity_eos_id(event: &Event) -> Option<&EosId> {
    match event {
        Event::PlayerConnected { eos_id, .. }
        | Event::PlayerJoinSucceeded { eos_id, .. }
        | Event::PlayerDisconnected { eos_id, .. } => Some(eos_id),
        _ => None,
    }
}

/// Merge one log-derived partial player record into the shared table, under
/// the same lock `refresh_players` uses.
async fn merge_player(tables: &Arc<RwLock<Tables>>, player: Player) {
    let mut tables = tables.write().await;
    match tables.players.get_mut(&player.eos_id) {
        Some(existing) => existing.merge(player),
        None => {
            tables.players.insert(player.eos_id.clone(), player);
        }
    }
}

async fn refresh_squads(session: &SessionHandle, tables: &Arc<RwLock<Tables>>, bus: &Arc<EventBus>) -> Result<()> {
    let body = session.execute("ListSquads").await?;
    let squads = parsers::parse_list_squads(&body);

    let mut tables = tables.write().await;
    for squad in squads {
        let already_known = tables
            .known_squads
            .iter()
            .any(|s| s.team_id == squad.team_id && s.squad_id == squad.squad_id);
        if already_known {
            continue;
        }
        tables.known_squads.push(Squad {
            team_id: squad.team_id,
            squad_id: squad.squad_id,
        });
        if let Some(creator_eos_id) = squad.creator_eos_id {
            bus.emit(Event::SquadCreated {
                time: chrono::Utc::now(),
                raw: String::new(),
                team_id: squad.team_id,
                squad_id: squad.squad_id,
                squad_name: squad.name,
                creator_eos_id,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eos(s: &str) -> EosId {
        EosId::new(s).unwrap()
    }

    #[test]
    fn identity_eos_id_covers_connect_join_disconnect_only() {
        let connected = Event::PlayerConnected {
            time: chrono::Utc::now(),
            raw: String::new(),
            chain_id: squad_core::ChainId(1),
            controller: "BP_PlayerController_C".to_string(),
            ip: "1.2.3.4".to_string(),
            eos_id: eos("0123456789abcdef0123456789abcdef"),
            steam_id: None,
        };
        assert!(identity_eos_id(&connected).is_some());

        let chat = Event::ChatMessage {
            time: chrono::Utc::now(),
            raw: String::new(),
            channel: squad_core::ChatChannel::ChatAll,
            eos_id: eos("0123456789abcdef0123456789abcdef"),
            steam_id: None,
            name: "Alice".to_string(),
            message: "gg".to_string(),
        };
        assert!(identity_eos_id(&chat).is_none());
    }

    #[tokio::test]
    async fn merge_player_inserts_then_merges_without_clobbering() {
        let tables = Arc::new(RwLock::new(Tables::default()));
        let id = eos("0123456789abcdef0123456789abcdef");

        let mut first = Player::new(id.clone());
        first.name = Some("Alice".to_string());
        merge_player(&tables, first).await;

        let mut second = Player::new(id.clone());
        second.ip = Some("1.2.3.4".to_string());
        merge_player(&tables, second).await;

        let stored = tables.read().await.players.get(&id).cloned().unwrap();
        assert_eq!(stored.name, Some("Alice".to_string()));
        assert_eq!(stored.ip, Some("1.2.3.4".to_string()));
    }
}
