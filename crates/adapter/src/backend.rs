//! Match backend: room lifecycle, state relay, attack relay and leaderboard.
//!
//! [`MatchBackend`] is the contract a battle session talks to. [`InMemoryHub`] is the
//! in-process reference implementation: every connected client holds an [`InMemoryBackend`]
//! handle bound to its own player id, and all handles share one hub.
//!
//! Room records are published on a `watch` channel (latest value wins, consumers overwrite
//! on receipt). Attacks go to a per-player inbox and are consumed once. A room disappears
//! when its host leaves or disconnects; watchers then observe `None`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch, RwLock};

use crate::config::{Config, MIN_PLAYERS};
use crate::core::GameSnapshot;
use crate::protocol::{
    date_from_unix_ms, leaderboard_key, now_ms, AttackRecord, EliminationRecord,
    LeaderboardEntry, PlayerEntry, PlayerId, RoomCode, RoomRecord, RoomStatus,
};
use crate::ready::{Readiness, DEFAULT_READY_TIMEOUT};
use crate::MatchError;

/// Countdown between the host pressing start and the first piece.
pub const START_COUNTDOWN_MS: u64 = 5_000;

/// Attempts for a versioned leaderboard write before giving up.
pub const LEADERBOARD_RETRIES: u32 = 5;

pub type RoomWatch = watch::Receiver<Option<RoomRecord>>;
pub type AttackInbox = mpsc::UnboundedReceiver<AttackRecord>;

/// Operations a battle client needs from the real-time store.
pub trait MatchBackend: Send + Sync + 'static {
    /// Identity of this connection.
    fn player_id(&self) -> &PlayerId;

    /// Create a room hosted by this player. Waits for readiness first.
    async fn create_room(&self, host_name: &str, max_players: u8) -> Result<RoomCode, MatchError>;

    /// Join a waiting room. Waits for readiness first. Leaves no partial state on failure.
    async fn join_room(&self, code: &RoomCode, name: &str) -> Result<RoomRecord, MatchError>;

    /// Leave a room; a leaving host deletes it.
    async fn leave_room(&self, code: &RoomCode) -> Result<(), MatchError>;

    /// Host only. Flips the room to `playing` and returns the countdown target timestamp.
    async fn start_game(&self, code: &RoomCode) -> Result<u64, MatchError>;

    /// Overwrite this player's published snapshot.
    async fn push_state(&self, code: &RoomCode, snapshot: &GameSnapshot) -> Result<(), MatchError>;

    /// Relay `lines` penalty rows to every other player in the room.
    async fn send_attack(&self, code: &RoomCode, lines: u32) -> Result<(), MatchError>;

    /// Record this player's elimination. The first record wins.
    async fn record_elimination(&self, code: &RoomCode, final_score: u32) -> Result<(), MatchError>;

    async fn watch_room(&self, code: &RoomCode) -> Result<RoomWatch, MatchError>;

    /// Inbox of attacks addressed to this player.
    async fn watch_attacks(&self, code: &RoomCode) -> Result<AttackInbox, MatchError>;

    /// Presence loss: host rooms are deleted, memberships are dropped.
    async fn disconnect(&self);

    async fn update_leaderboard(
        &self,
        display_name: &str,
        score: u32,
        won: bool,
    ) -> Result<LeaderboardEntry, MatchError>;

    /// Top entries by best score, highest first.
    async fn leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, MatchError>;
}

struct RoomSlot {
    record: RoomRecord,
    updates: watch::Sender<Option<RoomRecord>>,
    inboxes: HashMap<PlayerId, mpsc::UnboundedSender<AttackRecord>>,
}

impl RoomSlot {
    fn publish(&self) {
        self.updates.send_replace(Some(self.record.clone()));
    }

    fn close(self) {
        self.updates.send_replace(None);
    }
}

#[derive(Debug, Clone)]
struct Versioned<T> {
    version: u64,
    value: T,
}

#[derive(Default)]
struct HubState {
    rooms: HashMap<RoomCode, RoomSlot>,
    leaderboard: HashMap<String, Versioned<LeaderboardEntry>>,
    last_timestamp: u64,
}

impl HubState {
    /// Wall-clock milliseconds, strictly increasing across calls.
    fn server_timestamp(&mut self) -> u64 {
        let ts = now_ms().max(self.last_timestamp + 1);
        self.last_timestamp = ts;
        ts
    }

    fn room(&self, code: &RoomCode) -> Result<&RoomSlot, MatchError> {
        self.rooms
            .get(code)
            .ok_or_else(|| MatchError::RoomNotFound(code.clone()))
    }

    fn room_mut(&mut self, code: &RoomCode) -> Result<&mut RoomSlot, MatchError> {
        self.rooms
            .get_mut(code)
            .ok_or_else(|| MatchError::RoomNotFound(code.clone()))
    }

    /// Drop `player` from `code`, deleting the room if they host it.
    fn remove_player(&mut self, code: &RoomCode, player: &PlayerId) -> Result<(), MatchError> {
        let slot = self.room_mut(code)?;
        if slot.record.is_host(player) {
            if let Some(slot) = self.rooms.remove(code) {
                slot.close();
            }
            tracing::info!(%code, %player, "host left, room deleted");
            return Ok(());
        }
        if slot.record.players.remove(player).is_none() {
            return Err(MatchError::NotInRoom(player.clone(), code.clone()));
        }
        slot.inboxes.remove(player);
        slot.record.current_players = slot.record.current_players.saturating_sub(1);
        slot.publish();
        tracing::info!(%code, %player, "player left room");
        Ok(())
    }
}

/// Shared in-process backend.
#[derive(Clone)]
pub struct InMemoryHub {
    state: Arc<RwLock<HubState>>,
    readiness: Readiness,
    max_players: u8,
    ready_timeout: Duration,
}

impl InMemoryHub {
    /// A hub that is ready immediately and allows rooms of up to `max_players`.
    pub fn new(max_players: u8) -> Self {
        Self::with_readiness(Readiness::new(true), max_players)
    }

    pub fn with_readiness(readiness: Readiness, max_players: u8) -> Self {
        Self {
            state: Arc::new(RwLock::new(HubState::default())),
            readiness,
            max_players: max_players.max(MIN_PLAYERS),
            ready_timeout: DEFAULT_READY_TIMEOUT,
        }
    }

    /// Hub using the configured room size limit and readiness wait.
    pub fn from_config(config: &Config) -> Self {
        Self {
            ready_timeout: config.ready_timeout,
            ..Self::new(config.max_players)
        }
    }

    pub fn readiness(&self) -> &Readiness {
        &self.readiness
    }

    /// New connection with a random player id.
    pub fn connect(&self) -> InMemoryBackend {
        self.connect_as(PlayerId::generate(&mut rand::rng()))
    }

    pub fn connect_as(&self, player_id: PlayerId) -> InMemoryBackend {
        InMemoryBackend {
            hub: self.clone(),
            player_id,
            ready_timeout: self.ready_timeout,
        }
    }

    /// Current record of a room, if it still exists.
    pub async fn room(&self, code: &RoomCode) -> Option<RoomRecord> {
        let state = self.state.read().await;
        state.rooms.get(code).map(|slot| slot.record.clone())
    }

    pub async fn room_count(&self) -> usize {
        self.state.read().await.rooms.len()
    }
}

impl Default for InMemoryHub {
    fn default() -> Self {
        Self::new(4)
    }
}

/// One client's handle on an [`InMemoryHub`].
#[derive(Clone)]
pub struct InMemoryBackend {
    hub: InMemoryHub,
    player_id: PlayerId,
    ready_timeout: Duration,
}

impl InMemoryBackend {
    pub fn with_ready_timeout(mut self, timeout: Duration) -> Self {
        self.ready_timeout = timeout;
        self
    }

    pub fn hub(&self) -> &InMemoryHub {
        &self.hub
    }
}

impl MatchBackend for InMemoryBackend {
    fn player_id(&self) -> &PlayerId {
        &self.player_id
    }

    async fn create_room(&self, host_name: &str, max_players: u8) -> Result<RoomCode, MatchError> {
        self.hub.readiness.wait_ready(self.ready_timeout).await?;
        if !(MIN_PLAYERS..=self.hub.max_players).contains(&max_players) {
            return Err(MatchError::InvalidPlayerLimit {
                requested: max_players,
                min: MIN_PLAYERS,
                max: self.hub.max_players,
            });
        }

        let mut state = self.hub.state.write().await;
        let code = loop {
            let candidate = RoomCode::generate(&mut rand::rng());
            if !state.rooms.contains_key(&candidate) {
                break candidate;
            }
        };
        let created_at = state.server_timestamp();

        let mut record = RoomRecord {
            room_code: code.clone(),
            max_players,
            current_players: 1,
            host_id: self.player_id.clone(),
            host_name: host_name.to_string(),
            status: RoomStatus::Waiting,
            start_timestamp: None,
            created_at,
            players: Default::default(),
            game_states: Default::default(),
            eliminations: Default::default(),
        };
        record.players.insert(
            self.player_id.clone(),
            PlayerEntry {
                name: host_name.to_string(),
                slot: 1,
                ready: true,
                is_host: true,
            },
        );

        let (updates, _rx) = watch::channel(Some(record.clone()));
        state.rooms.insert(
            code.clone(),
            RoomSlot {
                record,
                updates,
                inboxes: HashMap::new(),
            },
        );
        tracing::info!(%code, host = %self.player_id, max_players, "room created");
        Ok(code)
    }

    async fn join_room(&self, code: &RoomCode, name: &str) -> Result<RoomRecord, MatchError> {
        self.hub.readiness.wait_ready(self.ready_timeout).await?;

        let mut state = self.hub.state.write().await;
        let slot = state.room_mut(code)?;
        if slot.record.players.contains_key(&self.player_id) {
            return Ok(slot.record.clone());
        }
        if slot.record.is_full() {
            return Err(MatchError::RoomFull(code.clone()));
        }
        if slot.record.status != RoomStatus::Waiting {
            return Err(MatchError::AlreadyStarted(code.clone()));
        }

        slot.record.current_players += 1;
        let seat = lowest_free_seat(&slot.record);
        slot.record.players.insert(
            self.player_id.clone(),
            PlayerEntry {
                name: name.to_string(),
                slot: seat,
                ready: false,
                is_host: false,
            },
        );
        slot.publish();
        tracing::info!(%code, player = %self.player_id, seat, "player joined room");
        Ok(slot.record.clone())
    }

    async fn leave_room(&self, code: &RoomCode) -> Result<(), MatchError> {
        let mut state = self.hub.state.write().await;
        state.remove_player(code, &self.player_id)
    }

    async fn start_game(&self, code: &RoomCode) -> Result<u64, MatchError> {
        self.hub.readiness.check()?;
        let mut state = self.hub.state.write().await;
        let start = state.server_timestamp() + START_COUNTDOWN_MS;
        let slot = state.room_mut(code)?;
        if !slot.record.is_host(&self.player_id) {
            return Err(MatchError::NotHost(code.clone()));
        }
        if slot.record.status == RoomStatus::Playing {
            return Err(MatchError::AlreadyStarted(code.clone()));
        }
        slot.record.status = RoomStatus::Playing;
        slot.record.start_timestamp = Some(start);
        slot.publish();
        tracing::info!(%code, start, players = slot.record.players.len(), "match started");
        Ok(start)
    }

    async fn push_state(&self, code: &RoomCode, snapshot: &GameSnapshot) -> Result<(), MatchError> {
        let mut state = self.hub.state.write().await;
        let slot = state.room_mut(code)?;
        if !slot.record.players.contains_key(&self.player_id) {
            return Err(MatchError::NotInRoom(self.player_id.clone(), code.clone()));
        }
        slot.record
            .game_states
            .insert(self.player_id.clone(), *snapshot);
        slot.publish();
        Ok(())
    }

    async fn send_attack(&self, code: &RoomCode, lines: u32) -> Result<(), MatchError> {
        if lines == 0 {
            return Ok(());
        }
        let mut state = self.hub.state.write().await;
        let server_timestamp = state.server_timestamp();
        let slot = state.room(code)?;
        let attack = AttackRecord {
            from: self.player_id.clone(),
            penalty_line_count: lines,
            server_timestamp,
        };
        let mut delivered = 0;
        for (player, inbox) in &slot.inboxes {
            if player != &self.player_id && inbox.send(attack.clone()).is_ok() {
                delivered += 1;
            }
        }
        tracing::debug!(%code, from = %self.player_id, lines, delivered, "attack relayed");
        Ok(())
    }

    async fn record_elimination(&self, code: &RoomCode, final_score: u32) -> Result<(), MatchError> {
        let mut state = self.hub.state.write().await;
        let server_timestamp = state.server_timestamp();
        let slot = state.room_mut(code)?;
        if slot.record.eliminations.contains_key(&self.player_id) {
            return Ok(());
        }
        slot.record.eliminations.insert(
            self.player_id.clone(),
            EliminationRecord {
                eliminated: true,
                server_timestamp,
                final_score,
            },
        );
        slot.publish();
        tracing::info!(%code, player = %self.player_id, final_score, "player eliminated");
        Ok(())
    }

    async fn watch_room(&self, code: &RoomCode) -> Result<RoomWatch, MatchError> {
        let state = self.hub.state.read().await;
        Ok(state.room(code)?.updates.subscribe())
    }

    async fn watch_attacks(&self, code: &RoomCode) -> Result<AttackInbox, MatchError> {
        let mut state = self.hub.state.write().await;
        let slot = state.room_mut(code)?;
        if !slot.record.players.contains_key(&self.player_id) {
            return Err(MatchError::NotInRoom(self.player_id.clone(), code.clone()));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        slot.inboxes.insert(self.player_id.clone(), tx);
        Ok(rx)
    }

    async fn disconnect(&self) {
        let mut state = self.hub.state.write().await;
        let codes: Vec<RoomCode> = state
            .rooms
            .iter()
            .filter(|(_, slot)| slot.record.players.contains_key(&self.player_id))
            .map(|(code, _)| code.clone())
            .collect();
        for code in codes {
            // Membership was checked above; nothing to report.
            let _ = state.remove_player(&code, &self.player_id);
        }
        tracing::info!(player = %self.player_id, "disconnected");
    }

    async fn update_leaderboard(
        &self,
        display_name: &str,
        score: u32,
        won: bool,
    ) -> Result<LeaderboardEntry, MatchError> {
        let key = leaderboard_key(display_name);
        for attempt in 1..=LEADERBOARD_RETRIES {
            let current = {
                let state = self.hub.state.read().await;
                state.leaderboard.get(&key).cloned()
            };

            let date = date_from_unix_ms(now_ms());
            let (read_version, next) = match current {
                Some(Versioned { version, mut value }) => {
                    value.record_game(score, won, date);
                    (Some(version), value)
                }
                None => (None, LeaderboardEntry::first_game(display_name, score, won, date)),
            };

            let mut state = self.hub.state.write().await;
            let stored_version = state.leaderboard.get(&key).map(|v| v.version);
            if stored_version != read_version {
                tracing::debug!(%key, attempt, "leaderboard write conflict, retrying");
                continue;
            }
            state.leaderboard.insert(
                key,
                Versioned {
                    version: read_version.map_or(1, |v| v + 1),
                    value: next.clone(),
                },
            );
            return Ok(next);
        }
        tracing::warn!(%key, "leaderboard update gave up");
        Err(MatchError::LeaderboardConflict(key, LEADERBOARD_RETRIES))
    }

    async fn leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, MatchError> {
        let state = self.hub.state.read().await;
        let mut entries: Vec<LeaderboardEntry> =
            state.leaderboard.values().map(|v| v.value.clone()).collect();
        entries.sort_by(|a, b| {
            b.best_score
                .cmp(&a.best_score)
                .then_with(|| a.display_name.cmp(&b.display_name))
        });
        entries.truncate(limit);
        Ok(entries)
    }
}

/// Lowest 1-based seat number not held by anyone on the roster.
fn lowest_free_seat(record: &RoomRecord) -> u8 {
    (1..=u8::MAX)
        .find(|seat| record.players.values().all(|p| p.slot != *seat))
        .unwrap_or(u8::MAX)
}
