//! Session objects: the explicit per-game context for practice and battle play.
//!
//! A session owns exactly one engine. It drains the engine's events after every operation
//! and turns them into side effects: persistence for practice, outbound backend commands
//! for battle. Nothing here performs I/O against the backend; the runtime flushes
//! [`Outbound`] commands.

use blockfall_adapter::ranking::{rank_of, rank_players, Standing};
use blockfall_adapter::store::{load_best_score, update_best_score};
use blockfall_adapter::{
    AttackRecord, KeyValueStore, MatchError, PlayerId, RoomCode, RoomRecord, RoomStatus,
    StoreError, UserProfile,
};
use blockfall_core::{AttackResolver, EngineConfig, GameSnapshot, GameState, RenderView};
use blockfall_types::{EngineStatus, FinalStats, GameAction, GameEvent};
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Match(#[from] MatchError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// The room vanished mid-match (host left). Not resumable.
    #[error("room {0} was closed")]
    RoomClosed(RoomCode),
}

/// Single-player session with local best-score persistence.
pub struct PracticeSession {
    engine: GameState,
    store: Box<dyn KeyValueStore>,
    profile: Option<UserProfile>,
    best_score: u32,
    last_result: Option<FinalStats>,
}

impl PracticeSession {
    /// Load the profile and best score, then build an idle engine.
    pub fn new(seed: Option<u64>, store: Box<dyn KeyValueStore>) -> Result<Self, SessionError> {
        let best_score = load_best_score(store.as_ref())?;
        let profile = UserProfile::load(store.as_ref())?;
        Ok(Self {
            engine: GameState::new(EngineConfig::practice(seed)),
            store,
            profile,
            best_score,
            last_result: None,
        })
    }

    pub fn engine(&self) -> &GameState {
        &self.engine
    }

    pub fn render_view(&self) -> RenderView<'_> {
        self.engine.render_view()
    }

    pub fn best_score(&self) -> u32 {
        self.best_score
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    /// Stats of the most recently finished game.
    pub fn last_result(&self) -> Option<FinalStats> {
        self.last_result
    }

    pub fn apply_action(&mut self, action: GameAction) -> Result<bool, SessionError> {
        let accepted = self.engine.apply_action(action);
        self.pump()?;
        Ok(accepted)
    }

    pub fn tick(&mut self, elapsed_ms: u32) -> Result<u32, SessionError> {
        let drops = self.engine.tick(elapsed_ms);
        self.pump()?;
        Ok(drops)
    }

    fn pump(&mut self) -> Result<(), SessionError> {
        for event in self.engine.take_events() {
            if let GameEvent::GameOver(stats) = event {
                self.finish(stats)?;
            }
        }
        Ok(())
    }

    fn finish(&mut self, stats: FinalStats) -> Result<(), SessionError> {
        self.last_result = Some(stats);
        if update_best_score(self.store.as_mut(), stats.score)? {
            self.best_score = stats.score;
        }
        if let Some(profile) = self.profile.as_mut() {
            profile.record_game(stats.score, false);
            profile.save(self.store.as_mut())?;
        }
        Ok(())
    }
}

/// Command for the backend, produced by a battle session.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    PushState(GameSnapshot),
    SendAttack(u32),
    RecordElimination(u32),
}

/// Read-only view of one opponent, rebuilt from the last room record.
#[derive(Debug, Clone, PartialEq)]
pub struct OpponentView {
    pub player: PlayerId,
    pub name: String,
    pub snapshot: Option<GameSnapshot>,
    pub eliminated: bool,
}

/// Per-match context for battle mode.
pub struct BattleSession {
    engine: GameState,
    resolver: AttackResolver,
    room_code: RoomCode,
    me: PlayerId,
    /// Last received record; replaced on every update, never merged.
    room: Option<RoomRecord>,
    eliminated: bool,
    standings: Option<Vec<Standing>>,
    outbound: Vec<Outbound>,
    /// Where the local profile lives, if the result should be folded into it.
    profile_store: Option<Box<dyn KeyValueStore>>,
    profile_recorded: bool,
}

impl BattleSession {
    pub fn new(room_code: RoomCode, me: PlayerId, seed: Option<u64>) -> Self {
        Self {
            engine: GameState::new(EngineConfig::battle(seed)),
            resolver: AttackResolver::new(),
            room_code,
            me,
            room: None,
            eliminated: false,
            standings: None,
            outbound: Vec::new(),
            profile_store: None,
            profile_recorded: false,
        }
    }

    /// Record the match result in the profile held by `store` once the match ends.
    pub fn with_profile_store(mut self, store: Box<dyn KeyValueStore>) -> Self {
        self.profile_store = Some(store);
        self
    }

    pub fn engine(&self) -> &GameState {
        &self.engine
    }

    pub fn render_view(&self) -> RenderView<'_> {
        self.engine.render_view()
    }

    pub fn room_code(&self) -> &RoomCode {
        &self.room_code
    }

    pub fn player_id(&self) -> &PlayerId {
        &self.me
    }

    pub fn room(&self) -> Option<&RoomRecord> {
        self.room.as_ref()
    }

    pub fn resolver(&self) -> &AttackResolver {
        &self.resolver
    }

    pub fn is_eliminated(&self) -> bool {
        self.eliminated
    }

    pub fn is_finished(&self) -> bool {
        self.standings.is_some()
    }

    pub fn standings(&self) -> Option<&[Standing]> {
        self.standings.as_deref()
    }

    /// Final rank of the local player once the match is over.
    pub fn my_rank(&self) -> Option<u32> {
        self.standings
            .as_deref()
            .and_then(|s| rank_of(s, &self.me))
    }

    pub fn won(&self) -> bool {
        self.my_rank() == Some(1)
    }

    /// Countdown target, once the host has started the match.
    pub fn start_at(&self) -> Option<u64> {
        self.room
            .as_ref()
            .filter(|r| r.status == RoomStatus::Playing)
            .map(|r| r.start_timestamp.unwrap_or(0))
    }

    /// Apply a room update. `None` means the room was deleted, which ends the session.
    pub fn on_room_update(&mut self, room: Option<RoomRecord>) -> Result<(), SessionError> {
        let Some(room) = room else {
            warn!(code = %self.room_code, "room closed during match");
            self.room = None;
            return Err(SessionError::RoomClosed(self.room_code.clone()));
        };

        let match_over = self.engine.status() != EngineStatus::Idle && room.is_match_over();
        self.room = Some(room);
        if match_over && self.standings.is_none() {
            if let Some(room) = self.room.as_ref() {
                let standings = rank_players(room);
                info!(code = %self.room_code, rank = ?rank_of(&standings, &self.me), "match finished");
                self.standings = Some(standings);
            }
        }
        Ok(())
    }

    /// Start the local engine once the room is playing and the countdown has elapsed.
    pub fn maybe_start(&mut self, now_ms: u64) -> bool {
        if self.engine.status() != EngineStatus::Idle {
            return false;
        }
        match self.start_at() {
            Some(start_at) if now_ms >= start_at => {
                let started = self.engine.start();
                self.pump();
                started
            }
            _ => false,
        }
    }

    /// Seconds left in the countdown, if one is running.
    pub fn countdown_secs(&self, now_ms: u64) -> Option<u64> {
        if self.engine.status() != EngineStatus::Idle {
            return None;
        }
        self.start_at()
            .filter(|&at| at > now_ms)
            .map(|at| (at - now_ms).div_ceil(1000))
    }

    /// Player input. Battle mode has no pause and no manual restart.
    pub fn apply_action(&mut self, action: GameAction) -> bool {
        if matches!(action, GameAction::Pause | GameAction::Start) {
            return false;
        }
        let accepted = self.engine.apply_action(action);
        self.pump();
        accepted
    }

    pub fn tick(&mut self, elapsed_ms: u32) -> u32 {
        let drops = self.engine.tick(elapsed_ms);
        self.pump();
        drops
    }

    /// Incoming attack. Own attacks and anything after elimination are ignored.
    pub fn on_attack(&mut self, attack: &AttackRecord) -> bool {
        if attack.from == self.me || self.eliminated {
            return false;
        }
        let applied = self
            .resolver
            .on_attack_received(&mut self.engine, attack.penalty_line_count);
        if applied {
            debug!(from = %attack.from, lines = attack.penalty_line_count, "attack received");
        }
        self.pump();
        applied
    }

    /// Queue a snapshot push. Skipped once the local game is over.
    pub fn sync_snapshot(&mut self) {
        if self.engine.status() == EngineStatus::Running {
            self.outbound.push(Outbound::PushState(self.engine.snapshot()));
        }
    }

    /// Fold the finished match into the stored profile. Runs at most once; returns the
    /// updated profile, or `None` when there is nothing to record.
    pub fn record_profile(&mut self) -> Result<Option<UserProfile>, SessionError> {
        if self.profile_recorded || !self.is_finished() {
            return Ok(None);
        }
        let (score, won) = (self.engine.score(), self.won());
        let Some(store) = self.profile_store.as_mut() else {
            return Ok(None);
        };
        let Some(mut profile) = UserProfile::load(store.as_ref())? else {
            return Ok(None);
        };
        profile.record_game(score, won);
        profile.save(store.as_mut())?;
        self.profile_recorded = true;
        debug!(games = profile.stats.total_games, wins = profile.stats.total_wins, "profile updated");
        Ok(Some(profile))
    }

    pub fn take_outbound(&mut self) -> Vec<Outbound> {
        std::mem::take(&mut self.outbound)
    }

    /// Opponents from the last room record, in roster order.
    pub fn opponents(&self) -> Vec<OpponentView> {
        let Some(room) = self.room.as_ref() else {
            return Vec::new();
        };
        room.opponents(&self.me)
            .map(|(id, entry)| OpponentView {
                player: id.clone(),
                name: entry.name.clone(),
                snapshot: room.game_states.get(id).copied(),
                eliminated: room.is_eliminated(id),
            })
            .collect()
    }

    fn pump(&mut self) {
        for event in self.engine.take_events() {
            self.handle_event(event);
        }
    }

    fn handle_event(&mut self, event: GameEvent) {
        match event {
            GameEvent::LinesCleared { count } => {
                if let Some(penalty) = self.resolver.on_lines_cleared(count) {
                    info!(lines = penalty.lines, "attack sent");
                    self.outbound.push(Outbound::SendAttack(penalty.lines));
                }
            }
            GameEvent::GameOver(stats) => {
                if !self.eliminated {
                    self.eliminated = true;
                    // Final board goes out with the elimination.
                    self.outbound.push(Outbound::PushState(self.engine.snapshot()));
                    self.outbound.push(Outbound::RecordElimination(stats.score));
                }
            }
            _ => {}
        }
    }
}
