//! Async drivers for practice and battle sessions.
//!
//! Both drivers are single `tokio::select!` loops meant for a current-thread runtime:
//! one branch per input source (frame tick, snapshot sync, room updates, attacks, player
//! commands). Every branch mutates the session synchronously, then pending backend
//! commands are flushed before the next wakeup, so events are handled in arrival order.

use std::time::Duration;

use blockfall_adapter::protocol::now_ms;
use blockfall_adapter::ranking::Standing;
use blockfall_adapter::{MatchBackend, MatchError, RoomCode};
use blockfall_types::{GameAction, TICK_MS};
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::session::{BattleSession, Outbound, PracticeSession, SessionError};

/// Player input delivered to a running loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Action(GameAction),
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopConfig {
    /// Engine tick period.
    pub tick: Duration,
    /// Snapshot push period (battle only).
    pub sync_interval: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(u64::from(TICK_MS)),
            sync_interval: Duration::from_millis(u64::from(blockfall_types::SYNC_INTERVAL_MS)),
        }
    }
}

impl LoopConfig {
    pub fn from_config(config: &blockfall_adapter::Config) -> Self {
        Self {
            sync_interval: config.sync_interval,
            ..Self::default()
        }
    }

    fn tick_ms(&self) -> u32 {
        u32::try_from(self.tick.as_millis()).unwrap_or(u32::MAX)
    }
}

/// How a battle loop ended.
#[derive(Debug, Clone, PartialEq)]
pub enum BattleOutcome {
    Finished {
        standings: Vec<Standing>,
        rank: Option<u32>,
        score: u32,
        won: bool,
    },
    /// The player quit; the room was left.
    Quit,
}

/// Wall clock that advances with tokio time, so paused-clock tests see the countdown pass.
struct MatchClock {
    base_ms: u64,
    base: Instant,
}

impl MatchClock {
    fn new() -> Self {
        Self {
            base_ms: now_ms(),
            base: Instant::now(),
        }
    }

    fn now_ms(&self) -> u64 {
        let elapsed = u64::try_from(self.base.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.base_ms.saturating_add(elapsed)
    }
}

/// Drive a practice session until the player quits or the command channel closes.
///
/// `on_frame` runs after every state change.
pub async fn run_practice<F>(
    session: &mut PracticeSession,
    commands: &mut mpsc::Receiver<Command>,
    config: LoopConfig,
    mut on_frame: F,
) -> Result<(), SessionError>
where
    F: FnMut(&PracticeSession),
{
    let tick_ms = config.tick_ms();
    let mut ticker = time::interval(config.tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    on_frame(session);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                session.tick(tick_ms)?;
            }
            command = commands.recv() => match command {
                Some(Command::Action(action)) => {
                    session.apply_action(action)?;
                }
                Some(Command::Quit) | None => {
                    debug!("practice loop stopped");
                    return Ok(());
                }
            },
        }
        on_frame(session);
    }
}

/// Drive a battle session through countdown, play and results.
///
/// Returns once the match is decided or the player quits. On a decided match the
/// leaderboard is updated under `display_name` and the result is folded into the local
/// profile (see [`BattleSession::with_profile_store`]). Failed writes are logged and do not
/// change the outcome.
pub async fn run_battle<B, F>(
    backend: &B,
    session: &mut BattleSession,
    display_name: &str,
    commands: &mut mpsc::Receiver<Command>,
    config: LoopConfig,
    mut on_frame: F,
) -> Result<BattleOutcome, SessionError>
where
    B: MatchBackend,
    F: FnMut(&BattleSession, u64),
{
    let code = session.room_code().clone();
    let mut room_rx = backend.watch_room(&code).await?;
    let mut attacks = backend.watch_attacks(&code).await?;
    session.on_room_update(room_rx.borrow_and_update().clone())?;

    let clock = MatchClock::new();
    let tick_ms = config.tick_ms();
    let mut ticker = time::interval(config.tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut sync = time::interval(config.sync_interval);
    sync.set_missed_tick_behavior(MissedTickBehavior::Delay);

    on_frame(session, clock.now_ms());
    while !session.is_finished() {
        tokio::select! {
            _ = ticker.tick() => {
                session.maybe_start(clock.now_ms());
                session.tick(tick_ms);
            }
            _ = sync.tick() => {
                session.sync_snapshot();
            }
            changed = room_rx.changed() => {
                if changed.is_err() {
                    return Err(SessionError::RoomClosed(code));
                }
                let room = room_rx.borrow_and_update().clone();
                session.on_room_update(room)?;
            }
            Some(attack) = attacks.recv() => {
                session.on_attack(&attack);
            }
            command = commands.recv() => match command {
                Some(Command::Action(action)) => {
                    session.apply_action(action);
                }
                Some(Command::Quit) | None => {
                    flush(backend, &code, session).await?;
                    info!(%code, "left battle");
                    match backend.leave_room(&code).await {
                        Ok(()) | Err(MatchError::RoomNotFound(_)) => {}
                        Err(e) => return Err(e.into()),
                    }
                    return Ok(BattleOutcome::Quit);
                }
            },
        }
        flush(backend, &code, session).await?;
        on_frame(session, clock.now_ms());
    }

    let standings = session.standings().map(<[Standing]>::to_vec).unwrap_or_default();
    let score = session.engine().score();
    let won = session.won();
    if let Err(e) = backend.update_leaderboard(display_name, score, won).await {
        warn!(error = %e, "leaderboard update failed");
    }
    if let Err(e) = session.record_profile() {
        warn!(error = %e, "profile update failed");
    }
    Ok(BattleOutcome::Finished {
        rank: session.my_rank(),
        standings,
        score,
        won,
    })
}

async fn flush<B: MatchBackend>(
    backend: &B,
    code: &RoomCode,
    session: &mut BattleSession,
) -> Result<(), SessionError> {
    for command in session.take_outbound() {
        let sent = match command {
            Outbound::PushState(snapshot) => backend.push_state(code, &snapshot).await,
            Outbound::SendAttack(lines) => backend.send_attack(code, lines).await,
            Outbound::RecordElimination(score) => backend.record_elimination(code, score).await,
        };
        match sent {
            Ok(()) => {}
            Err(MatchError::RoomNotFound(code)) => return Err(SessionError::RoomClosed(code)),
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}
