//! Protocol module - wire types for the match backend
//!
//! All records are JSON with camelCase field names. Room codes travel as their 6-character
//! string, player ids as opaque strings, snapshots as `{board, score, level, lines, gameOver}`
//! where every board cell is `null` or `"#rrggbb"`.

use std::collections::BTreeMap;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::core::GameSnapshot;
use crate::MatchError;

/// Room code length.
pub const ROOM_CODE_LEN: usize = 6;

const ROOM_CODE_ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Six characters from `[A-Z0-9]`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    /// Random code. Uniqueness is not guaranteed, the backend re-rolls on collision.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let code = (0..ROOM_CODE_LEN)
            .map(|_| ROOM_CODE_ALPHABET[rng.random_range(0..ROOM_CODE_ALPHABET.len())] as char)
            .collect();
        Self(code)
    }

    /// Parse user input: trimmed, upper-cased, then validated.
    pub fn parse(input: &str) -> Result<Self, MatchError> {
        let code = input.trim().to_ascii_uppercase();
        let valid = code.len() == ROOM_CODE_LEN
            && code.bytes().all(|b| ROOM_CODE_ALPHABET.contains(&b));
        if !valid {
            return Err(MatchError::InvalidRoomCode(input.to_string()));
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RoomCode {
    type Error = MatchError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RoomCode> for String {
    fn from(value: RoomCode) -> Self {
        value.0
    }
}

/// Opaque player identity assigned by the backend connection.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self(format!("p{:016x}", rng.random::<u64>()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Waiting,
    Playing,
}

/// Roster entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerEntry {
    pub name: String,
    /// 1-based join order.
    pub slot: u8,
    pub ready: bool,
    pub is_host: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EliminationRecord {
    pub eliminated: bool,
    pub server_timestamp: u64,
    pub final_score: u32,
}

/// Relayed penalty, delivered once to every player except the sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttackRecord {
    pub from: PlayerId,
    pub penalty_line_count: u32,
    pub server_timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomRecord {
    pub room_code: RoomCode,
    pub max_players: u8,
    pub current_players: u8,
    pub host_id: PlayerId,
    pub host_name: String,
    pub status: RoomStatus,
    /// Countdown target once the host starts the match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_timestamp: Option<u64>,
    pub created_at: u64,
    #[serde(default)]
    pub players: BTreeMap<PlayerId, PlayerEntry>,
    #[serde(default)]
    pub game_states: BTreeMap<PlayerId, GameSnapshot>,
    #[serde(default)]
    pub eliminations: BTreeMap<PlayerId, EliminationRecord>,
}

impl RoomRecord {
    pub fn is_full(&self) -> bool {
        self.current_players >= self.max_players
    }

    pub fn is_host(&self, player: &PlayerId) -> bool {
        &self.host_id == player
    }

    /// Everyone on the roster except `me`.
    pub fn opponents<'a>(
        &'a self,
        me: &'a PlayerId,
    ) -> impl Iterator<Item = (&'a PlayerId, &'a PlayerEntry)> + 'a {
        self.players.iter().filter(move |(id, _)| *id != me)
    }

    pub fn is_eliminated(&self, player: &PlayerId) -> bool {
        self.eliminations
            .get(player)
            .is_some_and(|record| record.eliminated)
    }

    /// Players on the roster without an elimination record.
    pub fn survivors(&self) -> impl Iterator<Item = &PlayerId> + '_ {
        self.players.keys().filter(|id| !self.is_eliminated(id))
    }

    /// At most one player on the roster is left standing. Eliminated players who have
    /// since left the room do not count.
    pub fn is_match_over(&self) -> bool {
        !self.players.is_empty() && self.survivors().count() <= 1
    }
}

/// Per-player leaderboard record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub display_name: String,
    pub best_score: u32,
    pub total_games: u32,
    pub total_wins: u32,
    /// Rounded percentage.
    pub win_rate: u32,
    /// `YYYY-MM-DD` (UTC).
    pub last_played_date: String,
}

impl LeaderboardEntry {
    pub fn first_game(display_name: &str, score: u32, won: bool, date: String) -> Self {
        Self {
            display_name: display_name.to_string(),
            best_score: score,
            total_games: 1,
            total_wins: u32::from(won),
            win_rate: if won { 100 } else { 0 },
            last_played_date: date,
        }
    }

    /// Fold one completed game into the record.
    pub fn record_game(&mut self, score: u32, won: bool, date: String) {
        self.total_games += 1;
        if won {
            self.total_wins += 1;
        }
        self.win_rate = win_rate(self.total_wins, self.total_games);
        self.best_score = self.best_score.max(score);
        self.last_played_date = date;
    }
}

/// `round(wins / games * 100)`.
pub fn win_rate(wins: u32, games: u32) -> u32 {
    if games == 0 {
        return 0;
    }
    ((wins as f64 / games as f64) * 100.0).round() as u32
}

/// Leaderboard key for a display name (`#` is not allowed in keys).
pub fn leaderboard_key(display_name: &str) -> String {
    display_name.replace('#', "_")
}

/// Milliseconds since the Unix epoch.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// `YYYY-MM-DD` for a Unix timestamp in milliseconds (UTC).
pub fn date_from_unix_ms(ms: u64) -> String {
    let days = (ms / 86_400_000) as i64;
    // Days-to-civil conversion over 400-year eras.
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + i64::from(month <= 2);
    format!("{year:04}-{month:02}-{day:02}")
}

pub fn encode<T: Serialize>(value: &T) -> Result<String, MatchError> {
    Ok(serde_json::to_string(value)?)
}

pub fn decode<T: DeserializeOwned>(text: &str) -> Result<T, MatchError> {
    Ok(serde_json::from_str(text)?)
}

pub fn encode_snapshot(snapshot: &GameSnapshot) -> Result<String, MatchError> {
    encode(snapshot)
}

pub fn decode_snapshot(text: &str) -> Result<GameSnapshot, MatchError> {
    decode(text)
}
