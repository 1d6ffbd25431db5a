//! Error types for the match backend and persistence layers.
//!
//! Every variant renders as a message that can be shown to the player directly.

use std::time::Duration;

use crate::protocol::{PlayerId, RoomCode};

/// Errors that can occur during match backend operations.
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    /// User input that is not a valid room code.
    #[error("invalid room code {0:?}: expected 6 characters A-Z or 0-9")]
    InvalidRoomCode(String),

    #[error("room {0} not found")]
    RoomNotFound(RoomCode),

    #[error("room {0} is full")]
    RoomFull(RoomCode),

    #[error("room {0} has already started")]
    AlreadyStarted(RoomCode),

    #[error("player {0} is not in room {1}")]
    NotInRoom(PlayerId, RoomCode),

    /// Only the host may start a match.
    #[error("only the host can start room {0}")]
    NotHost(RoomCode),

    #[error("room size must be between {min} and {max} players, got {requested}")]
    InvalidPlayerLimit { requested: u8, min: u8, max: u8 },

    /// The backend did not become ready within the wait ceiling.
    #[error("match backend not ready after {0:?}, please retry")]
    BackendNotReady(Duration),

    /// The host left and the room was deleted.
    #[error("room {0} was closed by the host")]
    RoomClosed(RoomCode),

    /// Versioned leaderboard write kept losing the race.
    #[error("leaderboard update for {0} conflicted {1} times")]
    LeaderboardConflict(String, u32),

    #[error("wire codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Errors from the local key-value store and user profile handling.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored record is malformed: {0}")]
    Codec(#[from] serde_json::Error),

    /// Nickname shorter than the minimum after trimming.
    #[error("nickname must be at least {min} characters")]
    NicknameTooShort { min: usize },

    #[error("invalid storage key {0:?}")]
    InvalidKey(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_user_facing() {
        let code = RoomCode::parse("abc123").unwrap();
        assert_eq!(MatchError::RoomFull(code.clone()).to_string(), "room ABC123 is full");
        assert_eq!(
            MatchError::AlreadyStarted(code).to_string(),
            "room ABC123 has already started"
        );
        assert_eq!(
            StoreError::NicknameTooShort { min: 2 }.to_string(),
            "nickname must be at least 2 characters"
        );
    }
}
