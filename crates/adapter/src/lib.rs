//! Adapter crate - everything the game talks to outside the engine
//!
//! The engine itself is pure; this crate holds the contracts and reference
//! implementations of its external collaborators.
//!
//! # Components
//!
//! - [`backend`]: the [`MatchBackend`] contract (rooms, snapshot relay, attack relay,
//!   eliminations, leaderboard) and the in-process [`InMemoryHub`]
//! - [`protocol`]: wire records and the JSON codec; room codes are 6 characters of `[A-Z0-9]`
//! - [`ready`]: backend readiness signal with a bounded wait
//! - [`ranking`]: final standings from elimination records
//! - [`store`]: key-value persistence, user profile and practice best score
//! - [`config`]: `BLOCKFALL_*` environment configuration
//!
//! # Environment Variables
//!
//! - `BLOCKFALL_DATA_DIR`: store directory (default: ".blockfall")
//! - `BLOCKFALL_SEED`: fixed piece seed
//! - `BLOCKFALL_SYNC_MS`: snapshot push period (default: 200)
//! - `BLOCKFALL_READY_TIMEOUT_MS`: readiness wait ceiling (default: 5000)
//! - `BLOCKFALL_MAX_PLAYERS`: largest room size (default: 4)
//! - `BLOCKFALL_LOG_PATH`: log file
//!
//! # Example Room Record
//!
//! ```text
//! {"roomCode":"K3X9QA","maxPlayers":2,"currentPlayers":2,"hostId":"p1f…","hostName":"kim#4821",
//!  "status":"playing","startTimestamp":1718000005000,"createdAt":1718000000000,
//!  "players":{…},"gameStates":{"p1f…":{"board":[[null,…],…],"score":300,"level":1,"lines":2,"gameOver":false}},
//!  "eliminations":{}}
//! ```

#![allow(async_fn_in_trait)]

pub mod backend;
pub mod config;
mod error;
pub mod protocol;
pub mod ranking;
pub mod ready;
pub mod store;

pub use blockfall_core as core;
pub use blockfall_types as types;

pub use backend::{AttackInbox, InMemoryBackend, InMemoryHub, MatchBackend, RoomWatch};
pub use config::Config;
pub use error::{MatchError, StoreError};
pub use protocol::{
    AttackRecord, EliminationRecord, LeaderboardEntry, PlayerEntry, PlayerId, RoomCode,
    RoomRecord, RoomStatus,
};
pub use ranking::{rank_players, Standing};
pub use ready::Readiness;
pub use store::{FileStore, KeyValueStore, MemoryStore, UserProfile, UserStats};
