//! Core game logic - pure, deterministic, and testable
//!
//! This crate contains the game rules, the engine state machine and the battle-mode penalty
//! policy. It has no dependency on UI, networking or I/O, making it:
//!
//! - **Deterministic**: same seed produces identical piece sequences and penalty holes
//! - **Testable**: every rule is covered by unit tests next to the code
//! - **Portable**: runs in the terminal front end, the battle session and benches alike
//!
//! # Module Structure
//!
//! - [`pieces`]: the seven-piece catalog, shape matrices and clockwise rotation
//! - [`board`]: 10x20 grid with collision queries, line clearing and penalty rows
//! - [`scoring`]: line clear points, level formula and drop interval table
//! - [`timer`]: deterministic drop timer
//! - [`rng`]: seeded uniform piece generator with a fair opener
//! - [`game_state`]: the engine (`Idle -> Running <-> Paused -> GameOver`)
//! - [`snapshot`]: value-type snapshots and the per-frame render view
//! - [`attack`]: battle-mode penalty policy
//!
//! # Game Rules
//!
//! - **Uniform draws**: every piece after the first is an independent uniform draw
//! - **Simple rotation**: a rotation that collides is rejected, there is no kick table
//! - **Immediate lock**: a piece locks as soon as it cannot move down
//! - **Scoring**: 100/300/500/800 for 1-4 lines, times the current level
//! - **Levels**: `lines / 10 + 1`, each level shortens the drop interval
//!
//! # Example
//!
//! ```
//! use blockfall_core::GameState;
//! use blockfall_types::GameAction;
//!
//! let mut game = GameState::with_seed(12345);
//! game.start();
//!
//! game.apply_action(GameAction::MoveRight);
//! game.apply_action(GameAction::Rotate);
//! game.apply_action(GameAction::HardDrop);
//!
//! assert_eq!(game.board().filled_count(), 4);
//! ```
//!
//! # Timing
//!
//! Call [`GameState::tick`](game_state::GameState::tick) every frame with the elapsed time;
//! the engine performs one automatic drop per elapsed drop interval.

pub mod attack;
pub mod board;
pub mod game_state;
pub mod pieces;
pub mod rng;
pub mod scoring;
pub mod snapshot;
pub mod timer;

pub use blockfall_types as types;

// Re-export commonly used types for convenience
pub use attack::{penalty_for, AttackResolver, Penalty};
pub use board::{Board, BoardRows};
pub use game_state::{ActivePiece, EngineConfig, GameState};
pub use pieces::{definition, get_shape, Shape, FAIR_OPENERS};
pub use rng::PieceGenerator;
pub use scoring::{calculate_score, drop_interval_ms, level_for_lines, ScoreResult};
pub use snapshot::{GameSnapshot, RenderView};
pub use timer::DropTimer;
