//! Engine crate - game sessions and the loops that drive them
//!
//! [`session`] wraps a [`blockfall_core::GameState`] with the per-mode rules that sit
//! outside the pure engine: best-score persistence for practice; countdown gating,
//! attack relay and one-shot elimination for battle.
//!
//! [`runtime`] runs a session against the clock, player input and a
//! [`blockfall_adapter::MatchBackend`].

pub mod runtime;
pub mod session;

pub use blockfall_adapter as adapter;
pub use blockfall_core as core;
pub use blockfall_types as types;

pub use runtime::{run_battle, run_practice, BattleOutcome, Command, LoopConfig};
pub use session::{BattleSession, OpponentView, Outbound, PracticeSession, SessionError};
