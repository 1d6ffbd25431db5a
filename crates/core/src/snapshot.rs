//! Snapshot module - value-type copies of engine state
//!
//! [`GameSnapshot`] is what gets pushed to opponents and rendered as their mini-board. It is
//! a plain value: it shares nothing with the engine it was taken from, and remote copies are
//! only ever rendered, never fed back into a live engine.
//!
//! [`RenderView`] is the borrowed per-frame view consumed by the local renderer.

use serde::{Deserialize, Serialize};

use crate::board::{Board, BoardRows};
use crate::game_state::{ActivePiece, GameState};
use crate::types::{Cell, PieceKind};

/// Point-in-time copy of `{board, score, level, lines, gameOver}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub board: BoardRows,
    pub score: u32,
    pub level: u32,
    #[serde(rename = "lines")]
    pub lines_cleared: u32,
    #[serde(rename = "gameOver")]
    pub is_over: bool,
}

impl GameSnapshot {
    /// Rebuild a read-only board for rendering a remote player.
    pub fn to_board(&self) -> Board {
        Board::from_rows(&self.board)
    }

    pub fn filled_count(&self) -> usize {
        self.board
            .iter()
            .flat_map(|row| row.iter())
            .filter(|c| c.is_filled())
            .count()
    }

    /// Height of the highest filled cell, measured from the floor.
    pub fn stack_height(&self) -> usize {
        self.board
            .iter()
            .position(|row| row.iter().any(Cell::is_filled))
            .map(|top| self.board.len() - top)
            .unwrap_or(0)
    }
}

impl GameState {
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            board: self.board().to_rows(),
            score: self.score(),
            level: self.level(),
            lines_cleared: self.lines(),
            is_over: self.is_over(),
        }
    }
}

/// Per-frame view of a local engine.
#[derive(Debug, Clone, Copy)]
pub struct RenderView<'a> {
    pub board: &'a Board,
    pub active: Option<ActivePiece>,
    pub next: Option<PieceKind>,
    /// Hard-drop landing preview.
    pub ghost: Option<ActivePiece>,
    pub paused: bool,
    pub over: bool,
}
