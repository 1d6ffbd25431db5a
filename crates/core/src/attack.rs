//! Attack resolver - battle-mode penalty policy
//!
//! Turns a local line clear into an outgoing penalty and applies incoming penalties to the
//! live board. Clearing `n >= 2` lines sends `n - 1` rows; a single clear sends nothing.

use tracing::debug;

use crate::game_state::GameState;

/// Penalty rows sent for a single lock that cleared `lines` rows.
pub fn penalty_for(lines: u32) -> u32 {
    if lines >= 2 {
        lines - 1
    } else {
        0
    }
}

/// Outgoing penalty produced by a local clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Penalty {
    pub lines: u32,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AttackResolver {
    sent: u32,
    received: u32,
}

impl AttackResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_lines_cleared(&mut self, lines: u32) -> Option<Penalty> {
        let count = penalty_for(lines);
        if count == 0 {
            return None;
        }
        self.sent += count;
        Some(Penalty { lines: count })
    }

    /// Apply an incoming penalty. Returns `false` if it was discarded (game already over).
    pub fn on_attack_received(&mut self, state: &mut GameState, lines: u32) -> bool {
        if state.is_over() {
            debug!(lines, "attack discarded after game over");
            return false;
        }
        let inserted = state.inject_penalty(lines);
        self.received += inserted;
        inserted > 0
    }

    /// Total penalty rows sent this match.
    pub fn sent(&self) -> u32 {
        self.sent
    }

    /// Total penalty rows applied this match.
    pub fn received(&self) -> u32 {
        self.received
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Cell, PieceKind, BOARD_HEIGHT, BOARD_WIDTH};

    #[test]
    fn penalty_table() {
        assert_eq!(penalty_for(0), 0);
        assert_eq!(penalty_for(1), 0);
        assert_eq!(penalty_for(2), 1);
        assert_eq!(penalty_for(3), 2);
        assert_eq!(penalty_for(4), 3);
    }

    #[test]
    fn single_clear_sends_nothing() {
        let mut resolver = AttackResolver::new();
        assert_eq!(resolver.on_lines_cleared(1), None);
        assert_eq!(resolver.on_lines_cleared(4), Some(Penalty { lines: 3 }));
        assert_eq!(resolver.sent(), 3);
    }

    #[test]
    fn penalty_on_prefilled_board() {
        let mut state = GameState::with_seed(21);
        state.start();
        let color = PieceKind::L.color();
        for y in 15..BOARD_HEIGHT as i8 {
            for x in 0..BOARD_WIDTH as i8 - 1 {
                state.board_mut().set(x, y, Cell::Filled(color));
            }
        }
        let before = state.board().clone();

        let mut resolver = AttackResolver::new();
        assert!(resolver.on_attack_received(&mut state, 3));
        assert_eq!(resolver.received(), 3);

        let board = state.board();
        assert_eq!(board.height(), BOARD_HEIGHT);
        // Old rows moved up by three.
        for y in 12..17 {
            assert_eq!(board.row(y), before.row(y + 3));
        }
        for y in 17..BOARD_HEIGHT as usize {
            assert_eq!(board.row(y).iter().filter(|c| c.is_empty()).count(), 1);
        }
        assert_eq!(state.score(), 0);
    }

    #[test]
    fn discarded_after_game_over() {
        let mut state = GameState::with_seed(21);
        state.start();
        for x in 1..BOARD_WIDTH as i8 {
            for y in 0..4 {
                state.board_mut().set(x, y, Cell::Filled(PieceKind::T.color()));
            }
        }
        // Piece already overlaps, so the next lock ends the game.
        state.hard_drop();
        assert!(state.is_over());
        let board = state.board().clone();

        let mut resolver = AttackResolver::new();
        assert!(!resolver.on_attack_received(&mut state, 2));
        assert_eq!(state.board(), &board);
        assert_eq!(resolver.received(), 0);
    }
}
