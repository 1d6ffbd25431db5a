//! Game state module - the engine state machine
//!
//! This module ties together the board, piece catalog, piece generator, scoring and the drop
//! timer. It owns exactly one board and one active piece and is driven by discrete, atomic
//! operations: player actions and [`GameState::tick`].
//!
//! ```text
//! Idle --start--> Running <--pause--> Paused
//!                    |
//!                    v
//!                 GameOver --start--> Running
//! ```
//!
//! While paused or over, every operation except `pause()` and `start()` is rejected and
//! returns `false` without touching state.

use tracing::{debug, info};

use crate::board::Board;
use crate::pieces::{definition, spawn_origin, CellOffsets, Shape};
use crate::rng::PieceGenerator;
use crate::scoring::{calculate_score, drop_interval_ms};
use crate::snapshot::RenderView;
use crate::timer::DropTimer;
use crate::types::{ColorToken, EngineStatus, FinalStats, GameAction, GameEvent, PieceKind};

/// Active falling piece
///
/// Owns its own copy of the shape matrix; rotating it never touches the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActivePiece {
    pub kind: PieceKind,
    pub shape: Shape,
    pub color: ColorToken,
    /// Top-left anchor column.
    pub x: i8,
    /// Top-left anchor row; may be negative while spawning.
    pub y: i8,
}

impl ActivePiece {
    /// Create a piece at its spawn position
    pub fn spawn(kind: PieceKind) -> Self {
        let def = definition(kind);
        let (x, y) = spawn_origin(&def.shape);
        Self {
            kind,
            shape: def.shape,
            color: def.color,
            x,
            y,
        }
    }

    /// Absolute board coordinates of every filled cell.
    pub fn cells(&self) -> CellOffsets {
        self.shape
            .cells()
            .iter()
            .map(|&(dx, dy)| (self.x + dx, self.y + dy))
            .collect()
    }

    pub fn collides(&self, board: &Board) -> bool {
        self.cells().iter().any(|&(x, y)| board.is_occupied(x, y))
    }

    pub fn shifted(&self, dx: i8, dy: i8) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    pub fn rotated(&self) -> Self {
        Self {
            shape: self.shape.rotated_cw(),
            ..*self
        }
    }

    /// Shift down until the next row would collide.
    pub fn dropped(&self, board: &Board) -> Self {
        let mut piece = *self;
        loop {
            let below = piece.shifted(0, 1);
            if below.collides(board) {
                return piece;
            }
            piece = below;
        }
    }
}

/// Construction options for an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EngineConfig {
    /// Piece generator seed; `None` seeds from entropy.
    pub seed: Option<u64>,
    /// Draw the first piece of every game from the fair opener subset.
    pub fair_opener: bool,
}

impl EngineConfig {
    pub fn practice(seed: Option<u64>) -> Self {
        Self {
            seed,
            fair_opener: false,
        }
    }

    pub fn battle(seed: Option<u64>) -> Self {
        Self {
            seed,
            fair_opener: true,
        }
    }
}

/// Complete game state
#[derive(Debug, Clone)]
pub struct GameState {
    board: Board,
    active: Option<ActivePiece>,
    next: Option<PieceKind>,
    generator: PieceGenerator,
    fair_opener: bool,
    score: u32,
    level: u32,
    lines: u32,
    status: EngineStatus,
    timer: DropTimer,
    final_stats: Option<FinalStats>,
    /// Pending notifications, drained by the owner.
    events: Vec<GameEvent>,
}

impl GameState {
    pub fn new(config: EngineConfig) -> Self {
        let generator = match config.seed {
            Some(seed) => PieceGenerator::new(seed),
            None => PieceGenerator::from_entropy(),
        };
        Self {
            board: Board::new(),
            active: None,
            next: None,
            generator,
            fair_opener: config.fair_opener,
            score: 0,
            level: 1,
            lines: 0,
            status: EngineStatus::Idle,
            timer: DropTimer::default(),
            final_stats: None,
            events: Vec::new(),
        }
    }

    /// Seeded practice engine.
    pub fn with_seed(seed: u64) -> Self {
        Self::new(EngineConfig::practice(Some(seed)))
    }

    /// Start (or restart after game over) with a fresh board and counters.
    ///
    /// Returns `false` if the engine is already running or paused.
    pub fn start(&mut self) -> bool {
        if !self.status.can_start() {
            return false;
        }

        self.board.clear();
        self.score = 0;
        self.level = 1;
        self.lines = 0;
        self.final_stats = None;

        let first = if self.fair_opener {
            self.generator.opener()
        } else {
            self.generator.draw()
        };
        self.next = Some(self.generator.draw());
        self.active = Some(ActivePiece::spawn(first));

        self.status = EngineStatus::Running;
        self.timer.start(drop_interval_ms(self.level));
        self.events.push(GameEvent::Started);
        info!(seed = self.generator.seed(), first = first.as_str(), "game started");
        true
    }

    pub fn status(&self) -> EngineStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == EngineStatus::Running
    }

    pub fn is_paused(&self) -> bool {
        self.status.is_paused()
    }

    pub fn is_over(&self) -> bool {
        self.status.is_over()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn lines(&self) -> u32 {
        self.lines
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    #[cfg(test)]
    pub(crate) fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    #[cfg(test)]
    pub(crate) fn set_active(&mut self, piece: ActivePiece) {
        self.active = Some(piece);
    }

    pub fn active(&self) -> Option<ActivePiece> {
        self.active
    }

    pub fn next(&self) -> Option<PieceKind> {
        self.next
    }

    pub fn seed(&self) -> u64 {
        self.generator.seed()
    }

    /// Current automatic drop interval (derived from level).
    pub fn drop_interval_ms(&self) -> u32 {
        drop_interval_ms(self.level)
    }

    pub fn timer(&self) -> &DropTimer {
        &self.timer
    }

    /// Stats captured at the terminal transition.
    pub fn final_stats(&self) -> Option<FinalStats> {
        self.final_stats
    }

    /// Current counters as a stats value.
    pub fn stats(&self) -> FinalStats {
        FinalStats {
            score: self.score,
            level: self.level,
            lines: self.lines,
        }
    }

    /// Drain queued notifications in emission order.
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn move_left(&mut self) -> bool {
        self.try_shift(-1)
    }

    pub fn move_right(&mut self) -> bool {
        self.try_shift(1)
    }

    fn try_shift(&mut self, dx: i8) -> bool {
        if !self.is_running() {
            return false;
        }
        let Some(active) = self.active else {
            return false;
        };
        let moved = active.shifted(dx, 0);
        if moved.collides(&self.board) {
            return false;
        }
        self.active = Some(moved);
        true
    }

    /// Move down one row; on collision lock, clear and spawn instead.
    ///
    /// Returns `true` if the piece moved.
    pub fn move_down(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        let Some(active) = self.active else {
            return false;
        };
        let moved = active.shifted(0, 1);
        if moved.collides(&self.board) {
            self.lock_active();
            return false;
        }
        self.active = Some(moved);
        true
    }

    /// Drop to the landing row and lock once.
    ///
    /// Returns the number of rows travelled, or `None` if rejected.
    pub fn hard_drop(&mut self) -> Option<u32> {
        if !self.is_running() {
            return None;
        }
        let active = self.active?;
        let landed = active.dropped(&self.board);
        self.active = Some(landed);
        self.lock_active();
        Some((landed.y - active.y) as u32)
    }

    /// Rotate clockwise in place; rejected (no kicks) if the result collides.
    pub fn rotate(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        let Some(active) = self.active else {
            return false;
        };
        let rotated = active.rotated();
        if rotated.collides(&self.board) {
            return false;
        }
        self.active = Some(rotated);
        true
    }

    /// Toggle pause. The drop interval restarts fresh on resume.
    pub fn pause(&mut self) -> bool {
        let paused = match self.status {
            EngineStatus::Running => {
                self.status = EngineStatus::Paused;
                self.timer.stop();
                true
            }
            EngineStatus::Paused => {
                self.status = EngineStatus::Running;
                self.timer.start(drop_interval_ms(self.level));
                false
            }
            EngineStatus::Idle | EngineStatus::GameOver => return false,
        };
        self.events.push(GameEvent::PauseChanged { paused });
        true
    }

    /// Advance the drop timer and perform one `move_down` per elapsed interval.
    ///
    /// Stops early when the engine leaves `Running` or a level-up restarts the timer.
    /// Returns the number of automatic drops performed.
    pub fn tick(&mut self, elapsed_ms: u32) -> u32 {
        if !self.is_running() {
            return 0;
        }
        self.timer.advance(elapsed_ms);
        let mut drops = 0;
        while self.is_running() && self.timer.fire() {
            self.move_down();
            drops += 1;
        }
        drops
    }

    /// Apply a game action
    pub fn apply_action(&mut self, action: GameAction) -> bool {
        match action {
            GameAction::MoveLeft => self.move_left(),
            GameAction::MoveRight => self.move_right(),
            GameAction::MoveDown => self.move_down(),
            GameAction::HardDrop => self.hard_drop().is_some(),
            GameAction::Rotate => self.rotate(),
            GameAction::Pause => self.pause(),
            GameAction::Start => self.start(),
        }
    }

    /// Inject `count` penalty rows at the bottom of the live board.
    ///
    /// Discarded once the game is over. Score, level and the active piece are untouched.
    /// Returns the number of rows inserted.
    pub fn inject_penalty(&mut self, count: u32) -> u32 {
        if self.is_over() || count == 0 {
            return 0;
        }
        let inserted = self
            .board
            .insert_penalty_rows(count as usize, self.generator.rng_mut()) as u32;
        self.events.push(GameEvent::PenaltyReceived { count: inserted });
        inserted
    }

    /// Row the active piece would land on after a hard drop.
    pub fn ghost_y(&self) -> Option<i8> {
        self.ghost().map(|p| p.y)
    }

    /// Landing position of the active piece, computed without mutating state.
    pub fn ghost(&self) -> Option<ActivePiece> {
        if self.is_over() {
            return None;
        }
        self.active.map(|p| p.dropped(&self.board))
    }

    /// Everything a renderer needs for one frame.
    pub fn render_view(&self) -> RenderView<'_> {
        RenderView {
            board: &self.board,
            active: self.active,
            next: self.next,
            ghost: self.ghost(),
            paused: self.is_paused(),
            over: self.is_over(),
        }
    }

    fn lock_active(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };
        self.board.lock(&active.cells(), active.color);
        self.events.push(GameEvent::Locked);

        let cleared = self.board.clear_full_lines();
        if cleared > 0 {
            self.apply_line_clear(cleared);
        }
        self.spawn_next();
    }

    fn apply_line_clear(&mut self, cleared: usize) {
        let result = calculate_score(cleared, self.level, self.lines);
        self.score = self.score.saturating_add(result.points);
        self.lines = result.total_lines;
        self.level = result.level;

        self.events.push(GameEvent::LinesCleared {
            count: cleared as u32,
        });
        self.events.push(GameEvent::ScoreChanged {
            score: self.score,
            level: self.level,
            lines: self.lines,
        });

        if result.leveled_up {
            let interval = drop_interval_ms(self.level);
            self.timer.restart(interval);
            self.events.push(GameEvent::LevelUp {
                level: self.level,
                drop_interval_ms: interval,
            });
            debug!(level = self.level, interval, "level up");
        }
    }

    fn spawn_next(&mut self) {
        let kind = match self.next.take() {
            Some(kind) => kind,
            None => self.generator.draw(),
        };
        self.next = Some(self.generator.draw());

        let piece = ActivePiece::spawn(kind);
        self.active = Some(piece);
        if piece.collides(&self.board) {
            self.end_game();
        }
    }

    fn end_game(&mut self) {
        self.status = EngineStatus::GameOver;
        self.timer.stop();
        let stats = self.stats();
        self.final_stats = Some(stats);
        self.events.push(GameEvent::GameOver(stats));
        info!(
            score = stats.score,
            level = stats.level,
            lines = stats.lines,
            "game over"
        );
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::with_seed(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Cell, BOARD_HEIGHT, BOARD_WIDTH};

    const H: i8 = BOARD_HEIGHT as i8;
    const W: i8 = BOARD_WIDTH as i8;

    fn running() -> GameState {
        let mut state = GameState::with_seed(12345);
        assert!(state.start());
        state.take_events();
        state
    }

    fn fill_row_except(state: &mut GameState, y: i8, holes: &[i8]) {
        let color = PieceKind::Z.color();
        for x in 0..W {
            if !holes.contains(&x) {
                state.board_mut().set(x, y, Cell::Filled(color));
            }
        }
    }

    fn piece_at(kind: PieceKind, x: i8, y: i8) -> ActivePiece {
        ActivePiece {
            x,
            y,
            ..ActivePiece::spawn(kind)
        }
    }

    #[test]
    fn test_new_game_state() {
        let state = GameState::with_seed(1);
        assert_eq!(state.status(), EngineStatus::Idle);
        assert_eq!(state.score(), 0);
        assert_eq!(state.level(), 1);
        assert_eq!(state.lines(), 0);
        assert!(state.active().is_none());
        assert!(state.next().is_none());
        assert!(!state.timer().is_running());
    }

    #[test]
    fn test_start_spawns_current_and_next() {
        let mut state = GameState::with_seed(5);
        assert!(state.start());
        assert!(state.is_running());
        assert!(state.active().is_some());
        assert!(state.next().is_some());
        assert!(state.timer().is_running());
        assert_eq!(state.timer().interval_ms(), 800);
        assert_eq!(state.take_events(), vec![GameEvent::Started]);
        // A running engine cannot be started again.
        assert!(!state.start());
    }

    #[test]
    fn test_fair_opener() {
        for seed in 0..50 {
            let mut state = GameState::new(EngineConfig::battle(Some(seed)));
            state.start();
            let kind = state.active().unwrap().kind;
            assert!(crate::pieces::FAIR_OPENERS.contains(&kind), "{kind:?}");
        }
    }

    #[test]
    fn test_move_blocked_by_wall() {
        let mut state = running();
        let mut moves = 0;
        while state.move_left() {
            moves += 1;
            assert!(moves < W as usize);
        }
        let active = state.active().unwrap();
        let min_x = active.cells().iter().map(|c| c.0).min().unwrap();
        assert_eq!(min_x, 0);
        assert!(!state.move_left());
        assert_eq!(state.active(), Some(active));
    }

    #[test]
    fn test_single_line_clear_scenario() {
        let mut state = running();
        // Row 19 full except (9,19); the hole is then filled by a vertical I.
        fill_row_except(&mut state, 19, &[9]);
        let vertical_i = piece_at(PieceKind::I, 7, 0).rotated();
        assert_eq!(vertical_i.cells()[0].0, 9);
        state.set_active(vertical_i);

        assert!(state.hard_drop().is_some());

        assert_eq!(state.lines(), 1);
        assert_eq!(state.score(), 100);
        // Remaining three I cells slid down one row; row 19 now holds only column 9.
        for y in 0..16 {
            assert!(state.board().row(y).iter().all(Cell::is_empty));
        }
        assert_eq!(state.board().filled_count(), 3);
        assert_eq!(state.board().get(9, 19), Some(Cell::Filled(PieceKind::I.color())));
        let events = state.take_events();
        assert!(events.contains(&GameEvent::LinesCleared { count: 1 }));
        assert!(events.contains(&GameEvent::ScoreChanged {
            score: 100,
            level: 1,
            lines: 1
        }));
    }

    #[test]
    fn test_tetris_at_level_one() {
        let mut state = running();
        for y in 16..H {
            fill_row_except(&mut state, y, &[0]);
        }
        let vertical_i = piece_at(PieceKind::I, -2, 0).rotated();
        assert!(!vertical_i.collides(state.board()));
        state.set_active(vertical_i);

        state.hard_drop();
        assert_eq!(state.lines(), 4);
        assert_eq!(state.score(), 800);
        assert_eq!(state.board().filled_count(), 0);
    }

    #[test]
    fn test_double_at_level_three() {
        let mut state = running();
        state.level = 3;
        state.lines = 20;
        for y in 18..H {
            fill_row_except(&mut state, y, &[4, 5]);
        }
        state.set_active(piece_at(PieceKind::O, 4, 0));

        state.hard_drop();
        assert_eq!(state.score(), 900);
        assert_eq!(state.lines(), 22);
        assert_eq!(state.level(), 3);
    }

    #[test]
    fn test_level_up_restarts_timer() {
        let mut state = running();
        state.lines = 9;
        fill_row_except(&mut state, 19, &[4, 5]);
        state.set_active(piece_at(PieceKind::O, 4, 0));
        state.tick(500);
        assert_eq!(state.timer().elapsed_ms(), 500);

        state.hard_drop();
        assert_eq!(state.level(), 2);
        assert_eq!(state.timer().interval_ms(), 700);
        assert_eq!(state.timer().elapsed_ms(), 0);
        assert!(state.take_events().contains(&GameEvent::LevelUp {
            level: 2,
            drop_interval_ms: 700
        }));
    }

    #[test]
    fn test_hard_drop_lands_on_stack() {
        let mut state = running();
        state.board_mut().set(4, 15, Cell::Filled(PieceKind::S.color()));
        state.set_active(piece_at(PieceKind::O, 4, 0));
        assert_eq!(state.hard_drop(), Some(13));
        assert_eq!(state.board().get(4, 14), Some(Cell::Filled(PieceKind::O.color())));
        assert_eq!(state.board().get(4, 13), Some(Cell::Filled(PieceKind::O.color())));
    }

    #[test]
    fn test_spawn_overlap_ends_game() {
        let mut state = running();
        state.score = 1234;
        state.level = 2;
        state.lines = 11;
        // Block the spawn area for every kind.
        for x in 3..7 {
            state.board_mut().set(x, 0, Cell::Filled(PieceKind::J.color()));
            state.board_mut().set(x, 1, Cell::Filled(PieceKind::J.color()));
        }
        state.set_active(piece_at(PieceKind::O, 0, 17));

        state.hard_drop();
        assert!(state.is_over());
        let expected = FinalStats {
            score: 1234,
            level: 2,
            lines: 11,
        };
        assert_eq!(state.final_stats(), Some(expected));
        assert!(state.take_events().contains(&GameEvent::GameOver(expected)));
        assert!(!state.timer().is_running());

        // Terminal: nothing mutates any more.
        let board = state.board().clone();
        assert!(!state.move_left());
        assert!(!state.rotate());
        assert!(state.hard_drop().is_none());
        assert_eq!(state.tick(10_000), 0);
        assert_eq!(state.inject_penalty(3), 0);
        assert_eq!(state.board(), &board);
        assert!(state.ghost().is_none());
    }

    #[test]
    fn test_restart_after_game_over() {
        let mut state = running();
        state.end_game();
        assert!(state.start());
        assert!(state.is_running());
        assert_eq!(state.score(), 0);
        assert_eq!(state.level(), 1);
        assert!(state.final_stats().is_none());
    }

    #[test]
    fn test_pause_rejects_operations() {
        let mut state = running();
        let before = state.active();
        assert!(state.pause());
        assert!(state.is_paused());
        assert!(!state.timer().is_running());

        assert!(!state.move_left());
        assert!(!state.move_right());
        assert!(!state.move_down());
        assert!(!state.rotate());
        assert!(state.hard_drop().is_none());
        assert_eq!(state.tick(5_000), 0);
        assert_eq!(state.active(), before);

        assert!(state.pause());
        assert!(state.is_running());
        assert_eq!(state.timer().elapsed_ms(), 0);
        assert_eq!(
            state.take_events(),
            vec![
                GameEvent::PauseChanged { paused: true },
                GameEvent::PauseChanged { paused: false }
            ]
        );
    }

    #[test]
    fn test_tick_drops_once_per_interval() {
        let mut state = running();
        let y0 = state.active().unwrap().y;
        assert_eq!(state.tick(799), 0);
        assert_eq!(state.tick(1), 1);
        assert_eq!(state.active().unwrap().y, y0 + 1);
        assert_eq!(state.tick(1_600), 2);
        assert_eq!(state.active().unwrap().y, y0 + 3);
    }

    #[test]
    fn test_rotation_rejected_near_wall() {
        let mut state = running();
        // Vertical I hugging the left wall: turning back to horizontal would leave the board.
        let vertical = piece_at(PieceKind::I, -2, 5).rotated();
        assert!(!vertical.collides(state.board()));
        state.set_active(vertical);
        assert!(!state.rotate());
        assert_eq!(state.active(), Some(vertical));
    }

    #[test]
    fn test_penalty_keeps_score() {
        let mut state = running();
        for y in 15..H {
            fill_row_except(&mut state, y, &[y % W]);
        }
        let inserted = state.inject_penalty(3);
        assert_eq!(inserted, 3);
        assert_eq!(state.score(), 0);
        for y in 12..15 {
            assert_eq!(state.board().row(y as usize).iter().filter(|c| c.is_empty()).count(), 1);
        }
        for y in 17..H {
            assert_eq!(state.board().row(y as usize).iter().filter(|c| c.is_empty()).count(), 1);
        }
        assert_eq!(state.take_events(), vec![GameEvent::PenaltyReceived { count: 3 }]);
    }

    #[test]
    fn test_ghost_matches_hard_drop() {
        let mut state = running();
        let ghost = state.ghost().unwrap();
        state.hard_drop();
        let kind = ghost.kind;
        for (x, y) in ghost.cells() {
            assert_eq!(state.board().get(x, y), Some(Cell::Filled(kind.color())));
        }
    }
}
