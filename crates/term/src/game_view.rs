//! GameView: maps a [`RenderView`] plus HUD data into a terminal framebuffer.
//!
//! This module is pure (no I/O). It can be unit-tested.

use crate::core::{get_shape, ActivePiece, Board, GameSnapshot, RenderView};
use crate::fb::{CellStyle, FrameBuffer, Rgb};
use crate::types::{Cell as BoardCell, FinalStats, PieceKind, BOARD_HEIGHT, BOARD_WIDTH};

const PLAY_BG: Rgb = Rgb::new(30, 30, 40);
const SCREEN_BG: Rgb = Rgb::new(0, 0, 0);

/// Terminal viewport dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
}

impl Viewport {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

/// Text shown beside the local board.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Hud<'a> {
    pub title: &'a str,
    pub player: Option<&'a str>,
    pub score: u32,
    pub level: u32,
    pub lines: u32,
    pub best: Option<u32>,
    /// Centered over the board, e.g. a countdown or a restart hint.
    pub banner: Option<&'a str>,
}

impl<'a> Hud<'a> {
    pub fn new(title: &'a str, stats: FinalStats) -> Self {
        Self {
            title,
            score: stats.score,
            level: stats.level,
            lines: stats.lines,
            ..Self::default()
        }
    }
}

/// One remote player, drawn from their last published snapshot.
#[derive(Debug, Clone, Copy)]
pub struct OpponentPanel<'a> {
    pub name: &'a str,
    pub snapshot: Option<&'a GameSnapshot>,
    pub eliminated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorY {
    Center,
    Top,
}

/// A lightweight terminal renderer for the local board and its surroundings.
pub struct GameView {
    /// Board cell width in terminal columns.
    cell_w: u16,
    /// Board cell height in terminal rows.
    cell_h: u16,
    anchor_y: AnchorY,
}

impl Default for GameView {
    fn default() -> Self {
        // 2x1 helps compensate for typical terminal glyph aspect ratio.
        Self {
            cell_w: 2,
            cell_h: 1,
            anchor_y: AnchorY::Center,
        }
    }
}

impl GameView {
    pub fn new(cell_w: u16, cell_h: u16) -> Self {
        Self {
            cell_w,
            cell_h,
            anchor_y: AnchorY::Center,
        }
    }

    pub fn with_anchor_y(mut self, anchor_y: AnchorY) -> Self {
        self.anchor_y = anchor_y;
        self
    }

    /// Render one frame into an existing framebuffer.
    ///
    /// Callers can reuse a framebuffer across frames and only resize when the terminal
    /// size changes.
    pub fn render_into(
        &self,
        view: &RenderView<'_>,
        hud: &Hud<'_>,
        opponents: &[OpponentPanel<'_>],
        viewport: Viewport,
        fb: &mut FrameBuffer,
    ) {
        fb.resize(viewport.width, viewport.height);
        fb.clear(crate::fb::Cell::default());

        let board_px_w = (BOARD_WIDTH as u16) * self.cell_w;
        let board_px_h = (BOARD_HEIGHT as u16) * self.cell_h;
        let frame_w = board_px_w + 2;
        let frame_h = board_px_h + 2;

        // Leave room on the right for the panel and opponents.
        let right_w = 16 + (opponents.len() as u16) * 14;
        let start_x = viewport.width.saturating_sub(frame_w + right_w) / 2;
        let start_y = match self.anchor_y {
            AnchorY::Center => viewport.height.saturating_sub(frame_h) / 2,
            AnchorY::Top => 0,
        };

        let bg = CellStyle::new(Rgb::new(80, 80, 90), PLAY_BG);
        fb.fill_rect(start_x + 1, start_y + 1, board_px_w, board_px_h, ' ', bg);
        draw_border(fb, start_x, start_y, frame_w, frame_h, border_style());

        self.draw_board(fb, view.board, start_x, start_y);

        if let Some(ghost) = view.ghost {
            let style = CellStyle::new(Rgb::new(140, 140, 140), PLAY_BG).dim();
            self.draw_piece(fb, &ghost, start_x, start_y, '░', style);
        }
        if let Some(active) = view.active {
            let style = CellStyle::new(active.color.into(), PLAY_BG).bold();
            self.draw_piece(fb, &active, start_x, start_y, '█', style);
        }

        let panel_x = start_x.saturating_add(frame_w).saturating_add(2);
        let panel_end = self.draw_side_panel(fb, view, hud, viewport, panel_x, start_y);

        let mut mini_x = panel_end.max(panel_x.saturating_add(14));
        for opponent in opponents {
            if mini_x.saturating_add(12) > viewport.width {
                break;
            }
            draw_opponent(fb, opponent, mini_x, start_y);
            mini_x = mini_x.saturating_add(14);
        }

        let overlay = if view.paused {
            Some("PAUSED")
        } else if view.over {
            Some("GAME OVER")
        } else {
            None
        };
        let mid_y = start_y.saturating_add(frame_h / 2);
        if let Some(text) = overlay {
            draw_centered(fb, start_x, mid_y, frame_w, text);
        }
        if let Some(banner) = hud.banner {
            let y = if overlay.is_some() { mid_y + 2 } else { mid_y };
            draw_centered(fb, start_x, y, frame_w, banner);
        }
    }

    /// Convenience helper that allocates a new framebuffer.
    pub fn render(
        &self,
        view: &RenderView<'_>,
        hud: &Hud<'_>,
        opponents: &[OpponentPanel<'_>],
        viewport: Viewport,
    ) -> FrameBuffer {
        let mut fb = FrameBuffer::new(viewport.width, viewport.height);
        self.render_into(view, hud, opponents, viewport, &mut fb);
        fb
    }

    fn draw_board(&self, fb: &mut FrameBuffer, board: &Board, start_x: u16, start_y: u16) {
        let empty = CellStyle::new(Rgb::new(90, 90, 100), PLAY_BG).dim();
        for (y, row) in board.rows().enumerate() {
            for (x, cell) in row.iter().enumerate() {
                let (x, y) = (x as u16, y as u16);
                match cell {
                    BoardCell::Filled(color) => {
                        let style = CellStyle::new((*color).into(), PLAY_BG).bold();
                        self.fill_cell_rect(fb, start_x, start_y, x, y, '█', style);
                    }
                    BoardCell::Empty => {
                        self.fill_cell_rect(fb, start_x, start_y, x, y, '·', empty);
                    }
                }
            }
        }
    }

    fn draw_piece(
        &self,
        fb: &mut FrameBuffer,
        piece: &ActivePiece,
        start_x: u16,
        start_y: u16,
        ch: char,
        style: CellStyle,
    ) {
        for &(x, y) in piece.cells().iter() {
            // Cells above the top edge are still spawning.
            if (0..BOARD_WIDTH as i8).contains(&x) && (0..BOARD_HEIGHT as i8).contains(&y) {
                self.fill_cell_rect(fb, start_x, start_y, x as u16, y as u16, ch, style);
            }
        }
    }

    fn fill_cell_rect(
        &self,
        fb: &mut FrameBuffer,
        start_x: u16,
        start_y: u16,
        cell_x: u16,
        cell_y: u16,
        ch: char,
        style: CellStyle,
    ) {
        let px = start_x + 1 + cell_x * self.cell_w;
        let py = start_y + 1 + cell_y * self.cell_h;
        fb.fill_rect(px, py, self.cell_w, self.cell_h, ch, style);
    }

    /// Returns the first column right of the panel.
    fn draw_side_panel(
        &self,
        fb: &mut FrameBuffer,
        view: &RenderView<'_>,
        hud: &Hud<'_>,
        viewport: Viewport,
        panel_x: u16,
        start_y: u16,
    ) -> u16 {
        if panel_x >= viewport.width || viewport.width - panel_x < 12 {
            return panel_x;
        }

        let label = CellStyle::new(Rgb::new(220, 220, 220), SCREEN_BG).bold();
        let value = CellStyle::new(Rgb::new(200, 200, 200), SCREEN_BG);
        let mut right = panel_x;
        let mut y = start_y;

        right = right.max(fb.put_str(panel_x, y, hud.title, label));
        y += 1;
        if let Some(player) = hud.player {
            right = right.max(fb.put_str(panel_x, y, player, value.dim()));
        }
        y += 2;

        for (name, n) in [("SCORE", hud.score), ("LEVEL", hud.level), ("LINES", hud.lines)] {
            fb.put_str(panel_x, y, name, label);
            right = right.max(fb.put_u32(panel_x, y + 1, n, value));
            y += 3;
        }
        if let Some(best) = hud.best {
            fb.put_str(panel_x, y, "BEST", label);
            right = right.max(fb.put_u32(panel_x, y + 1, best, value));
            y += 3;
        }

        fb.put_str(panel_x, y, "NEXT", label);
        y += 1;
        if let Some(kind) = view.next {
            let right_edge = draw_preview(fb, kind, panel_x, y);
            right = right.max(right_edge);
        }
        right.saturating_add(2)
    }
}

/// Small shape preview at two columns per cell.
fn draw_preview(fb: &mut FrameBuffer, kind: PieceKind, x: u16, y: u16) -> u16 {
    let style = CellStyle::new(kind.color().into(), SCREEN_BG);
    let mut right = x;
    for &(dx, dy) in get_shape(kind).cells().iter() {
        let px = x + (dx as u16) * 2;
        fb.fill_rect(px, y + dy as u16, 2, 1, '█', style);
        right = right.max(px + 2);
    }
    right
}

/// Opponent board at one column per cell, name above, state below.
fn draw_opponent(fb: &mut FrameBuffer, opponent: &OpponentPanel<'_>, x: u16, y: u16) {
    let name_style = CellStyle::new(Rgb::new(220, 220, 220), SCREEN_BG).bold();
    let name: String = opponent.name.chars().take(12).collect();
    fb.put_str(x, y, &name, name_style);

    let top = y + 1;
    let w = BOARD_WIDTH as u16 + 2;
    let h = BOARD_HEIGHT as u16 + 2;
    let empty = CellStyle::new(Rgb::new(60, 60, 70), PLAY_BG);
    fb.fill_rect(x + 1, top + 1, w - 2, h - 2, ' ', empty);
    draw_border(fb, x, top, w, h, border_style());

    if let Some(snapshot) = opponent.snapshot {
        for (row_y, row) in snapshot.board.iter().enumerate() {
            for (col_x, cell) in row.iter().enumerate() {
                if let BoardCell::Filled(color) = cell {
                    let mut style = CellStyle::new((*color).into(), PLAY_BG);
                    if opponent.eliminated {
                        style = style.dim();
                    }
                    fb.put_char(x + 1 + col_x as u16, top + 1 + row_y as u16, '▓', style);
                }
            }
        }
    }

    let info = CellStyle::new(Rgb::new(200, 200, 200), SCREEN_BG);
    let below = top + h;
    if opponent.eliminated {
        fb.put_str(x, below, "OUT", info.bold());
    } else if let Some(snapshot) = opponent.snapshot {
        fb.put_u32(x, below, snapshot.score, info);
    } else {
        fb.put_str(x, below, "WAITING", info.dim());
    }
}

fn border_style() -> CellStyle {
    CellStyle::new(Rgb::new(200, 200, 200), SCREEN_BG)
}

fn draw_border(fb: &mut FrameBuffer, x: u16, y: u16, w: u16, h: u16, style: CellStyle) {
    if w < 2 || h < 2 {
        return;
    }

    fb.put_char(x, y, '┌', style);
    fb.put_char(x + w - 1, y, '┐', style);
    fb.put_char(x, y + h - 1, '└', style);
    fb.put_char(x + w - 1, y + h - 1, '┘', style);

    for dx in 1..w - 1 {
        fb.put_char(x + dx, y, '─', style);
        fb.put_char(x + dx, y + h - 1, '─', style);
    }
    for dy in 1..h - 1 {
        fb.put_char(x, y + dy, '│', style);
        fb.put_char(x + w - 1, y + dy, '│', style);
    }
}

fn draw_centered(fb: &mut FrameBuffer, start_x: u16, y: u16, frame_w: u16, text: &str) {
    let text_w = text.chars().count() as u16;
    let x = start_x.saturating_add(frame_w.saturating_sub(text_w) / 2);
    let style = CellStyle::new(Rgb::new(255, 255, 255), SCREEN_BG).bold();
    fb.put_str(x, y, text, style);
}
