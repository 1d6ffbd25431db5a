//! Board module - manages the game grid
//!
//! The board is a 10x20 grid where each cell is either empty or filled with a color token.
//! Uses a flat array for cache locality; dimensions never change.
//! Coordinates: (x, y) where x ranges 0..9 (left to right), y ranges 0..19 (top to bottom).
//! Rows above the top (y < 0) exist only for collision purposes and are always free.

use rand::Rng;

use crate::pieces::CellOffset;
use crate::types::{Cell, ColorToken, BOARD_HEIGHT, BOARD_WIDTH, GARBAGE_COLOR};

/// Total number of cells on the board
const BOARD_SIZE: usize = (BOARD_WIDTH as usize) * (BOARD_HEIGHT as usize);

const WIDTH: usize = BOARD_WIDTH as usize;
const HEIGHT: usize = BOARD_HEIGHT as usize;

/// Row-major 2D copy of the board, as carried by snapshots.
pub type BoardRows = [[Cell; WIDTH]; HEIGHT];

/// The game board - 10 columns x 20 rows using flat array storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    /// Flat array of cells, row-major order (y * WIDTH + x)
    cells: [Cell; BOARD_SIZE],
}

impl Board {
    /// Create a new empty board
    pub fn new() -> Self {
        Self {
            cells: [Cell::Empty; BOARD_SIZE],
        }
    }

    /// Calculate flat index from (x, y) coordinates
    #[inline(always)]
    fn index(x: i8, y: i8) -> Option<usize> {
        if x < 0 || x >= BOARD_WIDTH as i8 || y < 0 || y >= BOARD_HEIGHT as i8 {
            return None;
        }
        Some((y as usize) * WIDTH + (x as usize))
    }

    pub fn width(&self) -> u8 {
        BOARD_WIDTH
    }

    pub fn height(&self) -> u8 {
        BOARD_HEIGHT
    }

    /// Get cell at position (x, y)
    /// Returns None if out of bounds
    pub fn get(&self, x: i8, y: i8) -> Option<Cell> {
        Self::index(x, y).map(|idx| self.cells[idx])
    }

    /// Set cell at position (x, y)
    /// Returns false if out of bounds
    pub fn set(&mut self, x: i8, y: i8, cell: Cell) -> bool {
        match Self::index(x, y) {
            Some(idx) => {
                self.cells[idx] = cell;
                true
            }
            None => false,
        }
    }

    /// Collision query.
    ///
    /// Left/right walls and the floor count as occupied. Anything above the top edge is
    /// free so pieces can spawn partially off-board.
    pub fn is_occupied(&self, x: i8, y: i8) -> bool {
        if x < 0 || x >= BOARD_WIDTH as i8 || y >= BOARD_HEIGHT as i8 {
            return true;
        }
        if y < 0 {
            return false;
        }
        self.cells[(y as usize) * WIDTH + (x as usize)].is_filled()
    }

    /// Check if a row is completely filled
    pub fn is_row_full(&self, y: usize) -> bool {
        if y >= HEIGHT {
            return false;
        }
        let start = y * WIDTH;
        self.cells[start..start + WIDTH]
            .iter()
            .all(|cell| cell.is_filled())
    }

    /// Borrow one row.
    pub fn row(&self, y: usize) -> &[Cell] {
        let start = y * WIDTH;
        &self.cells[start..start + WIDTH]
    }

    /// Iterate rows top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks_exact(WIDTH)
    }

    /// Commit cells into the board with `color`.
    ///
    /// Cells above the top edge are skipped; so is anything outside the walls or floor.
    /// Returns the number of cells written.
    pub fn lock(&mut self, cells: &[CellOffset], color: ColorToken) -> usize {
        let mut written = 0;
        for &(x, y) in cells {
            if y < 0 {
                continue;
            }
            if self.set(x, y, Cell::Filled(color)) {
                written += 1;
            }
        }
        written
    }

    /// Remove every full row and return how many were removed.
    ///
    /// Two-pointer compaction from the bottom: surviving rows keep their relative order
    /// and slide down, the vacated rows at the top become empty. Non-contiguous full rows
    /// are handled in the same pass.
    pub fn clear_full_lines(&mut self) -> usize {
        let mut cleared = 0;
        let mut write_y = HEIGHT;

        for read_y in (0..HEIGHT).rev() {
            if self.is_row_full(read_y) {
                cleared += 1;
            } else {
                write_y -= 1;
                if write_y != read_y {
                    let src_start = read_y * WIDTH;
                    let dst_start = write_y * WIDTH;
                    self.cells
                        .copy_within(src_start..src_start + WIDTH, dst_start);
                }
            }
        }

        for cell in &mut self.cells[..write_y * WIDTH] {
            *cell = Cell::Empty;
        }

        cleared
    }

    /// Push one penalty row in at the bottom with a gap at `hole`.
    ///
    /// The top row is discarded and every other row moves up by one.
    pub fn push_penalty_row(&mut self, hole: usize) {
        self.cells.copy_within(WIDTH.., 0);
        let start = (HEIGHT - 1) * WIDTH;
        for (x, cell) in self.cells[start..].iter_mut().enumerate() {
            *cell = if x == hole {
                Cell::Empty
            } else {
                Cell::Filled(GARBAGE_COLOR)
            };
        }
    }

    /// Remove `count` rows from the top and append `count` penalty rows at the bottom,
    /// each with one uniformly random empty column.
    ///
    /// `count` is clamped to the board height. Returns the number of rows inserted.
    pub fn insert_penalty_rows<R: Rng + ?Sized>(&mut self, count: usize, rng: &mut R) -> usize {
        let count = count.min(HEIGHT);
        for _ in 0..count {
            let hole = rng.random_range(0..WIDTH);
            self.push_penalty_row(hole);
        }
        count
    }

    /// Number of filled cells.
    pub fn filled_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_filled()).count()
    }

    /// Get a reference to the internal cells array
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Clear the entire board
    pub fn clear(&mut self) {
        self.cells.fill(Cell::Empty);
    }

    /// Rebuild a board from its 2D form.
    pub fn from_rows(rows: &BoardRows) -> Self {
        let mut cells = [Cell::Empty; BOARD_SIZE];
        for (y, row) in rows.iter().enumerate() {
            cells[y * WIDTH..(y + 1) * WIDTH].copy_from_slice(row);
        }
        Self { cells }
    }

    /// Independent 2D copy of the board.
    pub fn to_rows(&self) -> BoardRows {
        let mut rows = [[Cell::Empty; WIDTH]; HEIGHT];
        for (y, row) in rows.iter_mut().enumerate() {
            row.copy_from_slice(self.row(y));
        }
        rows
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}
