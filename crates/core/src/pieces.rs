//! Pieces module - the static piece catalog and matrix rotation
//!
//! Every piece is an N×N matrix of filled/empty cells (N = 4 for I, 2 for O, 3 otherwise).
//! Rotation is a plain 90° clockwise matrix turn with no kick table: a rotation that would
//! collide is rejected by the engine.

use arrayvec::ArrayVec;

use crate::types::{ColorToken, PieceKind, BOARD_WIDTH};

/// Largest matrix side in the catalog.
pub const MAX_SHAPE_SIZE: usize = 4;

/// Offset of a single filled cell relative to the piece origin, as `(column, row)`.
pub type CellOffset = (i8, i8);

/// Filled cell offsets of a shape.
pub type CellOffsets = ArrayVec<CellOffset, { MAX_SHAPE_SIZE * MAX_SHAPE_SIZE }>;

/// Pieces that may open a match (equal starting conditions for all opponents).
pub const FAIR_OPENERS: [PieceKind; 3] = [PieceKind::O, PieceKind::I, PieceKind::L];

/// A square piece matrix.
///
/// `Shape` is `Copy`: every active piece owns its own matrix and rotating it never touches
/// the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape {
    size: u8,
    rows: [[u8; MAX_SHAPE_SIZE]; MAX_SHAPE_SIZE],
}

impl Shape {
    /// Build a shape from its top-left `size`×`size` corner of `rows`.
    pub const fn new(size: u8, rows: [[u8; MAX_SHAPE_SIZE]; MAX_SHAPE_SIZE]) -> Self {
        Self { size, rows }
    }

    pub fn size(&self) -> u8 {
        self.size
    }

    /// Whether the cell at `(col, row)` is filled. Out-of-matrix cells are empty.
    pub fn is_filled(&self, col: usize, row: usize) -> bool {
        let n = self.size as usize;
        col < n && row < n && self.rows[row][col] != 0
    }

    /// Filled cell offsets in row-major order.
    pub fn cells(&self) -> CellOffsets {
        let n = self.size as usize;
        let mut out = CellOffsets::new();
        for row in 0..n {
            for col in 0..n {
                if self.rows[row][col] != 0 {
                    out.push((col as i8, row as i8));
                }
            }
        }
        out
    }

    /// Rotate 90° clockwise: `rotated[i][j] = original[N-1-j][i]`.
    pub fn rotated_cw(&self) -> Self {
        let n = self.size as usize;
        let mut rows = [[0u8; MAX_SHAPE_SIZE]; MAX_SHAPE_SIZE];
        for (i, out_row) in rows.iter_mut().enumerate().take(n) {
            for (j, out_cell) in out_row.iter_mut().enumerate().take(n) {
                *out_cell = self.rows[n - 1 - j][i];
            }
        }
        Self {
            size: self.size,
            rows,
        }
    }

    /// Lowest filled row offset, if any.
    pub fn bottom_row(&self) -> Option<i8> {
        self.cells().iter().map(|&(_, row)| row).max()
    }
}

/// Static definition of one catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieceDef {
    pub kind: PieceKind,
    /// Orientation 0.
    pub shape: Shape,
    pub color: ColorToken,
}

const I_SHAPE: Shape = Shape::new(4, [[0, 0, 0, 0], [1, 1, 1, 1], [0, 0, 0, 0], [0, 0, 0, 0]]);
const O_SHAPE: Shape = Shape::new(2, [[1, 1, 0, 0], [1, 1, 0, 0], [0; 4], [0; 4]]);
const T_SHAPE: Shape = Shape::new(3, [[0, 1, 0, 0], [1, 1, 1, 0], [0; 4], [0; 4]]);
const S_SHAPE: Shape = Shape::new(3, [[0, 1, 1, 0], [1, 1, 0, 0], [0; 4], [0; 4]]);
const Z_SHAPE: Shape = Shape::new(3, [[1, 1, 0, 0], [0, 1, 1, 0], [0; 4], [0; 4]]);
const J_SHAPE: Shape = Shape::new(3, [[1, 0, 0, 0], [1, 1, 1, 0], [0; 4], [0; 4]]);
const L_SHAPE: Shape = Shape::new(3, [[0, 0, 1, 0], [1, 1, 1, 0], [0; 4], [0; 4]]);

/// The seven catalog entries, in `PieceKind::ALL` order.
pub const CATALOG: [PieceDef; 7] = [
    PieceDef {
        kind: PieceKind::I,
        shape: I_SHAPE,
        color: PieceKind::I.color(),
    },
    PieceDef {
        kind: PieceKind::O,
        shape: O_SHAPE,
        color: PieceKind::O.color(),
    },
    PieceDef {
        kind: PieceKind::T,
        shape: T_SHAPE,
        color: PieceKind::T.color(),
    },
    PieceDef {
        kind: PieceKind::S,
        shape: S_SHAPE,
        color: PieceKind::S.color(),
    },
    PieceDef {
        kind: PieceKind::Z,
        shape: Z_SHAPE,
        color: PieceKind::Z.color(),
    },
    PieceDef {
        kind: PieceKind::J,
        shape: J_SHAPE,
        color: PieceKind::J.color(),
    },
    PieceDef {
        kind: PieceKind::L,
        shape: L_SHAPE,
        color: PieceKind::L.color(),
    },
];

/// Catalog entry for a kind.
pub fn definition(kind: PieceKind) -> &'static PieceDef {
    let idx = match kind {
        PieceKind::I => 0,
        PieceKind::O => 1,
        PieceKind::T => 2,
        PieceKind::S => 3,
        PieceKind::Z => 4,
        PieceKind::J => 5,
        PieceKind::L => 6,
    };
    &CATALOG[idx]
}

/// Orientation-0 shape for a kind.
pub fn get_shape(kind: PieceKind) -> Shape {
    definition(kind).shape
}

/// Spawn origin for a shape: horizontally centred, top row at y = 0.
pub fn spawn_origin(shape: &Shape) -> (i8, i8) {
    let x = (BOARD_WIDTH / 2) as i8 - (shape.size() / 2) as i8;
    (x, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_piece_has_four_cells() {
        for def in CATALOG.iter() {
            assert_eq!(def.shape.cells().len(), 4, "{:?}", def.kind);
        }
    }

    #[test]
    fn catalog_matches_kind_order() {
        for (def, kind) in CATALOG.iter().zip(PieceKind::ALL) {
            assert_eq!(def.kind, kind);
            assert_eq!(definition(kind).kind, kind);
            assert_eq!(def.color, kind.color());
        }
    }

    #[test]
    fn rotation_formula_on_t() {
        // . X .      . X .
        // X X X  ->  . X X
        // . . .      . X .
        let r = get_shape(PieceKind::T).rotated_cw();
        assert_eq!(
            r.cells().as_slice(),
            &[(1, 0), (1, 1), (2, 1), (1, 2)]
        );
    }

    #[test]
    fn i_piece_turns_vertical() {
        let r = get_shape(PieceKind::I).rotated_cw();
        assert_eq!(r.cells().as_slice(), &[(2, 0), (2, 1), (2, 2), (2, 3)]);
    }

    #[test]
    fn four_rotations_are_identity() {
        for def in CATALOG.iter() {
            let mut shape = def.shape;
            for _ in 0..4 {
                shape = shape.rotated_cw();
            }
            assert_eq!(shape, def.shape, "{:?}", def.kind);
        }
    }

    #[test]
    fn rotating_a_copy_leaves_catalog_untouched() {
        let mut shape = get_shape(PieceKind::L);
        shape = shape.rotated_cw();
        assert_ne!(shape, get_shape(PieceKind::L));
        assert_eq!(definition(PieceKind::L).shape, L_SHAPE);
    }

    #[test]
    fn spawn_origins_are_centred() {
        assert_eq!(spawn_origin(&get_shape(PieceKind::I)), (3, 0));
        assert_eq!(spawn_origin(&get_shape(PieceKind::O)), (4, 0));
        assert_eq!(spawn_origin(&get_shape(PieceKind::T)), (4, 0));
    }

    #[test]
    fn bottom_row_of_spawn_shapes() {
        assert_eq!(get_shape(PieceKind::I).bottom_row(), Some(1));
        assert_eq!(get_shape(PieceKind::O).bottom_row(), Some(1));
    }
}
