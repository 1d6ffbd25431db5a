//! Core types module - shared data structures and constants
//!
//! This module defines the fundamental types used throughout the workspace.
//! All types are plain data with no behaviour beyond parsing and formatting, making them
//! usable in any context (engine, terminal rendering, match backend wire format).
//!
//! # Board Dimensions
//!
//! - **Width**: 10 columns (indexed 0-9)
//! - **Height**: 20 rows (indexed 0-19, row 0 at the top)
//!
//! # Drop Intervals by Level
//!
//! Gravity increases with level (milliseconds per row):
//!
//! | Level | Interval |
//! |-------|----------|
//! | 1 | 800ms |
//! | 2 | 700ms |
//! | 3 | 600ms |
//! | 4 | 500ms |
//! | 5 | 400ms |
//! | 6 | 350ms |
//! | 7 | 300ms |
//! | 8 | 250ms |
//! | 9 | 200ms |
//! | 10+ | 150ms |
//!
//! # Examples
//!
//! ```
//! use blockfall_types::{Cell, ColorToken, GameAction, PieceKind, BOARD_HEIGHT, BOARD_WIDTH};
//!
//! let piece = PieceKind::from_str("t").unwrap();
//! assert_eq!(piece, PieceKind::T);
//! assert_eq!(piece.color(), ColorToken::from_hex("#a000f0").unwrap());
//!
//! assert_eq!(GameAction::from_str("hardDrop"), Some(GameAction::HardDrop));
//! assert!(Cell::Filled(piece.color()).is_filled());
//!
//! assert_eq!(BOARD_WIDTH, 10);
//! assert_eq!(BOARD_HEIGHT, 20);
//! ```

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Board width in cells (10 columns)
pub const BOARD_WIDTH: u8 = 10;

/// Board height in cells (20 rows)
pub const BOARD_HEIGHT: u8 = 20;

/// Fixed frame interval of the interactive loop in milliseconds (16ms ≈ 60 FPS)
pub const TICK_MS: u32 = 16;

/// Interval between snapshot pushes in battle mode (5 per second)
pub const SYNC_INTERVAL_MS: u32 = 200;

/// Lines needed to advance one level
pub const LINES_PER_LEVEL: u32 = 10;

/// Drop intervals by level (milliseconds per row)
///
/// Index 0 = Level 1, the last entry applies to every level beyond the table.
pub const DROP_INTERVALS: [u32; 10] = [800, 700, 600, 500, 400, 350, 300, 250, 200, 150];

/// Line clear scoring table
///
/// Base points for clearing N lines in a single lock, multiplied by the current level:
/// - 1 line: 100
/// - 2 lines: 300
/// - 3 lines: 500
/// - 4 lines: 800
pub const LINE_SCORES: [u32; 5] = [0, 100, 300, 500, 800];

/// The seven tetromino piece kinds
///
/// Each piece has a distinct shape and color:
/// - **I**: Cyan, horizontal bar
/// - **O**: Yellow, 2x2 square
/// - **T**: Purple, T-shaped
/// - **S**: Green, S-shaped
/// - **Z**: Red, Z-shaped (mirror of S)
/// - **J**: Blue, J-shaped
/// - **L**: Orange, L-shaped (mirror of J)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    I,
    O,
    T,
    S,
    Z,
    J,
    L,
}

impl PieceKind {
    /// Every kind, in catalog order.
    pub const ALL: [PieceKind; 7] = [
        PieceKind::I,
        PieceKind::O,
        PieceKind::T,
        PieceKind::S,
        PieceKind::Z,
        PieceKind::J,
        PieceKind::L,
    ];

    /// Parse piece kind from string (case-insensitive)
    ///
    /// # Examples
    ///
    /// ```
    /// use blockfall_types::PieceKind;
    ///
    /// assert_eq!(PieceKind::from_str("i"), Some(PieceKind::I));
    /// assert_eq!(PieceKind::from_str("O"), Some(PieceKind::O));
    /// assert_eq!(PieceKind::from_str("unknown"), None);
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "i" => Some(PieceKind::I),
            "o" => Some(PieceKind::O),
            "t" => Some(PieceKind::T),
            "s" => Some(PieceKind::S),
            "z" => Some(PieceKind::Z),
            "j" => Some(PieceKind::J),
            "l" => Some(PieceKind::L),
            _ => None,
        }
    }

    /// Convert to uppercase string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            PieceKind::I => "I",
            PieceKind::O => "O",
            PieceKind::T => "T",
            PieceKind::S => "S",
            PieceKind::Z => "Z",
            PieceKind::J => "J",
            PieceKind::L => "L",
        }
    }

    /// Display color of this kind.
    pub const fn color(&self) -> ColorToken {
        match self {
            PieceKind::I => ColorToken::rgb(0x00, 0xf0, 0xf0),
            PieceKind::O => ColorToken::rgb(0xf0, 0xf0, 0x00),
            PieceKind::T => ColorToken::rgb(0xa0, 0x00, 0xf0),
            PieceKind::S => ColorToken::rgb(0x00, 0xf0, 0x00),
            PieceKind::Z => ColorToken::rgb(0xf0, 0x00, 0x00),
            PieceKind::J => ColorToken::rgb(0x00, 0x00, 0xf0),
            PieceKind::L => ColorToken::rgb(0xf0, 0xa0, 0x00),
        }
    }
}

/// Opaque display token stored in a filled cell.
///
/// Encoded as a packed `0xRRGGBB` value and carried on the wire as `"#rrggbb"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorToken(u32);

/// Color of injected penalty rows.
pub const GARBAGE_COLOR: ColorToken = ColorToken::rgb(0xff, 0x6b, 0x35);

impl ColorToken {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self(((r as u32) << 16) | ((g as u32) << 8) | (b as u32))
    }

    /// Parse `#rrggbb` (the leading `#` is optional, hex digits are case-insensitive).
    pub fn from_hex(s: &str) -> Option<Self> {
        let digits = s.strip_prefix('#').unwrap_or(s);
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        u32::from_str_radix(digits, 16).ok().map(Self)
    }

    pub fn to_hex(&self) -> String {
        format!("#{:06x}", self.0)
    }

    pub fn components(&self) -> (u8, u8, u8) {
        ((self.0 >> 16) as u8, (self.0 >> 8) as u8, self.0 as u8)
    }
}

impl fmt::Display for ColorToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.0)
    }
}

impl Serialize for ColorToken {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ColorToken {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ColorToken::from_hex(&s).ok_or_else(|| serde::de::Error::custom("invalid color token"))
    }
}

/// A cell on the game board
///
/// - `Empty`: no block
/// - `Filled(color)`: a locked block drawn with `color`
///
/// On the wire an empty cell is `null` and a filled cell is its color string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Cell {
    #[default]
    Empty,
    Filled(ColorToken),
}

impl Cell {
    pub fn is_filled(&self) -> bool {
        matches!(self, Cell::Filled(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn color(&self) -> Option<ColorToken> {
        match self {
            Cell::Empty => None,
            Cell::Filled(color) => Some(*color),
        }
    }
}

impl Serialize for Cell {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Cell::Empty => serializer.serialize_none(),
            Cell::Filled(color) => serializer.serialize_some(color),
        }
    }
}

impl<'de> Deserialize<'de> for Cell {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<ColorToken>::deserialize(deserializer)? {
            Some(color) => Cell::Filled(color),
            None => Cell::Empty,
        })
    }
}

/// Game actions that can be applied to modify game state
///
/// These actions are produced by keyboard input and consumed by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameAction {
    /// Move piece one cell left
    MoveLeft,
    /// Move piece one cell right
    MoveRight,
    /// Move piece one cell down, locking it on collision
    MoveDown,
    /// Drop piece to the lowest valid position and lock it
    HardDrop,
    /// Rotate piece 90° clockwise
    Rotate,
    /// Toggle pause state
    Pause,
    /// Start a new game (from idle or after game over)
    Start,
}

impl GameAction {
    /// Parse action from string
    ///
    /// # Examples
    ///
    /// ```
    /// use blockfall_types::GameAction;
    ///
    /// assert_eq!(GameAction::from_str("moveLeft"), Some(GameAction::MoveLeft));
    /// assert_eq!(GameAction::from_str("rotate"), Some(GameAction::Rotate));
    /// assert_eq!(GameAction::from_str("unknown"), None);
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "moveleft" => Some(GameAction::MoveLeft),
            "moveright" => Some(GameAction::MoveRight),
            "movedown" => Some(GameAction::MoveDown),
            "harddrop" => Some(GameAction::HardDrop),
            "rotate" => Some(GameAction::Rotate),
            "pause" => Some(GameAction::Pause),
            "start" => Some(GameAction::Start),
            _ => None,
        }
    }

    /// Convert to camelCase string
    pub fn as_str(&self) -> &'static str {
        match self {
            GameAction::MoveLeft => "moveLeft",
            GameAction::MoveRight => "moveRight",
            GameAction::MoveDown => "moveDown",
            GameAction::HardDrop => "hardDrop",
            GameAction::Rotate => "rotate",
            GameAction::Pause => "pause",
            GameAction::Start => "start",
        }
    }
}

/// Lifecycle of one engine.
///
/// ```text
/// Idle -> Running <-> Paused
///            |
///            v
///         GameOver -> Running (start)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EngineStatus {
    Idle,
    Running,
    Paused,
    GameOver,
}

impl EngineStatus {
    pub fn is_over(&self) -> bool {
        matches!(self, EngineStatus::GameOver)
    }

    pub fn is_paused(&self) -> bool {
        matches!(self, EngineStatus::Paused)
    }

    /// Whether `start()` may move the engine into `Running`.
    pub fn can_start(&self) -> bool {
        matches!(self, EngineStatus::Idle | EngineStatus::GameOver)
    }
}

/// Statistics reported when a game ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalStats {
    pub score: u32,
    pub level: u32,
    pub lines: u32,
}

/// State-change notification queued by the engine and drained by its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    /// A game started (fresh board, first two pieces spawned).
    Started,
    /// The active piece was committed into the board.
    Locked,
    /// `count` (>= 1) rows were removed by a single lock.
    LinesCleared { count: u32 },
    /// Score counters after a scoring event.
    ScoreChanged { score: u32, level: u32, lines: u32 },
    /// Level increased; the drop timer now runs at `drop_interval_ms`.
    LevelUp { level: u32, drop_interval_ms: u32 },
    /// Penalty rows were injected into the board.
    PenaltyReceived { count: u32 },
    /// Pause toggled.
    PauseChanged { paused: bool },
    /// Terminal transition.
    GameOver(FinalStats),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_defaults() {
        assert_eq!(DROP_INTERVALS[0], 800);
        assert_eq!(DROP_INTERVALS[DROP_INTERVALS.len() - 1], 150);
        assert!(DROP_INTERVALS.windows(2).all(|w| w[0] > w[1]));
        assert_eq!(LINE_SCORES, [0, 100, 300, 500, 800]);
        assert_eq!(SYNC_INTERVAL_MS, 200);
    }

    #[test]
    fn color_token_hex_roundtrip() {
        let c = ColorToken::from_hex("#FF6B35").unwrap();
        assert_eq!(c, GARBAGE_COLOR);
        assert_eq!(c.to_hex(), "#ff6b35");
        assert_eq!(c.components(), (0xff, 0x6b, 0x35));
        assert_eq!(ColorToken::from_hex("00f0f0"), Some(PieceKind::I.color()));
        assert_eq!(ColorToken::from_hex("#12345"), None);
        assert_eq!(ColorToken::from_hex("#zzzzzz"), None);
    }

    #[test]
    fn cell_wire_format() {
        let row = [Cell::Empty, Cell::Filled(PieceKind::L.color())];
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r##"[null,"#f0a000"]"##);

        let back: [Cell; 2] = serde_json::from_str(&json).unwrap();
        assert_eq!(back, row);
    }

    #[test]
    fn every_kind_has_a_distinct_color() {
        for (i, a) in PieceKind::ALL.iter().enumerate() {
            for b in &PieceKind::ALL[i + 1..] {
                assert_ne!(a.color(), b.color());
            }
            assert_ne!(a.color(), GARBAGE_COLOR);
        }
    }

    #[test]
    fn status_predicates() {
        assert!(EngineStatus::Idle.can_start());
        assert!(EngineStatus::GameOver.can_start());
        assert!(!EngineStatus::Running.can_start());
        assert!(!EngineStatus::Paused.can_start());
        assert!(EngineStatus::GameOver.is_over());
        assert!(EngineStatus::Paused.is_paused());
    }
}
