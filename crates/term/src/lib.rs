//! Terminal "game renderer" module.
//!
//! A small, game-oriented rendering layer for terminal play. It renders into a simple
//! framebuffer that is diffed and flushed to the terminal, with no widget toolkit in
//! between.
//!
//! - [`fb`]: styled character framebuffer
//! - [`game_view`]: local board, ghost piece, side panel and opponent mini-boards
//! - [`renderer`]: raw-mode terminal session and diffing flush

pub mod fb;
pub mod game_view;
pub mod renderer;

pub use blockfall_core as core;
pub use blockfall_types as types;

pub use fb::{Cell, CellStyle, FrameBuffer, Rgb};
pub use game_view::{AnchorY, GameView, Hud, OpponentPanel, Viewport};
pub use renderer::{encode_diff_into, encode_full_into, TerminalRenderer};
