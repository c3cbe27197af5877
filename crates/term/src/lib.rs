//! Terminal "game renderer" module.
//!
//! Renders the board into a plain framebuffer instead of a widget tree, then
//! flushes that framebuffer to the terminal with crossterm.
//!
//! - `core` stays free of I/O; [`GameView`] only reads a `BoardSnapshot`
//! - each gem is 2 characters wide so the board looks square
//! - the renderer diffs frames, so idle frames cost nothing

pub mod fb;
pub mod game_view;
pub mod renderer;

pub use tui_gems_core as core;
pub use tui_gems_types as types;

pub use fb::{Cell, CellStyle, FrameBuffer, Rgb};
pub use game_view::{gem_glyph, AdapterStatusView, AnchorY, GameView, HudView, Viewport};
pub use renderer::{dirty_runs, encode_diff_into, encode_full_into, DirtyRun, TerminalRenderer};
