//! Terminal input module (engine-facing).
//!
//! Maps `crossterm` key events into [`crate::types::GameAction`] and keeps the
//! board cursor. Nothing here knows about the engine; the binary turns
//! `Select` into a selection click at the cursor.

pub mod cursor;
pub mod map;

pub use tui_gems_types as types;

pub use cursor::Cursor;
pub use map::{handle_key_event, should_quit};
