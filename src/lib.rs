//! TUI Gems (workspace facade crate).
//!
//! Re-exports the member crates under `crates/` so integration tests, benches
//! and the binary can reach everything as `tui_gems::{core,engine,...}`.

pub use tui_gems_adapter as adapter;
pub use tui_gems_core as core;
pub use tui_gems_engine as engine;
pub use tui_gems_input as input;
pub use tui_gems_term as term;
pub use tui_gems_types as types;
