//! Move search on top of the core board rules.
//!
//! Everything here works on a [`Grid`](tui_gems_core::Grid) copy and never
//! touches an engine: the terminal front end uses it for the hint key and the
//! adapter reports the best swap in each observation.

pub mod hint;

pub use tui_gems_core as core;
pub use tui_gems_types as types;

pub use hint::{best_swap, brute_force_movement_possible, swap_gain, valid_swaps};
