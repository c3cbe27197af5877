//! Read-only board state handed to renderers and the adapter.

use crate::grid::Grid;
use crate::matcher::MatchSet;
use crate::types::{Phase, Token, COLUMNS, DEFAULT_PALETTE_SIZE, ROWS};

/// A copy of everything a front end needs to draw one frame.
///
/// Reuse one instance with `BoardEngine::snapshot_into` to avoid
/// reallocating the grid every frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardSnapshot {
    pub grid: Grid,
    /// Cells about to be cleared by the next pass.
    pub pending: MatchSet,
    pub phase: Phase,
    pub score: u64,
    pub combo: u32,
    pub moves: u32,
    pub palette_size: u8,
    pub seed: u32,
}

impl Default for BoardSnapshot {
    fn default() -> Self {
        Self {
            grid: Grid::new(COLUMNS, ROWS, Token(0)),
            pending: MatchSet::new(),
            phase: Phase::Idle,
            score: 0,
            combo: 0,
            moves: 0,
            palette_size: DEFAULT_PALETTE_SIZE,
            seed: 0,
        }
    }
}

impl BoardSnapshot {
    pub fn columns(&self) -> u8 {
        self.grid.columns()
    }

    pub fn rows(&self) -> u8 {
        self.grid.rows()
    }
}
