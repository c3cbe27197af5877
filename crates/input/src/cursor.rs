//! Board cursor for keyboard play.

use crate::types::{Coord, GameAction, COLUMNS, ROWS};

/// A cell highlight that stays inside a `columns x rows` board.
///
/// Row 0 is the bottom row, so `CursorUp` increases `row`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pos: Coord,
    columns: u8,
    rows: u8,
}

impl Cursor {
    /// Start in the middle of the board.
    pub fn new(columns: u8, rows: u8) -> Self {
        Self {
            pos: Coord::new(columns / 2, rows / 2),
            columns: columns.max(1),
            rows: rows.max(1),
        }
    }

    pub fn position(&self) -> Coord {
        self.pos
    }

    /// Jump to `coord`, clamped to the board.
    pub fn set_position(&mut self, coord: Coord) {
        self.pos = Coord::new(coord.col.min(self.columns - 1), coord.row.min(self.rows - 1));
    }

    /// Apply a cursor action. Returns true if the cursor moved; other actions are ignored.
    pub fn apply(&mut self, action: GameAction) -> bool {
        let (dc, dr) = match action {
            GameAction::CursorLeft => (-1, 0),
            GameAction::CursorRight => (1, 0),
            GameAction::CursorUp => (0, 1),
            GameAction::CursorDown => (0, -1),
            _ => return false,
        };
        match self.pos.offset(dc, dr) {
            Some(next) if next.col < self.columns && next.row < self.rows => {
                self.pos = next;
                true
            }
            _ => false,
        }
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Self::new(COLUMNS, ROWS)
    }
}
