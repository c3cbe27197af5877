//! Two-click gem selection
//!
//! The first click marks a gem, clicking it again unmarks it, and a click on
//! any other gem spends the selection on a swap attempt. Whatever the attempt
//! returns, the selection is gone afterwards.

use crate::engine::BoardEngine;
use crate::error::BoardError;
use crate::matcher::MatchSet;
use crate::rng::RandomSource;
use crate::types::Coord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectOutcome {
    Selected(Coord),
    Deselected(Coord),
    /// The swap was committed; these cells clear on the first pass.
    Swapped(MatchSet),
    Rejected(BoardError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    first: Option<Coord>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<Coord> {
        self.first
    }

    pub fn select<R: RandomSource>(
        &mut self,
        coord: Coord,
        engine: &mut BoardEngine<R>,
    ) -> SelectOutcome {
        if !engine.is_idle() {
            return SelectOutcome::Rejected(BoardError::Busy {
                phase: engine.phase(),
            });
        }
        if !engine.grid().contains(coord) {
            return SelectOutcome::Rejected(BoardError::OutOfBounds {
                col: coord.col,
                row: coord.row,
            });
        }

        match self.first.take() {
            None => {
                self.first = Some(coord);
                SelectOutcome::Selected(coord)
            }
            Some(first) if first == coord => SelectOutcome::Deselected(coord),
            Some(first) => match engine.request_swap(first, coord) {
                Ok(matches) => SelectOutcome::Swapped(matches),
                Err(e) => SelectOutcome::Rejected(e),
            },
        }
    }

    /// Drop a pending first click. Returns whether there was one.
    pub fn cancel(&mut self) -> bool {
        self.first.take().is_some()
    }
}
