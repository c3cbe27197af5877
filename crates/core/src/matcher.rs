//! Match detection - straight runs of three or more identical tokens
//!
//! Rows are scanned left to right and columns bottom to top, each line on its
//! own. A run is flushed when the token changes and again at the end of the
//! line, so runs touching the last cell are not lost. Horizontal and vertical
//! results are merged into one [`MatchSet`]; a cell that belongs to both a
//! horizontal and a vertical run appears once.

use std::collections::BTreeSet;

use crate::grid::Grid;
use crate::types::{Coord, MIN_RUN};

/// Coordinates to clear in one cascade pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchSet {
    cells: BTreeSet<Coord>,
}

impl MatchSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, coord: Coord) -> bool {
        self.cells.insert(coord)
    }

    pub fn contains(&self, coord: Coord) -> bool {
        self.cells.contains(&coord)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    /// Coordinates in (col, row) order.
    pub fn iter(&self) -> impl Iterator<Item = Coord> + '_ {
        self.cells.iter().copied()
    }

    /// Cleared rows of one column, bottom to top.
    pub fn rows_in_column(&self, col: u8) -> impl Iterator<Item = u8> + '_ {
        self.cells
            .range(Coord::new(col, 0)..=Coord::new(col, u8::MAX))
            .map(|c| c.row)
    }
}

impl FromIterator<Coord> for MatchSet {
    fn from_iter<I: IntoIterator<Item = Coord>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a MatchSet {
    type Item = &'a Coord;
    type IntoIter = std::collections::btree_set::Iter<'a, Coord>;

    fn into_iter(self) -> Self::IntoIter {
        self.cells.iter()
    }
}

/// Find every cell that is part of a horizontal or vertical run of at least three.
pub fn find_matches(grid: &Grid) -> MatchSet {
    let mut matches = MatchSet::new();
    let (columns, rows) = (grid.columns(), grid.rows());

    for row in 0..rows {
        scan_line(columns, |i| grid.at(i, row), |i| Coord::new(i, row), &mut matches);
    }
    for col in 0..columns {
        scan_line(rows, |i| grid.at(col, i), |i| Coord::new(col, i), &mut matches);
    }

    matches
}

/// True when the grid holds at least one run. Stops at the first one found.
pub fn has_matches(grid: &Grid) -> bool {
    let (columns, rows) = (grid.columns(), grid.rows());
    (0..rows).any(|row| longest_run(columns, |i| grid.at(i, row)) >= MIN_RUN)
        || (0..columns).any(|col| longest_run(rows, |i| grid.at(col, i)) >= MIN_RUN)
}

fn scan_line(
    len: u8,
    token_at: impl Fn(u8) -> crate::types::Token,
    coord_at: impl Fn(u8) -> Coord,
    out: &mut MatchSet,
) {
    if len == 0 {
        return;
    }
    let mut start = 0u8;
    let mut current = token_at(0);
    for i in 1..=len {
        // `i == len` is the end-of-line flush.
        let breaks = i == len || token_at(i) != current;
        if !breaks {
            continue;
        }
        if (i - start) as usize >= MIN_RUN {
            for j in start..i {
                out.insert(coord_at(j));
            }
        }
        if i < len {
            start = i;
            current = token_at(i);
        }
    }
}

fn longest_run(len: u8, token_at: impl Fn(u8) -> crate::types::Token) -> usize {
    let mut best = 0usize;
    let mut streak = 0usize;
    let mut current = None;
    for i in 0..len {
        let t = token_at(i);
        if Some(t) == current {
            streak += 1;
        } else {
            current = Some(t);
            streak = 1;
        }
        best = best.max(streak);
    }
    best
}
