//! Move analysis - is any single adjacent swap able to make a match?
//!
//! Instead of trying every swap, four window shapes are swept over the grid:
//!
//! - **4x1 / 1x4**: a pair plus a third token one gap away along the same line
//!   (`oo.o`, `o.oo`). Sliding the far token into the gap completes the run.
//! - **3x2 / 2x3**: two tokens of a three-cell line plus the third one step
//!   off the line, beside the missing slot. All six placements are listed.
//!
//! Together these cover every way one adjacent swap can complete a run of
//! three. A grid that already holds a run is outside this contract.

use crate::grid::Grid;

/// True if some adjacent swap would create a run of three.
pub fn movement_possible(grid: &Grid) -> bool {
    let (columns, rows) = (grid.columns() as usize, grid.rows() as usize);
    let t = |x: usize, y: usize| grid.at(x as u8, y as u8);

    // 4x1 and 1x4.
    for y in 0..rows {
        for x in 0..columns.saturating_sub(3) {
            if window_4x1(&t, x, y) {
                return true;
            }
        }
    }
    for x in 0..columns {
        for y in 0..rows.saturating_sub(3) {
            if window_1x4(&t, x, y) {
                return true;
            }
        }
    }

    // 3x2 and 2x3.
    for x in 0..columns.saturating_sub(2) {
        for y in 0..rows.saturating_sub(1) {
            if window_3x2(&t, x, y) {
                return true;
            }
        }
    }
    for x in 0..columns.saturating_sub(1) {
        for y in 0..rows.saturating_sub(2) {
            if window_2x3(&t, x, y) {
                return true;
            }
        }
    }

    false
}

/// Horizontal four-cell window starting at `(x, y)`.
fn window_4x1<T: PartialEq>(t: &impl Fn(usize, usize) -> T, x: usize, y: usize) -> bool {
    (t(x, y) == t(x + 1, y) && t(x, y) == t(x + 3, y)) // oo.o
        || (t(x, y) == t(x + 2, y) && t(x, y) == t(x + 3, y)) // o.oo
}

/// Vertical four-cell window starting at `(x, y)`, growing upward.
fn window_1x4<T: PartialEq>(t: &impl Fn(usize, usize) -> T, x: usize, y: usize) -> bool {
    (t(x, y) == t(x, y + 1) && t(x, y) == t(x, y + 3))
        || (t(x, y) == t(x, y + 2) && t(x, y) == t(x, y + 3))
}

/// Three columns by two rows, lower-left cell at `(x, y)`.
///
/// In the pictures `.` is the bottom row and `'` the top row.
fn window_3x2<T: PartialEq>(t: &impl Fn(usize, usize) -> T, x: usize, y: usize) -> bool {
    (t(x, y) == t(x + 1, y) && t(x, y) == t(x + 2, y + 1)) // ..'
        || (t(x, y) == t(x + 1, y + 1) && t(x, y) == t(x + 2, y)) // .'.
        || (t(x, y + 1) == t(x + 1, y) && t(x, y + 1) == t(x + 2, y)) // '..
        || (t(x, y + 1) == t(x + 1, y + 1) && t(x, y + 1) == t(x + 2, y)) // ''.
        || (t(x, y + 1) == t(x + 1, y) && t(x, y + 1) == t(x + 2, y + 1)) // '.'
        || (t(x, y) == t(x + 1, y + 1) && t(x, y) == t(x + 2, y + 1)) // .''
}

/// Two columns by three rows, lower-left cell at `(x, y)`.
fn window_2x3<T: PartialEq>(t: &impl Fn(usize, usize) -> T, x: usize, y: usize) -> bool {
    (t(x, y) == t(x, y + 1) && t(x, y) == t(x + 1, y + 2))
        || (t(x, y) == t(x + 1, y + 1) && t(x, y) == t(x, y + 2))
        || (t(x + 1, y) == t(x, y + 1) && t(x + 1, y) == t(x, y + 2))
        || (t(x + 1, y) == t(x + 1, y + 1) && t(x + 1, y) == t(x, y + 2))
        || (t(x + 1, y) == t(x, y + 1) && t(x + 1, y) == t(x + 1, y + 2))
        || (t(x, y) == t(x + 1, y + 1) && t(x, y) == t(x + 1, y + 2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gap_in_row_is_a_move() {
        // Bottom row 0 0 1 0: swap (2,0)<->(3,0) is not it, but sliding the last 0 left is.
        let grid = Grid::parse(
            "
            1212
            2121
            1212
            0010
            ",
        )
        .unwrap();
        assert!(movement_possible(&grid));
    }

    #[test]
    fn gap_in_column_is_a_move() {
        let grid = Grid::parse(
            "
            0121
            1212
            0121
            0212
            ",
        )
        .unwrap();
        assert!(movement_possible(&grid));
    }

    #[test]
    fn l_shape_is_a_move() {
        // Bottom row has 3 3 at cols 1..=2; a 3 sits above col 0 at row 1.
        let grid = Grid::parse(
            "
            0101
            1010
            3101
            0330
            ",
        )
        .unwrap();
        assert!(movement_possible(&grid));
    }

    #[test]
    fn stuck_board_has_no_move() {
        // Four-color diagonal stripes: every token sits far from its twins.
        let grid = Grid::parse(
            "
            0123
            1230
            2301
            3012
            ",
        )
        .unwrap();
        assert!(!movement_possible(&grid));
    }
}
