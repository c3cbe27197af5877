//! Shuffle module - reorder a stuck board until it is playable
//!
//! A shuffle permutes the existing tokens (it never changes how many of each
//! there are) and retries until the result has no match and at least one move.
//! Retries are capped at [`MAX_SHUFFLE_ATTEMPTS`]; the engine escalates when
//! the cap is hit.

use tracing::{debug, warn};

use crate::analyzer::movement_possible;
use crate::error::{BoardError, Result};
use crate::grid::Grid;
use crate::matcher::has_matches;
use crate::rng::RandomSource;
use crate::types::{Token, MAX_SHUFFLE_ATTEMPTS};

/// True when the grid is match-free and has a move.
pub fn is_settled(grid: &Grid) -> bool {
    !has_matches(grid) && movement_possible(grid)
}

/// Permute `grid` in place until it is settled, trying at most `max_attempts` permutations.
///
/// Returns the number of permutations used. On exhaustion the grid holds the
/// last permutation tried.
pub fn shuffle_with_limit(
    grid: &mut Grid,
    rng: &mut impl RandomSource,
    max_attempts: u32,
) -> Result<u32> {
    for attempt in 1..=max_attempts {
        rng.shuffle(grid.tokens_mut());
        if is_settled(grid) {
            debug!(attempt, "shuffle settled");
            return Ok(attempt);
        }
    }
    warn!(attempts = max_attempts, "shuffle exhausted");
    Err(BoardError::ShuffleExhausted {
        attempts: max_attempts,
    })
}

/// [`shuffle_with_limit`] with the default cap.
pub fn shuffle(grid: &mut Grid, rng: &mut impl RandomSource) -> Result<u32> {
    shuffle_with_limit(grid, rng, MAX_SHUFFLE_ATTEMPTS)
}

/// A settled board built without randomness, for when shuffling and
/// regenerating both failed.
///
/// Tokens follow `(col + row) % 3`, which has no run of three in any line,
/// and cell (1, 0) is rewritten to token 0 so the bottom row starts `0 0 2 0`,
/// a one-swap move. Needs at least four columns and two rows, which
/// `BoardConfig::validate` guarantees.
pub fn constructive_layout(columns: u8, rows: u8) -> Grid {
    let mut grid = Grid::from_fn(columns, rows, |c| {
        Token(((c.col as u16 + c.row as u16) % 3) as u8)
    });
    grid.put(1, 0, Token(0));
    grid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::find_matches;
    use crate::rng::SimpleRng;

    #[test]
    fn shuffle_preserves_token_counts() {
        let mut rng = SimpleRng::new(11);
        let mut grid = Grid::random(7, 7, 5, &mut rng);
        let before = grid.token_counts();

        let attempts = shuffle(&mut grid, &mut rng).unwrap();
        assert!(attempts >= 1);
        assert_eq!(grid.token_counts(), before);
        assert!(find_matches(&grid).is_empty());
        assert!(movement_possible(&grid));
    }

    #[test]
    fn shuffle_gives_up_on_single_token_board() {
        let mut rng = SimpleRng::new(1);
        let mut grid = Grid::new(5, 5, Token(2));
        let err = shuffle_with_limit(&mut grid, &mut rng, 5).unwrap_err();
        assert_eq!(err, BoardError::ShuffleExhausted { attempts: 5 });
        assert_eq!(grid, Grid::new(5, 5, Token(2)));
    }

    #[test]
    fn constructive_layout_is_settled() {
        for columns in 4..=9 {
            for rows in 2..=9 {
                let grid = constructive_layout(columns, rows);
                assert!(is_settled(&grid), "{columns}x{rows}:\n{grid}");
            }
        }
    }
}
