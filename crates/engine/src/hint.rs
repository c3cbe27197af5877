use crate::core::{find_matches, Grid};
use crate::types::Swap;

/// Right and up neighbour pairs in scan order (bottom row first, left to right).
fn neighbour_swaps(grid: &Grid) -> impl Iterator<Item = Swap> + '_ {
    grid.coords().flat_map(move |a| {
        [a.offset(1, 0), a.offset(0, 1)]
            .into_iter()
            .flatten()
            .filter(move |b| grid.contains(*b))
            .map(move |b| Swap::new(a, b))
    })
}

/// Cells the first pass would clear if `swap` were played; 0 if it makes no match.
pub fn swap_gain(grid: &Grid, swap: Swap) -> usize {
    let mut trial = grid.clone();
    if trial.swap(swap.a, swap.b).is_err() {
        return 0;
    }
    find_matches(&trial).len()
}

/// Every adjacent swap that creates at least one run.
pub fn valid_swaps(grid: &Grid) -> Vec<Swap> {
    neighbour_swaps(grid)
        .filter(|s| swap_gain(grid, *s) > 0)
        .collect()
}

/// The swap clearing the most cells on its first pass. Ties keep scan order.
pub fn best_swap(grid: &Grid) -> Option<Swap> {
    let mut best: Option<(Swap, usize)> = None;
    for swap in neighbour_swaps(grid) {
        let gain = swap_gain(grid, swap);
        if gain == 0 {
            continue;
        }
        if best.map_or(true, |(_, g)| gain > g) {
            best = Some((swap, gain));
        }
    }
    best.map(|(s, _)| s)
}

/// Try every swap. Slow, but independent of the window analysis in core.
pub fn brute_force_movement_possible(grid: &Grid) -> bool {
    neighbour_swaps(grid).any(|s| swap_gain(grid, s) > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{movement_possible, SimpleRng};
    use crate::types::Coord;

    #[test]
    fn finds_the_bigger_of_two_moves() {
        let grid = Grid::parse(
            "
            2345
            3452
            1201
            0010
            ",
        )
        .unwrap();
        let swaps = valid_swaps(&grid);
        assert!(swaps.contains(&Swap::new(Coord::new(2, 0), Coord::new(2, 1))));
        assert_eq!(
            best_swap(&grid),
            Some(Swap::new(Coord::new(2, 0), Coord::new(2, 1)))
        );
    }

    #[test]
    fn prefers_larger_clear() {
        // (2,0)<->(3,0) lines up three 0s; (2,0)<->(2,1) lines up four.
        let grid = Grid::parse(
            "
            5432
            4321
            1202
            0010
            ",
        )
        .unwrap();
        let best = best_swap(&grid).unwrap();
        assert_eq!(swap_gain(&grid, best), 4);
    }

    #[test]
    fn stuck_board_has_no_hint() {
        let grid = Grid::parse(
            "
            0123
            1230
            2301
            3012
            ",
        )
        .unwrap();
        assert!(valid_swaps(&grid).is_empty());
        assert_eq!(best_swap(&grid), None);
        assert!(!brute_force_movement_possible(&grid));
    }

    #[test]
    fn agrees_with_window_analysis_on_random_boards() {
        let mut rng = SimpleRng::new(2024);
        let mut checked = 0;
        for _ in 0..400 {
            let grid = Grid::random(6, 6, 5, &mut rng);
            if !find_matches(&grid).is_empty() {
                continue;
            }
            checked += 1;
            assert_eq!(
                movement_possible(&grid),
                brute_force_movement_possible(&grid),
                "disagreement on\n{grid}"
            );
        }
        assert!(checked > 0);
    }
}
