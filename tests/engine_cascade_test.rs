//! Engine cascade tests - swap, resolve passes, stabilize

use tui_gems::core::{
    constructive_layout, find_matches, is_settled, movement_possible, BoardConfig, BoardEngine,
    BoardError, BoardEvent, Grid, RandomSource, ScriptedSource, SimpleRng, StabilizeResult,
    TickOutcome,
};
use tui_gems::engine::best_swap;
use tui_gems::types::{Coord, Phase, COLUMNS, ROWS};

// Row 0 (last line) reads 0 0 1 0: swapping (2,0) with (3,0) lines up three 0s.
const LAYOUT: &str = "
    2345
    3452
    1201
    0010
";

fn engine(refill: &[u32]) -> BoardEngine<ScriptedSource> {
    let grid = Grid::parse(LAYOUT).unwrap();
    BoardEngine::from_grid(BoardConfig::default(), grid, ScriptedSource::new(refill)).unwrap()
}

#[test]
fn test_single_pass_scores_base_points() {
    // Refill 5 5 0 leaves the top row 5 5 0 5, which has a move but no run.
    let mut engine = engine(&[5, 5, 0]);
    let a = Coord::new(2, 0);
    let b = Coord::new(3, 0);

    let pending = engine.request_swap(a, b).unwrap();
    assert_eq!(pending.len(), 3);
    assert_eq!(engine.phase(), Phase::Resolving);
    assert_eq!(engine.moves(), 1);

    let pass = engine.step_resolve().unwrap();
    assert_eq!(pass.cleared_count, 3);
    assert_eq!(pass.score_delta, 30);
    assert_eq!(pass.combo, 1);
    assert!(!pass.matches_remain);
    assert_eq!(engine.phase(), Phase::Stabilizing);

    let stab = engine.stabilize().unwrap();
    assert!(!stab.reshuffled);
    assert!(!stab.regenerated);
    assert_eq!(engine.phase(), Phase::Idle);
    assert_eq!(engine.score(), 30);

    let expected = Grid::parse(
        "
        5505
        2342
        3451
        1201
        ",
    )
    .unwrap();
    assert_eq!(engine.grid(), &expected);
}

#[test]
fn test_cascade_raises_combo() {
    // First refill builds 2 2 2 on the top row, the second one settles.
    let mut engine = engine(&[2, 2, 2, 5, 5, 0]);
    engine.request_swap(Coord::new(2, 0), Coord::new(3, 0)).unwrap();

    let first = engine.step_resolve().unwrap();
    assert_eq!((first.cleared_count, first.score_delta, first.combo), (3, 30, 1));
    assert!(first.matches_remain);
    assert_eq!(engine.phase(), Phase::Resolving);
    assert_eq!(engine.pending().len(), 3);

    let second = engine.step_resolve().unwrap();
    assert_eq!((second.cleared_count, second.score_delta, second.combo), (3, 60, 2));
    assert!(!second.matches_remain);

    assert!(matches!(engine.tick(), Some(TickOutcome::Stabilized(_))));
    assert_eq!(engine.score(), 90);
    assert_eq!(engine.combo(), 2);
    assert_eq!(engine.tick(), None);
}

#[test]
fn test_new_swap_resets_combo() {
    let mut engine = engine(&[2, 2, 2, 5, 5, 0]);
    engine.request_swap(Coord::new(2, 0), Coord::new(3, 0)).unwrap();
    assert_eq!(engine.run_to_idle(), 90);
    assert_eq!(engine.combo(), 2);

    // Top row is now 5 5 0 5.
    engine.request_swap(Coord::new(2, 3), Coord::new(3, 3)).unwrap();
    assert_eq!(engine.combo(), 0);
    assert_eq!(engine.moves(), 2);
}

#[test]
fn test_rejected_swaps_leave_board_untouched() {
    let mut engine = engine(&[0]);
    let before = engine.grid_snapshot();

    let far = engine.request_swap(Coord::new(0, 0), Coord::new(2, 0));
    assert!(matches!(far, Err(BoardError::NotAdjacent { .. })));

    let diagonal = engine.request_swap(Coord::new(0, 0), Coord::new(1, 1));
    assert!(matches!(diagonal, Err(BoardError::NotAdjacent { .. })));

    let same = engine.request_swap(Coord::new(1, 1), Coord::new(1, 1));
    assert!(matches!(same, Err(BoardError::NotAdjacent { .. })));

    let no_match = engine.request_swap(Coord::new(0, 3), Coord::new(1, 3));
    assert_eq!(
        no_match,
        Err(BoardError::InvalidMove {
            a: Coord::new(0, 3),
            b: Coord::new(1, 3)
        })
    );

    let outside = engine.request_swap(Coord::new(3, 3), Coord::new(4, 3));
    assert_eq!(outside, Err(BoardError::OutOfBounds { col: 4, row: 3 }));

    assert_eq!(engine.grid(), &before);
    assert_eq!(engine.phase(), Phase::Idle);
    assert_eq!(engine.moves(), 0);
    assert_eq!(engine.score(), 0);
    assert!(engine.events().is_empty());
}

#[test]
fn test_events_follow_the_cascade() {
    let mut engine = engine(&[5, 5, 0]);
    engine.request_swap(Coord::new(2, 0), Coord::new(3, 0)).unwrap();
    engine.run_to_idle();

    let events = engine.drain_events();
    assert_eq!(
        events.first(),
        Some(&BoardEvent::Swapped {
            a: Coord::new(2, 0),
            b: Coord::new(3, 0)
        })
    );
    let cleared = events
        .iter()
        .filter(|e| matches!(e, BoardEvent::CellCleared { .. }))
        .count();
    let spawned = events
        .iter()
        .filter(|e| matches!(e, BoardEvent::CellSpawned { .. }))
        .count();
    assert_eq!(cleared, 3);
    assert_eq!(spawned, 3);
    assert!(events.contains(&BoardEvent::PassComplete {
        pass: 1,
        cleared: 3,
        score_delta: 30,
        matches_remain: false,
    }));
    assert!(engine.events().is_empty());
}

#[test]
fn test_idle_board_is_always_settled() {
    for seed in 1..=8 {
        let mut engine = BoardEngine::initialize(BoardConfig::default().with_seed(seed)).unwrap();
        let mut expected_score = 0u64;
        for _ in 0..25 {
            assert!(find_matches(engine.grid()).is_empty(), "seed {seed}:\n{}", engine.grid());
            assert!(movement_possible(engine.grid()), "seed {seed}:\n{}", engine.grid());

            let swap = best_swap(engine.grid()).expect("settled board has a move");
            engine.request_swap(swap.a, swap.b).unwrap();
            expected_score += engine.run_to_idle();
            assert_eq!(engine.phase(), Phase::Idle);
            assert_eq!(engine.score(), expected_score);
        }
    }
}

#[test]
fn test_vertical_swap_completes_row() {
    // Default 7x7 board. Swapping (1,1) and (1,2) turns row 2 into 0 0 0 3 4 3 0.
    let grid = Grid::parse(
        "
        1321224
        2532033
        0014135
        4142553
        0403430
        1030431
        0232510
        ",
    )
    .unwrap();
    assert_eq!((grid.columns(), grid.rows()), (COLUMNS, ROWS));
    let mut engine =
        BoardEngine::from_grid(BoardConfig::default(), grid, ScriptedSource::new(vec![5, 5, 4]))
            .unwrap();

    let pending = engine.request_swap(Coord::new(1, 1), Coord::new(1, 2)).unwrap();
    assert_eq!(
        pending.iter().collect::<Vec<_>>(),
        vec![Coord::new(0, 2), Coord::new(1, 2), Coord::new(2, 2)]
    );

    let pass = engine.step_resolve().unwrap();
    assert_eq!(pass.cleared_count, 3);
    assert_eq!(pass.score_delta, 3 * 10);
    assert_eq!(pass.combo, 1);
    assert!(!pass.matches_remain);
    assert!(!engine.stabilize().unwrap().reshuffled);

    // Columns 0-2 drop one row above row 2 and take 5 5 4 on top.
    let expected = Grid::parse(
        "
        5541224
        1322033
        2534135
        0012553
        4143430
        1430431
        0232510
        ",
    )
    .unwrap();
    assert_eq!(engine.grid(), &expected);
}

/// Hands out `refill` first, then falls back to a seeded generator.
struct RefillThenRandom {
    refill: Vec<u32>,
    rng: SimpleRng,
}

impl RandomSource for RefillThenRandom {
    fn next_below(&mut self, n: u32) -> u32 {
        if self.refill.is_empty() {
            self.rng.next_below(n)
        } else {
            self.refill.remove(0) % n
        }
    }
}

#[test]
fn test_stuck_board_is_reshuffled() {
    // Swapping (2,3) with (2,2) clears the top row's 5 5 5; refilling 0 1 2
    // leaves a diagonal board with no match and no move.
    let grid = Grid::parse(
        "
        5533
        1250
        2301
        3012
        ",
    )
    .unwrap();
    let source = RefillThenRandom {
        refill: vec![0, 1, 2],
        rng: SimpleRng::new(9),
    };
    let mut engine = BoardEngine::from_grid(BoardConfig::default(), grid, source).unwrap();
    engine.request_swap(Coord::new(2, 3), Coord::new(2, 2)).unwrap();

    let pass = engine.step_resolve().unwrap();
    assert_eq!(pass.cleared_count, 3);
    assert!(!pass.matches_remain);
    let stuck = Grid::parse(
        "
        0123
        1230
        2301
        3012
        ",
    )
    .unwrap();
    assert_eq!(engine.grid(), &stuck);
    assert!(!movement_possible(engine.grid()));
    engine.drain_events();

    let stab = engine.stabilize().unwrap();
    assert_eq!(
        stab,
        StabilizeResult {
            reshuffled: true,
            regenerated: false
        }
    );
    assert_eq!(engine.phase(), Phase::Idle);
    assert_eq!(engine.grid().token_counts(), stuck.token_counts());
    assert!(is_settled(engine.grid()), "\n{}", engine.grid());
    assert!(matches!(
        engine.drain_events().as_slice(),
        [BoardEvent::Reshuffled { attempts }] if *attempts >= 1
    ));
    assert_eq!(engine.score(), 30);
}

#[test]
fn test_unshufflable_board_escalates_to_constructive_layout() {
    // Eight gem types, two of each: no arrangement of these tokens has a move,
    // so shuffling must give up. The scripted source then keeps producing
    // token 2, so every regenerated board is one color and never settles.
    let grid = Grid::parse(
        "
        7763
        4577
        0123
        4567
        ",
    )
    .unwrap();
    let config = BoardConfig::default().with_palette_size(8);
    let mut engine =
        BoardEngine::from_grid(config, grid, ScriptedSource::new(vec![0, 1, 2])).unwrap();
    engine.request_swap(Coord::new(2, 3), Coord::new(2, 2)).unwrap();

    let pass = engine.step_resolve().unwrap();
    assert!(!pass.matches_remain);
    let stuck = Grid::parse(
        "
        0123
        4567
        0123
        4567
        ",
    )
    .unwrap();
    assert_eq!(engine.grid(), &stuck);
    engine.drain_events();

    let stab = engine.stabilize().unwrap();
    assert_eq!(
        stab,
        StabilizeResult {
            reshuffled: true,
            regenerated: true
        }
    );
    assert_eq!(engine.phase(), Phase::Idle);
    assert_eq!(engine.grid(), &constructive_layout(4, 4));
    assert!(is_settled(engine.grid()), "\n{}", engine.grid());
    assert_eq!(
        engine.drain_events(),
        vec![BoardEvent::Regenerated { constructive: true }]
    );

    // The rebuilt board plays on.
    let swap = best_swap(engine.grid()).expect("constructive layout has a move");
    engine.request_swap(swap.a, swap.b).unwrap();
}

#[test]
fn test_swap_during_cascade_is_busy() {
    let mut engine = engine(&[2, 2, 2, 5, 5, 0]);
    engine.request_swap(Coord::new(2, 0), Coord::new(3, 0)).unwrap();
    engine.step_resolve().unwrap();

    let err = engine.request_swap(Coord::new(0, 1), Coord::new(1, 1)).unwrap_err();
    assert_eq!(
        err,
        BoardError::Busy {
            phase: Phase::Resolving
        }
    );
    assert!(err.is_rejected_move());
}
