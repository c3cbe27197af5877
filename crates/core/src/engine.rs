//! Board engine - the turn state machine
//!
//! Owns the grid, the random source and the score, and is the only thing that
//! mutates them. A turn runs through:
//!
//! ```text
//! Idle --request_swap--> SwapPending --match--> Resolving --step_resolve--> ...
//!   ^                        |                      |  (matches remain)
//!   |                     no match                  v
//!   +------------------------+---stabilize--- Stabilizing
//! ```
//!
//! Each `step_resolve` call is exactly one cascade pass (clear, gravity,
//! refill, re-detect), so a driver can hold the next call back while an
//! animation plays.

use arrayvec::ArrayVec;
use tracing::{debug, info, warn};

use crate::analyzer::movement_possible;
use crate::config::BoardConfig;
use crate::error::{BoardError, Result};
use crate::events::BoardEvent;
use crate::grid::Grid;
use crate::matcher::{find_matches, MatchSet};
use crate::rng::{RandomSource, SimpleRng};
use crate::scoring::pass_score;
use crate::shuffle::{constructive_layout, is_settled, shuffle};
use crate::snapshot::BoardSnapshot;
use crate::types::{Coord, Phase, MAX_DIMENSION, MAX_REGENERATIONS, MAX_SETTLE_PASSES};

/// Outcome of one cascade pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassResult {
    pub cleared_count: u32,
    pub score_delta: u64,
    /// Gravity and refill produced new runs; another pass follows.
    pub matches_remain: bool,
    /// Multiplier this pass was scored with.
    pub combo: u32,
}

/// Outcome of the post-cascade stalemate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StabilizeResult {
    pub reshuffled: bool,
    /// Shuffling failed and the board got new gems.
    pub regenerated: bool,
}

/// What a single [`BoardEngine::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Pass(PassResult),
    Stabilized(StabilizeResult),
}

#[derive(Debug, Clone)]
pub struct BoardEngine<R: RandomSource = SimpleRng> {
    config: BoardConfig,
    grid: Grid,
    rng: R,
    phase: Phase,
    score: u64,
    combo: u32,
    /// Cells the next pass will clear.
    pending: MatchSet,
    /// Committed player swaps.
    moves: u32,
    events: Vec<BoardEvent>,
}

impl BoardEngine<SimpleRng> {
    /// Build a settled board from `config`, seeding [`SimpleRng`] with `config.seed`.
    pub fn initialize(config: BoardConfig) -> Result<Self> {
        Self::with_source(config, SimpleRng::new(config.seed))
    }
}

impl<R: RandomSource> BoardEngine<R> {
    /// Build a settled board drawing every random decision from `rng`.
    ///
    /// The random fill is cascaded silently (no score, no events) until no
    /// match remains, then reshuffled if no move exists.
    pub fn with_source(config: BoardConfig, rng: R) -> Result<Self> {
        config.validate()?;
        let mut rng = rng;
        let grid = Grid::random(config.columns, config.rows, config.palette_size, &mut rng);
        let mut engine = Self::assemble(config, grid, rng);

        if !engine.settle_silently() {
            warn!("initial fill kept matching; using constructive layout");
            engine.grid = constructive_layout(config.columns, config.rows);
        }
        if !movement_possible(&engine.grid) {
            engine.reshuffle();
        }
        engine.events.clear();

        info!(
            columns = config.columns,
            rows = config.rows,
            palette = config.palette_size,
            seed = config.seed,
            "board initialized"
        );
        Ok(engine)
    }

    /// Wrap an existing grid without settling it.
    ///
    /// The grid's dimensions override `config.columns`/`config.rows`. Every
    /// token must be inside the palette.
    pub fn from_grid(config: BoardConfig, grid: Grid, rng: R) -> Result<Self> {
        let config = BoardConfig {
            columns: grid.columns(),
            rows: grid.rows(),
            ..config
        };
        config.validate()?;
        if let Some(bad) = grid.tokens().iter().find(|t| t.0 >= config.palette_size) {
            return Err(BoardError::InvalidLayout(format!(
                "token {} outside palette of {}",
                bad.0, config.palette_size
            )));
        }
        Ok(Self::assemble(config, grid, rng))
    }

    fn assemble(config: BoardConfig, grid: Grid, rng: R) -> Self {
        Self {
            config,
            grid,
            rng,
            phase: Phase::Idle,
            score: 0,
            combo: 0,
            pending: MatchSet::new(),
            moves: 0,
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn seed(&self) -> u32 {
        self.config.seed
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_idle(&self) -> bool {
        self.phase == Phase::Idle
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn moves(&self) -> u32 {
        self.moves
    }

    /// Cells queued for the next pass (empty unless `Resolving`).
    pub fn pending(&self) -> &MatchSet {
        &self.pending
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Owned copy of the grid for collaborators.
    pub fn grid_snapshot(&self) -> Grid {
        self.grid.clone()
    }

    pub fn snapshot_into(&self, out: &mut BoardSnapshot) {
        out.grid.clone_from(&self.grid);
        out.pending.clone_from(&self.pending);
        out.phase = self.phase;
        out.score = self.score;
        out.combo = self.combo;
        out.moves = self.moves;
        out.palette_size = self.config.palette_size;
        out.seed = self.config.seed;
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        let mut s = BoardSnapshot::default();
        self.snapshot_into(&mut s);
        s
    }

    /// Take every notification queued since the last call.
    pub fn drain_events(&mut self) -> Vec<BoardEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[BoardEvent] {
        &self.events
    }

    /// Validate and commit a player swap.
    ///
    /// On success the grid holds the swapped cells, the combo is reset and the
    /// engine is `Resolving`; the returned set is what the first pass will clear.
    /// On any error the grid is untouched.
    pub fn request_swap(&mut self, a: Coord, b: Coord) -> Result<MatchSet> {
        if self.phase != Phase::Idle {
            return Err(BoardError::Busy { phase: self.phase });
        }
        for c in [a, b] {
            if !self.grid.contains(c) {
                return Err(BoardError::OutOfBounds {
                    col: c.col,
                    row: c.row,
                });
            }
        }
        if !a.is_adjacent(b) {
            return Err(BoardError::NotAdjacent { a, b });
        }

        self.phase = Phase::SwapPending;
        let mut trial = self.grid.clone();
        let matches = match trial.swap(a, b) {
            Ok(()) => find_matches(&trial),
            Err(e) => {
                self.phase = Phase::Idle;
                return Err(e);
            }
        };
        if matches.is_empty() {
            self.phase = Phase::Idle;
            debug!(%a, %b, "swap rejected: no match");
            return Err(BoardError::InvalidMove { a, b });
        }

        self.grid = trial;
        self.combo = 0;
        self.moves += 1;
        self.pending = matches.clone();
        self.phase = Phase::Resolving;
        self.events.push(BoardEvent::Swapped { a, b });
        debug!(%a, %b, matched = matches.len(), "swap committed");
        Ok(matches)
    }

    /// Run one cascade pass. Only valid while `Resolving`.
    pub fn step_resolve(&mut self) -> Result<PassResult> {
        if self.phase != Phase::Resolving {
            return Err(BoardError::WrongPhase {
                expected: Phase::Resolving,
                actual: self.phase,
            });
        }

        self.combo += 1;
        let cleared = std::mem::take(&mut self.pending);
        let score = pass_score(cleared.len() as u32, self.config.base_points, self.combo);
        self.score = self.score.saturating_add(score.points);

        self.collapse_and_refill(&cleared, true);

        self.pending = find_matches(&self.grid);
        let matches_remain = !self.pending.is_empty();
        self.phase = if matches_remain {
            Phase::Resolving
        } else {
            Phase::Stabilizing
        };

        self.events.push(BoardEvent::PassComplete {
            pass: self.combo,
            cleared: score.cleared,
            score_delta: score.points,
            matches_remain,
        });
        debug!(
            pass = self.combo,
            cleared = score.cleared,
            points = score.points,
            matches_remain,
            "cascade pass"
        );

        Ok(PassResult {
            cleared_count: score.cleared,
            score_delta: score.points,
            matches_remain,
            combo: self.combo,
        })
    }

    /// Post-cascade stalemate check. Only valid while `Stabilizing`.
    pub fn stabilize(&mut self) -> Result<StabilizeResult> {
        if self.phase != Phase::Stabilizing {
            return Err(BoardError::WrongPhase {
                expected: Phase::Stabilizing,
                actual: self.phase,
            });
        }
        let result = if movement_possible(&self.grid) {
            StabilizeResult::default()
        } else {
            self.reshuffle()
        };
        self.phase = Phase::Idle;
        Ok(result)
    }

    /// Advance exactly one phase. Returns None when idle.
    pub fn tick(&mut self) -> Option<TickOutcome> {
        match self.phase {
            Phase::Resolving => self.step_resolve().ok().map(TickOutcome::Pass),
            Phase::Stabilizing => self.stabilize().ok().map(TickOutcome::Stabilized),
            Phase::Idle | Phase::SwapPending => None,
        }
    }

    /// Tick until idle, returning the points scored on the way.
    pub fn run_to_idle(&mut self) -> u64 {
        let mut total = 0u64;
        while let Some(outcome) = self.tick() {
            if let TickOutcome::Pass(pass) = outcome {
                total = total.saturating_add(pass.score_delta);
            }
        }
        total
    }

    /// Remove `cleared`, let each column fall, and top it up with new gems.
    fn collapse_and_refill(&mut self, cleared: &MatchSet, emit: bool) {
        let rows = self.grid.rows();
        for col in 0..self.grid.columns() {
            let gone: ArrayVec<u8, { MAX_DIMENSION as usize }> =
                cleared.rows_in_column(col).collect();
            if gone.is_empty() {
                continue;
            }

            let mut write = 0u8;
            for read in 0..rows {
                let token = self.grid.at(col, read);
                if gone.contains(&read) {
                    if emit {
                        self.events.push(BoardEvent::CellCleared {
                            coord: Coord::new(col, read),
                            token,
                        });
                    }
                    continue;
                }
                if write != read {
                    self.grid.put(col, write, token);
                    if emit {
                        self.events.push(BoardEvent::CellMoved {
                            from: Coord::new(col, read),
                            to: Coord::new(col, write),
                            token,
                        });
                    }
                }
                write += 1;
            }

            for (offset, row) in (write..rows).enumerate() {
                let token = self.rng.next_token(self.config.palette_size);
                self.grid.put(col, row, token);
                if emit {
                    self.events.push(BoardEvent::CellSpawned {
                        coord: Coord::new(col, row),
                        token,
                        drop_rows: offset as u8,
                    });
                }
            }
        }
    }

    /// Cascade without scoring until no run is left. False if it never settled.
    fn settle_silently(&mut self) -> bool {
        for _ in 0..MAX_SETTLE_PASSES {
            let matches = find_matches(&self.grid);
            if matches.is_empty() {
                return true;
            }
            self.collapse_and_refill(&matches, false);
        }
        false
    }

    /// Make a stuck board playable: shuffle, then regenerate, then build one.
    fn reshuffle(&mut self) -> StabilizeResult {
        match shuffle(&mut self.grid, &mut self.rng) {
            Ok(attempts) => {
                info!(attempts, "board reshuffled");
                self.events.push(BoardEvent::Reshuffled { attempts });
                return StabilizeResult {
                    reshuffled: true,
                    regenerated: false,
                };
            }
            Err(e) => warn!(error = %e, "escalating to regeneration"),
        }

        let (columns, rows, palette) = (
            self.config.columns,
            self.config.rows,
            self.config.palette_size,
        );
        for round in 1..=MAX_REGENERATIONS {
            self.grid = Grid::random(columns, rows, palette, &mut self.rng);
            if self.settle_silently() && is_settled(&self.grid) {
                warn!(round, "board regenerated");
                self.events
                    .push(BoardEvent::Regenerated { constructive: false });
                return StabilizeResult {
                    reshuffled: true,
                    regenerated: true,
                };
            }
        }

        warn!("regeneration failed; using constructive layout");
        self.grid = constructive_layout(columns, rows);
        self.events
            .push(BoardEvent::Regenerated { constructive: true });
        StabilizeResult {
            reshuffled: true,
            regenerated: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::ScriptedSource;
    use crate::types::Token;

    fn engine_from(layout: &str, refill: Vec<u32>) -> BoardEngine<ScriptedSource> {
        let grid = Grid::parse(layout).unwrap();
        BoardEngine::from_grid(BoardConfig::default(), grid, ScriptedSource::new(refill)).unwrap()
    }

    #[test]
    fn initialize_produces_settled_board() {
        for seed in 1..20 {
            let engine = BoardEngine::initialize(BoardConfig::default().with_seed(seed)).unwrap();
            assert!(find_matches(engine.grid()).is_empty(), "seed {seed}");
            assert!(movement_possible(engine.grid()), "seed {seed}");
            assert_eq!(engine.phase(), Phase::Idle);
            assert_eq!(engine.score(), 0);
            assert!(engine.events().is_empty());
        }
    }

    #[test]
    fn same_seed_same_board() {
        let a = BoardEngine::initialize(BoardConfig::default().with_seed(42)).unwrap();
        let b = BoardEngine::initialize(BoardConfig::default().with_seed(42)).unwrap();
        assert_eq!(a.grid(), b.grid());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let err = BoardEngine::initialize(BoardConfig::default().with_palette_size(1)).unwrap_err();
        assert!(matches!(err, BoardError::InvalidConfig(_)));
    }

    #[test]
    fn from_grid_rejects_tokens_outside_palette() {
        let grid = Grid::parse("0123\n4567\n0123\n4567").unwrap();
        let config = BoardConfig::default().with_palette_size(5);
        let err = BoardEngine::from_grid(config, grid, SimpleRng::new(1)).unwrap_err();
        assert!(matches!(err, BoardError::InvalidLayout(_)));
    }

    #[test]
    fn swap_while_resolving_is_busy() {
        let mut engine = engine_from(
            "
            2345
            3452
            1201
            0010
            ",
            vec![3, 4, 5],
        );
        // Lifting the 1 out of the bottom row lines up four 0s.
        engine
            .request_swap(Coord::new(2, 0), Coord::new(2, 1))
            .unwrap();
        assert_eq!(engine.phase(), Phase::Resolving);
        let err = engine
            .request_swap(Coord::new(0, 0), Coord::new(1, 0))
            .unwrap_err();
        assert_eq!(err, BoardError::Busy { phase: Phase::Resolving });
    }

    #[test]
    fn step_out_of_phase_is_an_error() {
        let mut engine = BoardEngine::initialize(BoardConfig::default()).unwrap();
        assert_eq!(
            engine.step_resolve(),
            Err(BoardError::WrongPhase {
                expected: Phase::Resolving,
                actual: Phase::Idle
            })
        );
        assert_eq!(
            engine.stabilize(),
            Err(BoardError::WrongPhase {
                expected: Phase::Stabilizing,
                actual: Phase::Idle
            })
        );
        assert_eq!(engine.tick(), None);
    }

    #[test]
    fn collapse_moves_survivors_down_and_spawns_on_top() {
        let mut engine = engine_from(
            "
            0123
            1230
            0301
            1012
            ",
            vec![4, 5],
        );
        // Clear (0,0) and (0,2): column 0 bottom-up is 1,0,1,0.
        let cleared: MatchSet = [Coord::new(0, 0), Coord::new(0, 2)].into_iter().collect();
        engine.collapse_and_refill(&cleared, true);

        let g = engine.grid();
        assert_eq!(g.get(0, 0), Ok(Token(0)));
        assert_eq!(g.get(0, 1), Ok(Token(0)));
        assert_eq!(g.get(0, 2), Ok(Token(4)));
        assert_eq!(g.get(0, 3), Ok(Token(5)));

        let events = engine.drain_events();
        let cleared_n = events
            .iter()
            .filter(|e| matches!(e, BoardEvent::CellCleared { .. }))
            .count();
        let moved: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                BoardEvent::CellMoved { from, to, .. } => Some((*from, *to)),
                _ => None,
            })
            .collect();
        assert_eq!(cleared_n, 2);
        assert_eq!(
            moved,
            vec![
                (Coord::new(0, 1), Coord::new(0, 0)),
                (Coord::new(0, 3), Coord::new(0, 1)),
            ]
        );
        assert!(events.contains(&BoardEvent::CellSpawned {
            coord: Coord::new(0, 3),
            token: Token(5),
            drop_rows: 1
        }));
    }
}
