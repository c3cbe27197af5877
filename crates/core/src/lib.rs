//! Core board logic - pure, deterministic, and testable
//!
//! This crate holds every rule of the gem-swapping game. It does no terminal
//! or network I/O, so the same engine drives the terminal front end, the AI
//! adapter and headless tests.
//!
//! - **Deterministic**: a seed (or an injected [`RandomSource`]) fixes every
//!   refill and shuffle.
//! - **Stepwise**: a cascade advances one pass per call, so a driver can pace
//!   it against animations.
//! - **Self-healing**: a board with no legal move is reshuffled before the
//!   player sees it.
//!
//! # Module Structure
//!
//! - [`grid`]: the `columns x rows` token table, row 0 at the bottom
//! - [`matcher`]: horizontal and vertical runs of three or more
//! - [`analyzer`]: is any single swap able to make a match?
//! - [`shuffle`]: count-preserving reshuffle of a stuck board
//! - [`engine`]: the Idle / Resolving / Stabilizing state machine
//! - [`selection`], [`session`]: two-click input and level rules
//! - [`scoring`]: `cleared * base_points * combo`
//!
//! # Example
//!
//! ```
//! use tui_gems_core::{BoardConfig, BoardEngine};
//! use tui_gems_core::types::Phase;
//!
//! let mut engine = BoardEngine::initialize(BoardConfig::default().with_seed(7)).unwrap();
//! assert_eq!(engine.phase(), Phase::Idle);
//!
//! // Try every horizontal neighbour until one swap is accepted.
//! let grid = engine.grid_snapshot();
//! let accepted = grid
//!     .coords()
//!     .filter_map(|a| a.offset(1, 0).filter(|b| grid.contains(*b)).map(|b| (a, b)))
//!     .any(|(a, b)| engine.request_swap(a, b).is_ok());
//!
//! if accepted {
//!     let gained = engine.run_to_idle();
//!     assert!(gained >= 30);
//!     assert_eq!(engine.phase(), Phase::Idle);
//! }
//! ```

pub mod analyzer;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod grid;
pub mod matcher;
pub mod rng;
pub mod scoring;
pub mod selection;
pub mod session;
pub mod shuffle;
pub mod snapshot;

pub use tui_gems_types as types;

pub use analyzer::movement_possible;
pub use config::{BoardConfig, SessionConfig};
pub use engine::{BoardEngine, PassResult, StabilizeResult, TickOutcome};
pub use error::{BoardError, Result};
pub use events::BoardEvent;
pub use grid::Grid;
pub use matcher::{find_matches, has_matches, MatchSet};
pub use rng::{RandomSource, ScriptedSource, SimpleRng};
pub use scoring::{pass_score, target_score, PassScore};
pub use selection::{SelectOutcome, Selection};
pub use session::{Session, SessionEvent, SessionStatus};
pub use shuffle::{constructive_layout, is_settled, shuffle, shuffle_with_limit};
pub use snapshot::BoardSnapshot;
