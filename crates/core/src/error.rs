//! Error types for board operations.

use crate::types::{Coord, Phase};

pub type Result<T> = std::result::Result<T, BoardError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    /// A coordinate outside the grid reached a grid accessor.
    #[error("cell ({col}, {row}) is outside the grid")]
    OutOfBounds { col: u8, row: u8 },

    #[error("cells {a} and {b} are not adjacent")]
    NotAdjacent { a: Coord, b: Coord },

    #[error("swapping {a} and {b} makes no match")]
    InvalidMove { a: Coord, b: Coord },

    #[error("board is busy ({phase})")]
    Busy { phase: Phase },

    #[error("expected phase {expected}, board is {actual}")]
    WrongPhase { expected: Phase, actual: Phase },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("invalid grid layout: {0}")]
    InvalidLayout(String),

    #[error("shuffle gave up after {attempts} attempts")]
    ShuffleExhausted { attempts: u32 },
}

impl BoardError {
    /// Stable snake_case code used by the AI protocol.
    pub fn code(&self) -> &'static str {
        match self {
            BoardError::OutOfBounds { .. } => "out_of_bounds",
            BoardError::NotAdjacent { .. } => "not_adjacent",
            BoardError::InvalidMove { .. } => "invalid_move",
            BoardError::Busy { .. } => "busy",
            BoardError::WrongPhase { .. } => "wrong_phase",
            BoardError::InvalidConfig(_) => "invalid_config",
            BoardError::InvalidLayout(_) => "invalid_layout",
            BoardError::ShuffleExhausted { .. } => "shuffle_exhausted",
        }
    }

    /// True for rejections of player input, as opposed to programming errors.
    pub fn is_rejected_move(&self) -> bool {
        matches!(
            self,
            BoardError::NotAdjacent { .. } | BoardError::InvalidMove { .. } | BoardError::Busy { .. }
        )
    }
}
