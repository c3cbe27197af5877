//! Core types module - shared data structures and constants
//!
//! This module defines the fundamental types used throughout the application.
//! All types are pure data structures with no external dependencies, making them
//! usable in any context (core logic, terminal rendering, AI protocol).
//!
//! # Board Dimensions
//!
//! The default playfield is a 7x7 grid:
//!
//! - **Columns**: 7 (indexed 0-6, left to right)
//! - **Rows**: 7 (indexed 0-6, bottom to top; row 0 is the bottom)
//!
//! Both are configurable at runtime within [`MIN_DIMENSION`]..=[`MAX_DIMENSION`].
//!
//! # Timing Constants
//!
//! Timing values are in milliseconds:
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `TICK_MS` | 16 | Fixed timestep interval (~60 FPS) |
//! | `CASCADE_STEP_MS` | 140 | Minimum spacing between cascade phases |
//! | `TIME_LIMIT_MS` | 120000 | Time allowed per level |
//! | `VICTORY_DELAY_MS` | 4000 | Pause on the victory overlay before the next level |
//!
//! # Examples
//!
//! ```
//! use tui_gems_types::{Coord, GameAction, Token, COLUMNS, ROWS};
//!
//! let a = Coord::new(3, 3);
//! assert!(a.is_adjacent(Coord::new(3, 4)));
//! assert!(!a.is_adjacent(Coord::new(4, 4)));
//!
//! assert_eq!(Token(2).as_char(), '2');
//! assert_eq!(GameAction::from_str("select"), Some(GameAction::Select));
//!
//! assert_eq!(COLUMNS, 7);
//! assert_eq!(ROWS, 7);
//! ```

/// Default number of columns.
pub const COLUMNS: u8 = 7;

/// Default number of rows.
pub const ROWS: u8 = 7;

/// Smallest accepted board side.
pub const MIN_DIMENSION: u8 = 4;

/// Largest accepted board side.
pub const MAX_DIMENSION: u8 = 16;

/// Default number of distinct gem types.
pub const DEFAULT_PALETTE_SIZE: u8 = 6;

/// Fewer than three gem types can never settle into a match-free board with moves.
pub const MIN_PALETTE_SIZE: u8 = 3;

/// One color per gem type in the terminal view.
pub const MAX_PALETTE_SIZE: u8 = 8;

/// Points per cleared gem in a combo-less pass.
pub const BASE_POINTS: u32 = 10;

/// Shortest run that counts as a match.
pub const MIN_RUN: usize = 3;

/// Fixed timestep interval in milliseconds (16ms ≈ 60 FPS)
pub const TICK_MS: u32 = 16;

/// Minimum spacing between two cascade phases in the terminal runner.
pub const CASCADE_STEP_MS: u32 = 140;

/// Time limit for a level.
pub const TIME_LIMIT_MS: u32 = 120_000;

/// Target score of level 1.
pub const BASE_TARGET_SCORE: u64 = 1000;

/// Target score increase per level.
pub const TARGET_SCORE_INCREMENT: u64 = 250;

/// Victory overlay duration before the next level starts.
pub const VICTORY_DELAY_MS: u32 = 4000;

/// Permutations tried by one shuffle before it gives up.
pub const MAX_SHUFFLE_ATTEMPTS: u32 = 1000;

/// Fresh random boards tried after a shuffle gives up.
pub const MAX_REGENERATIONS: u32 = 16;

/// Unscored cascade passes allowed while settling a fresh random fill.
pub const MAX_SETTLE_PASSES: u32 = 256;


/// A gem type, indexing into the palette `[0, palette_size)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Token(pub u8);

impl Token {
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Single-character form used by grid layouts and the protocol.
    ///
    /// Tokens 0-9 map to digits, 10+ to lowercase letters.
    pub fn as_char(self) -> char {
        std::char::from_digit(self.0 as u32, 36).unwrap_or('?')
    }

    /// Inverse of [`Token::as_char`].
    pub fn from_char(ch: char) -> Option<Self> {
        ch.to_digit(36).map(|d| Token(d as u8))
    }
}

/// Grid coordinate: `col` grows to the right, `row` grows upward from the bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Coord {
    pub col: u8,
    pub row: u8,
}

impl Coord {
    pub const fn new(col: u8, row: u8) -> Self {
        Self { col, row }
    }

    /// True when the two cells share an edge. Diagonals and the cell itself are not adjacent.
    pub fn is_adjacent(self, other: Coord) -> bool {
        let dc = self.col.abs_diff(other.col);
        let dr = self.row.abs_diff(other.row);
        dc + dr == 1
    }

    /// Shift by a signed delta. Returns None when either axis would go negative.
    ///
    /// Upper bounds are not checked here; the grid owns its dimensions.
    pub fn offset(self, dc: i8, dr: i8) -> Option<Coord> {
        let col = self.col as i16 + dc as i16;
        let row = self.row as i16 + dr as i16;
        if col < 0 || row < 0 || col > u8::MAX as i16 || row > u8::MAX as i16 {
            return None;
        }
        Some(Coord::new(col as u8, row as u8))
    }
}

impl std::fmt::Display for Coord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.col, self.row)
    }
}

/// An unordered pair of cells to exchange.
///
/// Constructed through [`Swap::new`], which stores the smaller coordinate first
/// so equal swaps compare equal regardless of argument order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Swap {
    pub a: Coord,
    pub b: Coord,
}

impl Swap {
    pub fn new(a: Coord, b: Coord) -> Self {
        if a <= b {
            Self { a, b }
        } else {
            Self { a: b, b: a }
        }
    }
}

/// Board engine phases.
///
/// `Idle → SwapPending → Resolving → Stabilizing → Idle`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    /// Waiting for the player.
    #[default]
    Idle,
    /// A swap request is being validated.
    SwapPending,
    /// Cascade passes are running.
    Resolving,
    /// Cascade finished; checking for a stalemate.
    Stabilizing,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::SwapPending => "swapPending",
            Phase::Resolving => "resolving",
            Phase::Stabilizing => "stabilizing",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Game actions that can be applied by the front end
///
/// These actions are used by both human input and the AI protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameAction {
    /// Move the cursor one row up
    CursorUp,
    /// Move the cursor one row down
    CursorDown,
    /// Move the cursor one column left
    CursorLeft,
    /// Move the cursor one column right
    CursorRight,
    /// Select the gem under the cursor (second selection attempts a swap)
    Select,
    /// Drop a pending selection
    Cancel,
    /// Highlight a swap that would make a match
    Hint,
    /// Toggle pause state
    Pause,
    /// Restart from level 1
    Restart,
}

impl GameAction {
    /// Parse action from string (for AI protocol)
    ///
    /// # Examples
    ///
    /// ```
    /// use tui_gems_types::GameAction;
    ///
    /// assert_eq!(GameAction::from_str("cursorLeft"), Some(GameAction::CursorLeft));
    /// assert_eq!(GameAction::from_str("RESTART"), Some(GameAction::Restart));
    /// assert_eq!(GameAction::from_str("unknown"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "cursorup" => Some(GameAction::CursorUp),
            "cursordown" => Some(GameAction::CursorDown),
            "cursorleft" => Some(GameAction::CursorLeft),
            "cursorright" => Some(GameAction::CursorRight),
            "select" => Some(GameAction::Select),
            "cancel" => Some(GameAction::Cancel),
            "hint" => Some(GameAction::Hint),
            "pause" => Some(GameAction::Pause),
            "restart" => Some(GameAction::Restart),
            _ => None,
        }
    }

    /// Convert to camelCase string for AI protocol
    pub fn as_str(&self) -> &'static str {
        match self {
            GameAction::CursorUp => "cursorUp",
            GameAction::CursorDown => "cursorDown",
            GameAction::CursorLeft => "cursorLeft",
            GameAction::CursorRight => "cursorRight",
            GameAction::Select => "select",
            GameAction::Cancel => "cancel",
            GameAction::Hint => "hint",
            GameAction::Pause => "pause",
            GameAction::Restart => "restart",
        }
    }
}
