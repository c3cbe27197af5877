//! Notifications emitted by the board engine.
//!
//! The engine queues these as it works; front ends drain them with
//! `BoardEngine::drain_events` to trigger animations or sounds. Nothing
//! waits on them.
//!
//! The terminal runner redraws from snapshots and only traces these by
//! [`BoardEvent::name`]. Adapter clients see the resulting board in
//! observations, not the individual cell events.

use crate::types::{Coord, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardEvent {
    /// A player swap was committed.
    Swapped { a: Coord, b: Coord },
    /// A gem was removed by a match.
    CellCleared { coord: Coord, token: Token },
    /// A surviving gem fell to a lower row.
    CellMoved { from: Coord, to: Coord, token: Token },
    /// A new gem entered at the top of a column.
    ///
    /// `drop_rows` is how many rows above the board it starts, for fall animations.
    CellSpawned { coord: Coord, token: Token, drop_rows: u8 },
    /// One cascade pass finished.
    PassComplete {
        pass: u32,
        cleared: u32,
        score_delta: u64,
        matches_remain: bool,
    },
    /// The board was stuck and its gems were reordered.
    Reshuffled { attempts: u32 },
    /// Shuffling failed and the board was rebuilt with new gems.
    Regenerated { constructive: bool },
}

impl BoardEvent {
    pub fn name(&self) -> &'static str {
        match self {
            BoardEvent::Swapped { .. } => "swapped",
            BoardEvent::CellCleared { .. } => "cellCleared",
            BoardEvent::CellMoved { .. } => "cellMoved",
            BoardEvent::CellSpawned { .. } => "cellSpawned",
            BoardEvent::PassComplete { .. } => "passComplete",
            BoardEvent::Reshuffled { .. } => "reshuffled",
            BoardEvent::Regenerated { .. } => "regenerated",
        }
    }
}
