//! Scoring module - cascade pass points and level goals
//!
//! One formula everywhere: a pass that clears `n` gems at combo `k` is worth
//! `n * base_points * k`. The combo counter starts each player swap at 0 and
//! is incremented before the pass is scored, so the first pass scores at
//! combo 1.

use crate::config::SessionConfig;

/// Score calculation result for one cascade pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PassScore {
    pub cleared: u32,
    pub combo: u32,
    pub points: u64,
}

/// Points for clearing `cleared` gems at combo multiplier `combo`.
pub fn pass_score(cleared: u32, base_points: u32, combo: u32) -> PassScore {
    let points = (cleared as u64)
        .saturating_mul(base_points as u64)
        .saturating_mul(combo as u64);
    PassScore {
        cleared,
        combo,
        points,
    }
}

/// Score needed to finish `level` (1-based).
pub fn target_score(level: u32, config: &SessionConfig) -> u64 {
    let steps = level.saturating_sub(1) as u64;
    config
        .base_target_score
        .saturating_add(steps.saturating_mul(config.target_score_increment))
}
