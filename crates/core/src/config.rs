//! Board and session configuration.
//!
//! Defaults come from `tui_gems_types`; each config can be overridden from
//! environment variables (`GEMS_*`), the same way the adapter reads its
//! `GEMS_AI_*` settings.

use std::env;
use std::str::FromStr;

use crate::error::{BoardError, Result};
use crate::types::{
    BASE_POINTS, BASE_TARGET_SCORE, COLUMNS, DEFAULT_PALETTE_SIZE, MAX_DIMENSION,
    MAX_PALETTE_SIZE, MIN_DIMENSION, MIN_PALETTE_SIZE, ROWS, TARGET_SCORE_INCREMENT,
    TIME_LIMIT_MS, VICTORY_DELAY_MS,
};

/// Parameters of one board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardConfig {
    pub columns: u8,
    pub rows: u8,
    /// Number of distinct gem types.
    pub palette_size: u8,
    /// Points per cleared gem before the combo multiplier.
    pub base_points: u32,
    pub seed: u32,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            columns: COLUMNS,
            rows: ROWS,
            palette_size: DEFAULT_PALETTE_SIZE,
            base_points: BASE_POINTS,
            seed: 1,
        }
    }
}

impl BoardConfig {
    pub fn with_seed(mut self, seed: u32) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_palette_size(mut self, palette_size: u8) -> Self {
        self.palette_size = palette_size;
        self
    }

    pub fn with_dimensions(mut self, columns: u8, rows: u8) -> Self {
        self.columns = columns;
        self.rows = rows;
        self
    }

    /// Read overrides from `GEMS_COLUMNS`, `GEMS_ROWS`, `GEMS_PALETTE`,
    /// `GEMS_BASE_POINTS` and `GEMS_SEED`. Unset or unparsable values keep the default.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            columns: env_or("GEMS_COLUMNS", d.columns),
            rows: env_or("GEMS_ROWS", d.rows),
            palette_size: env_or("GEMS_PALETTE", d.palette_size),
            base_points: env_or("GEMS_BASE_POINTS", d.base_points),
            seed: env_or("GEMS_SEED", d.seed),
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (name, v) in [("columns", self.columns), ("rows", self.rows)] {
            if !(MIN_DIMENSION..=MAX_DIMENSION).contains(&v) {
                return Err(BoardError::InvalidConfig(format!(
                    "{name} must be within {MIN_DIMENSION}..={MAX_DIMENSION}, got {v}"
                )));
            }
        }
        if !(MIN_PALETTE_SIZE..=MAX_PALETTE_SIZE).contains(&self.palette_size) {
            return Err(BoardError::InvalidConfig(format!(
                "palette_size must be within {MIN_PALETTE_SIZE}..={MAX_PALETTE_SIZE}, got {}",
                self.palette_size
            )));
        }
        if self.base_points == 0 {
            return Err(BoardError::InvalidConfig(
                "base_points must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Level progression and timer parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub time_limit_ms: u32,
    pub base_target_score: u64,
    pub target_score_increment: u64,
    pub victory_delay_ms: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            time_limit_ms: TIME_LIMIT_MS,
            base_target_score: BASE_TARGET_SCORE,
            target_score_increment: TARGET_SCORE_INCREMENT,
            victory_delay_ms: VICTORY_DELAY_MS,
        }
    }
}

impl SessionConfig {
    /// Read overrides from `GEMS_TIME_LIMIT_SECS`, `GEMS_TARGET_SCORE` and
    /// `GEMS_TARGET_INCREMENT`.
    pub fn from_env() -> Self {
        let d = Self::default();
        let time_limit_ms = env::var("GEMS_TIME_LIMIT_SECS")
            .ok()
            .and_then(|s| s.trim().parse::<u32>().ok())
            .map(|secs| secs.saturating_mul(1000))
            .unwrap_or(d.time_limit_ms);
        Self {
            time_limit_ms,
            base_target_score: env_or("GEMS_TARGET_SCORE", d.base_target_score),
            target_score_increment: env_or("GEMS_TARGET_INCREMENT", d.target_score_increment),
            victory_delay_ms: d.victory_delay_ms,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.time_limit_ms == 0 {
            return Err(BoardError::InvalidConfig(
                "time limit must be positive".to_string(),
            ));
        }
        if self.base_target_score == 0 {
            return Err(BoardError::InvalidConfig(
                "target score must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_board_config_is_valid() {
        let config = BoardConfig::default();
        assert_eq!(config.columns, 7);
        assert_eq!(config.rows, 7);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_small_palette() {
        let config = BoardConfig::default().with_palette_size(2);
        assert!(matches!(
            config.validate(),
            Err(BoardError::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_out_of_range_dimensions() {
        assert!(BoardConfig::default().with_dimensions(3, 7).validate().is_err());
        assert!(BoardConfig::default().with_dimensions(7, 17).validate().is_err());
        assert!(BoardConfig::default().with_dimensions(4, 16).validate().is_ok());
    }

    #[test]
    fn rejects_zero_base_points() {
        let config = BoardConfig {
            base_points: 0,
            ..BoardConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn session_defaults_are_valid() {
        let config = SessionConfig::default();
        assert_eq!(config.time_limit_ms, 120_000);
        assert!(config.validate().is_ok());
        assert!(SessionConfig {
            time_limit_ms: 0,
            ..config
        }
        .validate()
        .is_err());
    }
}
