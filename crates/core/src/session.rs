//! Session module - level goal, countdown and level progression
//!
//! A level is won when the score reaches the level's target before the timer
//! runs out. Whichever of the two happens first decides the level; the other
//! is ignored from then on. After a win the session waits out the victory
//! delay, then asks the caller to build the next level's board.

use crate::config::SessionConfig;
use crate::scoring::target_score;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    #[default]
    Playing,
    Victory,
    TimeUp,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Playing => "playing",
            SessionStatus::Victory => "victory",
            SessionStatus::TimeUp => "timeUp",
        }
    }

    pub fn is_over(&self) -> bool {
        *self != SessionStatus::Playing
    }
}

/// Transitions reported by [`Session::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Victory,
    TimeUp,
    /// The victory delay elapsed; build a new board and call `start_level`.
    AdvanceLevel,
}

#[derive(Debug, Clone)]
pub struct Session {
    config: SessionConfig,
    level: u32,
    status: SessionStatus,
    /// Goes negative once the limit passes.
    remaining_ms: i64,
    victory_wait_ms: u32,
    advance_reported: bool,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            level: 1,
            status: SessionStatus::Playing,
            remaining_ms: config.time_limit_ms as i64,
            victory_wait_ms: 0,
            advance_reported: false,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn target_score(&self) -> u64 {
        target_score(self.level, &self.config)
    }

    pub fn time_remaining_ms(&self) -> u32 {
        self.remaining_ms.max(0) as u32
    }

    /// Whole seconds left, rounded down.
    pub fn time_remaining_secs(&self) -> u32 {
        self.time_remaining_ms() / 1000
    }

    /// Fraction of the time limit left, 0.0..=1.0.
    pub fn time_fraction(&self) -> f32 {
        let limit = self.config.time_limit_ms.max(1) as f32;
        (self.time_remaining_ms() as f32 / limit).clamp(0.0, 1.0)
    }

    /// Fraction of the target reached, 0.0..=1.0.
    pub fn progress(&self, score: u64) -> f32 {
        let target = self.target_score().max(1) as f64;
        (score as f64 / target).clamp(0.0, 1.0) as f32
    }

    /// Advance the clock by `elapsed_ms` with the board's current `score`.
    pub fn tick(&mut self, elapsed_ms: u32, score: u64) -> Option<SessionEvent> {
        match self.status {
            SessionStatus::Playing => {
                if score >= self.target_score() {
                    self.status = SessionStatus::Victory;
                    self.victory_wait_ms = self.config.victory_delay_ms;
                    return Some(SessionEvent::Victory);
                }
                self.remaining_ms -= elapsed_ms as i64;
                if self.remaining_ms < 0 {
                    self.status = SessionStatus::TimeUp;
                    return Some(SessionEvent::TimeUp);
                }
                None
            }
            SessionStatus::Victory if !self.advance_reported => {
                self.victory_wait_ms = self.victory_wait_ms.saturating_sub(elapsed_ms);
                if self.victory_wait_ms == 0 {
                    self.advance_reported = true;
                    return Some(SessionEvent::AdvanceLevel);
                }
                None
            }
            SessionStatus::Victory | SessionStatus::TimeUp => None,
        }
    }

    /// Move to the next level with a full timer.
    pub fn start_level(&mut self) {
        self.level += 1;
        self.reset_timer();
    }

    /// Back to level 1 with a full timer.
    pub fn restart(&mut self) {
        self.level = 1;
        self.reset_timer();
    }

    fn reset_timer(&mut self) {
        self.status = SessionStatus::Playing;
        self.remaining_ms = self.config.time_limit_ms as i64;
        self.victory_wait_ms = 0;
        self.advance_reported = false;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short() -> Session {
        Session::new(SessionConfig {
            time_limit_ms: 1000,
            base_target_score: 100,
            target_score_increment: 50,
            victory_delay_ms: 300,
        })
    }

    #[test]
    fn timer_runs_out() {
        let mut s = short();
        assert_eq!(s.tick(600, 0), None);
        assert_eq!(s.time_remaining_ms(), 400);
        // Exactly zero is still in time.
        assert_eq!(s.tick(400, 0), None);
        assert_eq!(s.tick(1, 0), Some(SessionEvent::TimeUp));
        assert_eq!(s.status(), SessionStatus::TimeUp);
        assert_eq!(s.time_remaining_ms(), 0);
        // A late score does not turn a loss into a win.
        assert_eq!(s.tick(16, 500), None);
        assert_eq!(s.status(), SessionStatus::TimeUp);
    }

    #[test]
    fn victory_then_advance_after_delay() {
        let mut s = short();
        assert_eq!(s.tick(16, 100), Some(SessionEvent::Victory));
        assert_eq!(s.tick(200, 100), None);
        assert_eq!(s.tick(200, 100), Some(SessionEvent::AdvanceLevel));
        assert_eq!(s.tick(200, 100), None);

        s.start_level();
        assert_eq!(s.level(), 2);
        assert_eq!(s.target_score(), 150);
        assert_eq!(s.status(), SessionStatus::Playing);
        assert_eq!(s.time_remaining_ms(), 1000);
    }

    #[test]
    fn victory_freezes_timer() {
        let mut s = short();
        s.tick(500, 100);
        s.tick(5000, 100);
        assert_eq!(s.status(), SessionStatus::Victory);
        assert_eq!(s.time_remaining_ms(), 1000);
    }

    #[test]
    fn restart_returns_to_level_one() {
        let mut s = short();
        s.tick(16, 100);
        s.start_level();
        s.start_level();
        assert_eq!(s.level(), 3);
        s.restart();
        assert_eq!(s.level(), 1);
        assert_eq!(s.target_score(), 100);
    }

    #[test]
    fn progress_is_clamped() {
        let s = short();
        assert_eq!(s.progress(0), 0.0);
        assert_eq!(s.progress(50), 0.5);
        assert_eq!(s.progress(1000), 1.0);
        assert_eq!(s.time_fraction(), 1.0);
    }
}
