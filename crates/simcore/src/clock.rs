//! Fixed-step episode clock.
//!
//! Time is derived from an integer step counter rather than accumulated, so an
//! episode of `duration / dt` steps ends on exactly that step regardless of
//! floating-point rounding in `dt`.

use crate::{ConfigError, Model, SimContext};

#[derive(Debug, Clone)]
pub struct EpisodeClock {
    dt: f64,
    horizon_steps: u64,
    steps: u64,
}

impl EpisodeClock {
    pub fn new(dt: f64, duration_s: f64) -> Result<Self, ConfigError> {
        ConfigError::require_positive("episode.dt", dt)?;
        ConfigError::require_positive("episode.duration_s", duration_s)?;
        let horizon_steps = ((duration_s / dt).round() as u64).max(1);
        log::debug!("episode clock: dt={dt:e}s, horizon={horizon_steps} steps");
        Ok(EpisodeClock {
            dt,
            horizon_steps,
            steps: 0,
        })
    }

    /// Advances one step and returns the context of the step just taken.
    pub fn advance(&mut self) -> SimContext {
        let ctx = self.context();
        self.steps += 1;
        ctx
    }

    /// Context at the current (not yet taken) step.
    pub fn context(&self) -> SimContext {
        SimContext {
            dt: self.dt,
            t: self.time(),
        }
    }

    pub fn time(&self) -> f64 {
        self.steps as f64 * self.dt
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn horizon_steps(&self) -> u64 {
        self.horizon_steps
    }

    pub fn expired(&self) -> bool {
        self.steps >= self.horizon_steps
    }
}

impl Model for EpisodeClock {
    fn reset(&mut self) {
        self.steps = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_horizon_is_exact_step_count() {
        let clock = EpisodeClock::new(1e-4, 10.0).unwrap();
        assert_eq!(clock.horizon_steps(), 100_000);
    }

    #[test]
    fn test_expires_on_horizon_step() {
        let mut clock = EpisodeClock::new(1e-4, 1e-2).unwrap();
        for _ in 0..99 {
            clock.advance();
            assert!(!clock.expired());
        }
        clock.advance();
        assert!(clock.expired());
        assert_eq!(clock.steps(), 100);
        assert_relative_eq!(clock.time(), 1e-2, epsilon = 1e-12);
    }

    #[test]
    fn test_advance_returns_pre_step_context() {
        let mut clock = EpisodeClock::new(0.5, 10.0).unwrap();
        let ctx0 = clock.advance();
        let ctx1 = clock.advance();
        assert_eq!(ctx0.t, 0.0);
        assert_eq!(ctx1.t, 0.5);
        assert_eq!(ctx1.dt, 0.5);
    }

    #[test]
    fn test_reset_restarts_episode() {
        let mut clock = EpisodeClock::new(0.1, 1.0).unwrap();
        for _ in 0..10 {
            clock.advance();
        }
        assert!(clock.expired());
        clock.reset();
        assert_eq!(clock.steps(), 0);
        assert!(!clock.expired());
    }

    #[test]
    fn test_rejects_zero_dt() {
        assert!(matches!(
            EpisodeClock::new(0.0, 10.0),
            Err(ConfigError::NonPositive { field: "episode.dt", .. })
        ));
        assert!(EpisodeClock::new(1e-4, -1.0).is_err());
    }
}
