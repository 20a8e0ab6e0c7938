//! Vectorised environments for parallel rollouts.
//!
//! Each member is a fully independent `ConverterEnv`; nothing is shared, so
//! stepping one never affects another.

use ndarray::Array2;

use crate::config::EnvConfig;
use crate::env::{ConverterEnv, StepResult};
use crate::error::EnvError;
use crate::observation::{OBSERVATION_SIZE, Observation};

#[derive(Debug, Clone)]
pub struct VecEnv {
    envs: Vec<ConverterEnv>,
    auto_reset: bool,
}

impl VecEnv {
    pub fn new(n: usize, config: EnvConfig) -> Result<Self, EnvError> {
        let template = ConverterEnv::new(config)?;
        log::debug!("vectorised environment with {n} members");
        Ok(Self {
            envs: vec![template; n],
            auto_reset: false,
        })
    }

    /// Reset members as soon as their episode finishes. The returned step
    /// result still carries the final observation of the finished episode.
    pub fn with_auto_reset(mut self, auto_reset: bool) -> Self {
        self.auto_reset = auto_reset;
        self
    }

    pub fn len(&self) -> usize {
        self.envs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.envs.is_empty()
    }

    pub fn reset_all(&mut self) -> Array2<f64> {
        for env in &mut self.envs {
            env.reset();
        }
        self.observations()
    }

    pub fn step(&mut self, actions: &[f64]) -> Result<Vec<StepResult>, EnvError> {
        if actions.len() != self.envs.len() {
            return Err(EnvError::ActionCount {
                expected: self.envs.len(),
                got: actions.len(),
            });
        }

        let auto_reset = self.auto_reset;
        Ok(self
            .envs
            .iter_mut()
            .zip(actions)
            .map(|(env, &action)| {
                let result = env.step(action);
                if auto_reset && result.done {
                    env.reset();
                }
                result
            })
            .collect())
    }

    /// Current observations, one row per member
    pub fn observations(&self) -> Array2<f64> {
        let mut out = Array2::zeros((self.envs.len(), OBSERVATION_SIZE));
        for (mut row, env) in out.rows_mut().into_iter().zip(&self.envs) {
            let obs: Observation = env.observation();
            for (dst, src) in row.iter_mut().zip(obs.as_array()) {
                *dst = *src;
            }
        }
        out
    }

    pub fn dones(&self) -> Vec<bool> {
        self.envs.iter().map(ConverterEnv::is_done).collect()
    }

    pub fn envs(&self) -> &[ConverterEnv] {
        &self.envs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EpisodeConfig;

    #[test]
    fn test_reset_all_shape() {
        let mut venv = VecEnv::new(3, EnvConfig::default()).unwrap();
        let obs = venv.reset_all();
        assert_eq!(obs.shape(), &[3, 5]);
        assert_eq!(obs[[2, 0]], 54.0);
        assert_eq!(obs[[1, 2]], 400.0);
        assert_eq!(obs[[0, 4]], 0.5);
    }

    #[test]
    fn test_members_are_independent() {
        let mut venv = VecEnv::new(2, EnvConfig::default()).unwrap();
        let mut solo = ConverterEnv::new(EnvConfig::default()).unwrap();

        for i in 0..200 {
            let a = (i as f64 * 0.1).sin();
            let results = venv.step(&[a, -1.0]).unwrap();
            assert_eq!(results[0], solo.step(a));
        }
        let obs = venv.observations();
        assert!(obs[[0, 1]] != obs[[1, 1]]);
    }

    #[test]
    fn test_rejects_action_count_mismatch() {
        let mut venv = VecEnv::new(2, EnvConfig::default()).unwrap();
        let err = venv.step(&[0.0]).unwrap_err();
        assert!(matches!(err, EnvError::ActionCount { expected: 2, got: 1 }));
    }

    #[test]
    fn test_auto_reset() {
        let config = EnvConfig {
            episode: EpisodeConfig {
                duration_s: 5e-4,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut venv = VecEnv::new(1, config).unwrap().with_auto_reset(true);
        let mut last = None;
        for _ in 0..5 {
            last = Some(venv.step(&[0.0]).unwrap().remove(0));
        }
        let last = last.unwrap();
        assert!(last.done);
        assert_eq!(last.info.step, 5);
        assert_eq!(venv.envs()[0].steps(), 0);
        assert_eq!(venv.dones(), vec![false]);
    }

    #[test]
    fn test_auto_reset_clears_input_voltage_sag() {
        let config = EnvConfig {
            episode: EpisodeConfig {
                duration_s: 5e-4,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut venv = VecEnv::new(1, config).unwrap().with_auto_reset(true);
        venv.envs[0].set_input_voltage(62.0).unwrap();
        for _ in 0..5 {
            assert!(venv.step(&[0.0]).unwrap()[0].info.limited_mode);
        }
        assert_eq!(venv.observations()[[0, 2]], 400.0);
        assert!(!venv.step(&[0.0]).unwrap()[0].info.limited_mode);
    }

    #[test]
    fn test_invalid_config() {
        let config = EnvConfig {
            episode: EpisodeConfig {
                dt: -1.0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(VecEnv::new(2, config), Err(EnvError::Config(_))));
    }
}
