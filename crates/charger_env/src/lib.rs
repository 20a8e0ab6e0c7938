//! Battery charging environment for residual reinforcement learning.
//!
//! A buck converter charges a battery under cascaded PID control; the agent's
//! action is added to the current reference of the inner loop. See
//! [`ConverterEnv`] for the step/reset contract and [`VecEnv`] for batches of
//! independent episodes.

pub mod config;
pub mod env;
pub mod error;
pub mod observation;
pub mod reward;
pub mod vec_env;

pub use config::{BatteryTimebase, EnvConfig, EpisodeConfig};
pub use env::{ConverterEnv, StepInfo, StepResult, TerminationReason};
pub use error::EnvError;
pub use observation::{
    ACTION_HIGH, ACTION_LOW, OBSERVATION_HIGH, OBSERVATION_LOW, OBSERVATION_SIZE, Observation,
};
pub use reward::{RewardComponents, RewardConfig};
pub use vec_env::VecEnv;
