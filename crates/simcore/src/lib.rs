//! Shared simulation vocabulary for the charging workspace.
//!
//! Every physical or control component owns its state and exposes it through
//! the [`Model`] trait; time advances through [`SimContext`] and
//! [`EpisodeClock`].

pub mod clock;
pub mod error;
pub mod integrators;
pub mod traits;

pub use clock::EpisodeClock;
pub use error::ConfigError;
pub use integrators::{ForwardEuler, Integrator};
pub use traits::{Model, SimContext};
