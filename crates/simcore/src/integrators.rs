use crate::SimContext;

/// A generic integration strategy for a single scalar state.
pub trait Integrator {
    /// Advances `value` by one timestep given its time derivative.
    fn step(&self, ctx: &SimContext, value: f64, derivative: f64) -> f64;
}

/// Explicit (forward) Euler.
/// First-order accurate; the averaged converter and battery models are both
/// integrated with it at a fixed step.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForwardEuler;

impl Integrator for ForwardEuler {
    fn step(&self, ctx: &SimContext, value: f64, derivative: f64) -> f64 {
        value + derivative * ctx.dt
    }
}
