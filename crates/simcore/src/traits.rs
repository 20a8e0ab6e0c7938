
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimContext {
    pub dt: f64,
    pub t: f64,
}

impl SimContext {
    pub fn new(dt: f64) -> Self {
        SimContext { dt, t: 0.0 }
    }
}

/// Anything holding mutable simulation state that can be returned to its
/// initial condition.
pub trait Model {
    fn reset(&mut self);
}
