use serde::{Deserialize, Serialize};

pub const OBSERVATION_SIZE: usize = 5;

/// Advertised observation bounds, in `Observation` order
pub const OBSERVATION_LOW: [f64; OBSERVATION_SIZE] = [0.0, 0.0, 200.0, 0.0, 0.0];
pub const OBSERVATION_HIGH: [f64; OBSERVATION_SIZE] = [100.0, 50.0, 450.0, 100.0, 1.0];

/// Advertised action space. The environment itself clamps to the narrower
/// range in `ChargeControlConfig`.
pub const ACTION_LOW: f64 = -2.0;
pub const ACTION_HIGH: f64 = 2.0;

/// `[terminal voltage, inductor current, input voltage, temperature, SOC]`
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Observation(pub [f64; OBSERVATION_SIZE]);

impl Observation {
    pub fn new(
        terminal_voltage: f64,
        inductor_current: f64,
        input_voltage: f64,
        temperature: f64,
        soc: f64,
    ) -> Self {
        Observation([terminal_voltage, inductor_current, input_voltage, temperature, soc])
    }

    pub fn terminal_voltage(&self) -> f64 {
        self.0[0]
    }

    pub fn inductor_current(&self) -> f64 {
        self.0[1]
    }

    pub fn input_voltage(&self) -> f64 {
        self.0[2]
    }

    pub fn temperature(&self) -> f64 {
        self.0[3]
    }

    pub fn soc(&self) -> f64 {
        self.0[4]
    }

    pub fn as_array(&self) -> &[f64; OBSERVATION_SIZE] {
        &self.0
    }

    /// True when every entry lies inside the advertised bounds.
    ///
    /// The simulator does not enforce these: a reversed inductor current is a
    /// legitimate state and shows up here as out of bounds.
    pub fn within_bounds(&self) -> bool {
        self.0
            .iter()
            .zip(OBSERVATION_LOW.iter().zip(OBSERVATION_HIGH.iter()))
            .all(|(v, (lo, hi))| *v >= *lo && *v <= *hi)
    }
}

impl From<Observation> for [f64; OBSERVATION_SIZE] {
    fn from(obs: Observation) -> Self {
        obs.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessor_order() {
        let obs = Observation::new(54.0, 1.5, 400.0, 25.0, 0.5);
        assert_eq!(obs.terminal_voltage(), 54.0);
        assert_eq!(obs.inductor_current(), 1.5);
        assert_eq!(obs.input_voltage(), 400.0);
        assert_eq!(obs.temperature(), 25.0);
        assert_eq!(obs.soc(), 0.5);
        assert_eq!(<[f64; 5]>::from(obs), [54.0, 1.5, 400.0, 25.0, 0.5]);
    }

    #[test]
    fn test_bounds() {
        assert!(Observation::new(54.0, 1.5, 400.0, 25.0, 0.5).within_bounds());
        assert!(!Observation::new(54.0, -0.1, 400.0, 25.0, 0.5).within_bounds());
        assert!(!Observation::new(54.0, 1.5, 62.0, 25.0, 0.5).within_bounds());
    }
}
