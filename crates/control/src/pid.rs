//! PID (Proportional-Integral-Derivative) Controller
//!
//! Error-driven controller with a fixed sample period and output saturation.
//! The integral gain is applied as the error is accumulated, so the integrator
//! holds the integral term itself.

use serde::{Deserialize, Serialize};
use simcore::{ConfigError, Model};

/// Configuration for a PID controller
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PidConfig {
    /// Proportional gain
    pub kp: f64,
    /// Integral gain
    pub ki: f64,
    /// Derivative gain
    pub kd: f64,
    /// Sample period (s)
    pub dt: f64,
    /// Minimum output value
    pub output_min: f64,
    /// Maximum output value
    pub output_max: f64,
}

impl Default for PidConfig {
    fn default() -> Self {
        Self {
            kp: 0.0,
            ki: 0.0,
            kd: 0.0,
            dt: 1e-5,
            output_min: 0.0,
            output_max: 1.0,
        }
    }
}

impl PidConfig {
    /// Create a P-only controller
    pub fn p(kp: f64) -> Self {
        Self { kp, ..Default::default() }
    }

    /// Create a PI controller
    pub fn pi(kp: f64, ki: f64) -> Self {
        Self { kp, ki, ..Default::default() }
    }

    /// Create a PID controller
    pub fn pid(kp: f64, ki: f64, kd: f64) -> Self {
        Self { kp, ki, kd, ..Default::default() }
    }

    /// Set output limits
    pub fn with_limits(mut self, min: f64, max: f64) -> Self {
        self.output_min = min;
        self.output_max = max;
        self
    }

    /// Set the sample period
    pub fn with_dt(mut self, dt: f64) -> Self {
        self.dt = dt;
        self
    }

    /// Outer battery-voltage loop: volts of error to amps of current reference
    pub fn voltage_loop() -> Self {
        Self::pid(29.999, 220.0, 0.00602).with_dt(1e-4).with_limits(0.0, 20.0)
    }

    /// Inner inductor-current loop: amps of error to duty ratio
    pub fn current_loop() -> Self {
        Self::pi(0.009, 26.0).with_dt(1e-4).with_limits(0.0, 1.0)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::require_positive("pid.dt", self.dt)?;
        ConfigError::require_ordered("pid.output", self.output_min, self.output_max)?;
        if !(self.kp.is_finite() && self.ki.is_finite() && self.kd.is_finite()) {
            return Err(ConfigError::NonFinite { field: "pid.gains" });
        }
        Ok(())
    }
}

/// PID Controller with state
#[derive(Debug, Clone)]
pub struct PidController {
    config: PidConfig,
    integral: f64,
    previous_error: f64,
}

impl PidController {
    /// Create a new controller with the given configuration
    pub fn new(config: PidConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            integral: 0.0,
            previous_error: 0.0,
        })
    }

    /// Update the controller with a new error sample and return the clamped output
    pub fn update(&mut self, error: f64) -> f64 {
        let c = &self.config;

        self.integral += error * c.ki * c.dt;
        let derivative = (error - self.previous_error) / c.dt;
        self.previous_error = error;

        let output = c.kp * error + self.integral + c.kd * derivative;
        output.clamp(c.output_min, c.output_max)
    }

    /// Get the current integral accumulator value
    pub fn integral(&self) -> f64 {
        self.integral
    }

    pub fn previous_error(&self) -> f64 {
        self.previous_error
    }

    /// Get a reference to the configuration
    pub fn config(&self) -> &PidConfig {
        &self.config
    }
}

impl Model for PidController {
    /// Clears the integrator and derivative history; gains and limits are kept.
    fn reset(&mut self) {
        self.integral = 0.0;
        self.previous_error = 0.0;
    }
}
