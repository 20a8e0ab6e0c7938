//! Charge Controller
//!
//! Cascaded battery charging control: an outer voltage loop produces a current
//! reference, an external residual action shifts it, and an inner current
//! loop turns the current error into a converter duty ratio.
//!
//! The operating mode is classified from scratch on every call. Nothing about
//! the previous step's mode is remembered.

use serde::{Deserialize, Serialize};
use simcore::{ConfigError, Model};

use crate::pid::{PidConfig, PidController};

/// Duty commanded while the input voltage cannot support regulation
pub const LIMITED_DUTY: f64 = 1.0;

/// Per-step operating mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OperatingMode {
    /// Closed-loop voltage/current regulation
    #[default]
    Normal,
    /// Input voltage below target plus headroom: full duty, loops held reset
    Limited,
}

impl OperatingMode {
    pub fn classify(input_voltage: f64, target_voltage: f64, headroom: f64) -> Self {
        if input_voltage < target_voltage + headroom {
            OperatingMode::Limited
        } else {
            OperatingMode::Normal
        }
    }

    pub fn is_limited(self) -> bool {
        self == OperatingMode::Limited
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChargeControlConfig {
    /// Minimum margin of input voltage over the target voltage for normal mode (V)
    pub headroom: f64,
    /// Amps of current reference per unit of action
    pub action_gain: f64,
    pub action_min: f64,
    pub action_max: f64,
}

impl Default for ChargeControlConfig {
    fn default() -> Self {
        Self {
            headroom: 5.0,
            action_gain: 20.0,
            action_min: -1.0,
            action_max: 1.0,
        }
    }
}

impl ChargeControlConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::require_ordered("control.action", self.action_min, self.action_max)?;
        if !self.headroom.is_finite() || !self.action_gain.is_finite() {
            return Err(ConfigError::NonFinite {
                field: "control.headroom/action_gain",
            });
        }
        Ok(())
    }

    /// Current-reference offset (A) contributed by an action
    pub fn scaled_action(&self, action: f64) -> f64 {
        self.action_gain * action.clamp(self.action_min, self.action_max)
    }
}

/// Measurements and command for one control step
#[derive(Debug, Clone, Copy)]
pub struct ControlInput {
    pub target_voltage: f64,
    pub battery_voltage: f64,
    pub input_voltage: f64,
    pub inductor_current: f64,
    pub action: f64,
}

/// Outcome of one control step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlDecision {
    pub mode: OperatingMode,
    pub duty: f64,
    /// Current reference from the voltage loop alone (A)
    pub iref_pid: f64,
    /// Current reference after the action offset (A)
    pub iref_total: f64,
}

#[derive(Debug, Clone)]
pub struct ChargeController {
    config: ChargeControlConfig,
    voltage_loop: PidController,
    current_loop: PidController,
}

impl ChargeController {
    pub fn new(
        config: ChargeControlConfig,
        voltage_loop: PidConfig,
        current_loop: PidConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        log::debug!(
            "charge controller: voltage loop {:?}, current loop {:?}, headroom {} V",
            voltage_loop,
            current_loop,
            config.headroom
        );
        Ok(Self {
            config,
            voltage_loop: PidController::new(voltage_loop)?,
            current_loop: PidController::new(current_loop)?,
        })
    }

    pub fn decide(&mut self, input: ControlInput) -> ControlDecision {
        let mode = OperatingMode::classify(
            input.input_voltage,
            input.target_voltage,
            self.config.headroom,
        );

        match mode {
            OperatingMode::Limited => {
                self.voltage_loop.reset();
                self.current_loop.reset();
                ControlDecision {
                    mode,
                    duty: LIMITED_DUTY,
                    iref_pid: 0.0,
                    iref_total: 0.0,
                }
            }
            OperatingMode::Normal => {
                let iref_pid = self
                    .voltage_loop
                    .update(input.target_voltage - input.battery_voltage);
                let iref_total = iref_pid + self.config.scaled_action(input.action);
                let duty = self.current_loop.update(iref_total - input.inductor_current);
                ControlDecision {
                    mode,
                    duty,
                    iref_pid,
                    iref_total,
                }
            }
        }
    }

    pub fn voltage_loop(&self) -> &PidController {
        &self.voltage_loop
    }

    pub fn current_loop(&self) -> &PidController {
        &self.current_loop
    }

    pub fn config(&self) -> &ChargeControlConfig {
        &self.config
    }
}

impl Model for ChargeController {
    fn reset(&mut self) {
        self.voltage_loop.reset();
        self.current_loop.reset();
    }
}
