//! Averaged buck (DC-DC) converter.
//!
//! Continuous-time averaged model of the inductor current:
//!
//! L * dIL/dt = Vin * D - Vload
//!
//! The output node is held by the load (a battery when coupled), so the output
//! voltage simply mirrors the load voltage. Efficiency is a power-ratio proxy
//! `Pout / Pin`, not a loss model.

use serde::{Deserialize, Serialize};
use simcore::{ConfigError, ForwardEuler, Integrator, Model, SimContext};

const EFFICIENCY_EPSILON: f64 = 1e-9;
const NOMINAL_EFFICIENCY: f64 = 0.95;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConstant {
    pub input_voltage: f64,
    pub inductance: f64,
    /// Output capacitance. Carried for completeness of the averaged model; the
    /// output voltage is set by the load.
    pub capacitance: f64,
    pub dt: f64,
    /// Fixed resistive load, only meaningful when no battery is attached
    pub load_resistance: Option<f64>,
}

impl Default for ConverterConstant {
    fn default() -> Self {
        ConverterConstant {
            input_voltage: 400.0,
            inductance: 1e-3,
            capacitance: 470e-6,
            dt: 1e-5,
            load_resistance: None,
        }
    }
}

impl ConverterConstant {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::require_positive("converter.dt", self.dt)?;
        ConfigError::require_positive("converter.inductance", self.inductance)?;
        ConfigError::require_positive("converter.capacitance", self.capacitance)?;
        ConfigError::require_positive("converter.input_voltage", self.input_voltage)?;
        if let Some(r) = self.load_resistance {
            ConfigError::require_positive("converter.load_resistance", r)?;
        }
        Ok(())
    }
}

fn inductor_current_derivative(
    input_voltage: f64,
    duty: f64,
    load_voltage: f64,
    inductance: f64,
) -> f64 {
    (input_voltage * duty - load_voltage) / inductance
}

/// Output/input power ratio, never negative and finite for any finite current.
pub fn efficiency_estimate(
    input_voltage: f64,
    duty: f64,
    load_voltage: f64,
    inductor_current: f64,
) -> f64 {
    let i = inductor_current.abs();
    let p_in = input_voltage * duty * i;
    let p_out = load_voltage * i;
    (p_out / (p_in + EFFICIENCY_EPSILON)).max(0.0)
}

#[derive(Debug, Clone)]
pub struct BuckConverter {
    constants: ConverterConstant,
    /// Live source voltage; `constants.input_voltage` is the nominal one
    input_voltage: f64,
    inductor_current: f64,
    output_voltage: f64,
    efficiency: f64,
    time: f64,
    last_duty: f64,
}

impl BuckConverter {
    pub fn new(constants: ConverterConstant) -> Result<Self, ConfigError> {
        constants.validate()?;
        Ok(BuckConverter {
            constants,
            input_voltage: constants.input_voltage,
            inductor_current: 0.0,
            output_voltage: 0.0,
            efficiency: NOMINAL_EFFICIENCY,
            time: 0.0,
            last_duty: 0.0,
        })
    }

    /// Advances the converter one step with the given duty ratio against a
    /// load held at `load_voltage`. Duty is clamped to [0, 1]; the inductor
    /// current is left unbounded and may reverse.
    pub fn update(&mut self, duty: f64, load_voltage: f64) {
        let duty = duty.clamp(0.0, 1.0);
        let c = &self.constants;
        let ctx = SimContext {
            dt: c.dt,
            t: self.time,
        };

        let d_il =
            inductor_current_derivative(self.input_voltage, duty, load_voltage, c.inductance);
        self.inductor_current = ForwardEuler.step(&ctx, self.inductor_current, d_il);

        self.output_voltage = load_voltage;
        self.efficiency =
            efficiency_estimate(self.input_voltage, duty, load_voltage, self.inductor_current);

        self.time = ForwardEuler.step(&ctx, self.time, 1.0);
        self.last_duty = duty;
    }

    /// Load voltage implied by the fixed load resistance, if one is configured.
    pub fn resistive_load_voltage(&self) -> Option<f64> {
        self.constants
            .load_resistance
            .map(|r| self.inductor_current * r)
    }

    pub fn inductor_current(&self) -> f64 {
        self.inductor_current
    }

    pub fn output_voltage(&self) -> f64 {
        self.output_voltage
    }

    pub fn efficiency(&self) -> f64 {
        self.efficiency
    }

    /// Elapsed converter time (s)
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn input_voltage(&self) -> f64 {
        self.input_voltage
    }

    /// Changes the source voltage, e.g. to follow a varying PV string.
    /// `reset` restores the nominal value.
    pub fn set_input_voltage(&mut self, input_voltage: f64) -> Result<(), ConfigError> {
        ConfigError::require_positive("converter.input_voltage", input_voltage)?;
        self.input_voltage = input_voltage;
        Ok(())
    }

    /// Duty ratio applied on the last update, after clamping
    pub fn last_duty(&self) -> f64 {
        self.last_duty
    }

    pub fn constants(&self) -> &ConverterConstant {
        &self.constants
    }
}

impl Model for BuckConverter {
    fn reset(&mut self) {
        self.input_voltage = self.constants.input_voltage;
        self.inductor_current = 0.0;
        self.output_voltage = 0.0;
        self.time = 0.0;
        self.efficiency = NOMINAL_EFFICIENCY;
        self.last_duty = 0.0;
    }
}
