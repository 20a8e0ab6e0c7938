use serde::{Deserialize, Serialize};
use simcore::{ConfigError, ForwardEuler, Integrator, Model, SimContext};

const SECONDS_PER_HOUR: f64 = 3600.0;
const INITIAL_SOC: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatteryConstant {
    pub capacity_ah: f64,
    /// Open-circuit voltage when empty
    pub v_min: f64,
    /// Open-circuit voltage when full
    pub v_max: f64,
    pub internal_resistance: f64,
    pub ambient_temperature: f64,
    pub thermal_capacitance: f64,
    pub thermal_resistance: f64,
    /// Integration step of the SOC and thermal states (s)
    pub dt: f64,
}

impl Default for BatteryConstant {
    fn default() -> Self {
        BatteryConstant {
            capacity_ah: 50.0,
            v_min: 48.0,
            v_max: 60.0,
            internal_resistance: 0.05,
            ambient_temperature: 25.0,
            thermal_capacitance: 100.0,
            thermal_resistance: 2.0,
            dt: 1e-3,
        }
    }
}

impl BatteryConstant {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::require_positive("battery.dt", self.dt)?;
        ConfigError::require_positive("battery.capacity_ah", self.capacity_ah)?;
        ConfigError::require_ordered("battery.voltage", self.v_min, self.v_max)?;
        ConfigError::require_positive("battery.thermal_capacitance", self.thermal_capacitance)?;
        ConfigError::require_positive("battery.thermal_resistance", self.thermal_resistance)?;
        if !self.internal_resistance.is_finite() || !self.ambient_temperature.is_finite() {
            return Err(ConfigError::NonFinite {
                field: "battery.internal_resistance/ambient_temperature",
            });
        }
        Ok(())
    }

    /// Linear open-circuit voltage curve between `v_min` (empty) and `v_max` (full).
    pub fn open_circuit_voltage_at(&self, soc: f64) -> f64 {
        let s = soc.clamp(0.0, 1.0);
        self.v_min + (self.v_max - self.v_min) * s
    }

    /// SOC gained per second at a given charging current.
    pub fn soc_rate(&self, charge_current: f64) -> f64 {
        charge_current / (self.capacity_ah * SECONDS_PER_HOUR)
    }

    pub fn thermal_time_constant(&self) -> f64 {
        self.thermal_resistance * self.thermal_capacitance
    }
}

fn temperature_derivative(temperature: f64, power_loss: f64, constants: &BatteryConstant) -> f64 {
    power_loss / constants.thermal_capacitance
        - (temperature - constants.ambient_temperature) / constants.thermal_time_constant()
}

/// Single-state (SOC) battery with a lumped thermal node.
///
/// Positive current charges the battery and raises the terminal voltage above
/// the open-circuit value.
#[derive(Debug, Clone)]
pub struct Battery {
    constants: BatteryConstant,
    soc: f64,
    terminal_voltage: f64,
    temperature: f64,
    power_loss: f64,
}

impl Battery {
    pub fn new(constants: BatteryConstant) -> Result<Self, ConfigError> {
        constants.validate()?;
        let mut battery = Battery {
            constants,
            soc: INITIAL_SOC,
            terminal_voltage: 0.0,
            temperature: constants.ambient_temperature,
            power_loss: 0.0,
        };
        battery.reset();
        log::debug!(
            "battery: {} Ah, {}-{} V, R={} ohm, dt={:e}s",
            constants.capacity_ah,
            constants.v_min,
            constants.v_max,
            constants.internal_resistance,
            constants.dt
        );
        Ok(battery)
    }

    /// Integrates one battery step with `charge_current` (A) and returns the
    /// new terminal voltage.
    pub fn update(&mut self, charge_current: f64) -> f64 {
        let ctx = SimContext::new(self.constants.dt);

        let soc = ForwardEuler.step(&ctx, self.soc, self.constants.soc_rate(charge_current));
        self.soc = soc.clamp(0.0, 1.0);

        let r_int = self.constants.internal_resistance;
        self.terminal_voltage = self.open_circuit_voltage() + charge_current * r_int;

        self.power_loss = charge_current * charge_current * r_int;
        let d_temp = temperature_derivative(self.temperature, self.power_loss, &self.constants);
        self.temperature = ForwardEuler.step(&ctx, self.temperature, d_temp);

        self.terminal_voltage
    }

    pub fn open_circuit_voltage(&self) -> f64 {
        self.constants.open_circuit_voltage_at(self.soc)
    }

    pub fn soc(&self) -> f64 {
        self.soc
    }

    pub fn terminal_voltage(&self) -> f64 {
        self.terminal_voltage
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Resistive loss of the last update (W)
    pub fn power_loss(&self) -> f64 {
        self.power_loss
    }

    pub fn constants(&self) -> &BatteryConstant {
        &self.constants
    }
}

impl Model for Battery {
    fn reset(&mut self) {
        self.soc = INITIAL_SOC;
        self.temperature = self.constants.ambient_temperature;
        self.terminal_voltage = self.open_circuit_voltage();
        self.power_loss = 0.0;
    }
}
