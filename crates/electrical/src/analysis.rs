//! Offline charge and converter analysis
//!
//! These functions run whole traces in Rust and return plain vectors that can
//! be converted to numpy arrays or written to CSV by the caller.

use simcore::ConfigError;

use crate::battery::{Battery, BatteryConstant};
use crate::converter::{BuckConverter, ConverterConstant};

// ============================================================================
// Battery Analysis
// ============================================================================

/// Result of a constant-current charge simulation
#[derive(Debug, Clone, Default)]
pub struct ChargeTrace {
    pub times: Vec<f64>,
    pub voltages: Vec<f64>,
    pub soc: Vec<f64>,
    pub temperature: Vec<f64>,
}

/// Charge a battery from its reset state at constant current
///
/// # Arguments
/// * `constants` - Battery parameters; `constants.dt` is the sample period
/// * `current` - Constant charge current (A), negative to discharge
/// * `duration_s` - Total simulated time (seconds)
///
/// Stops early once the battery is full (charging) or empty (discharging).
pub fn simulate_constant_current_charge(
    constants: &BatteryConstant,
    current: f64,
    duration_s: f64,
) -> Result<ChargeTrace, ConfigError> {
    let mut battery = Battery::new(*constants)?;
    let dt = constants.dt;
    let n_steps = (duration_s / dt).round().max(0.0) as usize;

    let mut trace = ChargeTrace {
        times: Vec::with_capacity(n_steps + 1),
        voltages: Vec::with_capacity(n_steps + 1),
        soc: Vec::with_capacity(n_steps + 1),
        temperature: Vec::with_capacity(n_steps + 1),
    };

    let mut record = |t: f64, b: &Battery| {
        trace.times.push(t);
        trace.voltages.push(b.terminal_voltage());
        trace.soc.push(b.soc());
        trace.temperature.push(b.temperature());
    };

    record(0.0, &battery);
    for i in 1..=n_steps {
        battery.update(current);
        record(i as f64 * dt, &battery);

        let saturated =
            (current > 0.0 && battery.soc() >= 1.0) || (current < 0.0 && battery.soc() <= 0.0);
        if saturated {
            break;
        }
    }

    Ok(trace)
}

/// Time (s) for a battery at reset SOC to reach `target_soc` at constant
/// `current`. `None` when the target is unreachable in that direction.
pub fn time_to_soc(constants: &BatteryConstant, current: f64, target_soc: f64) -> Option<f64> {
    let start = Battery::new(*constants).ok()?;
    let delta = target_soc.clamp(0.0, 1.0) - start.soc();
    if delta == 0.0 {
        return Some(0.0);
    }
    let rate = constants.soc_rate(current);
    if rate == 0.0 || delta.signum() != rate.signum() {
        return None;
    }
    Some(delta / rate)
}

/// Temperature the lumped thermal node settles at under a constant current
pub fn steady_state_temperature(constants: &BatteryConstant, current: f64) -> f64 {
    constants.ambient_temperature
        + current * current * constants.internal_resistance * constants.thermal_resistance
}

// ============================================================================
// Converter Analysis
// ============================================================================

/// Open-loop converter trace at a fixed duty and load voltage
#[derive(Debug, Clone, Default)]
pub struct ConverterTrace {
    pub times: Vec<f64>,
    pub inductor_current: Vec<f64>,
    pub efficiency: Vec<f64>,
}

/// Step the converter from reset at constant duty against a fixed load voltage
pub fn converter_step_response(
    constants: &ConverterConstant,
    duty: f64,
    load_voltage: f64,
    duration_s: f64,
) -> Result<ConverterTrace, ConfigError> {
    let mut conv = BuckConverter::new(*constants)?;
    let n_steps = (duration_s / constants.dt).round().max(0.0) as usize;

    let mut trace = ConverterTrace {
        times: Vec::with_capacity(n_steps),
        inductor_current: Vec::with_capacity(n_steps),
        efficiency: Vec::with_capacity(n_steps),
    };

    for _ in 0..n_steps {
        conv.update(duty, load_voltage);
        trace.times.push(conv.time());
        trace.inductor_current.push(conv.inductor_current());
        trace.efficiency.push(conv.efficiency());
    }

    Ok(trace)
}
