//! Battery and converter bindings with offline analysis

use electrical::analysis::{
    converter_step_response, simulate_constant_current_charge, steady_state_temperature,
    time_to_soc,
};
use electrical::{BatteryConstant, ConverterConstant};
use numpy::ToPyArray;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;

/// Python-accessible battery pack parameters with analysis functions
#[pyclass(name = "Battery")]
#[derive(Clone)]
pub struct PyBattery {
    inner: BatteryConstant,
}

#[pymethods]
impl PyBattery {
    /// Create a pack, any argument left out keeps the 48-60 V default
    ///
    /// Args:
    ///     capacity_ah: Rated capacity in amp-hours
    ///     internal_resistance: Series resistance (ohms)
    ///     dt: Integration step used by the analysis functions (seconds)
    #[new]
    #[pyo3(signature = (
        capacity_ah=None,
        v_min=None,
        v_max=None,
        internal_resistance=None,
        dt=None
    ))]
    fn new(
        capacity_ah: Option<f64>,
        v_min: Option<f64>,
        v_max: Option<f64>,
        internal_resistance: Option<f64>,
        dt: Option<f64>,
    ) -> PyResult<Self> {
        let d = BatteryConstant::default();
        let inner = BatteryConstant {
            capacity_ah: capacity_ah.unwrap_or(d.capacity_ah),
            v_min: v_min.unwrap_or(d.v_min),
            v_max: v_max.unwrap_or(d.v_max),
            internal_resistance: internal_resistance.unwrap_or(d.internal_resistance),
            dt: dt.unwrap_or(d.dt),
            ..d
        };
        inner.validate().map_err(|e| PyValueError::new_err(e.to_string()))?;
        Ok(PyBattery { inner })
    }

    fn capacity_ah(&self) -> f64 {
        self.inner.capacity_ah
    }

    /// Open-circuit voltage at the given state of charge (0.0-1.0)
    fn ocv_at_soc(&self, soc: f64) -> f64 {
        self.inner.open_circuit_voltage_at(soc)
    }

    /// Simulate charging at constant current
    ///
    /// Returns a dict with numpy arrays: times, voltages, soc, temperature
    fn simulate_charge<'py>(
        &self,
        py: Python<'py>,
        current: f64,
        duration_s: f64,
    ) -> PyResult<Bound<'py, PyDict>> {
        let trace = simulate_constant_current_charge(&self.inner, current, duration_s)
            .map_err(|e| PyValueError::new_err(e.to_string()))?;

        let dict = PyDict::new_bound(py);
        dict.set_item("times", trace.times.to_pyarray_bound(py))?;
        dict.set_item("voltages", trace.voltages.to_pyarray_bound(py))?;
        dict.set_item("soc", trace.soc.to_pyarray_bound(py))?;
        dict.set_item("temperature", trace.temperature.to_pyarray_bound(py))?;

        Ok(dict)
    }

    /// Seconds from the reset SOC to `target_soc`, None if unreachable
    fn time_to_soc(&self, current: f64, target_soc: f64) -> Option<f64> {
        time_to_soc(&self.inner, current, target_soc)
    }

    fn steady_state_temperature(&self, current: f64) -> f64 {
        steady_state_temperature(&self.inner, current)
    }

    fn __repr__(&self) -> String {
        format!(
            "Battery(capacity={:.1} Ah, {:.1}-{:.1} V)",
            self.inner.capacity_ah, self.inner.v_min, self.inner.v_max
        )
    }
}

/// Open-loop inductor current response of the buck stage
///
/// Returns a dict with numpy arrays: times, inductor_current, efficiency
#[pyfunction]
#[pyo3(signature = (duty, load_voltage, duration_s, input_voltage=400.0, dt=1e-5))]
pub fn converter_response<'py>(
    py: Python<'py>,
    duty: f64,
    load_voltage: f64,
    duration_s: f64,
    input_voltage: f64,
    dt: f64,
) -> PyResult<Bound<'py, PyDict>> {
    let constants = ConverterConstant {
        input_voltage,
        dt,
        ..Default::default()
    };
    let trace = converter_step_response(&constants, duty, load_voltage, duration_s)
        .map_err(|e| PyValueError::new_err(e.to_string()))?;

    let dict = PyDict::new_bound(py);
    dict.set_item("times", trace.times.to_pyarray_bound(py))?;
    dict.set_item("inductor_current", trace.inductor_current.to_pyarray_bound(py))?;
    dict.set_item("efficiency", trace.efficiency.to_pyarray_bound(py))?;
    Ok(dict)
}
