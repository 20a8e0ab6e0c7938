//! Environment bindings

use charger_env::{
    ACTION_HIGH, ACTION_LOW, ConverterEnv, EnvConfig, OBSERVATION_HIGH, OBSERVATION_LOW,
    OBSERVATION_SIZE, StepInfo, VecEnv,
};
use ndarray::{Array2, aview1};
use numpy::{IntoPyArray, PyArray1, PyArray2, ToPyArray};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};

fn load_config(config_json: Option<&str>) -> PyResult<EnvConfig> {
    match config_json {
        Some(json) => {
            EnvConfig::from_json_str(json).map_err(|e| PyValueError::new_err(e.to_string()))
        }
        None => Ok(EnvConfig::default()),
    }
}

/// Convert step diagnostics to a Python dictionary.
///
/// The first eight keys keep the names the training and plotting scripts read.
fn step_info_to_dict<'py>(py: Python<'py>, info: &StepInfo) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new_bound(py);

    dict.set_item("Vbat", info.terminal_voltage)?;
    dict.set_item("SOC", info.soc)?;
    dict.set_item("Temp", info.temperature)?;
    dict.set_item("Efficiency", info.efficiency)?;
    dict.set_item("LimitedMode", info.limited_mode)?;
    dict.set_item("ripple", info.ripple)?;
    dict.set_item("eff_penalty", info.efficiency_penalty)?;
    dict.set_item("temp_penalty", info.temperature_penalty)?;

    dict.set_item("soc_penalty", info.soc_penalty)?;
    dict.set_item("duty", info.duty)?;
    dict.set_item("iref_pid", info.iref_pid)?;
    dict.set_item("iref_total", info.iref_total)?;
    dict.set_item("action", info.action)?;
    dict.set_item("time", info.time)?;
    dict.set_item("step", info.step)?;
    dict.set_item("termination_reason", info.termination_reason.map(|r| r.as_str()))?;

    Ok(dict)
}

/// Single charging episode with a Gym-style API
///
/// Args:
///     config_json: Optional JSON overriding any subset of the defaults
#[pyclass(name = "ConverterEnv")]
pub struct PyConverterEnv {
    inner: ConverterEnv,
}

#[pymethods]
impl PyConverterEnv {
    #[new]
    #[pyo3(signature = (config_json=None))]
    fn new(config_json: Option<&str>) -> PyResult<Self> {
        let inner = ConverterEnv::new(load_config(config_json)?)
            .map_err(|e| PyValueError::new_err(e.to_string()))?;
        Ok(PyConverterEnv { inner })
    }

    /// Reset the episode; returns the initial observation
    fn reset<'py>(&mut self, py: Python<'py>) -> Bound<'py, PyArray1<f64>> {
        self.inner.reset().as_array().to_pyarray_bound(py)
    }

    /// Advance one step
    ///
    /// Returns (observation, reward, done, info)
    fn step<'py>(
        &mut self,
        py: Python<'py>,
        action: f64,
    ) -> PyResult<(Bound<'py, PyArray1<f64>>, f64, bool, Bound<'py, PyDict>)> {
        let r = self.inner.step(action);
        Ok((
            r.observation.as_array().to_pyarray_bound(py),
            r.reward,
            r.done,
            step_info_to_dict(py, &r.info)?,
        ))
    }

    /// Change the converter input voltage from the next step on
    fn set_input_voltage(&mut self, input_voltage: f64) -> PyResult<()> {
        self.inner
            .set_input_voltage(input_voltage)
            .map_err(|e| PyValueError::new_err(e.to_string()))
    }

    #[getter]
    fn time(&self) -> f64 {
        self.inner.time()
    }

    #[getter]
    fn horizon_steps(&self) -> u64 {
        self.inner.horizon_steps()
    }

    #[getter]
    fn last_iref_pid(&self) -> f64 {
        self.inner.last_iref_pid()
    }

    #[getter]
    fn last_iref_total(&self) -> f64 {
        self.inner.last_iref_total()
    }

    #[getter]
    fn last_action(&self) -> f64 {
        self.inner.last_action()
    }

    #[staticmethod]
    fn observation_low<'py>(py: Python<'py>) -> Bound<'py, PyArray1<f64>> {
        OBSERVATION_LOW.to_pyarray_bound(py)
    }

    #[staticmethod]
    fn observation_high<'py>(py: Python<'py>) -> Bound<'py, PyArray1<f64>> {
        OBSERVATION_HIGH.to_pyarray_bound(py)
    }

    #[staticmethod]
    fn action_low() -> f64 {
        ACTION_LOW
    }

    #[staticmethod]
    fn action_high() -> f64 {
        ACTION_HIGH
    }

    /// Effective configuration as JSON
    fn config_json(&self) -> PyResult<String> {
        self.inner
            .config()
            .to_json_string()
            .map_err(|e| PyValueError::new_err(e.to_string()))
    }

    fn __repr__(&self) -> String {
        format!(
            "ConverterEnv(t={:.4}s, soc={:.4}, v_bat={:.2} V)",
            self.inner.time(),
            self.inner.battery().soc(),
            self.inner.battery().terminal_voltage()
        )
    }
}

/// Batch of independent charging episodes
#[pyclass(name = "VecEnv")]
pub struct PyVecEnv {
    inner: VecEnv,
}

#[pymethods]
impl PyVecEnv {
    #[new]
    #[pyo3(signature = (n, config_json=None, auto_reset=true))]
    fn new(n: usize, config_json: Option<&str>, auto_reset: bool) -> PyResult<Self> {
        let inner = VecEnv::new(n, load_config(config_json)?)
            .map_err(|e| PyValueError::new_err(e.to_string()))?
            .with_auto_reset(auto_reset);
        Ok(PyVecEnv { inner })
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }

    /// Reset every member; returns an (n, 5) observation array
    fn reset<'py>(&mut self, py: Python<'py>) -> Bound<'py, PyArray2<f64>> {
        self.inner.reset_all().into_pyarray_bound(py)
    }

    /// Step every member with its own action
    ///
    /// Returns (observations[n, 5], rewards[n], dones[n], infos)
    #[allow(clippy::type_complexity)]
    fn step<'py>(
        &mut self,
        py: Python<'py>,
        actions: Vec<f64>,
    ) -> PyResult<(
        Bound<'py, PyArray2<f64>>,
        Bound<'py, PyArray1<f64>>,
        Vec<bool>,
        Bound<'py, PyList>,
    )> {
        let results = self
            .inner
            .step(&actions)
            .map_err(|e| PyValueError::new_err(e.to_string()))?;

        let rewards: Vec<f64> = results.iter().map(|r| r.reward).collect();
        let dones: Vec<bool> = results.iter().map(|r| r.done).collect();
        let infos = PyList::empty_bound(py);
        for r in &results {
            infos.append(step_info_to_dict(py, &r.info)?)?;
        }

        // Final observations of the stepped episodes, even if auto-reset since
        let mut obs = Array2::<f64>::zeros((results.len(), OBSERVATION_SIZE));
        for (mut row, r) in obs.rows_mut().into_iter().zip(&results) {
            row.assign(&aview1(r.observation.as_array()));
        }

        Ok((obs.into_pyarray_bound(py), rewards.to_pyarray_bound(py), dones, infos))
    }
}
