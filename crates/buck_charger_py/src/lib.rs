//! Python bindings for the buck converter charging environment
//!
//! Exposes the Gym-style step/reset contract to external RL tooling:
//! - Observations come back as numpy arrays
//! - Step diagnostics come back as a dict keyed for the existing plotting scripts
//! - Battery analysis runs whole traces in Rust and returns numpy arrays

use pyo3::prelude::*;

mod battery;
mod env;

pub use battery::*;
pub use env::*;

/// Python module for the charging simulation
#[pymodule]
fn buck_charger_py(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Environments
    m.add_class::<env::PyConverterEnv>()?;
    m.add_class::<env::PyVecEnv>()?;

    // Battery analysis
    m.add_class::<battery::PyBattery>()?;
    m.add_function(wrap_pyfunction!(battery::converter_response, m)?)?;

    Ok(())
}
