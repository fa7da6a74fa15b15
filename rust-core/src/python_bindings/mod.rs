//! PyO3 bindings for Python integration

use numpy::PyReadonlyArray1;
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use crate::error::DenoiseError;

mod filter_bindings;
mod pipeline_bindings;
mod spectrum_bindings;

impl From<DenoiseError> for PyErr {
    fn from(err: DenoiseError) -> Self {
        match err {
            DenoiseError::InvalidArgument(_) => PyValueError::new_err(err.to_string()),
            _ => PyRuntimeError::new_err(err.to_string()),
        }
    }
}

/// Borrow a numpy array as a contiguous slice
fn as_samples<'a>(array: &'a PyReadonlyArray1<'_, f32>) -> PyResult<&'a [f32]> {
    array
        .as_slice()
        .map_err(|e| PyValueError::new_err(e.to_string()))
}

/// Python module definition
#[pymodule]
fn anc_denoise(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_class::<filter_bindings::PyAdaptiveFilter>()?;
    m.add_class::<spectrum_bindings::PySpectralEnhancer>()?;
    m.add_class::<pipeline_bindings::PyProcessingPipeline>()?;

    m.add_class::<spectrum_bindings::PyWindowType>()?;

    Ok(())
}
