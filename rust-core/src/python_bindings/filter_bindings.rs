//! Python bindings for the adaptive filter

use numpy::{PyArray1, PyReadonlyArray1};
use pyo3::prelude::*;

use super::as_samples;
use crate::config::FilterVariant;
use crate::filters::AdaptiveFilter;

/// LMS/NLMS adaptive filter exposed to Python
#[pyclass(name = "AdaptiveFilter")]
pub struct PyAdaptiveFilter {
    filter: AdaptiveFilter,
}

#[pymethods]
impl PyAdaptiveFilter {
    /// Create a new adaptive filter
    ///
    /// Args:
    ///     length: Number of taps
    ///     variant: "lms" or "nlms"
    ///     step_size: Step size mu (variant default when omitted)
    ///     epsilon: NLMS regularization
    ///     divergence_limit: Weight norm that flags divergence
    #[new]
    #[pyo3(signature = (length=256, variant="nlms", step_size=None, epsilon=1e-6, divergence_limit=None))]
    fn new(
        length: usize,
        variant: &str,
        step_size: Option<f32>,
        epsilon: f32,
        divergence_limit: Option<f32>,
    ) -> PyResult<Self> {
        let variant: FilterVariant = variant.parse()?;
        let mu = step_size.unwrap_or_else(|| variant.default_step_size());
        let mut filter = match variant {
            FilterVariant::Lms => AdaptiveFilter::lms(length, mu)?,
            FilterVariant::Nlms => AdaptiveFilter::nlms(length, mu, epsilon)?,
        };
        if let Some(limit) = divergence_limit {
            filter = filter.with_divergence_limit(limit)?;
        }
        Ok(Self { filter })
    }

    /// Cancel the reference-correlated part of the primary
    ///
    /// Returns:
    ///     Tuple of (error, estimate) numpy arrays
    fn process<'py>(
        &mut self,
        py: Python<'py>,
        reference: PyReadonlyArray1<f32>,
        primary: PyReadonlyArray1<f32>,
    ) -> PyResult<(&'py PyArray1<f32>, &'py PyArray1<f32>)> {
        let (error, estimate) = self
            .filter
            .process(as_samples(&reference)?, as_samples(&primary)?)?;
        Ok((PyArray1::from_vec(py, error), PyArray1::from_vec(py, estimate)))
    }

    /// Raise RuntimeError if the weights have diverged
    fn check_stability(&self) -> PyResult<()> {
        Ok(self.filter.check_stability()?)
    }

    /// Zero weights and history
    fn reset(&mut self) {
        self.filter.reset();
    }

    fn get_weights<'py>(&self, py: Python<'py>) -> &'py PyArray1<f32> {
        PyArray1::from_slice(py, self.filter.weights())
    }

    fn weight_norm(&self) -> f32 {
        self.filter.weight_norm()
    }

    fn is_diverged(&self) -> bool {
        self.filter.is_diverged()
    }

    fn __len__(&self) -> usize {
        self.filter.len()
    }
}
