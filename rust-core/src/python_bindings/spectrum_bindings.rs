//! Python bindings for spectral enhancement

use numpy::{PyArray1, PyReadonlyArray1};
use pyo3::prelude::*;

use super::as_samples;
use crate::spectrum::{
    NoisePowerProfile, NoiseSpectrumEstimator, SpectralEnhancer, StftConfig, SuppressionPolicy,
    WindowType,
};

/// Window type enum exposed to Python
#[pyclass(name = "WindowType")]
#[derive(Clone)]
pub enum PyWindowType {
    Hann,
    Hamming,
    Blackman,
    Rectangular,
}

impl From<PyWindowType> for WindowType {
    fn from(py_win: PyWindowType) -> Self {
        match py_win {
            PyWindowType::Hann => WindowType::Hann,
            PyWindowType::Hamming => WindowType::Hamming,
            PyWindowType::Blackman => WindowType::Blackman,
            PyWindowType::Rectangular => WindowType::Rectangular,
        }
    }
}

/// Spectral enhancer exposed to Python
#[pyclass(name = "SpectralEnhancer")]
pub struct PySpectralEnhancer {
    enhancer: SpectralEnhancer,
}

#[pymethods]
impl PySpectralEnhancer {
    /// Create a new spectral enhancer
    ///
    /// Args:
    ///     method: "wiener" or "spectral_subtraction"
    ///     frame_size: STFT frame size
    ///     hop_size: STFT hop size
    ///     window_type: Analysis/synthesis window
    ///     percentile: Noise magnitude percentile
    ///     oversubtraction: Spectral subtraction factor alpha
    ///     floor: Spectral subtraction residual power floor
    #[new]
    #[pyo3(signature = (
        method="wiener",
        frame_size=512,
        hop_size=128,
        window_type=PyWindowType::Hann,
        percentile=20.0,
        oversubtraction=1.0,
        floor=0.002
    ))]
    fn new(
        method: &str,
        frame_size: usize,
        hop_size: usize,
        window_type: PyWindowType,
        percentile: f32,
        oversubtraction: f32,
        floor: f32,
    ) -> PyResult<Self> {
        let policy = match method {
            "wiener" => SuppressionPolicy::Wiener,
            "spectral_subtraction" | "spectral_sub" => SuppressionPolicy::SpectralSubtraction {
                oversubtraction,
                floor,
            },
            other => {
                return Err(pyo3::exceptions::PyValueError::new_err(format!(
                    "unknown enhancement method '{}'",
                    other
                )))
            }
        };
        let stft_config = StftConfig {
            frame_size,
            hop_size,
            window: window_type.into(),
        };
        let estimator = NoiseSpectrumEstimator::new(percentile)?;

        Ok(Self {
            enhancer: SpectralEnhancer::new(stft_config, estimator, policy)?,
        })
    }

    /// Enhance a signal using a noise profile estimated from itself
    fn enhance<'py>(&mut self, py: Python<'py>, signal: PyReadonlyArray1<f32>) -> PyResult<&'py PyArray1<f32>> {
        let output = self.enhancer.enhance(as_samples(&signal)?)?;
        Ok(PyArray1::from_vec(py, output))
    }

    /// Enhance a signal with a caller-supplied per-bin noise power profile
    fn enhance_with_profile<'py>(
        &mut self,
        py: Python<'py>,
        signal: PyReadonlyArray1<f32>,
        noise_power: PyReadonlyArray1<f32>,
    ) -> PyResult<&'py PyArray1<f32>> {
        let profile = NoisePowerProfile::from_vec(as_samples(&noise_power)?.to_vec())?;
        let output = self.enhancer.enhance_with_profile(as_samples(&signal)?, &profile)?;
        Ok(PyArray1::from_vec(py, output))
    }

    /// Per-bin noise power estimated from a signal
    fn estimate_noise<'py>(
        &mut self,
        py: Python<'py>,
        signal: PyReadonlyArray1<f32>,
    ) -> PyResult<&'py PyArray1<f32>> {
        let profile = self.enhancer.estimate_profile(as_samples(&signal)?)?;
        Ok(PyArray1::from_slice(py, profile.as_slice()))
    }

    /// Output length for an input of `n` samples
    fn output_len(&self, n: usize) -> usize {
        self.enhancer.stft_config().output_len(n)
    }
}
