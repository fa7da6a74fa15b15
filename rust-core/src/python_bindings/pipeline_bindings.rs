//! Python bindings for the processing pipeline

use numpy::{PyArray1, PyReadonlyArray1};
use pyo3::prelude::*;

use super::as_samples;
use super::spectrum_bindings::PyWindowType;
use crate::config::PipelineConfig;
use crate::pipeline::{DegradedMode, PipelineOutput, ProcessingPipeline};

/// (anc, enhanced, degraded, diverged) as returned to Python
type PyOutput<'py> = (&'py PyArray1<f32>, &'py PyArray1<f32>, Option<&'static str>, bool);

fn to_python(py: Python<'_>, output: PipelineOutput) -> PyOutput<'_> {
    let degraded = output.degraded.map(|mode| match mode {
        DegradedMode::NoReference => "no_reference",
        DegradedMode::SelfReference => "self_reference",
    });
    (
        PyArray1::from_vec(py, output.anc),
        PyArray1::from_vec(py, output.enhanced),
        degraded,
        output.diverged,
    )
}

/// Processing pipeline exposed to Python
///
/// Keeps adaptive filter state between `process_block` calls.
#[pyclass(name = "ProcessingPipeline")]
pub struct PyProcessingPipeline {
    pipeline: ProcessingPipeline,
}

#[pymethods]
impl PyProcessingPipeline {
    /// Create a new pipeline session
    ///
    /// Args:
    ///     variant: "lms" or "nlms"
    ///     enhancement: "wiener", "spectral_subtraction" or "none"
    ///     step_size: Step size mu (variant default when omitted)
    #[new]
    #[pyo3(signature = (
        sample_rate=16000,
        filter_length=256,
        variant="nlms",
        step_size=None,
        enhancement="wiener",
        frame_size=512,
        hop_size=128,
        window_type=PyWindowType::Hann,
        noise_percentile=20.0,
        oversubtraction=1.0,
        floor=0.002,
        reference_delay=0,
        divergence_limit=None,
        self_reference_fallback=false
    ))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        sample_rate: u32,
        filter_length: usize,
        variant: &str,
        step_size: Option<f32>,
        enhancement: &str,
        frame_size: usize,
        hop_size: usize,
        window_type: PyWindowType,
        noise_percentile: f32,
        oversubtraction: f32,
        floor: f32,
        reference_delay: usize,
        divergence_limit: Option<f32>,
        self_reference_fallback: bool,
    ) -> PyResult<Self> {
        let config = PipelineConfig {
            sample_rate,
            filter_length,
            filter_variant: variant.parse()?,
            step_size,
            enhancement: enhancement.parse()?,
            frame_size,
            hop_size,
            window: window_type.into(),
            noise_percentile,
            oversubtraction,
            floor,
            reference_delay,
            divergence_limit,
            self_reference_fallback,
            ..PipelineConfig::default()
        };

        Ok(Self {
            pipeline: ProcessingPipeline::new(config)?,
        })
    }

    /// Process a whole recording
    ///
    /// Returns:
    ///     Tuple of (anc, enhanced, degraded_mode or None, diverged)
    #[pyo3(signature = (primary, reference=None))]
    fn run<'py>(
        &mut self,
        py: Python<'py>,
        primary: PyReadonlyArray1<f32>,
        reference: Option<PyReadonlyArray1<f32>>,
    ) -> PyResult<PyOutput<'py>> {
        let reference = reference.as_ref().map(as_samples).transpose()?;
        let output = self.pipeline.run(as_samples(&primary)?, reference)?;
        Ok(to_python(py, output))
    }

    /// Process one block of a stream
    #[pyo3(signature = (primary, reference=None))]
    fn process_block<'py>(
        &mut self,
        py: Python<'py>,
        primary: PyReadonlyArray1<f32>,
        reference: Option<PyReadonlyArray1<f32>>,
    ) -> PyResult<PyOutput<'py>> {
        let reference = reference.as_ref().map(as_samples).transpose()?;
        let output = self.pipeline.process_block(as_samples(&primary)?, reference)?;
        Ok(to_python(py, output))
    }

    /// Clear filter and delay state
    fn reset(&mut self) {
        self.pipeline.reset();
    }

    fn blocks_processed(&self) -> u64 {
        self.pipeline.blocks_processed()
    }
}
