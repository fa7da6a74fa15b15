//! ANC Denoise - Adaptive noise cancellation and spectral enhancement core
//!
//! Two-stage speech denoising: an LMS/NLMS adaptive filter removes noise that
//! is correlated with a reference microphone, then STFT-domain spectral
//! subtraction or Wiener filtering suppresses the remaining stationary noise.
//! Optional Python bindings are built with the `python` feature.

// Suppress PyO3 non-local impl warnings (harmless macro-generated code)
#![cfg_attr(feature = "python", allow(non_local_definitions))]

pub mod audio;
pub mod config;
pub mod error;
pub mod filters;
pub mod pipeline;
pub mod spectrum;

#[cfg(feature = "python")]
pub mod python_bindings;

pub use config::{EnhancementVariant, FilterVariant, PipelineConfig};
pub use error::{DenoiseError, Result};
pub use filters::{AdaptiveFilter, UpdateRule};
pub use pipeline::{run, DegradedMode, PipelineOutput, ProcessingPipeline};
pub use spectrum::{
    NoisePowerProfile, NoiseSpectrumEstimator, SpectralEnhancer, StftConfig, SuppressionPolicy,
    WindowType,
};
