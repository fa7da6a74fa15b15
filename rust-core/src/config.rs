//! Pipeline configuration
//!
//! One immutable value fixes every parameter of a processing session.

use std::fmt;
use std::str::FromStr;

use crate::error::{DenoiseError, Result};
use crate::spectrum::windowing::WindowType;

/// Adaptive filter update rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterVariant {
    /// Fixed step: w += 2·μ·e·x
    Lms,

    /// Step normalized by the reference window energy: w += μ/(‖x‖² + ε)·e·x
    #[default]
    Nlms,
}

impl FilterVariant {
    /// Step size used when the configuration leaves it unset
    pub fn default_step_size(&self) -> f32 {
        match self {
            FilterVariant::Lms => 0.001,
            FilterVariant::Nlms => 0.3,
        }
    }
}

impl FromStr for FilterVariant {
    type Err = DenoiseError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lms" => Ok(FilterVariant::Lms),
            "nlms" => Ok(FilterVariant::Nlms),
            other => Err(DenoiseError::invalid(format!(
                "unknown filter variant '{}' (expected lms or nlms)",
                other
            ))),
        }
    }
}

impl fmt::Display for FilterVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterVariant::Lms => write!(f, "lms"),
            FilterVariant::Nlms => write!(f, "nlms"),
        }
    }
}

/// Spectral enhancement stage selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnhancementVariant {
    #[default]
    Wiener,
    SpectralSubtraction,
    None,
}

impl FromStr for EnhancementVariant {
    type Err = DenoiseError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wiener" => Ok(EnhancementVariant::Wiener),
            "spectral_subtraction" | "spectral_sub" => Ok(EnhancementVariant::SpectralSubtraction),
            "none" => Ok(EnhancementVariant::None),
            other => Err(DenoiseError::invalid(format!(
                "unknown enhancement '{}' (expected wiener, spectral_subtraction or none)",
                other
            ))),
        }
    }
}

impl fmt::Display for EnhancementVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnhancementVariant::Wiener => write!(f, "wiener"),
            EnhancementVariant::SpectralSubtraction => write!(f, "spectral_subtraction"),
            EnhancementVariant::None => write!(f, "none"),
        }
    }
}

/// Full configuration of a processing session
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Sample rate in Hz shared by primary and reference
    pub sample_rate: u32,

    /// Adaptive filter length L (taps)
    pub filter_length: usize,

    /// Adaptive filter update rule
    pub filter_variant: FilterVariant,

    /// Step size μ; `None` picks the variant default
    pub step_size: Option<f32>,

    /// NLMS regularization ε
    pub nlms_epsilon: f32,

    /// Spectral enhancement stage
    pub enhancement: EnhancementVariant,

    /// STFT frame size N
    pub frame_size: usize,

    /// STFT hop size H (< N)
    pub hop_size: usize,

    /// STFT analysis/synthesis window
    pub window: WindowType,

    /// Percentile of per-bin magnitude taken as the noise ceiling
    pub noise_percentile: f32,

    /// Spectral subtraction oversubtraction factor α
    pub oversubtraction: f32,

    /// Spectral subtraction minimum residual power
    pub floor: f32,

    /// Zero samples prepended to the reference
    pub reference_delay: usize,

    /// Weight norm above which the adaptive filter is flagged as diverged
    pub divergence_limit: Option<f32>,

    /// Use the primary as its own reference when none is supplied
    pub self_reference_fallback: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            filter_length: 256,
            filter_variant: FilterVariant::Nlms,
            step_size: None,
            nlms_epsilon: 1e-6,
            enhancement: EnhancementVariant::Wiener,
            frame_size: 512,
            hop_size: 128,
            window: WindowType::Hann,
            noise_percentile: 20.0,
            oversubtraction: 1.0,
            floor: 0.002,
            reference_delay: 0,
            divergence_limit: None,
            self_reference_fallback: false,
        }
    }
}

impl PipelineConfig {
    /// Effective step size μ
    pub fn effective_step_size(&self) -> f32 {
        self.step_size
            .unwrap_or_else(|| self.filter_variant.default_step_size())
    }

    /// Check every parameter, failing on the first invalid one
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(DenoiseError::invalid("sample rate must be positive"));
        }
        if self.filter_length == 0 {
            return Err(DenoiseError::invalid("filter length must be positive"));
        }
        let mu = self.effective_step_size();
        if !mu.is_finite() || mu < 0.0 {
            return Err(DenoiseError::invalid(format!(
                "step size must be finite and non-negative (got {})",
                mu
            )));
        }
        if self.filter_variant == FilterVariant::Nlms
            && !(self.nlms_epsilon.is_finite() && self.nlms_epsilon > 0.0)
        {
            return Err(DenoiseError::invalid("NLMS epsilon must be positive"));
        }
        validate_framing(self.frame_size, self.hop_size)?;
        validate_percentile(self.noise_percentile)?;
        if !self.oversubtraction.is_finite() || self.oversubtraction < 0.0 {
            return Err(DenoiseError::invalid(
                "oversubtraction factor must be finite and non-negative",
            ));
        }
        if !self.floor.is_finite() || self.floor < 0.0 {
            return Err(DenoiseError::invalid("floor must be finite and non-negative"));
        }
        if let Some(limit) = self.divergence_limit {
            if !(limit.is_finite() && limit > 0.0) {
                return Err(DenoiseError::invalid("divergence limit must be positive"));
            }
        }
        Ok(())
    }
}

pub(crate) fn validate_framing(frame_size: usize, hop_size: usize) -> Result<()> {
    if frame_size == 0 {
        return Err(DenoiseError::invalid("frame size must be positive"));
    }
    if hop_size == 0 {
        return Err(DenoiseError::invalid("hop size must be positive"));
    }
    if hop_size >= frame_size {
        return Err(DenoiseError::invalid(format!(
            "hop size {} must be smaller than frame size {}",
            hop_size, frame_size
        )));
    }
    Ok(())
}

pub(crate) fn validate_percentile(percentile: f32) -> Result<()> {
    if !(0.0..=100.0).contains(&percentile) {
        return Err(DenoiseError::invalid(format!(
            "percentile {} outside [0, 100]",
            percentile
        )));
    }
    Ok(())
}
