//! Spectral-domain suppression of stationary noise
//!
//! Analyze → estimate noise floor → shape each bin → resynthesize. Gains are
//! computed independently per bin and per frame with no smoothing across
//! time, so output may show frame-to-frame gain discontinuities.
//!
//! The noise profile is recomputed on every call from the samples supplied;
//! nothing carries over between calls.

use num_complex::Complex32;
use tracing::debug;

use super::noise::{NoisePowerProfile, NoiseSpectrumEstimator};
use super::stft::{Stft, StftConfig, TimeFrequencyFrame};
use crate::config::{EnhancementVariant, PipelineConfig};
use crate::error::{DenoiseError, Result};

/// Regularizer of the Wiener gain denominator
pub const WIENER_EPSILON: f32 = 1e-10;

/// Per-bin suppression rule
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SuppressionPolicy {
    /// |S|² = max(|Z|² - α·N, floor), phase of Z kept
    SpectralSubtraction { oversubtraction: f32, floor: f32 },

    /// S = Z · Sxx / (Sxx + N + ε), Sxx = max(|Z|² - N, 0)
    Wiener,
}

impl SuppressionPolicy {
    /// Spectral subtraction with α = 1.0 and floor = 0.002
    pub fn spectral_subtraction() -> Self {
        SuppressionPolicy::SpectralSubtraction {
            oversubtraction: 1.0,
            floor: 0.002,
        }
    }

    /// Policy selected by a configuration, `None` when enhancement is off
    pub fn from_config(config: &PipelineConfig) -> Option<Self> {
        match config.enhancement {
            EnhancementVariant::Wiener => Some(SuppressionPolicy::Wiener),
            EnhancementVariant::SpectralSubtraction => Some(SuppressionPolicy::SpectralSubtraction {
                oversubtraction: config.oversubtraction,
                floor: config.floor,
            }),
            EnhancementVariant::None => None,
        }
    }

    fn validate(&self) -> Result<()> {
        if let SuppressionPolicy::SpectralSubtraction {
            oversubtraction,
            floor,
        } = *self
        {
            if !oversubtraction.is_finite() || oversubtraction < 0.0 {
                return Err(DenoiseError::invalid(
                    "oversubtraction factor must be finite and non-negative",
                ));
            }
            if !floor.is_finite() || floor < 0.0 {
                return Err(DenoiseError::invalid("floor must be finite and non-negative"));
            }
        }
        Ok(())
    }

    /// Apply the rule to one bin given its noise power
    #[inline]
    pub fn apply(&self, z: Complex32, noise_power: f32) -> Complex32 {
        match *self {
            SuppressionPolicy::SpectralSubtraction {
                oversubtraction,
                floor,
            } => {
                let power = (z.norm_sqr() - oversubtraction * noise_power).max(floor);
                Complex32::from_polar(power.sqrt(), z.arg())
            }
            SuppressionPolicy::Wiener => {
                let sxx = (z.norm_sqr() - noise_power).max(0.0);
                let gain = sxx / (sxx + noise_power + WIENER_EPSILON);
                z * gain
            }
        }
    }
}

/// STFT-based noise suppressor
#[derive(Debug)]
pub struct SpectralEnhancer {
    stft: Stft,
    estimator: NoiseSpectrumEstimator,
    policy: SuppressionPolicy,
}

impl SpectralEnhancer {
    pub fn new(
        stft_config: StftConfig,
        estimator: NoiseSpectrumEstimator,
        policy: SuppressionPolicy,
    ) -> Result<Self> {
        policy.validate()?;
        Ok(Self {
            stft: Stft::new(stft_config)?,
            estimator,
            policy,
        })
    }

    /// Enhancer with the default framing (512/128, Hann) and 20th percentile
    pub fn with_policy(policy: SuppressionPolicy) -> Result<Self> {
        Self::new(StftConfig::default(), NoiseSpectrumEstimator::default(), policy)
    }

    /// Enhancer described by a configuration, `None` when enhancement is off
    pub fn from_config(config: &PipelineConfig) -> Result<Option<Self>> {
        let Some(policy) = SuppressionPolicy::from_config(config) else {
            return Ok(None);
        };
        let stft_config = StftConfig {
            frame_size: config.frame_size,
            hop_size: config.hop_size,
            window: config.window,
        };
        let estimator = NoiseSpectrumEstimator::new(config.noise_percentile)?;
        Self::new(stft_config, estimator, policy).map(Some)
    }

    pub fn policy(&self) -> SuppressionPolicy {
        self.policy
    }

    pub fn stft_config(&self) -> &StftConfig {
        self.stft.config()
    }

    /// Suppress stationary noise in a time-domain signal
    ///
    /// Output length is `N + (frames - 1)·H` (see [`StftConfig::output_len`]);
    /// an empty input yields an empty output.
    pub fn enhance(&mut self, signal: &[f32]) -> Result<Vec<f32>> {
        if signal.is_empty() {
            return Ok(Vec::new());
        }
        let spectrum = self.stft.analyze(signal)?;
        let profile = self.estimator.estimate(&spectrum)?;
        self.resynthesize(&spectrum, &profile)
    }

    /// Suppress using a caller-supplied noise profile instead of estimating one
    pub fn enhance_with_profile(&mut self, signal: &[f32], profile: &NoisePowerProfile) -> Result<Vec<f32>> {
        if signal.is_empty() {
            return Ok(Vec::new());
        }
        let spectrum = self.stft.analyze(signal)?;
        self.resynthesize(&spectrum, profile)
    }

    /// Estimate the noise profile of a signal without modifying it
    pub fn estimate_profile(&mut self, signal: &[f32]) -> Result<NoisePowerProfile> {
        let spectrum = self.stft.analyze(signal)?;
        self.estimator.estimate(&spectrum)
    }

    fn resynthesize(&mut self, spectrum: &TimeFrequencyFrame, profile: &NoisePowerProfile) -> Result<Vec<f32>> {
        let shaped = self.suppress(spectrum, profile)?;
        let output = self.stft.synthesize(&shaped)?;
        debug!(
            input = spectrum.signal_len(),
            output = output.len(),
            policy = ?self.policy,
            "spectral enhancement"
        );
        Ok(output)
    }

    /// Apply the suppression rule to every bin, returning the shaped spectrum
    pub fn suppress(&self, spectrum: &TimeFrequencyFrame, profile: &NoisePowerProfile) -> Result<TimeFrequencyFrame> {
        if profile.len() != spectrum.num_bins() {
            return Err(DenoiseError::invalid(format!(
                "noise profile has {} bins, spectrum has {}",
                profile.len(),
                spectrum.num_bins()
            )));
        }

        let mut shaped = spectrum.clone();
        for (mut row, &noise) in shaped.data_mut().rows_mut().into_iter().zip(profile.as_slice()) {
            for z in row.iter_mut() {
                *z = self.policy.apply(*z, noise);
            }
        }
        Ok(shaped)
    }
}
