//! Stationary noise power estimation
//!
//! Speech energy is intermittent and sits above the noise floor, so a low
//! percentile of each bin's magnitude over time approximates the noise-only
//! level without a voice activity detector.

use tracing::debug;

use super::stft::TimeFrequencyFrame;
use crate::config::validate_percentile;
use crate::error::{DenoiseError, Result};

/// Default magnitude percentile taken as the per-bin noise ceiling
pub const DEFAULT_PERCENTILE: f32 = 20.0;

/// Estimated noise power, one non-negative value per frequency bin
#[derive(Debug, Clone, PartialEq)]
pub struct NoisePowerProfile {
    power: Vec<f32>,
}

impl NoisePowerProfile {
    /// Profile of zero noise (every gain becomes pass-through)
    pub fn zeros(num_bins: usize) -> Self {
        Self {
            power: vec![0.0; num_bins],
        }
    }

    /// Wrap caller-supplied per-bin power values
    pub fn from_vec(power: Vec<f32>) -> Result<Self> {
        if let Some(bad) = power.iter().find(|p| !(p.is_finite() && **p >= 0.0)) {
            return Err(DenoiseError::invalid(format!(
                "noise power must be finite and non-negative (got {})",
                bad
            )));
        }
        Ok(Self { power })
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.power
    }

    pub fn len(&self) -> usize {
        self.power.len()
    }

    pub fn is_empty(&self) -> bool {
        self.power.is_empty()
    }
}

/// Percentile-based noise floor estimator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseSpectrumEstimator {
    percentile: f32,
}

impl Default for NoiseSpectrumEstimator {
    fn default() -> Self {
        Self {
            percentile: DEFAULT_PERCENTILE,
        }
    }
}

impl NoiseSpectrumEstimator {
    /// # Arguments
    /// * `percentile` - Magnitude percentile in [0, 100]
    pub fn new(percentile: f32) -> Result<Self> {
        validate_percentile(percentile)?;
        Ok(Self { percentile })
    }

    pub fn percentile(&self) -> f32 {
        self.percentile
    }

    /// Estimate noise power for every bin of a spectrogram
    ///
    /// Per bin: take the magnitude percentile over all frames as a threshold,
    /// clip every frame's magnitude to it, and average the clipped power.
    pub fn estimate(&self, frame: &TimeFrequencyFrame) -> Result<NoisePowerProfile> {
        estimate_noise_power(frame, self.percentile)
    }
}

/// Estimate per-bin noise power at the given magnitude percentile
///
/// Fails with `InvalidArgument` for a percentile outside [0, 100] or a
/// spectrogram without time frames.
pub fn estimate_noise_power(frame: &TimeFrequencyFrame, percentile: f32) -> Result<NoisePowerProfile> {
    validate_percentile(percentile)?;
    let frames = frame.num_frames();
    if frames == 0 {
        return Err(DenoiseError::invalid(
            "cannot estimate noise from a spectrogram with no time frames",
        ));
    }

    let mut magnitudes = vec![0.0f32; frames];
    let mut sorted = vec![0.0f32; frames];
    let mut power = Vec::with_capacity(frame.num_bins());

    for bin in 0..frame.num_bins() {
        for (m, z) in magnitudes.iter_mut().zip(frame.bin(bin).iter()) {
            *m = z.norm();
        }
        sorted.copy_from_slice(&magnitudes);
        sorted.sort_by(|a, b| a.total_cmp(b));
        let threshold = percentile_of_sorted(&sorted, percentile);

        let clipped_power: f32 = magnitudes
            .iter()
            .map(|&m| {
                let c = m.min(threshold);
                c * c
            })
            .sum();
        power.push(clipped_power / frames as f32);
    }

    debug!(bins = power.len(), frames, percentile, "noise profile estimated");

    Ok(NoisePowerProfile { power })
}

/// Percentile with linear interpolation between order statistics
fn percentile_of_sorted(sorted: &[f32], percentile: f32) -> f32 {
    let last = sorted.len() - 1;
    let rank = percentile / 100.0 * last as f32;
    let lower = (rank.floor() as usize).min(last);
    let upper = (rank.ceil() as usize).min(last);
    let fraction = rank - lower as f32;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}
