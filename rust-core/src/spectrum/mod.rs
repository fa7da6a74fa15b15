//! Time-frequency analysis and spectral noise suppression

pub mod fft;
pub mod windowing;
pub mod stft;
pub mod noise;
pub mod enhance;

pub use fft::FftEngine;
pub use windowing::WindowType;
pub use stft::{Stft, StftConfig, TimeFrequencyFrame};
pub use noise::{estimate_noise_power, NoisePowerProfile, NoiseSpectrumEstimator};
pub use enhance::{SpectralEnhancer, SuppressionPolicy};
