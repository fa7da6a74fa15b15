//! Window functions for STFT analysis and resynthesis
//!
//! Windows are generated in periodic (DFT-even) form, the form that satisfies
//! the constant-overlap-add condition at hops dividing the frame size.

use std::f32::consts::PI;

/// Window function types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowType {
    /// Hann window: w[n] = 0.5 - 0.5*cos(2πn/N)
    /// COLA at any hop N/k, k >= 2
    #[default]
    Hann,

    /// Hamming window: w[n] = 0.54 - 0.46*cos(2πn/N)
    Hamming,

    /// Blackman window: w[n] = 0.42 - 0.5*cos(2πn/N) + 0.08*cos(4πn/N)
    Blackman,

    /// Rectangular window (no windowing)
    Rectangular,
}

/// Generate periodic window coefficients
///
/// # Arguments
/// * `window_type` - Type of window function
/// * `length` - Number of samples (N)
///
/// # Returns
/// Vector of window coefficients w[n] for n = 0..N-1
pub fn generate_window(window_type: WindowType, length: usize) -> Vec<f32> {
    let m = length as f32;

    match window_type {
        WindowType::Hann => (0..length)
            .map(|n| 0.5 - 0.5 * (2.0 * PI * n as f32 / m).cos())
            .collect(),

        WindowType::Hamming => (0..length)
            .map(|n| 0.54 - 0.46 * (2.0 * PI * n as f32 / m).cos())
            .collect(),

        WindowType::Blackman => (0..length)
            .map(|n| {
                let angle = 2.0 * PI * n as f32 / m;
                0.42 - 0.5 * angle.cos() + 0.08 * (2.0 * angle).cos()
            })
            .collect(),

        WindowType::Rectangular => vec![1.0; length],
    }
}

/// Multiply a frame by a window in-place
pub fn apply_window_inplace(frame: &mut [f32], window: &[f32]) {
    for (s, &w) in frame.iter_mut().zip(window.iter()) {
        *s *= w;
    }
}

/// Overlap-added window sum over one hop period
///
/// Entry `i` is Σ_k w[i + k·hop]; a window is COLA at this hop when every
/// entry is equal.
pub fn cola_sum(window: &[f32], hop: usize) -> Vec<f32> {
    overlap_sum(window.iter().copied(), window.len(), hop)
}

/// Overlap-added squared window over one hop period
///
/// The weighted overlap-add denominator in steady state.
pub fn overlap_window_energy(window: &[f32], hop: usize) -> Vec<f32> {
    overlap_sum(window.iter().map(|&w| w * w), window.len(), hop)
}

fn overlap_sum(values: impl Iterator<Item = f32>, length: usize, hop: usize) -> Vec<f32> {
    let hop = hop.clamp(1, length.max(1));
    let mut sums = vec![0.0; hop];
    for (n, v) in values.enumerate().take(length) {
        sums[n % hop] += v;
    }
    sums
}

/// Check the constant-overlap-add property within a relative tolerance
pub fn is_cola(window: &[f32], hop: usize, tolerance: f32) -> bool {
    let sums = cola_sum(window, hop);
    let mean = sums.iter().sum::<f32>() / sums.len() as f32;
    if mean <= 0.0 {
        return false;
    }
    sums.iter().all(|&s| (s - mean).abs() <= tolerance * mean)
}
