//! FFT engine using realfft for real-valued signals
//!
//! Forward and inverse transforms share reusable buffers so the per-frame
//! STFT loop does not allocate.

use num_complex::Complex32;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use std::sync::Arc;

use crate::error::{DenoiseError, Result};

/// Forward/inverse real FFT pair of one size
pub struct FftEngine {
    /// FFT size (number of samples)
    fft_size: usize,

    /// Real-to-complex processor
    r2c: Arc<dyn RealToComplex<f32>>,

    /// Complex-to-real processor
    c2r: Arc<dyn ComplexToReal<f32>>,

    /// Reusable time-domain scratch (realfft overwrites its input)
    input_buffer: Vec<f32>,

    /// Reusable spectrum scratch for the inverse transform
    spectrum_buffer: Vec<Complex32>,
}

impl std::fmt::Debug for FftEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FftEngine")
            .field("fft_size", &self.fft_size)
            .finish()
    }
}

impl FftEngine {
    /// Create new FFT engine
    ///
    /// # Arguments
    /// * `fft_size` - FFT size (number of samples)
    pub fn new(fft_size: usize) -> Self {
        let mut planner = RealFftPlanner::<f32>::new();
        let r2c = planner.plan_fft_forward(fft_size);
        let c2r = planner.plan_fft_inverse(fft_size);

        Self {
            fft_size,
            r2c,
            c2r,
            input_buffer: vec![0.0; fft_size],
            spectrum_buffer: vec![Complex32::new(0.0, 0.0); fft_size / 2 + 1],
        }
    }

    /// Forward transform of one frame
    ///
    /// # Arguments
    /// * `frame` - Time-domain samples (zero-padded if shorter than fft_size)
    /// * `spectrum` - Output bins 0..=fft_size/2 (unnormalized)
    pub fn forward(&mut self, frame: &[f32], spectrum: &mut [Complex32]) -> Result<()> {
        let copy_len = frame.len().min(self.fft_size);
        self.input_buffer[..copy_len].copy_from_slice(&frame[..copy_len]);
        self.input_buffer[copy_len..].fill(0.0);

        self.r2c
            .process(&mut self.input_buffer, spectrum)
            .map_err(|e| DenoiseError::Transform(e.to_string()))
    }

    /// Inverse transform of one spectrum, normalized by 1/fft_size
    ///
    /// The DC (and, for even sizes, Nyquist) bins are treated as real.
    pub fn inverse(&mut self, spectrum: &[Complex32], output: &mut [f32]) -> Result<()> {
        if spectrum.len() != self.spectrum_buffer.len() {
            return Err(DenoiseError::Transform(format!(
                "expected {} bins, got {}",
                self.spectrum_buffer.len(),
                spectrum.len()
            )));
        }
        self.spectrum_buffer.copy_from_slice(spectrum);
        self.spectrum_buffer[0].im = 0.0;
        if self.fft_size % 2 == 0 {
            if let Some(nyquist) = self.spectrum_buffer.last_mut() {
                nyquist.im = 0.0;
            }
        }

        self.c2r
            .process(&mut self.spectrum_buffer, output)
            .map_err(|e| DenoiseError::Transform(e.to_string()))?;

        let scale = 1.0 / self.fft_size as f32;
        for s in output.iter_mut() {
            *s *= scale;
        }
        Ok(())
    }

    /// Get FFT size
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Get number of frequency bins (fft_size/2 + 1 for real FFT)
    pub fn num_bins(&self) -> usize {
        self.fft_size / 2 + 1
    }

    /// Centre frequency of a bin in Hz
    pub fn bin_to_hz(&self, bin: usize, sample_rate: f32) -> f32 {
        bin as f32 * sample_rate / self.fft_size as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_fft_dc_signal() {
        let mut fft = FftEngine::new(256);
        let mut spectrum = vec![Complex32::new(0.0, 0.0); fft.num_bins()];

        fft.forward(&[1.0; 256], &mut spectrum).unwrap();

        assert!((spectrum[0].re - 256.0).abs() < 1e-3);
        assert!(spectrum[10].norm() < 1e-3);
    }

    #[test]
    fn test_fft_sine_peak() {
        let mut fft = FftEngine::new(512);
        let mut spectrum = vec![Complex32::new(0.0, 0.0); fft.num_bins()];

        // Exactly bin 32
        let signal: Vec<f32> = (0..512)
            .map(|n| (2.0 * PI * 32.0 * n as f32 / 512.0).sin())
            .collect();
        fft.forward(&signal, &mut spectrum).unwrap();

        let (peak, _) = spectrum
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.norm().partial_cmp(&b.norm()).unwrap())
            .unwrap();
        assert_eq!(peak, 32);
        assert!((fft.bin_to_hz(peak, 16000.0) - 1000.0).abs() < 1e-3);
    }

    #[test]
    fn test_forward_inverse_identity() {
        let mut fft = FftEngine::new(128);
        let mut spectrum = vec![Complex32::new(0.0, 0.0); fft.num_bins()];
        let mut output = vec![0.0; 128];

        let signal: Vec<f32> = (0..128).map(|n| (0.3 * n as f32).cos() + 0.1).collect();
        fft.forward(&signal, &mut spectrum).unwrap();
        fft.inverse(&spectrum, &mut output).unwrap();

        for (a, b) in signal.iter().zip(output.iter()) {
            assert!((a - b).abs() < 1e-5);
        }
    }

    #[test]
    fn test_inverse_ignores_dc_imaginary() {
        let mut fft = FftEngine::new(16);
        let mut spectrum = vec![Complex32::new(0.0, 0.0); fft.num_bins()];
        spectrum[0] = Complex32::new(16.0, 1e-3);
        spectrum[8] = Complex32::new(0.0, 1e-3);

        let mut output = vec![0.0; 16];
        fft.inverse(&spectrum, &mut output).unwrap();

        assert!(output.iter().all(|&s| (s - 1.0).abs() < 1e-6));
    }
}
