//! Short-time Fourier analysis and overlap-add resynthesis
//!
//! Framing has no boundary extension: the first frame starts at sample 0 and
//! the tail is zero-padded up to a whole number of hops. Resynthesized output
//! therefore has `N + (frames - 1)·H` samples, which is up to `H - 1` samples
//! longer than the input (exactly `N` for inputs shorter than one frame).
//!
//! Spectra are scaled by `1/Σw`; resynthesis undoes the scaling and divides
//! by the overlapped squared window wherever it exceeds `1e-10`.

use ndarray::{Array2, ArrayView1};
use num_complex::Complex32;
use tracing::debug;

use super::fft::FftEngine;
use super::windowing::{apply_window_inplace, generate_window, WindowType};
use crate::config::validate_framing;
use crate::error::{DenoiseError, Result};

/// Below this overlapped window energy a sample is left unnormalized
const NORM_THRESHOLD: f32 = 1e-10;

/// STFT parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StftConfig {
    /// Frame size N (also the FFT size)
    pub frame_size: usize,

    /// Hop size H (< N)
    pub hop_size: usize,

    /// Analysis/synthesis window
    pub window: WindowType,
}

impl Default for StftConfig {
    fn default() -> Self {
        Self {
            frame_size: 512,
            hop_size: 128,
            window: WindowType::Hann,
        }
    }
}

impl StftConfig {
    /// Number of analysis frames for a signal of `len` samples
    pub fn num_frames(&self, len: usize) -> usize {
        if len == 0 {
            0
        } else if len <= self.frame_size {
            1
        } else {
            1 + (len - self.frame_size).div_ceil(self.hop_size)
        }
    }

    /// Resynthesized length for a signal of `len` samples
    pub fn output_len(&self, len: usize) -> usize {
        match self.num_frames(len) {
            0 => 0,
            frames => self.frame_size + (frames - 1) * self.hop_size,
        }
    }

    pub fn num_bins(&self) -> usize {
        self.frame_size / 2 + 1
    }
}

/// Complex spectrogram indexed by (frequency bin, time frame)
#[derive(Debug, Clone, PartialEq)]
pub struct TimeFrequencyFrame {
    data: Array2<Complex32>,
    signal_len: usize,
}

impl TimeFrequencyFrame {
    /// Wrap an existing (bins × frames) grid
    pub fn from_array(data: Array2<Complex32>, signal_len: usize) -> Self {
        Self { data, signal_len }
    }

    pub fn num_bins(&self) -> usize {
        self.data.nrows()
    }

    pub fn num_frames(&self) -> usize {
        self.data.ncols()
    }

    /// Length of the analyzed signal before tail padding
    pub fn signal_len(&self) -> usize {
        self.signal_len
    }

    pub fn data(&self) -> &Array2<Complex32> {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut Array2<Complex32> {
        &mut self.data
    }

    /// All time frames of one frequency bin
    pub fn bin(&self, bin: usize) -> ArrayView1<'_, Complex32> {
        self.data.row(bin)
    }

    /// All bins of one time frame
    pub fn frame(&self, frame: usize) -> ArrayView1<'_, Complex32> {
        self.data.column(frame)
    }
}

/// STFT analyzer/synthesizer with reusable FFT buffers
#[derive(Debug)]
pub struct Stft {
    config: StftConfig,
    fft: FftEngine,
    window: Vec<f32>,
    window_sum: f32,
    frame_buffer: Vec<f32>,
    spectrum_buffer: Vec<Complex32>,
}

impl Stft {
    /// Create an STFT for the given framing
    ///
    /// Fails with `InvalidArgument` on zero sizes or `hop >= frame`.
    pub fn new(config: StftConfig) -> Result<Self> {
        validate_framing(config.frame_size, config.hop_size)?;

        let window = generate_window(config.window, config.frame_size);
        let window_sum: f32 = window.iter().sum();

        Ok(Self {
            config,
            fft: FftEngine::new(config.frame_size),
            window,
            window_sum,
            frame_buffer: vec![0.0; config.frame_size],
            spectrum_buffer: vec![Complex32::new(0.0, 0.0); config.num_bins()],
        })
    }

    pub fn config(&self) -> &StftConfig {
        &self.config
    }

    pub fn window(&self) -> &[f32] {
        &self.window
    }

    /// Analyze a time-domain signal into a (bins × frames) grid
    pub fn analyze(&mut self, signal: &[f32]) -> Result<TimeFrequencyFrame> {
        let frames = self.config.num_frames(signal.len());
        let mut data = Array2::<Complex32>::zeros((self.config.num_bins(), frames));
        let scale = 1.0 / self.window_sum;

        for t in 0..frames {
            let start = t * self.config.hop_size;
            let end = (start + self.config.frame_size).min(signal.len());
            let available = end - start;

            self.frame_buffer[..available].copy_from_slice(&signal[start..end]);
            self.frame_buffer[available..].fill(0.0);
            apply_window_inplace(&mut self.frame_buffer, &self.window);

            self.fft.forward(&self.frame_buffer, &mut self.spectrum_buffer)?;

            for (dst, &src) in data.column_mut(t).iter_mut().zip(self.spectrum_buffer.iter()) {
                *dst = src * scale;
            }
        }

        debug!(
            samples = signal.len(),
            frames,
            bins = self.config.num_bins(),
            "stft analysis"
        );

        Ok(TimeFrequencyFrame::from_array(data, signal.len()))
    }

    /// Resynthesize a time-domain signal by weighted overlap-add
    pub fn synthesize(&mut self, frame: &TimeFrequencyFrame) -> Result<Vec<f32>> {
        let frames = frame.num_frames();
        if frames == 0 {
            return Ok(Vec::new());
        }
        if frame.num_bins() != self.config.num_bins() {
            return Err(DenoiseError::invalid(format!(
                "spectrum has {} bins, expected {}",
                frame.num_bins(),
                self.config.num_bins()
            )));
        }

        let n = self.config.frame_size;
        let hop = self.config.hop_size;
        let out_len = n + (frames - 1) * hop;
        let mut output = vec![0.0f32; out_len];
        let mut norm = vec![0.0f32; out_len];

        for t in 0..frames {
            for (dst, &src) in self.spectrum_buffer.iter_mut().zip(frame.frame(t).iter()) {
                *dst = src;
            }
            self.fft.inverse(&self.spectrum_buffer, &mut self.frame_buffer)?;

            let start = t * hop;
            let out = &mut output[start..start + n];
            let acc = &mut norm[start..start + n];
            for i in 0..n {
                let w = self.window[i];
                out[i] += self.frame_buffer[i] * self.window_sum * w;
                acc[i] += w * w;
            }
        }

        for (s, &energy) in output.iter_mut().zip(norm.iter()) {
            if energy > NORM_THRESHOLD {
                *s /= energy;
            }
        }

        Ok(output)
    }
}
