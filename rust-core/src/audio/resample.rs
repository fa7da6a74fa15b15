//! Sample-rate conversion for recordings captured off the processing rate

use rubato::{FftFixedIn, Resampler};
use tracing::debug;

use crate::error::{DenoiseError, Result};

/// Input frames per resampler chunk
const CHUNK_SIZE: usize = 1024;

/// Resample a mono signal from `from_rate` to `to_rate`
///
/// The resampler's group delay is removed, so output sample `k` lines up
/// with input time `k / to_rate`. Output length is `ceil(len * to / from)`.
pub fn resample(input: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    if from_rate == 0 || to_rate == 0 {
        return Err(DenoiseError::invalid("sample rates must be positive"));
    }
    if from_rate == to_rate || input.is_empty() {
        return Ok(input.to_vec());
    }

    let mut resampler = FftFixedIn::<f32>::new(from_rate as usize, to_rate as usize, CHUNK_SIZE, 2, 1)
        .map_err(|e| DenoiseError::Resample(e.to_string()))?;

    let delay = resampler.output_delay();
    let expected = ((input.len() as u64 * to_rate as u64 + from_rate as u64 - 1) / from_rate as u64) as usize;

    let mut output = Vec::with_capacity(expected + delay + CHUNK_SIZE);
    let mut chunk = Vec::with_capacity(CHUNK_SIZE);
    let mut pos = 0;

    // Zero-pad past the end until the delayed tail has been flushed
    while output.len() < expected + delay {
        let needed = resampler.input_frames_next();
        let available = input.len().saturating_sub(pos).min(needed);

        chunk.clear();
        chunk.extend_from_slice(&input[pos..pos + available]);
        chunk.resize(needed, 0.0);
        pos += available;

        let frames = resampler
            .process(&[chunk.as_slice()], None)
            .map_err(|e| DenoiseError::Resample(e.to_string()))?;
        if let Some(channel) = frames.first() {
            output.extend_from_slice(channel);
        }
    }

    output.drain(..delay);
    output.truncate(expected);

    debug!(from_rate, to_rate, input = input.len(), output = output.len(), "resampled");

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_same_rate_is_identity() {
        let signal = vec![0.1, -0.2, 0.3];
        assert_eq!(resample(&signal, 16000, 16000).unwrap(), signal);
        assert!(resample(&[], 48000, 16000).unwrap().is_empty());
    }

    #[test]
    fn test_output_length() {
        let signal = vec![0.0f32; 4800];
        assert_eq!(resample(&signal, 48000, 16000).unwrap().len(), 1600);
        assert_eq!(resample(&signal, 16000, 48000).unwrap().len(), 14400);
        assert_eq!(resample(&vec![0.0f32; 1000], 44100, 16000).unwrap().len(), 363);
    }

    #[test]
    fn test_tone_preserved() {
        let signal: Vec<f32> = (0..48000)
            .map(|n| (2.0 * PI * 440.0 * n as f32 / 48000.0).sin())
            .collect();
        let output = resample(&signal, 48000, 16000).unwrap();

        // A passband tone keeps its level
        let interior = &output[2000..14000];
        let rms = (interior.iter().map(|&s| s * s).sum::<f32>() / interior.len() as f32).sqrt();
        assert!((rms - std::f32::consts::FRAC_1_SQRT_2).abs() < 0.05, "rms {}", rms);

        // and its frequency: 440 Hz over 0.75 s rises through zero about 330 times
        let crossings = interior.windows(2).filter(|w| w[0] < 0.0 && w[1] >= 0.0).count();
        assert!((325..=335).contains(&crossings), "{} rising crossings", crossings);
    }

    #[test]
    fn test_invalid_rate() {
        assert!(matches!(
            resample(&[1.0], 0, 16000),
            Err(DenoiseError::InvalidArgument(_))
        ));
    }
}
