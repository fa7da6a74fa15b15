//! Channel layout helpers for interleaved input

use crate::error::{DenoiseError, Result};

/// Average interleaved channels down to mono
pub fn downmix(interleaved: &[f32], channels: usize) -> Result<Vec<f32>> {
    if channels == 0 {
        return Err(DenoiseError::invalid("channel count must be positive"));
    }
    if interleaved.len() % channels != 0 {
        return Err(DenoiseError::invalid(format!(
            "{} samples is not a whole number of {}-channel frames",
            interleaved.len(),
            channels
        )));
    }
    if channels == 1 {
        return Ok(interleaved.to_vec());
    }

    let scale = 1.0 / channels as f32;
    Ok(interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() * scale)
        .collect())
}

/// Split interleaved stereo into (channel 0, channel 1)
///
/// Used for two-microphone captures where one channel carries the primary
/// and the other the noise reference.
pub fn split_pair(interleaved: &[f32]) -> Result<(Vec<f32>, Vec<f32>)> {
    if interleaved.len() % 2 != 0 {
        return Err(DenoiseError::invalid("stereo input has an odd sample count"));
    }
    Ok(interleaved
        .chunks_exact(2)
        .map(|frame| (frame[0], frame[1]))
        .unzip())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downmix() {
        assert_eq!(downmix(&[1.0, 3.0, -1.0, 1.0], 2).unwrap(), vec![2.0, 0.0]);
        assert_eq!(downmix(&[0.5, 0.25], 1).unwrap(), vec![0.5, 0.25]);
        assert!(downmix(&[1.0, 2.0, 3.0], 2).is_err());
        assert!(downmix(&[1.0], 0).is_err());
    }

    #[test]
    fn test_split_pair() {
        let (left, right) = split_pair(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(left, vec![1.0, 3.0]);
        assert_eq!(right, vec![2.0, 4.0]);
        assert!(split_pair(&[1.0]).is_err());
    }
}
