//! Fixed-delay alignment of the reference against the primary
//!
//! The reference is delayed by a constant number of samples to compensate
//! the acoustic path; there is no adaptive delay estimation.

use std::collections::VecDeque;

/// Delay the reference and truncate both signals to a common length
///
/// # Arguments
/// * `primary` - Primary signal d[n]
/// * `reference` - Reference signal x[n]
/// * `delay` - Zero samples prepended to the reference
///
/// # Returns
/// `(primary, reference)` of equal length `min(primary.len(), reference.len() + delay)`
pub fn align<'a>(primary: &'a [f32], reference: &[f32], delay: usize) -> (&'a [f32], Vec<f32>) {
    let len = primary.len().min(reference.len() + delay);
    let zeros = delay.min(len);

    let mut delayed = Vec::with_capacity(len);
    delayed.resize(zeros, 0.0);
    delayed.extend_from_slice(&reference[..len - zeros]);

    (&primary[..len], delayed)
}

/// Streaming counterpart of [`align`]: a constant delay carried across blocks
#[derive(Debug, Clone)]
pub struct DelayLine {
    pending: VecDeque<f32>,
    delay: usize,
}

impl DelayLine {
    pub fn new(delay: usize) -> Self {
        Self {
            pending: std::iter::repeat(0.0).take(delay).collect(),
            delay,
        }
    }

    /// Delay one block; output has the same length as the input
    pub fn process(&mut self, input: &[f32]) -> Vec<f32> {
        if self.delay == 0 {
            return input.to_vec();
        }
        input
            .iter()
            .map(|&x| {
                self.pending.push_back(x);
                self.pending.pop_front().unwrap_or(0.0)
            })
            .collect()
    }

    pub fn delay(&self) -> usize {
        self.delay
    }

    /// Refill with zeros
    pub fn reset(&mut self) {
        self.pending.clear();
        self.pending.resize(self.delay, 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_no_delay_truncates() {
        let primary = [1.0, 2.0, 3.0, 4.0];
        let reference = [5.0, 6.0];

        let (p, r) = align(&primary, &reference, 0);
        assert_eq!(p, &[1.0, 2.0]);
        assert_eq!(r, vec![5.0, 6.0]);
    }

    #[test]
    fn test_align_with_delay() {
        let primary = [1.0, 2.0, 3.0, 4.0, 5.0];
        let reference = [7.0, 8.0, 9.0, 10.0, 11.0];

        let (p, r) = align(&primary, &reference, 2);
        assert_eq!(p.len(), 5);
        assert_eq!(r, vec![0.0, 0.0, 7.0, 8.0, 9.0]);
    }

    #[test]
    fn test_align_delay_extends_short_reference() {
        let primary = [1.0; 6];
        let reference = [2.0; 3];

        let (p, r) = align(&primary, &reference, 2);
        assert_eq!(p.len(), 5);
        assert_eq!(r, vec![0.0, 0.0, 2.0, 2.0, 2.0]);
    }

    #[test]
    fn test_align_delay_longer_than_primary() {
        let (p, r) = align(&[1.0, 2.0], &[3.0], 10);
        assert_eq!(p.len(), 2);
        assert_eq!(r, vec![0.0, 0.0]);
    }

    #[test]
    fn test_delay_line_matches_align() {
        let reference: Vec<f32> = (0..100).map(|i| i as f32).collect();
        let (_, expected) = align(&reference, &reference, 7);

        let mut line = DelayLine::new(7);
        let mut streamed = Vec::new();
        for block in reference.chunks(16) {
            streamed.extend(line.process(block));
        }
        assert_eq!(streamed, expected);
    }

    #[test]
    fn test_delay_line_reset() {
        let mut line = DelayLine::new(2);
        line.process(&[1.0, 2.0, 3.0]);
        line.reset();
        assert_eq!(line.process(&[4.0, 5.0, 6.0]), vec![0.0, 0.0, 4.0]);
    }
}
