//! Processing pipeline: alignment → adaptive filter → spectral enhancer
//!
//! Two execution modes share one contract:
//! * offline: [`run`] / [`ProcessingPipeline::run`] over a whole signal
//! * streaming: [`ProcessingPipeline::process_block`] on consecutive blocks
//!
//! Adaptive filter state and the reference delay line persist across blocks.
//! The spectral enhancer re-estimates its noise profile from each block alone,
//! so enhancement quality depends on block size (larger blocks give better
//! noise statistics at the cost of latency).

use tracing::{debug, info, warn};

use super::align::{align, DelayLine};
use crate::config::PipelineConfig;
use crate::error::{DenoiseError, Result};
use crate::filters::AdaptiveFilter;
use crate::spectrum::SpectralEnhancer;

/// Operating conditions that reduce cancellation quality
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegradedMode {
    /// No reference supplied: cancellation skipped, enhancement only
    NoReference,

    /// Primary used as its own reference: the filter can only cancel
    /// self-correlated structure, including wanted signal
    SelfReference,
}

/// Result of one pipeline invocation
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    /// Adaptive filter error signal (or the primary when cancellation is skipped)
    pub anc: Vec<f32>,

    /// Spectrally enhanced signal (equal to `anc` when enhancement is off)
    pub enhanced: Vec<f32>,

    /// Degraded operating mode, if any
    pub degraded: Option<DegradedMode>,

    /// Whether the adaptive filter's divergence check has fired
    pub diverged: bool,
}

/// Stateful processing session
#[derive(Debug)]
pub struct ProcessingPipeline {
    config: PipelineConfig,
    filter: AdaptiveFilter,
    enhancer: Option<SpectralEnhancer>,
    delay_line: DelayLine,
    last_reported: Option<DegradedMode>,
    blocks_processed: u64,
}

impl ProcessingPipeline {
    /// Validate the configuration and build a fresh session
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;

        let filter = AdaptiveFilter::from_config(&config)?;
        let enhancer = SpectralEnhancer::from_config(&config)?;
        let delay_line = DelayLine::new(config.reference_delay);

        info!(
            sample_rate = config.sample_rate,
            filter_length = config.filter_length,
            variant = %config.filter_variant,
            step_size = config.effective_step_size(),
            enhancement = %config.enhancement,
            reference_delay = config.reference_delay,
            "processing pipeline created"
        );

        Ok(Self {
            config,
            filter,
            enhancer,
            delay_line,
            last_reported: None,
            blocks_processed: 0,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn filter(&self) -> &AdaptiveFilter {
        &self.filter
    }

    pub fn blocks_processed(&self) -> u64 {
        self.blocks_processed
    }

    /// Process a whole signal
    ///
    /// The reference is delayed by the configured number of samples, then
    /// both signals are truncated to the shorter length. The delay starts
    /// from silence and the streaming delay line is cleared, so a following
    /// [`process_block`](Self::process_block) does not see samples from this
    /// signal. Filter weights carry over from earlier calls.
    pub fn run(&mut self, primary: &[f32], reference: Option<&[f32]>) -> Result<PipelineOutput> {
        self.delay_line.reset();
        let (anc, degraded) = match self.resolve_reference(primary, reference) {
            Some((reference, degraded)) => {
                let (primary, reference) = align(primary, reference, self.config.reference_delay);
                let (error, _) = self.filter.process(&reference, primary)?;
                (error, degraded)
            }
            None => (primary.to_vec(), Some(DegradedMode::NoReference)),
        };

        self.finish(anc, degraded)
    }

    /// Process one block of a stream
    ///
    /// Blocks must arrive in order from a single producer. Primary and
    /// reference blocks must have equal length.
    pub fn process_block(&mut self, primary: &[f32], reference: Option<&[f32]>) -> Result<PipelineOutput> {
        if let Some(reference) = reference {
            if reference.len() != primary.len() {
                return Err(DenoiseError::invalid(format!(
                    "reference block length {} does not match primary block length {}",
                    reference.len(),
                    primary.len()
                )));
            }
        }

        let (anc, degraded) = match self.resolve_reference(primary, reference) {
            Some((reference, degraded)) => {
                let delayed = self.delay_line.process(reference);
                let (error, _) = self.filter.process(&delayed, primary)?;
                (error, degraded)
            }
            None => (primary.to_vec(), Some(DegradedMode::NoReference)),
        };

        self.blocks_processed += 1;
        self.finish(anc, degraded)
    }

    /// Pick the reference actually used, with the degraded mode it implies
    fn resolve_reference<'a>(
        &self,
        primary: &'a [f32],
        reference: Option<&'a [f32]>,
    ) -> Option<(&'a [f32], Option<DegradedMode>)> {
        match reference {
            Some(reference) if !primary.is_empty() && reference == primary => {
                Some((reference, Some(DegradedMode::SelfReference)))
            }
            Some(reference) => Some((reference, None)),
            None if self.config.self_reference_fallback => Some((primary, Some(DegradedMode::SelfReference))),
            None => None,
        }
    }

    fn finish(&mut self, anc: Vec<f32>, degraded: Option<DegradedMode>) -> Result<PipelineOutput> {
        self.report(degraded);

        let enhanced = match self.enhancer.as_mut() {
            Some(enhancer) => enhancer.enhance(&anc)?,
            None => anc.clone(),
        };

        debug!(
            anc = anc.len(),
            enhanced = enhanced.len(),
            block = self.blocks_processed,
            "pipeline pass complete"
        );

        Ok(PipelineOutput {
            anc,
            enhanced,
            degraded,
            diverged: self.filter.is_diverged(),
        })
    }

    /// Log degraded-mode transitions once instead of on every block
    fn report(&mut self, degraded: Option<DegradedMode>) {
        if degraded == self.last_reported {
            return;
        }
        match degraded {
            Some(DegradedMode::NoReference) => {
                warn!("no reference signal: adaptive cancellation skipped, enhancement only")
            }
            Some(DegradedMode::SelfReference) => {
                warn!("primary used as its own reference: cancellation limited to self-correlated structure")
            }
            None => info!("reference signal available: adaptive cancellation active"),
        }
        self.last_reported = degraded;
    }

    /// Clear filter weights, history and delay line
    pub fn reset(&mut self) {
        self.filter.reset();
        self.delay_line.reset();
        self.last_reported = None;
        self.blocks_processed = 0;
    }
}

/// Process a whole signal with a fresh session
pub fn run(primary: &[f32], reference: Option<&[f32]>, config: &PipelineConfig) -> Result<PipelineOutput> {
    ProcessingPipeline::new(config.clone())?.run(primary, reference)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EnhancementVariant, FilterVariant};
    use crate::spectrum::StftConfig;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::f32::consts::PI;

    fn power(signal: &[f32]) -> f32 {
        signal.iter().map(|&s| s * s).sum::<f32>() / signal.len() as f32
    }

    /// Speech-like bursts plus noise leaking from the reference through a short path
    fn scenario(len: usize, path_delay: usize, seed: u64) -> (Vec<f32>, Vec<f32>, Vec<f32>) {
        let mut rng = StdRng::seed_from_u64(seed);
        let reference: Vec<f32> = (0..len).map(|_| rng.gen_range(-0.5..0.5)).collect();
        let speech: Vec<f32> = (0..len)
            .map(|n| {
                if (n / 2400) % 2 == 0 {
                    0.3 * (2.0 * PI * 330.0 * n as f32 / 16000.0).sin()
                } else {
                    0.0
                }
            })
            .collect();
        let primary = (0..len)
            .map(|n| {
                let leak = if n >= path_delay { 0.7 * reference[n - path_delay] } else { 0.0 };
                speech[n] + leak
            })
            .collect();
        (primary, reference, speech)
    }

    #[test]
    fn test_no_reference_passes_primary() {
        let (primary, _, _) = scenario(8000, 3, 1);
        let output = run(&primary, None, &PipelineConfig::default()).unwrap();

        assert_eq!(output.anc, primary);
        assert_eq!(output.degraded, Some(DegradedMode::NoReference));
        assert_eq!(
            output.enhanced.len(),
            StftConfig::default().output_len(primary.len())
        );
    }

    #[test]
    fn test_enhancement_none_returns_anc() {
        let (primary, reference, _) = scenario(4000, 3, 2);
        let config = PipelineConfig {
            enhancement: EnhancementVariant::None,
            ..Default::default()
        };
        let output = run(&primary, Some(&reference), &config).unwrap();

        assert_eq!(output.enhanced, output.anc);
        assert_eq!(output.degraded, None);
    }

    #[test]
    fn test_anc_removes_leaked_noise() {
        let (primary, reference, speech) = scenario(48000, 4, 3);
        let config = PipelineConfig {
            filter_length: 32,
            step_size: Some(0.1),
            enhancement: EnhancementVariant::None,
            ..Default::default()
        };
        let output = run(&primary, Some(&reference), &config).unwrap();

        let tail = 40000..48000;
        let residual: Vec<f32> = tail.clone().map(|n| output.anc[n] - speech[n]).collect();
        let leaked: Vec<f32> = tail.map(|n| primary[n] - speech[n]).collect();
        assert!(power(&residual) < 0.1 * power(&leaked));
    }

    #[test]
    fn test_reference_delay_alignment() {
        let (primary, reference, _) = scenario(4000, 0, 4);
        let config = PipelineConfig {
            reference_delay: 100,
            enhancement: EnhancementVariant::None,
            ..Default::default()
        };
        let output = run(&primary, Some(&reference), &config).unwrap();
        assert_eq!(output.anc.len(), 4000);

        let short_reference = &reference[..1000];
        let output = run(&primary, Some(short_reference), &config).unwrap();
        assert_eq!(output.anc.len(), 1100);
    }

    #[test]
    fn test_self_reference_flagged() {
        let (primary, _, _) = scenario(4000, 0, 5);
        let output = run(&primary, Some(&primary), &PipelineConfig::default()).unwrap();
        assert_eq!(output.degraded, Some(DegradedMode::SelfReference));

        let config = PipelineConfig {
            self_reference_fallback: true,
            ..Default::default()
        };
        let output = run(&primary, None, &config).unwrap();
        assert_eq!(output.degraded, Some(DegradedMode::SelfReference));
        assert_ne!(output.anc, primary);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = PipelineConfig {
            hop_size: 0,
            ..Default::default()
        };
        assert!(matches!(
            ProcessingPipeline::new(config),
            Err(DenoiseError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_mismatched_block_rejected() {
        let mut pipeline = ProcessingPipeline::new(PipelineConfig::default()).unwrap();
        let result = pipeline.process_block(&[0.0; 1024], Some(&[0.0; 1000]));

        assert!(matches!(result, Err(DenoiseError::InvalidArgument(_))));
        assert_eq!(pipeline.blocks_processed(), 0);
        assert!(pipeline.filter().weights().iter().all(|&w| w == 0.0));
    }

    #[test]
    fn test_streaming_matches_offline() {
        let (primary, reference, _) = scenario(10 * 16000, 5, 6);
        let config = PipelineConfig {
            filter_length: 128,
            reference_delay: 3,
            enhancement: EnhancementVariant::None,
            ..Default::default()
        };

        let offline = run(&primary, Some(&reference), &config).unwrap();

        let mut pipeline = ProcessingPipeline::new(config).unwrap();
        let mut streamed = Vec::with_capacity(primary.len());
        for (p, r) in primary.chunks(1024).zip(reference.chunks(1024)) {
            streamed.extend(pipeline.process_block(p, Some(r)).unwrap().anc);
        }

        assert_eq!(streamed.len(), offline.anc.len());
        for (a, b) in streamed.iter().zip(offline.anc.iter()) {
            assert!((a - b).abs() < 1e-5);
        }
        assert_eq!(pipeline.blocks_processed(), (primary.len() as u64).div_ceil(1024));
    }

    #[test]
    fn test_streaming_block_output_lengths() {
        let (primary, reference, _) = scenario(8192, 2, 7);
        let mut pipeline = ProcessingPipeline::new(PipelineConfig::default()).unwrap();

        for (p, r) in primary.chunks(1024).zip(reference.chunks(1024)) {
            let output = pipeline.process_block(p, Some(r)).unwrap();
            assert_eq!(output.anc.len(), 1024);
            // 1024 = 512 + 4·128: whole hops, no tail padding
            assert_eq!(output.enhanced.len(), 1024);
        }
    }

    #[test]
    fn test_lms_divergence_reported() {
        let (primary, reference, _) = scenario(4000, 1, 8);
        let config = PipelineConfig {
            filter_variant: FilterVariant::Lms,
            step_size: Some(1.0),
            divergence_limit: Some(1e3),
            enhancement: EnhancementVariant::None,
            ..Default::default()
        };
        let output = run(&primary, Some(&reference), &config).unwrap();
        assert!(output.diverged);
    }

    #[test]
    fn test_empty_input() {
        let mut pipeline = ProcessingPipeline::new(PipelineConfig::default()).unwrap();

        let output = pipeline.run(&[], None).unwrap();
        assert!(output.anc.is_empty());
        assert!(output.enhanced.is_empty());
        assert_eq!(output.degraded, Some(DegradedMode::NoReference));

        let output = pipeline.run(&[], Some(&[])).unwrap();
        assert!(output.anc.is_empty());
        assert!(output.enhanced.is_empty());
        assert_eq!(output.degraded, None);

        let output = pipeline.run(&[], Some(&[0.5, 0.25])).unwrap();
        assert!(output.anc.is_empty());

        let output = pipeline.process_block(&[], Some(&[])).unwrap();
        assert!(output.anc.is_empty());
        assert!(output.enhanced.is_empty());
        assert!(pipeline.filter().weights().iter().all(|&w| w == 0.0));
    }

    #[test]
    fn test_run_clears_stream_delay() {
        // Zero primary keeps the weights at zero, so the history shows
        // exactly which delayed reference samples reached the filter
        let config = PipelineConfig {
            filter_length: 4,
            reference_delay: 2,
            enhancement: EnhancementVariant::None,
            ..Default::default()
        };
        let mut pipeline = ProcessingPipeline::new(config).unwrap();

        pipeline.process_block(&[0.0; 4], Some(&[1.0, 2.0, 3.0, 4.0])).unwrap();
        assert_eq!(pipeline.filter().history(), &[2.0, 1.0, 0.0, 0.0]);

        pipeline.run(&[0.0; 3], Some(&[5.0, 6.0, 7.0])).unwrap();
        assert_eq!(pipeline.filter().history(), &[5.0, 0.0, 0.0, 2.0]);

        // 3.0 and 4.0 were pending in the delay line before `run`
        pipeline.process_block(&[0.0; 2], Some(&[8.0, 9.0])).unwrap();
        assert_eq!(pipeline.filter().history(), &[0.0, 0.0, 5.0, 0.0]);
    }

    #[test]
    fn test_reset_restarts_session() {
        let (primary, reference, _) = scenario(2048, 2, 9);
        let config = PipelineConfig {
            enhancement: EnhancementVariant::None,
            ..Default::default()
        };
        let mut pipeline = ProcessingPipeline::new(config).unwrap();

        let first = pipeline.process_block(&primary, Some(&reference)).unwrap();
        pipeline.reset();
        let second = pipeline.process_block(&primary, Some(&reference)).unwrap();

        assert_eq!(first.anc, second.anc);
        assert_eq!(pipeline.blocks_processed(), 1);
    }
}
