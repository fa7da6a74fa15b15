//! Block-wise streaming front end for the processing pipeline
//!
//! A capture thread pushes samples through [`StreamInput`]; the processing
//! side owns a [`StreamProcessor`] that pulls complete blocks from the ring
//! buffers and feeds them to the pipeline in arrival order.

use tracing::{debug, warn};

use super::buffer::{AudioConsumer, AudioProducer, AudioRingBuffer};
use super::channels::split_pair;
use crate::error::{DenoiseError, Result};
use crate::pipeline::{PipelineOutput, ProcessingPipeline};

/// Ring buffer capacity as a multiple of the block size
const BUFFER_BLOCKS: usize = 16;

/// Producer side: written from the capture callback
pub struct StreamInput {
    primary: AudioProducer,
    reference: Option<AudioProducer>,
    dropped: usize,
}

impl StreamInput {
    /// Push one chunk of mono samples
    ///
    /// Samples that do not fit are dropped and counted.
    pub fn push(&mut self, primary: &[f32], reference: Option<&[f32]>) -> Result<()> {
        match (self.reference.as_mut(), reference) {
            (Some(producer), Some(reference)) => {
                if reference.len() != primary.len() {
                    return Err(DenoiseError::invalid(format!(
                        "reference chunk length {} does not match primary chunk length {}",
                        reference.len(),
                        primary.len()
                    )));
                }
                // Keep both channels sample-aligned when space runs short
                let n = primary
                    .len()
                    .min(self.primary.free_len())
                    .min(producer.free_len());
                self.primary.write(&primary[..n]);
                producer.write(&reference[..n]);
                self.dropped += primary.len() - n;
            }
            (None, None) => {
                let written = self.primary.write(primary);
                self.dropped += primary.len() - written;
            }
            (Some(_), None) => return Err(DenoiseError::invalid("stream expects a reference channel")),
            (None, Some(_)) => return Err(DenoiseError::invalid("stream was opened without a reference channel")),
        }
        Ok(())
    }

    /// Push interleaved stereo frames: channel 0 primary, channel 1 reference
    pub fn push_interleaved(&mut self, frames: &[f32]) -> Result<()> {
        let (primary, reference) = split_pair(frames)?;
        self.push(&primary, Some(&reference))
    }

    /// Samples lost to a full buffer since creation
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

/// Consumer side: owns the pipeline session
pub struct StreamProcessor {
    pipeline: ProcessingPipeline,
    primary: AudioConsumer,
    reference: Option<AudioConsumer>,
    block_size: usize,
    primary_block: Vec<f32>,
    reference_block: Vec<f32>,
}

impl StreamProcessor {
    /// Create a connected input/processor pair
    ///
    /// # Arguments
    /// * `pipeline` - Session that receives every block
    /// * `block_size` - Samples per block handed to the pipeline
    /// * `with_reference` - Whether a reference channel is carried
    pub fn new(
        pipeline: ProcessingPipeline,
        block_size: usize,
        with_reference: bool,
    ) -> Result<(StreamInput, Self)> {
        if block_size == 0 {
            return Err(DenoiseError::invalid("block size must be positive"));
        }
        let capacity = block_size * BUFFER_BLOCKS;

        let (primary_tx, primary_rx) = AudioRingBuffer::new(capacity).split();
        let (reference_tx, reference_rx) = if with_reference {
            let (tx, rx) = AudioRingBuffer::new(capacity).split();
            (Some(tx), Some(rx))
        } else {
            (None, None)
        };

        debug!(block_size, capacity, with_reference, "stream opened");

        Ok((
            StreamInput {
                primary: primary_tx,
                reference: reference_tx,
                dropped: 0,
            },
            Self {
                pipeline,
                primary: primary_rx,
                reference: reference_rx,
                block_size,
                primary_block: vec![0.0; block_size],
                reference_block: vec![0.0; block_size],
            },
        ))
    }

    /// Process one block if a complete one is buffered
    pub fn process_next(&mut self) -> Result<Option<PipelineOutput>> {
        if !self.primary.has_data(self.block_size) {
            return Ok(None);
        }
        if let Some(reference) = self.reference.as_ref() {
            if !reference.has_data(self.block_size) {
                return Ok(None);
            }
        }

        self.primary.read_block(&mut self.primary_block);
        let reference = match self.reference.as_mut() {
            Some(consumer) => {
                consumer.read_block(&mut self.reference_block);
                Some(self.reference_block.as_slice())
            }
            None => None,
        };

        let output = self.pipeline.process_block(&self.primary_block, reference)?;
        if output.diverged {
            warn!(block = self.pipeline.blocks_processed(), "adaptive filter diverged");
        }
        Ok(Some(output))
    }

    /// Process every complete block currently buffered
    pub fn drain(&mut self) -> Result<Vec<PipelineOutput>> {
        let mut outputs = Vec::new();
        while let Some(output) = self.process_next()? {
            outputs.push(output);
        }
        Ok(outputs)
    }

    pub fn pipeline(&self) -> &ProcessingPipeline {
        &self.pipeline
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Samples waiting for a complete block
    pub fn pending(&self) -> usize {
        self.primary.available()
    }
}
