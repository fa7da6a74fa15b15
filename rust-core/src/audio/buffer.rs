//! Lock-free sample queue between the capture thread and block processing
//!
//! The capture side writes chunks of any size; the processing side only ever
//! takes whole blocks, so a block is either read completely or not at all.

use ringbuf::{HeapConsumer, HeapProducer, HeapRb};

/// SPSC sample queue; split into its two ends before use
pub struct AudioRingBuffer {
    rb: HeapRb<f32>,
}

impl AudioRingBuffer {
    /// # Arguments
    /// * `capacity` - Samples buffered before writes start dropping
    pub fn new(capacity: usize) -> Self {
        Self {
            rb: HeapRb::new(capacity),
        }
    }

    pub fn split(self) -> (AudioProducer, AudioConsumer) {
        let (producer, consumer) = self.rb.split();
        (AudioProducer { producer }, AudioConsumer { consumer })
    }
}

/// Capture end
pub struct AudioProducer {
    producer: HeapProducer<f32>,
}

impl AudioProducer {
    /// Queue samples, returning how many fit
    pub fn write(&mut self, samples: &[f32]) -> usize {
        self.producer.push_slice(samples)
    }

    /// Space left before writes are truncated
    pub fn free_len(&self) -> usize {
        self.producer.free_len()
    }
}

/// Processing end
pub struct AudioConsumer {
    consumer: HeapConsumer<f32>,
}

impl AudioConsumer {
    /// Fill `block` completely, or leave the queue untouched
    ///
    /// # Returns
    /// `true` if a whole block was read
    pub fn read_block(&mut self, block: &mut [f32]) -> bool {
        if !self.has_data(block.len()) {
            return false;
        }
        self.consumer.pop_slice(block) == block.len()
    }

    /// Whether at least `n` samples are queued
    pub fn has_data(&self, n: usize) -> bool {
        self.consumer.len() >= n
    }

    /// Samples currently queued
    pub fn available(&self) -> usize {
        self.consumer.len()
    }
}
