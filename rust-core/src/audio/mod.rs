//! Capture-side helpers: ring buffers, block streaming, resampling, channel layout

pub mod buffer;
pub mod channels;
pub mod resample;
pub mod stream;

pub use buffer::AudioRingBuffer;
pub use channels::{downmix, split_pair};
pub use resample::resample;
pub use stream::{StreamInput, StreamProcessor};
