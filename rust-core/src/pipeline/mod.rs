//! Reference alignment and the two-stage processing pipeline

pub mod align;
pub mod processor;

pub use align::{align, DelayLine};
pub use processor::{run, DegradedMode, PipelineOutput, ProcessingPipeline};
