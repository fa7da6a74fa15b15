//! Adaptive noise-cancellation filtering

pub mod adaptive;

pub use adaptive::{AdaptiveFilter, UpdateRule};
