//! Adaptive noise-cancelling filter (LMS / NLMS)
//!
//! Learns a linear model mapping the reference signal onto the noise present
//! in the primary signal and emits the residual e[n] = d[n] - y[n].
//! Weights and reference history persist across calls, so a stream can be
//! fed block by block without discontinuities at block boundaries.
//!
//! One producer at a time per filter instance: blocks must be supplied in
//! arrival order from a single logical stream.

use tracing::{debug, warn};

use crate::config::{FilterVariant, PipelineConfig};
use crate::error::{DenoiseError, Result};

/// Update rule selected at construction
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UpdateRule {
    /// w += 2·μ·e·x
    Lms { mu: f32 },

    /// w += μ/(‖x‖² + ε)·e·x
    Nlms { mu: f32, epsilon: f32 },
}

impl UpdateRule {
    fn variant(&self) -> FilterVariant {
        match self {
            UpdateRule::Lms { .. } => FilterVariant::Lms,
            UpdateRule::Nlms { .. } => FilterVariant::Nlms,
        }
    }
}

/// Stateful LMS/NLMS filter with a mirrored ring buffer history
#[derive(Debug, Clone)]
pub struct AdaptiveFilter {
    /// Coefficients w[k], k = 0 is applied to the newest reference sample
    weights: Vec<f32>,

    /// Reference history stored twice (length 2L) so that
    /// `history[cursor..cursor + L]` is the window, newest first
    history: Vec<f32>,

    /// Position of the newest sample in `history`
    cursor: usize,

    /// Filter length L
    length: usize,

    rule: UpdateRule,

    /// Weight norm above which the filter is flagged as diverged
    divergence_limit: Option<f32>,

    /// Latched once the weight norm breaches the limit
    diverged: bool,
}

impl AdaptiveFilter {
    /// Create a filter with all weights and history zeroed
    ///
    /// # Arguments
    /// * `length` - Number of taps L
    /// * `rule` - LMS or NLMS update with its step size
    pub fn new(length: usize, rule: UpdateRule) -> Result<Self> {
        if length == 0 {
            return Err(DenoiseError::invalid("filter length must be positive"));
        }
        let mu = match rule {
            UpdateRule::Lms { mu } => mu,
            UpdateRule::Nlms { mu, epsilon } => {
                if !(epsilon.is_finite() && epsilon > 0.0) {
                    return Err(DenoiseError::invalid("NLMS epsilon must be positive"));
                }
                mu
            }
        };
        if !mu.is_finite() || mu < 0.0 {
            return Err(DenoiseError::invalid(format!(
                "step size must be finite and non-negative (got {})",
                mu
            )));
        }

        Ok(Self {
            weights: vec![0.0; length],
            history: vec![0.0; 2 * length],
            cursor: 0,
            length,
            rule,
            divergence_limit: None,
            diverged: false,
        })
    }

    /// LMS filter with fixed step size μ
    pub fn lms(length: usize, mu: f32) -> Result<Self> {
        Self::new(length, UpdateRule::Lms { mu })
    }

    /// NLMS filter with step size μ and regularization ε
    pub fn nlms(length: usize, mu: f32, epsilon: f32) -> Result<Self> {
        Self::new(length, UpdateRule::Nlms { mu, epsilon })
    }

    /// Build the filter described by a pipeline configuration
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        let mu = config.effective_step_size();
        let rule = match config.filter_variant {
            FilterVariant::Lms => UpdateRule::Lms { mu },
            FilterVariant::Nlms => UpdateRule::Nlms {
                mu,
                epsilon: config.nlms_epsilon,
            },
        };
        let filter = Self::new(config.filter_length, rule)?;
        match config.divergence_limit {
            Some(limit) => filter.with_divergence_limit(limit),
            None => Ok(filter),
        }
    }

    /// Enable the weight-norm bounds check
    ///
    /// The check only flags divergence; weights are never clamped.
    pub fn with_divergence_limit(mut self, limit: f32) -> Result<Self> {
        if !(limit.is_finite() && limit > 0.0) {
            return Err(DenoiseError::invalid("divergence limit must be positive"));
        }
        self.divergence_limit = Some(limit);
        Ok(self)
    }

    /// Process one reference/primary sample pair
    ///
    /// # Returns
    /// `(error, estimate)`: e[n] = d[n] - y[n] and the noise estimate y[n]
    #[inline]
    pub fn process_sample(&mut self, reference: f32, primary: f32) -> (f32, f32) {
        // Newest sample goes one slot "before" the previous one, mirrored
        self.cursor = if self.cursor == 0 {
            self.length - 1
        } else {
            self.cursor - 1
        };
        self.history[self.cursor] = reference;
        self.history[self.cursor + self.length] = reference;

        let window = &self.history[self.cursor..self.cursor + self.length];

        let estimate: f32 = self
            .weights
            .iter()
            .zip(window.iter())
            .map(|(&w, &x)| w * x)
            .sum();
        let error = primary - estimate;

        let step = match self.rule {
            UpdateRule::Lms { mu } => 2.0 * mu * error,
            UpdateRule::Nlms { mu, epsilon } => {
                let energy: f32 = window.iter().map(|&x| x * x).sum();
                (mu / (energy + epsilon)) * error
            }
        };

        for (w, &x) in self.weights.iter_mut().zip(window.iter()) {
            *w += step * x;
        }

        (error, estimate)
    }

    /// Process a block of samples
    ///
    /// # Arguments
    /// * `reference` - Reference (noise-correlated) samples x[n]
    /// * `primary` - Primary (signal + noise) samples d[n]
    ///
    /// # Returns
    /// `(error, estimate)`, both the same length as the inputs
    pub fn process(&mut self, reference: &[f32], primary: &[f32]) -> Result<(Vec<f32>, Vec<f32>)> {
        if reference.len() != primary.len() {
            return Err(DenoiseError::invalid(format!(
                "reference length {} does not match primary length {}",
                reference.len(),
                primary.len()
            )));
        }

        let mut error = Vec::with_capacity(primary.len());
        let mut estimate = Vec::with_capacity(primary.len());
        for (&x, &d) in reference.iter().zip(primary.iter()) {
            let (e, y) = self.process_sample(x, d);
            error.push(e);
            estimate.push(y);
        }

        if !primary.is_empty() {
            self.update_divergence();
        }

        Ok((error, estimate))
    }

    /// Process a block in-place: `primary` is overwritten with the error signal
    pub fn process_inplace(&mut self, reference: &[f32], primary: &mut [f32]) -> Result<()> {
        if reference.len() != primary.len() {
            return Err(DenoiseError::invalid(format!(
                "reference length {} does not match primary length {}",
                reference.len(),
                primary.len()
            )));
        }

        for (&x, d) in reference.iter().zip(primary.iter_mut()) {
            *d = self.process_sample(x, *d).0;
        }

        if !primary.is_empty() {
            self.update_divergence();
        }
        Ok(())
    }

    fn update_divergence(&mut self) {
        let Some(limit) = self.divergence_limit else {
            return;
        };
        let norm = self.weight_norm();
        let breached = !norm.is_finite() || norm > limit;
        if breached && !self.diverged {
            warn!(
                norm,
                limit,
                variant = %self.rule.variant(),
                "adaptive filter weights exceed divergence limit; step size is likely too large"
            );
        } else if !breached {
            debug!(norm, limit, "adaptive filter weight norm within bounds");
        }
        self.diverged |= breached;
    }

    /// Report divergence detected by the optional bounds check
    pub fn check_stability(&self) -> Result<()> {
        match self.divergence_limit {
            Some(limit) if self.diverged => Err(DenoiseError::NumericInstability {
                norm: self.weight_norm(),
                limit,
            }),
            _ => Ok(()),
        }
    }

    /// Whether the bounds check has ever fired
    pub fn is_diverged(&self) -> bool {
        self.diverged
    }

    /// Euclidean norm of the weight vector
    pub fn weight_norm(&self) -> f32 {
        self.weights.iter().map(|&w| w * w).sum::<f32>().sqrt()
    }

    /// Reset weights and history
    pub fn reset(&mut self) {
        self.weights.fill(0.0);
        self.history.fill(0.0);
        self.cursor = 0;
        self.diverged = false;
    }

    /// Current coefficients, index 0 applied to the newest reference sample
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Reference window, newest sample first
    pub fn history(&self) -> &[f32] {
        &self.history[self.cursor..self.cursor + self.length]
    }

    /// Filter length L
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn variant(&self) -> FilterVariant {
        self.rule.variant()
    }

    pub fn rule(&self) -> UpdateRule {
        self.rule
    }
}
