//! Configuration knobs for the Gaussian bandit.
//!
//! All knobs have sensible defaults tuned for kernel-scale workloads
//! (microseconds to low milliseconds). Most users won't need to modify
//! these values.

use serde::{Deserialize, Serialize};

/// Tuning knobs for the Gaussian cost-model bandit.
///
/// The bandit models each arm's cost as log-normal: observations enter the
/// model as `ln(cost_ns)`, and selection samples each arm's posterior mean
/// and picks the minimum.
///
/// # Cost Model
///
/// For an arm with effective sample count `n_eff`, mean `mu` and variance
/// `var`, a selection draws from `Normal(mu, sqrt(var / n_eff))`. The prior
/// cost estimate enters as a pseudo-observation weighted by `prior_weight`,
/// so real measurements overtake the prior quickly.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GaussianKnobs {
    /// Effective sample count granted to the prior cost estimate.
    /// Higher values make the prior harder to overturn.
    /// Default: 1.0
    pub prior_weight: f64,

    /// Variance assigned to the prior pseudo-observation (in log space).
    /// A wide prior keeps early exploration alive.
    /// Default: 1.0
    pub prior_variance: f64,

    /// Floor applied to the posterior standard deviation when sampling.
    /// Prevents a well-measured arm from collapsing to a point mass and
    /// shutting out re-exploration entirely.
    /// Default: 0.01
    pub variance_floor: f64,

    /// Per-observation decay factor for exponential weighting.
    /// Keeps the model responsive when kernel costs drift (cache state,
    /// frequency scaling, contention).
    /// Default: 0.999653 (half-life of ~2000 observations)
    pub decay: f64,
}

impl Default for GaussianKnobs {
    fn default() -> Self {
        Self {
            prior_weight: 1.0,
            prior_variance: 1.0,
            variance_floor: 0.01,
            // Decay: half-life ~2000 observations
            // 0.5^(1/2000) ≈ 0.999653
            decay: 0.999653,
        }
    }
}

impl GaussianKnobs {
    /// Create knobs with all defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the prior weight.
    pub fn with_prior_weight(mut self, weight: f64) -> Self {
        self.prior_weight = weight;
        self
    }

    /// Builder method to set the decay factor.
    pub fn with_decay(mut self, decay: f64) -> Self {
        self.decay = decay;
        self
    }

    /// Builder method to set the posterior variance floor.
    pub fn with_variance_floor(mut self, floor: f64) -> Self {
        self.variance_floor = floor;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let knobs = GaussianKnobs::default();
        assert!((knobs.prior_weight - 1.0).abs() < 0.001);
        assert!((knobs.decay - 0.999653).abs() < 0.0001);
        assert!((knobs.variance_floor - 0.01).abs() < 0.0001);
    }

    #[test]
    fn test_builder_methods() {
        let knobs = GaussianKnobs::default()
            .with_prior_weight(5.0)
            .with_decay(0.99)
            .with_variance_floor(0.1);

        assert!((knobs.prior_weight - 5.0).abs() < 0.001);
        assert!((knobs.decay - 0.99).abs() < 0.001);
        assert!((knobs.variance_floor - 0.1).abs() < 0.001);
    }

    #[test]
    fn test_serialization() {
        let knobs = GaussianKnobs::default();
        let json = serde_json::to_string(&knobs).unwrap();
        let parsed: GaussianKnobs = serde_json::from_str(&json).unwrap();
        assert!((parsed.decay - knobs.decay).abs() < 0.0001);
    }
}
