//! Gaussian cost-model bandit.
//!
//! Each arm carries an online Gaussian estimate of `ln(cost_ns)`, seeded
//! from the call site's prior cost estimate. Selection samples every arm's
//! posterior and runs the implementation whose sample is cheapest, which
//! trades exploration for exploitation automatically: arms with little data
//! have wide posteriors and win often enough to stay measured.

use rand::rngs::SmallRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use super::knobs::GaussianKnobs;
use super::types::{Bandit, CallSiteKey, CostEstimates, Implementation};

/// Online Gaussian estimate for a single arm.
///
/// Uses Welford's algorithm for numerically stable variance, with
/// exponential decay so the model tracks drifting costs.
#[derive(Clone, Copy, Debug)]
struct ArmEstimate {
    imp: Implementation,
    /// Effective sample count (decayed; includes the prior pseudo-observation)
    n_eff: f64,
    /// Mean of ln(cost_ns)
    mu: f64,
    /// Sum of squared deviations from the mean
    s2: f64,
    /// Real observations recorded, undecayed
    pulls: u64,
}

impl ArmEstimate {
    fn from_prior(imp: Implementation, cost_ns: f64, knobs: &GaussianKnobs) -> Self {
        let n_eff = knobs.prior_weight.max(1.0);
        Self {
            imp,
            n_eff,
            mu: cost_ns.max(1.0).ln(),
            s2: knobs.prior_variance * n_eff,
            pulls: 0,
        }
    }

    fn variance(&self) -> f64 {
        if self.n_eff < 2.0 {
            // Not enough samples, return a diffuse prior variance
            1.0
        } else {
            (self.s2 / (self.n_eff - 1.0)).max(0.01)
        }
    }

    fn observe(&mut self, log_cost: f64, decay: f64) {
        // Decay existing stats
        self.n_eff *= decay;
        self.mu *= decay;
        self.s2 *= decay;

        // Welford update with the new observation
        self.n_eff += 1.0;
        let delta = log_cost - self.mu;
        self.mu += delta / self.n_eff;
        let delta2 = log_cost - self.mu;
        self.s2 += delta * delta2;

        self.pulls += 1;
    }
}

/// Seedable Gaussian-posterior bandit.
///
/// Arm order follows the cost estimates it was built from; unexplored arms
/// are forced once each, in order, before posterior sampling takes over.
pub struct GaussianBandit {
    arms: Vec<ArmEstimate>,
    knobs: GaussianKnobs,
    rng: SmallRng,
}

impl Bandit for GaussianBandit {
    type Knobs = GaussianKnobs;

    fn from_priors(priors: CostEstimates, seed: u64, knobs: &GaussianKnobs) -> Self {
        assert!(
            !priors.is_empty(),
            "a bandit requires at least one implementation to choose from"
        );
        Self {
            arms: priors
                .iter()
                .map(|e| ArmEstimate::from_prior(e.imp, e.cost_ns, knobs))
                .collect(),
            knobs: knobs.clone(),
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    fn choose(&mut self) -> Implementation {
        // Force one pull of every arm before trusting the posteriors.
        if let Some(arm) = self.arms.iter().find(|a| a.pulls == 0) {
            return arm.imp;
        }

        let mut best = self.arms[0].imp;
        let mut best_sample = f64::INFINITY;
        for i in 0..self.arms.len() {
            let sample = Self::sample_posterior(&self.arms[i], &self.knobs, &mut self.rng);
            if sample < best_sample {
                best_sample = sample;
                best = self.arms[i].imp;
            }
        }
        best
    }

    fn update(&mut self, choice: Implementation, elapsed_ns: u64) {
        let decay = self.knobs.decay;
        let log_cost = (elapsed_ns as f64).max(1.0).ln();
        let arm = self
            .arms
            .iter_mut()
            .find(|a| a.imp == choice)
            .unwrap_or_else(|| panic!("implementation {choice:?} is not an arm of this bandit"));
        arm.observe(log_cost, decay);
    }

    fn summarize(&self, key: CallSiteKey) {
        for arm in &self.arms {
            tracing::info!(
                key = key.0,
                implementation = %arm.imp,
                mean_cost_ns = arm.mu.exp(),
                n_eff = arm.n_eff,
                pulls = arm.pulls,
                "gaussian bandit arm"
            );
        }
    }
}

impl GaussianBandit {
    /// Sample one cost (in log space) from an arm's posterior.
    fn sample_posterior(arm: &ArmEstimate, knobs: &GaussianKnobs, rng: &mut SmallRng) -> f64 {
        // Posterior of the mean with the variance treated as known:
        // Normal(mu, variance / n_eff), floored so a well-measured arm
        // still gets occasional re-exploration.
        let posterior_std = (arm.variance() / arm.n_eff)
            .sqrt()
            .max(knobs.variance_floor);
        Normal::new(arm.mu, posterior_std)
            .map(|d| d.sample(rng))
            .unwrap_or(arm.mu)
    }

    /// Number of observations recorded for `choice`.
    pub fn pulls(&self, choice: Implementation) -> u64 {
        self.arms
            .iter()
            .find(|a| a.imp == choice)
            .map(|a| a.pulls)
            .unwrap_or_else(|| panic!("implementation {choice:?} is not an arm of this bandit"))
    }

    /// Learned mean cost for `choice`, in nanoseconds.
    pub fn mean_cost_ns(&self, choice: Implementation) -> f64 {
        self.arms
            .iter()
            .find(|a| a.imp == choice)
            .map(|a| a.mu.exp())
            .unwrap_or_else(|| panic!("implementation {choice:?} is not an arm of this bandit"))
    }
}
