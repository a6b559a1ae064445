//! Uniform-random exploration bandit.
//!
//! The simplest baseline: every `choose()` picks uniformly among the arms,
//! ignoring all observed durations. Useful for gathering unbiased cost
//! measurements and as a control when evaluating the Gaussian family.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::types::{Bandit, CallSiteKey, CostEstimates, Implementation};

/// Seedable uniform-random bandit.
///
/// Arm order follows the cost estimates it was built from. Updates only
/// count observations; they never influence future choices.
pub struct RandomBandit {
    arms: Vec<Implementation>,
    pulls: Vec<u64>,
    rng: SmallRng,
}

impl Bandit for RandomBandit {
    type Knobs = ();

    fn from_priors(priors: CostEstimates, seed: u64, _knobs: &()) -> Self {
        assert!(
            !priors.is_empty(),
            "a bandit requires at least one implementation to choose from"
        );
        Self {
            arms: priors.iter().map(|e| e.imp).collect(),
            pulls: vec![0; priors.len()],
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    fn choose(&mut self) -> Implementation {
        let idx = self.rng.gen_range(0..self.arms.len());
        self.arms[idx]
    }

    fn update(&mut self, choice: Implementation, _elapsed_ns: u64) {
        let idx = self.arm_index(choice);
        self.pulls[idx] += 1;
    }

    fn summarize(&self, key: CallSiteKey) {
        for (imp, pulls) in self.arms.iter().zip(&self.pulls) {
            tracing::info!(
                key = key.0,
                implementation = %imp,
                pulls,
                "random bandit arm"
            );
        }
    }
}

impl RandomBandit {
    /// Number of observations recorded for `choice`.
    pub fn pulls(&self, choice: Implementation) -> u64 {
        self.pulls[self.arm_index(choice)]
    }

    fn arm_index(&self, choice: Implementation) -> usize {
        self.arms
            .iter()
            .position(|&a| a == choice)
            .unwrap_or_else(|| panic!("implementation {choice:?} is not an arm of this bandit"))
    }
}
