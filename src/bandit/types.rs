//! Core types for the bandit dispatch system.
//!
//! This module defines the fundamental types used throughout the dispatcher:
//! - `CallSiteKey`: Identifies one distinct shape of a tunable call site
//! - `Implementation`: The candidate kernels plus decision sentinels
//! - `Family`: Which bandit algorithm is active process-wide
//! - `CostEstimate`/`CostEstimates`: Prior cost seeds for new bandits
//! - `Bandit`: The capability contract every bandit variant implements

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Identifies a unique call-site shape for per-site learning.
///
/// The same operation invoked with different parameters yields different keys,
/// so learned statistics never bleed between shapes. Keys are opaque hashes,
/// immutable once produced.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct CallSiteKey(pub u64);

impl CallSiteKey {
    /// Create a key from a stable string identifier.
    ///
    /// ```ignore
    /// let key = CallSiteKey::from_name("conv2d/batch8/3x3");
    /// ```
    pub fn from_name(s: &str) -> Self {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        s.hash(&mut hasher);
        CallSiteKey(hasher.finish())
    }

    /// Create a key from an operation name plus its shape parameters.
    ///
    /// Use this when the relevant parameters are already numeric (sizes,
    /// strides, channel counts) and you want to avoid formatting a string
    /// on the hot path:
    /// ```ignore
    /// let key = CallSiteKey::from_parts("conv2d", &[batch, c_in, c_out, kernel]);
    /// ```
    pub fn from_parts(operation: &str, parts: &[usize]) -> Self {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        operation.hash(&mut hasher);
        parts.hash(&mut hasher);
        CallSiteKey(hasher.finish())
    }
}

/// One candidate kernel implementation, or a decision sentinel.
///
/// The real implementations form a fixed, finite range starting at zero.
/// Three sentinels follow:
/// - `Disabled`: autotuning is inactive process-wide
/// - `Fallback`: the call site declared itself ineligible
/// - `TotalCount`: marks the end of the range and is never a valid choice
#[repr(usize)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Implementation {
    /// Reference convolution kernel.
    Conv2dNative = 0,
    /// NNPACK-backed convolution kernel.
    Conv2dNnpack,
    /// MKL-backed convolution kernel.
    Conv2dMkl,
    /// Autotuning inactive; no selection was made.
    Disabled,
    /// Call site opted out of selection.
    Fallback,
    /// Count sentinel. Never a valid choice or count target.
    TotalCount,
}

impl Implementation {
    /// Number of slots in the selection-count table.
    ///
    /// `Disabled` and `Fallback` occupy slots so the table can be indexed by
    /// any decision outcome; only `TotalCount` is excluded.
    pub const COUNT: usize = Implementation::TotalCount as usize;

    /// Table index for this implementation.
    ///
    /// # Panics
    ///
    /// Panics when called on the count sentinel.
    pub fn index(self) -> usize {
        assert!(
            self != Implementation::TotalCount,
            "the count sentinel does not index the selection table"
        );
        self as usize
    }
}

impl std::fmt::Display for Implementation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Implementation::Conv2dNative => "conv2d_native",
            Implementation::Conv2dNnpack => "conv2d_nnpack",
            Implementation::Conv2dMkl => "conv2d_mkl",
            Implementation::Disabled => "disabled",
            Implementation::Fallback => "fallback",
            Implementation::TotalCount => "total_count",
        };
        f.write_str(name)
    }
}

/// Which bandit algorithm is active process-wide.
///
/// `None` disables all selection: every handle constructed while the family
/// is `None` resolves to the `Disabled` outcome without touching any store.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    /// Selection disabled.
    #[default]
    None,
    /// Uniform-random exploration.
    RandomChoice,
    /// Gaussian cost-model exploitation/exploration.
    Gaussian,
}

impl std::fmt::Display for Family {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Family::None => "none",
            Family::RandomChoice => "random_choice",
            Family::Gaussian => "gaussian",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for Family {
    type Err = crate::error::TuneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Family::None),
            "random_choice" => Ok(Family::RandomChoice),
            "gaussian" => Ok(Family::Gaussian),
            other => Err(crate::error::TuneError::UnknownFamily(other.to_string())),
        }
    }
}

/// Initial expected cost for one implementation, in nanoseconds.
///
/// Supplied once per key at bandit-creation time to seed the prior.
/// Never mutated afterward.
#[derive(Clone, Copy, Debug)]
pub struct CostEstimate {
    /// The implementation this estimate describes.
    pub imp: Implementation,
    /// Expected cost in nanoseconds.
    pub cost_ns: f64,
}

impl CostEstimate {
    /// Convenience constructor.
    pub fn new(imp: Implementation, cost_ns: f64) -> Self {
        Self { imp, cost_ns }
    }
}

/// The full prior for one call site, in arm order.
///
/// The order of the estimates fixes the arm order of the bandit built from
/// them, which keeps cold-start exploration deterministic.
pub type CostEstimates = Vec<CostEstimate>;

/// Capability contract consumed polymorphically by the per-family stores.
///
/// A bandit is constructed once per (family, key) pair from the call site's
/// cost estimates and a store-assigned seed, then lives until reset. The seed
/// makes randomized behavior reproducible across runs.
pub trait Bandit: Send {
    /// Per-family tuning knobs, cloned into every new instance.
    type Knobs: Clone + Send;

    /// Build a bandit from prior cost estimates and a reproducibility seed.
    ///
    /// The arms of the bandit are exactly the implementations named by
    /// `priors`, in order.
    fn from_priors(priors: CostEstimates, seed: u64, knobs: &Self::Knobs) -> Self
    where
        Self: Sized;

    /// Choose an arm for one invocation.
    ///
    /// Never returns a sentinel.
    fn choose(&mut self) -> Implementation;

    /// Feed one observed duration back into the arm's statistics.
    ///
    /// # Panics
    ///
    /// Panics when `choice` is not an arm of this bandit.
    fn update(&mut self, choice: Implementation, elapsed_ns: u64);

    /// Emit a diagnostic summary of the learned state for `key`.
    fn summarize(&self, key: CallSiteKey);
}
