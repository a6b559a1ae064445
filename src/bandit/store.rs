//! Per-family bandit registry.
//!
//! One store exists per bandit family. It owns exactly one bandit per
//! call-site key, created lazily on first sight and kept until reset.
//! First-seen key order is preserved so diagnostic output is reproducible
//! across runs.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use super::types::{Bandit, CallSiteKey, CostEstimates};

/// Lazily populated map from call-site key to bandit instance.
///
/// Each new bandit receives the next sequential seed, so a run that visits
/// the same keys in the same order reproduces the same randomized behavior.
/// Lookups for existing keys never re-create or reseed.
pub(crate) struct BanditStore<B: Bandit> {
    bandits: HashMap<CallSiteKey, B>,
    ordered_keys: Vec<CallSiteKey>,
    next_seed: u64,
    knobs: B::Knobs,
}

impl<B: Bandit> BanditStore<B> {
    pub(crate) fn new(knobs: B::Knobs) -> Self {
        Self {
            bandits: HashMap::new(),
            ordered_keys: Vec::new(),
            next_seed: 0,
            knobs,
        }
    }

    /// Look up the bandit for `key`, creating it on first sight.
    ///
    /// `cost_fn` is invoked only on the insert path, so cost estimation is
    /// skipped entirely for keys that already have a bandit.
    pub(crate) fn get_or_create(
        &mut self,
        key: CallSiteKey,
        cost_fn: impl FnOnce() -> CostEstimates,
    ) -> &mut B {
        match self.bandits.entry(key) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                // Preserve order for debugging.
                self.ordered_keys.push(key);
                let seed = self.next_seed;
                self.next_seed += 1;
                tracing::debug!(key = key.0, seed, "creating bandit");
                entry.insert(B::from_priors(cost_fn(), seed, &self.knobs))
            }
        }
    }

    /// Look up an already-created bandit.
    ///
    /// # Panics
    ///
    /// Panics for a key never passed to `get_or_create`. Updating a key
    /// that was never chosen is a caller bug, not a runtime condition.
    pub(crate) fn get(&mut self, key: CallSiteKey) -> &mut B {
        self.bandits.get_mut(&key).unwrap_or_else(|| {
            panic!(
                "no bandit for call-site key {key:?}; choose() must precede update()"
            )
        })
    }

    /// Summarize every bandit in first-seen key order.
    pub(crate) fn summarize_all(&self) {
        for key in &self.ordered_keys {
            self.bandits[key].summarize(*key);
        }
    }

    /// Drop all bandits and restart the seed counter.
    pub(crate) fn reset(&mut self) {
        self.next_seed = 0;
        self.ordered_keys.clear();
        self.bandits.clear();
    }

    /// Number of distinct keys tracked.
    pub(crate) fn len(&self) -> usize {
        self.bandits.len()
    }

    #[cfg(test)]
    fn next_seed(&self) -> u64 {
        self.next_seed
    }
}
