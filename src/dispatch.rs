//! The process-wide dispatch facade.
//!
//! The [`Dispatcher`] is the single coordination point between call sites
//! and the per-family bandit stores. It owns both stores, the active-family
//! flag, and the selection-count table, and routes every `choose`, `update`
//! and `summarize` to whichever store the caller names.
//!
//! # Concurrency
//!
//! All mutable dispatch state lives behind one `parking_lot::Mutex`, so
//! bandit creation for an unseen key is atomic and idempotent: under
//! concurrent first use of the same key, exactly one bandit is created and
//! every caller observes it. Bandit decisions are not on a
//! microsecond-critical path relative to the kernels they select, so a
//! single lock is adequate.
//!
//! `reset()` is intended for quiescent-state use (between benchmark phases
//! or test runs); calling it concurrently with in-flight selections drops
//! their observations.

use std::sync::OnceLock;

use parking_lot::Mutex;

use crate::bandit::store::BanditStore;
use crate::bandit::{
    Bandit, CallSiteKey, CostEstimates, Family, GaussianBandit, Implementation, RandomBandit,
};
use crate::config::TuneConfig;
use crate::metrics::TuneMetrics;
use crate::selection::{KernelEntryPoint, SelectionHandle};
use crate::telemetry::TelemetryLog;

/// Internal mutable state of the dispatcher.
struct DispatchInner {
    /// Currently active bandit family
    active: Family,
    /// Store for the uniform-random family
    random: BanditStore<RandomBandit>,
    /// Store for the Gaussian cost-model family
    gaussian: BanditStore<GaussianBandit>,
    /// Selections per implementation, across all families
    chosen_counts: [u64; Implementation::COUNT],
}

/// Process-wide entry point for bandit dispatch.
///
/// Holds the per-family bandit stores, the active family, and the global
/// selection-count table. State persists for the lifetime of the process
/// (or until an explicit [`reset`](Dispatcher::reset)).
///
/// Most programs use the documented global instance via
/// [`Dispatcher::global`] or the crate-level convenience functions;
/// explicitly constructed instances are useful in tests.
///
/// ```ignore
/// let dispatcher = Dispatcher::new();
/// dispatcher.set_active_family(Family::Gaussian);
///
/// let mut handle = dispatcher.select(entry_point);
/// run_kernel(handle.choice());
/// handle.finish();
/// ```
pub struct Dispatcher {
    inner: Mutex<DispatchInner>,
    telemetry: TelemetryLog,
    metrics: TuneMetrics,
}

static GLOBAL: OnceLock<Dispatcher> = OnceLock::new();

impl Dispatcher {
    /// Create a dispatcher with default configuration (family `None`).
    pub fn new() -> Self {
        Self::with_config(TuneConfig::default())
    }

    /// Create a dispatcher from a configuration.
    pub fn with_config(config: TuneConfig) -> Self {
        let dispatcher = Self {
            inner: Mutex::new(DispatchInner {
                active: config.family,
                random: BanditStore::new(()),
                gaussian: BanditStore::new(config.gaussian.clone()),
                chosen_counts: [0; Implementation::COUNT],
            }),
            telemetry: TelemetryLog::with_capacity(config.telemetry_capacity),
            metrics: TuneMetrics::with_prefix(&config.prefix),
        };
        tracing::debug!(family = %config.family, "dispatcher constructed");
        dispatcher
    }

    /// The documented single global instance for this process.
    ///
    /// Constructed on first use with default configuration; construction is
    /// explicit and idempotent, with no hidden static-initialization-order
    /// dependency. Programs that configure dispatch via
    /// [`TunerBuilder`](crate::TunerBuilder) typically hold their own
    /// instance instead.
    pub fn global() -> &'static Dispatcher {
        GLOBAL.get_or_init(Dispatcher::new)
    }

    /// The currently active bandit family.
    pub fn active_family(&self) -> Family {
        self.inner.lock().active
    }

    /// Set the active bandit family.
    ///
    /// Changing the family does not clear the per-family stores; the
    /// inactive store persists, inert, until [`reset`](Dispatcher::reset).
    pub fn set_active_family(&self, family: Family) {
        tracing::debug!(family = %family, "active bandit family changed");
        self.inner.lock().active = family;
    }

    /// Ask `family`'s bandit for `key` to choose an implementation.
    ///
    /// Creates the bandit on first sight of `key`, invoking `cost_fn` only
    /// in that case. Increments the global selection count for the returned
    /// implementation.
    ///
    /// # Panics
    ///
    /// Panics when `family` is [`Family::None`]: callers must not request a
    /// choice while selection is disabled. Also panics if the bandit returns
    /// the count sentinel, which indicates a broken bandit implementation.
    pub fn choose(
        &self,
        family: Family,
        key: CallSiteKey,
        cost_fn: impl FnOnce() -> CostEstimates,
    ) -> Implementation {
        let mut inner = self.inner.lock();
        let choice = match family {
            Family::RandomChoice => inner.random.get_or_create(key, cost_fn).choose(),
            Family::Gaussian => inner.gaussian.get_or_create(key, cost_fn).choose(),
            Family::None => panic!("choose() requires an active bandit family"),
        };
        assert!(
            choice != Implementation::TotalCount,
            "bandit returned the count sentinel"
        );
        inner.chosen_counts[choice.index()] += 1;
        drop(inner);
        self.metrics.record_outcome(choice);
        choice
    }

    /// Feed one observed duration back into `family`'s bandit for `key`.
    ///
    /// # Panics
    ///
    /// Panics when `family` is [`Family::None`] or when `key` was never
    /// passed to [`choose`](Dispatcher::choose): both are protocol
    /// violations by the caller.
    pub fn update(
        &self,
        family: Family,
        key: CallSiteKey,
        choice: Implementation,
        elapsed_ns: u64,
    ) {
        let mut inner = self.inner.lock();
        match family {
            Family::RandomChoice => inner.random.get(key).update(choice, elapsed_ns),
            Family::Gaussian => inner.gaussian.get(key).update(choice, elapsed_ns),
            Family::None => panic!("update() requires an active bandit family"),
        }
        drop(inner);
        self.metrics.record_update();
    }

    /// Summarize the active family's bandits, in first-seen key order.
    ///
    /// # Panics
    ///
    /// Panics when no family is active; summarizing is only meaningful for
    /// the live family.
    pub fn summarize(&self) {
        let inner = self.inner.lock();
        match inner.active {
            Family::RandomChoice => inner.random.summarize_all(),
            Family::Gaussian => inner.gaussian.summarize_all(),
            Family::None => panic!("summarize() requires an active bandit family"),
        }
    }

    /// How many times `choice` has been returned by `choose`, across all
    /// families, since the last reset.
    ///
    /// Sentinel outcomes occupy slots but are never chosen, so querying
    /// them returns zero.
    ///
    /// # Panics
    ///
    /// Panics when given the count sentinel.
    pub fn times_chosen(&self, choice: Implementation) -> u64 {
        self.inner.lock().chosen_counts[choice.index()]
    }

    /// Number of distinct call-site keys tracked by `family`'s store.
    ///
    /// Diagnostic accessor.
    ///
    /// # Panics
    ///
    /// Panics when `family` is [`Family::None`], which has no store.
    pub fn tracked_keys(&self, family: Family) -> usize {
        let inner = self.inner.lock();
        match family {
            Family::RandomChoice => inner.random.len(),
            Family::Gaussian => inner.gaussian.len(),
            Family::None => panic!("Family::None has no bandit store"),
        }
    }

    /// Clear both stores, zero all counters, and disable selection.
    ///
    /// After a reset the seed counters restart at zero, so a fresh run over
    /// the same keys reproduces the same randomized behavior. Intended for
    /// quiescent-state use between test runs or benchmark phases.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.random.reset();
        inner.gaussian.reset();
        inner.active = Family::None;
        for count in inner.chosen_counts.iter_mut() {
            *count = 0;
        }
        drop(inner);
        self.telemetry.clear();
        tracing::debug!("dispatcher reset");
    }

    /// Construct a scoped selection handle for one invocation.
    pub fn select<E: KernelEntryPoint>(&self, entry: E) -> SelectionHandle<'_, E> {
        SelectionHandle::new(self, entry)
    }

    /// The telemetry sink selections report into.
    pub fn telemetry(&self) -> &TelemetryLog {
        &self.telemetry
    }

    /// The Prometheus-compatible diagnostic counters.
    pub fn metrics(&self) -> &TuneMetrics {
        &self.metrics
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bandit::CostEstimate;

    fn priors() -> CostEstimates {
        vec![
            CostEstimate::new(Implementation::Conv2dNative, 10_000.0),
            CostEstimate::new(Implementation::Conv2dMkl, 20_000.0),
        ]
    }

    #[test]
    fn test_default_family_is_none() {
        let dispatcher = Dispatcher::new();
        assert_eq!(dispatcher.active_family(), Family::None);
    }

    #[test]
    fn test_set_active_family_keeps_stores() {
        let dispatcher = Dispatcher::new();
        dispatcher.set_active_family(Family::RandomChoice);
        let key = CallSiteKey::from_name("k");
        dispatcher.choose(Family::RandomChoice, key, priors);
        assert_eq!(dispatcher.tracked_keys(Family::RandomChoice), 1);

        // Switching away leaves the random store intact.
        dispatcher.set_active_family(Family::Gaussian);
        assert_eq!(dispatcher.tracked_keys(Family::RandomChoice), 1);
    }

    #[test]
    fn test_choose_never_returns_sentinels() {
        let dispatcher = Dispatcher::new();
        let key = CallSiteKey::from_name("k");
        for _ in 0..50 {
            let choice = dispatcher.choose(Family::RandomChoice, key, priors);
            assert!(choice.index() < Implementation::Disabled.index());
        }
    }

    #[test]
    fn test_times_chosen_counts_across_families() {
        let dispatcher = Dispatcher::new();
        let key = CallSiteKey::from_name("k");

        let mut expected = [0u64; Implementation::COUNT];
        for _ in 0..10 {
            let choice = dispatcher.choose(Family::RandomChoice, key, priors);
            expected[choice.index()] += 1;
        }
        for _ in 0..10 {
            let choice = dispatcher.choose(Family::Gaussian, key, priors);
            expected[choice.index()] += 1;
        }

        for imp in [Implementation::Conv2dNative, Implementation::Conv2dMkl] {
            assert_eq!(dispatcher.times_chosen(imp), expected[imp.index()]);
        }
        // Sentinels occupy slots but are never chosen.
        assert_eq!(dispatcher.times_chosen(Implementation::Disabled), 0);
        assert_eq!(dispatcher.times_chosen(Implementation::Fallback), 0);
    }

    #[test]
    #[should_panic(expected = "count sentinel")]
    fn test_times_chosen_rejects_count_sentinel() {
        let dispatcher = Dispatcher::new();
        let _ = dispatcher.times_chosen(Implementation::TotalCount);
    }

    #[test]
    #[should_panic(expected = "requires an active bandit family")]
    fn test_choose_with_none_family_is_fatal() {
        let dispatcher = Dispatcher::new();
        let _ = dispatcher.choose(Family::None, CallSiteKey::from_name("k"), priors);
    }

    #[test]
    #[should_panic(expected = "choose() must precede update()")]
    fn test_update_unseen_key_is_fatal() {
        let dispatcher = Dispatcher::new();
        dispatcher.update(
            Family::Gaussian,
            CallSiteKey::from_name("never-chosen"),
            Implementation::Conv2dNative,
            500,
        );
    }

    #[test]
    fn test_update_lands_on_the_choosing_bandit() {
        let dispatcher = Dispatcher::new();
        let key = CallSiteKey::from_name("k");

        let choice = dispatcher.choose(Family::RandomChoice, key, priors);
        dispatcher.update(Family::RandomChoice, key, choice, 500);

        // Same key, same store: no second bandit was created.
        assert_eq!(dispatcher.tracked_keys(Family::RandomChoice), 1);
        assert_eq!(dispatcher.metrics().updates_total.get(), 1);
    }

    #[test]
    fn test_reset_zeros_everything() {
        let dispatcher = Dispatcher::new();
        dispatcher.set_active_family(Family::RandomChoice);
        let key = CallSiteKey::from_name("k");
        let choice = dispatcher.choose(Family::RandomChoice, key, priors);
        dispatcher.update(Family::RandomChoice, key, choice, 500);

        dispatcher.reset();

        assert_eq!(dispatcher.active_family(), Family::None);
        for imp in [
            Implementation::Conv2dNative,
            Implementation::Conv2dNnpack,
            Implementation::Conv2dMkl,
            Implementation::Disabled,
            Implementation::Fallback,
        ] {
            assert_eq!(dispatcher.times_chosen(imp), 0);
        }
        assert_eq!(dispatcher.tracked_keys(Family::RandomChoice), 0);
        assert!(dispatcher.telemetry().is_empty());
    }

    #[test]
    fn test_global_returns_same_instance() {
        let a = Dispatcher::global() as *const Dispatcher;
        let b = Dispatcher::global() as *const Dispatcher;
        assert_eq!(a, b);
    }
}
