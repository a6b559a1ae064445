//! Scoped per-invocation selection.
//!
//! A [`SelectionHandle`] ties one call's lifetime to a chosen
//! implementation: construction makes the decision and arms a monotonic
//! timer, and exactly one [`finish`](SelectionHandle::finish) call stops
//! the timer and reports the observed duration back into the bandit store
//! and the telemetry sink.
//!
//! # Usage
//!
//! ```ignore
//! let mut handle = dispatcher.select(Conv2dSite::new(batch, c_in, c_out));
//! match handle.choice() {
//!     Implementation::Conv2dNative => run_native(&input),
//!     Implementation::Conv2dMkl => run_mkl(&input),
//!     Implementation::Disabled | Implementation::Fallback => run_default(&input),
//!     other => unreachable!("not a dispatchable outcome: {other:?}"),
//! }
//! handle.finish();
//! ```
//!
//! Skipping `finish()` after a timed decision is not an error, just a lost
//! learning signal; debug builds log a warning when a timed handle is
//! dropped unfinished.

use std::time::Instant;

use crate::bandit::{CallSiteKey, CostEstimates, Family, Implementation};
use crate::dispatch::Dispatcher;

/// Per-call descriptor of a tunable call site.
///
/// Constructed from caller-supplied arguments at call-site entry; the
/// dispatcher consumes it through this boundary only.
pub trait KernelEntryPoint {
    /// The key identifying this call site's shape.
    fn key(&self) -> CallSiteKey;

    /// Whether the call site declares itself ineligible for autotuning.
    ///
    /// A fallback call site bypasses bandit selection entirely.
    fn fallback(&self) -> bool {
        false
    }

    /// The implementations available for this call, in preference order.
    ///
    /// Empty only when [`fallback`](KernelEntryPoint::fallback) is true.
    fn implementations(&self) -> Vec<Implementation>;

    /// Initial cost estimates seeding a new bandit for this key.
    ///
    /// Invoked only when the key has not been seen before.
    fn costs(&self) -> CostEstimates;

    /// Human-readable description of the call site for diagnostics.
    fn repr(&self) -> String;
}

/// A ready-made entry point for call sites with precomputed costs.
///
/// Useful when cost estimation happens outside the dispatcher, and in
/// tests and benchmarks.
#[derive(Clone, Debug)]
pub struct FixedEntryPoint {
    name: String,
    costs: CostEstimates,
    fallback: bool,
}

impl FixedEntryPoint {
    /// An entry point offering the implementations named by `costs`.
    pub fn new(name: impl Into<String>, costs: CostEstimates) -> Self {
        Self {
            name: name.into(),
            costs,
            fallback: false,
        }
    }

    /// An entry point that opts out of selection.
    pub fn fallback(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            costs: Vec::new(),
            fallback: true,
        }
    }
}

impl KernelEntryPoint for FixedEntryPoint {
    fn key(&self) -> CallSiteKey {
        CallSiteKey::from_name(&self.name)
    }

    fn fallback(&self) -> bool {
        self.fallback
    }

    fn implementations(&self) -> Vec<Implementation> {
        self.costs.iter().map(|e| e.imp).collect()
    }

    fn costs(&self) -> CostEstimates {
        self.costs.clone()
    }

    fn repr(&self) -> String {
        self.name.clone()
    }
}

enum HandleState {
    /// No timing: selection was disabled or the call site fell back.
    Untimed,
    /// A real choice was made; the clock is armed.
    Timed { started: Instant },
    /// `finish()` has run.
    Finished,
}

/// Scoped handle binding one invocation to its chosen implementation.
///
/// The decision is made during construction:
///
/// 1. Active family `None` resolves to [`Implementation::Disabled`]
/// 2. A declared fallback resolves to [`Implementation::Fallback`]
/// 3. Otherwise the active family's bandit chooses, and a
///    high-resolution timer is armed
///
/// Only the third path times the call and reports on `finish()`.
pub struct SelectionHandle<'d, E: KernelEntryPoint> {
    dispatcher: &'d Dispatcher,
    entry: E,
    family: Family,
    choice: Implementation,
    state: HandleState,
}

impl<'d, E: KernelEntryPoint> SelectionHandle<'d, E> {
    /// Decide an implementation for one invocation of `entry`.
    ///
    /// # Panics
    ///
    /// Panics when autotuning is enabled, the call site did not request a
    /// fallback, and its implementation list is empty. That combination is
    /// a contract violation by the descriptor.
    pub fn new(dispatcher: &'d Dispatcher, entry: E) -> Self {
        let family = dispatcher.active_family();

        let (choice, state) = if family == Family::None {
            (Implementation::Disabled, HandleState::Untimed)
        } else if entry.fallback() {
            (Implementation::Fallback, HandleState::Untimed)
        } else {
            assert!(
                !entry.implementations().is_empty(),
                "autotuning is enabled and the call site did not request a fallback, \
                 but no implementations are available"
            );
            let choice = dispatcher.choose(family, entry.key(), || entry.costs());
            (
                choice,
                HandleState::Timed {
                    started: Instant::now(),
                },
            )
        };

        if matches!(state, HandleState::Untimed) {
            dispatcher.metrics().record_outcome(choice);
        }

        Self {
            dispatcher,
            entry,
            family,
            choice,
            state,
        }
    }

    /// The decision made at construction. Valid in any state.
    pub fn choice(&self) -> Implementation {
        self.choice
    }

    /// Stop the timer and report the observed duration.
    ///
    /// A no-op for untimed handles (disabled or fallback). For timed
    /// handles this feeds the elapsed nanoseconds back into the bandit
    /// that made the choice, registers the call site's label with the
    /// telemetry sink, and appends a telemetry record.
    ///
    /// # Panics
    ///
    /// Panics when called a second time on the same handle.
    pub fn finish(&mut self) {
        let started = match self.state {
            HandleState::Untimed => return,
            HandleState::Timed { started } => started,
            HandleState::Finished => panic!("finish() called twice on a selection handle"),
        };
        let elapsed_ns = started.elapsed().as_nanos() as u64;
        self.state = HandleState::Finished;

        let key = self.entry.key();
        self.dispatcher
            .update(self.family, key, self.choice, elapsed_ns);

        let telemetry = self.dispatcher.telemetry();
        telemetry.register_key(key, || self.entry.repr());
        telemetry.record(self.family, key, self.choice, elapsed_ns);
    }
}

impl<E: KernelEntryPoint> Drop for SelectionHandle<'_, E> {
    fn drop(&mut self) {
        // Debug-only guard: a timed handle dropped without finish() is a
        // silently lost observation. Flag it so the gap is observable.
        if cfg!(debug_assertions) && matches!(self.state, HandleState::Timed { .. }) {
            tracing::warn!(
                key = self.entry.key().0,
                choice = %self.choice,
                "selection handle dropped without finish(); observation lost"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bandit::CostEstimate as Estimate;

    fn costs() -> CostEstimates {
        vec![
            Estimate::new(Implementation::Conv2dNative, 10_000.0),
            Estimate::new(Implementation::Conv2dMkl, 20_000.0),
        ]
    }

    #[test]
    fn test_disabled_family_yields_disabled_choice() {
        let dispatcher = Dispatcher::new();
        let mut handle = dispatcher.select(FixedEntryPoint::new("site", costs()));

        assert_eq!(handle.choice(), Implementation::Disabled);

        // finish() is a no-op: no update lands anywhere.
        handle.finish();
        assert_eq!(dispatcher.metrics().updates_total.get(), 0);
        assert!(dispatcher.telemetry().is_empty());
    }

    #[test]
    fn test_fallback_site_bypasses_selection() {
        let dispatcher = Dispatcher::new();
        dispatcher.set_active_family(Family::Gaussian);
        let mut handle = dispatcher.select(FixedEntryPoint::fallback("opt-out"));

        assert_eq!(handle.choice(), Implementation::Fallback);
        handle.finish();

        // No bandit was created and nothing was timed.
        assert_eq!(dispatcher.tracked_keys(Family::Gaussian), 0);
        assert_eq!(dispatcher.metrics().fallback_decisions.get(), 1);
    }

    #[test]
    fn test_timed_flow_reports_once() {
        let dispatcher = Dispatcher::new();
        dispatcher.set_active_family(Family::RandomChoice);

        let mut handle = dispatcher.select(FixedEntryPoint::new("site", costs()));
        let choice = handle.choice();
        assert!(
            choice == Implementation::Conv2dNative || choice == Implementation::Conv2dMkl
        );

        handle.finish();

        let records = dispatcher.telemetry().records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].choice, choice);
        assert_eq!(records[0].family, Family::RandomChoice);
        assert_eq!(
            dispatcher.telemetry().label(records[0].key).as_deref(),
            Some("site")
        );
    }

    #[test]
    #[should_panic(expected = "finish() called twice")]
    fn test_double_finish_is_fatal() {
        let dispatcher = Dispatcher::new();
        dispatcher.set_active_family(Family::RandomChoice);

        let mut handle = dispatcher.select(FixedEntryPoint::new("site", costs()));
        handle.finish();
        handle.finish();
    }

    #[test]
    fn test_untimed_finish_is_repeatable() {
        // The exactly-once contract applies to timed handles; untimed
        // finish() stays a no-op however often it runs.
        let dispatcher = Dispatcher::new();
        let mut handle = dispatcher.select(FixedEntryPoint::new("site", costs()));
        handle.finish();
        handle.finish();
    }

    #[test]
    #[should_panic(expected = "no implementations are available")]
    fn test_empty_implementations_without_fallback_is_fatal() {
        let dispatcher = Dispatcher::new();
        dispatcher.set_active_family(Family::RandomChoice);
        let _ = dispatcher.select(FixedEntryPoint::new("bad-site", Vec::new()));
    }

    #[test]
    fn test_skipping_finish_only_loses_the_observation() {
        let dispatcher = Dispatcher::new();
        dispatcher.set_active_family(Family::Gaussian);

        {
            let handle = dispatcher.select(FixedEntryPoint::new("site", costs()));
            let _ = handle.choice();
            // Dropped without finish().
        }

        assert_eq!(dispatcher.metrics().updates_total.get(), 0);
        // The bandit still exists; only the observation is gone.
        assert_eq!(dispatcher.tracked_keys(Family::Gaussian), 1);
    }

    #[test]
    fn test_choice_valid_after_finish() {
        let dispatcher = Dispatcher::new();
        dispatcher.set_active_family(Family::RandomChoice);

        let mut handle = dispatcher.select(FixedEntryPoint::new("site", costs()));
        let before = handle.choice();
        handle.finish();
        assert_eq!(handle.choice(), before);
    }
}
