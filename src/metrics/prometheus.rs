//! Prometheus counters for dispatch observability.
//!
//! Counters work standalone without a Registry - registration is only
//! needed for exposition (scraping).
//!
//! # Design Principles
//!
//! - **Always-on**: Counters are always incremented (zero overhead - just atomic ops)
//! - **Registry optional**: Users can optionally provide a Registry for exposition
//! - **Cached access**: Direct field access, no HashMap lookups in hot paths
//! - **Configurable prefix**: Metric names use `{prefix}_` prefix (default: "kerntune")

use prometheus::{IntCounter, Opts, Registry};

use crate::bandit::Implementation;

/// Prometheus metrics for the dispatcher.
///
/// Counters are always incremented (zero overhead atomic ops).
/// Registration to a Registry is optional - only needed for exposition.
#[derive(Clone)]
pub struct TuneMetrics {
    /// Bandit choices made across all families
    pub choices_total: IntCounter,

    /// Duration observations fed back into bandits
    pub updates_total: IntCounter,

    /// Handles resolved to `Disabled` (autotuning inactive)
    pub disabled_decisions: IntCounter,

    /// Handles resolved to `Fallback` (call site opted out)
    pub fallback_decisions: IntCounter,
}

impl Default for TuneMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl TuneMetrics {
    /// Create metrics with the default prefix "kerntune".
    ///
    /// Counters work fine - just not exposed until registered.
    pub fn new() -> Self {
        Self::with_prefix("kerntune")
    }

    /// Create metrics with a custom prefix.
    ///
    /// Metric names will be `{prefix}_choices_total`, `{prefix}_updates_total`,
    /// etc. The prefix is sanitized to be a valid Prometheus metric name:
    /// hyphens and other invalid characters are replaced with underscores.
    pub fn with_prefix(prefix: &str) -> Self {
        // Sanitize prefix for Prometheus: replace invalid chars with underscores
        // Valid chars: [a-zA-Z_:] for first char, [a-zA-Z0-9_:] for rest
        let prefix: String = prefix
            .chars()
            .enumerate()
            .map(|(i, c)| {
                if i == 0 {
                    if c.is_ascii_alphabetic() || c == '_' || c == ':' {
                        c
                    } else {
                        '_'
                    }
                } else if c.is_ascii_alphanumeric() || c == '_' || c == ':' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        Self {
            choices_total: IntCounter::with_opts(Opts::new(
                format!("{}_choices_total", prefix),
                "Bandit choices made across all families",
            ))
            .expect("metric creation should not fail"),

            updates_total: IntCounter::with_opts(Opts::new(
                format!("{}_updates_total", prefix),
                "Duration observations fed back into bandits",
            ))
            .expect("metric creation should not fail"),

            disabled_decisions: IntCounter::with_opts(Opts::new(
                format!("{}_disabled_decisions", prefix),
                "Handles resolved to Disabled",
            ))
            .expect("metric creation should not fail"),

            fallback_decisions: IntCounter::with_opts(Opts::new(
                format!("{}_fallback_decisions", prefix),
                "Handles resolved to Fallback",
            ))
            .expect("metric creation should not fail"),
        }
    }

    /// Register all metrics with a Registry for exposition.
    ///
    /// Call this if you want Prometheus scraping.
    ///
    /// # Errors
    ///
    /// Returns an error if any metric fails to register (e.g., duplicate names).
    pub fn register(&self, registry: &Registry) -> Result<(), prometheus::Error> {
        registry.register(Box::new(self.choices_total.clone()))?;
        registry.register(Box::new(self.updates_total.clone()))?;
        registry.register(Box::new(self.disabled_decisions.clone()))?;
        registry.register(Box::new(self.fallback_decisions.clone()))?;
        Ok(())
    }

    /// Record the outcome a selection handle resolved to.
    #[inline]
    pub fn record_outcome(&self, outcome: Implementation) {
        match outcome {
            Implementation::Disabled => self.disabled_decisions.inc(),
            Implementation::Fallback => self.fallback_decisions.inc(),
            _ => self.choices_total.inc(),
        }
    }

    /// Record one duration observation.
    #[inline]
    pub fn record_update(&self) {
        self.updates_total.inc();
    }
}

impl std::fmt::Debug for TuneMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TuneMetrics")
            .field("choices_total", &self.choices_total.get())
            .field("updates_total", &self.updates_total.get())
            .field("disabled_decisions", &self.disabled_decisions.get())
            .field("fallback_decisions", &self.fallback_decisions.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = TuneMetrics::new();
        assert_eq!(metrics.choices_total.get(), 0);
        assert_eq!(metrics.updates_total.get(), 0);
    }

    #[test]
    fn test_outcome_recording() {
        let metrics = TuneMetrics::new();

        metrics.record_outcome(Implementation::Conv2dNative);
        metrics.record_outcome(Implementation::Conv2dMkl);
        metrics.record_outcome(Implementation::Disabled);
        metrics.record_outcome(Implementation::Fallback);

        assert_eq!(metrics.choices_total.get(), 2);
        assert_eq!(metrics.disabled_decisions.get(), 1);
        assert_eq!(metrics.fallback_decisions.get(), 1);
    }

    #[test]
    fn test_registry_integration() {
        let metrics = TuneMetrics::new();
        let registry = Registry::new();

        metrics
            .register(&registry)
            .expect("registration should succeed");

        metrics.record_update();

        let families = registry.gather();
        let updates = families
            .iter()
            .find(|f| f.get_name() == "kerntune_updates_total");
        assert!(updates.is_some());
    }

    #[test]
    fn test_custom_prefix_sanitized() {
        let metrics = TuneMetrics::with_prefix("my-app");
        let registry = Registry::new();

        metrics
            .register(&registry)
            .expect("registration should succeed");

        metrics.record_outcome(Implementation::Conv2dNative);

        let families = registry.gather();
        let choices = families
            .iter()
            .find(|f| f.get_name() == "my_app_choices_total");
        assert!(choices.is_some());
    }

    #[test]
    fn test_metrics_clone_shares_counters() {
        let metrics = TuneMetrics::new();
        metrics.record_update();

        let cloned = metrics.clone();
        assert_eq!(cloned.updates_total.get(), 1);

        cloned.record_update();
        assert_eq!(metrics.updates_total.get(), 2);
    }
}
