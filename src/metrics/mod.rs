//! Metrics collection for dispatch observability.
//!
//! This module provides Prometheus-compatible metrics for monitoring the
//! dispatcher. Counters are always incremented (zero overhead atomic
//! operations) and can optionally be exposed via a Prometheus registry for
//! scraping.
//!
//! These counters are diagnostic only. The authoritative per-implementation
//! selection-count table lives inside the [`Dispatcher`](crate::Dispatcher)
//! and is what `times_chosen` reads; nothing in the decision path consults
//! Prometheus.
//!
//! # Available Metrics
//!
//! ## Counters (cumulative)
//!
//! - `kerntune_choices_total` - Bandit choices made across all families
//! - `kerntune_updates_total` - Duration observations fed back
//! - `kerntune_disabled_decisions` - Handles resolved to `Disabled`
//! - `kerntune_fallback_decisions` - Handles resolved to `Fallback`
//!
//! # Example
//!
//! ```ignore
//! use prometheus::Registry;
//! use kerntune::TunerBuilder;
//!
//! let registry = Registry::new();
//! let dispatcher = TunerBuilder::new()
//!     .prometheus_registry(registry.clone())
//!     .build()?;
//!
//! // Later: expose metrics via HTTP
//! use prometheus::TextEncoder;
//! let encoder = TextEncoder::new();
//! let mut buffer = Vec::new();
//! encoder.encode(&registry.gather(), &mut buffer)?;
//! ```

mod prometheus;

pub use prometheus::TuneMetrics;
