//! # kerntune
//!
//! **Online multi-armed-bandit dispatch for kernel implementation selection**
//!
//! When an operation has several candidate implementations whose relative
//! performance depends on the call's shape, `kerntune` picks one per
//! invocation, measures how long it ran, and uses that feedback to improve
//! future picks. Each distinct call-site shape (operation plus its relevant
//! parameters) is an independent bandit problem whose arms are the candidate
//! implementations.
//!
//! ## Features
//!
//! - **Per-shape learning**: statistics never bleed between call-site shapes
//! - **Two bandit families**: uniform-random exploration and a Gaussian
//!   cost model, selected process-wide
//! - **Scoped timing**: a selection handle arms a monotonic clock at
//!   construction and reports the elapsed time exactly once on `finish()`
//! - **Reproducible**: bandits are seeded sequentially per store, so equal
//!   runs make equal decisions
//! - **Flexible configuration**: files (TOML/YAML/JSON), environment
//!   variables, or code, with built-in clap support for CLI overrides
//! - **Observability**: telemetry records per finished selection, tracing
//!   events, and optional Prometheus exposition
//!
//! ## Quick Start
//!
//! ```ignore
//! use kerntune::{Family, FixedEntryPoint, Implementation, TunerBuilder};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dispatcher = TunerBuilder::new()
//!         .family(Family::Gaussian)
//!         .build()?;
//!
//!     let site = FixedEntryPoint::new("conv2d/8x3x32x32", vec![
//!         kerntune::CostEstimate::new(Implementation::Conv2dNative, 120_000.0),
//!         kerntune::CostEstimate::new(Implementation::Conv2dMkl, 80_000.0),
//!     ]);
//!
//!     let mut handle = dispatcher.select(site);
//!     match handle.choice() {
//!         Implementation::Conv2dNative => { /* run the reference kernel */ }
//!         Implementation::Conv2dMkl => { /* run the MKL kernel */ }
//!         _ => { /* disabled or fallback: run the default path */ }
//!     }
//!     handle.finish();
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Global Dispatch
//!
//! Call sites scattered across a process can share the documented global
//! instance instead of threading a reference through every layer:
//!
//! ```ignore
//! kerntune::set_active_family(kerntune::Family::RandomChoice);
//!
//! let mut handle = kerntune::select(site);
//! // ... run handle.choice() ...
//! handle.finish();
//! ```
//!
//! ## Configuration
//!
//! Configuration sources are merged in order (later sources override
//! earlier):
//!
//! 1. Default values
//! 2. Config files (via `.file()`)
//! 3. Environment variables (via `.env_prefix()`)
//! 4. Programmatic overrides
//! 5. CLI arguments (via `.with_cli_args()`)
//!
//! ### Config File Example (TOML)
//!
//! ```toml
//! prefix = "myapp"
//! family = "gaussian"
//! telemetry_capacity = 1024
//! ```
//!
//! ### Environment Variables
//!
//! With `.env_prefix("KERNTUNE")`:
//! - `KERNTUNE_FAMILY=gaussian`
//! - `KERNTUNE_PREFIX=myapp`
//! - `KERNTUNE_TELEMETRY_CAPACITY=1024`
//!
//! ## Protocol
//!
//! The call/finish protocol is strict where it matters and forgiving where
//! it doesn't: double-`finish()` on a timed handle panics (a caller bug),
//! while skipping `finish()` merely loses one observation (debug builds log
//! a warning). Disabled autotuning and declared fallbacks are ordinary
//! outcomes, not errors.

pub mod bandit;
pub mod builder;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod metrics;
pub mod selection;
pub mod telemetry;

pub use bandit::{
    Bandit, CallSiteKey, CostEstimate, CostEstimates, Family, GaussianBandit, GaussianKnobs,
    Implementation, RandomBandit,
};
pub use builder::{TuneArgs, TunerBuilder};
pub use config::TuneConfig;
pub use dispatch::Dispatcher;
pub use error::{Result, TuneError};
pub use metrics::TuneMetrics;
pub use selection::{FixedEntryPoint, KernelEntryPoint, SelectionHandle};
pub use telemetry::{TelemetryLog, TelemetryRecord};

/// The process-wide dispatcher.
///
/// This is a convenience function for [`Dispatcher::global`]. The instance
/// is constructed on first use with default configuration; programs that
/// need files/env/CLI configuration should build their own dispatcher with
/// [`TunerBuilder`] and pass it explicitly.
pub fn dispatcher() -> &'static Dispatcher {
    Dispatcher::global()
}

/// Set the active bandit family on the global dispatcher.
pub fn set_active_family(family: Family) {
    Dispatcher::global().set_active_family(family)
}

/// Construct a selection handle against the global dispatcher.
///
/// # Example
///
/// ```ignore
/// let mut handle = kerntune::select(site);
/// run_kernel(handle.choice());
/// handle.finish();
/// ```
pub fn select<E: KernelEntryPoint>(entry: E) -> SelectionHandle<'static, E> {
    Dispatcher::global().select(entry)
}

/// Summarize the global dispatcher's active family.
///
/// # Panics
///
/// Panics when no family is active.
pub fn summarize() {
    Dispatcher::global().summarize()
}

/// Reset the global dispatcher: clear both stores, zero all counters, and
/// disable selection.
///
/// Intended for quiescent-state use between test runs or benchmark phases.
pub fn reset() {
    Dispatcher::global().reset()
}
