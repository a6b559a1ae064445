//! Multi-armed bandit core for adaptive kernel dispatch.
//!
//! This module holds the learning side of the dispatcher:
//!
//! - **Per-key learning**: each distinct call-site shape maintains its own
//!   bandit instance, so statistics never bleed between shapes
//! - **Two families**: uniform-random exploration ([`RandomBandit`]) and a
//!   Gaussian cost model ([`GaussianBandit`]), selected process-wide
//! - **Reproducible randomness**: every bandit is seeded sequentially by its
//!   store, so a run that visits the same keys in the same order makes the
//!   same randomized decisions
//! - **Lazy priors**: cost estimation runs once per key, on first sight
//!
//! # Usage
//!
//! Bandits are not used directly; the [`Dispatcher`](crate::Dispatcher)
//! routes `choose`/`update`/`summarize` calls to the store of the active
//! family:
//!
//! ```ignore
//! let dispatcher = Dispatcher::new();
//! dispatcher.set_active_family(Family::Gaussian);
//!
//! let choice = dispatcher.choose(Family::Gaussian, key, || costs());
//! // ... run the chosen kernel ...
//! dispatcher.update(Family::Gaussian, key, choice, elapsed_ns);
//! ```

mod gaussian;
mod knobs;
mod random;
pub(crate) mod store;
mod types;

pub use gaussian::GaussianBandit;
pub use knobs::GaussianKnobs;
pub use random::RandomBandit;
pub use types::{Bandit, CallSiteKey, CostEstimate, CostEstimates, Family, Implementation};
