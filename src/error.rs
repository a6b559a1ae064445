//! Error types for kerntune.
//!
//! Only the configuration boundary is fallible. Invariant violations inside
//! the dispatch protocol (double-finish, unseen keys, sentinel choices) are
//! caller bugs and panic with a descriptive message instead of surfacing
//! here.

use thiserror::Error;

/// Errors that can occur when building a dispatcher from configuration.
#[derive(Debug, Error)]
pub enum TuneError {
    /// Error extracting configuration from figment.
    #[error("configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    /// A bandit family name that is not `none`, `random_choice` or `gaussian`.
    #[error("unknown bandit family: {0:?}")]
    UnknownFamily(String),

    /// Error registering metrics with a Prometheus registry.
    #[error("failed to register metrics: {0}")]
    Metrics(#[from] prometheus::Error),
}

/// Result type alias for kerntune operations.
pub type Result<T> = std::result::Result<T, TuneError>;
