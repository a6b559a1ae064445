//! Configuration types for the kerntune dispatcher.

use serde::{Deserialize, Serialize};

use crate::bandit::{Family, GaussianKnobs};
use crate::telemetry::DEFAULT_TELEMETRY_CAPACITY;
use prometheus::Registry;

/// Configuration for the dispatcher.
///
/// This struct can be deserialized from TOML, YAML, JSON, or environment
/// variables using figment.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TuneConfig {
    /// Metric name prefix (default: "kerntune")
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Bandit family active at construction (default: none)
    #[serde(default)]
    pub family: Family,

    /// Gaussian bandit knobs.
    #[serde(default)]
    pub gaussian: GaussianKnobs,

    /// Maximum telemetry records kept in memory (default: 4096)
    #[serde(default = "default_telemetry_capacity")]
    pub telemetry_capacity: usize,

    /// Prometheus registry for metrics exposition.
    /// If provided, metrics will be registered for scraping.
    /// Not serializable - must be set programmatically.
    #[serde(skip)]
    pub prometheus_registry: Option<Registry>,
}

fn default_prefix() -> String {
    "kerntune".to_string()
}

fn default_telemetry_capacity() -> usize {
    DEFAULT_TELEMETRY_CAPACITY
}

impl Default for TuneConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            family: Family::None,
            gaussian: GaussianKnobs::default(),
            telemetry_capacity: default_telemetry_capacity(),
            prometheus_registry: None,
        }
    }
}

impl TuneConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }
}
