//! Builder pattern for constructing configured dispatchers.
//!
//! The builder supports multiple configuration sources using figment:
//! - Default values
//! - Config files (TOML, YAML, JSON)
//! - Environment variables
//! - Programmatic overrides
//! - CLI arguments via clap

use crate::bandit::{Family, GaussianKnobs};
use crate::config::TuneConfig;
use crate::dispatch::Dispatcher;
use crate::error::Result;

use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use figment::Figment;
use prometheus::Registry;
use std::path::Path;

/// Builder for constructing a [`Dispatcher`].
///
/// Configuration sources are merged in the following order (later sources
/// override earlier):
/// 1. Default values
/// 2. Config files (in order added)
/// 3. Environment variables
/// 4. Programmatic overrides
///
/// # Examples
///
/// ```ignore
/// use kerntune::TunerBuilder;
///
/// let dispatcher = TunerBuilder::new()
///     .file("kerntune.toml")
///     .env_prefix("KERNTUNE")
///     .family(Family::Gaussian)
///     .build()?;
/// ```
pub struct TunerBuilder {
    figment: Figment,
    prometheus_registry: Option<Registry>,
}

impl Default for TunerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TunerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TunerBuilder")
            .field("figment", &self.figment)
            .field(
                "prometheus_registry",
                &self.prometheus_registry.as_ref().map(|_| "<Registry>"),
            )
            .finish()
    }
}

impl TunerBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self {
            figment: Figment::from(Serialized::defaults(TuneConfig::default())),
            prometheus_registry: None,
        }
    }

    /// Add a configuration file.
    ///
    /// Supports TOML, YAML, and JSON formats (detected by extension).
    /// Files are merged in the order they are added.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        let path = path.as_ref();
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        self.figment = match extension.to_lowercase().as_str() {
            "toml" => self.figment.merge(Toml::file(path)),
            "yaml" | "yml" => self.figment.merge(Yaml::file(path)),
            "json" => self.figment.merge(Json::file(path)),
            _ => {
                // Default to TOML
                self.figment.merge(Toml::file(path))
            }
        };
        self
    }

    /// Add environment variables with a prefix.
    ///
    /// Environment variables are expected in the format `{PREFIX}_{KEY}`,
    /// e.g., `KERNTUNE_FAMILY`, `KERNTUNE_TELEMETRY_CAPACITY`.
    pub fn env_prefix(mut self, prefix: &str) -> Self {
        self.figment = self.figment.merge(Env::prefixed(prefix).split("_"));
        self
    }

    /// Set the metric name prefix.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.figment = self
            .figment
            .merge(Serialized::default("prefix", prefix.into()));
        self
    }

    /// Set the bandit family active at construction.
    ///
    /// Default is [`Family::None`], which disables selection until
    /// [`Dispatcher::set_active_family`] is called.
    pub fn family(mut self, family: Family) -> Self {
        self.figment = self.figment.merge(Serialized::default("family", family));
        self
    }

    /// Set the Gaussian bandit knobs.
    ///
    /// These control the cost model's prior strength and responsiveness.
    /// Most users don't need to modify these. See [`GaussianKnobs`] for
    /// details.
    pub fn gaussian_knobs(mut self, knobs: GaussianKnobs) -> Self {
        self.figment = self.figment.merge(Serialized::default("gaussian", knobs));
        self
    }

    /// Set the telemetry record buffer capacity.
    pub fn telemetry_capacity(mut self, capacity: usize) -> Self {
        self.figment = self
            .figment
            .merge(Serialized::default("telemetry_capacity", capacity));
        self
    }

    /// Provide an external Prometheus registry for metrics exposition.
    ///
    /// When a registry is provided, dispatcher metrics will be registered
    /// and available for Prometheus scraping.
    pub fn prometheus_registry(mut self, registry: Registry) -> Self {
        self.prometheus_registry = Some(registry);
        self
    }

    /// Apply CLI argument overrides.
    ///
    /// This method applies any non-None values from the [`TuneArgs`] struct.
    pub fn with_cli_args(mut self, args: &TuneArgs) -> Self {
        if let Some(ref prefix) = args.tune_prefix {
            self.figment = self
                .figment
                .merge(Serialized::default("prefix", prefix.clone()));
        }
        if let Some(ref family) = args.tune_family {
            // Merged as a raw string; an invalid name surfaces as a
            // configuration error at build().
            self.figment = self
                .figment
                .merge(Serialized::default("family", family.clone()));
        }
        if let Some(capacity) = args.tune_telemetry_capacity {
            self.figment = self
                .figment
                .merge(Serialized::default("telemetry_capacity", capacity));
        }
        self
    }

    /// Build the dispatcher.
    ///
    /// This extracts the configuration and constructs the dispatcher,
    /// registering its metrics when a Prometheus registry was provided.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration extraction fails (malformed file,
    /// unknown family name, type mismatch) or metric registration fails.
    pub fn build(self) -> Result<Dispatcher> {
        let mut config: TuneConfig = self.figment.extract().map_err(Box::new)?;
        config.prometheus_registry = self.prometheus_registry;

        let registry = config.prometheus_registry.clone();
        let dispatcher = Dispatcher::with_config(config);
        if let Some(registry) = registry {
            dispatcher.metrics().register(&registry)?;
        }
        Ok(dispatcher)
    }
}

/// CLI arguments for dispatcher configuration.
///
/// Use with clap's `Parser` derive macro. These arguments can be applied
/// to a [`TunerBuilder`] using `with_cli_args`.
///
/// # Examples
///
/// ```ignore
/// use clap::Parser;
/// use kerntune::{TunerBuilder, TuneArgs};
///
/// #[derive(Parser)]
/// struct MyArgs {
///     #[command(flatten)]
///     tune: TuneArgs,
///     // ... other args
/// }
///
/// let args = MyArgs::parse();
/// let dispatcher = TunerBuilder::new()
///     .with_cli_args(&args.tune)
///     .build()?;
/// ```
#[derive(Debug, Default, Clone, clap::Args)]
pub struct TuneArgs {
    /// Metric name prefix
    #[arg(long)]
    pub tune_prefix: Option<String>,

    /// Bandit family: none, random_choice or gaussian
    #[arg(long)]
    pub tune_family: Option<String>,

    /// Telemetry record buffer capacity
    #[arg(long)]
    pub tune_telemetry_capacity: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config: TuneConfig = TunerBuilder::new().figment.extract().unwrap();
        assert_eq!(config.prefix, "kerntune");
        assert_eq!(config.family, Family::None);
        assert_eq!(config.telemetry_capacity, 4096);
    }

    #[test]
    fn test_builder_programmatic_override() {
        let config: TuneConfig = TunerBuilder::new()
            .prefix("myapp")
            .family(Family::Gaussian)
            .telemetry_capacity(64)
            .figment
            .extract()
            .unwrap();

        assert_eq!(config.prefix, "myapp");
        assert_eq!(config.family, Family::Gaussian);
        assert_eq!(config.telemetry_capacity, 64);
    }

    #[test]
    fn test_builder_cli_args() {
        let args = TuneArgs {
            tune_prefix: Some("cliapp".to_string()),
            tune_family: Some("random_choice".to_string()),
            tune_telemetry_capacity: Some(32),
        };

        let config: TuneConfig = TunerBuilder::new()
            .prefix("original")
            .family(Family::Gaussian)
            .with_cli_args(&args)
            .figment
            .extract()
            .unwrap();

        // CLI args should override programmatic values
        assert_eq!(config.prefix, "cliapp");
        assert_eq!(config.family, Family::RandomChoice);
        assert_eq!(config.telemetry_capacity, 32);
    }

    #[test]
    fn test_builder_partial_cli_args() {
        let args = TuneArgs {
            tune_prefix: Some("cliapp".to_string()),
            tune_family: None,
            tune_telemetry_capacity: None,
        };

        let config: TuneConfig = TunerBuilder::new()
            .family(Family::Gaussian)
            .with_cli_args(&args)
            .figment
            .extract()
            .unwrap();

        // Only prefix should be overridden
        assert_eq!(config.prefix, "cliapp");
        assert_eq!(config.family, Family::Gaussian);
    }

    #[test]
    fn test_invalid_family_name_fails_at_build() {
        let args = TuneArgs {
            tune_prefix: None,
            tune_family: Some("thompson".to_string()),
            tune_telemetry_capacity: None,
        };

        let result = TunerBuilder::new().with_cli_args(&args).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_build_constructs_configured_dispatcher() {
        let dispatcher = TunerBuilder::new()
            .family(Family::RandomChoice)
            .build()
            .unwrap();
        assert_eq!(dispatcher.active_family(), Family::RandomChoice);
    }
}
