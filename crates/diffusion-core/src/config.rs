//! Configuration loading and typed config structures for the diffusion
//! simulation.
//!
//! The canonical configuration lives in `diffusion-config.yaml` at the
//! project root. Every section and field has a default, so an empty file is
//! a valid (if uninteresting) configuration. The `network` section is passed
//! verbatim to the network factory; its strategy parameters are validated
//! when the network is built.

use std::collections::BTreeMap;
use std::path::Path;

use diffusion_network::NetworkSpec;
use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A field holds a value the simulation cannot run with.
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: String,
        /// Why the value was rejected.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

fn invalid(field: impl Into<String>, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field: field.into(),
        reason: reason.into(),
    }
}

/// Top-level simulation configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// World-level settings (name, seed, duration).
    #[serde(default)]
    pub world: WorldConfig,

    /// Agent population and group structure.
    #[serde(default)]
    pub population: PopulationConfig,

    /// Social network strategies.
    #[serde(default)]
    pub network: NetworkSpec,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load and validate configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.world.reweigh_interval == 0 {
            return Err(invalid("world.reweigh_interval", "must be at least 1"));
        }
        self.population.validate()
    }
}

/// World-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Human-readable simulation name.
    #[serde(default = "default_world_name")]
    pub name: String,

    /// Random seed for reproducibility.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Number of ticks a full run lasts.
    #[serde(default = "default_ticks")]
    pub ticks: u64,

    /// Edge weights are recomputed every this many ticks.
    #[serde(default = "default_reweigh_interval")]
    pub reweigh_interval: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            seed: default_seed(),
            ticks: default_ticks(),
            reweigh_interval: default_reweigh_interval(),
        }
    }
}

/// Population configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PopulationConfig {
    /// Number of agents at simulation start.
    #[serde(default = "default_agents")]
    pub agents: usize,

    /// Group name -> relative share of the population.
    #[serde(default = "default_groups")]
    pub groups: BTreeMap<String, f64>,

    /// From-group -> to-group -> affinity. Empty means affinity 1 between
    /// every pair of groups.
    #[serde(default)]
    pub affinity: BTreeMap<String, BTreeMap<String, f64>>,

    /// Place agents on a plane for spatially aware attachment.
    #[serde(default)]
    pub spatial: Option<SpatialConfig>,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            agents: default_agents(),
            groups: default_groups(),
            affinity: BTreeMap::new(),
            spatial: None,
        }
    }
}

impl PopulationConfig {
    /// Check agent count, group shares, affinities and spatial extents.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.agents == 0 {
            return Err(invalid("population.agents", "must be at least 1"));
        }
        if self.groups.is_empty() {
            return Err(invalid("population.groups", "at least one group is required"));
        }
        for (name, share) in &self.groups {
            if !share.is_finite() || *share <= 0.0 {
                return Err(invalid(
                    format!("population.groups.{name}"),
                    format!("share must be a positive number, got {share}"),
                ));
            }
        }
        for (from, row) in &self.affinity {
            for (to, weight) in row {
                let field = format!("population.affinity.{from}.{to}");
                if !self.groups.contains_key(from) || !self.groups.contains_key(to) {
                    return Err(invalid(field, "refers to an undeclared group"));
                }
                if !weight.is_finite() || *weight < 0.0 {
                    return Err(invalid(field, format!("affinity must be non-negative, got {weight}")));
                }
            }
        }
        if let Some(spatial) = &self.spatial {
            for (field, extent) in [("width", spatial.width), ("height", spatial.height)] {
                if !extent.is_finite() || extent <= 0.0 {
                    return Err(invalid(
                        format!("population.spatial.{field}"),
                        format!("must be a positive number, got {extent}"),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Rectangle agents are scattered over uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct SpatialConfig {
    /// Extent along x.
    #[serde(default = "default_extent")]
    pub width: f64,

    /// Extent along y.
    #[serde(default = "default_extent")]
    pub height: f64,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable text.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

fn default_world_name() -> String {
    "Diffusion".to_owned()
}

const fn default_seed() -> u64 {
    42
}

const fn default_ticks() -> u64 {
    100
}

const fn default_reweigh_interval() -> u64 {
    1
}

const fn default_agents() -> usize {
    100
}

fn default_groups() -> BTreeMap<String, f64> {
    BTreeMap::from([("everyone".to_owned(), 1.0)])
}

const fn default_extent() -> f64 {
    100.0
}

fn default_log_level() -> String {
    "info".to_owned()
}
