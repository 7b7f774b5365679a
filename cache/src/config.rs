//! The `cache:` section of the application configuration file.
//!
//! ```yaml
//! cache:
//!   shards: 16
//!   sweep_interval: 60s
//! ```

use crate::builder::{CacheBuilder, DEFAULT_SWEEP_INTERVAL};
use crate::error::ConfigError;

use std::fs;
use std::hash::BuildHasher;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Deserializer};

/// Settings for the process-wide cache.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
  /// Shard count. Defaults to four per CPU, rounded to a power of two.
  #[serde(default)]
  pub shards: Option<usize>,
  /// Interval between background sweeps, as a humantime string.
  #[serde(
    default = "default_sweep_interval",
    deserialize_with = "deserialize_duration"
  )]
  pub sweep_interval: Duration,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      shards: None,
      sweep_interval: DEFAULT_SWEEP_INTERVAL,
    }
  }
}

// The whole file may carry other sections; only `cache:` is read here.
#[derive(Deserialize)]
struct FileView {
  #[serde(default)]
  cache: CacheConfig,
}

fn default_sweep_interval() -> Duration {
  DEFAULT_SWEEP_INTERVAL
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
  D: Deserializer<'de>,
{
  let raw = String::deserialize(deserializer)?;
  humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
}

impl CacheConfig {
  /// Parses the `cache:` section out of a full YAML document.
  /// A missing section yields the defaults.
  pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
    let view: FileView =
      serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))?;
    Ok(view.cache)
  }

  /// Reads and parses the `cache:` section of a YAML file.
  pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
    let contents = fs::read_to_string(path)?;
    Self::from_yaml_str(&contents)
  }

  /// Applies these settings to a builder.
  pub fn apply<K, V, H>(&self, builder: CacheBuilder<K, V, H>) -> CacheBuilder<K, V, H> {
    let builder = builder.sweep_interval(self.sweep_interval);
    match self.shards {
      Some(shards) => builder.shards(shards),
      None => builder,
    }
  }

  /// Creates a builder configured from these settings.
  pub fn to_builder<K, V, H>(&self) -> CacheBuilder<K, V, H>
  where
    H: BuildHasher + Default,
  {
    self.apply(CacheBuilder::new())
  }
}
