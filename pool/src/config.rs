//! The `pools:` section of the application configuration file.
//!
//! ```yaml
//! pools:
//!   release_timeout: 10s
//!   entries:
//!     - name: db
//!       size: 8
//!       block_after: 100
//!     - name: mail
//!       size: -1   # unbounded
//! ```

use crate::error::{PoolError, RegistryError};
use crate::pool::{PoolSize, WorkerPool};
use crate::registry::PoolRegistry;

use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Deserializer};
use thiserror::Error;

const DEFAULT_RELEASE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("Failed to read configuration file: {0}")]
  Read(#[from] io::Error),

  #[error("Failed to parse configuration: {0}")]
  Parse(#[from] serde_yaml::Error),

  #[error("Invalid size for pool '{name}': size 0 is not allowed")]
  ZeroSize { name: String },

  #[error("Failed to create pool '{name}': {source}")]
  Pool {
    name: String,
    #[source]
    source: PoolError,
  },

  #[error(transparent)]
  Registry(#[from] RegistryError),
}

/// One pool declaration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PoolConfig {
  pub name: String,
  /// Worker count. Absent or negative means unbounded; zero is an error.
  #[serde(default)]
  pub size: Option<i64>,
  /// Ceiling on jobs waiting for a worker. Absent means unlimited.
  #[serde(default)]
  pub block_after: Option<usize>,
}

/// The full `pools:` section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PoolsConfig {
  /// How long shutdown waits for pools to drain.
  #[serde(
    default = "default_release_timeout",
    deserialize_with = "deserialize_duration"
  )]
  pub release_timeout: Duration,
  #[serde(default)]
  pub entries: Vec<PoolConfig>,
}

impl Default for PoolsConfig {
  fn default() -> Self {
    Self {
      release_timeout: DEFAULT_RELEASE_TIMEOUT,
      entries: Vec::new(),
    }
  }
}

#[derive(Deserialize)]
struct FileView {
  #[serde(default)]
  pools: PoolsConfig,
}

fn default_release_timeout() -> Duration {
  DEFAULT_RELEASE_TIMEOUT
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
  D: Deserializer<'de>,
{
  let raw = String::deserialize(deserializer)?;
  humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
}

impl PoolConfig {
  pub fn pool_size(&self) -> Result<PoolSize, ConfigError> {
    match self.size {
      None => Ok(PoolSize::Unbounded),
      Some(n) if n < 0 => Ok(PoolSize::Unbounded),
      Some(0) => Err(ConfigError::ZeroSize {
        name: self.name.clone(),
      }),
      Some(n) => Ok(PoolSize::Bounded(n as usize)),
    }
  }

  /// Builds the pool this entry describes, named after the entry.
  pub fn build(&self) -> Result<WorkerPool, ConfigError> {
    let mut builder = WorkerPool::builder()
      .name(self.name.clone())
      .size(self.pool_size()?);
    if let Some(max) = self.block_after {
      builder = builder.max_blocking(max);
    }
    builder.build().map_err(|source| ConfigError::Pool {
      name: self.name.clone(),
      source,
    })
  }
}

impl PoolsConfig {
  /// Reads the `pools:` section from a YAML document. Other sections are
  /// ignored; a missing section yields the defaults.
  pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
    let view: FileView = serde_yaml::from_str(yaml)?;
    Ok(view.pools)
  }

  pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
    let contents = fs::read_to_string(path)?;
    Self::from_yaml_str(&contents)
  }

  /// Builds and registers every declared pool, in order.
  ///
  /// Stops at the first error. Pools registered before the failure stay
  /// registered. Returns the number of pools registered.
  pub fn register_all(&self, registry: &PoolRegistry) -> Result<usize, ConfigError> {
    for entry in &self.entries {
      let pool = entry.build()?;
      registry.register(entry.name.clone(), pool)?;
    }
    Ok(self.entries.len())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn size_mapping() {
    let entry = |size| PoolConfig {
      name: "p".to_string(),
      size,
      block_after: None,
    };
    assert_eq!(entry(None).pool_size().unwrap(), PoolSize::Unbounded);
    assert_eq!(entry(Some(-1)).pool_size().unwrap(), PoolSize::Unbounded);
    assert_eq!(entry(Some(4)).pool_size().unwrap(), PoolSize::Bounded(4));
    assert!(matches!(
      entry(Some(0)).pool_size(),
      Err(ConfigError::ZeroSize { .. })
    ));
  }

  #[test]
  fn missing_section_uses_defaults() {
    let config = PoolsConfig::from_yaml_str("logging:\n  level: debug\n").unwrap();
    assert_eq!(config, PoolsConfig::default());
  }

  #[test]
  fn unknown_pool_field_is_rejected() {
    let yaml = "pools:\n  entries:\n    - name: db\n      workers: 3\n";
    assert!(matches!(
      PoolsConfig::from_yaml_str(yaml),
      Err(ConfigError::Parse(_))
    ));
  }
}
