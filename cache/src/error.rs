use std::fmt;

/// Errors that can occur when building a cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
  /// The cache was configured with zero shards, which is not allowed.
  ZeroShards,
  /// The sweep interval was zero, which would spin the janitor thread.
  ZeroSweepInterval,
  /// The operating system refused to start the janitor thread.
  JanitorSpawn(String),
}

impl fmt::Display for BuildError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      BuildError::ZeroShards => write!(f, "shard count cannot be zero"),
      BuildError::ZeroSweepInterval => write!(f, "sweep interval cannot be zero"),
      BuildError::JanitorSpawn(reason) => {
        write!(f, "failed to spawn the cache janitor thread: {}", reason)
      }
    }
  }
}

impl std::error::Error for BuildError {}

/// Errors that can occur when loading the `cache:` configuration section.
#[derive(Debug)]
pub enum ConfigError {
  /// The configuration file could not be read.
  Read(std::io::Error),
  /// The YAML document could not be parsed.
  Parse(String),
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::Read(e) => write!(f, "failed to read cache configuration: {}", e),
      ConfigError::Parse(reason) => write!(f, "failed to parse cache configuration: {}", reason),
    }
  }
}

impl std::error::Error for ConfigError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      ConfigError::Read(e) => Some(e),
      ConfigError::Parse(_) => None,
    }
  }
}

impl From<std::io::Error> for ConfigError {
  fn from(e: std::io::Error) -> Self {
    ConfigError::Read(e)
  }
}
