use thiserror::Error;

/// The error type for `trellis_logging`.
#[derive(Debug, Error)]
pub enum Error {
  #[error("Configuration file not found: {0}")]
  ConfigNotFound(String),

  #[error("Failed to read configuration file: {0}")]
  ConfigRead(#[from] std::io::Error),

  #[error("Failed to parse configuration: {0}")]
  ConfigParse(String),

  #[error("Invalid configuration value for '{field}': {message}")]
  InvalidConfigValue { field: String, message: String },

  #[error("Failed to set global tracing subscriber: {0}")]
  GlobalSubscriberSet(String),
}

/// A specialized `Result` type for `trellis_logging` operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
