//! The `logging:` section of the application configuration file.
//!
//! ```yaml
//! logging:
//!   level: info,trellis_pool=debug
//!   format: compact
//!   ansi: false
//!   file:
//!     directory: logs
//!     prefix: app.log
//!     rotation: daily
//! ```

use crate::error::{Error, Result};

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
  #[default]
  Full,
  Compact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rotation {
  #[default]
  Never,
  Daily,
  Hourly,
  Minutely,
}

impl From<Rotation> for tracing_appender::rolling::Rotation {
  fn from(rotation: Rotation) -> Self {
    match rotation {
      Rotation::Never => tracing_appender::rolling::Rotation::NEVER,
      Rotation::Daily => tracing_appender::rolling::Rotation::DAILY,
      Rotation::Hourly => tracing_appender::rolling::Rotation::HOURLY,
      Rotation::Minutely => tracing_appender::rolling::Rotation::MINUTELY,
    }
  }
}

/// An additional plain-text log file, written from a background thread.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
  pub directory: PathBuf,
  #[serde(default = "default_file_prefix")]
  pub prefix: String,
  #[serde(default)]
  pub rotation: Rotation,
}

fn default_file_prefix() -> String {
  "trellis.log".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
  /// An `EnvFilter` directive string. `RUST_LOG` overrides it when set.
  #[serde(default = "default_level")]
  pub level: String,
  #[serde(default)]
  pub format: LogFormat,
  #[serde(default = "default_true")]
  pub ansi: bool,
  #[serde(default = "default_true")]
  pub target: bool,
  #[serde(default)]
  pub thread_names: bool,
  #[serde(default)]
  pub file: Option<FileConfig>,
}

fn default_level() -> String {
  "info".to_string()
}

fn default_true() -> bool {
  true
}

impl Default for LoggingConfig {
  fn default() -> Self {
    Self {
      level: default_level(),
      format: LogFormat::default(),
      ansi: true,
      target: true,
      thread_names: false,
      file: None,
    }
  }
}

#[derive(Deserialize)]
struct FileView {
  #[serde(default)]
  logging: LoggingConfig,
}

impl LoggingConfig {
  /// Reads the `logging:` section from a YAML document. Other sections are
  /// ignored; a missing section yields the defaults.
  pub fn from_yaml_str(yaml: &str) -> Result<Self> {
    let view: FileView = serde_yaml::from_str(yaml).map_err(|e| Error::ConfigParse(e.to_string()))?;
    Ok(view.logging)
  }

  pub fn from_file(path: &Path) -> Result<Self> {
    let contents = fs::read_to_string(path)?;
    Self::from_yaml_str(&contents)
  }
}
