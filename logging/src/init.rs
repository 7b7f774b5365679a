// Installs the global tracing subscriber from a `LoggingConfig`.

use crate::config::{FileConfig, LogFormat, LoggingConfig};
use crate::error::{Error, Result};

use std::env;
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::Registry;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_BASE_NAME: &str = "trellis";
const DEFAULT_CONFIG_EXTENSION: &str = "yaml";

type BoxedLayer = Box<dyn tracing_subscriber::Layer<Registry> + Send + Sync + 'static>;

/// Keeps the background log-file writer alive. Dropping it flushes and stops
/// the writer, so hold it for the life of the program.
#[must_use = "dropping the guard stops file logging"]
#[derive(Debug, Default)]
pub struct LoggingGuard {
  _file: Option<WorkerGuard>,
}

/// Finds the configuration file based on common patterns and an optional environment suffix.
///
/// Looks for `./trellis.<env>.yaml`, then `./trellis.yaml`. The environment is
/// `environment_suffix` if given, else `TRELLIS_ENV`, else `APP_ENV`.
pub fn find_config_file(environment_suffix: Option<&str>) -> Result<PathBuf> {
  find_config_file_in(Path::new("."), environment_suffix)
}

/// Like [`find_config_file`] but searches `dir` instead of the working directory.
pub fn find_config_file_in(dir: &Path, environment_suffix: Option<&str>) -> Result<PathBuf> {
  let env_name = environment_suffix
    .map(|s| s.to_string())
    .or_else(|| env::var("TRELLIS_ENV").ok())
    .or_else(|| env::var("APP_ENV").ok());

  let mut files_to_check: Vec<String> = Vec::new();
  if let Some(env_str) = env_name.as_deref().filter(|s| !s.is_empty()) {
    files_to_check.push(format!(
      "{}.{}.{}",
      DEFAULT_CONFIG_BASE_NAME, env_str, DEFAULT_CONFIG_EXTENSION
    ));
  }
  files_to_check.push(format!("{}.{}", DEFAULT_CONFIG_BASE_NAME, DEFAULT_CONFIG_EXTENSION));

  for file_name in &files_to_check {
    let path = dir.join(file_name);
    if path.is_file() {
      return Ok(path);
    }
  }

  Err(Error::ConfigNotFound(format!(
    "Searched for: {:?} in {:?}. Provide a config file or check TRELLIS_ENV/APP_ENV.",
    files_to_check, dir
  )))
}

/// Reads the `logging:` section of `config_path` and initializes from it.
pub fn init_from_file(config_path: &Path) -> Result<LoggingGuard> {
  let config = LoggingConfig::from_file(config_path)?;
  init(&config)
}

/// Installs the global subscriber.
///
/// Only the first successful call in a process takes effect; later calls
/// return [`Error::GlobalSubscriberSet`].
pub fn init(config: &LoggingConfig) -> Result<LoggingGuard> {
  let filter = build_filter(config, env::var(EnvFilter::DEFAULT_ENV).ok())?;

  let mut layers: Vec<BoxedLayer> = vec![console_layer(config)];
  let mut guard = LoggingGuard::default();
  if let Some(file) = &config.file {
    let (layer, file_guard) = file_layer(file)?;
    layers.push(layer);
    guard._file = Some(file_guard);
  }

  let subscriber = tracing_subscriber::registry().with(layers).with(filter);
  tracing::subscriber::set_global_default(subscriber)
    .map_err(|e| Error::GlobalSubscriberSet(e.to_string()))?;

  // Route `log` records from dependencies into tracing as well. The subscriber
  // is already installed, so the guard is returned even without the bridge.
  if let Err(e) = tracing_log::LogTracer::init() {
    tracing::warn!(error = %e, "another `log` logger is installed; `log` records will not be captured");
  }

  tracing::debug!(level = %config.level, format = ?config.format, "logging initialized");
  Ok(guard)
}

/// Chooses the filter directives: a non-empty `RUST_LOG` wins over the
/// configured level.
pub(crate) fn filter_directives(config: &LoggingConfig, rust_log: Option<String>) -> String {
  rust_log
    .filter(|directives| !directives.trim().is_empty())
    .unwrap_or_else(|| config.level.clone())
}

fn build_filter(config: &LoggingConfig, rust_log: Option<String>) -> Result<EnvFilter> {
  let directives = filter_directives(config, rust_log);
  EnvFilter::try_new(&directives).map_err(|e| Error::InvalidConfigValue {
    field: "level".to_string(),
    message: format!("'{}': {}", directives, e),
  })
}

fn console_layer(config: &LoggingConfig) -> BoxedLayer {
  let layer = fmt::layer()
    .with_ansi(config.ansi)
    .with_target(config.target)
    .with_thread_names(config.thread_names);

  match config.format {
    LogFormat::Full => layer.boxed(),
    LogFormat::Compact => layer.compact().boxed(),
  }
}

fn file_layer(file: &FileConfig) -> Result<(BoxedLayer, WorkerGuard)> {
  if !file.directory.exists() {
    std::fs::create_dir_all(&file.directory).map_err(|e| Error::InvalidConfigValue {
      field: "file.directory".to_string(),
      message: format!("Failed to create directory {:?}: {}", file.directory, e),
    })?;
  }

  let appender = RollingFileAppender::new(file.rotation.into(), &file.directory, &file.prefix);
  let (writer, guard) = tracing_appender::non_blocking(appender);
  let layer = fmt::layer().with_ansi(false).with_writer(writer).boxed();
  Ok((layer, guard))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn rust_log_overrides_the_configured_level() {
    let config = LoggingConfig::default();
    assert_eq!(filter_directives(&config, None), "info");
    assert_eq!(filter_directives(&config, Some("   ".to_string())), "info");
    assert_eq!(
      filter_directives(&config, Some("trellis_cache=trace".to_string())),
      "trellis_cache=trace"
    );
  }

  #[test]
  fn bad_level_is_rejected() {
    let config = LoggingConfig {
      level: "trellis=loud".to_string(),
      ..LoggingConfig::default()
    };
    assert!(matches!(
      build_filter(&config, None),
      Err(Error::InvalidConfigValue { .. })
    ));
  }
}
