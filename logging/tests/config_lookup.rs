use std::fs;

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use trellis_logging::{find_config_file_in, Error, LogFormat, LoggingConfig};

const SHARED_FILE: &str = r#"
logging:
  level: debug
  format: compact
cache:
  sweep_interval: 30s
pools:
  entries:
    - name: db
      size: 4
"#;

#[test]
fn test_environment_file_wins_over_the_base_file() {
  let dir = TempDir::new().unwrap();
  fs::write(dir.path().join("trellis.yaml"), "{}").unwrap();
  fs::write(dir.path().join("trellis.staging.yaml"), "{}").unwrap();

  let found = find_config_file_in(dir.path(), Some("staging")).unwrap();
  assert_eq!(found, dir.path().join("trellis.staging.yaml"));
}

#[test]
fn test_falls_back_to_the_base_file() {
  let dir = TempDir::new().unwrap();
  fs::write(dir.path().join("trellis.yaml"), "{}").unwrap();

  let found = find_config_file_in(dir.path(), Some("production")).unwrap();
  assert_eq!(found, dir.path().join("trellis.yaml"));
}

#[test]
fn test_missing_file_is_reported() {
  let dir = TempDir::new().unwrap();
  let err = find_config_file_in(dir.path(), Some("dev")).unwrap_err();
  assert!(matches!(err, Error::ConfigNotFound(_)));
}

#[test]
fn test_reads_only_the_logging_section() {
  let dir = TempDir::new().unwrap();
  let path = dir.path().join("trellis.yaml");
  fs::write(&path, SHARED_FILE).unwrap();

  let config = LoggingConfig::from_file(&path).unwrap();
  assert_eq!(config.level, "debug");
  assert_eq!(config.format, LogFormat::Compact);
  assert!(config.ansi);
  assert_eq!(config.file, None);
}
