//! `trellis_logging` - tracing subscriber setup driven by the `logging:`
//! section of the application's YAML configuration.
//!
//! ```no_run
//! let path = trellis_logging::find_config_file(None).unwrap();
//! let _guard = trellis_logging::init_from_file(&path).unwrap();
//! tracing::info!("ready");
//! ```

pub mod config;
pub mod error;
pub mod init;

pub use config::{FileConfig, LogFormat, LoggingConfig, Rotation};
pub use error::{Error, Result};
pub use init::{find_config_file, find_config_file_in, init, init_from_file, LoggingGuard};
