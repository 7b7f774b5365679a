//! Named, bounded worker pools.
//!
//! A [`WorkerPool`] runs jobs on OS threads, up to a fixed or unbounded number
//! at once, with an optional cap on how many jobs may wait. A [`PoolRegistry`]
//! maps logical names from configuration to pools so that callers can pick a
//! pool by name.

pub mod config;
pub mod error;
pub mod global;
pub mod pool;
pub mod registry;

pub use config::{ConfigError, PoolConfig, PoolsConfig};
pub use error::{PoolError, RegistryError};
pub use global::global;
pub use pool::{PoolBuilder, PoolSize, WorkerPool};
pub use registry::PoolRegistry;
