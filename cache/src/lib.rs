//! An in-process, concurrent key/value cache with per-entry time-to-live.
//!
//! # Features
//! - **Sharded**: keys are spread over independently locked shards, so writers
//!   to unrelated keys never wait on one another.
//! - **TTL per entry**: each `set` picks its own lifetime; a zero TTL never expires.
//! - **Lazy + swept expiry**: expired entries are hidden on read immediately and
//!   physically removed by a background janitor on a fixed interval.
//! - **Process-wide store**: [`memory()`] hands out a lazily built, shared
//!   instance holding values of any type.

// Public modules that form the API
pub mod builder;
pub mod config;
pub mod error;
pub mod global;
pub mod handle;
pub mod lazy;
pub mod metrics;

// Internal, crate-only modules
mod entry;
mod shared;
mod store;
mod task;
mod time;

// Re-export the primary user-facing types for convenience
pub use builder::CacheBuilder;
pub use config::CacheConfig;
pub use error::{BuildError, ConfigError};
pub use global::{configure_memory, memory, AnyValue, MemoryStore};
pub use handle::{TtlCache, NO_EXPIRATION};
pub use lazy::LazyCache;
pub use metrics::MetricsSnapshot;
