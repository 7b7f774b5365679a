//! Background tasks for the cache. Currently only the janitor, which sweeps
//! expired entries on a fixed interval.

pub(crate) mod janitor;
