use crate::error::BuildError;
use crate::handle::TtlCache;

use once_cell::sync::OnceCell;

/// A cache that is built on first access, exactly once.
///
/// Meant for `static` items. Concurrent first callers all block until the
/// single construction finishes and then share the same instance, so only
/// one janitor thread is ever started.
///
/// A failed construction is fatal: the error is logged and the process
/// aborts, since running on without the cache is not an option.
pub struct LazyCache<K, V, H = ahash::RandomState> {
  cell: OnceCell<TtlCache<K, V, H>>,
  init: fn() -> Result<TtlCache<K, V, H>, BuildError>,
}

impl<K, V, H> LazyCache<K, V, H> {
  pub const fn new(init: fn() -> Result<TtlCache<K, V, H>, BuildError>) -> Self {
    Self {
      cell: OnceCell::new(),
      init,
    }
  }

  /// Returns the cache, building it if this is the first access.
  pub fn get(&self) -> &TtlCache<K, V, H> {
    self.cell.get_or_init(|| match (self.init)() {
      Ok(cache) => cache,
      Err(e) => {
        tracing::error!(error = %e, "failed to construct the process-wide cache");
        std::process::abort();
      }
    })
  }

  /// Returns the cache only if it has already been built.
  pub fn get_if_initialized(&self) -> Option<&TtlCache<K, V, H>> {
    self.cell.get()
  }
}
