//! Readiness contract for the persistent store.

use crate::Result;

/// Trait implemented by storage backends to report reachability.
///
/// Used by the readiness probe: the server reports ready only when the store
/// answers a trivial query.
pub trait StoreStatusTrait: Send + Sync {
    fn check_store(&self) -> Result<()>;
}
