//! Package cache: per-directory metadata shared across workers.
//!
//! The cache answers "which directory declares type `T`?" for cross-directory
//! resolution, and remembers what was computed for each directory so a later
//! run can reuse or compare it.

mod entry;
mod persist;
mod store;

pub use entry::{PackageEntry, ResolvedDeps};
pub use persist::{CacheSnapshot, SNAPSHOT_VERSION};
pub use store::{PackageCache, TypeLookup};
