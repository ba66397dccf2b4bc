//! Thread-safe package cache with a type → directory index.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::trace;

use super::PackageEntry;
use crate::base::{DirPath, TypeName};

/// Result of looking a type up in the cache's type index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeLookup {
    /// No cached directory declares the type.
    Missing,
    /// Exactly one directory declares the type.
    Unique(DirPath),
    /// Several directories declare the type (sorted).
    Ambiguous(Vec<DirPath>),
}

impl TypeLookup {
    /// The declaring directory, if unique.
    pub fn unique(&self) -> Option<&DirPath> {
        match self {
            TypeLookup::Unique(dir) => Some(dir),
            _ => None,
        }
    }
}

/// Per-directory metadata store shared by all workers of a run.
///
/// A single lock protects both the entries and the type index, so a reader
/// never sees an entry without its index rows or the other way round.
/// Entries are handed out as `Arc`s; callers never hold the lock while they
/// work with them.
#[derive(Debug, Default)]
pub struct PackageCache {
    inner: RwLock<CacheInner>,
}

#[derive(Debug, Default)]
struct CacheInner {
    /// DirPath → entry
    entries: BTreeMap<DirPath, Arc<PackageEntry>>,
    /// Declared type → directories declaring it
    type_index: FxHashMap<TypeName, BTreeSet<DirPath>>,
    /// Current generation, stamped on every write
    generation: u64,
}

impl CacheInner {
    fn index_entry(&mut self, entry: &PackageEntry) {
        for ty in &entry.declared_types {
            self.type_index
                .entry(ty.clone())
                .or_default()
                .insert(entry.path.clone());
        }
    }

    fn unindex_entry(&mut self, entry: &PackageEntry) {
        for ty in &entry.declared_types {
            if let Some(dirs) = self.type_index.get_mut(ty) {
                dirs.remove(&entry.path);
                if dirs.is_empty() {
                    self.type_index.remove(ty);
                }
            }
        }
    }

    fn replace(&mut self, entry: PackageEntry) -> Arc<PackageEntry> {
        if let Some(old) = self.entries.remove(&entry.path) {
            self.unindex_entry(&old);
        }
        self.index_entry(&entry);
        let entry = Arc::new(entry);
        self.entries.insert(entry.path.clone(), Arc::clone(&entry));
        entry
    }
}

impl PackageCache {
    /// Create a new empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the entry for a directory.
    pub fn get(&self, path: &DirPath) -> Option<Arc<PackageEntry>> {
        self.inner.read().entries.get(path).cloned()
    }

    /// Get the entry for a directory, creating an empty one on first visit.
    pub fn get_or_create(&self, path: &DirPath) -> Arc<PackageEntry> {
        // Fast path: read lock
        if let Some(entry) = self.get(path) {
            return entry;
        }

        // Slow path: write lock
        let mut inner = self.inner.write();

        // Double-check
        if let Some(entry) = inner.entries.get(path) {
            return Arc::clone(entry);
        }

        let mut entry = PackageEntry::new(path.clone());
        entry.generation = inner.generation;
        trace!(dir = %path, "created package entry");
        inner.replace(entry)
    }

    /// Insert or replace the entry for `path`.
    ///
    /// The previous entry's types and kinds are discarded, not merged. The
    /// entry is stamped with the current generation.
    pub fn upsert(&self, path: &DirPath, mut entry: PackageEntry) -> Arc<PackageEntry> {
        entry.path = path.clone();
        let mut inner = self.inner.write();
        entry.generation = inner.generation;
        inner.replace(entry)
    }

    /// Remove a directory that no longer exists.
    pub fn remove(&self, path: &DirPath) -> Option<Arc<PackageEntry>> {
        let mut inner = self.inner.write();
        let removed = inner.entries.remove(path)?;
        inner.unindex_entry(&removed);
        Some(removed)
    }

    /// Find which directory declares `ty`.
    pub fn lookup_type(&self, ty: &TypeName) -> TypeLookup {
        let inner = self.inner.read();
        match inner.type_index.get(ty) {
            None => TypeLookup::Missing,
            Some(dirs) if dirs.len() == 1 => {
                dirs.iter().next().cloned().map_or(TypeLookup::Missing, TypeLookup::Unique)
            }
            Some(dirs) => TypeLookup::Ambiguous(dirs.iter().cloned().collect()),
        }
    }

    /// Snapshot of all entries, ordered by path.
    pub fn entries(&self) -> Vec<Arc<PackageEntry>> {
        self.inner.read().entries.values().cloned().collect()
    }

    /// All cached directories, ordered.
    pub fn paths(&self) -> Vec<DirPath> {
        self.inner.read().entries.keys().cloned().collect()
    }

    /// Get the number of cached directories.
    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The current generation.
    pub fn generation(&self) -> u64 {
        self.inner.read().generation
    }

    /// Start a new generation; entries written from now on carry it.
    pub fn begin_generation(&self) -> u64 {
        let mut inner = self.inner.write();
        inner.generation += 1;
        inner.generation
    }

    /// Directories not written during the current generation.
    pub fn stale_entries(&self) -> Vec<DirPath> {
        let inner = self.inner.read();
        inner
            .entries
            .values()
            .filter(|e| e.generation < inner.generation)
            .map(|e| e.path.clone())
            .collect()
    }

    /// Rebuild a cache from stored entries, keeping their stamps.
    pub(crate) fn from_parts(generation: u64, entries: impl IntoIterator<Item = PackageEntry>) -> Self {
        let mut inner = CacheInner {
            generation,
            ..CacheInner::default()
        };
        for entry in entries {
            inner.replace(entry);
        }
        Self {
            inner: RwLock::new(inner),
        }
    }
}
