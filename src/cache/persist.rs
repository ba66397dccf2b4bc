//! Persisting the package cache between runs.
//!
//! The on-disk form is a versioned JSON document with entries ordered by
//! directory, so saving an unchanged cache twice produces identical bytes.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{PackageCache, PackageEntry};
use crate::error::PersistError;

/// Current on-disk format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Serializable image of a [`PackageCache`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSnapshot {
    pub version: u32,
    pub generation: u64,
    pub entries: Vec<PackageEntry>,
}

impl PackageCache {
    /// Capture the current contents.
    pub fn to_snapshot(&self) -> CacheSnapshot {
        CacheSnapshot {
            version: SNAPSHOT_VERSION,
            generation: self.generation(),
            entries: self.entries().iter().map(|e| (**e).clone()).collect(),
        }
    }

    /// Rebuild a cache from a snapshot, keeping each entry's generation.
    pub fn from_snapshot(snapshot: CacheSnapshot) -> Result<Self, PersistError> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(PersistError::Version {
                found: snapshot.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        Ok(Self::from_parts(snapshot.generation, snapshot.entries))
    }

    /// Serialize the cache as a pretty-printed snapshot.
    pub fn to_json(&self) -> Result<String, PersistError> {
        Ok(serde_json::to_string_pretty(&self.to_snapshot())?)
    }

    /// Rebuild a cache from a JSON snapshot, checking its version.
    pub fn from_json(json: &str) -> Result<Self, PersistError> {
        Self::from_snapshot(serde_json::from_str(json)?)
    }

    /// Write the cache to `path`.
    ///
    /// The snapshot goes to a sibling temporary file first and is renamed
    /// into place, so readers never see a partial file.
    pub fn save(&self, path: &Path) -> Result<(), PersistError> {
        let write_err = |source| PersistError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let tmp = path.with_extension("tmp");
        let file = File::create(&tmp).map_err(write_err)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &self.to_snapshot())?;
        writer.write_all(b"\n").map_err(write_err)?;
        writer.flush().map_err(write_err)?;
        drop(writer);
        fs::rename(&tmp, path).map_err(write_err)?;

        debug!(path = %path.display(), entries = self.len(), "saved package cache");
        Ok(())
    }

    /// Read a cache previously written by [`PackageCache::save`].
    pub fn load(path: &Path) -> Result<Self, PersistError> {
        let file = File::open(path).map_err(|source| PersistError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let snapshot: CacheSnapshot = serde_json::from_reader(BufReader::new(file))?;
        let cache = Self::from_snapshot(snapshot)?;
        debug!(path = %path.display(), entries = cache.len(), "loaded package cache");
        Ok(cache)
    }
}
