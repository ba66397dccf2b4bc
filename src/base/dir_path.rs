//! Directory identifiers for packages in the source tree.

use std::fmt;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// A normalized, repository-relative directory path.
///
/// Segments are `/`-separated with no leading or trailing slash, no empty
/// segments and no `.` segments. The repository root is the empty path.
/// `DirPath` is the key of the package cache, so two spellings of the same
/// directory must normalize to the same value.
#[derive(Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DirPath(SmolStr);

impl DirPath {
    /// Create a DirPath, normalizing separators.
    pub fn new(path: &str) -> Self {
        let normalized = path
            .split(['/', '\\'])
            .filter(|seg| !seg.is_empty() && *seg != ".")
            .collect::<Vec<_>>()
            .join("/");
        Self(SmolStr::new(normalized))
    }

    /// The repository root.
    pub fn root() -> Self {
        Self::default()
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Last path segment, or the empty string for the root.
    pub fn last_segment(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or("")
    }

    /// Iterate over path segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }
}

impl fmt::Debug for DirPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DirPath({:?})", self.0.as_str())
    }
}

impl fmt::Display for DirPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DirPath {
    #[inline]
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}
