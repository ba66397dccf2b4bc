//! Cached per-directory facts.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::base::{DirPath, Label, TypeName};
use crate::kinds::{Attr, RuleKind};

/// Labels assigned to each dependency channel of one rule.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedDeps {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deps: Vec<Label>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub runtime_deps: Vec<Label>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exports: Vec<Label>,
}

impl ResolvedDeps {
    /// Empty dependency sets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Labels in a channel. `srcs` is not a channel and is always empty.
    pub fn get(&self, attr: Attr) -> &[Label] {
        match attr {
            Attr::Deps => &self.deps,
            Attr::RuntimeDeps => &self.runtime_deps,
            Attr::Exports => &self.exports,
            Attr::Srcs => &[],
        }
    }

    /// Append a label to a channel. Returns `false` for non-channel attrs.
    pub fn push(&mut self, attr: Attr, label: Label) -> bool {
        let list = match attr {
            Attr::Deps => &mut self.deps,
            Attr::RuntimeDeps => &mut self.runtime_deps,
            Attr::Exports => &mut self.exports,
            Attr::Srcs => return false,
        };
        list.push(label);
        true
    }

    /// Whether `label` is in the `attr` channel.
    pub fn contains(&self, attr: Attr, label: &Label) -> bool {
        self.get(attr).contains(label)
    }

    /// Sort and deduplicate every channel.
    pub fn normalize(&mut self) {
        for list in [&mut self.deps, &mut self.runtime_deps, &mut self.exports] {
            list.sort();
            list.dedup();
        }
    }

    /// True when every channel is empty.
    pub fn is_empty(&self) -> bool {
        self.deps.is_empty() && self.runtime_deps.is_empty() && self.exports.is_empty()
    }
}

/// Everything the engine knows about one directory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageEntry {
    pub path: DirPath,
    /// Source package declared by the directory's files, if any were parsed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_name: Option<SmolStr>,
    #[serde(default)]
    pub declared_types: BTreeSet<TypeName>,
    #[serde(default)]
    pub kinds: BTreeSet<RuleKind>,
    /// Last resolved dependency sets, per rule kind generated for the directory.
    #[serde(default)]
    pub resolved: BTreeMap<RuleKind, ResolvedDeps>,
    /// Cache generation that last wrote this entry.
    #[serde(default)]
    pub generation: u64,
}

impl PackageEntry {
    /// Entry for `path` with nothing parsed or resolved yet.
    pub fn new(path: DirPath) -> Self {
        Self {
            path,
            package_name: None,
            declared_types: BTreeSet::new(),
            kinds: BTreeSet::new(),
            resolved: BTreeMap::new(),
            generation: 0,
        }
    }

    /// Label of the directory's target.
    pub fn label(&self) -> Label {
        Label::for_dir(&self.path)
    }

    /// Whether the directory declares `ty`.
    pub fn declares(&self, ty: &TypeName) -> bool {
        self.declared_types.contains(ty)
    }

    /// True when every rule generated for the directory is a test rule.
    pub fn is_test_only(&self) -> bool {
        !self.kinds.is_empty() && self.kinds.iter().all(|k| k.is_test())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(s: &str) -> Label {
        s.parse().unwrap()
    }

    #[test]
    fn test_resolved_deps_normalize() {
        let mut deps = ResolvedDeps::new();
        deps.push(Attr::Deps, label("//b"));
        deps.push(Attr::Deps, label("//a"));
        deps.push(Attr::Deps, label("//b"));
        deps.normalize();
        assert_eq!(deps.deps, vec![label("//a"), label("//b")]);
    }

    #[test]
    fn test_resolved_deps_rejects_srcs() {
        let mut deps = ResolvedDeps::new();
        assert!(!deps.push(Attr::Srcs, label("//a")));
        assert!(deps.is_empty());
        assert!(deps.get(Attr::Srcs).is_empty());
    }

    #[test]
    fn test_entry_label_and_test_only() {
        let mut entry = PackageEntry::new(DirPath::new("a/b"));
        assert_eq!(entry.label().to_string(), "//a/b");
        assert!(!entry.is_test_only());

        entry.kinds.insert(RuleKind::UnitTest);
        assert!(entry.is_test_only());
        entry.kinds.insert(RuleKind::JavaLibrary);
        assert!(!entry.is_test_only());
    }
}
