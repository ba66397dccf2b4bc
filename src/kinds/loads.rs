//! Load statements required by emitted rules.

use std::collections::BTreeSet;

use serde::Serialize;

use super::RuleKind;

/// One file that provides rule symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadInfo {
    pub file: &'static str,
    pub symbols: &'static [RuleKind],
}

pub(crate) const JAVA_LOADS: &[LoadInfo] = &[
    LoadInfo {
        file: "@io_grpc_grpc_java//:java_grpc_library.bzl",
        symbols: &[RuleKind::JavaGrpcLibrary],
    },
    LoadInfo {
        file: "@rules_java//java:defs.bzl",
        symbols: &[
            RuleKind::JavaBinary,
            RuleKind::JavaLibrary,
            RuleKind::JavaProtoLibrary,
            RuleKind::JavaTest,
        ],
    },
    LoadInfo {
        file: "@contrib_rules_jvm//java:defs.bzl",
        symbols: &[RuleKind::JavaJunit5Test, RuleKind::JavaTestSuite],
    },
    LoadInfo {
        file: "@10gen_mms//server/src/unit:rules.bzl",
        symbols: &[
            RuleKind::UnitTest,
            RuleKind::UnitPackage,
            RuleKind::LibraryPackage,
        ],
    },
    LoadInfo {
        file: "@10gen_mms//server/src/test:rules.bzl",
        symbols: &[RuleKind::IntTest, RuleKind::TestTest, RuleKind::TestPackage],
    },
];

/// Every known load entry, for the rule-emission component.
pub fn all_loads() -> &'static [LoadInfo] {
    JAVA_LOADS
}

/// A `load()` statement: a file and the symbols imported from it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct LoadStatement {
    pub file: &'static str,
    pub symbols: Vec<&'static str>,
}

/// Compute the load statements needed for `kinds_used`.
///
/// Statements are ordered by file and symbols within a statement are sorted,
/// so unchanged input always yields identical output. Files none of whose
/// symbols are used are left out entirely.
pub fn required_loads<'a>(kinds_used: impl IntoIterator<Item = &'a RuleKind>) -> Vec<LoadStatement> {
    let used: BTreeSet<RuleKind> = kinds_used.into_iter().copied().collect();

    let mut statements: Vec<LoadStatement> = JAVA_LOADS
        .iter()
        .filter_map(|load| {
            let mut symbols: Vec<&'static str> = load
                .symbols
                .iter()
                .filter(|kind| used.contains(*kind))
                .map(|kind| kind.as_str())
                .collect();
            if symbols.is_empty() {
                return None;
            }
            symbols.sort_unstable();
            symbols.dedup();
            Some(LoadStatement {
                file: load.file,
                symbols,
            })
        })
        .collect();

    statements.sort();
    statements
}

/// Kinds used across all rules emitted in a run.
///
/// Additive and deduplicated; rendered once at the end of the run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadSet {
    kinds: BTreeSet<RuleKind>,
}

impl LoadSet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a rule of `kind` was emitted.
    pub fn insert(&mut self, kind: RuleKind) {
        self.kinds.insert(kind);
    }

    /// Add every kind of `other`.
    pub fn merge(&mut self, other: LoadSet) {
        self.kinds.extend(other.kinds);
    }

    /// Recorded kinds, in sorted order.
    pub fn kinds(&self) -> impl Iterator<Item = RuleKind> + '_ {
        self.kinds.iter().copied()
    }

    /// Load statements covering every recorded kind.
    pub fn statements(&self) -> Vec<LoadStatement> {
        required_loads(&self.kinds)
    }

    /// True when no kind was recorded.
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

impl Extend<RuleKind> for LoadSet {
    fn extend<I: IntoIterator<Item = RuleKind>>(&mut self, iter: I) {
        self.kinds.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_kinds_no_loads() {
        assert!(required_loads(&[] as &[RuleKind]).is_empty());
    }

    #[test]
    fn test_unused_symbols_dropped() {
        let loads = required_loads(&[RuleKind::JavaLibrary, RuleKind::JavaTest]);
        assert_eq!(
            loads,
            vec![LoadStatement {
                file: "@rules_java//java:defs.bzl",
                symbols: vec!["java_library", "java_test"],
            }]
        );
    }

    #[test]
    fn test_ordering_is_deterministic() {
        let forward = required_loads(&RuleKind::ALL);
        let mut reversed_kinds = RuleKind::ALL;
        reversed_kinds.reverse();
        let backward = required_loads(&reversed_kinds);
        assert_eq!(forward, backward);

        let files: Vec<_> = forward.iter().map(|l| l.file).collect();
        assert_eq!(
            files,
            vec![
                "@10gen_mms//server/src/test:rules.bzl",
                "@10gen_mms//server/src/unit:rules.bzl",
                "@contrib_rules_jvm//java:defs.bzl",
                "@io_grpc_grpc_java//:java_grpc_library.bzl",
                "@rules_java//java:defs.bzl",
            ]
        );
        assert_eq!(
            forward[1].symbols,
            vec!["library_package", "unit_package", "unit_test"]
        );
    }

    #[test]
    fn test_load_set_deduplicates() {
        let mut set = LoadSet::new();
        set.insert(RuleKind::UnitTest);
        set.insert(RuleKind::UnitTest);

        let mut other = LoadSet::new();
        other.extend([RuleKind::UnitTest, RuleKind::IntTest]);
        set.merge(other);

        let loads = set.statements();
        assert_eq!(loads.len(), 2);
        assert_eq!(loads[0].symbols, vec!["int_test"]);
        assert_eq!(loads[1].symbols, vec!["unit_test"]);
    }
}
