//! Rule-kind registry.
//!
//! Every kind maps to one of three immutable attribute shapes. The registry is
//! validated once at construction and is read-only afterwards, so it can be
//! shared freely between workers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::loads::JAVA_LOADS;
use crate::error::RegistryError;

// ============================================================================
// ATTRIBUTES
// ============================================================================

/// A rule attribute known to the engine.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attr {
    Srcs,
    /// Compile-time dependencies.
    Deps,
    /// Dependencies needed only at runtime.
    RuntimeDeps,
    /// Dependencies re-published as part of the rule's own API.
    Exports,
}

impl Attr {
    /// The attributes that can receive resolved dependency labels.
    pub const CHANNELS: [Attr; 3] = [Attr::Deps, Attr::RuntimeDeps, Attr::Exports];

    /// Attribute name as written in build files.
    pub const fn as_str(self) -> &'static str {
        match self {
            Attr::Srcs => "srcs",
            Attr::Deps => "deps",
            Attr::RuntimeDeps => "runtime_deps",
            Attr::Exports => "exports",
        }
    }

    /// True for `deps`, `runtime_deps` and `exports`.
    pub fn is_channel(self) -> bool {
        Self::CHANNELS.contains(&self)
    }
}

impl fmt::Display for Attr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// KIND INFO
// ============================================================================

/// Attribute metadata for one rule kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RuleKindInfo {
    /// Every attribute the kind accepts.
    pub attrs: &'static [Attr],
    /// Attributes that must be populated for the rule to be valid.
    pub non_empty_attrs: &'static [Attr],
    /// Attributes whose existing values are merged rather than overwritten.
    pub mergeable_attrs: &'static [Attr],
    /// Attributes that receive resolved dependency labels.
    pub resolve_attrs: &'static [Attr],
}

impl RuleKindInfo {
    /// Whether the kind accepts `attr` at all.
    pub fn supports(&self, attr: Attr) -> bool {
        self.attrs.contains(&attr)
    }

    /// Whether `attr` receives resolved labels for this kind.
    pub fn resolves(&self, attr: Attr) -> bool {
        self.resolve_attrs.contains(&attr)
    }

    /// Whether `attr` must be populated.
    pub fn is_non_empty(&self, attr: Attr) -> bool {
        self.non_empty_attrs.contains(&attr)
    }

    /// Whether existing values of `attr` are merged.
    pub fn is_mergeable(&self, attr: Attr) -> bool {
        self.mergeable_attrs.contains(&attr)
    }

    fn validate(&self, kind: RuleKind) -> Result<(), RegistryError> {
        let sets = [
            ("non_empty_attrs", self.non_empty_attrs),
            ("mergeable_attrs", self.mergeable_attrs),
            ("resolve_attrs", self.resolve_attrs),
        ];
        for (set, attrs) in sets {
            if let Some(attr) = attrs.iter().find(|a| !self.supports(**a)) {
                return Err(RegistryError::UnsupportedAttr {
                    kind: kind.as_str(),
                    attr: attr.as_str(),
                    set,
                });
            }
        }
        if let Some(attr) = self.resolve_attrs.iter().find(|a| !a.is_channel()) {
            return Err(RegistryError::NonChannelResolveAttr {
                kind: kind.as_str(),
                attr: attr.as_str(),
            });
        }
        Ok(())
    }
}

/// Binaries and tests: compile and runtime channels, no exports.
const WITH_RUNTIME_DEPS: RuleKindInfo = RuleKindInfo {
    attrs: &[Attr::Srcs, Attr::Deps, Attr::RuntimeDeps],
    non_empty_attrs: &[Attr::Deps, Attr::Srcs],
    mergeable_attrs: &[Attr::Srcs],
    resolve_attrs: &[Attr::Deps, Attr::RuntimeDeps],
};

/// Generated-code kinds: a compile channel only.
const COMPILE_ONLY: RuleKindInfo = RuleKindInfo {
    attrs: &[Attr::Srcs, Attr::Deps],
    non_empty_attrs: &[Attr::Deps, Attr::Srcs],
    mergeable_attrs: &[Attr::Srcs],
    resolve_attrs: &[Attr::Deps],
};

/// Libraries: compile, runtime and export channels.
const LIBRARY: RuleKindInfo = RuleKindInfo {
    attrs: &[Attr::Srcs, Attr::Deps, Attr::RuntimeDeps, Attr::Exports],
    non_empty_attrs: &[Attr::Deps, Attr::Exports, Attr::Srcs],
    mergeable_attrs: &[Attr::Srcs],
    resolve_attrs: &[Attr::Deps, Attr::Exports, Attr::RuntimeDeps],
};

/// The attribute shape a kind uses.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum KindShape {
    WithRuntimeDeps,
    CompileOnly,
    Library,
}

impl KindShape {
    /// Attribute metadata shared by every kind of this shape.
    pub const fn info(self) -> &'static RuleKindInfo {
        match self {
            KindShape::WithRuntimeDeps => &WITH_RUNTIME_DEPS,
            KindShape::CompileOnly => &COMPILE_ONLY,
            KindShape::Library => &LIBRARY,
        }
    }
}

// ============================================================================
// RULE KINDS
// ============================================================================

/// Every rule kind the engine can produce.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    JavaBinary,
    JavaJunit5Test,
    JavaLibrary,
    JavaTest,
    JavaTestSuite,
    JavaProtoLibrary,
    JavaGrpcLibrary,
    UnitPackage,
    UnitTest,
    IntTest,
    TestTest,
    LibraryPackage,
    TestPackage,
}

impl RuleKind {
    pub const ALL: [RuleKind; 13] = [
        RuleKind::JavaBinary,
        RuleKind::JavaJunit5Test,
        RuleKind::JavaLibrary,
        RuleKind::JavaTest,
        RuleKind::JavaTestSuite,
        RuleKind::JavaProtoLibrary,
        RuleKind::JavaGrpcLibrary,
        RuleKind::UnitPackage,
        RuleKind::UnitTest,
        RuleKind::IntTest,
        RuleKind::TestTest,
        RuleKind::LibraryPackage,
        RuleKind::TestPackage,
    ];

    /// Kind name as written in build files.
    pub const fn as_str(self) -> &'static str {
        match self {
            RuleKind::JavaBinary => "java_binary",
            RuleKind::JavaJunit5Test => "java_junit5_test",
            RuleKind::JavaLibrary => "java_library",
            RuleKind::JavaTest => "java_test",
            RuleKind::JavaTestSuite => "java_test_suite",
            RuleKind::JavaProtoLibrary => "java_proto_library",
            RuleKind::JavaGrpcLibrary => "java_grpc_library",
            RuleKind::UnitPackage => "unit_package",
            RuleKind::UnitTest => "unit_test",
            RuleKind::IntTest => "int_test",
            RuleKind::TestTest => "test_test",
            RuleKind::LibraryPackage => "library_package",
            RuleKind::TestPackage => "test_package",
        }
    }

    /// Attribute layout of the kind.
    pub const fn shape(self) -> KindShape {
        match self {
            RuleKind::JavaLibrary | RuleKind::LibraryPackage => KindShape::Library,
            RuleKind::JavaProtoLibrary | RuleKind::JavaGrpcLibrary => KindShape::CompileOnly,
            RuleKind::JavaBinary
            | RuleKind::JavaJunit5Test
            | RuleKind::JavaTest
            | RuleKind::JavaTestSuite
            | RuleKind::UnitPackage
            | RuleKind::UnitTest
            | RuleKind::IntTest
            | RuleKind::TestTest
            | RuleKind::TestPackage => KindShape::WithRuntimeDeps,
        }
    }

    /// Attribute metadata of the kind.
    pub const fn info(self) -> &'static RuleKindInfo {
        self.shape().info()
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleKind {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RuleKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| RegistryError::NotRegistered(s.to_string()))
    }
}

// ============================================================================
// REGISTRY
// ============================================================================

/// Validated, immutable view of every registered rule kind.
#[derive(Debug, Clone)]
pub struct KindRegistry {
    kinds: &'static [RuleKind],
}

impl KindRegistry {
    /// Build the registry, checking the static tables for consistency.
    pub fn new() -> Result<Self, RegistryError> {
        let registry = Self {
            kinds: &RuleKind::ALL,
        };
        registry.validate()?;
        Ok(registry)
    }

    /// Check every kind's shape and its load statement.
    pub fn validate(&self) -> Result<(), RegistryError> {
        for &kind in self.kinds {
            kind.info().validate(kind)?;

            let loads = JAVA_LOADS
                .iter()
                .filter(|load| load.symbols.contains(&kind))
                .count();
            match loads {
                0 => return Err(RegistryError::MissingLoad(kind.as_str())),
                1 => {}
                _ => return Err(RegistryError::DuplicateLoad(kind.as_str())),
            }
        }
        Ok(())
    }

    /// Resolve a kind name.
    pub fn kind(&self, name: &str) -> Result<RuleKind, RegistryError> {
        name.parse()
    }

    /// Look up the attribute metadata of a kind by name.
    pub fn lookup(&self, name: &str) -> Result<&'static RuleKindInfo, RegistryError> {
        self.kind(name).map(RuleKind::info)
    }

    /// Attribute metadata of a kind already looked up.
    pub fn info(&self, kind: RuleKind) -> &'static RuleKindInfo {
        kind.info()
    }

    /// Iterate over all registered kinds with their metadata.
    pub fn kinds(&self) -> impl Iterator<Item = (RuleKind, &'static RuleKindInfo)> + '_ {
        self.kinds.iter().map(|&kind| (kind, kind.info()))
    }

    /// Number of registered kinds.
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// True when no kind is registered.
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_validates() {
        let registry = KindRegistry::new().unwrap();
        assert_eq!(registry.len(), 13);
    }

    #[test]
    fn test_lookup_unknown_kind() {
        let registry = KindRegistry::new().unwrap();
        assert_eq!(
            registry.lookup("kt_jvm_library"),
            Err(RegistryError::NotRegistered("kt_jvm_library".into()))
        );
    }

    #[test]
    fn test_shapes() {
        let registry = KindRegistry::new().unwrap();

        let test = registry.lookup("java_test").unwrap();
        assert!(test.resolves(Attr::Deps));
        assert!(test.resolves(Attr::RuntimeDeps));
        assert!(!test.resolves(Attr::Exports));

        let proto = registry.lookup("java_proto_library").unwrap();
        assert_eq!(proto.resolve_attrs, &[Attr::Deps]);
        assert!(!proto.supports(Attr::RuntimeDeps));

        let lib = registry.lookup("library_package").unwrap();
        assert!(lib.resolves(Attr::Exports));
        assert!(lib.resolves(Attr::RuntimeDeps));
        assert!(lib.is_non_empty(Attr::Exports));
        assert!(lib.is_mergeable(Attr::Srcs));
        assert!(!lib.is_mergeable(Attr::Deps));
    }

    #[test]
    fn test_resolve_attrs_are_channels() {
        let registry = KindRegistry::new().unwrap();
        for (_, info) in registry.kinds() {
            assert!(info.resolve_attrs.iter().all(|a| a.is_channel()));
            assert!(info.resolve_attrs.iter().all(|a| info.supports(*a)));
        }
    }

    #[test]
    fn test_runtime_channel_is_all_or_nothing() {
        for kind in RuleKind::ALL {
            let info = kind.info();
            assert_eq!(
                info.supports(Attr::RuntimeDeps),
                info.resolves(Attr::RuntimeDeps),
                "{kind} supports runtime_deps only partially"
            );
        }
    }

    #[test]
    fn test_invalid_shape_is_rejected() {
        let bad = RuleKindInfo {
            attrs: &[Attr::Srcs, Attr::Deps],
            non_empty_attrs: &[],
            mergeable_attrs: &[],
            resolve_attrs: &[Attr::Deps, Attr::RuntimeDeps],
        };
        assert!(matches!(
            bad.validate(RuleKind::JavaProtoLibrary),
            Err(RegistryError::UnsupportedAttr { attr: "runtime_deps", .. })
        ));

        let not_channel = RuleKindInfo {
            attrs: &[Attr::Srcs, Attr::Deps],
            non_empty_attrs: &[],
            mergeable_attrs: &[],
            resolve_attrs: &[Attr::Srcs],
        };
        assert!(matches!(
            not_channel.validate(RuleKind::JavaProtoLibrary),
            Err(RegistryError::NonChannelResolveAttr { attr: "srcs", .. })
        ));
    }

    #[test]
    fn test_kind_names_round_trip() {
        for kind in RuleKind::ALL {
            assert_eq!(kind.as_str().parse::<RuleKind>(), Ok(kind));
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }
}
