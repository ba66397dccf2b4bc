//! Channel placement and precedence, checked for every registered rule kind.

mod common;

use common::{FakeExternal, label};
use once_cell::sync::Lazy;
use rstest::rstest;
use rulegen::cache::PackageEntry;
use rulegen::kinds::{Attr, KindRegistry};
use rulegen::resolve::{DiagnosticKind, Origin};
use rulegen::{Config, DirPath, PackageCache, ResolveRequest, Resolver, RuleKind, TypeName};

static REGISTRY: Lazy<KindRegistry> = Lazy::new(|| KindRegistry::new().unwrap());

fn cache() -> PackageCache {
    let cache = PackageCache::new();
    for (dir, types) in [("x/y", &["x.y.Bar"][..]), ("a/t", &["a.t.Engine"][..]), ("a/b", &["a.b.Foo"][..])] {
        let mut entry = PackageEntry::new(DirPath::new(dir));
        entry.declared_types = types.iter().map(|ty| TypeName::new(ty)).collect();
        cache.upsert(&DirPath::new(dir), entry);
    }
    cache
}

fn request(kind: RuleKind) -> ResolveRequest {
    ResolveRequest::new("a/b", kind)
        .import("x.y.Bar")
        .runtime_import("a.t.Engine")
        .import("a.b.Foo")
}

#[rstest]
fn test_runtime_only_placement(#[values(
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
    RuleKind::TestPackage
)]
kind: RuleKind) {
    let cache = cache();
    let config = Config::default();
    let external = FakeExternal::new();
    let resolver = Resolver::new(&cache, &external, &config);

    let output = resolver.resolve(&request(kind)).unwrap();
    let engine = label("//a/t");

    if REGISTRY.info(kind).resolves(Attr::RuntimeDeps) {
        assert!(!output.assignments.deps.contains(&engine));
        assert_eq!(output.assignments.runtime_deps, vec![engine]);
        assert_eq!(output.diagnostics.len(), 0);
    } else {
        assert!(output.assignments.deps.contains(&engine));
        assert_eq!(output.diagnostics.len(), 1);
        assert_eq!(output.diagnostics[0].kind, DiagnosticKind::DegradedResolution);
        assert_eq!(output.diagnostics[0].type_name, Some(TypeName::new("a.t.Engine")));
    }
    // the directory's own type never becomes a dependency
    assert!(output.dependency("a.b.Foo").is_none());
}

#[test]
fn test_every_registered_kind_is_covered() {
    assert_eq!(REGISTRY.len(), RuleKind::ALL.len());
    assert_eq!(REGISTRY.len(), 13);
    for kind in RuleKind::ALL {
        assert_eq!(REGISTRY.lookup(kind.as_str()).unwrap(), kind.info());
    }
}

#[test]
fn test_local_over_external_records_discarded_candidate() {
    let cache = cache();
    let config = Config::default();
    let external = FakeExternal::new().artifact("x.y.Bar", "@maven//:com_external_bar");
    let resolver = Resolver::new(&cache, &external, &config);

    let output = resolver.resolve(&request(RuleKind::UnitTest)).unwrap();

    let bar = output.dependency("x.y.Bar").unwrap();
    assert_eq!(bar.label, Some(label("//x/y")));
    assert_eq!(bar.origin, Origin::Local);
    assert_eq!(output.diagnostics.len(), 1);
    let diagnostic = &output.diagnostics[0];
    assert_eq!(diagnostic.kind, DiagnosticKind::AmbiguousResolution);
    assert!(diagnostic.related.iter().any(|note| note.contains("@maven//:com_external_bar")));
}

#[test]
fn test_exports_always_within_deps() {
    let cache = cache();
    let config = Config::default();
    let external = FakeExternal::new().artifact("com.google.common.base.Optional", "@maven//:guava");
    let resolver = Resolver::new(&cache, &external, &config);

    let output = resolver
        .resolve(
            &ResolveRequest::new("api", RuleKind::LibraryPackage)
                .import("x.y.Bar")
                .import("com.google.common.base.Optional")
                .runtime_import("a.t.Engine")
                .export("x.y.Bar")
                .export("com.google.common.base.Optional")
                .export("a.t.Engine"),
        )
        .unwrap();

    let assignments = &output.assignments;
    assert_eq!(assignments.exports, vec![label("//x/y"), label("@maven//:guava")]);
    assert!(assignments.exports.iter().all(|l| assignments.deps.contains(l)));
    assert_eq!(output.diagnostics.len(), 1);
    assert_eq!(output.diagnostics[0].kind, DiagnosticKind::DroppedExport);
}

#[test]
fn test_no_label_repeats_within_an_attribute() {
    let cache = PackageCache::new();
    let mut entry = PackageEntry::new(DirPath::new("lib"));
    entry.declared_types = ["lib.A", "lib.B", "lib.C"].into_iter().map(TypeName::new).collect();
    cache.upsert(&DirPath::new("lib"), entry);
    let config = Config::default();
    let external = FakeExternal::new();
    let resolver = Resolver::new(&cache, &external, &config);

    let output = resolver
        .resolve(
            &ResolveRequest::new("app", RuleKind::JavaBinary)
                .import("lib.A")
                .import("lib.B")
                .runtime_import("lib.C"),
        )
        .unwrap();

    assert_eq!(output.assignments.deps, vec![label("//lib")]);
    assert!(output.assignments.runtime_deps.is_empty());
    assert_eq!(output.resolved.len(), 3);
}

#[test]
fn test_jdk_types_are_not_dependencies() {
    let cache = cache();
    let config = Config::default();
    let external = FakeExternal::new();
    let resolver = Resolver::new(&cache, &external, &config);

    let output = resolver
        .resolve(
            &ResolveRequest::new("a/b", RuleKind::JavaLibrary)
                .import("java.util.List")
                .import("javax.annotation.processing.Generated"),
        )
        .unwrap();

    assert!(output.assignments.is_empty());
    assert!(output.diagnostics.is_empty());
    assert_eq!(external.calls(), 0);
}
