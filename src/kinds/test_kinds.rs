//! Test-kind classification.

use super::RuleKind;

/// The rule kinds that denote test targets.
pub const TEST_KINDS: [&str; 8] = [
    "java_junit5_test",
    "java_test",
    "java_test_suite",
    "unit_package",
    "unit_test",
    "int_test",
    "test_test",
    "test_package",
];

/// Check whether `kind` names a test rule.
///
/// Exact membership in [`TEST_KINDS`]. Kinds that are not classified yet
/// (including unregistered ones) are not tests.
pub fn is_test(kind: &str) -> bool {
    TEST_KINDS.contains(&kind)
}

impl RuleKind {
    /// Whether this kind is a test rule.
    pub fn is_test(self) -> bool {
        is_test(self.as_str())
    }
}

/// Conventional source root for sources of a rule kind.
pub fn default_source_root(kind: RuleKind) -> &'static str {
    if kind.is_test() {
        "src/test/java"
    } else {
        "src/main/java"
    }
}
