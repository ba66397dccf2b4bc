//! Rule kinds: the static tables describing what the engine can emit.
//!
//! ## Components
//!
//! - [`KindRegistry`] - Per-kind attribute shape (non-empty, mergeable, resolvable)
//! - [`is_test`] - Exact-membership test-kind classification
//! - [`required_loads`] - Load statements needed for the kinds used in a run

mod loads;
mod registry;
mod test_kinds;

pub use loads::{LoadInfo, LoadSet, LoadStatement, all_loads, required_loads};
pub use registry::{Attr, KindRegistry, KindShape, RuleKind, RuleKindInfo};
pub use test_kinds::{TEST_KINDS, default_source_root, is_test};
