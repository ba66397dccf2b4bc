//! Dependency resolution: turning symbol references into labelled deps.
//!
//! # Architecture
//!
//! 1. **Parsing** - the [`SourceParser`] collaborator extracts declared types and
//!    imports per file ([`ParsedFile`])
//! 2. **Indexing** - declared types go into the package cache's type index
//! 3. **Resolution** - [`Resolver`] looks each reference up locally and
//!    externally, picks a candidate and places it in an attribute channel
//!
//! ## Key Data Structures
//!
//! - [`ResolveRequest`] - One directory + rule kind + references
//! - [`ResolveOutput`] - Attribute assignments, per-reference results, diagnostics
//! - [`DiagnosticCollector`] - Non-fatal findings for one directory

mod collaborators;
mod diagnostics;
mod input;
mod resolver;

pub use collaborators::{ExternalResolver, NoExternalResolver, RetryPolicy, SourceParser};
pub use diagnostics::{Diagnostic, DiagnosticCollector, DiagnosticKind, Severity, codes};
pub use input::{
    DirectoryInput, ImportReference, ParsedFile, ResolveRequest, Usage, collapse_imports,
};
pub use resolver::{Origin, ResolveOutput, ResolvedDependency, Resolver};
