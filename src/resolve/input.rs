//! Inputs to resolution: parsed files, import references and work items.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::base::{DirPath, TypeName};
use crate::kinds::RuleKind;

/// How a referenced type is used.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Usage {
    /// Needed by the compiler.
    CompileTime,
    /// Discovered through non-static means (e.g. reflective instantiation).
    RuntimeOnly,
}

/// A referenced type and how it is used.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ImportReference {
    pub ty: TypeName,
    pub usage: Usage,
}

impl ImportReference {
    /// A reference needed to compile the sources.
    pub fn compile_time(ty: impl Into<TypeName>) -> Self {
        Self {
            ty: ty.into(),
            usage: Usage::CompileTime,
        }
    }

    /// A reference needed only when the code runs.
    pub fn runtime_only(ty: impl Into<TypeName>) -> Self {
        Self {
            ty: ty.into(),
            usage: Usage::RuntimeOnly,
        }
    }
}

/// Collapse references so each type appears once.
///
/// A type referenced both at compile time and at runtime only needs the
/// compile-time dependency.
pub fn collapse_imports<'a>(
    imports: impl IntoIterator<Item = &'a ImportReference>,
) -> BTreeMap<TypeName, Usage> {
    let mut collapsed: BTreeMap<TypeName, Usage> = BTreeMap::new();
    for import in imports {
        collapsed
            .entry(import.ty.clone())
            .and_modify(|usage| *usage = (*usage).min(import.usage))
            .or_insert(import.usage);
    }
    collapsed
}

/// What the parser collaborator reports for one source file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedFile {
    pub package_name: Option<SmolStr>,
    pub declared_types: BTreeSet<TypeName>,
    pub imports: BTreeSet<ImportReference>,
}

/// One resolution request: a directory, the rule kind being generated and
/// the references found in its sources.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolveRequest {
    pub path: DirPath,
    pub kind: RuleKind,
    pub imports: BTreeSet<ImportReference>,
    /// Types the directory's public surface re-exports.
    pub exports: BTreeSet<TypeName>,
}

impl ResolveRequest {
    /// Request with no imports or exports.
    pub fn new(path: impl Into<DirPath>, kind: RuleKind) -> Self {
        Self {
            path: path.into(),
            kind,
            imports: BTreeSet::new(),
            exports: BTreeSet::new(),
        }
    }

    /// Add a compile-time import.
    pub fn import(mut self, ty: &str) -> Self {
        self.imports.insert(ImportReference::compile_time(ty));
        self
    }

    /// Add a runtime-only import.
    pub fn runtime_import(mut self, ty: &str) -> Self {
        self.imports.insert(ImportReference::runtime_only(ty));
        self
    }

    /// Add an exported type.
    pub fn export(mut self, ty: &str) -> Self {
        self.exports.insert(TypeName::new(ty));
        self
    }
}

/// A directory to process in a run.
///
/// A directory may generate several rules (e.g. a library and a test suite);
/// each kind is resolved separately against the same parsed sources.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirectoryInput {
    pub path: DirPath,
    /// Rule kind names, checked against the registry during the run.
    pub kinds: Vec<String>,
    /// Source files, in discovery order without duplicates.
    pub files: IndexSet<PathBuf>,
    pub exports: BTreeSet<TypeName>,
}

impl DirectoryInput {
    /// Input generating one rule of `kind`.
    pub fn new(path: impl Into<DirPath>, kind: &str) -> Self {
        Self {
            path: path.into(),
            kinds: vec![kind.to_string()],
            files: IndexSet::new(),
            exports: BTreeSet::new(),
        }
    }

    /// Also generate a rule of `kind`. Repeated kinds are ignored.
    pub fn with_kind(mut self, kind: &str) -> Self {
        if !self.kinds.iter().any(|k| k == kind) {
            self.kinds.push(kind.to_string());
        }
        self
    }

    /// Add a source file. Repeated files are ignored.
    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.files.insert(file.into());
        self
    }

    /// Add an exported type.
    pub fn with_export(mut self, ty: &str) -> Self {
        self.exports.insert(TypeName::new(ty));
        self
    }

    /// Fold another input for the same directory into this one.
    pub fn merge(&mut self, other: DirectoryInput) {
        for kind in other.kinds {
            if !self.kinds.contains(&kind) {
                self.kinds.push(kind);
            }
        }
        self.files.extend(other.files);
        self.exports.extend(other.exports);
    }
}
