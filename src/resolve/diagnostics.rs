//! Diagnostics: non-fatal findings reported alongside resolution results.
//!
//! Nothing in here aborts a run. Diagnostics accumulate per directory and are
//! returned in the run report.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::base::{DirPath, Label, TypeName};
use crate::error::CollaboratorError;

// ============================================================================
// DIAGNOSTIC TYPES
// ============================================================================

/// Severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// What a diagnostic is about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum DiagnosticKind {
    /// A source file could not be parsed and was skipped.
    ParseError,
    /// No local or external target provides a referenced type.
    UnresolvedImport,
    /// More than one candidate; the preferred one was used.
    AmbiguousResolution,
    /// A runtime-only reference was placed in `deps`.
    DegradedResolution,
    /// An export could not be placed in `exports`.
    DroppedExport,
    /// A collaborator kept timing out; the directory was not processed.
    CollaboratorTimeout,
    /// A collaborator became unavailable; the run was aborted.
    CollaboratorFatal,
}

impl DiagnosticKind {
    /// Stable code used in reports.
    pub const fn code(self) -> &'static str {
        match self {
            DiagnosticKind::ParseError => codes::PARSE_ERROR,
            DiagnosticKind::UnresolvedImport => codes::UNRESOLVED_IMPORT,
            DiagnosticKind::AmbiguousResolution => codes::AMBIGUOUS_RESOLUTION,
            DiagnosticKind::DegradedResolution => codes::DEGRADED_RESOLUTION,
            DiagnosticKind::DroppedExport => codes::DROPPED_EXPORT,
            DiagnosticKind::CollaboratorTimeout => codes::COLLABORATOR_TIMEOUT,
            DiagnosticKind::CollaboratorFatal => codes::COLLABORATOR_FATAL,
        }
    }

    /// Severity implied by the kind.
    pub const fn severity(self) -> Severity {
        match self {
            DiagnosticKind::CollaboratorTimeout | DiagnosticKind::CollaboratorFatal => {
                Severity::Error
            }
            DiagnosticKind::ParseError
            | DiagnosticKind::UnresolvedImport
            | DiagnosticKind::DegradedResolution => Severity::Warning,
            DiagnosticKind::AmbiguousResolution | DiagnosticKind::DroppedExport => Severity::Info,
        }
    }
}

/// A diagnostic scoped to a directory and optionally a file or type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    /// Stable code, e.g. "R0002".
    pub code: &'static str,
    pub dir: DirPath,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_name: Option<TypeName>,
    pub message: String,
    /// Supporting notes, e.g. discarded candidates.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub related: Vec<String>,
}

impl Diagnostic {
    /// Diagnostic of `kind` about `dir`.
    pub fn new(kind: DiagnosticKind, dir: DirPath, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            code: kind.code(),
            dir,
            file: None,
            type_name: None,
            message: message.into(),
            related: Vec::new(),
        }
    }

    /// Attach the source file the diagnostic is about.
    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Attach the referenced type.
    pub fn with_type(mut self, ty: &TypeName) -> Self {
        self.type_name = Some(ty.clone());
        self
    }

    /// Add a related note.
    pub fn with_related(mut self, note: impl Into<String>) -> Self {
        self.related.push(note.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code, self.dir, self.message)
    }
}

// ============================================================================
// DIAGNOSTIC CODES
// ============================================================================

/// Stable diagnostic codes.
pub mod codes {
    pub const PARSE_ERROR: &str = "R0001";
    pub const UNRESOLVED_IMPORT: &str = "R0002";
    pub const AMBIGUOUS_RESOLUTION: &str = "R0003";
    pub const DEGRADED_RESOLUTION: &str = "R0004";
    pub const DROPPED_EXPORT: &str = "R0005";
    pub const COLLABORATOR_TIMEOUT: &str = "R0006";
    pub const COLLABORATOR_FATAL: &str = "R0007";
}

// ============================================================================
// DIAGNOSTIC COLLECTOR
// ============================================================================

/// Collects diagnostics for one directory.
#[derive(Clone, Debug)]
pub struct DiagnosticCollector {
    dir: DirPath,
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    /// Empty collector for `dir`.
    pub fn new(dir: DirPath) -> Self {
        Self {
            dir,
            diagnostics: Vec::new(),
        }
    }

    /// Add a diagnostic.
    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// A file could not be parsed and was skipped.
    pub fn parse_error(&mut self, file: &Path, error: &CollaboratorError) {
        self.add(
            Diagnostic::new(DiagnosticKind::ParseError, self.dir.clone(), error.to_string())
                .with_file(file),
        );
    }

    /// No local or external target provides `ty`.
    pub fn unresolved_import(&mut self, ty: &TypeName) {
        self.add(
            Diagnostic::new(
                DiagnosticKind::UnresolvedImport,
                self.dir.clone(),
                format!("no target provides '{}'", ty),
            )
            .with_type(ty),
        );
    }

    /// Local and external candidates both exist; the local one was used.
    pub fn ambiguous_resolution(&mut self, ty: &TypeName, local: &Label, external: &Label) {
        self.add(
            Diagnostic::new(
                DiagnosticKind::AmbiguousResolution,
                self.dir.clone(),
                format!("'{}' resolved to local {} over external {}", ty, local, external),
            )
            .with_type(ty)
            .with_related(format!("discarded candidate: {}", external)),
        );
    }

    /// Several directories declare the type, so none is used.
    pub fn ambiguous_local(&mut self, ty: &TypeName, dirs: &[DirPath]) {
        let mut diag = Diagnostic::new(
            DiagnosticKind::AmbiguousResolution,
            self.dir.clone(),
            format!("'{}' is declared in {} directories", ty, dirs.len()),
        )
        .with_type(ty);
        for dir in dirs {
            diag = diag.with_related(format!("candidate: {}", Label::for_dir(dir)));
        }
        self.add(diag);
    }

    /// A runtime-only reference was placed in `deps`.
    pub fn degraded_resolution(&mut self, ty: &TypeName, label: &Label, kind: &str) {
        self.add(
            Diagnostic::new(
                DiagnosticKind::DegradedResolution,
                self.dir.clone(),
                format!(
                    "runtime-only '{}' placed in deps: {} has no runtime_deps ({})",
                    ty, kind, label
                ),
            )
            .with_type(ty),
        );
    }

    /// An export could not be honored.
    pub fn dropped_export(&mut self, ty: &TypeName, reason: &str) {
        self.add(
            Diagnostic::new(
                DiagnosticKind::DroppedExport,
                self.dir.clone(),
                format!("export of '{}' dropped: {}", ty, reason),
            )
            .with_type(ty),
        );
    }

    /// A collaborator kept timing out for this directory.
    pub fn collaborator_timeout(&mut self, error: &CollaboratorError) {
        self.add(Diagnostic::new(
            DiagnosticKind::CollaboratorTimeout,
            self.dir.clone(),
            error.to_string(),
        ));
    }

    /// A collaborator became unavailable.
    pub fn collaborator_fatal(&mut self, error: &CollaboratorError) {
        self.add(Diagnostic::new(
            DiagnosticKind::CollaboratorFatal,
            self.dir.clone(),
            error.to_string(),
        ));
    }

    /// Get all diagnostics.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Number of diagnostics of one kind.
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.diagnostics.iter().filter(|d| d.kind == kind).count()
    }

    /// Number of error-severity diagnostics.
    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Error).count()
    }

    /// Number of warning-severity diagnostics.
    pub fn warning_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Warning).count()
    }

    /// True if any diagnostic is an error.
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// True when nothing was collected.
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Take all diagnostics, leaving the collector empty.
    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Consume the collector and return its diagnostics.
    pub fn finish(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}
