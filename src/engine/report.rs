//! What a run produced.

use serde::Serialize;
use smol_str::SmolStr;
use uuid::Uuid;

use crate::base::DirPath;
use crate::cache::ResolvedDeps;
use crate::kinds::{LoadStatement, RuleKind};
use crate::resolve::{Diagnostic, DiagnosticKind, ResolvedDependency, Severity};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    /// Every directory resolved without warnings.
    Completed,
    /// Every directory was attempted; some produced warnings or failed alone.
    CompletedWithWarnings,
    /// A collaborator became unavailable and remaining work was abandoned.
    Aborted { reason: String },
}

impl RunStatus {
    /// True for [`RunStatus::Aborted`].
    pub fn is_aborted(&self) -> bool {
        matches!(self, RunStatus::Aborted { .. })
    }
}

/// The attributes computed for one rule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RuleReport {
    pub kind: RuleKind,
    pub source_root: &'static str,
    pub assignments: ResolvedDeps,
    pub resolved: Vec<ResolvedDependency>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DirectoryReport {
    pub path: DirPath,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_name: Option<SmolStr>,
    /// Empty when the directory failed.
    pub rules: Vec<RuleReport>,
    pub diagnostics: Vec<Diagnostic>,
}

impl DirectoryReport {
    /// The rule generated for `kind`, if the directory has one.
    pub fn rule(&self, kind: RuleKind) -> Option<&RuleReport> {
        self.rules.iter().find(|rule| rule.kind == kind)
    }
}

/// A directory whose work could not be completed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DirectoryFailure {
    pub path: DirPath,
    pub reason: String,
}

/// Everything one run produced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    /// Cache generation stamped on every entry written by this run.
    pub generation: u64,
    pub status: RunStatus,
    /// In input order, one per distinct directory.
    pub directories: Vec<DirectoryReport>,
    pub failures: Vec<DirectoryFailure>,
    /// Load statements for every rule kind emitted by the run.
    pub loads: Vec<LoadStatement>,
    /// Cached directories this run did not visit.
    pub stale_directories: Vec<DirPath>,
    /// Set when the run finished but the package cache could not be saved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_error: Option<String>,
}

impl RunReport {
    /// Look up a directory's report by its slash-separated path.
    pub fn directory(&self, path: &str) -> Option<&DirectoryReport> {
        let path = DirPath::new(path);
        self.directories.iter().find(|dir| dir.path == path)
    }

    /// Every diagnostic of every directory, in directory order.
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.directories.iter().flat_map(|dir| dir.diagnostics.iter())
    }

    /// Number of diagnostics of one kind across the run.
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.diagnostics().filter(|d| d.kind == kind).count()
    }

    /// Number of error-severity diagnostics.
    pub fn error_count(&self) -> usize {
        self.diagnostics().filter(|d| d.severity == Severity::Error).count()
    }

    /// Number of warning-severity diagnostics.
    pub fn warning_count(&self) -> usize {
        self.diagnostics().filter(|d| d.severity == Severity::Warning).count()
    }

    /// True when the run was abandoned.
    pub fn is_aborted(&self) -> bool {
        self.status.is_aborted()
    }

    /// Pretty-printed JSON form of the report.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Completed unless something went wrong short of aborting.
pub(crate) fn summarize(directories: &[DirectoryReport], failures: &[DirectoryFailure]) -> RunStatus {
    let warned = directories
        .iter()
        .flat_map(|dir| dir.diagnostics.iter())
        .any(|d| d.severity != Severity::Info);
    if warned || !failures.is_empty() {
        RunStatus::CompletedWithWarnings
    } else {
        RunStatus::Completed
    }
}
