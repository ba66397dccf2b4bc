//! Error types for rulegen.
//!
//! Per-reference problems (unresolved, ambiguous, degraded) are not errors:
//! they are reported as [`crate::resolve::Diagnostic`]s and never stop a run.
//! The types here cover the failures that do change control flow.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::engine::Phase;

/// Errors raised while building or querying the rule-kind registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("rule kind '{0}' is not registered")]
    NotRegistered(String),

    #[error("rule kind '{kind}' resolves '{attr}', which is not a dependency channel")]
    NonChannelResolveAttr {
        kind: &'static str,
        attr: &'static str,
    },

    #[error("rule kind '{kind}' lists '{attr}' in {set} but does not support it")]
    UnsupportedAttr {
        kind: &'static str,
        attr: &'static str,
        set: &'static str,
    },

    #[error("rule kind '{0}' has no load statement")]
    MissingLoad(&'static str),

    #[error("rule kind '{0}' is loaded from more than one file")]
    DuplicateLoad(&'static str),
}

/// Failures reported by (or on behalf of) an external collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollaboratorError {
    /// Transient: the call did not answer within its timeout.
    #[error("{operation} timed out after {timeout:?}")]
    Timeout {
        operation: String,
        timeout: Duration,
    },

    /// A transient failure kept recurring until the retry budget ran out.
    #[error("{operation} still timing out after {attempts} attempts")]
    RetriesExhausted { operation: String, attempts: u32 },

    /// The collaborator cannot produce any more data. Fatal to the run.
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),

    /// A single source file could not be parsed. Scoped to that file.
    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },
}

impl CollaboratorError {
    /// Whether the whole run must stop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CollaboratorError::Unavailable(_))
    }

    /// Whether the call may be retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, CollaboratorError::Timeout { .. })
    }
}

/// Errors reading or writing the persisted package cache.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to read package cache {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write package cache {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed package cache: {0}")]
    Format(#[from] serde_json::Error),

    #[error("unsupported package cache version {found} (expected {expected})")]
    Version { found: u32, expected: u32 },
}

/// Errors applying configuration directives.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unknown directive '{0}'")]
    UnknownDirective(String),

    #[error("invalid value '{value}' for directive '{key}': {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

/// Errors that stop the engine itself (as opposed to a single directory).
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Persist(#[from] PersistError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("invalid lifecycle transition from {from} to {to}")]
    InvalidTransition { from: Phase, to: Phase },

    #[error("engine has been shut down")]
    ShutDown,
}
