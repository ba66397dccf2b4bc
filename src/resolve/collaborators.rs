//! Interfaces to the external collaborators and the retry policy used to
//! call them.
//!
//! Both collaborators are blocking from the caller's point of view. Each call
//! receives the timeout it is expected to honor; a call that reports
//! [`CollaboratorError::Timeout`] is retried, anything else is returned as is.

use std::path::Path;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::ParsedFile;
use crate::base::{Label, TypeName};
use crate::error::CollaboratorError;

/// Extracts package, declared types and imports from a source file.
pub trait SourceParser: Send + Sync {
    /// Parse one file.
    ///
    /// Returns [`CollaboratorError::Parse`] when only this file is bad and
    /// [`CollaboratorError::Unavailable`] when the parser itself is gone.
    fn parse(&self, file: &Path, timeout: Duration) -> Result<ParsedFile, CollaboratorError>;

    /// Release long-lived resources (e.g. a parser server process).
    ///
    /// Called at most once, after the last run.
    fn shutdown(&self) {}
}

/// Maps a fully-qualified type name to a published artifact label.
pub trait ExternalResolver: Send + Sync {
    /// `Ok(None)` means no known artifact provides the type.
    fn resolve(&self, ty: &TypeName, timeout: Duration) -> Result<Option<Label>, CollaboratorError>;
}

/// An external resolver that knows no artifacts.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExternalResolver;

impl ExternalResolver for NoExternalResolver {
    fn resolve(&self, _ty: &TypeName, _timeout: Duration) -> Result<Option<Label>, CollaboratorError> {
        Ok(None)
    }
}

/// How collaborator calls are bounded and retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per call, including the first. At least one is made.
    pub max_attempts: u32,
    /// Timeout handed to each attempt.
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            timeout: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Policy allowing `max_attempts` calls of at most `timeout` each.
    pub fn new(max_attempts: u32, timeout: Duration) -> Self {
        Self {
            max_attempts,
            timeout,
        }
    }

    /// Run `call`, retrying while it times out.
    ///
    /// Exhausting the attempts yields [`CollaboratorError::RetriesExhausted`].
    /// Non-transient errors are returned immediately.
    pub fn call<T>(
        &self,
        operation: &str,
        mut call: impl FnMut(Duration) -> Result<T, CollaboratorError>,
    ) -> Result<T, CollaboratorError> {
        let attempts = self.max_attempts.max(1);
        for attempt in 1..=attempts {
            let started = Instant::now();
            match call(self.timeout) {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() => {
                    warn!(
                        operation,
                        attempt,
                        attempts,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "collaborator call timed out"
                    );
                }
                Err(err) => {
                    debug!(operation, attempt, error = %err, "collaborator call failed");
                    return Err(err);
                }
            }
        }
        Err(CollaboratorError::RetriesExhausted {
            operation: operation.to_string(),
            attempts,
        })
    }
}
