//! In-memory collaborators shared by the integration tests.

#![allow(dead_code)]

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use rulegen::resolve::ImportReference;
use rulegen::{CollaboratorError, ExternalResolver, Label, ParsedFile, SourceParser, TypeName};

// ============================================================================
// PARSER
// ============================================================================

enum Response {
    Parsed(ParsedFile),
    Broken,
    /// Times out this many times, then parses.
    Flaky(u32, ParsedFile),
    AlwaysTimeout,
    Unavailable,
}

/// A parser that answers from a table of canned responses.
#[derive(Default)]
pub struct FakeParser {
    files: HashMap<PathBuf, Response>,
    attempts: Mutex<HashMap<PathBuf, u32>>,
    calls: AtomicUsize,
    shutdowns: AtomicUsize,
}

pub fn parsed(package: &str, declares: &[&str], imports: &[&str], runtime: &[&str]) -> ParsedFile {
    let imports = imports
        .iter()
        .map(|ty| ImportReference::compile_time(*ty))
        .chain(runtime.iter().map(|ty| ImportReference::runtime_only(*ty)))
        .collect();
    ParsedFile {
        package_name: Some(package.into()),
        declared_types: declares.iter().map(|ty| TypeName::new(ty)).collect::<BTreeSet<_>>(),
        imports,
    }
}

impl FakeParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(mut self, path: &str, file: ParsedFile) -> Self {
        self.files.insert(PathBuf::from(path), Response::Parsed(file));
        self
    }

    pub fn broken(mut self, path: &str) -> Self {
        self.files.insert(PathBuf::from(path), Response::Broken);
        self
    }

    pub fn flaky(mut self, path: &str, timeouts: u32, file: ParsedFile) -> Self {
        self.files.insert(PathBuf::from(path), Response::Flaky(timeouts, file));
        self
    }

    pub fn always_timeout(mut self, path: &str) -> Self {
        self.files.insert(PathBuf::from(path), Response::AlwaysTimeout);
        self
    }

    pub fn unavailable(mut self, path: &str) -> Self {
        self.files.insert(PathBuf::from(path), Response::Unavailable);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn shutdowns(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }
}

fn timeout(operation: String, timeout: Duration) -> CollaboratorError {
    CollaboratorError::Timeout { operation, timeout }
}

impl SourceParser for FakeParser {
    fn parse(&self, file: &Path, limit: Duration) -> Result<ParsedFile, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let attempt = {
            let mut attempts = self.attempts.lock();
            let count = attempts.entry(file.to_path_buf()).or_insert(0);
            *count += 1;
            *count
        };

        match self.files.get(file) {
            Some(Response::Parsed(parsed)) => Ok(parsed.clone()),
            Some(Response::Flaky(timeouts, parsed)) if attempt > *timeouts => Ok(parsed.clone()),
            Some(Response::Flaky(..)) | Some(Response::AlwaysTimeout) => {
                Err(timeout(format!("parse {}", file.display()), limit))
            }
            Some(Response::Unavailable) => Err(CollaboratorError::Unavailable("parser exited".into())),
            Some(Response::Broken) => Err(CollaboratorError::Parse {
                path: file.to_path_buf(),
                message: "unexpected token".into(),
            }),
            None => Err(CollaboratorError::Parse {
                path: file.to_path_buf(),
                message: "no such file".into(),
            }),
        }
    }

    fn shutdown(&self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}

// ============================================================================
// EXTERNAL RESOLVER
// ============================================================================

/// An external resolver backed by a map from type name to artifact label.
#[derive(Default)]
pub struct FakeExternal {
    artifacts: HashMap<String, Label>,
    timeouts: HashSet<String>,
    unavailable: bool,
    calls: AtomicUsize,
}

impl FakeExternal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn artifact(mut self, ty: &str, label: &str) -> Self {
        self.artifacts.insert(ty.to_string(), label.parse().unwrap());
        self
    }

    /// Every lookup of `ty` times out.
    pub fn hangs_on(mut self, ty: &str) -> Self {
        self.timeouts.insert(ty.to_string());
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ExternalResolver for FakeExternal {
    fn resolve(&self, ty: &TypeName, limit: Duration) -> Result<Option<Label>, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable {
            return Err(CollaboratorError::Unavailable("coordinate index offline".into()));
        }
        let key = ty.to_string();
        if self.timeouts.contains(&key) {
            return Err(timeout(format!("resolve {ty}"), limit));
        }
        Ok(self.artifacts.get(&key).cloned())
    }
}

pub fn label(s: &str) -> Label {
    s.parse().unwrap()
}
