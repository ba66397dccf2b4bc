//! A single generation run: parse every directory, resolve every directory,
//! then assemble the report.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use indexmap::IndexMap;
use indexmap::map::Entry;
use parking_lot::Mutex;
use rayon::prelude::*;
use smol_str::SmolStr;
use tracing::{debug, error, info, info_span, warn};
use uuid::Uuid;

use super::lifecycle::RunGuard;
use super::report::summarize;
use super::{DirectoryFailure, DirectoryReport, Engine, Phase, RuleReport, RunReport, RunStatus};
use crate::base::{DirPath, TypeName};
use crate::cache::PackageEntry;
use crate::error::{CollaboratorError, EngineError};
use crate::kinds::{LoadSet, RuleKind, default_source_root};
use crate::resolve::{DiagnosticCollector, DirectoryInput, ImportReference, ResolveRequest, Resolver};

// ============================================================================
// ABORT SIGNAL
// ============================================================================

/// Set by the first worker that hits a fatal collaborator error.
#[derive(Default)]
struct AbortSignal {
    flag: AtomicBool,
    reason: Mutex<Option<String>>,
}

impl AbortSignal {
    fn trigger(&self, reason: String) {
        let mut slot = self.reason.lock();
        if slot.is_none() {
            *slot = Some(reason);
        }
        self.flag.store(true, Ordering::Release);
    }

    fn is_set(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    fn reason(&self) -> Option<String> {
        self.reason.lock().clone()
    }
}

// ============================================================================
// PER-DIRECTORY STATE
// ============================================================================

struct DirectoryWork {
    path: DirPath,
    kinds: Vec<RuleKind>,
    files: Vec<PathBuf>,
    exports: BTreeSet<TypeName>,
    package_name: Option<SmolStr>,
    imports: BTreeSet<ImportReference>,
    rules: Vec<RuleReport>,
    diagnostics: DiagnosticCollector,
    failure: Option<String>,
}

impl DirectoryWork {
    fn fail(&mut self, err: CollaboratorError, abort: &AbortSignal) {
        if err.is_fatal() {
            error!(dir = %self.path, error = %err, "collaborator unavailable, aborting run");
            self.diagnostics.collaborator_fatal(&err);
            abort.trigger(err.to_string());
        } else {
            warn!(dir = %self.path, error = %err, "directory failed");
            self.diagnostics.collaborator_timeout(&err);
        }
        self.rules.clear();
        self.failure = Some(err.to_string());
    }

    fn into_report(self) -> (DirectoryReport, Option<DirectoryFailure>) {
        let failure = self.failure.map(|reason| DirectoryFailure {
            path: self.path.clone(),
            reason,
        });
        let report = DirectoryReport {
            path: self.path,
            package_name: self.package_name,
            rules: self.rules,
            diagnostics: self.diagnostics.finish(),
        };
        (report, failure)
    }
}

// ============================================================================
// RUN
// ============================================================================

impl Engine {
    /// Process `inputs` as one generation.
    ///
    /// Inputs naming the same directory are merged. A directory whose
    /// collaborator calls keep timing out fails alone; an unavailable
    /// collaborator aborts the run, which is reported through
    /// [`RunStatus::Aborted`] rather than as an error.
    ///
    /// Errors are reserved for the engine itself: unknown rule kinds, a run
    /// already in progress, or a shut-down engine. A failed cache save is
    /// recorded in [`RunReport::cache_error`].
    pub fn run(&self, inputs: Vec<DirectoryInput>) -> Result<RunReport, EngineError> {
        self.lifecycle.advance(Phase::Parsing)?;
        let _guard = RunGuard(&self.lifecycle);

        let mut work = self.plan(inputs)?;

        let run_id = Uuid::new_v4();
        let span = info_span!("run", %run_id);
        let _enter = span.enter();

        let generation = self.cache.begin_generation();
        let started = Instant::now();
        info!(directories = work.len(), generation, "run started");

        let abort = AbortSignal::default();
        self.pool.install(|| {
            work.par_iter_mut()
                .for_each(|dir| self.parse_directory(dir, &abort))
        });

        if !abort.is_set() {
            self.lifecycle.advance(Phase::Resolving)?;
            self.pool.install(|| {
                work.par_iter_mut()
                    .for_each(|dir| self.resolve_directory(dir, &abort))
            });
        }

        let aborted = abort.reason();
        if aborted.is_none() {
            self.lifecycle.advance(Phase::Emitting)?;
        }

        let mut loads = LoadSet::new();
        let mut directories = Vec::with_capacity(work.len());
        let mut failures = Vec::new();
        for dir in work {
            loads.extend(dir.rules.iter().map(|rule| rule.kind));
            let (report, failure) = dir.into_report();
            directories.push(report);
            failures.extend(failure);
        }

        let (mut status, stale_directories) = match aborted {
            Some(reason) => (RunStatus::Aborted { reason }, Vec::new()),
            None => {
                // A failed directory kept its old entry but is not stale.
                let stale = self
                    .cache
                    .stale_entries()
                    .into_iter()
                    .filter(|path| !failures.iter().any(|failure| &failure.path == path))
                    .collect();
                (summarize(&directories, &failures), stale)
            }
        };

        let mut cache_error = None;
        if !status.is_aborted() {
            if let Err(err) = self.save_cache() {
                warn!(error = %err, "package cache not saved");
                cache_error = Some(err.to_string());
                status = RunStatus::CompletedWithWarnings;
            }
        }

        info!(
            ?status,
            failures = failures.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "run finished"
        );

        Ok(RunReport {
            run_id,
            generation,
            status,
            directories,
            failures,
            loads: loads.statements(),
            stale_directories,
            cache_error,
        })
    }

    /// Merge inputs per directory and check their rule kinds.
    fn plan(&self, inputs: Vec<DirectoryInput>) -> Result<Vec<DirectoryWork>, EngineError> {
        let mut merged: IndexMap<DirPath, DirectoryInput> = IndexMap::new();
        for input in inputs {
            match merged.entry(input.path.clone()) {
                Entry::Occupied(mut slot) => slot.get_mut().merge(input),
                Entry::Vacant(slot) => {
                    slot.insert(input);
                }
            }
        }

        merged
            .into_values()
            .map(|input| -> Result<DirectoryWork, EngineError> {
                let kinds = input
                    .kinds
                    .iter()
                    .map(|name| self.registry.kind(name))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(DirectoryWork {
                    diagnostics: DiagnosticCollector::new(input.path.clone()),
                    path: input.path,
                    kinds,
                    files: input.files.into_iter().collect(),
                    exports: input.exports,
                    package_name: None,
                    imports: BTreeSet::new(),
                    rules: Vec::new(),
                    failure: None,
                })
            })
            .collect()
    }

    /// Parse a directory's files and record its declared types in the cache.
    fn parse_directory(&self, dir: &mut DirectoryWork, abort: &AbortSignal) {
        let retry = self.config.retry_policy();
        let mut declared = BTreeSet::new();
        let mut failed = None;

        for file in &dir.files {
            if abort.is_set() {
                return;
            }
            let operation = format!("parse {}", file.display());
            match retry.call(&operation, |timeout| self.parser.parse(file, timeout)) {
                Ok(parsed) => {
                    if dir.package_name.is_none() {
                        dir.package_name = parsed.package_name;
                    }
                    declared.extend(parsed.declared_types);
                    dir.imports.extend(parsed.imports);
                }
                Err(err @ CollaboratorError::Parse { .. }) => {
                    warn!(dir = %dir.path, file = %file.display(), error = %err, "skipping file");
                    dir.diagnostics.parse_error(file, &err);
                }
                Err(err) => {
                    failed = Some(err);
                    break;
                }
            }
        }

        if let Some(err) = failed {
            dir.fail(err, abort);
            return;
        }

        let mut entry = PackageEntry::new(dir.path.clone());
        entry.package_name = dir.package_name.clone();
        entry.declared_types = declared;
        entry.kinds = dir.kinds.iter().copied().collect();
        if let Some(previous) = self.cache.get(&dir.path) {
            entry.resolved = previous.resolved.clone();
        }
        self.cache.upsert(&dir.path, entry);
        debug!(dir = %dir.path, files = dir.files.len(), "parsed directory");
    }

    /// Resolve every rule kind of a directory and store the results.
    fn resolve_directory(&self, dir: &mut DirectoryWork, abort: &AbortSignal) {
        if dir.failure.is_some() {
            return;
        }
        let resolver = Resolver::new(&self.cache, self.external.as_ref(), &self.config);
        let mut resolved = BTreeMap::new();

        for kind in dir.kinds.clone() {
            if abort.is_set() {
                return;
            }
            let request = ResolveRequest {
                path: dir.path.clone(),
                kind,
                imports: dir.imports.clone(),
                exports: dir.exports.clone(),
            };
            let output = match resolver.resolve(&request) {
                Ok(output) => output,
                Err(err) => {
                    dir.fail(err, abort);
                    return;
                }
            };

            // Kinds of one directory share sources and repeat findings.
            for diagnostic in output.diagnostics {
                if !dir.diagnostics.diagnostics().contains(&diagnostic) {
                    dir.diagnostics.add(diagnostic);
                }
            }
            resolved.insert(kind, output.assignments.clone());
            dir.rules.push(RuleReport {
                kind,
                source_root: default_source_root(kind),
                assignments: output.assignments,
                resolved: output.resolved,
            });
        }

        if let Some(current) = self.cache.get(&dir.path) {
            let mut entry = PackageEntry::clone(&current);
            entry.resolved = resolved;
            self.cache.upsert(&dir.path, entry);
        }
        debug!(dir = %dir.path, rules = dir.rules.len(), "resolved directory");
    }
}
