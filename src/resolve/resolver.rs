//! Per-reference resolution and attribute placement.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, trace};

use super::{
    Diagnostic, DiagnosticCollector, ExternalResolver, ResolveRequest, RetryPolicy, Usage,
    collapse_imports,
};
use crate::base::{Label, TypeName};
use crate::cache::{PackageCache, ResolvedDeps, TypeLookup};
use crate::config::Config;
use crate::error::CollaboratorError;
use crate::kinds::Attr;

// ============================================================================
// RESOLUTION RESULT
// ============================================================================

/// Where a dependency label came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// A directory in this repository.
    Local,
    /// The external-coordinate collaborator.
    External,
    /// Neither; the dependency was omitted.
    Unresolved,
}

/// The outcome for a single referenced type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResolvedDependency {
    pub ty: TypeName,
    pub label: Option<Label>,
    /// Channels the label was placed in (empty when unresolved).
    pub attrs: Vec<Attr>,
    pub origin: Origin,
}

/// Everything produced for one [`ResolveRequest`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ResolveOutput {
    /// Deduplicated, sorted labels per channel.
    pub assignments: ResolvedDeps,
    /// One entry per reference that was not skipped, in type order.
    pub resolved: Vec<ResolvedDependency>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ResolveOutput {
    /// The per-reference result for `ty`, if it was considered.
    pub fn dependency(&self, ty: &str) -> Option<&ResolvedDependency> {
        let ty = TypeName::new(ty);
        self.resolved.iter().find(|d| d.ty == ty)
    }
}

// ============================================================================
// RESOLVER
// ============================================================================

/// Resolves the references of one directory against the package cache and
/// the external-coordinate collaborator.
///
/// Holds only shared references; workers each build their own.
#[derive(Clone, Copy)]
pub struct Resolver<'a> {
    cache: &'a PackageCache,
    external: &'a dyn ExternalResolver,
    config: &'a Config,
    retry: RetryPolicy,
}

impl<'a> Resolver<'a> {
    /// Resolver reading `cache` and asking `external` for what is not local.
    pub fn new(cache: &'a PackageCache, external: &'a dyn ExternalResolver, config: &'a Config) -> Self {
        Self {
            cache,
            external,
            config,
            retry: config.retry_policy(),
        }
    }

    /// Resolve every reference of `request`.
    ///
    /// Unresolved, ambiguous and degraded references become diagnostics. The
    /// only errors are collaborator failures: a timeout that outlived its
    /// retries, or an unavailable collaborator.
    pub fn resolve(&self, request: &ResolveRequest) -> Result<ResolveOutput, CollaboratorError> {
        let info = request.kind.info();
        let own = self.cache.get(&request.path);
        let mut diags = DiagnosticCollector::new(request.path.clone());
        let mut assignments = ResolvedDeps::new();
        let mut resolved = Vec::new();

        let imports = collapse_imports(&request.imports);

        // First pass: a label and a channel per reference.
        let mut placed = Vec::with_capacity(imports.len());
        for (ty, usage) in &imports {
            if self.config.is_excluded(ty) {
                trace!(dir = %request.path, %ty, "excluded type");
                continue;
            }
            if own.as_ref().is_some_and(|entry| entry.declares(ty)) {
                trace!(dir = %request.path, %ty, "declared in the same directory");
                continue;
            }

            let Some((label, origin)) = self.resolve_type(request, ty, &mut diags)? else {
                placed.push((ty, None));
                continue;
            };
            let channel = match usage {
                Usage::RuntimeOnly if info.resolves(Attr::RuntimeDeps) => Attr::RuntimeDeps,
                Usage::RuntimeOnly => {
                    diags.degraded_resolution(ty, &label, request.kind.as_str());
                    Attr::Deps
                }
                Usage::CompileTime => Attr::Deps,
            };
            placed.push((ty, Some((label, channel, origin))));
        }

        // A label in deps is already on the runtime classpath.
        let compile_labels: BTreeSet<Label> = placed
            .iter()
            .filter_map(|(_, slot)| slot.as_ref())
            .filter(|(_, channel, _)| *channel == Attr::Deps)
            .map(|(label, _, _)| label.clone())
            .collect();

        // Second pass: final channels, exports and per-reference records.
        for (ty, slot) in placed {
            let Some((label, channel, origin)) = slot else {
                resolved.push(ResolvedDependency {
                    ty: ty.clone(),
                    label: None,
                    attrs: Vec::new(),
                    origin: Origin::Unresolved,
                });
                continue;
            };

            let in_deps = compile_labels.contains(&label);
            let channel = if in_deps { Attr::Deps } else { channel };
            assignments.push(channel, label.clone());
            let mut attrs = vec![channel];

            if request.exports.contains(ty) {
                if !info.resolves(Attr::Exports) {
                    diags.dropped_export(ty, &format!("{} has no exports", request.kind));
                } else if !in_deps {
                    diags.dropped_export(ty, "exports must also be compile-time deps");
                } else {
                    assignments.push(Attr::Exports, label.clone());
                    attrs.push(Attr::Exports);
                }
            }

            debug!(dir = %request.path, %ty, %label, ?origin, ?attrs, "resolved reference");
            resolved.push(ResolvedDependency {
                ty: ty.clone(),
                label: Some(label),
                attrs,
                origin,
            });
        }

        for ty in &request.exports {
            if imports.contains_key(ty) || self.config.is_excluded(ty) {
                continue;
            }
            if own.as_ref().is_some_and(|entry| entry.declares(ty)) {
                continue;
            }
            diags.dropped_export(ty, "not referenced by any import");
        }

        if request.kind.is_test() && info.resolves(Attr::RuntimeDeps) {
            for label in &self.config.test_runtime_deps {
                assignments.push(Attr::RuntimeDeps, label.clone());
            }
        }

        assignments.normalize();
        // implicit test deps may already be compile-time deps
        let ResolvedDeps {
            deps, runtime_deps, ..
        } = &mut assignments;
        runtime_deps.retain(|label| deps.binary_search(label).is_err());

        Ok(ResolveOutput {
            assignments,
            resolved,
            diagnostics: diags.finish(),
        })
    }

    /// Pick a label for `ty`: local wins over external.
    fn resolve_type(
        &self,
        request: &ResolveRequest,
        ty: &TypeName,
        diags: &mut DiagnosticCollector,
    ) -> Result<Option<(Label, Origin)>, CollaboratorError> {
        let local = match self.cache.lookup_type(ty) {
            TypeLookup::Missing => None,
            TypeLookup::Unique(dir) => Some(Label::for_dir(&dir)),
            TypeLookup::Ambiguous(dirs) => {
                diags.ambiguous_local(ty, &dirs);
                None
            }
        };

        // The lock is not held here; the external call may block.
        let external = self
            .retry
            .call(&format!("resolve {}", ty), |timeout| self.external.resolve(ty, timeout))?;

        Ok(match (local, external) {
            (Some(local), Some(external)) => {
                diags.ambiguous_resolution(ty, &local, &external);
                Some((local, Origin::Local))
            }
            (Some(local), None) => Some((local, Origin::Local)),
            (None, Some(external)) => Some((external, Origin::External)),
            (None, None) => {
                diags.unresolved_import(ty);
                debug!(dir = %request.path, %ty, "unresolved reference");
                None
            }
        })
    }
}
