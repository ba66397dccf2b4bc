//! The resolution engine.
//!
//! One [`Engine`] is built per process. It owns the rule-kind registry, the
//! package cache and the collaborator handles, and lends them by reference to
//! the workers of each run.
//!
//! ## Run phases
//!
//! ```text
//! Idle → Parsing → Resolving → Emitting → Idle
//!          │          │
//!          └──────────┴──→ Idle   (collaborator unavailable: abort)
//!
//! any ──→ Shutdown   (terminal, parser released once)
//! ```
//!
//! Every directory is parsed before any is resolved, so local candidates are
//! looked up in a complete cache.

mod lifecycle;
mod report;
mod run;

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use crate::base::DirPath;
use crate::cache::{PackageCache, PackageEntry};
use crate::config::Config;
use crate::error::EngineError;
use crate::kinds::KindRegistry;
use crate::resolve::{ExternalResolver, SourceParser};

pub use lifecycle::{Lifecycle, Phase};
pub use report::{DirectoryFailure, DirectoryReport, RuleReport, RunReport, RunStatus};

/// Parses and resolves directories; one per process.
pub struct Engine {
    config: Config,
    registry: KindRegistry,
    cache: PackageCache,
    parser: Arc<dyn SourceParser>,
    external: Arc<dyn ExternalResolver>,
    lifecycle: Lifecycle,
    pool: rayon::ThreadPool,
}

impl Engine {
    /// Build an engine.
    ///
    /// When `config.cache_file` names an existing file the package cache is
    /// loaded from it; otherwise the cache starts empty.
    pub fn new(
        config: Config,
        parser: Arc<dyn SourceParser>,
        external: Arc<dyn ExternalResolver>,
    ) -> Result<Self, EngineError> {
        let cache = match config.cache_file.as_deref() {
            Some(path) if path.exists() => {
                let cache = PackageCache::load(path)?;
                info!(path = %path.display(), entries = cache.len(), "loaded package cache");
                cache
            }
            _ => PackageCache::new(),
        };
        Self::with_cache(config, parser, external, cache)
    }

    /// Build an engine around an existing cache.
    pub fn with_cache(
        config: Config,
        parser: Arc<dyn SourceParser>,
        external: Arc<dyn ExternalResolver>,
        cache: PackageCache,
    ) -> Result<Self, EngineError> {
        let registry = KindRegistry::new()?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.workers)
            .thread_name(|i| format!("rulegen-worker-{i}"))
            .build()?;
        debug!(workers = pool.current_num_threads(), kinds = registry.len(), "engine ready");

        Ok(Self {
            config,
            registry,
            cache,
            parser,
            external,
            lifecycle: Lifecycle::new(),
            pool,
        })
    }

    /// Configuration the engine was built with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Registry of known rule kinds.
    pub fn registry(&self) -> &KindRegistry {
        &self.registry
    }

    /// Package cache shared by runs.
    pub fn cache(&self) -> &PackageCache {
        &self.cache
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.lifecycle.phase()
    }

    /// Number of worker threads.
    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Forget a directory. Its declared types stop resolving locally.
    pub fn remove_directory(&self, path: &DirPath) -> Option<Arc<PackageEntry>> {
        let removed = self.cache.remove(path);
        if removed.is_some() {
            debug!(dir = %path, "removed package entry");
        }
        removed
    }

    /// Persist the package cache to `config.cache_file`, if one is set.
    pub fn save_cache(&self) -> Result<(), EngineError> {
        if let Some(path) = self.config.cache_file.as_deref() {
            self.save_cache_to(path)?;
        }
        Ok(())
    }

    /// Persist the package cache to `path`.
    pub fn save_cache_to(&self, path: &Path) -> Result<(), EngineError> {
        self.cache.save(path)?;
        info!(path = %path.display(), entries = self.cache.len(), "saved package cache");
        Ok(())
    }

    /// Stop the engine and release the parser collaborator.
    ///
    /// Safe to call any number of times; only the first call releases.
    pub fn shutdown(&self) {
        if self.lifecycle.shutdown() {
            info!("shutting down engine");
            self.parser.shutdown();
        }
    }

    /// True once [`Engine::shutdown`] has been called.
    pub fn is_shut_down(&self) -> bool {
        self.lifecycle.is_shut_down()
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("phase", &self.phase())
            .field("workers", &self.workers())
            .field("entries", &self.cache.len())
            .finish_non_exhaustive()
    }
}
