//! # rulegen-base
//!
//! Dependency resolution and package metadata for JVM build rule generation.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! engine   → Runs: parallel parse + resolve, lifecycle, reports
//!   ↓
//! resolve  → Per-reference resolution, collaborators, diagnostics
//!   ↓
//! cache    → Package cache (type index, generations, persistence)
//!   ↓
//! kinds    → Rule-kind registry, test classifier, load statements
//!   ↓
//! base     → Primitives (DirPath, TypeName, Label)
//! ```
//!
//! `config` and `error` are shared by every layer.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use rulegen::{Config, DirectoryInput, Engine, NoExternalResolver, SourceParser};
//!
//! fn generate(parser: Arc<dyn SourceParser>) -> Result<(), rulegen::EngineError> {
//!     let engine = Engine::new(Config::default(), parser, Arc::new(NoExternalResolver))?;
//!     let report = engine.run(vec![
//!         DirectoryInput::new("server/src/main/java/com/example", "java_library")
//!             .with_file("server/src/main/java/com/example/App.java"),
//!     ])?;
//!     for load in &report.loads {
//!         println!("load(\"{}\", {:?})", load.file, load.symbols);
//!     }
//!     engine.shutdown();
//!     Ok(())
//! }
//! ```

// ============================================================================
// MODULES
// ============================================================================

/// Foundation types: DirPath, TypeName, Label
pub mod base;

/// Package cache shared by all workers of a run
pub mod cache;

/// Engine configuration and build-file directives
pub mod config;

/// Engine object, run orchestration and lifecycle
pub mod engine;

/// Error types
pub mod error;

/// Rule-kind registry, test classifier and load registry
pub mod kinds;

/// Dependency resolution
pub mod resolve;

// Re-export the commonly needed items
pub use base::{DirPath, Label, TypeName};
pub use cache::{PackageCache, PackageEntry};
pub use config::{Config, Configurer, ResolveConfigurer};
pub use engine::{Engine, Phase, RunReport, RunStatus};
pub use error::{CollaboratorError, ConfigError, EngineError, PersistError, RegistryError};
pub use kinds::{KindRegistry, LoadStatement, RuleKind, is_test, required_loads};
pub use resolve::{
    Diagnostic, DiagnosticKind, DirectoryInput, ExternalResolver, NoExternalResolver, ParsedFile,
    ResolveRequest, Resolver, SourceParser,
};
