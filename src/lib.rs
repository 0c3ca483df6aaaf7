//! Automatic import/require fixer.
//!
//! Given a source file and the project it lives in, [`run`] determines which
//! free identifiers the file references but never declares or imports,
//! resolves each one against a project-wide [`registry::Registry`], and
//! re-emits a single sorted, style-consistent import block in place of
//! whatever was there before.
//!
//! - `manifest`: project manifest discovery (`package.json` walk-up)
//! - `registry`: the dependency registry (component C7)
//! - `sandbox`: sandboxed export probe for external packages (component C6)
//! - `cli`: command-line front door
//!
//! Language-specific parsing and rewriting live in `autoimport_core` (shared
//! infrastructure) and `autoimport_js` (the JS/TS adapter), both re-exported
//! here for convenience.

pub mod cli;
pub mod manifest;
pub mod registry;
pub mod sandbox;

pub use autoimport_core as core;
pub use autoimport_js as js;

use std::path::Path;

use oxc_allocator::Allocator;

use autoimport_core::error::AutoImportError;
use autoimport_core::style::StyleDescriptor;
use autoimport_js::existing_imports::extract_existing_imports;
use autoimport_js::parser::parse;
use autoimport_js::resolver::resolve_missing;
use autoimport_js::rewriter::rewrite;

pub use manifest::ManifestOverride;
pub use registry::{BuiltRegistry, Registry, RegistryError};

/// Everything that can go wrong running the fixer end to end.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Parse(#[from] AutoImportError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("failed to read {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
}

impl RunError {
    pub fn error_code(&self) -> autoimport_core::error::ErrorCode {
        match self {
            RunError::Parse(err) => err.error_code(),
            RunError::Registry(_) => autoimport_core::error::ErrorCode::Internal,
            RunError::Io { .. } => autoimport_core::error::ErrorCode::Io,
        }
    }
}

/// Parse `code` as though it lived at `file_name` under project `dir`,
/// resolve every undeclared free identifier against `dir`'s dependency
/// registry, and return the rewritten source with a single corrected import
/// block spliced in.
///
/// `override_manifest` is merged additively on top of whatever
/// `package.json` is discovered (or used standalone if none is found) —
/// primarily useful for callers that already know a dependency's version
/// and don't want a registry rebuild to re-derive it.
///
/// Rewriting is all-or-nothing: a parse failure or a registry I/O failure
/// aborts the whole call and no partial output is produced.
pub async fn run(
    dir: &Path,
    file_name: &str,
    code: &str,
    override_manifest: &ManifestOverride,
    registry: &Registry,
) -> Result<String, RunError> {
    let built = registry.populate(dir, override_manifest).await?;

    let allocator = Allocator::default();
    let parsed = parse(&allocator, file_name, code)?;
    let existing = extract_existing_imports(&parsed.program, code);
    let lookup = |name: &str| built.search(name);
    let missing = resolve_missing(&parsed, &existing, &lookup);
    let style = StyleDescriptor::detect(code);

    Ok(rewrite(code, &parsed.program, &existing, &missing, &style, dir))
}

// ============================================================================
// Tests
// ============================================================================
