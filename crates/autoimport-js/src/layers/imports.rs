//! Core data model shared by the registry, resolver, composer and rewriter:
//! module identifiers, export kinds, registry entries and the composer's
//! merged target set.

use std::collections::BTreeSet;
use std::fmt;

use autoimport_core::types::Span;
use serde::{Deserialize, Serialize};

// ============================================================================
// ModuleId
// ============================================================================

/// Opaque module identifier: either a package id (`fs`, `lodash`,
/// `@scope/pkg`) or a file id (an absolute path to a project source file,
/// emitted as a relative `./`-prefixed, forward-slash path).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ModuleId(pub String);

impl ModuleId {
    pub fn new(id: impl Into<String>) -> Self {
        ModuleId(id.into())
    }

    /// A file id is path-like: starts with `./`, `../`, or `/`.
    pub fn is_file(&self) -> bool {
        self.0.starts_with("./") || self.0.starts_with("../") || self.0.starts_with('/')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `basename(id)`: the last path segment, extension stripped for file ids.
    pub fn basename(&self) -> &str {
        let last = self.0.rsplit('/').next().unwrap_or(&self.0);
        if self.is_file() {
            last.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(last)
        } else {
            last
        }
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// ExportKind
// ============================================================================

/// How a name is bound to its module, in emission priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ExportKind {
    /// The module's whole value is bound to an identifier (`X = require(id)`).
    Ident,
    /// The module has an ES `default` export.
    Default,
    /// The module exposes a named property to destructure/import by name.
    Prop,
}

// ============================================================================
// Priority
// ============================================================================

/// Resolution priority: lower wins when two modules export the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Priority {
    /// Project-local file.
    Local = 1,
    /// Declared package dependency.
    Declared = 2,
    /// Platform builtin.
    Builtin = 3,
}

// ============================================================================
// RegistryEntry
// ============================================================================

/// Per-`ModuleId` record in the dependency registry.
///
/// Invariant: `idents` and `defaults` never both hold entries after
/// promotion — a non-empty `defaults` means every `ident` has been promoted
/// in and `idents` is empty.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub version: String,
    pub idents: BTreeSet<String>,
    pub defaults: BTreeSet<String>,
    pub props: BTreeSet<String>,
}

impl RegistryEntry {
    pub fn new(version: impl Into<String>) -> Self {
        RegistryEntry {
            version: version.into(),
            idents: BTreeSet::new(),
            defaults: BTreeSet::new(),
            props: BTreeSet::new(),
        }
    }

    /// Promote all `idents` into `defaults` and clear `idents`, if a default
    /// export was observed. A no-op when `defaults` is already empty.
    pub fn promote_idents_to_defaults(&mut self, has_default: bool) {
        if has_default {
            let idents = std::mem::take(&mut self.idents);
            self.defaults.extend(idents);
        }
    }
}

// ============================================================================
// DepInfo
// ============================================================================

/// Resolved binding for a single identifier name, after reverse-index
/// construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepInfo {
    pub id: ModuleId,
    pub priority: Priority,
    pub kind: ExportKind,
}

impl DepInfo {
    /// Whether `candidate` should replace the currently registered entry for
    /// a name, per the associate rule: lower priority wins; at equal
    /// priority, idents/defaults strictly beat props; otherwise first wins.
    pub fn should_replace(existing: &DepInfo, candidate: &DepInfo) -> bool {
        if existing.priority != candidate.priority {
            return existing.priority > candidate.priority;
        }
        existing.kind == ExportKind::Prop && candidate.kind != ExportKind::Prop
    }
}

// ============================================================================
// ExistingImport
// ============================================================================

/// An import/require statement found in the source by the existing-import
/// extractor (C4), with the exact destructured shape it used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingImport {
    /// Byte span of the whole statement, used to compute the lines it spans.
    pub span: Span,
    /// 1-indexed first and last source line the statement spans.
    pub line_start: u32,
    pub line_end: u32,
    pub dep_id: ModuleId,
    pub idents: Vec<String>,
    pub defaults: Vec<String>,
    pub props: Vec<String>,
}

// ============================================================================
// LibsToAdd
// ============================================================================

/// Names still to be added for one module id, merging what's already
/// imported with what the resolver determined is missing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LibEntry {
    pub idents: BTreeSet<String>,
    pub defaults: BTreeSet<String>,
    pub props: BTreeSet<String>,
}

impl LibEntry {
    pub fn is_empty(&self) -> bool {
        self.idents.is_empty() && self.defaults.is_empty() && self.props.is_empty()
    }
}

/// The merged target set handed to the composer (C9): per module id, the
/// names to emit import/require statements for.
pub type LibsToAdd = std::collections::BTreeMap<ModuleId, LibEntry>;

// ============================================================================
// Tests
// ============================================================================
