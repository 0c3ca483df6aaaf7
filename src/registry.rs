//! Dependency registry (component C7): the project-wide identifier to
//! module-id map every rewrite resolves missing names against.
//!
//! Construction has three phases:
//! 1. Locate the project manifest (walking up from the target directory).
//! 2. Load whatever's cached on disk, keyed by a version string per module id.
//! 3. Register every source in fixed order — builtins, then declared
//!    dependencies, then project files — reusing cached entries whose
//!    version still matches and rebuilding everything else, then persist the
//!    merged map and fold it into a single name -> [`DepInfo`] reverse index.
//!
//! `populate` memoizes per directory: concurrent callers for the same
//! directory share one in-flight build rather than racing independent ones.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use oxc_allocator::Allocator;
use oxc_parser::Parser;
use oxc_span::SourceType;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use autoimport_js::export_analyzer::analyze_exports;
use autoimport_js::files::collect_source_files;
use autoimport_js::layers::imports::{DepInfo, ExportKind, ModuleId, Priority, RegistryEntry};

use crate::manifest::{find_project_root, ManifestError, ManifestOverride, ProjectManifest};
use crate::sandbox::{probe_package, DEFAULT_TIMEOUT};

/// A fixed, crate-declared stand-in for "the current platform runtime
/// version" used as every builtin module's cache version string. A real
/// interpreter-reported version would make the cache key non-reproducible
/// across runs of the same binary, which defeats the point of caching.
const RUNTIME_VERSION: &str = "autoimport-builtins-1";

/// Platform builtin module names the registry always registers first.
const BUILTIN_MODULES: &[&str] = crate::sandbox::BUILTIN_MODULES;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("failed to read project files: {0}")]
    Files(#[from] autoimport_js::files::FileError),

    #[error("failed to read or write registry cache at {path}: {source}")]
    Cache {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// The merged, queryable result of one `populate` call: a plain name ->
/// [`DepInfo`] map, built once and shared by every lookup against this
/// project directory.
#[derive(Debug, Default)]
pub struct BuiltRegistry {
    deps: BTreeMap<String, DepInfo>,
}

impl BuiltRegistry {
    pub fn search(&self, name: &str) -> Option<DepInfo> {
        self.deps.get(name).cloned()
    }
}

/// The dependency registry: a memoizing cache of [`BuiltRegistry`] values
/// keyed by project directory.
pub struct Registry {
    inflight: StdMutex<BTreeMap<PathBuf, std::sync::Arc<OnceCell<std::sync::Arc<BuiltRegistry>>>>>,
    sandbox_timeout: Duration,
}

impl Default for Registry {
    fn default() -> Self {
        Registry {
            inflight: StdMutex::new(BTreeMap::new()),
            sandbox_timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    #[cfg(test)]
    fn with_timeout(timeout: Duration) -> Self {
        Registry {
            inflight: StdMutex::new(BTreeMap::new()),
            sandbox_timeout: timeout,
        }
    }

    /// Build (or fetch the already-in-flight build of) the registry for
    /// `dir`. Concurrent callers passing the same directory share one build.
    pub async fn populate(
        &self,
        dir: &Path,
        over: &ManifestOverride,
    ) -> Result<std::sync::Arc<BuiltRegistry>, RegistryError> {
        let cell = {
            let mut guard = self.inflight.lock().unwrap_or_else(|e| e.into_inner());
            guard
                .entry(dir.to_path_buf())
                .or_insert_with(|| std::sync::Arc::new(OnceCell::new()))
                .clone()
        };

        cell.get_or_try_init(|| async { self.build(dir, over).map(std::sync::Arc::new) })
            .await
            .map(|arc| arc.clone())
    }

    fn build(&self, dir: &Path, over: &ManifestOverride) -> Result<BuiltRegistry, RegistryError> {
        let manifest = find_project_root(dir)?.map(|m| m.with_override(over));
        let project_root = manifest.as_ref().map(|m| m.root.clone());

        let cache_path = cache_path_for(project_root.as_deref());
        let mut cache = load_cache(&cache_path);

        let builtin_entries = register_builtins(&mut cache);
        let declared_entries = register_declared(&mut cache, manifest.as_ref(), self.sandbox_timeout);
        let file_entries = register_files(&mut cache, project_root.as_deref())?;

        persist_cache(&cache_path, &cache);

        let mut deps = BTreeMap::new();
        apply_source(&mut deps, &builtin_entries, Priority::Builtin);
        apply_source(&mut deps, &declared_entries, Priority::Declared);
        apply_source(&mut deps, &file_entries, Priority::Local);

        Ok(BuiltRegistry { deps })
    }
}

// ============================================================================
// Cache load/persist
// ============================================================================

type Cache = BTreeMap<ModuleId, RegistryEntry>;

fn cache_path_for(project_root: Option<&Path>) -> PathBuf {
    let key = project_root
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|| "-".to_string());
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    let digest = hex::encode(hasher.finalize());
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(format!("autoimport-registry-{digest}.json"))
}

fn load_cache(path: &Path) -> Cache {
    match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
        Err(_) => Cache::default(),
    }
}

fn persist_cache(path: &Path, cache: &Cache) {
    match serde_json::to_string_pretty(cache) {
        Ok(json) => {
            if let Err(e) = fs::write(path, json) {
                warn!("failed to write registry cache at {}: {e}", path.display());
            }
        }
        Err(e) => warn!("failed to serialize registry cache: {e}"),
    }
}

// ============================================================================
// Per-source registration (step 3)
// ============================================================================

fn cache_lookup_or_fresh(
    cache: &mut Cache,
    id: &ModuleId,
    version: &str,
    fresh: impl FnOnce() -> RegistryEntry,
) -> RegistryEntry {
    if let Some(existing) = cache.get(id) {
        if existing.version == version {
            return existing.clone();
        }
    }
    let entry = fresh();
    cache.insert(id.clone(), entry.clone());
    entry
}

fn register_builtins(cache: &mut Cache) -> Vec<(ModuleId, RegistryEntry)> {
    BUILTIN_MODULES
        .iter()
        .map(|name| {
            let id = ModuleId::new(*name);
            let entry = cache_lookup_or_fresh(cache, &id, RUNTIME_VERSION, || {
                let mut entry = RegistryEntry::new(RUNTIME_VERSION);
                entry.idents = derive_idents(id.basename());
                entry
            });
            (id, entry)
        })
        .collect()
}

fn register_declared(
    cache: &mut Cache,
    manifest: Option<&ProjectManifest>,
    sandbox_timeout: Duration,
) -> Vec<(ModuleId, RegistryEntry)> {
    let Some(manifest) = manifest else {
        return Vec::new();
    };
    let project_root = manifest.root.clone();

    manifest
        .declared_deps()
        .into_iter()
        .map(|(name, version)| {
            let id = ModuleId::new(name.clone());
            let entry = cache_lookup_or_fresh(cache, &id, &version, || {
                build_package_entry(&id, &version, &project_root, &name, sandbox_timeout)
            });
            (id, entry)
        })
        .collect()
}

fn build_package_entry(
    id: &ModuleId,
    version: &str,
    project_root: &Path,
    name: &str,
    sandbox_timeout: Duration,
) -> RegistryEntry {
    let mut entry = RegistryEntry::new(version);
    entry.idents = derive_idents(id.basename());

    match probe_package(project_root, name, sandbox_timeout) {
        Some(probe) => {
            entry.props.extend(probe.props);
            entry.promote_idents_to_defaults(probe.has_default);
        }
        None => debug!("export probe unavailable for package {name}, using id-derived idents only"),
    }
    entry
}

fn register_files(
    cache: &mut Cache,
    project_root: Option<&Path>,
) -> Result<Vec<(ModuleId, RegistryEntry)>, RegistryError> {
    let Some(project_root) = project_root else {
        return Ok(Vec::new());
    };

    let files = collect_source_files(project_root)?;
    let mut out = Vec::with_capacity(files.len());

    for (path, content) in files {
        let id = ModuleId::new(path.to_string_lossy().into_owned());
        let version = mtime_version(&path);
        let entry = cache_lookup_or_fresh(cache, &id, &version, || {
            build_file_entry(&id, &version, &path, &content)
        });
        out.push((id, entry));
    }

    Ok(out)
}

fn mtime_version(path: &Path) -> String {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .map(|t| chrono::DateTime::<chrono::Utc>::from(t).to_rfc3339())
        .unwrap_or_else(|| "0".to_string())
}

fn build_file_entry(id: &ModuleId, version: &str, path: &Path, content: &str) -> RegistryEntry {
    let mut entry = RegistryEntry::new(version);
    entry.idents = derive_idents(id.basename());

    let allocator = Allocator::default();
    let source_type = SourceType::from_path(path).unwrap_or_default();
    let parser_ret = Parser::new(&allocator, content, source_type).parse();
    if !parser_ret.errors.is_empty() {
        debug!("failed to parse {} for export analysis, using id-derived idents only", path.display());
        return entry;
    }

    let exports = analyze_exports(&parser_ret.program);
    entry.idents.extend(exports.idents);
    entry.defaults.extend(exports.defaults.clone());
    entry.props.extend(exports.props);
    entry.promote_idents_to_defaults(!exports.defaults.is_empty());
    entry
}

// ============================================================================
// Identifier derivation
// ============================================================================

/// `basename`, plus its camelCase and PascalCase variants, each validated as
/// a legal identifier and deduplicated.
fn derive_idents(basename: &str) -> std::collections::BTreeSet<String> {
    let words: Vec<&str> = basename
        .split(|c: char| !c.is_alphanumeric() && c != '_' && c != '$')
        .filter(|w| !w.is_empty())
        .collect();

    let mut candidates = std::collections::BTreeSet::new();

    if is_valid_identifier(basename) {
        candidates.insert(basename.to_string());
    }
    if !words.is_empty() {
        candidates.insert(to_camel_case(&words));
        candidates.insert(to_pascal_case(&words));
    }

    candidates.retain(|c| is_valid_identifier(c));
    candidates
}

fn to_camel_case(words: &[&str]) -> String {
    let mut out = String::new();
    for (i, word) in words.iter().enumerate() {
        if i == 0 {
            out.push_str(&word.to_lowercase());
        } else {
            out.push_str(&capitalize(word));
        }
    }
    out
}

fn to_pascal_case(words: &[&str]) -> String {
    words.iter().map(|w| capitalize(w)).collect()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

fn is_valid_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_alphabetic() || first == '_' || first == '$') {
        return false;
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

// ============================================================================
// Reverse index (computeDeps)
// ============================================================================

fn apply_source(deps: &mut BTreeMap<String, DepInfo>, entries: &[(ModuleId, RegistryEntry)], priority: Priority) {
    for (id, entry) in entries {
        for name in &entry.idents {
            try_insert(deps, name, DepInfo { id: id.clone(), priority, kind: ExportKind::Ident });
        }
        for name in &entry.defaults {
            try_insert(deps, name, DepInfo { id: id.clone(), priority, kind: ExportKind::Default });
        }
        for name in &entry.props {
            try_insert(deps, name, DepInfo { id: id.clone(), priority, kind: ExportKind::Prop });
        }
    }
}

fn try_insert(deps: &mut BTreeMap<String, DepInfo>, name: &str, candidate: DepInfo) {
    match deps.get(name) {
        None => {
            deps.insert(name.to_string(), candidate);
        }
        Some(existing) => {
            if DepInfo::should_replace(existing, &candidate) {
                deps.insert(name.to_string(), candidate);
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
