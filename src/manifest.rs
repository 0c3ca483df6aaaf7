//! Project manifest loading (component C7 step 1): walks upward from a
//! directory looking for a `package.json`-shaped manifest that marks the
//! project root.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

const MANIFEST_FILE: &str = "package.json";

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("malformed manifest at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

pub type ManifestResult<T> = Result<T, ManifestError>;

/// The shape of a `package.json` we care about; every other field is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
struct RawManifest {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    dependencies: BTreeMap<String, String>,
    #[serde(default, rename = "devDependencies")]
    dev_dependencies: BTreeMap<String, String>,
}

/// A located project manifest: the directory it was found in plus its
/// declared dependency tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectManifest {
    pub root: PathBuf,
    pub name: Option<String>,
    pub dependencies: BTreeMap<String, String>,
    pub dev_dependencies: BTreeMap<String, String>,
}

impl ProjectManifest {
    /// Union of `dependencies` and `devDependencies`, keyed by package name
    /// with its declared version range, as the registry's step 3b needs.
    pub fn declared_deps(&self) -> BTreeMap<String, String> {
        let mut all = self.dependencies.clone();
        all.extend(self.dev_dependencies.clone());
        all
    }

    /// Apply a partial override (the `run()` entrypoint's `override` argument):
    /// additively merges declared dependency entries on top of what was
    /// found on disk, without requiring a manifest to already exist.
    pub fn with_override(mut self, over: &ManifestOverride) -> Self {
        self.dependencies.extend(over.dependencies.clone());
        self.dev_dependencies.extend(over.dev_dependencies.clone());
        self
    }
}

/// Caller-supplied manifest fragment (the `run()` entrypoint's optional
/// `override` parameter): merged additively on top of whatever manifest is
/// discovered on disk, or used standalone when none is found.
#[derive(Debug, Clone, Default)]
pub struct ManifestOverride {
    pub dependencies: BTreeMap<String, String>,
    pub dev_dependencies: BTreeMap<String, String>,
}

/// Walk upward from `dir` looking for the first ancestor (inclusive) that
/// carries a `package.json`. Returns `Ok(None)` if no ancestor has one —
/// this is not an error, per the error-handling policy. Any read failure
/// other than "file doesn't exist" surfaces.
pub fn find_project_root(dir: &Path) -> ManifestResult<Option<ProjectManifest>> {
    let mut current = Some(dir);
    while let Some(candidate) = current {
        let manifest_path = candidate.join(MANIFEST_FILE);
        match fs::read_to_string(&manifest_path) {
            Ok(content) => {
                let raw: RawManifest =
                    serde_json::from_str(&content).map_err(|source| ManifestError::Parse {
                        path: manifest_path.clone(),
                        source,
                    })?;
                return Ok(Some(ProjectManifest {
                    root: candidate.to_path_buf(),
                    name: raw.name,
                    dependencies: raw.dependencies,
                    dev_dependencies: raw.dev_dependencies,
                }));
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                current = candidate.parent();
            }
            Err(source) => {
                return Err(ManifestError::Io {
                    path: manifest_path,
                    source,
                });
            }
        }
    }
    Ok(None)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{create_dir_all, File};
    use std::io::Write;
    use tempfile::TempDir;

    fn write_manifest(dir: &Path, content: &str) {
        File::create(dir.join(MANIFEST_FILE))
            .unwrap()
            .write_all(content.as_bytes())
            .unwrap();
    }

    #[test]
    fn finds_manifest_in_given_directory() {
        let dir = TempDir::new().unwrap();
        write_manifest(
            dir.path(),
            r#"{"name":"proj","dependencies":{"lodash":"^4.0.0"}}"#,
        );
        let manifest = find_project_root(dir.path()).unwrap().unwrap();
        assert_eq!(manifest.root, dir.path());
        assert_eq!(manifest.dependencies.get("lodash").unwrap(), "^4.0.0");
    }

    #[test]
    fn walks_up_to_find_ancestor_manifest() {
        let dir = TempDir::new().unwrap();
        write_manifest(dir.path(), r#"{"name":"proj"}"#);
        let nested = dir.path().join("src/components");
        create_dir_all(&nested).unwrap();
        let manifest = find_project_root(&nested).unwrap().unwrap();
        assert_eq!(manifest.root, dir.path());
    }

    #[test]
    fn returns_none_when_no_manifest_found() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a/b/c");
        create_dir_all(&nested).unwrap();
        let manifest = find_project_root(&nested).unwrap();
        assert!(manifest.is_none());
    }

    #[test]
    fn merges_declared_and_dev_dependencies() {
        let dir = TempDir::new().unwrap();
        write_manifest(
            dir.path(),
            r#"{"dependencies":{"a":"1.0.0"},"devDependencies":{"b":"2.0.0"}}"#,
        );
        let manifest = find_project_root(dir.path()).unwrap().unwrap();
        let all = manifest.declared_deps();
        assert_eq!(all.get("a").unwrap(), "1.0.0");
        assert_eq!(all.get("b").unwrap(), "2.0.0");
    }

    #[test]
    fn malformed_manifest_surfaces_as_error() {
        let dir = TempDir::new().unwrap();
        write_manifest(dir.path(), "{not json");
        let result = find_project_root(dir.path());
        assert!(matches!(result, Err(ManifestError::Parse { .. })));
    }

    #[test]
    fn override_merges_additively() {
        let dir = TempDir::new().unwrap();
        write_manifest(dir.path(), r#"{"dependencies":{"a":"1.0.0"}}"#);
        let manifest = find_project_root(dir.path()).unwrap().unwrap();
        let mut over = ManifestOverride::default();
        over.dependencies.insert("b".to_string(), "9.9.9".to_string());
        let merged = manifest.with_override(&over);
        assert_eq!(merged.dependencies.len(), 2);
    }
}
