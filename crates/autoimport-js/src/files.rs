//! Project file collection.
//!
//! Walks a project root looking for JS/TS source files, for the registry's
//! project-file scan (step 3c): every file gets parsed for its static
//! exports and registered as a candidate import target.

use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;
use walkdir::WalkDir;

const EXTENSIONS: &[&str] = &["js", "jsx", "mjs", "cjs", "ts", "tsx", "mts", "cts"];

/// Error type for file collection.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("file not found: {path}")]
    NotFound { path: String },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type FileResult<T> = Result<T, FileError>;

/// Collect every JS/TS source file under `project_root`, skipping
/// dot-directories and the usual package-manager/build directories.
/// Returns `(absolute_path, content)` pairs sorted by path, for
/// deterministic registration order.
pub fn collect_source_files(project_root: &Path) -> FileResult<Vec<(std::path::PathBuf, String)>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(project_root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| !is_excluded_dir(e))
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if !has_source_extension(path) {
            continue;
        }
        let content = fs::read_to_string(path)?;
        files.push((path.to_path_buf(), content));
    }

    files.sort_by(|(a, _), (b, _)| a.cmp(b));
    Ok(files)
}

fn is_excluded_dir(entry: &walkdir::DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    if entry.depth() == 0 {
        return false;
    }
    name.starts_with('.') || name == "node_modules" || name == "bower_components"
}

fn has_source_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| EXTENSIONS.contains(&ext))
}

/// Read a single file relative to `project_root`.
pub fn read_file(project_root: &Path, relative_path: &str) -> FileResult<String> {
    let full_path = project_root.join(relative_path);
    match fs::read_to_string(&full_path) {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(FileError::NotFound {
            path: full_path.to_string_lossy().into_owned(),
        }),
        Err(e) => Err(FileError::Io(e)),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        File::create(path).unwrap().write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn collects_js_and_ts_files() {
        let dir = TempDir::new().unwrap();
        write(&dir.path().join("src/main.js"), "foo();");
        write(&dir.path().join("src/types.ts"), "export type T = number;");
        write(&dir.path().join("src/component.tsx"), "export default function() {}");

        let files = collect_source_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|(p, _)| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert!(names.contains(&"main.js".to_string()));
        assert!(names.contains(&"types.ts".to_string()));
        assert!(names.contains(&"component.tsx".to_string()));
    }

    #[test]
    fn excludes_node_modules() {
        let dir = TempDir::new().unwrap();
        write(&dir.path().join("node_modules/dep/index.js"), "module.exports = {};");
        write(&dir.path().join("src/main.js"), "foo();");

        let files = collect_source_files(dir.path()).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].0.ends_with("main.js"));
    }

    #[test]
    fn excludes_hidden_directories() {
        let dir = TempDir::new().unwrap();
        write(&dir.path().join(".git/hooks/pre-commit.js"), "// hook");
        write(&dir.path().join("src/main.js"), "foo();");

        let files = collect_source_files(dir.path()).unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn ignores_non_source_extensions() {
        let dir = TempDir::new().unwrap();
        write(&dir.path().join("README.md"), "# hi");
        write(&dir.path().join("data.json"), "{}");
        write(&dir.path().join("src/main.js"), "foo();");

        let files = collect_source_files(dir.path()).unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn returns_files_sorted_by_path() {
        let dir = TempDir::new().unwrap();
        write(&dir.path().join("z.js"), "");
        write(&dir.path().join("a.js"), "");
        write(&dir.path().join("m.js"), "");

        let files = collect_source_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|(p, _)| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.js", "m.js", "z.js"]);
    }

    #[test]
    fn read_file_reads_relative_path() {
        let dir = TempDir::new().unwrap();
        write(&dir.path().join("src/main.js"), "foo();");
        let content = read_file(dir.path(), "src/main.js").unwrap();
        assert_eq!(content, "foo();");
    }

    #[test]
    fn read_file_not_found_errors() {
        let dir = TempDir::new().unwrap();
        let result = read_file(dir.path(), "missing.js");
        assert!(result.is_err());
    }
}
