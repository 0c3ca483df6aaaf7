//! Command-line front door: a `fix` subcommand that runs the import fixer
//! against a single file and either prints or writes back the result.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use crate::manifest::ManifestOverride;
use crate::registry::Registry;
use crate::{run, RunError};

#[derive(Debug, Parser)]
#[command(name = "autoimport", version, about = "Fix missing imports in a JS/TS file")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Resolve missing imports in a file and rewrite its import block.
    Fix {
        /// The file to fix.
        file: PathBuf,

        /// Project root to resolve dependencies against. Defaults to the
        /// file's own directory; a manifest walk-up starts from there.
        #[arg(long)]
        workspace: Option<PathBuf>,

        /// Print the rewritten source instead of writing it back to disk.
        #[arg(long)]
        dry_run: bool,

        /// Declare a dependency the on-disk manifest doesn't (or shouldn't)
        /// have to, as `name=version`. Repeatable. Merges additively on top
        /// of whatever `package.json` is discovered during the walk-up.
        #[arg(long = "manifest-override", value_name = "NAME=VERSION")]
        manifest_override: Vec<String>,
    },
}

/// Parse `--manifest-override name=version` pairs into a `ManifestOverride`.
fn parse_manifest_override(pairs: &[String]) -> Result<ManifestOverride, String> {
    let mut over = ManifestOverride::default();
    for pair in pairs {
        let (name, version) = pair
            .split_once('=')
            .ok_or_else(|| format!("invalid --manifest-override {pair:?}, expected NAME=VERSION"))?;
        over
            .dependencies
            .insert(name.to_string(), version.to_string());
    }
    Ok(over)
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    status: &'static str,
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: u8,
    message: String,
}

/// Run the CLI, returning the process exit code.
pub async fn run_cli(cli: Cli) -> std::process::ExitCode {
    match cli.command {
        Command::Fix {
            file,
            workspace,
            dry_run,
            manifest_override,
        } => {
            let over = match parse_manifest_override(&manifest_override) {
                Ok(over) => over,
                Err(message) => {
                    eprintln!(
                        "{}",
                        serde_json::to_string(&ErrorEnvelope {
                            status: "error",
                            error: ErrorBody { code: 1, message },
                        })
                        .unwrap()
                    );
                    return std::process::ExitCode::FAILURE;
                }
            };
            match run_fix(&file, workspace.as_deref(), dry_run, &over).await {
                Ok(()) => std::process::ExitCode::SUCCESS,
                Err(err) => {
                    render_error(&err);
                    std::process::ExitCode::FAILURE
                }
            }
        }
    }
}

async fn run_fix(
    file: &Path,
    workspace: Option<&Path>,
    dry_run: bool,
    override_manifest: &ManifestOverride,
) -> Result<(), RunError> {
    let dir = workspace
        .map(Path::to_path_buf)
        .or_else(|| file.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."));

    let code = fs::read_to_string(file).map_err(|source| RunError::Io {
        path: file.to_path_buf(),
        source,
    })?;

    let file_name = file.to_string_lossy().into_owned();
    let registry = Registry::new();
    let rewritten = run(&dir, &file_name, &code, override_manifest, &registry).await?;

    if dry_run {
        print!("{rewritten}");
    } else if rewritten != code {
        fs::write(file, &rewritten).map_err(|source| RunError::Io {
            path: file.to_path_buf(),
            source,
        })?;
        info!(file = %file.display(), "rewrote import block");
    } else {
        info!(file = %file.display(), "no changes needed");
    }

    Ok(())
}

fn render_error(err: &RunError) {
    let envelope = ErrorEnvelope {
        status: "error",
        error: ErrorBody {
            code: err.error_code().code(),
            message: err.to_string(),
        },
    };
    eprintln!("{}", serde_json::to_string(&envelope).unwrap_or_else(|_| err.to_string()));
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_override_parses_name_equals_version_pairs() {
        let over = parse_manifest_override(&["lodash=4.17.21".to_string(), "bar=1.0.0".to_string()]).unwrap();
        assert_eq!(over.dependencies.get("lodash").unwrap(), "4.17.21");
        assert_eq!(over.dependencies.get("bar").unwrap(), "1.0.0");
    }

    #[test]
    fn manifest_override_rejects_pair_without_equals() {
        let result = parse_manifest_override(&["lodash".to_string()]);
        assert!(result.is_err());
    }
}
