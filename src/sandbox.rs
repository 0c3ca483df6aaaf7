//! Export probe (component C6): evaluates an external package's entry file
//! in a restricted `quickjs` context to discover what it actually exports,
//! for dependency registry entries the static export analyzer can't reach
//! (anything outside the project tree).
//!
//! The sandbox exposes nothing except a fixed allow-list of builtin module
//! names through a single `require` function; every other host capability
//! (filesystem, network, process) is unreachable from inside it. A package
//! that throws, loops, or otherwise misbehaves never propagates an error out
//! of [`probe_package`] — callers get `None` and keep going with whatever
//! id-derived idents they already have.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rquickjs::{CatchResultExt, Context, Ctx, Function, Object, Runtime, Value};
use serde::Deserialize;
use tracing::debug;

/// Platform builtin module names the sandbox's `require` recognizes.
/// Anything outside this list throws inside the sandbox and the probe swallows it.
pub const BUILTIN_MODULES: &[&str] = &[
    "assert", "buffer", "child_process", "crypto", "events", "fs", "http", "https", "net", "os",
    "path", "querystring", "stream", "string_decoder", "timers", "tls", "url", "util", "zlib",
];

/// The sandbox's default hard timeout, per package.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(500);

/// What the probe determined about a package's exported value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeResult {
    pub props: BTreeSet<String>,
    pub has_default: bool,
}

/// Resolve `package_name`'s entry file under `project_root`'s `node_modules`,
/// following `package.json`'s `main` field (default `index.js`). Returns
/// `None` if the package or its manifest can't be found — not an error, the
/// caller keeps id-derived idents only.
pub fn resolve_entry_file(project_root: &Path, package_name: &str) -> Option<PathBuf> {
    let pkg_dir = project_root.join("node_modules").join(package_name);
    let manifest_path = pkg_dir.join("package.json");

    let main = fs::read_to_string(&manifest_path)
        .ok()
        .and_then(|content| serde_json::from_str::<PackageMain>(&content).ok())
        .and_then(|m| m.main)
        .unwrap_or_else(|| "index.js".to_string());

    let entry = pkg_dir.join(main);
    if entry.is_file() {
        Some(entry)
    } else {
        let with_ext = pkg_dir.join(format!("{main}.js"));
        with_ext.is_file().then_some(with_ext)
    }
}

#[derive(Debug, Deserialize)]
struct PackageMain {
    main: Option<String>,
}

/// Evaluate `source` as a CommonJS module body in a sandboxed context and
/// report what its `module.exports` looks like. Any parse error, thrown
/// exception, or timeout is swallowed and reported as `None`.
pub fn probe_source(source: &str, timeout: Duration) -> Option<ProbeResult> {
    let runtime = Runtime::new().ok()?;
    let deadline = Instant::now() + timeout;
    runtime.set_interrupt_handler(Some(Box::new(move || Instant::now() >= deadline)));

    let context = Context::full(&runtime).ok()?;
    let outcome = context.with(|ctx| eval_module(ctx, source));

    match outcome {
        Ok(result) => Some(result),
        Err(err) => {
            debug!("export probe failed: {err}");
            None
        }
    }
}

/// Probe an external package by resolving and reading its entry file, then
/// evaluating it. `None` if the package can't be located or evaluation fails.
pub fn probe_package(project_root: &Path, package_name: &str, timeout: Duration) -> Option<ProbeResult> {
    let entry = resolve_entry_file(project_root, package_name)?;
    let relative = entry.strip_prefix(project_root).unwrap_or(&entry);
    let source = autoimport_js::files::read_file(project_root, &relative.to_string_lossy()).ok()?;
    probe_source(&source, timeout)
}

fn eval_module<'js>(ctx: Ctx<'js>, source: &str) -> rquickjs::Result<ProbeResult> {
    install_sandboxed_require(&ctx)?;

    let wrapped = format!(
        "(function(module, exports, require) {{\n{source}\nreturn module.exports;\n}})"
    );
    let wrapper: rquickjs::Function = ctx.eval(wrapped).catch(&ctx).map_err(to_rquickjs_err)?;

    let module_obj = Object::new(ctx.clone())?;
    let exports_obj = Object::new(ctx.clone())?;
    module_obj.set("exports", exports_obj.clone())?;
    let require_fn: Function = ctx.globals().get("__autoimport_require")?;

    let exported: Value = wrapper
        .call((module_obj, exports_obj, require_fn))
        .catch(&ctx)
        .map_err(to_rquickjs_err)?;

    Ok(summarize(&exported))
}

fn to_rquickjs_err(err: rquickjs::CaughtError<'_>) -> rquickjs::Error {
    rquickjs::Error::new_into_js("Error", err.to_string())
}

/// Install a `require` that only recognizes [`BUILTIN_MODULES`], returning an
/// empty stub object for each; anything else throws.
fn install_sandboxed_require(ctx: &Ctx<'_>) -> rquickjs::Result<()> {
    let ctx2 = ctx.clone();
    let require = Function::new(ctx.clone(), move |specifier: String| -> rquickjs::Result<Object> {
        if BUILTIN_MODULES.contains(&specifier.as_str()) {
            Object::new(ctx2.clone())
        } else {
            Err(rquickjs::Error::new_into_js(
                "Error",
                format!("module not available in sandbox: {specifier}"),
            ))
        }
    })?;
    ctx.globals().set("__autoimport_require", require)?;
    Ok(())
}

fn summarize(value: &Value) -> ProbeResult {
    let has_default = value.is_function();
    let mut props = BTreeSet::new();

    if let Some(obj) = value.as_object() {
        for key in obj.keys::<String>().flatten() {
            props.insert(key);
        }
    }

    ProbeResult { props, has_default }
}

// ============================================================================
// Tests
// ============================================================================
