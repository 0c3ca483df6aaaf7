//! Import block composer (component C9): turns a merged `LibsToAdd` into the
//! sorted, styled import block text to splice back into the source.

use std::path::Path;

use autoimport_core::style::{DeclKind, RequireKeyword, StyleDescriptor};

use crate::layers::imports::{LibEntry, LibsToAdd, ModuleId};

const MAX_LINE_LEN: usize = 80;

/// Compose the import block for `libs`, relative to `dir` (the directory the
/// file being rewritten lives in). Returns an empty string when `libs` has
/// nothing to add.
pub fn compose(dir: &Path, libs: &LibsToAdd, style: &StyleDescriptor) -> String {
    let mut external = Vec::new();
    let mut local = Vec::new();

    for (id, entry) in libs {
        if entry.is_empty() {
            continue;
        }
        let normalized = normalize_id(dir, id);
        if id.is_file() {
            local.push((normalized, entry));
        } else {
            external.push((normalized, entry));
        }
    }

    external.sort_by(|a, b| sort_key(&a.0).cmp(&sort_key(&b.0)));
    local.sort_by(|a, b| sort_key(&a.0).cmp(&sort_key(&b.0)));

    let mut statements = Vec::new();
    for (id, entry) in &external {
        statements.extend(compose_statements(id, entry, style));
    }
    let external_count = statements.len();
    for (id, entry) in &local {
        statements.extend(compose_statements(id, entry, style));
    }

    if statements.is_empty() {
        return String::new();
    }

    if external_count > 0 && external_count < statements.len() {
        let mut lines = statements[..external_count].to_vec();
        lines.push(String::new());
        lines.extend(statements[external_count..].to_vec());
        lines.join("\n")
    } else {
        statements.join("\n")
    }
}

/// `(basename, full id)` — the composer's sort key: by basename, ties
/// broken by full id, both lexicographic.
fn sort_key(id: &str) -> (String, String) {
    let basename = id
        .rsplit('/')
        .next()
        .unwrap_or(id)
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or_else(|| id.rsplit('/').next().unwrap_or(id));
    (basename.to_string(), id.to_string())
}

/// Rewrite a file id into a `/`-separated, `./`-prefixed path relative to
/// `dir`; leaves package ids untouched.
fn normalize_id(dir: &Path, id: &ModuleId) -> String {
    if !id.is_file() {
        return id.as_str().to_string();
    }
    let target = Path::new(id.as_str());
    let relative = pathdiff(target, dir);
    let forward = relative.replace(std::path::MAIN_SEPARATOR, "/");
    if forward.starts_with('.') {
        forward
    } else {
        format!("./{forward}")
    }
}

/// Minimal relative-path diff: walks up common ancestors, same algorithm
/// shape as the `pathdiff` crate but without the dependency, since all we
/// need is component-wise diffing of two absolute paths.
fn pathdiff(target: &Path, base: &Path) -> String {
    let target_components: Vec<_> = target.components().collect();
    let base_components: Vec<_> = base.components().collect();

    let common = target_components
        .iter()
        .zip(base_components.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts = Vec::new();
    for _ in common..base_components.len() {
        parts.push("..".to_string());
    }
    for component in &target_components[common..] {
        parts.push(component.as_os_str().to_string_lossy().into_owned());
    }

    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join(std::path::MAIN_SEPARATOR_STR)
    }
}

fn compose_statements(id: &str, entry: &LibEntry, style: &StyleDescriptor) -> Vec<String> {
    match style.require_keyword {
        RequireKeyword::Require => compose_require_statements(id, entry, style),
        RequireKeyword::Import => compose_import_statements(id, entry, style),
    }
}

fn compose_require_statements(id: &str, entry: &LibEntry, style: &StyleDescriptor) -> Vec<String> {
    let mut out = Vec::new();
    let qid = style.quoted(id);
    let kind = style.kind;
    let semi = style.semi;

    for ident in &entry.idents {
        out.push(format!("{kind} {ident} = require({qid}){semi}"));
    }
    for default in &entry.defaults {
        out.push(format!("{kind} {default} = require({qid}).default{semi}"));
    }
    if !entry.props.is_empty() {
        out.push(require_props_statement(id, &entry.props, style));
    }
    out
}

fn require_props_statement(id: &str, props: &std::collections::BTreeSet<String>, style: &StyleDescriptor) -> String {
    let qid = style.quoted(id);
    let kind = style.kind;
    let semi = style.semi;
    let props: Vec<&str> = props.iter().map(|s| s.as_str()).collect();
    let inline = format!(
        "{kind} {{ {} }} = require({qid}){semi}",
        props.join(", ")
    );
    if inline.len() <= MAX_LINE_LEN {
        return inline;
    }

    let tab = &style.tab;
    let trailing = style.trailing_comma;
    let mut lines = vec![format!("{kind} {{")];
    for (i, prop) in props.iter().enumerate() {
        let comma = if i + 1 == props.len() { trailing } else { "," };
        lines.push(format!("{tab}{prop}{comma}"));
    }
    lines.push(format!("}} = require({qid}){semi}"));
    lines.join("\n")
}

fn compose_import_statements(id: &str, entry: &LibEntry, style: &StyleDescriptor) -> Vec<String> {
    let mut out = Vec::new();
    let qid = style.quoted(id);
    let semi = style.semi;

    let mut defaults: Vec<&String> = entry.defaults.iter().collect();
    let mut idents: Vec<&String> = entry.idents.iter().collect();

    if !entry.props.is_empty() {
        let default_part = if defaults.is_empty() {
            None
        } else {
            Some(defaults.remove(0))
        };
        out.push(import_with_props_statement(default_part, &entry.props, id, style));
        for default in defaults {
            out.push(format!("import {default} from {qid}{semi}"));
        }
        for ident in idents {
            out.push(format!("import * as {ident} from {qid}{semi}"));
        }
        return out;
    }

    let pair_count = defaults.len().max(idents.len());
    let mut defaults_iter = defaults.into_iter();
    let mut idents_iter = idents.into_iter();
    for _ in 0..pair_count {
        let default = defaults_iter.next();
        let ident = idents_iter.next();
        match (default, ident) {
            (Some(default), Some(ident)) => {
                out.push(format!("import {default}, * as {ident} from {qid}{semi}"));
            }
            (Some(default), None) => {
                out.push(format!("import {default} from {qid}{semi}"));
            }
            (None, Some(ident)) => {
                out.push(format!("import * as {ident} from {qid}{semi}"));
            }
            (None, None) => {}
        }
    }
    out
}

fn import_with_props_statement(
    default: Option<&String>,
    props: &std::collections::BTreeSet<String>,
    id: &str,
    style: &StyleDescriptor,
) -> String {
    let qid = style.quoted(id);
    let semi = style.semi;
    let props: Vec<&str> = props.iter().map(|s| s.as_str()).collect();
    let default_prefix = default.map(|d| format!("{d}, ")).unwrap_or_default();

    let inline = format!(
        "import {default_prefix}{{ {} }} from {qid}{semi}",
        props.join(", ")
    );
    if inline.len() <= MAX_LINE_LEN {
        return inline;
    }

    let tab = &style.tab;
    let trailing = style.trailing_comma;
    let mut lines = vec![format!("import {default_prefix}{{")];
    for (i, prop) in props.iter().enumerate() {
        let comma = if i + 1 == props.len() { trailing } else { "," };
        lines.push(format!("{tab}{prop}{comma}"));
    }
    lines.push(format!("}} from {qid}{semi}"));
    lines.join("\n")
}

// ============================================================================
// Tests
// ============================================================================
