//! Source rewriter (component C10): merges existing imports with the newly
//! resolved ones, composes the replacement block, and splices it into the
//! original source text.

use std::collections::BTreeSet;
use std::path::Path;

use autoimport_core::source_view::SourceView;
use autoimport_core::style::StyleDescriptor;
use autoimport_core::text::byte_offset_to_position;
use autoimport_core::types::Span;
use oxc_ast::ast::{Expression, Program, Statement};
use oxc_ast::{AstKind, Visit};

use crate::composer::compose;
use crate::layers::imports::{ExistingImport, LibEntry, LibsToAdd};

/// Rewrite `source_text`: remove every existing import statement, merge what
/// they bound with `missing` (the resolver's newly-required names), and
/// splice the single composed block back in at the appropriate spot.
pub fn rewrite(
    source_text: &str,
    program: &Program,
    existing: &[ExistingImport],
    missing: &LibsToAdd,
    style: &StyleDescriptor,
    dir: &Path,
) -> String {
    let used_elsewhere = referenced_names_outside(program, existing);
    let merged = merge_existing_into(missing.clone(), existing, &used_elsewhere);
    let composed = compose(dir, &merged, style);

    let mut view = SourceView::new(source_text);

    let mut removed: BTreeSet<u32> = BTreeSet::new();
    for imp in existing {
        for line in imp.line_start..=imp.line_end {
            removed.insert(line);
        }
    }
    removed = coalesce_removed(&view, removed);

    if composed.is_empty() && !removed.is_empty() {
        if let Some(&max) = removed.iter().max() {
            let trailing = max + 1;
            if trailing <= view.line_count() && view.is_blank(trailing) {
                removed.insert(trailing);
            }
        }
    }

    for line in &removed {
        view.mark_removed(*line);
    }

    let (target_line, block) = splice_point(&mut view, source_text, program, existing, &composed);

    view.render(target_line, &block)
}

/// Union each existing import's still-referenced bound names into `libs`,
/// keyed by the same module id, so the composer re-emits everything still
/// needed rather than only the newly-resolved names. A name that was bound
/// by an import but is never referenced anywhere else in the file is
/// dropped: not as a dedicated unused-import pass, but as the natural
/// consequence of rebuilding the whole block from what's actually used.
fn merge_existing_into(
    mut libs: LibsToAdd,
    existing: &[ExistingImport],
    used_elsewhere: &BTreeSet<String>,
) -> LibsToAdd {
    for imp in existing {
        let entry = libs.entry(imp.dep_id.clone()).or_insert_with(LibEntry::default);
        entry
            .idents
            .extend(imp.idents.iter().filter(|n| used_elsewhere.contains(*n)).cloned());
        entry.defaults.extend(
            imp.defaults
                .iter()
                .filter(|n| used_elsewhere.contains(*n))
                .cloned(),
        );
        entry
            .props
            .extend(imp.props.iter().filter(|n| used_elsewhere.contains(*n)).cloned());
    }
    libs
}

/// Every plain identifier-reference name in the program, excluding
/// references that fall inside one of the existing import statements'
/// own spans (so an import's own binding/call doesn't count as a "use").
fn referenced_names_outside(program: &Program, existing: &[ExistingImport]) -> BTreeSet<String> {
    struct Collector<'b> {
        names: BTreeSet<String>,
        exclude: &'b [ExistingImport],
    }

    impl<'a, 'b> Visit<'a> for Collector<'b> {
        fn enter_node(&mut self, kind: AstKind<'a>) {
            if let AstKind::IdentifierReference(ident) = kind {
                let start = ident.span.start;
                let inside_import = self
                    .exclude
                    .iter()
                    .any(|imp| start >= imp.span.start && start < imp.span.end);
                if !inside_import {
                    self.names.insert(ident.name.to_string());
                }
            }
        }
    }

    let mut collector = Collector {
        names: BTreeSet::new(),
        exclude: existing,
    };
    collector.visit_program(program);
    collector.names
}

/// Extend `removed` so that any gap between two removed lines made up
/// entirely of whitespace-only lines is removed too.
fn coalesce_removed(view: &SourceView, mut removed: BTreeSet<u32>) -> BTreeSet<u32> {
    loop {
        let runs = to_runs(&removed);
        let mut changed = false;
        for pair in runs.windows(2) {
            let (_, end_a) = pair[0];
            let (start_b, _) = pair[1];
            if start_b > end_a + 1 {
                let between: Vec<u32> = (end_a + 1..start_b).collect();
                if between.iter().all(|&l| view.is_blank(l)) {
                    removed.extend(between);
                    changed = true;
                    break;
                }
            }
        }
        if !changed {
            break;
        }
    }
    removed
}

/// Collapse a sorted set of line numbers into maximal consecutive runs.
fn to_runs(lines: &BTreeSet<u32>) -> Vec<(u32, u32)> {
    let mut runs = Vec::new();
    let mut iter = lines.iter().copied();
    let Some(first) = iter.next() else {
        return runs;
    };
    let mut start = first;
    let mut end = first;
    for line in iter {
        if line == end + 1 {
            end = line;
        } else {
            runs.push((start, end));
            start = line;
            end = line;
        }
    }
    runs.push((start, end));
    runs
}

/// Decide where the composed block goes and what text to insert there.
fn splice_point(
    view: &mut SourceView,
    source_text: &str,
    program: &Program,
    existing: &[ExistingImport],
    composed: &str,
) -> (u32, String) {
    if let Some(first_line) = existing.iter().map(|imp| imp.line_start).min() {
        return (first_line, composed.to_string());
    }

    if composed.is_empty() {
        return (0, String::new());
    }

    match leading_directive_span(program) {
        Some(span) => {
            let (directive_line, _) = byte_offset_to_position(source_text, span.start as usize);
            if view.ends_line(&span, source_text) {
                (directive_line + 1, format!("\n{composed}\n"))
            } else {
                let (_, end_col) = byte_offset_to_position(source_text, span.end as usize);
                let line_text = view.get_line_text(directive_line).to_string();
                let split_at = (end_col as usize).saturating_sub(1);
                let prefix: String = line_text.chars().take(split_at).collect();
                let suffix: String = line_text.chars().skip(split_at).collect();
                view.mark_removed(directive_line);
                (directive_line, format!("{prefix}\n\n{composed}\n\n{suffix}"))
            }
        }
        None => (0, composed.to_string()),
    }
}

/// A leading string-literal expression statement (`"use strict";`), if the
/// file's very first statement is one.
fn leading_directive_span(program: &Program) -> Option<Span> {
    use oxc_span::GetSpan;

    let first = program.body.first()?;
    let Statement::ExpressionStatement(expr_stmt) = first else {
        return None;
    };
    match &expr_stmt.expression {
        Expression::StringLiteral(_) => Some(Span::new(expr_stmt.span().start, expr_stmt.span().end)),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::imports::ModuleId;
    use oxc_allocator::Allocator;
    use oxc_parser::Parser;
    use oxc_span::SourceType;

    fn parse<'a>(allocator: &'a Allocator, source: &'a str) -> Program<'a> {
        let source_type = SourceType::from_path("test.cjs").unwrap_or_default();
        Parser::new(allocator, source, source_type).parse().program
    }

    fn entry(idents: &[&str]) -> LibEntry {
        LibEntry {
            idents: idents.iter().map(|s| s.to_string()).collect(),
            defaults: Default::default(),
            props: Default::default(),
        }
    }

    #[test]
    fn scenario_e_directive_on_own_line() {
        let allocator = Allocator::default();
        let source = "\"use strict\";\nfoo();\n";
        let program = parse(&allocator, source);
        let mut libs = LibsToAdd::new();
        libs.insert(ModuleId::new("bar"), entry(&["bar"]));
        let style = StyleDescriptor::default();
        let out = rewrite(source, &program, &[], &libs, &style, Path::new("/proj"));
        assert_eq!(
            out,
            "\"use strict\";\n\nconst bar = require(\"bar\");\n\nfoo();\n"
        );
    }

    #[test]
    fn no_existing_imports_and_no_directive_prepends() {
        let allocator = Allocator::default();
        let source = "foo();\n";
        let program = parse(&allocator, source);
        let mut libs = LibsToAdd::new();
        libs.insert(ModuleId::new("bar"), entry(&["bar"]));
        let style = StyleDescriptor::default();
        let out = rewrite(source, &program, &[], &libs, &style, Path::new("/proj"));
        assert_eq!(out, "const bar = require(\"bar\");\nfoo();\n");
    }

    #[test]
    fn empty_libs_and_no_existing_imports_is_noop() {
        let allocator = Allocator::default();
        let source = "foo();\n";
        let program = parse(&allocator, source);
        let libs = LibsToAdd::new();
        let style = StyleDescriptor::default();
        let out = rewrite(source, &program, &[], &libs, &style, Path::new("/proj"));
        assert_eq!(out, source);
    }

    #[test]
    fn replaces_existing_import_in_place() {
        let allocator = Allocator::default();
        let source = "const old = require(\"old\");\nfoo(old);\n";
        let program = parse(&allocator, source);
        let existing = vec![ExistingImport {
            span: Span::new(0, 28),
            line_start: 1,
            line_end: 1,
            dep_id: ModuleId::new("old"),
            idents: vec!["old".to_string()],
            defaults: vec![],
            props: vec![],
        }];
        let libs = LibsToAdd::new();
        let style = StyleDescriptor::default();
        let out = rewrite(source, &program, &existing, &libs, &style, Path::new("/proj"));
        assert_eq!(out, "const old = require(\"old\");\nfoo(old);\n");
    }

    #[test]
    fn removes_all_imports_and_trailing_blank_when_nothing_to_add() {
        let allocator = Allocator::default();
        let source = "const unused = require(\"unused\");\n\nfoo();\n";
        let program = parse(&allocator, source);
        let existing = vec![ExistingImport {
            span: Span::new(0, 34),
            line_start: 1,
            line_end: 1,
            dep_id: ModuleId::new("unused"),
            idents: vec!["unused".to_string()],
            defaults: vec![],
            props: vec![],
        }];
        let libs = LibsToAdd::new();
        let style = StyleDescriptor::default();
        let out = rewrite(source, &program, &existing, &libs, &style, Path::new("/proj"));
        assert_eq!(out, "foo();\n");
    }

    #[test]
    fn output_always_ends_with_single_newline() {
        let allocator = Allocator::default();
        let source = "foo()";
        let program = parse(&allocator, source);
        let libs = LibsToAdd::new();
        let style = StyleDescriptor::default();
        let out = rewrite(source, &program, &[], &libs, &style, Path::new("/proj"));
        assert!(out.ends_with('\n'));
        assert!(!out.ends_with("\n\n"));
    }
}
