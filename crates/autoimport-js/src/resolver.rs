//! Identifier resolver (component C8): from a parsed file's free global-scope
//! references, determines which names are actually missing an import and
//! can be satisfied by the dependency registry.

use std::collections::{BTreeMap, BTreeSet};

use oxc_ast::ast::{AssignmentTarget, Expression, UnaryOperator};
use oxc_ast::{AstKind, Visit};

use crate::layers::imports::{DepInfo, ExportKind, ExistingImport, LibEntry, LibsToAdd, ModuleId};
use crate::parser::ParsedFile;

/// A name lookup into the dependency registry: given an identifier, returns
/// where it can be imported from, or `None` if nothing provides it.
pub trait Lookup {
    fn search(&self, name: &str) -> Option<DepInfo>;
}

impl<F: Fn(&str) -> Option<DepInfo>> Lookup for F {
    fn search(&self, name: &str) -> Option<DepInfo> {
        self(name)
    }
}

/// Walks the whole AST (not just top-level statements, unlike C4/C5) to find
/// names that must be excluded from import candidates even though they are
/// free at global scope: `typeof` operands and the write target of a bare
/// assignment to an undeclared variable.
///
/// Tracked per occurrence (keyed by byte offset), not per name: a name is
/// only guarded if *every* reference to it is a `typeof` operand or write
/// target. A name used both under `typeof` and elsewhere (e.g. the
/// `typeof foo === 'function' && foo()` feature-detect idiom) must still
/// resolve to an import for the non-guarded use.
#[derive(Default)]
struct GuardedNames<'a> {
    refs_by_name: BTreeMap<&'a str, BTreeSet<u32>>,
    guarded_spans: BTreeSet<u32>,
}

impl<'a> GuardedNames<'a> {
    fn mark(&mut self, name: &'a str, span_start: u32) {
        self.refs_by_name.entry(name).or_default().insert(span_start);
    }

    /// A name is safe to drop only when every reference to it observed
    /// anywhere in the file is guarded.
    fn is_fully_guarded(&self, name: &str) -> bool {
        match self.refs_by_name.get(name) {
            Some(spans) => !spans.is_empty() && spans.iter().all(|s| self.guarded_spans.contains(s)),
            None => false,
        }
    }
}

impl<'a> Visit<'a> for GuardedNames<'a> {
    /// `enter_node` is invoked for every node the default traversal visits;
    /// overriding only this (rather than per-type `visit_*` methods) keeps
    /// the walk itself untouched and just observes it.
    fn enter_node(&mut self, kind: AstKind<'a>) {
        match kind {
            AstKind::IdentifierReference(ident) => {
                self.mark(ident.name.as_str(), ident.span.start);
            }
            AstKind::UnaryExpression(expr) if expr.operator == UnaryOperator::Typeof => {
                if let Expression::Identifier(ident) = &expr.argument {
                    self.mark(ident.name.as_str(), ident.span.start);
                    self.guarded_spans.insert(ident.span.start);
                }
            }
            AstKind::AssignmentExpression(expr) => {
                if let AssignmentTarget::AssignmentTargetIdentifier(ident) = &expr.left {
                    self.mark(ident.name.as_str(), ident.span.start);
                    self.guarded_spans.insert(ident.span.start);
                }
            }
            _ => {}
        }
    }
}

/// Determine the identifiers this file references but does not declare,
/// excluding names already covered by an existing import/require and names
/// guarded by the `typeof` rule or undeclared-write rule, then resolve each
/// surviving name through `lookup`.
pub fn resolve_missing(
    parsed: &ParsedFile,
    existing: &[ExistingImport],
    lookup: &impl Lookup,
) -> LibsToAdd {
    let mut guard = GuardedNames::default();
    guard.visit_program(&parsed.program);

    let already_imported: BTreeSet<&str> = existing
        .iter()
        .flat_map(|imp| {
            imp.idents
                .iter()
                .chain(imp.defaults.iter())
                .chain(imp.props.iter())
        })
        .map(|s| s.as_str())
        .collect();

    let mut libs: LibsToAdd = LibsToAdd::new();

    for name in parsed.unresolved_global_names() {
        if already_imported.contains(name.as_str()) {
            continue;
        }
        if guard.is_fully_guarded(name.as_str()) {
            continue;
        }
        let Some(dep) = lookup.search(&name) else {
            continue;
        };

        let entry = libs.entry(dep.id.clone()).or_insert_with(LibEntry::default);
        match dep.kind {
            ExportKind::Ident => {
                entry.idents.insert(name);
            }
            ExportKind::Default => {
                entry.defaults.insert(name);
            }
            ExportKind::Prop => {
                entry.props.insert(name);
            }
        }
    }

    libs.retain(|_, entry| !entry.is_empty());
    libs
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::imports::Priority;
    use crate::parser::parse;
    use oxc_allocator::Allocator;

    fn fake_registry(name: &str) -> Option<DepInfo> {
        match name {
            "foo" => Some(DepInfo {
                id: ModuleId::new("foo-lib"),
                priority: Priority::Declared,
                kind: ExportKind::Ident,
            }),
            "bar" => Some(DepInfo {
                id: ModuleId::new("bar-lib"),
                priority: Priority::Declared,
                kind: ExportKind::Prop,
            }),
            _ => None,
        }
    }

    #[test]
    fn resolves_plain_missing_identifier() {
        let allocator = Allocator::default();
        let source = "foo();\n";
        let parsed = parse(&allocator, "test.js", source).unwrap();
        let libs = resolve_missing(&parsed, &[], &fake_registry);
        let entry = libs.get(&ModuleId::new("foo-lib")).unwrap();
        assert!(entry.idents.contains("foo"));
    }

    #[test]
    fn excludes_typeof_operand() {
        let allocator = Allocator::default();
        let source = "if (typeof foo === 'function') { foo(); }\n";
        let parsed = parse(&allocator, "test.js", source).unwrap();
        let libs = resolve_missing(&parsed, &[], &fake_registry);
        // `foo` is still called outside the typeof, so it's still missing —
        // the guard only matters when the *only* use is the typeof check.
        assert!(libs.contains_key(&ModuleId::new("foo-lib")));
    }

    #[test]
    fn excludes_pure_typeof_check() {
        let allocator = Allocator::default();
        let source = "if (typeof foo === 'function') { console.log('ok'); }\n";
        let parsed = parse(&allocator, "test.js", source).unwrap();
        let libs = resolve_missing(&parsed, &[], &fake_registry);
        assert!(!libs.contains_key(&ModuleId::new("foo-lib")));
    }

    #[test]
    fn excludes_undeclared_write_target() {
        let allocator = Allocator::default();
        let source = "bar = 3;\n";
        let parsed = parse(&allocator, "test.js", source).unwrap();
        let libs = resolve_missing(&parsed, &[], &fake_registry);
        assert!(libs.is_empty());
    }

    #[test]
    fn excludes_names_already_imported() {
        let allocator = Allocator::default();
        let source = "foo();\n";
        let parsed = parse(&allocator, "test.js", source).unwrap();
        let existing = vec![ExistingImport {
            span: autoimport_core::types::Span::new(0, 0),
            line_start: 1,
            line_end: 1,
            dep_id: ModuleId::new("foo-lib"),
            idents: vec!["foo".to_string()],
            defaults: vec![],
            props: vec![],
        }];
        let libs = resolve_missing(&parsed, &existing, &fake_registry);
        assert!(libs.is_empty());
    }

    #[test]
    fn unresolvable_names_are_dropped() {
        let allocator = Allocator::default();
        let source = "somethingNobodyExports();\n";
        let parsed = parse(&allocator, "test.js", source).unwrap();
        let libs = resolve_missing(&parsed, &[], &fake_registry);
        assert!(libs.is_empty());
    }
}
