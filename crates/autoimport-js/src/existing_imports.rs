//! Existing-import extractor (component C4): visits the top-level statements
//! of a parsed file and collects every import/require statement along with
//! the exact destructured shape it used (default / namespace / named props /
//! bare idents).

use autoimport_core::text::span_to_line_range;
use oxc_ast::ast::{
    BindingPatternKind, Expression, ImportDeclarationSpecifier, Program, PropertyKey, Statement,
};
use oxc_span::GetSpan;

use crate::layers::imports::{ExistingImport, ModuleId};

/// Collect existing import/require statements from a program's top-level
/// statements, in source order.
pub fn extract_existing_imports(program: &Program, source_text: &str) -> Vec<ExistingImport> {
    let mut found = Vec::new();
    for stmt in &program.body {
        match stmt {
            Statement::ImportDeclaration(import) => {
                let dep_id = ModuleId::new(import.source.value.as_str());
                let mut idents = Vec::new();
                let mut defaults = Vec::new();
                let mut props = Vec::new();

                if let Some(specifiers) = &import.specifiers {
                    for spec in specifiers {
                        match spec {
                            ImportDeclarationSpecifier::ImportDefaultSpecifier(default_spec) => {
                                defaults.push(default_spec.local.name.to_string());
                            }
                            ImportDeclarationSpecifier::ImportNamespaceSpecifier(ns_spec) => {
                                idents.push(ns_spec.local.name.to_string());
                            }
                            ImportDeclarationSpecifier::ImportSpecifier(named) => {
                                props.push(named.local.name.to_string());
                            }
                        }
                    }
                }

                let span = core_span(import.span());
                let (line_start, line_end) = span_to_line_range(source_text, &span);
                found.push(ExistingImport {
                    span,
                    line_start,
                    line_end,
                    dep_id,
                    idents,
                    defaults,
                    props,
                });
            }

            Statement::VariableDeclaration(var_decl) => {
                for declarator in &var_decl.declarations {
                    let Some(init) = &declarator.init else {
                        continue;
                    };
                    let Some((dep_id, is_default_access)) = require_call_target(init) else {
                        continue;
                    };

                    let mut idents = Vec::new();
                    let mut defaults = Vec::new();
                    let mut props = Vec::new();

                    match &declarator.id.kind {
                        BindingPatternKind::BindingIdentifier(id) => {
                            if is_default_access {
                                defaults.push(id.name.to_string());
                            } else {
                                idents.push(id.name.to_string());
                            }
                        }
                        BindingPatternKind::ObjectPattern(obj) => {
                            for prop in &obj.properties {
                                if let Some(name) = property_key_name(&prop.key) {
                                    props.push(name);
                                }
                            }
                        }
                        _ => continue,
                    }

                    let span = core_span(var_decl.span());
                    let (line_start, line_end) = span_to_line_range(source_text, &span);
                    found.push(ExistingImport {
                        span,
                        line_start,
                        line_end,
                        dep_id,
                        idents,
                        defaults,
                        props,
                    });
                }
            }

            _ => {}
        }
    }
    found
}

/// Recognize `require(id)` and `require(id).default`, returning the module
/// id and whether `.default` was accessed.
fn require_call_target(expr: &Expression) -> Option<(ModuleId, bool)> {
    match expr {
        Expression::CallExpression(call) => {
            let Expression::Identifier(callee) = &call.callee else {
                return None;
            };
            if callee.name != "require" {
                return None;
            }
            let first_arg = call.arguments.first()?;
            let arg_expr = first_arg.as_expression()?;
            let Expression::StringLiteral(lit) = arg_expr else {
                return None;
            };
            Some((ModuleId::new(lit.value.as_str()), false))
        }
        Expression::StaticMemberExpression(member) => {
            if member.property.name != "default" {
                return None;
            }
            let (id, _) = require_call_target(&member.object)?;
            Some((id, true))
        }
        _ => None,
    }
}

fn property_key_name(key: &PropertyKey) -> Option<String> {
    match key {
        PropertyKey::StaticIdentifier(ident) => Some(ident.name.to_string()),
        PropertyKey::StringLiteral(lit) => Some(lit.value.to_string()),
        _ => None,
    }
}

fn core_span(span: oxc_span::Span) -> autoimport_core::types::Span {
    autoimport_core::types::Span::new(span.start, span.end)
}

// ============================================================================
// Tests
// ============================================================================
