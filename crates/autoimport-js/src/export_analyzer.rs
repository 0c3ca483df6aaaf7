//! Export analyzer (component C5): statically determines which identifiers
//! a project source file exports, from `module.exports`/`exports.K`
//! assignments and ES `export` declarations.

use std::collections::BTreeMap;

use oxc_ast::ast::{
    BindingPatternKind, Declaration, Expression, ModuleExportName, ObjectPropertyKind, Program,
    PropertyKey, Statement,
};

/// Result of statically analyzing one project file's exports.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileExports {
    pub idents: Vec<String>,
    pub defaults: Vec<String>,
    pub props: Vec<String>,
    pub has_exports: bool,
}

/// Tracks, per locally-declared identifier, the property keys it has
/// accumulated via `x.k = …` assignments or an object-literal initializer,
/// so that `module.exports = x` can report the right `props`.
#[derive(Default)]
struct TrackedObjects {
    props_by_ident: BTreeMap<String, Vec<String>>,
}

impl TrackedObjects {
    fn reset(&mut self, ident: &str) {
        self.props_by_ident.insert(ident.to_string(), Vec::new());
    }

    fn add_prop(&mut self, ident: &str, prop: &str) {
        self.props_by_ident
            .entry(ident.to_string())
            .or_default()
            .push(prop.to_string());
    }

    fn props_of(&self, ident: &str) -> Vec<String> {
        self.props_by_ident.get(ident).cloned().unwrap_or_default()
    }
}

/// Analyze a parsed project file's top-level statements for its exports.
pub fn analyze_exports(program: &Program) -> FileExports {
    let mut result = FileExports::default();
    let mut tracked = TrackedObjects::default();
    let mut has_default = false;

    for stmt in &program.body {
        match stmt {
            Statement::VariableDeclaration(var_decl) => {
                for declarator in &var_decl.declarations {
                    let Some(name) = declarator.id.get_identifier_name() else {
                        continue;
                    };
                    match &declarator.init {
                        Some(Expression::ObjectExpression(obj)) => {
                            tracked.reset(&name);
                            for key in object_literal_keys(obj) {
                                tracked.add_prop(&name, &key);
                            }
                        }
                        Some(Expression::Identifier(source_ident)) => {
                            // `const y = x;` aliases the tracked props.
                            let props = tracked.props_of(source_ident.name.as_str());
                            tracked.reset(&name);
                            for p in props {
                                tracked.add_prop(&name, &p);
                            }
                        }
                        _ => {
                            tracked.reset(&name);
                        }
                    }
                }
            }

            Statement::ExpressionStatement(expr_stmt) => {
                if let Expression::AssignmentExpression(assign) = &expr_stmt.expression {
                    handle_assignment(assign, &mut result, &mut tracked, &mut has_default);
                }
            }

            Statement::ExportNamedDeclaration(export) => {
                result.has_exports = true;
                if let Some(decl) = &export.declaration {
                    for name in declaration_bound_names(decl) {
                        result.props.push(name);
                    }
                }
                for spec in &export.specifiers {
                    let exported_name = module_export_name(&spec.exported);
                    if exported_name == "default" {
                        let local = module_export_name(&spec.local);
                        result.idents.push(local);
                        has_default = true;
                    } else {
                        result.props.push(exported_name);
                    }
                }
            }

            Statement::ExportDefaultDeclaration(export) => {
                result.has_exports = true;
                has_default = true;
                use oxc_ast::ast::ExportDefaultDeclarationKind as K;
                match &export.declaration {
                    K::FunctionDeclaration(func) => {
                        if let Some(id) = &func.id {
                            result.idents.push(id.name.to_string());
                        }
                    }
                    K::ClassDeclaration(class) => {
                        if let Some(id) = &class.id {
                            result.idents.push(id.name.to_string());
                        }
                    }
                    K::Expression(Expression::Identifier(ident)) => {
                        result.idents.push(ident.name.to_string());
                    }
                    _ => {}
                }
            }

            Statement::ExportAllDeclaration(_) => {
                result.has_exports = true;
            }

            _ => {}
        }
    }

    if has_default {
        let idents = std::mem::take(&mut result.idents);
        result.defaults.extend(idents);
    }

    dedup_sorted(&mut result.idents);
    dedup_sorted(&mut result.defaults);
    dedup_sorted(&mut result.props);
    result
}

fn handle_assignment(
    assign: &oxc_ast::ast::AssignmentExpression,
    result: &mut FileExports,
    tracked: &mut TrackedObjects,
    has_default: &mut bool,
) {
    use oxc_ast::ast::AssignmentTarget;

    // Re-assignment of a bare identifier to a fresh object literal resets
    // whatever props it had accumulated so far (scenario D).
    if let AssignmentTarget::AssignmentTargetIdentifier(ident) = &assign.left {
        if let Expression::ObjectExpression(obj) = &assign.right {
            tracked.reset(&ident.name);
            for key in object_literal_keys(obj) {
                tracked.add_prop(&ident.name, &key);
            }
        }
        return;
    }

    let Some(path) = member_assignment_path(&assign.left) else {
        return;
    };

    match path.as_slice() {
        // `module.exports = ...`
        [base, "exports"] if base == "module" => {
            result.has_exports = true;
            apply_module_exports_value(&assign.right, result, tracked, has_default);
        }
        // `exports.K = ...` / `module.exports.K = ...`
        [base, key] if base == "exports" => {
            result.has_exports = true;
            result.props.push((*key).to_string());
        }
        [base, "exports", key] if base == "module" => {
            result.has_exports = true;
            result.props.push((*key).to_string());
        }
        // `x.k = ...` tracked-object mutation.
        [ident, key] => {
            tracked.add_prop(ident, key);
        }
        _ => {}
    }
}

fn apply_module_exports_value(
    value: &Expression,
    result: &mut FileExports,
    tracked: &mut TrackedObjects,
    has_default: &mut bool,
) {
    match value {
        Expression::Identifier(ident) => {
            let name = ident.name.to_string();
            result.idents.push(name.clone());
            result.props.extend(tracked.props_of(&name));
        }
        // A named function/constructor/member replacing the whole module's
        // value is the CommonJS shape of a single default export.
        Expression::FunctionExpression(func) => {
            if let Some(id) = &func.id {
                result.idents.push(id.name.to_string());
                *has_default = true;
            }
        }
        Expression::NewExpression(new_expr) => {
            if let Expression::Identifier(callee) = &new_expr.callee {
                result.idents.push(callee.name.to_string());
                *has_default = true;
            }
        }
        Expression::StaticMemberExpression(member) => {
            result.idents.push(member.property.name.to_string());
            *has_default = true;
        }
        Expression::ObjectExpression(obj) => {
            result.props.extend(object_literal_keys(obj));
        }
        _ => {}
    }
}

/// Flatten a simple `a.b`, `a.b.c` member-assignment target into its
/// dotted path segments, or `None` for anything more complex (computed
/// access, non-identifier base).
fn member_assignment_path<'a>(
    target: &'a oxc_ast::ast::AssignmentTarget<'a>,
) -> Option<Vec<&'a str>> {
    use oxc_ast::ast::AssignmentTarget;

    fn walk_object<'a>(expr: &'a Expression<'a>, path: &mut Vec<&'a str>) -> bool {
        match expr {
            Expression::Identifier(ident) => {
                path.push(ident.name.as_str());
                true
            }
            Expression::StaticMemberExpression(member) => {
                if walk_object(&member.object, path) {
                    path.push(member.property.name.as_str());
                    true
                } else {
                    false
                }
            }
            _ => false,
        }
    }

    match target {
        AssignmentTarget::StaticMemberExpression(member) => {
            let mut path = Vec::new();
            if walk_object(&member.object, &mut path) {
                path.push(member.property.name.as_str());
                Some(path)
            } else {
                None
            }
        }
        _ => None,
    }
}

fn object_literal_keys(obj: &oxc_ast::ast::ObjectExpression) -> Vec<String> {
    let mut keys = Vec::new();
    for prop in &obj.properties {
        if let ObjectPropertyKind::ObjectProperty(p) = prop {
            if let Some(name) = property_key_name(&p.key) {
                keys.push(name);
            }
        }
    }
    keys
}

fn property_key_name(key: &PropertyKey) -> Option<String> {
    match key {
        PropertyKey::StaticIdentifier(ident) => Some(ident.name.to_string()),
        PropertyKey::StringLiteral(lit) => Some(lit.value.to_string()),
        _ => None,
    }
}

fn module_export_name(name: &ModuleExportName) -> String {
    match name {
        ModuleExportName::IdentifierName(id) => id.name.to_string(),
        ModuleExportName::IdentifierReference(id) => id.name.to_string(),
        ModuleExportName::StringLiteral(lit) => lit.value.to_string(),
    }
}

fn declaration_bound_names(decl: &Declaration) -> Vec<String> {
    let mut names = Vec::new();
    match decl {
        Declaration::VariableDeclaration(var_decl) => {
            for declarator in &var_decl.declarations {
                if let BindingPatternKind::BindingIdentifier(id) = &declarator.id.kind {
                    names.push(id.name.to_string());
                }
            }
        }
        Declaration::FunctionDeclaration(func) => {
            if let Some(id) = &func.id {
                names.push(id.name.to_string());
            }
        }
        Declaration::ClassDeclaration(class) => {
            if let Some(id) = &class.id {
                names.push(id.name.to_string());
            }
        }
        _ => {}
    }
    names
}

fn dedup_sorted(v: &mut Vec<String>) {
    v.sort();
    v.dedup();
}

// ============================================================================
// Tests — scenarios A-D from the export-analyzer fixtures.
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use oxc_allocator::Allocator;
    use oxc_parser::Parser;
    use oxc_span::SourceType;

    fn analyze(source: &str) -> FileExports {
        let allocator = Allocator::default();
        let source_type = SourceType::from_path("test.cjs").unwrap_or_default();
        let program = Parser::new(&allocator, source, source_type).parse().program;
        analyze_exports(&program)
    }

    #[test]
    fn scenario_a_promote_to_default_function() {
        let exports = analyze("module.exports = function foo() {};");
        assert!(exports.idents.is_empty());
        assert_eq!(exports.defaults, vec!["foo".to_string()]);
        assert!(exports.has_exports);
    }

    #[test]
    fn scenario_b_object_literal_export() {
        let exports = analyze("module.exports = { a: 3, b() {}, c: true };");
        assert_eq!(
            exports.props,
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
    }

    #[test]
    fn scenario_c_assign_then_mutate() {
        let exports = analyze(
            "const x = {}; x.a = 3; x.b = () => {}; x.c = true; module.exports = x;",
        );
        assert_eq!(exports.idents, vec!["x".to_string()]);
        assert_eq!(
            exports.props,
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
    }

    #[test]
    fn scenario_d_overwrite_resets() {
        let exports = analyze(
            "const x = {}; x.a=3; x.b=()=>{}; x.c=true; x={d:\"hi\"}; const y=x; module.exports=y;",
        );
        assert_eq!(exports.idents, vec!["y".to_string()]);
        assert_eq!(exports.props, vec!["d".to_string()]);
    }

    #[test]
    fn exports_dot_prop_assignment() {
        let exports = analyze("exports.helper = () => {};");
        assert_eq!(exports.props, vec!["helper".to_string()]);
    }

    #[test]
    fn es_export_default_identifier() {
        let exports = analyze("function foo() {}\nexport default foo;");
        assert!(exports.idents.is_empty());
        assert_eq!(exports.defaults, vec!["foo".to_string()]);
    }

    #[test]
    fn es_export_named_declarations() {
        let exports = analyze("export const a = 1;\nexport function b() {}\n");
        let mut props = exports.props.clone();
        props.sort();
        assert_eq!(props, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn es_export_as_default() {
        let exports = analyze("function foo() {}\nexport { foo as default };\n");
        assert!(exports.idents.is_empty());
        assert_eq!(exports.defaults, vec!["foo".to_string()]);
    }
}
