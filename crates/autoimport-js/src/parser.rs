//! Parser adapter (component C3): wraps `oxc`'s parser and semantic
//! analysis, exposing the parsed program together with the global scope's
//! unresolved-reference list that the resolver (C8) needs.

use autoimport_core::error::AutoImportError;
use autoimport_core::types::Location;
use oxc_allocator::Allocator;
use oxc_ast::ast::Program;
use oxc_parser::{ParseOptions, Parser};
use oxc_semantic::{Scoping, SemanticBuilder};
use oxc_span::SourceType;

/// A parsed file: its AST plus scope/binding information.
///
/// Owns the arena the AST and scoping data were allocated in; all borrowed
/// data (`program`, `scoping`) is tied to this struct's lifetime.
pub struct ParsedFile<'a> {
    pub program: Program<'a>,
    pub scoping: Scoping,
    pub source_text: &'a str,
}

impl<'a> ParsedFile<'a> {
    /// Identifier names referenced free at global scope: present in
    /// `scoping`'s root unresolved-reference table and therefore not bound
    /// by any in-file declaration.
    pub fn unresolved_global_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .scoping
            .root_unresolved_references()
            .keys()
            .map(|name| name.to_string())
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

/// Parse `source_text` as a module/script, inferring source type from the
/// file extension, and run semantic analysis to build scope/binding data.
///
/// Returns `AutoImportError::ParseError` if the parser reports any errors;
/// per the error-handling policy this aborts the whole invocation.
pub fn parse<'a>(
    allocator: &'a Allocator,
    file_path: &str,
    source_text: &'a str,
) -> Result<ParsedFile<'a>, AutoImportError> {
    let source_type = SourceType::from_path(file_path).unwrap_or_default();

    let parser_ret = Parser::new(allocator, source_text, source_type)
        .with_options(ParseOptions {
            allow_return_outside_function: true,
            ..ParseOptions::default()
        })
        .parse();

    if let Some(first_error) = parser_ret.errors.first() {
        let (line, col) = first_error
            .labels
            .as_ref()
            .and_then(|labels| labels.first())
            .map(|label| offset_to_line_col(source_text, label.offset() as usize))
            .unwrap_or((1, 1));
        return Err(AutoImportError::parse(
            Location::new(file_path, line, col),
            first_error.to_string(),
        ));
    }

    let program = parser_ret.program;
    let semantic_ret = SemanticBuilder::new().build(&program);
    if let Some(first_error) = semantic_ret.errors.first() {
        return Err(AutoImportError::parse(
            Location::new(file_path, 1, 1),
            first_error.to_string(),
        ));
    }

    Ok(ParsedFile {
        program,
        scoping: semantic_ret.semantic.into_scoping(),
        source_text,
    })
}

fn offset_to_line_col(source_text: &str, offset: usize) -> (u32, u32) {
    autoimport_core::text::byte_offset_to_position(source_text, offset)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_module_without_errors() {
        let allocator = Allocator::default();
        let source = "const a = 1;\nfoo(a);\n";
        let parsed = parse(&allocator, "test.js", source).unwrap();
        assert!(parsed.unresolved_global_names().contains(&"foo".to_string()));
        assert!(!parsed.unresolved_global_names().contains(&"a".to_string()));
    }

    #[test]
    fn reports_parse_error_with_location() {
        let allocator = Allocator::default();
        let source = "const a = ;\n";
        let result = parse(&allocator, "broken.js", source);
        assert!(result.is_err());
        match result {
            Err(AutoImportError::ParseError { location, .. }) => {
                assert_eq!(location.file, "broken.js");
            }
            other => panic!("expected ParseError, got {other:?}"),
        }
    }

    #[test]
    fn unresolved_names_excludes_declared_bindings() {
        let allocator = Allocator::default();
        let source = "function helper() { return 1; }\nhelper();\nundeclaredThing();\n";
        let parsed = parse(&allocator, "test.js", source).unwrap();
        let names = parsed.unresolved_global_names();
        assert!(names.contains(&"undeclaredThing".to_string()));
        assert!(!names.contains(&"helper".to_string()));
    }
}
