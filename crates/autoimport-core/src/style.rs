//! Style descriptor (component C1): the bundle of formatting preferences
//! detected from an input file.
//!
//! Detection itself (walking the AST/tokens to infer quote/semicolon/indent
//! conventions) is normally an external collaborator — this module only
//! owns the descriptor type and its defaults, plus a conservative heuristic
//! detector good enough to drive the composer (C9) end to end.

use std::fmt;

/// The `require`/`import` keyword a file prefers for new statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequireKeyword {
    /// CommonJS `require(...)`.
    Require,
    /// ES module `import ... from ...`.
    Import,
}

/// The declaration keyword used to bind a required/imported value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Const,
    Let,
    Var,
}

impl fmt::Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeclKind::Const => "const",
            DeclKind::Let => "let",
            DeclKind::Var => "var",
        };
        write!(f, "{}", s)
    }
}

/// Quote character used for string literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteStyle {
    Single,
    Double,
}

impl QuoteStyle {
    pub fn as_char(&self) -> char {
        match self {
            QuoteStyle::Single => '\'',
            QuoteStyle::Double => '"',
        }
    }
}

/// Bundle of formatting options detected from the input file (C1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleDescriptor {
    pub require_keyword: RequireKeyword,
    pub kind: DeclKind,
    pub quote: QuoteStyle,
    /// Statement terminator: `";"` or `""`.
    pub semi: &'static str,
    /// One level of indentation, e.g. `"  "` or `"\t"`.
    pub tab: String,
    /// Trailing comma on the last element of a multiline destructure: `","` or `""`.
    pub trailing_comma: &'static str,
}

impl Default for StyleDescriptor {
    fn default() -> Self {
        StyleDescriptor {
            require_keyword: RequireKeyword::Require,
            kind: DeclKind::Const,
            quote: QuoteStyle::Double,
            semi: ";",
            tab: "  ".to_string(),
            trailing_comma: ",",
        }
    }
}

impl StyleDescriptor {
    /// Wrap a module id in this style's quote character.
    pub fn quoted(&self, module_id: &str) -> String {
        let q = self.quote.as_char();
        format!("{q}{module_id}{q}")
    }

    /// Conservative style detection from raw source text.
    ///
    /// Counts occurrences of each candidate convention across the first
    /// `require`/`import` statements found and majority-votes; falls back to
    /// [`StyleDescriptor::default`] fields when a convention isn't observed
    /// at all. Good enough to drive the composer without requiring a full
    /// external style-detection visitor.
    pub fn detect(content: &str) -> Self {
        let mut default = StyleDescriptor::default();

        let single_quotes = content.matches('\'').count();
        let double_quotes = content.matches('"').count();
        if single_quotes > double_quotes {
            default.quote = QuoteStyle::Single;
        }

        let has_import = content.contains("import ") || content.contains("import{");
        let has_require = content.contains("require(");
        if has_import && !has_require {
            default.require_keyword = RequireKeyword::Import;
        }

        if content.contains("\nlet ") || content.starts_with("let ") {
            default.kind = DeclKind::Let;
        } else if content.contains("\nvar ") || content.starts_with("var ") {
            default.kind = DeclKind::Var;
        }

        if !content.contains(';') && (has_import || has_require) {
            default.semi = "";
        }

        if content.contains("\t") {
            default.tab = "\t".to_string();
        }

        if content.contains(",\n}") || content.contains(",\n)") {
            default.trailing_comma = ",";
        } else if has_import || has_require {
            default.trailing_comma = "";
        }

        default
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_style_is_require_const_double_semi() {
        let style = StyleDescriptor::default();
        assert_eq!(style.require_keyword, RequireKeyword::Require);
        assert_eq!(style.kind, DeclKind::Const);
        assert_eq!(style.quote, QuoteStyle::Double);
        assert_eq!(style.semi, ";");
    }

    #[test]
    fn quoted_uses_detected_quote_char() {
        let mut style = StyleDescriptor::default();
        style.quote = QuoteStyle::Single;
        assert_eq!(style.quoted("bar"), "'bar'");
    }

    #[test]
    fn detect_prefers_import_when_no_require_present() {
        let style = StyleDescriptor::detect("import foo from 'foo'\nfoo()\n");
        assert_eq!(style.require_keyword, RequireKeyword::Import);
        assert_eq!(style.quote, QuoteStyle::Single);
        assert_eq!(style.semi, "");
    }

    #[test]
    fn detect_keeps_require_when_both_present_and_require_used_more() {
        let content = "const a = require('a');\nconst b = require('b');\n";
        let style = StyleDescriptor::detect(content);
        assert_eq!(style.require_keyword, RequireKeyword::Require);
        assert_eq!(style.semi, ";");
    }

    #[test]
    fn detect_picks_up_tab_indentation() {
        let style = StyleDescriptor::detect("function f() {\n\treturn 1;\n}\n");
        assert_eq!(style.tab, "\t");
    }
}
