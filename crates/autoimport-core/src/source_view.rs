//! Source view (component C2): a line-indexed, mutable view of a file that
//! preserves original line numbers while lines are removed around it.
//!
//! `textLines` is 1-indexed with a `""` sentinel at index 0 so that a
//! 1-indexed line number can be used directly as a `Vec` index.

use crate::text::split_lines_1_indexed;
use crate::types::Span;

/// Line-indexed, mutable view over file text (C2).
#[derive(Debug, Clone)]
pub struct SourceView {
    /// 1-indexed lines; `lines[0]` is the `""` sentinel.
    lines: Vec<String>,
    /// Lines marked for removal by the rewriter (C10); line numbers index
    /// into `lines` unchanged so later removals don't shift earlier ones.
    removed: Vec<bool>,
}

impl SourceView {
    /// Build a source view from file content.
    pub fn new(content: &str) -> Self {
        let lines = split_lines_1_indexed(content);
        let removed = vec![false; lines.len()];
        SourceView { lines, removed }
    }

    /// Number of real (non-sentinel) lines.
    pub fn line_count(&self) -> u32 {
        (self.lines.len() as u32).saturating_sub(1)
    }

    /// Text of a 1-indexed line, excluding its line terminator.
    pub fn get_line_text(&self, line: u32) -> &str {
        self.lines
            .get(line as usize)
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Whether the given node's span ends at (or before) the end of its
    /// final line — i.e. there is no further non-whitespace content on that
    /// line after the node. Distinguishes a directive that owns its whole
    /// line from one followed by more code.
    pub fn ends_line(&self, span: &Span, content: &str) -> bool {
        let end = span.end as usize;
        match content[end.min(content.len())..].find('\n') {
            Some(rel) => content[end..end + rel].trim().is_empty(),
            None => content[end.min(content.len())..].trim().is_empty(),
        }
    }

    /// Mark a 1-indexed line for removal.
    pub fn mark_removed(&mut self, line: u32) {
        if let Some(slot) = self.removed.get_mut(line as usize) {
            *slot = true;
        }
    }

    /// Whether a 1-indexed line is marked for removal.
    pub fn is_removed(&self, line: u32) -> bool {
        self.removed.get(line as usize).copied().unwrap_or(false)
    }

    /// Whether a 1-indexed line is whitespace-only (and not marked removed).
    pub fn is_blank(&self, line: u32) -> bool {
        self.get_line_text(line).trim().is_empty()
    }

    /// Emit the file, skipping removed lines, inserting `block` (already
    /// newline-joined, no leading/trailing blank lines of its own) immediately
    /// after `target_line` (0 means "before line 1"). Normalizes to exactly
    /// one trailing newline.
    pub fn render(&self, target_line: u32, block: &str) -> String {
        let mut out = String::new();
        for line in 1..=self.line_count() {
            if line == target_line && !block.is_empty() {
                out.push_str(block);
                out.push('\n');
            }
            if self.is_removed(line) {
                continue;
            }
            out.push_str(self.get_line_text(line));
            out.push('\n');
        }
        if target_line == 0 && !block.is_empty() {
            let mut with_block = String::new();
            with_block.push_str(block);
            with_block.push('\n');
            with_block.push_str(&out);
            out = with_block;
        }
        normalize_trailing_newline(&out)
    }
}

/// Collapse any run of trailing `\n` to exactly one.
fn normalize_trailing_newline(s: &str) -> String {
    if s.is_empty() {
        return "\n".to_string();
    }
    let trimmed = s.trim_end_matches('\n');
    format!("{trimmed}\n")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_line_zero_is_empty() {
        let view = SourceView::new("a\nb\n");
        assert_eq!(view.get_line_text(0), "");
        assert_eq!(view.get_line_text(1), "a");
        assert_eq!(view.get_line_text(2), "b");
    }

    #[test]
    fn line_count_matches_content() {
        let view = SourceView::new("a\nb\nc\n");
        assert_eq!(view.line_count(), 3);
    }

    #[test]
    fn mark_and_check_removed() {
        let mut view = SourceView::new("a\nb\nc\n");
        view.mark_removed(2);
        assert!(view.is_removed(2));
        assert!(!view.is_removed(1));
    }

    #[test]
    fn render_skips_removed_lines_and_inserts_block() {
        let mut view = SourceView::new("import old from 'old';\nfoo();\n");
        view.mark_removed(1);
        let rendered = view.render(0, "const bar = require(\"bar\");");
        assert_eq!(rendered, "const bar = require(\"bar\");\nfoo();\n");
    }

    #[test]
    fn render_normalizes_trailing_newline() {
        let view = SourceView::new("a\nb");
        let rendered = view.render(0, "");
        assert!(rendered.ends_with('\n'));
        assert!(!rendered.ends_with("\n\n"));
    }

    #[test]
    fn ends_line_true_for_directive_alone_on_its_line() {
        let content = "\"use strict\";\nfoo();\n";
        let view = SourceView::new(content);
        let span = Span::new(0, 13); // `"use strict";`
        assert!(view.ends_line(&span, content));
    }

    #[test]
    fn ends_line_false_when_trailing_code_follows() {
        let content = "\"use strict\"; foo();\n";
        let view = SourceView::new(content);
        let span = Span::new(0, 13);
        assert!(!view.ends_line(&span, content));
    }
}
