//! Text position utilities for byte offset and line:column conversions.
//!
//! ## Coordinate Conventions
//!
//! - Lines and columns are **1-indexed** (matching editor conventions)
//! - Byte offsets are **0-indexed**
//! - Line/column values of 0 are treated as 1 (defensive clamping)
//!
//! Columns count Unicode scalar values (chars), not bytes, since source
//! locations reported by the parser adapter use 0-indexed columns over
//! `&str` content.

use crate::types::Span;

/// Convert a byte offset to 1-indexed line and column (Unicode-aware).
pub fn byte_offset_to_position(content: &str, offset: usize) -> (u32, u32) {
    let target = offset;
    let mut line = 1u32;
    let mut col = 1u32;
    let mut current_offset = 0usize;

    for ch in content.chars() {
        if current_offset >= target {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
        current_offset += ch.len_utf8();
    }

    (line, col)
}

/// Convert 1-indexed line and column to byte offset (Unicode-aware).
pub fn position_to_byte_offset(content: &str, line: u32, col: u32) -> usize {
    let line = line.max(1);
    let col = col.max(1);

    let mut current_line = 1u32;

    for (i, ch) in content.char_indices() {
        if current_line == line {
            let mut current_col = 1u32;
            for (j, c) in content[i..].char_indices() {
                if current_col == col {
                    return i + j;
                }
                if c == '\n' {
                    break;
                }
                current_col += 1;
            }
            let line_end = content[i..]
                .find('\n')
                .map(|p| i + p)
                .unwrap_or(content.len());
            return line_end;
        }
        if ch == '\n' {
            current_line += 1;
        }
    }

    content.len()
}

// ============================================================================
// Span Utilities
// ============================================================================

/// Get the line range spanned by a byte span. Returns `(start_line, end_line)`, 1-indexed.
pub fn span_to_line_range(content: &str, span: &Span) -> (u32, u32) {
    let (start_line, _) = byte_offset_to_position(content, span.start as usize);
    let (end_line, _) = byte_offset_to_position(
        content,
        (span.end as usize).saturating_sub(1).max(span.start as usize),
    );
    (start_line, end_line)
}

/// Extract the text content of a span. Returns `None` if out of bounds.
pub fn extract_span<'a>(content: &'a str, span: &Span) -> Option<&'a str> {
    content.get(span.start as usize..span.end as usize)
}

// ============================================================================
// Line Utilities
// ============================================================================

/// Get the byte offset of the start of a 1-indexed line. `None` if the line
/// doesn't exist or has no content (e.g. a trailing-newline final line).
pub fn line_start_offset(content: &str, line: u32) -> Option<usize> {
    if line == 0 {
        return None;
    }
    if line == 1 {
        return if content.is_empty() { None } else { Some(0) };
    }

    let mut current_line = 1u32;
    for (i, ch) in content.char_indices() {
        if ch == '\n' {
            current_line += 1;
            if current_line == line {
                if i + 1 < content.len() {
                    return Some(i + 1);
                } else {
                    return None;
                }
            }
        }
    }
    None
}

/// Count the number of lines in the content.
pub fn line_count(content: &str) -> u32 {
    let newlines = content.chars().filter(|&c| c == '\n').count() as u32;
    if content.is_empty() {
        0
    } else if content.ends_with('\n') {
        newlines
    } else {
        newlines + 1
    }
}

/// Split content into 1-indexed lines with a `""` sentinel at index 0,
/// preserving the line terminator convention the source view needs: each
/// returned line excludes its trailing `\n`.
pub fn split_lines_1_indexed(content: &str) -> Vec<String> {
    let mut lines = vec![String::new()];
    if content.is_empty() {
        return lines;
    }
    let ends_with_newline = content.ends_with('\n');
    let mut parts: Vec<&str> = content.split('\n').collect();
    if ends_with_newline {
        // split('\n') on a trailing-newline string yields a trailing "" entry
        parts.pop();
    }
    lines.extend(parts.into_iter().map(|s| s.to_string()));
    lines
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod conversions {
        use super::*;

        #[test]
        fn offset_to_position_simple() {
            let content = "def foo():\n    pass\n";
            assert_eq!(byte_offset_to_position(content, 0), (1, 1));
            assert_eq!(byte_offset_to_position(content, 4), (1, 5));
            assert_eq!(byte_offset_to_position(content, 11), (2, 1));
        }

        #[test]
        fn position_to_offset_simple() {
            let content = "def foo():\n    pass\n";
            assert_eq!(position_to_byte_offset(content, 1, 1), 0);
            assert_eq!(position_to_byte_offset(content, 1, 5), 4);
            assert_eq!(position_to_byte_offset(content, 2, 1), 11);
        }

        #[test]
        fn roundtrip() {
            let content = "line1\nline2\nline3\n";
            for offset in 0..content.len() {
                let (line, col) = byte_offset_to_position(content, offset);
                let recovered = position_to_byte_offset(content, line, col);
                assert_eq!(recovered, offset);
            }
        }

        #[test]
        fn empty_content() {
            assert_eq!(byte_offset_to_position("", 0), (1, 1));
            assert_eq!(position_to_byte_offset("", 1, 1), 0);
        }
    }

    mod span_tests {
        use super::*;

        #[test]
        fn span_to_line_range_multi_line() {
            let content = "line1\nline2\nline3\n";
            let span = Span::new(0, 12); // "line1\nline2"
            assert_eq!(span_to_line_range(content, &span), (1, 2));
        }

        #[test]
        fn extract_span_valid() {
            let content = "hello world";
            assert_eq!(extract_span(content, &Span::new(0, 5)), Some("hello"));
        }

        #[test]
        fn extract_span_out_of_bounds() {
            let content = "short";
            assert_eq!(extract_span(content, &Span::new(0, 100)), None);
        }
    }

    mod line_utilities {
        use super::*;

        #[test]
        fn line_start() {
            let content = "line1\nline2\nline3\n";
            assert_eq!(line_start_offset(content, 1), Some(0));
            assert_eq!(line_start_offset(content, 2), Some(6));
            assert_eq!(line_start_offset(content, 3), Some(12));
            assert_eq!(line_start_offset(content, 4), None);
        }

        #[test]
        fn line_count_tests() {
            assert_eq!(line_count(""), 0);
            assert_eq!(line_count("one line"), 1);
            assert_eq!(line_count("one line\n"), 1);
            assert_eq!(line_count("line1\nline2\n"), 2);
        }

        #[test]
        fn split_lines_has_sentinel_and_matches_line_count() {
            let content = "a\nb\nc\n";
            let lines = split_lines_1_indexed(content);
            assert_eq!(lines[0], "");
            assert_eq!(lines[1], "a");
            assert_eq!(lines[2], "b");
            assert_eq!(lines[3], "c");
            assert_eq!(lines.len() as u32, line_count(content) + 1);
        }

        #[test]
        fn split_lines_no_trailing_newline() {
            let content = "a\nb";
            let lines = split_lines_1_indexed(content);
            assert_eq!(lines, vec!["".to_string(), "a".to_string(), "b".to_string()]);
        }
    }
}
