//! Common types shared across the workspace.
//!
//! This module contains types used by both the error module and the language
//! adapters, avoiding circular dependencies between them.

use serde::{Deserialize, Serialize};

// ============================================================================
// Location Type
// ============================================================================

/// Location in a source file.
///
/// - `file`: path as given to the invocation (required)
/// - `line`: 1-indexed line number (required)
/// - `col`: 1-indexed column, UTF-8 bytes (required)
/// - `byte_start`: Byte offset from file start (optional)
/// - `byte_end`: Byte offset end, exclusive (optional)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Location {
    /// File path.
    pub file: String,
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (1-indexed, UTF-8 bytes).
    pub col: u32,
    /// Byte offset from file start (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub byte_start: Option<u64>,
    /// Byte offset end, exclusive (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub byte_end: Option<u64>,
}

impl Location {
    /// Create a new location without byte offsets.
    pub fn new(file: impl Into<String>, line: u32, col: u32) -> Self {
        Location {
            file: file.into(),
            line,
            col,
            byte_start: None,
            byte_end: None,
        }
    }

    /// Create a location with full byte span.
    pub fn with_span(
        file: impl Into<String>,
        line: u32,
        col: u32,
        byte_start: u64,
        byte_end: u64,
    ) -> Self {
        Location {
            file: file.into(),
            line,
            col,
            byte_start: Some(byte_start),
            byte_end: Some(byte_end),
        }
    }

    /// Comparison key for deterministic sorting: (file, line, col).
    fn sort_key(&self) -> (&str, u32, u32) {
        (&self.file, self.line, self.col)
    }
}

impl PartialOrd for Location {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Location {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

// ============================================================================
// Span Type
// ============================================================================

/// Byte offsets into file content. Half-open interval: `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    /// Start byte offset (inclusive).
    pub start: u32,
    /// End byte offset (exclusive).
    pub end: u32,
}

impl Span {
    /// Create a new span.
    ///
    /// # Panics
    /// Panics if `start > end`.
    pub fn new(start: u32, end: u32) -> Self {
        assert!(start <= end, "Span start ({}) must be <= end ({})", start, end);
        Span { start, end }
    }

    /// Length of the span in bytes.
    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    /// Whether the span covers zero bytes.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod location_tests {
        use super::*;

        #[test]
        fn location_new_serializes_without_byte_offsets() {
            let loc = Location::new("test.js", 42, 8);
            let json = serde_json::to_string(&loc).unwrap();
            assert!(!json.contains("byte_start"));
            assert!(!json.contains("byte_end"));
            assert!(json.contains("\"file\":\"test.js\""));
            assert!(json.contains("\"line\":42"));
            assert!(json.contains("\"col\":8"));
        }

        #[test]
        fn location_with_span_serializes_all_fields() {
            let loc = Location::with_span("src/main.js", 42, 8, 1234, 1245);
            let json = serde_json::to_string(&loc).unwrap();
            assert!(json.contains("\"byte_start\":1234"));
            assert!(json.contains("\"byte_end\":1245"));
        }

        #[test]
        fn locations_sort_by_file_then_line_then_col() {
            let mut locs = vec![
                Location::new("b.js", 1, 1),
                Location::new("a.js", 2, 1),
                Location::new("a.js", 1, 5),
                Location::new("a.js", 1, 1),
            ];
            locs.sort();
            let files: Vec<(&str, u32, u32)> =
                locs.iter().map(|l| (l.file.as_str(), l.line, l.col)).collect();
            assert_eq!(
                files,
                vec![("a.js", 1, 1), ("a.js", 1, 5), ("a.js", 2, 1), ("b.js", 1, 1)]
            );
        }
    }

    mod span_tests {
        use super::*;

        #[test]
        fn len_and_is_empty() {
            let span = Span::new(4, 10);
            assert_eq!(span.len(), 6);
            assert!(!span.is_empty());
            assert!(Span::new(4, 4).is_empty());
        }

        #[test]
        #[should_panic]
        fn new_panics_on_inverted_range() {
            Span::new(10, 4);
        }
    }
}
