//! Error types and error code constants for autoimport.
//!
//! This module provides a unified error type (`AutoImportError`) that bridges
//! domain-specific errors from different subsystems (registry, rewriter,
//! manifest loading) into a common format.
//!
//! ## Error Code Mapping
//!
//! Rewriting is all-or-nothing: any surfaced error aborts the whole
//! invocation and no rewritten output is returned. `ErrorCode` distinguishes
//! the kinds of surfaced failure a caller needs to branch on:
//! - `ParseError`: parsing failed.
//! - `Io`: a filesystem read failed for a reason other than "not found".
//! - `Internal`: a programmer-error invariant was violated.
//!
//! Missing manifests, a corrupt cache, and swallowed probe/parse failures are
//! *not* errors by policy and never reach this type — they are logged and
//! absorbed where they occur.

use std::fmt;

use thiserror::Error;

pub use crate::types::Location;

// ============================================================================
// Error Codes
// ============================================================================

/// Stable numeric codes for the errors that can surface from `run()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ErrorCode {
    /// The source file failed to parse.
    ParseError = 1,
    /// A filesystem read failed for a reason other than "not found".
    Io = 2,
    /// An internal invariant was violated (programmer error).
    Internal = 10,
}

impl ErrorCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Unified error type returned by `autoimport::run`.
#[derive(Debug, Error)]
pub enum AutoImportError {
    /// The source file failed to parse.
    #[error("parse error at {location}: {message}")]
    ParseError { location: Location, message: String },

    /// A filesystem read failed for a reason other than "not found".
    #[error("IO error: {message}")]
    Io { message: String },

    /// A composition-layer invariant was violated: an `ExportKind` appeared
    /// in a position the statement shape for the active style cannot
    /// express.
    #[error("invalid import composition: {message}")]
    InvalidComposition { message: String },

    /// Internal error (bug or unexpected state).
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.col)
    }
}

impl AutoImportError {
    /// Create a parse error.
    pub fn parse(location: Location, message: impl Into<String>) -> Self {
        AutoImportError::ParseError {
            location,
            message: message.into(),
        }
    }

    /// Create an IO error.
    pub fn io(message: impl Into<String>) -> Self {
        AutoImportError::Io {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        AutoImportError::Internal {
            message: message.into(),
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            AutoImportError::ParseError { .. } => ErrorCode::ParseError,
            AutoImportError::Io { .. } => ErrorCode::Io,
            AutoImportError::InvalidComposition { .. } => ErrorCode::Internal,
            AutoImportError::Internal { .. } => ErrorCode::Internal,
        }
    }
}

impl From<std::io::Error> for AutoImportError {
    fn from(err: std::io::Error) -> Self {
        AutoImportError::Io {
            message: err.to_string(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
