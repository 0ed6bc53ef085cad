//! Error types for guard scanning and rewriting.
//!
//! Scanning itself never fails on arbitrary input: a document without any
//! recognised statements is simply returned unchanged. Errors are reserved
//! for invalid options and for internal inconsistencies in the rewrite plan.

use std::ops::Range;

use thiserror::Error;

/// Errors from guard scanning and rewriting operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GuardError {
    /// The configured schema cannot be interpolated into a guard.
    #[error("invalid schema name {schema:?}: {message}")]
    InvalidSchema {
        /// The rejected schema name.
        schema: String,
        /// Description of the problem.
        message: String,
    },

    /// A statement pattern failed to compile.
    #[error("failed to compile statement pattern: {message}")]
    PatternCompileError {
        /// Description of the compilation failure.
        message: String,
    },

    /// Two planned replacements cover the same bytes.
    #[error("overlapping rewrite spans {first:?} and {second:?}")]
    OverlappingSpans {
        /// The span that starts first.
        first: Range<usize>,
        /// The span that overlaps it.
        second: Range<usize>,
    },

    /// Internal error indicating a bug in the scanner.
    #[error("internal error: {message}")]
    InternalError {
        /// Description of the internal error.
        message: String,
    },
}

impl GuardError {
    /// Creates an invalid schema error.
    #[must_use]
    pub fn invalid_schema(schema: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSchema {
            schema: schema.into(),
            message: message.into(),
        }
    }

    /// Creates a pattern compilation error.
    #[must_use]
    pub fn pattern_compile(message: impl Into<String>) -> Self {
        Self::PatternCompileError {
            message: message.into(),
        }
    }

    /// Creates an overlapping span error.
    #[must_use]
    pub const fn overlapping_spans(first: Range<usize>, second: Range<usize>) -> Self {
        Self::OverlappingSpans { first, second }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }
}

impl From<regex::Error> for GuardError {
    fn from(error: regex::Error) -> Self {
        Self::pattern_compile(error.to_string())
    }
}
