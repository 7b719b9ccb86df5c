//! Error types
//!
//! [`ParseError`] is a diagnostic attached to a parse result; parsing itself
//! never fails. [`KtsynError`] covers everything around a parse that can.

use serde::Serialize;
use std::ops::Range;
use thiserror::Error;

/// Result type for operations that can fail outside of parsing
pub type Result<T> = std::result::Result<T, KtsynError>;

/// Failures while loading inputs or options
#[derive(Debug, Error)]
pub enum KtsynError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse options: {0}")]
    Options(#[from] toml::de::Error),

    #[error("Unknown entry point '{0}' (expected file, script, type, expression, block or lambda)")]
    UnknownEntryPoint(String),
}

/// A syntax diagnostic. `range` is a byte range into the parsed text and is
/// empty for missing-token errors.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{message} at {}..{}", range.start, range.end)]
pub struct ParseError {
    pub message: String,
    pub range: Range<usize>,
    pub kind: ParseErrorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseErrorKind {
    /// A required token is absent
    MissingToken,
    /// Tokens that fit nowhere were wrapped in an error node
    UnexpectedToken,
    /// Tokens parsed, but the construct is not allowed in this position
    InvalidSyntax,
    /// A comment or similar construct runs to end of input
    UnterminatedConstruct,
}
