//! Parser diagnostics.

use thiserror::Error;

/// A recoverable parse failure, recorded against its source position.
///
/// The parser never aborts: each failure is pushed onto its error list and
/// materialized as an `Error` node in the tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{line}:{column} {message}")]
pub struct ParseError {
    /// 1-indexed source line.
    pub line: u32,
    /// 1-indexed source column.
    pub column: u32,
    /// Human-readable description.
    pub message: String,
}
