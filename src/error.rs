//! Error types for tree operations.

use thiserror::Error;

/// Errors surfaced by mutating tree operations.
///
/// Queries never fail: an unmatched key is an empty result, not an error.
/// Broken structural invariants are panics, not `Error` values, because
/// they indicate a bug rather than bad input.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Keys must contain at least one character.
    #[error("key must contain at least one character")]
    EmptyKey,
}

/// Convenience alias for results of tree operations.
pub type Result<T> = std::result::Result<T, Error>;
