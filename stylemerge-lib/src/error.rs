//! Error types for stylesheet operations.

use thiserror::Error;

/// Errors surfaced by the library.
///
/// Parsing, matching and the renaming algorithms are best-effort and never
/// fail; these variants cover the few places where a caller asked for
/// something that cannot be produced.
#[derive(Error, Debug)]
pub enum Error {
    #[error("rule index {index} not found (store holds {len} rules)")]
    IndexNotFound { index: usize, len: usize },

    #[error("invalid selector: {0:?}")]
    InvalidSelector(String),

    #[error("stylesheet import failed: {0}")]
    Import(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
