//! Error types for graph model operations.

use thiserror::Error;

/// A specialized `Result` type for graph model operations.
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors raised by strict-mode graph and container operations.
///
/// Permissive-mode equivalents (auto-create-missing, no-op-on-duplicate)
/// never raise; these variants indicate a programming error in the
/// calling feature, not a recoverable runtime condition.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Lookup of an absent id in a strict context.
    #[error("not found: {0}")]
    NotFound(String),

    /// Overwrite-forbidden insert into an occupied id.
    #[error("duplicate id: {0}")]
    DuplicateId(String),

    /// An edge endpoint references a node that is not present (strict mode).
    #[error("dangling reference: edge {edge} references missing node {node}")]
    DanglingReference { edge: String, node: String },
}
