//! Error types for the diff crate.

use graft_types::{NodePath, TypeError};

/// Errors that abort a diff computation.
///
/// Leaf conflicts are not errors; they are reported as data on the diff3
/// tree and in merge results.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// The source graph cannot be walked as a finite tree.
    #[error("invalid graph at {path}: {reason}")]
    InvalidGraph { path: NodePath, reason: String },

    /// Compared objects cannot be aligned member by member.
    #[error("schema mismatch at {path}: {detail}")]
    SchemaMismatch { path: NodePath, detail: String },

    /// A node was queried through a name that does not exist.
    #[error("key not found: {0}")]
    KeyNotFound(String),

    /// Type descriptor lookup failed.
    #[error("type error: {0}")]
    Type(#[from] TypeError),
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;
