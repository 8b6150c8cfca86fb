//! Error types for the merge crate.

use graft_diff::{Diff3Id, DiffError};
use graft_types::{NodePath, Value};
use serde::{Deserialize, Serialize};

use crate::policy::Side;

/// A conflicting leaf the policy did not resolve.
///
/// Conflicts are data, not failures: the merge records them and carries on
/// with the fallback value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("conflict at {path}: {message}")]
pub struct MergeConflict {
    /// The conflicting node of the diff3 tree the merge walked.
    pub node: Diff3Id,
    pub path: NodePath,
    pub base: Option<Value>,
    pub asset1: Option<Value>,
    pub asset2: Option<Value>,
    /// The side whose value the merged graph holds at `path`.
    pub resolved_with: Side,
    pub message: String,
}

/// Errors that abort a merge.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// Diffing the inputs failed.
    #[error("diff error: {0}")]
    Diff(#[from] DiffError),

    /// A location was queried that the merged graph does not have.
    #[error("key not found: {0}")]
    KeyNotFound(String),
}
