//! Merge engine for graft.
//!
//! Turns a three-way diff into one merged graph. Non-conflicting changes
//! from both derived sides are applied; conflicting leaves are settled by a
//! [`MergePolicy`] or reported in the [`MergeResult`] without aborting the
//! rest of the merge.
//!
//! # Key Types
//!
//! - [`merge`] / [`merge_assets`]: Materialize a merged graph
//! - [`MergePolicy`] / [`StandardPolicy`]: List order and conflict strategy
//! - [`MergeResult`]: The merged graph plus recorded conflicts
//! - [`MergeConflict`]: One conflicting location with its three values

pub mod error;
pub mod merge;
pub mod policy;
pub mod result;

pub use error::{MergeConflict, MergeError};
pub use merge::{merge, merge_assets};
pub use policy::{ConflictContext, ConflictStrategy, MergePolicy, Resolution, Side, StandardPolicy};
pub use result::MergeResult;
