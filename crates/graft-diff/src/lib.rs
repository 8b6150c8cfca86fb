//! Diff engine for graft.
//!
//! Walks object graphs through a [`TypeDescriptors`](graft_types::TypeDescriptors)
//! capability and computes structural diffs: two-way between a base and a
//! derived graph, and three-way between a base and two derived graphs.
//!
//! # Key Types
//!
//! - [`VisitTree`] / [`VisitNode`] -- Uniform node tree over objects, lists and dictionaries
//! - [`DataMatch`] -- Similarity score between two independently built nodes
//! - [`Alignment`] / [`Slot`] -- Two-way and three-way item correspondence
//! - [`DiffTree`] / [`DiffKind`] -- Two-way diff (same/new/deleted/modified)
//! - [`Diff3Tree`] / [`ChangeType`] -- Three-way diff with per-leaf merge origin
//! - [`AssetDiff`] -- Builds a [`Diff3Tree`] from three graph roots
//! - [`DiffConfig`] -- Override mode, depth limit and match threshold

pub mod asset_diff;
pub mod config;
pub mod diff3;
pub mod error;
pub mod matcher;
pub mod node;
pub mod reconcile;
pub mod two_way;

pub use asset_diff::AssetDiff;
pub use config::DiffConfig;
pub use diff3::{classify, ChangeType, Diff3Id, Diff3Node, Diff3Shape, Diff3Tree};
pub use error::{DiffError, DiffResult};
pub use matcher::{match_nodes, values_equal, DataMatch};
pub use node::{NodeId, NodeSlot, VisitNode, VisitTree};
pub use reconcile::{
    align, merged_order, reconcile, reconcile_containers, reconcile_sides, AlignStrategy, AlignedSide,
    Alignment, Pair, Slot,
};
pub use two_way::{DiffKind, DiffNode, DiffNodeId, DiffTree};
