//! Merge materializer: rebuilds one graph from a three-way diff.
//!
//! The walk is depth-first over the [`Diff3Tree`]. Leaves copy the value
//! their classification points at; expanded objects, lists and
//! dictionaries are rebuilt from their merged children. A conflicting leaf
//! never aborts the walk: the policy either settles it or the conflict is
//! recorded and the fallback side's value is used.

use std::collections::BTreeMap;

use graft_diff::{merged_order, AssetDiff, ChangeType, Diff3Id, Diff3Shape, Diff3Tree, DiffConfig};
use graft_types::{Object, PathSegment, TypeDescriptors, Value};
use tracing::{debug, warn};

use crate::error::{MergeConflict, MergeError};
use crate::policy::{ConflictContext, MergePolicy, Resolution, Side};
use crate::result::MergeResult;

/// Materialize the merged graph described by `tree`.
pub fn merge(tree: &Diff3Tree<'_>, policy: &dyn MergePolicy) -> MergeResult {
    let mut merger = Merger {
        tree,
        policy,
        errors: Vec::new(),
    };
    let asset = merger.emit(tree.root()).unwrap_or_default();
    debug!(
        nodes = tree.node_count(),
        differences = tree.find_leaf_differences().len(),
        conflicts = merger.errors.len(),
        "merged assets"
    );
    MergeResult {
        asset,
        errors: merger.errors,
    }
}

/// Diff `asset1` and `asset2` against `base` and merge the result.
pub fn merge_assets(
    descriptors: &dyn TypeDescriptors,
    base: &Value,
    asset1: &Value,
    asset2: &Value,
    policy: &dyn MergePolicy,
    config: &DiffConfig,
) -> Result<MergeResult, MergeError> {
    let tree = AssetDiff::new(descriptors, base, asset1, asset2)
        .with_config(config.clone())
        .compute()?;
    Ok(merge(&tree, policy))
}

struct Merger<'t, 'a> {
    tree: &'t Diff3Tree<'a>,
    policy: &'t dyn MergePolicy,
    errors: Vec<MergeConflict>,
}

impl Merger<'_, '_> {
    /// Merged value of node `id`; `None` when the location is absent from
    /// the merged graph.
    fn emit(&mut self, id: Diff3Id) -> Option<Value> {
        match self.tree.node(id).shape() {
            Diff3Shape::Leaf => self.leaf(id),
            Diff3Shape::Object => self.object(id),
            Diff3Shape::List => Some(self.list(id)),
            Diff3Shape::Dictionary => Some(self.dictionary(id)),
        }
    }

    fn leaf(&mut self, id: Diff3Id) -> Option<Value> {
        let tree = self.tree;
        let side = match tree.node(id).change() {
            ChangeType::None => {
                return tree.asset1_value(id).or_else(|| tree.base_value(id)).cloned();
            }
            ChangeType::MergeFromAsset1 | ChangeType::MergeFromAsset1And2 => Side::Asset1,
            ChangeType::MergeFromAsset2 => Side::Asset2,
            ChangeType::Conflict => self.resolve(id),
        };
        self.side_value(id, side).cloned()
    }

    fn resolve(&mut self, id: Diff3Id) -> Side {
        let tree = self.tree;
        let node = tree.node(id);
        let (base, asset1, asset2) = (tree.base_value(id), tree.asset1_value(id), tree.asset2_value(id));
        let context = ConflictContext {
            path: node.path(),
            base,
            asset1,
            asset2,
        };
        let fallback = match self.policy.resolve_conflict(&context) {
            Resolution::TakeAsset1 => return Side::Asset1,
            Resolution::TakeAsset2 => return Side::Asset2,
            Resolution::Report { fallback } => fallback,
        };

        let message = match (base.is_some(), asset1.is_some(), asset2.is_some()) {
            _ if node.shape() == Diff3Shape::List => "items reordered differently on both sides",
            (false, _, _) => "added with different values on both sides",
            (true, true, true) => "modified differently on both sides",
            (true, _, _) => "deleted on one side and modified on the other",
        };
        warn!(path = %node.path(), fallback = ?fallback, "{message}");
        self.errors.push(MergeConflict {
            node: id,
            path: node.path().clone(),
            base: base.cloned(),
            asset1: asset1.cloned(),
            asset2: asset2.cloned(),
            resolved_with: fallback,
            message: message.to_string(),
        });
        fallback
    }

    fn object(&mut self, id: Diff3Id) -> Option<Value> {
        let tree = self.tree;
        let source = tree
            .asset1_value(id)
            .or_else(|| tree.base_value(id))
            .or_else(|| tree.asset2_value(id))
            .and_then(Value::as_object)?;

        let mut merged = Object::new(source.type_name.clone());
        merged.overrides = source.overrides.clone();
        for &child in tree.node(id).children() {
            let node = tree.node(child);
            let Some(name) = node.path().member_name() else {
                continue;
            };
            if let Some(flags) = node.final_override() {
                merged.set_override(name, flags);
            }
            match self.emit(child) {
                Some(Value::Null) | None => {}
                Some(value) => merged.set(name, value),
            }
        }
        Some(Value::Object(merged))
    }

    fn list(&mut self, id: Diff3Id) -> Value {
        let tree = self.tree;
        let node = tree.node(id);
        let (r1, r2) = (node.reordered1(), node.reordered2());
        // A side that moved items keeps its order; orders that clash are
        // settled like any other conflict.
        let prefer_asset2 = if node.change() == ChangeType::Conflict {
            self.resolve(id) == Side::Asset2
        } else if self.policy.asset2_as_new_base() {
            !(r1 && !r2)
        } else {
            r2 && !r1
        };
        let children = node.children();
        let items = merged_order(node.slots(), prefer_asset2)
            .into_iter()
            .filter_map(|slot| self.emit(children[slot]))
            .collect();
        Value::List(items)
    }

    fn dictionary(&mut self, id: Diff3Id) -> Value {
        let tree = self.tree;
        let mut entries = BTreeMap::new();
        for &child in tree.node(id).children() {
            let Some(PathSegment::Entry(key)) = tree.node(child).path().last() else {
                continue;
            };
            if let Some(value) = self.emit(child) {
                entries.insert(key.clone(), value);
            }
        }
        Value::Dict(entries)
    }

    fn side_value(&self, id: Diff3Id, side: Side) -> Option<&Value> {
        match side {
            Side::Asset1 => self.tree.asset1_value(id),
            Side::Asset2 => self.tree.asset2_value(id),
        }
    }
}
