//! Two-way structural diff between a base tree and a derived tree.
//!
//! Objects are compared member by member, lists and dictionaries through
//! the reconciler, and everything else by value. A slot whose two values
//! differ in shape or type tag is a single leaf: the value was replaced.

use graft_types::ShapeKind;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::DiffConfig;
use crate::error::{DiffError, DiffResult};
use crate::matcher::values_equal;
use crate::node::{NodeId, VisitTree};
use crate::reconcile::{align, Alignment};

/// How a derived location relates to its base location.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiffKind {
    Same,
    New,
    Deleted,
    Modified,
}

/// Index of a node inside its [`DiffTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DiffNodeId(usize);

/// One compared location.
#[derive(Clone, Debug)]
pub struct DiffNode {
    base: Option<NodeId>,
    other: Option<NodeId>,
    kind: DiffKind,
    shape: ShapeKind,
    children: Vec<DiffNodeId>,
    alignment: Option<Alignment>,
}

impl DiffNode {
    pub fn base(&self) -> Option<NodeId> {
        self.base
    }

    pub fn other(&self) -> Option<NodeId> {
        self.other
    }

    pub fn kind(&self) -> DiffKind {
        self.kind
    }

    /// The composite kind this node was expanded as, or `Primitive` when
    /// the location was compared as a whole.
    pub fn shape(&self) -> ShapeKind {
        self.shape
    }

    /// Child comparisons. For objects, one per member in declaration order;
    /// for containers, one per pair of [`alignment`](Self::alignment).
    pub fn children(&self) -> &[DiffNodeId] {
        &self.children
    }

    pub fn alignment(&self) -> Option<&Alignment> {
        self.alignment.as_ref()
    }

    /// Surviving items moved relative to base.
    pub fn is_reordered(&self) -> bool {
        self.alignment.as_ref().is_some_and(Alignment::is_reordered)
    }
}

/// Result of comparing a base tree with a derived tree.
#[derive(Clone, Debug)]
pub struct DiffTree {
    nodes: Vec<DiffNode>,
}

impl DiffTree {
    /// Compare `base` with `other`, both walked from their roots.
    ///
    /// Fails with [`DiffError::SchemaMismatch`] when two objects of the same
    /// type do not declare the same members.
    pub fn compute(base: &VisitTree<'_>, other: &VisitTree<'_>, config: &DiffConfig) -> DiffResult<Self> {
        let mut diff = Self { nodes: Vec::new() };
        diff.visit(base, other, Some(base.root()), Some(other.root()), config.match_threshold)?;
        debug!(nodes = diff.nodes.len(), root = ?diff.node(diff.root()).kind, "computed two-way diff");
        Ok(diff)
    }

    pub fn root(&self) -> DiffNodeId {
        DiffNodeId(0)
    }

    pub fn node(&self, id: DiffNodeId) -> &DiffNode {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in pre-order.
    pub fn iter(&self) -> impl Iterator<Item = (DiffNodeId, &DiffNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (DiffNodeId(i), n))
    }

    /// Whether every node id this diff refers to exists in the given trees.
    pub fn fits(&self, base: &VisitTree<'_>, other: &VisitTree<'_>) -> bool {
        !self.nodes.is_empty()
            && self.nodes.iter().all(|n| {
                n.base.map_or(true, |b| b.index() < base.len())
                    && n.other.map_or(true, |o| o.index() < other.len())
            })
    }

    /// `true` if the derived tree equals the base tree.
    pub fn is_unchanged(&self) -> bool {
        self.nodes.first().map_or(true, |root| root.kind == DiffKind::Same)
    }

    /// Changed leaves in pre-order.
    ///
    /// A reordered container whose items are all unchanged counts as a leaf.
    pub fn changes(&self) -> Vec<DiffNodeId> {
        let mut out = Vec::new();
        if !self.nodes.is_empty() {
            self.collect_changes(self.root(), &mut out);
        }
        out
    }

    fn collect_changes(&self, id: DiffNodeId, out: &mut Vec<DiffNodeId>) {
        let node = self.node(id);
        if node.kind == DiffKind::Same {
            return;
        }
        let changed_children: Vec<_> = node
            .children
            .iter()
            .copied()
            .filter(|&c| self.node(c).kind != DiffKind::Same)
            .collect();
        if changed_children.is_empty() {
            out.push(id);
        }
        for child in changed_children {
            self.collect_changes(child, out);
        }
    }

    fn visit(
        &mut self,
        tb: &VisitTree<'_>,
        to: &VisitTree<'_>,
        base: Option<NodeId>,
        other: Option<NodeId>,
        threshold: f64,
    ) -> DiffResult<DiffNodeId> {
        let id = DiffNodeId(self.nodes.len());
        self.nodes.push(DiffNode {
            base,
            other,
            kind: DiffKind::Same,
            shape: ShapeKind::Primitive,
            children: Vec::new(),
            alignment: None,
        });

        let (b, o) = match (base, other) {
            (Some(b), Some(o)) => (b, o),
            (Some(_), None) => {
                self.nodes[id.0].kind = DiffKind::Deleted;
                return Ok(id);
            }
            (None, Some(_)) => {
                self.nodes[id.0].kind = DiffKind::New;
                return Ok(id);
            }
            (None, None) => return Ok(id),
        };

        if !same_shape(tb, b, to, o) {
            if !values_equal(tb, b, to, o) {
                self.nodes[id.0].kind = DiffKind::Modified;
            }
            return Ok(id);
        }

        let shape = tb.node(b).kind();
        let mut children = Vec::new();
        let mut alignment = None;
        if shape == ShapeKind::Object {
            let (mb, mo) = (tb.node(b).members(), to.node(o).members());
            let aligned = mb.len() == mo.len()
                && mb.iter().zip(mo).all(|(&x, &y)| tb.node(x).slot() == to.node(y).slot());
            if !aligned {
                return Err(DiffError::SchemaMismatch {
                    path: tb.node(b).path().clone(),
                    detail: format!("members of `{}` do not align by name", tb.node(b).type_tag()),
                });
            }
            for (&x, &y) in mb.iter().zip(mo) {
                children.push(self.visit(tb, to, Some(x), Some(y), threshold)?);
            }
        } else {
            let al = align(tb, b, to, o, threshold);
            let (ib, io) = (tb.node(b).children(), to.node(o).children());
            for pair in &al.pairs {
                let child = self.visit(tb, to, pair.base.map(|i| ib[i]), pair.other.map(|j| io[j]), threshold)?;
                children.push(child);
            }
            alignment = Some(al);
        }

        let changed = children.iter().any(|c| self.nodes[c.0].kind != DiffKind::Same)
            || alignment.as_ref().is_some_and(Alignment::is_reordered);
        let node = &mut self.nodes[id.0];
        node.kind = if changed { DiffKind::Modified } else { DiffKind::Same };
        node.shape = shape;
        node.children = children;
        node.alignment = alignment;
        Ok(id)
    }
}

/// Both nodes are composites of the same kind and type tag, so they can be
/// compared child by child.
pub(crate) fn same_shape(ta: &VisitTree<'_>, a: NodeId, tb: &VisitTree<'_>, b: NodeId) -> bool {
    let (na, nb) = (ta.node(a), tb.node(b));
    na.kind() == nb.kind() && na.kind() != ShapeKind::Primitive && na.type_tag() == nb.type_tag()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::tests::registry;
    use graft_types::{ItemId, Object, ObjectDescriptor, TypeRegistry, Value};

    fn diff(base: &Value, other: &Value) -> (DiffTree, Vec<(DiffKind, String)>) {
        let reg = registry();
        let config = DiffConfig::default();
        let tb = VisitTree::build(&reg, base, &config).unwrap();
        let to = VisitTree::build(&reg, other, &config).unwrap();
        let tree = DiffTree::compute(&tb, &to, &config).unwrap();
        let changes = tree
            .changes()
            .into_iter()
            .map(|c| {
                let node = tree.node(c);
                let path = match (node.base(), node.other()) {
                    (Some(b), _) => tb.node(b).path().to_string(),
                    (None, Some(o)) => to.node(o).path().to_string(),
                    (None, None) => String::new(),
                };
                (node.kind(), path)
            })
            .collect();
        (tree, changes)
    }

    fn asset(value: i64) -> Value {
        Value::from(Object::new("Asset").with("Name", "a").with("Value", value))
    }

    #[test]
    fn identical_graphs_are_unchanged() {
        let (tree, changes) = diff(&asset(1), &asset(1));
        assert!(tree.is_unchanged());
        assert!(changes.is_empty());
    }

    #[test]
    fn modified_member_is_the_only_change() {
        let (tree, changes) = diff(&asset(1), &asset(2));
        assert_eq!(tree.node(tree.root()).kind(), DiffKind::Modified);
        assert_eq!(changes, vec![(DiffKind::Modified, "Value".to_string())]);
    }

    #[test]
    fn list_items_added_and_removed() {
        let base = Value::list([Value::from(1), Value::from(2)]);
        let other = Value::list([Value::from(2), Value::from(3)]);
        let (_, changes) = diff(&base, &other);
        assert_eq!(
            changes,
            vec![(DiffKind::Deleted, "[0]".to_string()), (DiffKind::New, "[1]".to_string())]
        );
    }

    #[test]
    fn reorder_only_marks_container() {
        let comp = |id: u128| Value::from(Object::new("Component").with("Id", ItemId::from_u128(id)));
        let base = Value::list([comp(1), comp(2)]);
        let other = Value::list([comp(2), comp(1)]);
        let (tree, changes) = diff(&base, &other);
        assert!(tree.node(tree.root()).is_reordered());
        assert_eq!(changes, vec![(DiffKind::Modified, "<root>".to_string())]);
    }

    #[test]
    fn type_swap_is_a_single_leaf() {
        let base = Value::from(Object::new("Asset").with("Child", Object::new("Vector").with("X", 1)));
        let other = Value::from(Object::new("Asset").with("Child", Object::new("Component").with("Name", "c")));
        let (tree, changes) = diff(&base, &other);
        assert_eq!(changes, vec![(DiffKind::Modified, "Child".to_string())]);
        let child = tree.node(tree.root()).children()[2];
        assert_eq!(tree.node(child).shape(), ShapeKind::Primitive);
    }

    #[test]
    fn dictionary_entries_by_key() {
        let base = Value::dict([("a", Value::from(1)), ("b", Value::from(2))]);
        let other = Value::dict([("a", Value::from(1)), ("b", Value::from(5)), ("c", Value::from(3))]);
        let (_, changes) = diff(&base, &other);
        assert_eq!(
            changes,
            vec![(DiffKind::Modified, "[\"b\"]".to_string()), (DiffKind::New, "[\"c\"]".to_string())]
        );
    }

    #[test]
    fn null_to_value_is_modified() {
        let base = Value::from(Object::new("Asset"));
        let (_, changes) = diff(&base, &asset(1));
        assert_eq!(
            changes,
            vec![(DiffKind::Modified, "Name".to_string()), (DiffKind::Modified, "Value".to_string())]
        );
    }

    #[test]
    fn diverging_schemas_are_rejected() {
        let old = TypeRegistry::new()
            .with(ObjectDescriptor::new("T").member("A"))
            .unwrap();
        let new = TypeRegistry::new()
            .with(ObjectDescriptor::new("T").member("A").member("B"))
            .unwrap();
        let value = Value::from(Object::new("T").with("A", 1));
        let config = DiffConfig::default();
        let tb = VisitTree::build(&old, &value, &config).unwrap();
        let to = VisitTree::build(&new, &value, &config).unwrap();
        let err = DiffTree::compute(&tb, &to, &config).unwrap_err();
        assert!(matches!(err, DiffError::SchemaMismatch { .. }));
    }
}
