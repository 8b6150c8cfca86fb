//! Node builder: wraps an object graph in a uniform tree of visit nodes.
//!
//! A [`VisitTree`] is an arena of [`VisitNode`]s borrowing the source graph.
//! Objects expose their declared members in declaration order, lists their
//! items by index, and dictionaries their entries in key order. Primitive
//! values (including nulls and ids) end the recursion.
//!
//! Trees are cheap to rebuild and never mutate the graph they wrap; every
//! diff computation builds fresh ones.

use graft_types::{
    ItemId, NodePath, OverrideFlags, ShapeKind, TypeDescriptors, TypeShape, Value,
};
use tracing::trace;

use crate::config::DiffConfig;
use crate::error::{DiffError, DiffResult};

/// Stand-in for declared members that are not set on an object.
static NULL: Value = Value::Null;

/// Index of a node inside its [`VisitTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// The place a node occupies inside its parent.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeSlot {
    Root,
    Member(String),
    Item(usize),
    Entry(String),
}

/// One value reached while walking a graph.
#[derive(Clone, Debug)]
pub struct VisitNode<'a> {
    value: &'a Value,
    parent: Option<NodeId>,
    kind: ShapeKind,
    slot: NodeSlot,
    path: NodePath,
    children: Vec<NodeId>,
    item_id: Option<ItemId>,
}

impl<'a> VisitNode<'a> {
    /// The wrapped value. Unset members wrap [`Value::Null`].
    pub fn value(&self) -> &'a Value {
        self.value
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    pub fn slot(&self) -> &NodeSlot {
        &self.slot
    }

    pub fn path(&self) -> &NodePath {
        &self.path
    }

    /// Stable identifier reported by the type descriptors, if any.
    pub fn item_id(&self) -> Option<ItemId> {
        self.item_id
    }

    pub fn type_tag(&self) -> &'a str {
        self.value.type_tag()
    }

    pub fn is_null(&self) -> bool {
        self.value.is_null()
    }

    /// Child nodes in visiting order, whatever the kind.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Member nodes in declaration order. Empty unless this is an object.
    pub fn members(&self) -> &[NodeId] {
        self.children_of(ShapeKind::Object)
    }

    /// Item nodes in index order. Empty unless this is a list.
    pub fn items(&self) -> &[NodeId] {
        self.children_of(ShapeKind::List)
    }

    /// Entry nodes in key order. Empty unless this is a dictionary.
    pub fn entries(&self) -> &[NodeId] {
        self.children_of(ShapeKind::Dictionary)
    }

    fn children_of(&self, kind: ShapeKind) -> &[NodeId] {
        if self.kind == kind {
            &self.children
        } else {
            &[]
        }
    }
}

/// Arena of visit nodes built from one graph root.
#[derive(Clone, Debug)]
pub struct VisitTree<'a> {
    nodes: Vec<VisitNode<'a>>,
}

impl<'a> VisitTree<'a> {
    /// Walk `root` through `descriptors`.
    ///
    /// Fails with [`DiffError::SchemaMismatch`] when an object sets a member
    /// its type does not declare, and with [`DiffError::InvalidGraph`] when
    /// nesting exceeds `config.max_depth` or an identifiable object reappears
    /// among its own ancestors.
    pub fn build(
        descriptors: &dyn TypeDescriptors,
        root: &'a Value,
        config: &DiffConfig,
    ) -> DiffResult<Self> {
        let mut builder = Builder {
            descriptors,
            max_depth: config.max_depth,
            nodes: Vec::new(),
            lineage: Vec::new(),
        };
        builder.visit(root, None, NodeSlot::Root, NodePath::root(), 0)?;
        trace!(nodes = builder.nodes.len(), "built visit tree");
        Ok(Self {
            nodes: builder.nodes,
        })
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// The node behind `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced by this tree.
    pub fn node(&self, id: NodeId) -> &VisitNode<'a> {
        &self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&VisitNode<'a>> {
        self.nodes.get(id.0)
    }

    pub fn value(&self, id: NodeId) -> &'a Value {
        self.nodes[id.0].value
    }

    /// The graph this tree wraps.
    pub fn source(&self) -> &'a Value {
        self.value(self.root())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Member `name` of the object node `id`.
    pub fn member(&self, id: NodeId, name: &str) -> DiffResult<NodeId> {
        self.node(id)
            .members()
            .iter()
            .copied()
            .find(|&child| matches!(self.node(child).slot(), NodeSlot::Member(m) if m == name))
            .ok_or_else(|| DiffError::KeyNotFound(self.node(id).path().member(name).to_string()))
    }

    /// Override flags recorded on the member location occupied by `id`.
    ///
    /// Only member locations carry flags; everything else reads as `BASE`.
    pub fn override_at(&self, id: NodeId) -> OverrideFlags {
        let node = self.node(id);
        match (node.slot(), node.parent()) {
            (NodeSlot::Member(name), Some(parent)) => self
                .value(parent)
                .as_object()
                .map(|obj| obj.override_of(name))
                .unwrap_or_default(),
            _ => OverrideFlags::BASE,
        }
    }

    /// Nodes in pre-order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &VisitNode<'a>)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }
}

struct Builder<'a, 'd> {
    descriptors: &'d dyn TypeDescriptors,
    max_depth: usize,
    nodes: Vec<VisitNode<'a>>,
    /// Ids of identifiable objects on the current ancestor chain.
    lineage: Vec<ItemId>,
}

impl<'a, 'd> Builder<'a, 'd> {
    fn visit(
        &mut self,
        value: &'a Value,
        parent: Option<NodeId>,
        slot: NodeSlot,
        path: NodePath,
        depth: usize,
    ) -> DiffResult<NodeId> {
        if depth > self.max_depth {
            return Err(DiffError::InvalidGraph {
                path,
                reason: format!("nesting exceeds the maximum depth of {}", self.max_depth),
            });
        }

        let descriptors = self.descriptors;
        let shape = descriptors.describe(value)?;
        let item_id = descriptors.item_id(value);
        let lineage_id = match value {
            Value::Object(_) => item_id,
            _ => None,
        };
        if let Some(item) = lineage_id {
            if self.lineage.contains(&item) {
                return Err(DiffError::InvalidGraph {
                    path,
                    reason: format!("object {item} is its own ancestor"),
                });
            }
        }

        let id = NodeId(self.nodes.len());
        self.nodes.push(VisitNode {
            value,
            parent,
            kind: shape.kind(),
            slot,
            path: path.clone(),
            children: Vec::new(),
            item_id,
        });

        if let Some(item) = lineage_id {
            self.lineage.push(item);
        }
        let mut children = Vec::new();
        match (shape, value) {
            (TypeShape::Object(desc), Value::Object(obj)) => {
                if let Some(unknown) = obj.fields.keys().find(|name| !desc.has_member(name)) {
                    return Err(DiffError::SchemaMismatch {
                        path,
                        detail: format!("type `{}` does not declare member `{unknown}`", desc.name),
                    });
                }
                for name in desc.member_names() {
                    let field = obj.get(name).unwrap_or(&NULL);
                    let child = self.visit(
                        field,
                        Some(id),
                        NodeSlot::Member(name.to_string()),
                        path.member(name),
                        depth + 1,
                    )?;
                    children.push(child);
                }
            }
            (TypeShape::List, Value::List(items)) => {
                for (index, item) in items.iter().enumerate() {
                    let child =
                        self.visit(item, Some(id), NodeSlot::Item(index), path.item(index), depth + 1)?;
                    children.push(child);
                }
            }
            (TypeShape::Dictionary, Value::Dict(entries)) => {
                for (key, entry) in entries {
                    let child = self.visit(
                        entry,
                        Some(id),
                        NodeSlot::Entry(key.clone()),
                        path.entry(key.as_str()),
                        depth + 1,
                    )?;
                    children.push(child);
                }
            }
            _ => {}
        }
        if lineage_id.is_some() {
            self.lineage.pop();
        }

        self.nodes[id.0].children = children;
        Ok(id)
    }
}
