//! Three-way combiner: joins base→asset1 and base→asset2 diffs.
//!
//! The combiner walks both two-way diffs in lock-step over the shared base
//! structure and produces a [`Diff3Tree`]. Composite locations present on
//! all three sides with the same shape are expanded; every other location
//! is a leaf classified by a [`ChangeType`]:
//!
//! | asset1 vs base | asset2 vs base | result |
//! |---|---|---|
//! | equal | equal | `None` |
//! | changed | equal | `MergeFromAsset1` |
//! | equal | changed | `MergeFromAsset2` |
//! | changed | changed, asset1 == asset2 | `MergeFromAsset1And2` |
//! | changed | changed, asset1 != asset2 | `Conflict` |
//!
//! "Changed" covers modification, insertion and deletion alike, so a
//! deletion racing a modification is a conflict and a deletion on both
//! sides is an agreement.
//!
//! Reordering is recorded on list nodes without being a difference of its
//! own. Only when both sides move the items they kept into different
//! orders is the list node itself a `Conflict`.
//!
//! In override mode, member locations consult [`OverrideFlags`] first: a
//! sealed location resyncs to asset2, a `NEW` location on asset1 keeps
//! asset1. The resulting flags are recorded on the node so the merge can
//! persist them.

use graft_types::{NodePath, OverrideFlags, ShapeKind, Value};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::DiffConfig;
use crate::error::{DiffError, DiffResult};
use crate::matcher::values_equal;
use crate::node::{NodeId, VisitTree};
use crate::reconcile::{reconcile_sides, AlignedSide, Slot};
use crate::two_way::{DiffKind, DiffNode, DiffNodeId, DiffTree};

/// Where the merged value of a location comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeType {
    None,
    MergeFromAsset1,
    MergeFromAsset2,
    MergeFromAsset1And2,
    Conflict,
}

/// Structure of a diff3 node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Diff3Shape {
    /// Compared as a whole.
    Leaf,
    Object,
    List,
    Dictionary,
}

/// Index of a node inside its [`Diff3Tree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Diff3Id(usize);

/// One location across base, asset1 and asset2.
#[derive(Clone, Debug)]
pub struct Diff3Node {
    base: Option<NodeId>,
    asset1: Option<NodeId>,
    asset2: Option<NodeId>,
    change: ChangeType,
    shape: Diff3Shape,
    path: NodePath,
    parent: Option<Diff3Id>,
    children: Vec<Diff3Id>,
    slots: Vec<Slot>,
    final_override: Option<OverrideFlags>,
    reordered1: bool,
    reordered2: bool,
}

impl Diff3Node {
    pub fn base(&self) -> Option<NodeId> {
        self.base
    }

    pub fn asset1(&self) -> Option<NodeId> {
        self.asset1
    }

    pub fn asset2(&self) -> Option<NodeId> {
        self.asset2
    }

    pub fn change(&self) -> ChangeType {
        self.change
    }

    pub fn shape(&self) -> Diff3Shape {
        self.shape
    }

    pub fn is_leaf(&self) -> bool {
        self.shape == Diff3Shape::Leaf
    }

    /// Location of the node: the base path when base has it, otherwise the
    /// path on the side that introduced it.
    pub fn path(&self) -> &NodePath {
        &self.path
    }

    pub fn parent(&self) -> Option<Diff3Id> {
        self.parent
    }

    pub fn children(&self) -> &[Diff3Id] {
        &self.children
    }

    /// Item positions of each child of a list or dictionary node, parallel
    /// to [`children`](Self::children).
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Override flags the merged member location ends up with, when the
    /// combiner ran in override mode.
    pub fn final_override(&self) -> Option<OverrideFlags> {
        self.final_override
    }

    /// Asset1 moved base items that both sides kept.
    pub fn reordered1(&self) -> bool {
        self.reordered1
    }

    /// Asset2 moved base items that both sides kept.
    pub fn reordered2(&self) -> bool {
        self.reordered2
    }
}

/// Three-way structural diff over owned visit trees.
#[derive(Clone, Debug)]
pub struct Diff3Tree<'a> {
    base: VisitTree<'a>,
    asset1: VisitTree<'a>,
    asset2: VisitTree<'a>,
    nodes: Vec<Diff3Node>,
    override_mode: bool,
}

impl<'a> Diff3Tree<'a> {
    /// Combine `d1` (base→asset1) and `d2` (base→asset2).
    ///
    /// Both diffs must have been computed against `base`.
    pub fn combine(
        base: VisitTree<'a>,
        asset1: VisitTree<'a>,
        asset2: VisitTree<'a>,
        d1: &DiffTree,
        d2: &DiffTree,
        config: &DiffConfig,
    ) -> DiffResult<Self> {
        for (name, diff, other) in [("asset1", d1, &asset1), ("asset2", d2, &asset2)] {
            if !diff.fits(&base, other) {
                return Err(DiffError::InvalidGraph {
                    path: NodePath::root(),
                    reason: format!("base-to-{name} diff was not computed over these trees"),
                });
            }
        }

        let nodes = {
            let mut combiner = Combiner {
                base: &base,
                asset1: &asset1,
                asset2: &asset2,
                d1,
                d2,
                override_mode: config.use_override_mode,
                nodes: Vec::new(),
            };
            combiner.visit(Some(d1.root()), Some(d2.root()), None);
            combiner.nodes
        };

        let tree = Self {
            base,
            asset1,
            asset2,
            nodes,
            override_mode: config.use_override_mode,
        };
        debug!(
            nodes = tree.nodes.len(),
            differences = tree.find_leaf_differences().len(),
            conflicts = tree.conflicts().len(),
            override_mode = tree.override_mode,
            "combined three-way diff"
        );
        Ok(tree)
    }

    pub fn root(&self) -> Diff3Id {
        Diff3Id(0)
    }

    pub fn node(&self, id: Diff3Id) -> &Diff3Node {
        &self.nodes[id.0]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn override_mode(&self) -> bool {
        self.override_mode
    }

    pub fn base_tree(&self) -> &VisitTree<'a> {
        &self.base
    }

    pub fn asset1_tree(&self) -> &VisitTree<'a> {
        &self.asset1
    }

    pub fn asset2_tree(&self) -> &VisitTree<'a> {
        &self.asset2
    }

    pub fn base_value(&self, id: Diff3Id) -> Option<&'a Value> {
        self.node(id).base.map(|n| self.base.value(n))
    }

    pub fn asset1_value(&self, id: Diff3Id) -> Option<&'a Value> {
        self.node(id).asset1.map(|n| self.asset1.value(n))
    }

    pub fn asset2_value(&self, id: Diff3Id) -> Option<&'a Value> {
        self.node(id).asset2.map(|n| self.asset2.value(n))
    }

    /// Every node whose change is not `None`, in pre-order: the differing
    /// leaves, plus list nodes whose item order conflicts. A reorder on one
    /// side only is not a difference; see [`Diff3Node::reordered1`].
    ///
    /// Members come in declaration order; container items come in base
    /// order, then asset1's insertions, then asset2's.
    pub fn find_leaf_differences(&self) -> Vec<Diff3Id> {
        (0..self.nodes.len())
            .map(Diff3Id)
            .filter(|&id| self.node(id).change != ChangeType::None)
            .collect()
    }

    /// Nodes classified as conflicts, in pre-order.
    pub fn conflicts(&self) -> Vec<Diff3Id> {
        (0..self.nodes.len())
            .map(Diff3Id)
            .filter(|&id| self.node(id).change == ChangeType::Conflict)
            .collect()
    }

    /// `true` when no location differs on any side.
    pub fn is_empty(&self) -> bool {
        self.nodes.iter().all(|n| n.change == ChangeType::None)
    }

    /// Member `name` of object node `id`.
    pub fn member(&self, id: Diff3Id, name: &str) -> DiffResult<Diff3Id> {
        let node = self.node(id);
        node.children
            .iter()
            .copied()
            .find(|&c| self.node(c).path.member_name() == Some(name))
            .ok_or_else(|| DiffError::KeyNotFound(node.path.member(name).to_string()))
    }
}

/// Order of the base items both sides kept: in base order, in asset1's
/// order and in asset2's order, as base indices.
fn survivor_orders(slots: &[Slot]) -> [Vec<usize>; 3] {
    let order = |position: fn(&Slot) -> Option<usize>| {
        let mut kept: Vec<(usize, usize)> = slots
            .iter()
            .filter(|s| s.asset1.is_some() && s.asset2.is_some())
            .filter_map(|s| Some((position(s)?, s.base?)))
            .collect();
        kept.sort_unstable();
        kept.into_iter().map(|(_, base)| base).collect::<Vec<_>>()
    };
    [order(|s| s.base), order(|s| s.asset1), order(|s| s.asset2)]
}

/// Classify a leaf from side equalities.
pub fn classify(base_eq_asset1: bool, base_eq_asset2: bool, asset1_eq_asset2: bool) -> ChangeType {
    match (base_eq_asset1, base_eq_asset2) {
        (true, true) => ChangeType::None,
        (false, true) => ChangeType::MergeFromAsset1,
        (true, false) => ChangeType::MergeFromAsset2,
        (false, false) if asset1_eq_asset2 => ChangeType::MergeFromAsset1And2,
        (false, false) => ChangeType::Conflict,
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Forced {
    Asset1,
    Asset2,
}

struct Combiner<'t, 'a> {
    base: &'t VisitTree<'a>,
    asset1: &'t VisitTree<'a>,
    asset2: &'t VisitTree<'a>,
    d1: &'t DiffTree,
    d2: &'t DiffTree,
    override_mode: bool,
    nodes: Vec<Diff3Node>,
}

impl Combiner<'_, '_> {
    fn visit(&mut self, n1: Option<DiffNodeId>, n2: Option<DiffNodeId>, parent: Option<Diff3Id>) -> Diff3Id {
        let (d1, d2) = (self.d1, self.d2);
        let dn1 = n1.map(|n| d1.node(n));
        let dn2 = n2.map(|n| d2.node(n));
        let base = dn1.and_then(DiffNode::base).or_else(|| dn2.and_then(DiffNode::base));
        let asset1 = dn1.and_then(DiffNode::other);
        let asset2 = dn2.and_then(DiffNode::other);
        let path = match (base, asset1, asset2) {
            (Some(b), _, _) => self.base.node(b).path().clone(),
            (None, Some(x), _) => self.asset1.node(x).path().clone(),
            (None, None, Some(y)) => self.asset2.node(y).path().clone(),
            (None, None, None) => NodePath::root(),
        };

        let id = Diff3Id(self.nodes.len());
        self.nodes.push(Diff3Node {
            base,
            asset1,
            asset2,
            change: ChangeType::None,
            shape: Diff3Shape::Leaf,
            path,
            parent,
            children: Vec::new(),
            slots: Vec::new(),
            final_override: None,
            reordered1: false,
            reordered2: false,
        });

        let same1 = dn1.map_or(true, |n| n.kind() == DiffKind::Same);
        let same2 = dn2.map_or(true, |n| n.kind() == DiffKind::Same);
        let all_present = base.is_some() && asset1.is_some() && asset2.is_some();

        let mut forced = None;
        if let (true, Some(b), Some(x), Some(y)) = (self.override_mode, base, asset1, asset2) {
            if self.nodes[id.0].path.member_name().is_some() {
                let f0 = self.base.override_at(b);
                let f1 = self.asset1.override_at(x);
                let f2 = self.asset2.override_at(y);
                let mut final_flags = f1;
                if f2.is_sealed() || f1.is_sealed() {
                    forced = Some(Forced::Asset2);
                    final_flags = OverrideFlags::BASE | OverrideFlags::SEALED;
                } else if f1.is_new() {
                    forced = Some(Forced::Asset1);
                }
                // The template dropped its seal: a location that was only
                // sealed goes back to following the template.
                if f0.is_sealed() && !f2.is_sealed() && f1 == OverrideFlags::SEALED {
                    final_flags = OverrideFlags::BASE;
                }
                self.nodes[id.0].final_override = Some(final_flags);
            }
        }

        if let Some(side) = forced {
            let change = if self.assets_equal(asset1, asset2) {
                classify(same1, same2, true)
            } else {
                match side {
                    Forced::Asset1 => ChangeType::MergeFromAsset1,
                    Forced::Asset2 => ChangeType::MergeFromAsset2,
                }
            };
            self.nodes[id.0].change = change;
            return id;
        }

        let expanded = match (dn1, dn2) {
            (Some(a), Some(b)) if all_present => {
                let shape = a.shape();
                (shape != ShapeKind::Primitive && shape == b.shape()).then_some(shape)
            }
            _ => None,
        };
        let (Some(shape), Some(dn1), Some(dn2)) = (expanded, dn1, dn2) else {
            let eq12 = !(same1 && same2) && self.assets_equal(asset1, asset2);
            self.nodes[id.0].change = classify(same1, same2, eq12);
            return id;
        };

        match shape {
            ShapeKind::Object => {
                self.nodes[id.0].shape = Diff3Shape::Object;
                let pairs: Vec<_> = dn1.children().iter().copied().zip(dn2.children().iter().copied()).collect();
                let children = pairs
                    .into_iter()
                    .map(|(c1, c2)| self.visit(Some(c1), Some(c2), Some(id)))
                    .collect();
                self.nodes[id.0].children = children;
            }
            _ => self.visit_container(id, shape, dn1, dn2),
        }
        id
    }

    fn visit_container(&mut self, id: Diff3Id, shape: ShapeKind, dn1: &DiffNode, dn2: &DiffNode) {
        let node = &self.nodes[id.0];
        let (Some(b), Some(x), Some(y)) = (node.base, node.asset1, node.asset2) else {
            return;
        };
        let (Some(al1), Some(al2)) = (dn1.alignment(), dn2.alignment()) else {
            return;
        };
        let base_len = self.base.node(b).children().len();
        let slots = reconcile_sides(
            base_len,
            AlignedSide {
                tree: self.asset1,
                container: x,
                alignment: al1,
            },
            AlignedSide {
                tree: self.asset2,
                container: y,
                alignment: al2,
            },
        );

        let index = |dn: &DiffNode, side_len: usize| {
            let mut by_base = vec![None; base_len];
            let mut by_side = vec![None; side_len];
            for (pair, &child) in dn.alignment().map(|a| a.pairs.as_slice()).unwrap_or_default().iter().zip(dn.children()) {
                match (pair.base, pair.other) {
                    (Some(i), _) => by_base[i] = Some(child),
                    (None, Some(j)) => by_side[j] = Some(child),
                    (None, None) => {}
                }
            }
            (by_base, by_side)
        };
        let (base1, new1) = index(dn1, self.asset1.node(x).children().len());
        let (base2, new2) = index(dn2, self.asset2.node(y).children().len());

        let mut children = Vec::with_capacity(slots.len());
        for slot in &slots {
            let (c1, c2) = match slot.base {
                Some(i) => (base1[i], base2[i]),
                None => (slot.asset1.and_then(|j| new1[j]), slot.asset2.and_then(|j| new2[j])),
            };
            children.push(self.visit(c1, c2, Some(id)));
        }

        let node = &mut self.nodes[id.0];
        node.shape = if shape == ShapeKind::Dictionary {
            Diff3Shape::Dictionary
        } else {
            Diff3Shape::List
        };
        node.children = children;
        node.slots = slots;
        let [kept, order1, order2] = survivor_orders(&node.slots);
        node.reordered1 = order1 != kept;
        node.reordered2 = order2 != kept;
        if node.reordered1 && node.reordered2 && order1 != order2 {
            node.change = ChangeType::Conflict;
        }
    }

    fn assets_equal(&self, asset1: Option<NodeId>, asset2: Option<NodeId>) -> bool {
        match (asset1, asset2) {
            (Some(x), Some(y)) => values_equal(self.asset1, x, self.asset2, y),
            (None, None) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::tests::registry;
    use graft_types::{ItemId, Object, TypeRegistry};

    fn combine<'a>(reg: &TypeRegistry, base: &'a Value, a1: &'a Value, a2: &'a Value, config: &DiffConfig) -> Diff3Tree<'a> {
        let tb = VisitTree::build(reg, base, config).unwrap();
        let t1 = VisitTree::build(reg, a1, config).unwrap();
        let t2 = VisitTree::build(reg, a2, config).unwrap();
        let d1 = DiffTree::compute(&tb, &t1, config).unwrap();
        let d2 = DiffTree::compute(&tb, &t2, config).unwrap();
        Diff3Tree::combine(tb, t1, t2, &d1, &d2, config).unwrap()
    }

    fn differences(tree: &Diff3Tree<'_>) -> Vec<(String, ChangeType)> {
        tree.find_leaf_differences()
            .into_iter()
            .map(|id| (tree.node(id).path().to_string(), tree.node(id).change()))
            .collect()
    }

    fn vector(x: i64, y: i64, z: i64, w: i64) -> Value {
        Value::from(Object::new("Vector").with("X", x).with("Y", y).with("Z", z).with("W", w))
    }

    #[test]
    fn classification_table() {
        assert_eq!(classify(true, true, true), ChangeType::None);
        assert_eq!(classify(false, true, false), ChangeType::MergeFromAsset1);
        assert_eq!(classify(true, false, false), ChangeType::MergeFromAsset2);
        assert_eq!(classify(false, false, true), ChangeType::MergeFromAsset1And2);
        assert_eq!(classify(false, false, false), ChangeType::Conflict);
    }

    #[test]
    fn identical_inputs_have_no_differences() {
        let reg = registry();
        let v = vector(1, 2, 3, 4);
        let tree = combine(&reg, &v, &v, &v, &DiffConfig::default());
        assert!(tree.is_empty());
        assert_eq!(tree.node(tree.root()).shape(), Diff3Shape::Object);
    }

    #[test]
    fn per_member_classification() {
        let reg = registry();
        let base = vector(1, 2, 3, 4);
        let a1 = vector(5, 2, 6, 7);
        let a2 = vector(1, 8, 6, 9);
        let tree = combine(&reg, &base, &a1, &a2, &DiffConfig::default());
        assert_eq!(
            differences(&tree),
            vec![
                ("X".to_string(), ChangeType::MergeFromAsset1),
                ("Y".to_string(), ChangeType::MergeFromAsset2),
                ("Z".to_string(), ChangeType::MergeFromAsset1And2),
                ("W".to_string(), ChangeType::Conflict),
            ]
        );
        assert_eq!(tree.conflicts().len(), 1);
    }

    #[test]
    fn list_append_on_empty_base() {
        let reg = registry();
        let empty = Value::list(Vec::new());
        let a1 = Value::list([Value::from(7)]);
        let tree = combine(&reg, &empty, &a1, &empty, &DiffConfig::default());
        assert_eq!(differences(&tree), vec![("[0]".to_string(), ChangeType::MergeFromAsset1)]);
        let leaf = tree.find_leaf_differences()[0];
        assert_eq!(tree.asset1_value(leaf), Some(&Value::Int(7)));
        assert_eq!(tree.base_value(leaf), None);
    }

    #[test]
    fn identity_list_with_reorder_delete_and_append() {
        let reg = registry();
        let comp = |id: u128| Value::from(Object::new("Component").with("Id", ItemId::from_u128(id)));
        let base = Value::list([comp(1), comp(2), comp(3)]);
        let a1 = Value::list([comp(1), comp(2), comp(3), comp(4)]);
        let a2 = Value::list([comp(3), comp(2)]);
        let tree = combine(&reg, &base, &a1, &a2, &DiffConfig::default());
        let root = tree.node(tree.root());
        assert_eq!(root.shape(), Diff3Shape::List);
        assert!(root.reordered2() && !root.reordered1());
        assert_eq!(root.change(), ChangeType::None);
        assert_eq!(
            differences(&tree),
            vec![
                ("[0]".to_string(), ChangeType::MergeFromAsset2),
                ("[3]".to_string(), ChangeType::MergeFromAsset1),
            ]
        );
    }

    fn named(id: u128, name: &str) -> Object {
        Object::new("Component").with("Id", ItemId::from_u128(id)).with("Name", name)
    }

    #[test]
    fn swapped_items_report_only_their_edits() {
        let reg = registry();
        let list = |items: Vec<Object>| Value::from(Object::new("Asset").with("List", Value::list(items.into_iter().map(Value::from))));
        let base = list(vec![named(1, "Test1"), named(2, "Test2"), named(3, "Test3")]);
        let a1 = list(vec![
            named(2, "Test21").with_override("Name", OverrideFlags::NEW),
            named(1, "Test1"),
            named(3, "Test3"),
        ]);
        let tree = combine(&reg, &base, &a1, &base, &DiffConfig::override_mode());

        assert_eq!(differences(&tree), vec![("List[1].Name".to_string(), ChangeType::MergeFromAsset1)]);
        let items = tree.member(tree.root(), "List").unwrap();
        assert!(tree.node(items).reordered1());
        assert!(!tree.node(items).reordered2());
    }

    #[test]
    fn different_reorders_conflict_on_the_list() {
        let reg = registry();
        let comp = |id: u128| Value::from(named(id, "x"));
        let base = Value::list([comp(1), comp(2), comp(3)]);
        let a1 = Value::list([comp(2), comp(1), comp(3)]);
        let a2 = Value::list([comp(3), comp(1), comp(2)]);
        let tree = combine(&reg, &base, &a1, &a2, &DiffConfig::default());
        assert_eq!(differences(&tree), vec![("<root>".to_string(), ChangeType::Conflict)]);
        assert_eq!(tree.conflicts(), vec![tree.root()]);
        assert!(!tree.node(tree.root()).is_leaf());
    }

    #[test]
    fn same_reorder_on_both_sides_agrees() {
        let reg = registry();
        let comp = |id: u128| Value::from(named(id, "x"));
        let base = Value::list([comp(1), comp(2), comp(3)]);
        let moved = Value::list([comp(3), comp(1), comp(2)]);
        let tree = combine(&reg, &base, &moved, &moved, &DiffConfig::default());
        let root = tree.node(tree.root());
        assert!(root.reordered1() && root.reordered2());
        assert!(tree.is_empty());
    }

    #[test]
    fn reorder_among_items_the_other_side_deleted_is_not_a_move() {
        let reg = registry();
        let comp = |id: u128| Value::from(named(id, "x"));
        let base = Value::list([comp(1), comp(2), comp(3)]);
        let a1 = Value::list([comp(2), comp(1), comp(3)]);
        let a2 = Value::list([comp(3), comp(1)]);
        let tree = combine(&reg, &base, &a1, &a2, &DiffConfig::default());
        let root = tree.node(tree.root());
        assert!(!root.reordered1());
        assert!(root.reordered2());
        assert_eq!(tree.conflicts(), Vec::<Diff3Id>::new());
    }

    #[test]
    fn delete_racing_modify_is_conflict() {
        let reg = registry();
        let base = Value::dict([("a", Value::from(1)), ("b", Value::from(2))]);
        let a1 = Value::dict([("b", Value::from(2))]);
        let a2 = Value::dict([("a", Value::from(5)), ("b", Value::from(2))]);
        let tree = combine(&reg, &base, &a1, &a2, &DiffConfig::default());
        assert_eq!(differences(&tree), vec![("[\"a\"]".to_string(), ChangeType::Conflict)]);
    }

    #[test]
    fn delete_on_both_sides_agrees() {
        let reg = registry();
        let base = Value::dict([("a", Value::from(1))]);
        let empty = Value::Dict(Default::default());
        let tree = combine(&reg, &base, &empty, &empty, &DiffConfig::default());
        assert_eq!(differences(&tree), vec![("[\"a\"]".to_string(), ChangeType::MergeFromAsset1And2)]);
    }

    #[test]
    fn same_key_added_on_both_sides() {
        let reg = registry();
        let base = Value::Dict(Default::default());
        let a1 = Value::dict([("k", Value::from(1))]);
        let same = Value::dict([("k", Value::from(1))]);
        let other = Value::dict([("k", Value::from(2))]);
        let agreed = combine(&reg, &base, &a1, &same, &DiffConfig::default());
        assert_eq!(differences(&agreed), vec![("[\"k\"]".to_string(), ChangeType::MergeFromAsset1And2)]);
        let clashed = combine(&reg, &base, &a1, &other, &DiffConfig::default());
        assert_eq!(differences(&clashed), vec![("[\"k\"]".to_string(), ChangeType::Conflict)]);
    }

    #[test]
    fn type_swap_classified_as_leaf() {
        let reg = registry();
        let base = Value::from(Object::new("Asset").with("Child", vector(1, 1, 1, 1)));
        let a1 = Value::from(Object::new("Asset").with("Child", Object::new("Component").with("Name", "x")));
        let a2 = Value::from(Object::new("Asset").with("Child", Object::new("Component").with("Name", "y")));
        let tree = combine(&reg, &base, &a1, &a2, &DiffConfig::default());
        assert_eq!(differences(&tree), vec![("Child".to_string(), ChangeType::Conflict)]);
        let same = combine(&reg, &base, &a1, &a1, &DiffConfig::default());
        assert_eq!(differences(&same), vec![("Child".to_string(), ChangeType::MergeFromAsset1And2)]);
    }

    #[test]
    fn sealed_template_member_wins() {
        let reg = registry();
        let base = Value::from(Object::new("Asset").with("Value", 1));
        let a1 = Value::from(Object::new("Asset").with("Value", 2).with_override("Value", OverrideFlags::NEW));
        let a2 = Value::from(Object::new("Asset").with("Value", 3).with_override("Value", OverrideFlags::SEALED));
        let tree = combine(&reg, &base, &a1, &a2, &DiffConfig::override_mode());
        let value = tree.member(tree.root(), "Value").unwrap();
        assert_eq!(tree.node(value).change(), ChangeType::MergeFromAsset2);
        assert_eq!(tree.node(value).final_override(), Some(OverrideFlags::SEALED));
    }

    #[test]
    fn unflagged_local_edit_follows_plain_table() {
        let reg = registry();
        let base = Value::from(Object::new("Asset").with("Value", 1));
        let a1 = Value::from(Object::new("Asset").with("Value", 2));
        let tree = combine(&reg, &base, &a1, &base, &DiffConfig::override_mode());
        let value = tree.member(tree.root(), "Value").unwrap();
        assert_eq!(tree.node(value).change(), ChangeType::MergeFromAsset1);
        assert_eq!(tree.node(value).final_override(), Some(OverrideFlags::BASE));
    }

    #[test]
    fn new_member_keeps_asset1() {
        let reg = registry();
        let base = Value::from(Object::new("Asset").with("Value", 1));
        let a1 = Value::from(Object::new("Asset").with("Value", 2).with_override("Value", OverrideFlags::NEW));
        let a2 = Value::from(Object::new("Asset").with("Value", 3));
        let plain = combine(&reg, &base, &a1, &a2, &DiffConfig::default());
        let value = plain.member(plain.root(), "Value").unwrap();
        assert_eq!(plain.node(value).change(), ChangeType::Conflict);
        assert_eq!(plain.node(value).final_override(), None);

        let tree = combine(&reg, &base, &a1, &a2, &DiffConfig::override_mode());
        let value = tree.member(tree.root(), "Value").unwrap();
        assert_eq!(tree.node(value).change(), ChangeType::MergeFromAsset1);
        assert_eq!(tree.node(value).final_override(), Some(OverrideFlags::NEW));
    }

    #[test]
    fn unsealed_template_reverts_flags_to_base() {
        let reg = registry();
        let sealed = |v: i64| Value::from(Object::new("Asset").with("Value", v).with_override("Value", OverrideFlags::SEALED));
        let base = sealed(1);
        let a1 = sealed(1);
        let a2 = Value::from(Object::new("Asset").with("Value", 4));
        let tree = combine(&reg, &base, &a1, &a2, &DiffConfig::override_mode());
        let value = tree.member(tree.root(), "Value").unwrap();
        assert_eq!(tree.node(value).change(), ChangeType::MergeFromAsset2);
        assert_eq!(tree.node(value).final_override(), Some(OverrideFlags::BASE));
    }

    #[test]
    fn forced_composite_member_is_one_leaf() {
        let reg = registry();
        let base = Value::from(Object::new("Asset").with("Child", vector(1, 1, 1, 1)));
        let a1 = Value::from(
            Object::new("Asset")
                .with("Child", vector(2, 1, 1, 1))
                .with_override("Child", OverrideFlags::NEW),
        );
        let a2 = Value::from(Object::new("Asset").with("Child", vector(1, 3, 1, 1)));
        let tree = combine(&reg, &base, &a1, &a2, &DiffConfig::override_mode());
        assert_eq!(differences(&tree), vec![("Child".to_string(), ChangeType::MergeFromAsset1)]);
        let child = tree.member(tree.root(), "Child").unwrap();
        assert!(tree.node(child).is_leaf());
        assert!(tree.node(child).children().is_empty());
    }

    #[test]
    fn member_lookup_errors() {
        let reg = registry();
        let v = vector(1, 2, 3, 4);
        let tree = combine(&reg, &v, &v, &v, &DiffConfig::default());
        assert!(tree.member(tree.root(), "X").is_ok());
        let err = tree.member(tree.root(), "Nope").unwrap_err();
        assert!(matches!(err, DiffError::KeyNotFound(ref key) if key == "Nope"));
    }

    #[test]
    fn diff_over_other_trees_is_rejected() {
        let reg = registry();
        let config = DiffConfig::default();
        let small = Value::from(1);
        let big = vector(1, 2, 3, 4);
        let tb = VisitTree::build(&reg, &small, &config).unwrap();
        let t1 = VisitTree::build(&reg, &small, &config).unwrap();
        let t2 = VisitTree::build(&reg, &small, &config).unwrap();
        let big_tree = VisitTree::build(&reg, &big, &config).unwrap();
        let foreign = DiffTree::compute(&big_tree, &big_tree, &config).unwrap();
        let d2 = DiffTree::compute(&tb, &t2, &config).unwrap();
        let err = Diff3Tree::combine(tb, t1, t2, &foreign, &d2, &config).unwrap_err();
        assert!(matches!(err, DiffError::InvalidGraph { .. }));
    }
}
