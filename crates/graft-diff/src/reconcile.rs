//! List and dictionary reconciliation.
//!
//! Establishes which items of two or three container instances are "the
//! same item", independently of where each side moved, inserted or removed
//! items.
//!
//! Two-way alignment ([`align`]) picks one of three strategies:
//!
//! - [`AlignStrategy::Key`]: dictionary entries correspond by key.
//! - [`AlignStrategy::Identity`]: every non-null list item carries an
//!   [`ItemId`]; items correspond by id, so arbitrary reordering is
//!   recognised. Null items get an id derived from their position.
//! - [`AlignStrategy::Content`]: anything else. A Myers diff over content
//!   digests anchors unchanged items; inside a replaced run, items at the
//!   same offset are paired when they look like the same item edited.
//!
//! Three-way reconciliation ([`reconcile`]) joins two alignments on the base
//! index and pairs items inserted on both sides. [`merged_order`] decides the
//! order the merged container emits those slots in.

use std::collections::{HashMap, VecDeque};

use graft_types::{ContentDigest, ItemId, ShapeKind};
use similar::{capture_diff_slices, Algorithm, DiffTag};

use crate::matcher::{entry_key, match_nodes};
use crate::node::{NodeId, VisitTree};

/// How items of two containers were put in correspondence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AlignStrategy {
    Key,
    Identity,
    Content,
}

/// One base item and its counterpart, or an item present on one side only.
///
/// Indices are positions among the container's children.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pair {
    pub base: Option<usize>,
    pub other: Option<usize>,
}

/// Correspondence between a base container and a derived one.
///
/// `pairs` starts with one entry per base item, in base order, followed by
/// the items only the other side has, in that side's order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Alignment {
    pub strategy: AlignStrategy,
    pub pairs: Vec<Pair>,
}

impl Alignment {
    /// Counterpart of base item `base`, if it survived.
    pub fn counterpart(&self, base: usize) -> Option<usize> {
        self.pairs
            .iter()
            .find(|p| p.base == Some(base))
            .and_then(|p| p.other)
    }

    /// Items present only on the other side.
    pub fn inserted(&self) -> impl Iterator<Item = usize> + '_ {
        self.pairs.iter().filter(|p| p.base.is_none()).filter_map(|p| p.other)
    }

    /// Items present only on the base side.
    pub fn deleted(&self) -> impl Iterator<Item = usize> + '_ {
        self.pairs.iter().filter(|p| p.other.is_none()).filter_map(|p| p.base)
    }

    /// `true` when surviving base items no longer appear in base order.
    pub fn is_reordered(&self) -> bool {
        let mut last = None;
        for other in self.pairs.iter().filter(|p| p.base.is_some()).filter_map(|p| p.other) {
            if last.is_some_and(|prev| other < prev) {
                return true;
            }
            last = Some(other);
        }
        false
    }
}

/// Align the children of container `base` with those of container `other`.
///
/// `threshold` is the minimum matcher ratio for two unidentified items in a
/// replaced run to count as one item edited in place.
pub fn align(
    base_tree: &VisitTree<'_>,
    base: NodeId,
    other_tree: &VisitTree<'_>,
    other: NodeId,
    threshold: f64,
) -> Alignment {
    let base_items = base_tree.node(base).children();
    let other_items = other_tree.node(other).children();

    if base_tree.node(base).kind() == ShapeKind::Dictionary {
        let keys = |tree: &VisitTree<'_>, items: &[NodeId]| -> Vec<String> {
            items.iter().map(|&n| entry_key(tree, n).to_string()).collect()
        };
        return Alignment {
            strategy: AlignStrategy::Key,
            pairs: align_keys(&keys(base_tree, base_items), &keys(other_tree, other_items)),
        };
    }

    if let (Some(base_ids), Some(other_ids)) = (
        identity_keys(base_tree, base_items),
        identity_keys(other_tree, other_items),
    ) {
        return Alignment {
            strategy: AlignStrategy::Identity,
            pairs: align_keys(&base_ids, &other_ids),
        };
    }

    Alignment {
        strategy: AlignStrategy::Content,
        pairs: align_content(base_tree, base_items, other_tree, other_items, threshold),
    }
}

/// Identity of every item, or `None` if some non-null item has no id.
fn identity_keys(tree: &VisitTree<'_>, items: &[NodeId]) -> Option<Vec<ItemId>> {
    items
        .iter()
        .enumerate()
        .map(|(index, &n)| {
            let node = tree.node(n);
            if node.is_null() {
                Some(ItemId::synthetic(index))
            } else {
                node.item_id()
            }
        })
        .collect()
}

/// Match equal keys. Repeated keys pair up in order of occurrence.
fn align_keys<K: Eq + std::hash::Hash + Clone>(base: &[K], other: &[K]) -> Vec<Pair> {
    let mut queues: HashMap<K, VecDeque<usize>> = HashMap::new();
    for (index, key) in other.iter().enumerate() {
        queues.entry(key.clone()).or_default().push_back(index);
    }
    let matched = base
        .iter()
        .map(|key| queues.get_mut(key).and_then(VecDeque::pop_front))
        .collect();
    canonical(matched, other.len())
}

fn align_content(
    base_tree: &VisitTree<'_>,
    base_items: &[NodeId],
    other_tree: &VisitTree<'_>,
    other_items: &[NodeId],
    threshold: f64,
) -> Vec<Pair> {
    let digests = |tree: &VisitTree<'_>, items: &[NodeId]| -> Vec<ContentDigest> {
        items.iter().map(|&n| ContentDigest::of(tree.value(n))).collect()
    };
    let old = digests(base_tree, base_items);
    let new = digests(other_tree, other_items);

    let mut matched = vec![None; base_items.len()];
    for op in capture_diff_slices(Algorithm::Myers, &old, &new) {
        let (tag, old_range, new_range) = op.as_tag_tuple();
        match tag {
            DiffTag::Equal => {
                for (o, n) in old_range.zip(new_range) {
                    matched[o] = Some(n);
                }
            }
            DiffTag::Replace => {
                for (o, n) in old_range.zip(new_range) {
                    let (a, b) = (base_items[o], other_items[n]);
                    if same_item(base_tree, a, other_tree, b, threshold) {
                        matched[o] = Some(n);
                    }
                }
            }
            DiffTag::Delete | DiffTag::Insert => {}
        }
    }
    canonical(matched, other_items.len())
}

/// Whether two differing items at the same spot are one item edited.
fn same_item(
    base_tree: &VisitTree<'_>,
    a: NodeId,
    other_tree: &VisitTree<'_>,
    b: NodeId,
    threshold: f64,
) -> bool {
    let (na, nb) = (base_tree.node(a), other_tree.node(b));
    if na.kind() == ShapeKind::Primitive && nb.kind() == ShapeKind::Primitive {
        return true;
    }
    na.kind() == nb.kind()
        && na.type_tag() == nb.type_tag()
        && match_nodes(base_tree, a, other_tree, b).ratio() >= threshold
}

/// Lay out base-indexed matches followed by unmatched other items.
fn canonical(matched: Vec<Option<usize>>, other_len: usize) -> Vec<Pair> {
    let mut taken = vec![false; other_len];
    for &n in matched.iter().flatten() {
        taken[n] = true;
    }
    let mut pairs: Vec<Pair> = matched
        .into_iter()
        .enumerate()
        .map(|(b, other)| Pair {
            base: Some(b),
            other,
        })
        .collect();
    pairs.extend(
        (0..other_len)
            .filter(|&n| !taken[n])
            .map(|n| Pair {
                base: None,
                other: Some(n),
            }),
    );
    pairs
}

/// One item position across base, asset1 and asset2.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Slot {
    pub base: Option<usize>,
    pub asset1: Option<usize>,
    pub asset2: Option<usize>,
}

/// Join two alignments sharing a base container of `base_len` items.
///
/// Slots come in base order first, then asset1's insertions in asset1 order
/// (each joined with the first unclaimed asset2 insertion `pair_new` accepts),
/// then the remaining asset2 insertions.
pub fn reconcile(
    base_len: usize,
    first: &[Pair],
    second: &[Pair],
    pair_new: impl Fn(usize, usize) -> bool,
) -> Vec<Slot> {
    let survivors = |pairs: &[Pair]| {
        let mut by_base = vec![None; base_len];
        for pair in pairs {
            if let (Some(b), Some(o)) = (pair.base, pair.other) {
                if b < base_len {
                    by_base[b] = Some(o);
                }
            }
        }
        by_base
    };
    let inserted = |pairs: &[Pair]| -> Vec<usize> {
        pairs.iter().filter(|p| p.base.is_none()).filter_map(|p| p.other).collect()
    };

    let (s1, s2) = (survivors(first), survivors(second));
    let mut slots: Vec<Slot> = (0..base_len)
        .map(|b| Slot {
            base: Some(b),
            asset1: s1[b],
            asset2: s2[b],
        })
        .collect();

    let new2 = inserted(second);
    let mut claimed = vec![false; new2.len()];
    for i in inserted(first) {
        let partner = (0..new2.len()).find(|&k| !claimed[k] && pair_new(i, new2[k]));
        if let Some(k) = partner {
            claimed[k] = true;
        }
        slots.push(Slot {
            base: None,
            asset1: Some(i),
            asset2: partner.map(|k| new2[k]),
        });
    }
    for (k, &j) in new2.iter().enumerate() {
        if !claimed[k] {
            slots.push(Slot {
                base: None,
                asset1: None,
                asset2: Some(j),
            });
        }
    }
    slots
}

/// One side of a three-way reconciliation.
#[derive(Clone, Copy)]
pub struct AlignedSide<'t, 'a> {
    pub tree: &'t VisitTree<'a>,
    pub container: NodeId,
    pub alignment: &'t Alignment,
}

/// Reconcile two aligned sides, pairing insertions by the strongest key
/// both items share: the entry key, or the item id. Insertions without ids
/// pair by their position in each side's own list, and only when both
/// sides were aligned by content.
pub fn reconcile_sides(base_len: usize, first: AlignedSide<'_, '_>, second: AlignedSide<'_, '_>) -> Vec<Slot> {
    let items1 = first.tree.node(first.container).children();
    let items2 = second.tree.node(second.container).children();
    let id_at = |tree: &VisitTree<'_>, items: &[NodeId], i: usize| {
        let node = tree.node(items[i]);
        if node.is_null() {
            Some(ItemId::synthetic(i))
        } else {
            node.item_id()
        }
    };

    let (p1, p2) = (&first.alignment.pairs, &second.alignment.pairs);
    match (first.alignment.strategy, second.alignment.strategy) {
        (AlignStrategy::Key, AlignStrategy::Key) => reconcile(base_len, p1, p2, |i, j| {
            entry_key(first.tree, items1[i]) == entry_key(second.tree, items2[j])
        }),
        (s1, s2) => {
            let positional = s1 == AlignStrategy::Content && s2 == AlignStrategy::Content;
            reconcile(base_len, p1, p2, |i, j| {
                match (id_at(first.tree, items1, i), id_at(second.tree, items2, j)) {
                    (Some(a), Some(b)) => a == b,
                    (None, None) => positional && i == j,
                    _ => false,
                }
            })
        }
    }
}

/// Align and reconcile three containers in one call.
pub fn reconcile_containers(
    base_tree: &VisitTree<'_>,
    base: NodeId,
    tree1: &VisitTree<'_>,
    container1: NodeId,
    tree2: &VisitTree<'_>,
    container2: NodeId,
    threshold: f64,
) -> Vec<Slot> {
    let al1 = align(base_tree, base, tree1, container1, threshold);
    let al2 = align(base_tree, base, tree2, container2, threshold);
    reconcile_sides(
        base_tree.node(base).children().len(),
        AlignedSide {
            tree: tree1,
            container: container1,
            alignment: &al1,
        },
        AlignedSide {
            tree: tree2,
            container: container2,
            alignment: &al2,
        },
    )
}

type Position = fn(&Slot) -> Option<usize>;

fn asset1_position(slot: &Slot) -> Option<usize> {
    slot.asset1
}

fn asset2_position(slot: &Slot) -> Option<usize> {
    slot.asset2
}

/// Order in which a merged container emits `slots` (indices into `slots`).
///
/// Items present on the preferred side form the skeleton, in that side's
/// order. Items only the other side has are placed right before the next
/// item (in their own side's order) that belongs to the skeleton, or after
/// the skeleton when none follows. Base-only slots come last. Callers drop
/// the slots whose merged value is absent.
pub fn merged_order(slots: &[Slot], prefer_asset2: bool) -> Vec<usize> {
    let (preferred, secondary): (Position, Position) = if prefer_asset2 {
        (asset2_position, asset1_position)
    } else {
        (asset1_position, asset2_position)
    };

    let mut skeleton: Vec<usize> = (0..slots.len()).filter(|&i| preferred(&slots[i]).is_some()).collect();
    skeleton.sort_by_key(|&i| preferred(&slots[i]));

    let mut followers: Vec<usize> = (0..slots.len())
        .filter(|&i| preferred(&slots[i]).is_none() && secondary(&slots[i]).is_some())
        .collect();
    followers.sort_by_key(|&i| secondary(&slots[i]));

    let mut anchored: HashMap<usize, Vec<usize>> = HashMap::new();
    let mut tail = Vec::new();
    for f in followers {
        let pos = secondary(&slots[f]);
        let anchor = skeleton
            .iter()
            .copied()
            .filter(|&s| secondary(&slots[s]) > pos)
            .min_by_key(|&s| secondary(&slots[s]));
        match anchor {
            Some(s) => anchored.entry(s).or_default().push(f),
            None => tail.push(f),
        }
    }

    let mut order = Vec::with_capacity(slots.len());
    for s in skeleton {
        if let Some(before) = anchored.remove(&s) {
            order.extend(before);
        }
        order.push(s);
    }
    order.extend(tail);
    order.extend((0..slots.len()).filter(|&i| preferred(&slots[i]).is_none() && secondary(&slots[i]).is_none()));
    order
}
