//! Node matcher: scores how similar two independently built nodes are.
//!
//! The score is a heuristic used to decide whether two list items without
//! stable identifiers are the same item edited in place. It never decides a
//! change classification on its own.

use std::cmp::Ordering;
use std::ops::{Add, AddAssign};

use graft_types::{ShapeKind, Value};

use crate::node::{NodeId, NodeSlot, VisitTree};

/// Agreeing leaf comparisons out of attempted ones.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DataMatch {
    pub count: usize,
    pub total: usize,
}

impl DataMatch {
    pub const MATCH_ONE: Self = Self { count: 1, total: 1 };
    pub const NO_MATCH_ONE: Self = Self { count: 0, total: 1 };

    pub const fn new(count: usize, total: usize) -> Self {
        Self { count, total }
    }

    /// Every attempted comparison agreed.
    pub fn is_full(&self) -> bool {
        self.count == self.total
    }

    /// Fraction of agreeing comparisons; an empty match counts as full.
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.count as f64 / self.total as f64
        }
    }
}

impl Add for DataMatch {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            count: self.count + rhs.count,
            total: self.total + rhs.total,
        }
    }
}

impl AddAssign for DataMatch {
    fn add_assign(&mut self, rhs: Self) {
        self.count += rhs.count;
        self.total += rhs.total;
    }
}

/// Compare node `a` of `tree_a` with node `b` of `tree_b` by value.
///
/// - Primitives contribute `(1,1)` when equal, `(0,1)` otherwise.
/// - Null against anything but null never matches.
/// - Values of different shape or type tag are replaced as a whole: `(0,1)`.
/// - Objects sum their member matches.
/// - Lists compare index by index. An equal item contributes `(1,1)`; a
///   differing item contributes `(0,2)`, once for the removed value and once
///   for the added one. Items beyond the shorter list contribute `(0,1)`.
/// - Dictionaries compare entries by key; a key on one side only is `(0,1)`.
pub fn match_nodes(tree_a: &VisitTree<'_>, a: NodeId, tree_b: &VisitTree<'_>, b: NodeId) -> DataMatch {
    let na = tree_a.node(a);
    let nb = tree_b.node(b);

    match (na.is_null(), nb.is_null()) {
        (true, true) => return DataMatch::MATCH_ONE,
        (true, false) | (false, true) => return DataMatch::NO_MATCH_ONE,
        (false, false) => {}
    }
    if na.kind() != nb.kind() || na.type_tag() != nb.type_tag() {
        return DataMatch::NO_MATCH_ONE;
    }

    match na.kind() {
        ShapeKind::Primitive => {
            if primitive_eq(na.value(), nb.value()) {
                DataMatch::MATCH_ONE
            } else {
                DataMatch::NO_MATCH_ONE
            }
        }
        ShapeKind::Object => {
            let mut total = DataMatch::default();
            for (&ma, &mb) in na.members().iter().zip(nb.members()) {
                total += match_nodes(tree_a, ma, tree_b, mb);
            }
            non_empty(total)
        }
        ShapeKind::List => {
            let (ia, ib) = (na.items(), nb.items());
            let mut total = DataMatch::default();
            for (&x, &y) in ia.iter().zip(ib) {
                total += if match_nodes(tree_a, x, tree_b, y).is_full() {
                    DataMatch::MATCH_ONE
                } else {
                    DataMatch::new(0, 2)
                };
            }
            total.total += ia.len().abs_diff(ib.len());
            non_empty(total)
        }
        ShapeKind::Dictionary => {
            let (ea, eb) = (na.entries(), nb.entries());
            let (mut i, mut j) = (0, 0);
            let mut total = DataMatch::default();
            while i < ea.len() && j < eb.len() {
                match entry_key(tree_a, ea[i]).cmp(entry_key(tree_b, eb[j])) {
                    Ordering::Equal => {
                        total += match_nodes(tree_a, ea[i], tree_b, eb[j]);
                        i += 1;
                        j += 1;
                    }
                    Ordering::Less => {
                        total += DataMatch::NO_MATCH_ONE;
                        i += 1;
                    }
                    Ordering::Greater => {
                        total += DataMatch::NO_MATCH_ONE;
                        j += 1;
                    }
                }
            }
            total.total += (ea.len() - i) + (eb.len() - j);
            non_empty(total)
        }
    }
}

/// `true` when the two nodes hold equal content.
pub fn values_equal(tree_a: &VisitTree<'_>, a: NodeId, tree_b: &VisitTree<'_>, b: NodeId) -> bool {
    match_nodes(tree_a, a, tree_b, b).is_full()
}

/// Equality for primitive values. Floats compare bitwise so that a value
/// always equals itself.
pub(crate) fn primitive_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Float(x), Value::Float(y)) => x.to_bits() == y.to_bits(),
        _ => a == b,
    }
}

pub(crate) fn entry_key<'t>(tree: &'t VisitTree<'_>, id: NodeId) -> &'t str {
    match tree.node(id).slot() {
        NodeSlot::Entry(key) => key,
        _ => "",
    }
}

fn non_empty(m: DataMatch) -> DataMatch {
    if m.total == 0 {
        DataMatch::MATCH_ONE
    } else {
        m
    }
}
