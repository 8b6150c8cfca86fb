//! Printable locations inside an object graph.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One step from a parent value to a child value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathSegment {
    /// A named object member.
    Member(String),
    /// A list item at a position.
    Item(usize),
    /// A dictionary entry under a key.
    Entry(String),
}

/// Location of a value, as the sequence of steps taken from the root.
///
/// Displays as `Components[2].Name` or `Parameters["speed"]`; the root
/// itself displays as `<root>`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodePath {
    segments: Vec<PathSegment>,
}

impl NodePath {
    /// The path of a graph root.
    pub fn root() -> Self {
        Self::default()
    }

    /// The path of a child reached through `segment`.
    pub fn child(&self, segment: PathSegment) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend_from_slice(&self.segments);
        segments.push(segment);
        Self { segments }
    }

    pub fn member(&self, name: impl Into<String>) -> Self {
        self.child(PathSegment::Member(name.into()))
    }

    pub fn item(&self, index: usize) -> Self {
        self.child(PathSegment::Item(index))
    }

    pub fn entry(&self, key: impl Into<String>) -> Self {
        self.child(PathSegment::Entry(key.into()))
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of steps from the root.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// The final step, if any.
    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// Name of the member this path ends on, if it ends on a member.
    pub fn member_name(&self) -> Option<&str> {
        match self.segments.last() {
            Some(PathSegment::Member(name)) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("<root>");
        }
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Member(name) if i == 0 => write!(f, "{name}")?,
                PathSegment::Member(name) => write!(f, ".{name}")?,
                PathSegment::Item(index) => write!(f, "[{index}]")?,
                PathSegment::Entry(key) => write!(f, "[{key:?}]")?,
            }
        }
        Ok(())
    }
}
