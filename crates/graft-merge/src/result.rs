use graft_types::{NodePath, PathSegment, Value};
use serde::{Deserialize, Serialize};

use crate::error::{MergeConflict, MergeError};

/// Outcome of a merge: the merged graph plus every unresolved conflict.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MergeResult {
    pub asset: Value,
    /// Conflicts in the order the merge met them (pre-order).
    pub errors: Vec<MergeConflict>,
}

impl MergeResult {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// The merged value at `path`.
    ///
    /// Unset object members read as `Null`; a member the merged object does
    /// not have, an out-of-range item or a missing key is an error.
    pub fn value_at(&self, path: &NodePath) -> Result<&Value, MergeError> {
        static NULL: Value = Value::Null;
        let mut current = &self.asset;
        for (depth, segment) in path.segments().iter().enumerate() {
            let next = match (segment, current) {
                (PathSegment::Member(name), Value::Object(obj)) => Some(obj.get(name).unwrap_or(&NULL)),
                (PathSegment::Item(index), Value::List(items)) => items.get(*index),
                (PathSegment::Entry(key), Value::Dict(entries)) => entries.get(key),
                _ => None,
            };
            current = next.ok_or_else(|| {
                let mut missing = NodePath::root();
                for s in &path.segments()[..=depth] {
                    missing = missing.child(s.clone());
                }
                MergeError::KeyNotFound(missing.to_string())
            })?;
        }
        Ok(current)
    }

    /// The conflict recorded at `path`, if any.
    pub fn conflict_at(&self, path: &NodePath) -> Option<&MergeConflict> {
        self.errors.iter().find(|c| &c.path == path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graft_types::Object;

    fn result() -> MergeResult {
        MergeResult {
            asset: Value::from(
                Object::new("Asset")
                    .with("List", Value::list([Value::from(1)]))
                    .with("Map", Value::dict([("k", Value::from(2))])),
            ),
            errors: Vec::new(),
        }
    }

    #[test]
    fn value_at_walks_segments() {
        let r = result();
        assert_eq!(r.value_at(&NodePath::root().member("List").item(0)).unwrap(), &Value::Int(1));
        assert_eq!(r.value_at(&NodePath::root().member("Map").entry("k")).unwrap(), &Value::Int(2));
        assert_eq!(r.value_at(&NodePath::root().member("Unset")).unwrap(), &Value::Null);
        assert!(!r.has_errors());
    }

    #[test]
    fn value_at_reports_missing_location() {
        let r = result();
        let err = r.value_at(&NodePath::root().member("List").item(3).member("X")).unwrap_err();
        assert!(matches!(err, MergeError::KeyNotFound(ref key) if key == "List[3]"));
        let err = r.value_at(&NodePath::root().member("Map").entry("nope")).unwrap_err();
        assert!(matches!(err, MergeError::KeyNotFound(_)));
    }
}
