use std::fmt;

use blake3::Hasher;
use serde::{Deserialize, Serialize};

use crate::value::Value;

/// BLAKE3 digest of a value's content.
///
/// Two values with the same content produce the same digest. Override flags
/// are authoring metadata, not content, and do not contribute; an unset
/// object field and a field explicitly set to `Null` hash the same.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentDigest([u8; 32]);

impl ContentDigest {
    /// Digest the content of `value`.
    pub fn of(value: &Value) -> Self {
        let mut hasher = Hasher::new();
        hasher.update(b"graft-content-v1:");
        feed(&mut hasher, value);
        Self(*hasher.finalize().as_bytes())
    }

    /// The raw 32-byte hash.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

fn feed(hasher: &mut Hasher, value: &Value) {
    match value {
        Value::Null => {
            hasher.update(&[0]);
        }
        Value::Bool(b) => {
            hasher.update(&[1, u8::from(*b)]);
        }
        Value::Int(i) => {
            hasher.update(&[2]);
            hasher.update(&i.to_le_bytes());
        }
        Value::Float(v) => {
            hasher.update(&[3]);
            hasher.update(&v.to_bits().to_le_bytes());
        }
        Value::Text(s) => {
            hasher.update(&[4]);
            feed_str(hasher, s);
        }
        Value::Id(id) => {
            hasher.update(&[5]);
            hasher.update(id.as_uuid().as_bytes());
        }
        Value::Object(obj) => {
            hasher.update(&[6]);
            feed_str(hasher, &obj.type_name);
            for (name, field) in obj.fields.iter().filter(|(_, v)| !v.is_null()) {
                feed_str(hasher, name);
                feed(hasher, field);
            }
            hasher.update(&[0xff]);
        }
        Value::List(items) => {
            hasher.update(&[7]);
            hasher.update(&(items.len() as u64).to_le_bytes());
            for item in items {
                feed(hasher, item);
            }
        }
        Value::Dict(entries) => {
            hasher.update(&[8]);
            hasher.update(&(entries.len() as u64).to_le_bytes());
            for (key, entry) in entries {
                feed_str(hasher, key);
                feed(hasher, entry);
            }
        }
    }
}

fn feed_str(hasher: &mut Hasher, s: &str) {
    hasher.update(&(s.len() as u64).to_le_bytes());
    hasher.update(s.as_bytes());
}

impl fmt::Debug for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentDigest({})", self.short_hex())
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overrides::OverrideFlags;
    use crate::value::Object;
    use proptest::prelude::*;

    #[test]
    fn same_content_same_digest() {
        let a = Value::from(Object::new("T").with("A", 1).with("B", "x"));
        let b = Value::from(Object::new("T").with("B", "x").with("A", 1));
        assert_eq!(ContentDigest::of(&a), ContentDigest::of(&b));
    }

    #[test]
    fn different_content_different_digest() {
        let a = Value::from(Object::new("T").with("A", 1));
        let b = Value::from(Object::new("T").with("A", 2));
        assert_ne!(ContentDigest::of(&a), ContentDigest::of(&b));
    }

    #[test]
    fn type_name_is_content() {
        let a = Value::from(Object::new("A"));
        let b = Value::from(Object::new("B"));
        assert_ne!(ContentDigest::of(&a), ContentDigest::of(&b));
    }

    #[test]
    fn overrides_are_not_content() {
        let a = Value::from(Object::new("T").with("A", 1));
        let b = Value::from(Object::new("T").with("A", 1).with_override("A", OverrideFlags::NEW));
        assert_eq!(ContentDigest::of(&a), ContentDigest::of(&b));
    }

    #[test]
    fn explicit_null_field_equals_unset() {
        let a = Value::from(Object::new("T"));
        let b = Value::from(Object::new("T").with("A", Value::Null));
        assert_eq!(ContentDigest::of(&a), ContentDigest::of(&b));
    }

    #[test]
    fn int_and_text_do_not_collide() {
        assert_ne!(ContentDigest::of(&Value::Int(1)), ContentDigest::of(&Value::from("1")));
    }

    #[test]
    fn short_hex_length() {
        assert_eq!(ContentDigest::of(&Value::Null).short_hex().len(), 8);
    }

    proptest! {
        #[test]
        fn digest_tracks_text_list_content(a in prop::collection::vec("[a-c]{0,3}", 0..4), b in prop::collection::vec("[a-c]{0,3}", 0..4)) {
            let va = Value::list(a.iter().map(|s| Value::from(s.as_str())));
            let vb = Value::list(b.iter().map(|s| Value::from(s.as_str())));
            prop_assert_eq!(ContentDigest::of(&va) == ContentDigest::of(&vb), a == b);
        }

        #[test]
        fn digest_survives_json(values in prop::collection::vec(any::<i64>(), 0..8)) {
            let value = Value::list(values.into_iter().map(Value::from));
            let json = serde_json::to_string(&value).unwrap();
            let parsed: Value = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(ContentDigest::of(&parsed), ContentDigest::of(&value));
        }
    }
}
