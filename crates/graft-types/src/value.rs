//! The object graph model.
//!
//! A [`Value`] is a tree: objects own their fields, lists own their items,
//! dictionaries own their entries. Asset graphs are acyclic, so ownership
//! is enough; identity is carried explicitly through [`ItemId`] values.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::id::ItemId;
use crate::overrides::OverrideFlags;

/// A value reachable while walking an asset graph.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Id(ItemId),
    Object(Object),
    List(Vec<Value>),
    Dict(BTreeMap<String, Value>),
}

impl Value {
    /// Build a list value.
    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Value::List(items.into_iter().collect())
    }

    /// Build a dictionary value.
    pub fn dict<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Dict(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Runtime type tag.
    ///
    /// Objects report their declared type name; everything else reports a
    /// fixed name for its variant. Two values with different tags are never
    /// compared member by member.
    pub fn type_tag(&self) -> &str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Id(_) => "id",
            Value::Object(obj) => &obj.type_name,
            Value::List(_) => "list",
            Value::Dict(_) => "dict",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_id(&self) -> Option<ItemId> {
        match self {
            Value::Id(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut Object> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Dict(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_dict_mut(&mut self) -> Option<&mut BTreeMap<String, Value>> {
        match self {
            Value::Dict(map) => Some(map),
            _ => None,
        }
    }

    /// Field of an object value. `None` for non-objects and unset fields.
    pub fn get(&self, member: &str) -> Option<&Value> {
        self.as_object().and_then(|obj| obj.get(member))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<ItemId> for Value {
    fn from(v: ItemId) -> Self {
        Value::Id(v)
    }
}

impl From<Object> for Value {
    fn from(v: Object) -> Self {
        Value::Object(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

/// An instance of a registered object type.
///
/// Fields are keyed by member name; the declaration order of members lives
/// in the type's [`ObjectDescriptor`](crate::ObjectDescriptor), not here.
/// An unset field reads as [`Value::Null`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Object {
    /// The runtime type of this instance.
    pub type_name: String,
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
    /// Override flags per member. Absent members read as `BASE`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub overrides: BTreeMap<String, OverrideFlags>,
}

impl Object {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: BTreeMap::new(),
            overrides: BTreeMap::new(),
        }
    }

    /// Builder-style field assignment.
    pub fn with(mut self, member: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(member, value);
        self
    }

    /// Builder-style override assignment.
    pub fn with_override(mut self, member: impl Into<String>, flags: OverrideFlags) -> Self {
        self.set_override(member, flags);
        self
    }

    pub fn get(&self, member: &str) -> Option<&Value> {
        self.fields.get(member)
    }

    pub fn get_mut(&mut self, member: &str) -> Option<&mut Value> {
        self.fields.get_mut(member)
    }

    pub fn set(&mut self, member: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(member.into(), value.into());
    }

    pub fn remove(&mut self, member: &str) -> Option<Value> {
        self.fields.remove(member)
    }

    /// Override flags recorded for `member`.
    pub fn override_of(&self, member: &str) -> OverrideFlags {
        self.overrides.get(member).copied().unwrap_or_default()
    }

    /// Record override flags for `member`. Setting `BASE` clears the entry.
    pub fn set_override(&mut self, member: impl Into<String>, flags: OverrideFlags) {
        let member = member.into();
        if flags == OverrideFlags::BASE {
            self.overrides.remove(&member);
        } else {
            self.overrides.insert(member, flags);
        }
    }
}
