//! Type descriptors: the capability the diff engine walks graphs through.
//!
//! The engine never inspects a [`Value`] directly to learn its structure. It
//! asks a [`TypeDescriptors`] implementation for the shape of the value
//! (object, list, dictionary or primitive), the declaration order of an
//! object's members, and the stable identifier of a list item. A
//! [`TypeRegistry`] is the in-memory implementation fed by explicit
//! registration calls.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{TypeError, TypeResult};
use crate::id::ItemId;
use crate::value::Value;

/// A member declared by an object type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberDescriptor {
    pub name: String,
}

impl MemberDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// The declared shape of an object type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectDescriptor {
    /// Type name, matching [`Object::type_name`](crate::Object::type_name).
    pub name: String,
    /// Members in declaration order. This order is the visiting order.
    pub members: Vec<MemberDescriptor>,
    /// Member holding the instance's [`ItemId`], if the type is identifiable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_member: Option<String>,
}

impl ObjectDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
            identity_member: None,
        }
    }

    /// Declare the next member.
    pub fn member(mut self, name: impl Into<String>) -> Self {
        self.members.push(MemberDescriptor::new(name));
        self
    }

    /// Declare the member holding the instance id, appending it to the
    /// member list if it has not been declared yet.
    pub fn identity(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.has_member(&name) {
            self.members.push(MemberDescriptor::new(name.clone()));
        }
        self.identity_member = Some(name);
        self
    }

    pub fn has_member(&self, name: &str) -> bool {
        self.members.iter().any(|m| m.name == name)
    }

    /// Declaration index of a member.
    pub fn position(&self, name: &str) -> TypeResult<usize> {
        self.members
            .iter()
            .position(|m| m.name == name)
            .ok_or_else(|| TypeError::UnknownMember {
                type_name: self.name.clone(),
                member: name.to_string(),
            })
    }

    pub fn member_names(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|m| m.name.as_str())
    }
}

/// Coarse classification of a value's shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    Object,
    List,
    Dictionary,
    Primitive,
}

/// The shape of one value as reported by a [`TypeDescriptors`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeShape<'a> {
    Object(&'a ObjectDescriptor),
    List,
    Dictionary,
    Primitive,
}

impl TypeShape<'_> {
    pub fn kind(&self) -> ShapeKind {
        match self {
            TypeShape::Object(_) => ShapeKind::Object,
            TypeShape::List => ShapeKind::List,
            TypeShape::Dictionary => ShapeKind::Dictionary,
            TypeShape::Primitive => ShapeKind::Primitive,
        }
    }
}

/// Read-only type information consumed by the diff engine.
///
/// Implementations must be safe for concurrent reads: independent diffs may
/// share one descriptor set across threads.
pub trait TypeDescriptors: Send + Sync {
    /// Look up an object type by name.
    ///
    /// Returns `Err(TypeError::UnknownType)` if the type is not known.
    fn find(&self, type_name: &str) -> TypeResult<&ObjectDescriptor>;

    /// Describe the shape of a value.
    ///
    /// Default implementation maps objects through [`find`](Self::find) and
    /// every other variant to its fixed shape.
    fn describe(&self, value: &Value) -> TypeResult<TypeShape<'_>> {
        Ok(match value {
            Value::Object(obj) => TypeShape::Object(self.find(&obj.type_name)?),
            Value::List(_) => TypeShape::List,
            Value::Dict(_) => TypeShape::Dictionary,
            _ => TypeShape::Primitive,
        })
    }

    /// Stable identifier of a value, if it has one.
    ///
    /// Default implementation: an `Id` value is its own identifier; an
    /// object is identified by the `Id` stored in its type's identity member.
    fn item_id(&self, value: &Value) -> Option<ItemId> {
        match value {
            Value::Id(id) => Some(*id),
            Value::Object(obj) => {
                let desc = self.find(&obj.type_name).ok()?;
                let member = desc.identity_member.as_deref()?;
                obj.get(member).and_then(Value::as_id)
            }
            _ => None,
        }
    }
}

/// In-memory [`TypeDescriptors`] built by explicit registration.
///
/// There is no process-wide registry: build one, then pass it by reference
/// to every diff.
#[derive(Clone, Debug, Default)]
pub struct TypeRegistry {
    types: HashMap<String, ObjectDescriptor>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an object type. Registering the same name twice is an error.
    pub fn register(&mut self, descriptor: ObjectDescriptor) -> TypeResult<()> {
        if self.types.contains_key(&descriptor.name) {
            return Err(TypeError::DuplicateType(descriptor.name));
        }
        self.types.insert(descriptor.name.clone(), descriptor);
        Ok(())
    }

    /// Builder-style registration.
    pub fn with(mut self, descriptor: ObjectDescriptor) -> TypeResult<Self> {
        self.register(descriptor)?;
        Ok(self)
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl TypeDescriptors for TypeRegistry {
    fn find(&self, type_name: &str) -> TypeResult<&ObjectDescriptor> {
        self.types
            .get(type_name)
            .ok_or_else(|| TypeError::UnknownType(type_name.to_string()))
    }
}
