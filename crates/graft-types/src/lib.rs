//! Foundation types for graft.
//!
//! This crate provides the object graph model and the type-descriptor
//! capability that the diff and merge engines walk. Every other graft crate
//! depends on `graft-types`.
//!
//! # Key Types
//!
//! - [`Value`] / [`Object`]: The object graph being diffed and merged
//! - [`ItemId`]: Stable per-item identifier used to reconcile reordered lists
//! - [`OverrideFlags`]: Authoring intent attached to a member location
//! - [`NodePath`]: Printable location of a value inside a graph
//! - [`TypeDescriptors`] / [`TypeRegistry`]: Member enumeration capability
//! - [`ContentDigest`]: BLAKE3 digest of a value's content

pub mod descriptor;
pub mod digest;
pub mod error;
pub mod id;
pub mod overrides;
pub mod path;
pub mod value;

pub use descriptor::{
    MemberDescriptor, ObjectDescriptor, ShapeKind, TypeDescriptors, TypeRegistry, TypeShape,
};
pub use digest::ContentDigest;
pub use error::{TypeError, TypeResult};
pub use id::ItemId;
pub use overrides::OverrideFlags;
pub use path::{NodePath, PathSegment};
pub use value::{Object, Value};
