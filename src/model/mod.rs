//! Live Object Model
//!
//! The host-side view the reference finder runs over: opaque object handles,
//! a registered type system, and an [`ObjectModel`] trait through which the
//! scanner enumerates components and reads their fields.
//!
//! [`Scene`] is an in-memory implementation, loadable from a JSON snapshot.

pub mod registry;
pub mod scene;

pub use registry::{
    FieldDecl, FieldDescriptor, TypeDecl, TypeId, TypeInfo, TypeKind, TypeRegistry,
    TypeRegistryBuilder, TypeToken, Visibility,
};
pub use scene::{ObjectDecl, Scene, SceneSnapshot};

use serde::{Deserialize, Serialize};

/// Non-owning handle to a live object instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectRef(pub u64);

impl std::fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Current value of a field as read from the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// A single object reference
    Object(ObjectRef),
    /// An ordered container; empty slots are `None`
    List(Vec<Option<ObjectRef>>),
    /// Non-reference data (numbers, strings, structs)
    Primitive,
}

/// Host collaborator the core reads the live graph through
pub trait ObjectModel {
    fn types(&self) -> &TypeRegistry;

    /// Runtime type of a live object, `None` if the handle is unknown
    fn runtime_type(&self, obj: ObjectRef) -> Option<TypeId>;

    fn object_name(&self, obj: ObjectRef) -> Option<&str>;

    /// Every component instance currently loaded, in enumeration order
    fn enumerate_all_components(&self) -> Vec<ObjectRef>;

    /// Read a field of `owner`. `None` means no value or unreadable.
    fn read_field(&self, owner: ObjectRef, field: &FieldDescriptor) -> Option<FieldValue>;

    /// The raw asset a wrapped asset refers into
    fn wrapped_payload(&self, obj: ObjectRef) -> Option<ObjectRef>;

    /// Directly attached components when `obj` is a composite entity
    fn attached_components(&self, obj: ObjectRef) -> Option<Vec<ObjectRef>>;

    fn type_kind(&self, obj: ObjectRef) -> Option<TypeKind> {
        self.runtime_type(obj).and_then(|ty| self.types().kind(ty))
    }

    fn type_name(&self, obj: ObjectRef) -> Option<&str> {
        self.runtime_type(obj).and_then(|ty| self.types().name(ty))
    }
}
