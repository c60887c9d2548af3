//! File-format backend interface.
//!
//! The object model never reads files itself. Everything that touches
//! storage goes through a [`Backend`], which hands out [`Handle`]s that must
//! be closed again. [`HandleGuard`] closes a handle when it goes out of scope.

pub mod memory;

pub use memory::MemoryBackend;

use crate::data::{Attribute, DataBuffer, ObjectId};
use crate::datatype::{ByteOrder, DatatypeClass, Sign};
use crate::error::{ObjectError, Result};
use crate::selection::Selection;
use std::fmt;
use std::ops::{Deref, DerefMut};

/// Opaque handle issued by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(pub u64);

/// Kind of a stored object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    /// A group of other objects.
    Group,
    /// A dataset.
    Dataset,
    /// A named datatype.
    Datatype,
}

/// Shape of a stored dataset.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Dataspace {
    /// Current dimensions; empty for a scalar.
    pub dims: Vec<usize>,
    /// Maximum dimensions, if the dataset is extendible.
    pub max_dims: Option<Vec<usize>>,
    /// Dimension names, if any.
    pub dim_names: Option<Vec<String>>,
}

/// Description of a datatype handle, without its base or members.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeInfo {
    /// Storage class.
    pub class: DatatypeClass,
    /// Size in bytes.
    pub size: usize,
    /// Byte order.
    pub order: ByteOrder,
    /// Sign convention.
    pub sign: Sign,
    /// Shape of an array type.
    pub array_dims: Option<Vec<usize>>,
    /// Enum mapping as `name=value,...`.
    pub enum_members: Option<String>,
}

/// A compound member as reported by a backend.
///
/// The datatype handle is owned by the caller and must be closed.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberInfo {
    /// Member name.
    pub name: String,
    /// Datatype handle of the member.
    pub datatype: Handle,
    /// Byte offset within the compound.
    pub offset: u64,
}

/// Storage collaborator of the object model.
///
/// Member names passed to [`Backend::read`] and [`Backend::write`] are
/// flattened compound member names; an empty list addresses the whole
/// (non-compound) value.
pub trait Backend {
    /// Open the object at `full_name`.
    fn open(&mut self, full_name: &str) -> Result<Handle>;

    /// Release a handle. Closing an unknown handle is a no-op.
    fn close(&mut self, handle: Handle);

    /// Kind of an open object.
    fn object_kind(&mut self, object: Handle) -> Result<ObjectKind>;

    /// Identifier of an open object.
    fn object_id(&mut self, object: Handle) -> Result<ObjectId>;

    /// Shape of an open dataset.
    fn dataspace(&mut self, object: Handle) -> Result<Dataspace>;

    /// Datatype handle of an open dataset or named datatype.
    fn datatype(&mut self, object: Handle) -> Result<Handle>;

    /// Describe a datatype handle.
    fn type_info(&mut self, datatype: Handle) -> Result<TypeInfo>;

    /// Base type handle of an array, variable-length or enum type.
    fn base_type(&mut self, datatype: Handle) -> Result<Handle>;

    /// Members of a compound type, in declaration order.
    fn compound_members(&mut self, datatype: Handle) -> Result<Vec<MemberInfo>>;

    /// Read the selected values.
    fn read(&mut self, object: Handle, selection: &Selection, members: &[String]) -> Result<DataBuffer>;

    /// Write values into the selection.
    fn write(&mut self, object: Handle, selection: &Selection, members: &[String], data: &DataBuffer) -> Result<()>;

    /// Attributes attached to an object.
    fn attributes(&mut self, object: Handle) -> Result<Vec<Attribute>>;

    /// Attach an attribute, replacing one with the same name.
    fn write_attribute(&mut self, object: Handle, attribute: &Attribute) -> Result<()>;

    /// Remove an attribute by name.
    fn remove_attribute(&mut self, object: Handle, name: &str) -> Result<()>;

    /// Copy a dataset to `destination`, optionally only the selected subset.
    fn copy(&mut self, object: Handle, destination: &str, subset: Option<&Selection>) -> Result<ObjectId>;
}

/// A handle that is closed when the guard is dropped.
pub struct HandleGuard<'a, B: Backend + ?Sized> {
    backend: &'a mut B,
    handle: Handle,
}

impl<'a, B: Backend + ?Sized> HandleGuard<'a, B> {
    /// Open `full_name`, wrapping failures in [`ObjectError::Open`].
    pub fn open(backend: &'a mut B, full_name: &str) -> Result<Self> {
        let handle = backend
            .open(full_name)
            .map_err(|e| ObjectError::open(full_name, e))?;
        tracing::trace!("open {} -> {:?}", full_name, handle);
        Ok(Self { backend, handle })
    }

    /// Take ownership of an already issued handle.
    pub fn adopt(backend: &'a mut B, handle: Handle) -> Self {
        Self { backend, handle }
    }

    /// The guarded handle.
    pub fn handle(&self) -> Handle {
        self.handle
    }
}

impl<B: Backend + ?Sized> Deref for HandleGuard<'_, B> {
    type Target = B;

    fn deref(&self) -> &B {
        self.backend
    }
}

impl<B: Backend + ?Sized> DerefMut for HandleGuard<'_, B> {
    fn deref_mut(&mut self) -> &mut B {
        self.backend
    }
}

impl<B: Backend + ?Sized> Drop for HandleGuard<'_, B> {
    fn drop(&mut self) {
        tracing::trace!("close {:?}", self.handle);
        self.backend.close(self.handle);
    }
}

impl<B: Backend + ?Sized> fmt::Debug for HandleGuard<'_, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleGuard").field("handle", &self.handle).finish()
    }
}
