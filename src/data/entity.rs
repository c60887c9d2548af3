//! Entities: groups, named datatypes and datasets.

use super::{Attribute, DataBuffer, Dataset, ObjectId, ObjectName, PropertyBag, PropertyValue};
use crate::backend::{Backend, Handle, HandleGuard, ObjectKind};
use crate::datatype::{import_type, DatatypeArena, DatatypeClass, TypeId};
use crate::error::{ObjectError, Result};

/// Access to the attributes attached to an object.
pub trait MetadataContainer {
    /// Attributes attached to the object.
    fn metadata<B: Backend + ?Sized>(&mut self, backend: &mut B) -> Result<Vec<Attribute>>;

    /// Attach an attribute, replacing one with the same name.
    fn write_metadata<B: Backend + ?Sized>(&mut self, backend: &mut B, attribute: &Attribute) -> Result<()>;

    /// Remove an attribute by name.
    fn remove_metadata<B: Backend + ?Sized>(&mut self, backend: &mut B, name: &str) -> Result<()>;
}

/// What an entity is.
#[derive(Debug, Clone)]
pub enum EntityKind {
    /// A group of entities.
    Group,
    /// A named datatype; the type is loaded on init.
    Datatype {
        /// Arena holding the type.
        arena: DatatypeArena,
        /// Root of the type, once loaded.
        datatype: Option<TypeId>,
    },
    /// A dataset.
    Dataset(Dataset),
}

impl EntityKind {
    /// Short name of the kind.
    pub fn tag(&self) -> &'static str {
        match self {
            EntityKind::Group => "group",
            EntityKind::Datatype { .. } => "datatype",
            EntityKind::Dataset(_) => "dataset",
        }
    }
}

/// A named object in a file.
///
/// Two entities are equal when their object identifiers match, whatever their
/// names. Entities without an identifier are never equal, not even to
/// themselves.
#[derive(Debug, Clone)]
pub struct Entity {
    name: ObjectName,
    oid: Option<ObjectId>,
    file: Option<String>,
    link_target: Option<String>,
    properties: PropertyBag,
    kind: EntityKind,
}

impl Entity {
    /// Create an entity.
    pub fn new(name: ObjectName, kind: EntityKind) -> Self {
        Self {
            name,
            oid: None,
            file: None,
            link_target: None,
            properties: PropertyBag::new(),
            kind,
        }
    }

    /// A group at `full_name`.
    pub fn group(full_name: &str) -> Self {
        Self::new(ObjectName::new(None, Some(full_name)), EntityKind::Group)
    }

    /// A dataset at `full_name`.
    pub fn dataset(full_name: &str, dataset: Dataset) -> Self {
        Self::new(ObjectName::new(None, Some(full_name)), EntityKind::Dataset(dataset))
    }

    /// Look up `full_name` in the backend and build an uninitialized entity.
    pub fn discover<B: Backend + ?Sized>(backend: &mut B, full_name: &str) -> Result<Self> {
        let mut object = HandleGuard::open(backend, full_name)?;
        let handle = object.handle();
        let oid = object.object_id(handle)?;
        let kind = match object.object_kind(handle)? {
            ObjectKind::Group => EntityKind::Group,
            ObjectKind::Datatype => EntityKind::Datatype {
                arena: DatatypeArena::new(),
                datatype: None,
            },
            ObjectKind::Dataset => {
                if has_compound_elements(&mut *object, handle)? {
                    EntityKind::Dataset(Dataset::compound())
                } else {
                    EntityKind::Dataset(Dataset::scalar())
                }
            }
        };
        tracing::debug!("discover {}: {}", full_name, kind.tag());
        Ok(Self::new(ObjectName::new(None, Some(full_name)), kind).with_object_id(oid))
    }

    /// Set the object identifier.
    pub fn with_object_id(mut self, oid: ObjectId) -> Self {
        self.oid = Some(oid);
        self
    }

    /// Set the name of the file holding the entity.
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Set the target of a soft or external link.
    pub fn with_link_target(mut self, target: impl Into<String>) -> Self {
        self.link_target = Some(target.into());
        self
    }

    /// Object name.
    pub fn name(&self) -> &str {
        self.name.name()
    }

    /// Parent path, ending with the separator.
    pub fn path(&self) -> Option<&str> {
        self.name.path()
    }

    /// Full path.
    pub fn full_name(&self) -> &str {
        self.name.full_name()
    }

    /// Name triple.
    pub fn object_name(&self) -> &ObjectName {
        &self.name
    }

    /// Check if this is the root group.
    pub fn is_root(&self) -> bool {
        self.name.is_root()
    }

    /// Object identifier.
    pub fn object_id(&self) -> Option<&ObjectId> {
        self.oid.as_ref()
    }

    /// Name of the file holding the entity.
    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    /// Target of a soft or external link.
    pub fn link_target(&self) -> Option<&str> {
        self.link_target.as_deref()
    }

    /// Rename in place.
    pub fn rename(&mut self, new_name: &str) -> Result<()> {
        self.name.rename(new_name)
    }

    /// Move under a new parent path; `None` is the root group.
    pub fn set_path(&mut self, path: Option<&str>) {
        self.name.set_path(path);
    }

    /// What the entity is.
    pub fn kind(&self) -> &EntityKind {
        &self.kind
    }

    /// Short name of the kind.
    pub fn tag(&self) -> &'static str {
        self.kind.tag()
    }

    /// The dataset, if this is one.
    pub fn as_dataset(&self) -> Option<&Dataset> {
        match &self.kind {
            EntityKind::Dataset(d) => Some(d),
            _ => None,
        }
    }

    /// The mutable dataset, if this is one.
    pub fn as_dataset_mut(&mut self) -> Option<&mut Dataset> {
        match &mut self.kind {
            EntityKind::Dataset(d) => Some(d),
            _ => None,
        }
    }

    /// Set a property.
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        self.properties.set(key, value);
    }

    /// Get a property.
    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    /// Property keys, sorted.
    pub fn property_keys(&self) -> Vec<&str> {
        self.properties.keys()
    }

    /// Load metadata. Groups have none.
    pub fn init<B: Backend + ?Sized>(&mut self, backend: &mut B) -> Result<()> {
        match &mut self.kind {
            EntityKind::Group => Ok(()),
            EntityKind::Dataset(dataset) => dataset.init(backend, self.name.full_name()),
            EntityKind::Datatype { arena, datatype } => {
                if datatype.is_some() {
                    return Ok(());
                }
                let mut object = HandleGuard::open(backend, self.name.full_name())?;
                let handle = object.handle();
                let type_handle = object.datatype(handle)?;
                let mut guard = HandleGuard::adopt(&mut *object, type_handle);
                let mut loaded = DatatypeArena::new();
                let root = import_type(&mut *guard, type_handle, &mut loaded)?;
                *arena = loaded;
                *datatype = Some(root);
                Ok(())
            }
        }
    }

    /// Read the selected values of a dataset.
    pub fn read<B: Backend + ?Sized>(&mut self, backend: &mut B) -> Result<&DataBuffer> {
        let tag = self.kind.tag();
        match &mut self.kind {
            EntityKind::Dataset(dataset) => dataset.read(backend, self.name.full_name()),
            _ => Err(ObjectError::unsupported(tag, "read")),
        }
    }

    /// Write values into the current selection of a dataset.
    pub fn write<B: Backend + ?Sized>(&mut self, backend: &mut B, data: &DataBuffer) -> Result<()> {
        let tag = self.kind.tag();
        match &mut self.kind {
            EntityKind::Dataset(dataset) => dataset.write(backend, self.name.full_name(), data),
            _ => Err(ObjectError::unsupported(tag, "write")),
        }
    }

    /// Copy a dataset to `destination`, optionally only the current selection.
    pub fn copy<B: Backend + ?Sized>(&mut self, backend: &mut B, destination: &str, subset: bool) -> Result<Entity> {
        let tag = self.kind.tag();
        let EntityKind::Dataset(dataset) = &mut self.kind else {
            return Err(ObjectError::unsupported(tag, "copy"));
        };
        let oid = dataset.copy(backend, self.name.full_name(), destination, subset)?;
        let mut copy = Entity::dataset(destination, dataset.fresh()).with_object_id(oid);
        copy.file = self.file.clone();
        Ok(copy)
    }

    fn open_for_metadata<'b, B: Backend + ?Sized>(&self, backend: &'b mut B, operation: &str) -> Result<HandleGuard<'b, B>> {
        if let EntityKind::Datatype { .. } = self.kind {
            return Err(ObjectError::unsupported("datatype", operation));
        }
        HandleGuard::open(backend, self.name.full_name())
    }
}

fn has_compound_elements<B: Backend + ?Sized>(backend: &mut B, object: Handle) -> Result<bool> {
    let type_handle = backend.datatype(object)?;
    let mut datatype = HandleGuard::adopt(backend, type_handle);
    let class = datatype.type_info(type_handle)?.class;
    match class {
        DatatypeClass::Compound => Ok(true),
        DatatypeClass::Array | DatatypeClass::VarLen => {
            let base_handle = datatype.base_type(type_handle)?;
            let mut base = HandleGuard::adopt(&mut *datatype, base_handle);
            Ok(base.type_info(base_handle)?.class == DatatypeClass::Compound)
        }
        _ => Ok(false),
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        match (&self.oid, &other.oid) {
            (Some(a), Some(b)) => a.same_object(b),
            _ => false,
        }
    }
}

impl MetadataContainer for Entity {
    fn metadata<B: Backend + ?Sized>(&mut self, backend: &mut B) -> Result<Vec<Attribute>> {
        let mut object = self.open_for_metadata(backend, "metadata")?;
        let handle = object.handle();
        let mut attributes = object.attributes(handle)?;
        for attribute in &mut attributes {
            attribute.set_parent(self.name.full_name());
        }
        Ok(attributes)
    }

    fn write_metadata<B: Backend + ?Sized>(&mut self, backend: &mut B, attribute: &Attribute) -> Result<()> {
        let mut object = self.open_for_metadata(backend, "write_metadata")?;
        let handle = object.handle();
        object.write_attribute(handle, attribute)
    }

    fn remove_metadata<B: Backend + ?Sized>(&mut self, backend: &mut B, name: &str) -> Result<()> {
        let mut object = self.open_for_metadata(backend, "remove_metadata")?;
        let handle = object.handle();
        object.remove_attribute(handle, name)
    }
}
