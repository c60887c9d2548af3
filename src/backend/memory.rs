//! In-memory backend.
//!
//! Objects are stored as flat row-major buffers and sliced through ndarray
//! views. Used by the command line tool and the tests, and as a reference for
//! real file-format backends.

use super::{Backend, Dataspace, Handle, MemberInfo, ObjectKind, TypeInfo};
use crate::data::{Attribute, DataBuffer, ObjectId};
use crate::datatype::{expr, flatten, DatatypeArena, TypeId};
use crate::error::{ObjectError, Result};
use crate::selection::Selection;
use crate::util::MEMBER_SEPARATOR;
use ndarray::{ArrayViewD, ArrayViewMutD, IxDyn};
use std::collections::{BTreeMap, HashMap, HashSet};

const FILE_ID: u64 = 1;

#[derive(Debug, Clone)]
struct StoredObject {
    kind: ObjectKind,
    oid: u64,
    space: Dataspace,
    datatype: Option<TypeId>,
    values: Option<DataBuffer>,
    members: BTreeMap<String, DataBuffer>,
    attributes: Vec<Attribute>,
}

impl StoredObject {
    fn new(kind: ObjectKind, oid: u64) -> Self {
        Self {
            kind,
            oid,
            space: Dataspace::default(),
            datatype: None,
            values: None,
            members: BTreeMap::new(),
            attributes: Vec::new(),
        }
    }

    /// Dimensions used for slicing; a scalar is one element.
    fn effective_dims(&self) -> Vec<usize> {
        if self.space.dims.is_empty() {
            vec![1]
        } else {
            self.space.dims.clone()
        }
    }
}

#[derive(Debug, Clone)]
enum Opened {
    Object(String),
    Type(TypeId),
}

/// Backend that keeps every object in memory.
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    types: DatatypeArena,
    objects: BTreeMap<String, StoredObject>,
    open: HashMap<u64, Opened>,
    next_handle: u64,
    next_oid: u64,
    failing_opens: HashSet<String>,
    broken_types: HashSet<TypeId>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// Create a backend holding only the root group.
    pub fn new() -> Self {
        let mut backend = Self {
            types: DatatypeArena::new(),
            objects: BTreeMap::new(),
            open: HashMap::new(),
            next_handle: 1,
            next_oid: 1,
            failing_opens: HashSet::new(),
            broken_types: HashSet::new(),
        };
        backend.add_group("/");
        backend
    }

    fn allocate_oid(&mut self) -> u64 {
        let oid = self.next_oid;
        self.next_oid += 1;
        oid
    }

    fn insert(&mut self, full_name: &str, object: StoredObject) -> ObjectId {
        let id = ObjectId::new(vec![FILE_ID, object.oid]);
        self.objects.insert(full_name.to_string(), object);
        id
    }

    /// Add a group.
    pub fn add_group(&mut self, full_name: &str) -> ObjectId {
        let oid = self.allocate_oid();
        self.insert(full_name, StoredObject::new(ObjectKind::Group, oid))
    }

    /// Add a named datatype described by a type expression.
    pub fn add_datatype(&mut self, full_name: &str, type_expr: &str) -> Result<ObjectId> {
        let datatype = expr::parse_into(type_expr, &mut self.types)?;
        let mut object = StoredObject::new(ObjectKind::Datatype, self.allocate_oid());
        object.datatype = Some(datatype);
        Ok(self.insert(full_name, object))
    }

    /// Add a dataset with row-major `values`; empty `dims` is a scalar.
    pub fn add_dataset(
        &mut self,
        full_name: &str,
        type_expr: &str,
        dims: &[usize],
        values: impl Into<DataBuffer>,
    ) -> Result<ObjectId> {
        let datatype = expr::parse_into(type_expr, &mut self.types)?;
        let mut object = StoredObject::new(ObjectKind::Dataset, self.allocate_oid());
        object.space.dims = dims.to_vec();
        object.datatype = Some(datatype);
        object.values = Some(values.into());
        Ok(self.insert(full_name, object))
    }

    /// Add a compound dataset with one buffer per flattened member.
    pub fn add_compound_dataset(
        &mut self,
        full_name: &str,
        type_expr: &str,
        dims: &[usize],
        columns: Vec<DataBuffer>,
    ) -> Result<ObjectId> {
        let datatype = expr::parse_into(type_expr, &mut self.types)?;
        let flat = flatten(&self.types, datatype, MEMBER_SEPARATOR);
        if flat.member_count() != columns.len() {
            return Err(ObjectError::Backend(format!(
                "{} has {} members but {} columns were given",
                full_name,
                flat.member_count(),
                columns.len()
            )));
        }
        let mut object = StoredObject::new(ObjectKind::Dataset, self.allocate_oid());
        object.space.dims = dims.to_vec();
        object.datatype = Some(datatype);
        object.members = flat.names().iter().cloned().zip(columns).collect();
        Ok(self.insert(full_name, object))
    }

    /// Set maximum dimensions and dimension names of a dataset.
    pub fn set_dataspace_extras(
        &mut self,
        full_name: &str,
        max_dims: Option<Vec<usize>>,
        dim_names: Option<Vec<String>>,
    ) -> Result<()> {
        let object = self.object_mut(full_name)?;
        object.space.max_dims = max_dims;
        object.space.dim_names = dim_names;
        Ok(())
    }

    /// Make every later open of `full_name` fail.
    pub fn fail_open(&mut self, full_name: &str) {
        self.failing_opens.insert(full_name.to_string());
    }

    /// Make the datatype of top-level compound member `member` undescribable.
    pub fn break_member_type(&mut self, full_name: &str, member: &str) -> Result<()> {
        let root = self
            .object(full_name)?
            .datatype
            .ok_or_else(|| ObjectError::Datatype(format!("{} has no datatype", full_name)))?;
        let mut dt = self.types.resolve(root)?;
        if let Some(base) = dt.base.filter(|_| !dt.is_compound()) {
            dt = self.types.resolve(base)?;
        }
        let target = dt
            .members
            .iter()
            .find(|m| m.name == member)
            .map(|m| m.datatype)
            .ok_or_else(|| ObjectError::not_found(format!("{}/{}", full_name, member)))?;
        self.broken_types.insert(target);
        Ok(())
    }

    /// Number of handles issued and not yet closed.
    pub fn open_handle_count(&self) -> usize {
        self.open.len()
    }

    /// Stored values of a non-compound dataset.
    pub fn values(&self, full_name: &str) -> Option<&DataBuffer> {
        self.objects.get(full_name)?.values.as_ref()
    }

    /// Stored values of one flattened compound member.
    pub fn member_values(&self, full_name: &str, member: &str) -> Option<&DataBuffer> {
        self.objects.get(full_name)?.members.get(member)
    }

    /// Full names of all stored objects, sorted.
    pub fn object_names(&self) -> Vec<&str> {
        self.objects.keys().map(String::as_str).collect()
    }

    fn object(&self, full_name: &str) -> Result<&StoredObject> {
        self.objects
            .get(full_name)
            .ok_or_else(|| ObjectError::not_found(full_name))
    }

    fn object_mut(&mut self, full_name: &str) -> Result<&mut StoredObject> {
        self.objects
            .get_mut(full_name)
            .ok_or_else(|| ObjectError::not_found(full_name))
    }

    fn issue(&mut self, opened: Opened) -> Handle {
        let handle = self.next_handle;
        self.next_handle += 1;
        self.open.insert(handle, opened);
        Handle(handle)
    }

    fn object_name(&self, handle: Handle) -> Result<String> {
        match self.open.get(&handle.0) {
            Some(Opened::Object(name)) => Ok(name.clone()),
            _ => Err(ObjectError::InvalidHandle(handle.0)),
        }
    }

    fn type_id(&self, handle: Handle) -> Result<TypeId> {
        match self.open.get(&handle.0) {
            Some(Opened::Type(id)) => Ok(*id),
            _ => Err(ObjectError::InvalidHandle(handle.0)),
        }
    }

    fn stored(&self, handle: Handle) -> Result<&StoredObject> {
        let name = self.object_name(handle)?;
        self.object(&name)
    }

    fn stored_mut(&mut self, handle: Handle) -> Result<&mut StoredObject> {
        let name = self.object_name(handle)?;
        self.object_mut(&name)
    }
}

fn extract<T: Clone>(values: &[T], dims: &[usize], selection: &Selection) -> Result<Vec<T>> {
    let view = ArrayViewD::from_shape(IxDyn(dims), values)?;
    Ok(selection.apply(view)?.iter().cloned().collect())
}

fn store<T: Clone>(values: &mut [T], dims: &[usize], selection: &Selection, source: &[T]) -> Result<()> {
    let view = ArrayViewMutD::from_shape(IxDyn(dims), values)?;
    selection.assign(view, source)
}

/// Shape and selection of a buffer holding `per_point` elements per point.
fn layout(len: usize, dims: &[usize], selection: &Selection) -> Result<(Vec<usize>, Selection)> {
    let points: usize = dims.iter().product();
    if points == 0 || len % points != 0 {
        return Err(ObjectError::Backend(format!(
            "{} stored values do not fit dimensions {:?}",
            len, dims
        )));
    }
    let per_point = len / points;
    if per_point == 1 {
        return Ok((dims.to_vec(), selection.clone()));
    }
    let mut dims = dims.to_vec();
    dims.push(per_point);
    Ok((dims, selection.with_trailing_axis(per_point)))
}

fn read_slab(values: &DataBuffer, dims: &[usize], selection: &Selection) -> Result<DataBuffer> {
    selection.validate(dims)?;
    let (dims, selection) = layout(values.len(), dims, selection)?;
    macro_rules! slab {
        ($($variant:ident),*) => {
            match values {
                $(DataBuffer::$variant(v) => DataBuffer::$variant(extract(v, &dims, &selection)?),)*
                DataBuffer::Compound(_) => {
                    return Err(ObjectError::Backend("nested compound storage".to_string()))
                }
            }
        };
    }
    Ok(slab!(I8, I16, I32, I64, F32, F64, Bytes, Text))
}

fn write_slab(target: &mut DataBuffer, dims: &[usize], selection: &Selection, source: &DataBuffer) -> Result<()> {
    selection.validate(dims)?;
    let (dims, selection) = layout(target.len(), dims, selection)?;
    macro_rules! slab {
        ($($variant:ident),*) => {
            match (target, source) {
                $((DataBuffer::$variant(t), DataBuffer::$variant(s)) => store(t, &dims, &selection, s),)*
                (t, s) => Err(ObjectError::conversion(format!(
                    "cannot write {} values into {} storage",
                    s.kind_name(),
                    t.kind_name()
                ))),
            }
        };
    }
    slab!(I8, I16, I32, I64, F32, F64, Bytes, Text)
}

impl Backend for MemoryBackend {
    fn open(&mut self, full_name: &str) -> Result<Handle> {
        if self.failing_opens.contains(full_name) {
            return Err(ObjectError::Backend(format!("cannot open {}", full_name)));
        }
        self.object(full_name)?;
        Ok(self.issue(Opened::Object(full_name.to_string())))
    }

    fn close(&mut self, handle: Handle) {
        if self.open.remove(&handle.0).is_none() {
            tracing::warn!("close: unknown handle {:?}", handle);
        }
    }

    fn object_kind(&mut self, object: Handle) -> Result<ObjectKind> {
        Ok(self.stored(object)?.kind)
    }

    fn object_id(&mut self, object: Handle) -> Result<ObjectId> {
        Ok(ObjectId::new(vec![FILE_ID, self.stored(object)?.oid]))
    }

    fn dataspace(&mut self, object: Handle) -> Result<Dataspace> {
        let stored = self.stored(object)?;
        match stored.kind {
            ObjectKind::Dataset => Ok(stored.space.clone()),
            _ => Err(ObjectError::unsupported("group", "dataspace")),
        }
    }

    fn datatype(&mut self, object: Handle) -> Result<Handle> {
        let datatype = self
            .stored(object)?
            .datatype
            .ok_or_else(|| ObjectError::unsupported("group", "datatype"))?;
        Ok(self.issue(Opened::Type(datatype)))
    }

    fn type_info(&mut self, datatype: Handle) -> Result<TypeInfo> {
        let id = self.type_id(datatype)?;
        if self.broken_types.contains(&id) {
            return Err(ObjectError::Backend(format!("cannot describe datatype {:?}", datatype)));
        }
        let dt = self.types.resolve(id)?;
        Ok(TypeInfo {
            class: dt.class,
            size: dt.size,
            order: dt.order,
            sign: dt.sign,
            array_dims: dt.array_dims.clone(),
            enum_members: dt.enum_members.clone(),
        })
    }

    fn base_type(&mut self, datatype: Handle) -> Result<Handle> {
        let id = self.type_id(datatype)?;
        let base = self
            .types
            .resolve(id)?
            .base
            .ok_or_else(|| ObjectError::Datatype("datatype has no base type".to_string()))?;
        Ok(self.issue(Opened::Type(base)))
    }

    fn compound_members(&mut self, datatype: Handle) -> Result<Vec<MemberInfo>> {
        let id = self.type_id(datatype)?;
        let members: Vec<_> = self
            .types
            .resolve(id)?
            .members
            .iter()
            .map(|m| (m.name.clone(), m.datatype, m.offset))
            .collect();
        Ok(members
            .into_iter()
            .map(|(name, ty, offset)| MemberInfo {
                name,
                datatype: self.issue(Opened::Type(ty)),
                offset,
            })
            .collect())
    }

    fn read(&mut self, object: Handle, selection: &Selection, members: &[String]) -> Result<DataBuffer> {
        let stored = self.stored(object)?;
        let dims = stored.effective_dims();
        if members.is_empty() {
            let values = stored
                .values
                .as_ref()
                .ok_or_else(|| ObjectError::Backend("object has no values".to_string()))?;
            return read_slab(values, &dims, selection);
        }
        let columns = members
            .iter()
            .map(|name| {
                let column = stored
                    .members
                    .get(name)
                    .ok_or_else(|| ObjectError::not_found(name.replace(MEMBER_SEPARATOR, ".")))?;
                read_slab(column, &dims, selection)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(DataBuffer::Compound(columns))
    }

    fn write(&mut self, object: Handle, selection: &Selection, members: &[String], data: &DataBuffer) -> Result<()> {
        let stored = self.stored_mut(object)?;
        let dims = stored.effective_dims();
        if members.is_empty() {
            let values = stored
                .values
                .as_mut()
                .ok_or_else(|| ObjectError::Backend("object has no values".to_string()))?;
            return write_slab(values, &dims, selection, data);
        }
        let DataBuffer::Compound(columns) = data else {
            return Err(ObjectError::conversion("compound members need a compound buffer"));
        };
        if columns.len() != members.len() {
            return Err(ObjectError::conversion(format!(
                "{} member buffers for {} members",
                columns.len(),
                members.len()
            )));
        }
        for (name, column) in members.iter().zip(columns) {
            let target = stored
                .members
                .get_mut(name)
                .ok_or_else(|| ObjectError::not_found(name.replace(MEMBER_SEPARATOR, ".")))?;
            write_slab(target, &dims, selection, column)?;
        }
        Ok(())
    }

    fn attributes(&mut self, object: Handle) -> Result<Vec<Attribute>> {
        Ok(self.stored(object)?.attributes.clone())
    }

    fn write_attribute(&mut self, object: Handle, attribute: &Attribute) -> Result<()> {
        let attributes = &mut self.stored_mut(object)?.attributes;
        match attributes.iter_mut().find(|a| a.name() == attribute.name()) {
            Some(existing) => *existing = attribute.clone(),
            None => attributes.push(attribute.clone()),
        }
        Ok(())
    }

    fn remove_attribute(&mut self, object: Handle, name: &str) -> Result<()> {
        let attributes = &mut self.stored_mut(object)?.attributes;
        let index = attributes
            .iter()
            .position(|a| a.name() == name)
            .ok_or_else(|| ObjectError::not_found(name))?;
        attributes.remove(index);
        Ok(())
    }

    fn copy(&mut self, object: Handle, destination: &str, subset: Option<&Selection>) -> Result<ObjectId> {
        if self.objects.contains_key(destination) {
            return Err(ObjectError::Backend(format!("{} already exists", destination)));
        }
        let source = self.stored(object)?.clone();
        let mut copy = source.clone();
        copy.oid = self.allocate_oid();
        if let Some(selection) = subset {
            let dims = source.effective_dims();
            if let Some(values) = &source.values {
                copy.values = Some(read_slab(values, &dims, selection)?);
            }
            for (name, column) in &source.members {
                copy.members.insert(name.clone(), read_slab(column, &dims, selection)?);
            }
            copy.space.dims = selection.count().to_vec();
            copy.space.max_dims = None;
        }
        Ok(self.insert(destination, copy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HandleGuard;
    use crate::datatype::{import_type, DatatypeClass};

    #[test]
    fn test_handles_are_counted() {
        let mut backend = MemoryBackend::new();
        backend.add_dataset("/x", "i32", &[2], vec![1i32, 2]).unwrap();
        {
            let guard = HandleGuard::open(&mut backend, "/x").unwrap();
            assert_eq!(guard.open_handle_count(), 1);
        }
        assert_eq!(backend.open_handle_count(), 0);
    }

    #[test]
    fn test_open_failures() {
        let mut backend = MemoryBackend::new();
        assert!(matches!(backend.open("/missing"), Err(ObjectError::NotFound { .. })));
        backend.add_group("/g");
        backend.fail_open("/g");
        let err = HandleGuard::open(&mut backend, "/g").unwrap_err();
        assert!(matches!(err, ObjectError::Open { .. }));
        assert_eq!(backend.open_handle_count(), 0);
    }

    #[test]
    fn test_read_and_write_slab() {
        let mut backend = MemoryBackend::new();
        backend
            .add_dataset("/m", "i16", &[2, 3], (0..6).collect::<Vec<i16>>())
            .unwrap();
        let h = backend.open("/m").unwrap();
        let mut selection = Selection::new(&[2, 3]);
        selection.start_mut()[1] = 1;
        selection.count_mut()[1] = 2;
        let out = backend.read(h, &selection, &[]).unwrap();
        assert_eq!(out, DataBuffer::I16(vec![1, 2, 4, 5]));

        backend
            .write(h, &selection, &[], &DataBuffer::I16(vec![9, 9, 9, 9]))
            .unwrap();
        assert_eq!(backend.values("/m"), Some(&DataBuffer::I16(vec![0, 9, 9, 3, 9, 9])));

        let err = backend.write(h, &selection, &[], &DataBuffer::F32(vec![0.0; 4]));
        assert!(matches!(err, Err(ObjectError::Conversion(_))));
        backend.close(h);
    }

    #[test]
    fn test_fixed_strings_slice_whole_records() {
        let mut backend = MemoryBackend::new();
        backend
            .add_dataset("/s", "string(3)", &[3], b"abcdefghi".to_vec())
            .unwrap();
        let h = backend.open("/s").unwrap();
        let mut selection = Selection::new(&[3]);
        selection.start_mut()[0] = 1;
        selection.count_mut()[0] = 2;
        let out = backend.read(h, &selection, &[]).unwrap();
        assert_eq!(out, DataBuffer::Bytes(b"defghi".to_vec()));
    }

    #[test]
    fn test_import_closes_every_type_handle() {
        let mut backend = MemoryBackend::new();
        backend
            .add_compound_dataset(
                "/c",
                "{a:i32, n:{b:f32[2]}}",
                &[1],
                vec![vec![1i32].into(), vec![1.0f32, 2.0].into()],
            )
            .unwrap();
        let mut object = HandleGuard::open(&mut backend, "/c").unwrap();
        let h = object.handle();
        let th = object.datatype(h).unwrap();
        let mut arena = DatatypeArena::new();
        let root = {
            let mut ty = HandleGuard::adopt(&mut *object, th);
            import_type(&mut *ty, th, &mut arena).unwrap()
        };
        assert_eq!(object.open_handle_count(), 1);
        drop(object);
        assert_eq!(backend.open_handle_count(), 0);
        let dt = arena.resolve(root).unwrap();
        assert_eq!(dt.class, DatatypeClass::Compound);
        assert_eq!(dt.members.len(), 2);
    }

    #[test]
    fn test_broken_member_type_is_absorbed() {
        let mut backend = MemoryBackend::new();
        backend
            .add_compound_dataset("/c", "{a:i8, b:i8}", &[1], vec![vec![1i8].into(), vec![2i8].into()])
            .unwrap();
        backend.break_member_type("/c", "b").unwrap();
        let h = backend.open("/c").unwrap();
        let th = backend.datatype(h).unwrap();
        let mut arena = DatatypeArena::new();
        let root = import_type(&mut backend, th, &mut arena).unwrap();
        backend.close(th);
        backend.close(h);
        let dt = arena.resolve(root).unwrap();
        let b = arena.resolve(dt.members[1].datatype).unwrap();
        assert_eq!(b.class, DatatypeClass::NoClass);
        assert_eq!(backend.open_handle_count(), 0);
    }

    #[test]
    fn test_copy_subset() {
        let mut backend = MemoryBackend::new();
        backend.add_dataset("/v", "f64", &[4], vec![1.0f64, 2.0, 3.0, 4.0]).unwrap();
        let h = backend.open("/v").unwrap();
        let mut selection = Selection::new(&[4]);
        selection.stride_mut()[0] = 2;
        selection.count_mut()[0] = 2;
        let id = backend.copy(h, "/v2", Some(&selection)).unwrap();
        backend.close(h);
        assert_eq!(backend.values("/v2"), Some(&DataBuffer::F64(vec![1.0, 3.0])));
        assert_eq!(id.components()[0], FILE_ID);
    }
}
