//! Datatype descriptions.
//!
//! Datatypes are stored in a [`DatatypeArena`] and referenced by [`TypeId`].
//! A node can only refer to nodes added before it, so the graph built through
//! the arena is always acyclic and recursive walks terminate.

pub mod compound;
pub mod expr;
pub mod import;

pub use compound::{flatten, CompoundMembers};
pub use expr::parse_type;
pub use import::import_type;

use crate::error::{ObjectError, Result};
use std::collections::HashMap;

/// Storage class of a datatype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatatypeClass {
    /// Class could not be determined.
    NoClass,
    /// Fixed-point integer.
    Integer,
    /// Floating point.
    Float,
    /// Single character.
    Char,
    /// Fixed or variable-length string.
    String,
    /// Bit field.
    Bitfield,
    /// Opaque bytes.
    Opaque,
    /// Aggregate of named members.
    Compound,
    /// Object reference.
    Reference,
    /// Enumeration over an integer base.
    Enum,
    /// Variable-length sequence of a base type.
    VarLen,
    /// Fixed-shape array of a base type.
    Array,
    /// Time value.
    Time,
}

/// Byte order of stored values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    /// Little endian.
    LittleEndian,
    /// Big endian.
    BigEndian,
    /// VAX mixed order.
    Vax,
    /// Order does not apply.
    None,
    /// Native order of the host.
    #[default]
    Native,
}

/// Sign convention of integer values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sign {
    /// Unsigned.
    Unsigned,
    /// Two's complement.
    TwosComplement,
    /// Native convention of the host.
    #[default]
    Native,
}

/// Index of a datatype inside a [`DatatypeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(usize);

impl TypeId {
    /// Position in the arena.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A named member of a compound datatype.
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundMember {
    /// Member name.
    pub name: String,
    /// Member datatype.
    pub datatype: TypeId,
    /// Byte offset within the compound.
    pub offset: u64,
    /// Position of the member in its declaring compound.
    pub field_id: u64,
}

/// Description of one storage type.
#[derive(Debug, Clone, PartialEq)]
pub struct Datatype {
    /// Storage class.
    pub class: DatatypeClass,
    /// Size in bytes; zero for variable-length strings.
    pub size: usize,
    /// Byte order.
    pub order: ByteOrder,
    /// Sign convention.
    pub sign: Sign,
    /// Base type of arrays, variable-length sequences and enums.
    pub base: Option<TypeId>,
    /// Shape of an array type.
    pub array_dims: Option<Vec<usize>>,
    /// Enum mapping as `name=value,name=value`.
    pub enum_members: Option<String>,
    /// Members of a compound type, in declaration order.
    pub members: Vec<CompoundMember>,
}

impl Datatype {
    /// An atomic type.
    pub fn atomic(class: DatatypeClass, size: usize, order: ByteOrder, sign: Sign) -> Self {
        Self {
            class,
            size,
            order,
            sign,
            base: None,
            array_dims: None,
            enum_members: None,
            members: Vec::new(),
        }
    }

    /// An integer type of `size` bytes.
    pub fn integer(size: usize, signed: bool) -> Self {
        let sign = if signed { Sign::TwosComplement } else { Sign::Unsigned };
        Self::atomic(DatatypeClass::Integer, size, ByteOrder::Native, sign)
    }

    /// A floating point type of `size` bytes.
    pub fn float(size: usize) -> Self {
        Self::atomic(DatatypeClass::Float, size, ByteOrder::Native, Sign::Native)
    }

    /// A string of `size` bytes; zero means variable length.
    pub fn string(size: usize) -> Self {
        Self::atomic(DatatypeClass::String, size, ByteOrder::None, Sign::Native)
    }

    /// A type whose class could not be resolved.
    pub fn no_class() -> Self {
        Self::atomic(DatatypeClass::NoClass, 0, ByteOrder::None, Sign::Native)
    }

    /// Check if this is a compound type.
    pub fn is_compound(&self) -> bool {
        self.class == DatatypeClass::Compound
    }

    /// Check if values of this type carry unsigned integer semantics.
    ///
    /// Only this node is inspected; [`DatatypeArena::is_unsigned`] also looks
    /// through arrays and variable-length sequences.
    pub fn is_unsigned(&self) -> bool {
        matches!(
            self.class,
            DatatypeClass::Integer | DatatypeClass::Char | DatatypeClass::Enum | DatatypeClass::Bitfield
        ) && self.sign == Sign::Unsigned
    }

    /// Short human-readable description.
    pub fn description(&self) -> String {
        let bits = self.size * 8;
        match self.class {
            DatatypeClass::Integer if self.sign == Sign::Unsigned => {
                format!("{}-bit unsigned integer", bits)
            }
            DatatypeClass::Integer => format!("{}-bit integer", bits),
            DatatypeClass::Float => format!("{}-bit floating-point", bits),
            DatatypeClass::String => "String".to_string(),
            DatatypeClass::Reference => "Object reference".to_string(),
            DatatypeClass::Bitfield => "Bitfield".to_string(),
            DatatypeClass::Enum => format!("{}-bit enum", bits),
            DatatypeClass::Array => "Array".to_string(),
            DatatypeClass::Compound => "Compound ".to_string(),
            DatatypeClass::VarLen => "Variable-length".to_string(),
            _ => "Unknown".to_string(),
        }
    }

    /// Parse the enum mapping into value → name.
    ///
    /// Entries without `=` or with a non-integer value are skipped.
    pub fn enum_names(&self) -> HashMap<i64, String> {
        let mut names = HashMap::new();
        let Some(members) = self.enum_members.as_deref() else {
            return names;
        };
        for entry in members.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let Some((name, value)) = entry.split_once('=') else {
                tracing::warn!("enum_names: entry '{}' has no value", entry);
                continue;
            };
            let value = value.trim();
            let parsed = value
                .parse::<i64>()
                .ok()
                .or_else(|| value.parse::<u64>().ok().map(|v| v as i64));
            match parsed {
                Some(v) => {
                    names.insert(v, name.trim().to_string());
                }
                None => tracing::warn!("enum_names: value '{}' of '{}' is not an integer", value, name),
            }
        }
        names
    }
}

/// Owner of a datatype graph.
#[derive(Debug, Clone, Default)]
pub struct DatatypeArena {
    types: Vec<Datatype>,
}

impl DatatypeArena {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a datatype; every id it references must already be in the arena.
    ///
    /// # Panics
    /// Panics if the datatype references an id that is not yet stored.
    pub fn add(&mut self, datatype: Datatype) -> TypeId {
        let next = self.types.len();
        let refs = datatype
            .base
            .iter()
            .chain(datatype.members.iter().map(|m| &m.datatype));
        for r in refs {
            assert!(r.0 < next, "datatype references unknown id {}", r.0);
        }
        self.types.push(datatype);
        TypeId(next)
    }

    /// Get a datatype.
    pub fn get(&self, id: TypeId) -> Option<&Datatype> {
        self.types.get(id.0)
    }

    /// Get a datatype or fail with a datatype error.
    pub fn resolve(&self, id: TypeId) -> Result<&Datatype> {
        self.get(id)
            .ok_or_else(|| ObjectError::Datatype(format!("unknown datatype id {}", id.0)))
    }

    /// Innermost element type of `id`, looking through arrays and
    /// variable-length sequences. Other types are their own element.
    pub fn element_id(&self, mut id: TypeId) -> TypeId {
        while let Some(Datatype {
            class: DatatypeClass::Array | DatatypeClass::VarLen,
            base: Some(base),
            ..
        }) = self.get(id)
        {
            id = *base;
        }
        id
    }

    /// Element datatype of `id`; see [`DatatypeArena::element_id`].
    pub fn element(&self, id: TypeId) -> Option<&Datatype> {
        self.get(self.element_id(id))
    }

    /// Check if the elements of `id` are unsigned integers.
    pub fn is_unsigned(&self, id: TypeId) -> bool {
        self.element(id).is_some_and(Datatype::is_unsigned)
    }

    /// Number of stored datatypes.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Check if the arena is empty.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Add an array of `base` with the given shape.
    ///
    /// # Panics
    /// Panics if `base` is not stored in this arena.
    pub fn array(&mut self, base: TypeId, dims: Vec<usize>) -> TypeId {
        let base_dt = &self.types[base.0];
        let size = base_dt.size * dims.iter().product::<usize>();
        let mut dt = Datatype::atomic(DatatypeClass::Array, size, base_dt.order, base_dt.sign);
        dt.base = Some(base);
        dt.array_dims = Some(dims);
        self.add(dt)
    }

    /// Add a variable-length sequence of `base`.
    ///
    /// # Panics
    /// Panics if `base` is not stored in this arena.
    pub fn vlen(&mut self, base: TypeId) -> TypeId {
        let mut dt = Datatype::atomic(DatatypeClass::VarLen, 16, ByteOrder::None, Sign::Native);
        dt.base = Some(base);
        self.add(dt)
    }

    /// Add an enum over an integer `base` with a `name=value,...` mapping.
    ///
    /// # Panics
    /// Panics if `base` is not stored in this arena.
    pub fn enumeration(&mut self, base: TypeId, members: impl Into<String>) -> TypeId {
        let base_dt = &self.types[base.0];
        let mut dt = Datatype::atomic(DatatypeClass::Enum, base_dt.size, base_dt.order, base_dt.sign);
        dt.base = Some(base);
        dt.enum_members = Some(members.into());
        self.add(dt)
    }

    /// Add a packed compound of named members.
    ///
    /// # Panics
    /// Panics if a member type is not stored in this arena.
    pub fn compound(&mut self, members: Vec<(String, TypeId)>) -> TypeId {
        let mut offset = 0u64;
        let mut fields = Vec::with_capacity(members.len());
        for (field_id, (name, datatype)) in members.into_iter().enumerate() {
            fields.push(CompoundMember {
                name,
                datatype,
                offset,
                field_id: field_id as u64,
            });
            offset += self.types[datatype.0].size as u64;
        }
        let mut dt = Datatype::atomic(DatatypeClass::Compound, offset as usize, ByteOrder::None, Sign::Native);
        dt.members = fields;
        self.add(dt)
    }

    /// Description of `id`, `"Unknown"` for ids not in the arena.
    pub fn description(&self, id: TypeId) -> String {
        self.get(id)
            .map(Datatype::description)
            .unwrap_or_else(|| "Unknown".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptions() {
        assert_eq!(Datatype::integer(4, true).description(), "32-bit integer");
        assert_eq!(Datatype::integer(2, false).description(), "16-bit unsigned integer");
        assert_eq!(Datatype::float(8).description(), "64-bit floating-point");
        assert_eq!(Datatype::string(10).description(), "String");
        assert_eq!(Datatype::no_class().description(), "Unknown");
    }

    #[test]
    fn test_compound_offsets() {
        let mut arena = DatatypeArena::new();
        let a = arena.add(Datatype::integer(4, true));
        let b = arena.add(Datatype::float(8));
        let c = arena.compound(vec![("a".into(), a), ("b".into(), b)]);
        let dt = arena.resolve(c).unwrap();
        assert_eq!(dt.size, 12);
        assert_eq!(dt.members[1].offset, 4);
        assert_eq!(dt.members[1].field_id, 1);
    }

    #[test]
    fn test_array_size_and_sign() {
        let mut arena = DatatypeArena::new();
        let base = arena.add(Datatype::integer(2, false));
        let arr = arena.array(base, vec![2, 3]);
        let dt = arena.resolve(arr).unwrap();
        assert_eq!(dt.size, 12);
        assert_eq!(dt.sign, Sign::Unsigned);
        assert_eq!(dt.array_dims.as_deref(), Some(&[2, 3][..]));
    }

    #[test]
    fn test_enum_names_skip_malformed() {
        let mut dt = Datatype::integer(1, true);
        dt.class = DatatypeClass::Enum;
        dt.enum_members = Some("LOW=0, HIGH=1,broken,BAD=x".to_string());
        let names = dt.enum_names();
        assert_eq!(names.len(), 2);
        assert_eq!(names[&0], "LOW");
        assert_eq!(names[&1], "HIGH");
    }

    #[test]
    fn test_unknown_id_fails_to_resolve() {
        let arena = DatatypeArena::new();
        assert!(arena.resolve(TypeId(3)).is_err());
        assert_eq!(arena.description(TypeId(3)), "Unknown");
    }

    #[test]
    fn test_unsigned_looks_through_arrays_and_vlen() {
        let mut arena = DatatypeArena::new();
        let byte = arena.add(Datatype::integer(1, false));
        let arr = arena.array(byte, vec![4]);
        let seq = arena.vlen(arr);
        assert_eq!(arena.element_id(seq), byte);
        assert!(arena.is_unsigned(arr));
        assert!(arena.is_unsigned(seq));
        assert!(!arena.resolve(arr).unwrap().is_unsigned());

        let signed = arena.add(Datatype::integer(1, true));
        let signed_arr = arena.array(signed, vec![2]);
        assert!(!arena.is_unsigned(signed_arr));
        let float = arena.add(Datatype::float(4));
        assert_eq!(arena.element_id(float), float);
    }

    #[test]
    #[should_panic]
    fn test_forward_reference_rejected() {
        let mut arena = DatatypeArena::new();
        let mut dt = Datatype::atomic(DatatypeClass::Array, 4, ByteOrder::None, Sign::Native);
        dt.base = Some(TypeId(5));
        arena.add(dt);
    }
}
