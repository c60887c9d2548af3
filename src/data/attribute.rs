//! Attributes: small named values attached to an entity.

use super::{DataBuffer, MetadataContainer, PropertyBag, PropertyValue};
use crate::backend::Backend;
use crate::datatype::{flatten, CompoundMembers, DatatypeArena, TypeId};
use crate::error::{ObjectError, Result};
use crate::format::{self, Interpretation};
use crate::selection::Selection;
use crate::util::{ObjectConfig, RenderConfig};

/// A named, typed value attached to a parent entity.
///
/// The parent is referenced by full name only.
#[derive(Debug, Clone)]
pub struct Attribute {
    name: String,
    parent: Option<String>,
    arena: DatatypeArena,
    datatype: TypeId,
    dims: Vec<usize>,
    scalar: bool,
    value: Option<DataBuffer>,
    selection: Selection,
    members: CompoundMembers,
    properties: PropertyBag,
    config: ObjectConfig,
}

impl Attribute {
    /// Create an attribute of datatype `datatype` from `arena`.
    ///
    /// Without `dims` the attribute is a scalar of rank 1 and dims `[1]`.
    pub fn new(name: impl Into<String>, arena: DatatypeArena, datatype: TypeId, dims: Option<Vec<usize>>) -> Self {
        Self::with_config(name, arena, datatype, dims, ObjectConfig::default())
    }

    /// Create an attribute with explicit configuration.
    pub fn with_config(
        name: impl Into<String>,
        arena: DatatypeArena,
        datatype: TypeId,
        dims: Option<Vec<usize>>,
        config: ObjectConfig,
    ) -> Self {
        let scalar = dims.is_none();
        let dims = dims.unwrap_or_else(|| vec![1]);
        let members = flatten(&arena, datatype, config.member_separator);
        Self {
            name: name.into(),
            parent: None,
            selection: Selection::new(&dims),
            arena,
            datatype,
            dims,
            scalar,
            value: None,
            members,
            properties: PropertyBag::new(),
            config,
        }
    }

    /// Attribute name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full name of the entity the attribute is attached to.
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Attach to the entity with full name `parent`.
    pub fn set_parent(&mut self, parent: impl Into<String>) {
        self.parent = Some(parent.into());
    }

    /// Datatype arena and root type.
    pub fn datatype(&self) -> (&DatatypeArena, TypeId) {
        (&self.arena, self.datatype)
    }

    /// Dimensions.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Number of dimensions.
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Check if the attribute was created without dimensions.
    pub fn is_scalar(&self) -> bool {
        self.scalar
    }

    /// Check if values are unsigned integers.
    pub fn is_unsigned(&self) -> bool {
        self.arena.is_unsigned(self.datatype)
    }

    /// Current value.
    pub fn value(&self) -> Option<&DataBuffer> {
        self.value.as_ref()
    }

    /// Replace the value.
    pub fn set_value(&mut self, value: impl Into<DataBuffer>) {
        self.value = Some(value.into());
    }

    /// Current selection.
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Mutable selection.
    pub fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    /// Flattened compound members; empty for non-compound attributes.
    pub fn members(&self) -> &CompoundMembers {
        &self.members
    }

    /// Mutable flattened members, for changing the member selection.
    pub fn members_mut(&mut self) -> &mut CompoundMembers {
        &mut self.members
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

    /// Render the value as delimited text; empty when there is no value.
    pub fn to_display_string(&self, config: &RenderConfig) -> String {
        let Some(value) = &self.value else {
            return String::new();
        };
        match value {
            DataBuffer::Text(texts) if self.scalar && texts.len() == 1 => {
                format::render_text(texts[0].as_deref().unwrap_or("null"), config)
            }
            DataBuffer::Compound(columns) => {
                let interpretations: Vec<Interpretation> = self
                    .members
                    .selected_types()
                    .into_iter()
                    .map(|ty| ty.map_or(Interpretation::Plain, |ty| Interpretation::for_type(&self.arena, ty)))
                    .collect();
                format::render_members(columns, &interpretations, config)
            }
            _ => format::render(value, &Interpretation::for_type(&self.arena, self.datatype), config),
        }
    }

    /// Render with the attribute's own render settings.
    pub fn to_default_string(&self) -> String {
        self.to_display_string(&self.config.render)
    }
}

impl MetadataContainer for Attribute {
    fn metadata<B: Backend + ?Sized>(&mut self, _backend: &mut B) -> Result<Vec<Attribute>> {
        Err(ObjectError::unsupported("attribute", "metadata"))
    }

    fn write_metadata<B: Backend + ?Sized>(&mut self, _backend: &mut B, _attribute: &Attribute) -> Result<()> {
        Err(ObjectError::unsupported("attribute", "write_metadata"))
    }

    fn remove_metadata<B: Backend + ?Sized>(&mut self, _backend: &mut B, _name: &str) -> Result<()> {
        Err(ObjectError::unsupported("attribute", "remove_metadata"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::datatype::parse_type;

    fn attribute(expr: &str, dims: Option<Vec<usize>>) -> Attribute {
        let (arena, id) = parse_type(expr).unwrap();
        Attribute::new("a", arena, id, dims)
    }

    #[test]
    fn test_scalar_has_rank_one() {
        let a = attribute("i32", None);
        assert!(a.is_scalar());
        assert_eq!(a.dims(), &[1]);
        assert_eq!(a.rank(), 1);
        assert_eq!(a.selection().count(), &[1]);
    }

    #[test]
    fn test_unsigned_rendering() {
        let mut a = attribute("u8", Some(vec![2]));
        assert!(a.is_unsigned());
        a.set_value(vec![-1i8, 100]);
        assert_eq!(a.to_display_string(&RenderConfig::with_delimiter(",")), "255,100");
    }

    #[test]
    fn test_enum_rendering() {
        let mut a = attribute("enum<u8>(LOW=0,HIGH=1)", Some(vec![3]));
        a.set_value(vec![0i8, 1, 0]);
        assert_eq!(a.to_display_string(&RenderConfig::with_delimiter(",")), "LOW,HIGH,LOW");
    }

    #[test]
    fn test_scalar_text_truncated() {
        let mut a = attribute("string", None);
        a.set_value(vec!["a long description".to_string()]);
        assert_eq!(a.to_display_string(&RenderConfig::default().max_items(6)), "a long");
        assert_eq!(a.to_default_string(), "a long description");
    }

    #[test]
    fn test_compound_members_rendered_by_type() {
        let mut a = attribute("{n:u8, x:f32}", Some(vec![1]));
        assert_eq!(a.members().member_count(), 2);
        a.set_value(DataBuffer::Compound(vec![vec![-2i8].into(), vec![0.5f32].into()]));
        assert_eq!(a.to_display_string(&RenderConfig::with_delimiter(",")), "{254},{0.5}");
    }

    #[test]
    fn test_unsigned_array_member_rendered_unsigned() {
        let mut a = attribute("{a:u8[2]}", Some(vec![1]));
        a.set_value(DataBuffer::Compound(vec![vec![-1i8, 2].into()]));
        assert_eq!(a.to_display_string(&RenderConfig::with_delimiter(",")), "{255,2}");

        let mut b = attribute("u16[2]", None);
        assert!(b.is_unsigned());
        b.set_value(vec![-1i16, 3]);
        assert_eq!(b.to_display_string(&RenderConfig::with_delimiter(",")), "65535,3");
    }

    #[test]
    fn test_unsigned_enum_high_codes() {
        let mut a = attribute("enum<u8>(LOW=0,HI=200)", Some(vec![2]));
        a.set_value(vec![0i8, -56]);
        assert_eq!(a.to_display_string(&RenderConfig::with_delimiter(",")), "LOW,HI");
    }

    #[test]
    fn test_missing_value_renders_empty() {
        assert_eq!(attribute("f64", None).to_default_string(), "");
    }

    #[test]
    fn test_metadata_is_unsupported() {
        let mut a = attribute("i8", None);
        let mut backend = MemoryBackend::new();
        let err = a.metadata(&mut backend).unwrap_err();
        assert!(matches!(err, ObjectError::Unsupported { .. }));
        assert!(a.remove_metadata(&mut backend, "x").is_err());
    }
}
