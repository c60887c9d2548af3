//! The object model: entities, datasets, attributes and their values.

mod attribute;
mod buffer;
mod dataset;
mod entity;
mod naming;
mod properties;
pub mod text;
pub mod unsigned;

pub use attribute::Attribute;
pub use buffer::DataBuffer;
pub use dataset::{Dataset, DatasetKind, InitState, Interlace, ScalarInfo};
pub use entity::{Entity, EntityKind, MetadataContainer};
pub use naming::{ObjectId, ObjectName, SEPARATOR};
pub use properties::{PropertyBag, PropertyValue};
