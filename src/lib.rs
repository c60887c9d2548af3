//! hdf-object - An object model for hierarchical scientific data files.
//!
//! Groups, datasets, named datatypes and attributes of HDF4/HDF5-style files
//! are exposed as an in-memory object graph. Storage access is delegated to a
//! [`backend::Backend`]; the crate itself handles the bookkeeping around it.
//!
//! # Features
//!
//! - Flattening of nested compound datatypes into selectable members
//! - Unsigned integer widening on read and narrowing on write
//! - Hyperslab selections with a default 2-D/3-D view
//! - Rendering of enum, unsigned and plain values as delimited text
//! - Lazily initialized entities with cached reads
//!
//! # Example
//!
//! ```
//! use hdf_object::backend::MemoryBackend;
//! use hdf_object::data::Entity;
//! use hdf_object::format::{render, Interpretation};
//! use hdf_object::util::RenderConfig;
//!
//! let mut backend = MemoryBackend::new();
//! backend.add_dataset("/counts", "u8", &[3], vec![-1i8, 0, 7])?;
//!
//! let mut entity = Entity::discover(&mut backend, "/counts")?;
//! let values = entity.read(&mut backend)?.clone();
//! let text = render(&values, &Interpretation::Plain, &RenderConfig::with_delimiter(","));
//! assert_eq!(text, "255,0,7");
//! # Ok::<(), hdf_object::ObjectError>(())
//! ```

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]
#![deny(unsafe_code)]

pub mod backend;
pub mod data;
pub mod datatype;
pub mod error;
pub mod format;
pub mod selection;
pub mod util;

pub use error::{ObjectError, Result};
