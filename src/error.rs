//! Error types for hdf-object.
//!
//! This module provides a unified error handling approach using `thiserror`.

use thiserror::Error;

/// Result type alias for object-model operations.
pub type Result<T> = std::result::Result<T, ObjectError>;

/// Errors that can occur in the object model.
#[derive(Debug, Error)]
pub enum ObjectError {
    /// The backend could not hand out a handle for an object.
    #[error("Failed to open object: {path}")]
    Open {
        path: String,
        #[source]
        source: Box<ObjectError>,
    },

    /// Generic failure reported by a backend.
    #[error("Backend error: {0}")]
    Backend(String),

    /// Object not found in the backend.
    #[error("Object not found: {path}")]
    NotFound { path: String },

    /// Handle was not issued by the backend or is already closed.
    #[error("Invalid handle: {0}")]
    InvalidHandle(u64),

    /// Operation is meaningful only for other entity kinds.
    #[error("Operation not supported for {kind}: {operation}")]
    Unsupported { kind: String, operation: String },

    /// An accessor was used before `init()` completed.
    #[error("Object not initialized: {name}")]
    NotInitialized { name: String },

    /// A previous `init()` failed.
    #[error("Initialization of {name} failed: {reason}")]
    InitFailed { name: String, reason: String },

    /// Invalid rename or path.
    #[error("Invalid name: {0}")]
    InvalidName(String),

    /// Selection does not fit the dataspace.
    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    /// Buffer could not be converted or interpreted.
    #[error("Conversion error: {0}")]
    Conversion(String),

    /// Datatype could not be resolved.
    #[error("Datatype error: {0}")]
    Datatype(String),

    /// Datatype expression could not be parsed.
    #[error("Syntax error at offset {offset}: {message}")]
    TypeSyntax { offset: usize, message: String },

    /// Array shape error from ndarray.
    #[error("Shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

impl ObjectError {
    /// Create an Open error wrapping the backend failure.
    pub fn open(path: impl Into<String>, source: ObjectError) -> Self {
        Self::Open {
            path: path.into(),
            source: Box::new(source),
        }
    }

    /// Create a NotFound error.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Create an Unsupported error.
    pub fn unsupported(kind: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::Unsupported {
            kind: kind.into(),
            operation: operation.into(),
        }
    }

    /// Create a NotInitialized error.
    pub fn not_initialized(name: impl Into<String>) -> Self {
        Self::NotInitialized { name: name.into() }
    }

    /// Create a TypeSyntax error.
    pub fn syntax(offset: usize, message: impl Into<String>) -> Self {
        Self::TypeSyntax {
            offset,
            message: message.into(),
        }
    }

    /// Create a Conversion error.
    pub fn conversion(message: impl Into<String>) -> Self {
        Self::Conversion(message.into())
    }
}
