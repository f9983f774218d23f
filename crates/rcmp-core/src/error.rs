//! Error types for graph introspection and path parsing

use crate::type_name::TypeName;
use thiserror::Error;

/// Result type for introspection operations
pub type IntrospectionResult<T> = Result<T, IntrospectionError>;

/// Unrecoverable failures of the introspection layer
///
/// These are distinct from unreadable fields: an unreadable field is a
/// property of the data and is reported as a difference, while an
/// introspection error means the graph cannot be inspected at all.
#[derive(Debug, Error)]
pub enum IntrospectionError {
    /// A writer panicked while holding the object's lock
    #[error("object of type '{type_name}' is poisoned")]
    Poisoned { type_name: TypeName },

    /// The accessor refused to expose a field
    #[error("access to field '{field}' of '{type_name}' was denied: {reason}")]
    AccessDenied {
        type_name: TypeName,
        field: String,
        reason: String,
    },

    /// The accessor cannot introspect this kind of object
    #[error("cannot introspect '{type_name}': {reason}")]
    Unsupported { type_name: TypeName, reason: String },
}

/// Error type for invalid comparison paths
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("path cannot be empty")]
    Empty,

    #[error("path '{path}' contains an empty segment")]
    EmptySegment { path: String },
}
