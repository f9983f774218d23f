//! Field enumeration and reading
//!
//! The comparison engine never touches an object's fields directly: it asks
//! an [`Accessor`] which fields to compare and what their values are. This
//! keeps the engine independent of how fields are discovered.

use crate::error::IntrospectionResult;
use crate::object::{FieldSlot, ObjectRef, Visibility};
use crate::type_name::TypeName;
use crate::value::Value;

/// Description of a comparable field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub declared_type: Option<TypeName>,
    pub visibility: Visibility,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: None,
            visibility: Visibility::Public,
        }
    }
}

/// Outcome of reading a single field
#[derive(Debug, Clone)]
pub enum FieldRead {
    Value(Value),
    /// The field exists but its value cannot be obtained
    Unreadable(String),
}

impl FieldRead {
    pub fn value(&self) -> Option<&Value> {
        match self {
            FieldRead::Value(value) => Some(value),
            FieldRead::Unreadable(_) => None,
        }
    }

    pub fn unreadable_reason(&self) -> Option<&str> {
        match self {
            FieldRead::Value(_) => None,
            FieldRead::Unreadable(reason) => Some(reason),
        }
    }
}

/// Capability to enumerate and read the fields of an object
///
/// `Err` results are fatal and abort the whole comparison; a field that
/// merely cannot be read should be reported as [`FieldRead::Unreadable`].
pub trait Accessor: Send + Sync {
    /// List the fields to compare, in declaration order
    fn list_fields(&self, object: &ObjectRef) -> IntrospectionResult<Vec<FieldDescriptor>>;

    /// Read the value of a field previously returned by `list_fields`
    fn read_field(&self, object: &ObjectRef, field: &FieldDescriptor) -> IntrospectionResult<FieldRead>;
}

/// Accessor over the field table of [`crate::Object`]
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldAccessor {
    include_private: bool,
}

impl FieldAccessor {
    /// Accessor exposing public fields only
    pub fn new() -> Self {
        Self::default()
    }

    /// Accessor exposing private fields too when `include_private` is set
    pub fn including_private(include_private: bool) -> Self {
        Self { include_private }
    }

    fn exposes(&self, visibility: Visibility) -> bool {
        self.include_private || visibility == Visibility::Public
    }
}

impl Accessor for FieldAccessor {
    fn list_fields(&self, object: &ObjectRef) -> IntrospectionResult<Vec<FieldDescriptor>> {
        let guard = object.read()?;
        Ok(guard
            .fields()
            .filter(|(_, field)| self.exposes(field.visibility))
            .map(|(name, field)| FieldDescriptor {
                name: name.to_string(),
                declared_type: field.declared_type.clone(),
                visibility: field.visibility,
            })
            .collect())
    }

    fn read_field(&self, object: &ObjectRef, field: &FieldDescriptor) -> IntrospectionResult<FieldRead> {
        let guard = object.read()?;
        let read = match guard.field(&field.name) {
            Some(f) if !self.exposes(f.visibility) => {
                FieldRead::Unreadable(format!("field '{}' is private", field.name))
            }
            Some(f) => match &f.slot {
                FieldSlot::Value(value) => FieldRead::Value(value.clone()),
                FieldSlot::Unreadable(reason) => FieldRead::Unreadable(reason.clone()),
            },
            None => FieldRead::Unreadable(format!(
                "'{}' has no field named '{}'",
                object.type_name(),
                field.name
            )),
        };
        Ok(read)
    }
}
