//! Core types for recursive comparison
//!
//! This crate provides the pieces every other layer builds on: the object
//! graph model ([`Value`], [`ObjectRef`]), the location of a node inside a
//! graph ([`ComparisonPath`]), and the [`Accessor`] capability that lists and
//! reads the fields of an object.
//!
//! # Example
//!
//! ```ignore
//! use rcmp_core::{Object, Value};
//!
//! let home = Object::new("Home").with_field("street", "Main St").into_ref();
//! let person = Object::new("Person")
//!     .with_field("name", "Jack")
//!     .with_field("home", home)
//!     .into_ref();
//! let value = Value::from(person);
//! ```

mod accessor;
mod error;
mod json;
mod object;
mod path;
mod type_name;
mod value;

pub use accessor::{Accessor, FieldAccessor, FieldDescriptor, FieldRead};
pub use error::{IntrospectionError, IntrospectionResult, PathError};
pub use object::{Field, FieldSlot, NativeEquality, Object, ObjectRef, Visibility};
pub use path::{ComparisonPath, PathSegment, FIELD_SEPARATOR};
pub use type_name::TypeName;
pub use value::{EnumValue, MapKey, Value};
