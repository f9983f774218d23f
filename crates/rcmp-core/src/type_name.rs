//! Runtime type names used for type-based rules

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Name of a runtime type (e.g. `i64`, `String`, `Person`)
///
/// Type-based rules (comparators, ignored types, native equality) are keyed
/// by exact name; there is no notion of subtyping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeName(Cow<'static, str>);

impl TypeName {
    pub const BOOL: TypeName = TypeName(Cow::Borrowed("bool"));
    pub const INT: TypeName = TypeName(Cow::Borrowed("i64"));
    pub const FLOAT: TypeName = TypeName(Cow::Borrowed("f64"));
    pub const CHAR: TypeName = TypeName(Cow::Borrowed("char"));
    pub const STRING: TypeName = TypeName(Cow::Borrowed("String"));
    pub const OPTION: TypeName = TypeName(Cow::Borrowed("Option"));
    pub const ARRAY: TypeName = TypeName(Cow::Borrowed("array"));
    pub const LIST: TypeName = TypeName(Cow::Borrowed("list"));
    pub const SET: TypeName = TypeName(Cow::Borrowed("set"));
    pub const MAP: TypeName = TypeName(Cow::Borrowed("map"));

    /// Create a type name
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// Get the name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for TypeName {
    fn from(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }
}

impl From<String> for TypeName {
    fn from(name: String) -> Self {
        Self(Cow::Owned(name))
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
