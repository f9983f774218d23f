//! Values of a compared object graph

use crate::object::ObjectRef;
use crate::type_name::TypeName;
use indexmap::IndexMap;
use std::fmt;

/// A variant of a named enumeration
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumValue {
    pub type_name: TypeName,
    pub variant: String,
}

impl EnumValue {
    pub fn new(type_name: impl Into<TypeName>, variant: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            variant: variant.into(),
        }
    }
}

/// Key of a map entry
///
/// Restricted to types with a total equality so that maps can be indexed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MapKey {
    Bool(bool),
    Int(i64),
    Char(char),
    Str(String),
    Enum(EnumValue),
}

impl MapKey {
    /// Convert the key back into a value
    pub fn to_value(&self) -> Value {
        match self {
            MapKey::Bool(b) => Value::Bool(*b),
            MapKey::Int(i) => Value::Int(*i),
            MapKey::Char(c) => Value::Char(*c),
            MapKey::Str(s) => Value::Str(s.clone()),
            MapKey::Enum(e) => Value::Enum(e.clone()),
        }
    }
}

impl fmt::Display for MapKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapKey::Bool(b) => write!(f, "{}", b),
            MapKey::Int(i) => write!(f, "{}", i),
            MapKey::Char(c) => write!(f, "{}", c),
            MapKey::Str(s) => f.write_str(s),
            MapKey::Enum(e) => f.write_str(&e.variant),
        }
    }
}

impl From<&str> for MapKey {
    fn from(s: &str) -> Self {
        MapKey::Str(s.to_string())
    }
}

impl From<String> for MapKey {
    fn from(s: String) -> Self {
        MapKey::Str(s)
    }
}

impl From<i64> for MapKey {
    fn from(i: i64) -> Self {
        MapKey::Int(i)
    }
}

/// A node of an object graph
///
/// Scalars and containers are owned; objects are shared handles with an
/// identity, which is what makes cycles possible.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Char(char),
    Str(String),
    Enum(EnumValue),
    /// Optional-like wrapper (present or empty)
    Optional(Option<Box<Value>>),
    /// Fixed-size array
    Array(Vec<Value>),
    /// Ordered collection
    List(Vec<Value>),
    /// Unordered collection
    Set(Vec<Value>),
    /// Map in insertion order
    Map(IndexMap<MapKey, Value>),
    Object(ObjectRef),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Whether this is an array, list, set or map
    pub fn is_collection(&self) -> bool {
        matches!(
            self,
            Value::Array(_) | Value::List(_) | Value::Set(_) | Value::Map(_)
        )
    }

    /// Whether this is a collection without elements
    pub fn is_empty_collection(&self) -> bool {
        match self {
            Value::Array(items) | Value::List(items) | Value::Set(items) => items.is_empty(),
            Value::Map(entries) => entries.is_empty(),
            _ => false,
        }
    }

    /// Runtime type of the value, `None` for null
    pub fn type_name(&self) -> Option<TypeName> {
        let name = match self {
            Value::Null => return None,
            Value::Bool(_) => TypeName::BOOL,
            Value::Int(_) => TypeName::INT,
            Value::Float(_) => TypeName::FLOAT,
            Value::Char(_) => TypeName::CHAR,
            Value::Str(_) => TypeName::STRING,
            Value::Enum(e) => e.type_name.clone(),
            Value::Optional(_) => TypeName::OPTION,
            Value::Array(_) => TypeName::ARRAY,
            Value::List(_) => TypeName::LIST,
            Value::Set(_) => TypeName::SET,
            Value::Map(_) => TypeName::MAP,
            Value::Object(obj) => obj.type_name().clone(),
        };
        Some(name)
    }

    /// Short description of the kind of value, used in difference descriptions
    pub fn kind_description(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::Char(_) | Value::Str(_) => {
                "a scalar"
            }
            Value::Enum(_) => "an enum",
            Value::Optional(_) => "an optional",
            Value::Array(_) => "an array",
            Value::List(_) => "an ordered collection",
            Value::Set(_) => "an unordered collection",
            Value::Map(_) => "a map",
            Value::Object(_) => "an object",
        }
    }

    /// Identity of the underlying object, if this value is an object
    pub fn identity(&self) -> Option<usize> {
        match self {
            Value::Object(obj) => Some(obj.identity()),
            _ => None,
        }
    }

    /// Native equality
    ///
    /// Scalars compare by value (`NaN` equals `NaN`), sequences compare
    /// elementwise in order, sets compare as multisets, objects compare
    /// through their equality hook and fall back to identity when they have
    /// none.
    pub fn native_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Enum(a), Value::Enum(b)) => a == b,
            (Value::Optional(a), Value::Optional(b)) => match (a, b) {
                (Some(a), Some(b)) => a.native_eq(b),
                (None, None) => true,
                _ => false,
            },
            (Value::Array(a), Value::Array(b)) | (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.native_eq(y))
            }
            (Value::Set(a), Value::Set(b)) => a.len() == b.len() && same_elements(a, b),
            (Value::Map(a), Value::Map(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, v)| b.get(k).map(|w| v.native_eq(w)).unwrap_or(false))
            }
            (Value::Object(a), Value::Object(b)) => a.native_eq(b),
            _ => false,
        }
    }

    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    pub fn array<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Value::Array(items.into_iter().map(Into::into).collect())
    }

    pub fn set<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Value::Set(items.into_iter().map(Into::into).collect())
    }

    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<MapKey>,
        V: Into<Value>,
    {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn some(value: impl Into<Value>) -> Self {
        Value::Optional(Some(Box::new(value.into())))
    }

    pub fn none() -> Self {
        Value::Optional(None)
    }

    pub fn variant(type_name: impl Into<TypeName>, variant: impl Into<String>) -> Self {
        Value::Enum(EnumValue::new(type_name, variant))
    }
}

/// Whether every element of `a` pairs off with a distinct element of `b`
fn same_elements(a: &[Value], b: &[Value]) -> bool {
    let mut taken = vec![false; b.len()];
    a.iter().all(|x| match (0..b.len()).find(|&j| !taken[j] && x.native_eq(&b[j])) {
        Some(j) => {
            taken[j] = true;
            true
        }
        None => false,
    })
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.native_eq(other)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::Char(c)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<EnumValue> for Value {
    fn from(e: EnumValue) -> Self {
        Value::Enum(e)
    }
}

impl From<ObjectRef> for Value {
    fn from(obj: ObjectRef) -> Self {
        Value::Object(obj)
    }
}

impl From<MapKey> for Value {
    fn from(key: MapKey) -> Self {
        key.to_value()
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        Value::Optional(opt.map(|v| Box::new(v.into())))
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::list(items)
    }
}
