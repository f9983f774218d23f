//! Objects: named, field-bearing nodes with identity

use crate::error::{IntrospectionError, IntrospectionResult};
use crate::type_name::TypeName;
use crate::value::Value;
use indexmap::IndexMap;
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard};

/// Equality hook of an object type ("overridden equals")
pub type NativeEquality = Arc<dyn Fn(&Object, &Object) -> bool + Send + Sync>;

/// Field visibility, consulted when listing fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

/// Content of a field
#[derive(Debug, Clone)]
pub enum FieldSlot {
    Value(Value),
    /// Reading the field fails with the given reason
    Unreadable(String),
}

/// A declared field of an object
#[derive(Debug, Clone)]
pub struct Field {
    pub slot: FieldSlot,
    pub visibility: Visibility,
    pub declared_type: Option<TypeName>,
}

impl Field {
    fn public(value: Value) -> Self {
        Self {
            slot: FieldSlot::Value(value),
            visibility: Visibility::Public,
            declared_type: None,
        }
    }
}

/// An object: a type name plus fields in declaration order
pub struct Object {
    type_name: TypeName,
    fields: IndexMap<String, Field>,
    equality: Option<NativeEquality>,
}

impl Object {
    pub fn new(type_name: impl Into<TypeName>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: IndexMap::new(),
            equality: None,
        }
    }

    /// Add a public field
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), Field::public(value.into()));
        self
    }

    /// Add a private field (hidden unless private introspection is enabled)
    pub fn with_private_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut field = Field::public(value.into());
        field.visibility = Visibility::Private;
        self.fields.insert(name.into(), field);
        self
    }

    /// Add a public field with a declared type
    pub fn with_typed_field(
        mut self,
        name: impl Into<String>,
        declared_type: impl Into<TypeName>,
        value: impl Into<Value>,
    ) -> Self {
        let mut field = Field::public(value.into());
        field.declared_type = Some(declared_type.into());
        self.fields.insert(name.into(), field);
        self
    }

    /// Add a field whose read always fails
    pub fn with_unreadable_field(mut self, name: impl Into<String>, reason: impl Into<String>) -> Self {
        self.fields.insert(
            name.into(),
            Field {
                slot: FieldSlot::Unreadable(reason.into()),
                visibility: Visibility::Public,
                declared_type: None,
            },
        );
        self
    }

    /// Install a native equality hook
    pub fn with_equality<F>(mut self, equality: F) -> Self
    where
        F: Fn(&Object, &Object) -> bool + Send + Sync + 'static,
    {
        self.equality = Some(Arc::new(equality));
        self
    }

    pub fn type_name(&self) -> &TypeName {
        &self.type_name
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    /// Value of a readable field
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self.fields.get(name).map(|f| &f.slot) {
            Some(FieldSlot::Value(value)) => Some(value),
            _ => None,
        }
    }

    /// Fields in declaration order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(name, field)| (name.as_str(), field))
    }

    /// Replace a field value, keeping its visibility and declared type
    ///
    /// Unknown fields are added as public fields.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let value = value.into();
        match self.fields.entry(name.into()) {
            indexmap::map::Entry::Occupied(mut entry) => entry.get_mut().slot = FieldSlot::Value(value),
            indexmap::map::Entry::Vacant(entry) => {
                entry.insert(Field::public(value));
            }
        }
    }

    pub fn has_native_equality(&self) -> bool {
        self.equality.is_some()
    }

    /// Compare with the equality hook; `None` when there is no hook
    pub fn equals(&self, other: &Object) -> Option<bool> {
        self.equality.as_ref().map(|eq| eq(self, other))
    }

    /// Wrap into a shared handle
    pub fn into_ref(self) -> ObjectRef {
        ObjectRef::new(self)
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Field values may point back to this object, so only names are shown
        f.debug_struct("Object")
            .field("type_name", &self.type_name)
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .field("native_equality", &self.equality.is_some())
            .finish()
    }
}

struct Shared {
    type_name: TypeName,
    object: RwLock<Object>,
}

/// Shared handle to an object
///
/// Cloning the handle keeps the identity; identity is the allocation
/// address. Handles can be stored into the fields of their own descendants
/// to build cyclic graphs.
#[derive(Clone)]
pub struct ObjectRef(Arc<Shared>);

impl ObjectRef {
    pub fn new(object: Object) -> Self {
        Self(Arc::new(Shared {
            type_name: object.type_name.clone(),
            object: RwLock::new(object),
        }))
    }

    /// Identity of the referenced object
    pub fn identity(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn type_name(&self) -> &TypeName {
        &self.0.type_name
    }

    /// Lock the object for reading
    pub fn read(&self) -> IntrospectionResult<RwLockReadGuard<'_, Object>> {
        self.0
            .object
            .read()
            .map_err(|_| IntrospectionError::Poisoned {
                type_name: self.0.type_name.clone(),
            })
    }

    /// Set a field value (see [`Object::set`])
    pub fn set_field(&self, name: impl Into<String>, value: impl Into<Value>) -> IntrospectionResult<()> {
        let mut object = self
            .0
            .object
            .write()
            .map_err(|_| IntrospectionError::Poisoned {
                type_name: self.0.type_name.clone(),
            })?;
        object.set(name, value);
        Ok(())
    }

    pub fn has_native_equality(&self) -> IntrospectionResult<bool> {
        Ok(self.read()?.has_native_equality())
    }

    /// Native equality: identity, else the equality hook of `self`
    ///
    /// Objects without a hook are only equal to themselves. A poisoned lock
    /// makes the objects unequal.
    pub fn native_eq(&self, other: &ObjectRef) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        match (self.read(), other.read()) {
            (Ok(a), Ok(b)) => a.equals(&b).unwrap_or(false),
            _ => false,
        }
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:#x}", self.0.type_name, self.identity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_keep_declaration_order() {
        let obj = Object::new("Person")
            .with_field("name", "Jack")
            .with_private_field("age", 42)
            .with_field("email", "jack@example.com");
        let names: Vec<_> = obj.fields().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["name", "age", "email"]);
        assert_eq!(obj.field("age").unwrap().visibility, Visibility::Private);
    }

    #[test]
    fn test_set_field_builds_cycle() {
        let node = Object::new("Node").with_field("next", Value::Null).into_ref();
        node.set_field("next", node.clone()).unwrap();

        let guard = node.read().unwrap();
        match guard.get("next") {
            Some(Value::Object(next)) => assert!(next.ptr_eq(&node)),
            other => panic!("unexpected next: {:?}", other),
        }
    }

    #[test]
    fn test_set_keeps_visibility() {
        let mut obj = Object::new("Secret").with_private_field("token", "a");
        obj.set("token", "b");
        let field = obj.field("token").unwrap();
        assert_eq!(field.visibility, Visibility::Private);
        assert!(matches!(&field.slot, FieldSlot::Value(Value::Str(s)) if s == "b"));
    }

    #[test]
    fn test_equality_hook() {
        let by_id = |a: &Object, b: &Object| a.get("id") == b.get("id");
        let a = Object::new("User")
            .with_field("id", 1)
            .with_field("name", "a")
            .with_equality(by_id)
            .into_ref();
        let b = Object::new("User")
            .with_field("id", 1)
            .with_field("name", "b")
            .with_equality(by_id)
            .into_ref();
        assert!(a.native_eq(&b));
        assert!(a.has_native_equality().unwrap());
    }

    #[test]
    fn test_debug_does_not_recurse() {
        let node = Object::new("Node").into_ref();
        node.set_field("me", node.clone()).unwrap();
        let rendered = format!("{:?}", Value::from(node));
        assert!(rendered.contains("Node@"));
    }
}
