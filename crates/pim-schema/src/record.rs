use std::fmt;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::SchemaError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// JSON value kind a declared field must hold.
pub enum FieldKind {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
    Any,
}

impl FieldKind {
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
            Self::Any => true,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "a string",
            Self::Integer => "an integer",
            Self::Number => "a number",
            Self::Boolean => "a boolean",
            Self::Array => "an array",
            Self::Object => "an object",
            Self::Any => "any value",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldSpec {
    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
        }
    }

    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
        }
    }

    fn check(&self, schema: &'static str, value: Option<&Value>) -> Result<(), SchemaError> {
        match value {
            None | Some(Value::Null) if self.required => Err(SchemaError::MissingProperty {
                schema,
                property: self.name,
            }),
            None | Some(Value::Null) => Ok(()),
            Some(value) if self.kind.accepts(value) => Ok(()),
            Some(value) => Err(SchemaError::InvalidValue {
                schema,
                property: self.name.to_string(),
                expected: self.kind,
                found: json_kind(value),
            }),
        }
    }
}

/// A closed set of declared fields describing one payload shape.
pub trait RecordSchema: 'static {
    const NAME: &'static str;

    fn fields() -> &'static [FieldSpec];

    fn field(name: &str) -> Option<&'static FieldSpec> {
        Self::fields().iter().find(|field| field.name == name)
    }
}

/// A JSON object restricted to the fields its schema declares.
///
/// `set` and `get` reject undeclared names. `import` is the only way to carry
/// undeclared fields: it accepts whatever the server sends and validates the
/// declared ones.
pub struct Record<S> {
    values: Map<String, Value>,
    strict: bool,
    schema: PhantomData<fn() -> S>,
}

impl<S: RecordSchema> Record<S> {
    pub fn new() -> Self {
        Self {
            values: Map::new(),
            strict: true,
            schema: PhantomData,
        }
    }

    pub fn set(
        &mut self,
        property: &str,
        value: impl Into<Value>,
    ) -> Result<&mut Self, SchemaError> {
        if self.strict && S::field(property).is_none() {
            return Err(self.invalid_property(property));
        }
        self.values.insert(property.to_string(), value.into());
        Ok(self)
    }

    /// The stored value of a declared field; `None` when it was never set.
    pub fn get(&self, property: &str) -> Result<Option<&Value>, SchemaError> {
        if S::field(property).is_none() {
            return Err(self.invalid_property(property));
        }
        Ok(self.values.get(property))
    }

    /// Builds a record from a decoded payload, accepting undeclared fields.
    pub fn import(value: Value) -> Result<Self, SchemaError> {
        let object = match value {
            Value::Object(object) => object,
            other => {
                return Err(SchemaError::NotAnObject {
                    schema: S::NAME,
                    found: json_kind(&other),
                })
            }
        };

        let mut record = Self::new();
        {
            let mut permissive = PermissiveScope::enter(&mut record);
            for (property, value) in object {
                if S::field(&property).is_none() {
                    tracing::trace!(
                        schema = S::NAME,
                        property = %property,
                        "keeping undeclared field"
                    );
                }
                permissive.set(&property, value)?;
            }
        }
        record.validate()?;
        Ok(record)
    }

    /// Validates declared fields and exports the record as a JSON object.
    pub fn to_primitive(&self) -> Result<Value, SchemaError> {
        self.validate()?;
        Ok(Value::Object(self.values.clone()))
    }

    pub fn to_json(&self) -> Result<String, SchemaError> {
        let primitive = self.to_primitive()?;
        serde_json::to_string(&primitive).map_err(|source| SchemaError::Encode {
            schema: S::NAME,
            source,
        })
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn schema_name(&self) -> &'static str {
        S::NAME
    }

    pub(crate) fn field_str(&self, property: &'static str) -> Option<&str> {
        self.values.get(property).and_then(Value::as_str)
    }

    pub(crate) fn field_i64(&self, property: &'static str) -> Option<i64> {
        self.values.get(property).and_then(Value::as_i64)
    }

    pub(crate) fn field_bool(&self, property: &'static str) -> Option<bool> {
        self.values.get(property).and_then(Value::as_bool)
    }

    pub(crate) fn field_value(&self, property: &'static str) -> Option<&Value> {
        self.values.get(property)
    }

    /// Stores a declared field from a typed setter.
    pub(crate) fn put(&mut self, property: &'static str, value: Value) -> &mut Self {
        debug_assert!(S::field(property).is_some(), "{property} is not declared");
        self.values.insert(property.to_string(), value);
        self
    }

    fn validate(&self) -> Result<(), SchemaError> {
        S::fields()
            .iter()
            .try_for_each(|field| field.check(S::NAME, self.values.get(field.name)))
    }

    fn invalid_property(&self, property: &str) -> SchemaError {
        SchemaError::InvalidProperty {
            schema: S::NAME,
            property: property.to_string(),
        }
    }
}

impl<S: RecordSchema> Default for Record<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Clone for Record<S> {
    fn clone(&self) -> Self {
        Self {
            values: self.values.clone(),
            strict: self.strict,
            schema: PhantomData,
        }
    }
}

impl<S> PartialEq for Record<S> {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

impl<S: RecordSchema> fmt::Debug for Record<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("schema", &S::NAME)
            .field("values", &self.values)
            .finish()
    }
}

impl<S> Serialize for Record<S> {
    fn serialize<Z: Serializer>(&self, serializer: Z) -> Result<Z::Ok, Z::Error> {
        self.values.serialize(serializer)
    }
}

/// Suspends property checks on a record until dropped.
struct PermissiveScope<'a, S> {
    record: &'a mut Record<S>,
}

impl<'a, S> PermissiveScope<'a, S> {
    fn enter(record: &'a mut Record<S>) -> Self {
        record.strict = false;
        Self { record }
    }
}

impl<S> Drop for PermissiveScope<'_, S> {
    fn drop(&mut self) {
        self.record.strict = true;
    }
}

impl<S> Deref for PermissiveScope<'_, S> {
    type Target = Record<S>;

    fn deref(&self) -> &Self::Target {
        self.record
    }
}

impl<S> DerefMut for PermissiveScope<'_, S> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.record
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
