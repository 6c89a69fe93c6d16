//! Host message types.
//!
//! A host type takes part in CEL in two directions:
//!
//! - [`ToCelValue`] projects an instance into a [`Value`], usually a
//!   [`Value::Message`] whose named fields are visible to member access.
//! - [`FromCelFields`] builds an instance from the evaluated fields of a
//!   constructor expression such as `acme.Account{balance: 500}`.
//!
//! [`MessageType::of`] registers a type path for the second direction, and
//! [`MessageResolver`] lets existing host objects enter through
//! [`Environment::add_raw`](crate::Environment::add_raw).

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::FieldError;
use crate::extension::ValueResolver;
use crate::value::{FromValue, Value};

pub trait ToCelValue {
    fn to_cel_value(&self) -> Value;
}

pub trait FromCelFields: Sized {
    fn from_cel_fields(fields: &MessageFields) -> Result<Self, FieldError>;
}

/// The evaluated fields of a message constructor, in source order.
#[derive(Debug, Clone, Default)]
pub struct MessageFields {
    fields: IndexMap<String, Value>,
}

impl MessageFields {
    pub fn new(fields: impl IntoIterator<Item = (String, Value)>) -> Self {
        MessageFields {
            fields: fields.into_iter().collect(),
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Extracts a field that must be present with the kind of `T`.
    pub fn require<T: FromValue>(&self, field: &str) -> Result<T, FieldError> {
        self.optional(field)?.ok_or_else(|| FieldError::Missing {
            field: field.to_string(),
        })
    }

    /// Extracts a field that may be absent. An explicit `null` counts as
    /// absent.
    pub fn optional<T: FromValue>(&self, field: &str) -> Result<Option<T>, FieldError> {
        match self.fields.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => T::from_value(value).map(Some).ok_or_else(|| FieldError::Mistyped {
                field: field.to_string(),
                expected: T::KIND,
                found: value.kind(),
            }),
        }
    }
}

pub type Constructor = Arc<dyn Fn(&MessageFields) -> Result<Value, FieldError> + Send + Sync>;

/// A constructible message type registered under a dotted type path.
#[derive(Clone)]
pub struct MessageType {
    type_path: String,
    construct: Constructor,
}

impl MessageType {
    pub fn new<F>(type_path: impl Into<String>, construct: F) -> Self
    where
        F: Fn(&MessageFields) -> Result<Value, FieldError> + Send + Sync + 'static,
    {
        MessageType {
            type_path: type_path.into(),
            construct: Arc::new(construct),
        }
    }

    /// Registers `T` under `type_path`. The host instance is kept as the
    /// message payload so callers can downcast the result back to `T`.
    pub fn of<T>(type_path: impl Into<String>) -> Self
    where
        T: FromCelFields + ToCelValue + Any + Send + Sync,
    {
        MessageType::new(type_path, |fields| {
            let host = T::from_cel_fields(fields)?;
            Ok(match host.to_cel_value() {
                Value::Message(message) => Value::Message(message.with_payload(host)),
                other => other,
            })
        })
    }

    pub fn type_path(&self) -> &str {
        &self.type_path
    }

    pub fn construct(&self, fields: &MessageFields) -> Result<Value, FieldError> {
        (self.construct)(fields)
    }
}

impl fmt::Debug for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageType")
            .field("type_path", &self.type_path)
            .finish_non_exhaustive()
    }
}

/// Resolves host values of type `T` through their [`ToCelValue`] impl.
pub struct MessageResolver<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> MessageResolver<T> {
    pub fn new() -> Self {
        MessageResolver {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for MessageResolver<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ToCelValue + Any> ValueResolver for MessageResolver<T> {
    fn resolve(&self, raw: &dyn Any) -> Option<Value> {
        raw.downcast_ref::<T>().map(ToCelValue::to_cel_value)
    }
}
