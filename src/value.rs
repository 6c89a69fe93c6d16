use std::any::Any;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use indexmap::IndexMap;

use crate::ast::LiteralValue;

/// Map storage: insertion ordered, keyed by the four permitted key kinds.
pub type ValueMap = IndexMap<MapKey, Value>;

/// A CEL runtime value.
///
/// The set of variants is closed. Operators and functions are dispatched on
/// [`ValueKind`], never on the payload, so every variant's semantics lives in
/// the handlers registered for its kind.
///
/// # Equality and ordering
///
/// [`Value::is_equal`] and [`Value::is_less_than`] implement CEL semantics and
/// are partial: they return `None` when the pair of kinds cannot be compared.
/// The `PartialEq` impl is plain structural equality, used by tests and by the
/// optimizer's change detection.
///
/// # Examples
///
/// ```
/// use cel_lang::Value;
///
/// let one = Value::Int(1);
/// assert_eq!(one.is_equal(&Value::Float(1.0)), Some(true));
/// assert_eq!(one.is_less_than(&Value::Float(2.0)), None);
/// ```
#[derive(Debug, Clone)]
pub enum Value {
    Bool(bool),
    Bytes(Arc<[u8]>),
    Float(f64),
    Int(i64),
    UInt(u64),
    String(Arc<str>),
    Null,
    Timestamp(DateTime<Utc>),
    Duration(TimeDelta),
    List(Arc<Vec<Value>>),
    Map(Arc<ValueMap>),
    Message(MessageValue),
}

/// Runtime type tag of a [`Value`]; the key used by every dispatch table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueKind {
    Bool,
    Bytes,
    Float,
    Int,
    UInt,
    String,
    Null,
    Timestamp,
    Duration,
    List,
    Map,
    Message,
}

impl ValueKind {
    pub const ALL: [ValueKind; 12] = [
        ValueKind::Bool,
        ValueKind::Bytes,
        ValueKind::Float,
        ValueKind::Int,
        ValueKind::UInt,
        ValueKind::String,
        ValueKind::Null,
        ValueKind::Timestamp,
        ValueKind::Duration,
        ValueKind::List,
        ValueKind::Map,
        ValueKind::Message,
    ];

    pub const NUMERIC: [ValueKind; 3] = [ValueKind::Int, ValueKind::UInt, ValueKind::Float];

    pub fn is_numeric(self) -> bool {
        matches!(self, ValueKind::Int | ValueKind::UInt | ValueKind::Float)
    }

    pub fn is_container(self) -> bool {
        matches!(self, ValueKind::List | ValueKind::Map | ValueKind::Message)
    }

    /// The CEL type name.
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Bool => "bool",
            ValueKind::Bytes => "bytes",
            ValueKind::Float => "double",
            ValueKind::Int => "int",
            ValueKind::UInt => "uint",
            ValueKind::String => "string",
            ValueKind::Null => "null_type",
            ValueKind::Timestamp => "timestamp",
            ValueKind::Duration => "duration",
            ValueKind::List => "list",
            ValueKind::Map => "map",
            ValueKind::Message => "message",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A map key. CEL restricts keys to these four kinds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MapKey {
    Bool(bool),
    Int(i64),
    UInt(u64),
    String(Arc<str>),
}

impl MapKey {
    /// Converts a value into a key, or `None` for kinds that cannot be keys.
    pub fn from_value(value: &Value) -> Option<MapKey> {
        match value {
            Value::Bool(b) => Some(MapKey::Bool(*b)),
            Value::Int(n) => Some(MapKey::Int(*n)),
            Value::UInt(n) => Some(MapKey::UInt(*n)),
            Value::String(s) => Some(MapKey::String(s.clone())),
            _ => None,
        }
    }

    /// Every key a lookup with `value` should try, so `m[1u]` finds the entry
    /// stored under `1`.
    fn candidates(value: &Value) -> Vec<MapKey> {
        match value {
            Value::Int(n) => {
                let mut keys = vec![MapKey::Int(*n)];
                if let Ok(u) = u64::try_from(*n) {
                    keys.push(MapKey::UInt(u));
                }
                keys
            }
            Value::UInt(n) => {
                let mut keys = vec![MapKey::UInt(*n)];
                if let Ok(i) = i64::try_from(*n) {
                    keys.push(MapKey::Int(i));
                }
                keys
            }
            Value::Float(f) => {
                let mut keys = Vec::new();
                if let Some(i) = float_to_exact_i64(*f) {
                    keys.push(MapKey::Int(i));
                }
                if let Some(u) = float_to_exact_u64(*f) {
                    keys.push(MapKey::UInt(u));
                }
                keys
            }
            other => MapKey::from_value(other).into_iter().collect(),
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            MapKey::Bool(_) => ValueKind::Bool,
            MapKey::Int(_) => ValueKind::Int,
            MapKey::UInt(_) => ValueKind::UInt,
            MapKey::String(_) => ValueKind::String,
        }
    }
}

impl From<MapKey> for Value {
    fn from(key: MapKey) -> Self {
        match key {
            MapKey::Bool(b) => Value::Bool(b),
            MapKey::Int(n) => Value::Int(n),
            MapKey::UInt(n) => Value::UInt(n),
            MapKey::String(s) => Value::String(s),
        }
    }
}

impl From<&str> for MapKey {
    fn from(s: &str) -> Self {
        MapKey::String(Arc::from(s))
    }
}

impl From<String> for MapKey {
    fn from(s: String) -> Self {
        MapKey::String(Arc::from(s))
    }
}

impl fmt::Display for MapKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapKey::Bool(b) => write!(f, "{}", b),
            MapKey::Int(n) => write!(f, "{}", n),
            MapKey::UInt(n) => write!(f, "{}u", n),
            MapKey::String(s) => write!(f, "{:?}", s),
        }
    }
}

/// Looks up `key` in `map`, crossing the numeric tower for int/uint/double
/// keys.
pub fn map_lookup<'m>(map: &'m ValueMap, key: &Value) -> Option<&'m Value> {
    MapKey::candidates(key)
        .into_iter()
        .find_map(|candidate| map.get(&candidate))
}

/// A host message as seen by CEL: a type name, a named field projection used
/// for member access and equality, and an optional opaque payload holding the
/// original host object.
#[derive(Clone)]
pub struct MessageValue {
    type_name: Arc<str>,
    fields: Arc<IndexMap<String, Value>>,
    payload: Option<Arc<dyn Any + Send + Sync>>,
}

impl MessageValue {
    pub fn new(
        type_name: impl Into<Arc<str>>,
        fields: impl IntoIterator<Item = (String, Value)>,
    ) -> Self {
        MessageValue {
            type_name: type_name.into(),
            fields: Arc::new(fields.into_iter().collect()),
            payload: None,
        }
    }

    /// Attaches the host object this projection was built from.
    pub fn with_payload<T: Any + Send + Sync>(mut self, payload: T) -> Self {
        self.payload = Some(Arc::new(payload));
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// The host payload, if one was attached and it has type `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.payload.as_deref()?.downcast_ref::<T>()
    }
}

impl fmt::Debug for MessageValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageValue")
            .field("type_name", &self.type_name)
            .field("fields", &self.fields)
            .field("has_payload", &self.payload.is_some())
            .finish()
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bool(_) => ValueKind::Bool,
            Value::Bytes(_) => ValueKind::Bytes,
            Value::Float(_) => ValueKind::Float,
            Value::Int(_) => ValueKind::Int,
            Value::UInt(_) => ValueKind::UInt,
            Value::String(_) => ValueKind::String,
            Value::Null => ValueKind::Null,
            Value::Timestamp(_) => ValueKind::Timestamp,
            Value::Duration(_) => ValueKind::Duration,
            Value::List(_) => ValueKind::List,
            Value::Map(_) => ValueKind::Map,
            Value::Message(_) => ValueKind::Message,
        }
    }

    pub fn string(s: impl AsRef<str>) -> Self {
        Value::String(Arc::from(s.as_ref()))
    }

    pub fn bytes(b: impl AsRef<[u8]>) -> Self {
        Value::Bytes(Arc::from(b.as_ref()))
    }

    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Value::List(Arc::new(items.into_iter().collect()))
    }

    pub fn map(entries: impl IntoIterator<Item = (MapKey, Value)>) -> Self {
        Value::Map(Arc::new(entries.into_iter().collect()))
    }

    // Raw accessors

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_uint(&self) -> Option<u64> {
        match self {
            Value::UInt(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Timestamp(t) => Some(*t),
            _ => None,
        }
    }

    pub fn as_duration(&self) -> Option<TimeDelta> {
        match self {
            Value::Duration(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&ValueMap> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_message(&self) -> Option<&MessageValue> {
        match self {
            Value::Message(message) => Some(message),
            _ => None,
        }
    }

    /// CEL equality.
    ///
    /// Same-kind values compare structurally. Int, UInt and Float compare
    /// across kinds by numeric value, and `null` compares unequal to anything
    /// else. Any other cross-kind pair is unsupported and yields `None`, as
    /// does a container holding such a pair.
    pub fn is_equal(&self, other: &Value) -> Option<bool> {
        use Value::*;
        match (self, other) {
            (Bool(a), Bool(b)) => Some(a == b),
            (Bytes(a), Bytes(b)) => Some(a == b),
            (String(a), String(b)) => Some(a == b),
            (Null, Null) => Some(true),
            (Timestamp(a), Timestamp(b)) => Some(a == b),
            (Duration(a), Duration(b)) => Some(a == b),

            (Int(a), Int(b)) => Some(a == b),
            (UInt(a), UInt(b)) => Some(a == b),
            (Float(a), Float(b)) => Some(a == b),
            (Int(a), UInt(b)) | (UInt(b), Int(a)) => Some(u64::try_from(*a).is_ok_and(|a| a == *b)),
            (Int(a), Float(b)) | (Float(b), Int(a)) => Some(float_to_exact_i64(*b) == Some(*a)),
            (UInt(a), Float(b)) | (Float(b), UInt(a)) => Some(float_to_exact_u64(*b) == Some(*a)),

            (List(a), List(b)) => {
                if a.len() != b.len() {
                    return Some(false);
                }
                let mut equal = true;
                for (x, y) in a.iter().zip(b.iter()) {
                    equal &= x.is_equal(y)?;
                }
                Some(equal)
            }
            (Map(a), Map(b)) => {
                if a.len() != b.len() {
                    return Some(false);
                }
                let mut equal = true;
                for (key, x) in a.iter() {
                    match map_lookup(b, &Value::from(key.clone())) {
                        Some(y) => equal &= x.is_equal(y)?,
                        None => return Some(false),
                    }
                }
                Some(equal)
            }
            (Message(a), Message(b)) => {
                if a.type_name() != b.type_name() || a.field_count() != b.field_count() {
                    return Some(false);
                }
                let mut equal = true;
                for (name, x) in a.fields() {
                    match b.field(name) {
                        Some(y) => equal &= x.is_equal(y)?,
                        None => return Some(false),
                    }
                }
                Some(equal)
            }

            (Null, _) | (_, Null) => Some(false),
            _ => None,
        }
    }

    /// CEL ordering. Defined only between values of the same orderable kind;
    /// `None` for everything else, including int vs double.
    pub fn is_less_than(&self, other: &Value) -> Option<bool> {
        use Value::*;
        match (self, other) {
            (Bool(a), Bool(b)) => Some(a < b),
            (Int(a), Int(b)) => Some(a < b),
            (UInt(a), UInt(b)) => Some(a < b),
            (Float(a), Float(b)) => Some(a < b),
            (String(a), String(b)) => Some(a.as_bytes() < b.as_bytes()),
            (Bytes(a), Bytes(b)) => Some(a < b),
            (Timestamp(a), Timestamp(b)) => Some(a < b),
            (Duration(a), Duration(b)) => Some(a < b),
            _ => None,
        }
    }

    pub fn is_greater_than(&self, other: &Value) -> Option<bool> {
        other.is_less_than(self)
    }
}

/// `Some(i)` when `f` is integral and exactly representable as an `i64`.
pub(crate) fn float_to_exact_i64(f: f64) -> Option<i64> {
    if f.fract() == 0.0 && f >= -9_223_372_036_854_775_808.0 && f < 9_223_372_036_854_775_808.0 {
        Some(f as i64)
    } else {
        None
    }
}

/// `Some(u)` when `f` is integral and exactly representable as a `u64`.
pub(crate) fn float_to_exact_u64(f: f64) -> Option<u64> {
    if f.fract() == 0.0 && f >= 0.0 && f < 18_446_744_073_709_551_616.0 {
        Some(f as u64)
    } else {
        None
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (Bool(a), Bool(b)) => a == b,
            (Bytes(a), Bytes(b)) => a == b,
            (Float(a), Float(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (UInt(a), UInt(b)) => a == b,
            (String(a), String(b)) => a == b,
            (Null, Null) => true,
            (Timestamp(a), Timestamp(b)) => a == b,
            (Duration(a), Duration(b)) => a == b,
            (List(a), List(b)) => a == b,
            (Map(a), Map(b)) => a == b,
            (Message(a), Message(b)) => a.type_name == b.type_name && a.fields == b.fields,
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n.into())
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::UInt(n)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::UInt(n.into())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Arc::from(s))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(Arc::new(items))
    }
}

impl From<ValueMap> for Value {
    fn from(map: ValueMap) -> Self {
        Value::Map(Arc::new(map))
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(t: DateTime<Utc>) -> Self {
        Value::Timestamp(t)
    }
}

impl From<TimeDelta> for Value {
    fn from(d: TimeDelta) -> Self {
        Value::Duration(d)
    }
}

impl From<MessageValue> for Value {
    fn from(message: MessageValue) -> Self {
        Value::Message(message)
    }
}

impl From<&LiteralValue> for Value {
    fn from(literal: &LiteralValue) -> Self {
        match literal {
            LiteralValue::Bool(b) => Value::Bool(*b),
            LiteralValue::Bytes(b) => Value::bytes(b),
            LiteralValue::Float(n) => Value::Float(*n),
            LiteralValue::Int(n) => Value::Int(*n),
            LiteralValue::UInt(n) => Value::UInt(*n),
            LiteralValue::Null => Value::Null,
            LiteralValue::String(s) => Value::string(s),
        }
    }
}

impl Value {
    /// The literal spelling of this value, for the kinds that have one.
    pub fn to_literal(&self) -> Option<LiteralValue> {
        match self {
            Value::Bool(b) => Some(LiteralValue::Bool(*b)),
            Value::Bytes(b) => Some(LiteralValue::Bytes(b.to_vec())),
            Value::Float(n) => Some(LiteralValue::Float(*n)),
            Value::Int(n) => Some(LiteralValue::Int(*n)),
            Value::UInt(n) => Some(LiteralValue::UInt(*n)),
            Value::Null => Some(LiteralValue::Null),
            Value::String(s) => Some(LiteralValue::String(s.to_string())),
            _ => None,
        }
    }
}

/// Typed extraction of a host value from a [`Value`] of the matching kind.
pub trait FromValue: Sized {
    /// The kind this type is extracted from, for error messages.
    const KIND: ValueKind;

    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! impl_from_value {
    ($ty:ty, $kind:ident, $accessor:ident) => {
        impl FromValue for $ty {
            const KIND: ValueKind = ValueKind::$kind;

            fn from_value(value: &Value) -> Option<Self> {
                value.$accessor().map(Into::into)
            }
        }
    };
}

impl_from_value!(bool, Bool, as_bool);
impl_from_value!(i64, Int, as_int);
impl_from_value!(u64, UInt, as_uint);
impl_from_value!(f64, Float, as_float);
impl_from_value!(String, String, as_str);
impl_from_value!(Vec<u8>, Bytes, as_bytes);
impl_from_value!(DateTime<Utc>, Timestamp, as_timestamp);
impl_from_value!(TimeDelta, Duration, as_duration);

impl FromValue for Vec<Value> {
    const KIND: ValueKind = ValueKind::List;

    fn from_value(value: &Value) -> Option<Self> {
        value.as_list().map(<[Value]>::to_vec)
    }
}

/// Formats a duration the way CEL prints it: seconds with up to nine
/// fractional digits and an `s` suffix.
pub fn format_duration(d: TimeDelta) -> String {
    let negative = d < TimeDelta::zero();
    let abs = d.abs();
    let seconds = abs.num_seconds();
    let nanos = abs.subsec_nanos();
    let sign = if negative { "-" } else { "" };
    if nanos == 0 {
        format!("{}{}s", sign, seconds)
    } else {
        let fraction = format!("{:09}", nanos);
        format!("{}{}.{}s", sign, seconds, fraction.trim_end_matches('0'))
    }
}

pub fn format_timestamp(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Bytes(bytes) => {
                f.write_str("b\"")?;
                for byte in bytes.iter() {
                    match byte {
                        b'"' => f.write_str("\\\"")?,
                        b'\\' => f.write_str("\\\\")?,
                        0x20..=0x7e => write!(f, "{}", *byte as char)?,
                        _ => write!(f, "\\x{:02x}", byte)?,
                    }
                }
                f.write_str("\"")
            }
            Value::Float(n) => {
                if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e16 {
                    write!(f, "{:.1}", n)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::Int(n) => write!(f, "{}", n),
            Value::UInt(n) => write!(f, "{}u", n),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Null => f.write_str("null"),
            Value::Timestamp(t) => write!(f, "timestamp({:?})", format_timestamp(*t)),
            Value::Duration(d) => write!(f, "duration({:?})", format_duration(*d)),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Map(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                f.write_str("}")
            }
            Value::Message(message) => {
                write!(f, "{}{{", message.type_name())?;
                for (i, (name, value)) in message.fields().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", name, value)?;
                }
                f.write_str("}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_tower_equality() {
        assert_eq!(Value::Int(1).is_equal(&Value::Float(1.0)), Some(true));
        assert_eq!(Value::UInt(1).is_equal(&Value::Int(1)), Some(true));
        assert_eq!(Value::Int(-1).is_equal(&Value::UInt(u64::MAX)), Some(false));
        assert_eq!(Value::Float(1.5).is_equal(&Value::Int(1)), Some(false));
        assert_eq!(Value::Float(f64::NAN).is_equal(&Value::Int(0)), Some(false));
    }

    #[test]
    fn test_cross_kind_equality_is_unsupported() {
        assert_eq!(Value::Int(1).is_equal(&Value::string("1")), None);
        assert_eq!(Value::Bool(true).is_equal(&Value::bytes(b"x")), None);
        assert_eq!(Value::Null.is_equal(&Value::Int(0)), Some(false));
    }

    #[test]
    fn test_list_equality() {
        let a = Value::list([Value::Int(1), Value::string("x")]);
        let b = Value::list([Value::UInt(1), Value::string("x")]);
        assert_eq!(a.is_equal(&b), Some(true));
        let c = Value::list([Value::Int(1)]);
        assert_eq!(a.is_equal(&c), Some(false));
        let d = Value::list([Value::string("1"), Value::string("x")]);
        assert_eq!(a.is_equal(&d), None);
    }

    #[test]
    fn test_map_equality_ignores_order() {
        let a = Value::map([(MapKey::from("a"), Value::Int(1)), (MapKey::from("b"), Value::Int(2))]);
        let b = Value::map([(MapKey::from("b"), Value::Int(2)), (MapKey::from("a"), Value::Int(1))]);
        assert_eq!(a.is_equal(&b), Some(true));
    }

    #[test]
    fn test_ordering_is_same_kind_only() {
        assert_eq!(Value::Int(1).is_less_than(&Value::Int(2)), Some(true));
        assert_eq!(Value::string("a").is_less_than(&Value::string("b")), Some(true));
        assert_eq!(Value::bytes(b"b").is_greater_than(&Value::bytes(b"a")), Some(true));
        assert_eq!(Value::Int(1).is_less_than(&Value::Float(1.0)), None);
        assert_eq!(Value::Bool(false).is_less_than(&Value::Bool(true)), Some(true));
    }

    #[test]
    fn test_map_lookup_crosses_numeric_kinds() {
        let map: ValueMap = [(MapKey::Int(1), Value::string("one"))].into_iter().collect();
        assert_eq!(map_lookup(&map, &Value::UInt(1)), Some(&Value::string("one")));
        assert_eq!(map_lookup(&map, &Value::Float(1.0)), Some(&Value::string("one")));
        assert_eq!(map_lookup(&map, &Value::Float(1.5)), None);
        assert_eq!(map_lookup(&map, &Value::Null), None);
    }

    #[test]
    fn test_message_payload_downcast() {
        let message = MessageValue::new("acme.Point", [("x".to_string(), Value::Int(3))])
            .with_payload((3_i64, 4_i64));
        assert_eq!(message.field("x"), Some(&Value::Int(3)));
        assert_eq!(message.downcast_ref::<(i64, i64)>(), Some(&(3, 4)));
        assert!(message.downcast_ref::<String>().is_none());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(TimeDelta::seconds(90)), "90s");
        assert_eq!(format_duration(TimeDelta::milliseconds(1500)), "1.5s");
        assert_eq!(format_duration(TimeDelta::milliseconds(-250)), "-0.25s");
    }

    #[test]
    fn test_display() {
        let value = Value::list([Value::Int(1), Value::UInt(2), Value::Float(3.0), Value::string("x")]);
        assert_eq!(value.to_string(), r#"[1, 2u, 3.0, "x"]"#);
    }
}
