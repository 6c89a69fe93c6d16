//! Variable bindings for one evaluation.

use std::any::{Any, type_name};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::error::EnvironmentError;
use crate::extension::ValueResolver;
use crate::output::from_json;
use crate::value::{MapKey, Value};

/// Named bindings plus the resolver chain used to convert host values.
///
/// An environment is confined to a single evaluation. [`Environment::fork`]
/// makes an independent copy for a nested scope: the child can shadow and
/// add bindings without affecting its parent.
///
/// # Examples
///
/// ```
/// use cel_lang::{Environment, Value};
///
/// let mut env = Environment::new();
/// env.add("x", 5);
/// env.add_raw("name", &"ada".to_string()).unwrap();
///
/// let mut inner = env.fork();
/// inner.add("x", 6);
/// assert_eq!(env.get("x"), Some(&Value::Int(5)));
/// assert_eq!(inner.get("name"), Some(&Value::string("ada")));
/// ```
#[derive(Clone, Default)]
pub struct Environment {
    bindings: HashMap<String, Value>,
    /// Registration order; searched from the back.
    resolvers: Arc<Vec<Arc<dyn ValueResolver>>>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty environment whose chain holds `resolvers`, with the last one
    /// taking priority.
    pub fn with_resolvers(resolvers: Vec<Arc<dyn ValueResolver>>) -> Self {
        Environment {
            bindings: HashMap::new(),
            resolvers: Arc::new(resolvers),
        }
    }

    /// Binds `name`, replacing any earlier binding.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.bindings.insert(name.into(), value.into());
        self
    }

    /// Converts a host value through the resolver chain and binds it.
    pub fn add_raw<T: Any>(
        &mut self,
        name: impl Into<String>,
        raw: &T,
    ) -> Result<&mut Self, EnvironmentError> {
        let name = name.into();
        match self.resolve(raw) {
            Some(value) => {
                self.bindings.insert(name, value);
                Ok(self)
            }
            None => Err(EnvironmentError::IncompatibleValueType {
                name,
                type_name: type_name::<T>().to_string(),
            }),
        }
    }

    /// Adds a resolver ahead of every resolver already in the chain.
    pub fn add_resolver(&mut self, resolver: Arc<dyn ValueResolver>) -> &mut Self {
        Arc::make_mut(&mut self.resolvers).push(resolver);
        self
    }

    /// Converts a host value without binding it.
    pub fn resolve<T: Any>(&self, raw: &T) -> Option<Value> {
        let raw: &dyn Any = raw;
        self.resolvers
            .iter()
            .rev()
            .find_map(|resolver| resolver.resolve(raw))
            .or_else(|| PrimitiveResolver.resolve(raw))
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// A child scope with a copy of the bindings and the same resolvers.
    pub fn fork(&self) -> Environment {
        self.clone()
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("bindings", &self.bindings)
            .field("resolvers", &self.resolvers.len())
            .finish()
    }
}

/// The fallback resolver, always tried last.
///
/// Handles Rust primitives, [`Value`] itself, byte/string/number vectors,
/// string-keyed maps and `serde_json` values.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrimitiveResolver;

macro_rules! try_downcast {
    ($raw:expr, $( $ty:ty => $convert:expr ),+ $(,)?) => {
        $(
            if let Some(v) = $raw.downcast_ref::<$ty>() {
                let convert: fn(&$ty) -> Value = $convert;
                return Some(convert(v));
            }
        )+
    };
}

fn string_map<'a, V: 'a>(
    entries: impl Iterator<Item = (&'a String, &'a V)>,
    convert: impl Fn(&V) -> Value,
) -> Value {
    Value::map(entries.map(|(k, v)| (MapKey::from(k.as_str()), convert(v))))
}

impl ValueResolver for PrimitiveResolver {
    fn resolve(&self, raw: &dyn Any) -> Option<Value> {
        try_downcast!(raw,
            Value => |v| v.clone(),
            bool => |v| Value::Bool(*v),
            i8 => |v| Value::Int((*v).into()),
            i16 => |v| Value::Int((*v).into()),
            i32 => |v| Value::Int((*v).into()),
            i64 => |v| Value::Int(*v),
            isize => |v| Value::Int(*v as i64),
            u8 => |v| Value::UInt((*v).into()),
            u16 => |v| Value::UInt((*v).into()),
            u32 => |v| Value::UInt((*v).into()),
            u64 => |v| Value::UInt(*v),
            usize => |v| Value::UInt(*v as u64),
            f32 => |v| Value::Float((*v).into()),
            f64 => |v| Value::Float(*v),
            String => |v| Value::string(v),
            &'static str => |v| Value::string(v),
            () => |_| Value::Null,
            Vec<u8> => |v| Value::bytes(v),
            Vec<Value> => |v| Value::list(v.iter().cloned()),
            Vec<String> => |v| Value::list(v.iter().map(|s| Value::string(s))),
            Vec<i64> => |v| Value::list(v.iter().map(|n| Value::Int(*n))),
            HashMap<String, Value> => |m| string_map(m.iter(), Value::clone),
            HashMap<String, String> => |m| string_map(m.iter(), |s| Value::string(s)),
            BTreeMap<String, Value> => |m| string_map(m.iter(), Value::clone),
            BTreeMap<String, String> => |m| string_map(m.iter(), |s| Value::string(s)),
            serde_json::Value => from_json,
            serde_json::Map<String, serde_json::Value> => |m| string_map(m.iter(), from_json),
        );

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Celsius(f64);

    struct CelsiusResolver;

    impl ValueResolver for CelsiusResolver {
        fn resolve(&self, raw: &dyn Any) -> Option<Value> {
            raw.downcast_ref::<Celsius>().map(|c| Value::Float(c.0))
        }
    }

    struct ShadowingResolver;

    impl ValueResolver for ShadowingResolver {
        fn resolve(&self, raw: &dyn Any) -> Option<Value> {
            raw.downcast_ref::<Celsius>().map(|_| Value::string("shadowed"))
        }
    }

    #[test]
    fn test_primitives_resolve() {
        let mut env = Environment::new();
        env.add_raw("a", &7_u8).unwrap();
        env.add_raw("b", &-3_i32).unwrap();
        env.add_raw("c", &"hi").unwrap();
        env.add_raw("d", &()).unwrap();
        env.add_raw("e", &vec![1_i64, 2]).unwrap();
        assert_eq!(env.get("a"), Some(&Value::UInt(7)));
        assert_eq!(env.get("b"), Some(&Value::Int(-3)));
        assert_eq!(env.get("c"), Some(&Value::string("hi")));
        assert_eq!(env.get("d"), Some(&Value::Null));
        assert_eq!(env.get("e"), Some(&Value::list([Value::Int(1), Value::Int(2)])));
    }

    #[test]
    fn test_unknown_host_type_is_rejected() {
        let mut env = Environment::new();
        let err = env.add_raw("t", &Celsius(20.0)).unwrap_err();
        match err {
            EnvironmentError::IncompatibleValueType { name, type_name } => {
                assert_eq!(name, "t");
                assert!(type_name.ends_with("Celsius"));
            }
        }
    }

    #[test]
    fn test_most_recent_resolver_wins() {
        let mut env = Environment::new();
        env.add_resolver(Arc::new(CelsiusResolver));
        env.add_raw("t", &Celsius(20.5)).unwrap();
        assert_eq!(env.get("t"), Some(&Value::Float(20.5)));

        env.add_resolver(Arc::new(ShadowingResolver));
        env.add_raw("t", &Celsius(20.5)).unwrap();
        assert_eq!(env.get("t"), Some(&Value::string("shadowed")));
    }

    #[test]
    fn test_fork_does_not_leak_upward() {
        let mut parent = Environment::new();
        parent.add("x", 1);
        let mut child = parent.fork();
        child.add("x", 2).add("y", 3);
        child.add_resolver(Arc::new(CelsiusResolver));

        assert_eq!(parent.get("x"), Some(&Value::Int(1)));
        assert!(!parent.contains("y"));
        assert!(parent.resolve(&Celsius(1.0)).is_none());
        assert_eq!(child.get("x"), Some(&Value::Int(2)));
    }

    #[test]
    fn test_json_object_resolves_to_map() {
        let json: serde_json::Value = serde_json::from_str(r#"{"n": 1, "tags": ["a"]}"#).unwrap();
        let value = Environment::new().resolve(&json).unwrap();
        let map = value.as_map().unwrap();
        assert_eq!(map.get(&MapKey::from("n")), Some(&Value::Int(1)));
        assert_eq!(
            map.get(&MapKey::from("tags")),
            Some(&Value::list([Value::string("a")]))
        );
    }
}
