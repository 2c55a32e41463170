//! Dynamic runtime value domain.
//!
//! Richer than JSON: alongside the usual scalars/sequences/mappings there is
//! an explicit `Undefined` ("absent") sentinel, a byte sequence, callables,
//! and a resolved-promise wrapper. Schema nodes are themselves `Value::Object`
//! trees, so one representation covers both sides of every engine call.
//!
//! The engine never mutates a `Value` in place; coercion and synthesis always
//! build fresh trees.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

/// Key-ordered mapping, insertion order preserved (parity with
/// `serde_json`'s `preserve_order` objects).
pub type Map = IndexMap<String, Value>;

/// A callable value. Equality is pointer identity: two callables are the same
/// value only if they are literally the same closure.
#[derive(Clone)]
pub struct NativeFn(pub Arc<dyn Fn(&[Value]) -> Value + Send + Sync>);

impl NativeFn {
    pub fn new(f: impl Fn(&[Value]) -> Value + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn call(&self, args: &[Value]) -> Value {
        (self.0)(args)
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<native fn>")
    }
}

impl PartialEq for NativeFn {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    /// The "absent" sentinel. An object entry holding `Undefined` counts as
    /// not present for presence tests.
    Undefined,
    Bool(bool),
    Number(f64),
    String(String),
    Bytes(Vec<u8>),
    Array(Vec<Value>),
    Object(Map),
    Function(NativeFn),
    /// A callable template; instances carry `template` as own properties.
    Constructor { template: Box<Value> },
    /// Resolved-immediately awaitable wrapper.
    Promise(Box<Value>),
}

impl Value {
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Property lookup with absence semantics: a missing key and a key bound
    /// to `Undefined` are the same thing.
    pub fn prop(&self, key: &str) -> Option<&Value> {
        self.as_object()
            .and_then(|map| map.get(key))
            .filter(|v| !v.is_undefined())
    }

    /// Invoke a callable value. `None` for non-callables.
    pub fn invoke(&self, args: &[Value]) -> Option<Value> {
        match self {
            Value::Function(f) => Some(f.call(args)),
            _ => None,
        }
    }
}

// ------------------------------ JSON bridge ------------------------------- //

impl Value {
    /// Total embedding of JSON into the value domain. Object key order is
    /// preserved.
    pub fn from_json(v: &serde_json::Value) -> Value {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(xs) => Value::Array(xs.iter().map(Value::from_json).collect()),
            serde_json::Value::Object(m) => Value::Object(
                m.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Lossy projection back to JSON for output:
    /// - `Undefined` → null (entries holding it are dropped from objects)
    /// - `Bytes` → array of numbers
    /// - `Function`/`Constructor` → null (not serializable)
    /// - `Promise` → its resolved inner value
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null | Value::Undefined => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => json_num_pref_i64(*n),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Bytes(bytes) => {
                serde_json::Value::Array(bytes.iter().map(|b| (*b).into()).collect())
            }
            Value::Array(xs) => serde_json::Value::Array(xs.iter().map(Value::to_json).collect()),
            Value::Object(map) => serde_json::Value::Object(
                map.iter()
                    .filter(|(_, v)| !v.is_undefined())
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Value::Function(_) | Value::Constructor { .. } => serde_json::Value::Null,
            Value::Promise(inner) => inner.to_json(),
        }
    }
}

/// Prefer emitting integers when exact.
fn json_num_pref_i64(n: f64) -> serde_json::Value {
    if n.is_finite() && n.fract() == 0.0 && n >= i64::MIN as f64 && n <= i64::MAX as f64 {
        serde_json::Value::from(n as i64)
    } else {
        serde_json::Value::from(n)
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_round_trip_preserves_structure_and_order() {
        let source = json!({"b": 1, "a": [true, null, "x"], "c": {"z": 0.5}});
        let value = Value::from_json(&source);
        assert_eq!(value.to_json(), source);
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["b", "a", "c"]);
    }

    #[test]
    fn prop_treats_stored_undefined_as_absent() {
        let mut map = Map::new();
        map.insert("x".into(), Value::Undefined);
        map.insert("y".into(), Value::Null);
        let obj = Value::Object(map);
        assert!(obj.prop("x").is_none());
        assert_eq!(obj.prop("y"), Some(&Value::Null));
        assert!(obj.prop("missing").is_none());
    }

    #[test]
    fn undefined_entries_drop_from_json_output() {
        let mut map = Map::new();
        map.insert("keep".into(), Value::Number(1.0));
        map.insert("drop".into(), Value::Undefined);
        assert_eq!(Value::Object(map).to_json(), json!({"keep": 1}));
    }

    #[test]
    fn integral_numbers_emit_as_integers() {
        assert_eq!(Value::Number(4.0).to_json(), json!(4));
        assert_eq!(Value::Number(4.5).to_json(), json!(4.5));
    }

    #[test]
    fn native_fn_equality_is_identity() {
        let f = NativeFn::new(|_| Value::Null);
        let g = NativeFn::new(|_| Value::Null);
        assert_eq!(f.clone(), f);
        assert_ne!(f, g);
    }

    #[test]
    fn invoke_calls_through() {
        let f = Value::Function(NativeFn::new(|_| Value::String("ok".into())));
        assert_eq!(f.invoke(&[]), Some(Value::String("ok".into())));
        assert_eq!(Value::Null.invoke(&[]), None);
    }
}
