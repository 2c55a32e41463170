//! Structural schema classification.
//!
//! A schema node is an ordinary `Value::Object` carrying a `"$kind"` tag plus
//! per-variant structural fields; `classify` decides which of the known
//! variants a candidate is, recursing into child descriptors for composite
//! variants. Everything else in the engine dispatches through this layer.
//!
//! Classification is total and fails closed: any structural violation
//! (unknown tag, malformed constraint field, broken invariant, invalid child)
//! yields `None` rather than a near-miss variant. Tags are unique, so testing
//! them in the fixed declaration order below can never match two variants.

use crate::pattern;
use crate::value::Value;

/// The known schema variants, in fixed classification order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    Any,
    Array,
    Boolean,
    Constructor,
    Function,
    Integer,
    Literal,
    Null,
    Number,
    Object,
    Promise,
    Record,
    SelfRef,
    Ref,
    String,
    Tuple,
    Undefined,
    Union,
    ByteArray,
    Unknown,
    Void,
}

/// Classify a candidate node, or `None` when it is not a schema. Never panics.
pub fn classify(candidate: &Value) -> Option<SchemaKind> {
    let kind = candidate.prop("$kind")?.as_str()?;
    if !optional_string(candidate, "$id") {
        return None;
    }
    let (kind, ok) = match kind {
        "Any" => (SchemaKind::Any, true),
        "Array" => (SchemaKind::Array, is_array_schema(candidate)),
        "Boolean" => (SchemaKind::Boolean, true),
        "Constructor" => (SchemaKind::Constructor, is_callable_schema(candidate)),
        "Function" => (SchemaKind::Function, is_callable_schema(candidate)),
        "Integer" => (SchemaKind::Integer, is_numeric_schema(candidate)),
        "Literal" => (SchemaKind::Literal, is_literal_schema(candidate)),
        "Null" => (SchemaKind::Null, true),
        "Number" => (SchemaKind::Number, is_numeric_schema(candidate)),
        "Object" => (SchemaKind::Object, is_object_schema(candidate)),
        "Promise" => (
            SchemaKind::Promise,
            candidate.prop("item").is_some_and(is_schema),
        ),
        "Record" => (SchemaKind::Record, is_record_schema(candidate)),
        "Self" => (SchemaKind::SelfRef, has_ref_target(candidate)),
        "Ref" => (SchemaKind::Ref, has_ref_target(candidate)),
        "String" => (SchemaKind::String, is_string_schema(candidate)),
        "Tuple" => (SchemaKind::Tuple, is_tuple_schema(candidate)),
        "Undefined" => (SchemaKind::Undefined, true),
        "Union" => (SchemaKind::Union, is_union_schema(candidate)),
        "ByteArray" => (
            SchemaKind::ByteArray,
            optional_number(candidate, "minByteLength") && optional_number(candidate, "maxByteLength"),
        ),
        "Unknown" => (SchemaKind::Unknown, true),
        "Void" => (SchemaKind::Void, true),
        _ => return None,
    };
    if ok { Some(kind) } else { None }
}

/// True iff the candidate matches exactly one known variant.
pub fn is_schema(candidate: &Value) -> bool {
    classify(candidate).is_some()
}

// --------------------------- Field accessors ------------------------------ //
// Shared by the check/create/cast visitors. Absence and `Undefined` are the
// same thing (see `Value::prop`).

pub fn schema_id(schema: &Value) -> Option<&str> {
    schema.prop("$id").and_then(Value::as_str)
}

pub fn ref_target(schema: &Value) -> Option<&str> {
    schema.prop("$ref").and_then(Value::as_str)
}

pub fn default_of(schema: &Value) -> Option<&Value> {
    schema.prop("default")
}

pub fn num_field(schema: &Value, key: &str) -> Option<f64> {
    schema.prop(key).and_then(Value::as_f64)
}

pub fn bool_field(schema: &Value, key: &str) -> Option<bool> {
    schema.prop(key).and_then(Value::as_bool)
}

pub fn str_field<'a>(schema: &'a Value, key: &str) -> Option<&'a str> {
    schema.prop(key).and_then(Value::as_str)
}

/// Declared `required` names, empty when the field is absent.
pub fn required_names(schema: &Value) -> Vec<&str> {
    schema
        .prop("required")
        .and_then(Value::as_array)
        .map(|xs| xs.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

/// The single pattern-key/value-schema pair of a Record node.
pub fn record_entry(schema: &Value) -> Option<(&str, &Value)> {
    let props = schema.prop("patternProperties")?.as_object()?;
    let (key, value) = props.iter().next()?;
    Some((key.as_str(), value))
}

// ------------------------- Structural predicates -------------------------- //

fn optional_number(schema: &Value, key: &str) -> bool {
    match schema.prop(key) {
        None => true,
        Some(v) => v.as_f64().is_some(),
    }
}

fn optional_bool(schema: &Value, key: &str) -> bool {
    match schema.prop(key) {
        None => true,
        Some(v) => v.as_bool().is_some(),
    }
}

fn optional_string(schema: &Value, key: &str) -> bool {
    match schema.prop(key) {
        None => true,
        Some(v) => v.as_str().is_some(),
    }
}

/// Property keys must not contain control characters historically usable for
/// terminal escape injection (U+0007–U+000D, U+001B, U+007F).
fn is_valid_property_key(key: &str) -> bool {
    !key.chars()
        .any(|c| matches!(c, '\u{07}'..='\u{0d}' | '\u{1b}' | '\u{7f}'))
}

fn has_ref_target(schema: &Value) -> bool {
    ref_target(schema).is_some()
}

fn is_numeric_schema(schema: &Value) -> bool {
    ["multipleOf", "minimum", "maximum", "exclusiveMinimum", "exclusiveMaximum"]
        .iter()
        .all(|key| optional_number(schema, key))
}

fn is_literal_schema(schema: &Value) -> bool {
    matches!(
        schema.prop("const"),
        Some(Value::String(_) | Value::Number(_) | Value::Bool(_))
    )
}

fn is_string_schema(schema: &Value) -> bool {
    let pattern_ok = match schema.prop("pattern") {
        None => true,
        Some(v) => v.as_str().is_some_and(pattern::is_valid),
    };
    optional_number(schema, "minLength")
        && optional_number(schema, "maxLength")
        && pattern_ok
        && optional_string(schema, "format")
}

fn is_array_schema(schema: &Value) -> bool {
    schema.prop("items").is_some_and(is_schema)
        && optional_number(schema, "minItems")
        && optional_number(schema, "maxItems")
        && optional_bool(schema, "uniqueItems")
}

fn is_tuple_schema(schema: &Value) -> bool {
    // Fixed arity: minItems and maxItems are mandatory and equal.
    let (Some(min), Some(max)) = (num_field(schema, "minItems"), num_field(schema, "maxItems"))
    else {
        return false;
    };
    if min != max {
        return false;
    }
    match schema.prop("items") {
        None => min == 0.0,
        Some(Value::Array(items)) => {
            items.len() as f64 == min && items.iter().all(is_schema)
        }
        Some(_) => false,
    }
}

fn is_object_schema(schema: &Value) -> bool {
    let Some(properties) = schema.prop("properties").and_then(Value::as_object) else {
        return false;
    };
    if !properties
        .iter()
        .all(|(key, child)| is_valid_property_key(key) && is_schema(child))
    {
        return false;
    }
    // required ⊆ keys(properties), every entry a string
    let required_ok = match schema.prop("required") {
        None => true,
        Some(Value::Array(names)) => names.iter().all(|name| {
            name.as_str()
                .is_some_and(|name| properties.contains_key(name))
        }),
        Some(_) => false,
    };
    required_ok
        && optional_bool(schema, "additionalProperties")
        && optional_number(schema, "minProperties")
        && optional_number(schema, "maxProperties")
}

fn is_record_schema(schema: &Value) -> bool {
    if schema.prop("additionalProperties") != Some(&Value::Bool(false)) {
        return false;
    }
    let Some(props) = schema.prop("patternProperties").and_then(Value::as_object) else {
        return false;
    };
    match props.iter().next() {
        Some((key, child)) if props.len() == 1 => pattern::is_valid(key) && is_schema(child),
        _ => false,
    }
}

fn is_union_schema(schema: &Value) -> bool {
    match schema.prop("anyOf") {
        Some(Value::Array(branches)) => branches.iter().all(is_schema),
        _ => false,
    }
}

fn is_callable_schema(schema: &Value) -> bool {
    let params_ok = match schema.prop("parameters") {
        Some(Value::Array(params)) => params.iter().all(is_schema),
        _ => false,
    };
    params_ok && schema.prop("returns").is_some_and(is_schema)
}

// ------------------------------- Tests ------------------------------------ //
