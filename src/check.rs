//! Structural validation of a value against a schema.
//!
//! `check` answers "does this value conform" as a plain boolean; hard errors
//! (`InvalidSchema`, `UnresolvedReference`) mean the schema itself could not
//! be processed and surface through the `Result` instead. All declared
//! constraints on a node are conjunctive.

use crate::errors::SchemaError;
use crate::pattern;
use crate::schema::{self, SchemaKind};
use crate::scope::Scope;
use crate::value::Value;

/// Check `value` against `schema` under the given reference scope. A
/// top-level `$id` extends the scope before traversal begins.
pub fn check(schema: &Value, references: &[&Value], value: &Value) -> Result<bool, SchemaError> {
    visit(schema, &Scope::from_refs(references), value)
}

pub(crate) fn visit<'a>(
    node: &'a Value,
    scope: &Scope<'a>,
    value: &Value,
) -> Result<bool, SchemaError> {
    let scope = scope.entered(node);
    let Some(kind) = schema::classify(node) else {
        return Err(SchemaError::InvalidSchema);
    };
    match kind {
        SchemaKind::Any | SchemaKind::Unknown => Ok(true),
        SchemaKind::Null | SchemaKind::Void => Ok(*value == Value::Null),
        SchemaKind::Undefined => Ok(value.is_undefined()),
        SchemaKind::Boolean => Ok(matches!(value, Value::Bool(_))),
        SchemaKind::Number => Ok(check_number(node, value)),
        SchemaKind::Integer => Ok(check_integer(node, value)),
        SchemaKind::String => check_string(node, value),
        SchemaKind::ByteArray => Ok(check_bytes(node, value)),
        SchemaKind::Literal => Ok(node.prop("const") == Some(value)),
        SchemaKind::Array => check_array(node, &scope, value),
        SchemaKind::Tuple => check_tuple(node, &scope, value),
        SchemaKind::Object => check_object(node, &scope, value),
        SchemaKind::Record => check_record(node, &scope, value),
        SchemaKind::Union => check_union(node, &scope, value),
        SchemaKind::Function => Ok(matches!(value, Value::Function(_))),
        SchemaKind::Constructor => check_constructor(node, &scope, value),
        SchemaKind::Promise => Ok(matches!(value, Value::Promise(_))),
        SchemaKind::Ref | SchemaKind::SelfRef => {
            let target = resolve(node, &scope)?;
            visit(target, &scope, value)
        }
    }
}

pub(crate) fn resolve<'a>(node: &Value, scope: &Scope<'a>) -> Result<&'a Value, SchemaError> {
    let name = schema::ref_target(node).unwrap_or_default();
    scope
        .resolve(name)
        .ok_or_else(|| SchemaError::UnresolvedReference(name.to_string()))
}

// ------------------------------ Primitives -------------------------------- //

fn magnitude_constraints(node: &Value, n: f64) -> bool {
    if let Some(step) = schema::num_field(node, "multipleOf") {
        if n % step != 0.0 {
            return false;
        }
    }
    if let Some(min) = schema::num_field(node, "exclusiveMinimum") {
        if !(n > min) {
            return false;
        }
    }
    if let Some(max) = schema::num_field(node, "exclusiveMaximum") {
        if !(n < max) {
            return false;
        }
    }
    if let Some(min) = schema::num_field(node, "minimum") {
        if !(n >= min) {
            return false;
        }
    }
    if let Some(max) = schema::num_field(node, "maximum") {
        if !(n <= max) {
            return false;
        }
    }
    true
}

fn check_number(node: &Value, value: &Value) -> bool {
    match value {
        Value::Number(n) => magnitude_constraints(node, *n),
        _ => false,
    }
}

fn check_integer(node: &Value, value: &Value) -> bool {
    match value {
        Value::Number(n) => n.is_finite() && n.fract() == 0.0 && magnitude_constraints(node, *n),
        _ => false,
    }
}

fn check_string(node: &Value, value: &Value) -> Result<bool, SchemaError> {
    let Value::String(s) = value else {
        return Ok(false);
    };
    let len = s.chars().count() as f64;
    if let Some(min) = schema::num_field(node, "minLength") {
        if !(len >= min) {
            return Ok(false);
        }
    }
    if let Some(max) = schema::num_field(node, "maxLength") {
        if !(len <= max) {
            return Ok(false);
        }
    }
    if let Some(rx) = schema::str_field(node, "pattern") {
        if !pattern::compile(rx)?.is_match(s) {
            return Ok(false);
        }
    }
    Ok(true)
}

fn check_bytes(node: &Value, value: &Value) -> bool {
    let Value::Bytes(bytes) = value else {
        return false;
    };
    let len = bytes.len() as f64;
    if let Some(min) = schema::num_field(node, "minByteLength") {
        if !(len >= min) {
            return false;
        }
    }
    if let Some(max) = schema::num_field(node, "maxByteLength") {
        if !(len <= max) {
            return false;
        }
    }
    true
}

// ------------------------------ Composites -------------------------------- //

/// Set-cardinality-equals-length, via pairwise comparison (values are not
/// hashable).
pub(crate) fn pairwise_distinct(items: &[Value]) -> bool {
    for (i, a) in items.iter().enumerate() {
        if items[i + 1..].iter().any(|b| a == b) {
            return false;
        }
    }
    true
}

fn check_array<'a>(node: &'a Value, scope: &Scope<'a>, value: &Value) -> Result<bool, SchemaError> {
    let Value::Array(items) = value else {
        return Ok(false);
    };
    let len = items.len() as f64;
    if let Some(min) = schema::num_field(node, "minItems") {
        if !(len >= min) {
            return Ok(false);
        }
    }
    if let Some(max) = schema::num_field(node, "maxItems") {
        if !(len <= max) {
            return Ok(false);
        }
    }
    if schema::bool_field(node, "uniqueItems") == Some(true) && !pairwise_distinct(items) {
        return Ok(false);
    }
    let item_schema = node.prop("items").ok_or(SchemaError::InvalidSchema)?;
    for item in items {
        if !visit(item_schema, scope, item)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn check_tuple<'a>(node: &'a Value, scope: &Scope<'a>, value: &Value) -> Result<bool, SchemaError> {
    let Value::Array(elements) = value else {
        return Ok(false);
    };
    let Some(schemas) = node.prop("items").and_then(Value::as_array) else {
        // zero-arity tuple accepts only an empty sequence
        return Ok(elements.is_empty());
    };
    if elements.len() != schemas.len() {
        return Ok(false);
    }
    for (element_schema, element) in schemas.iter().zip(elements) {
        if !visit(element_schema, scope, element)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn check_object<'a>(node: &'a Value, scope: &Scope<'a>, value: &Value) -> Result<bool, SchemaError> {
    let Value::Object(map) = value else {
        return Ok(false);
    };
    let key_count = map.len() as f64;
    if let Some(min) = schema::num_field(node, "minProperties") {
        if !(key_count >= min) {
            return Ok(false);
        }
    }
    if let Some(max) = schema::num_field(node, "maxProperties") {
        if !(key_count <= max) {
            return Ok(false);
        }
    }
    let properties = node
        .prop("properties")
        .and_then(Value::as_object)
        .ok_or(SchemaError::InvalidSchema)?;
    let required = schema::required_names(node);
    if schema::bool_field(node, "additionalProperties") == Some(false) {
        // Fast path: when every declared property is required, a key-count
        // comparison suffices; the per-property checks below are exhaustive.
        if required.len() == properties.len() {
            if map.len() != properties.len() {
                return Ok(false);
            }
        } else if !map.keys().all(|key| properties.contains_key(key)) {
            return Ok(false);
        }
    }
    for (key, property_schema) in properties {
        if required.contains(&key.as_str()) {
            let entry = value.prop(key).unwrap_or(&Value::Undefined);
            if !visit(property_schema, scope, entry)? {
                return Ok(false);
            }
        } else if let Some(entry) = value.prop(key) {
            if !visit(property_schema, scope, entry)? {
                return Ok(false);
            }
        }
    }
    Ok(true)
}

fn check_record<'a>(node: &'a Value, scope: &Scope<'a>, value: &Value) -> Result<bool, SchemaError> {
    let Value::Object(map) = value else {
        return Ok(false);
    };
    let (key_pattern, value_schema) =
        schema::record_entry(node).ok_or(SchemaError::InvalidSchema)?;
    let rx = pattern::compile(key_pattern)?;
    if !map.keys().all(|key| rx.is_match(key)) {
        return Ok(false);
    }
    for entry in map.values() {
        if !visit(value_schema, scope, entry)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn check_union<'a>(node: &'a Value, scope: &Scope<'a>, value: &Value) -> Result<bool, SchemaError> {
    let branches = node
        .prop("anyOf")
        .and_then(Value::as_array)
        .ok_or(SchemaError::InvalidSchema)?;
    for branch in branches {
        if visit(branch, scope, value)? {
            return Ok(true);
        }
    }
    Ok(false)
}

fn check_constructor<'a>(
    node: &'a Value,
    scope: &Scope<'a>,
    value: &Value,
) -> Result<bool, SchemaError> {
    let Value::Constructor { template } = value else {
        return Ok(false);
    };
    let returns = node.prop("returns").ok_or(SchemaError::InvalidSchema)?;
    visit(returns, scope, template)
}

// ------------------------------- Tests ------------------------------------ //
