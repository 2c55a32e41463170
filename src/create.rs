//! Synthesis of a conforming value from a schema alone.
//!
//! An explicit `default` is authoritative: it is returned verbatim before any
//! variant logic runs, which is also the only way to terminate synthesis of
//! recursive definitions. Two constraints cannot be satisfied by synthesis at
//! all (String `pattern` and Array `uniqueItems`), so they are hard errors
//! when no default is supplied.

use crate::check;
use crate::errors::SchemaError;
use crate::pattern;
use crate::schema::{self, SchemaKind};
use crate::scope::{Expansion, Scope};
use crate::value::{Map, NativeFn, Value};

/// Synthesize a value conforming to `schema` under the given reference scope.
pub fn create(schema: &Value, references: &[&Value]) -> Result<Value, SchemaError> {
    visit(schema, &Scope::from_refs(references), &Expansion::default())
}

pub(crate) fn visit<'a>(
    node: &'a Value,
    scope: &Scope<'a>,
    expanding: &Expansion<'a>,
) -> Result<Value, SchemaError> {
    let scope = scope.entered(node);
    let Some(kind) = schema::classify(node) else {
        return Err(SchemaError::InvalidSchema);
    };
    if let Some(default) = schema::default_of(node) {
        return Ok(default.clone());
    }
    match kind {
        SchemaKind::Any | SchemaKind::Unknown => Ok(Value::Object(Map::new())),
        SchemaKind::Null | SchemaKind::Void => Ok(Value::Null),
        SchemaKind::Undefined => Ok(Value::Undefined),
        SchemaKind::Boolean => Ok(Value::Bool(false)),
        SchemaKind::Number | SchemaKind::Integer => {
            Ok(Value::Number(schema::num_field(node, "minimum").unwrap_or(0.0)))
        }
        SchemaKind::String => create_string(node),
        SchemaKind::Literal => node
            .prop("const")
            .cloned()
            .ok_or(SchemaError::InvalidSchema),
        SchemaKind::ByteArray => {
            let len = schema::num_field(node, "minByteLength").unwrap_or(0.0) as usize;
            Ok(Value::Bytes(vec![0; len]))
        }
        SchemaKind::Array => create_array(node, &scope, expanding),
        SchemaKind::Tuple => create_tuple(node, &scope, expanding),
        SchemaKind::Object => create_object(node, &scope, expanding),
        SchemaKind::Record => create_record(node, &scope, expanding),
        SchemaKind::Union => create_union(node, &scope, expanding),
        SchemaKind::Promise => {
            let item = node.prop("item").ok_or(SchemaError::InvalidSchema)?;
            Ok(Value::Promise(Box::new(visit(item, &scope, expanding)?)))
        }
        SchemaKind::Function => create_function(node, &scope, expanding),
        SchemaKind::Constructor => {
            let returns = node.prop("returns").ok_or(SchemaError::InvalidSchema)?;
            let template = visit(returns, &scope, expanding)?;
            Ok(Value::Constructor { template: Box::new(template) })
        }
        SchemaKind::Ref | SchemaKind::SelfRef => {
            let name = schema::ref_target(node).ok_or(SchemaError::InvalidSchema)?;
            if expanding.contains(name) {
                return Err(SchemaError::RecursiveDefaultRequired(name.to_string()));
            }
            let target = check::resolve(node, &scope)?;
            visit(target, &scope, &expanding.entered(name))
        }
    }
}

fn create_string(node: &Value) -> Result<Value, SchemaError> {
    if node.prop("pattern").is_some() {
        // pattern satisfaction cannot be synthesized
        return Err(SchemaError::UnsupportedConstraint { constraint: "pattern" });
    }
    let len = schema::num_field(node, "minLength").unwrap_or(0.0) as usize;
    Ok(Value::String(".".repeat(len)))
}

fn create_array<'a>(
    node: &'a Value,
    scope: &Scope<'a>,
    expanding: &Expansion<'a>,
) -> Result<Value, SchemaError> {
    if schema::bool_field(node, "uniqueItems") == Some(true) {
        return Err(SchemaError::UnsupportedConstraint { constraint: "uniqueItems" });
    }
    let item_schema = node.prop("items").ok_or(SchemaError::InvalidSchema)?;
    let len = schema::num_field(node, "minItems").unwrap_or(0.0) as usize;
    let mut items = Vec::with_capacity(len);
    for _ in 0..len {
        items.push(visit(item_schema, scope, expanding)?);
    }
    Ok(Value::Array(items))
}

fn create_tuple<'a>(
    node: &'a Value,
    scope: &Scope<'a>,
    expanding: &Expansion<'a>,
) -> Result<Value, SchemaError> {
    let Some(schemas) = node.prop("items").and_then(Value::as_array) else {
        return Ok(Value::Array(Vec::new()));
    };
    schemas
        .iter()
        .map(|element_schema| visit(element_schema, scope, expanding))
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Array)
}

fn create_object<'a>(
    node: &'a Value,
    scope: &Scope<'a>,
    expanding: &Expansion<'a>,
) -> Result<Value, SchemaError> {
    let properties = node
        .prop("properties")
        .and_then(Value::as_object)
        .ok_or(SchemaError::InvalidSchema)?;
    let required = schema::required_names(node);
    let mut out = Map::new();
    for (key, property_schema) in properties {
        if required.contains(&key.as_str()) {
            out.insert(key.clone(), visit(property_schema, scope, expanding)?);
        }
    }
    Ok(Value::Object(out))
}

fn create_record<'a>(
    node: &'a Value,
    scope: &Scope<'a>,
    expanding: &Expansion<'a>,
) -> Result<Value, SchemaError> {
    let (key_pattern, value_schema) =
        schema::record_entry(node).ok_or(SchemaError::InvalidSchema)?;
    let mut out = Map::new();
    if let Some(keys) = pattern::alternation_keys(key_pattern) {
        for key in keys {
            let entry = visit(value_schema, scope, expanding)?;
            out.insert(key, entry);
        }
    }
    Ok(Value::Object(out))
}

fn create_union<'a>(
    node: &'a Value,
    scope: &Scope<'a>,
    expanding: &Expansion<'a>,
) -> Result<Value, SchemaError> {
    let branches = node
        .prop("anyOf")
        .and_then(Value::as_array)
        .ok_or(SchemaError::InvalidSchema)?;
    let Some(first) = branches.first() else {
        return Err(SchemaError::EmptyUnion);
    };
    visit(first, scope, expanding)
}

fn create_function<'a>(
    node: &'a Value,
    scope: &Scope<'a>,
    expanding: &Expansion<'a>,
) -> Result<Value, SchemaError> {
    let returns = node.prop("returns").ok_or(SchemaError::InvalidSchema)?;
    // Synthesize once up front so errors surface here, then hand out fresh
    // copies per invocation.
    let produced = visit(returns, scope, expanding)?;
    Ok(Value::Function(NativeFn::new(move |_| produced.clone())))
}

// ------------------------------- Tests ------------------------------------ //
