//! Best-effort coercion of an existing value toward schema conformance.
//!
//! Casting never mutates its input: a conforming value is returned as an
//! equal clone, salvageable composites are rebuilt member-by-member, and
//! anything irrecoverable falls back to synthesis. Primitives admit no
//! partial repair, so they are all check-else-synthesize.
//!
//! Union branches need a selection strategy, since a union can be one of many
//! varying types with potentially overlapping properties. Each branch is
//! scored against the value: Object branches earn one point per declared
//! property whose value-side entry independently passes the checker, all
//! other branches score zero. The highest score is taken as the author's
//! intended discriminant; a later branch must strictly exceed the best seen
//! so far, and an all-zero field falls back to the first declared branch.
//! The tie-break and zero rules are load-bearing for compatibility; keep
//! them exactly as they are.

use crate::check;
use crate::create;
use crate::errors::SchemaError;
use crate::schema::{self, SchemaKind};
use crate::scope::{Expansion, Scope};
use crate::value::{Map, Value};

/// Cast `value` toward `schema` under the given reference scope, returning a
/// fresh conforming value.
pub fn cast(schema: &Value, references: &[&Value], value: &Value) -> Result<Value, SchemaError> {
    visit(schema, &Scope::from_refs(references), &Expansion::default(), value)
}

fn visit<'a>(
    node: &'a Value,
    scope: &Scope<'a>,
    expanding: &Expansion<'a>,
    value: &Value,
) -> Result<Value, SchemaError> {
    let scope = scope.entered(node);
    let Some(kind) = schema::classify(node) else {
        return Err(SchemaError::InvalidSchema);
    };
    match kind {
        SchemaKind::Array => cast_array(node, &scope, expanding, value),
        SchemaKind::Tuple => cast_tuple(node, &scope, expanding, value),
        SchemaKind::Object => cast_object(node, &scope, expanding, value),
        SchemaKind::Record => cast_record(node, &scope, expanding, value),
        SchemaKind::Union => cast_union(node, &scope, expanding, value),
        SchemaKind::Ref | SchemaKind::SelfRef => {
            let name = schema::ref_target(node).ok_or(SchemaError::InvalidSchema)?;
            if expanding.contains(name) {
                // casting recursive schemas is not supported
                return Err(SchemaError::UnsupportedOperation(name.to_string()));
            }
            let target = check::resolve(node, &scope)?;
            visit(target, &scope, &expanding.entered(name), value)
        }
        // leaves: no partial repair possible
        _ => cast_leaf(node, &scope, value),
    }
}

fn cast_leaf<'a>(node: &'a Value, scope: &Scope<'a>, value: &Value) -> Result<Value, SchemaError> {
    if check::visit(node, scope, value)? {
        Ok(value.clone())
    } else {
        synthesize(node, scope)
    }
}

fn synthesize<'a>(node: &'a Value, scope: &Scope<'a>) -> Result<Value, SchemaError> {
    // synthesis starts its own expansion accounting
    create::visit(node, scope, &Expansion::default())
}

fn cast_array<'a>(
    node: &'a Value,
    scope: &Scope<'a>,
    expanding: &Expansion<'a>,
    value: &Value,
) -> Result<Value, SchemaError> {
    if check::visit(node, scope, value)? {
        return Ok(value.clone());
    }
    let Value::Array(items) = value else {
        return synthesize(node, scope);
    };
    let item_schema = node.prop("items").ok_or(SchemaError::InvalidSchema)?;
    let repaired = items
        .iter()
        .map(|item| visit(item_schema, scope, expanding, item))
        .collect::<Result<Vec<_>, _>>()?;
    // Length is never forced to bounds, but a uniqueItems violation that
    // element repair did not resolve leaves synthesis as the only option.
    if schema::bool_field(node, "uniqueItems") == Some(true)
        && !check::pairwise_distinct(&repaired)
    {
        return synthesize(node, scope);
    }
    Ok(Value::Array(repaired))
}

fn cast_tuple<'a>(
    node: &'a Value,
    scope: &Scope<'a>,
    expanding: &Expansion<'a>,
    value: &Value,
) -> Result<Value, SchemaError> {
    if check::visit(node, scope, value)? {
        return Ok(value.clone());
    }
    let Value::Array(elements) = value else {
        return synthesize(node, scope);
    };
    let Some(schemas) = node.prop("items").and_then(Value::as_array) else {
        return Ok(Value::Array(Vec::new()));
    };
    // positional repair; missing positions read as absent and re-synthesize
    schemas
        .iter()
        .enumerate()
        .map(|(index, element_schema)| {
            let element = elements.get(index).unwrap_or(&Value::Undefined);
            visit(element_schema, scope, expanding, element)
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Array)
}

fn cast_object<'a>(
    node: &'a Value,
    scope: &Scope<'a>,
    expanding: &Expansion<'a>,
    value: &Value,
) -> Result<Value, SchemaError> {
    if check::visit(node, scope, value)? {
        return Ok(value.clone());
    }
    if !matches!(value, Value::Object(_)) {
        return synthesize(node, scope);
    }
    let properties = node
        .prop("properties")
        .and_then(Value::as_object)
        .ok_or(SchemaError::InvalidSchema)?;
    let required = schema::required_names(node);
    let mut out = Map::new();
    for (key, property_schema) in properties {
        let present = value.prop(key);
        // keep a key only when required or already present with a value;
        // undeclared source keys drop
        if !required.contains(&key.as_str()) && present.is_none() {
            continue;
        }
        let entry = present.unwrap_or(&Value::Undefined);
        out.insert(key.clone(), visit(property_schema, scope, expanding, entry)?);
    }
    Ok(Value::Object(out))
}

fn cast_record<'a>(
    node: &'a Value,
    scope: &Scope<'a>,
    expanding: &Expansion<'a>,
    value: &Value,
) -> Result<Value, SchemaError> {
    if check::visit(node, scope, value)? {
        return Ok(value.clone());
    }
    let Value::Object(map) = value else {
        return synthesize(node, scope);
    };
    let (_, value_schema) = schema::record_entry(node).ok_or(SchemaError::InvalidSchema)?;
    let mut out = Map::new();
    for (key, entry) in map {
        out.insert(key.clone(), visit(value_schema, scope, expanding, entry)?);
    }
    Ok(Value::Object(out))
}

// --------------------------- Union selection ------------------------------ //

fn cast_union<'a>(
    node: &'a Value,
    scope: &Scope<'a>,
    expanding: &Expansion<'a>,
    value: &Value,
) -> Result<Value, SchemaError> {
    if check::visit(node, scope, value)? {
        return Ok(value.clone());
    }
    let branches = node
        .prop("anyOf")
        .and_then(Value::as_array)
        .ok_or(SchemaError::InvalidSchema)?;
    let Some(first) = branches.first() else {
        return Err(SchemaError::EmptyUnion);
    };
    let mut selected = first;
    let mut best = 0usize;
    for branch in branches {
        let score = branch_score(branch, scope, value)?;
        if score > best {
            selected = branch;
            best = score;
        }
    }
    visit(selected, scope, expanding, value)
}

/// Tally of declared properties whose value-side entry passes the checker.
/// Non-Object branches never score.
fn branch_score<'a>(
    branch: &'a Value,
    scope: &Scope<'a>,
    value: &Value,
) -> Result<usize, SchemaError> {
    if schema::classify(branch) != Some(SchemaKind::Object) || !matches!(value, Value::Object(_)) {
        return Ok(0);
    }
    let properties = branch
        .prop("properties")
        .and_then(Value::as_object)
        .ok_or(SchemaError::InvalidSchema)?;
    let mut score = 0;
    for (key, property_schema) in properties {
        let entry = value.prop(key).unwrap_or(&Value::Undefined);
        if check::visit(property_schema, scope, entry)? {
            score += 1;
        }
    }
    Ok(score)
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::check;
    use serde_json::json;

    fn v(j: serde_json::Value) -> Value {
        Value::from_json(&j)
    }

    fn casted(schema: &serde_json::Value, value: &serde_json::Value) -> Value {
        cast(&v(schema.clone()), &[], &v(value.clone())).unwrap()
    }

    #[test]
    fn conforming_values_pass_through_unchanged() {
        let cases = [
            (json!({"$kind": "Number", "minimum": 1}), json!(3)),
            (json!({"$kind": "Array", "items": {"$kind": "Number"}}), json!([1, 2])),
            (
                json!({
                    "$kind": "Object",
                    "properties": {"x": {"$kind": "Number"}},
                    "required": ["x"],
                }),
                json!({"x": 1, "extra": true}),
            ),
        ];
        for (s, value) in cases {
            assert_eq!(casted(&s, &value), v(value.clone()), "no-op on conformance: {s}");
        }
    }

    #[test]
    fn leaves_synthesize_on_mismatch() {
        assert_eq!(casted(&json!({"$kind": "Number", "minimum": 2}), &json!("nope")), v(json!(2)));
        assert_eq!(casted(&json!({"$kind": "Boolean"}), &json!(0)), v(json!(false)));
        assert_eq!(
            casted(&json!({"$kind": "Literal", "const": "tag"}), &json!("other")),
            v(json!("tag"))
        );
    }

    #[test]
    fn tuple_fills_missing_positions() {
        // Scenario 1
        let s = json!({
            "$kind": "Tuple",
            "items": [{"$kind": "Number"}, {"$kind": "String"}],
            "minItems": 2, "maxItems": 2,
        });
        assert_eq!(casted(&s, &json!([1])), v(json!([1, ""])));
        // surplus positions drop
        assert_eq!(casted(&s, &json!([1, "x", true])), v(json!([1, "x"])));
        // non-sequence synthesizes fresh
        assert_eq!(casted(&s, &json!("no")), v(json!([0, ""])));
    }

    #[test]
    fn record_repairs_entries_and_keeps_keys() {
        // Scenario 2
        let s = json!({
            "$kind": "Record",
            "patternProperties": {"^.*$": {"$kind": "Boolean"}},
            "additionalProperties": false,
        });
        assert_eq!(casted(&s, &json!({"a": 1, "b": true})), v(json!({"a": false, "b": true})));
        assert_eq!(casted(&s, &json!(7)), v(json!({})));
    }

    #[test]
    fn object_rebuild_synthesizes_required_and_drops_unknown() {
        let s = json!({
            "$kind": "Object",
            "properties": {
                "x": {"$kind": "Number"},
                "y": {"$kind": "String"},
            },
            "required": ["x"],
        });
        // missing required x synthesized; unknown key dropped; optional kept & repaired
        assert_eq!(casted(&s, &json!({"y": 5, "junk": []})), v(json!({"x": 0, "y": ""})));
        // absent optional stays absent
        assert_eq!(casted(&s, &json!({"x": "bad"})), v(json!({"x": 0})));
        // non-object synthesizes fresh
        assert_eq!(casted(&s, &json!([1])), v(json!({"x": 0})));
    }

    #[test]
    fn array_repairs_elements_without_forcing_length() {
        let s = json!({"$kind": "Array", "items": {"$kind": "Number"}, "minItems": 1});
        assert_eq!(casted(&s, &json!([1, "x", 3])), v(json!([1, 0, 3])));
        // non-sequence synthesizes to bounds
        assert_eq!(casted(&s, &json!({"not": "array"})), v(json!([0])));
    }

    #[test]
    fn unique_items_violation_requires_synthesis() {
        // Scenario 5
        let s = v(json!({"$kind": "Array", "items": {"$kind": "Number"}, "uniqueItems": true}));
        assert!(!check(&s, &[], &v(json!([1, 1, 2]))).unwrap());
        assert_eq!(
            cast(&s, &[], &v(json!([1, 1, 2]))).unwrap_err(),
            SchemaError::UnsupportedConstraint { constraint: "uniqueItems" }
        );
        // a default rescues it
        let with_default = v(json!({
            "$kind": "Array", "items": {"$kind": "Number"},
            "uniqueItems": true, "default": [9],
        }));
        assert_eq!(cast(&with_default, &[], &v(json!([1, 1, 2]))).unwrap(), v(json!([9])));
        // element repair that resolves the duplicates is kept
        assert_eq!(cast(&s, &[], &v(json!([1, 2, 3]))).unwrap(), v(json!([1, 2, 3])));
    }

    #[test]
    fn union_selects_branch_by_property_score() {
        // Scenario 3
        let s = json!({
            "$kind": "Union",
            "anyOf": [
                {
                    "$kind": "Object",
                    "properties": {
                        "kind": {"$kind": "Literal", "const": "a"},
                        "x": {"$kind": "Number"},
                    },
                    "required": ["kind", "x"],
                    "additionalProperties": false,
                },
                {
                    "$kind": "Object",
                    "properties": {
                        "kind": {"$kind": "Literal", "const": "b"},
                        "y": {"$kind": "String"},
                    },
                    "required": ["kind", "y"],
                    "additionalProperties": false,
                },
            ],
        });
        assert_eq!(
            casted(&s, &json!({"kind": "b", "y": "hi", "extra": 1})),
            v(json!({"kind": "b", "y": "hi"}))
        );
        assert_eq!(
            casted(&s, &json!({"kind": "a", "x": true})),
            v(json!({"kind": "a", "x": 0}))
        );
    }

    #[test]
    fn union_tie_breaks_to_earliest_branch() {
        // each branch pairs a disjoint discriminating property with a second
        // required field, so no input here validates outright
        let s = json!({
            "$kind": "Union",
            "anyOf": [
                {
                    "$kind": "Object",
                    "properties": {"p": {"$kind": "Number"}, "pa": {"$kind": "String"}},
                    "required": ["p", "pa"],
                },
                {
                    "$kind": "Object",
                    "properties": {"q": {"$kind": "Number"}, "qb": {"$kind": "String"}},
                    "required": ["q", "qb"],
                },
            ],
        });
        // the branch whose disjoint property is present (and valid) is chosen
        assert_eq!(casted(&s, &json!({"q": 5})), v(json!({"q": 5, "qb": ""})));
        assert_eq!(casted(&s, &json!({"p": 5})), v(json!({"p": 5, "pa": ""})));
        // zero matches anywhere: first declared branch wins
        assert_eq!(casted(&s, &json!({"z": true})), v(json!({"p": 0, "pa": ""})));
        // equal nonzero scores: the earlier branch is never displaced
        assert_eq!(
            casted(&s, &json!({"p": 1, "q": 2})),
            v(json!({"p": 1, "pa": ""}))
        );
    }

    #[test]
    fn union_of_non_objects_scores_zero_and_takes_first() {
        let s = json!({"$kind": "Union", "anyOf": [{"$kind": "Number"}, {"$kind": "String"}]});
        assert_eq!(casted(&s, &json!("keep")), v(json!("keep"))); // already valid
        assert_eq!(casted(&s, &json!(true)), v(json!(0)));
        assert_eq!(
            cast(&v(json!({"$kind": "Union", "anyOf": []})), &[], &v(json!(1))).unwrap_err(),
            SchemaError::EmptyUnion
        );
    }

    #[test]
    fn refs_cast_through_scope_but_recursion_is_unsupported() {
        let named = v(json!({"$kind": "Number", "$id": "N"}));
        let r = v(json!({"$kind": "Ref", "$ref": "N"}));
        assert_eq!(cast(&r, &[&named], &v(json!("x"))).unwrap(), v(json!(0)));

        let list = v(json!({
            "$kind": "Object",
            "$id": "Node",
            "properties": {
                "value": {"$kind": "Number"},
                "next": {"$kind": "Self", "$ref": "Node"},
            },
            "required": ["value", "next"],
        }));
        // conforming input never needs repair, so depth stays bounded
        // by the value; a repair that re-enters the definition fails hard
        assert_eq!(
            cast(&list, &[], &v(json!({"value": 1, "next": {"value": "x"}}))).unwrap_err(),
            SchemaError::UnsupportedOperation("Node".into())
        );
    }

    #[test]
    fn cast_output_always_checks() {
        let cases = [
            (json!({"$kind": "Number", "minimum": 2}), json!("bad")),
            (
                json!({
                    "$kind": "Tuple",
                    "items": [{"$kind": "Number"}, {"$kind": "String"}],
                    "minItems": 2, "maxItems": 2,
                }),
                json!([1]),
            ),
            (
                json!({
                    "$kind": "Record",
                    "patternProperties": {"^.*$": {"$kind": "Boolean"}},
                    "additionalProperties": false,
                }),
                json!({"a": 1, "b": true}),
            ),
            (
                json!({
                    "$kind": "Object",
                    "properties": {"x": {"$kind": "Number"}, "y": {"$kind": "String"}},
                    "required": ["x", "y"],
                    "additionalProperties": false,
                }),
                json!({"y": 9, "stray": null}),
            ),
            (
                json!({"$kind": "Union", "anyOf": [{"$kind": "Number"}, {"$kind": "String"}]}),
                json!([]),
            ),
        ];
        for (s, value) in cases {
            let s = v(s);
            let out = cast(&s, &[], &v(value)).unwrap();
            assert!(check(&s, &[], &out).unwrap(), "cast output must conform: {s:?}");
        }
    }
}
