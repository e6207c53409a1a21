//! Builds the [`DataMap`] from a compiled schema.
//!
//! One record per generic data location. Recursive `$ref` nodes get no
//! record of their own; lookups reach their target through the
//! recursive-reference map instead.

use serde_json::Value;

use crate::maps::{DataMap, DataMapEntry};
use crate::pointer::{Pointer, WILDCARD};
use crate::schema_utils::schema_type;

/// Record every data location described by `compiled`.
pub fn build_data_map(compiled: &Value) -> DataMap {
    let mut map = DataMap::default();
    record_subtree(
        compiled,
        &Pointer::root(),
        &Pointer::root(),
        false,
        &mut map,
    );
    map
}

/// Record `node` at `data` and every location below it not yet recorded.
pub(crate) fn record_subtree(
    node: &Value,
    schema: &Pointer,
    data: &Pointer,
    required: bool,
    map: &mut DataMap,
) {
    let Some(obj) = node.as_object() else {
        return;
    };
    if obj.contains_key("$ref") {
        return;
    }

    if !map.contains(data) {
        let entry = map.entry(data.clone());
        *entry = DataMapEntry {
            schema_pointer: schema.clone(),
            schema_type: schema_type(node),
            schema_format: obj.get("format").and_then(Value::as_str).map(str::to_string),
            widget_type: None,
            required,
            disabled: obj.get("readOnly").and_then(Value::as_bool).unwrap_or(false),
            min_items: count(node, "minItems"),
            max_items: count(node, "maxItems"),
            tuple_items: obj.get("items").and_then(Value::as_array).map(Vec::len),
            list_items: None,
        };
    }

    let required_keys: Vec<&str> = obj
        .get("required")
        .and_then(Value::as_array)
        .map(|keys| keys.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    if let Some(Value::Object(properties)) = obj.get("properties") {
        for (key, child) in properties {
            record_subtree(
                child,
                &schema.join(&["properties", key.as_str()]),
                &data.child(key.as_str()),
                required_keys.contains(&key.as_str()),
                map,
            );
        }
    }

    match obj.get("items") {
        Some(Value::Array(tuple)) => {
            for (i, child) in tuple.iter().enumerate() {
                let index = i.to_string();
                record_subtree(
                    child,
                    &schema.join(&["items", index.as_str()]),
                    &data.child(index.as_str()),
                    false,
                    map,
                );
            }
            if let Some(tail) = obj.get("additionalItems") {
                record_subtree(
                    tail,
                    &schema.child("additionalItems"),
                    &data.child(WILDCARD),
                    false,
                    map,
                );
            }
        }
        Some(items) => record_subtree(items, &schema.child("items"), &data.child(WILDCARD), false, map),
        None => {}
    }

    for keyword in ["allOf", "anyOf", "oneOf"] {
        if let Some(Value::Array(branches)) = obj.get(keyword) {
            for (i, branch) in branches.iter().enumerate() {
                record_subtree(
                    branch,
                    &schema.join(&[keyword, i.to_string().as_str()]),
                    data,
                    required,
                    map,
                );
            }
        }
    }
}

fn count(node: &Value, keyword: &str) -> Option<usize> {
    node.get(keyword)
        .and_then(Value::as_u64)
        .and_then(|n| usize::try_from(n).ok())
}
