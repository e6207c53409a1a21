//! Shared schema utilities for consistent traversal and pointer translation.
//!
//! Provides three concerns used across all compiler stages:
//! 1. **Shared traversal** that visits ALL schema-bearing keywords consistently
//! 2. **Type inspection** (declared or inferred `type`, title maps)
//! 3. **Pointer translation** between schema pointers and data pointers
//!
//! ## Cross-Reference
//!
//! The merger cannot use `recurse_into_children` because it combines
//! sibling schemas key by key. When adding new keywords here, also update
//! `merge.rs` manually.

use serde_json::{Map, Value};

use crate::error::CompileError;
use crate::pointer::{self, Pointer, WILDCARD};

/// Keywords holding a map of named sub-schemas.
pub const MAP_KEYWORDS: &[&str] = &[
    "properties",
    "patternProperties",
    "$defs",
    "definitions",
    "dependentSchemas",
    "dependencies",
];

/// Keywords holding a single sub-schema.
pub const SINGLE_KEYWORDS: &[&str] = &[
    "additionalProperties",
    "unevaluatedProperties",
    "propertyNames",
    "unevaluatedItems",
    "contains",
    "not",
    "if",
    "then",
    "else",
    "additionalItems",
];

/// Keywords holding an array of sub-schemas.
pub const ARRAY_KEYWORDS: &[&str] = &["anyOf", "oneOf", "allOf", "prefixItems"];

/// Sub-schema locations with no single data-pointer equivalent.
const AMBIGUOUS_KEYWORDS: &[&str] = &[
    "$defs",
    "definitions",
    "additionalProperties",
    "patternProperties",
    "propertyNames",
    "not",
    "contains",
    "dependencies",
    "dependentSchemas",
    "unevaluatedProperties",
    "unevaluatedItems",
];

// ---------------------------------------------------------------------------
// Shared schema traversal
// ---------------------------------------------------------------------------

/// Every direct sub-schema of `schema` with the keys leading to it.
///
/// Values under map keywords that are not objects (e.g. `dependencies`
/// property lists) are skipped.
pub fn child_schemas(schema: &Value) -> Vec<(Vec<String>, &Value)> {
    let Some(obj) = schema.as_object() else {
        return Vec::new();
    };
    let mut children = Vec::new();
    for keyword in MAP_KEYWORDS {
        if let Some(Value::Object(map)) = obj.get(*keyword) {
            for (key, child) in map {
                if child.is_object() {
                    children.push((vec![keyword.to_string(), key.clone()], child));
                }
            }
        }
    }
    for keyword in SINGLE_KEYWORDS {
        if let Some(child @ Value::Object(_)) = obj.get(*keyword) {
            children.push((vec![keyword.to_string()], child));
        }
    }
    for keyword in ARRAY_KEYWORDS {
        if let Some(Value::Array(variants)) = obj.get(*keyword) {
            for (i, child) in variants.iter().enumerate() {
                children.push((vec![keyword.to_string(), i.to_string()], child));
            }
        }
    }
    match obj.get("items") {
        Some(child @ Value::Object(_)) => children.push((vec!["items".to_string()], child)),
        Some(Value::Array(tuple)) => {
            for (i, child) in tuple.iter().enumerate() {
                children.push((vec!["items".to_string(), i.to_string()], child));
            }
        }
        _ => {}
    }
    children
}

/// Recursively visit all schema-bearing children of a JSON Schema object.
///
/// Calls `walk_fn` for each child schema found under any recognised keyword.
/// Uses the extract-recurse-reinsert pattern to avoid borrow conflicts.
///
/// | Category       | Keywords                                                       |
/// |----------------|----------------------------------------------------------------|
/// | Object         | `properties`, `patternProperties`, `additionalProperties`,     |
/// |                | `unevaluatedProperties`, `propertyNames`, `dependencies`       |
/// | Array          | `items` (object + array), `prefixItems`, `additionalItems`,   |
/// |                | `unevaluatedItems`, `contains`                                 |
/// | Composition    | `anyOf`, `oneOf`, `allOf`                                      |
/// | Conditional    | `if`, `then`, `else`                                           |
/// | Negation       | `not`                                                          |
/// | Definitions    | `$defs`, `definitions`                                         |
pub fn recurse_into_children<F>(
    obj: &mut Map<String, Value>,
    path: &Pointer,
    depth: usize,
    walk_fn: &mut F,
) -> Result<(), CompileError>
where
    F: FnMut(Value, &Pointer, usize) -> Result<Value, CompileError>,
{
    for keyword in MAP_KEYWORDS {
        if let Some(val) = obj.remove(*keyword) {
            match val {
                Value::Object(map) => {
                    let mut new_map = Map::new();
                    for (key, val) in map {
                        let child_path = path.join(&[*keyword, key.as_str()]);
                        let walked = if val.is_object() {
                            walk_fn(val, &child_path, depth + 1)?
                        } else {
                            val
                        };
                        new_map.insert(key, walked);
                    }
                    obj.insert(keyword.to_string(), Value::Object(new_map));
                }
                other => {
                    obj.insert(keyword.to_string(), other);
                }
            }
        }
    }

    for keyword in SINGLE_KEYWORDS {
        if let Some(val) = obj.remove(*keyword) {
            if val.is_object() {
                let walked = walk_fn(val, &path.child(*keyword), depth + 1)?;
                obj.insert(keyword.to_string(), walked);
            } else {
                // `additionalProperties: false` and friends
                obj.insert(keyword.to_string(), val);
            }
        }
    }

    for keyword in ARRAY_KEYWORDS {
        if let Some(val) = obj.remove(*keyword) {
            match val {
                Value::Array(variants) => {
                    let mut walked = Vec::with_capacity(variants.len());
                    for (i, variant) in variants.into_iter().enumerate() {
                        let child_path = path.join(&[*keyword, i.to_string().as_str()]);
                        walked.push(walk_fn(variant, &child_path, depth + 1)?);
                    }
                    obj.insert(keyword.to_string(), Value::Array(walked));
                }
                other => {
                    obj.insert(keyword.to_string(), other);
                }
            }
        }
    }

    if let Some(items) = obj.remove("items") {
        match items {
            Value::Object(_) => {
                let walked = walk_fn(items, &path.child("items"), depth + 1)?;
                obj.insert("items".to_string(), walked);
            }
            Value::Array(arr) => {
                let mut walked = Vec::with_capacity(arr.len());
                for (i, item) in arr.into_iter().enumerate() {
                    let child_path = path.join(&["items", i.to_string().as_str()]);
                    walked.push(walk_fn(item, &child_path, depth + 1)?);
                }
                obj.insert("items".to_string(), Value::Array(walked));
            }
            other => {
                obj.insert("items".to_string(), other);
            }
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Type inspection
// ---------------------------------------------------------------------------

/// Return the JSON type name for a value.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                "integer"
            } else {
                "number"
            }
        }
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// All declared types, from either `type: "x"` or `type: ["x", "y"]`.
pub fn declared_types(schema: &Value) -> Vec<&str> {
    match schema.get("type") {
        Some(Value::String(s)) => vec![s.as_str()],
        Some(Value::Array(arr)) => arr.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

/// The primary type of a schema: the first declared non-null type, or one
/// inferred from the keywords present.
pub fn schema_type(schema: &Value) -> Option<String> {
    let declared = declared_types(schema);
    if let Some(first) = declared.iter().find(|t| **t != "null") {
        return Some(first.to_string());
    }
    if !declared.is_empty() {
        return Some("null".to_string());
    }
    let obj = schema.as_object()?;
    let has_any = |keys: &[&str]| keys.iter().any(|k| obj.contains_key(*k));
    if has_any(&["properties", "additionalProperties", "patternProperties", "required"]) {
        return Some("object".to_string());
    }
    if has_any(&["items", "additionalItems", "minItems", "maxItems", "uniqueItems"]) {
        return Some("array".to_string());
    }
    if let Some(first) = obj
        .get("enum")
        .and_then(Value::as_array)
        .and_then(|values| values.first())
        .or_else(|| obj.get("const"))
    {
        return Some(json_type_name(first).to_string());
    }
    if has_any(&["minLength", "maxLength", "pattern", "format"]) {
        return Some("string".to_string());
    }
    if has_any(&[
        "minimum",
        "maximum",
        "exclusiveMinimum",
        "exclusiveMaximum",
        "multipleOf",
    ]) {
        return Some("number".to_string());
    }
    None
}

/// Option list for enumerated values, as `[{name, value}]`.
///
/// Built from `enum` plus `enumNames`, or from `oneOf`/`anyOf` branches that
/// each pin a single value with `const` (or a one-item `enum`) and carry a
/// `title`.
pub fn title_map(schema: &Value) -> Option<Vec<Value>> {
    if let Some(values) = schema.get("enum").and_then(Value::as_array) {
        let names = schema.get("enumNames").and_then(Value::as_array);
        return Some(
            values
                .iter()
                .enumerate()
                .map(|(i, value)| {
                    let name = names
                        .and_then(|n| n.get(i))
                        .cloned()
                        .unwrap_or_else(|| Value::String(display_value(value)));
                    serde_json::json!({ "name": name, "value": value })
                })
                .collect(),
        );
    }
    for keyword in ["oneOf", "anyOf"] {
        let Some(branches) = schema.get(keyword).and_then(Value::as_array) else {
            continue;
        };
        let entries: Option<Vec<Value>> = branches
            .iter()
            .map(|branch| {
                let value = branch.get("const").cloned().or_else(|| {
                    match branch.get("enum").and_then(Value::as_array) {
                        Some(single) if single.len() == 1 => single.first().cloned(),
                        _ => None,
                    }
                })?;
                let title = branch.get("title")?;
                Some(serde_json::json!({ "name": title, "value": value }))
            })
            .collect();
        if let Some(entries) = entries.filter(|e| !e.is_empty()) {
            return Some(entries);
        }
    }
    None
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// True for array schemas whose items draw from a fixed set of values.
pub fn has_enumerable_items(schema: &Value) -> bool {
    schema
        .get("items")
        .filter(|items| items.is_object())
        .is_some_and(|items| title_map(items).is_some())
}

// ---------------------------------------------------------------------------
// Property order
// ---------------------------------------------------------------------------

/// Property names of `schema` in display order.
///
/// Declaration order unless `ui:order` lists names; `"*"` in that list stands
/// for every property not listed, and without it unlisted properties follow
/// the listed ones. Names in `ui:order` that are not properties are ignored.
pub fn ordered_properties(schema: &Value) -> Vec<String> {
    let declared: Vec<&String> = schema
        .get("properties")
        .and_then(Value::as_object)
        .map(|p| p.keys().collect())
        .unwrap_or_default();
    let Some(order) = schema.get("ui:order").and_then(Value::as_array) else {
        return declared.into_iter().cloned().collect();
    };
    let listed: Vec<&str> = order.iter().filter_map(Value::as_str).collect();
    let rest = declared
        .iter()
        .filter(|key| !listed.contains(&key.as_str()))
        .map(|key| key.to_string());
    let mut keys = Vec::with_capacity(declared.len());
    let mut rest = Some(rest);
    for name in &listed {
        if *name == "*" {
            keys.extend(rest.take().into_iter().flatten());
        } else if declared.iter().any(|key| key == name) && !keys.iter().any(|k| k == name) {
            keys.push(name.to_string());
        }
    }
    keys.extend(rest.into_iter().flatten());
    keys
}

// ---------------------------------------------------------------------------
// Array item counts
// ---------------------------------------------------------------------------

/// Item counts of one array node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayCounts {
    /// Tuple positions rendered.
    pub tuple: usize,
    /// All positions rendered, tuple included.
    pub total: usize,
    pub max: Option<usize>,
}

impl ArrayCounts {
    pub fn new(schema: &Value, data_len: usize) -> Self {
        let bound = |keyword: &str| {
            schema
                .get(keyword)
                .and_then(Value::as_u64)
                .and_then(|n| usize::try_from(n).ok())
        };
        let max = bound("maxItems");
        let min = bound("minItems").unwrap_or(0);
        let tuple_len = schema.get("items").and_then(Value::as_array).map_or(0, Vec::len);
        let cap = |n: usize| max.map_or(n, |m| n.min(m));
        let tuple = cap(tuple_len);
        let total = cap(tuple.max(min).max(data_len));
        Self { tuple, total, max }
    }

    pub fn has_room(&self) -> bool {
        self.max.map_or(true, |max| self.total < max)
    }
}

// ---------------------------------------------------------------------------
// Pointer translation
// ---------------------------------------------------------------------------

/// Convert a schema pointer into the generic data pointer it describes.
///
/// Returns `None` for locations with no single data equivalent
/// (`definitions`, `additionalProperties`, `patternProperties`, `not`,
/// `contains`, ...). Composition branches (`allOf/N`, `then`, ...) describe
/// the same data location as their parent.
pub fn schema_to_data_pointer(schema_pointer: &Pointer, root: &Value) -> Option<Pointer> {
    let keys = schema_pointer.keys();
    let mut node = root;
    let mut data = Pointer::root();
    let mut i = 0;
    while i < keys.len() {
        let key = keys[i].as_str();
        if AMBIGUOUS_KEYWORDS.contains(&key) {
            return None;
        }
        match key {
            "properties" => {
                let name = keys.get(i + 1)?;
                node = node.get("properties")?.get(name)?;
                data.push(name.clone());
                i += 2;
            }
            "items" => match node.get("items")? {
                Value::Array(tuple) => {
                    let index = keys.get(i + 1)?;
                    node = tuple.get(pointer::index_of(index)?)?;
                    data.push(index.clone());
                    i += 2;
                }
                items => {
                    node = items;
                    data.push(WILDCARD);
                    i += 1;
                }
            },
            "additionalItems" => {
                node = node.get("additionalItems")?;
                data.push(WILDCARD);
                i += 1;
            }
            "allOf" | "anyOf" | "oneOf" | "prefixItems" => {
                let index = keys.get(i + 1)?;
                node = node.get(key)?.get(pointer::index_of(index)?)?;
                if key == "prefixItems" {
                    data.push(index.clone());
                }
                i += 2;
            }
            "if" | "then" | "else" => {
                node = node.get(key)?;
                i += 1;
            }
            _ => return None,
        }
    }
    Some(data)
}

/// Convert a (generic or indexed) data pointer into the schema pointer that
/// governs it, following local `$ref`s in a compiled schema.
pub fn data_to_schema_pointer(data_pointer: &Pointer, root: &Value) -> Option<Pointer> {
    let mut schema_pointer = Pointer::root();
    let mut node = follow_local_ref(root, root, &mut schema_pointer)?;
    for key in data_pointer.keys() {
        let (keys, child) = child_for_data_key(node, key)?;
        schema_pointer = schema_pointer.join(&keys);
        node = follow_local_ref(child, root, &mut schema_pointer)?;
    }
    Some(schema_pointer)
}

fn child_for_data_key<'v>(node: &'v Value, key: &str) -> Option<(Vec<String>, &'v Value)> {
    if let Some(child) = node.get("properties").and_then(|p| p.get(key)) {
        return Some((vec!["properties".into(), key.into()], child));
    }
    let index = if key == WILDCARD {
        Some(usize::MAX)
    } else {
        pointer::index_of(key)
    };
    match (node.get("items"), index) {
        (Some(Value::Array(tuple)), Some(index)) => {
            if let Some(child) = tuple.get(index) {
                return Some((vec!["items".into(), key.into()], child));
            }
            return match node.get("additionalItems") {
                Some(child @ Value::Object(_)) => Some((vec!["additionalItems".into()], child)),
                _ => None,
            };
        }
        (Some(child @ Value::Object(_)), Some(_)) => {
            return Some((vec!["items".into()], child));
        }
        _ => {}
    }
    if let Some(branches) = node.get("allOf").and_then(Value::as_array) {
        for (i, branch) in branches.iter().enumerate() {
            if let Some((mut keys, child)) = child_for_data_key(branch, key) {
                keys.insert(0, i.to_string());
                keys.insert(0, "allOf".to_string());
                return Some((keys, child));
            }
        }
    }
    match node.get("additionalProperties") {
        Some(child @ Value::Object(_)) if index.is_none() => {
            Some((vec!["additionalProperties".into()], child))
        }
        _ => None,
    }
}

/// Upper bound on chained `$ref` hops, so a self-referencing `$ref` cannot loop.
const MAX_REF_HOPS: usize = 32;

/// Follow a chain of local `$ref`s, updating `schema_pointer` to the target.
fn follow_local_ref<'v>(
    mut node: &'v Value,
    root: &'v Value,
    schema_pointer: &mut Pointer,
) -> Option<&'v Value> {
    let mut hops = 0;
    while let Some(reference) = node.get("$ref").and_then(Value::as_str) {
        if hops == MAX_REF_HOPS {
            return None;
        }
        let target = Pointer::parse(reference).ok()?;
        node = pointer::get(root, &target)?;
        *schema_pointer = target;
        hops += 1;
    }
    Some(node)
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn p(s: &str) -> Pointer {
        Pointer::parse(s).unwrap()
    }

    // --- Traversal tests ---

    #[test]
    fn test_recurse_visits_all_keywords() {
        let mut schema = json!({
            "type": "object",
            "properties": { "a": { "type": "string" } },
            "patternProperties": { "^x-": { "type": "string" } },
            "additionalProperties": { "type": "integer" },
            "unevaluatedProperties": { "type": "boolean" },
            "propertyNames": { "type": "string", "maxLength": 10 },
            "items": { "type": "string" },
            "prefixItems": [{ "type": "integer" }],
            "unevaluatedItems": { "type": "null" },
            "contains": { "type": "number" },
            "anyOf": [{ "type": "string" }],
            "oneOf": [{ "type": "integer" }],
            "allOf": [{ "type": "boolean" }],
            "if": { "type": "string" },
            "then": { "type": "integer" },
            "else": { "type": "boolean" },
            "not": { "type": "null" },
            "$defs": { "Foo": { "type": "string" } },
            "definitions": { "Bar": { "type": "integer" } },
            "dependencies": { "a": { "required": ["b"] }, "c": ["d"] }
        });

        let obj = schema.as_object_mut().unwrap();
        let visit_count = AtomicUsize::new(0);

        recurse_into_children(obj, &Pointer::root(), 0, &mut |val, _path, _depth| {
            visit_count.fetch_add(1, Ordering::Relaxed);
            Ok(val)
        })
        .unwrap();

        // 19 schema-bearing positions; the `dependencies` property list is not one
        assert_eq!(visit_count.load(Ordering::Relaxed), 19);
        assert_eq!(obj["dependencies"]["c"], json!(["d"]));
    }

    #[test]
    fn test_recurse_preserves_non_schema_values() {
        let mut schema = json!({
            "additionalProperties": false,
            "items": true,
            "$defs": true,
            "anyOf": "invalid"
        });

        let obj = schema.as_object_mut().unwrap();
        recurse_into_children(obj, &Pointer::root(), 0, &mut |val, _, _| Ok(val)).unwrap();

        assert_eq!(obj.get("additionalProperties"), Some(&json!(false)));
        assert_eq!(obj.get("items"), Some(&json!(true)));
        assert_eq!(obj.get("$defs"), Some(&json!(true)));
        assert_eq!(obj.get("anyOf"), Some(&json!("invalid")));
    }

    #[test]
    fn test_recurse_builds_correct_paths() {
        let mut schema = json!({
            "properties": { "a/b": { "type": "string" } },
            "items": [{ "type": "integer" }]
        });

        let obj = schema.as_object_mut().unwrap();
        let mut paths = Vec::new();
        recurse_into_children(obj, &Pointer::root(), 0, &mut |val, path, _| {
            paths.push(path.to_string());
            Ok(val)
        })
        .unwrap();

        assert!(paths.contains(&"/properties/a~1b".to_string()));
        assert!(paths.contains(&"/items/0".to_string()));
    }

    #[test]
    fn test_child_schemas_lists_direct_children_only() {
        let schema = json!({
            "properties": { "a": { "properties": { "deep": {} } } },
            "items": [{}, {}],
            "not": {}
        });
        let keys: Vec<String> = child_schemas(&schema)
            .into_iter()
            .map(|(keys, _)| Pointer::from_keys(keys).to_string())
            .collect();
        assert_eq!(keys, vec!["/properties/a", "/not", "/items/0", "/items/1"]);
    }

    // --- Type inspection ---

    #[test]
    fn test_schema_type_declared_and_inferred() {
        assert_eq!(schema_type(&json!({"type": ["null", "string"]})).as_deref(), Some("string"));
        assert_eq!(schema_type(&json!({"type": "null"})).as_deref(), Some("null"));
        assert_eq!(schema_type(&json!({"properties": {}})).as_deref(), Some("object"));
        assert_eq!(schema_type(&json!({"items": {}})).as_deref(), Some("array"));
        assert_eq!(schema_type(&json!({"enum": [1, 2]})).as_deref(), Some("integer"));
        assert_eq!(schema_type(&json!({"maxLength": 3})).as_deref(), Some("string"));
        assert_eq!(schema_type(&json!({})), None);
    }

    #[test]
    fn test_title_map_from_enum_names() {
        let schema = json!({"enum": ["a", "b"], "enumNames": ["Alpha"]});
        assert_eq!(
            title_map(&schema).unwrap(),
            vec![
                json!({"name": "Alpha", "value": "a"}),
                json!({"name": "b", "value": "b"})
            ]
        );
    }

    #[test]
    fn test_title_map_from_one_of_requires_titles() {
        let titled = json!({"oneOf": [
            {"const": 1, "title": "One"},
            {"enum": [2], "title": "Two"}
        ]});
        assert_eq!(title_map(&titled).unwrap().len(), 2);

        let untitled = json!({"oneOf": [{"const": 1}, {"const": 2}]});
        assert_eq!(title_map(&untitled), None);
    }

    // --- Pointer translation ---

    #[test]
    fn test_array_counts() {
        let schema = json!({ "items": [{}, {}], "minItems": 3, "maxItems": 4 });
        let counts = ArrayCounts::new(&schema, 0);
        assert_eq!((counts.tuple, counts.total), (2, 3));
        assert!(counts.has_room());

        let counts = ArrayCounts::new(&schema, 9);
        assert_eq!(counts.total, 4);
        assert!(!counts.has_room());

        let schema = json!({ "items": [{}, {}, {}], "maxItems": 1 });
        let counts = ArrayCounts::new(&schema, 0);
        assert_eq!((counts.tuple, counts.total), (1, 1));

        let counts = ArrayCounts::new(&json!({ "items": {} }), 2);
        assert_eq!((counts.tuple, counts.total, counts.max), (0, 2, None));
    }

    #[test]
    fn test_ordered_properties_with_wildcard() {
        let schema = json!({
            "properties": { "a": {}, "b": {}, "c": {}, "d": {} },
            "ui:order": ["c", "*", "a", "missing"]
        });
        assert_eq!(ordered_properties(&schema), vec!["c", "b", "d", "a"]);

        let schema = json!({ "properties": { "a": {}, "b": {}, "c": {} }, "ui:order": ["b"] });
        assert_eq!(ordered_properties(&schema), vec!["b", "a", "c"]);

        let schema = json!({ "properties": { "z": {}, "y": {} } });
        assert_eq!(ordered_properties(&schema), vec!["z", "y"]);
    }

    #[test]
    fn test_schema_to_data_pointer() {
        let schema = json!({
            "properties": {
                "list": { "items": { "properties": { "name": {} } } },
                "pair": { "items": [{}, {}], "additionalItems": {} }
            },
            "definitions": { "x": {} }
        });
        assert_eq!(
            schema_to_data_pointer(&p("/properties/list/items/properties/name"), &schema),
            Some(p("/list/-/name"))
        );
        assert_eq!(
            schema_to_data_pointer(&p("/properties/pair/items/1"), &schema),
            Some(p("/pair/1"))
        );
        assert_eq!(
            schema_to_data_pointer(&p("/properties/pair/additionalItems"), &schema),
            Some(p("/pair/-"))
        );
        assert_eq!(schema_to_data_pointer(&p("/definitions/x"), &schema), None);
    }

    #[test]
    fn test_data_to_schema_pointer_follows_recursive_refs() {
        let schema = json!({
            "type": "object",
            "properties": {
                "name": { "type": "string" },
                "children": { "type": "array", "items": { "$ref": "#" } }
            }
        });
        assert_eq!(
            data_to_schema_pointer(&p("/children/3/name"), &schema),
            Some(p("/properties/name"))
        );
        assert_eq!(
            data_to_schema_pointer(&p("/children/-"), &schema),
            Some(p(""))
        );
        assert_eq!(data_to_schema_pointer(&p("/missing"), &schema), None);
    }

    #[test]
    fn test_data_to_schema_pointer_tuple_and_additional() {
        let schema = json!({
            "items": [{ "type": "string" }],
            "additionalItems": { "type": "number" }
        });
        assert_eq!(data_to_schema_pointer(&p("/0"), &schema), Some(p("/items/0")));
        assert_eq!(data_to_schema_pointer(&p("/4"), &schema), Some(p("/additionalItems")));
        assert_eq!(data_to_schema_pointer(&p("/-"), &schema), Some(p("/additionalItems")));
    }
}
