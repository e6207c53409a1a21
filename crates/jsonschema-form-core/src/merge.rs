//! Schema merging (`allOf` compilation).
//!
//! Merges N schema fragments into one flat schema that accepts exactly the
//! values accepted by all of them. Constraints tighten (not loosen), types
//! narrow (not widen), and strictness wins.
//!
//! When two fragments use a keyword in a way that cannot be reconciled, the
//! merge is abandoned and `{"allOf": [...inputs]}` is returned instead.

use std::collections::HashSet;

use serde_json::{Map, Number, Value};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Result of [`merge_schemas`].
#[derive(Debug, Clone, PartialEq)]
pub enum MergeOutcome {
    /// The fragments were combined into one schema.
    Merged(Value),
    /// The fragments conflict; `schema` is the `allOf` conjunction.
    Fallback { schema: Value, keyword: String },
}

impl MergeOutcome {
    pub fn into_schema(self) -> Value {
        match self {
            MergeOutcome::Merged(schema) | MergeOutcome::Fallback { schema, .. } => schema,
        }
    }

    /// The keyword that forced the `allOf` fallback, if any.
    pub fn conflict(&self) -> Option<&str> {
        match self {
            MergeOutcome::Merged(_) => None,
            MergeOutcome::Fallback { keyword, .. } => Some(keyword),
        }
    }
}

/// Keyword that could not be reconciled.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Conflict(String);

impl Conflict {
    fn on(keyword: &str) -> Self {
        Conflict(keyword.to_string())
    }
}

type MergeResult<T> = Result<T, Conflict>;

/// Merge every schema in `schemas` into one.
///
/// An empty input yields the empty (accept-everything) schema.
pub fn merge_schemas(schemas: &[Value]) -> MergeOutcome {
    let mut iter = schemas.iter().cloned();
    let Some(mut acc) = iter.next() else {
        return MergeOutcome::Merged(Value::Object(Map::new()));
    };
    for overlay in iter {
        match merge_two(acc, overlay) {
            Ok(merged) => acc = merged,
            Err(Conflict(keyword)) => {
                return MergeOutcome::Fallback {
                    schema: serde_json::json!({ "allOf": schemas }),
                    keyword,
                }
            }
        }
    }
    MergeOutcome::Merged(acc)
}

// ---------------------------------------------------------------------------
// Pairwise merge
// ---------------------------------------------------------------------------

/// Merge two schemas.
fn merge_two(base: Value, overlay: Value) -> MergeResult<Value> {
    // Boolean schema `false` is the "impossible" schema and absorbs everything.
    if base == Value::Bool(false) || overlay == Value::Bool(false) {
        return Ok(Value::Bool(false));
    }
    if base == overlay {
        return Ok(base);
    }
    let base_obj = match base {
        Value::Object(m) => m,
        _ => return Ok(overlay),
    };
    let mut overlay_obj = match overlay {
        Value::Object(m) => m,
        _ => return Ok(Value::Object(base_obj)),
    };
    if base_obj.is_empty() {
        return Ok(Value::Object(overlay_obj));
    }

    let mut result = base_obj;

    // Properties and array shapes depend on sibling keywords, so they are
    // merged from whole-schema views before the keyword loop.
    let base_view = result.clone();
    let overlay_view = overlay_obj.clone();
    merge_object_shape(&mut result, &base_view, &overlay_view)?;
    merge_array_shape(&mut result, &base_view, &overlay_view)?;
    for keyword in [
        "properties",
        "patternProperties",
        "additionalProperties",
        "items",
        "additionalItems",
    ] {
        overlay_obj.remove(keyword);
    }

    for (k, v) in overlay_obj {
        if result.get(&k) == Some(&v) {
            continue;
        }
        match k.as_str() {
            "required" => merge_required(&mut result, v),
            "type" => intersect_type(&mut result, v)?,
            "enum" | "anyOf" | "oneOf" => intersect_values(&mut result, &k, v)?,
            "allOf" => concat_all_of(&mut result, v),
            "description" => merge_description(&mut result, v),
            "minimum" | "exclusiveMinimum" | "minLength" | "minItems" | "minProperties" => {
                tighten_min(&mut result, &k, v)
            }
            "maximum" | "exclusiveMaximum" | "maxLength" | "maxItems" | "maxProperties" => {
                tighten_max(&mut result, &k, v)
            }
            "multipleOf" => merge_multiple_of(&mut result, v)?,
            "uniqueItems" => {
                let strict = v.as_bool().unwrap_or(false)
                    || result.get(&k).and_then(Value::as_bool).unwrap_or(false);
                result.insert(k, Value::Bool(strict));
            }
            "propertyNames" => merge_nested(&mut result, &k, v)?,
            "definitions" | "$defs" => merge_schema_map(&mut result, &k, v)?,
            "dependencies" => merge_dependencies(&mut result, v)?,
            "not" => merge_not(&mut result, v),
            // Constraints that only survive when every fragment agrees.
            "$ref" | "const" | "pattern" | "format" | "contains" | "if" | "then" | "else" => {
                if result.contains_key(&k) {
                    return Err(Conflict::on(&k));
                }
                result.insert(k, v);
            }
            _ if is_annotation(&k) => {
                result.insert(k, v);
            }
            // Unknown keywords are kept as-is from one side, but two
            // different values cannot be combined.
            _ => {
                if result.contains_key(&k) {
                    return Err(Conflict::on(&k));
                }
                result.insert(k, v);
            }
        }
    }

    // A branch without its own `if` would be captured by the other side's.
    let orphan_branch = |with_if: &Map<String, Value>, without: &Map<String, Value>| {
        with_if.contains_key("if")
            && !without.contains_key("if")
            && (without.contains_key("then") || without.contains_key("else"))
    };
    if orphan_branch(&base_view, &overlay_view) || orphan_branch(&overlay_view, &base_view) {
        return Err(Conflict::on("if"));
    }

    Ok(Value::Object(result))
}

/// Keywords that describe rather than constrain; the last fragment wins.
fn is_annotation(keyword: &str) -> bool {
    matches!(
        keyword,
        "title"
            | "default"
            | "examples"
            | "readOnly"
            | "writeOnly"
            | "deprecated"
            | "$comment"
            | "$id"
            | "id"
            | "$schema"
            | "contentMediaType"
            | "contentEncoding"
            | "enumNames"
    ) || keyword.starts_with("x-")
        || keyword.starts_with("ui:")
}

/// Merge a single nested schema keyword (e.g. `propertyNames`).
fn merge_nested(result: &mut Map<String, Value>, key: &str, overlay_val: Value) -> MergeResult<()> {
    let merged = match result.remove(key) {
        Some(existing) => merge_two(existing, overlay_val)?,
        None => overlay_val,
    };
    result.insert(key.to_string(), merged);
    Ok(())
}

// ---------------------------------------------------------------------------
// Object shape: properties / patternProperties / additionalProperties
// ---------------------------------------------------------------------------

/// The schema one side applies to a property it does not declare.
///
/// `None` means "anything goes" (absent or `true`).
fn undeclared_property_schema(side: &Map<String, Value>) -> Option<&Value> {
    match side.get("additionalProperties") {
        None | Some(Value::Bool(true)) => None,
        Some(other) => Some(other),
    }
}

fn merge_object_shape(
    result: &mut Map<String, Value>,
    base: &Map<String, Value>,
    overlay: &Map<String, Value>,
) -> MergeResult<()> {
    let base_props = base.get("properties").and_then(Value::as_object);
    let overlay_props = overlay.get("properties").and_then(Value::as_object);
    let base_patterns = base.get("patternProperties").and_then(Value::as_object);
    let overlay_patterns = overlay.get("patternProperties").and_then(Value::as_object);
    let base_extra = undeclared_property_schema(base);
    let overlay_extra = undeclared_property_schema(overlay);

    // Pattern matching across sides would need regex semantics here.
    let patterns_differ = base_patterns != overlay_patterns
        && base_patterns.is_some_and(|p| !p.is_empty())
        && overlay_patterns.is_some_and(|p| !p.is_empty());
    if (base_patterns.is_some_and(|p| !p.is_empty()) && overlay_extra.is_some())
        || (overlay_patterns.is_some_and(|p| !p.is_empty()) && base_extra.is_some())
        || patterns_differ
    {
        return Err(Conflict::on("patternProperties"));
    }

    if base_props.is_some() || overlay_props.is_some() {
        let mut merged = Map::new();
        let empty = Map::new();
        let base_props = base_props.unwrap_or(&empty);
        let overlay_props = overlay_props.unwrap_or(&empty);
        for (key, schema) in base_props {
            let combined = match overlay_props.get(key) {
                Some(other) => merge_two(schema.clone(), other.clone())?,
                None => match overlay_extra {
                    Some(extra) => merge_two(schema.clone(), extra.clone())?,
                    None => schema.clone(),
                },
            };
            merged.insert(key.clone(), combined);
        }
        for (key, schema) in overlay_props {
            if base_props.contains_key(key) {
                continue;
            }
            let combined = match base_extra {
                Some(extra) => merge_two(extra.clone(), schema.clone())?,
                None => schema.clone(),
            };
            merged.insert(key.clone(), combined);
        }
        result.insert("properties".to_string(), Value::Object(merged));
    }

    if let Some(patterns) = overlay_patterns {
        if base_patterns.is_none() {
            result.insert(
                "patternProperties".to_string(),
                Value::Object(patterns.clone()),
            );
        }
    }

    merge_additional_properties(
        result,
        base.get("additionalProperties"),
        overlay.get("additionalProperties"),
    )
}

/// Strictness intersection for `additionalProperties`.
///
/// - `false` + anything → `false`
/// - `true` / absent + x → x
/// - schema + schema → recursive merge
fn merge_additional_properties(
    result: &mut Map<String, Value>,
    base: Option<&Value>,
    overlay: Option<&Value>,
) -> MergeResult<()> {
    let merged = match (base, overlay) {
        (_, None) => return Ok(()),
        (None, Some(o)) => o.clone(),
        (Some(Value::Bool(false)), _) | (_, Some(Value::Bool(false))) => Value::Bool(false),
        (Some(Value::Bool(true)), Some(o)) => o.clone(),
        (Some(b), Some(Value::Bool(true))) => b.clone(),
        (Some(b), Some(o)) => merge_two(b.clone(), o.clone())?,
    };
    result.insert("additionalProperties".to_string(), merged);
    Ok(())
}

// ---------------------------------------------------------------------------
// Array shape: items / additionalItems
// ---------------------------------------------------------------------------

/// The item schema one side applies beyond its tuple positions.
fn tail_schema(side: &Map<String, Value>) -> Option<&Value> {
    match side.get("items") {
        Some(Value::Array(_)) => match side.get("additionalItems") {
            None | Some(Value::Bool(true)) => None,
            Some(other) => Some(other),
        },
        Some(Value::Bool(true)) | None => None,
        Some(other) => Some(other),
    }
}

fn merge_array_shape(
    result: &mut Map<String, Value>,
    base: &Map<String, Value>,
    overlay: &Map<String, Value>,
) -> MergeResult<()> {
    // `additionalItems` without `items` constrains nothing.
    let (base_items, overlay_items) = match (base.get("items"), overlay.get("items")) {
        (_, None) => return Ok(()),
        (None, Some(items)) => {
            result.remove("additionalItems");
            result.insert("items".to_string(), items.clone());
            if let Some(extra) = overlay.get("additionalItems") {
                result.insert("additionalItems".to_string(), extra.clone());
            }
            return Ok(());
        }
        (Some(a), Some(b)) => (a, b),
    };

    match (base_items, overlay_items) {
        (Value::Array(a), Value::Array(b)) => {
            let len = a.len().max(b.len());
            let mut tuple = Vec::with_capacity(len);
            let mut truncated = false;
            for i in 0..len {
                let left = a.get(i).or(tail_schema(base));
                let right = b.get(i).or(tail_schema(overlay));
                let merged = match (left, right) {
                    (Some(l), Some(r)) => merge_two(l.clone(), r.clone())?,
                    (Some(only), None) | (None, Some(only)) => only.clone(),
                    (None, None) => Value::Object(Map::new()),
                };
                if merged == Value::Bool(false) {
                    // No value can occupy this position, so none can follow it.
                    truncated = true;
                    break;
                }
                tuple.push(merged);
            }
            result.insert("items".to_string(), Value::Array(tuple));
            let tail = if truncated {
                Value::Bool(false)
            } else {
                match (tail_schema(base), tail_schema(overlay)) {
                    (Some(l), Some(r)) => merge_two(l.clone(), r.clone())?,
                    (Some(only), None) | (None, Some(only)) => only.clone(),
                    (None, None) => {
                        result.remove("additionalItems");
                        return Ok(());
                    }
                }
            };
            result.insert("additionalItems".to_string(), tail);
        }
        (Value::Array(tuple), single) | (single, Value::Array(tuple)) => {
            // Broadcast the single-schema form into every tuple position.
            let tuple_side = if base_items.is_array() { base } else { overlay };
            let broadcast = tuple
                .iter()
                .map(|item| merge_two(item.clone(), single.clone()))
                .collect::<MergeResult<Vec<_>>>()?;
            result.insert("items".to_string(), Value::Array(broadcast));
            let tail = match tail_schema(tuple_side) {
                Some(extra) => merge_two(extra.clone(), single.clone())?,
                None => single.clone(),
            };
            result.insert("additionalItems".to_string(), tail);
        }
        (a, b) => {
            let merged = merge_two(a.clone(), b.clone())?;
            result.insert("items".to_string(), merged);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Merge helpers
// ---------------------------------------------------------------------------

/// Merge a map of named schemas key by key.
fn merge_schema_map(
    result: &mut Map<String, Value>,
    key: &str,
    overlay_val: Value,
) -> MergeResult<()> {
    let Value::Object(overlay_map) = overlay_val else {
        return Err(Conflict::on(key));
    };
    let base = result
        .entry(key)
        .or_insert_with(|| Value::Object(Map::new()));
    let Some(base_map) = base.as_object_mut() else {
        return Err(Conflict::on(key));
    };
    for (name, schema) in overlay_map {
        let merged = match base_map.remove(&name) {
            Some(existing) => merge_two(existing, schema)?,
            None => schema,
        };
        base_map.insert(name, merged);
    }
    Ok(())
}

/// `dependencies`: property lists union, schemas merge, mixed forms conflict.
fn merge_dependencies(result: &mut Map<String, Value>, overlay_val: Value) -> MergeResult<()> {
    let Value::Object(overlay_map) = overlay_val else {
        return Err(Conflict::on("dependencies"));
    };
    let base = result
        .entry("dependencies")
        .or_insert_with(|| Value::Object(Map::new()));
    let Some(base_map) = base.as_object_mut() else {
        return Err(Conflict::on("dependencies"));
    };
    for (name, dep) in overlay_map {
        let merged = match (base_map.remove(&name), dep) {
            (None, dep) => dep,
            (Some(Value::Array(mut a)), Value::Array(b)) => {
                for item in b {
                    if !a.contains(&item) {
                        a.push(item);
                    }
                }
                Value::Array(a)
            }
            (Some(a @ Value::Object(_)), b @ Value::Object(_)) => merge_two(a, b)?,
            _ => return Err(Conflict::on("dependencies")),
        };
        base_map.insert(name, merged);
    }
    Ok(())
}

/// Union `required` arrays (deduplicated).
fn merge_required(result: &mut Map<String, Value>, overlay_val: Value) {
    let Value::Array(overlay_arr) = overlay_val else {
        return;
    };
    let base_req = result
        .entry("required")
        .or_insert_with(|| Value::Array(Vec::new()));
    let Some(base_arr) = base_req.as_array_mut() else {
        return;
    };
    let mut seen: HashSet<String> = base_arr
        .iter()
        .filter_map(|v| v.as_str().map(String::from))
        .collect();
    for item in overlay_arr {
        if let Some(s) = item.as_str() {
            if seen.insert(s.to_string()) {
                base_arr.push(item);
            }
        }
    }
}

/// Intersect `type` with subtype awareness.
fn intersect_type(result: &mut Map<String, Value>, overlay_val: Value) -> MergeResult<()> {
    let Some(existing) = result.get("type") else {
        result.insert("type".to_string(), overlay_val);
        return Ok(());
    };

    let base_types = type_to_list(existing);
    let overlay_types = type_to_list(&overlay_val);
    if base_types.is_empty() || overlay_types.is_empty() {
        return Err(Conflict::on("type"));
    }

    // "integer" satisfies "number"; keep the narrower name when both survive.
    let intersection: Vec<String> = base_types
        .iter()
        .filter_map(|b| {
            overlay_types.iter().find_map(|o| match (b.as_str(), o.as_str()) {
                (x, y) if x == y => Some(x.to_string()),
                ("number", "integer") | ("integer", "number") => Some("integer".to_string()),
                _ => None,
            })
        })
        .fold(Vec::new(), |mut acc, t| {
            if !acc.contains(&t) {
                acc.push(t);
            }
            acc
        });

    match intersection.len() {
        0 => Err(Conflict::on("type")),
        1 => {
            result.insert("type".to_string(), Value::String(intersection[0].clone()));
            Ok(())
        }
        _ => {
            let arr = intersection.into_iter().map(Value::String).collect();
            result.insert("type".to_string(), Value::Array(arr));
            Ok(())
        }
    }
}

/// Intersect `enum` / `anyOf` / `oneOf` by structural equality.
fn intersect_values(
    result: &mut Map<String, Value>,
    key: &str,
    overlay_val: Value,
) -> MergeResult<()> {
    let Value::Array(overlay_arr) = overlay_val else {
        return Err(Conflict::on(key));
    };
    let Some(existing) = result.get(key) else {
        result.insert(key.to_string(), Value::Array(overlay_arr));
        return Ok(());
    };
    let Value::Array(base_arr) = existing else {
        return Err(Conflict::on(key));
    };
    let intersection: Vec<Value> = base_arr
        .iter()
        .filter(|v| overlay_arr.contains(v))
        .cloned()
        .collect();
    if intersection.is_empty() {
        return Err(Conflict::on(key));
    }
    result.insert(key.to_string(), Value::Array(intersection));
    Ok(())
}

fn concat_all_of(result: &mut Map<String, Value>, overlay_val: Value) {
    let Value::Array(overlay_arr) = overlay_val else {
        return;
    };
    match result.get_mut("allOf") {
        Some(Value::Array(base_arr)) => base_arr.extend(overlay_arr),
        _ => {
            result.insert("allOf".to_string(), Value::Array(overlay_arr));
        }
    }
}

/// `not A` and `not B` → `not (A or B)`.
fn merge_not(result: &mut Map<String, Value>, overlay_val: Value) {
    let merged = match result.remove("not") {
        None => overlay_val,
        Some(Value::Object(mut existing))
            if existing.len() == 1 && existing.get("anyOf").is_some_and(Value::is_array) =>
        {
            if let Some(Value::Array(branches)) = existing.get_mut("anyOf") {
                branches.push(overlay_val);
            }
            Value::Object(existing)
        }
        Some(existing) => serde_json::json!({ "anyOf": [existing, overlay_val] }),
    };
    result.insert("not".to_string(), merged);
}

/// Concatenate `description` with newline separator.
fn merge_description(result: &mut Map<String, Value>, overlay_val: Value) {
    if let Some(existing) = result.get("description") {
        if let (Some(base_str), Some(overlay_str)) = (existing.as_str(), overlay_val.as_str()) {
            let combined = format!("{}\n{}", base_str, overlay_str);
            result.insert("description".to_string(), Value::String(combined));
            return;
        }
    }
    result.insert("description".to_string(), overlay_val);
}

/// Tighten a minimum-like bound: max of all values.
fn tighten_min(result: &mut Map<String, Value>, key: &str, overlay_val: Value) {
    if let Some(existing) = result.get(key) {
        if let (Some(base_f), Some(overlay_f)) = (existing.as_f64(), overlay_val.as_f64()) {
            if overlay_f > base_f {
                result.insert(key.to_string(), overlay_val);
            }
            return;
        }
    }
    result.insert(key.to_string(), overlay_val);
}

/// Tighten a maximum-like bound: min of all values.
fn tighten_max(result: &mut Map<String, Value>, key: &str, overlay_val: Value) {
    if let Some(existing) = result.get(key) {
        if let (Some(base_f), Some(overlay_f)) = (existing.as_f64(), overlay_val.as_f64()) {
            if overlay_f < base_f {
                result.insert(key.to_string(), overlay_val);
            }
            return;
        }
    }
    result.insert(key.to_string(), overlay_val);
}

/// `multipleOf`: least common multiple.
///
/// Integers use gcd; other numbers merge only when one divides the other.
fn merge_multiple_of(result: &mut Map<String, Value>, overlay_val: Value) -> MergeResult<()> {
    let Some(existing) = result.get("multipleOf") else {
        result.insert("multipleOf".to_string(), overlay_val);
        return Ok(());
    };
    if let (Some(a), Some(b)) = (existing.as_u64(), overlay_val.as_u64()) {
        if a > 0 && b > 0 {
            let lcm = a / gcd(a, b) * b;
            result.insert("multipleOf".to_string(), Value::Number(Number::from(lcm)));
            return Ok(());
        }
    }
    let (Some(a), Some(b)) = (existing.as_f64(), overlay_val.as_f64()) else {
        return Err(Conflict::on("multipleOf"));
    };
    let (small, large) = if a <= b { (a, b) } else { (b, a) };
    let ratio = large / small;
    if small > 0.0 && (ratio - ratio.round()).abs() < 1e-9 {
        let keep = if a >= b { existing.clone() } else { overlay_val };
        result.insert("multipleOf".to_string(), keep);
        Ok(())
    } else {
        Err(Conflict::on("multipleOf"))
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

// ---------------------------------------------------------------------------
// Utilities
// ---------------------------------------------------------------------------

/// Extract all type strings for intersection logic.
fn type_to_list(val: &Value) -> Vec<String> {
    match val {
        Value::String(s) => vec![s.clone()],
        Value::Array(arr) => arr
            .iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect(),
        _ => Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn merged(schemas: &[Value]) -> Value {
        match merge_schemas(schemas) {
            MergeOutcome::Merged(schema) => schema,
            other => panic!("expected a structural merge, got {:?}", other),
        }
    }

    fn conflict(schemas: &[Value]) -> String {
        match merge_schemas(schemas) {
            MergeOutcome::Fallback { schema, keyword } => {
                assert_eq!(schema, json!({ "allOf": schemas }));
                keyword
            }
            other => panic!("expected an allOf fallback, got {:?}", other),
        }
    }

    // -----------------------------------------------------------------------
    // 1. Simple two-schema merge (base + extension)
    // -----------------------------------------------------------------------
    #[test]
    fn test_simple_merge() {
        let output = merged(&[
            json!({
                "type": "object",
                "properties": { "id": { "type": "string" } },
                "required": ["id"]
            }),
            json!({
                "type": "object",
                "properties": { "name": { "type": "string" } },
                "required": ["name"]
            }),
        ]);

        assert_eq!(output["type"], "object");
        assert_eq!(output["properties"]["id"], json!({"type": "string"}));
        assert_eq!(output["properties"]["name"], json!({"type": "string"}));
        assert_eq!(output["required"], json!(["id", "name"]));
    }

    // -----------------------------------------------------------------------
    // 2. Shared-key recursive merge with tightened bounds
    // -----------------------------------------------------------------------
    #[test]
    fn test_shared_key_recursive_merge() {
        let output = merged(&[
            json!({ "properties": { "age": { "type": "number", "minimum": 0, "maximum": 200 } } }),
            json!({ "properties": { "age": { "type": "integer", "minimum": 18, "maximum": 150 } } }),
        ]);
        assert_eq!(
            output["properties"]["age"],
            json!({ "type": "integer", "minimum": 18, "maximum": 150 })
        );
    }

    // -----------------------------------------------------------------------
    // 3. Type intersection keeps array form for several survivors
    // -----------------------------------------------------------------------
    #[test]
    fn test_type_intersection() {
        let output = merged(&[
            json!({ "type": ["string", "number", "null"] }),
            json!({ "type": ["integer", "string", "null"] }),
        ]);
        assert_eq!(output["type"], json!(["string", "integer", "null"]));

        assert_eq!(
            conflict(&[json!({ "type": "string" }), json!({ "type": "boolean" })]),
            "type"
        );
    }

    // -----------------------------------------------------------------------
    // 4. multipleOf takes the least common multiple
    // -----------------------------------------------------------------------
    #[test]
    fn test_multiple_of_lcm() {
        assert_eq!(
            merged(&[json!({ "multipleOf": 4 }), json!({ "multipleOf": 6 })]),
            json!({ "multipleOf": 12 })
        );
        assert_eq!(
            merged(&[json!({ "multipleOf": 0.5 }), json!({ "multipleOf": 1.5 })]),
            json!({ "multipleOf": 1.5 })
        );
        assert_eq!(
            conflict(&[json!({ "multipleOf": 0.3 }), json!({ "multipleOf": 0.7 })]),
            "multipleOf"
        );
    }

    // -----------------------------------------------------------------------
    // 5. enum / oneOf intersect structurally
    // -----------------------------------------------------------------------
    #[test]
    fn test_enum_intersection() {
        assert_eq!(
            merged(&[json!({ "enum": ["a", "b", {"x": 1}] }), json!({ "enum": [{"x": 1}, "b", "c"] })]),
            json!({ "enum": ["b", {"x": 1}] })
        );
        assert_eq!(
            conflict(&[json!({ "enum": ["a"] }), json!({ "enum": ["b"] })]),
            "enum"
        );
    }

    // -----------------------------------------------------------------------
    // 6. Differing $ref / const / pattern fall back to allOf
    // -----------------------------------------------------------------------
    #[test]
    fn test_irreconcilable_keywords_fall_back() {
        assert_eq!(
            conflict(&[json!({ "$ref": "#/definitions/a" }), json!({ "$ref": "#/definitions/b" })]),
            "$ref"
        );
        assert_eq!(conflict(&[json!({ "const": 1 }), json!({ "const": 2 })]), "const");
        assert_eq!(
            conflict(&[json!({ "pattern": "^a" }), json!({ "pattern": "b$" })]),
            "pattern"
        );
        // Identical values are not conflicts.
        assert_eq!(
            merged(&[json!({ "$ref": "#/x", "title": "A" }), json!({ "$ref": "#/x" })]),
            json!({ "$ref": "#/x", "title": "A" })
        );
    }

    // -----------------------------------------------------------------------
    // 7. additionalProperties applies to the other side's undeclared keys
    // -----------------------------------------------------------------------
    #[test]
    fn test_additional_properties_constrain_foreign_properties() {
        let output = merged(&[
            json!({ "properties": { "a": { "type": "string" } }, "additionalProperties": { "type": "integer" } }),
            json!({ "properties": { "b": { "minimum": 3 } } }),
        ]);
        assert_eq!(output["properties"]["b"], json!({ "type": "integer", "minimum": 3 }));
        assert_eq!(output["additionalProperties"], json!({ "type": "integer" }));

        let closed = merged(&[
            json!({ "properties": { "a": {} }, "additionalProperties": false }),
            json!({ "properties": { "b": { "type": "string" } } }),
        ]);
        assert_eq!(closed["properties"]["b"], json!(false));
        assert_eq!(closed["additionalProperties"], json!(false));
    }

    // -----------------------------------------------------------------------
    // 8. items: tuple ∧ tuple, tuple ∧ single, single ∧ single
    // -----------------------------------------------------------------------
    #[test]
    fn test_items_tuple_and_tuple() {
        let output = merged(&[
            json!({ "items": [{ "type": "string" }], "additionalItems": { "type": "number" } }),
            json!({ "items": [{ "maxLength": 3 }, { "maximum": 10 }, { "minimum": 0 }] }),
        ]);
        assert_eq!(
            output["items"],
            json!([
                { "type": "string", "maxLength": 3 },
                { "type": "number", "maximum": 10 },
                { "type": "number", "minimum": 0 }
            ])
        );
        assert_eq!(output["additionalItems"], json!({ "type": "number" }));
    }

    #[test]
    fn test_items_tuple_closed_tail_drops_positions() {
        let output = merged(&[
            json!({ "items": [{ "type": "string" }], "additionalItems": false }),
            json!({ "items": [{}, { "type": "number" }] }),
        ]);
        assert_eq!(output["items"], json!([{ "type": "string" }]));
        assert_eq!(output["additionalItems"], json!(false));
    }

    #[test]
    fn test_items_single_broadcasts_into_tuple() {
        let output = merged(&[
            json!({ "items": [{ "type": "string" }, { "type": "string" }] }),
            json!({ "items": { "minLength": 1 } }),
        ]);
        assert_eq!(
            output["items"],
            json!([
                { "type": "string", "minLength": 1 },
                { "type": "string", "minLength": 1 }
            ])
        );
        assert_eq!(output["additionalItems"], json!({ "minLength": 1 }));
    }

    // -----------------------------------------------------------------------
    // 9. not combines into a disjunction
    // -----------------------------------------------------------------------
    #[test]
    fn test_not_disjunction() {
        let output = merged(&[
            json!({ "not": { "const": 1 } }),
            json!({ "not": { "const": 2 } }),
            json!({ "not": { "const": 3 } }),
        ]);
        assert_eq!(
            output["not"],
            json!({ "anyOf": [{ "const": 1 }, { "const": 2 }, { "const": 3 }] })
        );
    }

    // -----------------------------------------------------------------------
    // 10. Boolean schemas
    // -----------------------------------------------------------------------
    #[test]
    fn test_false_absorbs_true_is_identity() {
        assert_eq!(merged(&[json!({ "type": "string" }), json!(false)]), json!(false));
        assert_eq!(
            merged(&[json!(true), json!({ "type": "string" })]),
            json!({ "type": "string" })
        );
        assert_eq!(merged(&[]), json!({}));
    }

    // -----------------------------------------------------------------------
    // 11. Annotations take the last value; unknown constraints must agree
    // -----------------------------------------------------------------------
    #[test]
    fn test_unknown_keywords_do_not_overwrite() {
        assert_eq!(
            merged(&[json!({ "title": "A", "x-hint": 1 }), json!({ "title": "B", "x-hint": 2 })]),
            json!({ "title": "B", "x-hint": 2 })
        );
        assert_eq!(
            merged(&[json!({ "minContains": 2 }), json!({ "type": "array" })]),
            json!({ "minContains": 2, "type": "array" })
        );
        assert_eq!(
            conflict(&[
                json!({ "dependentRequired": { "a": ["b"] } }),
                json!({ "dependentRequired": { "c": ["d"] } }),
            ]),
            "dependentRequired"
        );
        assert_eq!(
            conflict(&[json!({ "prefixItems": [{ "type": "string" }] }), json!({ "prefixItems": [] })]),
            "prefixItems"
        );
    }
}
