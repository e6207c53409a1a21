//! Draft upgrade: normalizes draft-03/04 syntax to draft-06.
//!
//! Performs, at every schema node:
//!
//! 1. `id` → `$id`
//! 2. boolean `exclusiveMinimum`/`exclusiveMaximum` → numeric form
//! 3. draft-03 `required: true` on a property → parent `required` array
//! 4. `divisibleBy` → `multipleOf`, `extends` → `allOf`, `disallow` → `not`
//! 5. `type: "any"` dropped; draft-03 schema-valued type unions → `anyOf`
//! 6. draft-03 string `dependencies` → one-item arrays
//!
//! The upgrade is idempotent: running it on an already-upgraded schema
//! changes nothing.

use serde_json::{json, Map, Value};

use crate::config::CompileOptions;
use crate::error::CompileError;
use crate::pointer::Pointer;
use crate::schema_utils::recurse_into_children;

const DRAFT_06: &str = "http://json-schema.org/draft-06/schema#";

const LEGACY_META_SCHEMAS: &[&str] = &[
    "http://json-schema.org/draft-03/schema",
    "http://json-schema.org/draft-03/schema#",
    "http://json-schema.org/draft-04/schema",
    "http://json-schema.org/draft-04/schema#",
];

/// Upgrade a draft-03/04 schema to draft-06 syntax.
pub fn upgrade_draft(schema: &Value, config: &CompileOptions) -> Result<Value, CompileError> {
    let mut root = walk(schema.clone(), &Pointer::root(), 0, config)?;
    if let Some(obj) = root.as_object_mut() {
        let legacy = obj
            .get("$schema")
            .and_then(Value::as_str)
            .is_some_and(|uri| LEGACY_META_SCHEMAS.contains(&uri));
        if legacy {
            obj.insert("$schema".to_string(), Value::String(DRAFT_06.to_string()));
        }
    }
    Ok(root)
}

fn walk(
    schema: Value,
    path: &Pointer,
    depth: usize,
    config: &CompileOptions,
) -> Result<Value, CompileError> {
    if depth > config.max_depth {
        return Err(CompileError::RecursionDepthExceeded {
            path: path.to_string(),
            max_depth: config.max_depth,
        });
    }
    let Value::Object(mut obj) = schema else {
        return Ok(schema);
    };

    rename_id(&mut obj);
    rename_keyword(&mut obj, "divisibleBy", "multipleOf");
    upgrade_exclusive_bound(&mut obj, "exclusiveMinimum", "minimum");
    upgrade_exclusive_bound(&mut obj, "exclusiveMaximum", "maximum");
    upgrade_type(&mut obj);
    upgrade_extends(&mut obj);
    upgrade_disallow(&mut obj);
    upgrade_dependencies(&mut obj);
    hoist_property_required(&mut obj);

    recurse_into_children(&mut obj, path, depth, &mut |child, child_path, child_depth| {
        walk(child, child_path, child_depth, config)
    })?;

    Ok(Value::Object(obj))
}

// ---------------------------------------------------------------------------
// Keyword rewrites
// ---------------------------------------------------------------------------

fn rename_id(obj: &mut Map<String, Value>) {
    if obj.contains_key("$id") || !obj.get("id").is_some_and(Value::is_string) {
        return;
    }
    if let Some(id) = obj.remove("id") {
        obj.insert("$id".to_string(), id);
    }
}

fn rename_keyword(obj: &mut Map<String, Value>, from: &str, to: &str) {
    if let Some(value) = obj.remove(from) {
        obj.entry(to).or_insert(value);
    }
}

/// Draft-04 `exclusiveMinimum: true` qualified `minimum`; draft-06 makes the
/// exclusive bound a number of its own.
fn upgrade_exclusive_bound(obj: &mut Map<String, Value>, exclusive: &str, inclusive: &str) {
    let Some(Value::Bool(flag)) = obj.get(exclusive).cloned() else {
        return;
    };
    obj.remove(exclusive);
    if flag {
        if let Some(bound) = obj.remove(inclusive) {
            obj.insert(exclusive.to_string(), bound);
        }
    }
}

fn upgrade_type(obj: &mut Map<String, Value>) {
    match obj.get("type") {
        Some(Value::String(t)) if t == "any" => {
            obj.remove("type");
        }
        Some(Value::Array(types)) => {
            if types.iter().any(|t| t == "any") {
                obj.remove("type");
                return;
            }
            if !types.iter().any(Value::is_object) {
                return;
            }
            // Draft-03 unions may mix type names with schemas.
            let branches: Vec<Value> = types
                .iter()
                .map(|t| match t {
                    Value::String(name) => json!({ "type": name }),
                    other => other.clone(),
                })
                .collect();
            obj.remove("type");
            add_all_of(obj, json!({ "anyOf": branches }));
        }
        _ => {}
    }
}

fn upgrade_extends(obj: &mut Map<String, Value>) {
    match obj.remove("extends") {
        Some(Value::Array(parents)) => {
            for parent in parents {
                add_all_of(obj, parent);
            }
        }
        Some(parent @ Value::Object(_)) => add_all_of(obj, parent),
        Some(other) => {
            obj.insert("extends".to_string(), other);
        }
        None => {}
    }
}

fn upgrade_disallow(obj: &mut Map<String, Value>) {
    let Some(disallowed) = obj.remove("disallow") else {
        return;
    };
    let forbidden = match disallowed {
        Value::String(name) => json!({ "type": name }),
        Value::Array(items) => json!({
            "anyOf": items
                .into_iter()
                .map(|t| match t {
                    Value::String(name) => json!({ "type": name }),
                    other => other,
                })
                .collect::<Vec<_>>()
        }),
        other => other,
    };
    add_all_of(obj, json!({ "not": forbidden }));
}

fn upgrade_dependencies(obj: &mut Map<String, Value>) {
    if let Some(Value::Object(deps)) = obj.get_mut("dependencies") {
        for dep in deps.values_mut() {
            if let Value::String(name) = dep {
                *dep = json!([name.clone()]);
            }
        }
    }
}

/// Move boolean `required` flags from property schemas into the parent array.
fn hoist_property_required(obj: &mut Map<String, Value>) {
    let mut hoisted = Vec::new();
    if let Some(Value::Object(props)) = obj.get_mut("properties") {
        for (name, prop) in props.iter_mut() {
            let Some(prop_obj) = prop.as_object_mut() else {
                continue;
            };
            if let Some(Value::Bool(flag)) = prop_obj.get("required").cloned() {
                prop_obj.remove("required");
                if flag {
                    hoisted.push(Value::String(name.clone()));
                }
            }
        }
    }
    if obj.get("required").is_some_and(Value::is_boolean) {
        // Left over on a node without a parent object; nothing to attach to.
        obj.remove("required");
    }
    if hoisted.is_empty() {
        return;
    }
    let required = obj
        .entry("required")
        .or_insert_with(|| Value::Array(Vec::new()));
    if let Value::Array(list) = required {
        for name in hoisted {
            if !list.contains(&name) {
                list.push(name);
            }
        }
    }
}

fn add_all_of(obj: &mut Map<String, Value>, schema: Value) {
    match obj.get_mut("allOf") {
        Some(Value::Array(list)) => list.push(schema),
        _ => {
            obj.insert("allOf".to_string(), Value::Array(vec![schema]));
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
