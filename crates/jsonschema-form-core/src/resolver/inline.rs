//! Stack-guarded `$ref` inlining.
//!
//! Walks the raw schema and emits the compiled schema:
//! - non-recursive `$ref`s are replaced by a walked copy of their target,
//!   merged with any sibling keywords
//! - a `$ref` whose target is already being expanded on the current path
//!   becomes `{"$ref": "#<compiled location>"}`
//! - `definitions` / `$defs` are dropped
//! - `allOf` is folded into its parent through the merger
//! - array-level `required` lists are moved onto the item schema

use serde_json::{Map, Value};

use super::graph::RefGraph;
use crate::config::CompileOptions;
use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::error::CompileError;
use crate::merge::{merge_schemas, MergeOutcome};
use crate::pointer::{self, Pointer};
use crate::schema_utils::{child_schemas, schema_type};

const DEFINITION_KEYWORDS: &[&str] = &["definitions", "$defs"];

pub(crate) struct Inliner<'a> {
    root: &'a Value,
    graph: &'a RefGraph,
    config: &'a CompileOptions,
    /// Cyclic raw targets being expanded on the current path, with the
    /// compiled location each one was emitted at.
    stack: Vec<(Pointer, Pointer)>,
    pub diagnostics: Vec<Diagnostic>,
}

impl<'a> Inliner<'a> {
    pub fn new(root: &'a Value, graph: &'a RefGraph, config: &'a CompileOptions) -> Self {
        Self {
            root,
            graph,
            config,
            stack: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn run(&mut self) -> Result<Value, CompileError> {
        let root = self.root;
        self.walk(root, &Pointer::root(), &Pointer::root(), 0)
    }

    /// Walk the raw node at `raw`, which is emitted at compiled location `out`.
    fn walk(
        &mut self,
        node: &Value,
        raw: &Pointer,
        out: &Pointer,
        depth: usize,
    ) -> Result<Value, CompileError> {
        if depth > self.config.max_depth {
            return Err(CompileError::RecursionDepthExceeded {
                path: raw.to_string(),
                max_depth: self.config.max_depth,
            });
        }
        if !node.is_object() {
            return Ok(node.clone());
        }

        let pushed = self.graph.is_cyclic(raw);
        if pushed {
            self.stack.push((raw.clone(), out.clone()));
        }
        let result = match node.get("$ref").and_then(Value::as_str) {
            Some(_) => self.walk_ref(node, raw, out, depth),
            None => self.walk_object(node, raw, out, depth),
        };
        if pushed {
            self.stack.pop();
        }
        result
    }

    fn walk_ref(
        &mut self,
        node: &Value,
        raw: &Pointer,
        out: &Pointer,
        depth: usize,
    ) -> Result<Value, CompileError> {
        let target = self
            .graph
            .target(raw)
            .cloned()
            .ok_or_else(|| CompileError::Internal {
                path: raw.to_string(),
                message: "$ref was not collected during the edge scan".to_string(),
            })?;

        let mut siblings = node.clone();
        if let Some(obj) = siblings.as_object_mut() {
            obj.remove("$ref");
        }
        let siblings = self.walk_object(&siblings, raw, out, depth)?;
        let has_siblings = siblings.as_object().is_some_and(|obj| !obj.is_empty());

        let recursion_point = self
            .stack
            .iter()
            .rev()
            .find(|(expanding, _)| *expanding == target)
            .map(|(_, location)| location.clone());
        if let Some(location) = recursion_point {
            tracing::debug!(at = %out, target = %location, "recursive $ref kept");
            let mut obj = Map::new();
            obj.insert("$ref".to_string(), Value::String(location.to_fragment()));
            if let Value::Object(rest) = siblings {
                obj.extend(rest);
            }
            return Ok(Value::Object(obj));
        }

        let Some(target_node) = pointer::get(self.root, &target) else {
            return Err(CompileError::UnresolvableRef {
                path: raw.to_string(),
                reference: target.to_fragment(),
            });
        };
        let inlined = self.walk(target_node, &target, out, depth + 1)?;
        if !has_siblings {
            return Ok(inlined);
        }
        Ok(self.combine(out, vec![inlined, siblings]))
    }

    fn walk_object(
        &mut self,
        node: &Value,
        raw: &Pointer,
        out: &Pointer,
        depth: usize,
    ) -> Result<Value, CompileError> {
        let mut result = node.clone();
        if let Some(obj) = result.as_object_mut() {
            for keyword in DEFINITION_KEYWORDS {
                obj.shift_remove(*keyword);
            }
        }
        for (keys, child) in child_schemas(node) {
            if DEFINITION_KEYWORDS.contains(&keys[0].as_str()) {
                continue;
            }
            let walked = self.walk(child, &raw.join(&keys), &out.join(&keys), depth + 1)?;
            pointer::set(&mut result, &Pointer::from_keys(keys), walked)?;
        }

        if let Value::Object(mut obj) = result {
            self.fold_all_of(&mut obj, out);
            relocate_array_required(&mut obj);
            return Ok(Value::Object(obj));
        }
        Ok(result)
    }

    /// Merge `allOf` branches into the parent when that is structurally possible.
    fn fold_all_of(&mut self, obj: &mut Map<String, Value>, out: &Pointer) {
        let Some(Value::Array(branches)) = obj.get("allOf") else {
            return;
        };
        // Recursive refs into a branch would dangle once the branch is folded.
        let branch_root = out.child("allOf");
        let mut refs = Vec::new();
        collect_ref_sites(&Value::Array(branches.clone()), &branch_root, &mut refs);
        let dangling = refs.iter().any(|(_, reference)| {
            Pointer::parse(reference).is_ok_and(|target| target.starts_with(&branch_root))
        });
        if dangling {
            return;
        }

        let branches = branches.clone();
        let mut base = obj.clone();
        base.shift_remove("allOf");
        let mut parts = vec![Value::Object(base)];
        parts.extend(branches);
        if let Value::Object(merged) = self.combine(out, parts) {
            *obj = merged;
        }
    }

    fn combine(&mut self, out: &Pointer, parts: Vec<Value>) -> Value {
        match merge_schemas(&parts) {
            MergeOutcome::Merged(schema) => schema,
            MergeOutcome::Fallback { schema, keyword } => {
                self.diagnostics.push(Diagnostic::new(
                    out.clone(),
                    DiagnosticKind::SchemaMergeConflict {
                        keyword: keyword.clone(),
                    },
                    format!("cannot merge \"{}\"; kept as allOf", keyword),
                ));
                schema
            }
        }
    }
}

/// Every `$ref` string below `node`, reached through schema keywords only.
pub(crate) fn collect_ref_sites(node: &Value, path: &Pointer, sites: &mut Vec<(Pointer, String)>) {
    match node {
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                collect_ref_sites(item, &path.child(i.to_string()), sites);
            }
        }
        Value::Object(_) => {
            if let Some(reference) = node.get("$ref").and_then(Value::as_str) {
                sites.push((path.clone(), reference.to_string()));
            }
            for (keys, child) in child_schemas(node) {
                collect_ref_sites(child, &path.join(&keys), sites);
            }
        }
        _ => {}
    }
}

/// Move an array's `required` list onto the item schema it was meant for.
fn relocate_array_required(obj: &mut Map<String, Value>) {
    let is_array = schema_type(&Value::Object(obj.clone())).as_deref() == Some("array");
    let Some(Value::Array(required)) = obj.get("required") else {
        return;
    };
    if !is_array {
        return;
    }
    let has_properties = |key: &str| obj.get(key).is_some_and(|s| s.get("properties").is_some());
    let Some(target) = ["items", "additionalItems"]
        .into_iter()
        .find(|key| has_properties(key))
    else {
        return;
    };
    let item = &obj[target];
    let fits = item.get("required").is_none()
        && (item.get("additionalProperties").is_some()
            || required.iter().all(|key| {
                key.as_str()
                    .is_some_and(|k| item["properties"].get(k).is_some())
            }));
    if !fits {
        return;
    }
    if let Some(required) = obj.shift_remove("required") {
        if let Some(Value::Object(item)) = obj.get_mut(target) {
            item.insert("required".to_string(), required);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::engine::ResolverEngine;
    use serde_json::json;

    fn inline(schema: &Value) -> (Value, Vec<Diagnostic>) {
        let config = CompileOptions::default();
        let engine = ResolverEngine::new(schema).unwrap();
        let graph = RefGraph::build(schema, &engine, &config).unwrap();
        let mut inliner = Inliner::new(schema, &graph, &config);
        let compiled = inliner.run().unwrap();
        (compiled, inliner.diagnostics)
    }

    #[test]
    fn test_non_recursive_ref_inlined_and_definitions_dropped() {
        let (compiled, _) = inline(&json!({
            "definitions": { "name": { "type": "string", "minLength": 1 } },
            "type": "object",
            "properties": { "first": { "$ref": "#/definitions/name", "title": "First" } }
        }));
        assert_eq!(
            compiled,
            json!({
                "type": "object",
                "properties": {
                    "first": { "type": "string", "minLength": 1, "title": "First" }
                }
            })
        );
    }

    #[test]
    fn test_self_reference_points_at_compiled_location() {
        let (compiled, _) = inline(&json!({
            "definitions": {
                "node": {
                    "type": "object",
                    "properties": {
                        "children": { "type": "array", "items": { "$ref": "#/definitions/node" } }
                    }
                }
            },
            "$ref": "#/definitions/node"
        }));
        assert_eq!(
            compiled,
            json!({
                "type": "object",
                "properties": {
                    "children": { "type": "array", "items": { "$ref": "#" } }
                }
            })
        );
    }

    #[test]
    fn test_all_of_folded() {
        let (compiled, diagnostics) = inline(&json!({
            "type": "object",
            "allOf": [
                { "properties": { "a": { "type": "string" } }, "required": ["a"] },
                { "properties": { "b": { "type": "number" } } }
            ]
        }));
        assert!(diagnostics.is_empty());
        assert!(compiled.get("allOf").is_none());
        assert_eq!(compiled["required"], json!(["a"]));
        assert_eq!(compiled["properties"]["b"], json!({ "type": "number" }));
    }

    #[test]
    fn test_all_of_conflict_kept_with_diagnostic() {
        let (compiled, diagnostics) = inline(&json!({
            "allOf": [{ "pattern": "^a" }, { "pattern": "b$" }]
        }));
        assert_eq!(compiled["allOf"].as_array().map(Vec::len), Some(2));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].kind,
            DiagnosticKind::SchemaMergeConflict {
                keyword: "pattern".to_string()
            }
        );
    }

    #[test]
    fn test_array_required_relocated() {
        let (compiled, _) = inline(&json!({
            "type": "array",
            "required": ["name"],
            "items": { "type": "object", "properties": { "name": { "type": "string" } } }
        }));
        assert!(compiled.get("required").is_none());
        assert_eq!(compiled["items"]["required"], json!(["name"]));
    }

    #[test]
    fn test_array_required_left_when_keys_unknown() {
        let (compiled, _) = inline(&json!({
            "type": "array",
            "required": ["other"],
            "items": { "properties": { "name": { "type": "string" } } }
        }));
        assert_eq!(compiled["required"], json!(["other"]));
    }
}
