//! Reference resolution: raw schema → compiled schema plus pointer maps.
//!
//! The pass runs in four steps:
//!
//! 1. scan every `$ref` into a `(from, to)` edge ([`graph`])
//! 2. close the edge set to a fixed point to find the cyclic targets
//! 3. rebuild the schema, inlining every `$ref` that is not on a cycle
//!    ([`inline`])
//! 4. read the surviving `$ref`s back as the recursive-reference maps and
//!    check that each one points at a strictly shorter, already emitted
//!    location
//!
//! Arity records and the schema library are derived from the compiled schema.

mod engine;
mod graph;
mod inline;

use serde_json::Value;

use crate::config::CompileOptions;
use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::error::CompileError;
use crate::maps::{ArityMap, RecursiveRefMap, RefLibrary};
use crate::pointer::{self, Pointer};
use crate::schema_utils::{child_schemas, schema_to_data_pointer, schema_type};

use engine::ResolverEngine;
use inline::collect_ref_sites;

/// Output of [`resolve`].
#[derive(Debug, Clone, Default)]
pub struct ResolvedSchema {
    /// The schema with every non-recursive `$ref` inlined and `allOf` folded.
    pub compiled: Value,
    /// Compiled-schema pointer of a recursive `$ref` → its target.
    pub schema_recursive: RecursiveRefMap,
    /// The same links, expressed as generic data pointers.
    pub data_recursive: RecursiveRefMap,
    /// Tuple arity of every array location, keyed by generic data pointer.
    pub arity: ArityMap,
    /// Compiled sub-schema of every recursion target.
    pub schema_library: RefLibrary<Value>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Resolve every `$ref` in `schema`.
///
/// # Errors
///
/// `UnresolvableRef` for refs that leave the document or name a missing
/// location, `RecursionDepthExceeded` past `config.max_depth`, and
/// `Internal` if a surviving `$ref` fails the recursion self-check.
pub fn resolve(schema: &Value, config: &CompileOptions) -> Result<ResolvedSchema, CompileError> {
    let engine = ResolverEngine::new(schema)?;
    let graph = graph::RefGraph::build(schema, &engine, config)?;

    let mut inliner = inline::Inliner::new(schema, &graph, config);
    let compiled = inliner.run()?;
    let mut diagnostics = std::mem::take(&mut inliner.diagnostics);

    let mut sites = Vec::new();
    collect_ref_sites(&compiled, &Pointer::root(), &mut sites);

    let mut schema_recursive = RecursiveRefMap::default();
    let mut data_recursive = RecursiveRefMap::default();
    let mut schema_library = RefLibrary::default();
    for (from, reference) in sites {
        let to = Pointer::parse(&reference)?;
        if !pointer::is_sub_pointer(&to, &from, false) || !pointer::has(&compiled, &to) {
            return Err(CompileError::Internal {
                path: from.to_string(),
                message: format!(
                    "$ref {:?} survived inlining but is not a recursion point",
                    reference
                ),
            });
        }
        schema_recursive.insert(from.clone(), to.clone());

        if schema_library.begin(&to) {
            if let Some(target) = pointer::get(&compiled, &to) {
                schema_library.finish(to.clone(), target.clone());
            }
        }

        match (
            schema_to_data_pointer(&from, &compiled),
            schema_to_data_pointer(&to, &compiled),
        ) {
            (Some(data_from), Some(data_to)) => {
                if !data_recursive.insert(data_from.clone(), data_to) {
                    tracing::debug!(at = %data_from, "recursive $ref does not descend in data; skipped");
                }
            }
            _ => diagnostics.push(Diagnostic::new(
                from.clone(),
                DiagnosticKind::AmbiguousReferenceLocation,
                format!(
                    "recursive $ref to {:?} has no single data location",
                    reference
                ),
            )),
        }
    }
    schema_recursive.shorten();
    data_recursive.shorten();

    let mut arity = ArityMap::default();
    collect_arity(&compiled, &compiled, &Pointer::root(), &mut arity);

    tracing::debug!(
        recursive = schema_recursive.len(),
        arrays = arity.len(),
        "resolved schema references"
    );
    Ok(ResolvedSchema {
        compiled,
        schema_recursive,
        data_recursive,
        arity,
        schema_library,
        diagnostics,
    })
}

fn collect_arity(root: &Value, node: &Value, path: &Pointer, arity: &mut ArityMap) {
    let is_array = node.get("items").is_some() || schema_type(node).as_deref() == Some("array");
    if is_array {
        if let Some(data_pointer) = schema_to_data_pointer(path, root) {
            let tuple = node
                .get("items")
                .and_then(Value::as_array)
                .or_else(|| node.get("prefixItems").and_then(Value::as_array))
                .map_or(0, Vec::len);
            if !arity.contains(&data_pointer) {
                arity.insert(data_pointer, tuple);
            }
        }
    }
    for (keys, child) in child_schemas(node) {
        collect_arity(root, child, &path.join(&keys), arity);
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn p(s: &str) -> Pointer {
        Pointer::parse(s).unwrap()
    }

    fn resolve_default(schema: Value) -> ResolvedSchema {
        resolve(&schema, &CompileOptions::default()).unwrap()
    }

    #[test]
    fn test_self_referential_tree() {
        let resolved = resolve_default(json!({
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
            resolved.schema_recursive.get(&p("/properties/children/items")),
            Some(&Pointer::root())
        );
        assert_eq!(
            resolved.data_recursive.get(&p("/children/-")),
            Some(&Pointer::root())
        );
        assert_eq!(resolved.arity.get(&p("/children")), Some(0));
        assert!(resolved.schema_library.get(&Pointer::root()).is_some());
        assert!(resolved.diagnostics.is_empty());
    }

    #[test]
    fn test_tuple_arity() {
        let resolved = resolve_default(json!({
            "type": "array",
            "items": [{ "type": "string" }],
            "additionalItems": { "type": "number" },
            "minItems": 1,
            "maxItems": 3
        }));
        assert_eq!(resolved.arity.get(&Pointer::root()), Some(1));
        assert_eq!(pointer::to_generic(&p("/1"), &resolved.arity), p("/-"));
        assert_eq!(pointer::to_generic(&p("/0"), &resolved.arity), p("/0"));
        assert!(resolved.schema_recursive.is_empty());
    }

    #[test]
    fn test_mutual_recursion_maps_shorten() {
        let resolved = resolve_default(json!({
            "definitions": {
                "person": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string" },
                        "pets": { "type": "array", "items": { "$ref": "#/definitions/pet" } }
                    }
                },
                "pet": {
                    "type": "object",
                    "properties": { "owner": { "$ref": "#/definitions/person" } }
                }
            },
            "type": "object",
            "properties": { "person": { "$ref": "#/definitions/person" } }
        }));
        let from = p("/properties/person/properties/pets/items/properties/owner");
        assert_eq!(
            resolved.schema_recursive.get(&from),
            Some(&p("/properties/person"))
        );
        assert_eq!(
            resolved.data_recursive.get(&p("/person/pets/-/owner")),
            Some(&p("/person"))
        );
        for (from, to) in resolved.data_recursive.iter() {
            assert!(to.len() < from.len());
        }
    }

    #[test]
    fn test_recursion_under_additional_properties_is_ambiguous() {
        let resolved = resolve_default(json!({
            "type": "object",
            "additionalProperties": { "$ref": "#" }
        }));
        assert_eq!(resolved.diagnostics.len(), 1);
        assert_eq!(
            resolved.diagnostics[0].kind,
            DiagnosticKind::AmbiguousReferenceLocation
        );
        assert_eq!(
            resolved.schema_recursive.get(&p("/additionalProperties")),
            Some(&Pointer::root())
        );
    }

    #[test]
    fn test_unresolvable_ref_is_fatal() {
        let err = resolve(
            &json!({ "properties": { "a": { "$ref": "http://elsewhere.test/x.json" } } }),
            &CompileOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::UnresolvableRef { .. }));
    }
}
