//! `$ref` edge collection and cycle detection.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;
use url::Url;

use super::engine::{ResolvedRef, ResolverEngine};
use crate::config::CompileOptions;
use crate::error::CompileError;
use crate::pointer::{self, Pointer};
use crate::schema_utils::child_schemas;

/// One `$ref` link: the node carrying the `$ref` and the node it names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RefEdge {
    pub from: Pointer,
    pub to: Pointer,
}

/// Every `$ref` edge of a document plus the targets that lie on a cycle.
#[derive(Debug, Default)]
pub(crate) struct RefGraph {
    targets: BTreeMap<Pointer, Pointer>,
    cyclic: BTreeSet<Pointer>,
}

impl RefGraph {
    /// Scan `schema` for `$ref` edges and compute which targets are cyclic.
    ///
    /// Fails with `UnresolvableRef` when a target is outside the document or
    /// does not exist.
    pub fn build(
        schema: &Value,
        engine: &ResolverEngine,
        config: &CompileOptions,
    ) -> Result<Self, CompileError> {
        let mut edges = Vec::new();
        let root_base = super::engine::default_base_uri()?;
        collect_edges(schema, schema, engine, &root_base, &Pointer::root(), 0, config, &mut edges)?;

        let cyclic = cyclic_targets(&edges);
        tracing::debug!(
            edges = edges.len(),
            cyclic = cyclic.len(),
            "collected $ref edges"
        );
        Ok(Self {
            targets: edges.into_iter().map(|e| (e.from, e.to)).collect(),
            cyclic,
        })
    }

    /// The resolved target of the `$ref` at `from`.
    pub fn target(&self, from: &Pointer) -> Option<&Pointer> {
        self.targets.get(from)
    }

    /// True if inlining `target` can lead back to `target`.
    pub fn is_cyclic(&self, target: &Pointer) -> bool {
        self.cyclic.contains(target)
    }
}

#[allow(clippy::too_many_arguments)]
fn collect_edges(
    root: &Value,
    node: &Value,
    engine: &ResolverEngine,
    parent_base: &Url,
    path: &Pointer,
    depth: usize,
    config: &CompileOptions,
    edges: &mut Vec<RefEdge>,
) -> Result<(), CompileError> {
    if depth > config.max_depth {
        return Err(CompileError::RecursionDepthExceeded {
            path: path.to_string(),
            max_depth: config.max_depth,
        });
    }
    let base = ResolverEngine::scoped_base(node, parent_base);

    if let Some(reference) = node.get("$ref").and_then(Value::as_str) {
        match engine.resolve(reference, &base) {
            ResolvedRef::Pointer(to) if pointer::has(root, &to) => {
                edges.push(RefEdge {
                    from: path.clone(),
                    to,
                });
            }
            _ => {
                return Err(CompileError::UnresolvableRef {
                    path: path.to_string(),
                    reference: reference.to_string(),
                })
            }
        }
    }

    for (keys, child) in child_schemas(node) {
        collect_edges(
            root,
            child,
            engine,
            &base,
            &path.join(&keys),
            depth + 1,
            config,
            edges,
        )?;
    }
    Ok(())
}

/// Targets from which following `$ref` edges can return to themselves.
///
/// Target `t` directly reaches `t2` when some edge into `t2` starts inside
/// the subtree of `t`. The transitive closure is found by iterating to a
/// fixed point, since a cycle may only show up after composing several edges.
fn cyclic_targets(edges: &[RefEdge]) -> BTreeSet<Pointer> {
    let targets: BTreeSet<&Pointer> = edges.iter().map(|e| &e.to).collect();
    let mut reach: BTreeMap<&Pointer, BTreeSet<&Pointer>> = targets
        .iter()
        .map(|t| {
            let direct = edges
                .iter()
                .filter(|e| pointer::is_sub_pointer(t, &e.from, true))
                .map(|e| &e.to)
                .collect();
            (*t, direct)
        })
        .collect();

    loop {
        let mut changed = false;
        for t in &targets {
            let via: BTreeSet<&Pointer> = reach[t]
                .iter()
                .flat_map(|r| reach.get(r).into_iter().flatten().copied())
                .collect();
            if let Some(set) = reach.get_mut(t) {
                for r in via {
                    changed |= set.insert(r);
                }
            }
        }
        if !changed {
            break;
        }
    }

    reach
        .into_iter()
        .filter(|(t, reached)| reached.contains(t))
        .map(|(t, _)| t.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn graph(schema: &Value) -> Result<RefGraph, CompileError> {
        let engine = ResolverEngine::new(schema)?;
        RefGraph::build(schema, &engine, &CompileOptions::default())
    }

    fn p(s: &str) -> Pointer {
        Pointer::parse(s).unwrap()
    }

    #[test]
    fn test_direct_self_reference() {
        let schema = json!({
            "definitions": {
                "node": {
                    "properties": { "children": { "items": { "$ref": "#/definitions/node" } } }
                }
            },
            "$ref": "#/definitions/node"
        });
        let g = graph(&schema).unwrap();
        assert!(g.is_cyclic(&p("/definitions/node")));
        assert_eq!(g.target(&p("")), Some(&p("/definitions/node")));
    }

    #[test]
    fn test_cycle_visible_only_through_composition() {
        let schema = json!({
            "definitions": {
                "a": { "properties": { "b": { "$ref": "#/definitions/b" } } },
                "b": { "properties": { "c": { "$ref": "#/definitions/c" } } },
                "c": { "properties": { "a": { "$ref": "#/definitions/a" } } },
                "leaf": { "type": "string" }
            },
            "properties": {
                "start": { "$ref": "#/definitions/a" },
                "plain": { "$ref": "#/definitions/leaf" }
            }
        });
        let g = graph(&schema).unwrap();
        assert!(g.is_cyclic(&p("/definitions/a")));
        assert!(g.is_cyclic(&p("/definitions/b")));
        assert!(g.is_cyclic(&p("/definitions/c")));
        assert!(!g.is_cyclic(&p("/definitions/leaf")));
    }

    #[test]
    fn test_missing_target_is_unresolvable() {
        let schema = json!({ "properties": { "x": { "$ref": "#/definitions/missing" } } });
        let err = graph(&schema).err().unwrap();
        match err {
            CompileError::UnresolvableRef { path, reference } => {
                assert_eq!(path, "/properties/x");
                assert_eq!(reference, "#/definitions/missing");
            }
            other => panic!("expected UnresolvableRef, got {:?}", other),
        }
    }

    #[test]
    fn test_refs_inside_enum_values_are_data() {
        let schema = json!({ "enum": [{ "$ref": "#/nowhere" }] });
        assert!(graph(&schema).is_ok());
    }
}
