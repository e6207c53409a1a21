//! `$ref` string resolution.
//!
//! [`ResolverEngine`] maps every `$ref` form the compiler accepts onto a
//! JSON Pointer into the same document:
//! - JSON Pointer fragments (`#/...`, `#`)
//! - plain-name fragments declared with `$id: "#name"` (or `$anchor`)
//! - relative or absolute URIs equal to some sub-schema's `$id`, optionally
//!   followed by a JSON Pointer fragment
//!
//! Base URIs follow `$id` scoping and are resolved with the `url` crate.

use std::collections::HashMap;

use serde_json::Value;
use url::Url;

use crate::error::CompileError;
use crate::pointer::{self, Pointer};
use crate::schema_utils::child_schemas;

/// Default base URI used when no explicit document URI is known.
///
/// A `file:` scheme makes `Url::join` work for fragment-only references.
const DEFAULT_BASE: &str = "file:///schema.json";

pub(crate) fn default_base_uri() -> Result<Url, CompileError> {
    Url::parse(DEFAULT_BASE).map_err(|err| CompileError::Internal {
        path: String::new(),
        message: format!("default base URI is invalid: {}", err),
    })
}

/// Result of resolving a `$ref` string.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ResolvedRef {
    /// The ref names a location in this document.
    Pointer(Pointer),
    /// External URL, unknown anchor, or malformed fragment.
    Unresolvable(String),
}

/// Reference resolution engine for one schema document.
pub(crate) struct ResolverEngine {
    /// Absolute URI (with or without fragment) → pointer of the declaring node.
    uri_map: HashMap<String, Pointer>,
    base_uri: Url,
}

impl ResolverEngine {
    /// Build a resolver for the given schema document.
    ///
    /// * Scans for `$id` and `$anchor` declarations (respecting base URI scoping)
    /// * Extracts the root `$id` as the base URI (falls back to default)
    pub fn new(schema: &Value) -> Result<Self, CompileError> {
        let default_base = default_base_uri()?;
        let base_uri = Self::scoped_base(schema, &default_base);
        let mut engine = Self {
            uri_map: HashMap::new(),
            base_uri: base_uri.clone(),
        };
        engine.scan(schema, &default_base, &Pointer::root());
        Ok(engine)
    }

    /// The base URI in effect inside `node`, given the base of its parent.
    pub fn scoped_base(node: &Value, parent_base: &Url) -> Url {
        // `$id` beside `$ref` does not rescope the reference.
        if node.get("$ref").is_some() {
            return parent_base.clone();
        }
        match node.get("$id").and_then(Value::as_str) {
            Some(id) => parent_base.join(id).unwrap_or_else(|_| parent_base.clone()),
            None => parent_base.clone(),
        }
    }

    fn scan(&mut self, node: &Value, parent_base: &Url, path: &Pointer) {
        let base = Self::scoped_base(node, parent_base);
        if node.get("$ref").is_none() {
            if let Some(id) = node.get("$id").and_then(Value::as_str) {
                if let Ok(uri) = parent_base.join(id) {
                    // First wins: duplicate declarations keep the shallowest.
                    self.uri_map
                        .entry(uri.to_string())
                        .or_insert_with(|| path.clone());
                }
            }
        }
        if let Some(anchor) = node.get("$anchor").and_then(Value::as_str) {
            if let Ok(uri) = base.join(&format!("#{}", anchor)) {
                self.uri_map
                    .entry(uri.to_string())
                    .or_insert_with(|| path.clone());
            }
        }
        for (keys, child) in child_schemas(node) {
            self.scan(child, &base, &path.join(&keys));
        }
    }

    /// Resolve a `$ref` string against the base URI in effect at the ref.
    pub fn resolve(&self, ref_str: &str, current_base: &Url) -> ResolvedRef {
        if ref_str == "#" || ref_str.starts_with("#/") {
            return match Pointer::parse(ref_str) {
                Ok(ptr) => ResolvedRef::Pointer(ptr),
                Err(_) => ResolvedRef::Unresolvable(ref_str.to_string()),
            };
        }
        let Ok(resolved) = current_base.join(ref_str) else {
            return ResolvedRef::Unresolvable(ref_str.to_string());
        };
        if let Some(ptr) = self.uri_map.get(resolved.as_str()) {
            return ResolvedRef::Pointer(ptr.clone());
        }

        // `<id-uri>#/json/pointer`: resolve the pointer inside the `$id` scope.
        let fragment = resolved.fragment().unwrap_or("").to_string();
        let mut document = resolved.clone();
        document.set_fragment(None);
        let scope = if document.as_str() == self.base_uri.as_str() {
            Some(Pointer::root())
        } else {
            self.uri_map.get(document.as_str()).cloned()
        };
        match (scope, fragment.as_str()) {
            (Some(scope), "") => ResolvedRef::Pointer(scope),
            (Some(scope), frag) if frag.starts_with('/') => match pointer::parse(frag) {
                Ok(keys) => ResolvedRef::Pointer(scope.join(&keys)),
                Err(_) => ResolvedRef::Unresolvable(ref_str.to_string()),
            },
            _ => ResolvedRef::Unresolvable(ref_str.to_string()),
        }
    }

    /// The root base URI for this schema document.
    pub fn base_uri(&self) -> &Url {
        &self.base_uri
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

    #[test]
    fn test_json_pointer_passthrough() {
        let engine = ResolverEngine::new(&json!({ "type": "object" })).unwrap();
        assert_eq!(
            engine.resolve("#/definitions/a~1b", engine.base_uri()),
            ResolvedRef::Pointer(p("/definitions/a/b"))
        );
        assert_eq!(
            engine.resolve("#", engine.base_uri()),
            ResolvedRef::Pointer(Pointer::root())
        );
    }

    #[test]
    fn test_plain_name_fragment_id() {
        let schema = json!({
            "definitions": {
                "node": { "$id": "#node", "type": "object" }
            }
        });
        let engine = ResolverEngine::new(&schema).unwrap();
        assert_eq!(
            engine.resolve("#node", engine.base_uri()),
            ResolvedRef::Pointer(p("/definitions/node"))
        );
    }

    #[test]
    fn test_relative_uri_id_with_pointer_fragment() {
        let schema = json!({
            "$id": "http://example.com/root.json",
            "definitions": {
                "address": {
                    "$id": "address.json",
                    "properties": { "street": { "type": "string" } }
                }
            }
        });
        let engine = ResolverEngine::new(&schema).unwrap();
        assert_eq!(engine.base_uri().as_str(), "http://example.com/root.json");
        assert_eq!(
            engine.resolve("address.json", engine.base_uri()),
            ResolvedRef::Pointer(p("/definitions/address"))
        );
        assert_eq!(
            engine.resolve("address.json#/properties/street", engine.base_uri()),
            ResolvedRef::Pointer(p("/definitions/address/properties/street"))
        );
        assert_eq!(
            engine.resolve("root.json#/definitions", engine.base_uri()),
            ResolvedRef::Pointer(p("/definitions"))
        );
    }

    #[test]
    fn test_anchor_in_defs() {
        let schema = json!({
            "$defs": { "step": { "$anchor": "stepId", "type": "object" } }
        });
        let engine = ResolverEngine::new(&schema).unwrap();
        assert_eq!(
            engine.resolve("#stepId", engine.base_uri()),
            ResolvedRef::Pointer(p("/$defs/step"))
        );
    }

    #[test]
    fn test_external_ref_unresolvable() {
        let engine = ResolverEngine::new(&json!({ "type": "object" })).unwrap();
        assert_eq!(
            engine.resolve("https://external.com/schema", engine.base_uri()),
            ResolvedRef::Unresolvable("https://external.com/schema".to_string())
        );
        assert_eq!(
            engine.resolve("#/bad~escape", engine.base_uri()),
            ResolvedRef::Unresolvable("#/bad~escape".to_string())
        );
    }
}
