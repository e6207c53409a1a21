//! Whole-document validation against a compiled schema.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::{validator_spec, ErrorMap, ValidatorCompiler};
use crate::pointer::{self, Pointer};

/// Chained `$ref`s followed without descending into the data.
const MAX_REF_HOPS: usize = 32;

/// Validation errors found at one data location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    pub data_pointer: Pointer,
    pub errors: ErrorMap,
}

/// Validate `data` against the compiled `schema`.
///
/// Structural keywords are walked here; the keyword predicates at each
/// location come from the validator compiler. Recursive `$ref`s are followed
/// through the compiled schema, which terminates because `data` is finite.
pub fn validate_document(schema: &Value, data: &Value, anchor_patterns: bool) -> Vec<FieldError> {
    let mut walker = DocumentWalker {
        root: schema,
        compiler: ValidatorCompiler::new(anchor_patterns),
        errors: Vec::new(),
    };
    walker.visit(schema, data, &Pointer::root(), 0);
    walker.errors
}

struct DocumentWalker<'s> {
    root: &'s Value,
    compiler: ValidatorCompiler,
    errors: Vec<FieldError>,
}

impl<'s> DocumentWalker<'s> {
    fn report(&mut self, at: &Pointer, errors: ErrorMap) {
        match self.errors.iter_mut().find(|e| e.data_pointer == *at) {
            Some(existing) => {
                for (keyword, details) in errors {
                    existing.errors.entry(keyword).or_insert(details);
                }
            }
            None => self.errors.push(FieldError {
                data_pointer: at.clone(),
                errors,
            }),
        }
    }

    fn report_one(&mut self, at: &Pointer, keyword: &str, details: Value) {
        let mut errors = ErrorMap::new();
        errors.insert(keyword.to_string(), details);
        self.report(at, errors);
    }

    fn visit(&mut self, schema: &'s Value, value: &Value, at: &Pointer, ref_hops: usize) {
        let obj = match schema {
            Value::Bool(false) => {
                self.report_one(at, "false", json!({ "currentValue": value }));
                return;
            }
            Value::Object(obj) => obj,
            _ => return,
        };

        if let Some(reference) = obj.get("$ref").and_then(Value::as_str) {
            if ref_hops >= MAX_REF_HOPS {
                tracing::debug!(at = %at, "$ref chain does not descend; stopped");
                return;
            }
            let target = Pointer::parse(reference)
                .ok()
                .and_then(|ptr| pointer::get(self.root, &ptr));
            if let Some(target) = target {
                self.visit(target, value, at, ref_hops + 1);
            }
        }

        let mut spec = validator_spec(schema, false);
        spec.shift_remove("allOf");
        let validator = self.compiler.compile_spec(&spec, at);
        if let Some(errors) = validator.validate(Some(value), false) {
            self.report(at, errors);
        }

        if let Some(branches) = obj.get("allOf").and_then(Value::as_array) {
            for branch in branches {
                self.visit(branch, value, at, ref_hops);
            }
        }

        match value {
            Value::Object(fields) => self.visit_object(obj, fields, at),
            Value::Array(items) => self.visit_array(obj, items, at),
            _ => {}
        }
    }

    fn visit_object(&mut self, schema: &'s Map<String, Value>, fields: &Map<String, Value>, at: &Pointer) {
        if let Some(required) = schema.get("required").and_then(Value::as_array) {
            for key in required.iter().filter_map(Value::as_str) {
                if !fields.contains_key(key) {
                    self.report_one(&at.child(key), "required", Value::Bool(true));
                }
            }
        }

        let properties = schema.get("properties").and_then(Value::as_object);
        let patterns: Vec<(Regex, &'s Value)> = schema
            .get("patternProperties")
            .and_then(Value::as_object)
            .map(|map| {
                map.iter()
                    .filter_map(|(pattern, sub)| Regex::new(pattern).ok().map(|re| (re, sub)))
                    .collect()
            })
            .unwrap_or_default();
        let additional = schema.get("additionalProperties");

        for (key, child) in fields {
            let child_at = at.child(key.as_str());
            let mut matched = false;
            if let Some(sub) = properties.and_then(|p| p.get(key)) {
                matched = true;
                self.visit(sub, child, &child_at, 0);
            }
            for (re, sub) in &patterns {
                if re.is_match(key) {
                    matched = true;
                    self.visit(sub, child, &child_at, 0);
                }
            }
            if matched {
                continue;
            }
            match additional {
                Some(Value::Bool(false)) => {
                    self.report_one(at, "additionalProperties", json!({ "propertyName": key }))
                }
                Some(sub @ Value::Object(_)) => self.visit(sub, child, &child_at, 0),
                _ => {}
            }
        }
    }

    fn visit_array(&mut self, schema: &'s Map<String, Value>, items: &[Value], at: &Pointer) {
        match schema.get("items") {
            Some(Value::Array(tuple)) => {
                for (i, item) in items.iter().enumerate() {
                    let item_at = at.child(i.to_string());
                    match (tuple.get(i), schema.get("additionalItems")) {
                        (Some(sub), _) => self.visit(sub, item, &item_at, 0),
                        (None, Some(Value::Bool(false))) => {
                            self.report_one(
                                at,
                                "additionalItems",
                                json!({ "maximumItems": tuple.len(), "currentItems": items.len() }),
                            );
                            break;
                        }
                        (None, Some(sub @ Value::Object(_))) => self.visit(sub, item, &item_at, 0),
                        _ => {}
                    }
                }
            }
            Some(sub) => {
                for (i, item) in items.iter().enumerate() {
                    self.visit(sub, item, &at.child(i.to_string()), 0);
                }
            }
            None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> Pointer {
        Pointer::parse(s).unwrap()
    }

    #[test]
    fn test_nested_errors_located() {
        let schema = json!({
            "type": "object",
            "required": ["name"],
            "properties": {
                "age": { "type": "integer", "minimum": 0 },
                "tags": { "type": "array", "items": { "type": "string", "maxLength": 3 } }
            },
            "additionalProperties": false
        });
        let errors = validate_document(
            &schema,
            &json!({ "age": -1, "tags": ["ok", "toolong"], "extra": 1 }),
            false,
        );
        let at = |ptr: &str| errors.iter().find(|e| e.data_pointer == p(ptr));
        assert!(at("/name").unwrap().errors.contains_key("required"));
        assert!(at("/age").unwrap().errors.contains_key("minimum"));
        assert!(at("/tags/1").unwrap().errors.contains_key("maxLength"));
        assert!(at("").unwrap().errors.contains_key("additionalProperties"));
        assert!(at("/tags/0").is_none());
    }

    #[test]
    fn test_recursive_schema_follows_refs() {
        let schema = json!({
            "type": "object",
            "properties": {
                "name": { "type": "string", "minLength": 1 },
                "children": { "type": "array", "items": { "$ref": "#" } }
            }
        });
        let data = json!({
            "name": "root",
            "children": [{ "name": "a", "children": [{ "name": 7 }] }]
        });
        let errors = validate_document(&schema, &data, false);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].data_pointer, p("/children/0/children/0/name"));
        assert!(errors[0].errors.contains_key("type"));
    }

    #[test]
    fn test_tuple_and_additional_items() {
        let schema = json!({
            "type": "array",
            "items": [{ "type": "string" }],
            "additionalItems": { "type": "number" }
        });
        let errors = validate_document(&schema, &json!(["a", 1, "b"]), false);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].data_pointer, p("/2"));
    }

    #[test]
    fn test_valid_document_has_no_errors() {
        let schema = json!({ "type": "object", "properties": { "a": { "format": "email" } } });
        assert!(validate_document(&schema, &json!({ "a": "x@example.com" }), false).is_empty());
    }
}
