//! Layout built from a hand-authored layout document.
//!
//! Items are either key strings or objects with an optional `key` (dotted
//! object path or JSON Pointer), `type`, and `items`; every other field is
//! copied into the node's options. `"*"` places every root property the
//! layout does not place itself.

use serde_json::{Map, Value};

use super::widget::{is_array, is_container};
use super::{LayoutCompiler, LayoutNode};
use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::error::CompileError;
use crate::pointer::{self, Pointer, WILDCARD};
use crate::schema_utils::{data_to_schema_pointer, ordered_properties};

/// Layout fields with a structural meaning; the rest become options.
const STRUCTURAL_FIELDS: &[&str] = &["key", "type", "items", "options"];

impl<'a> LayoutCompiler<'a> {
    pub(super) fn build_from_layout(&mut self, layout: &Value) -> Result<Vec<LayoutNode>, CompileError> {
        let items = match layout {
            Value::Array(items) => items.clone(),
            other => vec![other.clone()],
        };
        let mut placed = Vec::new();
        collect_placed(&items, &mut placed);
        self.placed = placed;
        self.layout_items(&items, 0)
    }

    pub(super) fn layout_items(&mut self, items: &[Value], depth: usize) -> Result<Vec<LayoutNode>, CompileError> {
        let mut nodes = Vec::new();
        for item in items {
            nodes.extend(self.layout_item(item, depth + 1)?);
        }
        Ok(nodes)
    }

    fn layout_item(&mut self, item: &Value, depth: usize) -> Result<Vec<LayoutNode>, CompileError> {
        self.check_depth(depth, &Pointer::root())?;
        match item {
            Value::String(key) if key == "*" => self.remaining_properties(depth),
            Value::String(key) => {
                let mut obj = Map::new();
                obj.insert("key".to_string(), Value::String(key.clone()));
                Ok(self.keyed_item(key, &obj, depth)?.into_iter().collect())
            }
            Value::Object(obj) => match obj.get("key").and_then(Value::as_str) {
                Some(key) => Ok(self.keyed_item(key, obj, depth)?.into_iter().collect()),
                None => Ok(vec![self.unkeyed_item(obj, depth)?]),
            },
            _ => Ok(Vec::new()),
        }
    }

    fn remaining_properties(&mut self, depth: usize) -> Result<Vec<LayoutNode>, CompileError> {
        let compiled = self.compiled;
        let mut nodes = Vec::new();
        for key in ordered_properties(compiled) {
            if self.placed.contains(&key) {
                continue;
            }
            let data_ptr = Pointer::root().child(key.as_str());
            let value = self.data.and_then(|d| d.get(&key));
            let node = self.schema_node(
                &Pointer::from_keys(["properties", key.as_str()]),
                &data_ptr,
                value,
                None,
                depth,
            )?;
            nodes.extend(node);
        }
        Ok(nodes)
    }

    /// The authored pointer of `raw` and the data pointer it addresses in
    /// the current array item.
    fn resolve_key(&mut self, raw: &str) -> Option<(Pointer, Pointer)> {
        let authored = match pointer::parse_object_path(raw) {
            Ok(authored) => authored,
            Err(err) => {
                self.unresolved_key(raw, Pointer::root(), err.to_string());
                return None;
            }
        };
        let data_ptr = self
            .bases
            .iter()
            .rev()
            .find_map(|(from, to)| authored.rebase(from, to))
            .unwrap_or_else(|| authored.clone());
        Some((authored, data_ptr))
    }

    fn unresolved_key(&mut self, raw: &str, at: Pointer, reason: String) {
        self.diagnostics.push(Diagnostic::new(
            at,
            DiagnosticKind::UnresolvedLayoutKey {
                key: raw.to_string(),
            },
            format!("layout key {:?} skipped: {}", raw, reason),
        ));
    }

    fn keyed_item(
        &mut self,
        raw: &str,
        obj: &Map<String, Value>,
        depth: usize,
    ) -> Result<Option<LayoutNode>, CompileError> {
        let Some((authored, data_ptr)) = self.resolve_key(raw) else {
            return Ok(None);
        };
        let compiled = self.compiled;
        let located = data_to_schema_pointer(&authored, compiled)
            .and_then(|schema_ptr| pointer::get(compiled, &schema_ptr).map(|s| (schema_ptr, s)));
        let Some((schema_ptr, schema)) = located else {
            self.unresolved_key(raw, data_ptr, "no schema describes it".to_string());
            return Ok(None);
        };

        let explicit = obj.get("type").and_then(Value::as_str);
        let widget = self.resolve_widget(explicit, schema, &data_ptr);
        let mut node = self.new_node(&widget, Some(&data_ptr), schema);
        apply_authored_options(&mut node, obj);

        let value = self.data.and_then(|d| pointer::get(d, &data_ptr));
        let authored_items = obj.get("items").and_then(Value::as_array);
        if is_array(&widget) {
            let template = authored_items.map(|items| (items.as_slice(), &authored));
            self.array_items(&mut node, schema, &schema_ptr, &data_ptr, value, template, depth)?;
        } else if is_container(&widget) {
            node.items = match authored_items {
                Some(items) => self.layout_items(items, depth)?,
                None => self.object_children(schema, &schema_ptr, &data_ptr, value, depth)?,
            };
        }
        Ok(Some(node))
    }

    fn unkeyed_item(&mut self, obj: &Map<String, Value>, depth: usize) -> Result<LayoutNode, CompileError> {
        let items: &[Value] = obj
            .get("items")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let explicit = obj.get("type").and_then(Value::as_str).unwrap_or("section");

        if is_array(explicit) {
            if let Some(key) = self.array_key_from_items(items) {
                let mut keyed = obj.clone();
                keyed.insert("key".to_string(), Value::String(key.to_string()));
                if let Some(node) = self.keyed_item(&key.to_string(), &keyed, depth)? {
                    return Ok(node);
                }
            }
        }

        let widget = if self.config.widgets.contains(explicit) {
            explicit
        } else {
            self.diagnostics.push(Diagnostic::new(
                Pointer::root(),
                DiagnosticKind::UnknownWidgetType {
                    widget: explicit.to_string(),
                },
                format!("unknown widget type {:?}; using \"section\"", explicit),
            ));
            "section"
        };
        let mut node = self.new_node(widget, None, &Value::Null);
        apply_authored_options(&mut node, obj);
        node.items = self.layout_items(items, depth)?;
        Ok(node)
    }

    /// The array an unkeyed array container iterates: the part of the first
    /// descendant key before its first variable position below the current
    /// array item.
    fn array_key_from_items(&self, items: &[Value]) -> Option<Pointer> {
        let mut keys = Vec::new();
        collect_keys(items, &mut keys);
        keys.iter().find_map(|raw| {
            let authored = pointer::parse_object_path(raw).ok()?;
            let covered = self
                .bases
                .iter()
                .rev()
                .find(|(from, _)| authored.starts_with(from))
                .map_or(0, |(from, _)| from.len());
            let position = authored.keys()[covered..]
                .iter()
                .position(|k| k == WILDCARD)?;
            Some(authored.prefix(covered + position))
        })
    }
}

fn apply_authored_options(node: &mut LayoutNode, obj: &Map<String, Value>) {
    for (key, value) in obj {
        if !STRUCTURAL_FIELDS.contains(&key.as_str()) {
            node.options.insert(key.clone(), value.clone());
        }
    }
    if let Some(Value::Object(options)) = obj.get("options") {
        for (key, value) in options {
            node.options.insert(key.clone(), value.clone());
        }
    }
}

/// Every key string in an authored layout, nested items included.
fn collect_keys(items: &[Value], keys: &mut Vec<String>) {
    for item in items {
        match item {
            Value::String(key) if key != "*" => keys.push(key.clone()),
            Value::Object(obj) => {
                if let Some(key) = obj.get("key").and_then(Value::as_str) {
                    keys.push(key.to_string());
                }
                if let Some(nested) = obj.get("items").and_then(Value::as_array) {
                    collect_keys(nested, keys);
                }
            }
            _ => {}
        }
    }
}

/// Root property names an authored layout places.
fn collect_placed(items: &[Value], placed: &mut Vec<String>) {
    let mut keys = Vec::new();
    collect_keys(items, &mut keys);
    for raw in keys {
        let first = pointer::parse_object_path(&raw)
            .ok()
            .and_then(|p| p.keys().first().cloned());
        if let Some(first) = first {
            if !placed.contains(&first) {
                placed.push(first);
            }
        }
    }
}
