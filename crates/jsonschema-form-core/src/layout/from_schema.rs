//! Layout synthesized from the compiled schema alone.

use serde_json::Value;

use super::widget::{is_array, is_container};
use super::{ArrayItemType, LayoutCompiler, LayoutNode, REF_POINTER_OPTION, REF_WIDGET};
use crate::data_map::record_subtree;
use crate::error::CompileError;
use crate::pointer::{self, Pointer, WILDCARD};
use crate::schema_utils::{ordered_properties, schema_to_data_pointer, ArrayCounts};

impl<'a> LayoutCompiler<'a> {
    /// Top-level nodes for the whole schema. An object root contributes its
    /// children; any other root is a single node.
    pub(super) fn build_from_schema(&mut self, data: Option<&Value>) -> Result<Vec<LayoutNode>, CompileError> {
        let root = Pointer::root();
        let Some(node) = self.schema_node(&root, &root, data, None, 0)? else {
            return Ok(Vec::new());
        };
        if is_container(&node.widget) {
            Ok(node.items)
        } else {
            Ok(vec![node])
        }
    }

    /// The node for the schema at `schema_ptr`, describing `value` at
    /// `data_ptr`. `None` if the schema location does not exist.
    pub(super) fn schema_node(
        &mut self,
        schema_ptr: &Pointer,
        data_ptr: &Pointer,
        value: Option<&Value>,
        explicit: Option<&str>,
        depth: usize,
    ) -> Result<Option<LayoutNode>, CompileError> {
        self.check_depth(depth, data_ptr)?;
        let compiled = self.compiled;
        let Some(schema) = pointer::get(compiled, schema_ptr) else {
            return Ok(None);
        };
        if schema.get("$ref").is_some() {
            return self.ref_node(schema, data_ptr, depth).map(Some);
        }

        let widget = self.resolve_widget(explicit, schema, data_ptr);
        let mut node = self.new_node(&widget, Some(data_ptr), schema);
        if is_container(&widget) {
            node.items = self.object_children(schema, schema_ptr, data_ptr, value, depth)?;
        } else if is_array(&widget) {
            self.array_items(&mut node, schema, schema_ptr, data_ptr, value, None, depth)?;
        }
        Ok(Some(node))
    }

    /// A reference node for a recursive `$ref`, building its library entry
    /// the first time the target is met.
    fn ref_node(&mut self, schema: &Value, data_ptr: &Pointer, depth: usize) -> Result<LayoutNode, CompileError> {
        let target = ref_target(schema, data_ptr)?;
        let key = self.ensure_library_entry(&target, data_ptr, depth)?;
        let mut node = self.new_node(REF_WIDGET, Some(data_ptr), schema);
        node.options.remove("required");
        node.recursive_reference = true;
        node.options
            .insert(REF_POINTER_OPTION.to_string(), Value::String(key.to_string()));
        Ok(node)
    }

    /// Build the library entry for the schema at `schema_ptr` unless it is
    /// built or being built. `$ref`s are followed to their target first.
    /// Returns the entry's key.
    fn ensure_library_entry(
        &mut self,
        schema_ptr: &Pointer,
        data_ptr: &Pointer,
        depth: usize,
    ) -> Result<Pointer, CompileError> {
        let compiled = self.compiled;
        let mut schema_ptr = schema_ptr.clone();
        let mut key = self.generic(data_ptr);
        if let Some(schema) = pointer::get(compiled, &schema_ptr) {
            if schema.get("$ref").is_some() {
                schema_ptr = ref_target(schema, data_ptr)?;
                if let Some(target_key) = schema_to_data_pointer(&schema_ptr, compiled) {
                    key = target_key;
                }
            }
        }
        if self.library.begin(&key) {
            tracing::debug!(key = %key, "building layout library entry");
            let built = self.schema_node(&schema_ptr, &key, None, None, depth + 1)?;
            let entry = match built {
                Some(entry) => entry,
                None => self.new_node("none", Some(&key), &Value::Null),
            };
            self.library.finish(key.clone(), entry);
        }
        Ok(key)
    }

    /// Property nodes in display order, then nodes for data keys that only
    /// `additionalProperties` describes.
    pub(super) fn object_children(
        &mut self,
        schema: &Value,
        schema_ptr: &Pointer,
        data_ptr: &Pointer,
        value: Option<&Value>,
        depth: usize,
    ) -> Result<Vec<LayoutNode>, CompileError> {
        let mut items = Vec::new();
        for key in ordered_properties(schema) {
            let child = self.schema_node(
                &schema_ptr.join(&["properties", key.as_str()]),
                &data_ptr.child(key.as_str()),
                value.and_then(|v| v.get(&key)),
                None,
                depth + 1,
            )?;
            items.extend(child);
        }

        let (Some(Value::Object(fields)), Some(extra @ Value::Object(_))) =
            (value, schema.get("additionalProperties"))
        else {
            return Ok(items);
        };
        let declared = schema.get("properties").and_then(Value::as_object);
        let extra_ptr = schema_ptr.child("additionalProperties");
        for (key, field) in fields {
            if declared.is_some_and(|d| d.contains_key(key)) {
                continue;
            }
            let record_at = self.generic(data_ptr).child(key.as_str());
            record_subtree(extra, &extra_ptr, &record_at, false, self.data_map);
            let child = self.schema_node(
                &extra_ptr,
                &data_ptr.child(key.as_str()),
                Some(field),
                None,
                depth + 1,
            )?;
            if let Some(mut child) = child {
                child.name = Some(key.clone());
                child
                    .options
                    .entry("title")
                    .or_insert_with(|| Value::String(key.clone()));
                items.push(child);
            }
        }
        Ok(items)
    }

    /// Fill `node` with its item nodes and, while below `maxItems`, one
    /// reference node for adding another list item.
    ///
    /// With `authored`, each item is built from the authored item layout
    /// (keys under `authored.1` + `/-` re-based onto the item) instead of
    /// from the schema.
    #[allow(clippy::too_many_arguments)]
    pub(super) fn array_items(
        &mut self,
        node: &mut LayoutNode,
        schema: &Value,
        schema_ptr: &Pointer,
        data_ptr: &Pointer,
        value: Option<&Value>,
        authored: Option<(&[Value], &Pointer)>,
        depth: usize,
    ) -> Result<(), CompileError> {
        let values = value.and_then(Value::as_array);
        let counts = ArrayCounts::new(schema, values.map_or(0, Vec::len));
        let list_schema = match schema.get("items") {
            Some(Value::Object(_)) => Some(schema_ptr.child("items")),
            Some(Value::Array(_)) => match schema.get("additionalItems") {
                Some(Value::Object(_)) => Some(schema_ptr.child("additionalItems")),
                _ => None,
            },
            _ => None,
        };

        let generic = self.generic(data_ptr);
        if let Some(entry) = self.data_map.get_mut(&generic) {
            entry.tuple_items.get_or_insert(counts.tuple);
            entry
                .list_items
                .get_or_insert(counts.total.saturating_sub(counts.tuple));
        }

        for i in 0..counts.total {
            let (item_schema, item_type) = if i < counts.tuple {
                (schema_ptr.join(&["items", i.to_string().as_str()]), ArrayItemType::Tuple)
            } else {
                match &list_schema {
                    Some(list) => (list.clone(), ArrayItemType::List),
                    None => break,
                }
            };
            let item_ptr = data_ptr.child(i.to_string());
            let item_value = values.and_then(|v| v.get(i));
            let item = match authored {
                Some((template, authored_key)) => {
                    self.authored_item(template, authored_key, &item_ptr, depth + 1)?
                }
                None => self.schema_node(&item_schema, &item_ptr, item_value, None, depth + 1)?,
            };
            if let Some(mut item) = item {
                item.array_item = true;
                item.array_item_type = Some(item_type);
                node.items.push(item);
            }
        }

        if let (Some(list), true) = (list_schema, counts.has_room()) {
            let compiled = self.compiled;
            let recursive = pointer::get(compiled, &list)
                .is_some_and(|s| s.get("$ref").is_some());
            let key = self.ensure_library_entry(&list, &generic.child(WILDCARD), depth)?;
            let add_ptr = data_ptr.child(WILDCARD);
            let mut add = self.new_node(REF_WIDGET, Some(&add_ptr), &Value::Null);
            add.array_item = true;
            add.array_item_type = Some(ArrayItemType::List);
            add.recursive_reference = recursive;
            add.options
                .insert(REF_POINTER_OPTION.to_string(), Value::String(key.to_string()));
            if let Some(title) = node.options.get("title").and_then(Value::as_str) {
                add.options
                    .insert("title".to_string(), Value::String(format!("Add {}", title)));
            }
            node.items.push(add);
        }
        Ok(())
    }

    /// One array item built from an authored item layout.
    fn authored_item(
        &mut self,
        template: &[Value],
        authored_key: &Pointer,
        item_ptr: &Pointer,
        depth: usize,
    ) -> Result<Option<LayoutNode>, CompileError> {
        self.bases
            .push((authored_key.child(WILDCARD), item_ptr.clone()));
        let children = self.layout_items(template, depth);
        self.bases.pop();
        let mut children = children?;
        if children.len() == 1 && children[0].data_pointer.as_ref() == Some(item_ptr) {
            return Ok(children.pop());
        }
        let mut wrapper = self.new_node("section", Some(item_ptr), &Value::Null);
        wrapper.items = children;
        Ok(Some(wrapper))
    }
}

/// Compiled-schema pointer named by a `$ref` node.
fn ref_target(schema: &Value, at: &Pointer) -> Result<Pointer, CompileError> {
    let reference = schema.get("$ref").and_then(Value::as_str).unwrap_or_default();
    Pointer::parse(reference).map_err(|_| CompileError::Internal {
        path: at.to_string(),
        message: format!("recursive $ref {:?} is not a local pointer", reference),
    })
}
