//! Control-tree compiler: the value-holding mirror of the data.
//!
//! Compilation produces a serializable [`ControlTemplate`] tree whose
//! validators are still keyword records. [`materialize`] turns a template
//! into a live [`Control`] tree with compiled validators, and [`Form`] wraps
//! that tree with the array operations an editor needs.
//!
//! Recursive `$ref`s follow the layout compiler's rule: the referenced
//! template is built once into the template library, and array item
//! templates for additions are taken from it.

mod form;
mod tree;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::CompileOptions;
use crate::error::CompileError;
use crate::maps::{ArityMap, DataMap, RecursiveRefMap, RefLibrary};
use crate::pointer::{self, Pointer, WILDCARD};
use crate::resolver::ResolvedSchema;
use crate::schema_utils::{
    has_enumerable_items, ordered_properties, schema_to_data_pointer, schema_type, ArrayCounts,
};
use crate::validators::{validator_spec, ValidatorSpec};

pub use form::Form;
pub use tree::{materialize, Control, ControlTree};

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

/// Blueprint of one control, before its validators are compiled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlTemplate {
    /// An object: one child per property, in display order.
    Group {
        children: IndexMap<String, ControlTemplate>,
        validators: ValidatorSpec,
    },
    /// An array edited item by item.
    Array {
        children: Vec<ControlTemplate>,
        /// Leading fixed positions, which cannot be removed or moved.
        tuple_items: usize,
        /// Template-library key for new list items.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        item_ref: Option<Pointer>,
        validators: ValidatorSpec,
    },
    /// A primitive, or an array edited as a single value.
    Leaf {
        value: Value,
        #[serde(default)]
        disabled: bool,
        validators: ValidatorSpec,
    },
}

impl ControlTemplate {
    pub fn validators(&self) -> &ValidatorSpec {
        match self {
            ControlTemplate::Group { validators, .. }
            | ControlTemplate::Array { validators, .. }
            | ControlTemplate::Leaf { validators, .. } => validators,
        }
    }

    /// The value a control built from this template starts with.
    pub fn initial_value(&self) -> Value {
        match self {
            ControlTemplate::Group { children, .. } => Value::Object(
                children
                    .iter()
                    .map(|(key, child)| (key.clone(), child.initial_value()))
                    .collect(),
            ),
            ControlTemplate::Array { children, .. } => {
                Value::Array(children.iter().map(ControlTemplate::initial_value).collect())
            }
            ControlTemplate::Leaf { value, .. } => value.clone(),
        }
    }
}

/// Output of [`compile_templates`].
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledTemplates {
    pub root: ControlTemplate,
    /// Recursive targets by generic data pointer.
    pub library: RefLibrary<ControlTemplate>,
}

/// Build the template tree for `data` (or an empty form).
pub fn compile_templates(
    resolved: &ResolvedSchema,
    data_map: &DataMap,
    data: Option<&Value>,
    config: &CompileOptions,
) -> Result<CompiledTemplates, CompileError> {
    let mut compiler = TemplateCompiler::new(resolved, data_map, config, RefLibrary::default());
    let root = Pointer::root();
    let template = compiler.build(&root, &root, data, false, 0)?;
    let root = template.unwrap_or_else(|| ControlTemplate::Leaf {
        value: data.cloned().unwrap_or(Value::Null),
        disabled: false,
        validators: ValidatorSpec::new(),
    });
    tracing::debug!(library = compiler.library.len(), "compiled control templates");
    Ok(CompiledTemplates {
        root,
        library: compiler.library,
    })
}

// ---------------------------------------------------------------------------
// Compiler
// ---------------------------------------------------------------------------

pub(crate) struct TemplateCompiler<'a> {
    compiled: &'a Value,
    arity: &'a ArityMap,
    data_recursive: &'a RecursiveRefMap,
    data_map: &'a DataMap,
    config: &'a CompileOptions,
    library: RefLibrary<ControlTemplate>,
}

impl<'a> TemplateCompiler<'a> {
    pub(crate) fn new(
        resolved: &'a ResolvedSchema,
        data_map: &'a DataMap,
        config: &'a CompileOptions,
        library: RefLibrary<ControlTemplate>,
    ) -> Self {
        Self {
            compiled: &resolved.compiled,
            arity: &resolved.arity,
            data_recursive: &resolved.data_recursive,
            data_map,
            config,
            library,
        }
    }

    /// The template for the schema at `schema_ptr` holding `value` at
    /// `data_ptr`. `None` if the schema location does not exist, or if it is
    /// a recursive reference whose target is still being built.
    pub(crate) fn build(
        &mut self,
        schema_ptr: &Pointer,
        data_ptr: &Pointer,
        value: Option<&Value>,
        required: bool,
        depth: usize,
    ) -> Result<Option<ControlTemplate>, CompileError> {
        if depth > self.config.max_depth {
            return Err(CompileError::RecursionDepthExceeded {
                path: data_ptr.to_string(),
                max_depth: self.config.max_depth,
            });
        }
        let compiled = self.compiled;
        let Some(schema) = pointer::get(compiled, schema_ptr) else {
            return Ok(None);
        };

        if schema.get("$ref").is_some() {
            let target = ref_target(schema, data_ptr)?;
            let key = self.ensure_library_entry(schema_ptr, data_ptr, depth)?;
            return match value {
                // Data drives the recursion, so build a fresh copy for it.
                // The data is finite, so only a chain of bare `$ref`s keeps
                // counting toward the depth guard.
                Some(value) => {
                    let chained = pointer::get(compiled, &target).is_some_and(|t| t.get("$ref").is_some());
                    let depth = if chained { depth + 1 } else { 0 };
                    self.build(&target, data_ptr, Some(value), required, depth)
                }
                None => Ok(self.library.get(&key).cloned()),
            };
        }

        let value = match value {
            Some(value) => Some(value),
            None if self.config.set_schema_defaults => schema.get("default"),
            None => None,
        };
        let validators = validator_spec(schema, required);
        let template = match schema_type(schema).as_deref() {
            Some("object") => self.group(schema, schema_ptr, data_ptr, value, validators, depth)?,
            Some("array") if !has_enumerable_items(schema) => {
                self.array(schema, schema_ptr, data_ptr, value, validators, depth)?
            }
            _ => ControlTemplate::Leaf {
                value: value.cloned().unwrap_or(Value::Null),
                disabled: schema.get("readOnly").and_then(Value::as_bool) == Some(true),
                validators,
            },
        };
        Ok(Some(template))
    }

    fn group(
        &mut self,
        schema: &Value,
        schema_ptr: &Pointer,
        data_ptr: &Pointer,
        value: Option<&Value>,
        validators: ValidatorSpec,
        depth: usize,
    ) -> Result<ControlTemplate, CompileError> {
        let required: Vec<&str> = schema
            .get("required")
            .and_then(Value::as_array)
            .map(|keys| keys.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        let mut children = IndexMap::new();
        for key in ordered_properties(schema) {
            let child = self.build(
                &schema_ptr.join(&["properties", key.as_str()]),
                &data_ptr.child(key.as_str()),
                value.and_then(|v| v.get(&key)),
                required.contains(&key.as_str()),
                depth + 1,
            )?;
            if let Some(child) = child {
                children.insert(key, child);
            }
        }

        if let (Some(Value::Object(fields)), Some(Value::Object(_))) =
            (value, schema.get("additionalProperties"))
        {
            let extra_ptr = schema_ptr.child("additionalProperties");
            for (key, field) in fields {
                if children.contains_key(key) {
                    continue;
                }
                let child = self.build(&extra_ptr, &data_ptr.child(key.as_str()), Some(field), false, depth + 1)?;
                if let Some(child) = child {
                    children.insert(key.clone(), child);
                }
            }
        }
        Ok(ControlTemplate::Group {
            children,
            validators,
        })
    }

    fn array(
        &mut self,
        schema: &Value,
        schema_ptr: &Pointer,
        data_ptr: &Pointer,
        value: Option<&Value>,
        validators: ValidatorSpec,
        depth: usize,
    ) -> Result<ControlTemplate, CompileError> {
        let values = value.and_then(Value::as_array);
        let counts = ArrayCounts::new(schema, values.map_or(0, Vec::len));
        let list_schema = match (schema.get("items"), schema.get("additionalItems")) {
            (Some(Value::Object(_)), _) => Some(schema_ptr.child("items")),
            (Some(Value::Array(_)), Some(Value::Object(_))) => Some(schema_ptr.child("additionalItems")),
            _ => None,
        };

        let mut children = Vec::new();
        for i in 0..counts.total {
            let item_schema = if i < counts.tuple {
                schema_ptr.join(&["items", i.to_string().as_str()])
            } else {
                match &list_schema {
                    Some(list) => list.clone(),
                    None => break,
                }
            };
            let item = self.build(
                &item_schema,
                &data_ptr.child(i.to_string()),
                values.and_then(|v| v.get(i)),
                false,
                depth + 1,
            )?;
            children.extend(item);
        }

        let item_ref = match list_schema {
            Some(list) => {
                let generic = self
                    .data_map
                    .key_for(data_ptr, self.arity, self.data_recursive);
                Some(self.ensure_library_entry(&list, &generic.child(WILDCARD), depth)?)
            }
            None => None,
        };
        Ok(ControlTemplate::Array {
            children,
            tuple_items: counts.tuple,
            item_ref,
            validators,
        })
    }

    /// Build the empty template for the schema at `schema_ptr` into the
    /// library unless it is built or being built. `$ref`s are followed to
    /// their target first. Returns the entry's key.
    fn ensure_library_entry(
        &mut self,
        schema_ptr: &Pointer,
        data_ptr: &Pointer,
        depth: usize,
    ) -> Result<Pointer, CompileError> {
        let compiled = self.compiled;
        let mut schema_ptr = schema_ptr.clone();
        let mut key = self
            .data_map
            .key_for(data_ptr, self.arity, self.data_recursive);
        if let Some(schema) = pointer::get(compiled, &schema_ptr) {
            if schema.get("$ref").is_some() {
                schema_ptr = ref_target(schema, data_ptr)?;
                if let Some(target_key) = schema_to_data_pointer(&schema_ptr, compiled) {
                    key = target_key;
                }
            }
        }
        if self.library.begin(&key) {
            tracing::debug!(key = %key, "building control library entry");
            let built = self.build(&schema_ptr, &key, None, false, depth + 1)?;
            let entry = built.unwrap_or_else(|| ControlTemplate::Leaf {
                value: Value::Null,
                disabled: false,
                validators: ValidatorSpec::new(),
            });
            self.library.finish(key.clone(), entry);
        }
        Ok(key)
    }
}

fn ref_target(schema: &Value, at: &Pointer) -> Result<Pointer, CompileError> {
    let reference = schema.get("$ref").and_then(Value::as_str).unwrap_or_default();
    Pointer::parse(reference).map_err(|_| CompileError::Internal {
        path: at.to_string(),
        message: format!("recursive $ref {:?} is not a local pointer", reference),
    })
}

// ===========================================================================
// Tests
// ===========================================================================
