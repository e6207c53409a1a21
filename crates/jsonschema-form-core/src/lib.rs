//! Compile a JSON Schema, an optional authored layout and optional initial
//! data into a form model.
//!
//! A compile pass runs, in order:
//!
//! 1. draft upgrade (optional), normalizing draft-03/04 keywords;
//! 2. reference resolution, which inlines non-recursive `$ref`s, folds
//!    `allOf`, and records recursion and tuple arity;
//! 3. the data map, one record per generic data pointer;
//! 4. the layout tree, synthesized or built from the authored layout;
//! 5. the control templates, with keyword validator records.
//!
//! The result is a [`CompiledForm`]. [`Form`] turns it into an editable
//! control tree; [`CompiledForm::format`] and [`CompiledForm::validate`]
//! work on plain data.

pub mod config;
pub mod control;
pub mod data_map;
pub mod diagnostic;
pub mod draft;
pub mod error;
pub mod formatter;
pub mod layout;
pub mod maps;
pub mod merge;
pub mod pointer;
pub mod resolver;
pub mod schema_utils;
pub mod validators;

use serde_json::{json, Value};

pub use config::{CompileOptions, FormatOptions, WidgetRegistry};
pub use control::{Control, ControlTemplate, ControlTree, Form};
pub use diagnostic::{Diagnostic, DiagnosticKind};
pub use error::{CompileError, ErrorCode, FormError};
pub use formatter::FormatOutcome;
pub use layout::{ArrayItemType, LayoutNode};
pub use maps::{ArityMap, DataMap, DataMapEntry, RecursiveRefMap, RefLibrary};
pub use merge::{merge_schemas, MergeOutcome};
pub use pointer::{Pointer, PointerError};
pub use resolver::ResolvedSchema;
pub use validators::{format_errors, validate_document, FieldError, MessageTable, Validator};

use control::TemplateCompiler;
use schema_utils::data_to_schema_pointer;

/// Everything a compile pass produces.
#[derive(Debug, Clone)]
pub struct CompiledForm {
    pub resolved: ResolvedSchema,
    pub data_map: DataMap,
    pub layout: Vec<LayoutNode>,
    /// Recursive layout targets by generic data pointer.
    pub layout_library: RefLibrary<LayoutNode>,
    pub template: ControlTemplate,
    /// Recursive control targets by generic data pointer.
    pub template_library: RefLibrary<ControlTemplate>,
    /// Recoverable conditions from every stage, in the order found.
    pub diagnostics: Vec<Diagnostic>,
    pub options: CompileOptions,
}

/// Compile `schema` (with an optional authored `layout` and initial `data`)
/// into a [`CompiledForm`].
///
/// # Errors
///
/// Returns [`CompileError`] for unresolvable references, depth overruns and
/// malformed pointers. Everything else is reported as a [`Diagnostic`].
pub fn compile(
    schema: &Value,
    layout: Option<&Value>,
    data: Option<&Value>,
    options: &CompileOptions,
) -> Result<CompiledForm, CompileError> {
    let upgraded;
    let schema = if options.upgrade_draft {
        upgraded = draft::upgrade_draft(schema, options)?;
        &upgraded
    } else {
        schema
    };

    let resolved = resolver::resolve(schema, options)?;
    let mut data_map = data_map::build_data_map(&resolved.compiled);
    let compiled_layout = layout::compile_layout(&resolved, &mut data_map, layout, data, options)?;
    let templates = control::compile_templates(&resolved, &data_map, data, options)?;

    let mut diagnostics = resolved.diagnostics.clone();
    diagnostics.extend(compiled_layout.diagnostics);

    // Surface bad keyword arguments (invalid patterns) at compile time.
    let mut validator_compiler = validators::ValidatorCompiler::new(options.anchor_patterns);
    control::materialize(&templates.root, &mut validator_compiler, &Pointer::root());
    diagnostics.extend(validator_compiler.diagnostics);

    tracing::debug!(
        data_map = data_map.len(),
        layout = compiled_layout.nodes.len(),
        diagnostics = diagnostics.len(),
        "compiled form"
    );

    Ok(CompiledForm {
        resolved,
        data_map,
        layout: compiled_layout.nodes,
        layout_library: compiled_layout.library,
        template: templates.root,
        template_library: templates.library,
        diagnostics,
        options: options.clone(),
    })
}

impl CompiledForm {
    /// The schema after reference resolution.
    pub fn schema(&self) -> &Value {
        &self.resolved.compiled
    }

    /// A fresh live control tree for the compiled data.
    pub fn materialize(&self) -> ControlTree {
        let mut compiler = validators::ValidatorCompiler::new(self.options.anchor_patterns);
        ControlTree::new(control::materialize(&self.template, &mut compiler, &Pointer::root()))
    }

    /// Clean `data` for output against this form's data map.
    pub fn format(&self, data: &Value, options: &FormatOptions) -> FormatOutcome {
        formatter::format_data(
            data,
            &self.data_map,
            &self.resolved.data_recursive,
            &self.resolved.arity,
            options,
        )
    }

    /// Validate a whole document against the compiled schema.
    pub fn validate(&self, data: &Value) -> Vec<FieldError> {
        validate_document(&self.resolved.compiled, data, self.options.anchor_patterns)
    }

    /// Expand a reference node from [`layout`](Self::layout) one level.
    pub fn expand_layout_ref(&self, node: &LayoutNode) -> Option<LayoutNode> {
        layout::expand_layout_ref(node, &self.layout_library)
    }

    /// A fresh template for the data at `data_ptr`, holding `value`.
    pub(crate) fn build_template(
        &self,
        data_ptr: &Pointer,
        value: Option<&Value>,
    ) -> Result<Option<ControlTemplate>, CompileError> {
        let Some(schema_ptr) = data_to_schema_pointer(data_ptr, &self.resolved.compiled) else {
            return Ok(None);
        };
        let key = self
            .data_map
            .key_for(data_ptr, &self.resolved.arity, &self.resolved.data_recursive);
        let required = self.data_map.get(&key).is_some_and(|entry| entry.required);
        let mut compiler = TemplateCompiler::new(
            &self.resolved,
            &self.data_map,
            &self.options,
            self.template_library.clone(),
        );
        compiler.build(&schema_ptr, data_ptr, value, required, 0)
    }

    /// JSON view of the compile products, for tooling.
    pub fn to_json(&self) -> Result<Value, CompileError> {
        Ok(json!({
            "schema": self.resolved.compiled,
            "dataMap": serde_json::to_value(&self.data_map)?,
            "arity": serde_json::to_value(&self.resolved.arity)?,
            "dataRecursive": serde_json::to_value(&self.resolved.data_recursive)?,
            "layout": serde_json::to_value(&self.layout)?,
            "layoutLibrary": serde_json::to_value(&self.layout_library)?,
            "template": serde_json::to_value(&self.template)?,
            "templateLibrary": serde_json::to_value(&self.template_library)?,
            "diagnostics": serde_json::to_value(&self.diagnostics)?,
        }))
    }
}
