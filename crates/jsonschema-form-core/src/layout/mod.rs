//! Layout compiler: the tree of fields a renderer draws.
//!
//! Two entry points share one [`LayoutCompiler`]: [`from_schema`] synthesizes
//! a full layout when none was authored, and [`from_layout`] walks a
//! hand-authored one, filling gaps from the schema. Both stop at recursive
//! `$ref`s and emit a reference node instead; the referenced subtree is built
//! once into the layout library and expanded on demand with
//! [`expand_layout_ref`].

mod from_layout;
mod from_schema;
mod widget;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::CompileOptions;
use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::error::CompileError;
use crate::maps::{ArityMap, DataMap, RecursiveRefMap, RefLibrary};
use crate::pointer::{self, Pointer};
use crate::resolver::ResolvedSchema;

pub use widget::infer_widget;

/// Widget type of reference nodes.
pub const REF_WIDGET: &str = "$ref";

/// Option key holding the layout-library key of a reference node.
pub const REF_POINTER_OPTION: &str = "refPointer";

/// Whether an array item sits at a fixed tuple position or in the list tail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrayItemType {
    Tuple,
    List,
}

/// One node of the layout tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutNode {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_pointer: Option<Pointer>,
    /// Widget type.
    #[serde(rename = "type")]
    pub widget: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub array_item: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub array_item_type: Option<ArrayItemType>,
    #[serde(default)]
    pub recursive_reference: bool,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub options: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<LayoutNode>,
}

impl LayoutNode {
    /// Layout-library key of a reference node.
    pub fn ref_pointer(&self) -> Option<Pointer> {
        if self.widget != REF_WIDGET {
            return None;
        }
        let raw = self.options.get(REF_POINTER_OPTION)?.as_str()?;
        Pointer::parse(raw).ok()
    }

    /// True if the node has the `required` option set.
    pub fn is_required(&self) -> bool {
        self.options.get("required").and_then(Value::as_bool) == Some(true)
    }

    /// Depth-first search, the node itself included.
    pub fn find(&self, predicate: &dyn Fn(&LayoutNode) -> bool) -> Option<&LayoutNode> {
        if predicate(self) {
            return Some(self);
        }
        self.items.iter().find_map(|item| item.find(predicate))
    }
}

/// Output of [`compile_layout`].
#[derive(Debug, Clone, Default)]
pub struct CompiledLayout {
    pub nodes: Vec<LayoutNode>,
    /// Reference targets by generic data pointer.
    pub library: RefLibrary<LayoutNode>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Build the layout tree, from `layout` if one was authored, otherwise from
/// the schema alone. Widget types are recorded into `data_map` as they are
/// decided.
pub fn compile_layout(
    resolved: &ResolvedSchema,
    data_map: &mut DataMap,
    layout: Option<&Value>,
    data: Option<&Value>,
    config: &CompileOptions,
) -> Result<CompiledLayout, CompileError> {
    let mut compiler = LayoutCompiler {
        compiled: &resolved.compiled,
        arity: &resolved.arity,
        data_recursive: &resolved.data_recursive,
        config,
        data,
        data_map,
        library: RefLibrary::default(),
        diagnostics: Vec::new(),
        bases: Vec::new(),
        placed: Vec::new(),
        next_id: 0,
    };
    let nodes = match layout {
        Some(layout) => compiler.build_from_layout(layout)?,
        None => compiler.build_from_schema(data)?,
    };
    tracing::debug!(
        nodes = nodes.len(),
        library = compiler.library.len(),
        "compiled layout"
    );
    Ok(CompiledLayout {
        nodes,
        library: compiler.library,
        diagnostics: compiler.diagnostics,
    })
}

/// A copy of the library entry behind a reference node, re-based onto the
/// node's data pointer and given fresh ids.
pub fn expand_layout_ref(node: &LayoutNode, library: &RefLibrary<LayoutNode>) -> Option<LayoutNode> {
    let key = node.ref_pointer()?;
    let target = node.data_pointer.clone()?;
    let mut copy = library.get(&key)?.clone();
    rebase_tree(&mut copy, &key, &target, &node.id);
    copy.array_item = node.array_item;
    copy.array_item_type = node.array_item_type;
    Some(copy)
}

fn rebase_tree(node: &mut LayoutNode, from: &Pointer, to: &Pointer, id_prefix: &str) {
    node.id = format!("{}:{}", id_prefix, node.id);
    if let Some(rebased) = node.data_pointer.as_ref().and_then(|p| p.rebase(from, to)) {
        node.data_pointer = Some(rebased);
    }
    for item in &mut node.items {
        rebase_tree(item, from, to, id_prefix);
    }
}

// ---------------------------------------------------------------------------
// Shared compiler state
// ---------------------------------------------------------------------------

pub(crate) struct LayoutCompiler<'a> {
    compiled: &'a Value,
    arity: &'a ArityMap,
    data_recursive: &'a RecursiveRefMap,
    config: &'a CompileOptions,
    /// Initial data, for authored layouts.
    data: Option<&'a Value>,
    data_map: &'a mut DataMap,
    library: RefLibrary<LayoutNode>,
    diagnostics: Vec<Diagnostic>,
    /// Authored generic item pointer → concrete item pointer, outermost first.
    bases: Vec<(Pointer, Pointer)>,
    /// Root properties an authored layout places explicitly.
    placed: Vec<String>,
    next_id: usize,
}

impl<'a> LayoutCompiler<'a> {
    fn check_depth(&self, depth: usize, at: &Pointer) -> Result<(), CompileError> {
        if depth > self.config.max_depth {
            return Err(CompileError::RecursionDepthExceeded {
                path: at.to_string(),
                max_depth: self.config.max_depth,
            });
        }
        Ok(())
    }

    /// The DataMap key describing `data_pointer`.
    fn generic(&self, data_pointer: &Pointer) -> Pointer {
        self.data_map
            .key_for(data_pointer, self.arity, self.data_recursive)
    }

    /// `explicit` if the registry knows it, otherwise the inferred widget.
    fn resolve_widget(&mut self, explicit: Option<&str>, schema: &Value, at: &Pointer) -> String {
        let inferred = widget::infer_widget(schema);
        match explicit.or_else(|| widget::schema_widget_hint(schema)) {
            Some(widget) if self.config.widgets.contains(widget) => widget.to_string(),
            Some(widget) => {
                self.diagnostics.push(Diagnostic::new(
                    at.clone(),
                    DiagnosticKind::UnknownWidgetType {
                        widget: widget.to_string(),
                    },
                    format!("unknown widget type {:?}; using {:?}", widget, inferred),
                ));
                inferred.to_string()
            }
            None => inferred.to_string(),
        }
    }

    /// A fresh node, with options from `schema` and the DataMap record.
    fn new_node(&mut self, widget: &str, data_pointer: Option<&Pointer>, schema: &Value) -> LayoutNode {
        self.next_id += 1;
        let mut node = LayoutNode {
            id: format!("layout-{}", self.next_id),
            data_pointer: data_pointer.cloned(),
            widget: widget.to_string(),
            name: None,
            array_item: false,
            array_item_type: None,
            recursive_reference: false,
            options: widget::schema_options(schema),
            items: Vec::new(),
        };
        if let Some(data_pointer) = data_pointer {
            node.name = data_pointer
                .last()
                .filter(|key| pointer::index_of(key).is_none() && *key != pointer::WILDCARD)
                .map(str::to_string);
            let generic = self.generic(data_pointer);
            if let Some(entry) = self.data_map.get_mut(&generic) {
                if entry.widget_type.is_none() && widget != REF_WIDGET {
                    entry.widget_type = Some(widget.to_string());
                }
                if entry.required {
                    node.options.insert("required".to_string(), Value::Bool(true));
                }
            }
        }
        node
    }
}

// ===========================================================================
// Tests
// ===========================================================================
