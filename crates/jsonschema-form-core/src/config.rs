//! Configuration for form compilation.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Widget types every registry recognizes, in addition to the standard set.
///
/// `$ref` nodes are produced by the compiler itself and must always resolve.
const BUILTIN_WIDGETS: &[&str] = &["$ref", "none"];

/// Widget types understood by a stock rendering layer.
pub const STANDARD_WIDGETS: &[&str] = &[
    "array",
    "button",
    "checkbox",
    "checkboxes",
    "color",
    "date",
    "datetime-local",
    "email",
    "fieldset",
    "file",
    "help",
    "hidden",
    "integer",
    "message",
    "month",
    "number",
    "password",
    "radios",
    "range",
    "search",
    "section",
    "select",
    "submit",
    "tab",
    "tabarray",
    "tabs",
    "tel",
    "text",
    "textarea",
    "time",
    "url",
    "week",
];

/// The set of widget types the active rendering layer can draw.
///
/// Serialized as a plain list of widget names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WidgetRegistry(BTreeSet<String>);

impl WidgetRegistry {
    /// A registry holding only the compiler's own widget types.
    pub fn empty() -> Self {
        Self(BTreeSet::new())
    }

    /// Register an additional widget type.
    pub fn with(mut self, widget: impl Into<String>) -> Self {
        self.0.insert(widget.into());
        self
    }

    pub fn contains(&self, widget: &str) -> bool {
        BUILTIN_WIDGETS.contains(&widget) || self.0.contains(widget)
    }
}

impl Default for WidgetRegistry {
    fn default() -> Self {
        Self(STANDARD_WIDGETS.iter().map(|w| w.to_string()).collect())
    }
}

/// Options for [`format`](crate::CompiledForm::format).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct FormatOptions {
    /// Emit every declared array/object field, as `[]`/`{}` when empty.
    pub return_empty_fields: bool,
    /// Apply lossy coercions and complete partial `date-time` values.
    pub fix_errors: bool,
}

/// Options for form compilation.
///
/// ## Serialization Format
///
/// Fields are serialized in `kebab-case` (e.g., `max-depth`, `anchor-patterns`).
/// This naming convention is part of the public contract for config files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CompileOptions {
    /// Maximum traversal depth for every recursive walk (stack overflow guard).
    pub max_depth: usize,
    /// Widget types the rendering layer understands.
    pub widgets: WidgetRegistry,
    /// Defaults for `format` calls made through a live form.
    pub format: FormatOptions,
    /// Match `pattern` against the whole value instead of any substring.
    pub anchor_patterns: bool,
    /// Normalize draft-03/04 keywords before resolving references.
    pub upgrade_draft: bool,
    /// Seed leaf controls from schema `default` when the data has no value.
    pub set_schema_defaults: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            max_depth: 64,
            widgets: WidgetRegistry::default(),
            format: FormatOptions::default(),
            anchor_patterns: false,
            upgrade_draft: true,
            set_schema_defaults: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_options_serde_round_trip() {
        let opts = CompileOptions {
            max_depth: 10,
            widgets: WidgetRegistry::empty().with("rating"),
            format: FormatOptions {
                return_empty_fields: true,
                fix_errors: false,
            },
            anchor_patterns: true,
            upgrade_draft: false,
            set_schema_defaults: true,
        };

        let json = serde_json::to_string(&opts).unwrap();

        assert!(json.contains("\"max-depth\""));
        assert!(json.contains("\"anchor-patterns\""));
        assert!(json.contains("\"return-empty-fields\""));
        assert!(json.contains("[\"rating\"]"));

        let deserialized: CompileOptions = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.max_depth, 10);
        assert!(deserialized.widgets.contains("rating"));
        assert!(!deserialized.widgets.contains("text"));
        assert!(deserialized.format.return_empty_fields);
        assert!(deserialized.anchor_patterns);
        assert!(!deserialized.upgrade_draft);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let opts: CompileOptions = serde_json::from_str(r#"{"max-depth": 8}"#).unwrap();
        assert_eq!(opts.max_depth, 8);
        assert!(opts.upgrade_draft);
        assert!(opts.widgets.contains("checkbox"));
    }

    #[test]
    fn test_builtin_widgets_always_registered() {
        let registry = WidgetRegistry::empty();
        assert!(registry.contains("$ref"));
        assert!(registry.contains("none"));
        assert!(!registry.contains("text"));
    }
}
