//! Widget-type inference and schema-side rendering hints.

use serde_json::{Map, Value};

use crate::schema_utils::{has_enumerable_items, schema_type, title_map};

/// Infer the widget for a schema that names none.
pub fn infer_widget(schema: &Value) -> &'static str {
    let Some(obj) = schema.as_object() else {
        return "none";
    };
    let kind = schema_type(schema);
    match kind.as_deref() {
        Some("boolean") => return "checkbox",
        Some("object") => return "section",
        Some("array") => {
            let single = obj.get("maxItems").and_then(Value::as_u64) == Some(1);
            return if has_enumerable_items(schema) && !single {
                "checkboxes"
            } else {
                "array"
            };
        }
        Some("null") => return "none",
        _ => {}
    }
    if obj.contains_key("$ref") && obj.len() == 1 {
        return "$ref";
    }
    if obj.contains_key("enum") || title_map(schema).is_some() {
        return "select";
    }
    match kind.as_deref() {
        Some(numeric @ ("number" | "integer")) => {
            let bounded = ["minimum", "maximum", "multipleOf"]
                .iter()
                .all(|k| obj.contains_key(*k));
            if bounded {
                "range"
            } else if numeric == "integer" {
                "integer"
            } else {
                "number"
            }
        }
        _ => match obj.get("format").and_then(Value::as_str) {
            Some("date") => "date",
            Some("date-time") => "datetime-local",
            Some("time") => "time",
            Some("email") => "email",
            Some("uri" | "url") => "url",
            Some("color") => "color",
            _ => "text",
        },
    }
}

/// Widget named by the schema itself, via `x-schema-form` or `ui:widget`.
pub(crate) fn schema_widget_hint(schema: &Value) -> Option<&str> {
    let form = schema.get("x-schema-form");
    form.and_then(|f| f.get("type"))
        .or_else(|| form.and_then(|f| f.get("widget")))
        .or_else(|| schema.get("ui:widget"))
        .and_then(Value::as_str)
}

/// Containers whose children are object properties.
pub(crate) fn is_container(widget: &str) -> bool {
    matches!(widget, "section" | "fieldset" | "tabs" | "tab")
}

/// Containers whose children are array items.
pub(crate) fn is_array(widget: &str) -> bool {
    matches!(widget, "array" | "tabarray")
}

/// Rendering options a schema carries for its layout node.
pub(crate) fn schema_options(schema: &Value) -> Map<String, Value> {
    let mut options = Map::new();
    let Some(obj) = schema.as_object() else {
        return options;
    };
    for key in ["title", "description", "default"] {
        if let Some(value) = obj.get(key) {
            options.insert(key.to_string(), value.clone());
        }
    }
    if obj.get("readOnly").and_then(Value::as_bool) == Some(true) {
        options.insert("readonly".to_string(), Value::Bool(true));
    }
    let titles = title_map(schema).or_else(|| obj.get("items").and_then(title_map));
    if let Some(titles) = titles {
        options.insert("titleMap".to_string(), Value::Array(titles));
    }
    for (key, value) in obj {
        if let Some(name) = key.strip_prefix("ui:") {
            if name != "widget" && name != "order" {
                options.insert(name.to_string(), value.clone());
            }
        }
    }
    if let Some(Value::Object(form)) = obj.get("x-schema-form") {
        for (key, value) in form {
            if key != "type" && key != "widget" {
                options.insert(key.clone(), value.clone());
            }
        }
    }
    options
}
