//! Data formatting: reshape a data document to what the schema declares.
//!
//! The data and the [`DataMap`] are walked together. Each value is looked up
//! by its generic pointer (folded through the recursive map when the generic
//! pointer has no record of its own) and coerced to the declared type:
//!
//! | Got | Declared | Default | `fix_errors` |
//! |-----|----------|---------|--------------|
//! | number/boolean | `"string"` | `to_string()` | same |
//! | `"string"` | `"integer"` | parse as i64 (roundtrip) | parse, truncate |
//! | `"string"` | `"number"` | parse as f64 (roundtrip) | parse |
//! | `"true"`/`"false"` | `"boolean"` | parse | also `1`/`0`, `"on"`/`"off"`, ... |
//! | boolean | `"integer"`/`"number"` | dropped | `1`/`0` |
//!
//! Values that cannot be coerced are dropped. Formatting a formatted
//! document returns it unchanged.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::config::FormatOptions;
use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::maps::{ArityMap, DataMap, DataMapEntry, RecursiveRefMap};
use crate::pointer::{self, Pointer};

/// Formatted data plus every value that had no schema record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormatOutcome {
    pub data: Value,
    /// Values copied through unformatted.
    pub unresolved: Vec<Diagnostic>,
}

/// Format `data` against the maps built by a compile pass.
pub fn format_data(
    data: &Value,
    data_map: &DataMap,
    recursive: &RecursiveRefMap,
    arity: &ArityMap,
    options: &FormatOptions,
) -> FormatOutcome {
    let mut formatter = Formatter {
        data_map,
        recursive,
        arity,
        options,
        unresolved: Vec::new(),
    };
    let root = Pointer::root();
    let data = formatter.format_node(data, &root).unwrap_or_else(|| empty_like(data));
    FormatOutcome {
        data,
        unresolved: formatter.unresolved,
    }
}

struct Formatter<'a> {
    data_map: &'a DataMap,
    recursive: &'a RecursiveRefMap,
    arity: &'a ArityMap,
    options: &'a FormatOptions,
    unresolved: Vec<Diagnostic>,
}

impl<'a> Formatter<'a> {
    fn generic(&self, at: &Pointer) -> Pointer {
        self.data_map.key_for(at, self.arity, self.recursive)
    }

    fn format_node(&mut self, value: &Value, at: &Pointer) -> Option<Value> {
        let generic = self.generic(at);
        let record = self.data_map.get(&generic);
        let declared = record.and_then(|r| r.schema_type.as_deref());

        match value {
            Value::Object(_) | Value::Array(_) if declared.is_some_and(is_primitive_type) => {
                self.options.return_empty_fields.then_some(Value::Null)
            }
            Value::Object(fields) => {
                let mut out = Map::new();
                for (key, child) in fields {
                    if let Some(formatted) = self.format_node(child, &at.child(key.as_str())) {
                        out.insert(key.clone(), formatted);
                    }
                }
                self.add_empty_children(&mut out, at, &generic);
                self.keep_container(Value::Object(out), at)
            }
            Value::Array(items) => {
                let mut out: Vec<Value> = Vec::new();
                for (i, item) in items.iter().enumerate() {
                    if let Some(formatted) = self.format_node(item, &at.child(i.to_string())) {
                        out.resize(i, Value::Null);
                        out.push(formatted);
                    }
                }
                self.keep_container(Value::Array(out), at)
            }
            primitive => match record {
                Some(record) => match record.schema_type.as_deref() {
                    Some(container @ ("array" | "object")) => self
                        .options
                        .return_empty_fields
                        .then(|| self.empty_container(container, at)),
                    _ => self.format_primitive(primitive, record),
                },
                None => {
                    self.unresolved.push(Diagnostic::new(
                        at.clone(),
                        DiagnosticKind::UnresolvedDataPointer,
                        format!("no schema record for data value at \"{}\"", at),
                    ));
                    Some(primitive.clone())
                }
            },
        }
    }

    /// Empty containers survive only at the root or with `return_empty_fields`.
    fn keep_container(&self, value: Value, at: &Pointer) -> Option<Value> {
        let empty = match &value {
            Value::Object(map) => map.is_empty(),
            Value::Array(items) => items.is_empty(),
            _ => false,
        };
        (!empty || at.is_root() || self.options.return_empty_fields).then_some(value)
    }

    /// Create missing array/object children: required ones always, every
    /// declared one with `return_empty_fields`. Children reached only through
    /// a recursive reference are left out so the fill stays finite.
    fn add_empty_children(&mut self, out: &mut Map<String, Value>, at: &Pointer, generic: &Pointer) {
        let missing: Vec<(String, String)> = self
            .data_map
            .children(generic)
            .filter(|(key, _)| !out.contains_key(*key) && *key != pointer::WILDCARD)
            .filter(|(_, entry)| entry.required || self.options.return_empty_fields)
            .filter_map(|(key, entry)| match entry.schema_type.as_deref() {
                Some(t @ ("array" | "object")) => Some((key.to_string(), t.to_string())),
                _ => None,
            })
            .collect();
        for (key, container) in missing {
            let child_at = at.child(key.as_str());
            if self.generic(&child_at) != generic.child(key.as_str()) {
                continue;
            }
            let filled = self.empty_container(&container, &child_at);
            out.insert(key, filled);
        }
    }

    /// An empty container for `at`, with its own missing children filled in.
    /// Always kept, even when it ends up empty.
    fn empty_container(&mut self, container: &str, at: &Pointer) -> Value {
        let empty = match container {
            "array" => Value::Array(Vec::new()),
            _ => Value::Object(Map::new()),
        };
        self.format_node(&empty, at).unwrap_or(empty)
    }

    fn format_primitive(&self, value: &Value, record: &DataMapEntry) -> Option<Value> {
        let return_empty = self.options.return_empty_fields;
        let declared = match record.schema_type.as_deref() {
            Some("null") => return Some(Value::Null),
            Some(t) if is_primitive_type(t) => t,
            _ => return Some(value.clone()),
        };

        let coerced = match value {
            Value::Null => return return_empty.then_some(Value::Null),
            Value::String(s) if s.is_empty() => {
                if !return_empty {
                    return None;
                }
                (declared == "string").then(|| value.clone())
            }
            _ if self.options.fix_errors => coerce_lossy(value, declared),
            _ => coerce_lossless(value, declared),
        };

        let coerced = match coerced {
            Some(Value::String(s))
                if self.options.fix_errors
                    && record.schema_format.as_deref() == Some("date-time") =>
            {
                Some(Value::String(complete_date_time(&s)))
            }
            other => other,
        };
        coerced.or_else(|| return_empty.then_some(Value::Null))
    }
}

fn is_primitive_type(t: &str) -> bool {
    matches!(t, "string" | "integer" | "number" | "boolean" | "null")
}

fn empty_like(value: &Value) -> Value {
    match value {
        Value::Array(_) => Value::Array(Vec::new()),
        Value::Object(_) => Value::Object(Map::new()),
        _ => Value::Null,
    }
}

// ---------------------------------------------------------------------------
// Coercion
// ---------------------------------------------------------------------------

/// Coercions that lose no information. `None` if none applies.
fn coerce_lossless(value: &Value, declared: &str) -> Option<Value> {
    match (declared, value) {
        ("string", Value::String(_)) => Some(value.clone()),
        ("string", Value::Number(n)) => Some(Value::String(n.to_string())),
        ("string", Value::Bool(b)) => Some(Value::String(b.to_string())),

        ("integer", Value::Number(n)) => whole_number(n).map(Value::from),
        ("integer", Value::String(s)) => s
            .parse::<i64>()
            .ok()
            .filter(|i| i.to_string() == *s)
            .map(Value::from),

        ("number", Value::Number(_)) => Some(value.clone()),
        ("number", Value::String(s)) => s
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .filter(|_| number_roundtrips(s))
            .and_then(number_value),

        ("boolean", Value::Bool(_)) => Some(value.clone()),
        ("boolean", Value::String(s)) => match s.as_str() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        _ => None,
    }
}

/// Best-effort coercions, applied with `fix_errors`.
fn coerce_lossy(value: &Value, declared: &str) -> Option<Value> {
    if let Some(exact) = coerce_lossless(value, declared) {
        return Some(exact);
    }
    match (declared, value) {
        ("integer", Value::Number(n)) => n.as_f64().map(|f| Value::from(f.trunc() as i64)),
        ("integer", Value::String(s)) => parse_float(s).map(|f| Value::from(f.trunc() as i64)),
        ("integer", Value::Bool(b)) => Some(Value::from(i64::from(*b))),

        ("number", Value::String(s)) => parse_float(s).and_then(number_value),
        ("number", Value::Bool(b)) => Some(Value::from(i64::from(*b))),

        ("boolean", Value::Number(n)) => n.as_f64().map(|f| Value::Bool(f != 0.0)),
        ("boolean", Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "on" | "yes" => Some(Value::Bool(true)),
            "false" | "0" | "off" | "no" => Some(Value::Bool(false)),
            _ => None,
        },
        _ => None,
    }
}

fn whole_number(n: &Number) -> Option<i64> {
    n.as_i64().or_else(|| {
        n.as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

/// Whole floats become integers so `"3"` and `3` format the same.
fn number_value(f: f64) -> Option<Value> {
    if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        return Some(Value::from(f as i64));
    }
    Number::from_f64(f).map(Value::Number)
}

/// `s` is exactly how a JSON number would be written, give or take a fraction.
fn number_roundtrips(s: &str) -> bool {
    s.trim() == s && !s.starts_with('+') && !s.starts_with('.') && !s.ends_with('.')
}

fn parse_float(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|f| f.is_finite())
}

// ---------------------------------------------------------------------------
// Date-time completion
// ---------------------------------------------------------------------------

static DATE_ONLY_RE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^\d{4}-[01]\d-[0-3]\d$").ok());

static PARTIAL_DATE_TIME_RE: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(
        r"^(?P<date>\d{4}-[01]\d-[0-3]\d)[Tt ](?P<hour>[0-2]\d)(?::(?P<minute>[0-5]\d)(?::(?P<second>[0-5]\d(?:\.\d+)?))?)?(?P<zone>[Zz]|[+-]\d{2}:\d{2})?$",
    )
    .ok()
});

/// Fill in the missing parts of a partial `date-time`: midnight for a bare
/// date, zeros for absent minutes or seconds, and UTC for a missing zone.
/// Anything else is returned unchanged.
fn complete_date_time(s: &str) -> String {
    if DATE_ONLY_RE.as_ref().is_some_and(|re| re.is_match(s)) {
        return format!("{}T00:00:00Z", s);
    }
    let Some(caps) = PARTIAL_DATE_TIME_RE.as_ref().and_then(|re| re.captures(s)) else {
        return s.to_string();
    };
    let field = |name: &str| caps.name(name).map(|m| m.as_str());
    let (Some(date), Some(hour)) = (field("date"), field("hour")) else {
        return s.to_string();
    };
    let zone = match field("zone") {
        Some("z") | None => "Z",
        Some(zone) => zone,
    };
    format!(
        "{}T{}:{}:{}{}",
        date,
        hour,
        field("minute").unwrap_or("00"),
        field("second").unwrap_or("00"),
        zone
    )
}

// ===========================================================================
// Tests
// ===========================================================================
