//! Validator compiler: schema constraint keywords → composable predicates.
//!
//! Every predicate takes `(value, invert)` and returns `None` when the value
//! passes, or an [`ErrorMap`] (keyword → details) when it fails. `invert`
//! turns a predicate into its negation, which is how `not` is expressed.
//!
//! `pattern` is matched as a substring search unless
//! [`CompileOptions::anchor_patterns`](crate::CompileOptions) is set.

mod document;
mod format;
mod keyword;
mod messages;

use indexmap::IndexMap;
use regex::Regex;
use serde_json::Value;

use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::pointer::Pointer;
use crate::schema_utils::declared_types;

pub use document::{validate_document, FieldError};
pub use format::is_valid_format;
pub use keyword::KeywordValidator;
pub use messages::{format_errors, Message, MessageTable};

pub(crate) use keyword::{is_blank, json_equal};

/// Failed keywords with their details.
pub type ErrorMap = IndexMap<String, Value>;

/// Constraint keywords attached to one control, keyword → argument.
pub type ValidatorSpec = IndexMap<String, Value>;

const COMMON_KEYWORDS: &[&str] = &["type", "enum", "const", "allOf", "anyOf", "oneOf", "not"];
const STRING_KEYWORDS: &[&str] = &["minLength", "maxLength", "pattern", "format"];
const NUMBER_KEYWORDS: &[&str] = &[
    "minimum",
    "maximum",
    "exclusiveMinimum",
    "exclusiveMaximum",
    "multipleOf",
];
const ARRAY_KEYWORDS: &[&str] = &["minItems", "maxItems", "uniqueItems", "contains"];
const OBJECT_KEYWORDS: &[&str] = &["minProperties", "maxProperties"];

// ---------------------------------------------------------------------------
// Validator
// ---------------------------------------------------------------------------

/// A compiled, invertible predicate.
#[derive(Debug, Clone)]
pub enum Validator {
    Keyword(KeywordValidator),
    /// Valid iff every sub-validator is valid.
    AllOf(Vec<Validator>),
    /// Valid iff at least one sub-validator is valid.
    AnyOf(Vec<Validator>),
    /// Valid iff exactly one sub-validator is valid.
    OneOf(Vec<Validator>),
    /// Valid iff the wrapped validator, inverted, is valid.
    Not(Box<Validator>),
    /// Applies to one property of an object value.
    Property {
        key: String,
        required: bool,
        validator: Box<Validator>,
    },
    /// Applies to every item of an array value.
    Items(Box<Validator>),
}

impl Validator {
    /// The always-valid validator.
    pub fn accept_all() -> Self {
        Validator::AllOf(Vec::new())
    }

    pub fn validate(&self, value: Option<&Value>, invert: bool) -> Option<ErrorMap> {
        match self {
            Validator::Keyword(keyword) => keyword.check(value, invert),
            Validator::AllOf(all) if !invert => merge_all(all.iter().map(|v| v.validate(value, false))),
            // not(a and b) == not(a) or not(b)
            Validator::AllOf(all) => any_passes(all.iter().map(|v| v.validate(value, true))),
            Validator::AnyOf(any) if !invert => any_passes(any.iter().map(|v| v.validate(value, false))),
            Validator::AnyOf(any) => merge_all(any.iter().map(|v| v.validate(value, true))),
            Validator::OneOf(branches) => {
                let results: Vec<Option<ErrorMap>> =
                    branches.iter().map(|v| v.validate(value, false)).collect();
                let passing = results.iter().filter(|r| r.is_none()).count();
                if (passing == 1) != invert {
                    return None;
                }
                let mut errors = ErrorMap::new();
                errors.insert(
                    "oneOf".to_string(),
                    serde_json::json!({ "passingBranches": passing }),
                );
                for failed in results.into_iter().flatten() {
                    merge_into(&mut errors, failed);
                }
                Some(errors)
            }
            Validator::Not(inner) => inner.validate(value, !invert).map(|errors| {
                let mut wrapped = ErrorMap::new();
                wrapped.insert("not".to_string(), Value::Object(errors.into_iter().collect()));
                wrapped
            }),
            Validator::Property {
                key,
                required,
                validator,
            } => {
                let Some(Value::Object(obj)) = value else {
                    // Property constraints hold trivially for non-objects.
                    return invert.then(|| nested("properties", key, ErrorMap::new()));
                };
                match obj.get(key) {
                    None if *required != invert => {
                        let mut missing = ErrorMap::new();
                        missing.insert("required".to_string(), Value::Bool(true));
                        Some(nested("properties", key, missing))
                    }
                    None => None,
                    Some(child) => validator
                        .validate(Some(child), invert)
                        .map(|errors| nested("properties", key, errors)),
                }
            }
            Validator::Items(item) => {
                let Some(Value::Array(items)) = value else {
                    return invert.then(|| nested("items", "-", ErrorMap::new()));
                };
                if invert {
                    return any_passes(items.iter().enumerate().map(|(i, v)| {
                        item.validate(Some(v), true)
                            .map(|errors| nested("items", &i.to_string(), errors))
                    }));
                }
                merge_all(items.iter().enumerate().map(|(i, v)| {
                    item.validate(Some(v), false)
                        .map(|errors| nested("items", &i.to_string(), errors))
                }))
            }
        }
    }
}

/// `None` if every result passed, else all errors merged.
fn merge_all(results: impl Iterator<Item = Option<ErrorMap>>) -> Option<ErrorMap> {
    let mut merged: Option<ErrorMap> = None;
    for errors in results.flatten() {
        merge_into(merged.get_or_insert_with(ErrorMap::new), errors);
    }
    merged
}

/// `None` if any result passed, else all errors merged.
fn any_passes(results: impl Iterator<Item = Option<ErrorMap>>) -> Option<ErrorMap> {
    let mut merged = ErrorMap::new();
    let mut any = false;
    for result in results {
        any = true;
        match result {
            None => return None,
            Some(errors) => merge_into(&mut merged, errors),
        }
    }
    if !any {
        // No alternative can pass.
        merged.insert("anyOf".to_string(), Value::Object(Default::default()));
    }
    Some(merged)
}

fn merge_into(target: &mut ErrorMap, errors: ErrorMap) {
    for (keyword, details) in errors {
        match (target.get_mut(&keyword), details) {
            (Some(Value::Object(existing)), Value::Object(more)) => {
                for (k, v) in more {
                    existing.entry(k).or_insert(v);
                }
            }
            (Some(_), _) => {}
            (None, details) => {
                target.insert(keyword, details);
            }
        }
    }
}

fn nested(keyword: &str, key: &str, errors: ErrorMap) -> ErrorMap {
    let mut inner = serde_json::Map::new();
    inner.insert(key.to_string(), Value::Object(errors.into_iter().collect()));
    let mut wrapped = ErrorMap::new();
    wrapped.insert(keyword.to_string(), Value::Object(inner));
    wrapped
}

// ---------------------------------------------------------------------------
// Spec extraction
// ---------------------------------------------------------------------------

/// The constraint keywords of `schema` relevant to its declared type.
///
/// Untyped schemas keep every constraint keyword.
pub fn validator_spec(schema: &Value, required: bool) -> ValidatorSpec {
    let mut spec = ValidatorSpec::new();
    if required {
        spec.insert("required".to_string(), Value::Bool(true));
    }
    let Some(obj) = schema.as_object() else {
        return spec;
    };
    let types = declared_types(schema);
    let wants = |t: &str| types.is_empty() || types.contains(&t);
    let mut groups: Vec<&[&str]> = vec![COMMON_KEYWORDS];
    if wants("string") {
        groups.push(STRING_KEYWORDS);
    }
    if wants("number") || wants("integer") {
        groups.push(NUMBER_KEYWORDS);
    }
    if wants("array") {
        groups.push(ARRAY_KEYWORDS);
    }
    if wants("object") {
        groups.push(OBJECT_KEYWORDS);
    }
    for keyword in groups.into_iter().flatten() {
        if let Some(argument) = obj.get(*keyword) {
            spec.insert(keyword.to_string(), argument.clone());
        }
    }
    spec
}

// ---------------------------------------------------------------------------
// Compilation
// ---------------------------------------------------------------------------

/// Compiles [`ValidatorSpec`]s, collecting diagnostics for bad arguments.
#[derive(Debug, Default)]
pub struct ValidatorCompiler {
    anchor_patterns: bool,
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidatorCompiler {
    pub fn new(anchor_patterns: bool) -> Self {
        Self {
            anchor_patterns,
            diagnostics: Vec::new(),
        }
    }

    /// Compile a control's validator record. `at` locates diagnostics.
    pub fn compile_spec(&mut self, spec: &ValidatorSpec, at: &Pointer) -> Validator {
        let mut validators = Vec::new();
        for (keyword, argument) in spec {
            if let Some(v) = self.compile_keyword(keyword, argument, at) {
                validators.push(v);
            }
        }
        if validators.len() == 1 {
            return validators.remove(0);
        }
        Validator::AllOf(validators)
    }

    /// Compile a whole sub-schema, descending into `properties` and object
    /// `items`. Used for combinator branches and `contains`.
    pub fn compile_schema(&mut self, schema: &Value, at: &Pointer) -> Validator {
        let mut validators = match self.compile_spec(&validator_spec(schema, false), at) {
            Validator::AllOf(list) => list,
            single => vec![single],
        };
        let required: Vec<&str> = schema
            .get("required")
            .and_then(Value::as_array)
            .map(|keys| keys.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        let properties = schema.get("properties").and_then(Value::as_object);
        if let Some(properties) = properties {
            for (key, child) in properties {
                validators.push(Validator::Property {
                    key: key.clone(),
                    required: required.contains(&key.as_str()),
                    validator: Box::new(self.compile_schema(child, &at.child(key.as_str()))),
                });
            }
        }
        for key in required {
            if properties.is_some_and(|p| p.contains_key(key)) {
                continue;
            }
            validators.push(Validator::Property {
                key: key.to_string(),
                required: true,
                validator: Box::new(Validator::accept_all()),
            });
        }
        if let Some(items @ Value::Object(_)) = schema.get("items") {
            let item = self.compile_schema(items, &at.child("-"));
            validators.push(Validator::Items(Box::new(item)));
        }
        if validators.len() == 1 {
            return validators.remove(0);
        }
        Validator::AllOf(validators)
    }

    fn compile_keyword(&mut self, keyword: &str, argument: &Value, at: &Pointer) -> Option<Validator> {
        let count = || argument.as_u64();
        let number = || argument.as_f64();
        let kv = match keyword {
            "required" => argument.as_bool().filter(|r| *r).map(|_| KeywordValidator::Required)?,
            "type" => {
                let types: Vec<String> = match argument {
                    Value::String(t) => vec![t.clone()],
                    Value::Array(list) => list.iter().filter_map(Value::as_str).map(String::from).collect(),
                    _ => return None,
                };
                KeywordValidator::Type(types)
            }
            "enum" => KeywordValidator::Enum(argument.as_array()?.clone()),
            "const" => KeywordValidator::Const(argument.clone()),
            "minLength" => KeywordValidator::MinLength(count()?),
            "maxLength" => KeywordValidator::MaxLength(count()?),
            "pattern" => {
                let pattern = argument.as_str()?;
                let source = if self.anchor_patterns {
                    format!("^(?:{})$", pattern)
                } else {
                    pattern.to_string()
                };
                match Regex::new(&source) {
                    Ok(regex) => KeywordValidator::Pattern {
                        pattern: pattern.to_string(),
                        regex,
                    },
                    Err(err) => {
                        self.diagnostics.push(Diagnostic::new(
                            at.clone(),
                            DiagnosticKind::InvalidPattern {
                                pattern: pattern.to_string(),
                            },
                            format!("invalid pattern {:?}: {}", pattern, err),
                        ));
                        return None;
                    }
                }
            }
            "format" => KeywordValidator::Format(argument.as_str()?.to_string()),
            "minimum" => KeywordValidator::Minimum(number()?),
            "maximum" => KeywordValidator::Maximum(number()?),
            "exclusiveMinimum" => KeywordValidator::ExclusiveMinimum(number()?),
            "exclusiveMaximum" => KeywordValidator::ExclusiveMaximum(number()?),
            "multipleOf" => KeywordValidator::MultipleOf(number()?),
            "minItems" => KeywordValidator::MinItems(count()?),
            "maxItems" => KeywordValidator::MaxItems(count()?),
            "uniqueItems" => argument.as_bool().filter(|u| *u).map(|_| KeywordValidator::UniqueItems)?,
            "contains" => KeywordValidator::Contains {
                schema: argument.clone(),
                validator: Box::new(self.compile_schema(argument, at)),
            },
            "minProperties" => KeywordValidator::MinProperties(count()?),
            "maxProperties" => KeywordValidator::MaxProperties(count()?),
            "allOf" | "anyOf" | "oneOf" => {
                let branches: Vec<Validator> = argument
                    .as_array()?
                    .iter()
                    .map(|branch| self.compile_schema(branch, at))
                    .collect();
                return Some(match keyword {
                    "allOf" => Validator::AllOf(branches),
                    "anyOf" => Validator::AnyOf(branches),
                    _ => Validator::OneOf(branches),
                });
            }
            "not" => return Some(Validator::Not(Box::new(self.compile_schema(argument, at)))),
            _ => return None,
        };
        Some(Validator::Keyword(kv))
    }
}

// ===========================================================================
// Tests
// ===========================================================================
