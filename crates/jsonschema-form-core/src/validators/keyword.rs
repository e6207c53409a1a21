//! Single-keyword predicates.

use regex::Regex;
use serde_json::{json, Value};

use super::format::is_valid_format;
use super::{ErrorMap, Validator};
use crate::schema_utils::json_type_name;

/// One constraint keyword with its compiled argument.
#[derive(Debug, Clone)]
pub enum KeywordValidator {
    Required,
    Type(Vec<String>),
    Enum(Vec<Value>),
    Const(Value),
    MinLength(u64),
    MaxLength(u64),
    Pattern { pattern: String, regex: Regex },
    Format(String),
    Minimum(f64),
    Maximum(f64),
    ExclusiveMinimum(f64),
    ExclusiveMaximum(f64),
    MultipleOf(f64),
    MinItems(u64),
    MaxItems(u64),
    UniqueItems,
    Contains { schema: Value, validator: Box<Validator> },
    MinProperties(u64),
    MaxProperties(u64),
}

impl KeywordValidator {
    pub fn keyword(&self) -> &'static str {
        match self {
            KeywordValidator::Required => "required",
            KeywordValidator::Type(_) => "type",
            KeywordValidator::Enum(_) => "enum",
            KeywordValidator::Const(_) => "const",
            KeywordValidator::MinLength(_) => "minLength",
            KeywordValidator::MaxLength(_) => "maxLength",
            KeywordValidator::Pattern { .. } => "pattern",
            KeywordValidator::Format(_) => "format",
            KeywordValidator::Minimum(_) => "minimum",
            KeywordValidator::Maximum(_) => "maximum",
            KeywordValidator::ExclusiveMinimum(_) => "exclusiveMinimum",
            KeywordValidator::ExclusiveMaximum(_) => "exclusiveMaximum",
            KeywordValidator::MultipleOf(_) => "multipleOf",
            KeywordValidator::MinItems(_) => "minItems",
            KeywordValidator::MaxItems(_) => "maxItems",
            KeywordValidator::UniqueItems => "uniqueItems",
            KeywordValidator::Contains { .. } => "contains",
            KeywordValidator::MinProperties(_) => "minProperties",
            KeywordValidator::MaxProperties(_) => "maxProperties",
        }
    }

    /// `None` if the value satisfies the keyword (or, with `invert`, if it
    /// does not). Blank values (absent, `null`, `""`) satisfy every keyword
    /// except `required`, in both modes.
    pub fn check(&self, value: Option<&Value>, invert: bool) -> Option<ErrorMap> {
        let blank = is_blank(value);
        if let KeywordValidator::Required = self {
            let valid = !blank;
            return (valid == invert).then(|| single("required", Value::Bool(true)));
        }
        let value = value.filter(|_| !blank)?;
        let (valid, details) = self.test(value);
        (valid == invert).then(|| single(self.keyword(), details))
    }

    fn test(&self, value: &Value) -> (bool, Value) {
        let current = value.clone();
        match self {
            KeywordValidator::Required => (true, Value::Bool(true)),
            KeywordValidator::Type(types) => (
                types.iter().any(|t| has_type(value, t)),
                json!({ "requiredType": types, "currentValue": current }),
            ),
            KeywordValidator::Enum(allowed) => (
                allowed.iter().any(|a| json_equal(a, value)),
                json!({ "allowedValues": allowed, "currentValue": current }),
            ),
            KeywordValidator::Const(required) => (
                json_equal(required, value),
                json!({ "requiredValue": required, "currentValue": current }),
            ),
            KeywordValidator::MinLength(min) => match value.as_str() {
                Some(s) => {
                    let len = s.chars().count() as u64;
                    (
                        len >= *min,
                        json!({ "minimumLength": min, "currentLength": len }),
                    )
                }
                None => (true, Value::Null),
            },
            KeywordValidator::MaxLength(max) => match value.as_str() {
                Some(s) => {
                    let len = s.chars().count() as u64;
                    (
                        len <= *max,
                        json!({ "maximumLength": max, "currentLength": len }),
                    )
                }
                None => (true, Value::Null),
            },
            KeywordValidator::Pattern { pattern, regex } => match value.as_str() {
                Some(s) => (
                    regex.is_match(s),
                    json!({ "requiredPattern": pattern, "currentValue": current }),
                ),
                None => (true, Value::Null),
            },
            KeywordValidator::Format(format) => match value.as_str() {
                Some(s) => (
                    is_valid_format(format, s),
                    json!({ "requiredFormat": format, "currentValue": current }),
                ),
                None => (true, Value::Null),
            },
            KeywordValidator::Minimum(min) => number_check(value, |n| n >= *min, "minimumValue", *min),
            KeywordValidator::Maximum(max) => number_check(value, |n| n <= *max, "maximumValue", *max),
            KeywordValidator::ExclusiveMinimum(min) => {
                number_check(value, |n| n > *min, "exclusiveMinimumValue", *min)
            }
            KeywordValidator::ExclusiveMaximum(max) => {
                number_check(value, |n| n < *max, "exclusiveMaximumValue", *max)
            }
            KeywordValidator::MultipleOf(step) => {
                number_check(value, |n| is_multiple_of(n, *step), "multipleOfValue", *step)
            }
            KeywordValidator::MinItems(min) => match value.as_array() {
                Some(items) => (
                    items.len() as u64 >= *min,
                    json!({ "minimumItems": min, "currentItems": items.len() }),
                ),
                None => (true, Value::Null),
            },
            KeywordValidator::MaxItems(max) => match value.as_array() {
                Some(items) => (
                    items.len() as u64 <= *max,
                    json!({ "maximumItems": max, "currentItems": items.len() }),
                ),
                None => (true, Value::Null),
            },
            KeywordValidator::UniqueItems => match value.as_array() {
                Some(items) => {
                    let duplicates = duplicate_items(items);
                    (
                        duplicates.is_empty(),
                        json!({ "duplicateItems": duplicates }),
                    )
                }
                None => (true, Value::Null),
            },
            KeywordValidator::Contains { schema, validator } => match value.as_array() {
                Some(items) => (
                    items
                        .iter()
                        .any(|item| validator.validate(Some(item), false).is_none()),
                    json!({ "requiredItem": schema, "currentItems": items.len() }),
                ),
                None => (true, Value::Null),
            },
            KeywordValidator::MinProperties(min) => match value.as_object() {
                Some(obj) => (
                    obj.len() as u64 >= *min,
                    json!({ "minimumProperties": min, "currentProperties": obj.len() }),
                ),
                None => (true, Value::Null),
            },
            KeywordValidator::MaxProperties(max) => match value.as_object() {
                Some(obj) => (
                    obj.len() as u64 <= *max,
                    json!({ "maximumProperties": max, "currentProperties": obj.len() }),
                ),
                None => (true, Value::Null),
            },
        }
    }
}

fn single(keyword: &str, details: Value) -> ErrorMap {
    let mut errors = ErrorMap::new();
    errors.insert(keyword.to_string(), details);
    errors
}

/// Absent, `null`, or the empty string.
pub(crate) fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

fn number_check(
    value: &Value,
    predicate: impl Fn(f64) -> bool,
    limit_name: &str,
    limit: f64,
) -> (bool, Value) {
    match value.as_f64() {
        Some(n) => (
            predicate(n),
            json!({ limit_name: limit, "currentValue": value }),
        ),
        None => (true, Value::Null),
    }
}

fn has_type(value: &Value, required: &str) -> bool {
    match (required, value) {
        ("number", Value::Number(_)) => true,
        ("integer", Value::Number(n)) => n.as_f64().is_some_and(|f| f.fract() == 0.0),
        _ => json_type_name(value) == required,
    }
}

fn is_multiple_of(n: f64, step: f64) -> bool {
    if step <= 0.0 {
        return true;
    }
    let quotient = n / step;
    (quotient - quotient.round()).abs() < 1e-9 * quotient.abs().max(1.0)
}

/// Structural equality where `1` and `1.0` are the same number.
pub(crate) fn json_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x == y || x.as_f64() == y.as_f64(),
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| json_equal(a, b))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(k, v)| y.get(k).is_some_and(|other| json_equal(v, other)))
        }
        _ => a == b,
    }
}

/// Every value that occurs more than once, listed once each.
fn duplicate_items(items: &[Value]) -> Vec<Value> {
    let mut duplicates: Vec<Value> = Vec::new();
    for (i, item) in items.iter().enumerate() {
        let repeated = items[i + 1..].iter().any(|other| json_equal(item, other));
        if repeated && !duplicates.iter().any(|d| json_equal(d, item)) {
            duplicates.push(item.clone());
        }
    }
    duplicates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_and_blank_values() {
        let required = KeywordValidator::Required;
        assert!(required.check(None, false).is_some());
        assert!(required.check(Some(&json!("")), false).is_some());
        assert!(required.check(Some(&json!(0)), false).is_none());
        assert!(required.check(None, true).is_none());

        // Blank values pass everything else.
        assert!(KeywordValidator::MinLength(3).check(Some(&json!("")), false).is_none());
        assert!(KeywordValidator::MinLength(3).check(None, true).is_none());
    }

    #[test]
    fn test_min_length_details() {
        let errors = KeywordValidator::MinLength(3)
            .check(Some(&json!("ab")), false)
            .unwrap();
        assert_eq!(
            errors["minLength"],
            json!({ "minimumLength": 3, "currentLength": 2 })
        );
    }

    #[test]
    fn test_invert_flips_result() {
        let max = KeywordValidator::Maximum(10.0);
        assert!(max.check(Some(&json!(5)), false).is_none());
        assert!(max.check(Some(&json!(5)), true).is_some());
        assert!(max.check(Some(&json!(50)), true).is_none());
    }

    #[test]
    fn test_integer_type_accepts_whole_floats() {
        let t = KeywordValidator::Type(vec!["integer".to_string()]);
        assert!(t.check(Some(&json!(3.0)), false).is_none());
        assert!(t.check(Some(&json!(3.5)), false).is_some());
        assert!(t.check(Some(&json!("3")), false).is_some());
    }

    #[test]
    fn test_unique_items_detects_separated_duplicates() {
        let errors = KeywordValidator::UniqueItems
            .check(Some(&json!([1, 2, 3, 1, 2])), false)
            .unwrap();
        assert_eq!(errors["uniqueItems"]["duplicateItems"], json!([1, 2]));
        assert!(KeywordValidator::UniqueItems
            .check(Some(&json!([1, "1", [1]])), false)
            .is_none());
    }

    #[test]
    fn test_multiple_of_with_decimals() {
        let m = KeywordValidator::MultipleOf(0.1);
        assert!(m.check(Some(&json!(0.3)), false).is_none());
        assert!(m.check(Some(&json!(0.35)), false).is_some());
    }

    #[test]
    fn test_enum_numeric_equality() {
        let e = KeywordValidator::Enum(vec![json!(1), json!("a")]);
        assert!(e.check(Some(&json!(1.0)), false).is_none());
        assert!(e.check(Some(&json!("b")), false).is_some());
    }
}
