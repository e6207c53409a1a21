//! Live controls with compiled validators.

use indexmap::IndexMap;
use serde_json::Value;

use super::ControlTemplate;
use crate::pointer::{index_of, Pointer};
use crate::validators::{FieldError, Validator, ValidatorCompiler};

/// One live control.
#[derive(Debug, Clone)]
pub enum Control {
    Group {
        children: IndexMap<String, Control>,
        validator: Validator,
    },
    Array {
        children: Vec<Control>,
        tuple_items: usize,
        item_ref: Option<Pointer>,
        max_items: Option<usize>,
        validator: Validator,
    },
    Leaf {
        value: Value,
        disabled: bool,
        validator: Validator,
    },
}

/// Compile `template`, located at data pointer `at`, into a live control.
pub fn materialize(template: &ControlTemplate, compiler: &mut ValidatorCompiler, at: &Pointer) -> Control {
    let validator = compiler.compile_spec(template.validators(), at);
    match template {
        ControlTemplate::Group { children, .. } => Control::Group {
            children: children
                .iter()
                .map(|(key, child)| (key.clone(), materialize(child, compiler, &at.child(key.as_str()))))
                .collect(),
            validator,
        },
        ControlTemplate::Array {
            children,
            tuple_items,
            item_ref,
            validators,
        } => Control::Array {
            children: children
                .iter()
                .enumerate()
                .map(|(i, child)| materialize(child, compiler, &at.child(i.to_string())))
                .collect(),
            tuple_items: *tuple_items,
            item_ref: item_ref.clone(),
            max_items: validators
                .get("maxItems")
                .and_then(Value::as_u64)
                .and_then(|n| usize::try_from(n).ok()),
            validator,
        },
        ControlTemplate::Leaf { value, disabled, .. } => Control::Leaf {
            value: value.clone(),
            disabled: *disabled,
            validator,
        },
    }
}

impl Control {
    /// Current value, with `null` for empty leaves.
    pub fn value(&self) -> Value {
        match self {
            Control::Group { children, .. } => Value::Object(
                children
                    .iter()
                    .map(|(key, child)| (key.clone(), child.value()))
                    .collect(),
            ),
            Control::Array { children, .. } => Value::Array(children.iter().map(Control::value).collect()),
            Control::Leaf { value, .. } => value.clone(),
        }
    }

    pub fn validator(&self) -> &Validator {
        match self {
            Control::Group { validator, .. }
            | Control::Array { validator, .. }
            | Control::Leaf { validator, .. } => validator,
        }
    }

    fn child(&self, key: &str) -> Option<&Control> {
        match self {
            Control::Group { children, .. } => children.get(key),
            Control::Array { children, .. } => children.get(index_of(key)?),
            Control::Leaf { .. } => None,
        }
    }

    fn child_mut(&mut self, key: &str) -> Option<&mut Control> {
        match self {
            Control::Group { children, .. } => children.get_mut(key),
            Control::Array { children, .. } => children.get_mut(index_of(key)?),
            Control::Leaf { .. } => None,
        }
    }

    fn validate_into(&self, at: &Pointer, out: &mut Vec<FieldError>) {
        let value = self.value();
        if let Some(errors) = self.validator().validate(Some(&value), false) {
            out.push(FieldError {
                data_pointer: at.clone(),
                errors,
            });
        }
        match self {
            Control::Group { children, .. } => {
                for (key, child) in children {
                    child.validate_into(&at.child(key.as_str()), out);
                }
            }
            Control::Array { children, .. } => {
                for (i, child) in children.iter().enumerate() {
                    child.validate_into(&at.child(i.to_string()), out);
                }
            }
            Control::Leaf { .. } => {}
        }
    }
}

/// The root control and pointer-based access into it.
#[derive(Debug, Clone)]
pub struct ControlTree {
    pub root: Control,
}

impl ControlTree {
    pub fn new(root: Control) -> Self {
        Self { root }
    }

    pub fn value(&self) -> Value {
        self.root.value()
    }

    /// The control at data pointer `at`.
    pub fn get(&self, at: &Pointer) -> Option<&Control> {
        at.keys()
            .iter()
            .try_fold(&self.root, |control, key| control.child(key))
    }

    pub fn get_mut(&mut self, at: &Pointer) -> Option<&mut Control> {
        at.keys()
            .iter()
            .try_fold(&mut self.root, |control, key| control.child_mut(key))
    }

    /// Every control's errors, parents before children.
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        self.root.validate_into(&Pointer::root(), &mut errors);
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::ValidatorSpec;
    use serde_json::json;

    fn leaf(value: Value, spec: &[(&str, Value)]) -> ControlTemplate {
        ControlTemplate::Leaf {
            value,
            disabled: false,
            validators: spec
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect::<ValidatorSpec>(),
        }
    }

    fn tree() -> ControlTree {
        let mut children = IndexMap::new();
        children.insert("name".to_string(), leaf(Value::Null, &[("required", json!(true))]));
        children.insert(
            "tags".to_string(),
            ControlTemplate::Array {
                children: vec![leaf(json!("x"), &[("minLength", json!(2))])],
                tuple_items: 0,
                item_ref: None,
                validators: ValidatorSpec::from_iter([("maxItems".to_string(), json!(3))]),
            },
        );
        let template = ControlTemplate::Group {
            children,
            validators: ValidatorSpec::new(),
        };
        let root = materialize(&template, &mut ValidatorCompiler::new(false), &Pointer::root());
        ControlTree::new(root)
    }

    #[test]
    fn test_value_keeps_nulls() {
        assert_eq!(tree().value(), json!({ "name": null, "tags": ["x"] }));
    }

    #[test]
    fn test_get_by_pointer() {
        let mut tree = tree();
        let at = Pointer::parse("/tags/0").unwrap();
        assert!(matches!(tree.get(&at), Some(Control::Leaf { .. })));
        assert!(tree.get(&Pointer::parse("/tags/1").unwrap()).is_none());
        assert!(matches!(
            tree.get(&Pointer::parse("/tags").unwrap()),
            Some(Control::Array { max_items: Some(3), .. })
        ));
        if let Some(Control::Leaf { value, .. }) = tree.get_mut(&at) {
            *value = json!("xyz");
        }
        assert_eq!(tree.value()["tags"], json!(["xyz"]));
    }

    #[test]
    fn test_validate_reports_each_control() {
        let errors = tree().validate();
        let pointers: Vec<String> = errors.iter().map(|e| e.data_pointer.to_string()).collect();
        assert_eq!(pointers, vec!["/name", "/tags/0"]);
        assert!(errors[0].errors.contains_key("required"));
        assert!(errors[1].errors.contains_key("minLength"));
    }
}
