//! An editable form: a compiled form plus its live control tree.

use serde_json::Value;

use super::{materialize, Control, ControlTemplate, ControlTree};
use crate::error::FormError;
use crate::formatter::FormatOutcome;
use crate::pointer::{index_of, Pointer};
use crate::validators::{FieldError, ValidatorCompiler};
use crate::CompiledForm;

pub struct Form {
    compiled: CompiledForm,
    controls: ControlTree,
}

impl Form {
    pub fn new(compiled: CompiledForm) -> Self {
        let controls = compiled.materialize();
        Self { compiled, controls }
    }

    pub fn compiled(&self) -> &CompiledForm {
        &self.compiled
    }

    pub fn controls(&self) -> &ControlTree {
        &self.controls
    }

    /// Raw current value, `null`s included.
    pub fn value(&self) -> Value {
        self.controls.value()
    }

    /// Current value passed through the data formatter with the compile
    /// options' format settings.
    pub fn output(&self) -> FormatOutcome {
        self.compiled
            .format(&self.controls.value(), &self.compiled.options.format)
    }

    pub fn validate(&self) -> Vec<FieldError> {
        self.controls.validate()
    }

    /// Replace the value at `at`. Containers are rebuilt to match the new
    /// value's shape.
    pub fn set_value(&mut self, at: &Pointer, value: Value) -> Result<(), FormError> {
        match self.controls.get_mut(at) {
            None => return Err(FormError::NoSuchControl(at.to_string())),
            Some(Control::Leaf { value: current, .. }) => {
                *current = value;
                return Ok(());
            }
            Some(_) => {}
        }
        let template = self.template_for(at, Some(&value))?;
        let control = self.materialize_at(&template, at);
        if let Some(slot) = self.controls.get_mut(at) {
            *slot = control;
        }
        Ok(())
    }

    /// Append an item to the array at `array`, holding `value` or the
    /// schema's empty item. Returns the new item's pointer.
    pub fn add_item(&mut self, array: &Pointer, value: Option<Value>) -> Result<Pointer, FormError> {
        let (len, tuple_items, item_ref) = match self.controls.get(array) {
            Some(Control::Array {
                children,
                tuple_items,
                item_ref,
                max_items,
                ..
            }) => {
                if let Some(max) = *max_items {
                    if children.len() >= max {
                        return Err(FormError::MaxItemsReached {
                            pointer: array.to_string(),
                            max_items: max,
                        });
                    }
                }
                (children.len(), *tuple_items, item_ref.clone())
            }
            Some(_) => return Err(FormError::NotAnArray(array.to_string())),
            None => return Err(FormError::NoSuchControl(array.to_string())),
        };

        let item_ptr = array.child(len.to_string());
        let template = match (&value, item_ref) {
            (None, Some(key)) if len >= tuple_items => self
                .compiled
                .template_library
                .get(&key)
                .cloned()
                .ok_or_else(|| FormError::NoItemTemplate(array.to_string()))?,
            _ => self.template_for(&item_ptr, value.as_ref())?,
        };
        let control = self.materialize_at(&template, &item_ptr);
        if let Some(Control::Array { children, .. }) = self.controls.get_mut(array) {
            children.push(control);
        }
        tracing::debug!(item = %item_ptr, "added array item");
        Ok(item_ptr)
    }

    /// Remove the list item at `item` and return its value.
    pub fn remove_item(&mut self, item: &Pointer) -> Result<Value, FormError> {
        let (array, index) = split_item(item)?;
        let (children, tuple_items) = self.array_mut(&array)?;
        if index < tuple_items {
            return Err(FormError::FixedItem {
                pointer: array.to_string(),
                index,
            });
        }
        if index >= children.len() {
            return Err(FormError::IndexOutOfBounds {
                pointer: array.to_string(),
                index,
                len: children.len(),
            });
        }
        Ok(children.remove(index).value())
    }

    /// Move a list item of `array` from position `from` to position `to`.
    pub fn move_item(&mut self, array: &Pointer, from: usize, to: usize) -> Result<(), FormError> {
        let (children, tuple_items) = self.array_mut(array)?;
        for index in [from, to] {
            if index < tuple_items {
                return Err(FormError::FixedItem {
                    pointer: array.to_string(),
                    index,
                });
            }
            if index >= children.len() {
                return Err(FormError::IndexOutOfBounds {
                    pointer: array.to_string(),
                    index,
                    len: children.len(),
                });
            }
        }
        let item = children.remove(from);
        children.insert(to, item);
        Ok(())
    }

    fn array_mut(&mut self, array: &Pointer) -> Result<(&mut Vec<Control>, usize), FormError> {
        match self.controls.get_mut(array) {
            Some(Control::Array {
                children,
                tuple_items,
                ..
            }) => Ok((children, *tuple_items)),
            Some(_) => Err(FormError::NotAnArray(array.to_string())),
            None => Err(FormError::NoSuchControl(array.to_string())),
        }
    }

    fn template_for(&self, at: &Pointer, value: Option<&Value>) -> Result<ControlTemplate, FormError> {
        match self.compiled.build_template(at, value) {
            Ok(Some(template)) => Ok(template),
            Ok(None) => Err(FormError::NoItemTemplate(at.to_string())),
            Err(err) => {
                tracing::warn!(at = %at, error = %err, "failed to build control template");
                Err(FormError::NoItemTemplate(at.to_string()))
            }
        }
    }

    fn materialize_at(&mut self, template: &ControlTemplate, at: &Pointer) -> Control {
        let mut compiler = ValidatorCompiler::new(self.compiled.options.anchor_patterns);
        let control = materialize(template, &mut compiler, at);
        self.compiled.diagnostics.extend(compiler.diagnostics);
        control
    }
}

fn split_item(item: &Pointer) -> Result<(Pointer, usize), FormError> {
    let index = item.last().and_then(index_of);
    match (item.parent(), index) {
        (Some(array), Some(index)) => Ok((array, index)),
        _ => Err(FormError::NoSuchControl(item.to_string())),
    }
}
