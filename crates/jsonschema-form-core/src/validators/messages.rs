//! Rendering of [`ErrorMap`]s into readable messages.

use std::collections::HashMap;
use std::fmt;

use serde_json::Value;

use super::ErrorMap;

type FormatFn = dyn Fn(&Value) -> String + Send + Sync;

/// How one keyword's error is rendered.
pub enum Message {
    /// Literal text; `{{name}}` tokens are replaced by detail fields.
    Text(String),
    /// Called with the keyword's detail value.
    Format(Box<FormatFn>),
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Message::Format(_) => f.write_str("Format(..)"),
        }
    }
}

/// Error messages by keyword, injected by the caller.
#[derive(Debug, Default)]
pub struct MessageTable(HashMap<String, Message>);

impl MessageTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, keyword: impl Into<String>, text: impl Into<String>) -> Self {
        self.0.insert(keyword.into(), Message::Text(text.into()));
        self
    }

    pub fn with_fn<F>(mut self, keyword: impl Into<String>, format: F) -> Self
    where
        F: Fn(&Value) -> String + Send + Sync + 'static,
    {
        self.0.insert(keyword.into(), Message::Format(Box::new(format)));
        self
    }

    pub fn get(&self, keyword: &str) -> Option<&Message> {
        self.0.get(keyword)
    }
}

/// Render every error in `errors`, one message per line.
///
/// Keywords missing from `messages` fall back to `"<Keyword> Error: <details>"`.
pub fn format_errors(errors: &ErrorMap, messages: &MessageTable) -> String {
    errors
        .iter()
        .map(|(keyword, details)| match messages.get(keyword) {
            Some(Message::Text(text)) => substitute(text, details),
            Some(Message::Format(format)) => format(details),
            None => format!("{} Error: {}", capitalize(keyword), describe(details)),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn substitute(template: &str, details: &Value) -> String {
    let Some(fields) = details.as_object() else {
        return template.to_string();
    };
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        let Some(len) = rest[start + 2..].find("}}") else {
            break;
        };
        let name = rest[start + 2..start + 2 + len].trim();
        out.push_str(&rest[..start]);
        match fields.get(name) {
            Some(value) => out.push_str(&plain(value)),
            None => out.push_str(&rest[start..start + 4 + len]),
        }
        rest = &rest[start + 4 + len..];
    }
    out.push_str(rest);
    out
}

fn describe(details: &Value) -> String {
    match details {
        Value::Object(fields) => fields
            .iter()
            .map(|(k, v)| format!("{}: {}", k, plain(v)))
            .collect::<Vec<_>>()
            .join(", "),
        other => plain(other),
    }
}

fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn capitalize(keyword: &str) -> String {
    let mut chars = keyword.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
