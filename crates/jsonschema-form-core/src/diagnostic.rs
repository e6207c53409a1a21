//! Diagnostics for recoverable conditions met while compiling or formatting.
//!
//! A partially malformed schema still yields a renderable form; everything
//! short of a fatal [`CompileError`](crate::CompileError) is reported here.

use serde::{Deserialize, Serialize};

use crate::pointer::Pointer;

/// A recoverable condition, with the location it was found at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Schema or data location, depending on `kind`.
    pub pointer: Pointer,
    /// Classification of the diagnostic.
    pub kind: DiagnosticKind,
    /// Human-readable description.
    pub message: String,
}

/// Classification of diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A recursive reference target has no single data-pointer equivalent;
    /// its data-space mapping was left out.
    AmbiguousReferenceLocation,
    /// A widget type outside the active registry was replaced by the
    /// inferred one.
    UnknownWidgetType { widget: String },
    /// Schemas could not be merged structurally; an `allOf` was kept.
    SchemaMergeConflict { keyword: String },
    /// A layout item names a key that does not exist in the schema.
    UnresolvedLayoutKey { key: String },
    /// A data value has no schema record anywhere in the fallback chain.
    UnresolvedDataPointer,
    /// A `pattern` keyword is not a valid regular expression.
    InvalidPattern { pattern: String },
}

impl Diagnostic {
    /// Build a diagnostic and log it.
    pub fn new(pointer: Pointer, kind: DiagnosticKind, message: impl Into<String>) -> Self {
        let message = message.into();
        match kind {
            DiagnosticKind::SchemaMergeConflict { .. } => {
                tracing::debug!(pointer = %pointer, "{}", message)
            }
            _ => tracing::warn!(pointer = %pointer, "{}", message),
        }
        Self {
            pointer,
            kind,
            message,
        }
    }
}
