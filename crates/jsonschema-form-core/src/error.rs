//! Error types for form compilation and live-form operations.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pointer::PointerError;

/// Stable, machine-readable error codes.
///
/// Variant names and their serialized `snake_case` strings are part of the
/// public contract and must not change across versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ErrorCode {
    /// JSON (de)serialization error (malformed input or encoding failure).
    JsonParseError,
    /// A JSON Pointer was syntactically malformed.
    InvalidPointer,
    /// A `$ref` could not be resolved within the schema document.
    UnresolvableRef,
    /// Maximum traversal depth exceeded.
    RecursionDepthExceeded,
    /// Schema structure error (invalid construct).
    SchemaError,
    /// The compiler's own bookkeeping became inconsistent.
    InternalError,
}

/// Errors fatal to a compile pass.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("JSON (de)serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid JSON Pointer {pointer:?}: {message}")]
    InvalidPointer { pointer: String, message: String },

    #[error("Unresolvable $ref at {path}: {reference}")]
    UnresolvableRef { path: String, reference: String },

    #[error("Recursion depth exceeded at {path} (max: {max_depth})")]
    RecursionDepthExceeded { path: String, max_depth: usize },

    #[error("Schema error at {path}: {message}")]
    SchemaError { path: String, message: String },

    #[error("Internal consistency fault at {path}: {message}")]
    Internal { path: String, message: String },
}

impl CompileError {
    /// Returns the stable error code for this error variant.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            CompileError::JsonError(_) => ErrorCode::JsonParseError,
            CompileError::InvalidPointer { .. } => ErrorCode::InvalidPointer,
            CompileError::UnresolvableRef { .. } => ErrorCode::UnresolvableRef,
            CompileError::RecursionDepthExceeded { .. } => ErrorCode::RecursionDepthExceeded,
            CompileError::SchemaError { .. } => ErrorCode::SchemaError,
            CompileError::Internal { .. } => ErrorCode::InternalError,
        }
    }

    /// Returns the schema or pointer context, if available.
    pub fn path(&self) -> Option<&str> {
        match self {
            CompileError::JsonError(_) => None,
            CompileError::InvalidPointer { pointer, .. } => Some(pointer),
            CompileError::UnresolvableRef { path, .. } => Some(path),
            CompileError::RecursionDepthExceeded { path, .. } => Some(path),
            CompileError::SchemaError { path, .. } => Some(path),
            CompileError::Internal { path, .. } => Some(path),
        }
    }

    /// Produces a structured JSON error.
    ///
    /// Format: `{"code": "...", "message": "...", "path": "..." | null}`
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "code": self.error_code(),
            "message": self.to_string(),
            "path": self.path(),
        })
    }
}

impl From<PointerError> for CompileError {
    fn from(err: PointerError) -> Self {
        CompileError::InvalidPointer {
            pointer: err.pointer().to_string(),
            message: err.to_string(),
        }
    }
}

/// Errors raised by operations on a live [`Form`](crate::Form).
#[derive(Debug, Error)]
pub enum FormError {
    #[error(transparent)]
    Pointer(#[from] PointerError),

    #[error("No control at {0}")]
    NoSuchControl(String),

    #[error("Control at {0} is not an array")]
    NotAnArray(String),

    #[error("Array at {pointer} already holds its maximum of {max_items} items")]
    MaxItemsReached { pointer: String, max_items: usize },

    #[error("Item {index} of {pointer} is a fixed tuple position")]
    FixedItem { pointer: String, index: usize },

    #[error("Index {index} is out of bounds for array {pointer} of length {len}")]
    IndexOutOfBounds {
        pointer: String,
        index: usize,
        len: usize,
    },

    #[error("No item template is registered for array {0}")]
    NoItemTemplate(String),
}

// ===========================================================================
// Tests
// ===========================================================================
