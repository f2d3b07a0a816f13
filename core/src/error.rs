//! Error taxonomy.
//!
//! Three families with different lifetimes:
//!
//! - [`SchemaError`]: compilation failures. Fatal and fail-fast; one bad
//!   declaration aborts the whole compile with a path-tagged message.
//! - [`ValidationError`]: per-call codec failures. The model stays usable.
//! - [`BindingError`]: per-invocation CLI binding failures.
//!
//! Runtime errors map onto JSON-RPC 2.0 codes via `code()` so transport
//! layers can surface them without matching variants.

use thiserror::Error;

use crate::types::{Primitive, TypeId};

/// JSON-RPC 2.0 parse error.
pub const RPC_PARSE_ERROR: i32 = -32700;
/// JSON-RPC 2.0 method not found.
pub const RPC_METHOD_NOT_FOUND: i32 = -32601;
/// JSON-RPC 2.0 invalid params.
pub const RPC_INVALID_PARAMS: i32 = -32602;

/// Fatal schema compilation error.
///
/// Every variant that originates inside the document carries the `-`-joined
/// declaration path of the offending node.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("[{path}] expected {expected}, found {found}")]
    WrongKind {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("[{path}] missing required key '{key}'")]
    MissingKey { path: String, key: String },

    #[error("[{path}] unknown type '{name}'")]
    UnknownType { path: String, name: String },

    #[error("[{path}] array content must declare exactly one element, found {count}")]
    MalformedArrayContent { path: String, count: usize },

    #[error("[{path}] content is empty")]
    EmptyContent { path: String },

    #[error("duplicate type id '{id}'")]
    NameCollision { id: TypeId },

    #[error("[{path}] request type must be object or array, found '{name}'")]
    PrimitiveRequestRoot { path: String, name: String },

    #[error("[{path}] unknown declaration type '{name}'")]
    UnknownDeclaration { path: String, name: String },

    #[error("[{path}] default value does not match type {type_name}")]
    DefaultMismatch { path: String, type_name: String },

    #[error("[{path}] condition compares non-primitive sibling '{key}' of type {type_name}")]
    NonPrimitiveCondition {
        path: String,
        key: String,
        type_name: String,
    },

    #[error("[{path}] condition value '{value}' is not a valid {}", expected.name())]
    ConditionLiteral {
        path: String,
        value: String,
        expected: Primitive,
    },

    #[error("failed to read schema document: {0}")]
    Io(#[from] std::io::Error),

    #[error("schema document is not valid json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Per-call codec failure. Never fatal to the compiled model.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("[{key}] is required")]
    MissingRequiredField { key: String },

    #[error("[{key}] type is not {expected}")]
    WrongKind { key: String, expected: &'static str },

    #[error("[{key}] is out of range")]
    OutOfRange { key: String },

    #[error("[{key}] is unset or invalid, cannot encode")]
    InvalidBeforeEncode { key: String },

    #[error("{name} not found")]
    MethodNotFound { name: String },
}

impl ValidationError {
    /// JSON-RPC 2.0 error code for this failure.
    pub fn code(&self) -> i32 {
        match self {
            ValidationError::MethodNotFound { .. } => RPC_METHOD_NOT_FOUND,
            _ => RPC_INVALID_PARAMS,
        }
    }
}

/// CLI binding failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BindingError {
    #[error("[{key}] is required")]
    MissingArgument { key: String },

    #[error("[{key}] type error, needs {expected}")]
    Coercion { key: String, expected: &'static str },

    #[error("too many arguments given, at most {max} accepted")]
    TooManyArguments { max: usize },

    #[error("[{key}] is not valid json")]
    MalformedJson { key: String },

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

impl BindingError {
    /// JSON-RPC 2.0 error code for this failure.
    pub fn code(&self) -> i32 {
        match self {
            BindingError::Invalid(inner) => inner.code(),
            _ => RPC_PARSE_ERROR,
        }
    }
}
