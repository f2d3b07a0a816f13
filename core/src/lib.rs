//! Resolved protocol model, JSON codec, CLI binder, and help renderer.
//!
//! This crate defines the compiled form of an RPC protocol schema:
//!
//! - [`TypeKind`]: the closed sum of type shapes (primitives, arrays,
//!   objects, references), with [`Field`] carrying per-field wire and
//!   console metadata.
//! - [`TypeRegistry`] / [`CommandTable`]: the resolved types and commands
//!   of one compilation, in declaration order.
//! - [`Value`] / [`Record`]: the typed in-memory form of wire payloads.
//! - [`codec`]: schema-driven JSON decode/encode with stable key order.
//! - [`bind`]: console token binding onto request records.
//! - [`help`]: terminal help rendering for commands and modes.
//!
//! The model is immutable once built; every operation here takes it by
//! shared reference, so compiled protocols can fan out across threads
//! without locking.
//!
//! # Example
//!
//! ```
//! use rpckit_core::*;
//!
//! let mut registry = TypeRegistry::new();
//! registry.insert(
//!     TypeId::new("ping-request"),
//!     TypeKind::Object {
//!         fields: vec![
//!             Field::new("nonce", TypeKind::Primitive(Primitive::Uint))
//!                 .with_desc("Echoed back verbatim."),
//!         ],
//!     },
//! )?;
//!
//! let command = Command::new(
//!     "ping",
//!     Payload::Object { target: TypeId::new("ping-request") },
//!     "Check liveness.",
//! );
//!
//! let wire = serde_json::json!({"nonce": 7});
//! let record = codec::decode_payload(&registry, &command.request, &wire)?;
//! assert_eq!(record.get("nonce"), Some(&Value::Uint(7)));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod bind;
pub mod codec;
mod condition;
mod error;
pub mod help;
mod registry;
mod types;
mod value;

pub use condition::{ConditionExpr, ConditionTerm, Connective};
pub use error::{
    BindingError, RPC_INVALID_PARAMS, RPC_METHOD_NOT_FOUND, RPC_PARSE_ERROR, SchemaError,
    ValidationError,
};
pub use registry::{CommandTable, TypeRegistry};
pub use types::{
    Command, Example, Field, FieldDefault, Literal, ModeDoc, Payload, Primitive, TypeId, TypeKind,
};
pub use value::{Record, Value};
