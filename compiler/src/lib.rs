//! Schema compiler for RPC protocol definitions.
//!
//! [`compile`] turns a JSON schema document into a [`Protocol`]: the
//! resolved type registry, the command table, and any invocation-mode
//! docs, bundled for dispatch. Compilation runs three phases:
//!
//! 1. **Load**: parse the document and triage its declarations in order.
//! 2. **Resolve**: register classes first so fields may reference a class
//!    declared later, then parse commands, registering nested objects
//!    under their `-`-joined declaration paths.
//! 3. **Normalize**: type-check defaults, parse presence conditions
//!    against sibling declarations, and sort every object's fields
//!    required-first.
//!
//! Any failure aborts the compile with a path-tagged
//! [`SchemaError`]. A compiled [`Protocol`] is immutable, so dispatch,
//! binding, and help rendering borrow it freely across threads.
//!
//! # Examples
//!
//! ```
//! use rpckit_core::Value;
//! use serde_json::json;
//!
//! let protocol = rpckit_compiler::compile(r#"{
//!     "getbalance": {
//!         "desc": "get the balance of an address",
//!         "request": {
//!             "type": "object",
//!             "content": {
//!                 "address": {"type": "string", "desc": "wallet address"}
//!             }
//!         },
//!         "response": {"type": "double", "name": "balance"}
//!     }
//! }"#)?;
//!
//! let record = protocol.decode_request("getbalance", &json!({"address": "1xyz"}))?;
//! assert_eq!(record.get("address"), Some(&Value::String("1xyz".to_string())));
//!
//! let help = protocol.help("getbalance").unwrap();
//! assert!(help.starts_with("\nUsage:\n"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod loader;
mod normalize;
mod resolver;

use std::fs;
use std::path::Path;

use serde_json::Value as Json;
use tracing::debug;

use rpckit_core::{
    bind, codec, help, BindingError, Command, CommandTable, ModeDoc, Record, SchemaError,
    TypeRegistry, ValidationError,
};

/// A compiled protocol: every type resolved, every field normalized.
#[derive(Debug)]
pub struct Protocol {
    pub registry: TypeRegistry,
    pub commands: CommandTable,
    pub modes: Vec<ModeDoc>,
}

/// Compiles a schema document.
pub fn compile(schema: &str) -> Result<Protocol, SchemaError> {
    let doc = loader::parse_document("schema", schema)?;
    let (registry, commands) = resolver::resolve(&doc)?;
    Ok(Protocol {
        registry,
        commands,
        modes: Vec::new(),
    })
}

/// Compiles a schema document together with a mode document.
pub fn compile_with_modes(schema: &str, modes: &str) -> Result<Protocol, SchemaError> {
    let mut protocol = compile(schema)?;
    protocol.modes = parse_modes(modes)?;
    Ok(protocol)
}

/// Reads and compiles a schema file.
pub fn compile_file(path: impl AsRef<Path>) -> Result<Protocol, SchemaError> {
    let path = path.as_ref();
    debug!(path = %path.display(), "Compiling schema file");
    compile(&fs::read_to_string(path)?)
}

/// Parses a mode document on its own.
pub fn parse_modes(modes: &str) -> Result<Vec<ModeDoc>, SchemaError> {
    let doc = loader::parse_document("modes", modes)?;
    loader::parse_mode_document(&doc)
}

impl Protocol {
    /// Looks up a command by wire name.
    pub fn command(&self, name: &str) -> Option<&Command> {
        self.commands.get(name)
    }

    /// Command names in declaration order.
    pub fn command_names(&self) -> impl Iterator<Item = &str> {
        self.commands.names()
    }

    /// Looks up a mode doc by name.
    pub fn mode(&self, name: &str) -> Option<&ModeDoc> {
        self.modes.iter().find(|mode| mode.name == name)
    }

    /// Decodes a request wire value into a record.
    pub fn decode_request(&self, name: &str, json: &Json) -> Result<Record, ValidationError> {
        let command = self.lookup(name)?;
        codec::decode_payload(&self.registry, &command.request, json)
    }

    /// Encodes a bound request record into its wire value.
    pub fn encode_request(&self, name: &str, record: &Record) -> Result<Json, ValidationError> {
        let command = self.lookup(name)?;
        codec::encode_payload(&self.registry, &command.request, record)
    }

    /// Decodes a response wire value.
    ///
    /// Commands without a declared response pass their payload through
    /// untyped; that is `Ok(None)`, and the caller keeps the raw JSON.
    pub fn decode_response(
        &self,
        name: &str,
        json: &Json,
    ) -> Result<Option<Record>, ValidationError> {
        let command = self.lookup(name)?;
        match &command.response {
            Some(payload) => Ok(Some(codec::decode_payload(&self.registry, payload, json)?)),
            None => Ok(None),
        }
    }

    /// Encodes a response record. `Ok(None)` when the command declares no
    /// response shape.
    pub fn encode_response(
        &self,
        name: &str,
        record: &Record,
    ) -> Result<Option<Json>, ValidationError> {
        let command = self.lookup(name)?;
        match &command.response {
            Some(payload) => Ok(Some(codec::encode_payload(&self.registry, payload, record)?)),
            None => Ok(None),
        }
    }

    /// Binds console arguments to a request record.
    ///
    /// Tokens are split against the command's declared options first, so
    /// `-fee=0.1` binds by name while a bare `-5` stays positional.
    ///
    /// # Examples
    ///
    /// ```
    /// use rpckit_core::Value;
    ///
    /// let protocol = rpckit_compiler::compile(r#"{
    ///     "send": {
    ///         "desc": "send coins",
    ///         "request": {"type": "object", "content": {
    ///             "to": {"type": "string"},
    ///             "amount": {"type": "double", "required": false, "opt": "amount"}
    ///         }}
    ///     }
    /// }"#).unwrap();
    ///
    /// let args = vec!["1xyz".to_string(), "-amount=2.5".to_string()];
    /// let record = protocol.bind_request("send", &args).unwrap();
    /// assert_eq!(record.get("amount"), Some(&Value::Double(2.5)));
    /// ```
    pub fn bind_request(&self, name: &str, args: &[String]) -> Result<Record, BindingError> {
        let Some(command) = self.commands.get(name) else {
            return Err(BindingError::Invalid(ValidationError::MethodNotFound {
                name: name.to_string(),
            }));
        };
        let fields = bind::binding_fields(&self.registry, command);
        let (tokens, options) = bind::split_tokens(fields, args);
        bind::bind(&self.registry, command, &tokens, &options)
    }

    /// Renders the full help page of a command.
    pub fn help(&self, name: &str) -> Option<String> {
        self.commands
            .get(name)
            .map(|command| help::render_command_help(&self.registry, command))
    }

    /// Renders a mode's help page.
    ///
    /// For the console mode, `sub` selects one command's page, `all` for
    /// every page, or `None` for the command list; `options` is the
    /// caller's own option summary, appended to non-console pages and to
    /// the console overview.
    pub fn mode_help(&self, name: &str, sub: Option<&str>, options: &str) -> Option<String> {
        self.mode(name)
            .map(|mode| help::render_mode_help(&self.registry, &self.commands, mode, sub, options))
    }

    fn lookup(&self, name: &str) -> Result<&Command, ValidationError> {
        self.commands
            .get(name)
            .ok_or(ValidationError::MethodNotFound {
                name: name.to_string(),
            })
    }
}
