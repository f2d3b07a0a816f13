//! Resolved protocol model.
//!
//! Everything the compiler produces lives here: primitive kinds, the
//! [`TypeKind`] sum, path-derived [`TypeId`]s, normalized [`Field`]s, and
//! per-command metadata. The model is built once per compilation and then
//! only read; the codec, CLI binder, and help renderer all consume it
//! through shared references.

use serde::Serialize;

use crate::condition::ConditionExpr;

/// Primitive wire kinds understood by the codec.
///
/// `Uint` is range-checked on decode: a negative JSON integer is rejected.
/// `Double` accepts both JSON reals and JSON integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    Int,
    Uint,
    Double,
    Bool,
    String,
}

impl Primitive {
    /// Returns the schema-facing name of this kind.
    pub fn name(self) -> &'static str {
        match self {
            Primitive::Int => "int",
            Primitive::Uint => "uint",
            Primitive::Double => "double",
            Primitive::Bool => "bool",
            Primitive::String => "string",
        }
    }

    /// Parses a schema `type` string into a primitive kind.
    ///
    /// # Examples
    ///
    /// ```
    /// use rpckit_core::Primitive;
    ///
    /// assert_eq!(Primitive::from_name("uint"), Some(Primitive::Uint));
    /// assert_eq!(Primitive::from_name("object"), None);
    /// ```
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "int" => Some(Primitive::Int),
            "uint" => Some(Primitive::Uint),
            "double" => Some(Primitive::Double),
            "bool" => Some(Primitive::Bool),
            "string" => Some(Primitive::String),
            _ => None,
        }
    }
}

/// Stable identifier for a registered type, derived from its declaration
/// path. Segments are joined with `-`, so the field `block` inside the
/// request of `getblock` becomes `getblock-request-block`.
///
/// Ids are unique per compilation; the resolver treats a collision as a
/// fatal error rather than overwriting.
///
/// # Examples
///
/// ```
/// use rpckit_core::TypeId;
///
/// let id = TypeId::from_segments(&["getblock", "request"]);
/// assert_eq!(id.as_str(), "getblock-request");
/// assert_eq!(id.child("block").as_str(), "getblock-request-block");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TypeId(String);

impl TypeId {
    /// Creates an id from a single root segment (a declared class key or a
    /// command name).
    pub fn new(segment: impl Into<String>) -> Self {
        TypeId(segment.into())
    }

    /// Joins path segments into an id.
    pub fn from_segments(segments: &[&str]) -> Self {
        TypeId(segments.join("-"))
    }

    /// Returns the id for a nested declaration under this one.
    pub fn child(&self, segment: &str) -> Self {
        TypeId(format!("{}-{}", self.0, segment))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The closed sum of resolved type shapes.
///
/// `Object` carries its normalized field list and only appears as a registry
/// payload; at use sites (fields, array elements, payload roots) object
/// types appear as `Reference` to their registry id. Consumers match all
/// four variants exhaustively, so an unhandled shape is a compile error
/// rather than a silent fallthrough.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    Primitive(Primitive),
    /// The element is a full field so array contents keep their declared
    /// key and description for shape illustrations.
    Array { element: Box<Field> },
    Object { fields: Vec<Field> },
    Reference { target: TypeId },
}

impl TypeKind {
    /// Returns the schema-facing name of this shape, as used in help text
    /// and error messages. References report `object` because that is the
    /// only shape they may resolve to.
    pub fn wire_name(&self) -> &'static str {
        match self {
            TypeKind::Primitive(p) => p.name(),
            TypeKind::Array { .. } => "array",
            TypeKind::Object { .. } | TypeKind::Reference { .. } => "object",
        }
    }

    /// True for primitive shapes.
    pub fn is_primitive(&self) -> bool {
        matches!(self, TypeKind::Primitive(_))
    }

    pub fn as_primitive(&self) -> Option<Primitive> {
        match self {
            TypeKind::Primitive(p) => Some(*p),
            _ => None,
        }
    }
}

/// A typed literal, used for field defaults and condition comparisons.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Literal {
    Int(i64),
    Uint(u64),
    Double(f64),
    Bool(bool),
    String(String),
}

impl Literal {
    /// Returns the primitive kind this literal belongs to.
    pub fn primitive(&self) -> Primitive {
        match self {
            Literal::Int(_) => Primitive::Int,
            Literal::Uint(_) => Primitive::Uint,
            Literal::Double(_) => Primitive::Double,
            Literal::Bool(_) => Primitive::Bool,
            Literal::String(_) => Primitive::String,
        }
    }
}

impl std::fmt::Display for Literal {
    /// Help-text rendering: strings are quoted, booleans lowercased,
    /// numbers printed plainly.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::Int(v) => write!(f, "{v}"),
            Literal::Uint(v) => write!(f, "{v}"),
            Literal::Double(v) => write!(f, "{v}"),
            Literal::Bool(v) => write!(f, "{v}"),
            Literal::String(v) => write!(f, "\"{v}\""),
        }
    }
}

/// The default state of a field slot when its key is absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldDefault {
    /// No default; a required field without one fails decode when absent.
    None,
    /// A declared literal for a primitive field.
    Literal(Literal),
    /// Sentinel for required arrays: absent binds as present-and-empty,
    /// which is distinct from a missing slot.
    EmptyArray,
}

impl FieldDefault {
    pub fn is_none(&self) -> bool {
        matches!(self, FieldDefault::None)
    }

    pub fn literal(&self) -> Option<&Literal> {
        match self {
            FieldDefault::Literal(lit) => Some(lit),
            _ => None,
        }
    }
}

/// One normalized field of an object type.
///
/// Fields come out of the normalizer ordered required-first with the
/// declaration order preserved inside each partition; that order is the
/// canonical wire order for encoding and the binding order for the CLI.
///
/// # Examples
///
/// ```
/// use rpckit_core::{Field, Primitive, TypeKind};
///
/// let field = Field::new("amount", TypeKind::Primitive(Primitive::Double))
///     .optional()
///     .with_opt("a")
///     .with_desc("amount to transfer");
/// assert!(!field.required);
/// assert_eq!(field.opt.as_deref(), Some("a"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    /// JSON object key.
    pub key: String,
    /// Resolved shape of the value.
    pub kind: TypeKind,
    /// Whether the key must be present on decode. Defaults to true.
    pub required: bool,
    /// Applied when the key is absent.
    pub default: FieldDefault,
    /// Named CLI option bound before positional tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opt: Option<String>,
    /// Presence condition over previously bound sibling fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<ConditionExpr>,
    /// Human description for help text.
    pub desc: String,
}

impl Field {
    /// Creates a required field with no default, option, or condition.
    pub fn new(key: impl Into<String>, kind: TypeKind) -> Self {
        Field {
            key: key.into(),
            kind,
            required: true,
            default: FieldDefault::None,
            opt: None,
            condition: None,
            desc: String::new(),
        }
    }

    /// Marks the field optional.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_default(mut self, default: FieldDefault) -> Self {
        self.default = default;
        self
    }

    pub fn with_opt(mut self, opt: impl Into<String>) -> Self {
        self.opt = Some(opt.into());
        self
    }

    pub fn with_condition(mut self, condition: ConditionExpr) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn with_desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = desc.into();
        self
    }
}

/// Root shape of a request or response.
///
/// Object roots put their fields at the top level of the wire value.
/// Everything else (`Array` requests; any kind for responses, primitives
/// included) travels bare on the wire, and the single synthetic [`Field`]
/// carries the wrapper name the CLI binder and help renderer use for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Payload {
    /// Fields of the referenced registry object appear directly in the
    /// wire value.
    Object { target: TypeId },
    /// The wire value is the single field's value, unwrapped.
    Single { field: Box<Field> },
}

impl Payload {
    /// Returns the registry id for object roots.
    pub fn target(&self) -> Option<&TypeId> {
        match self {
            Payload::Object { target } => Some(target),
            Payload::Single { .. } => None,
        }
    }
}

/// A usage example attached to a command, rendered verbatim in help text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Example {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
}

impl Example {
    pub fn request(line: impl Into<String>) -> Self {
        Example {
            request: Some(line.into()),
            response: None,
        }
    }

    pub fn exchange(request: impl Into<String>, response: impl Into<String>) -> Self {
        Example {
            request: Some(request.into()),
            response: Some(response.into()),
        }
    }
}

/// One compiled RPC command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Command {
    /// Wire method name.
    pub name: String,
    /// Request root; never primitive.
    pub request: Payload,
    /// Response root, when the command declares one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<Payload>,
    /// One-line description shown in help.
    pub desc: String,
    /// Text for the command list; falls back to `desc` when the schema
    /// does not declare one.
    pub introduction: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<Example>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl Command {
    pub fn new(name: impl Into<String>, request: Payload, desc: impl Into<String>) -> Self {
        let desc = desc.into();
        Command {
            name: name.into(),
            request,
            response: None,
            introduction: desc.clone(),
            desc,
            examples: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn with_response(mut self, response: Payload) -> Self {
        self.response = Some(response);
        self
    }

    pub fn with_introduction(mut self, introduction: impl Into<String>) -> Self {
        self.introduction = introduction.into();
        self
    }

    pub fn with_example(mut self, example: Example) -> Self {
        self.examples.push(example);
        self
    }

    pub fn with_error(mut self, note: impl Into<String>) -> Self {
        self.errors.push(note.into());
        self
    }
}

/// Usage and description of one invocation mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModeDoc {
    pub name: String,
    pub usage: String,
    pub desc: String,
}

impl ModeDoc {
    /// The console mode gets the command-list help treatment.
    pub fn is_console(&self) -> bool {
        self.name.eq_ignore_ascii_case("console")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_names_round_trip() {
        for p in [
            Primitive::Int,
            Primitive::Uint,
            Primitive::Double,
            Primitive::Bool,
            Primitive::String,
        ] {
            assert_eq!(Primitive::from_name(p.name()), Some(p));
        }
    }

    #[test]
    fn test_type_id_child_joins_with_dash() {
        let id = TypeId::new("listtx").child("response").child("detail");
        assert_eq!(id.as_str(), "listtx-response-detail");
    }

    #[test]
    fn test_wire_name_reports_object_for_references() {
        let kind = TypeKind::Reference {
            target: TypeId::new("blockdata"),
        };
        assert_eq!(kind.wire_name(), "object");
        let arr = TypeKind::Array {
            element: Box::new(Field::new("n", TypeKind::Primitive(Primitive::Int))),
        };
        assert_eq!(arr.wire_name(), "array");
    }

    #[test]
    fn test_field_builder_defaults() {
        let field = Field::new("txid", TypeKind::Primitive(Primitive::String));
        assert!(field.required);
        assert!(field.default.is_none());
        assert!(field.opt.is_none());
        assert!(field.condition.is_none());
    }

    #[test]
    fn test_literal_display_quotes_strings() {
        assert_eq!(Literal::String("abc".into()).to_string(), "\"abc\"");
        assert_eq!(Literal::Bool(true).to_string(), "true");
        assert_eq!(Literal::Uint(7).to_string(), "7");
    }

    #[test]
    fn test_command_introduction_falls_back_to_desc() {
        let cmd = Command::new(
            "getheight",
            Payload::Object {
                target: TypeId::from_segments(&["getheight", "request"]),
            },
            "Get chain height",
        );
        assert_eq!(cmd.introduction, "Get chain height");
    }

    #[test]
    fn test_field_serialization_skips_absent_metadata() {
        let field =
            Field::new("to", TypeKind::Primitive(Primitive::String)).with_desc("destination");
        let json = serde_json::to_value(&field).expect("field serializes");
        assert_eq!(json["kind"], serde_json::json!({"primitive": "string"}));
        assert_eq!(json["default"], serde_json::json!("none"));
        assert!(json.get("opt").is_none());
        assert!(json.get("condition").is_none());
    }

    #[test]
    fn test_field_serialization_keeps_option_and_literal_default() {
        let field = Field::new("amount", TypeKind::Primitive(Primitive::Double))
            .optional()
            .with_opt("a")
            .with_default(FieldDefault::Literal(Literal::Double(0.5)));
        let json = serde_json::to_value(&field).expect("field serializes");
        assert_eq!(json["required"], serde_json::json!(false));
        assert_eq!(json["opt"], serde_json::json!("a"));
        assert_eq!(json["default"], serde_json::json!({"literal": 0.5}));
    }

    #[test]
    fn test_command_serialization_tags_payload_roots() {
        let cmd = Command::new(
            "getheight",
            Payload::Object {
                target: TypeId::from_segments(&["getheight", "request"]),
            },
            "Get chain height",
        )
        .with_response(Payload::Single {
            field: Box::new(Field::new("height", TypeKind::Primitive(Primitive::Uint))),
        });
        let json = serde_json::to_value(&cmd).expect("command serializes");
        assert_eq!(
            json["request"],
            serde_json::json!({"object": {"target": "getheight-request"}})
        );
        assert_eq!(
            json["response"]["single"]["field"]["kind"],
            serde_json::json!({"primitive": "uint"})
        );
        assert!(json.get("examples").is_none(), "empty examples stay off");
    }
}
