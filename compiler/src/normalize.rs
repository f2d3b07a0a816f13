//! Field normalization.
//!
//! Turns the loose per-field keys of a schema document (`desc`,
//! `required`, `default`, `opt`, `condition`) into the normalized
//! [`Field`] metadata the codec, binder, and help renderer consume, and
//! applies the required-before-optional ordering every emitted object
//! follows.
//!
//! Normalization is strict where the document can lie: a `default` must
//! match the declared primitive type, and a `condition` literal must parse
//! as the compared sibling's type. Both are compile failures, not values
//! smuggled through as strings.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value as Json;
use tracing::debug;

use rpckit_core::{
    ConditionExpr, ConditionTerm, Connective, Field, FieldDefault, Literal, Primitive, SchemaError,
    TypeId, TypeKind,
};

use crate::loader::{self, JsonMap};

/// Normalized per-field metadata, ready to pair with a resolved kind.
pub(crate) struct FieldMeta {
    pub(crate) desc: String,
    pub(crate) required: bool,
    pub(crate) default: FieldDefault,
    pub(crate) opt: Option<String>,
    pub(crate) condition: Option<ConditionExpr>,
}

/// Reads and checks the metadata keys of one field declaration.
///
/// `siblings` is the full content map of the containing object, self
/// included, so conditions can type their literals against the compared
/// field's declaration.
pub(crate) fn field_meta(
    path: &TypeId,
    detail: &JsonMap,
    siblings: &JsonMap,
    kind: &TypeKind,
) -> Result<FieldMeta, SchemaError> {
    let tag = path.as_str();
    let desc = loader::desc_text(tag, detail)?;
    let required = loader::bool_or(tag, detail, "required", true)?;
    let opt = loader::opt_str(tag, detail, "opt")?.map(str::to_string);
    let default = parse_default(path, detail, kind, required)?;
    let condition = match loader::opt_str(tag, detail, "condition")? {
        Some(raw) if !raw.is_empty() => Some(parse_condition(path, raw, siblings)?),
        _ => None,
    };
    Ok(FieldMeta {
        desc,
        required,
        default,
        opt,
        condition,
    })
}

/// Sorts fields required-first. The sort is stable, so declaration order
/// is preserved inside each group.
pub(crate) fn sort_required_first(fields: &mut [Field]) {
    fields.sort_by_key(|field| !field.required);
}

/// Parses the `default` key against the declared kind.
///
/// Only primitive fields may declare a default. Required arrays pick up
/// an implicit empty-array default so an absent key decodes as `[]`
/// instead of failing; optional arrays stay genuinely absent.
fn parse_default(
    path: &TypeId,
    detail: &JsonMap,
    kind: &TypeKind,
    required: bool,
) -> Result<FieldDefault, SchemaError> {
    match (detail.get("default"), kind) {
        (Some(value), TypeKind::Primitive(primitive)) => Ok(FieldDefault::Literal(
            default_literal(path, *primitive, value)?,
        )),
        (Some(_), other) => Err(SchemaError::DefaultMismatch {
            path: path.as_str().to_string(),
            type_name: other.wire_name().to_string(),
        }),
        (None, TypeKind::Array { .. }) if required => Ok(FieldDefault::EmptyArray),
        (None, _) => Ok(FieldDefault::None),
    }
}

fn default_literal(
    path: &TypeId,
    primitive: Primitive,
    value: &Json,
) -> Result<Literal, SchemaError> {
    let mismatch = || SchemaError::DefaultMismatch {
        path: path.as_str().to_string(),
        type_name: primitive.name().to_string(),
    };
    match primitive {
        Primitive::Int => value.as_i64().map(Literal::Int).ok_or_else(mismatch),
        Primitive::Uint => value.as_u64().map(Literal::Uint).ok_or_else(mismatch),
        // An integer default on a double field is in range.
        Primitive::Double => value.as_f64().map(Literal::Double).ok_or_else(mismatch),
        Primitive::Bool => value.as_bool().map(Literal::Bool).ok_or_else(mismatch),
        Primitive::String => value
            .as_str()
            .map(|text| Literal::String(text.to_string()))
            .ok_or_else(mismatch),
    }
}

/// Parses a `condition` string into a term chain.
///
/// Terms are `key=value` pairs joined by `&&` and `||`. A key that names a
/// primitive sibling gets its literal typed against that sibling and is
/// enforced at runtime; a key that names nothing stays display-only. A key
/// that names an object, array, or reference sibling is a compile failure.
pub(crate) fn parse_condition(
    path: &TypeId,
    raw: &str,
    siblings: &JsonMap,
) -> Result<ConditionExpr, SchemaError> {
    static TERM_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(&&|\|\||^)\s*([^=\s&|]*)=([^=\s&|]*)").expect("static regex must compile")
    });

    let mut terms = Vec::new();
    for captures in TERM_RE.captures_iter(raw) {
        let connective = match &captures[1] {
            "&&" => Some(Connective::And),
            "||" => Some(Connective::Or),
            _ => None,
        };
        let key = captures[2].to_string();
        let value = match siblings.get(&key) {
            Some(sibling) => {
                let sibling = loader::as_object(path.as_str(), sibling)?;
                let type_name = loader::get_str(path.as_str(), sibling, "type")?;
                let Some(primitive) = Primitive::from_name(type_name) else {
                    return Err(SchemaError::NonPrimitiveCondition {
                        path: path.as_str().to_string(),
                        key,
                        type_name: type_name.to_string(),
                    });
                };
                Some(condition_literal(path, primitive, &captures[3])?)
            }
            None => None,
        };
        terms.push(ConditionTerm {
            connective,
            key,
            value,
        });
    }

    if terms.is_empty() {
        debug!(path = path.as_str(), condition = raw, "Condition has no parseable terms, display only");
    }

    Ok(ConditionExpr {
        raw: raw.to_string(),
        terms,
    })
}

fn condition_literal(
    path: &TypeId,
    primitive: Primitive,
    raw: &str,
) -> Result<Literal, SchemaError> {
    let mismatch = || SchemaError::ConditionLiteral {
        path: path.as_str().to_string(),
        value: raw.to_string(),
        expected: primitive,
    };
    match primitive {
        Primitive::Int => raw.parse().map(Literal::Int).map_err(|_| mismatch()),
        Primitive::Uint => raw.parse().map(Literal::Uint).map_err(|_| mismatch()),
        Primitive::Double => raw.parse().map(Literal::Double).map_err(|_| mismatch()),
        Primitive::Bool => {
            if raw.eq_ignore_ascii_case("true") {
                Ok(Literal::Bool(true))
            } else if raw.eq_ignore_ascii_case("false") {
                Ok(Literal::Bool(false))
            } else {
                Err(mismatch())
            }
        }
        Primitive::String => Ok(Literal::String(raw.to_string())),
    }
}
