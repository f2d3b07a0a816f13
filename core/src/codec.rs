//! JSON wire codec.
//!
//! Decode walks a schema type against raw JSON and produces a typed
//! [`Record`]/[`Value`] tree; encode walks the same type the other way.
//! Object fields are processed in normalized declaration order on both
//! paths, so encoded key order is stable across runs.
//!
//! Wire rules:
//!
//! - `null` and an absent key are the same thing.
//! - An absent field takes its default if it has one, fails with
//!   [`ValidationError::MissingRequiredField`] if required, and stays unset
//!   otherwise.
//! - `uint` rejects negative integers with [`ValidationError::OutOfRange`];
//!   `double` accepts integer JSON numbers.
//! - Non-object payload roots travel bare, without a wrapping object.

use serde_json::Value as Json;

use crate::error::ValidationError;
use crate::registry::TypeRegistry;
use crate::types::{Field, FieldDefault, Payload, Primitive, TypeKind};
use crate::value::{Record, Value};

/// Decodes a payload root from its wire form.
///
/// Object roots expect a JSON object and return its decoded fields; single
/// roots decode the bare wire value under the synthetic wrapper key.
pub fn decode_payload(
    registry: &TypeRegistry,
    payload: &Payload,
    json: &Json,
) -> Result<Record, ValidationError> {
    match payload {
        Payload::Object { target } => {
            let fields = registry.fields(target).unwrap_or(&[]);
            let map = json.as_object().ok_or(ValidationError::WrongKind {
                key: target.as_str().to_string(),
                expected: "object",
            })?;
            decode_fields(registry, fields, map)
        }
        Payload::Single { field } => {
            let mut record = Record::new();
            decode_field(registry, field, Some(json), &mut record)?;
            Ok(record)
        }
    }
}

/// Encodes a payload root to its wire form.
pub fn encode_payload(
    registry: &TypeRegistry,
    payload: &Payload,
    record: &Record,
) -> Result<Json, ValidationError> {
    match payload {
        Payload::Object { target } => {
            let fields = registry.fields(target).unwrap_or(&[]);
            let map = encode_fields(registry, fields, record)?;
            Ok(Json::Object(map))
        }
        Payload::Single { field } => match record.get(&field.key) {
            Some(value) => encode_value(registry, &field.kind, &field.key, value),
            None if field.required => Err(ValidationError::InvalidBeforeEncode {
                key: field.key.clone(),
            }),
            None => Ok(Json::Null),
        },
    }
}

/// Decodes one JSON value against a schema type.
///
/// `key` is the error context; array elements extend it with their index.
pub fn decode_value(
    registry: &TypeRegistry,
    kind: &TypeKind,
    key: &str,
    json: &Json,
) -> Result<Value, ValidationError> {
    match kind {
        TypeKind::Primitive(primitive) => decode_primitive(*primitive, key, json),
        TypeKind::Array { element } => {
            let items = json.as_array().ok_or(ValidationError::WrongKind {
                key: key.to_string(),
                expected: "array",
            })?;
            let mut out = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                let child = format!("{key}[{index}]");
                out.push(decode_value(registry, &element.kind, &child, item)?);
            }
            Ok(Value::Array(out))
        }
        TypeKind::Object { fields } => decode_object(registry, fields, key, json),
        TypeKind::Reference { target } => {
            let fields = registry.fields(target).unwrap_or(&[]);
            decode_object(registry, fields, key, json)
        }
    }
}

fn decode_object(
    registry: &TypeRegistry,
    fields: &[Field],
    key: &str,
    json: &Json,
) -> Result<Value, ValidationError> {
    let map = json.as_object().ok_or(ValidationError::WrongKind {
        key: key.to_string(),
        expected: "object",
    })?;
    Ok(Value::Object(decode_fields(registry, fields, map)?))
}

fn decode_fields(
    registry: &TypeRegistry,
    fields: &[Field],
    map: &serde_json::Map<String, Json>,
) -> Result<Record, ValidationError> {
    let mut record = Record::new();
    for field in fields {
        if let Some(condition) = &field.condition {
            if !condition.evaluate(&record) {
                continue;
            }
        }
        decode_field(registry, field, map.get(&field.key), &mut record)?;
    }
    Ok(record)
}

fn decode_field(
    registry: &TypeRegistry,
    field: &Field,
    json: Option<&Json>,
    record: &mut Record,
) -> Result<(), ValidationError> {
    match json {
        Some(value) if !value.is_null() => {
            let decoded = decode_value(registry, &field.kind, &field.key, value)?;
            record.set(field.key.clone(), decoded);
        }
        _ => {
            if let Some(literal) = field.default.literal() {
                record.set(field.key.clone(), literal.to_value());
            } else if matches!(field.default, FieldDefault::EmptyArray) {
                record.set(field.key.clone(), Value::Array(Vec::new()));
            } else if field.required {
                return Err(ValidationError::MissingRequiredField {
                    key: field.key.clone(),
                });
            }
        }
    }
    Ok(())
}

fn decode_primitive(
    primitive: Primitive,
    key: &str,
    json: &Json,
) -> Result<Value, ValidationError> {
    let mismatch = || ValidationError::WrongKind {
        key: key.to_string(),
        expected: primitive.name(),
    };
    match primitive {
        Primitive::Int => json.as_i64().map(Value::Int).ok_or_else(mismatch),
        Primitive::Uint => {
            if let Some(value) = json.as_u64() {
                Ok(Value::Uint(value))
            } else if json.as_i64().is_some() {
                Err(ValidationError::OutOfRange {
                    key: key.to_string(),
                })
            } else {
                Err(mismatch())
            }
        }
        Primitive::Double => json.as_f64().map(Value::Double).ok_or_else(mismatch),
        Primitive::Bool => json.as_bool().map(Value::Bool).ok_or_else(mismatch),
        Primitive::String => json
            .as_str()
            .map(|s| Value::String(s.to_string()))
            .ok_or_else(mismatch),
    }
}

/// Encodes one typed value against a schema type.
pub fn encode_value(
    registry: &TypeRegistry,
    kind: &TypeKind,
    key: &str,
    value: &Value,
) -> Result<Json, ValidationError> {
    match kind {
        TypeKind::Primitive(primitive) => encode_primitive(*primitive, key, value),
        TypeKind::Array { element } => {
            let items = value.as_array().ok_or(ValidationError::WrongKind {
                key: key.to_string(),
                expected: "array",
            })?;
            let mut out = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                let child = format!("{key}[{index}]");
                out.push(encode_value(registry, &element.kind, &child, item)?);
            }
            Ok(Json::Array(out))
        }
        TypeKind::Object { fields } => encode_object(registry, fields, key, value),
        TypeKind::Reference { target } => {
            let fields = registry.fields(target).unwrap_or(&[]);
            encode_object(registry, fields, key, value)
        }
    }
}

fn encode_object(
    registry: &TypeRegistry,
    fields: &[Field],
    key: &str,
    value: &Value,
) -> Result<Json, ValidationError> {
    let record = value.as_record().ok_or(ValidationError::WrongKind {
        key: key.to_string(),
        expected: "object",
    })?;
    Ok(Json::Object(encode_fields(registry, fields, record)?))
}

fn encode_fields(
    registry: &TypeRegistry,
    fields: &[Field],
    record: &Record,
) -> Result<serde_json::Map<String, Json>, ValidationError> {
    let mut map = serde_json::Map::new();
    for field in fields {
        if let Some(condition) = &field.condition {
            if !condition.evaluate(record) {
                continue;
            }
        }
        match record.get(&field.key) {
            Some(value) if field.required => {
                let encoded = encode_value(registry, &field.kind, &field.key, value)?;
                map.insert(field.key.clone(), encoded);
            }
            Some(value) => {
                // Optional slots that do not validate are skipped, not errors.
                if is_valid(registry, &field.kind, value) {
                    let encoded = encode_value(registry, &field.kind, &field.key, value)?;
                    map.insert(field.key.clone(), encoded);
                }
            }
            None if field.required => {
                return Err(ValidationError::InvalidBeforeEncode {
                    key: field.key.clone(),
                });
            }
            None => {}
        }
    }
    Ok(map)
}

fn encode_primitive(primitive: Primitive, key: &str, value: &Value) -> Result<Json, ValidationError> {
    let mismatch = || ValidationError::WrongKind {
        key: key.to_string(),
        expected: primitive.name(),
    };
    match (primitive, value) {
        (Primitive::Int, Value::Int(n)) => Ok(Json::from(*n)),
        (Primitive::Uint, Value::Uint(n)) => Ok(Json::from(*n)),
        (Primitive::Double, Value::Double(f)) => serde_json::Number::from_f64(*f)
            .map(Json::Number)
            .ok_or(ValidationError::OutOfRange {
                key: key.to_string(),
            }),
        (Primitive::Bool, Value::Bool(b)) => Ok(Json::Bool(*b)),
        (Primitive::String, Value::String(s)) => Ok(Json::String(s.clone())),
        _ => Err(mismatch()),
    }
}

/// Structural validity of a value against a schema type.
///
/// Objects require every required field whose condition holds to be present
/// and recursively valid; optional fields are never checked. Non-finite
/// doubles are invalid since they have no JSON representation.
pub fn is_valid(registry: &TypeRegistry, kind: &TypeKind, value: &Value) -> bool {
    match kind {
        TypeKind::Primitive(Primitive::Double) => {
            matches!(value, Value::Double(f) if f.is_finite())
        }
        TypeKind::Primitive(primitive) => value.primitive() == Some(*primitive),
        TypeKind::Array { element } => match value.as_array() {
            Some(items) => items
                .iter()
                .all(|item| is_valid(registry, &element.kind, item)),
            None => false,
        },
        TypeKind::Object { fields } => record_is_valid(registry, fields, value),
        TypeKind::Reference { target } => {
            let fields = registry.fields(target).unwrap_or(&[]);
            record_is_valid(registry, fields, value)
        }
    }
}

fn record_is_valid(registry: &TypeRegistry, fields: &[Field], value: &Value) -> bool {
    let Some(record) = value.as_record() else {
        return false;
    };
    for field in fields {
        if !field.required {
            continue;
        }
        if let Some(condition) = &field.condition {
            if !condition.evaluate(record) {
                continue;
            }
        }
        match record.get(&field.key) {
            Some(inner) => {
                if !is_valid(registry, &field.kind, inner) {
                    return false;
                }
            }
            None => return false,
        }
    }
    true
}
