//! Raw schema document access.
//!
//! Thin typed accessors over `serde_json` object maps. Every helper takes
//! the `-`-joined declaration path of the node it is reading, so a missing
//! key or a wrong JSON kind surfaces as a path-tagged [`SchemaError`]
//! without the caller doing any formatting. Map iteration order is
//! document order because the crate enables `serde_json`'s
//! `preserve_order` feature.

use serde_json::{Map, Value as Json};

use rpckit_core::{Example, ModeDoc, SchemaError};

pub(crate) type JsonMap = Map<String, Json>;

/// Human name for a JSON value's kind, used in mismatch messages.
pub(crate) fn kind_name(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

/// Parses document text and requires the top level to be an object.
pub(crate) fn parse_document(path: &str, text: &str) -> Result<JsonMap, SchemaError> {
    let json: Json = serde_json::from_str(text)?;
    match json {
        Json::Object(map) => Ok(map),
        other => Err(SchemaError::WrongKind {
            path: path.to_string(),
            expected: "object",
            found: kind_name(&other),
        }),
    }
}

pub(crate) fn as_object<'a>(path: &str, json: &'a Json) -> Result<&'a JsonMap, SchemaError> {
    json.as_object().ok_or_else(|| SchemaError::WrongKind {
        path: path.to_string(),
        expected: "object",
        found: kind_name(json),
    })
}

fn as_str<'a>(path: &str, json: &'a Json) -> Result<&'a str, SchemaError> {
    json.as_str().ok_or_else(|| SchemaError::WrongKind {
        path: path.to_string(),
        expected: "string",
        found: kind_name(json),
    })
}

/// Path tag for a key inside the node at `path`.
fn keyed(path: &str, key: &str) -> String {
    format!("{path}-{key}")
}

pub(crate) fn get<'a>(path: &str, map: &'a JsonMap, key: &str) -> Result<&'a Json, SchemaError> {
    map.get(key).ok_or_else(|| SchemaError::MissingKey {
        path: path.to_string(),
        key: key.to_string(),
    })
}

pub(crate) fn get_object<'a>(
    path: &str,
    map: &'a JsonMap,
    key: &str,
) -> Result<&'a JsonMap, SchemaError> {
    as_object(&keyed(path, key), get(path, map, key)?)
}

pub(crate) fn opt_object<'a>(
    path: &str,
    map: &'a JsonMap,
    key: &str,
) -> Result<Option<&'a JsonMap>, SchemaError> {
    match map.get(key) {
        Some(value) => Ok(Some(as_object(&keyed(path, key), value)?)),
        None => Ok(None),
    }
}

pub(crate) fn get_str<'a>(path: &str, map: &'a JsonMap, key: &str) -> Result<&'a str, SchemaError> {
    as_str(&keyed(path, key), get(path, map, key)?)
}

pub(crate) fn opt_str<'a>(
    path: &str,
    map: &'a JsonMap,
    key: &str,
) -> Result<Option<&'a str>, SchemaError> {
    match map.get(key) {
        Some(value) => Ok(Some(as_str(&keyed(path, key), value)?)),
        None => Ok(None),
    }
}

pub(crate) fn str_or<'a>(
    path: &str,
    map: &'a JsonMap,
    key: &str,
    fallback: &'a str,
) -> Result<&'a str, SchemaError> {
    Ok(opt_str(path, map, key)?.unwrap_or(fallback))
}

pub(crate) fn bool_or(
    path: &str,
    map: &JsonMap,
    key: &str,
    fallback: bool,
) -> Result<bool, SchemaError> {
    match map.get(key) {
        Some(value) => value.as_bool().ok_or_else(|| SchemaError::WrongKind {
            path: keyed(path, key),
            expected: "bool",
            found: kind_name(value),
        }),
        None => Ok(fallback),
    }
}

/// Reads a text block that may be written as one string or as an array of
/// lines. Array form joins with `\n`; a missing key reads as empty.
pub(crate) fn text_block(path: &str, map: &JsonMap, key: &str) -> Result<String, SchemaError> {
    match map.get(key) {
        None => Ok(String::new()),
        Some(Json::String(text)) => Ok(text.clone()),
        Some(Json::Array(items)) => {
            let mut lines = Vec::with_capacity(items.len());
            for item in items {
                lines.push(as_str(&keyed(path, key), item)?);
            }
            Ok(lines.join("\n"))
        }
        Some(other) => Err(SchemaError::WrongKind {
            path: keyed(path, key),
            expected: "string or array of strings",
            found: kind_name(other),
        }),
    }
}

/// Reads the `desc` text block of a node.
pub(crate) fn desc_text(path: &str, map: &JsonMap) -> Result<String, SchemaError> {
    text_block(path, map, "desc")
}

/// Parses an `example` value into exchange lines.
///
/// A bare string is one request line. An array mixes request-only strings
/// with `{request, response}` objects; either side of an object may be
/// omitted.
pub(crate) fn parse_examples(path: &str, value: &Json) -> Result<Vec<Example>, SchemaError> {
    let tag = keyed(path, "example");
    match value {
        Json::String(line) => Ok(vec![Example::request(line.clone())]),
        Json::Array(items) => {
            let mut examples = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Json::String(line) => examples.push(Example::request(line.clone())),
                    Json::Object(map) => {
                        // An empty side renders nothing, same as a missing one.
                        let request = opt_str(&tag, map, "request")?
                            .filter(|text| !text.is_empty())
                            .map(str::to_string);
                        let response = opt_str(&tag, map, "response")?
                            .filter(|text| !text.is_empty())
                            .map(str::to_string);
                        examples.push(Example { request, response });
                    }
                    other => {
                        return Err(SchemaError::WrongKind {
                            path: tag,
                            expected: "string or object",
                            found: kind_name(other),
                        });
                    }
                }
            }
            Ok(examples)
        }
        other => Err(SchemaError::WrongKind {
            path: tag,
            expected: "string or array",
            found: kind_name(other),
        }),
    }
}

/// Parses a mode document into mode docs, in document order.
///
/// Each entry maps a mode name to an optional `usage` line and a `desc`
/// text block.
pub(crate) fn parse_mode_document(doc: &JsonMap) -> Result<Vec<ModeDoc>, SchemaError> {
    let mut modes = Vec::with_capacity(doc.len());
    for (name, value) in doc {
        let detail = as_object(name, value)?;
        modes.push(ModeDoc {
            name: name.clone(),
            usage: str_or(name, detail, "usage", "")?.to_string(),
            desc: desc_text(name, detail)?,
        });
    }
    Ok(modes)
}

/// Parses an `error` value into note lines. A bare string is one note.
pub(crate) fn parse_error_notes(path: &str, value: &Json) -> Result<Vec<String>, SchemaError> {
    let tag = keyed(path, "error");
    match value {
        Json::String(note) => Ok(vec![note.clone()]),
        Json::Array(items) => {
            let mut notes = Vec::with_capacity(items.len());
            for item in items {
                notes.push(as_str(&tag, item)?.to_string());
            }
            Ok(notes)
        }
        other => Err(SchemaError::WrongKind {
            path: tag,
            expected: "string or array",
            found: kind_name(other),
        }),
    }
}
