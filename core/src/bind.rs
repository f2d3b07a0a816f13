//! Console argument binding.
//!
//! Turns a flat token list into a typed request [`Record`]. Each field is
//! filled from the first available source: a named option, the next unused
//! positional token, then the declared default. A required field with no
//! source fails with [`BindingError::MissingArgument`].
//!
//! Coercion is strict and consumes the whole token: `7x` is not an int and
//! only the literals `true`/`false` are bools. Tokens for array and object
//! fields are parsed as JSON text and run through the wire codec.

use std::collections::HashMap;

use crate::codec::decode_value;
use crate::error::BindingError;
use crate::registry::TypeRegistry;
use crate::types::{Command, Field, FieldDefault, Payload, Primitive, TypeKind};
use crate::value::{Record, Value};

/// Fields a command's request exposes to the console.
///
/// Single roots expose their synthetic wrapper field; object roots expose
/// the referenced type's field list.
pub fn binding_fields<'a>(registry: &'a TypeRegistry, command: &'a Command) -> &'a [Field] {
    match &command.request {
        Payload::Object { target } => registry.fields(target).unwrap_or(&[]),
        Payload::Single { field } => std::slice::from_ref(field),
    }
}

/// Splits raw console arguments into positional tokens and named options.
///
/// A token starting with `-` becomes an option only when its name matches a
/// declared option of `fields`; anything else stays positional, so negative
/// numbers pass through. Bool options accept the bare `-opt` and `-noopt`
/// forms, everything else takes `-opt=value`.
pub fn split_tokens(
    fields: &[Field],
    args: &[String],
) -> (Vec<String>, HashMap<String, String>) {
    let mut tokens = Vec::new();
    let mut options = HashMap::new();
    for arg in args {
        if let Some(candidate) = arg.strip_prefix('-') {
            if let Some((name, value)) = candidate.split_once('=') {
                if find_option(fields, name).is_some() {
                    options.insert(name.to_string(), value.to_string());
                    continue;
                }
            } else if let Some(field) = find_option(fields, candidate) {
                if is_bool(field) {
                    options.insert(candidate.to_string(), "true".to_string());
                    continue;
                }
            } else if let Some(name) = candidate.strip_prefix("no") {
                if let Some(field) = find_option(fields, name) {
                    if is_bool(field) {
                        options.insert(name.to_string(), "false".to_string());
                        continue;
                    }
                }
            }
        }
        tokens.push(arg.clone());
    }
    (tokens, options)
}

fn find_option<'a>(fields: &'a [Field], name: &str) -> Option<&'a Field> {
    fields
        .iter()
        .find(|field| field.opt.as_deref() == Some(name))
}

fn is_bool(field: &Field) -> bool {
    matches!(field.kind, TypeKind::Primitive(Primitive::Bool))
}

/// Binds console tokens and options to a request record.
///
/// Fields are filled in normalized order; a field whose condition fails
/// against the record bound so far is skipped without consuming a token.
/// The up-front capacity check counts positional tokens only.
pub fn bind(
    registry: &TypeRegistry,
    command: &Command,
    tokens: &[String],
    options: &HashMap<String, String>,
) -> Result<Record, BindingError> {
    let fields = binding_fields(registry, command);
    if tokens.len() > fields.len() {
        return Err(BindingError::TooManyArguments { max: fields.len() });
    }

    let mut record = Record::new();
    let mut cursor = 0;
    for field in fields {
        if let Some(condition) = &field.condition {
            if !condition.evaluate(&record) {
                continue;
            }
        }

        let source = match field.opt.as_deref().and_then(|opt| options.get(opt)) {
            Some(value) => Some(value.as_str()),
            None if cursor < tokens.len() => {
                cursor += 1;
                Some(tokens[cursor - 1].as_str())
            }
            None => None,
        };

        match source {
            Some(text) => {
                let value = coerce(registry, field, text)?;
                record.set(field.key.clone(), value);
            }
            None => {
                if let Some(literal) = field.default.literal() {
                    record.set(field.key.clone(), literal.to_value());
                } else if matches!(field.default, FieldDefault::EmptyArray) {
                    record.set(field.key.clone(), Value::Array(Vec::new()));
                } else if field.required {
                    return Err(BindingError::MissingArgument {
                        key: field.key.clone(),
                    });
                }
            }
        }
    }
    Ok(record)
}

fn coerce(registry: &TypeRegistry, field: &Field, text: &str) -> Result<Value, BindingError> {
    let mismatch = |expected: &'static str| BindingError::Coercion {
        key: field.key.clone(),
        expected,
    };
    match &field.kind {
        TypeKind::Primitive(Primitive::Int) => text
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| mismatch("int")),
        TypeKind::Primitive(Primitive::Uint) => text
            .parse::<u64>()
            .map(Value::Uint)
            .map_err(|_| mismatch("uint")),
        TypeKind::Primitive(Primitive::Double) => text
            .parse::<f64>()
            .map(Value::Double)
            .map_err(|_| mismatch("double")),
        TypeKind::Primitive(Primitive::Bool) => match text {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(mismatch("bool")),
        },
        TypeKind::Primitive(Primitive::String) => Ok(Value::String(text.to_string())),
        kind => {
            let json: serde_json::Value =
                serde_json::from_str(text).map_err(|_| BindingError::MalformedJson {
                    key: field.key.clone(),
                })?;
            Ok(decode_value(registry, kind, &field.key, &json)?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::{ConditionExpr, ConditionTerm};
    use crate::error::ValidationError;
    use crate::types::{Literal, TypeId};

    fn strs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn register(registry: &mut TypeRegistry, name: &str, fields: Vec<Field>) -> Command {
        let target = TypeId::new(name);
        registry
            .insert(target.clone(), TypeKind::Object { fields })
            .unwrap();
        Command::new(
            name.trim_end_matches("-request"),
            Payload::Object { target },
            "",
        )
    }

    fn send_command(registry: &mut TypeRegistry) -> Command {
        register(
            registry,
            "send-request",
            vec![
                Field::new("to", TypeKind::Primitive(Primitive::String)),
                Field::new("amount", TypeKind::Primitive(Primitive::Int))
                    .with_opt("amount"),
            ],
        )
    }

    #[test]
    fn test_named_option_beats_positional() {
        let mut registry = TypeRegistry::new();
        let command = send_command(&mut registry);
        let fields = binding_fields(&registry, &command).to_vec();
        let (tokens, options) = split_tokens(&fields, &strs(&["addr", "-amount=5", "7"]));
        let record = bind(&registry, &command, &tokens, &options).unwrap();
        assert_eq!(record.get("to"), Some(&Value::String("addr".to_string())));
        assert_eq!(record.get("amount"), Some(&Value::Int(5)));
    }

    #[test]
    fn test_too_many_arguments_names_maximum() {
        let mut registry = TypeRegistry::new();
        let command = send_command(&mut registry);
        let err = bind(&registry, &command, &strs(&["a", "b", "c"]), &HashMap::new())
            .unwrap_err();
        assert_eq!(err, BindingError::TooManyArguments { max: 2 });
    }

    #[test]
    fn test_missing_required_argument() {
        let mut registry = TypeRegistry::new();
        let command = send_command(&mut registry);
        let err = bind(&registry, &command, &[], &HashMap::new()).unwrap_err();
        assert_eq!(
            err,
            BindingError::MissingArgument {
                key: "to".to_string()
            }
        );
    }

    #[test]
    fn test_default_fills_absent_optional() {
        let mut registry = TypeRegistry::new();
        let command = register(
            &mut registry,
            "list-request",
            vec![
                Field::new("count", TypeKind::Primitive(Primitive::Uint))
                    .optional()
                    .with_default(FieldDefault::Literal(Literal::Uint(10))),
            ],
        );
        let record = bind(&registry, &command, &[], &HashMap::new()).unwrap();
        assert_eq!(record.get("count"), Some(&Value::Uint(10)));
    }

    #[test]
    fn test_bool_option_forms() {
        let mut registry = TypeRegistry::new();
        let command = register(
            &mut registry,
            "serve-request",
            vec![
                Field::new("listen", TypeKind::Primitive(Primitive::Bool))
                    .optional()
                    .with_opt("listen"),
            ],
        );
        let fields = binding_fields(&registry, &command).to_vec();

        let (tokens, options) = split_tokens(&fields, &strs(&["-listen"]));
        assert!(tokens.is_empty());
        let record = bind(&registry, &command, &tokens, &options).unwrap();
        assert_eq!(record.get("listen"), Some(&Value::Bool(true)));

        let (tokens, options) = split_tokens(&fields, &strs(&["-nolisten"]));
        let record = bind(&registry, &command, &tokens, &options).unwrap();
        assert_eq!(record.get("listen"), Some(&Value::Bool(false)));
    }

    #[test]
    fn test_undeclared_dash_token_stays_positional() {
        let mut registry = TypeRegistry::new();
        let command = register(
            &mut registry,
            "adjust-request",
            vec![Field::new("delta", TypeKind::Primitive(Primitive::Int))],
        );
        let fields = binding_fields(&registry, &command).to_vec();
        let (tokens, options) = split_tokens(&fields, &strs(&["-5"]));
        assert!(options.is_empty());
        let record = bind(&registry, &command, &tokens, &options).unwrap();
        assert_eq!(record.get("delta"), Some(&Value::Int(-5)));
    }

    #[test]
    fn test_strict_coercion_rejects_partial_tokens() {
        let mut registry = TypeRegistry::new();
        let command = register(
            &mut registry,
            "probe-request",
            vec![Field::new("n", TypeKind::Primitive(Primitive::Int))],
        );
        let err = bind(&registry, &command, &strs(&["7x"]), &HashMap::new()).unwrap_err();
        assert_eq!(
            err,
            BindingError::Coercion {
                key: "n".to_string(),
                expected: "int"
            }
        );
    }

    #[test]
    fn test_bool_rejects_numeric_literals() {
        let mut registry = TypeRegistry::new();
        let command = register(
            &mut registry,
            "flag-request",
            vec![Field::new("on", TypeKind::Primitive(Primitive::Bool))],
        );
        let err = bind(&registry, &command, &strs(&["1"]), &HashMap::new()).unwrap_err();
        assert_eq!(
            err,
            BindingError::Coercion {
                key: "on".to_string(),
                expected: "bool"
            }
        );
    }

    #[test]
    fn test_json_tokens_for_array_fields() {
        let mut registry = TypeRegistry::new();
        let command = register(
            &mut registry,
            "mark-request",
            vec![Field::new(
                "ids",
                TypeKind::Array {
                    element: Box::new(Field::new("id", TypeKind::Primitive(Primitive::Int))),
                },
            )],
        );

        let record = bind(&registry, &command, &strs(&["[1,2,3]"]), &HashMap::new()).unwrap();
        assert_eq!(
            record.get("ids"),
            Some(&Value::Array(vec![
                Value::Int(1),
                Value::Int(2),
                Value::Int(3)
            ]))
        );

        let err = bind(&registry, &command, &strs(&["[1,"]), &HashMap::new()).unwrap_err();
        assert_eq!(
            err,
            BindingError::MalformedJson {
                key: "ids".to_string()
            }
        );

        let err = bind(&registry, &command, &strs(&["[\"x\"]"]), &HashMap::new()).unwrap_err();
        assert_eq!(
            err,
            BindingError::Invalid(ValidationError::WrongKind {
                key: "ids[0]".to_string(),
                expected: "int"
            })
        );
    }

    #[test]
    fn test_condition_skips_field_without_consuming_token() {
        let mut registry = TypeRegistry::new();
        let condition = ConditionExpr {
            raw: "fork=true".to_string(),
            terms: vec![ConditionTerm {
                connective: None,
                key: "fork".to_string(),
                value: Some(Literal::Bool(true)),
            }],
        };
        let command = register(
            &mut registry,
            "switch-request",
            vec![
                Field::new("fork", TypeKind::Primitive(Primitive::Bool)),
                Field::new("payload", TypeKind::Primitive(Primitive::String))
                    .with_condition(condition),
            ],
        );

        let record = bind(&registry, &command, &strs(&["false"]), &HashMap::new()).unwrap();
        assert!(record.get("payload").is_none());

        let record =
            bind(&registry, &command, &strs(&["true", "blob"]), &HashMap::new()).unwrap();
        assert_eq!(
            record.get("payload"),
            Some(&Value::String("blob".to_string()))
        );
    }
}
