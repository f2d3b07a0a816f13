//! Runtime values flowing through the codec and the CLI binder.
//!
//! A decoded request or response is a [`Value`] tree. Object values are
//! [`Record`]s: ordered key slots where absence of a key means the field was
//! never bound. Validity of a required field is exactly presence of its
//! slot, so there is no separate valid flag to keep in sync.

use crate::types::{Literal, Primitive};

/// A dynamically typed protocol value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Uint(u64),
    Double(f64),
    Bool(bool),
    String(String),
    Array(Vec<Value>),
    Object(Record),
}

impl Value {
    /// The primitive kind of this value, when it is one.
    pub fn primitive(&self) -> Option<Primitive> {
        match self {
            Value::Int(_) => Some(Primitive::Int),
            Value::Uint(_) => Some(Primitive::Uint),
            Value::Double(_) => Some(Primitive::Double),
            Value::Bool(_) => Some(Primitive::Bool),
            Value::String(_) => Some(Primitive::String),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Shape name for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Uint(_) => "uint",
            Value::Double(_) => "double",
            Value::Bool(_) => "bool",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Object(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Uint(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Record> for Value {
    fn from(v: Record) -> Self {
        Value::Object(v)
    }
}

impl Literal {
    /// Materializes the literal as a runtime value.
    pub fn to_value(&self) -> Value {
        match self {
            Literal::Int(v) => Value::Int(*v),
            Literal::Uint(v) => Value::Uint(*v),
            Literal::Double(v) => Value::Double(*v),
            Literal::Bool(v) => Value::Bool(*v),
            Literal::String(v) => Value::String(v.clone()),
        }
    }

    /// Typed equality against a runtime value. Kinds never coerce, so an
    /// `Int` literal does not match a `Uint` slot.
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (Literal::Int(a), Value::Int(b)) => a == b,
            (Literal::Uint(a), Value::Uint(b)) => a == b,
            (Literal::Double(a), Value::Double(b)) => a == b,
            (Literal::Bool(a), Value::Bool(b)) => a == b,
            (Literal::String(a), Value::String(b)) => a == b,
            _ => false,
        }
    }
}

/// Ordered field slots of an object value.
///
/// Insertion order is preserved and duplicate keys replace in place, so a
/// record built in normalized field order encodes in normalized key order.
///
/// # Examples
///
/// ```
/// use rpckit_core::{Record, Value};
///
/// let mut record = Record::new();
/// record.set("from", Value::String("alice".into()));
/// record.set("amount", Value::Double(12.5));
/// assert_eq!(record.get("amount"), Some(&Value::Double(12.5)));
/// assert!(record.get("memo").is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    entries: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Record::default()
    }

    /// Looks up a slot by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Sets a slot, replacing in place when the key already exists.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Clears a slot, returning its value. A cleared required field makes
    /// the record invalid for encoding.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (key, value) in iter {
            record.set(key, value);
        }
        record
    }
}
