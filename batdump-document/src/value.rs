//! Tagged value tree used as the serialized form of a [`Document`](crate::Document).
//!
//! Accessors never panic: a missing member or a value of the wrong kind is
//! reported through [`ValueError`].

use std::collections::BTreeMap;
use std::io::Write;

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::error::{ValueError, WriteError};

/// Object members, ordered by key.
pub type Object = BTreeMap<String, Value>;

/// A JSON-like value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Value {
    /// Absent value.
    #[default]
    Null,
    /// Integer number.
    Number(i64),
    /// Text.
    String(String),
    /// Ordered sequence.
    Array(Vec<Value>),
    /// Key/value mapping.
    Object(Object),
}

impl Value {
    /// Name of this value's kind, as used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    fn mismatch(&self, expected: &'static str) -> ValueError {
        ValueError::TypeMismatch {
            expected,
            found: self.kind(),
        }
    }

    pub fn as_i64(&self) -> Result<i64, ValueError> {
        match self {
            Value::Number(n) => Ok(*n),
            other => Err(other.mismatch("number")),
        }
    }

    pub fn as_str(&self) -> Result<&str, ValueError> {
        match self {
            Value::String(s) => Ok(s),
            other => Err(other.mismatch("string")),
        }
    }

    pub fn as_array(&self) -> Result<&[Value], ValueError> {
        match self {
            Value::Array(items) => Ok(items),
            other => Err(other.mismatch("array")),
        }
    }

    pub fn as_object(&self) -> Result<&Object, ValueError> {
        match self {
            Value::Object(members) => Ok(members),
            other => Err(other.mismatch("object")),
        }
    }

    /// Look up an object member.
    pub fn get(&self, key: &str) -> Result<&Value, ValueError> {
        self.as_object()?
            .get(key)
            .ok_or_else(|| ValueError::MissingKey(key.to_string()))
    }

    /// Look up an array element.
    pub fn at(&self, index: usize) -> Result<&Value, ValueError> {
        let items = self.as_array()?;
        items.get(index).ok_or(ValueError::IndexOutOfRange {
            index,
            len: items.len(),
        })
    }

    /// Write this value as JSON.
    pub fn write_json<W: Write>(&self, writer: W, pretty: bool) -> Result<(), WriteError> {
        if pretty {
            serde_json::to_writer_pretty(writer, self)?;
        } else {
            serde_json::to_writer(writer, self)?;
        }
        Ok(())
    }

    /// Render this value as a compact JSON string.
    pub fn to_json_string(&self) -> Result<String, WriteError> {
        Ok(serde_json::to_string(self)?)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Number(n) => serializer.serialize_i64(*n),
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Object(members) => {
                let mut map = serializer.serialize_map(Some(members.len()))?;
                for (key, value) in members {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value)
    }
}

impl From<u16> for Value {
    fn from(value: u16) -> Self {
        Value::Number(value as i64)
    }
}

impl From<u8> for Value {
    fn from(value: u8) -> Self {
        Value::Number(value as i64)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Array(value)
    }
}

impl From<Object> for Value {
    fn from(value: Object) -> Self {
        Value::Object(value)
    }
}
