//! Dynamically typed field values.

use std::fmt;

use bytes::Bytes;
use serde_json::{Number, Value as Json};
use uuid::Uuid;

use crate::data_type::DataType;
use crate::error::{Result, StructError};

/// A single scalar field value, tagged with its wire encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Byte(u8),
    Word(u16),
    Dword(u32),
    Qword(u64),
    SignedByte(i8),
    SignedWord(i16),
    SignedDword(i32),
    SignedQword(i64),
    Single(f32),
    Double(f64),
    Boolean(bool),
    Guid(Uuid),
    String(String),
    Binary(Bytes),
}

/// A [`Value`] held a different variant than the caller asked for.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected a {expected} value, found {found}")]
pub struct ValueTypeError {
    pub expected: &'static str,
    pub found: &'static str,
}

impl Value {
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Byte(_) => DataType::Byte,
            Value::Word(_) => DataType::Word,
            Value::Dword(_) => DataType::Dword,
            Value::Qword(_) => DataType::Qword,
            Value::SignedByte(_) => DataType::SignedByte,
            Value::SignedWord(_) => DataType::SignedWord,
            Value::SignedDword(_) => DataType::SignedDword,
            Value::SignedQword(_) => DataType::SignedQword,
            Value::Single(_) => DataType::Single,
            Value::Double(_) => DataType::Double,
            Value::Boolean(_) => DataType::Boolean,
            Value::Guid(_) => DataType::Guid,
            Value::String(_) => DataType::String,
            Value::Binary(_) => DataType::Binary,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.data_type().as_str()
    }

    /// Convert a JSON value into a value of `data_type`.
    ///
    /// Integers must be in range for the target width. Guids are parsed from
    /// their hyphenated string form and binary blobs from arrays of bytes.
    pub fn from_json(data_type: DataType, field: &str, json: &Json) -> Result<Value> {
        let mismatch = || StructError::TypeMismatch {
            field: field.to_string(),
            expected: data_type.as_str(),
            found: json_type_name(json),
        };

        let value = match data_type {
            DataType::Byte => Value::Byte(unsigned(json).ok_or_else(mismatch)?),
            DataType::Word => Value::Word(unsigned(json).ok_or_else(mismatch)?),
            DataType::Dword => Value::Dword(unsigned(json).ok_or_else(mismatch)?),
            DataType::Qword => Value::Qword(json.as_u64().ok_or_else(mismatch)?),
            DataType::SignedByte => Value::SignedByte(signed(json).ok_or_else(mismatch)?),
            DataType::SignedWord => Value::SignedWord(signed(json).ok_or_else(mismatch)?),
            DataType::SignedDword => Value::SignedDword(signed(json).ok_or_else(mismatch)?),
            DataType::SignedQword => Value::SignedQword(json.as_i64().ok_or_else(mismatch)?),
            DataType::Single => Value::Single(json.as_f64().ok_or_else(mismatch)? as f32),
            DataType::Double => Value::Double(json.as_f64().ok_or_else(mismatch)?),
            DataType::Boolean => Value::Boolean(json.as_bool().ok_or_else(mismatch)?),
            DataType::Guid => {
                let text = json.as_str().ok_or_else(mismatch)?;
                Value::Guid(Uuid::parse_str(text).map_err(|_| mismatch())?)
            }
            DataType::String => Value::String(json.as_str().ok_or_else(mismatch)?.to_string()),
            DataType::Binary => {
                let items = json.as_array().ok_or_else(mismatch)?;
                let raw = items
                    .iter()
                    .map(|item| unsigned::<u8>(item).ok_or_else(mismatch))
                    .collect::<Result<Vec<u8>>>()?;
                Value::Binary(Bytes::from(raw))
            }
        };
        Ok(value)
    }

    /// JSON rendering used by the CLI and by [`Value::from_json`] round trips.
    pub fn to_json(&self) -> Json {
        match self {
            Value::Byte(v) => Json::from(*v),
            Value::Word(v) => Json::from(*v),
            Value::Dword(v) => Json::from(*v),
            Value::Qword(v) => Json::from(*v),
            Value::SignedByte(v) => Json::from(*v),
            Value::SignedWord(v) => Json::from(*v),
            Value::SignedDword(v) => Json::from(*v),
            Value::SignedQword(v) => Json::from(*v),
            Value::Single(v) => float(f64::from(*v)),
            Value::Double(v) => float(*v),
            Value::Boolean(v) => Json::Bool(*v),
            Value::Guid(v) => Json::String(v.hyphenated().to_string()),
            Value::String(v) => Json::String(v.clone()),
            Value::Binary(v) => Json::Array(v.iter().map(|b| Json::from(*b)).collect()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(v) => f.write_str(v),
            Value::Guid(v) => write!(f, "{}", v.hyphenated()),
            Value::Binary(v) => {
                for byte in v.iter() {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
            other => write!(f, "{}", other.to_json()),
        }
    }
}

fn unsigned<T: TryFrom<u64>>(json: &Json) -> Option<T> {
    json.as_u64().and_then(|v| T::try_from(v).ok())
}

fn signed<T: TryFrom<i64>>(json: &Json) -> Option<T> {
    json.as_i64().and_then(|v| T::try_from(v).ok())
}

fn float(v: f64) -> Json {
    Number::from_f64(v).map(Json::Number).unwrap_or(Json::Null)
}

fn json_type_name(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

macro_rules! value_conversions {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }

            impl TryFrom<Value> for $ty {
                type Error = ValueTypeError;

                fn try_from(value: Value) -> std::result::Result<Self, Self::Error> {
                    match value {
                        Value::$variant(v) => Ok(v),
                        other => Err(ValueTypeError {
                            expected: DataType::$variant.as_str(),
                            found: other.type_name(),
                        }),
                    }
                }
            }
        )*
    };
}

value_conversions! {
    Byte => u8,
    Word => u16,
    Dword => u32,
    Qword => u64,
    SignedByte => i8,
    SignedWord => i16,
    SignedDword => i32,
    SignedQword => i64,
    Single => f32,
    Double => f64,
    Boolean => bool,
    Guid => Uuid,
    String => String,
    Binary => Bytes,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Binary(Bytes::from(v))
    }
}
