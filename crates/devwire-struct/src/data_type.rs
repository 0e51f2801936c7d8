//! Fixed wire encodings for scalar fields.
//!
//! All multi-byte integers and floats are little-endian. `String` and `Binary`
//! carry a 2-byte little-endian length prefix followed by the raw bytes with no
//! terminator. `Guid` is 16 raw bytes in canonical (RFC 4122) order.

use std::fmt;
use std::str::FromStr;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, StructError};
use crate::value::Value;

/// Length prefix of strings, binary blobs and arrays.
pub const LENGTH_PREFIX_SIZE: usize = 2;

/// Scalar wire encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Byte,
    Word,
    Dword,
    Qword,
    SignedByte,
    SignedWord,
    SignedDword,
    SignedQword,
    Single,
    Double,
    Boolean,
    Guid,
    String,
    Binary,
}

impl DataType {
    /// Every supported data type, in protocol code order.
    pub const ALL: [DataType; 14] = [
        DataType::Byte,
        DataType::Word,
        DataType::Dword,
        DataType::Qword,
        DataType::SignedByte,
        DataType::SignedWord,
        DataType::SignedDword,
        DataType::SignedQword,
        DataType::Single,
        DataType::Double,
        DataType::Boolean,
        DataType::Guid,
        DataType::String,
        DataType::Binary,
    ];

    /// Type code used in device registration payloads.
    pub fn code(self) -> u8 {
        match self {
            DataType::Byte => 1,
            DataType::Word => 2,
            DataType::Dword => 3,
            DataType::Qword => 4,
            DataType::SignedByte => 5,
            DataType::SignedWord => 6,
            DataType::SignedDword => 7,
            DataType::SignedQword => 8,
            DataType::Single => 9,
            DataType::Double => 10,
            DataType::Boolean => 11,
            DataType::Guid => 12,
            DataType::String => 13,
            DataType::Binary => 14,
        }
    }

    /// Resolve a registration type code.
    ///
    /// Codes for null, array and object parameters exist on the wire but have
    /// no scalar encoding and are rejected.
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0 => Err(StructError::UnsupportedDataType("null".to_string())),
            15 => Err(StructError::UnsupportedDataType("array".to_string())),
            16 => Err(StructError::UnsupportedDataType("object".to_string())),
            _ => DataType::ALL
                .into_iter()
                .find(|data_type| data_type.code() == code)
                .ok_or_else(|| StructError::UnsupportedDataType(format!("code {code}"))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DataType::Byte => "byte",
            DataType::Word => "word",
            DataType::Dword => "dword",
            DataType::Qword => "qword",
            DataType::SignedByte => "signed_byte",
            DataType::SignedWord => "signed_word",
            DataType::SignedDword => "signed_dword",
            DataType::SignedQword => "signed_qword",
            DataType::Single => "single",
            DataType::Double => "double",
            DataType::Boolean => "boolean",
            DataType::Guid => "guid",
            DataType::String => "string",
            DataType::Binary => "binary",
        }
    }

    /// Encoded width, or `None` for length-prefixed types.
    pub fn fixed_width(self) -> Option<usize> {
        match self {
            DataType::Byte | DataType::SignedByte | DataType::Boolean => Some(1),
            DataType::Word | DataType::SignedWord => Some(2),
            DataType::Dword | DataType::SignedDword | DataType::Single => Some(4),
            DataType::Qword | DataType::SignedQword | DataType::Double => Some(8),
            DataType::Guid => Some(16),
            DataType::String | DataType::Binary => None,
        }
    }

    /// Zero value a freshly created slot of this type holds.
    pub fn default_value(self) -> Value {
        match self {
            DataType::Byte => Value::Byte(0),
            DataType::Word => Value::Word(0),
            DataType::Dword => Value::Dword(0),
            DataType::Qword => Value::Qword(0),
            DataType::SignedByte => Value::SignedByte(0),
            DataType::SignedWord => Value::SignedWord(0),
            DataType::SignedDword => Value::SignedDword(0),
            DataType::SignedQword => Value::SignedQword(0),
            DataType::Single => Value::Single(0.0),
            DataType::Double => Value::Double(0.0),
            DataType::Boolean => Value::Boolean(false),
            DataType::Guid => Value::Guid(Uuid::nil()),
            DataType::String => Value::String(String::new()),
            DataType::Binary => Value::Binary(Bytes::new()),
        }
    }

    /// Append the encoding of `value` to `dst`.
    pub fn encode(self, field: &str, value: &Value, dst: &mut BytesMut) -> Result<()> {
        match (self, value) {
            (DataType::Byte, Value::Byte(v)) => dst.put_u8(*v),
            (DataType::Word, Value::Word(v)) => dst.put_u16_le(*v),
            (DataType::Dword, Value::Dword(v)) => dst.put_u32_le(*v),
            (DataType::Qword, Value::Qword(v)) => dst.put_u64_le(*v),
            (DataType::SignedByte, Value::SignedByte(v)) => dst.put_i8(*v),
            (DataType::SignedWord, Value::SignedWord(v)) => dst.put_i16_le(*v),
            (DataType::SignedDword, Value::SignedDword(v)) => dst.put_i32_le(*v),
            (DataType::SignedQword, Value::SignedQword(v)) => dst.put_i64_le(*v),
            (DataType::Single, Value::Single(v)) => dst.put_f32_le(*v),
            (DataType::Double, Value::Double(v)) => dst.put_f64_le(*v),
            (DataType::Boolean, Value::Boolean(v)) => dst.put_u8(u8::from(*v)),
            (DataType::Guid, Value::Guid(v)) => dst.put_slice(v.as_bytes()),
            (DataType::String, Value::String(v)) => put_prefixed(field, v.as_bytes(), dst)?,
            (DataType::Binary, Value::Binary(v)) => put_prefixed(field, v, dst)?,
            (expected, found) => {
                return Err(StructError::TypeMismatch {
                    field: field.to_string(),
                    expected: expected.as_str(),
                    found: found.type_name(),
                })
            }
        }
        Ok(())
    }

    /// Decode one value from the front of `src`, advancing it.
    pub fn decode(self, field: &str, src: &mut &[u8]) -> Result<Value> {
        if let Some(width) = self.fixed_width() {
            ensure_remaining(field, src, width)?;
        }

        let value = match self {
            DataType::Byte => Value::Byte(src.get_u8()),
            DataType::Word => Value::Word(src.get_u16_le()),
            DataType::Dword => Value::Dword(src.get_u32_le()),
            DataType::Qword => Value::Qword(src.get_u64_le()),
            DataType::SignedByte => Value::SignedByte(src.get_i8()),
            DataType::SignedWord => Value::SignedWord(src.get_i16_le()),
            DataType::SignedDword => Value::SignedDword(src.get_i32_le()),
            DataType::SignedQword => Value::SignedQword(src.get_i64_le()),
            DataType::Single => Value::Single(src.get_f32_le()),
            DataType::Double => Value::Double(src.get_f64_le()),
            DataType::Boolean => Value::Boolean(src.get_u8() != 0),
            DataType::Guid => {
                let mut raw = [0u8; 16];
                src.copy_to_slice(&mut raw);
                Value::Guid(Uuid::from_bytes(raw))
            }
            DataType::String => {
                let raw = take_prefixed(field, src)?;
                let text = std::str::from_utf8(raw).map_err(|_| StructError::InvalidUtf8 {
                    field: field.to_string(),
                })?;
                Value::String(text.to_string())
            }
            DataType::Binary => Value::Binary(Bytes::copy_from_slice(take_prefixed(field, src)?)),
        };
        Ok(value)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = StructError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.to_ascii_lowercase();
        DataType::ALL
            .into_iter()
            .find(|data_type| data_type.as_str() == lower)
            .ok_or_else(|| StructError::UnsupportedDataType(s.to_string()))
    }
}

/// Fail with `MalformedPayload` unless `src` holds at least `needed` bytes.
pub(crate) fn ensure_remaining(field: &str, src: &[u8], needed: usize) -> Result<()> {
    if src.len() < needed {
        return Err(StructError::MalformedPayload {
            field: field.to_string(),
            needed,
            available: src.len(),
        });
    }
    Ok(())
}

/// Write a 2-byte length prefix for `len`, failing when it does not fit.
pub(crate) fn put_length(field: &str, len: usize, dst: &mut BytesMut) -> Result<()> {
    let prefix = u16::try_from(len).map_err(|_| StructError::LengthOverflow {
        field: field.to_string(),
        len,
    })?;
    dst.put_u16_le(prefix);
    Ok(())
}

/// Read a 2-byte length prefix.
pub(crate) fn get_length(field: &str, src: &mut &[u8]) -> Result<usize> {
    ensure_remaining(field, src, LENGTH_PREFIX_SIZE)?;
    Ok(src.get_u16_le() as usize)
}

fn put_prefixed(field: &str, raw: &[u8], dst: &mut BytesMut) -> Result<()> {
    put_length(field, raw.len(), dst)?;
    dst.put_slice(raw);
    Ok(())
}

fn take_prefixed<'a>(field: &str, src: &mut &'a [u8]) -> Result<&'a [u8]> {
    let len = get_length(field, src)?;
    ensure_remaining(field, src, len)?;
    let (head, tail) = src.split_at(len);
    *src = tail;
    Ok(head)
}
