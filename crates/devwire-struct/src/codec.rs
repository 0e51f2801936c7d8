//! Schema-driven struct serialization.

use bytes::{Bytes, BytesMut};
use tracing::trace;

use crate::error::Result;
use crate::schema::Schema;

/// Serializes instances field by field according to an explicit [`Schema`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StructCodec;

impl StructCodec {
    pub fn serialize<T>(schema: &Schema<T>, value: &T) -> Result<Bytes> {
        let mut dst = BytesMut::new();
        Self::serialize_into(schema, value, &mut dst)?;
        Ok(dst.freeze())
    }

    /// Append the encoding of `value` to `dst`.
    ///
    /// On error `dst` may hold a partially written struct.
    pub fn serialize_into<T>(schema: &Schema<T>, value: &T, dst: &mut BytesMut) -> Result<()> {
        schema.encode_into(value, dst)
    }

    /// Decode a fresh instance from `bytes`. Bytes after the last field are
    /// ignored.
    pub fn deserialize<T>(schema: &Schema<T>, bytes: &[u8]) -> Result<T> {
        let mut src = bytes;
        let value = schema.decode_from(&mut src)?;
        if !src.is_empty() {
            trace!(
                schema = schema.name(),
                trailing = src.len(),
                "ignoring trailing bytes after struct"
            );
        }
        Ok(value)
    }
}

/// Types with a static wire schema.
pub trait BinaryStruct: Sized + 'static {
    fn schema() -> &'static Schema<Self>;

    fn to_binary(&self) -> Result<Bytes> {
        StructCodec::serialize(Self::schema(), self)
    }

    fn from_binary(bytes: &[u8]) -> Result<Self> {
        StructCodec::deserialize(Self::schema(), bytes)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::LazyLock;

    use uuid::Uuid;

    use super::*;
    use crate::data_type::DataType;
    use crate::error::StructError;
    use crate::value::Value;

    const GUID: &str = "fa8a9d6e-6555-11e2-89b8-e0cb4eb92129";

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Sub {
        val: i16,
    }

    impl BinaryStruct for Sub {
        fn schema() -> &'static Schema<Self> {
            static SCHEMA: LazyLock<Schema<Sub>> = LazyLock::new(|| {
                Schema::new("sub").scalar(
                    "sword_prop",
                    DataType::SignedWord,
                    |s| Value::SignedWord(s.val),
                    |s, v| {
                        s.val = v.try_into()?;
                        Ok(())
                    },
                )
            });
            &SCHEMA
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Sample {
        byte_prop: u8,
        word_prop: u16,
        dword_prop: u32,
        bool_prop: bool,
        false_prop: bool,
        str_prop: String,
        arr_prop: Vec<Sub>,
        guid_prop: Uuid,
        aguid_prop: Uuid,
    }

    impl BinaryStruct for Sample {
        fn schema() -> &'static Schema<Self> {
            static SCHEMA: LazyLock<Schema<Sample>> = LazyLock::new(|| {
                Schema::with_init("sample", || Sample {
                    byte_prop: 0,
                    word_prop: 0,
                    dword_prop: 0,
                    bool_prop: false,
                    false_prop: false,
                    str_prop: String::new(),
                    arr_prop: Vec::new(),
                    guid_prop: Uuid::nil(),
                    aguid_prop: Uuid::nil(),
                })
                .scalar(
                    "byte_prop",
                    DataType::Byte,
                    |s| Value::Byte(s.byte_prop),
                    |s, v| {
                        s.byte_prop = v.try_into()?;
                        Ok(())
                    },
                )
                .scalar(
                    "word_prop",
                    DataType::Word,
                    |s| Value::Word(s.word_prop),
                    |s, v| {
                        s.word_prop = v.try_into()?;
                        Ok(())
                    },
                )
                .scalar(
                    "dword_prop",
                    DataType::Dword,
                    |s| Value::Dword(s.dword_prop),
                    |s, v| {
                        s.dword_prop = v.try_into()?;
                        Ok(())
                    },
                )
                .scalar(
                    "bool_prop",
                    DataType::Boolean,
                    |s| Value::Boolean(s.bool_prop),
                    |s, v| {
                        s.bool_prop = v.try_into()?;
                        Ok(())
                    },
                )
                .scalar(
                    "false_prop",
                    DataType::Boolean,
                    |s| Value::Boolean(s.false_prop),
                    |s, v| {
                        s.false_prop = v.try_into()?;
                        Ok(())
                    },
                )
                .scalar(
                    "str_prop",
                    DataType::String,
                    |s| Value::String(s.str_prop.clone()),
                    |s, v| {
                        s.str_prop = v.try_into()?;
                        Ok(())
                    },
                )
                .array::<Sub>("arr_prop", |s| s.arr_prop.as_slice(), |s, items| s.arr_prop = items)
                .scalar(
                    "guid_prop",
                    DataType::Guid,
                    |s| Value::Guid(s.guid_prop),
                    |s, v| {
                        s.guid_prop = v.try_into()?;
                        Ok(())
                    },
                )
                .scalar(
                    "aguid_prop",
                    DataType::Guid,
                    |s| Value::Guid(s.aguid_prop),
                    |s, v| {
                        s.aguid_prop = v.try_into()?;
                        Ok(())
                    },
                )
            });
            &SCHEMA
        }
    }

    fn sample() -> Sample {
        let guid = Uuid::parse_str(GUID).unwrap();
        Sample {
            byte_prop: 0xab,
            word_prop: 0xabcd,
            dword_prop: 0x12345678,
            bool_prop: true,
            false_prop: false,
            str_prop: "abc".to_string(),
            arr_prop: vec![Sub { val: -1024 }, Sub { val: -8192 }],
            guid_prop: guid,
            aguid_prop: guid,
        }
    }

    fn sample_bytes() -> Vec<u8> {
        let mut expected = vec![
            0xab, // byte
            0xcd, 0xab, // word
            0x78, 0x56, 0x34, 0x12, // dword
            0x01, // true
            0x00, // false
            0x03, 0x00, b'a', b'b', b'c', // string
            0x02, 0x00, 0x00, 0xfc, 0x00, 0xe0, // array of two signed words
        ];
        let guid = Uuid::parse_str(GUID).unwrap();
        expected.extend_from_slice(guid.as_bytes());
        expected.extend_from_slice(guid.as_bytes());
        expected
    }

    #[test]
    fn serialize_matches_reference_bytes() {
        let bytes = sample().to_binary().unwrap();
        assert_eq!(bytes.as_ref(), sample_bytes().as_slice());
    }

    #[test]
    fn deserialize_reference_bytes() {
        let decoded = Sample::from_binary(&sample_bytes()).unwrap();
        assert_eq!(decoded, sample());
        assert_eq!(decoded.arr_prop.len(), 2);
        assert_eq!(decoded.arr_prop[1].val, -8192);
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        let mut wire = sample_bytes();
        wire.extend_from_slice(&[0xde, 0xad]);
        assert_eq!(Sample::from_binary(&wire).unwrap(), sample());
    }

    #[test]
    fn empty_array_roundtrips() {
        let mut value = sample();
        value.arr_prop.clear();
        let wire = value.to_binary().unwrap();
        assert_eq!(&wire[14..16], &[0x00, 0x00]);
        assert_eq!(Sample::from_binary(&wire).unwrap(), value);
    }

    #[test]
    fn truncation_anywhere_is_malformed() {
        let wire = sample_bytes();
        for cut in 0..wire.len() {
            let err = Sample::from_binary(&wire[..cut]).unwrap_err();
            assert!(
                matches!(err, StructError::MalformedPayload { .. }),
                "cut at {cut}: {err}"
            );
        }
    }

    #[test]
    fn array_count_beyond_payload_is_malformed() {
        let mut wire = sample_bytes();
        wire[14] = 0xff;
        wire[15] = 0xff;
        let err = Sample::from_binary(&wire).unwrap_err();
        assert!(matches!(err, StructError::MalformedPayload { .. }));
    }

    #[test]
    fn oversized_array_overflows_prefix() {
        let mut value = sample();
        value.arr_prop = vec![Sub::default(); 65_536];
        let err = value.to_binary().unwrap_err();
        assert!(matches!(
            err,
            StructError::LengthOverflow { ref field, len: 65_536 } if field == "arr_prop"
        ));
    }

    #[test]
    fn schema_reports_fields_in_wire_order() {
        let schema = Sample::schema();
        assert_eq!(schema.name(), "sample");
        assert_eq!(
            schema.field_names(),
            vec![
                "byte_prop",
                "word_prop",
                "dword_prop",
                "bool_prop",
                "false_prop",
                "str_prop",
                "arr_prop",
                "guid_prop",
                "aguid_prop"
            ]
        );
        let kinds: Vec<String> = schema.fields().map(|f| f.kind().to_string()).collect();
        assert_eq!(kinds[6], "array<sub>");
        assert_eq!(kinds[0], "byte");
    }
}
