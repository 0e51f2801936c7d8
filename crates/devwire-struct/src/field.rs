//! Field descriptors: how one named field is read from an instance, encoded,
//! decoded and written back.

use std::fmt;

use bytes::BytesMut;

use crate::codec::BinaryStruct;
use crate::data_type::{get_length, put_length, DataType};
use crate::error::Result;
use crate::value::Value;

/// Explicit get/set binding between a field and its storage in `T`.
pub trait FieldAccessor<T>: Send + Sync {
    fn get(&self, target: &T) -> Result<Value>;
    fn set(&self, target: &mut T, value: Value) -> Result<()>;
}

/// Direct field access for statically defined types.
pub struct FieldBinding<T> {
    get: fn(&T) -> Value,
    set: fn(&mut T, Value) -> Result<()>,
}

impl<T> FieldBinding<T> {
    pub fn new(get: fn(&T) -> Value, set: fn(&mut T, Value) -> Result<()>) -> Self {
        Self { get, set }
    }
}

impl<T> FieldAccessor<T> for FieldBinding<T> {
    fn get(&self, target: &T) -> Result<Value> {
        Ok((self.get)(target))
    }

    fn set(&self, target: &mut T, value: Value) -> Result<()> {
        (self.set)(target, value)
    }
}

/// What a field carries on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Scalar(DataType),
    /// Count-prefixed sequence of nested structs with the named schema.
    Array { element: &'static str },
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Scalar(data_type) => write!(f, "{data_type}"),
            FieldKind::Array { element } => write!(f, "array<{element}>"),
        }
    }
}

/// One entry of a [`Schema`](crate::Schema). Fields are encoded in schema
/// order with no padding.
pub trait FieldDescriptor<T>: Send + Sync {
    fn name(&self) -> &str;
    fn kind(&self) -> FieldKind;
    fn encode(&self, source: &T, dst: &mut BytesMut) -> Result<()>;
    fn decode(&self, target: &mut T, src: &mut &[u8]) -> Result<()>;
}

/// A single scalar value moved through a [`FieldAccessor`].
pub struct ScalarField<T> {
    name: String,
    data_type: DataType,
    accessor: Box<dyn FieldAccessor<T>>,
}

impl<T> ScalarField<T> {
    pub fn new(
        name: impl Into<String>,
        data_type: DataType,
        accessor: impl FieldAccessor<T> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            data_type,
            accessor: Box::new(accessor),
        }
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }
}

impl<T> FieldDescriptor<T> for ScalarField<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> FieldKind {
        FieldKind::Scalar(self.data_type)
    }

    fn encode(&self, source: &T, dst: &mut BytesMut) -> Result<()> {
        let value = self.accessor.get(source)?;
        self.data_type.encode(&self.name, &value, dst)
    }

    fn decode(&self, target: &mut T, src: &mut &[u8]) -> Result<()> {
        let value = self.data_type.decode(&self.name, src)?;
        self.accessor.set(target, value)
    }
}

/// A 2-byte little-endian element count followed by each element encoded
/// with its own schema.
pub struct ArrayField<T, U> {
    name: String,
    get: fn(&T) -> &[U],
    set: fn(&mut T, Vec<U>),
}

impl<T, U: BinaryStruct> ArrayField<T, U> {
    pub fn new(name: impl Into<String>, get: fn(&T) -> &[U], set: fn(&mut T, Vec<U>)) -> Self {
        Self {
            name: name.into(),
            get,
            set,
        }
    }
}

impl<T, U: BinaryStruct> FieldDescriptor<T> for ArrayField<T, U> {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> FieldKind {
        FieldKind::Array {
            element: U::schema().name(),
        }
    }

    fn encode(&self, source: &T, dst: &mut BytesMut) -> Result<()> {
        let items = (self.get)(source);
        put_length(&self.name, items.len(), dst)?;
        let schema = U::schema();
        for item in items {
            schema.encode_into(item, dst)?;
        }
        Ok(())
    }

    fn decode(&self, target: &mut T, src: &mut &[u8]) -> Result<()> {
        let count = get_length(&self.name, src)?;
        let schema = U::schema();
        let mut items = Vec::with_capacity(count.min(src.len()));
        for _ in 0..count {
            items.push(schema.decode_from(src)?);
        }
        (self.set)(target, items);
        Ok(())
    }
}
