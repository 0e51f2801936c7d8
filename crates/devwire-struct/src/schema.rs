use std::fmt;

use bytes::BytesMut;

use crate::codec::BinaryStruct;
use crate::data_type::DataType;
use crate::error::Result;
use crate::field::{ArrayField, FieldBinding, FieldDescriptor, FieldKind, ScalarField};
use crate::value::Value;

type Init<T> = Box<dyn Fn() -> T + Send + Sync>;

/// Ordered field descriptors plus a constructor for fresh instances.
///
/// Field order is wire order. Schemas are built once and passed explicitly to
/// [`StructCodec`](crate::StructCodec).
pub struct Schema<T> {
    name: String,
    fields: Vec<Box<dyn FieldDescriptor<T>>>,
    init: Init<T>,
}

impl<T: Default + 'static> Schema<T> {
    /// Empty schema whose instances start from `T::default()`.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_init(name, T::default)
    }
}

impl<T: 'static> Schema<T> {
    pub fn with_init(name: impl Into<String>, init: impl Fn() -> T + Send + Sync + 'static) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            init: Box::new(init),
        }
    }

    /// Append an arbitrary descriptor.
    pub fn field(mut self, descriptor: impl FieldDescriptor<T> + 'static) -> Self {
        self.fields.push(Box::new(descriptor));
        self
    }

    /// Append a scalar field bound to plain getter/setter functions.
    pub fn scalar(
        self,
        name: &str,
        data_type: DataType,
        get: fn(&T) -> Value,
        set: fn(&mut T, Value) -> Result<()>,
    ) -> Self {
        self.field(ScalarField::new(name, data_type, FieldBinding::new(get, set)))
    }

    /// Append a count-prefixed array of nested structs.
    pub fn array<U: BinaryStruct>(
        self,
        name: &str,
        get: fn(&T) -> &[U],
        set: fn(&mut T, Vec<U>),
    ) -> Self {
        self.field(ArrayField::new(name, get, set))
    }
}

impl<T> Schema<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> impl Iterator<Item = &dyn FieldDescriptor<T>> + '_ {
        self.fields.iter().map(|field| field.as_ref())
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|field| field.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn instantiate(&self) -> T {
        (self.init)()
    }

    pub(crate) fn encode_into(&self, value: &T, dst: &mut BytesMut) -> Result<()> {
        for field in &self.fields {
            field.encode(value, dst)?;
        }
        Ok(())
    }

    pub(crate) fn decode_from(&self, src: &mut &[u8]) -> Result<T> {
        let mut value = self.instantiate();
        for field in &self.fields {
            field.decode(&mut value, src)?;
        }
        Ok(value)
    }
}

impl<T> fmt::Debug for Schema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<(&str, FieldKind)> = self
            .fields
            .iter()
            .map(|field| (field.name(), field.kind()))
            .collect();
        f.debug_struct("Schema")
            .field("name", &self.name)
            .field("fields", &fields)
            .finish()
    }
}
