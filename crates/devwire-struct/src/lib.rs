//! Schema-driven binary serialization for device gateway payloads.
//!
//! A [`Schema`] is an ordered list of field descriptors: fixed-width scalars,
//! length-prefixed strings and blobs, and count-prefixed arrays of nested
//! structs. [`StructCodec`] walks a schema to turn values into payload bytes
//! and back, with no padding between fields.
//!
//! Statically known payloads implement [`BinaryStruct`]. Device-defined
//! commands are described at runtime by [`CommandMetadata`]; the
//! [`SchemaFactory`] turns that metadata into a [`MessageType`] whose
//! instances are [`DynamicMessage`] attribute bags, and a [`CommandRegistry`]
//! keeps them keyed by intent.

pub mod codec;
pub mod config;
pub mod data_type;
pub mod error;
pub mod factory;
pub mod field;
pub mod registration;
pub mod registry;
pub mod schema;
pub mod value;

pub use codec::{BinaryStruct, StructCodec};
pub use config::RegistryConfig;
pub use data_type::DataType;
pub use error::{Result, StructError};
pub use factory::{
    apply_values, CommandMetadata, DynamicMessage, MessageType, ParameterMetadata, SchemaFactory,
    SlotAccessor,
};
pub use field::{ArrayField, FieldAccessor, FieldBinding, FieldDescriptor, FieldKind, ScalarField};
pub use registration::{DeviceRegistration, EquipmentInfo, RegisteredCommand, RegisteredParameter};
pub use registry::CommandRegistry;
pub use schema::Schema;
pub use value::{Value, ValueTypeError};
