//! Framed binary transport for device gateways.
//!
//! devwire turns a noisy byte stream from a device link into validated,
//! typed messages, and typed messages back into exact wire bytes.
//!
//! # Crate Structure
//!
//! - [`frame`]: checksummed packets, stream resynchronization and blocking
//!   reader/writer adapters (plus a tokio codec behind the `async` feature)
//! - [`payload`]: schema-driven struct serialization, runtime message types
//!   generated from device metadata, and an intent-keyed command registry
//!
//! ```
//! use devwire::frame::{FrameBuffer, Packet};
//! use devwire::payload::{apply_values, CommandMetadata, DataType, ParameterMetadata, SchemaFactory, Value};
//!
//! let metadata = CommandMetadata::new(
//!     300,
//!     "SetLevel",
//!     vec![ParameterMetadata::new(DataType::Word, "level")],
//! );
//! let message_type = SchemaFactory::new().generate(&metadata)?;
//! let mut message = message_type.instantiate();
//! apply_values(&mut message, [("level", Value::Word(512))])?;
//!
//! let payload = message_type.serialize(&message)?;
//! let wire = Packet::with_default_signature(1, 0, 300, payload)?.to_binary();
//!
//! let mut buffer = FrameBuffer::new();
//! buffer.append(&[0x00, 0x17]);
//! buffer.append(&wire);
//! assert!(buffer.has_packet());
//!
//! let packet = Packet::from_binary(buffer.data())?;
//! buffer.consume(packet.wire_size());
//! let decoded = message_type.deserialize(packet.data())?;
//! assert_eq!(decoded.get("level"), Some(&Value::Word(512)));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Re-export frame types.
pub mod frame {
    pub use devwire_frame::*;
}

/// Re-export payload serialization types.
pub mod payload {
    pub use devwire_struct::*;
}
