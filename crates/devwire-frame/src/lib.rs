//! Checksummed packet framing with stream resynchronization for device gateways.
//!
//! Every packet is framed with:
//! - A 2-byte signature (`0xC5 0xC3`) for stream synchronization
//! - 1-byte version and 1-byte flags
//! - A 2-byte little-endian payload length
//! - A 2-byte little-endian intent (message type id)
//! - The payload, followed by a 1-byte checksum over everything before it
//!
//! [`FrameBuffer`] recovers framing from noisy, arbitrarily chunked input;
//! [`PacketReader`] and [`PacketWriter`] drive it over blocking streams.

pub mod buffer;
#[cfg(feature = "async")]
pub mod codec;
pub mod error;
pub mod intent;
pub mod packet;
pub mod reader;
pub mod writer;

pub use buffer::FrameBuffer;
#[cfg(feature = "async")]
pub use codec::PacketCodec;
pub use error::{PacketError, Result};
pub use intent::{
    intent_name, COMMAND_RESULT, REGISTER, REGISTER_JSON, REQUEST_REGISTRATION, USER_INTENT_START,
};
pub use packet::{
    checksum, FrameConfig, Packet, CHECKSUM_SIZE, DEFAULT_VERSION, HEADER_SIZE, MAX_PAYLOAD,
    SIGNATURE, SIGNATURE_BYTES, SIGNATURE_HI, SIGNATURE_LO,
};
pub use reader::{PacketReader, ReaderStats};
pub use writer::PacketWriter;
