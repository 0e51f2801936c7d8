/// Errors that can occur during packet encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum PacketError {
    /// Fewer bytes than the fixed header are available.
    #[error("incomplete packet ({available} bytes, header needs {needed})")]
    IncompletePacket { available: usize, needed: usize },

    /// The leading bytes are not the packet signature.
    #[error("invalid packet signature (expected 0xC5C3)")]
    InvalidSignature,

    /// The header is readable but its declared length is not covered by the data at hand.
    #[error("invalid packet length (declared {declared} payload bytes, {available} bytes available)")]
    InvalidPacketLength { declared: usize, available: usize },

    /// A complete frame is present but its checksum does not match.
    #[error("invalid packet checksum (expected {expected:#04x}, found {actual:#04x})")]
    InvalidCrc { expected: u8, actual: u8 },

    /// The payload cannot be carried by the 16-bit length field or exceeds the configured maximum.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing packets.
    #[error("packet I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream was closed before a complete packet was received.
    #[error("connection closed (incomplete packet)")]
    ConnectionClosed,
}

impl PacketError {
    /// True when the caller should wait for more input rather than drop bytes.
    pub fn needs_more_data(&self) -> bool {
        matches!(
            self,
            PacketError::IncompletePacket { .. } | PacketError::InvalidPacketLength { .. }
        )
    }

    /// True when the framing loop can drop the leading bytes and resynchronize.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PacketError::InvalidSignature
                | PacketError::InvalidCrc { .. }
                | PacketError::PayloadTooLarge { .. }
        ) || self.needs_more_data()
    }
}

pub type Result<T> = std::result::Result<T, PacketError>;
