use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{PacketError, Result};

/// Packet header: signature (2) + version (1) + flags (1) + length (2) + intent (2) = 8 bytes.
pub const HEADER_SIZE: usize = 8;

/// Trailing checksum byte.
pub const CHECKSUM_SIZE: usize = 1;

/// Packet signature marker.
pub const SIGNATURE: u16 = 0xC5C3;

/// First signature byte on the wire.
pub const SIGNATURE_HI: u8 = 0xC5;

/// Second signature byte on the wire.
pub const SIGNATURE_LO: u8 = 0xC3;

/// Signature bytes in wire order.
pub const SIGNATURE_BYTES: [u8; 2] = [SIGNATURE_HI, SIGNATURE_LO];

/// Largest payload the 16-bit length field can describe.
pub const MAX_PAYLOAD: usize = u16::MAX as usize;

/// Protocol version stamped on outbound packets by default.
pub const DEFAULT_VERSION: u8 = 1;

/// A framed binary message exchanged with a device.
///
/// The payload length is always derived from `data`, so the header length and
/// the payload can never disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    signature: u16,
    version: u8,
    flags: u8,
    intent: u16,
    data: Bytes,
}

impl Packet {
    /// Create a packet from its header fields and payload.
    ///
    /// `signature` must be [`SIGNATURE`]; other values fail with
    /// [`PacketError::InvalidSignature`].
    pub fn new(
        signature: u16,
        version: u8,
        flags: u8,
        intent: u16,
        data: impl Into<Bytes>,
    ) -> Result<Self> {
        if signature != SIGNATURE {
            return Err(PacketError::InvalidSignature);
        }
        let data = data.into();
        if data.len() > MAX_PAYLOAD {
            return Err(PacketError::PayloadTooLarge {
                size: data.len(),
                max: MAX_PAYLOAD,
            });
        }
        Ok(Self {
            signature,
            version,
            flags,
            intent,
            data,
        })
    }

    /// Create a packet carrying the standard signature.
    pub fn with_default_signature(
        version: u8,
        flags: u8,
        intent: u16,
        data: impl Into<Bytes>,
    ) -> Result<Self> {
        Self::new(SIGNATURE, version, flags, intent, data)
    }

    pub fn signature(&self) -> u16 {
        self.signature
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn flags(&self) -> u8 {
        self.flags
    }

    /// Message type id.
    pub fn intent(&self) -> u16 {
        self.intent
    }

    /// Payload byte count as carried in the header.
    pub fn length(&self) -> u16 {
        self.data.len() as u16
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Consume the packet and return its payload.
    pub fn into_data(self) -> Bytes {
        self.data
    }

    /// The total wire size of this packet (header + payload + checksum).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.data.len() + CHECKSUM_SIZE
    }

    /// Checksum over the encoded header and payload.
    pub fn checksum(&self) -> u8 {
        let mut buf = BytesMut::with_capacity(self.wire_size());
        self.put_header_and_data(&mut buf);
        checksum(&buf)
    }

    /// Encode the packet into the wire format.
    ///
    /// Wire format:
    /// ```text
    /// ┌────────────┬─────────┬───────┬──────────┬──────────┬──────────┬──────────┐
    /// │ Signature  │ Version │ Flags │ Length   │ Intent   │ Data     │ Checksum │
    /// │ 0xC5 0xC3  │ (1B)    │ (1B)  │ (2B LE)  │ (2B LE)  │ (Length) │ (1B)     │
    /// └────────────┴─────────┴───────┴──────────┴──────────┴──────────┴──────────┘
    /// ```
    pub fn encode(&self, dst: &mut BytesMut) {
        dst.reserve(self.wire_size());
        let start = dst.len();
        self.put_header_and_data(dst);
        let sum = checksum(&dst[start..]);
        dst.put_u8(sum);
    }

    /// Encode the packet into a fresh buffer.
    pub fn to_binary(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.wire_size());
        self.encode(&mut buf);
        buf.freeze()
    }

    /// Parse a packet from the front of `src`.
    ///
    /// Bytes following the framed region are ignored; the caller removes
    /// [`Packet::wire_size`] bytes from its stream after a successful parse.
    pub fn from_binary(src: &[u8]) -> Result<Self> {
        if src.len() < HEADER_SIZE {
            return Err(PacketError::IncompletePacket {
                available: src.len(),
                needed: HEADER_SIZE,
            });
        }

        if src[0..2] != SIGNATURE_BYTES {
            return Err(PacketError::InvalidSignature);
        }

        let mut header = &src[2..HEADER_SIZE];
        let version = header.get_u8();
        let flags = header.get_u8();
        let length = header.get_u16_le() as usize;
        let intent = header.get_u16_le();

        let end = HEADER_SIZE + length;
        if src.len() < end + CHECKSUM_SIZE {
            return Err(PacketError::InvalidPacketLength {
                declared: length,
                available: src.len(),
            });
        }

        let expected = checksum(&src[..end]);
        let actual = src[end];
        if expected != actual {
            return Err(PacketError::InvalidCrc { expected, actual });
        }

        Ok(Self {
            signature: SIGNATURE,
            version,
            flags,
            intent,
            data: Bytes::copy_from_slice(&src[HEADER_SIZE..end]),
        })
    }

    fn put_header_and_data(&self, dst: &mut BytesMut) {
        dst.put_u16(self.signature);
        dst.put_u8(self.version);
        dst.put_u8(self.flags);
        dst.put_u16_le(self.length());
        dst.put_u16_le(self.intent);
        dst.put_slice(&self.data);
    }
}

/// One's-complement of the 8-bit running sum of `bytes`.
///
/// A valid frame therefore sums to `0xFF` (mod 256) including its checksum byte.
pub fn checksum(bytes: &[u8]) -> u8 {
    let sum = bytes.iter().fold(0u8, |acc, byte| acc.wrapping_add(*byte));
    0xFF - sum
}

/// Configuration for packet readers, writers and codecs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameConfig {
    /// Largest payload accepted from the stream. Default: 65535.
    pub max_payload_size: usize,
    /// Version stamped on packets sent through `send`. Default: 1.
    pub version: u8,
    /// Flags stamped on packets sent through `send`. Default: 0.
    pub flags: u8,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: MAX_PAYLOAD,
            version: DEFAULT_VERSION,
            flags: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REFERENCE: [u8; 12] = [
        SIGNATURE_HI,
        SIGNATURE_LO,
        0x02,
        0x03,
        0x03,
        0x00,
        0x04,
        0x00,
        0x31,
        0x32,
        0x33,
        0xd5,
    ];

    fn reference_packet() -> Packet {
        Packet::new(SIGNATURE, 2, 3, 4, &b"123"[..]).unwrap()
    }

    #[test]
    fn header_properties() {
        let pkt = reference_packet();
        assert_eq!(pkt.signature(), SIGNATURE);
        assert_eq!(pkt.version(), 2);
        assert_eq!(pkt.flags(), 3);
        assert_eq!(pkt.intent(), 4);
        assert_eq!(pkt.length(), 3);
    }

    #[test]
    fn checksum_matches_reference_vector() {
        assert_eq!(reference_packet().checksum(), 0xd5);
        assert_eq!(checksum(&REFERENCE[..11]), 0xd5);
    }

    #[test]
    fn to_binary_matches_reference_vector() {
        assert_eq!(reference_packet().to_binary().as_ref(), &REFERENCE[..]);
    }

    #[test]
    fn from_binary_roundtrip() {
        let pkt = reference_packet();
        let copy = Packet::from_binary(&pkt.to_binary()).unwrap();

        assert_eq!(copy.signature(), pkt.signature());
        assert_eq!(copy.version(), pkt.version());
        assert_eq!(copy.flags(), pkt.flags());
        assert_eq!(copy.intent(), pkt.intent());
        assert_eq!(copy.length(), pkt.length());
        assert_eq!(copy.data(), pkt.data());
    }

    #[test]
    fn foreign_signature_is_rejected() {
        assert!(matches!(
            Packet::new(0xABCD, 1, 0, 300, &b"x"[..]),
            Err(PacketError::InvalidSignature)
        ));
        assert!(matches!(
            Packet::new(0xC3C5, 1, 0, 300, &b"x"[..]),
            Err(PacketError::InvalidSignature)
        ));
    }

    #[test]
    fn crc_error() {
        let mut bytes = REFERENCE;
        bytes[11] = 0xba;
        let result = Packet::from_binary(&bytes);
        assert!(matches!(
            result,
            Err(PacketError::InvalidCrc {
                expected: 0xd5,
                actual: 0xba
            })
        ));
    }

    #[test]
    fn incomplete_packet() {
        let result = Packet::from_binary(&[0, 1, 2, 3]);
        assert!(matches!(
            result,
            Err(PacketError::IncompletePacket {
                available: 4,
                needed: HEADER_SIZE
            })
        ));
    }

    #[test]
    fn invalid_packet_length() {
        let bytes = [
            SIGNATURE_HI,
            SIGNATURE_LO,
            0x02,
            0x03,
            0x00,
            0x03,
            0x04,
            0x00,
            0x31,
            0x32,
            0x33,
            0xd5,
        ];
        let result = Packet::from_binary(&bytes);
        assert!(matches!(
            result,
            Err(PacketError::InvalidPacketLength {
                declared: 0x0300,
                available: 12
            })
        ));
    }

    #[test]
    fn invalid_signature() {
        let bytes = [
            0xBA, 0xD1, 0x02, 0x03, 0x03, 0x00, 0x04, 0x00, 0x31, 0x32, 0x33, 0xd5,
        ];
        let result = Packet::from_binary(&bytes);
        assert!(matches!(result, Err(PacketError::InvalidSignature)));
    }

    #[test]
    fn trailing_bytes_are_not_part_of_the_frame() {
        let mut wire = BytesMut::new();
        reference_packet().encode(&mut wire);
        wire.put_slice(&[SIGNATURE_HI, SIGNATURE_LO, 0x01]);

        let pkt = Packet::from_binary(&wire).unwrap();
        assert_eq!(pkt.data().as_ref(), b"123");
        assert_eq!(pkt.wire_size(), REFERENCE.len());
    }

    #[test]
    fn empty_payload() {
        let pkt = Packet::with_default_signature(DEFAULT_VERSION, 0, 0, Bytes::new()).unwrap();
        let wire = pkt.to_binary();
        assert_eq!(wire.len(), HEADER_SIZE + CHECKSUM_SIZE);

        let copy = Packet::from_binary(&wire).unwrap();
        assert_eq!(copy.length(), 0);
        assert!(copy.data().is_empty());
    }

    #[test]
    fn payload_too_large_rejected() {
        let result = Packet::with_default_signature(1, 0, 1, vec![0u8; MAX_PAYLOAD + 1]);
        assert!(matches!(
            result,
            Err(PacketError::PayloadTooLarge { size, max: MAX_PAYLOAD }) if size == MAX_PAYLOAD + 1
        ));
    }

    #[test]
    fn every_single_byte_corruption_is_detected() {
        let wire = reference_packet().to_binary();
        for index in 2..wire.len() {
            let mut corrupted = wire.to_vec();
            corrupted[index] ^= 0x10;
            let result = Packet::from_binary(&corrupted);
            assert!(result.is_err(), "corruption at byte {index} went unnoticed");
        }
    }

    #[test]
    fn encode_appends_to_existing_buffer() {
        let mut wire = BytesMut::from(&[0xAA][..]);
        reference_packet().encode(&mut wire);
        assert_eq!(&wire[1..], &REFERENCE[..]);
    }

    #[test]
    fn default_config() {
        let cfg = FrameConfig::default();
        assert_eq!(cfg.max_payload_size, MAX_PAYLOAD);
        assert_eq!(cfg.version, DEFAULT_VERSION);
        assert_eq!(cfg.flags, 0);
    }
}
