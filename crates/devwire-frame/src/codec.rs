//! `tokio_util` codec over the same resynchronizing rules as [`PacketReader`].
//!
//! [`PacketReader`]: crate::reader::PacketReader

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};
use tracing::warn;

use crate::buffer::FrameBuffer;
use crate::error::{PacketError, Result};
use crate::packet::{FrameConfig, Packet, SIGNATURE_BYTES};

/// Packet codec for `FramedRead` / `FramedWrite`.
#[derive(Debug, Default)]
pub struct PacketCodec {
    buffer: FrameBuffer,
    config: FrameConfig,
}

impl PacketCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: FrameConfig) -> Self {
        Self {
            buffer: FrameBuffer::new(),
            config,
        }
    }

    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl Decoder for PacketCodec {
    type Item = Packet;
    type Error = PacketError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Packet>> {
        if !src.is_empty() {
            self.buffer.append(src);
            src.clear();
        }

        loop {
            if let Some(length) = self.buffer.declared_length() {
                if length > self.config.max_payload_size {
                    warn!(
                        declared = length,
                        max = self.config.max_payload_size,
                        "skipping frame with oversized payload"
                    );
                    self.buffer.skip_frame_start();
                    continue;
                }
            }

            if !self.buffer.has_packet() {
                return Ok(None);
            }

            match Packet::from_binary(self.buffer.data()) {
                Ok(packet) => {
                    self.buffer.consume(packet.wire_size());
                    return Ok(Some(packet));
                }
                Err(PacketError::InvalidCrc { expected, actual }) => {
                    warn!(expected, actual, "skipping frame with invalid checksum");
                    self.buffer.skip_frame_start();
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Packet>> {
        if let Some(packet) = self.decode(src)? {
            return Ok(Some(packet));
        }

        while !self.buffer.is_empty() {
            if self.buffer.len() >= SIGNATURE_BYTES.len() {
                warn!(
                    declared = self.buffer.declared_length(),
                    buffered = self.buffer.len(),
                    "skipping frame truncated by end of stream"
                );
            }
            self.buffer.skip_frame_start();
            if let Some(packet) = self.decode(src)? {
                return Ok(Some(packet));
            }
        }
        Ok(None)
    }
}

impl Encoder<&Packet> for PacketCodec {
    type Error = PacketError;

    fn encode(&mut self, item: &Packet, dst: &mut BytesMut) -> Result<()> {
        if item.data().len() > self.config.max_payload_size {
            return Err(PacketError::PayloadTooLarge {
                size: item.data().len(),
                max: self.config.max_payload_size,
            });
        }
        item.encode(dst);
        Ok(())
    }
}
