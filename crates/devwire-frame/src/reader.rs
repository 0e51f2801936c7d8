use std::io::{ErrorKind, Read};

use tracing::{debug, warn};

use crate::buffer::FrameBuffer;
use crate::error::{PacketError, Result};
use crate::packet::{FrameConfig, Packet, SIGNATURE_BYTES};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 4 * 1024;

/// Counters describing what the reader had to skip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReaderStats {
    /// Packets returned to the caller.
    pub packets: u64,
    /// Frames dropped because their checksum did not match.
    pub checksum_failures: u64,
    /// Frames dropped because they declared a payload above the configured maximum.
    pub oversized_frames: u64,
    /// Frame starts abandoned at end of stream because their declared length was never reached.
    pub truncated_frames: u64,
}

/// Reads complete packets from any `Read` stream.
///
/// Junk between frames and frames with a bad checksum are skipped; callers
/// only ever see valid packets.
pub struct PacketReader<T> {
    inner: T,
    buffer: FrameBuffer,
    config: FrameConfig,
    stats: ReaderStats,
}

impl<T: Read> PacketReader<T> {
    /// Create a new packet reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new packet reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buffer: FrameBuffer::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
            stats: ReaderStats::default(),
        }
    }

    /// Read the next valid packet (blocking).
    ///
    /// Returns `Err(PacketError::ConnectionClosed)` when EOF is reached and no
    /// packet remains behind an unsatisfiable frame start.
    pub fn read_packet(&mut self) -> Result<Packet> {
        loop {
            if let Some(packet) = self.next_buffered()? {
                return Ok(packet);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(PacketError::Io(err)),
            };

            if read == 0 {
                return self.drain_at_eof();
            }

            self.buffer.append(&chunk[..read]);
        }
    }

    /// Extract a packet already present in the buffer, skipping corrupt frames.
    fn next_buffered(&mut self) -> Result<Option<Packet>> {
        loop {
            if let Some(length) = self.buffer.declared_length() {
                if length > self.config.max_payload_size {
                    warn!(
                        declared = length,
                        max = self.config.max_payload_size,
                        "skipping frame with oversized payload"
                    );
                    self.stats.oversized_frames += 1;
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
                    self.stats.packets += 1;
                    debug!(
                        intent = packet.intent(),
                        length = packet.length(),
                        "packet extracted"
                    );
                    return Ok(Some(packet));
                }
                Err(PacketError::InvalidCrc { expected, actual }) => {
                    warn!(expected, actual, "skipping frame with invalid checksum");
                    self.stats.checksum_failures += 1;
                    self.buffer.skip_frame_start();
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// At EOF the frame at the front can no longer complete; skip past it and
    /// look for packets buffered behind it.
    fn drain_at_eof(&mut self) -> Result<Packet> {
        while !self.buffer.is_empty() {
            if self.buffer.len() >= SIGNATURE_BYTES.len() {
                warn!(
                    declared = self.buffer.declared_length(),
                    buffered = self.buffer.len(),
                    "skipping frame truncated by end of stream"
                );
                self.stats.truncated_frames += 1;
            }
            self.buffer.skip_frame_start();
            if let Some(packet) = self.next_buffered()? {
                return Ok(packet);
            }
        }
        Err(PacketError::ConnectionClosed)
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Bytes received but not yet returned as a packet.
    pub fn buffered(&self) -> &[u8] {
        self.buffer.data()
    }

    /// Skip counters accumulated so far.
    pub fn stats(&self) -> ReaderStats {
        self.stats
    }

    /// Update maximum payload size for subsequent packet decoding.
    pub fn set_max_payload_size(&mut self, max_payload_size: usize) {
        self.config.max_payload_size = max_payload_size;
    }

    /// Current packet reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl<T: Read> Iterator for PacketReader<T> {
    type Item = Result<Packet>;

    /// Yields packets until the stream ends; EOF terminates the iterator.
    fn next(&mut self) -> Option<Self::Item> {
        match self.read_packet() {
            Ok(packet) => Some(Ok(packet)),
            Err(PacketError::ConnectionClosed) => None,
            Err(err) => Some(Err(err)),
        }
    }
}
