//! Resynchronizing accumulator for arbitrarily chunked packet streams.
//!
//! The buffer only ever holds one of:
//! - nothing,
//! - a single byte equal to [`SIGNATURE_HI`] (a signature split across reads),
//! - bytes starting with the complete [`SIGNATURE_BYTES`].
//!
//! It performs no checksum validation; that happens in [`Packet::from_binary`]
//! once [`FrameBuffer::has_packet`] reports a full candidate frame.
//!
//! [`Packet::from_binary`]: crate::packet::Packet::from_binary

use bytes::{Buf, BytesMut};
use tracing::trace;

use crate::packet::{CHECKSUM_SIZE, HEADER_SIZE, SIGNATURE_BYTES, SIGNATURE_HI};

const INITIAL_BUFFER_CAPACITY: usize = 1024;

/// Pending stream bytes that have not been extracted as packets yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameBuffer {
    buf: BytesMut,
}

impl FrameBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::with_capacity(INITIAL_BUFFER_CAPACITY)
    }

    /// Create an empty buffer with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    /// Append stream bytes and drop everything before the earliest signature.
    pub fn append(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
        self.resync();
    }

    /// True when the buffer starts with a signature and holds the whole declared frame.
    pub fn has_packet(&self) -> bool {
        match self.frame_size() {
            Some(size) => self.buf.len() >= size,
            None => false,
        }
    }

    /// Payload length declared by the buffered header, once it is readable.
    pub fn declared_length(&self) -> Option<usize> {
        if self.buf.len() < HEADER_SIZE || !self.buf.starts_with(&SIGNATURE_BYTES) {
            return None;
        }
        Some(u16::from_le_bytes([self.buf[4], self.buf[5]]) as usize)
    }

    /// Wire size of the frame at the front of the buffer, once its header is readable.
    pub fn frame_size(&self) -> Option<usize> {
        self.declared_length()
            .map(|length| HEADER_SIZE + length + CHECKSUM_SIZE)
    }

    /// Remove `count` bytes from the front, then resynchronize the remainder.
    ///
    /// Callers consume a packet's wire size after extracting it.
    pub fn consume(&mut self, count: usize) {
        let count = count.min(self.buf.len());
        self.buf.advance(count);
        self.resync();
    }

    /// Drop the leading signature byte so the next candidate frame can be found.
    ///
    /// Used after a corrupt or unsatisfiable frame.
    pub fn skip_frame_start(&mut self) {
        self.consume(1);
    }

    /// The buffered bytes.
    pub fn data(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Discard all buffered bytes.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    fn resync(&mut self) {
        if self.buf.starts_with(&SIGNATURE_BYTES) {
            return;
        }

        let before = self.buf.len();
        match self
            .buf
            .windows(SIGNATURE_BYTES.len())
            .position(|window| window == SIGNATURE_BYTES)
        {
            Some(start) => self.buf.advance(start),
            None if self.buf.last() == Some(&SIGNATURE_HI) => self.buf.advance(before - 1),
            None => self.buf.clear(),
        }

        let dropped = before - self.buf.len();
        if dropped > 0 {
            trace!(dropped, retained = self.buf.len(), "discarded bytes before signature");
        }
    }
}
