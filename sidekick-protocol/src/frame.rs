//! Binary frame format.
//!
//! Every message in either direction is an 8-byte header followed by a JSON
//! payload:
//!
//! ```text
//! +---------+-------------+
//! |  magic  | payload_len |
//! | 4 bytes |   4 bytes   |
//! +---------+-------------+
//! | payload               |
//! | payload_len bytes     |
//! +-----------------------+
//! ```
//!
//! Both header fields are unsigned big-endian integers.

use crate::error::ProtocolError;
use bytes::{BufMut, BytesMut};

/// Magic value identifying a sidekick frame ("sidekick" in hexspeak).
pub const MAGIC: u32 = 0x51DE_C1CC;

/// Size of the fixed frame header in bytes (4 + 4).
pub const FRAME_HEADER_SIZE: usize = 8;

/// A decoded frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub magic: u32,
    pub payload_len: u32,
}

impl FrameHeader {
    /// Creates a header announcing `payload_len` bytes.
    pub fn new(payload_len: u32) -> Self {
        Self {
            magic: MAGIC,
            payload_len,
        }
    }

    /// Encodes the header into its wire representation.
    pub fn encode(&self) -> [u8; FRAME_HEADER_SIZE] {
        let mut out = [0u8; FRAME_HEADER_SIZE];
        out[0..4].copy_from_slice(&self.magic.to_be_bytes());
        out[4..8].copy_from_slice(&self.payload_len.to_be_bytes());
        out
    }

    /// Decodes a header from its wire representation. No validation is done.
    pub fn decode(buf: &[u8; FRAME_HEADER_SIZE]) -> Self {
        Self {
            magic: u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]),
            payload_len: u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]),
        }
    }

    /// Validates an incoming header and returns the payload length to read.
    ///
    /// The magic is checked before the length, so a mismatched frame is
    /// rejected without regard to what it claims to carry.
    pub fn validate(&self, max_payload: u32) -> Result<usize, ProtocolError> {
        if self.magic != MAGIC {
            return Err(ProtocolError::BadMagic(self.magic));
        }
        if self.payload_len > max_payload {
            return Err(ProtocolError::ResponseTooLarge {
                size: self.payload_len,
                max: max_payload,
            });
        }
        Ok(self.payload_len as usize)
    }
}

/// Frames `payload` into a single contiguous buffer (header + payload).
///
/// The buffer is sized from the payload itself; the only limit is that the
/// length must fit the 32-bit header field.
pub fn encode_frame(payload: &[u8]) -> Result<BytesMut, ProtocolError> {
    let payload_len = u32::try_from(payload.len()).map_err(|_| ProtocolError::RequestTooLarge {
        size: payload.len(),
    })?;

    let mut buf = BytesMut::with_capacity(FRAME_HEADER_SIZE + payload.len());
    buf.put_u32(MAGIC);
    buf.put_u32(payload_len);
    buf.put_slice(payload);

    debug_assert_eq!(buf.len(), FRAME_HEADER_SIZE + payload.len());
    Ok(buf)
}
