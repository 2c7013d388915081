use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Frame header: a single big-endian u16 length.
pub const HEADER_SIZE: usize = 2;

/// Largest payload the header can describe.
pub const MAX_PAYLOAD: usize = u16::MAX as usize;

/// One complete, length-delimited message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub payload: Bytes,
}

impl Frame {
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Header plus payload.
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }

    /// Byte-for-byte (and therefore length-for-length) equality with `literal`.
    pub fn is(&self, literal: &[u8]) -> bool {
        self.payload.as_ref() == literal
    }
}

/// Append the wire form of `payload` to `dst`.
///
/// ```text
/// ┌──────────────┬───────────────────┐
/// │ Length (2B)  │ Payload           │
/// │ big-endian   │ (Length bytes)    │
/// └──────────────┴───────────────────┘
/// ```
pub fn encode_frame(payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    let len = u16::try_from(payload.len()).map_err(|_| FrameError::PayloadTooLarge {
        size: payload.len(),
        max: MAX_PAYLOAD,
    })?;
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_u16(len);
    dst.put_slice(payload);
    Ok(())
}

/// Encode `payload` into a freshly allocated buffer.
pub fn encode(payload: &[u8]) -> Result<Bytes> {
    let mut dst = BytesMut::with_capacity(HEADER_SIZE + payload.len());
    encode_frame(payload, &mut dst)?;
    Ok(dst.freeze())
}

/// Configuration shared by the decoder and writer.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Largest payload accepted or sent. Declared lengths above this are
    /// skipped by the decoder. Default: [`MAX_PAYLOAD`].
    pub max_payload_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: MAX_PAYLOAD,
        }
    }
}
