//! Signed envelope wire form.
//!
//! ```text
//! ┌────────────────────┬───────────────┬──────────────────────────┐
//! │ message_length (2B)│ message       │ signature                │
//! │ big-endian         │ (message_len) │ (everything that is left)│
//! └────────────────────┴───────────────┴──────────────────────────┘
//! ```
//!
//! The signature length is never transmitted; it is whatever remains after
//! the message.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{AlgorithmError, Result};

/// Size of the message length prefix.
pub const LENGTH_PREFIX: usize = 2;

/// A message plus its detached signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedEnvelope {
    pub message: Bytes,
    pub signature: Bytes,
}

impl SignedEnvelope {
    pub fn new(message: impl Into<Bytes>, signature: impl Into<Bytes>) -> Self {
        Self {
            message: message.into(),
            signature: signature.into(),
        }
    }

    pub fn encoded_len(&self) -> usize {
        LENGTH_PREFIX + self.message.len() + self.signature.len()
    }

    pub fn encode(&self) -> Result<Bytes> {
        let len = u16::try_from(self.message.len()).map_err(|_| AlgorithmError::MessageTooLong {
            len: self.message.len(),
            max: u16::MAX as usize,
        })?;
        let mut out = BytesMut::with_capacity(self.encoded_len());
        out.put_u16(len);
        out.put_slice(&self.message);
        out.put_slice(&self.signature);
        Ok(out.freeze())
    }

    /// Split a received payload into message and signature.
    ///
    /// `message_length` comes straight off the wire, so it is checked against
    /// the payload before anything is sliced.
    pub fn decode(payload: &Bytes) -> Result<Self> {
        if payload.len() < LENGTH_PREFIX {
            return Err(AlgorithmError::MalformedEnvelope(format!(
                "{} bytes is shorter than the length prefix",
                payload.len()
            )));
        }
        let message_len = u16::from_be_bytes([payload[0], payload[1]]) as usize;
        let available = payload.len() - LENGTH_PREFIX;
        if message_len > available {
            return Err(AlgorithmError::MalformedEnvelope(format!(
                "message length {message_len} exceeds the {available} bytes that follow"
            )));
        }

        let split = LENGTH_PREFIX + message_len;
        Ok(Self {
            message: payload.slice(LENGTH_PREFIX..split),
            signature: payload.slice(split..),
        })
    }
}
