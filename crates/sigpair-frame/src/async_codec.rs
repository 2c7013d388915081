//! `tokio-util` codec for the same wire format, for async stream transports.

use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::warn;

use crate::codec::{encode_frame, Frame, FrameConfig, HEADER_SIZE};
use crate::error::{FrameError, Result};

/// Length-prefixed codec for `FramedRead`/`FramedWrite`.
///
/// Oversized frames are skipped the same way [`crate::FrameDecoder`] skips
/// them, so the stream stays aligned.
#[derive(Debug, Default)]
pub struct FrameCodec {
    config: FrameConfig,
    skip: usize,
}

impl FrameCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: FrameConfig) -> Self {
        Self { config, skip: 0 }
    }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>> {
        loop {
            if self.skip > 0 {
                let n = self.skip.min(src.len());
                src.advance(n);
                self.skip -= n;
                if self.skip > 0 {
                    return Ok(None);
                }
            }

            if src.len() < HEADER_SIZE {
                return Ok(None);
            }
            let declared = u16::from_be_bytes([src[0], src[1]]) as usize;

            if declared > self.config.max_payload_size {
                warn!(
                    declared,
                    max = self.config.max_payload_size,
                    "dropping oversized frame"
                );
                src.advance(HEADER_SIZE);
                self.skip = declared;
                continue;
            }

            if src.len() < HEADER_SIZE + declared {
                src.reserve(HEADER_SIZE + declared - src.len());
                return Ok(None);
            }

            src.advance(HEADER_SIZE);
            let payload = src.split_to(declared).freeze();
            return Ok(Some(Frame::new(payload)));
        }
    }
}

impl Encoder<Bytes> for FrameCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<()> {
        if item.len() > self.config.max_payload_size {
            return Err(FrameError::PayloadTooLarge {
                size: item.len(),
                max: self.config.max_payload_size,
            });
        }
        encode_frame(&item, dst)
    }
}

impl Encoder<Frame> for FrameCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<()> {
        Encoder::<Bytes>::encode(self, item.payload, dst)
    }
}
