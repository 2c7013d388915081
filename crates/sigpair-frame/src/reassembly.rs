//! Incremental frame reassembly.
//!
//! A [`FrameDecoder`] owns one [`ReassemblyState`] per connection and turns
//! arbitrarily chunked deliveries into complete [`Frame`]s. A chunk may hold
//! part of a header, straddle the header/payload boundary, finish one payload
//! and start the next, or carry many whole frames at once.
//!
//! Phases:
//! - `Header`: collecting the 2 length bytes
//! - `Payload`: filling a buffer sized to the declared length
//! - `Discard`: skipping the payload of a frame that was dropped (oversized
//!   or unallocatable), so the stream stays aligned on frame boundaries

use bytes::Bytes;
use tracing::{debug, trace, warn};

use crate::codec::{Frame, FrameConfig, HEADER_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Header,
    Payload,
    Discard { remaining: usize },
}

/// Partial-frame state for one connection.
#[derive(Debug)]
pub struct ReassemblyState {
    phase: Phase,
    header: [u8; HEADER_SIZE],
    header_bytes_received: usize,
    declared_length: usize,
    payload: Vec<u8>,
}

impl Default for ReassemblyState {
    fn default() -> Self {
        Self {
            phase: Phase::Header,
            header: [0; HEADER_SIZE],
            header_bytes_received: 0,
            declared_length: 0,
            payload: Vec::new(),
        }
    }
}

impl ReassemblyState {
    pub fn header_bytes_received(&self) -> usize {
        self.header_bytes_received
    }

    /// Length announced by the current header (0 while still reading it).
    pub fn declared_length(&self) -> usize {
        self.declared_length
    }

    pub fn payload_bytes_received(&self) -> usize {
        self.payload.len()
    }

    /// True when no header or payload bytes are buffered.
    pub fn is_idle(&self) -> bool {
        self.phase == Phase::Header && self.header_bytes_received == 0
    }

    /// Return to the empty header-reading state, releasing the payload buffer.
    fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Counters for everything the decoder emitted or threw away.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderStats {
    /// Complete frames produced.
    pub frames: u64,
    /// Frames skipped because the declared length exceeded the configured cap.
    pub oversized: u64,
    /// Frames skipped because the payload buffer could not be allocated.
    pub unallocatable: u64,
    /// Partial frames thrown away on disconnect or transport error.
    pub discarded_partials: u64,
}

/// Stateful reassembler for one connection.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    state: ReassemblyState,
    config: FrameConfig,
    backlog: Vec<u8>,
    stats: DecoderStats,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: FrameConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Feed one transport delivery and iterate the frames it completes.
    ///
    /// The iterator is lazy; bytes it has not reached when dropped are kept
    /// and processed ahead of the next chunk, so nothing is lost by stopping
    /// early.
    pub fn feed<'d, 'c>(&'d mut self, chunk: &'c [u8]) -> Feed<'d, 'c> {
        let backlog = std::mem::take(&mut self.backlog);
        Feed {
            decoder: self,
            backlog,
            backlog_pos: 0,
            chunk,
        }
    }

    /// The transport reported a disconnect: forget any partial frame.
    pub fn on_disconnect(&mut self) {
        self.discard_partial("disconnect");
    }

    /// The transport reported an error: forget any partial frame.
    pub fn on_error(&mut self) {
        self.discard_partial("transport error");
    }

    pub fn state(&self) -> &ReassemblyState {
        &self.state
    }

    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    fn discard_partial(&mut self, cause: &str) {
        let pending = !self.state.is_idle() || !self.backlog.is_empty();
        if pending {
            warn!(
                cause,
                header_bytes = self.state.header_bytes_received,
                declared = self.state.declared_length,
                payload_bytes = self.state.payload.len(),
                unread = self.backlog.len(),
                "discarding partial frame"
            );
            self.stats.discarded_partials += 1;
        }
        self.state.clear();
        self.backlog = Vec::new();
    }

    /// Consume a prefix of `input`; returns bytes consumed and a completed frame.
    fn step(&mut self, input: &[u8]) -> (usize, Option<Frame>) {
        match self.state.phase {
            Phase::Header => {
                let state = &mut self.state;
                let take = (HEADER_SIZE - state.header_bytes_received).min(input.len());
                state.header[state.header_bytes_received..state.header_bytes_received + take]
                    .copy_from_slice(&input[..take]);
                state.header_bytes_received += take;

                if state.header_bytes_received < HEADER_SIZE {
                    return (take, None);
                }
                let declared = u16::from_be_bytes(state.header) as usize;
                (take, self.begin_payload(declared))
            }
            Phase::Payload => {
                let state = &mut self.state;
                let take = (state.declared_length - state.payload.len()).min(input.len());
                state.payload.extend_from_slice(&input[..take]);

                if state.payload.len() < state.declared_length {
                    return (take, None);
                }
                (take, Some(self.complete()))
            }
            Phase::Discard { remaining } => {
                let take = remaining.min(input.len());
                if take == remaining {
                    trace!("finished skipping dropped frame");
                    self.state.clear();
                } else {
                    self.state.phase = Phase::Discard {
                        remaining: remaining - take,
                    };
                }
                (take, None)
            }
        }
    }

    fn begin_payload(&mut self, declared: usize) -> Option<Frame> {
        self.state.declared_length = declared;

        if declared > self.config.max_payload_size {
            warn!(
                declared,
                max = self.config.max_payload_size,
                "dropping oversized frame"
            );
            self.stats.oversized += 1;
            self.skip(declared);
            return None;
        }

        let mut payload = Vec::new();
        if payload.try_reserve_exact(declared).is_err() {
            warn!(declared, "unable to allocate payload buffer; dropping frame");
            self.stats.unallocatable += 1;
            self.skip(declared);
            return None;
        }

        self.state.payload = payload;
        self.state.phase = Phase::Payload;
        if declared == 0 {
            return Some(self.complete());
        }
        None
    }

    fn skip(&mut self, declared: usize) {
        self.state.clear();
        if declared > 0 {
            self.state.phase = Phase::Discard {
                remaining: declared,
            };
        }
    }

    fn complete(&mut self) -> Frame {
        let payload = std::mem::take(&mut self.state.payload);
        self.state.clear();
        self.stats.frames += 1;
        debug!(len = payload.len(), "frame reassembled");
        Frame::new(Bytes::from(payload))
    }
}

/// Frames completed by one [`FrameDecoder::feed`] call.
pub struct Feed<'d, 'c> {
    decoder: &'d mut FrameDecoder,
    backlog: Vec<u8>,
    backlog_pos: usize,
    chunk: &'c [u8],
}

impl Iterator for Feed<'_, '_> {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        loop {
            if self.backlog_pos < self.backlog.len() {
                let (used, frame) = self.decoder.step(&self.backlog[self.backlog_pos..]);
                self.backlog_pos += used;
                if frame.is_some() {
                    return frame;
                }
            } else if !self.chunk.is_empty() {
                let (used, frame) = self.decoder.step(self.chunk);
                self.chunk = &self.chunk[used..];
                if frame.is_some() {
                    return frame;
                }
            } else {
                return None;
            }
        }
    }
}

impl Drop for Feed<'_, '_> {
    fn drop(&mut self) {
        let mut rest = std::mem::take(&mut self.backlog);
        rest.drain(..self.backlog_pos);
        rest.extend_from_slice(self.chunk);
        self.decoder.backlog = rest;
    }
}
