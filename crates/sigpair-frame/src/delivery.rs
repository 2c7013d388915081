//! The delivery context: transport bytes in, whole frames into the inbox.
//!
//! A packet transport calls [`DeliveryContext::on_bytes`] from its own
//! callback. A stream transport gets a dedicated reader thread from
//! [`spawn_stream_delivery`].

use std::io::{ErrorKind, Read};
use std::thread::JoinHandle;

use tracing::{debug, info, warn};

use crate::codec::FrameConfig;
use crate::inbox::{Delivery, DropReason, InboxSender};
use crate::reassembly::{DecoderStats, FrameDecoder};

const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Owns the per-connection decoder and the producing half of the inbox.
#[derive(Debug)]
pub struct DeliveryContext {
    decoder: FrameDecoder,
    inbox: InboxSender,
    delivered: u64,
    dropped: u64,
}

impl DeliveryContext {
    pub fn new(inbox: InboxSender) -> Self {
        Self::with_config(inbox, FrameConfig::default())
    }

    pub fn with_config(inbox: InboxSender, config: FrameConfig) -> Self {
        Self {
            decoder: FrameDecoder::with_config(config),
            inbox,
            delivered: 0,
            dropped: 0,
        }
    }

    /// Reassemble `chunk` and push every completed frame.
    ///
    /// Returns the outcome of each push, in order.
    pub fn on_bytes(&mut self, chunk: &[u8]) -> Vec<Delivery> {
        let mut outcomes = Vec::new();
        for frame in self.decoder.feed(chunk) {
            let outcome = self.inbox.push(frame);
            match outcome {
                Delivery::Delivered => self.delivered += 1,
                Delivery::Dropped(_) => self.dropped += 1,
            }
            outcomes.push(outcome);
        }
        outcomes
    }

    pub fn on_disconnect(&mut self) {
        self.decoder.on_disconnect();
    }

    pub fn on_error(&mut self) {
        self.decoder.on_error();
    }

    /// Close the inbox; the consumer drains what is queued and then sees `Closed`.
    pub fn close(&self) {
        self.inbox.closer().close();
    }

    fn inbox_closed(&self) -> bool {
        let closed = self.inbox.is_closed();
        if closed {
            debug!("inbox closed while idle");
        }
        closed
    }

    pub fn decoder(&self) -> &FrameDecoder {
        &self.decoder
    }

    pub fn report(&self, bytes_read: u64, end: DeliveryEnd) -> DeliveryReport {
        DeliveryReport {
            bytes_read,
            frames_delivered: self.delivered,
            frames_dropped: self.dropped,
            decoder: self.decoder.stats(),
            end,
        }
    }
}

/// How a stream pump stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryEnd {
    /// The peer closed the stream.
    Eof,
    /// A read failed with something other than a timeout.
    Error(String),
    /// The inbox was closed; nobody is listening any more.
    InboxClosed,
}

/// Summary returned by the stream pump thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    pub bytes_read: u64,
    pub frames_delivered: u64,
    pub frames_dropped: u64,
    pub decoder: DecoderStats,
    pub end: DeliveryEnd,
}

/// Run the delivery context for a stream transport on its own thread.
///
/// The thread reads until EOF, a hard error, or the consumer goes away,
/// then closes the inbox. Read timeouts on `reader` are treated as idle
/// ticks, which lets the pump notice a closed inbox.
pub fn spawn_stream_delivery<R>(
    mut reader: R,
    mut ctx: DeliveryContext,
) -> std::io::Result<JoinHandle<DeliveryReport>>
where
    R: Read + Send + 'static,
{
    std::thread::Builder::new()
        .name("sigpair-delivery".to_string())
        .spawn(move || {
            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let mut bytes_read = 0u64;

            let end = loop {
                let read = match reader.read(&mut chunk) {
                    Ok(0) => {
                        ctx.on_disconnect();
                        break DeliveryEnd::Eof;
                    }
                    Ok(n) => n,
                    Err(err)
                        if matches!(
                            err.kind(),
                            ErrorKind::Interrupted | ErrorKind::WouldBlock | ErrorKind::TimedOut
                        ) =>
                    {
                        if ctx.inbox_closed() {
                            break DeliveryEnd::InboxClosed;
                        }
                        continue;
                    }
                    Err(err) => {
                        warn!(error = %err, "stream read failed");
                        ctx.on_error();
                        break DeliveryEnd::Error(err.to_string());
                    }
                };

                bytes_read += read as u64;
                let outcomes = ctx.on_bytes(&chunk[..read]);
                if outcomes.contains(&Delivery::Dropped(DropReason::Closed)) {
                    break DeliveryEnd::InboxClosed;
                }
            };

            ctx.close();
            let report = ctx.report(bytes_read, end);
            info!(
                bytes = report.bytes_read,
                delivered = report.frames_delivered,
                dropped = report.frames_dropped,
                end = ?report.end,
                "delivery context stopped"
            );
            report
        })
}
