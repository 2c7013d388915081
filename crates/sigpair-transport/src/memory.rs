//! In-process packet transport.
//!
//! Models a broker-style link (MQTT, cloud pub/sub): every `send` turns into
//! one or more delivery callbacks on the receiving side, with no guarantee
//! that a delivery lines up with a frame boundary.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{Result, TransportError};
use crate::traits::Transport;

type DeliverFn = Box<dyn FnMut(&[u8]) + Send>;

/// Packet transport that hands outgoing bytes straight to a callback.
pub struct MemoryTransport {
    deliver: DeliverFn,
    chunk_size: Option<usize>,
    open: Arc<AtomicBool>,
    bytes_sent: usize,
}

/// Closes a [`MemoryTransport`] from outside the sending context.
#[derive(Debug, Clone)]
pub struct LinkHandle {
    open: Arc<AtomicBool>,
}

impl LinkHandle {
    /// Mark the link down; subsequent sends fail with `Shutdown`.
    pub fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

impl MemoryTransport {
    /// Deliver every send as a single chunk.
    pub fn new(deliver: impl FnMut(&[u8]) + Send + 'static) -> Self {
        Self {
            deliver: Box::new(deliver),
            chunk_size: None,
            open: Arc::new(AtomicBool::new(true)),
            bytes_sent: 0,
        }
    }

    /// Split every send into deliveries of at most `chunk_size` bytes.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = Some(chunk_size.max(1));
        self
    }

    /// Handle that can take the link down.
    pub fn handle(&self) -> LinkHandle {
        LinkHandle {
            open: Arc::clone(&self.open),
        }
    }

    /// Total bytes pushed through this transport.
    pub fn bytes_sent(&self) -> usize {
        self.bytes_sent
    }
}

impl Transport for MemoryTransport {
    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        if !self.open.load(Ordering::SeqCst) {
            return Err(TransportError::Shutdown);
        }

        match self.chunk_size {
            Some(size) => bytes.chunks(size).for_each(|chunk| (self.deliver)(chunk)),
            None => (self.deliver)(bytes),
        }
        self.bytes_sent += bytes.len();
        Ok(())
    }

    fn transport_name(&self) -> &'static str {
        "memory"
    }
}

impl std::fmt::Debug for MemoryTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTransport")
            .field("chunk_size", &self.chunk_size)
            .field("open", &self.open.load(Ordering::SeqCst))
            .field("bytes_sent", &self.bytes_sent)
            .finish()
    }
}
