use std::thread::JoinHandle;
use std::time::Duration;

use sigpair_frame::{
    inbox, DeliveryContext, DeliveryReport, Frame, FrameConfig, FrameWriter, InboxCloser,
    InboxConfig, InboxReceiver, InboxStats, PopError,
};
use sigpair_transport::{IpcStream, MemoryTransport, Transport};
use tracing::{debug, warn};

use crate::control::ControlMessage;
use crate::error::{PeerError, Result};

/// Framing and inbox settings applied to each new peer.
#[derive(Debug, Clone, Default)]
pub struct PeerConfig {
    pub frame: FrameConfig,
    pub inbox: InboxConfig,
}

/// One side of a link: an outbound frame writer plus the consuming half of
/// the inbox the delivery context fills.
pub struct Peer<T> {
    id: String,
    writer: FrameWriter<T>,
    inbox: InboxReceiver,
    pump: Option<JoinHandle<DeliveryReport>>,
}

impl<T: Transport> Peer<T> {
    pub fn from_parts(id: impl Into<String>, writer: FrameWriter<T>, inbox: InboxReceiver) -> Self {
        Self {
            id: id.into(),
            writer,
            inbox,
            pump: None,
        }
    }

    pub(crate) fn with_pump(mut self, pump: JoinHandle<DeliveryReport>) -> Self {
        self.pump = Some(pump);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Frame and send one payload.
    pub fn send(&mut self, payload: &[u8]) -> Result<()> {
        self.writer.send(payload)?;
        Ok(())
    }

    /// Largest payload `send` accepts.
    pub fn max_payload_size(&self) -> usize {
        self.writer.config().max_payload_size
    }

    pub fn send_control(&mut self, message: ControlMessage) -> Result<()> {
        self.send(message.as_bytes())
    }

    /// Wait up to `timeout`; `Ok(None)` on expiry.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<Frame>> {
        match self.inbox.pop(timeout) {
            Ok(frame) => Ok(Some(frame)),
            Err(PopError::Timeout) => Ok(None),
            Err(PopError::Closed) => Err(self.disconnected()),
        }
    }

    /// Wait with no deadline.
    pub fn recv(&self) -> Result<Frame> {
        self.inbox.pop_blocking().map_err(|_| self.disconnected())
    }

    pub fn try_recv(&self) -> Option<Frame> {
        self.inbox.try_pop()
    }

    /// Handle that cancels any blocking receive on this peer.
    pub fn closer(&self) -> InboxCloser {
        self.inbox.closer()
    }

    pub fn inbox_stats(&self) -> InboxStats {
        self.inbox.stats()
    }

    pub fn transport(&self) -> &T {
        self.writer.get_ref()
    }

    fn disconnected(&self) -> PeerError {
        PeerError::Disconnected(format!("inbox for {} closed", self.id))
    }
}

impl Peer<IpcStream> {
    /// Wrap a connected stream: spawn its delivery thread and keep the write half.
    pub fn from_stream(id: impl Into<String>, stream: IpcStream, config: &PeerConfig) -> Result<Self> {
        let id = id.into();
        let reader = stream.try_clone()?;
        let (tx, rx) = inbox(config.inbox.clone());
        let pump = sigpair_frame::spawn_stream_delivery(
            reader,
            DeliveryContext::with_config(tx, config.frame.clone()),
        )?;
        debug!(peer = %id, remote = %stream.peer_description(), "stream peer ready");
        let writer = FrameWriter::with_config(stream, config.frame.clone());
        Ok(Self::from_parts(id, writer, rx).with_pump(pump))
    }

    /// Close the stream and collect the delivery thread's report.
    pub fn shutdown(mut self) -> Option<DeliveryReport> {
        if let Err(err) = self.writer.get_ref().shutdown() {
            debug!(peer = %self.id, error = %err, "stream shutdown failed");
        }
        self.inbox.closer().close();
        let pump = self.pump.take()?;
        match pump.join() {
            Ok(report) => Some(report),
            Err(_) => {
                warn!(peer = %self.id, "delivery thread panicked");
                None
            }
        }
    }
}

impl<T> std::fmt::Debug for Peer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Peer")
            .field("id", &self.id)
            .field("queued", &self.inbox.len())
            .field("pump", &self.pump.is_some())
            .finish()
    }
}

/// Two in-process peers joined by packet links.
///
/// Each send on one side is delivered, split into `chunk_size` pieces when
/// set, straight into the other side's delivery context. Dropping a peer
/// closes the other side's inbox.
pub fn memory_pair(
    config: &PeerConfig,
    chunk_size: Option<usize>,
) -> (Peer<MemoryTransport>, Peer<MemoryTransport>) {
    let (a_tx, a_rx) = inbox(config.inbox.clone());
    let (b_tx, b_rx) = inbox(config.inbox.clone());

    let link = |tx| {
        let mut ctx = DeliveryContext::with_config(tx, config.frame.clone());
        let transport = MemoryTransport::new(move |chunk: &[u8]| {
            let _ = ctx.on_bytes(chunk);
        });
        match chunk_size {
            Some(size) => transport.with_chunk_size(size),
            None => transport,
        }
    };

    let a = Peer::from_parts(
        "memory-a",
        FrameWriter::with_config(link(b_tx), config.frame.clone()),
        a_rx,
    );
    let b = Peer::from_parts(
        "memory-b",
        FrameWriter::with_config(link(a_tx), config.frame.clone()),
        b_rx,
    );
    (a, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_pair_delivers_both_ways() {
        let (mut a, mut b) = memory_pair(&PeerConfig::default(), Some(1));

        a.send(b"ready").expect("a should send");
        b.send_control(ControlMessage::Ack).expect("b should send");

        let at_b = b.recv_timeout(Duration::from_secs(1)).expect("b inbox open");
        let at_a = a.recv_timeout(Duration::from_secs(1)).expect("a inbox open");
        assert!(at_b.expect("frame at b").is(b"ready"));
        assert!(at_a.expect("frame at a").is(b"ack"));
    }

    #[test]
    fn recv_timeout_returns_none() {
        let (a, _b) = memory_pair(&PeerConfig::default(), None);
        let got = a.recv_timeout(Duration::from_millis(10)).expect("inbox open");
        assert!(got.is_none());
    }

    #[test]
    fn dropping_one_side_disconnects_the_other() {
        let (a, b) = memory_pair(&PeerConfig::default(), None);
        drop(b);
        assert!(matches!(a.recv(), Err(PeerError::Disconnected(_))));
    }

    #[test]
    fn closer_cancels_blocking_recv() {
        let (a, _b) = memory_pair(&PeerConfig::default(), None);
        let closer = a.closer();
        let waiter = std::thread::spawn(move || a.recv());
        std::thread::sleep(Duration::from_millis(20));
        closer.close();
        assert!(matches!(
            waiter.join().expect("waiter should not panic"),
            Err(PeerError::Disconnected(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn stream_peers_over_socket_pair() {
        let dir = std::env::temp_dir().join(format!("sigpair-peer-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
        let endpoint = sigpair_transport::Endpoint::Unix(dir.join("pair.sock"));
        let listener =
            sigpair_transport::StreamListener::bind(&endpoint).expect("listener should bind");

        let target = endpoint.clone();
        let client = std::thread::spawn(move || {
            let stream = target.connect().expect("client should connect");
            let mut peer = Peer::from_stream("client", stream, &PeerConfig::default())
                .expect("client peer");
            peer.send(b"hello").expect("client send");
            let reply = peer.recv().expect("client recv");
            assert!(reply.is(b"world"));
            peer.shutdown()
        });

        let stream = listener.accept().expect("listener should accept");
        let mut server =
            Peer::from_stream("server", stream, &PeerConfig::default()).expect("server peer");
        assert!(server.recv().expect("server recv").is(b"hello"));
        server.send(b"world").expect("server send");

        let report = client.join().expect("client thread").expect("client report");
        assert_eq!(report.frames_delivered, 1);
        let _ = server.shutdown();
        drop(listener);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
