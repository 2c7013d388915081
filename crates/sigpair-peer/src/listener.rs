use std::sync::atomic::{AtomicU64, Ordering};

use sigpair_transport::{Endpoint, IpcStream, StreamListener};
use tracing::info;

use crate::error::Result;
use crate::peer::{Peer, PeerConfig};

/// Accepts stream peers on an endpoint.
pub struct PeerListener {
    listener: StreamListener,
    config: PeerConfig,
    next_peer_id: AtomicU64,
}

impl PeerListener {
    /// Bind with default peer configuration.
    pub fn bind(endpoint: &Endpoint) -> Result<Self> {
        Ok(Self {
            listener: StreamListener::bind(endpoint)?,
            config: PeerConfig::default(),
            next_peer_id: AtomicU64::new(1),
        })
    }

    pub fn with_config(mut self, config: PeerConfig) -> Self {
        self.config = config;
        self
    }

    /// Accept the next connection and start its delivery thread.
    pub fn accept(&self) -> Result<Peer<IpcStream>> {
        let stream = self.listener.accept()?;
        let id = self.next_peer_id.fetch_add(1, Ordering::Relaxed);
        info!(peer = id, remote = %stream.peer_description(), "peer connected");
        Peer::from_stream(format!("peer-{id}"), stream, &self.config)
    }

    /// The bound endpoint, with any TCP port 0 resolved.
    pub fn endpoint(&self) -> &Endpoint {
        self.listener.endpoint()
    }
}

impl std::fmt::Debug for PeerListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeerListener")
            .field("endpoint", self.listener.endpoint())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::connector::connect;

    #[test]
    fn tcp_accepts_sequential_peers() {
        let listener = PeerListener::bind(&Endpoint::Tcp("127.0.0.1:0".to_string()))
            .expect("listener should bind");
        let endpoint = listener.endpoint().clone();

        let server = thread::spawn(move || {
            let first = listener.accept().expect("first accept");
            let second = listener.accept().expect("second accept");
            (first.id().to_string(), second.id().to_string())
        });

        let c1 = connect(&endpoint).expect("first client");
        let c2 = connect(&endpoint).expect("second client");
        let (first, second) = server.join().expect("server thread");

        assert_eq!(first, "peer-1");
        assert_eq!(second, "peer-2");
        let _ = c1.shutdown();
        let _ = c2.shutdown();
    }
}
