use std::time::{Duration, Instant};

use sigpair_transport::{Endpoint, IpcStream, TransportError};
use tracing::debug;

use crate::error::Result;
use crate::peer::{Peer, PeerConfig};

/// Connect to a listening peer.
pub fn connect(endpoint: &Endpoint) -> Result<Peer<IpcStream>> {
    connect_with_config(endpoint, &PeerConfig::default())
}

/// Connect with explicit configuration.
pub fn connect_with_config(endpoint: &Endpoint, config: &PeerConfig) -> Result<Peer<IpcStream>> {
    let stream = endpoint.connect()?;
    Peer::from_stream(endpoint.to_string(), stream, config)
}

/// Keep trying to connect every `retry_interval` until `timeout` elapses.
///
/// Lets both devices start in any order.
pub fn connect_with_retry(
    endpoint: &Endpoint,
    config: &PeerConfig,
    retry_interval: Duration,
    timeout: Option<Duration>,
) -> Result<Peer<IpcStream>> {
    let deadline = timeout.map(|t| Instant::now() + t);
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match endpoint.connect() {
            Ok(stream) => return Peer::from_stream(endpoint.to_string(), stream, config),
            Err(err @ TransportError::Connect { .. }) => {
                if deadline.is_some_and(|d| Instant::now() + retry_interval > d) {
                    return Err(err.into());
                }
                debug!(%endpoint, attempt, error = %err, "connect failed; retrying");
                std::thread::sleep(retry_interval);
            }
            Err(err) => return Err(err.into()),
        }
    }
}
