use std::net::{SocketAddr, TcpListener, TcpStream};

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::IpcStream;

/// TCP listener for links between two machines.
pub struct TcpEndpoint {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl TcpEndpoint {
    /// Bind and listen on `addr` (`host:port`).
    pub fn bind(addr: &str) -> Result<Self> {
        let bind_err = |source| TransportError::Bind {
            endpoint: addr.to_string(),
            source,
        };
        let listener = TcpListener::bind(addr).map_err(bind_err)?;
        let local_addr = listener.local_addr().map_err(bind_err)?;
        info!(%local_addr, "listening on tcp");
        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Accept the next connection (blocking).
    pub fn accept(&self) -> Result<IpcStream> {
        let (stream, peer) = self.listener.accept().map_err(TransportError::Accept)?;
        debug!(%peer, "accepted tcp connection");
        Ok(IpcStream::from_tcp(stream))
    }

    /// Connect to `addr` (`host:port`).
    pub fn connect(addr: &str) -> Result<IpcStream> {
        let stream = TcpStream::connect(addr).map_err(|source| TransportError::Connect {
            endpoint: addr.to_string(),
            source,
        })?;
        debug!(addr, "connected over tcp");
        Ok(IpcStream::from_tcp(stream))
    }

    /// Address actually bound (useful with port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}
