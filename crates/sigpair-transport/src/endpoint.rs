use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{Result, TransportError};
use crate::tcp::TcpEndpoint;
use crate::traits::IpcStream;

const TCP_SCHEME: &str = "tcp://";
const UNIX_SCHEME: &str = "unix://";

/// Where a stream link lives.
///
/// Parsed from `tcp://host:port`, `unix:///path/to.sock`, or a bare path
/// (treated as a Unix domain socket).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Unix(PathBuf),
    Tcp(String),
}

impl Endpoint {
    /// Open a client connection to this endpoint.
    pub fn connect(&self) -> Result<IpcStream> {
        match self {
            #[cfg(unix)]
            Endpoint::Unix(path) => crate::uds::UnixDomainSocket::connect(path),
            #[cfg(not(unix))]
            Endpoint::Unix(path) => Err(TransportError::Connect {
                endpoint: path.display().to_string(),
                source: std::io::Error::new(
                    std::io::ErrorKind::Unsupported,
                    "unix domain sockets are not available on this platform",
                ),
            }),
            Endpoint::Tcp(addr) => TcpEndpoint::connect(addr),
        }
    }
}

impl FromStr for Endpoint {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(addr) = s.strip_prefix(TCP_SCHEME) {
            if addr.is_empty() || !addr.contains(':') {
                return Err(TransportError::InvalidEndpoint(s.to_string()));
            }
            return Ok(Endpoint::Tcp(addr.to_string()));
        }
        let path = s.strip_prefix(UNIX_SCHEME).unwrap_or(s);
        if path.is_empty() {
            return Err(TransportError::InvalidEndpoint(s.to_string()));
        }
        Ok(Endpoint::Unix(PathBuf::from(path)))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Unix(path) => write!(f, "{UNIX_SCHEME}{}", path.display()),
            Endpoint::Tcp(addr) => write!(f, "{TCP_SCHEME}{addr}"),
        }
    }
}
