use crate::endpoint::Endpoint;
use crate::error::Result;
use crate::tcp::TcpEndpoint;
use crate::traits::IpcStream;

/// A bound stream listener for any [`Endpoint`].
pub struct StreamListener {
    inner: ListenerInner,
    endpoint: Endpoint,
}

enum ListenerInner {
    #[cfg(unix)]
    Unix(crate::uds::UnixDomainSocket),
    Tcp(TcpEndpoint),
}

impl StreamListener {
    /// Bind `endpoint` and start listening.
    pub fn bind(endpoint: &Endpoint) -> Result<Self> {
        let (inner, endpoint) = match endpoint {
            #[cfg(unix)]
            Endpoint::Unix(path) => (
                ListenerInner::Unix(crate::uds::UnixDomainSocket::bind(path)?),
                endpoint.clone(),
            ),
            #[cfg(not(unix))]
            Endpoint::Unix(path) => {
                return Err(crate::error::TransportError::Bind {
                    endpoint: path.display().to_string(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::Unsupported,
                        "unix domain sockets are not available on this platform",
                    ),
                })
            }
            Endpoint::Tcp(addr) => {
                let tcp = TcpEndpoint::bind(addr)?;
                let bound = Endpoint::Tcp(tcp.local_addr().to_string());
                (ListenerInner::Tcp(tcp), bound)
            }
        };
        Ok(Self { inner, endpoint })
    }

    /// Accept the next connection (blocking).
    pub fn accept(&self) -> Result<IpcStream> {
        match &self.inner {
            #[cfg(unix)]
            ListenerInner::Unix(socket) => socket.accept(),
            ListenerInner::Tcp(tcp) => tcp.accept(),
        }
    }

    /// The endpoint actually bound; TCP port 0 is resolved to the real port.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};

    use super::*;

    #[test]
    fn tcp_port_zero_is_resolved() {
        let listener = StreamListener::bind(&Endpoint::Tcp("127.0.0.1:0".to_string())).unwrap();
        let Endpoint::Tcp(addr) = listener.endpoint() else {
            panic!("expected tcp endpoint");
        };
        assert!(!addr.ends_with(":0"));
    }

    #[cfg(unix)]
    #[test]
    fn unix_endpoint_accepts() {
        let dir = std::env::temp_dir().join(format!("sigpair-listener-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let endpoint = Endpoint::Unix(dir.join("l.sock"));
        let listener = StreamListener::bind(&endpoint).unwrap();

        let target = endpoint.clone();
        let client = std::thread::spawn(move || {
            let mut stream = target.connect().unwrap();
            stream.write_all(&[0x00, 0x00]).unwrap();
        });

        let mut server = listener.accept().unwrap();
        let mut header = [0xFFu8; 2];
        server.read_exact(&mut header).unwrap();
        assert_eq!(header, [0x00, 0x00]);
        client.join().unwrap();

        drop(listener);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
