/// Errors that end a session.
///
/// Per-algorithm failures are not errors; they are recorded as
/// [`sigpair_algo::TestOutcome`]s and the catalogue carries on.
#[derive(Debug, thiserror::Error)]
pub enum PeerError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] sigpair_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] sigpair_frame::FrameError),

    /// The inbox closed: the peer went away or the session was cancelled.
    #[error("peer disconnected: {0}")]
    Disconnected(String),

    /// The handshake gave up.
    #[error("handshake failed: {0}")]
    HandshakeFailed(String),

    /// Spawning the delivery thread failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PeerError>;
