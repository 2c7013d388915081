/// Errors that can occur while encoding or sending frames.
///
/// Inbound problems (oversized headers, allocation failure, a full inbox)
/// are not errors: they are dropped, logged and counted.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The payload does not fit the u16 length header (or the configured cap).
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The transport refused the encoded bytes.
    #[error("transport error: {0}")]
    Transport(#[from] sigpair_transport::TransportError),

    /// An I/O error surfaced through an async codec.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FrameError>;
