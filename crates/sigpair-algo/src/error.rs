/// Errors raised by signature providers, the registry and the envelope codec.
#[derive(Debug, thiserror::Error)]
pub enum AlgorithmError {
    /// Key generation failed (usually the entropy source).
    #[error("{algorithm}: key generation failed: {reason}")]
    Keygen {
        algorithm: &'static str,
        reason: String,
    },

    /// Signing failed.
    #[error("{algorithm}: signing failed: {reason}")]
    Sign {
        algorithm: &'static str,
        reason: String,
    },

    /// The signature does not verify under the given public key.
    #[error("{algorithm}: signature verification failed")]
    VerificationFailed { algorithm: &'static str },

    /// A key or signature has the wrong length for the algorithm.
    #[error("{algorithm}: {what} must be {expected} bytes, got {actual}")]
    InvalidLength {
        algorithm: &'static str,
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The key bytes have the right length but are not a valid key.
    #[error("{algorithm}: invalid {what}")]
    InvalidKey {
        algorithm: &'static str,
        what: &'static str,
    },

    /// Envelope bytes could not be split into message and signature.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// The message does not fit the envelope's u16 length field.
    #[error("message too long for envelope ({len} bytes, max {max})")]
    MessageTooLong { len: usize, max: usize },

    /// No provider registered under that name or id.
    #[error("unknown algorithm: {0}")]
    UnknownAlgorithm(String),

    /// A provider with the same id or name is already registered.
    #[error("algorithm already registered: {0}")]
    Duplicate(String),
}

pub type Result<T> = std::result::Result<T, AlgorithmError>;
