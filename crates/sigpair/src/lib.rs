//! Two-device digital signature interoperability testing.
//!
//! Two peers joined by a byte link agree they are both listening, then for
//! every algorithm in a shared catalogue one generates a key pair and signs a
//! fixed message while the other verifies it and echoes the recovered
//! message back. Each algorithm yields a pass/fail outcome; a failure never
//! stops the catalogue.
//!
//! # Crate Structure
//!
//! - [`transport`]: byte links (Unix domain sockets, TCP, in-memory packets)
//! - [`frame`]: u16 length-prefixed framing, reassembly, and the bounded inbox
//! - [`algo`]: signature providers, the catalogue, and local self-test
//! - [`peer`]: handshake, signature round trip, and sessions

/// Re-export transport types.
pub mod transport {
    pub use sigpair_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use sigpair_frame::*;
}

/// Re-export algorithm types.
pub mod algo {
    pub use sigpair_algo::*;
}

/// Re-export peer types.
pub mod peer {
    pub use sigpair_peer::*;
}
