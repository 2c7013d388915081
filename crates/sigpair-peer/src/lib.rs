//! Two-device signature interop sessions.
//!
//! A [`Peer`] wraps any transport: frames go out through a writer, and come
//! in through the inbox a delivery context fills. On top of that sit the
//! readiness [`handshake`], the per-algorithm [`roundtrip`], and [`Session`],
//! which runs both for each role.

pub mod connector;
pub mod control;
pub mod error;
pub mod handshake;
pub mod listener;
pub mod peer;
pub mod roundtrip;
pub mod session;

#[cfg(test)]
mod test_support;

pub use connector::{connect, connect_with_config, connect_with_retry};
pub use control::{ControlMessage, ACK, FAILED, READY};
pub use error::{PeerError, Result};
pub use handshake::{
    synchronize, Handshake, HandshakeConfig, HandshakeReport, HandshakeRole, HandshakeState,
};
pub use listener::PeerListener;
pub use peer::{memory_pair, Peer, PeerConfig};
pub use roundtrip::{run_catalogue, run_signer, run_verifier, RoundTripConfig, TestRole};
pub use session::{RunReport, Session, SessionConfig, SessionReport};
