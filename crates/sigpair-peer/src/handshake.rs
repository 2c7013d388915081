//! Readiness rendezvous before any test traffic.
//!
//! The Initiator sends `ready` until it sees `ack`. The Responder
//! waits, with no deadline, for a single `ready`, answers `ack` once and
//! lets the link settle. Anything else that arrives meanwhile is discarded.

use std::fmt;
use std::time::{Duration, Instant};

use serde::Serialize;
use sigpair_transport::Transport;
use tracing::{debug, info, warn};

use crate::control::ControlMessage;
use crate::error::{PeerError, Result};
use crate::peer::Peer;

/// Which side of the rendezvous this device plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HandshakeRole {
    Initiator,
    Responder,
}

impl fmt::Display for HandshakeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initiator => f.write_str("initiator"),
            Self::Responder => f.write_str("responder"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HandshakeState {
    AwaitingPeer,
    /// Terminal.
    Synchronized,
}

/// Handshake timing.
#[derive(Debug, Clone)]
pub struct HandshakeConfig {
    /// Interval between `ready` attempts; the Initiator keeps reading the
    /// inbox throughout. Default: 2 s.
    pub retry_interval: Duration,
    /// Upper bound on a single inbox wait by the Initiator. Default: 3 s.
    pub poll_timeout: Duration,
    /// Responder pause after sending `ack`. Default: 1 s.
    pub settle_delay: Duration,
    /// Initiator gives up after this many attempts. Default: unbounded.
    pub max_attempts: Option<u32>,
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self {
            retry_interval: Duration::from_millis(2000),
            poll_timeout: Duration::from_millis(3000),
            settle_delay: Duration::from_millis(1000),
            max_attempts: None,
        }
    }
}

/// What happened during a completed handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandshakeReport {
    pub role: HandshakeRole,
    pub state: HandshakeState,
    /// `ready`s sent (Initiator) or `ack`s sent (Responder).
    pub attempts: u32,
    /// Frames thrown away while waiting.
    pub discarded: u32,
    pub elapsed_ms: u64,
}

/// Role-scoped handshake state machine.
#[derive(Debug, Clone)]
pub struct Handshake {
    role: HandshakeRole,
    state: HandshakeState,
    config: HandshakeConfig,
    attempts: u32,
    discarded: u32,
}

impl Handshake {
    pub fn new(role: HandshakeRole, config: HandshakeConfig) -> Self {
        Self {
            role,
            state: HandshakeState::AwaitingPeer,
            config,
            attempts: 0,
            discarded: 0,
        }
    }

    pub fn role(&self) -> HandshakeRole {
        self.role
    }

    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// Drive the handshake to `Synchronized`.
    ///
    /// Returns at once if already synchronized. Errors only when the inbox
    /// closes, a send fails, or the Initiator runs out of attempts.
    pub fn run<T: Transport>(&mut self, peer: &mut Peer<T>) -> Result<HandshakeReport> {
        let started = Instant::now();
        if self.state == HandshakeState::AwaitingPeer {
            info!(role = %self.role, peer = peer.id(), "handshake started");
            match self.role {
                HandshakeRole::Initiator => self.initiate(peer)?,
                HandshakeRole::Responder => self.respond(peer)?,
            }
            self.state = HandshakeState::Synchronized;
            info!(
                role = %self.role,
                attempts = self.attempts,
                discarded = self.discarded,
                "handshake synchronized"
            );
        }
        Ok(self.report(started.elapsed()))
    }

    fn initiate<T: Transport>(&mut self, peer: &mut Peer<T>) -> Result<()> {
        loop {
            if let Some(max) = self.config.max_attempts {
                if self.attempts >= max {
                    return Err(PeerError::HandshakeFailed(format!(
                        "no ack after {max} ready attempts"
                    )));
                }
            }
            peer.send_control(ControlMessage::Ready)?;
            self.attempts += 1;
            debug!(attempt = self.attempts, "sent ready");

            if self.await_ack(peer)? {
                return Ok(());
            }
        }
    }

    /// Listen for `ack` until the next `ready` is due.
    fn await_ack<T: Transport>(&mut self, peer: &Peer<T>) -> Result<bool> {
        let next_ready = Instant::now() + self.config.retry_interval;
        loop {
            let remaining = next_ready.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(false);
            }
            if let Some(frame) = peer.recv_timeout(remaining.min(self.config.poll_timeout))? {
                if ControlMessage::classify(&frame) == Some(ControlMessage::Ack) {
                    return Ok(true);
                }
                self.discard(frame.len());
            }
        }
    }

    fn respond<T: Transport>(&mut self, peer: &mut Peer<T>) -> Result<()> {
        loop {
            let frame = peer.recv()?;
            if ControlMessage::classify(&frame) == Some(ControlMessage::Ready) {
                break;
            }
            self.discard(frame.len());
        }

        peer.send_control(ControlMessage::Ack)?;
        self.attempts += 1;
        std::thread::sleep(self.config.settle_delay);

        // `ready`s that crossed our ack on the wire.
        while let Some(frame) = peer.try_recv() {
            if ControlMessage::classify(&frame) != Some(ControlMessage::Ready) {
                warn!(len = frame.len(), "unexpected frame during settle");
            }
            self.discarded += 1;
        }
        Ok(())
    }

    fn discard(&mut self, len: usize) {
        self.discarded += 1;
        debug!(role = %self.role, len, "discarding non-handshake frame");
    }

    fn report(&self, elapsed: Duration) -> HandshakeReport {
        HandshakeReport {
            role: self.role,
            state: self.state,
            attempts: self.attempts,
            discarded: self.discarded,
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }
}

/// One-shot helper: run a fresh handshake in `role`.
pub fn synchronize<T: Transport>(
    peer: &mut Peer<T>,
    role: HandshakeRole,
    config: &HandshakeConfig,
) -> Result<HandshakeReport> {
    Handshake::new(role, config.clone()).run(peer)
}
