//! Per-algorithm signature round trip.
//!
//! ```text
//! signer                                 verifier
//!   keygen ───── public key ──────────────▶ (wait, exact pk length)
//!   sign   ───── envelope ────────────────▶ (wait)
//!                                           open
//!   (wait) ◀──── recovered message ─────── ok
//!          ◀──── "failed" ──────────────── error
//! ```
//!
//! Either side sends `failed` in place of its next frame when a local step
//! fails, then both move on to the next algorithm.

use std::fmt;
use std::time::{Duration, Instant};

use bytes::Bytes;
use serde::Serialize;
use sigpair_algo::{
    AlgorithmError, AlgorithmRegistry, FailureReason, SignatureAlgorithm, TestOutcome,
};
use sigpair_frame::Frame;
use sigpair_transport::Transport;
use tracing::{debug, info, warn};

use crate::control::{ControlMessage, FAILED};
use crate::error::Result;
use crate::handshake::HandshakeRole;
use crate::peer::Peer;

/// Which half of the round trip this device runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TestRole {
    Signer,
    Verifier,
}

impl TestRole {
    /// Signer waits for the `ready`; Verifier sends it.
    pub fn handshake_role(self) -> HandshakeRole {
        match self {
            Self::Signer => HandshakeRole::Responder,
            Self::Verifier => HandshakeRole::Initiator,
        }
    }

    pub fn swapped(self) -> Self {
        match self {
            Self::Signer => Self::Verifier,
            Self::Verifier => Self::Signer,
        }
    }
}

impl fmt::Display for TestRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signer => f.write_str("signer"),
            Self::Verifier => f.write_str("verifier"),
        }
    }
}

/// Round-trip message and timing.
#[derive(Debug, Clone)]
pub struct RoundTripConfig {
    /// Payload the signer signs and expects back.
    pub message: Bytes,
    /// Verifier poll interval while waiting for key and envelope. Default: 1 s.
    pub receive_timeout: Duration,
    /// How long the signer waits for the confirmation. Default: 1 s.
    pub confirm_timeout: Duration,
    /// Verifier gives up on an algorithm after this many empty polls.
    /// Default: unbounded.
    pub max_receive_attempts: Option<u32>,
}

impl Default for RoundTripConfig {
    fn default() -> Self {
        Self {
            message: Bytes::from_static(b"Test message for DSA"),
            receive_timeout: Duration::from_millis(1000),
            confirm_timeout: Duration::from_millis(1000),
            max_receive_attempts: None,
        }
    }
}

/// Signer half for one algorithm.
pub fn run_signer<T: Transport>(
    peer: &mut Peer<T>,
    algorithm: &dyn SignatureAlgorithm,
    config: &RoundTripConfig,
) -> Result<TestOutcome> {
    let descriptor = algorithm.descriptor();

    let keypair = match algorithm.keygen() {
        Ok(keypair) => keypair,
        Err(err) => {
            warn!(algorithm = descriptor.name, error = %err, "keygen failed");
            peer.send(FAILED)?;
            return Ok(TestOutcome::fail(descriptor, FailureReason::KeygenFailed));
        }
    };
    peer.send(&keypair.public_key)?;
    debug!(algorithm = descriptor.name, len = keypair.public_key.len(), "sent public key");

    let envelope = match algorithm
        .sign_envelope(&config.message, &keypair.secret_key)
        .and_then(|envelope| envelope.encode())
    {
        Ok(envelope) if envelope.len() > peer.max_payload_size() => {
            warn!(
                algorithm = descriptor.name,
                len = envelope.len(),
                max = peer.max_payload_size(),
                "envelope does not fit in one frame"
            );
            peer.send(FAILED)?;
            return Ok(TestOutcome::fail(descriptor, FailureReason::SignFailed));
        }
        Ok(envelope) => envelope,
        Err(err) => {
            warn!(algorithm = descriptor.name, error = %err, "signing failed");
            peer.send(FAILED)?;
            return Ok(TestOutcome::fail(descriptor, FailureReason::SignFailed));
        }
    };
    peer.send(&envelope)?;
    debug!(algorithm = descriptor.name, len = envelope.len(), "sent envelope");

    let deadline = Instant::now() + config.confirm_timeout;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let Some(frame) = peer.recv_timeout(remaining)? else {
            warn!(algorithm = descriptor.name, "no confirmation before deadline");
            return Ok(TestOutcome::fail(descriptor, FailureReason::Timeout));
        };

        if frame.is(&config.message) {
            info!(algorithm = descriptor.name, "round trip passed");
            return Ok(TestOutcome::pass(descriptor));
        }

        match ControlMessage::classify(&frame) {
            Some(ControlMessage::Ready | ControlMessage::Ack) => {
                debug!(algorithm = descriptor.name, "ignoring stray handshake frame");
                continue;
            }
            Some(ControlMessage::Failed) => {
                warn!(algorithm = descriptor.name, "verifier reported failure");
            }
            None => {}
        }
        warn!(
            algorithm = descriptor.name,
            expected = config.message.len(),
            got = frame.len(),
            "confirmation does not match test message"
        );
        return Ok(TestOutcome::fail(descriptor, FailureReason::RoundTripMismatch));
    }
}

enum Wait {
    Frame(Frame),
    PeerFailed,
    GaveUp,
}

fn wait_for<T: Transport>(
    peer: &Peer<T>,
    config: &RoundTripConfig,
    algorithm: &'static str,
    what: &'static str,
    accept: impl Fn(&Frame) -> bool,
) -> Result<Wait> {
    let mut empty_polls = 0u32;
    loop {
        match peer.recv_timeout(config.receive_timeout)? {
            Some(frame) if frame.is(FAILED) => return Ok(Wait::PeerFailed),
            Some(frame) if accept(&frame) => return Ok(Wait::Frame(frame)),
            Some(frame) => {
                warn!(algorithm, what, len = frame.len(), "discarding unexpected frame");
            }
            None => {
                empty_polls += 1;
                debug!(algorithm, what, empty_polls, "still waiting");
                if config.max_receive_attempts.is_some_and(|max| empty_polls >= max) {
                    return Ok(Wait::GaveUp);
                }
            }
        }
    }
}

/// Verifier half for one algorithm.
pub fn run_verifier<T: Transport>(
    peer: &mut Peer<T>,
    algorithm: &dyn SignatureAlgorithm,
    config: &RoundTripConfig,
) -> Result<TestOutcome> {
    let descriptor = algorithm.descriptor();
    let name = descriptor.name;
    let pk_len = descriptor.public_key_len;

    let public_key = match wait_for(peer, config, name, "public key", |f| f.len() == pk_len)? {
        Wait::Frame(frame) => frame.payload,
        Wait::PeerFailed => {
            warn!(algorithm = name, "signer failed before sending a key");
            return Ok(TestOutcome::fail(descriptor, FailureReason::PeerFailed));
        }
        Wait::GaveUp => return Ok(TestOutcome::fail(descriptor, FailureReason::Timeout)),
    };

    let envelope = match wait_for(peer, config, name, "envelope", |_| true)? {
        Wait::Frame(frame) => frame.payload,
        Wait::PeerFailed => {
            warn!(algorithm = name, "signer failed before sending an envelope");
            return Ok(TestOutcome::fail(descriptor, FailureReason::PeerFailed));
        }
        Wait::GaveUp => return Ok(TestOutcome::fail(descriptor, FailureReason::Timeout)),
    };

    match algorithm.open(&envelope, &public_key) {
        Ok(message) => {
            peer.send(&message)?;
            info!(algorithm = name, len = message.len(), "envelope verified");
            Ok(TestOutcome::pass(descriptor))
        }
        Err(err) => {
            warn!(algorithm = name, error = %err, "envelope rejected");
            peer.send(FAILED)?;
            let reason = match err {
                AlgorithmError::MalformedEnvelope(_) => FailureReason::MalformedEnvelope,
                _ => FailureReason::VerifyFailed,
            };
            Ok(TestOutcome::fail(descriptor, reason))
        }
    }
}

/// Run `role` over every algorithm in registry order.
///
/// A failing algorithm never stops the walk; only a session-level error
/// (send failure, closed inbox) does.
pub fn run_catalogue<T: Transport>(
    peer: &mut Peer<T>,
    registry: &AlgorithmRegistry,
    role: TestRole,
    config: &RoundTripConfig,
) -> Result<Vec<TestOutcome>> {
    let mut outcomes = Vec::with_capacity(registry.len());
    for algorithm in registry.iter() {
        debug!(algorithm = algorithm.name(), %role, "starting algorithm");
        let outcome = match role {
            TestRole::Signer => run_signer(peer, algorithm.as_ref(), config)?,
            TestRole::Verifier => run_verifier(peer, algorithm.as_ref(), config)?,
        };
        outcomes.push(outcome);
    }
    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use std::thread;

    use sigpair_algo::{AlgorithmId, Ed25519};

    use super::*;
    use crate::peer::{memory_pair, PeerConfig};
    use crate::test_support::{
        catalogue, CorruptSignature, FailingKeygen, Renamed, WideSignature, WIDE_PADDING,
    };

    fn fast() -> RoundTripConfig {
        RoundTripConfig {
            receive_timeout: Duration::from_millis(50),
            confirm_timeout: Duration::from_secs(2),
            max_receive_attempts: Some(40),
            ..RoundTripConfig::default()
        }
    }

    fn run_pair(
        registry: AlgorithmRegistry,
        chunk_size: Option<usize>,
    ) -> (Vec<TestOutcome>, Vec<TestOutcome>) {
        let (mut signer, mut verifier) = memory_pair(&PeerConfig::default(), chunk_size);
        let verifier_registry = registry.clone();

        let handle = thread::spawn(move || {
            let outcomes =
                run_catalogue(&mut verifier, &verifier_registry, TestRole::Verifier, &fast())
                    .expect("verifier catalogue");
            (outcomes, verifier)
        });
        let signed = run_catalogue(&mut signer, &registry, TestRole::Signer, &fast())
            .expect("signer catalogue");
        let (verified, _verifier) = handle.join().expect("verifier thread");
        (signed, verified)
    }

    #[test]
    fn roles_pair_with_handshake_roles() {
        assert_eq!(TestRole::Signer.handshake_role(), HandshakeRole::Responder);
        assert_eq!(TestRole::Verifier.handshake_role(), HandshakeRole::Initiator);
        assert_eq!(TestRole::Signer.swapped(), TestRole::Verifier);
    }

    #[test]
    fn ed25519_round_trip_over_fragmenting_link() {
        let registry = catalogue(vec![Box::new(Ed25519)]);
        let (signed, verified) = run_pair(registry, Some(7));

        assert_eq!(signed, vec![TestOutcome::pass(Ed25519.descriptor())]);
        assert_eq!(verified, vec![TestOutcome::pass(Ed25519.descriptor())]);
    }

    #[test]
    fn keygen_failure_does_not_stop_the_catalogue() {
        let registry = catalogue(vec![
            Box::new(Ed25519),
            Box::new(FailingKeygen),
            Box::new(Renamed::new(AlgorithmId(902), "ED25519_B")),
        ]);
        let (signed, verified) = run_pair(registry, None);

        assert_eq!(signed.len(), 3);
        assert_eq!(verified.len(), 3);
        assert!(signed[0].passed && signed[2].passed);
        assert_eq!(signed[1].failure_reason, Some(FailureReason::KeygenFailed));
        assert!(verified[0].passed && verified[2].passed);
        assert_eq!(verified[1].failure_reason, Some(FailureReason::PeerFailed));
    }

    #[test]
    fn verify_failure_is_reported_to_signer() {
        let registry = catalogue(vec![Box::new(CorruptSignature), Box::new(Ed25519)]);
        let (signed, verified) = run_pair(registry, Some(3));

        assert_eq!(signed[0].failure_reason, Some(FailureReason::RoundTripMismatch));
        assert_eq!(verified[0].failure_reason, Some(FailureReason::VerifyFailed));
        assert!(signed[1].passed);
        assert!(verified[1].passed);
    }

    #[test]
    fn envelope_too_large_for_a_frame_is_a_sign_failure() {
        let registry = catalogue(vec![Box::new(WideSignature), Box::new(Ed25519)]);
        let signature_len = Ed25519.descriptor().signature_len;
        // Fits with a 64-byte signature, overflows the frame with the padded one.
        let message_len = sigpair_frame::MAX_PAYLOAD - 2 - signature_len - WIDE_PADDING / 2;
        let config = RoundTripConfig {
            message: Bytes::from(vec![b'x'; message_len]),
            ..fast()
        };

        let (mut signer, mut verifier) = memory_pair(&PeerConfig::default(), None);
        let verifier_registry = registry.clone();
        let verifier_config = config.clone();
        let handle = thread::spawn(move || {
            run_catalogue(
                &mut verifier,
                &verifier_registry,
                TestRole::Verifier,
                &verifier_config,
            )
            .expect("verifier catalogue")
        });
        let signed = run_catalogue(&mut signer, &registry, TestRole::Signer, &config)
            .expect("signer catalogue");
        let verified = handle.join().expect("verifier thread");

        assert_eq!(signed.len(), 2);
        assert_eq!(verified.len(), 2);
        assert_eq!(signed[0].failure_reason, Some(FailureReason::SignFailed));
        assert_eq!(verified[0].failure_reason, Some(FailureReason::PeerFailed));
        assert!(signed[1].passed);
        assert!(verified[1].passed);
    }

    #[test]
    fn confirmation_matching_a_control_word_still_passes() {
        let config = RoundTripConfig {
            message: Bytes::from_static(b"ack"),
            ..fast()
        };
        let (mut signer, mut verifier) = memory_pair(&PeerConfig::default(), None);

        let verifier_config = config.clone();
        let handle = thread::spawn(move || {
            run_verifier(&mut verifier, &Ed25519, &verifier_config).expect("verifier")
        });
        let outcome = run_signer(&mut signer, &Ed25519, &config).expect("signer");

        assert!(outcome.passed, "outcome = {outcome:?}");
        assert!(handle.join().expect("verifier thread").passed);
    }

    #[test]
    fn wrong_size_key_is_skipped() {
        let (mut signer, mut verifier) = memory_pair(&PeerConfig::default(), None);
        signer.send(b"not a key").expect("send noise");

        let handle = thread::spawn(move || {
            run_signer(&mut signer, &Ed25519, &fast()).expect("signer")
        });
        let outcome = run_verifier(&mut verifier, &Ed25519, &fast()).expect("verifier");

        assert!(outcome.passed);
        assert!(handle.join().expect("signer thread").passed);
    }

    #[test]
    fn verifier_gives_up_on_silent_signer() {
        let (_signer, mut verifier) = memory_pair(&PeerConfig::default(), None);
        let config = RoundTripConfig {
            receive_timeout: Duration::from_millis(5),
            max_receive_attempts: Some(3),
            ..RoundTripConfig::default()
        };

        let outcome = run_verifier(&mut verifier, &Ed25519, &config).expect("verifier");
        assert_eq!(outcome.failure_reason, Some(FailureReason::Timeout));
    }

    #[test]
    fn signer_times_out_without_confirmation() {
        let (mut signer, _verifier) = memory_pair(&PeerConfig::default(), None);
        let config = RoundTripConfig {
            confirm_timeout: Duration::from_millis(20),
            ..RoundTripConfig::default()
        };

        let outcome = run_signer(&mut signer, &Ed25519, &config).expect("signer");
        assert_eq!(outcome.failure_reason, Some(FailureReason::Timeout));
    }

    #[test]
    fn signer_ignores_stray_handshake_frames() {
        let (mut signer, mut verifier) = memory_pair(&PeerConfig::default(), None);

        let handle = thread::spawn(move || {
            let pk = verifier.recv().expect("pk");
            let envelope = verifier.recv().expect("envelope");
            verifier.send(b"ready").expect("stray ready");
            verifier.send(b"ack").expect("stray ack");
            let message = Ed25519.open(&envelope.payload, &pk.payload).expect("open");
            verifier.send(&message).expect("confirm");
            verifier
        });

        let outcome = run_signer(&mut signer, &Ed25519, &fast()).expect("signer");
        let _verifier = handle.join().expect("verifier thread");
        assert!(outcome.passed);
    }

    #[test]
    fn disconnect_is_a_session_error() {
        let (signer, mut verifier) = memory_pair(&PeerConfig::default(), None);
        drop(signer);
        let result = run_verifier(&mut verifier, &Ed25519, &RoundTripConfig::default());
        assert!(matches!(result, Err(crate::PeerError::Disconnected(_))));
    }
}
