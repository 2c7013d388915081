//! Single-device sanity check: both halves of the round trip run locally.

use tracing::{info, warn};

use crate::error::AlgorithmError;
use crate::outcome::{FailureReason, TestOutcome};
use crate::provider::SignatureAlgorithm;
use crate::registry::AlgorithmRegistry;

/// Keygen, sign an envelope over `message`, open it and compare.
///
/// Also checks that the signature does not verify for a different message.
pub fn self_test(algorithm: &dyn SignatureAlgorithm, message: &[u8]) -> TestOutcome {
    let descriptor = algorithm.descriptor();
    let fail = |reason: FailureReason, err: &dyn std::fmt::Display| {
        warn!(algorithm = descriptor.name, %reason, error = %err, "self-test failed");
        TestOutcome::fail(descriptor, reason)
    };

    let keypair = match algorithm.keygen() {
        Ok(keypair) => keypair,
        Err(err) => return fail(FailureReason::KeygenFailed, &err),
    };
    let envelope = match algorithm
        .sign_envelope(message, &keypair.secret_key)
        .and_then(|envelope| envelope.encode())
    {
        Ok(envelope) => envelope,
        Err(err) => return fail(FailureReason::SignFailed, &err),
    };
    let recovered = match algorithm.open(&envelope, &keypair.public_key) {
        Ok(recovered) => recovered,
        Err(err @ AlgorithmError::MalformedEnvelope(_)) => {
            return fail(FailureReason::MalformedEnvelope, &err)
        }
        Err(err) => return fail(FailureReason::VerifyFailed, &err),
    };
    if recovered.as_ref() != message {
        return fail(FailureReason::RoundTripMismatch, &"recovered message differs");
    }

    let mut other = message.to_vec();
    other.push(0x01);
    let signature = &envelope[2 + message.len()..];
    if algorithm.verify(&other, signature, &keypair.public_key).is_ok() {
        return fail(
            FailureReason::VerifyFailed,
            &"signature verified for a different message",
        );
    }

    info!(algorithm = descriptor.name, "self-test passed");
    TestOutcome::pass(descriptor)
}

/// [`self_test`] over every algorithm, in registry order.
pub fn self_test_all(registry: &AlgorithmRegistry, message: &[u8]) -> Vec<TestOutcome> {
    registry
        .iter()
        .map(|algorithm| self_test(algorithm.as_ref(), message))
        .collect()
}
