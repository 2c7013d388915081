use serde::Serialize;

use crate::descriptor::{AlgorithmDescriptor, AlgorithmId};

/// Why an algorithm did not pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    KeygenFailed,
    SignFailed,
    VerifyFailed,
    /// The envelope could not be split into message and signature.
    MalformedEnvelope,
    /// The confirmation differed from the test message.
    RoundTripMismatch,
    Timeout,
    /// The other side reported a failure with the `failed` sentinel.
    PeerFailed,
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::KeygenFailed => "keygen failed",
            Self::SignFailed => "sign failed",
            Self::VerifyFailed => "verify failed",
            Self::MalformedEnvelope => "malformed envelope",
            Self::RoundTripMismatch => "round-trip mismatch",
            Self::Timeout => "timeout",
            Self::PeerFailed => "peer reported failure",
        };
        f.write_str(s)
    }
}

/// Result of one algorithm in one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestOutcome {
    pub algorithm_id: AlgorithmId,
    pub algorithm: &'static str,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<FailureReason>,
}

impl TestOutcome {
    pub fn pass(descriptor: &AlgorithmDescriptor) -> Self {
        Self {
            algorithm_id: descriptor.id,
            algorithm: descriptor.name,
            passed: true,
            failure_reason: None,
        }
    }

    pub fn fail(descriptor: &AlgorithmDescriptor, reason: FailureReason) -> Self {
        Self {
            algorithm_id: descriptor.id,
            algorithm: descriptor.name,
            passed: false,
            failure_reason: Some(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> AlgorithmDescriptor {
        AlgorithmDescriptor {
            id: AlgorithmId(7),
            name: "TEST",
            public_key_len: 1,
            secret_key_len: 1,
            signature_len: 1,
        }
    }

    #[test]
    fn passed_outcome_omits_reason() {
        let json = serde_json::to_value(TestOutcome::pass(&descriptor())).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"algorithm_id": 7, "algorithm": "TEST", "passed": true})
        );
    }

    #[test]
    fn failure_reason_is_snake_case() {
        let outcome = TestOutcome::fail(&descriptor(), FailureReason::RoundTripMismatch);
        let json = serde_json::to_value(outcome).unwrap();
        assert_eq!(json["failure_reason"], "round_trip_mismatch");
        assert_eq!(json["passed"], false);
    }
}
