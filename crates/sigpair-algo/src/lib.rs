//! Signature algorithm providers for the sigpair interop rig.
//!
//! Each scheme is a [`SignatureAlgorithm`] with fixed key and signature
//! sizes. An [`AlgorithmRegistry`] holds them in catalogue order; both
//! devices must build the same registry to stay in step.

pub mod descriptor;
pub mod ed25519;
pub mod envelope;
pub mod error;
#[cfg(feature = "mldsa")]
pub mod mldsa;
pub mod outcome;
pub mod provider;
pub mod registry;
pub mod selftest;

pub use descriptor::{AlgorithmDescriptor, AlgorithmId, Keypair};
pub use ed25519::Ed25519;
pub use envelope::SignedEnvelope;
pub use error::{AlgorithmError, Result};
#[cfg(feature = "mldsa")]
pub use mldsa::{MlDsa44Provider, MlDsa65Provider, MlDsa87Provider};
pub use outcome::{FailureReason, TestOutcome};
pub use provider::SignatureAlgorithm;
pub use registry::{default_registry, AlgorithmRegistry};
pub use selftest::{self_test, self_test_all};
