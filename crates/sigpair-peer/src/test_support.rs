//! Deliberately broken providers for catalogue tests.

use std::sync::Arc;

use sigpair_algo::{
    AlgorithmDescriptor, AlgorithmError, AlgorithmId, AlgorithmRegistry, Ed25519, Keypair,
    Result, SignatureAlgorithm,
};

pub(crate) fn catalogue(algorithms: Vec<Box<dyn SignatureAlgorithm>>) -> AlgorithmRegistry {
    let mut registry = AlgorithmRegistry::new();
    for algorithm in algorithms {
        registry
            .register_arc(Arc::from(algorithm))
            .expect("test catalogue ids are unique");
    }
    registry
}

fn ed25519_sized(id: u16, name: &'static str) -> AlgorithmDescriptor {
    AlgorithmDescriptor {
        id: AlgorithmId(id),
        name,
        ..Ed25519.descriptor().clone()
    }
}

/// Ed25519 under another id and name.
pub(crate) struct Renamed {
    descriptor: AlgorithmDescriptor,
}

impl Renamed {
    pub(crate) fn new(id: AlgorithmId, name: &'static str) -> Self {
        Self {
            descriptor: ed25519_sized(id.0, name),
        }
    }
}

impl SignatureAlgorithm for Renamed {
    fn descriptor(&self) -> &AlgorithmDescriptor {
        &self.descriptor
    }

    fn keygen(&self) -> Result<Keypair> {
        Ed25519.keygen()
    }

    fn sign(&self, message: &[u8], secret_key: &[u8]) -> Result<Vec<u8>> {
        Ed25519.sign(message, secret_key)
    }

    fn verify(&self, message: &[u8], signature: &[u8], public_key: &[u8]) -> Result<()> {
        Ed25519.verify(message, signature, public_key)
    }
}

/// Keygen always fails.
pub(crate) struct FailingKeygen;

impl SignatureAlgorithm for FailingKeygen {
    fn descriptor(&self) -> &AlgorithmDescriptor {
        static DESCRIPTOR: std::sync::OnceLock<AlgorithmDescriptor> = std::sync::OnceLock::new();
        DESCRIPTOR.get_or_init(|| ed25519_sized(901, "FAILING_KEYGEN"))
    }

    fn keygen(&self) -> Result<Keypair> {
        Err(AlgorithmError::Keygen {
            algorithm: "FAILING_KEYGEN",
            reason: "entropy source unavailable".to_string(),
        })
    }

    fn sign(&self, message: &[u8], secret_key: &[u8]) -> Result<Vec<u8>> {
        Ed25519.sign(message, secret_key)
    }

    fn verify(&self, message: &[u8], signature: &[u8], public_key: &[u8]) -> Result<()> {
        Ed25519.verify(message, signature, public_key)
    }
}

/// Produces signatures with the first byte flipped.
pub(crate) struct CorruptSignature;

impl SignatureAlgorithm for CorruptSignature {
    fn descriptor(&self) -> &AlgorithmDescriptor {
        static DESCRIPTOR: std::sync::OnceLock<AlgorithmDescriptor> = std::sync::OnceLock::new();
        DESCRIPTOR.get_or_init(|| ed25519_sized(903, "CORRUPT_SIGNATURE"))
    }

    fn keygen(&self) -> Result<Keypair> {
        Ed25519.keygen()
    }

    fn sign(&self, message: &[u8], secret_key: &[u8]) -> Result<Vec<u8>> {
        let mut signature = Ed25519.sign(message, secret_key)?;
        signature[0] ^= 0xFF;
        Ok(signature)
    }

    fn verify(&self, message: &[u8], signature: &[u8], public_key: &[u8]) -> Result<()> {
        Ed25519.verify(message, signature, public_key)
    }
}

/// Ed25519 with the signature padded by `WIDE_PADDING` zero bytes, standing in
/// for algorithms whose signatures are several kilobytes.
pub(crate) struct WideSignature;

pub(crate) const WIDE_PADDING: usize = 4096;

impl SignatureAlgorithm for WideSignature {
    fn descriptor(&self) -> &AlgorithmDescriptor {
        static DESCRIPTOR: std::sync::OnceLock<AlgorithmDescriptor> = std::sync::OnceLock::new();
        DESCRIPTOR.get_or_init(|| AlgorithmDescriptor {
            signature_len: Ed25519.descriptor().signature_len + WIDE_PADDING,
            ..ed25519_sized(904, "WIDE_SIGNATURE")
        })
    }

    fn keygen(&self) -> Result<Keypair> {
        Ed25519.keygen()
    }

    fn sign(&self, message: &[u8], secret_key: &[u8]) -> Result<Vec<u8>> {
        let mut signature = Ed25519.sign(message, secret_key)?;
        signature.resize(self.descriptor().signature_len, 0);
        Ok(signature)
    }

    fn verify(&self, message: &[u8], signature: &[u8], public_key: &[u8]) -> Result<()> {
        let expected = self.descriptor().signature_len;
        if signature.len() != expected {
            return Err(AlgorithmError::InvalidLength {
                algorithm: "WIDE_SIGNATURE",
                what: "signature",
                expected,
                actual: signature.len(),
            });
        }
        Ed25519.verify(message, &signature[..expected - WIDE_PADDING], public_key)
    }
}
