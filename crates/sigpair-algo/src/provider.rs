use bytes::Bytes;

use crate::descriptor::{AlgorithmDescriptor, Keypair};
use crate::envelope::SignedEnvelope;
use crate::error::{AlgorithmError, Result};

/// Capability interface for one signature scheme.
///
/// Implementations are stateless apart from their descriptor; keys travel as
/// raw bytes so they can go over the wire unchanged.
pub trait SignatureAlgorithm: Send + Sync {
    fn descriptor(&self) -> &AlgorithmDescriptor;

    fn keygen(&self) -> Result<Keypair>;

    /// Detached signature over `message`.
    fn sign(&self, message: &[u8], secret_key: &[u8]) -> Result<Vec<u8>>;

    /// `Ok(())` only when `signature` is valid for `message` under `public_key`.
    fn verify(&self, message: &[u8], signature: &[u8], public_key: &[u8]) -> Result<()>;

    /// Sign `message` and wrap it in an envelope.
    fn sign_envelope(&self, message: &[u8], secret_key: &[u8]) -> Result<SignedEnvelope> {
        let signature = self.sign(message, secret_key)?;
        Ok(SignedEnvelope::new(Bytes::copy_from_slice(message), signature))
    }

    /// Decode an envelope, verify it and hand back the recovered message.
    fn open(&self, envelope: &Bytes, public_key: &[u8]) -> Result<Bytes> {
        let SignedEnvelope { message, signature } = SignedEnvelope::decode(envelope)?;
        self.verify(&message, &signature, public_key)?;
        Ok(message)
    }

    fn name(&self) -> &'static str {
        self.descriptor().name
    }
}

/// Check a key or signature length against the descriptor.
pub(crate) fn expect_len(
    descriptor: &AlgorithmDescriptor,
    what: &'static str,
    expected: usize,
    actual: usize,
) -> Result<()> {
    if expected == actual {
        return Ok(());
    }
    Err(AlgorithmError::InvalidLength {
        algorithm: descriptor.name,
        what,
        expected,
        actual,
    })
}
