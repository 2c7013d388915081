use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use rand_core::{OsRng, RngCore};

use crate::descriptor::{AlgorithmDescriptor, AlgorithmId, Keypair};
use crate::error::{AlgorithmError, Result};
use crate::provider::{expect_len, SignatureAlgorithm};

static DESCRIPTOR: AlgorithmDescriptor = AlgorithmDescriptor {
    id: AlgorithmId::ED25519,
    name: "ED25519",
    public_key_len: 32,
    secret_key_len: 32,
    signature_len: 64,
};

/// Ed25519 with the 32-byte seed as the secret key.
#[derive(Debug, Default, Clone, Copy)]
pub struct Ed25519;

impl Ed25519 {
    fn signing_key(secret_key: &[u8]) -> Result<SigningKey> {
        expect_len(&DESCRIPTOR, "secret key", DESCRIPTOR.secret_key_len, secret_key.len())?;
        let mut seed = [0u8; 32];
        seed.copy_from_slice(secret_key);
        Ok(SigningKey::from_bytes(&seed))
    }
}

impl SignatureAlgorithm for Ed25519 {
    fn descriptor(&self) -> &AlgorithmDescriptor {
        &DESCRIPTOR
    }

    fn keygen(&self) -> Result<Keypair> {
        let mut seed = [0u8; 32];
        OsRng
            .try_fill_bytes(&mut seed)
            .map_err(|err| AlgorithmError::Keygen {
                algorithm: DESCRIPTOR.name,
                reason: err.to_string(),
            })?;
        let signing_key = SigningKey::from_bytes(&seed);
        Ok(Keypair {
            public_key: signing_key.verifying_key().to_bytes().to_vec(),
            secret_key: seed.to_vec(),
        })
    }

    fn sign(&self, message: &[u8], secret_key: &[u8]) -> Result<Vec<u8>> {
        let signing_key = Self::signing_key(secret_key)?;
        Ok(signing_key.sign(message).to_bytes().to_vec())
    }

    fn verify(&self, message: &[u8], signature: &[u8], public_key: &[u8]) -> Result<()> {
        expect_len(&DESCRIPTOR, "public key", DESCRIPTOR.public_key_len, public_key.len())?;
        expect_len(&DESCRIPTOR, "signature", DESCRIPTOR.signature_len, signature.len())?;

        let mut key = [0u8; 32];
        key.copy_from_slice(public_key);
        let verifying_key = VerifyingKey::from_bytes(&key).map_err(|_| AlgorithmError::InvalidKey {
            algorithm: DESCRIPTOR.name,
            what: "public key",
        })?;
        let signature = Signature::from_slice(signature).map_err(|_| {
            AlgorithmError::VerificationFailed {
                algorithm: DESCRIPTOR.name,
            }
        })?;

        verifying_key
            .verify_strict(message, &signature)
            .map_err(|_| AlgorithmError::VerificationFailed {
                algorithm: DESCRIPTOR.name,
            })
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    #[test]
    fn sizes_match_descriptor() {
        let keypair = Ed25519.keygen().unwrap();
        assert_eq!(keypair.public_key.len(), 32);
        assert_eq!(keypair.secret_key.len(), 32);

        let signature = Ed25519.sign(b"msg", &keypair.secret_key).unwrap();
        assert_eq!(signature.len(), Ed25519.descriptor().signature_len);
    }

    #[test]
    fn open_recovers_message() {
        let keypair = Ed25519.keygen().unwrap();
        let envelope = Ed25519
            .sign_envelope(b"Test message for DSA", &keypair.secret_key)
            .unwrap();
        let wire = envelope.encode().unwrap();

        let message = Ed25519.open(&wire, &keypair.public_key).unwrap();
        assert_eq!(message.as_ref(), b"Test message for DSA");
    }

    #[test]
    fn rejects_other_message() {
        let keypair = Ed25519.keygen().unwrap();
        let signature = Ed25519.sign(b"original", &keypair.secret_key).unwrap();
        let err = Ed25519
            .verify(b"tampered", &signature, &keypair.public_key)
            .unwrap_err();
        assert!(matches!(err, AlgorithmError::VerificationFailed { .. }));
    }

    #[test]
    fn rejects_other_keypair() {
        let signer = Ed25519.keygen().unwrap();
        let other = Ed25519.keygen().unwrap();
        let signature = Ed25519.sign(b"msg", &signer.secret_key).unwrap();
        assert!(Ed25519.verify(b"msg", &signature, &other.public_key).is_err());
    }

    #[test]
    fn wrong_key_length_is_reported() {
        let err = Ed25519.sign(b"msg", &[0u8; 16]).unwrap_err();
        assert!(matches!(
            err,
            AlgorithmError::InvalidLength {
                expected: 32,
                actual: 16,
                ..
            }
        ));
    }

    #[test]
    fn truncated_signature_in_envelope_fails_open() {
        let keypair = Ed25519.keygen().unwrap();
        let wire = Ed25519
            .sign_envelope(b"msg", &keypair.secret_key)
            .unwrap()
            .encode()
            .unwrap();
        let truncated = Bytes::copy_from_slice(&wire[..wire.len() - 1]);
        assert!(Ed25519.open(&truncated, &keypair.public_key).is_err());
    }
}
