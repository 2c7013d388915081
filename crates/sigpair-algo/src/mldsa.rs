//! ML-DSA (FIPS 204) providers at all three security levels.

use ml_dsa::signature::{Signer, Verifier};
use ml_dsa::{
    EncodedSigningKey, EncodedVerifyingKey, KeyGen, MlDsa44, MlDsa65, MlDsa87, Signature,
    SigningKey, VerifyingKey,
};
use rand_core::OsRng;

use crate::descriptor::{AlgorithmDescriptor, AlgorithmId, Keypair};
use crate::error::{AlgorithmError, Result};
use crate::provider::{expect_len, SignatureAlgorithm};

macro_rules! ml_dsa_provider {
    ($ty:ident, $params:ty, $id:expr, $name:literal, $pk:literal, $sk:literal, $sig:literal) => {
        #[doc = concat!("`", $name, "` provider.")]
        #[derive(Debug, Default, Clone, Copy)]
        pub struct $ty;

        impl $ty {
            const DESCRIPTOR: AlgorithmDescriptor = AlgorithmDescriptor {
                id: $id,
                name: $name,
                public_key_len: $pk,
                secret_key_len: $sk,
                signature_len: $sig,
            };
        }

        impl SignatureAlgorithm for $ty {
            fn descriptor(&self) -> &AlgorithmDescriptor {
                static DESCRIPTOR: AlgorithmDescriptor = $ty::DESCRIPTOR;
                &DESCRIPTOR
            }

            fn keygen(&self) -> Result<Keypair> {
                let keypair = <$params>::key_gen(&mut OsRng);
                let public_key = keypair.verifying_key().encode();
                let secret_key = keypair.signing_key().encode();
                Ok(Keypair {
                    public_key: AsRef::<[u8]>::as_ref(&public_key).to_vec(),
                    secret_key: AsRef::<[u8]>::as_ref(&secret_key).to_vec(),
                })
            }

            fn sign(&self, message: &[u8], secret_key: &[u8]) -> Result<Vec<u8>> {
                let d = self.descriptor();
                expect_len(d, "secret key", d.secret_key_len, secret_key.len())?;
                let encoded = EncodedSigningKey::<$params>::try_from(secret_key).map_err(|_| {
                    AlgorithmError::InvalidKey {
                        algorithm: d.name,
                        what: "secret key",
                    }
                })?;
                let signing_key = SigningKey::<$params>::decode(&encoded);
                let signature: Signature<$params> =
                    signing_key.try_sign(message).map_err(|err| AlgorithmError::Sign {
                        algorithm: d.name,
                        reason: err.to_string(),
                    })?;
                let encoded = signature.encode();
                Ok(AsRef::<[u8]>::as_ref(&encoded).to_vec())
            }

            fn verify(&self, message: &[u8], signature: &[u8], public_key: &[u8]) -> Result<()> {
                let d = self.descriptor();
                expect_len(d, "public key", d.public_key_len, public_key.len())?;
                expect_len(d, "signature", d.signature_len, signature.len())?;

                let encoded = EncodedVerifyingKey::<$params>::try_from(public_key).map_err(|_| {
                    AlgorithmError::InvalidKey {
                        algorithm: d.name,
                        what: "public key",
                    }
                })?;
                let verifying_key = VerifyingKey::<$params>::decode(&encoded);
                let failed = || AlgorithmError::VerificationFailed { algorithm: d.name };
                let signature = Signature::<$params>::try_from(signature).map_err(|_| failed())?;
                verifying_key
                    .verify(message, &signature)
                    .map_err(|_| failed())
            }
        }
    };
}

ml_dsa_provider!(MlDsa44Provider, MlDsa44, AlgorithmId::ML_DSA_44, "ML_DSA_44", 1312, 2560, 2420);
ml_dsa_provider!(MlDsa65Provider, MlDsa65, AlgorithmId::ML_DSA_65, "ML_DSA_65", 1952, 4032, 3309);
ml_dsa_provider!(MlDsa87Provider, MlDsa87, AlgorithmId::ML_DSA_87, "ML_DSA_87", 2592, 4896, 4627);
