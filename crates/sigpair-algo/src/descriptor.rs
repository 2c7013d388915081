use serde::Serialize;

/// Stable numeric algorithm identifier.
///
/// Both devices must agree on ids and order, so values are fixed once
/// assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct AlgorithmId(pub u16);

impl AlgorithmId {
    pub const ML_DSA_44: Self = Self(4);
    pub const ML_DSA_65: Self = Self(5);
    pub const ML_DSA_87: Self = Self(6);
    pub const ED25519: Self = Self(100);
}

impl std::fmt::Display for AlgorithmId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fixed sizes and name of one algorithm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlgorithmDescriptor {
    pub id: AlgorithmId,
    pub name: &'static str,
    pub public_key_len: usize,
    pub secret_key_len: usize,
    pub signature_len: usize,
}

/// A freshly generated key pair.
#[derive(Clone)]
pub struct Keypair {
    pub public_key: Vec<u8>,
    pub secret_key: Vec<u8>,
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keypair")
            .field("public_key_len", &self.public_key.len())
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// Normalise an algorithm name for lookups: `ml-dsa-65` and `ML_DSA_65` match.
pub(crate) fn normalize_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| if c == '-' { '_' } else { c.to_ascii_uppercase() })
        .collect()
}
