use std::sync::Arc;

use tracing::debug;

use crate::descriptor::{normalize_name, AlgorithmDescriptor, AlgorithmId};
use crate::ed25519::Ed25519;
use crate::error::{AlgorithmError, Result};
use crate::provider::SignatureAlgorithm;

/// Ordered table of signature providers.
///
/// Iteration order is registration order, which is the catalogue order both
/// devices walk through.
#[derive(Clone, Default)]
pub struct AlgorithmRegistry {
    entries: Vec<Arc<dyn SignatureAlgorithm>>,
}

impl AlgorithmRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a provider. Ids and names must be unique.
    pub fn register(&mut self, algorithm: impl SignatureAlgorithm + 'static) -> Result<()> {
        self.register_arc(Arc::new(algorithm))
    }

    pub fn register_arc(&mut self, algorithm: Arc<dyn SignatureAlgorithm>) -> Result<()> {
        let descriptor = algorithm.descriptor();
        if self.get(descriptor.id).is_some() || self.by_name(descriptor.name).is_some() {
            return Err(AlgorithmError::Duplicate(format!(
                "{} (id {})",
                descriptor.name, descriptor.id
            )));
        }
        debug!(algorithm = descriptor.name, id = descriptor.id.0, "registered algorithm");
        self.entries.push(algorithm);
        Ok(())
    }

    pub fn get(&self, id: AlgorithmId) -> Option<&Arc<dyn SignatureAlgorithm>> {
        self.entries.iter().find(|a| a.descriptor().id == id)
    }

    /// Case-insensitive lookup; `-` and `_` are interchangeable.
    pub fn by_name(&self, name: &str) -> Option<&Arc<dyn SignatureAlgorithm>> {
        let wanted = normalize_name(name);
        self.entries
            .iter()
            .find(|a| normalize_name(a.descriptor().name) == wanted)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn SignatureAlgorithm>> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn descriptors(&self) -> Vec<AlgorithmDescriptor> {
        self.entries.iter().map(|a| a.descriptor().clone()).collect()
    }

    /// Keep only the named algorithms, preserving registry order.
    ///
    /// Every name must resolve; an unknown name is an error rather than a
    /// silently shorter catalogue.
    pub fn filtered<S: AsRef<str>>(&self, names: &[S]) -> Result<Self> {
        let mut wanted = Vec::with_capacity(names.len());
        for name in names {
            let algorithm = self
                .by_name(name.as_ref())
                .ok_or_else(|| AlgorithmError::UnknownAlgorithm(name.as_ref().to_string()))?;
            wanted.push(algorithm.descriptor().id);
        }

        Ok(Self {
            entries: self
                .entries
                .iter()
                .filter(|a| wanted.contains(&a.descriptor().id))
                .cloned()
                .collect(),
        })
    }
}

impl std::fmt::Debug for AlgorithmRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|a| a.descriptor().name))
            .finish()
    }
}

/// Every provider compiled into this build, in catalogue order.
pub fn default_registry() -> AlgorithmRegistry {
    let mut entries: Vec<Arc<dyn SignatureAlgorithm>> = Vec::new();
    #[cfg(feature = "mldsa")]
    {
        entries.push(Arc::new(crate::mldsa::MlDsa44Provider));
        entries.push(Arc::new(crate::mldsa::MlDsa65Provider));
        entries.push(Arc::new(crate::mldsa::MlDsa87Provider));
    }
    entries.push(Arc::new(Ed25519));
    AlgorithmRegistry { entries }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_contains_ed25519() {
        let registry = default_registry();
        assert!(registry.get(AlgorithmId::ED25519).is_some());
        assert_eq!(
            registry.by_name("ed25519").unwrap().descriptor().id,
            AlgorithmId::ED25519
        );
    }

    #[cfg(feature = "mldsa")]
    #[test]
    fn mldsa_precedes_ed25519() {
        let names: Vec<_> = default_registry().descriptors().iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["ML_DSA_44", "ML_DSA_65", "ML_DSA_87", "ED25519"]);
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = AlgorithmRegistry::new();
        registry.register(Ed25519).unwrap();
        assert!(matches!(
            registry.register(Ed25519),
            Err(AlgorithmError::Duplicate(_))
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn unknown_name_in_filter_is_an_error() {
        let err = default_registry().filtered(&["ED25519", "RSA"]).unwrap_err();
        assert!(matches!(err, AlgorithmError::UnknownAlgorithm(name) if name == "RSA"));
    }

    #[cfg(feature = "mldsa")]
    #[test]
    fn filter_keeps_registry_order() {
        let filtered = default_registry()
            .filtered(&["ed25519", "ml-dsa-44"])
            .unwrap();
        let names: Vec<_> = filtered.descriptors().iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["ML_DSA_44", "ED25519"]);
    }

    #[test]
    fn empty_filter_gives_empty_catalogue() {
        let filtered = default_registry().filtered::<&str>(&[]).unwrap();
        assert!(filtered.is_empty());
    }
}
