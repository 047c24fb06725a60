//! Deduplicating table of phase pairs.

use std::collections::HashMap;

use super::{
    error::PairError,
    pair::{PairDescriptor, PairKey},
};

/// Table of pair descriptors keyed by [`PairKey`].
///
/// Holds at most one descriptor per canonical key: requesting `b-a` after
/// `a-b` finds the existing entry.
/// Descriptors are kept in insertion order so iteration is deterministic.
#[derive(Debug, Clone, PartialEq)]
pub struct PairRegistry {
    phases: Vec<String>,
    phase_index: HashMap<String, usize>,
    pairs: Vec<PairDescriptor>,
    lookup: HashMap<PairKey, usize>,
}

impl PairRegistry {
    /// Creates an empty registry over the given phase identifiers.
    ///
    /// # Errors
    ///
    /// Returns [`PairError::DuplicatePhase`] if an identifier appears twice.
    pub fn new<S: Into<String>>(phases: impl IntoIterator<Item = S>) -> Result<Self, PairError> {
        let phases: Vec<String> = phases.into_iter().map(Into::into).collect();

        let mut phase_index = HashMap::with_capacity(phases.len());
        for (index, name) in phases.iter().enumerate() {
            if phase_index.insert(name.clone(), index).is_some() {
                return Err(PairError::DuplicatePhase {
                    phase: name.clone(),
                });
            }
        }

        Ok(Self {
            phases,
            phase_index,
            pairs: Vec::new(),
            lookup: HashMap::new(),
        })
    }

    /// Registered phase identifiers in registration order.
    #[must_use]
    pub fn phase_names(&self) -> &[String] {
        &self.phases
    }

    /// Returns the registration index of a phase.
    ///
    /// # Errors
    ///
    /// Returns [`PairError::UnknownPhase`] if the phase is not registered.
    pub fn phase_index(&self, phase: &str) -> Result<usize, PairError> {
        self.phase_index
            .get(phase)
            .copied()
            .ok_or_else(|| PairError::UnknownPhase {
                phase: phase.to_owned(),
            })
    }

    /// Resolves both phases of a key to their registration indices.
    ///
    /// # Errors
    ///
    /// Returns [`PairError::UnknownPhase`] if either phase is not registered,
    /// or [`PairError::SelfPair`] if both sides name the same phase.
    pub fn resolve(&self, key: &PairKey) -> Result<(usize, usize), PairError> {
        let first = self.phase_index(key.first())?;
        let second = self.phase_index(key.second())?;
        if first == second {
            return Err(PairError::SelfPair {
                phase: key.first().to_owned(),
            });
        }
        Ok((first, second))
    }

    /// Returns the registered descriptor for `key`, or a fresh unregistered
    /// one if the key has not been generated yet.
    ///
    /// # Errors
    ///
    /// Returns a [`PairError`] if the key cannot be resolved.
    pub fn describe(&self, key: &PairKey) -> Result<PairDescriptor, PairError> {
        if let Some(existing) = self.get(key) {
            return Ok(existing.clone());
        }
        let (first, second) = self.resolve(key)?;
        Ok(PairDescriptor::new(key.clone(), first, second))
    }

    /// Inserts a descriptor for every requested key not already present.
    ///
    /// Keys that already exist (in either argument order, for unordered keys)
    /// are left untouched, so repeating a call with the same keys is a no-op.
    /// Every key is resolved before anything is inserted: on error the
    /// registry is unchanged.
    ///
    /// Returns the number of newly inserted pairs.
    ///
    /// # Errors
    ///
    /// Returns a [`PairError`] if any key references an unknown phase.
    pub fn generate_pairs<'k>(
        &mut self,
        keys: impl IntoIterator<Item = &'k PairKey>,
    ) -> Result<usize, PairError> {
        let resolved = keys
            .into_iter()
            .map(|key| self.resolve(key).map(|(first, second)| (key, first, second)))
            .collect::<Result<Vec<_>, _>>()?;

        let mut inserted = 0;
        for (key, first, second) in resolved {
            if self.lookup.contains_key(key) {
                continue;
            }
            log::debug!("generating phase pair `{key}`");
            self.lookup.insert(key.clone(), self.pairs.len());
            self.pairs
                .push(PairDescriptor::new(key.clone(), first, second));
            inserted += 1;
        }

        Ok(inserted)
    }

    /// Returns the descriptor registered for `key`.
    #[must_use]
    pub fn get(&self, key: &PairKey) -> Option<&PairDescriptor> {
        self.lookup.get(key).map(|&index| &self.pairs[index])
    }

    #[must_use]
    pub fn contains(&self, key: &PairKey) -> bool {
        self.lookup.contains_key(key)
    }

    /// Number of registered pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Registered descriptors in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &PairDescriptor> {
        self.pairs.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> PairRegistry {
        PairRegistry::new(["air", "water", "solid"]).unwrap()
    }

    #[test]
    fn deduplicates_swapped_unordered_keys() {
        let mut pairs = registry();
        let keys = [
            PairKey::unordered("air", "water"),
            PairKey::unordered("water", "air"),
            PairKey::ordered("air", "water"),
            PairKey::ordered("water", "air"),
        ];

        assert_eq!(pairs.generate_pairs(&keys).unwrap(), 3);
        assert_eq!(pairs.len(), 3);

        let descriptor = pairs.get(&PairKey::unordered("water", "air")).unwrap();
        assert_eq!((descriptor.first(), descriptor.second()), (0, 1));
        assert_eq!(descriptor.name(), "air-water");
    }

    #[test]
    fn generation_is_idempotent() {
        let keys = [
            PairKey::unordered("air", "solid"),
            PairKey::ordered("water", "air"),
        ];

        let mut once = registry();
        once.generate_pairs(&keys).unwrap();

        let mut twice = registry();
        twice.generate_pairs(&keys).unwrap();
        assert_eq!(twice.generate_pairs(&keys).unwrap(), 0);

        assert_eq!(once, twice);
    }

    #[test]
    fn unknown_phase_leaves_registry_unchanged() {
        let mut pairs = registry();
        pairs
            .generate_pairs(&[PairKey::unordered("air", "water")])
            .unwrap();
        let before = pairs.clone();

        let result = pairs.generate_pairs(&[
            PairKey::unordered("air", "solid"),
            PairKey::unordered("air", "oil"),
        ]);

        assert_eq!(
            result,
            Err(PairError::UnknownPhase {
                phase: "oil".into()
            })
        );
        assert_eq!(pairs, before);
    }

    #[test]
    fn rejects_duplicate_phases() {
        assert_eq!(
            PairRegistry::new(["air", "air"]),
            Err(PairError::DuplicatePhase {
                phase: "air".into()
            })
        );
    }

    #[test]
    fn describe_does_not_register() {
        let pairs = registry();
        let descriptor = pairs.describe(&PairKey::ordered("solid", "air")).unwrap();
        assert_eq!((descriptor.first(), descriptor.second()), (2, 0));
        assert!(pairs.is_empty());
    }
}
