//! Canonical phase-pair identities.

use std::{
    fmt,
    hash::{Hash, Hasher},
};

use super::error::PairError;

const ORDERED_SEPARATOR: &str = "_to_";
const UNORDERED_SEPARATOR: char = '-';

/// Identity of a pair of phases.
///
/// An unordered key compares and hashes equal to its reverse, so
/// `PairKey::canonicalize("air", "water", false)` and
/// `PairKey::canonicalize("water", "air", false)` address the same entry of
/// any map keyed by `PairKey`.
/// An ordered key keeps its direction (`first` → `second`) and is never equal
/// to its reverse, nor to the unordered key over the same phases.
///
/// The declared argument order is retained for display either way.
///
/// ```
/// use twine_multiphase::models::multiphase::phase_system::PairKey;
///
/// assert_eq!(PairKey::unordered("air", "water"), PairKey::unordered("water", "air"));
/// assert_ne!(PairKey::ordered("air", "water"), PairKey::ordered("water", "air"));
///
/// let key: PairKey = "air_to_water".parse().unwrap();
/// assert_eq!(key, PairKey::ordered("air", "water"));
/// ```
#[derive(Debug, Clone, Eq)]
pub struct PairKey {
    first: String,
    second: String,
    ordered: bool,
}

impl PairKey {
    /// Creates a key over phases `a` and `b`.
    ///
    /// With `ordered = false` the result is independent of argument order.
    pub fn canonicalize(a: impl Into<String>, b: impl Into<String>, ordered: bool) -> Self {
        Self {
            first: a.into(),
            second: b.into(),
            ordered,
        }
    }

    /// Creates an unordered key.
    pub fn unordered(a: impl Into<String>, b: impl Into<String>) -> Self {
        Self::canonicalize(a, b, false)
    }

    /// Creates an ordered key directed from `from` to `to`.
    pub fn ordered(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::canonicalize(from, to, true)
    }

    /// Parses a pair specifier: `a-b` (unordered) or `a_to_b` (ordered).
    ///
    /// # Errors
    ///
    /// Returns [`PairError::MalformedSpecifier`] if the string does not name
    /// exactly two non-empty phases, or [`PairError::SelfPair`] if both
    /// names are the same.
    pub fn parse(specifier: &str) -> Result<Self, PairError> {
        let malformed = |reason| PairError::MalformedSpecifier {
            specifier: specifier.to_owned(),
            reason,
        };

        let trimmed = specifier.trim();
        let (first, second, ordered) =
            if let Some((first, second)) = trimmed.split_once(ORDERED_SEPARATOR) {
                (first, second, true)
            } else if let Some((first, second)) = trimmed.split_once(UNORDERED_SEPARATOR) {
                (first, second, false)
            } else {
                return Err(malformed("expected `a-b` or `a_to_b`"));
            };

        for name in [first, second] {
            if name.is_empty() {
                return Err(malformed("empty phase name"));
            }
            if name.contains(UNORDERED_SEPARATOR) || name.contains(ORDERED_SEPARATOR) {
                return Err(malformed("a pair names exactly two phases"));
            }
        }

        if first == second {
            return Err(PairError::SelfPair {
                phase: first.to_owned(),
            });
        }

        Ok(Self::canonicalize(first, second, ordered))
    }

    /// The first phase as declared (the source, for ordered keys).
    #[must_use]
    pub fn first(&self) -> &str {
        &self.first
    }

    /// The second phase as declared (the destination, for ordered keys).
    #[must_use]
    pub fn second(&self) -> &str {
        &self.second
    }

    #[must_use]
    pub fn is_ordered(&self) -> bool {
        self.ordered
    }

    /// Returns the unordered key over the same two phases.
    #[must_use]
    pub fn to_unordered(&self) -> Self {
        Self {
            ordered: false,
            ..self.clone()
        }
    }

    /// Returns the key with its phases swapped.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            first: self.second.clone(),
            second: self.first.clone(),
            ordered: self.ordered,
        }
    }

    /// True if `phase` is one of the two phases.
    #[must_use]
    pub fn involves(&self, phase: &str) -> bool {
        self.first == phase || self.second == phase
    }

    /// The two names in a direction-independent order for unordered keys.
    fn canonical_names(&self) -> (&str, &str) {
        if self.ordered || self.first <= self.second {
            (self.first.as_str(), self.second.as_str())
        } else {
            (self.second.as_str(), self.first.as_str())
        }
    }
}

impl PartialEq for PairKey {
    fn eq(&self, other: &Self) -> bool {
        self.ordered == other.ordered && self.canonical_names() == other.canonical_names()
    }
}

impl Hash for PairKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ordered.hash(state);
        self.canonical_names().hash(state);
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ordered {
            write!(f, "{}{ORDERED_SEPARATOR}{}", self.first, self.second)
        } else {
            write!(f, "{}{UNORDERED_SEPARATOR}{}", self.first, self.second)
        }
    }
}

impl std::str::FromStr for PairKey {
    type Err = PairError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A registered pair: the key plus the indices of both phases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairDescriptor {
    key: PairKey,
    first: usize,
    second: usize,
    name: String,
}

impl PairDescriptor {
    pub(super) fn new(key: PairKey, first: usize, second: usize) -> Self {
        let name = key.to_string();
        Self {
            key,
            first,
            second,
            name,
        }
    }

    #[must_use]
    pub fn key(&self) -> &PairKey {
        &self.key
    }

    /// Registration index of the first phase.
    #[must_use]
    pub fn first(&self) -> usize {
        self.first
    }

    /// Registration index of the second phase.
    #[must_use]
    pub fn second(&self) -> usize {
        self.second
    }

    /// Display name of the pair.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn is_ordered(&self) -> bool {
        self.key.ordered
    }

    /// Given one phase index of the pair, returns the other.
    #[must_use]
    pub fn other(&self, index: usize) -> Option<usize> {
        if index == self.first {
            Some(self.second)
        } else if index == self.second {
            Some(self.first)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashSet;

    #[test]
    fn unordered_keys_ignore_argument_order() {
        for (a, b) in [("air", "water"), ("water", "air"), ("solid", "oil")] {
            let forward = PairKey::canonicalize(a, b, false);
            let backward = PairKey::canonicalize(b, a, false);
            assert_eq!(forward, backward);

            let set: HashSet<_> = [forward, backward].into_iter().collect();
            assert_eq!(set.len(), 1);
        }
    }

    #[test]
    fn ordered_keys_keep_direction() {
        for (a, b) in [("air", "water"), ("water", "air")] {
            assert_ne!(
                PairKey::canonicalize(a, b, true),
                PairKey::canonicalize(b, a, true)
            );
        }
        assert_ne!(
            PairKey::ordered("air", "water"),
            PairKey::unordered("air", "water")
        );
    }

    #[test]
    fn unordered_form_of_ordered_key() {
        let key = PairKey::ordered("air", "water");
        assert_eq!(key.to_unordered(), PairKey::unordered("water", "air"));
        assert_eq!(key.reversed(), PairKey::ordered("water", "air"));
        assert!(key.involves("air") && !key.involves("oil"));
    }

    #[test]
    fn parses_specifiers() {
        assert_eq!(
            PairKey::parse("air-water").unwrap(),
            PairKey::unordered("air", "water")
        );
        assert_eq!(
            PairKey::parse(" steam_to_water ").unwrap(),
            PairKey::ordered("steam", "water")
        );
        assert_eq!(PairKey::ordered("a", "b").to_string(), "a_to_b");
        assert_eq!(PairKey::unordered("b", "a").to_string(), "b-a");
    }

    #[test]
    fn rejects_malformed_specifiers() {
        for specifier in ["air", "-water", "air_to_", "a-b-c", "a_to_b-c", ""] {
            assert!(
                matches!(
                    PairKey::parse(specifier),
                    Err(PairError::MalformedSpecifier { .. })
                ),
                "`{specifier}` should be rejected"
            );
        }
        assert_eq!(
            PairKey::parse("air-air"),
            Err(PairError::SelfPair {
                phase: "air".into()
            })
        );
    }
}
