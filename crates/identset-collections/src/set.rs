//! A mutable collection of unique elements keyed by structural identity.
//!
//! Membership is decided by a digest computed from each value, not by
//! `Eq`/`Hash`. Two values whose identities match collapse into one entry;
//! the first one stored is kept and its occurrence count grows.

use std::fmt;

use identset_canonical::{Canonical, Digest, IdentityEngine, IdentityError};
use indexmap::IndexMap;
use serde::{Serialize, Serializer};

use crate::error::SetError;
use crate::identify::Identify;

#[derive(Debug, Clone)]
struct Entry<T> {
    value: T,
    occurrences: u64,
}

/// Unique-element set keyed by identity digests.
///
/// Elements are exported in first-insertion order. The set is not
/// synchronized; wrap it in a lock to share it between threads.
#[derive(Clone)]
pub struct Set<T, I = IdentityEngine> {
    entries: IndexMap<Digest, Entry<T>>,
    identity: I,
}

impl<T: Canonical> Set<T, IdentityEngine> {
    /// Empty set using the default identity engine.
    pub fn new() -> Self {
        Self::with_identity(IdentityEngine::default())
    }

    /// Set containing `values`, using the default identity engine.
    pub fn from_values<V>(values: V) -> Result<Self, IdentityError>
    where
        V: IntoIterator<Item = T>,
    {
        let mut set = Self::new();
        set.add(values)?;
        Ok(set)
    }
}

impl<T: Canonical> Default for Set<T, IdentityEngine> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, I> Set<T, I> {
    /// Empty set using `identity` to key its elements.
    pub fn with_identity(identity: I) -> Self {
        Self {
            entries: IndexMap::new(),
            identity,
        }
    }

    /// The identity function keying this set.
    pub fn identity_fn(&self) -> &I {
        &self.identity
    }

    /// Element stored under `digest`.
    pub fn get(&self, digest: &Digest) -> Result<&T, SetError> {
        self.entries
            .get(digest)
            .map(|entry| &entry.value)
            .ok_or_else(|| SetError::NotFound(digest.clone()))
    }

    /// Whether an element with this identity is stored.
    pub fn contains_digest(&self, digest: &Digest) -> bool {
        self.entries.contains_key(digest)
    }

    /// How many times an element with this identity was added, 0 when absent.
    pub fn occurrences_of(&self, digest: &Digest) -> u64 {
        self.entries.get(digest).map_or(0, |entry| entry.occurrences)
    }

    /// Identities of the stored elements, in insertion order.
    pub fn identities(&self) -> impl Iterator<Item = &Digest> {
        self.entries.keys()
    }

    /// Stored elements, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.values().map(|entry| &entry.value)
    }

    /// Identity, element and occurrence count of each entry.
    pub fn entries(&self) -> impl Iterator<Item = (&Digest, &T, u64)> {
        self.entries
            .iter()
            .map(|(digest, entry)| (digest, &entry.value, entry.occurrences))
    }

    /// Number of distinct elements.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set holds no elements.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes every element.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Snapshot of the stored elements.
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.iter().cloned().collect()
    }

    /// Consumes the set, returning its elements.
    pub fn into_vec(self) -> Vec<T> {
        self.entries.into_values().map(|entry| entry.value).collect()
    }

    /// Whether both sets hold exactly the same identities.
    ///
    /// Only digests are compared, so this is meaningful when both sets use
    /// the same identity function.
    pub fn contains_exactly<J>(&self, other: &Set<T, J>) -> bool {
        self.len() == other.len() && self.identities().all(|digest| other.contains_digest(digest))
    }

    /// New set with every element of `self` and `other`.
    ///
    /// Occurrence counts of shared identities are summed. The identity
    /// function of `self` is kept.
    pub fn union(&self, other: &Set<T, I>) -> Set<T, I>
    where
        T: Clone,
        I: Clone,
    {
        let mut merged = self.clone();
        for (digest, entry) in &other.entries {
            merged
                .entries
                .entry(digest.clone())
                .and_modify(|existing| existing.occurrences += entry.occurrences)
                .or_insert_with(|| entry.clone());
        }
        merged
    }

    /// New set with the elements of `self` whose identities are also in `other`.
    ///
    /// Values and occurrence counts are taken from `self`.
    pub fn intersection<J>(&self, other: &Set<T, J>) -> Set<T, I>
    where
        T: Clone,
        I: Clone,
    {
        Set {
            entries: self
                .entries
                .iter()
                .filter(|(digest, _)| other.contains_digest(digest))
                .map(|(digest, entry)| (digest.clone(), entry.clone()))
                .collect(),
            identity: self.identity.clone(),
        }
    }
}

impl<T, I: Identify<T>> Set<T, I> {
    /// Set containing `values`, keyed by `identity`.
    pub fn from_values_with<V>(identity: I, values: V) -> Result<Self, IdentityError>
    where
        V: IntoIterator<Item = T>,
    {
        let mut set = Self::with_identity(identity);
        set.add(values)?;
        Ok(set)
    }

    /// Identity of `value` under this set's identity function.
    pub fn identify(&self, value: &T) -> Result<Digest, IdentityError> {
        self.identity.identify(value)
    }

    /// Adds one element, returning its identity.
    ///
    /// When the identity is already present the stored element is kept and
    /// its occurrence count is incremented.
    pub fn insert(&mut self, value: T) -> Result<Digest, IdentityError> {
        let digest = self.identify(&value)?;
        match self.entries.get_mut(&digest) {
            Some(entry) => {
                entry.occurrences += 1;
                tracing::debug!(digest = %digest, occurrences = entry.occurrences, "duplicate identity collapsed");
            }
            None => {
                tracing::trace!(digest = %digest, "element added");
                self.entries.insert(
                    digest.clone(),
                    Entry {
                        value,
                        occurrences: 1,
                    },
                );
            }
        }
        Ok(digest)
    }

    /// Adds every element of `values`.
    ///
    /// Stops at the first element whose identity cannot be computed; elements
    /// before it stay added.
    pub fn add<V>(&mut self, values: V) -> Result<(), IdentityError>
    where
        V: IntoIterator<Item = T>,
    {
        for value in values {
            self.insert(value)?;
        }
        Ok(())
    }

    /// Removes the element sharing `value`'s identity. Returns whether one was stored.
    pub fn discard(&mut self, value: &T) -> Result<bool, IdentityError> {
        let digest = self.identify(value)?;
        let removed = self.entries.shift_remove(&digest).is_some();
        if !removed {
            tracing::trace!(digest = %digest, "discard of absent identity");
        }
        Ok(removed)
    }

    /// Removes the elements sharing the identities of `values`. Returns how many were stored.
    pub fn remove<'a, V>(&mut self, values: V) -> Result<usize, IdentityError>
    where
        T: 'a,
        V: IntoIterator<Item = &'a T>,
    {
        let mut removed = 0;
        for value in values {
            if self.discard(value)? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Whether an element with `value`'s identity is stored.
    pub fn contains(&self, value: &T) -> Result<bool, IdentityError> {
        Ok(self.contains_digest(&self.identify(value)?))
    }

    /// Stored element sharing `value`'s identity.
    pub fn lookup(&self, value: &T) -> Result<&T, SetError> {
        let digest = self.identify(value)?;
        self.get(&digest)
    }

    /// How many times an element with `value`'s identity was added.
    pub fn occurrences(&self, value: &T) -> Result<u64, IdentityError> {
        Ok(self.occurrences_of(&self.identify(value)?))
    }
}

/// Union of any number of sets. Empty input yields an empty set.
pub fn union<'a, T, I, S>(sets: S) -> Set<T, I>
where
    T: Clone + 'a,
    I: Clone + Default + 'a,
    S: IntoIterator<Item = &'a Set<T, I>>,
{
    let mut sets = sets.into_iter();
    match sets.next() {
        Some(first) => sets.fold(first.clone(), |acc, set| acc.union(set)),
        None => Set::with_identity(I::default()),
    }
}

/// Intersection of two sets, keeping the values of `a`.
pub fn intersection<T, I, J>(a: &Set<T, I>, b: &Set<T, J>) -> Set<T, I>
where
    T: Clone,
    I: Clone,
{
    a.intersection(b)
}

impl<T, I, J> PartialEq<Set<T, J>> for Set<T, I> {
    fn eq(&self, other: &Set<T, J>) -> bool {
        self.contains_exactly(other)
    }
}

impl<T: fmt::Debug, I> fmt::Debug for Set<T, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T: Serialize, I> Serialize for Set<T, I> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<T, I> IntoIterator for Set<T, I> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.into_vec().into_iter()
    }
}

impl<'a, T, I> IntoIterator for &'a Set<T, I> {
    type Item = &'a T;
    type IntoIter = Box<dyn Iterator<Item = &'a T> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}
