//! A container for subset-minimality tests over a growing collection of sets.
//!
//! `is_minimal(s)` answers whether no stored entry is a subset of `s`. Every
//! stored entry carries a 64-bit Bloom fingerprint, one bit per element hash,
//! which prunes most comparisons: if a stored fingerprint has a bit outside
//! the candidate's fingerprint, the stored set cannot be a subset and the
//! exact test is skipped. The exact test is total, so false positives in the
//! prefilter never affect the answer.

use std::{
    collections::{hash_map::DefaultHasher, HashSet},
    hash::{Hash, Hasher},
    sync::Arc,
};

/// Computes the Bloom fingerprint of a collection of elements: the OR of one
/// bit per element, indexed by the element's hash.
pub fn set_fingerprint<'a, T, I>(elements: I) -> u64
where
    T: Hash + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut fingerprint = 0u64;
    for element in elements {
        let mut hasher = DefaultHasher::new();
        element.hash(&mut hasher);
        fingerprint |= 1u64 << (hasher.finish() & 63);
    }
    fingerprint
}

/// True when every bit of `inner` is present in `outer`. A necessary
/// condition for the `inner` set being a subset of the `outer` set.
pub(crate) fn fingerprint_within(inner: u64, outer: u64) -> bool {
    inner & outer == inner
}

/// Subset dominance between stored items of one index.
pub trait Subsumable {
    /// Fingerprint prefilter: `false` guarantees that `self` does not
    /// dominate `other`.
    fn may_subsume(&self, other: &Self) -> bool;
    /// Exact dominance test.
    fn subsumes(&self, other: &Self) -> bool;
}

impl<T: Subsumable> Subsumable for Arc<T> {
    fn may_subsume(&self, other: &Self) -> bool {
        (**self).may_subsume(other)
    }
    fn subsumes(&self, other: &Self) -> bool {
        (**self).subsumes(other)
    }
}

/// A set of elements together with its precomputed fingerprint.
#[derive(Debug, Clone)]
pub struct FingerprintedSet<A> {
    elements: HashSet<A>,
    fingerprint: u64,
}

impl<A: Eq + Hash> FingerprintedSet<A> {
    pub fn new(elements: HashSet<A>) -> Self {
        let fingerprint = set_fingerprint(elements.iter());
        Self {
            elements,
            fingerprint,
        }
    }

    pub(crate) fn with_fingerprint(elements: HashSet<A>, fingerprint: u64) -> Self {
        Self {
            elements,
            fingerprint,
        }
    }

    pub fn elements(&self) -> &HashSet<A> {
        &self.elements
    }
}

impl<A: Eq + Hash> Subsumable for FingerprintedSet<A> {
    fn may_subsume(&self, other: &Self) -> bool {
        fingerprint_within(self.fingerprint, other.fingerprint)
    }
    fn subsumes(&self, other: &Self) -> bool {
        self.elements.is_subset(&other.elements)
    }
}

/// An index over [`Subsumable`] items answering subset-minimality queries.
///
/// Inserting an item also drops previously stored items it dominates, so the
/// index never holds an entry superseded by another.
#[derive(Debug)]
pub struct MinimalSetIndex<S> {
    entries: Vec<S>,
}

impl<S> Default for MinimalSetIndex<S> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<S: Subsumable> MinimalSetIndex<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// True iff no stored entry dominates the candidate.
    pub fn is_minimal(&self, candidate: &S) -> bool {
        !self
            .entries
            .iter()
            .any(|stored| stored.may_subsume(candidate) && stored.subsumes(candidate))
    }

    pub fn insert(&mut self, item: S) {
        self.entries
            .retain(|stored| !(item.may_subsume(stored) && item.subsumes(stored)));
        self.entries.push(item);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(elements: &[u32]) -> FingerprintedSet<u32> {
        FingerprintedSet::new(elements.iter().copied().collect())
    }

    #[test]
    fn minimality_matches_exact_subset_semantics() {
        let mut index = MinimalSetIndex::new();
        index.insert(set(&[1, 2]));
        index.insert(set(&[3]));

        assert!(!index.is_minimal(&set(&[1, 2, 4])));
        assert!(!index.is_minimal(&set(&[3])));
        assert!(!index.is_minimal(&set(&[2, 3])));
        assert!(index.is_minimal(&set(&[1, 4])));
        assert!(index.is_minimal(&set(&[2])));
        assert!(index.is_minimal(&set(&[])));
    }

    #[test]
    fn empty_set_dominates_everything() {
        let mut index = MinimalSetIndex::new();
        index.insert(set(&[]));
        assert!(!index.is_minimal(&set(&[])));
        assert!(!index.is_minimal(&set(&[7])));
    }

    #[test]
    fn insert_prunes_dominated_entries() {
        let mut index = MinimalSetIndex::new();
        index.insert(set(&[1, 2, 3]));
        index.insert(set(&[4, 5]));
        assert_eq!(index.len(), 2);

        index.insert(set(&[2]));
        assert_eq!(index.len(), 2);
        assert!(!index.is_minimal(&set(&[2, 9])));
        assert!(!index.is_minimal(&set(&[4, 5, 6])));
        assert!(index.is_minimal(&set(&[1, 3])));
    }

    #[test]
    fn agrees_with_naive_reference() {
        // Cross-check against a direct subset scan over a fixed workload.
        let workload: Vec<Vec<u32>> = vec![
            vec![1, 2],
            vec![2, 3, 4],
            vec![5],
            vec![1, 3],
            vec![2, 4],
            vec![6, 7, 8],
            vec![1, 2, 3, 4],
        ];

        let mut index = MinimalSetIndex::new();
        let mut reference: Vec<HashSet<u32>> = Vec::new();

        for elements in &workload {
            let candidate: HashSet<u32> = elements.iter().copied().collect();
            let expected = !reference.iter().any(|stored| stored.is_subset(&candidate));
            assert_eq!(
                index.is_minimal(&set(elements)),
                expected,
                "disagreement on {elements:?}"
            );
            index.insert(set(elements));
            reference.push(candidate);
        }
    }
}
