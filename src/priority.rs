//! Priority orders for justification emission.
//!
//! An order assigns each justification a totally ordered key. Enumeration
//! emits minimal justifications in non-decreasing key order. Correctness of
//! the first-emitted-is-minimal property requires the key to be monotone
//! under strict set inclusion: `A ⊂ B` must imply `of(A) < of(B)`. This is a
//! caller obligation and is not checked; a non-monotone order can make the
//! engine emit non-minimal sets.

use std::{collections::HashSet, hash::Hash};

/// Maps justifications to totally ordered priority keys.
pub trait PriorityOrder<A> {
    type Priority: Ord + Clone;

    /// The key of one justification.
    fn of(&self, justification: &HashSet<A>) -> Self::Priority;

    /// The key of the union of two justifications, used when pricing a
    /// resolvent before its sets are materialized. The default builds the
    /// union; orders that can price a union from membership alone should
    /// override it.
    fn of_union(&self, first: &HashSet<A>, second: &HashSet<A>) -> Self::Priority
    where
        A: Clone + Eq + Hash,
    {
        let union: HashSet<A> = first.union(second).cloned().collect();
        self.of(&union)
    }
}

/// The default order: ascending cardinality.
#[derive(Debug, Clone, Copy, Default)]
pub struct CardinalityOrder;

impl<A: Eq + Hash> PriorityOrder<A> for CardinalityOrder {
    type Priority = usize;

    fn of(&self, justification: &HashSet<A>) -> usize {
        justification.len()
    }

    fn of_union(&self, first: &HashSet<A>, second: &HashSet<A>) -> usize
    where
        A: Clone,
    {
        first.len() + second.iter().filter(|a| !first.contains(*a)).count()
    }
}

/// Adapts a key-extraction closure into a [`PriorityOrder`]. The closure must
/// satisfy the same monotonicity obligation as the trait itself.
#[derive(Debug, Clone)]
pub struct KeyOrder<F> {
    key: F,
}

impl<F> KeyOrder<F> {
    pub fn new(key: F) -> Self {
        Self { key }
    }
}

impl<A, P, F> PriorityOrder<A> for KeyOrder<F>
where
    P: Ord + Clone,
    F: Fn(&HashSet<A>) -> P,
{
    type Priority = P;

    fn of(&self, justification: &HashSet<A>) -> P {
        (self.key)(justification)
    }
}
