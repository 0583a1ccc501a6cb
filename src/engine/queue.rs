//! Derived inferences and the lazy priority-queue carriers that hold them.
//!
//! Most queue entries never leave the queue, so a resolvent is stored as its
//! two parents and materialized only when popped. Its priority, premise
//! count, and tautology status are computed eagerly from the parents by
//! cardinality and membership alone, without building the union sets.

use std::{
    cell::Cell,
    cmp::{Ordering, Reverse},
    collections::{BinaryHeap, HashSet},
    fmt,
    hash::Hash,
    sync::Arc,
};

use itertools::Itertools;

use crate::{
    graph::Inference,
    minimality::{fingerprint_within, set_fingerprint, Subsumable},
};

/// An inference obtained either by lifting an original inference (premises
/// collapsed to a set, justification attached) or by resolving two derived
/// inferences. Shared across the engine's indexes by `Arc`; the fingerprints
/// back the subsumption prefilter.
#[derive(Debug)]
pub struct DerivedInference<C, A> {
    conclusion: C,
    premises: HashSet<C>,
    justification: HashSet<A>,
    premise_fingerprint: u64,
    justification_fingerprint: u64,
    minimal: Cell<bool>,
}

impl<C, A> DerivedInference<C, A>
where
    C: Clone + Eq + Hash,
    A: Clone + Eq + Hash,
{
    /// Lifts an original inference, collapsing its ordered premises to a set.
    pub fn lifted(inference: &Inference<C>, justification: HashSet<A>) -> Self {
        let premises: HashSet<C> = inference.premises().iter().cloned().collect();
        Self::build(inference.conclusion().clone(), premises, justification)
    }

    /// Resolves `first` into `second` on `first`'s conclusion:
    /// the pivot is removed from `second`'s premises and replaced by
    /// `first`'s premises, and the justifications are united. Inputs must be
    /// non-tautological.
    pub fn resolve(first: &Self, second: &Self) -> Self {
        let mut premises: HashSet<C> = second
            .premises
            .iter()
            .filter(|p| **p != first.conclusion)
            .cloned()
            .collect();
        premises.extend(first.premises.iter().cloned());

        let mut justification = first.justification.clone();
        justification.extend(second.justification.iter().cloned());

        Self::build(second.conclusion.clone(), premises, justification)
    }

    fn build(conclusion: C, premises: HashSet<C>, justification: HashSet<A>) -> Self {
        let premise_fingerprint = set_fingerprint(premises.iter());
        let justification_fingerprint = set_fingerprint(justification.iter());
        Self {
            conclusion,
            premises,
            justification,
            premise_fingerprint,
            justification_fingerprint,
            minimal: Cell::new(false),
        }
    }

    pub fn conclusion(&self) -> &C {
        &self.conclusion
    }

    pub fn premises(&self) -> &HashSet<C> {
        &self.premises
    }

    pub fn justification(&self) -> &HashSet<A> {
        &self.justification
    }

    pub fn premise_count(&self) -> usize {
        self.premises.len()
    }

    pub(crate) fn justification_fingerprint(&self) -> u64 {
        self.justification_fingerprint
    }

    pub fn is_tautology(&self) -> bool {
        self.premises.contains(&self.conclusion)
    }

    /// Whether resolving `first` into `second` would yield a tautology.
    /// Decidable from the parents alone: the resolved conclusion is
    /// `second`'s, and it survives in the premises iff it already sits among
    /// `first`'s premises.
    pub(crate) fn resolvent_is_tautology(first: &Self, second: &Self) -> bool {
        first.premises.contains(&second.conclusion)
    }

    pub(crate) fn is_marked_minimal(&self) -> bool {
        self.minimal.get()
    }

    pub(crate) fn mark_minimal(&self) {
        self.minimal.set(true);
    }
}

impl<C, A> Subsumable for DerivedInference<C, A>
where
    C: Clone + Eq + Hash,
    A: Clone + Eq + Hash,
{
    fn may_subsume(&self, other: &Self) -> bool {
        fingerprint_within(self.premise_fingerprint, other.premise_fingerprint)
            && fingerprint_within(self.justification_fingerprint, other.justification_fingerprint)
    }

    fn subsumes(&self, other: &Self) -> bool {
        self.conclusion == other.conclusion
            && self.premises.is_subset(&other.premises)
            && self.justification.is_subset(&other.justification)
    }
}

impl<C: fmt::Debug, A: fmt::Debug> fmt::Display for DerivedInference<C, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Sorted rendering keeps log lines stable across hash orders.
        write!(
            f,
            "[{:?} <- {{{}}} | {{{}}}]",
            self.conclusion,
            self.premises.iter().map(|p| format!("{p:?}")).sorted().join(", "),
            self.justification
                .iter()
                .map(|a| format!("{a:?}"))
                .sorted()
                .join(", ")
        )
    }
}

/// The queue over produced inferences, cheapest first.
pub(crate) type ProducedQueue<C, A, P> = BinaryHeap<Reverse<QueueElement<C, A, P>>>;

/// A queue entry: either an already-materialized derived inference or a
/// pending resolvent. Ordered by priority, ties broken by ascending premise
/// count.
#[derive(Debug)]
pub(crate) enum QueueElement<C, A, P> {
    Direct {
        priority: P,
        inference: Arc<DerivedInference<C, A>>,
    },
    Resolvent {
        priority: P,
        premise_count: usize,
        first: Arc<DerivedInference<C, A>>,
        second: Arc<DerivedInference<C, A>>,
    },
}

impl<C, A, P> QueueElement<C, A, P>
where
    C: Clone + Eq + Hash,
    A: Clone + Eq + Hash,
{
    pub(crate) fn direct(priority: P, inference: Arc<DerivedInference<C, A>>) -> Self {
        QueueElement::Direct {
            priority,
            inference,
        }
    }

    pub(crate) fn resolvent(
        priority: P,
        first: Arc<DerivedInference<C, A>>,
        second: Arc<DerivedInference<C, A>>,
    ) -> Self {
        let union = first.premises.len()
            + second
                .premises
                .iter()
                .filter(|p| !first.premises.contains(*p))
                .count();
        QueueElement::Resolvent {
            priority,
            premise_count: union - 1,
            first,
            second,
        }
    }

    pub(crate) fn premise_count(&self) -> usize {
        match self {
            QueueElement::Direct { inference, .. } => inference.premise_count(),
            QueueElement::Resolvent { premise_count, .. } => *premise_count,
        }
    }

    fn priority(&self) -> &P {
        match self {
            QueueElement::Direct { priority, .. } => priority,
            QueueElement::Resolvent { priority, .. } => priority,
        }
    }

    /// Builds the carried derived inference. Direct entries hand back their
    /// inference; resolvents are resolved here, on extraction.
    pub(crate) fn materialize(self) -> Arc<DerivedInference<C, A>> {
        match self {
            QueueElement::Direct { inference, .. } => inference,
            QueueElement::Resolvent { first, second, .. } => {
                Arc::new(DerivedInference::resolve(&first, &second))
            }
        }
    }
}

impl<C, A, P> PartialEq for QueueElement<C, A, P>
where
    C: Clone + Eq + Hash,
    A: Clone + Eq + Hash,
    P: Ord,
{
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<C, A, P> Eq for QueueElement<C, A, P>
where
    C: Clone + Eq + Hash,
    A: Clone + Eq + Hash,
    P: Ord,
{
}

impl<C, A, P> PartialOrd for QueueElement<C, A, P>
where
    C: Clone + Eq + Hash,
    A: Clone + Eq + Hash,
    P: Ord,
{
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<C, A, P> Ord for QueueElement<C, A, P>
where
    C: Clone + Eq + Hash,
    A: Clone + Eq + Hash,
    P: Ord,
{
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority()
            .cmp(other.priority())
            .then_with(|| self.premise_count().cmp(&other.premise_count()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn derived(
        conclusion: &'static str,
        premises: &[&'static str],
        justification: &[&'static str],
    ) -> Arc<DerivedInference<&'static str, &'static str>> {
        Arc::new(DerivedInference::build(
            conclusion,
            premises.iter().copied().collect(),
            justification.iter().copied().collect(),
        ))
    }

    #[test]
    fn resolution_eliminates_the_pivot() {
        let first = derived("a", &["d"], &["x"]);
        let second = derived("c", &["a", "b"], &["y"]);
        let resolved = DerivedInference::resolve(&first, &second);

        assert_eq!(*resolved.conclusion(), "c");
        assert_eq!(
            *resolved.premises(),
            ["d", "b"].into_iter().collect::<HashSet<_>>()
        );
        assert_eq!(
            *resolved.justification(),
            ["x", "y"].into_iter().collect::<HashSet<_>>()
        );
    }

    #[test]
    fn resolvent_premise_count_matches_materialization() {
        let first = derived("a", &["d", "b"], &["x"]);
        let second = derived("c", &["a", "b"], &["y"]);

        let element: QueueElement<_, _, usize> =
            QueueElement::resolvent(0, Arc::clone(&first), Arc::clone(&second));
        let expected = element.premise_count();
        let resolved = element.materialize();
        assert_eq!(resolved.premise_count(), expected);
    }

    #[test]
    fn resolvent_tautology_detected_without_materializing() {
        let first = derived("a", &["c"], &["x"]);
        let second = derived("c", &["a"], &["y"]);
        assert!(DerivedInference::resolvent_is_tautology(&first, &second));

        let harmless = derived("a", &["d"], &["x"]);
        assert!(!DerivedInference::resolvent_is_tautology(
            &harmless, &second
        ));
    }

    #[test]
    fn queue_orders_by_priority_then_premise_count() {
        let mut queue: ProducedQueue<&str, &str, usize> = BinaryHeap::new();
        queue.push(Reverse(QueueElement::direct(2, derived("a", &["p"], &[]))));
        queue.push(Reverse(QueueElement::direct(1, derived("b", &["p", "q"], &[]))));
        queue.push(Reverse(QueueElement::direct(1, derived("c", &[], &[]))));

        let order: Vec<&str> = std::iter::from_fn(|| queue.pop())
            .map(|Reverse(e)| *e.materialize().conclusion())
            .collect();
        assert_eq!(order, vec!["c", "b", "a"]);
    }

    #[test]
    fn subsumption_requires_both_subsets_and_same_conclusion() {
        let small = derived("c", &["a"], &["x"]);
        let large = derived("c", &["a", "b"], &["x", "y"]);
        let other = derived("d", &["a"], &["x"]);

        assert!(small.subsumes(&large));
        assert!(!large.subsumes(&small));
        assert!(!other.subsumes(&large));
        assert!(small.may_subsume(&large));
    }
}
