//! Goal-directed enumeration of subset-minimal justifications.
//!
//! Every inference reachable from the goal is lifted into a derived
//! inference and fed through a priority queue, cheapest justification first.
//! Popped inferences resolve against previously stored partners on a pivot
//! literal chosen by a pluggable selection strategy, progressively
//! eliminating premises; a premise-free derived inference for the goal
//! carries a complete justification. Subsumption between derived inferences
//! prunes the search, and a per-query cover of already-emitted
//! justifications guarantees that each emission is subset-minimal and
//! emitted exactly once. With a priority order monotone under set inclusion,
//! emissions arrive in non-decreasing priority.
//!
//! Work shelved as covered is not lost: a later query with a different goal
//! revisits it, and inferences pivoted on the previous goal's conclusion are
//! re-selected for the new one.

#![allow(clippy::arc_with_non_send_sync)]

use std::{
    cmp::Reverse,
    collections::{BinaryHeap, HashMap, HashSet, VecDeque},
    fmt::Debug,
    hash::Hash,
    sync::Arc,
};

use log::{debug, trace};

use crate::{
    engine::{
        queue::{DerivedInference, ProducedQueue, QueueElement},
        selection::{Selection, SelectionContext, ThresholdSelection},
    },
    error::EngineError,
    graph::{InferenceJustifier, InferenceSet},
    interrupt::{InterruptMonitor, NeverInterrupted},
    metrics::{MetricsSink, NoOpMetrics},
    minimality::{FingerprintedSet, MinimalSetIndex},
    priority::{CardinalityOrder, PriorityOrder},
};

/// Enumerates the subset-minimal justifications of goal conclusions.
///
/// Lifted and derived inferences accumulate across queries; only the queue
/// and the emitted-justification cover are per-query. The engine is
/// stateful and single-threaded.
pub struct ResolutionEngine<C, A, S, J, M = NoOpMetrics> {
    graph: S,
    justifier: J,
    selection: Box<dyn Selection<C>>,
    metrics: M,
    /// Conclusions whose original inferences have been lifted already.
    initialized: HashSet<C>,
    /// Number of provider inferences per initialized conclusion, read by
    /// selection strategies.
    inference_counts: HashMap<C, usize>,
    /// Subsumption index per conclusion over stored derived inferences.
    minimal_by_conclusion: HashMap<C, MinimalSetIndex<Arc<DerivedInference<C, A>>>>,
    /// Stored inferences waiting for partners, partitioned by pivot.
    by_selected_conclusion: HashMap<C, Vec<Arc<DerivedInference<C, A>>>>,
    by_selected_premise: HashMap<C, Vec<Arc<DerivedInference<C, A>>>>,
    /// Inferences shelved because their justification was covered at the
    /// time they surfaced. Revisited on the next query.
    blocked: VecDeque<Arc<DerivedInference<C, A>>>,
}

impl<C, A, S, J> ResolutionEngine<C, A, S, J, NoOpMetrics>
where
    C: Clone + Eq + Hash + Debug,
    A: Clone + Eq + Hash + Debug,
    S: InferenceSet<C>,
    J: InferenceJustifier<C, A>,
{
    pub fn new(graph: S, justifier: J) -> Self {
        Self::with_metrics(graph, justifier, NoOpMetrics)
    }
}

impl<C, A, S, J, M> ResolutionEngine<C, A, S, J, M>
where
    C: Clone + Eq + Hash + Debug,
    A: Clone + Eq + Hash + Debug,
    S: InferenceSet<C>,
    J: InferenceJustifier<C, A>,
    M: MetricsSink,
{
    pub fn with_metrics(graph: S, justifier: J, metrics: M) -> Self {
        Self {
            graph,
            justifier,
            selection: Box::new(ThresholdSelection::default()),
            metrics,
            initialized: HashSet::new(),
            inference_counts: HashMap::new(),
            minimal_by_conclusion: HashMap::new(),
            by_selected_conclusion: HashMap::new(),
            by_selected_premise: HashMap::new(),
            blocked: VecDeque::new(),
        }
    }

    /// Replaces the default threshold strategy.
    pub fn with_selection(mut self, selection: impl Selection<C> + 'static) -> Self {
        self.selection = Box::new(selection);
        self
    }

    /// Consumes the engine to retrieve the collected metrics.
    pub fn into_metrics(self) -> M {
        self.metrics
    }

    pub fn metrics(&self) -> &M {
        &self.metrics
    }

    pub fn reset_metrics(&mut self) {
        self.metrics.reset();
    }

    /// Emits every subset-minimal justification of `goal` exactly once, in
    /// ascending cardinality order.
    pub fn enumerate<L>(&mut self, goal: C, listener: L) -> Result<(), EngineError>
    where
        L: FnMut(&HashSet<A>),
    {
        self.enumerate_with(goal, CardinalityOrder, &NeverInterrupted, listener)
    }

    /// Emits every subset-minimal justification of `goal` exactly once, in
    /// non-decreasing `order`. The order must be monotone under strict set
    /// inclusion; a non-monotone order can surface non-minimal sets. The
    /// monitor is polled once per popped element; on interrupt the
    /// enumeration stops cleanly and everything emitted so far stands.
    pub fn enumerate_with<P, L>(
        &mut self,
        goal: C,
        order: P,
        monitor: &dyn InterruptMonitor,
        mut listener: L,
    ) -> Result<(), EngineError>
    where
        P: PriorityOrder<A>,
        L: FnMut(&HashSet<A>),
    {
        debug!("Enumerating minimal justifications of {:?}", goal);
        let mut covered: MinimalSetIndex<FingerprintedSet<A>> = MinimalSetIndex::new();
        let mut queue: ProducedQueue<C, A, P::Priority> = BinaryHeap::new();

        self.unblock_jobs(&order, &mut queue);
        self.change_selection(&goal, &order, &mut queue);
        self.initialize(&goal, &order, &mut queue);
        self.process(&goal, &order, monitor, &mut queue, &mut covered, &mut listener)
    }

    /// Revisits inferences shelved by an earlier query. Their justification
    /// was covered for that goal; the new goal starts from an empty cover.
    fn unblock_jobs<P: PriorityOrder<A>>(
        &mut self,
        order: &P,
        queue: &mut ProducedQueue<C, A, P::Priority>,
    ) {
        while let Some(inference) = self.blocked.pop_front() {
            trace!("Unshelving {}", inference);
            let priority = order.of(inference.justification());
            queue.push(Reverse(QueueElement::direct(priority, inference)));
        }
    }

    /// Re-enqueues inferences whose recorded pivot is the new goal as their
    /// conclusion: a strategy may choose another pivot now that this
    /// conclusion is the goal. Inferences pivoted on one of their premises
    /// keep that pivot even when the choice depended on the previous goal.
    fn change_selection<P: PriorityOrder<A>>(
        &mut self,
        goal: &C,
        order: &P,
        queue: &mut ProducedQueue<C, A, P::Priority>,
    ) {
        if let Some(entries) = self.by_selected_conclusion.remove(goal) {
            trace!("Re-selecting {} inferences concluding the goal", entries.len());
            for inference in entries {
                let priority = order.of(inference.justification());
                queue.push(Reverse(QueueElement::direct(priority, inference)));
            }
        }
    }

    /// Lifts every inference reachable from the goal into the queue. Each
    /// conclusion is lifted once in the engine's lifetime.
    fn initialize<P: PriorityOrder<A>>(
        &mut self,
        goal: &C,
        order: &P,
        queue: &mut ProducedQueue<C, A, P::Priority>,
    ) {
        let mut pending: VecDeque<C> = VecDeque::new();
        if self.initialized.insert(goal.clone()) {
            pending.push_back(goal.clone());
        }
        while let Some(conclusion) = pending.pop_front() {
            let inferences = self.graph.inferences_of(&conclusion);
            self.metrics.record_goal_expanded();
            self.inference_counts
                .insert(conclusion.clone(), inferences.len());
            trace!("Lifting {} inferences of {:?}", inferences.len(), conclusion);

            for inference in inferences {
                for premise in inference.premises() {
                    if self.initialized.insert(premise.clone()) {
                        pending.push_back(premise.clone());
                    }
                }
                if inference.is_tautology() {
                    trace!("Dropping tautology {}", inference);
                    continue;
                }
                let justification = self.justifier.justification_of(&inference);
                let derived = Arc::new(DerivedInference::lifted(&inference, justification));
                let priority = order.of(derived.justification());
                self.metrics.record_produced_inference();
                queue.push(Reverse(QueueElement::direct(priority, derived)));
            }
        }
    }

    fn process<P, L>(
        &mut self,
        goal: &C,
        order: &P,
        monitor: &dyn InterruptMonitor,
        queue: &mut ProducedQueue<C, A, P::Priority>,
        covered: &mut MinimalSetIndex<FingerprintedSet<A>>,
        listener: &mut L,
    ) -> Result<(), EngineError>
    where
        P: PriorityOrder<A>,
        L: FnMut(&HashSet<A>),
    {
        loop {
            if monitor.is_interrupted() {
                debug!("Interrupted, leaving enumeration early");
                // Shelve whatever is still queued; conclusions are lifted at
                // most once per engine, so dropping these would lose them
                // for every later query.
                while let Some(Reverse(element)) = queue.pop() {
                    self.blocked.push_back(element.materialize());
                }
                return Ok(());
            }
            let Some(Reverse(element)) = queue.pop() else {
                break;
            };
            let inference = element.materialize();
            trace!("Processing {}", inference);

            // Shelved rather than dropped: under another goal this
            // justification may still be uncovered.
            let justification = FingerprintedSet::with_fingerprint(
                inference.justification().clone(),
                inference.justification_fingerprint(),
            );
            if !covered.is_minimal(&justification) {
                self.metrics.record_blocked_inference();
                self.blocked.push_back(inference);
                continue;
            }

            if inference.premises().is_empty() && inference.conclusion() == goal {
                debug!("Minimal justification {:?}", inference.justification());
                covered.insert(justification);
                listener(inference.justification());
                self.blocked.push_back(inference);
                continue;
            }

            if !inference.is_marked_minimal() {
                let index = self
                    .minimal_by_conclusion
                    .entry(inference.conclusion().clone())
                    .or_default();
                if !index.is_minimal(&inference) {
                    trace!("Subsumed, discarding {}", inference);
                    continue;
                }
                inference.mark_minimal();
                index.insert(Arc::clone(&inference));
                self.metrics.record_minimal_inference();
            }

            let pivot = {
                let ctx = SelectionContext::new(goal, &self.inference_counts);
                self.selection
                    .select(inference.conclusion(), inference.premises(), &ctx)
            };
            match pivot {
                Some(premise) => {
                    trace!("Pivot premise {:?} for {}", premise, inference);
                    self.by_selected_premise
                        .entry(premise.clone())
                        .or_default()
                        .push(Arc::clone(&inference));
                    let producers: Vec<_> = self
                        .by_selected_conclusion
                        .get(&premise)
                        .map(|stored| stored.iter().map(Arc::clone).collect())
                        .unwrap_or_default();
                    for producer in producers {
                        self.produce_resolvent(order, queue, &producer, &inference);
                    }
                }
                None => {
                    if inference.conclusion() == goal && !inference.premises().is_empty() {
                        return Err(EngineError::GoalConclusionSelected(inference.to_string()));
                    }
                    trace!("Pivot conclusion for {}", inference);
                    self.by_selected_conclusion
                        .entry(inference.conclusion().clone())
                        .or_default()
                        .push(Arc::clone(&inference));
                    let consumers: Vec<_> = self
                        .by_selected_premise
                        .get(inference.conclusion())
                        .map(|stored| stored.iter().map(Arc::clone).collect())
                        .unwrap_or_default();
                    for consumer in consumers {
                        self.produce_resolvent(order, queue, &inference, &consumer);
                    }
                }
            }
        }
        debug!("Queue exhausted, enumeration complete");
        Ok(())
    }

    /// Queues the resolvent of `first` (deriving the pivot) and `second`
    /// (consuming it as a premise). Tautological resolvents are dropped
    /// here, before they can pollute the queue.
    fn produce_resolvent<P: PriorityOrder<A>>(
        &mut self,
        order: &P,
        queue: &mut ProducedQueue<C, A, P::Priority>,
        first: &Arc<DerivedInference<C, A>>,
        second: &Arc<DerivedInference<C, A>>,
    ) {
        if DerivedInference::resolvent_is_tautology(first, second) {
            trace!("Dropping tautological resolvent of {} and {}", first, second);
            return;
        }
        let priority = order.of_union(first.justification(), second.justification());
        self.metrics.record_produced_inference();
        queue.push(Reverse(QueueElement::resolvent(
            priority,
            Arc::clone(first),
            Arc::clone(second),
        )));
    }
}
