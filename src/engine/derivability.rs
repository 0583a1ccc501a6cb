//! Incremental derivability checking with dynamic blocking.
//!
//! A conclusion is derivable when some inference produces it whose every
//! premise is recursively derivable, with blocked conclusions excluded from
//! every derivation. The engine propagates derivability bottom-up but only
//! over the part of the graph a query reaches: new goals push their provider
//! inference collections onto a LIFO expansion stack, so the search expands
//! depth-first, while freshly derived conclusions drain through a FIFO
//! propagation queue before any further expansion. Inferences suspended on an
//! underivable premise are parked in a watch index and resume in O(1) at
//! their recorded scan position once the premise fires.
//!
//! State persists across queries. Blocking retracts previously derived
//! conclusions whose recorded firings passed through the blocked one;
//! unblocking re-enters the affected goals on demand.

use std::{
    collections::{HashMap, HashSet, VecDeque},
    fmt::Debug,
    hash::Hash,
};

use log::{debug, trace};

use crate::{
    graph::{Inference, InferenceSet},
    metrics::{MetricsSink, NoOpMetrics},
};

/// A snapshot of one conclusion's provider inferences, consumed by index.
/// Holding the buffer rather than a live provider iterator keeps the engine
/// free of provider lifetimes across suspensions.
#[derive(Debug)]
struct InferenceCursor<C> {
    inferences: Vec<Inference<C>>,
    next: usize,
}

impl<C: Clone> InferenceCursor<C> {
    fn new(inferences: Vec<Inference<C>>) -> Self {
        Self {
            inferences,
            next: 0,
        }
    }

    fn advance(&mut self) -> Option<Inference<C>> {
        let inference = self.inferences.get(self.next)?.clone();
        self.next += 1;
        Some(inference)
    }

    fn is_exhausted(&self) -> bool {
        self.next >= self.inferences.len()
    }
}

/// Answers `is_derivable` queries over an inference set, with support for
/// blocking and unblocking conclusions between queries.
pub struct DerivabilityEngine<C, S, M = NoOpMetrics> {
    graph: S,
    metrics: M,
    /// Conclusions for which a derivability test was initiated.
    goals: HashSet<C>,
    /// Subset of `goals` observed derivable.
    derivable: HashSet<C>,
    blocked: HashSet<C>,
    /// Goals whose inference collection has not been pulled yet.
    to_check: VecDeque<C>,
    /// Pending inference collections, innermost goal on top.
    to_expand: Vec<InferenceCursor<C>>,
    /// Newly derived conclusions awaiting propagation to watchers.
    to_propagate: VecDeque<C>,
    /// For each underivable premise, the inferences waiting on it together
    /// with the premise position where their scan stopped.
    watched: HashMap<C, Vec<(Inference<C>, usize)>>,
    /// For each premise, the inferences that fired using it. Read during
    /// retraction.
    fired: HashMap<C, HashSet<Inference<C>>>,
}

impl<C, S> DerivabilityEngine<C, S, NoOpMetrics>
where
    C: Clone + Eq + Hash + Debug,
    S: InferenceSet<C>,
{
    pub fn new(graph: S) -> Self {
        Self::with_metrics(graph, NoOpMetrics)
    }
}

impl<C, S, M> DerivabilityEngine<C, S, M>
where
    C: Clone + Eq + Hash + Debug,
    S: InferenceSet<C>,
    M: MetricsSink,
{
    pub fn with_metrics(graph: S, metrics: M) -> Self {
        Self {
            graph,
            metrics,
            goals: HashSet::new(),
            derivable: HashSet::new(),
            blocked: HashSet::new(),
            to_check: VecDeque::new(),
            to_expand: Vec::new(),
            to_propagate: VecDeque::new(),
            watched: HashMap::new(),
            fired: HashMap::new(),
        }
    }

    /// Consumes the engine to retrieve the collected metrics.
    pub fn into_metrics(self) -> M {
        self.metrics
    }

    pub fn metrics(&self) -> &M {
        &self.metrics
    }

    /// Whether `conclusion` is derivable under the current blocked set.
    pub fn is_derivable(&mut self, conclusion: &C) -> bool {
        if self.blocked.contains(conclusion) {
            return false;
        }
        if self.goals.insert(conclusion.clone()) {
            self.to_check.push_back(conclusion.clone());
        }
        self.process();
        self.derivable.contains(conclusion)
    }

    /// Excludes `conclusion` from all derivations and retracts everything
    /// whose recorded derivation passed through it. Returns false if it was
    /// already blocked.
    pub fn block(&mut self, conclusion: &C) -> bool {
        if !self.blocked.insert(conclusion.clone()) {
            return false;
        }
        debug!("Blocking {:?}", conclusion);
        self.retract(conclusion);
        true
    }

    /// Lifts a block. If the conclusion is still watched by some suspended
    /// inference, its goal is re-entered and the engine settles immediately.
    /// Returns false if it was not blocked.
    pub fn unblock(&mut self, conclusion: &C) -> bool {
        if !self.blocked.remove(conclusion) {
            return false;
        }
        debug!("Unblocking {:?}", conclusion);
        if !self.goals.contains(conclusion) && self.watched.contains_key(conclusion) {
            self.goals.insert(conclusion.clone());
            self.to_check.push_back(conclusion.clone());
            self.process();
        }
        true
    }

    pub fn blocked_conclusions(&self) -> &HashSet<C> {
        &self.blocked
    }

    /// Every conclusion currently blocking progress on some suspended
    /// inference. A superset of all conclusions found non-derivable, useful
    /// for diagnosing failed queries.
    pub fn non_derivable_conclusions(&self) -> impl Iterator<Item = &C> {
        self.watched.keys()
    }

    /// Runs expansion and propagation to fixpoint. Checking new goals wins
    /// over propagation, propagation wins over expansion.
    fn process(&mut self) {
        loop {
            if let Some(conclusion) = self.to_check.pop_front() {
                if self.blocked.contains(&conclusion) {
                    trace!("Skipping blocked goal {:?}", conclusion);
                    continue;
                }
                let inferences = self.graph.inferences_of(&conclusion);
                self.metrics.record_goal_expanded();
                trace!(
                    "Expanding goal {:?}: {} inferences",
                    conclusion,
                    inferences.len()
                );
                if !inferences.is_empty() {
                    self.to_expand.push(InferenceCursor::new(inferences));
                }
            } else if let Some(conclusion) = self.to_propagate.pop_front() {
                if let Some(watchers) = self.watched.remove(&conclusion) {
                    trace!(
                        "Propagating {:?} to {} watchers",
                        conclusion,
                        watchers.len()
                    );
                    for (inference, position) in watchers {
                        // Resume past the premise that just became derivable.
                        self.check(inference, position + 1);
                    }
                }
            } else if let Some(cursor) = self.to_expand.last_mut() {
                match cursor.advance() {
                    None => {
                        self.to_expand.pop();
                    }
                    Some(inference) => {
                        let exhausted = cursor.is_exhausted();
                        if self.derivable.contains(inference.conclusion()) {
                            // The goal is settled; the rest of its
                            // inferences cannot add anything.
                            self.to_expand.pop();
                        } else {
                            self.check(inference, 0);
                            if exhausted {
                                self.to_expand.pop();
                            }
                        }
                    }
                }
            } else {
                break;
            }
        }
    }

    /// Scans premises from `from`; parks the inference on the first premise
    /// not yet derivable, fires it if none remains.
    fn check(&mut self, inference: Inference<C>, from: usize) {
        let mut position = from;
        while let Some(premise) = inference.premises().get(position) {
            if !self.derivable.contains(premise) {
                let premise = premise.clone();
                self.add_watch(premise, inference, position);
                return;
            }
            position += 1;
        }
        self.fire(inference);
    }

    fn add_watch(&mut self, premise: C, inference: Inference<C>, position: usize) {
        trace!("Watching {:?} for {}", premise, inference);
        self.watched
            .entry(premise.clone())
            .or_default()
            .push((inference, position));
        if self.goals.insert(premise.clone()) {
            self.to_check.push_back(premise);
        }
    }

    fn fire(&mut self, inference: Inference<C>) {
        debug!("Fired {}", inference);
        self.metrics.record_inference_fired();
        let conclusion = inference.conclusion().clone();
        if self.derivable.insert(conclusion.clone()) {
            self.to_propagate.push_back(conclusion);
        }
        for premise in inference.premises() {
            self.fired
                .entry(premise.clone())
                .or_default()
                .insert(inference.clone());
        }
    }

    /// Breadth-first retraction from a freshly blocked conclusion: unwinds
    /// every recorded firing that used it as a premise, transitively. Watch
    /// entries are left in place; an `unblock` re-enters the goal if some
    /// inference still wants it.
    fn retract(&mut self, conclusion: &C) {
        let mut queue: VecDeque<C> = VecDeque::new();
        queue.push_back(conclusion.clone());

        while let Some(current) = queue.pop_front() {
            self.goals.remove(&current);
            if !self.derivable.remove(&current) {
                continue;
            }
            self.metrics.record_retraction();
            debug!("Retracting {:?}", current);

            for inference in self.fired.remove(&current).unwrap_or_default() {
                queue.push_back(inference.conclusion().clone());
                for premise in inference.premises() {
                    if premise == &current {
                        continue;
                    }
                    let emptied = match self.fired.get_mut(premise) {
                        Some(set) => {
                            set.remove(&inference);
                            set.is_empty()
                        }
                        None => false,
                    };
                    if emptied {
                        self.fired.remove(premise);
                    }
                }
            }
        }
    }
}
