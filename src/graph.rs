//! The inference-graph data model and the provider seams the engines consume.
//!
//! An inference graph is a hypergraph: each [`Inference`] derives one
//! conclusion from a finite, ordered premise sequence. Axiom sets attach to
//! inferences through an [`InferenceJustifier`]. The engines read the graph
//! lazily through [`InferenceSet`] and keep their own caches, so providers
//! may construct inference collections on the fly as long as they stay
//! semantically stable within a query.

use std::{
    collections::{HashMap, HashSet},
    fmt,
    hash::Hash,
    sync::Arc,
};

use itertools::Itertools;

/// A single inference: one conclusion derived from a sequence of premises.
///
/// Premises may repeat; they are treated as a set during resolution, so
/// duplicates do not change semantics. The name is diagnostic only but does
/// participate in identity, which lets a justifier distinguish two inferences
/// with the same shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Inference<C> {
    conclusion: C,
    premises: Vec<C>,
    name: String,
}

impl<C> Inference<C> {
    pub fn new(conclusion: C, premises: Vec<C>, name: impl Into<String>) -> Self {
        Self {
            conclusion,
            premises,
            name: name.into(),
        }
    }

    pub fn conclusion(&self) -> &C {
        &self.conclusion
    }

    pub fn premises(&self) -> &[C] {
        &self.premises
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<C: PartialEq> Inference<C> {
    /// True when the conclusion appears among the premises. Tautologies are
    /// excluded from resolution.
    pub fn is_tautology(&self) -> bool {
        self.premises.contains(&self.conclusion)
    }
}

impl<C: fmt::Debug> fmt::Display for Inference<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{:?} <- {}]",
            self.name,
            self.conclusion,
            self.premises.iter().map(|p| format!("{p:?}")).join(", ")
        )
    }
}

/// The provider contract: for a conclusion, the finite collection of
/// inferences producing it. The collection must be semantically stable within
/// a query; each call may return a freshly built vector.
pub trait InferenceSet<C> {
    fn inferences_of(&self, conclusion: &C) -> Vec<Inference<C>>;
}

impl<C, S: InferenceSet<C> + ?Sized> InferenceSet<C> for &S {
    fn inferences_of(&self, conclusion: &C) -> Vec<Inference<C>> {
        (**self).inferences_of(conclusion)
    }
}

impl<C, S: InferenceSet<C> + ?Sized> InferenceSet<C> for Arc<S> {
    fn inferences_of(&self, conclusion: &C) -> Vec<Inference<C>> {
        (**self).inferences_of(conclusion)
    }
}

/// Supplies the set of atomic axioms an inference depends on.
pub trait InferenceJustifier<C, A> {
    fn justification_of(&self, inference: &Inference<C>) -> HashSet<A>;
}

impl<C, A, J: InferenceJustifier<C, A> + ?Sized> InferenceJustifier<C, A> for &J {
    fn justification_of(&self, inference: &Inference<C>) -> HashSet<A> {
        (**self).justification_of(inference)
    }
}

impl<C, A, J: InferenceJustifier<C, A> + ?Sized> InferenceJustifier<C, A> for Arc<J> {
    fn justification_of(&self, inference: &Inference<C>) -> HashSet<A> {
        (**self).justification_of(inference)
    }
}

/// Identifies a registered change listener for later removal.
pub type ListenerId = usize;

/// An inference set whose contents may change over time. Providers notify
/// listeners whenever a previously queried conclusion's inference collection
/// may have changed. Engines do not subscribe themselves; callers react by
/// discarding or rebuilding engine state.
pub trait DynamicInferenceSet<C>: InferenceSet<C> {
    fn add_listener(&mut self, listener: Box<dyn Fn() + Send>) -> ListenerId;
    fn remove_listener(&mut self, id: ListenerId);
    /// Drops all listeners and releases provider resources.
    fn dispose(&mut self);
}

/// An insert-based inference graph holding its own justifications. Serves as
/// the test substrate for the engines and as the carrier of the hitting-set
/// reduction.
pub struct InMemoryGraph<C, A> {
    inferences: HashMap<C, Vec<Inference<C>>>,
    justifications: HashMap<Inference<C>, HashSet<A>>,
    listeners: Vec<Option<Box<dyn Fn() + Send>>>,
}

impl<C: Clone + Eq + Hash, A: Clone + Eq + Hash> InMemoryGraph<C, A> {
    pub fn new() -> Self {
        Self {
            inferences: HashMap::new(),
            justifications: HashMap::new(),
            listeners: Vec::new(),
        }
    }

    /// Adds one inference with its justification. Re-inserting an identical
    /// inference replaces its justification.
    pub fn insert(
        &mut self,
        conclusion: C,
        premises: Vec<C>,
        name: impl Into<String>,
        axioms: impl IntoIterator<Item = A>,
    ) {
        let inference = Inference::new(conclusion.clone(), premises, name);
        let entry = self.inferences.entry(conclusion).or_default();
        if !entry.contains(&inference) {
            entry.push(inference.clone());
        }
        self.justifications
            .insert(inference, axioms.into_iter().collect());
        self.notify();
    }

    fn notify(&self) {
        for listener in self.listeners.iter().flatten() {
            listener();
        }
    }
}

impl<C: Clone + Eq + Hash, A: Clone + Eq + Hash> Default for InMemoryGraph<C, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clone + Eq + Hash, A> InferenceSet<C> for InMemoryGraph<C, A> {
    fn inferences_of(&self, conclusion: &C) -> Vec<Inference<C>> {
        self.inferences.get(conclusion).cloned().unwrap_or_default()
    }
}

impl<C: Clone + Eq + Hash, A: Clone + Eq + Hash> InferenceJustifier<C, A> for InMemoryGraph<C, A> {
    fn justification_of(&self, inference: &Inference<C>) -> HashSet<A> {
        self.justifications
            .get(inference)
            .cloned()
            .unwrap_or_default()
    }
}

impl<C: Clone + Eq + Hash, A: Clone + Eq + Hash> DynamicInferenceSet<C> for InMemoryGraph<C, A> {
    fn add_listener(&mut self, listener: Box<dyn Fn() + Send>) -> ListenerId {
        self.listeners.push(Some(listener));
        self.listeners.len() - 1
    }

    fn remove_listener(&mut self, id: ListenerId) {
        if let Some(slot) = self.listeners.get_mut(id) {
            *slot = None;
        }
    }

    fn dispose(&mut self) {
        self.listeners.clear();
    }
}
