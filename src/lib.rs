use std::{collections::HashSet, fmt::Debug, hash::Hash};

use crate::{
    engine::{derivability::DerivabilityEngine, resolution::ResolutionEngine},
    error::EngineError,
    graph::{InferenceJustifier, InferenceSet},
    metrics::{CounterMetrics, MetricsLevel, MetricsReport},
};

pub mod engine;
pub mod error;
pub mod graph;
pub mod hitting;
pub mod interrupt;
pub mod metrics;
pub mod minimality;
pub mod priority;

/// Answers whether `goal` is derivable in `graph`: some inference produces
/// it whose every premise is recursively derivable.
///
/// One-shot convenience. Callers that query repeatedly or need blocking
/// should hold a [`DerivabilityEngine`] and reuse its state.
pub fn is_derivable<C, S>(graph: S, goal: &C) -> bool
where
    C: Clone + Eq + Hash + Debug,
    S: InferenceSet<C>,
{
    DerivabilityEngine::new(graph).is_derivable(goal)
}

/// Collects every subset-minimal justification of `goal`, smallest first.
///
/// One-shot convenience over [`ResolutionEngine`]; repeated queries against
/// one graph should reuse an engine so lifted inferences carry over.
pub fn justifications<C, A, S, J>(
    graph: S,
    justifier: J,
    goal: C,
) -> Result<Vec<HashSet<A>>, EngineError>
where
    C: Clone + Eq + Hash + Debug,
    A: Clone + Eq + Hash + Debug,
    S: InferenceSet<C>,
    J: InferenceJustifier<C, A>,
{
    let mut results = Vec::new();
    let mut engine = ResolutionEngine::new(graph, justifier);
    engine.enumerate(goal, |justification| results.push(justification.clone()))?;
    Ok(results)
}

/// Like [`justifications`], configured to a metrics level.
///
/// Dispatches to the appropriate generic implementation based on the desired
/// metrics level. This allows the compiler to monomorphize the engine's
/// execution path and eliminate the overhead of metrics collection when it
/// is not needed.
pub fn justifications_with_metrics<C, A, S, J>(
    graph: S,
    justifier: J,
    goal: C,
    metrics_level: MetricsLevel,
) -> Result<(Vec<HashSet<A>>, MetricsReport), EngineError>
where
    C: Clone + Eq + Hash + Debug,
    A: Clone + Eq + Hash + Debug,
    S: InferenceSet<C>,
    J: InferenceJustifier<C, A>,
{
    match metrics_level {
        MetricsLevel::None => {
            let results = justifications(graph, justifier, goal)?;
            Ok((results, MetricsReport::None))
        }
        MetricsLevel::Counters => {
            let mut results = Vec::new();
            let mut engine =
                ResolutionEngine::with_metrics(graph, justifier, CounterMetrics::default());
            engine.enumerate(goal, |justification| results.push(justification.clone()))?;
            Ok((results, MetricsReport::Counters(engine.into_metrics())))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        graph::InMemoryGraph,
        interrupt::SharedInterrupt,
        priority::CardinalityOrder,
    };

    type Graph = InMemoryGraph<&'static str, &'static str>;

    fn base_graph() -> Graph {
        // c <- a, b {x} ; a <- {y} ; b <- {z}
        let mut graph = Graph::new();
        graph.insert("c", vec!["a", "b"], "I1", ["x"]);
        graph.insert("a", vec![], "I2", ["y"]);
        graph.insert("b", vec![], "I3", ["z"]);
        graph
    }

    fn sorted_sets(sets: &[HashSet<&'static str>]) -> Vec<Vec<&'static str>> {
        let mut sorted: Vec<Vec<&str>> = sets
            .iter()
            .map(|set| {
                let mut elements: Vec<_> = set.iter().copied().collect();
                elements.sort();
                elements
            })
            .collect();
        sorted.sort();
        sorted
    }

    #[test]
    fn derivable_goal_yields_the_union_justification() {
        let _ = env_logger::builder().is_test(true).try_init();
        let graph = Arc::new(base_graph());
        assert!(is_derivable(Arc::clone(&graph), &"c"));

        let results = justifications(Arc::clone(&graph), graph, "c").unwrap();
        assert_eq!(sorted_sets(&results), vec![vec!["x", "y", "z"]]);
    }

    #[test]
    fn dead_end_inference_changes_nothing() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut graph = base_graph();
        graph.insert("c", vec!["d"], "I4", ["w"]);
        let graph = Arc::new(graph);

        assert!(is_derivable(Arc::clone(&graph), &"c"));
        let results = justifications(Arc::clone(&graph), graph, "c").unwrap();
        assert_eq!(sorted_sets(&results), vec![vec!["x", "y", "z"]]);
    }

    #[test]
    fn alternative_derivations_with_shared_axiom() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut graph = Graph::new();
        graph.insert("c", vec!["a"], "I1", ["x"]);
        graph.insert("c", vec!["b"], "I2", ["y"]);
        graph.insert("a", vec![], "I3", ["z"]);
        graph.insert("b", vec![], "I4", ["z"]);
        let graph = Arc::new(graph);

        let results = justifications(Arc::clone(&graph), graph, "c").unwrap();
        assert_eq!(sorted_sets(&results), vec![vec!["x", "z"], vec!["y", "z"]]);
    }

    #[test]
    fn blocking_flips_derivability() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut engine = DerivabilityEngine::new(base_graph());
        assert!(engine.is_derivable(&"c"));
        engine.block(&"a");
        assert!(!engine.is_derivable(&"c"));
        engine.unblock(&"a");
        assert!(engine.is_derivable(&"c"));
    }

    #[test]
    fn leaf_axioms_pinpoint_their_inferences() {
        let _ = env_logger::builder().is_test(true).try_init();
        // Leaf inferences carry singleton justifications, internal ones
        // carry none; the unique minimal justification names exactly the
        // leaves the goal depends on, and dropping any of them breaks
        // derivability.
        let mut graph = Graph::new();
        graph.insert("goal", vec!["left", "right"], "combine", []);
        graph.insert("left", vec![], "leaf-l", ["l"]);
        graph.insert("right", vec![], "leaf-r", ["r"]);
        let graph = Arc::new(graph);

        let results = justifications(Arc::clone(&graph), Arc::clone(&graph), "goal").unwrap();
        assert_eq!(sorted_sets(&results), vec![vec!["l", "r"]]);

        for leaf in ["left", "right"] {
            let mut engine = DerivabilityEngine::new(Arc::clone(&graph));
            engine.block(&leaf);
            assert!(!engine.is_derivable(&"goal"));
        }
    }

    #[test]
    fn interrupted_enumeration_keeps_partial_results_valid() {
        let _ = env_logger::builder().is_test(true).try_init();
        let graph = Arc::new(base_graph());
        let mut engine = ResolutionEngine::new(Arc::clone(&graph), graph);

        let interrupt = SharedInterrupt::new();
        interrupt.interrupt();

        let mut emitted: Vec<HashSet<&str>> = Vec::new();
        engine
            .enumerate_with("c", CardinalityOrder, &interrupt, |justification| {
                emitted.push(justification.clone())
            })
            .unwrap();
        assert!(emitted.is_empty());

        // The same engine finishes the query once the signal is lowered.
        interrupt.clear();
        let mut emitted: Vec<HashSet<&str>> = Vec::new();
        engine
            .enumerate_with("c", CardinalityOrder, &interrupt, |justification| {
                emitted.push(justification.clone())
            })
            .unwrap();
        assert_eq!(sorted_sets(&emitted), vec![vec!["x", "y", "z"]]);
    }

    #[test]
    fn metrics_dispatch_reports_counters() {
        let _ = env_logger::builder().is_test(true).try_init();
        let graph = Arc::new(base_graph());
        let (results, report) = justifications_with_metrics(
            Arc::clone(&graph),
            graph,
            "c",
            MetricsLevel::Counters,
        )
        .unwrap();

        assert_eq!(results.len(), 1);
        match report {
            MetricsReport::Counters(counters) => {
                assert!(counters.produced_inferences > 0);
                assert!(counters.minimal_inferences > 0);
            }
            other => panic!("Expected counters, got {:?}", other),
        }
    }
}
