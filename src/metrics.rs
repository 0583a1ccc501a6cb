use std::fmt;

/// Specifies the level of metrics to collect while answering a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MetricsLevel {
    /// No metrics are collected. This should have zero runtime cost.
    None,
    /// Inexpensive counters are collected.
    Counters,
}

/// A trait for collecting metrics during a query.
/// This allows for different levels of detail without cluttering the engines
/// with conditionals.
pub trait MetricsSink: Default + Send + Sync {
    /// Records a queue element entering the resolution queue.
    fn record_produced_inference(&mut self);
    /// Records a derived inference accepted into the subsumption index.
    fn record_minimal_inference(&mut self);
    /// Zeros all counters.
    fn reset(&mut self);
    /// Records a derived inference shelved because its justification was
    /// already covered.
    fn record_blocked_inference(&mut self) {}
    /// Records a goal whose inference collection was pulled from the provider.
    fn record_goal_expanded(&mut self) {}
    /// Records an inference firing with all premises derivable.
    fn record_inference_fired(&mut self) {}
    /// Records a conclusion retracted while settling a block.
    fn record_retraction(&mut self) {}
}

// --- Sink implementations ---

/// A metrics sink that performs no operations, allowing the compiler to
/// eliminate all metrics-related code when used.
#[derive(Default, Debug)]
pub struct NoOpMetrics;

impl MetricsSink for NoOpMetrics {
    fn record_produced_inference(&mut self) { /* no-op */
    }
    fn record_minimal_inference(&mut self) { /* no-op */
    }
    fn reset(&mut self) { /* no-op */
    }
}

/// A metrics sink that collects simple counters.
#[derive(Default, Debug, Clone)]
pub struct CounterMetrics {
    pub produced_inferences: u64,
    pub minimal_inferences: u64,
    pub blocked_inferences: u64,
    pub goals_expanded: u64,
    pub inferences_fired: u64,
    pub retractions: u64,
}

impl MetricsSink for CounterMetrics {
    fn record_produced_inference(&mut self) {
        self.produced_inferences += 1;
    }
    fn record_minimal_inference(&mut self) {
        self.minimal_inferences += 1;
    }
    fn reset(&mut self) {
        *self = CounterMetrics::default();
    }
    fn record_blocked_inference(&mut self) {
        self.blocked_inferences += 1;
    }
    fn record_goal_expanded(&mut self) {
        self.goals_expanded += 1;
    }
    fn record_inference_fired(&mut self) {
        self.inferences_fired += 1;
    }
    fn record_retraction(&mut self) {
        self.retractions += 1;
    }
}

impl fmt::Display for CounterMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "produced={} minimal={} blocked={} expanded={} fired={} retracted={}",
            self.produced_inferences,
            self.minimal_inferences,
            self.blocked_inferences,
            self.goals_expanded,
            self.inferences_fired,
            self.retractions
        )
    }
}

/// The final report returned to the caller, containing the collected metrics.
#[derive(Debug)]
pub enum MetricsReport {
    None,
    Counters(CounterMetrics),
}
