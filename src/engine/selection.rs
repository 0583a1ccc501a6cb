//! Pivot-selection strategies for the resolution engine.
//!
//! A strategy chooses, for each derived inference, the literal on which it
//! waits for resolution partners: `Some(premise)` indexes it under that
//! premise, `None` indexes it under its conclusion. Choosing the conclusion
//! of a goal inference that still has premises would leave the goal without a
//! terminal sink; every bundled strategy avoids this and the engine treats it
//! as an internal error.

use std::{
    collections::{HashMap, HashSet},
    hash::Hash,
};

/// What a strategy sees when choosing a pivot: the current goal and the
/// number of provider inferences deriving each initialized conclusion.
pub struct SelectionContext<'a, C> {
    goal: &'a C,
    inference_counts: &'a HashMap<C, usize>,
}

impl<'a, C: Eq + Hash> SelectionContext<'a, C> {
    pub(crate) fn new(goal: &'a C, inference_counts: &'a HashMap<C, usize>) -> Self {
        Self {
            goal,
            inference_counts,
        }
    }

    pub fn goal(&self) -> &C {
        self.goal
    }

    /// How many provider inferences derive `conclusion`. Every premise of a
    /// produced inference has been initialized, so lookups hit.
    pub fn inference_count(&self, conclusion: &C) -> usize {
        self.inference_counts.get(conclusion).copied().unwrap_or(0)
    }
}

/// A pluggable pivot choice. `None` means the conclusion.
pub trait Selection<C> {
    fn select(
        &self,
        conclusion: &C,
        premises: &HashSet<C>,
        ctx: &SelectionContext<'_, C>,
    ) -> Option<C>;
}

fn cheapest_premise<C>(premises: &HashSet<C>, ctx: &SelectionContext<'_, C>) -> Option<C>
where
    C: Clone + Eq + Hash,
{
    premises
        .iter()
        .min_by_key(|premise| ctx.inference_count(premise))
        .cloned()
}

/// Always resolves away the premise derived by the fewest provider
/// inferences; falls back to the conclusion only when there are no premises.
///
/// On cyclic graphs this strategy relies on justification subsumption for
/// termination: resolution does not strictly shrink the premise set, and the
/// engine stops producing once every new justification is covered.
#[derive(Debug, Clone, Copy, Default)]
pub struct BottomUpSelection;

impl<C: Clone + Eq + Hash> Selection<C> for BottomUpSelection {
    fn select(
        &self,
        _conclusion: &C,
        premises: &HashSet<C>,
        ctx: &SelectionContext<'_, C>,
    ) -> Option<C> {
        cheapest_premise(premises, ctx)
    }
}

/// Resolves on the conclusion except at the goal itself, where the cheapest
/// premise is taken instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct TopDownSelection;

impl<C: Clone + Eq + Hash> Selection<C> for TopDownSelection {
    fn select(
        &self,
        conclusion: &C,
        premises: &HashSet<C>,
        ctx: &SelectionContext<'_, C>,
    ) -> Option<C> {
        if conclusion == ctx.goal() {
            cheapest_premise(premises, ctx)
        } else {
            None
        }
    }
}

/// Takes the cheapest premise while its inference count stays within the
/// threshold; beyond it, switches to the conclusion unless the conclusion is
/// the goal. The factory default, with a threshold of 2.
#[derive(Debug, Clone, Copy)]
pub struct ThresholdSelection {
    pub threshold: usize,
}

impl Default for ThresholdSelection {
    fn default() -> Self {
        Self { threshold: 2 }
    }
}

impl<C: Clone + Eq + Hash> Selection<C> for ThresholdSelection {
    fn select(
        &self,
        conclusion: &C,
        premises: &HashSet<C>,
        ctx: &SelectionContext<'_, C>,
    ) -> Option<C> {
        let cheapest = cheapest_premise(premises, ctx)?;
        if ctx.inference_count(&cheapest) > self.threshold && conclusion != ctx.goal() {
            None
        } else {
            Some(cheapest)
        }
    }
}
