//! Exact edge count over uniformly drawn ordered pairs.

use std::collections::BTreeSet;

use rand::RngCore;

use super::{BuildContext, ConstructionAlgorithm, EdgeDraft, debug_assert_clean};
use crate::error::NetworkError;
use crate::sampling::{RetryBudget, pick};

const NAME: &str = "fixed_edge_count";

/// Draw uniformly random ordered pairs until exactly `edges` distinct ones
/// have been accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedEdgeCount {
    edges: usize,
    budget: RetryBudget,
}

impl FixedEdgeCount {
    /// Create the rule with the default retry budget.
    pub fn new(edges: usize) -> Self {
        Self {
            edges,
            budget: RetryBudget::default(),
        }
    }

    /// Override the per-edge retry budget.
    #[must_use]
    pub const fn with_budget(mut self, budget: RetryBudget) -> Self {
        self.budget = budget;
        self
    }

    /// Number of edges every build produces.
    pub const fn edges(&self) -> usize {
        self.edges
    }

    fn check_capacity(&self, n: usize, allow_self_loops: bool) -> Result<(), NetworkError> {
        let per_node = if allow_self_loops { n } else { n.saturating_sub(1) };
        let capacity = n.saturating_mul(per_node);
        if self.edges > capacity {
            return Err(NetworkError::InvalidParameter {
                strategy: NAME,
                parameter: "edges".to_owned(),
                reason: format!("{} edges requested but {n} nodes admit only {capacity}", self.edges),
            });
        }
        Ok(())
    }
}

impl ConstructionAlgorithm for FixedEdgeCount {
    fn name(&self) -> &'static str {
        NAME
    }

    fn create_edges(
        &self,
        ctx: &BuildContext<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<EdgeDraft>, NetworkError> {
        let ids = ctx.node_ids();
        self.check_capacity(ids.len(), ctx.allow_self_loops)?;

        let mut chosen = BTreeSet::new();
        let mut drafts = Vec::with_capacity(self.edges);
        while drafts.len() < self.edges {
            let draft = self.budget.sample(NAME, &mut *rng, |rng| {
                let source = pick(&ids, rng)?;
                let target = pick(&ids, rng)?;
                let draft = EdgeDraft::new(source, target);
                let allowed = ctx.allow_self_loops || source != target;
                (allowed && !chosen.contains(&draft)).then_some(draft)
            })?;
            chosen.insert(draft);
            drafts.push(draft);
        }
        debug_assert_clean(&drafts, ctx.allow_self_loops);
        Ok(drafts)
    }
}
