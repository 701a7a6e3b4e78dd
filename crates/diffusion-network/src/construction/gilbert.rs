//! Gilbert model: every ordered pair is an edge with a fixed probability.
//!
//! Over many builds the edge count of `n` nodes averages `p·n·(n−1)`
//! (`p·n²` when self-loops are allowed).

use std::collections::BTreeSet;

use diffusion_types::NodeId;
use rand::RngCore;

use super::{BuildContext, ConstructionAlgorithm, EdgeDraft, debug_assert_clean};
use crate::error::NetworkError;
use crate::graph::SocialNetwork;
use crate::sampling::chance;

const NAME: &str = "gilbert";

/// Independent edge inclusion with probability `p`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformProbability {
    probability: f64,
}

impl UniformProbability {
    /// Create the model.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::InvalidParameter`] unless `0 <= p <= 1`.
    pub fn new(probability: f64) -> Result<Self, NetworkError> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(NetworkError::InvalidParameter {
                strategy: NAME,
                parameter: "probability".to_owned(),
                reason: format!("probability must lie in [0, 1], got {probability}"),
            });
        }
        Ok(Self { probability })
    }

    /// Edge inclusion probability.
    pub const fn probability(&self) -> f64 {
        self.probability
    }

    fn decide(
        &self,
        nodes: &[NodeId],
        allow_self_loops: bool,
        include: impl Fn(NodeId, NodeId) -> bool,
        rng: &mut dyn RngCore,
    ) -> Vec<EdgeDraft> {
        let mut drafts = Vec::new();
        for &source in nodes {
            for &target in nodes {
                if source == target && !allow_self_loops {
                    continue;
                }
                if include(source, target) && chance(rng, self.probability) {
                    drafts.push(EdgeDraft::new(source, target));
                }
            }
        }
        drafts
    }
}

impl ConstructionAlgorithm for UniformProbability {
    fn name(&self) -> &'static str {
        NAME
    }

    fn create_edges(
        &self,
        ctx: &BuildContext<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<EdgeDraft>, NetworkError> {
        let ids = ctx.node_ids();
        let drafts = self.decide(&ids, ctx.allow_self_loops, |_, _| true, rng);
        debug_assert_clean(&drafts, ctx.allow_self_loops);
        Ok(drafts)
    }

    /// Every ordered pair touching a new node is decided once, in both
    /// directions.
    fn add_nodes(
        &self,
        network: &SocialNetwork,
        new_nodes: &[NodeId],
        ctx: &BuildContext<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<EdgeDraft>, NetworkError> {
        let fresh: BTreeSet<NodeId> = new_nodes.iter().copied().collect();
        let ids = network.node_ids();
        Ok(self.decide(
            &ids,
            ctx.allow_self_loops,
            |s, t| fresh.contains(&s) || fresh.contains(&t),
            rng,
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::cast_precision_loss)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::super::test_support::{MEDIUM, nodes};
    use super::super::Collaborators;
    use super::*;

    #[test]
    fn certain_probability_yields_complete_digraph() {
        let nodes = nodes(10);
        let ctx = BuildContext::new(&nodes, MEDIUM, false, Collaborators::none());
        let mut rng = SmallRng::seed_from_u64(1);
        let drafts = UniformProbability::new(1.0)
            .and_then(|m| m.create_edges(&ctx, &mut rng))
            .unwrap();
        assert_eq!(drafts.len(), 90);
        let unique: BTreeSet<_> = drafts.iter().collect();
        assert_eq!(unique.len(), 90);
        assert!(drafts.iter().all(|d| d.source != d.target));
    }

    #[test]
    fn self_loops_are_drafted_when_allowed() {
        let nodes = nodes(4);
        let ctx = BuildContext::new(&nodes, MEDIUM, true, Collaborators::none());
        let mut rng = SmallRng::seed_from_u64(1);
        let drafts = UniformProbability::new(1.0)
            .and_then(|m| m.create_edges(&ctx, &mut rng))
            .unwrap();
        assert_eq!(drafts.len(), 16);
    }

    #[test]
    fn zero_probability_yields_no_edges() {
        let nodes = nodes(10);
        let ctx = BuildContext::new(&nodes, MEDIUM, false, Collaborators::none());
        let mut rng = SmallRng::seed_from_u64(1);
        let drafts = UniformProbability::new(0.0).and_then(|m| m.create_edges(&ctx, &mut rng));
        assert_eq!(drafts, Ok(Vec::new()));
    }

    #[test]
    fn mean_edge_count_matches_expectation() {
        let n = 20_u128;
        let p = 0.3;
        let nodes = nodes(n);
        let ctx = BuildContext::new(&nodes, MEDIUM, false, Collaborators::none());
        let model = UniformProbability::new(p).unwrap();
        let mut rng = SmallRng::seed_from_u64(2024);
        let builds = 200_u32;
        let total: usize = (0..builds)
            .map(|_| model.create_edges(&ctx, &mut rng).unwrap().len())
            .sum();
        let mean = total as f64 / f64::from(builds);
        let expected = p * 20.0 * 19.0;
        // Standard error of the mean is sqrt(380·0.3·0.7/200) ≈ 0.63.
        assert!((mean - expected).abs() < 3.0, "mean {mean}, expected {expected}");
    }

    #[test]
    fn out_of_range_probability_rejected() {
        assert!(UniformProbability::new(-0.1).is_err());
        assert!(UniformProbability::new(1.1).is_err());
        assert!(UniformProbability::new(f64::NAN).is_err());
    }

    #[test]
    fn growth_only_decides_pairs_touching_new_nodes() {
        let mut network = SocialNetwork::with_nodes(nodes(4), false).unwrap();
        let newcomer = NodeId::from_index(3);
        network.connect(NodeId::from_index(0), NodeId::from_index(1), MEDIUM, 1.0).unwrap();
        let ctx = BuildContext::new(network.nodes(), MEDIUM, false, Collaborators::none());
        let mut rng = SmallRng::seed_from_u64(5);
        let fresh = [newcomer];
        let drafts = UniformProbability::new(1.0)
            .and_then(|m| m.add_nodes(&network, &fresh, &ctx, &mut rng))
            .unwrap();
        // Three existing partners, both directions.
        assert_eq!(drafts.len(), 6);
        assert!(drafts.iter().all(|d| d.source == newcomer || d.target == newcomer));
    }
}
