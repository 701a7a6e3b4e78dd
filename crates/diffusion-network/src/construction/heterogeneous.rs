//! Heterogeneous-regular construction: per-group out-degree, balanced
//! in-degree.
//!
//! Every node of group `g` emits exactly `z_g` edges. Each edge first picks a
//! target group with probability proportional to `affinity(g, h)`, counting
//! only groups that still have an eligible member, then picks uniformly among
//! that group's eligible members of lowest in-degree. In-degrees live in one
//! [`DegreeBuckets`] per group and are promoted in place as edges are drawn.
//!
//! Excluding the source from its own targets can leave one member two above
//! its peers. A levelling pass then retargets drafted edges from the most to
//! the least loaded member of the same group, so the in-degree spread inside
//! every group ends at most one. The source, its out-degree and the chosen
//! target group of every edge are unchanged by the pass.

use std::collections::{BTreeMap, BTreeSet};

use diffusion_types::{GroupName, NodeId};
use rand::{Rng, RngCore};
use tracing::debug;

use super::{BuildContext, ConstructionAlgorithm, EdgeDraft, debug_assert_clean, pick_group};
use crate::degree::DegreeBuckets;
use crate::error::NetworkError;
use crate::graph::SocialNetwork;
use crate::params::PerGroup;
use crate::population::Population;
use crate::sampling::pick;

const NAME: &str = "heterogeneous_regular";

/// Per-group out-degree with in-degree balancing inside each target group.
#[derive(Debug, Clone, PartialEq)]
pub struct HeterogeneousRegular {
    out_degree: PerGroup<usize>,
}

impl HeterogeneousRegular {
    /// Create the rule from per-group out-degrees.
    pub const fn new(out_degree: PerGroup<usize>) -> Self {
        Self { out_degree }
    }

    /// Out-degree configured for `group`.
    pub fn out_degree(&self, group: &GroupName) -> Option<usize> {
        self.out_degree.get(group)
    }

    /// Drafts for every node in `sources`, balancing over `nodes`.
    ///
    /// `in_degree` seeds the buckets and `existing` lists the targets a
    /// source already points at, which are never drafted again.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn balanced_drafts<R: Rng + ?Sized>(
        &self,
        strategy: &'static str,
        population: &Population,
        nodes: &[NodeId],
        sources: &[NodeId],
        in_degree: impl Fn(NodeId) -> usize,
        existing: impl Fn(NodeId) -> Result<BTreeSet<NodeId>, NetworkError>,
        allow_self_loops: bool,
        rng: &mut R,
    ) -> Result<Vec<EdgeDraft>, NetworkError> {
        let mut balancer = Balancer::new(strategy, population, nodes, in_degree, allow_self_loops)?;
        let mut drafts = Vec::new();
        let mut targeted_by = BTreeMap::new();
        for &source in sources {
            let group = population.group_of(source)?;
            let count = self.out_degree.get(group).ok_or_else(|| NetworkError::UnknownGroup {
                strategy,
                group: group.clone(),
            })?;
            let mut targeted = existing(source)?;
            balancer.draw_targets(source, count, &mut targeted, &mut drafts, rng)?;
            targeted_by.insert(source, targeted);
        }
        let moved = balancer.level(&mut drafts, &mut targeted_by);
        if moved > 0 {
            debug!(strategy, moved, "levelled in-degrees");
        }
        debug_assert_clean(&drafts, allow_self_loops);
        Ok(drafts)
    }
}

impl ConstructionAlgorithm for HeterogeneousRegular {
    fn name(&self) -> &'static str {
        NAME
    }

    fn create_edges(
        &self,
        ctx: &BuildContext<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<EdgeDraft>, NetworkError> {
        let population = ctx.require_population(NAME)?;
        let ids = ctx.node_ids();
        self.balanced_drafts(
            NAME,
            population,
            &ids,
            &ids,
            |_| 0,
            |_| Ok(BTreeSet::new()),
            ctx.allow_self_loops,
            rng,
        )
    }

    fn add_nodes(
        &self,
        network: &SocialNetwork,
        new_nodes: &[NodeId],
        ctx: &BuildContext<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<EdgeDraft>, NetworkError> {
        let population = ctx.require_population(NAME)?;
        let degrees = network.in_degrees(ctx.medium);
        self.balanced_drafts(
            NAME,
            population,
            &network.node_ids(),
            new_nodes,
            |node| degrees.get(&node).copied().unwrap_or(0),
            |node| network.neighbours(node, ctx.medium).cloned(),
            ctx.allow_self_loops,
            rng,
        )
    }
}

/// In-degree buckets for every group, plus the affinity-driven target draw.
struct Balancer<'a> {
    strategy: &'static str,
    population: &'a Population,
    groups: Vec<&'a GroupName>,
    buckets: BTreeMap<&'a GroupName, DegreeBuckets>,
    allow_self_loops: bool,
}

impl<'a> Balancer<'a> {
    fn new(
        strategy: &'static str,
        population: &'a Population,
        nodes: &[NodeId],
        in_degree: impl Fn(NodeId) -> usize,
        allow_self_loops: bool,
    ) -> Result<Self, NetworkError> {
        let mut buckets: BTreeMap<&'a GroupName, DegreeBuckets> = BTreeMap::new();
        for &node in nodes {
            let group = population.group_of(node)?;
            buckets.entry(group).or_default().insert(node, in_degree(node));
        }
        Ok(Self {
            strategy,
            population,
            groups: population.groups().collect(),
            buckets,
            allow_self_loops,
        })
    }

    fn draw_targets<R: Rng + ?Sized>(
        &mut self,
        source: NodeId,
        count: usize,
        targeted: &mut BTreeSet<NodeId>,
        drafts: &mut Vec<EdgeDraft>,
        rng: &mut R,
    ) -> Result<(), NetworkError> {
        let population = self.population;
        let from = population.group_of(source)?;
        let exhausted = NetworkError::TargetsExhausted {
            strategy: self.strategy,
            node: source,
        };
        for _ in 0..count {
            let allow_self_loops = self.allow_self_loops;
            let seen = &*targeted;
            let eligible = |v: NodeId| !seen.contains(&v) && (allow_self_loops || v != source);
            let buckets = &self.buckets;
            let has_candidates = |g: &GroupName| {
                buckets
                    .get(g)
                    .is_some_and(|b| !b.least_eligible(&eligible).is_empty())
            };
            let group = pick_group(population, from, &self.groups, has_candidates, rng)
                .ok_or_else(|| exhausted.clone())?;
            let candidates = buckets
                .get(group)
                .map(|b| b.least_eligible(&eligible))
                .unwrap_or_default();
            let target = pick(&candidates, rng).ok_or_else(|| exhausted.clone())?;

            if let Some(bucket) = self.buckets.get_mut(group) {
                bucket.promote(target);
            }
            targeted.insert(target);
            drafts.push(EdgeDraft::new(source, target));
        }
        Ok(())
    }

    /// Retarget drafts from the highest to the lowest in-degree member of
    /// each group while the spread exceeds one. Returns the number of moves.
    ///
    /// Every move lowers the sum of squared in-degrees, so the loop ends.
    /// Only drafts move; degrees already present in the network do not.
    fn level(
        &mut self,
        drafts: &mut [EdgeDraft],
        targeted_by: &mut BTreeMap<NodeId, BTreeSet<NodeId>>,
    ) -> usize {
        let allow_self_loops = self.allow_self_loops;
        let mut moved = 0_usize;
        for bucket in self.buckets.values_mut() {
            while let Some((low, high)) = bucket.degree_range()
                && high.saturating_sub(low) > 1
            {
                let Some((index, light)) = find_transfer(bucket, low, high, drafts, targeted_by, allow_self_loops)
                else {
                    break;
                };
                let Some(draft) = drafts.get_mut(index) else {
                    break;
                };
                let heavy = draft.target;
                if let Some(seen) = targeted_by.get_mut(&draft.source) {
                    seen.remove(&heavy);
                    seen.insert(light);
                }
                draft.target = light;
                bucket.demote(heavy);
                bucket.promote(light);
                moved = moved.saturating_add(1);
            }
        }
        moved
    }
}

/// A draft into a node at `high` that can be pointed at a node at `low`
/// instead, as `(draft index, new target)`.
fn find_transfer(
    bucket: &DegreeBuckets,
    low: usize,
    high: usize,
    drafts: &[EdgeDraft],
    targeted_by: &BTreeMap<NodeId, BTreeSet<NodeId>>,
    allow_self_loops: bool,
) -> Option<(usize, NodeId)> {
    let heavy = bucket.at_degree(high);
    let light = bucket.at_degree(low);
    drafts.iter().enumerate().find_map(|(index, draft)| {
        if !heavy.contains(&draft.target) {
            return None;
        }
        let seen = targeted_by.get(&draft.source);
        light
            .iter()
            .copied()
            .find(|&w| (allow_self_loops || w != draft.source) && !seen.is_some_and(|s| s.contains(&w)))
            .map(|w| (index, w))
    })
}
