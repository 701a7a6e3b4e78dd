//! Small-world rewiring on top of a heterogeneous-regular base.
//!
//! Each drafted edge is relocated with probability `β_g`, where `g` is the
//! source's group. The new target group is drawn by affinity among groups
//! that still hold a member the source does not already point at; the new
//! target is uniform inside that group. An edge with no admissible new
//! target stays where it is.

use std::collections::{BTreeMap, BTreeSet};

use diffusion_types::{GroupName, NodeId};
use rand::{Rng, RngCore};
use tracing::debug;

use super::heterogeneous::HeterogeneousRegular;
use super::{BuildContext, ConstructionAlgorithm, EdgeDraft, debug_assert_clean, pick_group};
use crate::error::NetworkError;
use crate::graph::SocialNetwork;
use crate::params::PerGroup;
use crate::population::Population;
use crate::sampling::{chance, pick};

const NAME: &str = "small_world";

/// Heterogeneous-regular base graph followed by per-group rewiring.
#[derive(Debug, Clone, PartialEq)]
pub struct SmallWorld {
    base: HeterogeneousRegular,
    rewire: PerGroup<f64>,
}

impl SmallWorld {
    /// Create the rule from per-group out-degrees and rewiring probabilities.
    pub const fn new(out_degree: PerGroup<usize>, rewire: PerGroup<f64>) -> Self {
        Self {
            base: HeterogeneousRegular::new(out_degree),
            rewire,
        }
    }

    fn rewire_drafts<R: Rng + ?Sized>(
        &self,
        population: &Population,
        nodes: &[NodeId],
        mut drafts: Vec<EdgeDraft>,
        existing: impl Fn(NodeId) -> Result<BTreeSet<NodeId>, NetworkError>,
        allow_self_loops: bool,
        rng: &mut R,
    ) -> Result<Vec<EdgeDraft>, NetworkError> {
        let mut members: BTreeMap<&GroupName, Vec<NodeId>> = BTreeMap::new();
        for &node in nodes {
            members.entry(population.group_of(node)?).or_default().push(node);
        }
        let groups: Vec<&GroupName> = population.groups().collect();

        let mut neighbours: BTreeMap<NodeId, BTreeSet<NodeId>> = BTreeMap::new();
        for draft in &drafts {
            if !neighbours.contains_key(&draft.source) {
                neighbours.insert(draft.source, existing(draft.source)?);
            }
            if let Some(set) = neighbours.get_mut(&draft.source) {
                set.insert(draft.target);
            }
        }

        let mut rewired = 0_usize;
        for draft in &mut drafts {
            let source = draft.source;
            let group = population.group_of(source)?;
            let beta = self.rewire.get(group).ok_or_else(|| NetworkError::UnknownGroup {
                strategy: NAME,
                group: group.clone(),
            })?;
            if !chance(rng, beta) {
                continue;
            }
            let Some(taken) = neighbours.get_mut(&source) else {
                continue;
            };
            let admissible = |v: NodeId| !taken.contains(&v) && (allow_self_loops || v != source);
            let has_candidates = |g: &GroupName| {
                members
                    .get(g)
                    .is_some_and(|m| m.iter().any(|&v| admissible(v)))
            };
            let Some(to) = pick_group(population, group, &groups, has_candidates, rng) else {
                continue;
            };
            let candidates: Vec<NodeId> = members
                .get(to)
                .map(|m| m.iter().copied().filter(|&v| admissible(v)).collect())
                .unwrap_or_default();
            let Some(target) = pick(&candidates, rng) else {
                continue;
            };
            taken.remove(&draft.target);
            taken.insert(target);
            draft.target = target;
            rewired = rewired.saturating_add(1);
        }
        debug!(strategy = NAME, drafts = drafts.len(), rewired, "rewired base graph");
        debug_assert_clean(&drafts, allow_self_loops);
        Ok(drafts)
    }
}

impl ConstructionAlgorithm for SmallWorld {
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
        let base = self.base.balanced_drafts(
            NAME,
            population,
            &ids,
            &ids,
            |_| 0,
            |_| Ok(BTreeSet::new()),
            ctx.allow_self_loops,
            &mut *rng,
        )?;
        self.rewire_drafts(
            population,
            &ids,
            base,
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
        let ids = network.node_ids();
        let degrees = network.in_degrees(ctx.medium);
        let current = |node: NodeId| network.neighbours(node, ctx.medium).cloned();
        let base = self.base.balanced_drafts(
            NAME,
            population,
            &ids,
            new_nodes,
            |node| degrees.get(&node).copied().unwrap_or(0),
            current,
            ctx.allow_self_loops,
            &mut *rng,
        )?;
        self.rewire_drafts(population, &ids, base, current, ctx.allow_self_loops, rng)
    }
}
