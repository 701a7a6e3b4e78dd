//! Preferential attachment with pluggable attachment scores.
//!
//! The first `seed_size` nodes form a complete digraph, each credited with
//! degree `seed_size - 1`. Every later node then joins in insertion order:
//! it draws `edges_per_node` distinct targets among the nodes already present,
//! each with probability proportional to its [`AttachmentScore`] (nodes it
//! already points at score zero). Every chosen target's degree rises by one,
//! and the newcomer itself enters the bookkeeping at `pseudo_count`.
//!
//! Growing a built network credits nodes the same way: seed nodes with their
//! in-degree, every later node with its in-degree plus `pseudo_count`.

use std::collections::BTreeSet;

use diffusion_types::{Medium, NodeId};
use rand::{Rng, RngCore};

use super::regular::ring_edges;
use super::{BuildContext, ConstructionAlgorithm, EdgeDraft, debug_assert_clean};
use crate::error::NetworkError;
use crate::graph::SocialNetwork;
use crate::population::Geography;
use crate::sampling::CumulativeDistribution;

/// Distances below this are treated as this value.
pub const MIN_DISTANCE: f64 = 1e-9;

/// How attractive a present node is to a newcomer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttachmentScore {
    /// `degree^exponent` (Barabási–Albert for exponent 1).
    Degree {
        /// Exponent applied to the degree.
        exponent: f64,
    },
    /// `exp(-rate * distance)`.
    ExponentialDecay {
        /// Decay rate per unit distance.
        rate: f64,
    },
    /// `1 / distance²`.
    InverseSquare,
    /// `degree^degree_exponent * distance^distance_exponent` (Manna–Sen–Yook).
    DegreeDistance {
        /// Exponent applied to the degree.
        degree_exponent: f64,
        /// Exponent applied to the distance, usually negative.
        distance_exponent: f64,
    },
}

impl AttachmentScore {
    /// Configuration key of the attachment variant.
    pub const fn key(&self) -> &'static str {
        match self {
            Self::Degree { .. } => "barabasi_albert",
            Self::ExponentialDecay { .. } => "spatial_exponential",
            Self::InverseSquare => "spatial_power_law",
            Self::DegreeDistance { .. } => "manna_sen_yook",
        }
    }

    /// Whether the score reads node distances.
    pub const fn needs_geography(&self) -> bool {
        !matches!(self, Self::Degree { .. })
    }

    /// Distance subtracted from every candidate before scoring, given the
    /// distance to the nearest candidate.
    ///
    /// Exponential decay is shift-invariant once normalized, and shifting by
    /// the nearest candidate keeps its score at one for any distance scale.
    pub const fn distance_offset(&self, nearest: f64) -> f64 {
        match self {
            Self::ExponentialDecay { .. } if nearest.is_finite() => nearest,
            _ => 0.0,
        }
    }

    /// Score of a candidate with bookkeeping `degree` at `distance`.
    ///
    /// `distance` is ignored by degree-only scores and clamped to
    /// [`MIN_DISTANCE`] otherwise.
    pub fn score(&self, degree: f64, distance: f64) -> f64 {
        let distance = distance.max(MIN_DISTANCE);
        match *self {
            Self::Degree { exponent } => degree.powf(exponent),
            Self::ExponentialDecay { rate } => (-rate * distance).exp(),
            Self::InverseSquare => distance.powi(2).recip(),
            Self::DegreeDistance {
                degree_exponent,
                distance_exponent,
            } => degree.powf(degree_exponent) * distance.powf(distance_exponent),
        }
    }
}

/// Growth by preferential attachment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreferentialAttachment {
    seed_size: usize,
    edges_per_node: usize,
    pseudo_count: f64,
    score: AttachmentScore,
}

impl PreferentialAttachment {
    /// Create the rule.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::InvalidParameter`] unless `seed_size >= 2`,
    /// `1 <= edges_per_node <= seed_size` and `pseudo_count` is a
    /// non-negative number.
    pub fn new(
        seed_size: usize,
        edges_per_node: usize,
        pseudo_count: f64,
        score: AttachmentScore,
    ) -> Result<Self, NetworkError> {
        let strategy = score.key();
        let invalid = |parameter: &str, reason: String| NetworkError::InvalidParameter {
            strategy,
            parameter: parameter.to_owned(),
            reason,
        };
        if seed_size < 2 {
            return Err(invalid("seed_size", format!("seed size must be at least 2, got {seed_size}")));
        }
        if edges_per_node == 0 || edges_per_node > seed_size {
            return Err(invalid(
                "edges_per_node",
                format!("edges per node must lie in [1, {seed_size}], got {edges_per_node}"),
            ));
        }
        if !pseudo_count.is_finite() || pseudo_count < 0.0 {
            return Err(invalid(
                "pseudo_count",
                format!("pseudo count must be a non-negative number, got {pseudo_count}"),
            ));
        }
        Ok(Self {
            seed_size,
            edges_per_node,
            pseudo_count,
            score,
        })
    }

    /// The attachment score in use.
    pub const fn score(&self) -> AttachmentScore {
        self.score
    }

    fn geography<'a>(&self, ctx: &BuildContext<'a>) -> Result<Option<&'a dyn Geography>, NetworkError> {
        if self.score.needs_geography() {
            ctx.require_geography(self.score.key()).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Draw the targets of `newcomer` among `present` and update their
    /// degrees. The newcomer is appended to `present` afterwards.
    fn attach<R: Rng + ?Sized>(
        &self,
        present: &mut Vec<(NodeId, f64)>,
        newcomer: NodeId,
        already: &BTreeSet<NodeId>,
        geography: Option<&dyn Geography>,
        drafts: &mut Vec<EdgeDraft>,
        rng: &mut R,
    ) -> Result<(), NetworkError> {
        let mut chosen = already.clone();
        for _ in 0..self.edges_per_node {
            let mut candidates = Vec::with_capacity(present.len());
            for &(candidate, degree) in present.iter() {
                if chosen.contains(&candidate) || candidate == newcomer {
                    candidates.push(None);
                    continue;
                }
                let distance = match geography {
                    Some(geo) => geo
                        .distance(newcomer, candidate)
                        .ok_or(NetworkError::NodeNotFound(candidate))?,
                    None => MIN_DISTANCE,
                };
                candidates.push(Some((degree, distance)));
            }
            let nearest = candidates
                .iter()
                .flatten()
                .map(|&(_, distance)| distance)
                .fold(f64::INFINITY, f64::min);
            let offset = self.score.distance_offset(nearest);
            let weights = candidates.iter().map(|candidate| {
                candidate.map_or(0.0, |(degree, distance)| self.score.score(degree, distance - offset))
            });
            let dist = CumulativeDistribution::new(weights).ok_or(NetworkError::TargetsExhausted {
                strategy: self.score.key(),
                node: newcomer,
            })?;
            let Some((target, degree)) = present.get_mut(dist.sample(rng)) else {
                continue;
            };
            *degree += 1.0;
            chosen.insert(*target);
            drafts.push(EdgeDraft::new(newcomer, *target));
        }
        present.push((newcomer, self.pseudo_count));
        Ok(())
    }

    /// Seed clique plus one-by-one attachment of the remaining `ids`.
    /// Returns the drafts and the final degree bookkeeping.
    fn grow_from_seed<R: Rng + ?Sized>(
        &self,
        ids: &[NodeId],
        geography: Option<&dyn Geography>,
        rng: &mut R,
    ) -> Result<(Vec<EdgeDraft>, Vec<(NodeId, f64)>), NetworkError> {
        let (Some(seed), Some(rest)) = (ids.get(..self.seed_size), ids.get(self.seed_size..)) else {
            return Err(NetworkError::InvalidParameter {
                strategy: self.name(),
                parameter: "seed_size".to_owned(),
                reason: format!("seed size {} exceeds {} nodes", self.seed_size, ids.len()),
            });
        };
        let seed_degree = self.seed_size.saturating_sub(1);
        let mut drafts = ring_edges(seed, seed_degree);
        let mut present: Vec<(NodeId, f64)> = seed.iter().map(|&id| (id, count_weight(seed_degree))).collect();

        let none = BTreeSet::new();
        for &newcomer in rest {
            self.attach(&mut present, newcomer, &none, geography, &mut drafts, rng)?;
        }
        Ok((drafts, present))
    }

    /// Degree bookkeeping of the nodes already in `network`, in insertion
    /// order, leaving out `fresh`.
    fn credits(&self, network: &SocialNetwork, medium: Medium, fresh: &BTreeSet<NodeId>) -> Vec<(NodeId, f64)> {
        let degrees = network.in_degrees(medium);
        network
            .node_ids()
            .into_iter()
            .filter(|id| !fresh.contains(id))
            .enumerate()
            .map(|(position, id)| {
                let degree = count_weight(degrees.get(&id).copied().unwrap_or(0));
                let credit = if position < self.seed_size { 0.0 } else { self.pseudo_count };
                (id, degree + credit)
            })
            .collect()
    }
}

fn count_weight(count: usize) -> f64 {
    f64::from(u32::try_from(count).unwrap_or(u32::MAX))
}

impl ConstructionAlgorithm for PreferentialAttachment {
    fn name(&self) -> &'static str {
        self.score.key()
    }

    fn create_edges(
        &self,
        ctx: &BuildContext<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<EdgeDraft>, NetworkError> {
        let geography = self.geography(ctx)?;
        let (drafts, _) = self.grow_from_seed(&ctx.node_ids(), geography, rng)?;
        debug_assert_clean(&drafts, ctx.allow_self_loops);
        Ok(drafts)
    }

    /// Newcomers join one by one against the current in-degrees, credited
    /// as during construction.
    fn add_nodes(
        &self,
        network: &SocialNetwork,
        new_nodes: &[NodeId],
        ctx: &BuildContext<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<EdgeDraft>, NetworkError> {
        let geography = self.geography(ctx)?;
        let fresh: BTreeSet<NodeId> = new_nodes.iter().copied().collect();
        let mut present = self.credits(network, ctx.medium, &fresh);

        let mut drafts = Vec::new();
        for &newcomer in new_nodes {
            let already = network.neighbours(newcomer, ctx.medium)?.clone();
            self.attach(&mut present, newcomer, &already, geography, &mut drafts, rng)?;
        }
        debug_assert_clean(&drafts, ctx.allow_self_loops);
        Ok(drafts)
    }
}
