//! Graph construction algorithms.
//!
//! Each algorithm is a small strategy value implementing
//! [`ConstructionAlgorithm`]: given the node set of one medium (plus
//! whatever collaborators it needs) it decides which directed edges should
//! exist and returns them as [`EdgeDraft`]s. Weights and labels are attached
//! when the drafts are installed into a [`SocialNetwork`].
//!
//! Algorithms that have a well-defined rule for growing an existing network
//! override [`ConstructionAlgorithm::add_nodes`]; the rest keep the default,
//! which reports [`NetworkError::Unsupported`].
//!
//! - [`gilbert`] -- independent edge probability (Gilbert)
//! - [`fixed_count`] -- exact edge count (Erdős–Rényi style)
//! - [`regular`] -- ring lattice with exact in/out-degree
//! - [`heterogeneous`] -- per-group out-degree with balanced in-degree
//! - [`small_world`] -- heterogeneous base plus affinity-guided rewiring
//! - [`scale_free`] -- preferential attachment with pluggable scores

pub mod fixed_count;
pub mod gilbert;
pub mod heterogeneous;
pub mod regular;
pub mod scale_free;
pub mod small_world;

use std::collections::BTreeSet;

use diffusion_types::{GroupName, Medium, Node, NodeId};
use rand::{Rng, RngCore};

use crate::error::NetworkError;
use crate::graph::SocialNetwork;
use crate::population::{Geography, Population};
use crate::sampling::CumulativeDistribution;

pub use fixed_count::FixedEdgeCount;
pub use gilbert::UniformProbability;
pub use heterogeneous::HeterogeneousRegular;
pub use regular::DegreeRegular;
pub use scale_free::{AttachmentScore, PreferentialAttachment};
pub use small_world::SmallWorld;

/// A directed edge an algorithm wants to exist, before weighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeDraft {
    /// Node the edge leaves.
    pub source: NodeId,
    /// Node the edge enters.
    pub target: NodeId,
}

impl EdgeDraft {
    /// Create a draft.
    pub const fn new(source: NodeId, target: NodeId) -> Self {
        Self { source, target }
    }
}

/// External collaborators some algorithms depend on.
#[derive(Clone, Copy, Default)]
pub struct Collaborators<'a> {
    /// Group membership and affinities.
    pub population: Option<&'a Population>,
    /// Node positions and distances.
    pub geography: Option<&'a dyn Geography>,
}

impl core::fmt::Debug for Collaborators<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Collaborators")
            .field("population", &self.population.map(Population::len))
            .field("geography", &self.geography.is_some())
            .finish()
    }
}

impl<'a> Collaborators<'a> {
    /// No collaborators.
    pub const fn none() -> Self {
        Self {
            population: None,
            geography: None,
        }
    }

    /// Attach a population.
    #[must_use]
    pub const fn with_population(mut self, population: &'a Population) -> Self {
        self.population = Some(population);
        self
    }

    /// Attach a geography.
    #[must_use]
    pub const fn with_geography(mut self, geography: &'a dyn Geography) -> Self {
        self.geography = Some(geography);
        self
    }
}

/// Everything an algorithm sees while deciding edges for one medium.
#[derive(Debug, Clone, Copy)]
pub struct BuildContext<'a> {
    /// Every node of the network, in insertion order.
    pub nodes: &'a [Node],
    /// The medium being built.
    pub medium: Medium,
    /// Whether an edge may start and end at the same node.
    pub allow_self_loops: bool,
    /// External collaborators.
    pub collaborators: Collaborators<'a>,
}

impl<'a> BuildContext<'a> {
    /// Create a context.
    pub const fn new(
        nodes: &'a [Node],
        medium: Medium,
        allow_self_loops: bool,
        collaborators: Collaborators<'a>,
    ) -> Self {
        Self {
            nodes,
            medium,
            allow_self_loops,
            collaborators,
        }
    }

    /// The population, or an error naming the strategy that needed it.
    pub fn require_population(&self, strategy: &'static str) -> Result<&'a Population, NetworkError> {
        self.collaborators
            .population
            .ok_or(NetworkError::MissingCollaborator {
                strategy,
                collaborator: "population",
            })
    }

    /// The geography, or an error naming the strategy that needed it.
    pub fn require_geography(&self, strategy: &'static str) -> Result<&'a dyn Geography, NetworkError> {
        self.collaborators
            .geography
            .ok_or(NetworkError::MissingCollaborator {
                strategy,
                collaborator: "geography",
            })
    }

    /// Node IDs in insertion order.
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.iter().map(|n| n.id).collect()
    }
}

/// Strategy deciding the edges of a network.
pub trait ConstructionAlgorithm: core::fmt::Debug {
    /// Configuration key of the algorithm.
    fn name(&self) -> &'static str;

    /// Decide the initial edge set for `ctx.medium`.
    ///
    /// Drafts never contain duplicates, and contain self-loops only when
    /// `ctx.allow_self_loops` is set.
    fn create_edges(
        &self,
        ctx: &BuildContext<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<EdgeDraft>, NetworkError>;

    /// Decide the edges that attach `new_nodes` to an existing network.
    ///
    /// `network` already contains the new nodes as isolated nodes and the
    /// existing edges of every medium.
    fn add_nodes(
        &self,
        network: &SocialNetwork,
        new_nodes: &[NodeId],
        ctx: &BuildContext<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<EdgeDraft>, NetworkError> {
        let _ = (network, new_nodes, ctx, rng);
        Err(NetworkError::Unsupported {
            strategy: self.name(),
            operation: "incremental node addition",
        })
    }
}

/// Pick a target group for an edge leaving `from`, proportional to
/// affinity, among the groups for which `has_candidates` holds.
pub(crate) fn pick_group<'g, R: Rng + ?Sized>(
    population: &Population,
    from: &GroupName,
    groups: &[&'g GroupName],
    has_candidates: impl Fn(&GroupName) -> bool,
    rng: &mut R,
) -> Option<&'g GroupName> {
    let affinity = population.affinity();
    let weights = groups.iter().map(|&to| {
        if has_candidates(to) {
            affinity.get(from, to)
        } else {
            0.0
        }
    });
    let dist = CumulativeDistribution::new(weights)?;
    groups.get(dist.sample(rng)).copied()
}

/// Check that no draft repeats and no forbidden self-loop slipped through.
pub(crate) fn debug_assert_clean(drafts: &[EdgeDraft], allow_self_loops: bool) {
    if cfg!(debug_assertions) {
        let unique: BTreeSet<&EdgeDraft> = drafts.iter().collect();
        debug_assert_eq!(unique.len(), drafts.len(), "duplicate edge drafts");
        debug_assert!(
            allow_self_loops || drafts.iter().all(|d| d.source != d.target),
            "forbidden self-loop drafted"
        );
    }
}
