//! The network aggregate: a graph plus the strategies that built it and keep
//! evolving it.
//!
//! A [`NetworkBlueprint`] composes one construction algorithm per medium, a
//! weight scheme, and a topology scheme. [`NetworkBlueprint::build`] turns it
//! into a [`DiffusionNetwork`], which the driver then advances tick by tick.

use std::collections::BTreeMap;

use diffusion_types::{Medium, Node, NodeId};
use rand::RngCore;
use tracing::{debug, info, warn};

use crate::construction::{BuildContext, Collaborators, ConstructionAlgorithm, EdgeDraft};
use crate::error::NetworkError;
use crate::factory::{self, NetworkSpec};
use crate::graph::SocialNetwork;
use crate::topology::{StaticTopology, TopologyReport, TopologyScheme};
use crate::weight::{ConstantWeight, EdgeWeightScheme};

/// Strategies waiting for a node set.
#[derive(Debug)]
pub struct NetworkBlueprint {
    allow_self_loops: bool,
    constructions: BTreeMap<Medium, Box<dyn ConstructionAlgorithm>>,
    weights: Box<dyn EdgeWeightScheme>,
    topology: Box<dyn TopologyScheme>,
}

impl NetworkBlueprint {
    /// A blueprint with no media, constant unit weights and a static topology.
    pub fn new(allow_self_loops: bool) -> Self {
        Self {
            allow_self_loops,
            constructions: BTreeMap::new(),
            weights: Box::new(ConstantWeight::default()),
            topology: Box::new(StaticTopology),
        }
    }

    /// Resolve every strategy named in `spec`.
    ///
    /// # Errors
    ///
    /// Returns the first factory error encountered.
    pub fn from_config(spec: &NetworkSpec) -> Result<Self, NetworkError> {
        let mut blueprint = Self::new(spec.self_referential)
            .with_weights(factory::weight_scheme(&spec.weights.kind, &spec.weights.params)?)
            .with_topology(factory::topology_scheme(&spec.topology.kind, &spec.topology.params)?);
        for (&medium, strategy) in &spec.media {
            blueprint = blueprint.with_construction(medium, factory::construction(&strategy.kind, &strategy.params)?);
        }
        Ok(blueprint)
    }

    /// Use `algorithm` to build `medium`.
    #[must_use]
    pub fn with_construction(mut self, medium: Medium, algorithm: Box<dyn ConstructionAlgorithm>) -> Self {
        self.constructions.insert(medium, algorithm);
        self
    }

    /// Use `weights` for every new edge.
    #[must_use]
    pub fn with_weights(mut self, weights: Box<dyn EdgeWeightScheme>) -> Self {
        self.weights = weights;
        self
    }

    /// Use `topology` every tick.
    #[must_use]
    pub fn with_topology(mut self, topology: Box<dyn TopologyScheme>) -> Self {
        self.topology = topology;
        self
    }

    /// Build the initial graph over `nodes`.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::DuplicateNode`] for repeated nodes and any
    /// error raised by a construction algorithm.
    pub fn build(
        self,
        nodes: Vec<Node>,
        collaborators: Collaborators<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<DiffusionNetwork, NetworkError> {
        let mut graph = SocialNetwork::with_nodes(nodes, self.allow_self_loops)?;
        for (&medium, algorithm) in &self.constructions {
            let ctx = BuildContext::new(graph.nodes(), medium, self.allow_self_loops, collaborators);
            let drafts = algorithm.create_edges(&ctx, rng)?;
            let installed = install(&mut graph, medium, &drafts, 0, self.weights.as_ref(), rng)?;
            info!(
                medium = %medium,
                algorithm = algorithm.name(),
                nodes = graph.node_count(),
                edges = installed,
                "constructed medium"
            );
            if installed == 0 && graph.node_count() > 1 {
                warn!(medium = %medium, algorithm = algorithm.name(), "medium built without edges");
            }
        }
        Ok(DiffusionNetwork {
            graph,
            allow_self_loops: self.allow_self_loops,
            constructions: self.constructions,
            weights: self.weights,
            topology: self.topology,
        })
    }
}

/// Turn drafts into weighted, labelled edges created at `tick`.
fn install(
    graph: &mut SocialNetwork,
    medium: Medium,
    drafts: &[EdgeDraft],
    tick: u64,
    weights: &dyn EdgeWeightScheme,
    rng: &mut dyn RngCore,
) -> Result<usize, NetworkError> {
    for draft in drafts {
        let weight = weights.weigh_edge(draft.source, draft.target, medium, rng);
        graph.connect_at(draft.source, draft.target, medium, weight, tick)?;
    }
    Ok(drafts.len())
}

/// A built social network together with its evolution strategies.
#[derive(Debug)]
pub struct DiffusionNetwork {
    graph: SocialNetwork,
    allow_self_loops: bool,
    constructions: BTreeMap<Medium, Box<dyn ConstructionAlgorithm>>,
    weights: Box<dyn EdgeWeightScheme>,
    topology: Box<dyn TopologyScheme>,
}

impl DiffusionNetwork {
    /// Read access to the graph.
    pub const fn graph(&self) -> &SocialNetwork {
        &self.graph
    }

    /// Media that have a construction algorithm.
    pub fn media(&self) -> impl Iterator<Item = Medium> + '_ {
        self.constructions.keys().copied()
    }

    /// Construction algorithm of `medium`.
    pub fn construction(&self, medium: Medium) -> Option<&dyn ConstructionAlgorithm> {
        self.constructions.get(&medium).map(|algorithm| algorithm.as_ref())
    }

    /// The weight scheme.
    pub fn weights(&self) -> &dyn EdgeWeightScheme {
        self.weights.as_ref()
    }

    /// The topology scheme.
    pub fn topology(&self) -> &dyn TopologyScheme {
        self.topology.as_ref()
    }

    /// Run the topology scheme on one medium.
    ///
    /// # Errors
    ///
    /// Propagates the scheme's error. The graph stays consistent, but edges
    /// changed before the failure remain changed.
    pub fn manipulate_topology(
        &mut self,
        medium: Medium,
        tick: u64,
        rng: &mut dyn RngCore,
    ) -> Result<TopologyReport, NetworkError> {
        let report = self
            .topology
            .manipulate_topology(&mut self.graph, medium, self.weights.as_ref(), tick, rng)?;
        debug!(
            tick,
            medium = %medium,
            scheme = self.topology.name(),
            added = report.added,
            removed = report.removed,
            rewired = report.rewired,
            "topology manipulated"
        );
        Ok(report)
    }

    /// Run the topology scheme on every medium, in medium order.
    ///
    /// # Errors
    ///
    /// Stops at the first failing medium.
    pub fn manipulate_all(&mut self, tick: u64, rng: &mut dyn RngCore) -> Result<TopologyReport, NetworkError> {
        let mut total = TopologyReport::default();
        for medium in Medium::ALL {
            let report = self.manipulate_topology(medium, tick, rng)?;
            total.added = total.added.saturating_add(report.added);
            total.removed = total.removed.saturating_add(report.removed);
            total.rewired = total.rewired.saturating_add(report.rewired);
        }
        Ok(total)
    }

    /// Recompute every edge weight for `tick`. Returns the number of edges
    /// whose weight changed.
    pub fn reweigh_edges(&mut self, tick: u64) -> usize {
        let updates: Vec<_> = self
            .graph
            .edges()
            .map(|edge| (edge.key(), edge.weight, self.weights.reweigh_edge(edge, tick)))
            .collect();
        let mut changed = 0_usize;
        for (key, old, new) in updates {
            if (old - new).abs() > f64::EPSILON && self.graph.set_edge_weight(&key, new).is_ok() {
                changed = changed.saturating_add(1);
            }
        }
        debug!(tick, scheme = self.weights.name(), changed, "edges reweighed");
        changed
    }

    /// Add `nodes` at `tick` and attach them on every constructed medium.
    ///
    /// Growth is all-or-nothing: if any medium's algorithm cannot grow, the
    /// network is left untouched. Returns the number of edges added.
    ///
    /// # Errors
    ///
    /// [`NetworkError::DuplicateNode`] for nodes already present,
    /// [`NetworkError::Unsupported`] for algorithms without a growth rule,
    /// and any error of the growth rule itself.
    pub fn grow(
        &mut self,
        nodes: Vec<Node>,
        tick: u64,
        collaborators: Collaborators<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<usize, NetworkError> {
        let mut next = self.graph.clone();
        let fresh: Vec<NodeId> = nodes.iter().map(|n| n.id).collect();
        for node in nodes {
            next.add_isolated_node(node)?;
        }
        let mut added = 0_usize;
        for (&medium, algorithm) in &self.constructions {
            let ctx = BuildContext::new(next.nodes(), medium, self.allow_self_loops, collaborators);
            let drafts = algorithm.add_nodes(&next, &fresh, &ctx, rng)?;
            added = added.saturating_add(install(&mut next, medium, &drafts, tick, self.weights.as_ref(), rng)?);
        }
        self.graph = next;
        info!(tick, nodes = fresh.len(), edges = added, total_nodes = self.graph.node_count(), "network grown");
        Ok(added)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;
    use crate::construction::{DegreeRegular, FixedEdgeCount, UniformProbability};
    use crate::factory::StrategySpec;
    use crate::params::Parameters;
    use crate::topology::IndependentAddDelete;
    use crate::weight::DecayingWeight;

    fn nodes(range: std::ops::Range<u128>) -> Vec<Node> {
        range.map(|i| Node::new(NodeId::from_index(i), format!("agent-{i}"))).collect()
    }

    fn gilbert(p: f64) -> Box<dyn ConstructionAlgorithm> {
        Box::new(UniformProbability::new(p).unwrap())
    }

    #[test]
    fn scenario_complete_digraph() {
        let mut rng = SmallRng::seed_from_u64(1);
        let network = NetworkBlueprint::new(false)
            .with_construction(Medium::Communication, gilbert(1.0))
            .build(nodes(0..10), Collaborators::none(), &mut rng)
            .unwrap();
        assert_eq!(network.graph().edge_count_for(Medium::Communication), 90);
        assert_eq!(network.graph().edge_count_for(Medium::Trust), 0);
        assert!(network.graph().edges().all(|e| e.source != e.target));
        assert!(network.graph().edges().all(|e| (e.weight - 1.0).abs() < f64::EPSILON));
    }

    #[test]
    fn scenario_ring_lattice() {
        let mut rng = SmallRng::seed_from_u64(1);
        let network = NetworkBlueprint::new(false)
            .with_construction(Medium::Trust, Box::new(DegreeRegular::new(2)))
            .build(nodes(0..5), Collaborators::none(), &mut rng)
            .unwrap();
        let graph = network.graph();
        assert_eq!(graph.edge_count(), 10);
        for node in graph.node_ids() {
            assert_eq!(graph.out_degree(node, Medium::Trust), 2);
            assert_eq!(graph.in_degree(node, Medium::Trust), 2);
        }
    }

    #[test]
    fn from_config_wires_every_strategy() {
        let spec = NetworkSpec {
            self_referential: false,
            media: BTreeMap::from([
                (Medium::Communication, StrategySpec::new("degree_regular", Parameters::new().with("degree", 1))),
                (Medium::Trust, StrategySpec::new("gilbert", Parameters::new().with("probability", 0.0))),
            ]),
            weights: StrategySpec::new("constant", Parameters::new().with("weight", 0.5)),
            topology: StrategySpec::new("random_rewire", Parameters::new().with("rewire_probability", 0.5)),
        };
        let blueprint = NetworkBlueprint::from_config(&spec).unwrap();
        let mut rng = SmallRng::seed_from_u64(2);
        let mut network = blueprint.build(nodes(0..6), Collaborators::none(), &mut rng).unwrap();
        assert_eq!(network.media().collect::<Vec<_>>(), vec![Medium::Communication, Medium::Trust]);
        assert_eq!(network.topology().name(), "random_rewire");
        assert_eq!(network.graph().edge_count(), 6);

        let report = network.manipulate_all(1, &mut rng).unwrap();
        assert_eq!(network.graph().edge_count(), 6);
        assert!(report.rewired <= 6);
        assert!(network.graph().edges().all(|e| (e.weight - 0.5).abs() < f64::EPSILON));
    }

    #[test]
    fn from_config_reports_bad_keys() {
        let spec = NetworkSpec {
            media: BTreeMap::from([(Medium::Trust, StrategySpec::new("bogus", Parameters::new()))]),
            ..NetworkSpec::default()
        };
        assert!(matches!(
            NetworkBlueprint::from_config(&spec),
            Err(NetworkError::UnknownStrategy { kind: "graph", .. })
        ));
    }

    #[test]
    fn reweigh_applies_decay() {
        let mut rng = SmallRng::seed_from_u64(3);
        let decay = DecayingWeight::new(1.0, 1.0, 0.0).unwrap();
        let mut network = NetworkBlueprint::new(false)
            .with_construction(Medium::Communication, Box::new(DegreeRegular::new(1)))
            .with_weights(Box::new(decay))
            .build(nodes(0..4), Collaborators::none(), &mut rng)
            .unwrap();
        assert_eq!(network.reweigh_edges(0), 0);
        assert_eq!(network.reweigh_edges(1), 4);
        assert!(network.graph().edges().all(|e| (e.weight - 0.5).abs() < 1e-12));
    }

    #[test]
    fn edges_inserted_mid_run_decay_from_their_own_tick() {
        let mut rng = SmallRng::seed_from_u64(5);
        let mut network = NetworkBlueprint::new(false)
            .with_construction(Medium::Communication, gilbert(0.0))
            .with_weights(Box::new(DecayingWeight::new(1.0, 10.0, 0.1).unwrap()))
            .with_topology(Box::new(IndependentAddDelete::new(0.0, 1.0).unwrap()))
            .build(nodes(0..2), Collaborators::none(), &mut rng)
            .unwrap();

        let report = network.manipulate_topology(Medium::Communication, 100, &mut rng).unwrap();
        assert_eq!(report.added, 2);
        assert_eq!(network.reweigh_edges(100), 0);
        assert!(network.graph().edges().all(|e| (e.weight - 1.0).abs() < 1e-12));

        network.reweigh_edges(110);
        assert!(network.graph().edges().all(|e| (e.weight - 0.5).abs() < 1e-12));
    }

    #[test]
    fn growth_is_atomic_when_a_medium_cannot_grow() {
        let mut rng = SmallRng::seed_from_u64(4);
        let mut network = NetworkBlueprint::new(false)
            .with_construction(Medium::Communication, gilbert(1.0))
            .with_construction(Medium::Trust, Box::new(DegreeRegular::new(1)))
            .build(nodes(0..4), Collaborators::none(), &mut rng)
            .unwrap();
        let before = network.graph().edge_count();
        let result = network.grow(nodes(4..6), 3, Collaborators::none(), &mut rng);
        assert!(matches!(result, Err(NetworkError::Unsupported { strategy: "degree_regular", .. })));
        assert_eq!(network.graph().node_count(), 4);
        assert_eq!(network.graph().edge_count(), before);
    }

    #[test]
    fn fixed_edge_count_cannot_grow() {
        let mut rng = SmallRng::seed_from_u64(4);
        let mut network = NetworkBlueprint::new(false)
            .with_construction(Medium::Trust, Box::new(FixedEdgeCount::new(5)))
            .build(nodes(0..4), Collaborators::none(), &mut rng)
            .unwrap();
        assert_eq!(network.graph().edge_count(), 5);
        assert!(matches!(
            network.grow(nodes(4..5), 1, Collaborators::none(), &mut rng),
            Err(NetworkError::Unsupported { strategy: "fixed_edge_count", .. })
        ));
        assert_eq!(network.graph().node_count(), 4);
    }

    #[test]
    fn growth_adds_nodes_and_edges() {
        let mut rng = SmallRng::seed_from_u64(4);
        let mut network = NetworkBlueprint::new(false)
            .with_construction(Medium::Communication, gilbert(1.0))
            .build(nodes(0..4), Collaborators::none(), &mut rng)
            .unwrap();
        // Two newcomers pair with the four residents and each other, both ways.
        assert_eq!(network.grow(nodes(4..6), 7, Collaborators::none(), &mut rng), Ok(18));
        assert_eq!(network.graph().node_count(), 6);
        assert_eq!(network.graph().edge_count(), 30);
        assert_eq!(network.graph().edges().filter(|e| e.created == 7).count(), 18);
        assert!(matches!(
            network.grow(nodes(5..6), 8, Collaborators::none(), &mut rng),
            Err(NetworkError::DuplicateNode(_))
        ));
    }
}
