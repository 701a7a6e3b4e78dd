//! Per-tick topology manipulation schemes.
//!
//! The driver calls [`TopologyScheme::manipulate_topology`] once per tick for
//! every medium. Schemes mutate the graph in place through the invariant-
//! preserving [`SocialNetwork`] API and weigh any new edge with the
//! network's [`EdgeWeightScheme`].

use diffusion_types::{EdgeKey, Medium, NodeId};
use rand::RngCore;

use crate::error::NetworkError;
use crate::graph::SocialNetwork;
use crate::sampling::{RetryBudget, chance, pick};
use crate::weight::EdgeWeightScheme;

/// What one call to a topology scheme changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TopologyReport {
    /// Edges inserted.
    pub added: usize,
    /// Edges deleted.
    pub removed: usize,
    /// Edges moved to a new endpoint pair.
    pub rewired: usize,
}

impl TopologyReport {
    /// Whether the call left the topology untouched.
    pub const fn is_empty(&self) -> bool {
        self.added == 0 && self.removed == 0 && self.rewired == 0
    }
}

/// Strategy mutating the edges of one medium once per tick.
pub trait TopologyScheme: core::fmt::Debug {
    /// Configuration key of the scheme.
    fn name(&self) -> &'static str;

    /// Mutate the edges of `medium` for `tick`.
    fn manipulate_topology(
        &self,
        network: &mut SocialNetwork,
        medium: Medium,
        weights: &dyn EdgeWeightScheme,
        tick: u64,
        rng: &mut dyn RngCore,
    ) -> Result<TopologyReport, NetworkError>;
}

/// The topology never changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StaticTopology;

impl TopologyScheme for StaticTopology {
    fn name(&self) -> &'static str {
        "static"
    }

    fn manipulate_topology(
        &self,
        _: &mut SocialNetwork,
        _: Medium,
        _: &dyn EdgeWeightScheme,
        _: u64,
        _: &mut dyn RngCore,
    ) -> Result<TopologyReport, NetworkError> {
        Ok(TopologyReport::default())
    }
}

/// Every ordered pair is decided against the start-of-tick graph: existing
/// edges are deleted with `delete_probability`, absent ones inserted with
/// `insert_probability`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndependentAddDelete {
    delete_probability: f64,
    insert_probability: f64,
}

impl IndependentAddDelete {
    /// Create the scheme.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::InvalidParameter`] for probabilities outside
    /// `[0, 1]`.
    pub fn new(delete_probability: f64, insert_probability: f64) -> Result<Self, NetworkError> {
        for (parameter, p) in [
            ("delete_probability", delete_probability),
            ("insert_probability", insert_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(NetworkError::InvalidParameter {
                    strategy: "independent",
                    parameter: parameter.to_owned(),
                    reason: format!("probability must lie in [0, 1], got {p}"),
                });
            }
        }
        Ok(Self {
            delete_probability,
            insert_probability,
        })
    }
}

impl TopologyScheme for IndependentAddDelete {
    fn name(&self) -> &'static str {
        "independent"
    }

    fn manipulate_topology(
        &self,
        network: &mut SocialNetwork,
        medium: Medium,
        weights: &dyn EdgeWeightScheme,
        tick: u64,
        rng: &mut dyn RngCore,
    ) -> Result<TopologyReport, NetworkError> {
        let ids = network.node_ids();
        let allow_self_loops = network.allows_self_loops();
        let mut deletions = Vec::new();
        let mut insertions = Vec::new();
        for &source in &ids {
            for &target in &ids {
                if source == target && !allow_self_loops {
                    continue;
                }
                if network.has_edge(source, target, medium) {
                    if chance(rng, self.delete_probability) {
                        deletions.push(EdgeKey::new(source, target, medium));
                    }
                } else if chance(rng, self.insert_probability) {
                    insertions.push((source, target));
                }
            }
        }

        for key in &deletions {
            network.remove_edge(key)?;
        }
        for &(source, target) in &insertions {
            let weight = weights.weigh_edge(source, target, medium, rng);
            network.connect_at(source, target, medium, weight, tick)?;
        }
        Ok(TopologyReport {
            added: insertions.len(),
            removed: deletions.len(),
            rewired: 0,
        })
    }
}

/// Each edge is moved, with probability `rewire_probability`, to a uniformly
/// random endpoint pair that has no edge on the same medium yet. Weight and
/// label travel with the edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RandomRewire {
    rewire_probability: f64,
    budget: RetryBudget,
}

impl RandomRewire {
    /// Create the scheme with the default retry budget.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::InvalidParameter`] for a probability outside
    /// `[0, 1]`.
    pub fn new(rewire_probability: f64) -> Result<Self, NetworkError> {
        if !(0.0..=1.0).contains(&rewire_probability) {
            return Err(NetworkError::InvalidParameter {
                strategy: "random_rewire",
                parameter: "rewire_probability".to_owned(),
                reason: format!("probability must lie in [0, 1], got {rewire_probability}"),
            });
        }
        Ok(Self {
            rewire_probability,
            budget: RetryBudget::default(),
        })
    }

    /// Override the retry budget for each relocation.
    #[must_use]
    pub const fn with_budget(mut self, budget: RetryBudget) -> Self {
        self.budget = budget;
        self
    }
}

impl TopologyScheme for RandomRewire {
    fn name(&self) -> &'static str {
        "random_rewire"
    }

    fn manipulate_topology(
        &self,
        network: &mut SocialNetwork,
        medium: Medium,
        _: &dyn EdgeWeightScheme,
        _: u64,
        rng: &mut dyn RngCore,
    ) -> Result<TopologyReport, NetworkError> {
        let ids: Vec<NodeId> = network.node_ids();
        let allow_self_loops = network.allows_self_loops();
        let mut rewired = 0_usize;
        for key in network.edge_keys_for(medium) {
            if !chance(rng, self.rewire_probability) {
                continue;
            }
            let graph = &*network;
            let fresh = self.budget.sample(self.name(), &mut *rng, |rng| {
                let source = pick(&ids, rng)?;
                let target = pick(&ids, rng)?;
                let admissible = (allow_self_loops || source != target)
                    && !graph.has_edge(source, target, medium);
                admissible.then(|| EdgeKey::new(source, target, medium))
            })?;
            let moved = network.retrieve_edge(key.source, key.target, medium)?.rekeyed(fresh);
            network.replace_edge(&key, moved)?;
            rewired = rewired.saturating_add(1);
        }
        Ok(TopologyReport {
            added: 0,
            removed: 0,
            rewired,
        })
    }
}
