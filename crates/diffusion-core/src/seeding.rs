//! Synthetic population seeding.
//!
//! Turns the `population` config section into the node set, group
//! membership, affinity matrix, and (optionally) plane positions the network
//! strategies consume. Agent `i` gets the node id derived from index `i`, so
//! a given seed reproduces the same ids as well as the same edges.

use diffusion_network::{AffinityMatrix, Collaborators, PlaneGeography, Population};
use diffusion_types::{GroupName, Node, NodeId};
use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};

use crate::config::{ConfigError, PopulationConfig, SpatialConfig};

/// Everything the network needs to know about the agents.
#[derive(Debug, Clone)]
pub struct SeededPopulation {
    nodes: Vec<Node>,
    population: Population,
    geography: Option<PlaneGeography>,
    spatial: Option<SpatialConfig>,
    shares: Vec<(GroupName, f64)>,
}

impl SeededPopulation {
    /// Seed `config.agents` agents, apportioning them to groups by share.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the population section does not
    /// validate.
    pub fn seed<R: Rng + ?Sized>(config: &PopulationConfig, rng: &mut R) -> Result<Self, ConfigError> {
        config.validate()?;
        let shares: Vec<(GroupName, f64)> = config
            .groups
            .iter()
            .map(|(name, &share)| (GroupName::from(name.as_str()), share))
            .collect();
        let mut population = Population::new(affinity(config, &shares)?);
        for (group, _) in &shares {
            population.declare_group(group.clone());
        }

        let mut labels = apportion(&shares, config.agents);
        labels.shuffle(rng);

        let mut seeded = Self {
            nodes: Vec::with_capacity(config.agents),
            population,
            geography: config.spatial.map(|_| PlaneGeography::new()),
            spatial: config.spatial,
            shares,
        };
        for group in labels {
            seeded.admit(group, rng)?;
        }
        Ok(seeded)
    }

    /// Add `count` agents, drawing each one's group by share.
    ///
    /// Returns the new nodes in admission order.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the population has no groups.
    pub fn extend<R: Rng + ?Sized>(&mut self, count: usize, rng: &mut R) -> Result<Vec<Node>, ConfigError> {
        let start = self.nodes.len();
        for _ in 0..count {
            let group = self
                .shares
                .choose_weighted(rng, |(_, share)| *share)
                .map(|(group, _)| group.clone())
                .map_err(|err| ConfigError::Invalid {
                    field: "population.groups".to_owned(),
                    reason: err.to_string(),
                })?;
            self.admit(group, rng)?;
        }
        Ok(self.nodes.get(start..).map(<[Node]>::to_vec).unwrap_or_default())
    }

    fn admit<R: Rng + ?Sized>(&mut self, group: GroupName, rng: &mut R) -> Result<(), ConfigError> {
        let index = u128::try_from(self.nodes.len()).unwrap_or(u128::MAX);
        let node = Node::new(NodeId::from_index(index), format!("agent-{index}"));
        self.population
            .assign(node.id, group)
            .map_err(|err| ConfigError::Invalid {
                field: "population".to_owned(),
                reason: err.to_string(),
            })?;
        if let (Some(plane), Some(area)) = (self.geography.as_mut(), self.spatial) {
            plane.place(node.id, rng.random_range(0.0..area.width), rng.random_range(0.0..area.height));
        }
        self.nodes.push(node);
        Ok(())
    }

    /// All agents in admission order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Group membership and affinities.
    pub const fn population(&self) -> &Population {
        &self.population
    }

    /// Agent positions, when the population is spatial.
    pub const fn geography(&self) -> Option<&PlaneGeography> {
        self.geography.as_ref()
    }

    /// Collaborators handed to the network strategies.
    pub fn collaborators(&self) -> Collaborators<'_> {
        let collaborators = Collaborators::none().with_population(&self.population);
        match &self.geography {
            Some(plane) => collaborators.with_geography(plane),
            None => collaborators,
        }
    }
}

fn affinity(config: &PopulationConfig, shares: &[(GroupName, f64)]) -> Result<AffinityMatrix, ConfigError> {
    if config.affinity.is_empty() {
        return Ok(AffinityMatrix::uniform(shares.iter().map(|(group, _)| group)));
    }
    let mut matrix = AffinityMatrix::new();
    for (from, row) in &config.affinity {
        for (to, &weight) in row {
            matrix
                .set(GroupName::from(from.as_str()), GroupName::from(to.as_str()), weight)
                .map_err(|err| ConfigError::Invalid {
                    field: format!("population.affinity.{from}.{to}"),
                    reason: err.to_string(),
                })?;
        }
    }
    Ok(matrix)
}

/// Split `total` agents by share using largest remainders.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)] // quotas lie in [0, total]
fn apportion(shares: &[(GroupName, f64)], total: usize) -> Vec<GroupName> {
    let sum: f64 = shares.iter().map(|(_, share)| share).sum();
    let mut quotas: Vec<(usize, f64, &GroupName)> = shares
        .iter()
        .map(|(group, share)| {
            let exact = share / sum * total as f64;
            let whole = exact.floor();
            (whole as usize, exact - whole, group)
        })
        .collect();
    let assigned: usize = quotas.iter().map(|(whole, _, _)| whole).sum();
    let mut remaining = total.saturating_sub(assigned);
    let mut order: Vec<usize> = (0..quotas.len()).collect();
    order.sort_by(|&a, &b| {
        let fa = quotas.get(a).map_or(0.0, |q| q.1);
        let fb = quotas.get(b).map_or(0.0, |q| q.1);
        fb.total_cmp(&fa)
    });
    for index in order.into_iter().cycle() {
        if remaining == 0 {
            break;
        }
        if let Some(quota) = quotas.get_mut(index) {
            quota.0 = quota.0.saturating_add(1);
            remaining = remaining.saturating_sub(1);
        }
    }
    quotas
        .into_iter()
        .flat_map(|(count, _, group)| std::iter::repeat_n(group.clone(), count))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn config(agents: usize, groups: &[(&str, f64)]) -> PopulationConfig {
        PopulationConfig {
            agents,
            groups: groups.iter().map(|&(g, s)| (g.to_owned(), s)).collect(),
            ..PopulationConfig::default()
        }
    }

    #[test]
    fn shares_are_apportioned_exactly() {
        let mut rng = StdRng::seed_from_u64(1);
        let seeded = SeededPopulation::seed(&config(10, &[("a", 1.0), ("b", 2.0), ("c", 2.0)]), &mut rng).unwrap();
        let sizes: BTreeMap<String, usize> = seeded
            .population()
            .groups()
            .map(|g| (g.to_string(), seeded.population().members(g).len()))
            .collect();
        assert_eq!(sizes.get("a"), Some(&2));
        assert_eq!(sizes.get("b"), Some(&4));
        assert_eq!(sizes.get("c"), Some(&4));
        assert_eq!(seeded.nodes().len(), 10);
    }

    #[test]
    fn remainders_go_to_largest_fractions() {
        let labels = apportion(
            &[(GroupName::from("x"), 1.0), (GroupName::from("y"), 1.0), (GroupName::from("z"), 1.0)],
            10,
        );
        assert_eq!(labels.len(), 10);
        let x = labels.iter().filter(|g| g.as_str() == "x").count();
        let y = labels.iter().filter(|g| g.as_str() == "y").count();
        assert_eq!((x, y), (4, 3));
    }

    #[test]
    fn ids_depend_only_on_admission_order() {
        let a = SeededPopulation::seed(&config(5, &[("a", 1.0)]), &mut StdRng::seed_from_u64(3)).unwrap();
        let b = SeededPopulation::seed(&config(5, &[("a", 1.0)]), &mut StdRng::seed_from_u64(4)).unwrap();
        let ids = |s: &SeededPopulation| s.nodes().iter().map(|n| n.id).collect::<Vec<_>>();
        assert_eq!(ids(&a), ids(&b));
    }

    #[test]
    fn spatial_population_places_everyone() {
        let mut cfg = config(20, &[("a", 1.0)]);
        cfg.spatial = Some(SpatialConfig {
            width: 5.0,
            height: 2.0,
        });
        let seeded = SeededPopulation::seed(&cfg, &mut StdRng::seed_from_u64(9)).unwrap();
        let plane = seeded.geography().unwrap();
        for node in seeded.nodes() {
            let (x, y) = plane.position(node.id).unwrap();
            assert!((0.0..5.0).contains(&x));
            assert!((0.0..2.0).contains(&y));
        }
        assert!(seeded.collaborators().geography.is_some());
    }

    #[test]
    fn extend_continues_numbering() {
        let mut seeded =
            SeededPopulation::seed(&config(3, &[("a", 1.0), ("b", 1.0)]), &mut StdRng::seed_from_u64(2)).unwrap();
        let added = seeded.extend(2, &mut StdRng::seed_from_u64(2)).unwrap();
        assert_eq!(added.len(), 2);
        assert_eq!(added.first().map(|n| n.id), Some(NodeId::from_index(3)));
        assert_eq!(seeded.nodes().len(), 5);
        assert_eq!(seeded.population().len(), 5);
    }
}
