//! Agent-model collaborators consumed by the construction algorithms.
//!
//! The social network does not own agent state. Group membership, the
//! group-to-group affinity matrix, and (for spatially aware variants) node
//! positions are supplied by the agent model through [`Population`] and the
//! [`Geography`] trait.

use std::collections::BTreeMap;

use diffusion_types::{GroupName, NodeId};

use crate::error::NetworkError;

/// Non-negative group-to-group attachment weights.
///
/// `affinity(g, h)` is the relative likelihood that a new edge from a member
/// of `g` targets a member of `h`. Missing entries are zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AffinityMatrix {
    weights: BTreeMap<GroupName, BTreeMap<GroupName, f64>>,
}

impl AffinityMatrix {
    /// Create an empty matrix (every affinity zero).
    pub const fn new() -> Self {
        Self {
            weights: BTreeMap::new(),
        }
    }

    /// Affinity 1.0 between every ordered pair of the given groups.
    pub fn uniform<'a>(groups: impl IntoIterator<Item = &'a GroupName> + Clone) -> Self {
        let mut matrix = Self::new();
        for from in groups.clone() {
            for to in groups.clone() {
                matrix
                    .weights
                    .entry(from.clone())
                    .or_default()
                    .insert(to.clone(), 1.0);
            }
        }
        matrix
    }

    /// Set the affinity from `from` to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::InvalidParameter`] for negative or non-finite
    /// weights.
    pub fn set(&mut self, from: GroupName, to: GroupName, weight: f64) -> Result<(), NetworkError> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(NetworkError::InvalidParameter {
                strategy: "affinity",
                parameter: format!("{from}.{to}"),
                reason: format!("affinity must be a non-negative number, got {weight}"),
            });
        }
        self.weights.entry(from).or_default().insert(to, weight);
        Ok(())
    }

    /// Affinity from `from` to `to` (zero when unset).
    pub fn get(&self, from: &GroupName, to: &GroupName) -> f64 {
        self.weights
            .get(from)
            .and_then(|row| row.get(to))
            .copied()
            .unwrap_or(0.0)
    }
}

/// Partition of the network's nodes into named agent groups.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Population {
    /// Group -> members in assignment order.
    groups: BTreeMap<GroupName, Vec<NodeId>>,
    /// Node -> its group.
    membership: BTreeMap<NodeId, GroupName>,
    affinity: AffinityMatrix,
}

impl Population {
    /// Create a population with no members yet.
    pub const fn new(affinity: AffinityMatrix) -> Self {
        Self {
            groups: BTreeMap::new(),
            membership: BTreeMap::new(),
            affinity,
        }
    }

    /// Declare a group even before it has members.
    pub fn declare_group(&mut self, group: GroupName) {
        self.groups.entry(group).or_default();
    }

    /// Place `node` in `group`.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::DuplicateNode`] if the node already belongs to
    /// a group.
    pub fn assign(&mut self, node: NodeId, group: GroupName) -> Result<(), NetworkError> {
        if self.membership.contains_key(&node) {
            return Err(NetworkError::DuplicateNode(node));
        }
        self.groups.entry(group.clone()).or_default().push(node);
        self.membership.insert(node, group);
        Ok(())
    }

    /// The group `node` belongs to.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::NodeNotFound`] for nodes without a group.
    pub fn group_of(&self, node: NodeId) -> Result<&GroupName, NetworkError> {
        self.membership
            .get(&node)
            .ok_or(NetworkError::NodeNotFound(node))
    }

    /// Members of `group` in assignment order.
    pub fn members(&self, group: &GroupName) -> &[NodeId] {
        self.groups.get(group).map(Vec::as_slice).unwrap_or_default()
    }

    /// All declared groups, ordered by name.
    pub fn groups(&self) -> impl Iterator<Item = &GroupName> {
        self.groups.keys()
    }

    /// The group-to-group affinity matrix.
    pub const fn affinity(&self) -> &AffinityMatrix {
        &self.affinity
    }

    /// Number of nodes assigned to a group.
    pub fn len(&self) -> usize {
        self.membership.len()
    }

    /// Whether no node has been assigned.
    pub fn is_empty(&self) -> bool {
        self.membership.is_empty()
    }
}

/// Source of node-to-node distances for spatially aware attachment.
pub trait Geography {
    /// Distance between two nodes, or `None` if either has no position.
    fn distance(&self, a: NodeId, b: NodeId) -> Option<f64>;
}

/// Nodes placed on a Euclidean plane.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaneGeography {
    positions: BTreeMap<NodeId, (f64, f64)>,
}

impl PlaneGeography {
    /// Create an empty plane.
    pub const fn new() -> Self {
        Self {
            positions: BTreeMap::new(),
        }
    }

    /// Place (or move) a node.
    pub fn place(&mut self, node: NodeId, x: f64, y: f64) {
        self.positions.insert(node, (x, y));
    }

    /// Position of a node.
    pub fn position(&self, node: NodeId) -> Option<(f64, f64)> {
        self.positions.get(&node).copied()
    }
}

impl Geography for PlaneGeography {
    fn distance(&self, a: NodeId, b: NodeId) -> Option<f64> {
        let (ax, ay) = self.position(a)?;
        let (bx, by) = self.position(b)?;
        Some((ax - bx).hypot(ay - by))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(i: u128) -> NodeId {
        NodeId::from_index(i)
    }

    #[test]
    fn affinity_defaults_to_zero() {
        let mut matrix = AffinityMatrix::new();
        let a = GroupName::from("a");
        let b = GroupName::from("b");
        assert!(matrix.set(a.clone(), b.clone(), 2.0).is_ok());
        assert!((matrix.get(&a, &b) - 2.0).abs() < f64::EPSILON);
        assert!(matrix.get(&b, &a).abs() < f64::EPSILON);
        assert!(matrix.set(a, b, -1.0).is_err());
    }

    #[test]
    fn uniform_affinity_covers_every_pair() {
        let groups = [GroupName::from("x"), GroupName::from("y")];
        let matrix = AffinityMatrix::uniform(groups.iter());
        for from in &groups {
            for to in &groups {
                assert!((matrix.get(from, to) - 1.0).abs() < f64::EPSILON);
            }
        }
    }

    #[test]
    fn membership_is_exclusive() {
        let mut population = Population::new(AffinityMatrix::new());
        let g = GroupName::from("g");
        assert!(population.assign(id(1), g.clone()).is_ok());
        assert!(population.assign(id(2), g.clone()).is_ok());
        assert_eq!(
            population.assign(id(1), GroupName::from("h")),
            Err(NetworkError::DuplicateNode(id(1)))
        );
        assert_eq!(population.members(&g), &[id(1), id(2)]);
        assert_eq!(population.group_of(id(2)), Ok(&g));
        assert!(population.group_of(id(3)).is_err());
    }

    #[test]
    fn plane_distance_is_euclidean() {
        let mut plane = PlaneGeography::new();
        plane.place(id(1), 0.0, 0.0);
        plane.place(id(2), 3.0, 4.0);
        assert!(plane.distance(id(1), id(2)).is_some_and(|d| (d - 5.0).abs() < 1e-12));
        assert!(plane.distance(id(1), id(3)).is_none());
    }
}
