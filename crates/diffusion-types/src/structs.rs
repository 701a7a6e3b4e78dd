//! Core entity structs: agent nodes and directed edges.

use serde::{Deserialize, Serialize};

use crate::enums::Medium;
use crate::ids::NodeId;

/// An agent's position in the social network.
///
/// Nodes are created once at population initialization, are immutable, and
/// are never removed from a network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Identity of the node (one-to-one with a simulation agent).
    pub id: NodeId,
    /// Human-readable label used in edge labels and logs.
    pub label: String,
}

impl Node {
    /// Create a node with the given identity and label.
    pub fn new(id: NodeId, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
        }
    }
}

/// Identity of an edge inside a network: at most one edge may exist per key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeKey {
    /// Node the edge leaves.
    pub source: NodeId,
    /// Node the edge enters.
    pub target: NodeId,
    /// Channel the edge belongs to.
    pub medium: Medium,
}

impl EdgeKey {
    /// Create a key from its parts.
    pub const fn new(source: NodeId, target: NodeId, medium: Medium) -> Self {
        Self {
            source,
            target,
            medium,
        }
    }

    /// Whether the key describes a self-loop.
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

/// A directed, weighted, labelled edge on one medium.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Node the edge leaves.
    pub source: NodeId,
    /// Node the edge enters.
    pub target: NodeId,
    /// Strength of the tie.
    pub weight: f64,
    /// Human-readable label.
    pub label: String,
    /// Channel the edge belongs to.
    pub medium: Medium,
    /// Tick at which the edge was created (0 for the initial graph).
    #[serde(default)]
    pub created: u64,
}

impl Edge {
    /// Create an edge at tick 0.
    pub fn new(
        source: NodeId,
        target: NodeId,
        medium: Medium,
        weight: f64,
        label: impl Into<String>,
    ) -> Self {
        Self {
            source,
            target,
            weight,
            label: label.into(),
            medium,
            created: 0,
        }
    }

    /// Set the tick at which the edge was created.
    #[must_use]
    pub const fn created_at(mut self, tick: u64) -> Self {
        self.created = tick;
        self
    }

    /// Ticks elapsed between creation and `tick` (0 if `tick` is earlier).
    pub const fn age_at(&self, tick: u64) -> u64 {
        tick.saturating_sub(self.created)
    }

    /// The `(source, target, medium)` identity of this edge.
    pub const fn key(&self) -> EdgeKey {
        EdgeKey::new(self.source, self.target, self.medium)
    }

    /// Rebuild the edge under a different key, keeping weight, label and
    /// creation tick.
    pub fn rekeyed(&self, key: EdgeKey) -> Self {
        Self {
            source: key.source,
            target: key.target,
            weight: self.weight,
            label: self.label.clone(),
            medium: key.medium,
            created: self.created,
        }
    }
}
