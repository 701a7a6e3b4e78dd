//! In-degree bookkeeping as a bucket queue.
//!
//! [`DegreeBuckets`] maps each tracked node to its current degree and keeps
//! one bucket of nodes per degree value. Promoting a node moves it one bucket
//! up in place (swap-remove plus push), so balancing algorithms never copy
//! the structure while they emit edges.

use std::collections::BTreeMap;

use diffusion_types::NodeId;

/// Nodes grouped by their current degree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DegreeBuckets {
    /// `buckets[d]` holds every node whose degree is `d`.
    buckets: Vec<Vec<NodeId>>,
    /// Node -> `(degree, position inside its bucket)`.
    slots: BTreeMap<NodeId, (usize, usize)>,
}

impl DegreeBuckets {
    /// Create an empty bucket queue.
    pub const fn new() -> Self {
        Self {
            buckets: Vec::new(),
            slots: BTreeMap::new(),
        }
    }

    /// Build a bucket queue from `(node, degree)` pairs.
    ///
    /// Later duplicates of a node are ignored.
    pub fn from_degrees(degrees: impl IntoIterator<Item = (NodeId, usize)>) -> Self {
        let mut buckets = Self::new();
        for (node, degree) in degrees {
            buckets.insert(node, degree);
        }
        buckets
    }

    /// Start tracking `node` at `degree`. Returns `false` if already tracked.
    pub fn insert(&mut self, node: NodeId, degree: usize) -> bool {
        if self.slots.contains_key(&node) {
            return false;
        }
        let position = self.push_into(node, degree);
        self.slots.insert(node, (degree, position));
        true
    }

    /// Current degree of `node`, if tracked.
    pub fn degree(&self, node: NodeId) -> Option<usize> {
        self.slots.get(&node).map(|&(degree, _)| degree)
    }

    /// Raise `node`'s degree by one and return the new degree.
    pub fn promote(&mut self, node: NodeId) -> Option<usize> {
        let (degree, position) = self.slots.get(&node).copied()?;
        let next = degree.checked_add(1)?;
        self.take_from(degree, position);
        let new_position = self.push_into(node, next);
        self.slots.insert(node, (next, new_position));
        Some(next)
    }

    /// Lower `node`'s degree by one and return the new degree.
    pub fn demote(&mut self, node: NodeId) -> Option<usize> {
        let (degree, position) = self.slots.get(&node).copied()?;
        let next = degree.checked_sub(1)?;
        self.take_from(degree, position);
        let new_position = self.push_into(node, next);
        self.slots.insert(node, (next, new_position));
        Some(next)
    }

    /// Nodes currently at exactly `degree`.
    pub fn at_degree(&self, degree: usize) -> &[NodeId] {
        self.buckets.get(degree).map_or(&[], Vec::as_slice)
    }

    /// Every eligible node sharing the lowest degree among eligible nodes.
    ///
    /// Returns an empty list when no tracked node is eligible.
    pub fn least_eligible(&self, eligible: impl Fn(NodeId) -> bool) -> Vec<NodeId> {
        for bucket in &self.buckets {
            let tied: Vec<NodeId> = bucket.iter().copied().filter(|&n| eligible(n)).collect();
            if !tied.is_empty() {
                return tied;
            }
        }
        Vec::new()
    }

    /// Smallest and largest tracked degree.
    pub fn degree_range(&self) -> Option<(usize, usize)> {
        let min = self.buckets.iter().position(|b| !b.is_empty())?;
        let max = self.buckets.iter().rposition(|b| !b.is_empty())?;
        Some((min, max))
    }

    fn push_into(&mut self, node: NodeId, degree: usize) -> usize {
        if self.buckets.len() <= degree {
            self.buckets.resize_with(degree.saturating_add(1), Vec::new);
        }
        match self.buckets.get_mut(degree) {
            Some(bucket) => {
                bucket.push(node);
                bucket.len().saturating_sub(1)
            }
            None => 0,
        }
    }

    fn take_from(&mut self, degree: usize, position: usize) {
        let Some(bucket) = self.buckets.get_mut(degree) else {
            return;
        };
        if position >= bucket.len() {
            return;
        }
        bucket.swap_remove(position);
        // The former last element now sits at `position`.
        if let Some(&moved) = bucket.get(position)
            && let Some(slot) = self.slots.get_mut(&moved)
        {
            slot.1 = position;
        }
    }
}
