//! Social network graph: agents as nodes, directed ties as edges per medium.
//!
//! [`SocialNetwork`] is the single mutable graph type every construction,
//! topology, and weight strategy works against. It owns:
//!
//! - the node set, kept in insertion order so seeded construction is
//!   reproducible across runs,
//! - the edge set keyed by `(source, target, medium)`,
//! - a per-medium adjacency map: node -> set of neighbour nodes,
//! - a per-medium outgoing index: node -> set of outgoing edge keys.
//!
//! Every mutation validates its preconditions before touching any of the
//! three structures, so a failed call leaves the network exactly as it was.

use std::collections::{BTreeMap, BTreeSet};

use diffusion_types::{Edge, EdgeKey, Medium, Node, NodeId};

use crate::error::NetworkError;

/// Node -> neighbour set for one medium.
type Adjacency = BTreeMap<NodeId, BTreeSet<NodeId>>;

/// Node -> outgoing edge keys for one medium.
type OutgoingIndex = BTreeMap<NodeId, BTreeSet<EdgeKey>>;

/// The directed, multi-medium social network.
#[derive(Debug, Clone, Default)]
pub struct SocialNetwork {
    /// All nodes in insertion order.
    nodes: Vec<Node>,
    /// Position of each node inside `nodes`.
    index: BTreeMap<NodeId, usize>,
    /// All edges indexed by their identity.
    edges: BTreeMap<EdgeKey, Edge>,
    /// Per-medium adjacency.
    adjacency: BTreeMap<Medium, Adjacency>,
    /// Per-medium outgoing-edge index.
    outgoing: BTreeMap<Medium, OutgoingIndex>,
    /// Whether an edge may start and end at the same node.
    allow_self_loops: bool,
}

impl SocialNetwork {
    /// Create an empty network.
    pub const fn new(allow_self_loops: bool) -> Self {
        Self {
            nodes: Vec::new(),
            index: BTreeMap::new(),
            edges: BTreeMap::new(),
            adjacency: BTreeMap::new(),
            outgoing: BTreeMap::new(),
            allow_self_loops,
        }
    }

    /// Create a network holding the given isolated nodes.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::DuplicateNode`] if a node appears twice.
    pub fn with_nodes(
        nodes: impl IntoIterator<Item = Node>,
        allow_self_loops: bool,
    ) -> Result<Self, NetworkError> {
        let mut network = Self::new(allow_self_loops);
        for node in nodes {
            network.add_isolated_node(node)?;
        }
        Ok(network)
    }

    /// Whether self-loops are permitted.
    pub const fn allows_self_loops(&self) -> bool {
        self.allow_self_loops
    }

    // -------------------------------------------------------------------
    // Node operations
    // -------------------------------------------------------------------

    /// Add a node with no edges on any medium.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::DuplicateNode`] if the node is already present.
    pub fn add_isolated_node(&mut self, node: Node) -> Result<(), NetworkError> {
        let id = node.id;
        if self.index.contains_key(&id) {
            return Err(NetworkError::DuplicateNode(id));
        }
        self.index.insert(id, self.nodes.len());
        self.nodes.push(node);
        for medium in Medium::ALL {
            self.adjacency.entry(medium).or_default().insert(id, BTreeSet::new());
            self.outgoing.entry(medium).or_default().insert(id, BTreeSet::new());
        }
        Ok(())
    }

    /// Whether the node is part of the network.
    pub fn contains_node(&self, id: NodeId) -> bool {
        self.index.contains_key(&id)
    }

    /// Look up a node by identity.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.index.get(&id).and_then(|&pos| self.nodes.get(pos))
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// All node IDs in insertion order.
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.iter().map(|n| n.id).collect()
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // -------------------------------------------------------------------
    // Edge mutation
    // -------------------------------------------------------------------

    /// Insert an edge into the edge set, adjacency map, and outgoing index.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::NodeNotFound`] if either endpoint is missing,
    /// [`NetworkError::SelfLoopForbidden`] for a disallowed self-loop, or
    /// [`NetworkError::DuplicateEdge`] if the key is already taken.
    pub fn add_edge(&mut self, edge: Edge) -> Result<(), NetworkError> {
        self.check_insertable(edge.key(), None)?;
        self.insert_unchecked(edge);
        Ok(())
    }

    /// Create and insert an edge with a generated label, created at tick 0.
    ///
    /// # Errors
    ///
    /// Same as [`SocialNetwork::add_edge`].
    pub fn connect(
        &mut self,
        source: NodeId,
        target: NodeId,
        medium: Medium,
        weight: f64,
    ) -> Result<EdgeKey, NetworkError> {
        self.connect_at(source, target, medium, weight, 0)
    }

    /// Create and insert an edge with a generated label, created at `tick`.
    ///
    /// # Errors
    ///
    /// Same as [`SocialNetwork::add_edge`].
    pub fn connect_at(
        &mut self,
        source: NodeId,
        target: NodeId,
        medium: Medium,
        weight: f64,
        tick: u64,
    ) -> Result<EdgeKey, NetworkError> {
        let label = self.edge_label(source, target, medium);
        let edge = Edge::new(source, target, medium, weight, label).created_at(tick);
        let key = edge.key();
        self.add_edge(edge)?;
        Ok(key)
    }

    /// Remove an edge from all three structures and return it.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::EdgeNotFound`] if no such edge exists.
    pub fn remove_edge(&mut self, key: &EdgeKey) -> Result<Edge, NetworkError> {
        self.remove_unchecked(key)
            .ok_or(NetworkError::EdgeNotFound(*key))
    }

    /// Replace `old` with `new` as one logical step and return the old edge.
    ///
    /// `new` may reuse `old`'s key (for example to change only the weight).
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::EdgeNotFound`] if `old` is absent, or any error
    /// [`SocialNetwork::add_edge`] would return for `new` once `old` is gone.
    pub fn replace_edge(&mut self, old: &EdgeKey, new: Edge) -> Result<Edge, NetworkError> {
        if !self.edges.contains_key(old) {
            return Err(NetworkError::EdgeNotFound(*old));
        }
        self.check_insertable(new.key(), Some(*old))?;
        let removed = self
            .remove_unchecked(old)
            .ok_or(NetworkError::EdgeNotFound(*old))?;
        self.insert_unchecked(new);
        Ok(removed)
    }

    /// Move an edge to a new source node, keeping weight and label.
    ///
    /// # Errors
    ///
    /// Same as [`SocialNetwork::replace_edge`].
    pub fn modify_edge_source(
        &mut self,
        key: &EdgeKey,
        source: NodeId,
    ) -> Result<EdgeKey, NetworkError> {
        self.rekey(key, EdgeKey::new(source, key.target, key.medium))
    }

    /// Move an edge to a new target node, keeping weight and label.
    ///
    /// # Errors
    ///
    /// Same as [`SocialNetwork::replace_edge`].
    pub fn modify_edge_target(
        &mut self,
        key: &EdgeKey,
        target: NodeId,
    ) -> Result<EdgeKey, NetworkError> {
        self.rekey(key, EdgeKey::new(key.source, target, key.medium))
    }

    /// Move an edge to another medium, keeping weight and label.
    ///
    /// # Errors
    ///
    /// Same as [`SocialNetwork::replace_edge`].
    pub fn modify_edge_medium(
        &mut self,
        key: &EdgeKey,
        medium: Medium,
    ) -> Result<EdgeKey, NetworkError> {
        self.rekey(key, EdgeKey::new(key.source, key.target, medium))
    }

    /// Overwrite the weight of an existing edge.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::EdgeNotFound`] if no such edge exists.
    pub fn set_edge_weight(&mut self, key: &EdgeKey, weight: f64) -> Result<(), NetworkError> {
        let edge = self
            .edges
            .get_mut(key)
            .ok_or(NetworkError::EdgeNotFound(*key))?;
        edge.weight = weight;
        Ok(())
    }

    // -------------------------------------------------------------------
    // Edge queries
    // -------------------------------------------------------------------

    /// Return the unique edge for `(source, target, medium)`.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::EdgeNotFound`] if no such edge exists.
    pub fn retrieve_edge(
        &self,
        source: NodeId,
        target: NodeId,
        medium: Medium,
    ) -> Result<&Edge, NetworkError> {
        let key = EdgeKey::new(source, target, medium);
        self.edges.get(&key).ok_or(NetworkError::EdgeNotFound(key))
    }

    /// Return every edge from `source` to `target`, across all media.
    pub fn retrieve_all_edges(&self, source: NodeId, target: NodeId) -> Vec<&Edge> {
        Medium::ALL
            .iter()
            .filter_map(|&medium| self.edges.get(&EdgeKey::new(source, target, medium)))
            .collect()
    }

    /// Whether an edge with this key exists.
    pub fn contains_edge(&self, key: &EdgeKey) -> bool {
        self.edges.contains_key(key)
    }

    /// Whether `source` has an edge to `target` on `medium`.
    pub fn has_edge(&self, source: NodeId, target: NodeId, medium: Medium) -> bool {
        self.contains_edge(&EdgeKey::new(source, target, medium))
    }

    /// Iterate over every edge, ordered by key.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// Iterate over the edges of one medium.
    pub fn edges_for(&self, medium: Medium) -> impl Iterator<Item = &Edge> {
        self.edges.values().filter(move |e| e.medium == medium)
    }

    /// Keys of every edge on one medium, ordered.
    pub fn edge_keys_for(&self, medium: Medium) -> Vec<EdgeKey> {
        self.edges
            .keys()
            .filter(|k| k.medium == medium)
            .copied()
            .collect()
    }

    /// Total number of edges across all media.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Number of edges on one medium.
    pub fn edge_count_for(&self, medium: Medium) -> usize {
        self.outgoing
            .get(&medium)
            .map_or(0, |index| index.values().map(BTreeSet::len).sum())
    }

    /// Nodes `node` has an edge to on `medium`.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::NodeNotFound`] if the node is not present.
    pub fn neighbours(&self, node: NodeId, medium: Medium) -> Result<&BTreeSet<NodeId>, NetworkError> {
        self.adjacency
            .get(&medium)
            .and_then(|adj| adj.get(&node))
            .ok_or(NetworkError::NodeNotFound(node))
    }

    /// Nodes `node` has an edge to on any medium.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::NodeNotFound`] if the node is not present.
    pub fn all_neighbours(&self, node: NodeId) -> Result<BTreeSet<NodeId>, NetworkError> {
        let mut all = BTreeSet::new();
        for medium in Medium::ALL {
            all.extend(self.neighbours(node, medium)?.iter().copied());
        }
        Ok(all)
    }

    /// Outgoing edges of `node` on `medium`.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::NodeNotFound`] if the node is not present.
    pub fn outgoing_edges(&self, node: NodeId, medium: Medium) -> Result<Vec<&Edge>, NetworkError> {
        let keys = self
            .outgoing
            .get(&medium)
            .and_then(|index| index.get(&node))
            .ok_or(NetworkError::NodeNotFound(node))?;
        Ok(keys.iter().filter_map(|k| self.edges.get(k)).collect())
    }

    /// Number of edges leaving `node` on `medium` (0 for unknown nodes).
    pub fn out_degree(&self, node: NodeId, medium: Medium) -> usize {
        self.neighbours(node, medium).map_or(0, BTreeSet::len)
    }

    /// Number of edges entering `node` on `medium` (0 for unknown nodes).
    pub fn in_degree(&self, node: NodeId, medium: Medium) -> usize {
        self.adjacency.get(&medium).map_or(0, |adj| {
            adj.values().filter(|targets| targets.contains(&node)).count()
        })
    }

    /// In-degree of every node on `medium`, including zero entries.
    pub fn in_degrees(&self, medium: Medium) -> BTreeMap<NodeId, usize> {
        let mut degrees: BTreeMap<NodeId, usize> =
            self.nodes.iter().map(|n| (n.id, 0)).collect();
        for key in self.edges.keys().filter(|k| k.medium == medium) {
            if let Some(count) = degrees.get_mut(&key.target) {
                *count = count.saturating_add(1);
            }
        }
        degrees
    }

    /// Human-readable label for an edge between two nodes.
    pub fn edge_label(&self, source: NodeId, target: NodeId, medium: Medium) -> String {
        let name = |id: NodeId| {
            self.node(id)
                .map_or_else(|| id.to_string(), |n| n.label.clone())
        };
        format!("{} -[{medium}]-> {}", name(source), name(target))
    }

    // -------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------

    /// Check that an edge with `key` could be inserted once `replacing` (if
    /// any) has been removed.
    fn check_insertable(&self, key: EdgeKey, replacing: Option<EdgeKey>) -> Result<(), NetworkError> {
        if !self.contains_node(key.source) {
            return Err(NetworkError::NodeNotFound(key.source));
        }
        if !self.contains_node(key.target) {
            return Err(NetworkError::NodeNotFound(key.target));
        }
        if key.is_self_loop() && !self.allow_self_loops {
            return Err(NetworkError::SelfLoopForbidden(key.source));
        }
        if replacing != Some(key) && self.edges.contains_key(&key) {
            return Err(NetworkError::DuplicateEdge(key));
        }
        Ok(())
    }

    fn rekey(&mut self, old: &EdgeKey, new: EdgeKey) -> Result<EdgeKey, NetworkError> {
        let edge = self
            .edges
            .get(old)
            .ok_or(NetworkError::EdgeNotFound(*old))?
            .rekeyed(new);
        self.replace_edge(old, edge)?;
        Ok(new)
    }

    fn insert_unchecked(&mut self, edge: Edge) {
        let key = edge.key();
        self.adjacency
            .entry(key.medium)
            .or_default()
            .entry(key.source)
            .or_default()
            .insert(key.target);
        self.outgoing
            .entry(key.medium)
            .or_default()
            .entry(key.source)
            .or_default()
            .insert(key);
        self.edges.insert(key, edge);
    }

    fn remove_unchecked(&mut self, key: &EdgeKey) -> Option<Edge> {
        let edge = self.edges.remove(key)?;
        if let Some(targets) = self
            .adjacency
            .get_mut(&key.medium)
            .and_then(|adj| adj.get_mut(&key.source))
        {
            targets.remove(&key.target);
        }
        if let Some(keys) = self
            .outgoing
            .get_mut(&key.medium)
            .and_then(|index| index.get_mut(&key.source))
        {
            keys.remove(key);
        }
        Some(edge)
    }
}
