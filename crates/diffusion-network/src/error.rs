//! Error types for the `diffusion-network` crate.
//!
//! All fallible operations in this crate return [`NetworkError`]. The
//! variants fall into four families: invalid configuration (reported when a
//! strategy is built or first sees the node set), graph invariant violations
//! (programming errors in the caller), unsupported operations, and exhausted
//! rejection-sampling budgets.

use diffusion_types::{EdgeKey, GroupName, NodeId};

/// Errors that can occur while building or mutating a social network.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NetworkError {
    /// A strategy key did not match any known strategy.
    #[error("unknown {kind} strategy: {key:?}")]
    UnknownStrategy {
        /// Which family was being resolved (`graph`, `weight`, `topology`).
        kind: &'static str,
        /// The key found in configuration.
        key: String,
    },

    /// A required strategy parameter was absent.
    #[error("{strategy}: missing required parameter `{parameter}`")]
    MissingParameter {
        /// Strategy being configured.
        strategy: &'static str,
        /// Name of the missing parameter.
        parameter: String,
    },

    /// A strategy parameter was present but unusable.
    #[error("{strategy}: invalid parameter `{parameter}`: {reason}")]
    InvalidParameter {
        /// Strategy being configured.
        strategy: &'static str,
        /// Name of the offending parameter.
        parameter: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A node belongs to a group the strategy has no parameters for.
    #[error("{strategy}: no entry for agent group {group}")]
    UnknownGroup {
        /// Strategy being run.
        strategy: &'static str,
        /// The group lacking an entry.
        group: GroupName,
    },

    /// A strategy needs an external collaborator that was not supplied.
    #[error("{strategy}: requires {collaborator}")]
    MissingCollaborator {
        /// Strategy being run.
        strategy: &'static str,
        /// The missing collaborator (`population`, `geography`).
        collaborator: &'static str,
    },

    /// A node was inserted twice.
    #[error("duplicate node: {0}")]
    DuplicateNode(NodeId),

    /// A node was not found in the network.
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    /// An edge with the same source, target, and medium already exists.
    #[error("duplicate edge {} -> {} on {}", .0.source, .0.target, .0.medium)]
    DuplicateEdge(EdgeKey),

    /// No edge with this source, target, and medium exists.
    #[error("edge not found: {} -> {} on {}", .0.source, .0.target, .0.medium)]
    EdgeNotFound(EdgeKey),

    /// A self-loop was requested but the network forbids them.
    #[error("self-loops are not allowed (node {0})")]
    SelfLoopForbidden(NodeId),

    /// The strategy has no well-defined rule for this operation.
    #[error("{strategy} does not support {operation}")]
    Unsupported {
        /// Strategy asked to perform the operation.
        strategy: &'static str,
        /// The unsupported operation.
        operation: &'static str,
    },

    /// Every candidate target of a node has been ruled out.
    #[error("{strategy}: node {node} has no eligible target left")]
    TargetsExhausted {
        /// Strategy that was selecting targets.
        strategy: &'static str,
        /// The node looking for a target.
        node: NodeId,
    },

    /// Rejection sampling exhausted its attempt budget.
    #[error("{strategy}: no feasible target found after {attempts} attempts")]
    NoFeasibleTarget {
        /// Strategy that was sampling.
        strategy: &'static str,
        /// Number of draws made before giving up.
        attempts: u32,
    },
}
