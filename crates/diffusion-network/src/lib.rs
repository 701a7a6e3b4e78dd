//! Social network construction and evolution for the innovation-diffusion
//! simulation.
//!
//! Agents are nodes of a directed graph whose edges live on one of several
//! media (communication, trust). Pluggable strategies build the initial edge
//! set, assign edge weights, and mutate the topology as the simulation
//! advances. Every strategy receives its random source explicitly, so a
//! seeded generator reproduces the same network.
//!
//! # Modules
//!
//! - [`construction`] -- generative algorithms deciding the initial edges
//! - [`degree`] -- in-place degree bucket queue used for balancing
//! - [`error`] -- [`NetworkError`], shared by every fallible operation
//! - [`factory`] -- configuration keys to strategies
//! - [`graph`] -- [`SocialNetwork`], the invariant-preserving graph
//! - [`network`] -- [`NetworkBlueprint`] and the built [`DiffusionNetwork`]
//! - [`params`] -- typed access to free-form strategy parameters
//! - [`population`] -- agent groups, affinities and geography collaborators
//! - [`sampling`] -- weighted draws and bounded rejection sampling
//! - [`topology`] -- per-tick topology manipulation schemes
//! - [`weight`] -- edge weight schemes

pub mod construction;
pub mod degree;
pub mod error;
pub mod factory;
pub mod graph;
pub mod network;
pub mod params;
pub mod population;
pub mod sampling;
pub mod topology;
pub mod weight;

// Re-export primary types at crate root.
pub use construction::{BuildContext, Collaborators, ConstructionAlgorithm, EdgeDraft};
pub use degree::DegreeBuckets;
pub use error::NetworkError;
pub use factory::{NetworkSpec, StrategySpec};
pub use graph::SocialNetwork;
pub use network::{DiffusionNetwork, NetworkBlueprint};
pub use params::{Parameters, PerGroup};
pub use population::{AffinityMatrix, Geography, PlaneGeography, Population};
pub use sampling::{CumulativeDistribution, RetryBudget};
pub use topology::{TopologyReport, TopologyScheme};
pub use weight::EdgeWeightScheme;
