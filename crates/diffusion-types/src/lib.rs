//! Shared type definitions for the innovation-diffusion social network.
//!
//! # Modules
//!
//! - [`ids`] -- UUID-backed [`NodeId`] and named [`GroupName`]
//! - [`enums`] -- the [`Medium`] an edge belongs to
//! - [`structs`] -- [`Node`], [`Edge`], and the [`EdgeKey`] identity

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::Medium;
pub use ids::{GroupName, NodeId};
pub use structs::{Edge, EdgeKey, Node};
