//! Configuration, population seeding, and tick driver for the
//! innovation-diffusion simulation.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `diffusion-config.yaml` into
//!   strongly-typed structs.
//! - [`seeding`] -- Synthetic agents, groups, affinities, and positions.
//! - [`runner`] -- [`Simulation`], the seeded tick driver.
//!
//! [`Simulation`]: runner::Simulation

pub mod config;
pub mod runner;
pub mod seeding;

pub use config::{ConfigError, SimulationConfig};
pub use runner::{RunSummary, Simulation, SimulationError, TickSummary};
pub use seeding::SeededPopulation;
