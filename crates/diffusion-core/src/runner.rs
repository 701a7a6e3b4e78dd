//! Seeded tick driver.
//!
//! [`Simulation`] owns the configuration, the seeded population, the built
//! [`DiffusionNetwork`], and the single [`StdRng`] every strategy draws
//! from. Each tick runs the topology scheme on every medium and, every
//! `world.reweigh_interval` ticks, recomputes edge weights.

use diffusion_network::{DiffusionNetwork, NetworkBlueprint, NetworkError};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info};

use crate::config::{ConfigError, SimulationConfig};
use crate::seeding::SeededPopulation;

/// Errors that can occur while setting up or running a simulation.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    /// The configuration was unusable.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// Building or mutating the network failed.
    #[error("network error: {source}")]
    Network {
        /// The underlying network error.
        #[from]
        source: NetworkError,
    },
}

/// What happened during one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// The tick that ran.
    pub tick: u64,
    /// Edges inserted by the topology scheme.
    pub added: usize,
    /// Edges deleted by the topology scheme.
    pub removed: usize,
    /// Edges relocated by the topology scheme.
    pub rewired: usize,
    /// Edges whose weight changed.
    pub reweighed: usize,
    /// Total edges after the tick.
    pub edges: usize,
}

/// Result of a full run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Ticks executed.
    pub ticks: u64,
    /// The last tick summary, if any tick ran.
    pub last: Option<TickSummary>,
}

/// A configured, built simulation ready to advance.
#[derive(Debug)]
pub struct Simulation {
    config: SimulationConfig,
    agents: SeededPopulation,
    network: DiffusionNetwork,
    rng: StdRng,
    tick: u64,
}

impl Simulation {
    /// Validate `config`, seed the population, and build the network.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::Config`] for invalid configuration and
    /// [`SimulationError::Network`] if a strategy cannot be resolved or
    /// fails to build.
    pub fn new(config: SimulationConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(config.world.seed);
        let agents = SeededPopulation::seed(&config.population, &mut rng)?;
        let blueprint = NetworkBlueprint::from_config(&config.network)?;
        let network = blueprint.build(agents.nodes().to_vec(), agents.collaborators(), &mut rng)?;
        info!(
            world = %config.world.name,
            seed = config.world.seed,
            agents = network.graph().node_count(),
            edges = network.graph().edge_count(),
            "simulation initialized"
        );
        Ok(Self {
            config,
            agents,
            network,
            rng,
            tick: 0,
        })
    }

    /// The configuration the simulation was built from.
    pub const fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// The seeded agents.
    pub const fn agents(&self) -> &SeededPopulation {
        &self.agents
    }

    /// The social network.
    pub const fn network(&self) -> &DiffusionNetwork {
        &self.network
    }

    /// Last completed tick (0 before the first step).
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Advance one tick.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::Network`] if a topology scheme fails.
    pub fn step(&mut self) -> Result<TickSummary, SimulationError> {
        let tick = self.tick.saturating_add(1);
        let report = self.network.manipulate_all(tick, &mut self.rng)?;
        let reweighed = if tick.checked_rem(self.config.world.reweigh_interval) == Some(0) {
            self.network.reweigh_edges(tick)
        } else {
            0
        };
        self.tick = tick;
        let summary = TickSummary {
            tick,
            added: report.added,
            removed: report.removed,
            rewired: report.rewired,
            reweighed,
            edges: self.network.graph().edge_count(),
        };
        debug!(
            tick,
            added = summary.added,
            removed = summary.removed,
            rewired = summary.rewired,
            reweighed,
            edges = summary.edges,
            "tick complete"
        );
        Ok(summary)
    }

    /// Run `world.ticks` ticks.
    ///
    /// # Errors
    ///
    /// Stops at the first failing tick.
    pub fn run(&mut self) -> Result<RunSummary, SimulationError> {
        let mut last = None;
        for _ in 0..self.config.world.ticks {
            last = Some(self.step()?);
        }
        info!(ticks = self.tick, edges = self.network.graph().edge_count(), "simulation finished");
        Ok(RunSummary {
            ticks: self.config.world.ticks,
            last,
        })
    }

    /// Admit `count` new agents at the current tick and attach them to the
    /// network.
    ///
    /// Returns the number of edges created.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::Network`] if a medium's construction
    /// algorithm cannot grow; the network is then unchanged, but the new
    /// agents stay in the population.
    pub fn grow(&mut self, count: usize) -> Result<usize, SimulationError> {
        let fresh = self.agents.extend(count, &mut self.rng)?;
        let added = self.network.grow(fresh, self.tick, self.agents.collaborators(), &mut self.rng)?;
        Ok(added)
    }
}
