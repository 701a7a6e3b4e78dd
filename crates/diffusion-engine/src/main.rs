//! Command-line driver for the innovation-diffusion simulation.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from the path given as the first argument, or from
//!    `diffusion-config.yaml` when present, or fall back to defaults
//! 2. Initialize structured logging (tracing), honouring `RUST_LOG`
//! 3. Seed the population and build the social network
//! 4. Run the configured number of ticks
//! 5. Log a per-medium summary of the final network

mod error;

use std::path::{Path, PathBuf};

use diffusion_core::{Simulation, SimulationConfig};
use diffusion_types::Medium;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG: &str = "diffusion-config.yaml";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (config, source) = load_config()?;
    init_logging(&config);
    info!(config = %source.display(), "diffusion-engine starting");

    let mut simulation = Simulation::new(config).map_err(EngineError::from)?;
    let result = simulation.run().map_err(EngineError::from)?;

    let graph = simulation.network().graph();
    for medium in Medium::ALL {
        info!(
            medium = %medium,
            edges = graph.edge_count_for(medium),
            "final network"
        );
    }
    info!(
        ticks = result.ticks,
        agents = graph.node_count(),
        edges = graph.edge_count(),
        "diffusion-engine finished"
    );
    Ok(())
}

/// Initialize the tracing subscriber: `RUST_LOG` wins over the configured
/// level, and `logging.json` switches to JSON lines.
fn init_logging(config: &SimulationConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    if config.logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Resolve and load the configuration file.
fn load_config() -> Result<(SimulationConfig, PathBuf), EngineError> {
    if let Some(path) = std::env::args_os().nth(1).map(PathBuf::from) {
        let config = SimulationConfig::from_file(&path)?;
        return Ok((config, path));
    }
    let default_path = Path::new(DEFAULT_CONFIG);
    if default_path.exists() {
        let config = SimulationConfig::from_file(default_path)?;
        Ok((config, default_path.to_path_buf()))
    } else {
        Ok((SimulationConfig::default(), PathBuf::from("<defaults>")))
    }
}
