//! Edge weight schemes.
//!
//! A scheme assigns the initial weight of every edge a construction or
//! topology strategy creates, and recomputes weights when the driver asks the
//! network to reweigh (typically once per tick). Time-dependent schemes read
//! an edge's age from its creation tick, so edges born mid-run start fresh.

use diffusion_types::{Edge, Medium, NodeId};
use rand::{Rng, RngCore};

use crate::error::NetworkError;

/// Strategy assigning and recomputing edge weights.
pub trait EdgeWeightScheme: core::fmt::Debug {
    /// Configuration key of the scheme.
    fn name(&self) -> &'static str;

    /// Weight of a freshly created edge (age 0).
    fn weigh_edge(&self, source: NodeId, target: NodeId, medium: Medium, rng: &mut dyn RngCore) -> f64;

    /// Weight of an existing edge at `tick`.
    fn reweigh_edge(&self, edge: &Edge, tick: u64) -> f64;
}

/// The same weight on every edge, forever.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantWeight {
    weight: f64,
}

impl ConstantWeight {
    /// Create the scheme.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::InvalidParameter`] for non-finite weights.
    pub fn new(weight: f64) -> Result<Self, NetworkError> {
        if !weight.is_finite() {
            return Err(NetworkError::InvalidParameter {
                strategy: "constant",
                parameter: "weight".to_owned(),
                reason: format!("weight must be finite, got {weight}"),
            });
        }
        Ok(Self { weight })
    }
}

impl Default for ConstantWeight {
    fn default() -> Self {
        Self { weight: 1.0 }
    }
}

impl EdgeWeightScheme for ConstantWeight {
    fn name(&self) -> &'static str {
        "constant"
    }

    fn weigh_edge(&self, _: NodeId, _: NodeId, _: Medium, _: &mut dyn RngCore) -> f64 {
        self.weight
    }

    fn reweigh_edge(&self, _: &Edge, _: u64) -> f64 {
        self.weight
    }
}

/// Initial weight drawn uniformly from `[lower, upper]`; never changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformWeight {
    lower: f64,
    upper: f64,
}

impl UniformWeight {
    /// Create the scheme.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::InvalidParameter`] when either bound is not
    /// finite or `lower > upper`.
    pub fn new(lower: f64, upper: f64) -> Result<Self, NetworkError> {
        if !lower.is_finite() || !upper.is_finite() || lower > upper {
            return Err(NetworkError::InvalidParameter {
                strategy: "uniform",
                parameter: "lower".to_owned(),
                reason: format!("bounds must satisfy lower <= upper, got [{lower}, {upper}]"),
            });
        }
        Ok(Self { lower, upper })
    }
}

impl EdgeWeightScheme for UniformWeight {
    fn name(&self) -> &'static str {
        "uniform"
    }

    fn weigh_edge(&self, _: NodeId, _: NodeId, _: Medium, rng: &mut dyn RngCore) -> f64 {
        rng.random_range(self.lower..=self.upper)
    }

    fn reweigh_edge(&self, edge: &Edge, _: u64) -> f64 {
        edge.weight
    }
}

/// Weight halves every `half_life` ticks of an edge's age, never dropping
/// below `floor`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecayingWeight {
    initial: f64,
    half_life: f64,
    floor: f64,
}

impl DecayingWeight {
    /// Create the scheme.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::InvalidParameter`] unless `half_life > 0` and
    /// `floor <= initial`.
    pub fn new(initial: f64, half_life: f64, floor: f64) -> Result<Self, NetworkError> {
        let invalid = |parameter: &str, reason: String| NetworkError::InvalidParameter {
            strategy: "exponential_decay",
            parameter: parameter.to_owned(),
            reason,
        };
        if !half_life.is_finite() || half_life <= 0.0 {
            return Err(invalid("half_life", format!("half life must be positive, got {half_life}")));
        }
        if !initial.is_finite() || !floor.is_finite() || floor > initial {
            return Err(invalid(
                "floor",
                format!("floor {floor} must not exceed initial weight {initial}"),
            ));
        }
        Ok(Self {
            initial,
            half_life,
            floor,
        })
    }

    /// Weight of an edge `age` ticks old.
    #[allow(clippy::cast_precision_loss)] // ticks stay far below 2^52
    pub fn at(&self, age: u64) -> f64 {
        let halvings = age as f64 / self.half_life;
        (self.initial * 0.5_f64.powf(halvings)).max(self.floor)
    }
}

impl EdgeWeightScheme for DecayingWeight {
    fn name(&self) -> &'static str {
        "exponential_decay"
    }

    fn weigh_edge(&self, _: NodeId, _: NodeId, _: Medium, _: &mut dyn RngCore) -> f64 {
        self.initial
    }

    fn reweigh_edge(&self, edge: &Edge, tick: u64) -> f64 {
        self.at(edge.age_at(tick))
    }
}
