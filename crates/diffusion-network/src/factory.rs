//! Configuration keys to strategies.
//!
//! Each family (construction, weight, topology) has one resolver that maps a
//! key plus its [`Parameters`] to a boxed strategy, validating every
//! parameter the strategy needs before anything is built.
//!
//! | family | keys |
//! |---|---|
//! | construction | `gilbert`, `fixed_edge_count`, `degree_regular`, `heterogeneous_regular`, `small_world`, `barabasi_albert`, `spatial_exponential`, `spatial_power_law`, `manna_sen_yook` |
//! | weight | `constant`, `uniform`, `exponential_decay` |
//! | topology | `static`, `independent`, `random_rewire` |
//!
//! `heterogeneous_scale_free`, `spatial_regular`, `spatial_small_world` and
//! `spatial_scale_free` are recognised but not implemented.

use std::collections::BTreeMap;

use diffusion_types::Medium;
use serde::{Deserialize, Serialize};

use crate::construction::{
    AttachmentScore, ConstructionAlgorithm, DegreeRegular, FixedEdgeCount, HeterogeneousRegular,
    PreferentialAttachment, SmallWorld, UniformProbability,
};
use crate::error::NetworkError;
use crate::params::{Parameters, PerGroup};
use crate::sampling::RetryBudget;
use crate::topology::{IndependentAddDelete, RandomRewire, StaticTopology, TopologyScheme};
use crate::weight::{ConstantWeight, DecayingWeight, EdgeWeightScheme, UniformWeight};

/// A strategy key with its parameters, as written in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategySpec {
    /// Strategy key.
    #[serde(rename = "type")]
    pub kind: String,
    /// Strategy parameters.
    #[serde(default)]
    pub params: Parameters,
}

impl StrategySpec {
    /// Create a spec.
    pub fn new(kind: impl Into<String>, params: Parameters) -> Self {
        Self {
            kind: kind.into(),
            params,
        }
    }
}

/// The `network` section of the simulation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    /// Whether edges may start and end at the same node.
    #[serde(default)]
    pub self_referential: bool,
    /// Construction algorithm per medium; media not listed start empty.
    #[serde(default)]
    pub media: BTreeMap<Medium, StrategySpec>,
    /// Edge weight scheme.
    #[serde(default = "default_weights")]
    pub weights: StrategySpec,
    /// Topology scheme.
    #[serde(default = "default_topology")]
    pub topology: StrategySpec,
}

fn default_weights() -> StrategySpec {
    StrategySpec::new("constant", Parameters::new().with("weight", 1.0))
}

fn default_topology() -> StrategySpec {
    StrategySpec::new("static", Parameters::new())
}

impl Default for NetworkSpec {
    fn default() -> Self {
        Self {
            self_referential: false,
            media: BTreeMap::new(),
            weights: default_weights(),
            topology: default_topology(),
        }
    }
}

/// Resolve a construction algorithm.
///
/// # Errors
///
/// [`NetworkError::UnknownStrategy`] for unknown keys,
/// [`NetworkError::Unsupported`] for declared but unimplemented ones, and
/// the parameter errors of the chosen algorithm.
pub fn construction(key: &str, params: &Parameters) -> Result<Box<dyn ConstructionAlgorithm>, NetworkError> {
    let algorithm: Box<dyn ConstructionAlgorithm> = match key {
        "gilbert" => Box::new(UniformProbability::new(params.require_probability("gilbert", "probability")?)?),
        "fixed_edge_count" => {
            let strategy = "fixed_edge_count";
            let mut rule = FixedEdgeCount::new(params.require_count(strategy, "edges")?);
            if let Some(attempts) = params.optional_attempts(strategy, "max_attempts")? {
                rule = rule.with_budget(RetryBudget::new(attempts));
            }
            Box::new(rule)
        }
        "degree_regular" => Box::new(DegreeRegular::new(params.require_count("degree_regular", "degree")?)),
        "heterogeneous_regular" => Box::new(HeterogeneousRegular::new(out_degrees(
            "heterogeneous_regular",
            params,
        )?)),
        "small_world" => Box::new(SmallWorld::new(
            out_degrees("small_world", params)?,
            rewire_probabilities("small_world", params)?,
        )),
        "barabasi_albert" => {
            let exponent = params.optional_f64("barabasi_albert", "beta")?.unwrap_or(1.0);
            attachment(params, AttachmentScore::Degree { exponent })?
        }
        "spatial_exponential" => {
            let rate = params.require_f64("spatial_exponential", "decay")?;
            attachment(params, AttachmentScore::ExponentialDecay { rate })?
        }
        "spatial_power_law" => attachment(params, AttachmentScore::InverseSquare)?,
        "manna_sen_yook" => {
            let degree_exponent = params.optional_f64("manna_sen_yook", "beta")?.unwrap_or(1.0);
            let distance_exponent = params.require_f64("manna_sen_yook", "alpha")?;
            attachment(
                params,
                AttachmentScore::DegreeDistance {
                    degree_exponent,
                    distance_exponent,
                },
            )?
        }
        "heterogeneous_scale_free" => return Err(unsupported("heterogeneous_scale_free")),
        "spatial_regular" => return Err(unsupported("spatial_regular")),
        "spatial_small_world" => return Err(unsupported("spatial_small_world")),
        "spatial_scale_free" => return Err(unsupported("spatial_scale_free")),
        other => {
            return Err(NetworkError::UnknownStrategy {
                kind: "graph",
                key: other.to_owned(),
            });
        }
    };
    Ok(algorithm)
}

/// Resolve an edge weight scheme.
///
/// # Errors
///
/// [`NetworkError::UnknownStrategy`] for unknown keys and the parameter
/// errors of the chosen scheme.
pub fn weight_scheme(key: &str, params: &Parameters) -> Result<Box<dyn EdgeWeightScheme>, NetworkError> {
    let scheme: Box<dyn EdgeWeightScheme> = match key {
        "constant" => Box::new(ConstantWeight::new(params.require_f64("constant", "weight")?)?),
        "uniform" => Box::new(UniformWeight::new(
            params.require_f64("uniform", "lower")?,
            params.require_f64("uniform", "upper")?,
        )?),
        "exponential_decay" => {
            let strategy = "exponential_decay";
            Box::new(DecayingWeight::new(
                params.require_f64(strategy, "initial")?,
                params.require_f64(strategy, "half_life")?,
                params.optional_f64(strategy, "floor")?.unwrap_or(0.0),
            )?)
        }
        other => {
            return Err(NetworkError::UnknownStrategy {
                kind: "weight",
                key: other.to_owned(),
            });
        }
    };
    Ok(scheme)
}

/// Resolve a topology manipulation scheme.
///
/// # Errors
///
/// [`NetworkError::UnknownStrategy`] for unknown keys and the parameter
/// errors of the chosen scheme.
pub fn topology_scheme(key: &str, params: &Parameters) -> Result<Box<dyn TopologyScheme>, NetworkError> {
    let scheme: Box<dyn TopologyScheme> = match key {
        "static" => Box::new(StaticTopology),
        "independent" => Box::new(IndependentAddDelete::new(
            params.require_probability("independent", "delete_probability")?,
            params.require_probability("independent", "insert_probability")?,
        )?),
        "random_rewire" => {
            let strategy = "random_rewire";
            let mut scheme = RandomRewire::new(params.require_probability(strategy, "rewire_probability")?)?;
            if let Some(attempts) = params.optional_attempts(strategy, "max_attempts")? {
                scheme = scheme.with_budget(RetryBudget::new(attempts));
            }
            Box::new(scheme)
        }
        other => {
            return Err(NetworkError::UnknownStrategy {
                kind: "topology",
                key: other.to_owned(),
            });
        }
    };
    Ok(scheme)
}

const fn unsupported(strategy: &'static str) -> NetworkError {
    NetworkError::Unsupported {
        strategy,
        operation: "construction",
    }
}

fn attachment(params: &Parameters, score: AttachmentScore) -> Result<Box<dyn ConstructionAlgorithm>, NetworkError> {
    let strategy = score.key();
    let rule = PreferentialAttachment::new(
        params.require_count(strategy, "seed_size")?,
        params.require_count(strategy, "edges_per_node")?,
        params.optional_f64(strategy, "pseudo_count")?.unwrap_or(1.0),
        score,
    )?;
    Ok(Box::new(rule))
}

/// `out_degree` (number or group map) with `default_out_degree` as the
/// fallback for unlisted groups.
fn out_degrees(strategy: &'static str, params: &Parameters) -> Result<PerGroup<usize>, NetworkError> {
    per_group(
        params,
        "out_degree",
        params.optional_count(strategy, "default_out_degree")?,
        |p| p.require_group_counts(strategy, "out_degree"),
    )
}

/// `rewire` (number or group map) with `default_rewire` as the fallback.
fn rewire_probabilities(strategy: &'static str, params: &Parameters) -> Result<PerGroup<f64>, NetworkError> {
    per_group(
        params,
        "rewire",
        params.optional_probability(strategy, "default_rewire")?,
        |p| p.require_group_probabilities(strategy, "rewire"),
    )
}

fn per_group<T: Copy>(
    params: &Parameters,
    name: &str,
    fallback: Option<T>,
    parse: impl FnOnce(&Parameters) -> Result<PerGroup<T>, NetworkError>,
) -> Result<PerGroup<T>, NetworkError> {
    match (params.get(name), fallback) {
        (Some(value), Some(fallback)) if value.is_object() => Ok(parse(params)?.with_fallback(fallback)),
        (None, Some(fallback)) => Ok(PerGroup::uniform(fallback)),
        _ => parse(params),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn every_construction_key_resolves() {
        let cases = [
            ("gilbert", Parameters::new().with("probability", 0.2)),
            ("fixed_edge_count", Parameters::new().with("edges", 10).with("max_attempts", 50)),
            ("degree_regular", Parameters::new().with("degree", 2)),
            ("heterogeneous_regular", Parameters::new().with("out_degree", 3)),
            (
                "small_world",
                Parameters::new().with("out_degree", json!({"a": 2})).with("default_out_degree", 1).with("rewire", 0.1),
            ),
            ("barabasi_albert", Parameters::new().with("seed_size", 3).with("edges_per_node", 2)),
            (
                "spatial_exponential",
                Parameters::new().with("seed_size", 3).with("edges_per_node", 1).with("decay", 0.5),
            ),
            ("spatial_power_law", Parameters::new().with("seed_size", 3).with("edges_per_node", 1)),
            (
                "manna_sen_yook",
                Parameters::new().with("seed_size", 3).with("edges_per_node", 1).with("alpha", -2.0),
            ),
        ];
        for (key, params) in cases {
            let algorithm = construction(key, &params);
            assert_eq!(algorithm.map(|a| a.name()), Ok(key), "{key}");
        }
    }

    #[test]
    fn unknown_key_is_distinct_error() {
        let result = construction("lattice", &Parameters::new());
        assert!(matches!(
            result,
            Err(NetworkError::UnknownStrategy { kind: "graph", ref key }) if key == "lattice"
        ));
        assert!(matches!(
            weight_scheme("random", &Parameters::new()),
            Err(NetworkError::UnknownStrategy { kind: "weight", .. })
        ));
        assert!(matches!(
            topology_scheme("chaos", &Parameters::new()),
            Err(NetworkError::UnknownStrategy { kind: "topology", .. })
        ));
    }

    #[test]
    fn missing_parameter_is_named() {
        assert!(matches!(
            construction("gilbert", &Parameters::new()),
            Err(NetworkError::MissingParameter { strategy: "gilbert", ref parameter }) if parameter == "probability"
        ));
        assert!(matches!(
            construction("small_world", &Parameters::new().with("out_degree", 2)),
            Err(NetworkError::MissingParameter { strategy: "small_world", ref parameter }) if parameter == "rewire"
        ));
        assert!(matches!(
            weight_scheme("uniform", &Parameters::new().with("lower", 0.1)),
            Err(NetworkError::MissingParameter { ref parameter, .. }) if parameter == "upper"
        ));
    }

    #[test]
    fn ill_typed_and_out_of_range_parameters_rejected() {
        assert!(matches!(
            construction("gilbert", &Parameters::new().with("probability", 1.5)),
            Err(NetworkError::InvalidParameter { .. })
        ));
        assert!(matches!(
            construction("degree_regular", &Parameters::new().with("degree", "two")),
            Err(NetworkError::InvalidParameter { .. })
        ));
        assert!(matches!(
            weight_scheme("uniform", &Parameters::new().with("lower", 2.0).with("upper", 1.0)),
            Err(NetworkError::InvalidParameter { .. })
        ));
        assert!(matches!(
            topology_scheme("independent", &Parameters::new().with("delete_probability", 0.1).with("insert_probability", -1.0)),
            Err(NetworkError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn declared_stubs_are_unsupported() {
        for key in ["heterogeneous_scale_free", "spatial_regular", "spatial_small_world", "spatial_scale_free"] {
            assert!(matches!(
                construction(key, &Parameters::new()),
                Err(NetworkError::Unsupported { strategy, .. }) if strategy == key
            ));
        }
    }

    #[test]
    fn default_out_degree_alone_is_enough() {
        let algorithm = construction("heterogeneous_regular", &Parameters::new().with("default_out_degree", 2));
        assert!(algorithm.is_ok());
    }

    #[test]
    fn weight_and_topology_keys_resolve() {
        assert_eq!(weight_scheme("constant", &Parameters::new().with("weight", 2.0)).map(|w| w.name()), Ok("constant"));
        assert_eq!(
            weight_scheme(
                "exponential_decay",
                &Parameters::new().with("initial", 1.0).with("half_life", 5.0)
            )
            .map(|w| w.name()),
            Ok("exponential_decay")
        );
        assert_eq!(topology_scheme("static", &Parameters::new()).map(|t| t.name()), Ok("static"));
        assert_eq!(
            topology_scheme("random_rewire", &Parameters::new().with("rewire_probability", 0.05)).map(|t| t.name()),
            Ok("random_rewire")
        );
    }

    #[test]
    fn network_spec_defaults() {
        let spec: NetworkSpec = serde_json::from_value(json!({})).unwrap();
        assert!(!spec.self_referential);
        assert!(spec.media.is_empty());
        assert_eq!(spec.weights.kind, "constant");
        assert_eq!(spec.topology.kind, "static");
    }
}
