//! Free-form strategy parameters with typed, validating accessors.
//!
//! Configuration hands each strategy a map of names to JSON-like values.
//! [`Parameters`] turns missing or ill-typed entries into
//! [`NetworkError::MissingParameter`] / [`NetworkError::InvalidParameter`]
//! naming the strategy and the parameter.

use std::collections::BTreeMap;

use diffusion_types::GroupName;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::NetworkError;

/// A strategy's parameter map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Parameters(BTreeMap<String, Value>);

impl Parameters {
    /// Create an empty parameter map.
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert or overwrite a parameter.
    pub fn insert(&mut self, name: &str, value: impl Into<Value>) {
        self.0.insert(name.to_owned(), value.into());
    }

    /// Raw access to a parameter.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// A required floating-point parameter.
    pub fn require_f64(&self, strategy: &'static str, name: &str) -> Result<f64, NetworkError> {
        self.optional_f64(strategy, name)?
            .ok_or_else(|| missing(strategy, name))
    }

    /// An optional floating-point parameter.
    pub fn optional_f64(&self, strategy: &'static str, name: &str) -> Result<Option<f64>, NetworkError> {
        self.get(name)
            .map(|value| as_finite(strategy, name, value))
            .transpose()
    }

    /// A required probability in `[0, 1]`.
    pub fn require_probability(&self, strategy: &'static str, name: &str) -> Result<f64, NetworkError> {
        let p = self.require_f64(strategy, name)?;
        check_probability(strategy, name, p)
    }

    /// An optional probability in `[0, 1]`.
    pub fn optional_probability(
        &self,
        strategy: &'static str,
        name: &str,
    ) -> Result<Option<f64>, NetworkError> {
        self.optional_f64(strategy, name)?
            .map(|p| check_probability(strategy, name, p))
            .transpose()
    }

    /// A required non-negative integer.
    pub fn require_count(&self, strategy: &'static str, name: &str) -> Result<usize, NetworkError> {
        self.optional_count(strategy, name)?
            .ok_or_else(|| missing(strategy, name))
    }

    /// An optional non-negative integer.
    pub fn optional_count(&self, strategy: &'static str, name: &str) -> Result<Option<usize>, NetworkError> {
        self.get(name)
            .map(|value| as_count(strategy, name, value))
            .transpose()
    }

    /// An optional attempt budget (positive integer that fits in `u32`).
    pub fn optional_attempts(&self, strategy: &'static str, name: &str) -> Result<Option<u32>, NetworkError> {
        let Some(count) = self.optional_count(strategy, name)? else {
            return Ok(None);
        };
        match u32::try_from(count) {
            Ok(attempts) if attempts > 0 => Ok(Some(attempts)),
            _ => Err(invalid(strategy, name, format!("expected 1..={}, got {count}", u32::MAX))),
        }
    }

    /// A required per-group integer: either one number for every group or
    /// a map from group name to number.
    pub fn require_group_counts(
        &self,
        strategy: &'static str,
        name: &str,
    ) -> Result<PerGroup<usize>, NetworkError> {
        let value = self.get(name).ok_or_else(|| missing(strategy, name))?;
        PerGroup::parse(value, |v| as_count(strategy, name, v))
    }

    /// A required per-group probability, shaped like
    /// [`Parameters::require_group_counts`].
    pub fn require_group_probabilities(
        &self,
        strategy: &'static str,
        name: &str,
    ) -> Result<PerGroup<f64>, NetworkError> {
        let value = self.get(name).ok_or_else(|| missing(strategy, name))?;
        PerGroup::parse(value, |v| {
            let p = as_finite(strategy, name, v)?;
            check_probability(strategy, name, p)
        })
    }
}

/// A value configured per agent group, with an optional fallback.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerGroup<T> {
    fallback: Option<T>,
    values: BTreeMap<GroupName, T>,
}

impl<T: Copy> PerGroup<T> {
    /// The same value for every group.
    pub const fn uniform(value: T) -> Self {
        Self {
            fallback: Some(value),
            values: BTreeMap::new(),
        }
    }

    /// Explicit values per group, no fallback.
    pub const fn from_map(values: BTreeMap<GroupName, T>) -> Self {
        Self {
            fallback: None,
            values,
        }
    }

    /// Set the value used for groups without an explicit entry.
    #[must_use]
    pub fn with_fallback(mut self, value: T) -> Self {
        self.fallback = Some(value);
        self
    }

    /// The value for `group`, falling back to the uniform value.
    pub fn get(&self, group: &GroupName) -> Option<T> {
        self.values.get(group).copied().or(self.fallback)
    }

    fn parse(
        value: &Value,
        mut item: impl FnMut(&Value) -> Result<T, NetworkError>,
    ) -> Result<Self, NetworkError> {
        match value.as_object() {
            Some(map) => {
                let mut values = BTreeMap::new();
                for (group, v) in map {
                    values.insert(GroupName::from(group.as_str()), item(v)?);
                }
                Ok(Self::from_map(values))
            }
            None => Ok(Self::uniform(item(value)?)),
        }
    }
}

fn missing(strategy: &'static str, name: &str) -> NetworkError {
    NetworkError::MissingParameter {
        strategy,
        parameter: name.to_owned(),
    }
}

fn invalid(strategy: &'static str, name: &str, reason: String) -> NetworkError {
    NetworkError::InvalidParameter {
        strategy,
        parameter: name.to_owned(),
        reason,
    }
}

fn as_finite(strategy: &'static str, name: &str, value: &Value) -> Result<f64, NetworkError> {
    value
        .as_f64()
        .filter(|v| v.is_finite())
        .ok_or_else(|| invalid(strategy, name, format!("expected a number, got {value}")))
}

fn as_count(strategy: &'static str, name: &str, value: &Value) -> Result<usize, NetworkError> {
    value
        .as_u64()
        .and_then(|v| usize::try_from(v).ok())
        .ok_or_else(|| invalid(strategy, name, format!("expected a non-negative integer, got {value}")))
}

fn check_probability(strategy: &'static str, name: &str, p: f64) -> Result<f64, NetworkError> {
    if (0.0..=1.0).contains(&p) {
        Ok(p)
    } else {
        Err(invalid(strategy, name, format!("probability must lie in [0, 1], got {p}")))
    }
}
