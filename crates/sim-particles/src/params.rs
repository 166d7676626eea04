//! Parameter Sets
//!
//! The calibrated parameter vector: five Beta shape pairs that seed agent
//! traits and initial neighbor trust, plus two rate constants driving
//! belief adoption and sharing.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of Beta shape parameters (five (shape1, shape2) pairs).
pub const SHAPE_PARAM_COUNT: usize = 10;

/// Number of rate parameters.
pub const RATE_PARAM_COUNT: usize = 2;

/// Total dimension of a parameter set.
pub const PARAM_SET_DIMENSION: usize = SHAPE_PARAM_COUNT + RATE_PARAM_COUNT;

/// Canonical parameter order: shape pairs for forcefulness, share
/// propensity, misinfo belief, trust stability, and initial neighbor
/// trust, then the belief and share rates.
pub const PARAM_NAMES: [&str; PARAM_SET_DIMENSION] = [
    "B1_START_FO",
    "B2_START_FO",
    "B1_START_SP",
    "B2_START_SP",
    "B1_START_MB",
    "B2_START_MB",
    "B1_START_TS",
    "B2_START_TS",
    "B1_START_TR",
    "B2_START_TR",
    "R_BELIEF",
    "R_SHARE",
];

/// Errors from parameter set construction and lookup.
#[derive(Debug, Error)]
pub enum ParamError {
    #[error("parameter vector has length {got}, expected {expected}")]
    DimensionMismatch { got: usize, expected: usize },
    #[error("unknown parameter name: {0}")]
    UnknownName(String),
}

/// The five Beta-distributed quantities seeded by the shape pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedTrait {
    Forcefulness,
    SharePropensity,
    MisinfoBelief,
    TrustStability,
    InitialTrust,
}

impl SeedTrait {
    /// Offset of this quantity's (shape1, shape2) pair in canonical order.
    fn pair_offset(&self) -> usize {
        match self {
            SeedTrait::Forcefulness => 0,
            SeedTrait::SharePropensity => 2,
            SeedTrait::MisinfoBelief => 4,
            SeedTrait::TrustStability => 6,
            SeedTrait::InitialTrust => 8,
        }
    }

}

/// An ordered, fixed-dimension vector of model parameters.
///
/// Serializes as a plain JSON array; deserialization re-checks the
/// dimension so a truncated snapshot cannot produce a short vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct ParameterSet {
    values: Vec<f64>,
}

impl ParameterSet {
    /// Builds a parameter set from a full-dimension vector.
    pub fn new(values: Vec<f64>) -> Result<Self, ParamError> {
        if values.len() != PARAM_SET_DIMENSION {
            return Err(ParamError::DimensionMismatch {
                got: values.len(),
                expected: PARAM_SET_DIMENSION,
            });
        }
        Ok(Self { values })
    }

    /// Looks up a parameter by canonical name.
    pub fn get(&self, name: &str) -> Result<f64, ParamError> {
        PARAM_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|i| self.values[i])
            .ok_or_else(|| ParamError::UnknownName(name.to_string()))
    }

    /// The (shape1, shape2) Beta pair seeding the given quantity.
    pub fn shapes(&self, seed: SeedTrait) -> (f64, f64) {
        let i = seed.pair_offset();
        (self.values[i], self.values[i + 1])
    }

    /// Rate constant scaling belief adoption, sampled on [0, 100).
    pub fn belief_rate(&self) -> f64 {
        self.values[SHAPE_PARAM_COUNT]
    }

    /// Rate constant scaling share emission, sampled on [0, 100).
    pub fn share_rate(&self) -> f64 {
        self.values[SHAPE_PARAM_COUNT + 1]
    }

    /// Full vector in canonical order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

impl TryFrom<Vec<f64>> for ParameterSet {
    type Error = ParamError;

    fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
        Self::new(values)
    }
}

impl From<ParameterSet> for Vec<f64> {
    fn from(set: ParameterSet) -> Self {
        set.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_set() -> ParameterSet {
        let values: Vec<f64> = (0..PARAM_SET_DIMENSION).map(|i| i as f64).collect();
        ParameterSet::new(values).unwrap()
    }

    #[test]
    fn test_dimension_is_enforced() {
        let err = ParameterSet::new(vec![1.0; 5]).unwrap_err();
        assert!(matches!(
            err,
            ParamError::DimensionMismatch { got: 5, expected } if expected == PARAM_SET_DIMENSION
        ));
    }

    #[test]
    fn test_name_lookup() {
        let set = make_set();
        assert_eq!(set.get("B1_START_FO").unwrap(), 0.0);
        assert_eq!(set.get("B2_START_TR").unwrap(), 9.0);
        assert_eq!(set.get("R_SHARE").unwrap(), 11.0);
        assert!(matches!(
            set.get("NOT_A_PARAM"),
            Err(ParamError::UnknownName(_))
        ));
    }

    #[test]
    fn test_shape_pairs_follow_canonical_order() {
        let set = make_set();
        assert_eq!(set.shapes(SeedTrait::Forcefulness), (0.0, 1.0));
        assert_eq!(set.shapes(SeedTrait::MisinfoBelief), (4.0, 5.0));
        assert_eq!(set.shapes(SeedTrait::InitialTrust), (8.0, 9.0));
        assert_eq!(set.belief_rate(), 10.0);
        assert_eq!(set.share_rate(), 11.0);
    }

    #[test]
    fn test_serializes_as_flat_array() {
        let set = make_set();
        let json = serde_json::to_string(&set).unwrap();
        assert!(json.starts_with('['));
        let back: ParameterSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }

    #[test]
    fn test_short_array_fails_to_deserialize() {
        let result: Result<ParameterSet, _> = serde_json::from_str("[1.0, 2.0, 3.0]");
        assert!(result.is_err());
    }
}
