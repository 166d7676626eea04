//! Shared particle and ensemble types for the misinformation calibrator.
//!
//! This crate contains pure data structures with no simulation logic.
//! It is a dependency for all other crates in the workspace.

pub mod params;
pub mod particle;
pub mod snapshot;

// Re-export parameter types
pub use params::{
    ParamError, ParameterSet, SeedTrait, PARAM_NAMES, PARAM_SET_DIMENSION, RATE_PARAM_COUNT,
    SHAPE_PARAM_COUNT,
};

// Re-export particle types
pub use particle::{Ensemble, Particle, Pool, WeightedParticle};

// Re-export snapshot types
pub use snapshot::{snapshot_filename, EnsembleSnapshot};
