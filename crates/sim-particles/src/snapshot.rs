//! Ensemble Snapshots
//!
//! Serialization structs for checkpointing the ensemble during refinement.
//!
//! Snapshots capture the full member list at a refinement iteration and are
//! the only state persisted across calibration runs.

use serde::{Deserialize, Serialize};

use crate::{Ensemble, WeightedParticle};

/// Builds the canonical snapshot file name for a run title and iteration.
pub fn snapshot_filename(title: &str, iteration: u64) -> String {
    format!("ensemble_{}_{}.json", title, iteration)
}

/// A point-in-time copy of the ensemble, keyed by run title and iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleSnapshot {
    pub title: String,
    pub iteration: u64,
    pub members: Vec<WeightedParticle>,
}

impl EnsembleSnapshot {
    /// Captures the given members under a run title and iteration.
    pub fn new(title: impl Into<String>, iteration: u64, members: Vec<WeightedParticle>) -> Self {
        Self {
            title: title.into(),
            iteration,
            members,
        }
    }

    /// Captures the current state of an ensemble.
    pub fn of_ensemble(title: impl Into<String>, iteration: u64, ensemble: &Ensemble) -> Self {
        Self::new(title, iteration, ensemble.members().to_vec())
    }
}
