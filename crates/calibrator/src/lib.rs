//! Two-stage approximate Bayesian calibration of the misinformation
//! diffusion model.
//!
//! Rejection sampling builds a pool of scored prior draws and an initial
//! ensemble; adaptive random-walk refinement then mutates the ensemble one
//! slot at a time, re-estimating its proposal covariance and annealing the
//! tolerance as the acceptance rate falls.

use thiserror::Error;

pub mod config;
pub mod distance;
pub mod engine;
pub mod kernel;
pub mod output;
pub mod sampler;

pub use config::{CalibConfig, ConfigError};
pub use distance::{distance, summarize, SummaryStats};
pub use engine::{CalibrationReport, CalibrationStage, Calibrator};
pub use kernel::ImportanceKernel;
pub use output::{read_snapshot, write_snapshot, OutputError};
pub use sampler::{GaussianPerturber, PriorSampler, Proposal};

/// Errors that can stop a calibration run.
#[derive(Debug, Error)]
pub enum CalibError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("simulation failed: {0}")]
    Simulation(#[from] sim_agents::SimError),

    #[error("parameter error: {0}")]
    Params(#[from] sim_particles::ParamError),

    #[error("snapshot persistence failed: {0}")]
    Output(#[from] OutputError),
}
