//! Configuration loading for the calibrator.
//!
//! All tuning constants live in a TOML configuration file; the two
//! required run inputs (topology and run title) come from the command
//! line and override their config-file counterparts.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use sim_agents::Topology;

/// Complete calibrator configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalibConfig {
    /// Simulation sizing and seeding
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Distance scoring settings
    #[serde(default)]
    pub distance: DistanceConfig,
    /// Rejection sampling settings
    #[serde(default)]
    pub rejection: RejectionConfig,
    /// Refinement loop settings
    #[serde(default)]
    pub refinement: RefinementConfig,
    /// Snapshot output settings
    #[serde(default)]
    pub output: OutputConfig,
}

impl CalibConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::Parse)
    }

    /// Loads the given file when it exists, otherwise returns defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Rejects parameter combinations the run could not survive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.simulation.n_agents == 0 {
            return Err(ConfigError::Invalid("n_agents must be positive".into()));
        }
        if self.distance.alpha <= 0.0 {
            return Err(ConfigError::Invalid(
                "alpha must be positive (zero divides the distance by zero)".into(),
            ));
        }
        if self.rejection.ensemble_size == 0 {
            return Err(ConfigError::Invalid("ensemble_size must be positive".into()));
        }
        if self.rejection.epsilon_init <= 0.0 {
            return Err(ConfigError::Invalid("epsilon_init must be positive".into()));
        }
        if self.refinement.covariance_refresh_interval < 2 {
            return Err(ConfigError::Invalid(
                "covariance_refresh_interval needs at least two samples".into(),
            ));
        }
        Ok(())
    }
}

/// Simulation sizing and seeding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Network topology; overridden by the CLI positional argument
    pub topology: Topology,
    /// Agents per simulation run
    pub n_agents: usize,
    /// Run seed; omitted means seed from entropy
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            topology: Topology::Random,
            n_agents: 100,
            seed: None,
        }
    }
}

/// Distance scoring settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DistanceConfig {
    /// Tolerance-shaping exponent applied to each discrepancy term
    pub alpha: f64,
}

impl Default for DistanceConfig {
    fn default() -> Self {
        Self { alpha: 2.6 }
    }
}

/// Rejection sampling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RejectionConfig {
    /// Initial tolerance scale for the acceptance probability
    pub epsilon_init: f64,
    /// Target ensemble size M
    pub ensemble_size: usize,
}

impl Default for RejectionConfig {
    fn default() -> Self {
        Self {
            epsilon_init: 0.5,
            ensemble_size: 250,
        }
    }
}

/// Refinement loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefinementConfig {
    /// Weight of the sampled covariance in the refreshed proposal matrix
    pub beta: f64,
    /// Weight of the trace ridge in the refreshed proposal matrix
    pub little_s: f64,
    /// Quadratic coefficient of the tolerance anneal
    pub u_const: f64,
    /// Cube-root coefficient of the tolerance anneal
    pub gamma_v_ratio: f64,
    /// Iterations between covariance re-estimations
    pub covariance_refresh_interval: u64,
    /// Optional hard iteration cap; the acceptance-ratio exit is
    /// data-dependent and not guaranteed to trigger in bounded time
    pub max_iterations: Option<u64>,
    /// Score proposals with their own parameters. Disabling reproduces
    /// the historical behavior of re-scoring the last rejection-stage
    /// draw instead of the proposal.
    pub evaluate_proposed_params: bool,
}

impl Default for RefinementConfig {
    fn default() -> Self {
        Self {
            beta: 0.98,
            little_s: 0.02,
            u_const: 1.0,
            gamma_v_ratio: 0.2,
            covariance_refresh_interval: 100,
            max_iterations: None,
            evaluate_proposed_params: true,
        }
    }
}

/// Snapshot output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving ensemble snapshots
    pub snapshot_dir: PathBuf,
    /// Run title used in snapshot filenames; overridden by the CLI
    /// positional argument
    pub run_title: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            snapshot_dir: PathBuf::from("snapshots"),
            run_title: "calibration".to_string(),
        }
    }
}

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading config file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Error parsing TOML config
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Values that cannot produce a runnable calibration
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
