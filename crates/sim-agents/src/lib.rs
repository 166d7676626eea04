//! Agent simulation for the misinformation diffusion model.
//!
//! Samples an agent population from a parameter set, wires it into a
//! network topology, and drives synchronous belief-diffusion rounds. The
//! calibrator scores the resulting share table and centrality vector.

use thiserror::Error;

pub mod agent;
pub mod network;
pub mod simulator;
pub mod update;

// Re-export agent types
pub use agent::Agent;

// Re-export network types
pub use network::{
    closeness_centrality, Topology, ATTACHMENT_EDGES, EDGE_PROBABILITY, POWERLAW_EXPONENT,
    TRIANGLE_PROBABILITY,
};

// Re-export simulator types
pub use simulator::{
    DiffusionSimulator, SharesTable, SimulationRun, SimulationTrace, TraceRecord, ROUNDS,
};

// Re-export update types
pub use update::{AgentUpdate, AgentUpdater, TrustWeightedUpdater};

/// Errors from agent sampling and network construction.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("beta distribution rejected shape parameters: {0}")]
    Distribution(#[from] rand_distr::BetaError),

    #[error("topology {topology} needs at least {min} agents, got {got}")]
    NetworkSize {
        topology: &'static str,
        got: usize,
        min: usize,
    },

    #[error("unknown topology: {0} (expected er, config, or pwrlaw)")]
    UnknownTopology(String),
}
