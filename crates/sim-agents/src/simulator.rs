//! Diffusion Simulator
//!
//! Runs one full simulation: sample agents, build the network, compute
//! closeness, then drive the synchronous belief-diffusion rounds.

use std::collections::BTreeMap;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use rayon::prelude::*;
use sim_particles::ParameterSet;

use crate::network::{build_network, closeness_centrality, Topology};
use crate::update::{AgentUpdate, AgentUpdater};
use crate::{Agent, SimError};

/// Number of synchronous rounds per simulation run.
pub const ROUNDS: usize = 250;

/// Per-agent, per-round share counts.
#[derive(Debug, Clone, Default)]
pub struct SharesTable {
    rows: Vec<Vec<u32>>,
}

impl SharesTable {
    fn with_agents(n: usize) -> Self {
        Self {
            rows: vec![Vec::with_capacity(ROUNDS); n],
        }
    }

    /// Builds a table from pre-recorded rows, one per agent in id order.
    pub fn from_rows(rows: Vec<Vec<u32>>) -> Self {
        Self { rows }
    }

    fn record(&mut self, agent_id: usize, shares: u32) {
        self.rows[agent_id].push(shares);
    }

    /// Total shares per agent, in id order.
    pub fn totals(&self) -> Vec<f64> {
        self.rows
            .iter()
            .map(|row| row.iter().map(|&s| f64::from(s)).sum())
            .collect()
    }

    /// Share count for one agent in one round.
    pub fn get(&self, agent_id: usize, round: usize) -> u32 {
        self.rows[agent_id][round]
    }

    pub fn agent_count(&self) -> usize {
        self.rows.len()
    }
}

/// Pre-update state of one agent at the top of a round.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceRecord {
    pub neighbor_trust: BTreeMap<usize, f64>,
    pub misinfo_belief: f64,
    pub share_propensity: f64,
}

/// Per-agent, per-round pre-update state.
///
/// Appended at the top of every round and never rewritten. The trace
/// travels with the run output and is dropped once the run is scored.
#[derive(Debug, Clone, Default)]
pub struct SimulationTrace {
    rows: Vec<Vec<TraceRecord>>,
}

impl SimulationTrace {
    fn with_agents(n: usize) -> Self {
        Self {
            rows: vec![Vec::with_capacity(ROUNDS); n],
        }
    }

    fn record(&mut self, agent: &Agent) {
        self.rows[agent.id].push(TraceRecord {
            neighbor_trust: agent.neighbors.clone(),
            misinfo_belief: agent.misinfo_belief,
            share_propensity: agent.share_propensity,
        });
    }

    pub fn get(&self, agent_id: usize, round: usize) -> &TraceRecord {
        &self.rows[agent_id][round]
    }

    pub fn rounds_recorded(&self, agent_id: usize) -> usize {
        self.rows[agent_id].len()
    }
}

/// Output of one simulation run.
#[derive(Debug, Clone)]
pub struct SimulationRun {
    pub agents: Vec<Agent>,
    pub shares: SharesTable,
    pub centrality: Vec<f64>,
    pub trace: SimulationTrace,
}

/// Drives full simulation runs for a fixed topology and update rule.
pub struct DiffusionSimulator<U> {
    topology: Topology,
    updater: U,
}

impl<U: AgentUpdater> DiffusionSimulator<U> {
    pub fn new(topology: Topology, updater: U) -> Self {
        Self { topology, updater }
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    /// Runs one simulation of `n` agents under the given parameters.
    ///
    /// Every round is two-phase: all updates are computed in parallel
    /// against the frozen pre-round agent states, then committed together.
    /// The per-agent RNG is keyed on (seed, round, agent id), so results
    /// do not depend on how the parallel map is scheduled.
    pub fn run(
        &self,
        n: usize,
        params: &ParameterSet,
        seed: u64,
    ) -> Result<SimulationRun, SimError> {
        let mut rng = SmallRng::seed_from_u64(seed);

        let mut agents = Vec::with_capacity(n);
        for id in 0..n {
            agents.push(Agent::sample(id, params, &mut rng)?);
        }
        let graph = build_network(self.topology, &mut agents, params, &mut rng)?;
        let centrality = closeness_centrality(&graph);

        let mut shares = SharesTable::with_agents(n);
        let mut trace = SimulationTrace::with_agents(n);

        for round in 0..ROUNDS {
            for agent in &agents {
                trace.record(agent);
            }
            self.advance_round(&mut agents, params, seed, round, &mut shares);
        }

        tracing::debug!(
            "simulation complete: {} agents, {} rounds, {} edges",
            n,
            ROUNDS,
            graph.edge_count()
        );

        Ok(SimulationRun {
            agents,
            shares,
            centrality,
            trace,
        })
    }

    /// One two-phase round: gather and update against the pre-round arena
    /// in parallel, then commit every replacement.
    fn advance_round(
        &self,
        agents: &mut [Agent],
        params: &ParameterSet,
        seed: u64,
        round: usize,
        shares: &mut SharesTable,
    ) {
        let n = agents.len();
        let arena: &[Agent] = agents;

        let updates: Vec<AgentUpdate> = arena
            .par_iter()
            .map(|agent| {
                let neighbor_beliefs: Vec<(usize, f64)> = agent
                    .neighbors
                    .keys()
                    .map(|&id| (id, arena[id].misinfo_belief))
                    .collect();
                let neighbor_forcefulness: Vec<f64> = agent
                    .neighbors
                    .keys()
                    .map(|&id| arena[id].forcefulness)
                    .collect();

                let cell = (round * n + agent.id) as u64;
                let mut agent_rng = SmallRng::seed_from_u64(counter_rng_seed(seed, cell));
                self.updater.update(
                    agent,
                    &neighbor_beliefs,
                    &neighbor_forcefulness,
                    params,
                    &mut agent_rng,
                )
            })
            .collect();

        for (agent, update) in agents.iter_mut().zip(updates) {
            agent.neighbors = update.neighbor_trust;
            agent.misinfo_belief = update.misinfo_belief;
            agent.share_propensity = update.share_propensity;
            shares.record(agent.id, update.shares);
        }
    }
}

/// Counter-based RNG seed derivation using SplitMix64.
///
/// Each (round, agent) cell gets an independent stream keyed off the run
/// seed, which keeps the parallel update phase reproducible.
fn counter_rng_seed(base_seed: u64, counter: u64) -> u64 {
    let mut z = base_seed.wrapping_add(counter.wrapping_mul(0x9e3779b97f4a7c15));
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
    z ^ (z >> 31)
}
