//! Per-Agent Update Rule
//!
//! The seam between the round driver and the belief-update mathematics.
//! The driver gathers each agent's neighborhood from the frozen pre-round
//! arena and hands it to an updater; swapping the rule never touches the
//! round loop.

use std::collections::BTreeMap;

use rand::rngs::SmallRng;
use rand_distr::{Distribution, Poisson};
use sim_particles::ParameterSet;

use crate::Agent;

/// Replacement state for one agent after a round.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentUpdate {
    pub neighbor_trust: BTreeMap<usize, f64>,
    pub misinfo_belief: f64,
    pub share_propensity: f64,
    pub shares: u32,
}

/// The per-agent update contract.
///
/// `agent` is the pre-round state. `neighbor_beliefs` pairs each neighbor
/// id with its pre-round belief; `neighbor_forcefulness` is aligned with
/// it. Implementations must be pure apart from the passed RNG, since the
/// driver runs them in parallel against a shared snapshot.
pub trait AgentUpdater: Send + Sync {
    fn update(
        &self,
        agent: &Agent,
        neighbor_beliefs: &[(usize, f64)],
        neighbor_forcefulness: &[f64],
        params: &ParameterSet,
        rng: &mut SmallRng,
    ) -> AgentUpdate;
}

/// Default update rule.
///
/// Trust drifts toward pairwise belief agreement at a speed set by the
/// agent's own stability; belief takes a step toward the trust-and-
/// forcefulness weighted neighborhood mean; share propensity follows the
/// refreshed belief; the round's shares are a Poisson draw off the
/// refreshed propensity scaled by the share rate.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrustWeightedUpdater;

impl AgentUpdater for TrustWeightedUpdater {
    fn update(
        &self,
        agent: &Agent,
        neighbor_beliefs: &[(usize, f64)],
        neighbor_forcefulness: &[f64],
        params: &ParameterSet,
        rng: &mut SmallRng,
    ) -> AgentUpdate {
        let stability = agent.trust_stability.exp();
        let own_belief = agent.misinfo_belief.exp();

        // Trust moves toward agreement with each neighbor's current belief.
        let mut neighbor_trust = BTreeMap::new();
        for (id, belief) in neighbor_beliefs {
            let old = agent.neighbors.get(id).copied().unwrap_or(0.0);
            let agreement = 1.0 - (own_belief - belief.exp()).abs();
            neighbor_trust.insert(*id, stability * old + (1.0 - stability) * agreement);
        }

        // Belief steps toward the weighted neighborhood mean, in
        // probability space. Weight = refreshed trust * forcefulness.
        let rate = params.belief_rate() / 100.0;
        let mut weight_sum = 0.0;
        let mut weighted = 0.0;
        for ((id, belief), force) in neighbor_beliefs.iter().zip(neighbor_forcefulness) {
            let w = neighbor_trust.get(id).copied().unwrap_or(0.0) * force.exp();
            weight_sum += w;
            weighted += w * belief.exp();
        }
        let mut pulled = own_belief;
        if weight_sum > 0.0 {
            pulled += rate * (weighted / weight_sum - own_belief);
        }
        let misinfo_belief = clamp_probability(pulled).ln();

        // Propensity drifts toward the refreshed belief at the same rate.
        let own_propensity = agent.share_propensity.exp();
        let share_propensity =
            clamp_probability(own_propensity + rate * (pulled - own_propensity)).ln();

        // Share count for this round; a zero rate emits nothing.
        let lambda = share_propensity.exp() * params.share_rate() / 100.0;
        let shares = match Poisson::new(lambda) {
            Ok(dist) => dist.sample(rng) as u32,
            Err(_) => 0,
        };

        AgentUpdate {
            neighbor_trust,
            misinfo_belief,
            share_propensity,
            shares,
        }
    }
}

/// Keeps a probability inside the open unit interval so its log stays
/// finite and strictly negative.
fn clamp_probability(p: f64) -> f64 {
    p.clamp(1e-12, 1.0 - 1e-12)
}
