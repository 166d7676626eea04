//! Agent State
//!
//! The per-agent state container: four latent traits drawn in log-Beta
//! space plus the trust map over current neighbors.

use std::collections::BTreeMap;

use rand::rngs::SmallRng;
use rand_distr::{Beta, Distribution};
use sim_particles::{ParameterSet, SeedTrait};

use crate::SimError;

/// One simulated agent.
///
/// Traits are logarithms of Beta draws, so they live on (-inf, 0) and
/// exponentiate back to probabilities. Neighbor trust is keyed by agent
/// id in a BTreeMap: its iteration order feeds floating-point sums, so a
/// stable order is what keeps same-seed runs identical.
#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    pub id: usize,
    pub forcefulness: f64,
    pub share_propensity: f64,
    pub misinfo_belief: f64,
    pub trust_stability: f64,
    pub neighbors: BTreeMap<usize, f64>,
}

impl Agent {
    /// Samples a fresh agent with traits drawn from the parameter set's
    /// Beta shape pairs. Neighbors are attached later by the network
    /// builder.
    pub fn sample(id: usize, params: &ParameterSet, rng: &mut SmallRng) -> Result<Self, SimError> {
        let mut draw = |seed: SeedTrait| -> Result<f64, SimError> {
            let (b1, b2) = params.shapes(seed);
            Ok(Beta::new(b1, b2)?.sample(rng).ln())
        };

        Ok(Self {
            id,
            forcefulness: draw(SeedTrait::Forcefulness)?,
            share_propensity: draw(SeedTrait::SharePropensity)?,
            misinfo_belief: draw(SeedTrait::MisinfoBelief)?,
            trust_stability: draw(SeedTrait::TrustStability)?,
            neighbors: BTreeMap::new(),
        })
    }

    /// Number of current neighbors.
    pub fn degree(&self) -> usize {
        self.neighbors.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use sim_particles::PARAM_SET_DIMENSION;

    fn make_params() -> ParameterSet {
        ParameterSet::new(vec![2.0; PARAM_SET_DIMENSION]).unwrap()
    }

    #[test]
    fn test_sampled_traits_are_negative_logs() {
        let params = make_params();
        let mut rng = SmallRng::seed_from_u64(7);
        let agent = Agent::sample(3, &params, &mut rng).unwrap();

        assert_eq!(agent.id, 3);
        assert!(agent.neighbors.is_empty());
        for trait_value in [
            agent.forcefulness,
            agent.share_propensity,
            agent.misinfo_belief,
            agent.trust_stability,
        ] {
            assert!(trait_value.is_finite());
            assert!(trait_value < 0.0, "log of a Beta draw must be negative");
        }
    }

    #[test]
    fn test_invalid_shape_is_rejected() {
        let mut values = vec![2.0; PARAM_SET_DIMENSION];
        values[0] = 0.0;
        let params = ParameterSet::new(values).unwrap();
        let mut rng = SmallRng::seed_from_u64(7);
        let result = Agent::sample(0, &params, &mut rng);
        assert!(matches!(result, Err(SimError::Distribution(_))));
    }

    #[test]
    fn test_sampling_is_deterministic() {
        let params = make_params();
        let mut rng1 = SmallRng::seed_from_u64(11);
        let mut rng2 = SmallRng::seed_from_u64(11);
        let a = Agent::sample(0, &params, &mut rng1).unwrap();
        let b = Agent::sample(0, &params, &mut rng2).unwrap();
        assert_eq!(a, b);
    }
}
