//! Particles, the Pool, and the Ensemble
//!
//! A particle couples a parameter set with the raw distance its simulation
//! scored. The pool is the append-only record of every rejection-stage
//! evaluation; the ensemble is the fixed-size population that refinement
//! mutates one slot at a time.

use serde::{Deserialize, Serialize};

use crate::ParameterSet;

/// A scored draw: parameters plus the raw distance of their simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub params: ParameterSet,
    pub distance: f64,
}

/// An ensemble member: parameters plus an importance weight in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedParticle {
    pub params: ParameterSet,
    pub weight: f64,
}

/// Append-only record of every scored rejection-stage draw.
///
/// The importance kernel weighs candidates against this full record, so
/// entries are never removed or reordered once pushed.
#[derive(Debug, Clone, Default)]
pub struct Pool {
    particles: Vec<Particle>,
}

impl Pool {
    pub fn new() -> Self {
        Self {
            particles: Vec::new(),
        }
    }

    /// Appends a scored draw.
    pub fn push(&mut self, particle: Particle) {
        self.particles.push(particle);
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Raw distances in insertion order.
    pub fn distances(&self) -> impl Iterator<Item = f64> + '_ {
        self.particles.iter().map(|p| p.distance)
    }
}

/// Fixed-size population refined one slot at a time.
///
/// Constructed once from the accepted rejection-stage draws; the only
/// mutation afterwards is single-slot replacement, so the member count
/// cannot drift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ensemble {
    members: Vec<WeightedParticle>,
}

impl Ensemble {
    pub fn new(members: Vec<WeightedParticle>) -> Self {
        Self { members }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn member(&self, index: usize) -> &WeightedParticle {
        &self.members[index]
    }

    /// Replaces the member at `index` with a refined particle.
    pub fn replace(&mut self, index: usize, member: WeightedParticle) {
        self.members[index] = member;
    }

    /// Mean importance weight across members.
    pub fn mean_weight(&self) -> f64 {
        if self.members.is_empty() {
            return 0.0;
        }
        self.members.iter().map(|m| m.weight).sum::<f64>() / self.members.len() as f64
    }

    pub fn members(&self) -> &[WeightedParticle] {
        &self.members
    }
}
