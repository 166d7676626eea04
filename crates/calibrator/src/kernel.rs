//! Importance Kernel
//!
//! Rescales a raw distance into the empirical fraction of the pool at or
//! below it. The flat-prior mass appears in both numerator and normalizer
//! the way the energy formulation writes it; the term cancels, but keeping
//! it makes the correspondence to the prior densities explicit.

use sim_particles::Pool;

/// Maps distances to importance weights against a fixed reference pool.
#[derive(Debug, Clone)]
pub struct ImportanceKernel {
    prior_mass: f64,
}

impl Default for ImportanceKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportanceKernel {
    /// Builds the kernel with the flat-prior mass of one draw: ten shape
    /// parameters uniform on a width-10 interval and two rate parameters
    /// uniform on a width-100 interval.
    pub fn new() -> Self {
        let log_mass = 0.1f64.ln() * 10.0 + 0.01f64.ln() * 2.0;
        Self {
            prior_mass: log_mass.exp(),
        }
    }

    /// Empirical fraction of pool distances at or below `x`, in [0, 1].
    ///
    /// The pool is read, never changed, and an empty pool weighs
    /// everything at 0.
    pub fn weight(&self, pool: &Pool, x: f64) -> f64 {
        if pool.is_empty() {
            return 0.0;
        }
        let passing = pool.distances().filter(|&d| d <= x).count();
        let mass = passing as f64 * self.prior_mass;
        mass / (pool.len() as f64 * self.prior_mass)
    }
}
