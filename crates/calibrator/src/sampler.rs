//! Prior Sampling and Proposal Perturbation
//!
//! The prior is a flat box: shape parameters uniform on [0.01, 10), rates
//! uniform on [0, 100). Refinement perturbs a current parameter set with a
//! multivariate Gaussian step drawn through the Cholesky factor of the
//! proposal covariance; steps that leave the prior box are flagged rather
//! than resampled.

use nalgebra::{Cholesky, DMatrix, DVector};
use rand::rngs::SmallRng;
use rand::Rng;
use rand_distr::StandardNormal;
use sim_particles::{ParamError, ParameterSet, PARAM_SET_DIMENSION, SHAPE_PARAM_COUNT};

const SHAPE_FLOOR: f64 = 0.01;
const SHAPE_CEILING: f64 = 10.0;
const RATE_CEILING: f64 = 100.0;

/// True when `values` is a full parameter vector inside the prior box.
///
/// Boundary values count as inside, matching the perturbation veto rather
/// than the half-open sampling ranges.
pub fn in_prior_support(values: &[f64]) -> bool {
    if values.len() != PARAM_SET_DIMENSION {
        return false;
    }
    let (shapes, rates) = values.split_at(SHAPE_PARAM_COUNT);
    shapes
        .iter()
        .all(|&v| (SHAPE_FLOOR..=SHAPE_CEILING).contains(&v))
        && rates.iter().all(|&v| (0.0..=RATE_CEILING).contains(&v))
}

/// Draws independent flat-prior parameter sets.
#[derive(Debug, Clone, Copy, Default)]
pub struct PriorSampler;

impl PriorSampler {
    pub fn new() -> Self {
        Self
    }

    /// One draw from the flat prior box.
    pub fn draw(&self, rng: &mut SmallRng) -> Result<ParameterSet, ParamError> {
        let mut values = Vec::with_capacity(PARAM_SET_DIMENSION);
        for _ in 0..SHAPE_PARAM_COUNT {
            values.push(rng.gen_range(SHAPE_FLOOR..SHAPE_CEILING));
        }
        for _ in SHAPE_PARAM_COUNT..PARAM_SET_DIMENSION {
            values.push(rng.gen_range(0.0..RATE_CEILING));
        }
        ParameterSet::new(values)
    }
}

/// A perturbed candidate: the parameter set, its raw vector form for the
/// covariance buffer, and whether the step left the prior box.
#[derive(Debug, Clone)]
pub struct Proposal {
    pub params: ParameterSet,
    pub raw: DVector<f64>,
    pub reject: bool,
}

/// Random-walk Gaussian perturbation through the Cholesky factor of the
/// proposal covariance.
#[derive(Debug, Clone, Copy, Default)]
pub struct GaussianPerturber;

impl GaussianPerturber {
    pub fn new() -> Self {
        Self
    }

    /// Perturbs `current` by `L z` where `L L^T = covariance` and `z` is
    /// standard normal. Falls back to an identity factor when the
    /// covariance is not positive definite.
    pub fn propose(
        &self,
        current: &ParameterSet,
        covariance: &DMatrix<f64>,
        rng: &mut SmallRng,
    ) -> Result<Proposal, ParamError> {
        let factor = match Cholesky::new(covariance.clone()) {
            Some(cholesky) => cholesky.l(),
            None => DMatrix::identity(PARAM_SET_DIMENSION, PARAM_SET_DIMENSION),
        };
        let step = DVector::from_fn(PARAM_SET_DIMENSION, |_, _| {
            rng.sample::<f64, _>(StandardNormal)
        });
        let raw = DVector::from_column_slice(current.values()) + factor * step;

        let values: Vec<f64> = raw.iter().copied().collect();
        let reject = !in_prior_support(&values);
        Ok(Proposal {
            params: ParameterSet::new(values)?,
            raw,
            reject,
        })
    }
}
