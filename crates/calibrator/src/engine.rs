//! Two-Stage Calibration Engine
//!
//! Stage one draws parameter sets from the flat prior and keeps each with
//! probability exp(-distance / epsilon_init) until the ensemble is full;
//! every scored draw lands in the pool, accepted or not. Stage two is an
//! adaptive random-walk Metropolis refinement: one member is perturbed per
//! iteration, scored against the frozen pool, and swapped in when the
//! weight comparison and the support veto allow. The proposal covariance
//! and the temperature are re-derived from buffered draws at a fixed
//! cadence, and the loop stops once the swap rate collapses.

use nalgebra::{DMatrix, DVector};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use sim_agents::{AgentUpdater, DiffusionSimulator};
use sim_particles::{
    Ensemble, EnsembleSnapshot, ParameterSet, Particle, Pool, WeightedParticle,
    PARAM_SET_DIMENSION, SHAPE_PARAM_COUNT,
};

use crate::config::{CalibConfig, ConfigError};
use crate::distance::distance;
use crate::kernel::ImportanceKernel;
use crate::output::write_snapshot;
use crate::sampler::{GaussianPerturber, PriorSampler, Proposal};
use crate::CalibError;

/// Checkpoints are written every `SNAPSHOT_INTERVAL` iterations, and every
/// `WARMUP_SNAPSHOT_INTERVAL` while the iteration is below `WARMUP_END`.
const SNAPSHOT_INTERVAL: u64 = 100;
const WARMUP_SNAPSHOT_INTERVAL: u64 = 5;
const WARMUP_END: u64 = 75;

/// Refinement stops once the swap rate over all tries falls below
/// `TERMINATION_RATIO`; the check is armed after `TERMINATION_MIN_TRIES`.
const TERMINATION_RATIO: f64 = 1.0e-3;
const TERMINATION_MIN_TRIES: u64 = 20;

/// Where a calibrator currently is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationStage {
    Init,
    RejectionSampling,
    Refinement,
    Terminated,
}

/// Summary of a finished calibration run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalibrationReport {
    pub iterations: u64,
    pub tries: u64,
    pub swaps: u64,
    pub acceptance_ratio: f64,
    pub final_epsilon: f64,
    pub mean_weight: f64,
    pub pool_size: usize,
    pub ensemble_size: usize,
}

/// Two-stage approximate Bayesian calibrator over a diffusion simulator.
pub struct Calibrator<U> {
    config: CalibConfig,
    simulator: DiffusionSimulator<U>,
    sampler: PriorSampler,
    perturber: GaussianPerturber,
    kernel: ImportanceKernel,
    rng: SmallRng,
    stage: CalibrationStage,
    pool: Pool,
    ensemble: Ensemble,
    covariance: DMatrix<f64>,
    epsilon: f64,
    mean_weight: f64,
    proposal_buffer: Vec<DVector<f64>>,
    iteration: u64,
    tries: u64,
    swaps: u64,
    last_prior_draw: Option<ParameterSet>,
}

impl<U: AgentUpdater> Calibrator<U> {
    /// Builds a calibrator over a validated configuration.
    pub fn new(
        config: CalibConfig,
        simulator: DiffusionSimulator<U>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let rng = match config.simulation.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        let epsilon = config.rejection.epsilon_init;
        Ok(Self {
            config,
            simulator,
            sampler: PriorSampler::new(),
            perturber: GaussianPerturber::new(),
            kernel: ImportanceKernel::new(),
            rng,
            stage: CalibrationStage::Init,
            pool: Pool::new(),
            ensemble: Ensemble::new(Vec::new()),
            covariance: initial_covariance(),
            epsilon,
            mean_weight: 0.0,
            proposal_buffer: Vec::new(),
            iteration: 1,
            tries: 0,
            swaps: 0,
            last_prior_draw: None,
        })
    }

    /// Runs rejection sampling and then refinement to completion.
    pub fn run(&mut self) -> Result<CalibrationReport, CalibError> {
        self.stage = CalibrationStage::RejectionSampling;
        self.run_rejection_stage()?;
        self.stage = CalibrationStage::Refinement;
        self.run_refinement_stage()?;
        self.stage = CalibrationStage::Terminated;
        Ok(self.report())
    }

    pub fn stage(&self) -> CalibrationStage {
        self.stage
    }

    pub fn ensemble(&self) -> &Ensemble {
        &self.ensemble
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    /// Fraction of refinement tries that swapped a member in.
    pub fn acceptance_ratio(&self) -> f64 {
        if self.tries == 0 {
            return 0.0;
        }
        self.swaps as f64 / self.tries as f64
    }

    pub fn report(&self) -> CalibrationReport {
        CalibrationReport {
            iterations: self.iteration.saturating_sub(1),
            tries: self.tries,
            swaps: self.swaps,
            acceptance_ratio: self.acceptance_ratio(),
            final_epsilon: self.epsilon,
            mean_weight: self.mean_weight,
            pool_size: self.pool.len(),
            ensemble_size: self.ensemble.len(),
        }
    }

    /// Draws from the prior until the ensemble holds its target count,
    /// then remaps the accepted members to pool-fraction weights.
    fn run_rejection_stage(&mut self) -> Result<(), CalibError> {
        let target = self.config.rejection.ensemble_size;
        let epsilon_init = self.config.rejection.epsilon_init;
        let mut accepted: Vec<Particle> = Vec::with_capacity(target);

        tracing::info!("rejection sampling until {} acceptances", target);
        while accepted.len() < target {
            let params = self.sampler.draw(&mut self.rng)?;
            let score = self.evaluate(&params)?;
            let acceptance = (-score / epsilon_init).exp();
            if self.rng.gen::<f64>() < acceptance {
                accepted.push(Particle {
                    params: params.clone(),
                    distance: score,
                });
                if accepted.len() % 5 == 0 {
                    tracing::info!("accepted {} of {}", accepted.len(), target);
                }
            }
            self.pool.push(Particle {
                params: params.clone(),
                distance: score,
            });
            self.last_prior_draw = Some(params);
        }

        let members: Vec<WeightedParticle> = accepted
            .into_iter()
            .map(|particle| WeightedParticle {
                weight: self.kernel.weight(&self.pool, particle.distance),
                params: particle.params,
            })
            .collect();
        self.ensemble = Ensemble::new(members);

        let weight_sum: f64 = self
            .pool
            .distances()
            .map(|d| self.kernel.weight(&self.pool, d))
            .sum();
        self.mean_weight = weight_sum / self.pool.len() as f64;
        tracing::info!(
            "rejection stage done: {} pooled draws, mean weight {:.4}",
            self.pool.len(),
            self.mean_weight
        );
        Ok(())
    }

    fn run_refinement_stage(&mut self) -> Result<(), CalibError> {
        tracing::info!(
            "refining {} members at epsilon {:.4}",
            self.ensemble.len(),
            self.epsilon
        );
        loop {
            self.refinement_step()?;
            if self.should_terminate() {
                tracing::info!(
                    "swap ratio {:.6} after {} tries, stopping",
                    self.acceptance_ratio(),
                    self.tries
                );
                break;
            }
            if let Some(cap) = self.config.refinement.max_iterations {
                if self.iteration > cap {
                    tracing::warn!("iteration cap {} reached before the swap ratio collapsed", cap);
                    break;
                }
            }
        }
        Ok(())
    }

    /// One Metropolis iteration: perturb a uniformly chosen member, score
    /// the candidate against the frozen pool, and swap it in when the
    /// weight comparison and the support veto allow.
    fn refinement_step(&mut self) -> Result<(), CalibError> {
        let slot = self.rng.gen_range(0..self.ensemble.len());
        let current = self.ensemble.member(slot).clone();
        let Proposal {
            params,
            raw,
            reject,
        } = self
            .perturber
            .propose(&current.params, &self.covariance, &mut self.rng)?;

        let candidate_weight = if self.config.refinement.evaluate_proposed_params {
            if reject {
                // A vetoed candidate can never be swapped in, so its
                // simulation is skipped outright.
                None
            } else {
                let score = self.evaluate(&params)?;
                Some(self.kernel.weight(&self.pool, score))
            }
        } else {
            // Stale scoring: the candidate is judged by a fresh simulation
            // of the last rejection-stage draw, not of its own parameters.
            let stale = self
                .last_prior_draw
                .clone()
                .unwrap_or_else(|| current.params.clone());
            let score = self.evaluate(&stale)?;
            Some(self.kernel.weight(&self.pool, score))
        };

        self.tries += 1;
        if let Some(weight) = candidate_weight {
            let acceptance = ((current.weight - weight) / self.epsilon).exp().min(1.0);
            if self.rng.gen::<f64>() < acceptance && !reject {
                self.ensemble
                    .replace(slot, WeightedParticle { params, weight });
                self.swaps += 1;
            }
        }
        self.proposal_buffer.push(raw);

        if self.iteration % self.config.refinement.covariance_refresh_interval == 0 {
            self.refresh_covariance();
        }
        if self.should_snapshot() {
            self.persist_snapshot()?;
        }
        self.iteration += 1;
        Ok(())
    }

    /// Re-derives the proposal covariance from the buffered raw draws and
    /// the temperature from the current mean ensemble weight.
    fn refresh_covariance(&mut self) {
        let beta = self.config.refinement.beta;
        let little_s = self.config.refinement.little_s;
        let u_const = self.config.refinement.u_const;
        let gamma_v_ratio = self.config.refinement.gamma_v_ratio;

        let cov = sample_covariance(&self.proposal_buffer);
        self.proposal_buffer.clear();

        let ridge = DMatrix::identity(PARAM_SET_DIMENSION, PARAM_SET_DIMENSION)
            * (little_s * cov.trace());
        self.covariance = &cov * beta + ridge;

        self.mean_weight = self.ensemble.mean_weight();
        self.epsilon = self.mean_weight.powf(4.0 / 3.0) * gamma_v_ratio.powf(1.0 / 3.0)
            + u_const * self.mean_weight * self.mean_weight;

        tracing::info!(
            "iteration {}: swap ratio {:.4}, epsilon {:.6}",
            self.iteration,
            self.acceptance_ratio(),
            self.epsilon
        );
    }

    fn should_terminate(&self) -> bool {
        self.tries > TERMINATION_MIN_TRIES && self.acceptance_ratio() < TERMINATION_RATIO
    }

    fn should_snapshot(&self) -> bool {
        self.iteration % SNAPSHOT_INTERVAL == 0
            || (self.iteration % WARMUP_SNAPSHOT_INTERVAL == 0 && self.iteration < WARMUP_END)
    }

    fn persist_snapshot(&self) -> Result<(), CalibError> {
        let snapshot = EnsembleSnapshot::of_ensemble(
            self.config.output.run_title.as_str(),
            self.iteration,
            &self.ensemble,
        );
        let path = write_snapshot(&snapshot, &self.config.output.snapshot_dir)?;
        tracing::debug!("checkpointed ensemble to {}", path.display());
        Ok(())
    }

    /// Scores one parameter set: a fresh simulation keyed on a sub-seed of
    /// the calibrator RNG, summarized into the scalar distance.
    fn evaluate(&mut self, params: &ParameterSet) -> Result<f64, CalibError> {
        let seed = self.rng.gen::<u64>();
        let run = self
            .simulator
            .run(self.config.simulation.n_agents, params, seed)?;
        Ok(distance(&run, self.config.distance.alpha))
    }
}

/// Starting proposal covariance: weak global coupling, halved unit
/// variances on the diagonal, and a stronger tie inside each shape pair.
fn initial_covariance() -> DMatrix<f64> {
    let mut k = DMatrix::from_element(PARAM_SET_DIMENSION, PARAM_SET_DIMENSION, 0.05);
    for i in 0..PARAM_SET_DIMENSION {
        k[(i, i)] = 0.5;
        if i % 2 == 0 && i < SHAPE_PARAM_COUNT {
            k[(i, i + 1)] = 0.25;
            k[(i + 1, i)] = 0.25;
        }
    }
    k
}

/// Sample covariance of the buffered draws with the n - 1 denominator;
/// fewer than two draws yields the identity.
fn sample_covariance(draws: &[DVector<f64>]) -> DMatrix<f64> {
    let n = draws.len();
    if n < 2 {
        return DMatrix::identity(PARAM_SET_DIMENSION, PARAM_SET_DIMENSION);
    }
    let mut mean = DVector::zeros(PARAM_SET_DIMENSION);
    for draw in draws {
        mean += draw;
    }
    mean /= n as f64;

    let mut cov = DMatrix::zeros(PARAM_SET_DIMENSION, PARAM_SET_DIMENSION);
    for draw in draws {
        let centered = draw - &mean;
        cov += &centered * centered.transpose();
    }
    cov / (n - 1) as f64
}
