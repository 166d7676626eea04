//! End-to-end calibration checks against stub update rules with known
//! sharing behavior.

use std::path::Path;

use rand::rngs::SmallRng;
use tempfile::tempdir;

use calibrator::{
    distance, read_snapshot, summarize, CalibConfig, CalibrationReport, Calibrator,
};
use sim_agents::{Agent, AgentUpdate, AgentUpdater, DiffusionSimulator, Topology};
use sim_particles::{ParameterSet, WeightedParticle, SHAPE_PARAM_COUNT};

/// Shares exactly once per round and never moves a belief.
#[derive(Debug, Clone, Copy, Default)]
struct SteadySharerUpdater;

impl AgentUpdater for SteadySharerUpdater {
    fn update(
        &self,
        agent: &Agent,
        _neighbor_beliefs: &[(usize, f64)],
        _neighbor_forcefulness: &[f64],
        _params: &ParameterSet,
        _rng: &mut SmallRng,
    ) -> AgentUpdate {
        AgentUpdate {
            neighbor_trust: agent.neighbors.clone(),
            misinfo_belief: agent.misinfo_belief,
            share_propensity: agent.share_propensity,
            shares: 1,
        }
    }
}

/// Never shares at all, so every parameter draw scores the same modest
/// distance and the rejection stage fills quickly.
#[derive(Debug, Clone, Copy, Default)]
struct SilentUpdater;

impl AgentUpdater for SilentUpdater {
    fn update(
        &self,
        agent: &Agent,
        _neighbor_beliefs: &[(usize, f64)],
        _neighbor_forcefulness: &[f64],
        _params: &ParameterSet,
        _rng: &mut SmallRng,
    ) -> AgentUpdate {
        AgentUpdate {
            neighbor_trust: agent.neighbors.clone(),
            misinfo_belief: agent.misinfo_belief,
            share_propensity: agent.share_propensity,
            shares: 0,
        }
    }
}

fn mid_box_params() -> ParameterSet {
    let mut values = vec![2.0; SHAPE_PARAM_COUNT];
    values.extend([5.0, 5.0]);
    ParameterSet::new(values).unwrap()
}

fn make_config(dir: &Path) -> CalibConfig {
    let mut config = CalibConfig::default();
    config.simulation.n_agents = 10;
    config.simulation.seed = Some(7);
    config.rejection.ensemble_size = 6;
    config.refinement.max_iterations = Some(25);
    config.output.snapshot_dir = dir.to_path_buf();
    config.output.run_title = "endtoend".into();
    config
}

fn run_calibration(dir: &Path) -> (CalibrationReport, Vec<WeightedParticle>) {
    let simulator = DiffusionSimulator::new(Topology::Random, SilentUpdater);
    let mut calibrator = Calibrator::new(make_config(dir), simulator).unwrap();
    let report = calibrator.run().unwrap();
    (report, calibrator.ensemble().members().to_vec())
}

#[test]
fn test_steady_sharing_scores_exactly_and_deterministically() {
    let simulator = DiffusionSimulator::new(Topology::Random, SteadySharerUpdater);
    let params = mid_box_params();

    let run = simulator.run(10, &params, 4242).unwrap();
    assert_eq!(run.centrality.len(), 10);
    assert!(run.centrality.iter().all(|c| (0.0..=1.0).contains(c)));

    // One share per agent per round over 250 rounds.
    let stats = summarize(&run);
    assert_eq!(stats.shares_per_capita, 250.0);

    let first = distance(&run, 2.6);
    assert!(first.is_finite());
    assert!(first >= 0.0);

    let replay = simulator.run(10, &params, 4242).unwrap();
    assert_eq!(distance(&replay, 2.6), first);
}

#[test]
fn test_calibration_is_deterministic_end_to_end() {
    let dir_a = tempdir().unwrap();
    let dir_b = tempdir().unwrap();

    let (report_a, members_a) = run_calibration(dir_a.path());
    let (report_b, members_b) = run_calibration(dir_b.path());

    assert_eq!(report_a, report_b);
    assert_eq!(members_a, members_b);
    assert_eq!(report_a.ensemble_size, 6);
    assert_eq!(report_a.iterations, 25);
    assert!(report_a.pool_size >= 6);
}

#[test]
fn test_checkpoints_round_trip_the_ensemble() {
    let dir = tempdir().unwrap();
    let (_, members) = run_calibration(dir.path());

    // The warmup cadence checkpoints iteration 25, the final step here.
    let snapshot = read_snapshot(&dir.path().join("ensemble_endtoend_25.json")).unwrap();
    assert_eq!(snapshot.title, "endtoend");
    assert_eq!(snapshot.iteration, 25);
    assert_eq!(snapshot.members, members);
}
