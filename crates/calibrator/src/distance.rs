//! Distance Function
//!
//! Scores a completed simulation run against the three real-world sharing
//! targets: how sharing scales with closeness centrality, how concentrated
//! it is in the most active agents, and how much of it there is per head.

use sim_agents::SimulationRun;

/// Target slope of total shares regressed on closeness centrality.
pub const TARGET_CENTRALITY_SLOPE: f64 = 0.5;

/// Target share fraction attributable to the top 1% of agents.
pub const TARGET_TOP_SHARE_FRACTION: f64 = 0.8;

/// Target shares per capita over the whole run.
pub const TARGET_SHARES_PER_CAPITA: f64 = 1.0;

/// The three summary statistics compared against the targets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryStats {
    pub centrality_slope: f64,
    pub top_share_fraction: f64,
    pub shares_per_capita: f64,
}

/// Computes the summary statistics of a completed run.
pub fn summarize(run: &SimulationRun) -> SummaryStats {
    let totals = run.shares.totals();
    let n = totals.len();
    let total_shares: f64 = totals.iter().sum();

    let centrality_slope = ols_slope(&run.centrality, &totals);

    // Top 1% of agents by individual share count, with a Laplace-smoothed
    // denominator. A slice of zero agents contributes nothing.
    let k = (0.01 * n as f64) as usize;
    let top_sum: f64 = if k == 0 {
        0.0
    } else {
        let mut sorted = totals.clone();
        sorted.sort_by(f64::total_cmp);
        sorted[n - k..].iter().sum()
    };
    let top_share_fraction = top_sum / (1.0 + total_shares);

    let shares_per_capita = total_shares / n as f64;

    SummaryStats {
        centrality_slope,
        top_share_fraction,
        shares_per_capita,
    }
}

/// Distance between a run and the calibration targets: each statistic's
/// absolute discrepancy raised to `alpha`, summed, then divided by alpha.
pub fn distance(run: &SimulationRun, alpha: f64) -> f64 {
    let stats = summarize(run);
    let mut loss = 0.0;
    loss += (stats.centrality_slope - TARGET_CENTRALITY_SLOPE)
        .abs()
        .powf(alpha);
    loss += (stats.top_share_fraction - TARGET_TOP_SHARE_FRACTION)
        .abs()
        .powf(alpha);
    loss += (stats.shares_per_capita - TARGET_SHARES_PER_CAPITA)
        .abs()
        .powf(alpha);
    loss / alpha
}

/// Least-squares slope of y on x. A constant predictor has no unique
/// solution; the minimum-norm fit gives 0.
fn ols_slope(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len() as f64;
    if n == 0.0 {
        return 0.0;
    }
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;
    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        sxx += (xi - mean_x) * (xi - mean_x);
        sxy += (xi - mean_x) * (yi - mean_y);
    }
    if sxx == 0.0 {
        0.0
    } else {
        sxy / sxx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_agents::{SharesTable, SimulationTrace};

    /// A run with the given centrality vector and one share row per agent.
    fn make_run(centrality: Vec<f64>, rows: Vec<Vec<u32>>) -> SimulationRun {
        SimulationRun {
            agents: Vec::new(),
            shares: SharesTable::from_rows(rows),
            centrality,
            trace: SimulationTrace::default(),
        }
    }

    #[test]
    fn test_slope_recovers_constructed_line() {
        let centrality = vec![0.0, 0.2, 0.4, 0.8];
        let rows = vec![vec![0], vec![1], vec![2], vec![4]];
        let run = make_run(centrality, rows);
        let stats = summarize(&run);
        // x = [0, .2, .4, .8], y = [0, 1, 2, 4] -> slope 5.0
        assert!((stats.centrality_slope - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_centrality_gives_zero_slope() {
        let run = make_run(vec![0.3; 5], vec![vec![1], vec![2], vec![3], vec![4], vec![5]]);
        let stats = summarize(&run);
        assert_eq!(stats.centrality_slope, 0.0);
    }

    #[test]
    fn test_top_slice_empty_below_one_hundred_agents() {
        // 10 agents: int(0.01 * 10) = 0, so the numerator is 0 even though
        // shares exist.
        let rows: Vec<Vec<u32>> = (0..10).map(|i| vec![i as u32]).collect();
        let run = make_run(vec![0.1; 10], rows);
        let stats = summarize(&run);
        assert_eq!(stats.top_share_fraction, 0.0);
    }

    #[test]
    fn test_top_slice_takes_largest_sharers() {
        // 100 agents: the top slice is exactly the single biggest sharer.
        let mut rows: Vec<Vec<u32>> = vec![vec![1]; 100];
        rows[37] = vec![101];
        let run = make_run(vec![0.1; 100], rows);
        let stats = summarize(&run);
        // top sum = 101, denominator = 1 + (99 + 101) = 201
        assert!((stats.top_share_fraction - 101.0 / 201.0).abs() < 1e-12);
    }

    #[test]
    fn test_per_capita() {
        let rows = vec![vec![2, 1], vec![0, 3], vec![4, 0], vec![1, 1]];
        let run = make_run(vec![0.1, 0.2, 0.3, 0.4], rows);
        let stats = summarize(&run);
        assert!((stats.shares_per_capita - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_distance_is_finite_and_nonnegative() {
        let rows: Vec<Vec<u32>> = (0..10).map(|i| vec![i as u32, 2 * i as u32]).collect();
        let run = make_run((0..10).map(|i| i as f64 / 10.0).collect(), rows);
        for alpha in [1.0, 2.0, 2.6, 4.0] {
            let d = distance(&run, alpha);
            assert!(d.is_finite());
            assert!(d >= 0.0);
        }
    }

    #[test]
    fn test_alpha_amplifies_large_discrepancies() {
        // Per-capita discrepancy far above 1 dominates; doubling alpha
        // must grow the distance.
        let rows: Vec<Vec<u32>> = vec![vec![250]; 10];
        let run = make_run(vec![0.5; 10], rows);
        let base = distance(&run, 2.6);
        let doubled = distance(&run, 5.2);
        assert!(doubled > base);
    }

    #[test]
    fn test_only_unmet_targets_contribute() {
        let rows = vec![vec![1]; 10];
        let run = make_run(vec![0.2; 10], rows);
        let stats = summarize(&run);
        assert_eq!(stats.centrality_slope, 0.0);
        assert_eq!(stats.top_share_fraction, 0.0);
        assert!((stats.shares_per_capita - 1.0).abs() < 1e-12);

        // slope term |0 - 0.5|, top term |0 - 0.8|, per-capita term 0
        let alpha = 2.0;
        let expected = (0.5f64.powf(alpha) + 0.8f64.powf(alpha)) / alpha;
        assert!((distance(&run, alpha) - expected).abs() < 1e-12);
    }
}
