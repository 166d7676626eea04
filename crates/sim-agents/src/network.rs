//! Network Construction
//!
//! Topology builders over agent ids, plus closeness centrality. Every
//! builder attaches a symmetric initial-trust draw to both endpoints of
//! each edge it creates.

use std::collections::VecDeque;
use std::str::FromStr;

use petgraph::graph::{NodeIndex, UnGraph};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::Rng;
use rand_distr::{Beta, Distribution};
use serde::{Deserialize, Serialize};
use sim_particles::{ParameterSet, SeedTrait};

use crate::{Agent, SimError};

/// Edge probability for random networks.
pub const EDGE_PROBABILITY: f64 = 0.05;

/// Degree distribution exponent for configuration-model networks.
pub const POWERLAW_EXPONENT: f64 = 2.5;

/// Triangle-closing probability for power-law cluster networks.
pub const TRIANGLE_PROBABILITY: f64 = 0.05;

/// Edges attached per new node in power-law cluster networks.
pub const ATTACHMENT_EDGES: usize = 2;

/// Network topology selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Topology {
    /// Erdős–Rényi with fixed edge probability.
    #[serde(rename = "er")]
    Random,
    /// Configuration model over a power-law degree sequence.
    #[serde(rename = "config")]
    Configuration,
    /// Holme–Kim preferential attachment with triangle closing.
    #[serde(rename = "pwrlaw")]
    PowerlawCluster,
}

impl Topology {
    /// The selector string used on the command line and in config files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Topology::Random => "er",
            Topology::Configuration => "config",
            Topology::PowerlawCluster => "pwrlaw",
        }
    }
}

impl FromStr for Topology {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "er" => Ok(Topology::Random),
            "config" => Ok(Topology::Configuration),
            "pwrlaw" => Ok(Topology::PowerlawCluster),
            other => Err(SimError::UnknownTopology(other.to_string())),
        }
    }
}

/// Builds the selected topology over the given agents, wiring initial
/// trust into both endpoints of every edge.
pub fn build_network(
    topology: Topology,
    agents: &mut [Agent],
    params: &ParameterSet,
    rng: &mut SmallRng,
) -> Result<UnGraph<usize, ()>, SimError> {
    match topology {
        Topology::Random => build_random(agents, params, rng),
        Topology::Configuration => build_configuration(agents, params, rng),
        Topology::PowerlawCluster => build_powerlaw_cluster(agents, params, rng),
    }
}

fn initial_trust(params: &ParameterSet) -> Result<Beta<f64>, SimError> {
    let (b1, b2) = params.shapes(SeedTrait::InitialTrust);
    Ok(Beta::new(b1, b2)?)
}

/// Wires one edge: a single trust draw shared by both endpoints.
fn attach_edge(
    graph: &mut UnGraph<usize, ()>,
    nodes: &[NodeIndex],
    agents: &mut [Agent],
    i: usize,
    j: usize,
    trust: &Beta<f64>,
    rng: &mut SmallRng,
) {
    if i == j || agents[i].neighbors.contains_key(&j) {
        return;
    }
    graph.add_edge(nodes[i], nodes[j], ());
    let t = trust.sample(rng);
    agents[i].neighbors.insert(j, t);
    agents[j].neighbors.insert(i, t);
}

fn build_random(
    agents: &mut [Agent],
    params: &ParameterSet,
    rng: &mut SmallRng,
) -> Result<UnGraph<usize, ()>, SimError> {
    let n = agents.len();
    let mut graph = UnGraph::new_undirected();
    let nodes: Vec<NodeIndex> = (0..n).map(|i| graph.add_node(i)).collect();
    let trust = initial_trust(params)?;

    for i in 0..n {
        for j in (i + 1)..n {
            if rng.gen::<f64>() < EDGE_PROBABILITY {
                attach_edge(&mut graph, &nodes, agents, i, j, &trust, rng);
            }
        }
    }
    Ok(graph)
}

fn build_configuration(
    agents: &mut [Agent],
    params: &ParameterSet,
    rng: &mut SmallRng,
) -> Result<UnGraph<usize, ()>, SimError> {
    let n = agents.len();
    let mut graph = UnGraph::new_undirected();
    let nodes: Vec<NodeIndex> = (0..n).map(|i| graph.add_node(i)).collect();
    let trust = initial_trust(params)?;

    // Power-law degrees via inverse-CDF draws, clamped to valid range.
    let max_degree = n.saturating_sub(1).max(1);
    let mut degrees: Vec<usize> = (0..n)
        .map(|_| {
            let u: f64 = rng.gen_range(f64::EPSILON..1.0);
            let d = u.powf(-1.0 / (POWERLAW_EXPONENT - 1.0));
            (d as usize).clamp(1, max_degree)
        })
        .collect();

    // Stub matching needs an even stub count.
    if degrees.iter().sum::<usize>() % 2 == 1 {
        degrees[rng.gen_range(0..n)] += 1;
    }

    let mut stubs: Vec<usize> = Vec::new();
    for (id, degree) in degrees.iter().enumerate() {
        stubs.extend(std::iter::repeat(id).take(*degree));
    }
    stubs.shuffle(rng);

    // Pair consecutive stubs, collapsing to a simple graph: self-loops and
    // repeat pairings are dropped rather than rewired.
    for pair in stubs.chunks_exact(2) {
        attach_edge(&mut graph, &nodes, agents, pair[0], pair[1], &trust, rng);
    }
    Ok(graph)
}

fn build_powerlaw_cluster(
    agents: &mut [Agent],
    params: &ParameterSet,
    rng: &mut SmallRng,
) -> Result<UnGraph<usize, ()>, SimError> {
    let n = agents.len();
    let m = ATTACHMENT_EDGES;
    if n < m + 1 {
        return Err(SimError::NetworkSize {
            topology: Topology::PowerlawCluster.as_str(),
            got: n,
            min: m + 1,
        });
    }
    let mut graph = UnGraph::new_undirected();
    let nodes: Vec<NodeIndex> = (0..n).map(|i| graph.add_node(i)).collect();
    let trust = initial_trust(params)?;

    // Attachment targets appear with multiplicity proportional to degree.
    let mut repeated: Vec<usize> = (0..m).collect();
    for source in m..n {
        let candidates = random_subset(&repeated, m, rng);

        // First link is always a preferential attachment.
        let mut target = candidates[0];
        let mut next_candidate = 1;
        attach_edge(&mut graph, &nodes, agents, source, target, &trust, rng);
        repeated.push(target);

        let mut added = 1;
        while added < m {
            if rng.gen::<f64>() < TRIANGLE_PROBABILITY {
                // Close a triangle around the last preferential target.
                let neighborhood: Vec<usize> = agents[target]
                    .neighbors
                    .keys()
                    .copied()
                    .filter(|&nbr| nbr != source && !agents[source].neighbors.contains_key(&nbr))
                    .collect();
                if let Some(&nbr) = neighborhood.choose(rng) {
                    attach_edge(&mut graph, &nodes, agents, source, nbr, &trust, rng);
                    repeated.push(nbr);
                    added += 1;
                    continue;
                }
            }
            target = candidates[next_candidate];
            next_candidate += 1;
            attach_edge(&mut graph, &nodes, agents, source, target, &trust, rng);
            repeated.push(target);
            added += 1;
        }
        repeated.extend(std::iter::repeat(source).take(m));
    }
    Ok(graph)
}

/// Samples `count` distinct ids from the multiplicity list. The list always
/// holds at least `count` distinct values: it starts with the seed nodes
/// and only grows.
fn random_subset(repeated: &[usize], count: usize, rng: &mut SmallRng) -> Vec<usize> {
    let mut picked: Vec<usize> = Vec::with_capacity(count);
    while picked.len() < count {
        let candidate = repeated[rng.gen_range(0..repeated.len())];
        if !picked.contains(&candidate) {
            picked.push(candidate);
        }
    }
    picked
}

/// Closeness centrality for every node, in agent-id order.
///
/// Size-normalized form: ((r - 1) / (n - 1)) * ((r - 1) / sum_d), where r
/// counts the nodes reachable from u (u itself included) and sum_d is the
/// total shortest-path distance to them. Isolated nodes score 0, and all
/// values fall in [0, 1].
pub fn closeness_centrality(graph: &UnGraph<usize, ()>) -> Vec<f64> {
    let n = graph.node_count();
    let mut result = vec![0.0; n];
    if n <= 1 {
        return result;
    }

    for node in graph.node_indices() {
        let mut dist = vec![usize::MAX; n];
        let mut queue = VecDeque::new();
        dist[node.index()] = 0;
        queue.push_back(node);

        let mut reachable = 1usize;
        let mut total = 0usize;
        while let Some(u) = queue.pop_front() {
            for v in graph.neighbors(u) {
                if dist[v.index()] == usize::MAX {
                    dist[v.index()] = dist[u.index()] + 1;
                    reachable += 1;
                    total += dist[v.index()];
                    queue.push_back(v);
                }
            }
        }

        if total > 0 {
            let r = (reachable - 1) as f64;
            result[node.index()] = r / (n - 1) as f64 * (r / total as f64);
        }
    }
    result
}
