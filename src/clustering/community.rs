//! Community detection using the Louvain method
//!
//! Multi-level modularity optimization over the relationship graph: a local
//! moving phase followed by aggregation of communities into super-nodes,
//! repeated until no node moves. Node visiting order comes from a seeded RNG
//! and candidate communities are scanned in ascending id order, so the same
//! graph and seed always produce the same partition.

use std::collections::BTreeMap;

use petgraph::visit::EdgeRef;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::clustering::graph::RelationshipGraph;
use crate::core::config::GraphConfig;
use crate::core::errors::{GlossaError, Result};
use crate::core::partition::{ClusterId, Partition};
use crate::core::run_context::RunContext;

/// Gains below this are treated as ties
const GAIN_EPSILON: f64 = 1e-12;

/// Community detection result
#[derive(Debug, Clone)]
pub struct CommunityDetection {
    /// Term assignments, labels canonical by first appearance
    pub partition: Partition,

    /// Community information, ordered by label
    pub communities: Vec<CommunityInfo>,

    /// Final modularity score
    pub modularity: f64,

    /// Number of aggregation passes performed
    pub passes: usize,
}

/// Information about a detected community
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunityInfo {
    /// Community label
    pub id: ClusterId,

    /// Member terms in glossary order
    pub members: Vec<String>,

    /// Total weight of internal edges
    pub internal_weight: f64,

    /// Total weight of edges crossing the community boundary
    pub cut_weight: f64,

    /// Sum of member degrees
    pub total_degree: f64,
}

/// Louvain algorithm implementation
#[derive(Debug, Clone)]
pub struct LouvainDetector {
    /// Resolution parameter (higher = more communities)
    resolution: f64,

    /// Maximum number of aggregation passes
    max_passes: usize,

    /// Minimum modularity improvement to continue
    min_improvement: f64,

    /// Seed for the node visiting order
    seed: u64,
}

impl Default for LouvainDetector {
    fn default() -> Self {
        Self::from_config(&GraphConfig::default())
    }
}

/// Weighted graph at one aggregation level.
///
/// Edges are stored in both directions; `self_loops` holds the weight of
/// edges collapsed inside a super-node, counted once.
#[derive(Debug, Clone)]
struct LevelGraph {
    adjacency: Vec<Vec<(usize, f64)>>,
    self_loops: Vec<f64>,
    degrees: Vec<f64>,
    total_weight: f64,
}

impl LevelGraph {
    fn from_relationship_graph(graph: &RelationshipGraph) -> Self {
        let petgraph = graph.graph();
        let n = petgraph.node_count();
        let mut adjacency = vec![Vec::new(); n];
        let mut self_loops = vec![0.0; n];

        for edge in petgraph.edge_references() {
            let (a, b) = (edge.source().index(), edge.target().index());
            let weight = *edge.weight();
            if a == b {
                self_loops[a] += weight;
            } else {
                adjacency[a].push((b, weight));
                adjacency[b].push((a, weight));
            }
        }

        Self::from_parts(adjacency, self_loops)
    }

    fn from_parts(adjacency: Vec<Vec<(usize, f64)>>, self_loops: Vec<f64>) -> Self {
        let degrees: Vec<f64> = adjacency
            .iter()
            .zip(&self_loops)
            .map(|(neighbors, self_loop)| {
                neighbors.iter().map(|(_, w)| w).sum::<f64>() + 2.0 * self_loop
            })
            .collect();
        let total_weight = degrees.iter().sum::<f64>() / 2.0;

        Self {
            adjacency,
            self_loops,
            degrees,
            total_weight,
        }
    }

    fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Modularity of an assignment of this level's nodes
    fn modularity(&self, community: &[usize], resolution: f64) -> f64 {
        if self.total_weight <= 0.0 {
            return 0.0;
        }

        let mut internal: BTreeMap<usize, f64> = BTreeMap::new();
        let mut totals: BTreeMap<usize, f64> = BTreeMap::new();

        for node in 0..self.node_count() {
            let c = community[node];
            *totals.entry(c).or_insert(0.0) += self.degrees[node];
            let entry = internal.entry(c).or_insert(0.0);
            *entry += self.self_loops[node];
            for &(neighbor, weight) in &self.adjacency[node] {
                if neighbor > node && community[neighbor] == c {
                    *entry += weight;
                }
            }
        }

        let m = self.total_weight;
        totals
            .iter()
            .map(|(c, total)| {
                let inside = internal.get(c).copied().unwrap_or(0.0);
                inside / m - resolution * (total / (2.0 * m)).powi(2)
            })
            .sum()
    }

    /// Collapse each community into a single node; communities must be
    /// numbered 0..count
    fn aggregate(&self, community: &[usize], count: usize) -> Self {
        let mut self_loops = vec![0.0; count];
        let mut links: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); count];

        for node in 0..self.node_count() {
            let c = community[node];
            self_loops[c] += self.self_loops[node];
            for &(neighbor, weight) in &self.adjacency[node] {
                if neighbor <= node {
                    continue;
                }
                let d = community[neighbor];
                if c == d {
                    self_loops[c] += weight;
                } else {
                    *links[c].entry(d).or_insert(0.0) += weight;
                    *links[d].entry(c).or_insert(0.0) += weight;
                }
            }
        }

        let adjacency = links.into_iter().map(|m| m.into_iter().collect()).collect();
        Self::from_parts(adjacency, self_loops)
    }
}

impl LouvainDetector {
    /// Create detector with custom parameters
    pub fn new(resolution: f64, max_passes: usize, min_improvement: f64, seed: u64) -> Result<Self> {
        if !resolution.is_finite() || resolution <= 0.0 {
            return Err(GlossaError::clustering_in(
                format!("resolution must be positive, got {resolution}"),
                "louvain",
            ));
        }
        if max_passes == 0 {
            return Err(GlossaError::clustering_in("max_passes must be positive", "louvain"));
        }
        Ok(Self {
            resolution,
            max_passes,
            min_improvement,
            seed,
        })
    }

    /// Detector settings from validated configuration
    pub fn from_config(config: &GraphConfig) -> Self {
        Self {
            resolution: config.resolution,
            max_passes: config.max_passes,
            min_improvement: config.min_improvement,
            seed: config.seed,
        }
    }

    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Detect communities and record parameters and metrics on the run
    pub fn partition(&self, graph: &RelationshipGraph, ctx: &mut RunContext) -> Result<CommunityDetection> {
        let detection = self.detect_communities(graph)?;

        ctx.log_param("graph.seed", self.seed);
        ctx.log_param("graph.resolution", self.resolution);
        ctx.log_metric("graph.communities", detection.communities.len() as f64);
        ctx.log_metric("graph.modularity", detection.modularity);
        ctx.log_metric("graph.passes", detection.passes as f64);

        Ok(detection)
    }

    /// Detect communities in the graph
    pub fn detect_communities(&self, graph: &RelationshipGraph) -> Result<CommunityDetection> {
        let ids: Vec<&str> = graph.term_ids().collect();
        if ids.is_empty() {
            return Ok(CommunityDetection {
                partition: Partition::new(),
                communities: Vec::new(),
                modularity: 0.0,
                passes: 0,
            });
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut level = LevelGraph::from_relationship_graph(graph);
        let base = level.clone();

        // Community of every original node
        let mut membership: Vec<usize> = (0..ids.len()).collect();
        let mut current_modularity = base.modularity(&membership, self.resolution);
        let mut passes = 0;

        tracing::info!(
            "Starting Louvain detection: {} nodes, {} edges, total weight: {:.2}",
            graph.node_count(),
            graph.edge_count(),
            level.total_weight
        );

        while passes < self.max_passes && level.total_weight > 0.0 {
            let (community, moved) = self.local_moving(&level, &mut rng);
            if !moved {
                break;
            }

            let (community, count) = renumber(&community);
            for label in membership.iter_mut() {
                *label = community[*label];
            }
            passes += 1;

            let new_modularity = base.modularity(&membership, self.resolution);
            tracing::debug!(
                "Louvain pass {}: {} communities, modularity = {:.6}",
                passes,
                count,
                new_modularity
            );

            let improvement = new_modularity - current_modularity;
            current_modularity = new_modularity;
            if improvement < self.min_improvement {
                break;
            }
            level = level.aggregate(&community, count);
        }

        let partition = Partition::from_labels(ids.iter().copied(), &membership)?.canonicalize();
        let communities = build_community_info(graph, &partition);

        tracing::info!(
            "Louvain completed: {} passes, {} communities, modularity = {:.6}",
            passes,
            communities.len(),
            current_modularity
        );

        Ok(CommunityDetection {
            partition,
            communities,
            modularity: current_modularity,
            passes,
        })
    }

    /// One local moving phase; returns the community of each level node and
    /// whether any node changed community
    fn local_moving(&self, level: &LevelGraph, rng: &mut StdRng) -> (Vec<usize>, bool) {
        let n = level.node_count();
        let m2 = 2.0 * level.total_weight;
        let mut community: Vec<usize> = (0..n).collect();
        let mut totals = level.degrees.clone();

        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(rng);

        let mut any_move = false;
        for _ in 0..self.max_passes {
            let mut moved = false;

            for &node in &order {
                if level.adjacency[node].is_empty() {
                    continue;
                }

                let current = community[node];
                let degree = level.degrees[node];

                let mut weights_to: BTreeMap<usize, f64> = BTreeMap::new();
                for &(neighbor, weight) in &level.adjacency[node] {
                    *weights_to.entry(community[neighbor]).or_insert(0.0) += weight;
                }

                totals[current] -= degree;

                let gain = |c: usize, weight: f64| weight - self.resolution * totals[c] * degree / m2;
                let mut best = current;
                let mut best_gain = gain(current, weights_to.get(&current).copied().unwrap_or(0.0));
                for (&candidate, &weight) in &weights_to {
                    let candidate_gain = gain(candidate, weight);
                    if candidate_gain > best_gain + GAIN_EPSILON {
                        best = candidate;
                        best_gain = candidate_gain;
                    }
                }

                totals[best] += degree;
                if best != current {
                    community[node] = best;
                    moved = true;
                    any_move = true;
                }
            }

            if !moved {
                break;
            }
        }

        (community, any_move)
    }
}

/// Modularity of a partition of the graph's terms.
///
/// Terms missing from the partition are treated as singletons.
pub fn modularity(graph: &RelationshipGraph, partition: &Partition, resolution: f64) -> f64 {
    let level = LevelGraph::from_relationship_graph(graph);
    let offset = partition.cluster_sizes().keys().max().map_or(0, |max| max + 1);
    let community: Vec<usize> = graph
        .term_ids()
        .enumerate()
        .map(|(index, id)| partition.label_of(id).unwrap_or(offset + index))
        .collect();
    level.modularity(&community, resolution)
}

/// Renumber labels 0..count in order of first appearance
fn renumber(community: &[usize]) -> (Vec<usize>, usize) {
    let mut mapping: BTreeMap<usize, usize> = BTreeMap::new();
    let renumbered = community
        .iter()
        .map(|label| {
            let next = mapping.len();
            *mapping.entry(*label).or_insert(next)
        })
        .collect();
    (renumbered, mapping.len())
}

/// Build detailed community information
fn build_community_info(graph: &RelationshipGraph, partition: &Partition) -> Vec<CommunityInfo> {
    partition
        .clusters()
        .into_iter()
        .map(|(id, members)| {
            let mut internal_weight = 0.0;
            let mut cut_weight = 0.0;
            let mut total_degree = 0.0;

            for member in &members {
                for (neighbor, weight) in graph.neighbors(member) {
                    total_degree += weight;
                    if partition.label_of(neighbor) == Some(id) {
                        if *member < neighbor {
                            internal_weight += weight;
                        }
                    } else {
                        cut_weight += weight;
                    }
                }
            }

            CommunityInfo {
                id,
                members: members.into_iter().map(str::to_string).collect(),
                internal_weight,
                cut_weight,
                total_degree,
            }
        })
        .collect()
}

impl CommunityDetection {
    /// Get community for a term
    pub fn get_community(&self, id: &str) -> Option<ClusterId> {
        self.partition.label_of(id)
    }

    /// Get community information by label
    pub fn get_community_info(&self, id: ClusterId) -> Option<&CommunityInfo> {
        self.communities.iter().find(|info| info.id == id)
    }

    /// Communities with more than one member
    pub fn non_trivial_communities(&self) -> impl Iterator<Item = &CommunityInfo> {
        self.communities.iter().filter(|info| info.members.len() > 1)
    }
}
