//! k-means clustering with k-means++ initialization
//!
//! Lloyd iterations under squared Euclidean distance. Every random choice is
//! drawn from a `StdRng` seeded per initialization, so a fixed seed gives a
//! fixed result.

use ndarray::{Array2, ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::core::config::SemanticConfig;
use crate::core::errors::{GlossaError, Result};

const ALGORITHM: &str = "kmeans";

/// Configuration for k-means clustering.
///
/// All parameters are validated at construction time.
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansConfig {
    /// Number of clusters; must not exceed the number of points
    pub k: usize,

    /// Maximum Lloyd iterations per initialization
    pub max_iterations: usize,

    /// Iteration stops once the summed squared centroid shift falls below this
    pub tolerance: f64,

    /// Number of initializations; the lowest inertia wins
    pub n_init: usize,

    /// Base seed; initialization `r` uses `seed + r`
    pub seed: u64,
}

impl KMeansConfig {
    /// Create a new configuration with validation
    pub fn new(k: usize, max_iterations: usize, tolerance: f64, n_init: usize, seed: u64) -> Result<Self> {
        if k == 0 {
            return Err(GlossaError::clustering_in("k must be > 0", ALGORITHM));
        }
        if max_iterations == 0 {
            return Err(GlossaError::clustering_in("max_iterations must be > 0", ALGORITHM));
        }
        if !tolerance.is_finite() || tolerance <= 0.0 {
            return Err(GlossaError::clustering_in(
                "tolerance must be a finite positive number",
                ALGORITHM,
            ));
        }
        if n_init == 0 {
            return Err(GlossaError::clustering_in("n_init must be > 0", ALGORITHM));
        }

        Ok(Self {
            k,
            max_iterations,
            tolerance,
            n_init,
            seed,
        })
    }

    /// Defaults for the given number of clusters
    pub fn with_k(k: usize) -> Result<Self> {
        let defaults = SemanticConfig::default();
        Self::new(k, defaults.max_iterations, defaults.tolerance, defaults.n_init, defaults.seed)
    }

    /// Settings from semantic configuration with an explicit cluster count
    pub fn from_semantic(config: &SemanticConfig, k: usize) -> Result<Self> {
        Self::new(k, config.max_iterations, config.tolerance, config.n_init, config.seed)
    }
}

/// Result of a k-means fit
#[derive(Debug, Clone)]
pub struct KMeansResult {
    /// Cluster of each input row
    pub labels: Vec<usize>,

    /// Final centroids, one row per cluster
    pub centroids: Array2<f64>,

    /// Within-cluster sum of squared distances
    pub inertia: f64,

    /// Iterations of the winning initialization
    pub iterations: usize,

    /// Whether the winning initialization converged before `max_iterations`
    pub converged: bool,
}

/// k-means clusterer
#[derive(Debug, Clone)]
pub struct KMeans {
    config: KMeansConfig,
}

impl KMeans {
    pub fn new(config: KMeansConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &KMeansConfig {
        &self.config
    }

    /// Cluster the rows of `data`
    pub fn fit(&self, data: ArrayView2<'_, f64>) -> Result<KMeansResult> {
        let n = data.nrows();
        if n == 0 {
            return Err(GlossaError::clustering_in("no points to cluster", ALGORITHM));
        }
        if self.config.k > n {
            return Err(GlossaError::clustering_in(
                format!("k ({}) must be <= number of points ({})", self.config.k, n),
                ALGORITHM,
            ));
        }

        let mut best: Option<KMeansResult> = None;
        for run in 0..self.config.n_init {
            let seed = self.config.seed.wrapping_add(run as u64);
            let result = self.fit_once(data, seed);
            tracing::debug!(
                "k-means init {} (seed {}): inertia {:.6}, {} iterations",
                run,
                seed,
                result.inertia,
                result.iterations
            );
            if best.as_ref().map_or(true, |b| result.inertia < b.inertia) {
                best = Some(result);
            }
        }

        best.ok_or_else(|| GlossaError::internal("k-means produced no result"))
    }

    fn fit_once(&self, data: ArrayView2<'_, f64>, seed: u64) -> KMeansResult {
        let k = self.config.k;
        let mut rng = StdRng::seed_from_u64(seed);
        let mut centroids = kmeans_plus_plus_init(data, k, &mut rng);
        let mut labels = assign(data, &centroids);
        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.config.max_iterations {
            iterations += 1;

            let new_centroids = compute_centroids(data, &labels, &centroids);
            let shift: f64 = centroids
                .rows()
                .into_iter()
                .zip(new_centroids.rows())
                .map(|(old, new)| squared_distance(old, new))
                .sum();
            centroids = new_centroids;

            let new_labels = assign(data, &centroids);
            let stable = new_labels == labels;
            labels = new_labels;

            if stable || shift < self.config.tolerance {
                converged = true;
                break;
            }
        }

        let inertia = compute_inertia(data, &labels, &centroids);
        KMeansResult {
            labels,
            centroids,
            inertia,
            iterations,
            converged,
        }
    }
}

#[inline]
fn squared_distance(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// k-means++ seeding: first centroid uniform, then proportional to D²
fn kmeans_plus_plus_init(data: ArrayView2<'_, f64>, k: usize, rng: &mut StdRng) -> Array2<f64> {
    let n = data.nrows();
    let mut centroids = Array2::zeros((k, data.ncols()));

    let first = rng.gen_range(0..n);
    centroids.row_mut(0).assign(&data.row(first));

    let mut min_distances = vec![f64::MAX; n];
    for c in 1..k {
        let last = centroids.row(c - 1);
        for (i, row) in data.rows().into_iter().enumerate() {
            let dist = squared_distance(row, last);
            if dist < min_distances[i] {
                min_distances[i] = dist;
            }
        }

        let total: f64 = min_distances.iter().sum();
        let chosen = if total <= 0.0 {
            // Every point coincides with a centroid
            rng.gen_range(0..n)
        } else {
            let target = rng.gen::<f64>() * total;
            let mut cumulative = 0.0;
            let mut chosen = n - 1;
            for (i, dist) in min_distances.iter().enumerate() {
                cumulative += dist;
                if cumulative > target {
                    chosen = i;
                    break;
                }
            }
            chosen
        };
        centroids.row_mut(c).assign(&data.row(chosen));
    }

    centroids
}

/// Nearest centroid per row; ties go to the lowest centroid index
fn assign(data: ArrayView2<'_, f64>, centroids: &Array2<f64>) -> Vec<usize> {
    data.rows()
        .into_iter()
        .map(|row| {
            let mut best = 0;
            let mut best_distance = f64::MAX;
            for (j, centroid) in centroids.rows().into_iter().enumerate() {
                let dist = squared_distance(row, centroid);
                if dist < best_distance {
                    best_distance = dist;
                    best = j;
                }
            }
            best
        })
        .collect()
}

/// Mean of assigned rows; an empty cluster keeps its previous centroid
fn compute_centroids(data: ArrayView2<'_, f64>, labels: &[usize], previous: &Array2<f64>) -> Array2<f64> {
    let mut sums = Array2::zeros(previous.raw_dim());
    let mut counts = vec![0usize; previous.nrows()];

    for (row, &label) in data.rows().into_iter().zip(labels) {
        counts[label] += 1;
        let mut sum = sums.row_mut(label);
        sum += &row;
    }

    for (c, &count) in counts.iter().enumerate() {
        if count == 0 {
            sums.row_mut(c).assign(&previous.row(c));
        } else {
            sums.row_mut(c).mapv_inplace(|x| x / count as f64);
        }
    }
    sums
}

/// Within-cluster sum of squared distances
fn compute_inertia(data: ArrayView2<'_, f64>, labels: &[usize], centroids: &Array2<f64>) -> f64 {
    data.rows()
        .into_iter()
        .zip(labels)
        .map(|(row, &label)| squared_distance(row, centroids.row(label)))
        .sum()
}
