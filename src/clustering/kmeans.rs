// K-means clustering (Lloyd's algorithm) over TF-IDF rows.
//
// Each restart seeds its centroids with k-means++ from its own StdRng, then
// alternates assignment (nearest centroid by squared Euclidean distance,
// lowest index on ties) and update (centroid = mean of members; a cluster
// left empty keeps its previous centroid) until no label changes or the
// iteration cap is hit. Restarts are independent, so they run on the rayon
// pool; the lowest-inertia run wins, with the lowest restart index breaking
// ties so the result never depends on thread scheduling.

use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, info};

use super::traits::{ClusterAssignment, Clusterer};
use crate::error::{PipelineError, Result};
use crate::features::WeightedMatrix;

/// Lloyd's k-means with k-means++ seeding and independent restarts.
#[derive(Debug, Clone)]
pub struct KMeans {
    /// Number of independently seeded runs (restart `r` uses `seed + r`)
    pub n_restarts: usize,
    /// Iteration cap per run
    pub max_iter: usize,
}

impl Default for KMeans {
    fn default() -> Self {
        Self {
            n_restarts: 10,
            max_iter: 300,
        }
    }
}

impl Clusterer for KMeans {
    fn fit(&self, matrix: &WeightedMatrix, k: usize, seed: u64) -> Result<ClusterAssignment> {
        let documents = matrix.n_rows();
        if k == 0 || k > documents {
            return Err(PipelineError::InvalidClusterCount { k, documents });
        }
        if self.n_restarts == 0 || self.max_iter == 0 {
            return Err(PipelineError::InvalidParameter(
                "k-means needs at least one restart and one iteration".to_string(),
            ));
        }

        let x = matrix.weights();
        let runs: Vec<ClusterAssignment> = (0..self.n_restarts)
            .into_par_iter()
            .map(|r| self.run_once(x, k, seed.wrapping_add(r as u64)))
            .collect();

        let mut best: Option<ClusterAssignment> = None;
        for (r, run) in runs.into_iter().enumerate() {
            debug!(restart = r, inertia = run.inertia, iterations = run.iterations, "k-means restart finished");
            let better = match &best {
                None => true,
                Some(b) => run.inertia < b.inertia,
            };
            if better {
                best = Some(run);
            }
        }
        let best = best.ok_or_else(|| {
            PipelineError::InvalidParameter("k-means produced no runs".to_string())
        })?;

        info!(
            k,
            documents,
            inertia = best.inertia,
            iterations = best.iterations,
            converged = best.converged,
            "K-means clustering finished"
        );
        Ok(best)
    }

    fn name(&self) -> &str {
        "kmeans"
    }
}

impl KMeans {
    fn run_once(&self, x: &Array2<f64>, k: usize, seed: u64) -> ClusterAssignment {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut centroids = kmeans_plus_plus(x, k, &mut rng);
        // usize::MAX marks "not yet assigned" so the first pass always counts as a change
        let mut labels = vec![usize::MAX; x.nrows()];
        let mut iterations = 0;
        let mut converged = false;

        for iter in 1..=self.max_iter {
            iterations = iter;
            if !assign(x, &centroids, &mut labels) {
                converged = true;
                break;
            }
            update_centroids(x, &labels, &mut centroids);
        }
        if !converged {
            // Labels must match the centroids that are returned
            assign(x, &centroids, &mut labels);
        }

        let inertia = inertia(x, &centroids, &labels);
        ClusterAssignment {
            labels,
            centroids,
            inertia,
            iterations,
            converged,
        }
    }
}

/// Squared Euclidean distance between two rows.
pub fn squared_distance(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Index of the nearest centroid, lowest index on ties.
fn nearest(row: ArrayView1<'_, f64>, centroids: &Array2<f64>) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (c, centroid) in centroids.rows().into_iter().enumerate() {
        let d = squared_distance(row, centroid);
        if d < best.1 {
            best = (c, d);
        }
    }
    best
}

/// k-means++ seeding: the first centroid is a uniformly random row, each next
/// one is drawn with probability proportional to its squared distance from
/// the nearest centroid chosen so far.
fn kmeans_plus_plus(x: &Array2<f64>, k: usize, rng: &mut StdRng) -> Array2<f64> {
    let n = x.nrows();
    let mut centroids = Array2::zeros((k, x.ncols()));

    let first = rng.random_range(0..n);
    centroids.row_mut(0).assign(&x.row(first));
    let mut d2: Vec<f64> = x
        .rows()
        .into_iter()
        .map(|row| squared_distance(row, x.row(first)))
        .collect();

    for c in 1..k {
        let total: f64 = d2.iter().sum();
        let pick = if total > 0.0 {
            let target = rng.random::<f64>() * total;
            let mut cumulative = 0.0;
            let mut chosen = None;
            for (i, &d) in d2.iter().enumerate() {
                cumulative += d;
                if d > 0.0 && cumulative > target {
                    chosen = Some(i);
                    break;
                }
            }
            // Rounding can leave the target just past the last bucket
            chosen.unwrap_or_else(|| d2.iter().rposition(|&d| d > 0.0).unwrap_or(0))
        } else {
            // Every row coincides with a chosen centroid
            rng.random_range(0..n)
        };

        centroids.row_mut(c).assign(&x.row(pick));
        for (i, row) in x.rows().into_iter().enumerate() {
            let d = squared_distance(row, x.row(pick));
            if d < d2[i] {
                d2[i] = d;
            }
        }
    }
    centroids
}

/// Assign every row to its nearest centroid. Returns whether any label changed.
fn assign(x: &Array2<f64>, centroids: &Array2<f64>, labels: &mut [usize]) -> bool {
    let mut changed = false;
    for (row, label) in x.rows().into_iter().zip(labels.iter_mut()) {
        let (c, _) = nearest(row, centroids);
        if *label != c {
            *label = c;
            changed = true;
        }
    }
    changed
}

/// Recompute centroids as member means. Empty clusters keep their centroid.
fn update_centroids(x: &Array2<f64>, labels: &[usize], centroids: &mut Array2<f64>) {
    let k = centroids.nrows();
    let mut sums = Array2::<f64>::zeros(centroids.raw_dim());
    let mut counts = vec![0usize; k];
    for (row, &label) in x.rows().into_iter().zip(labels) {
        let mut sum = sums.row_mut(label);
        sum += &row;
        counts[label] += 1;
    }
    for (c, &count) in counts.iter().enumerate() {
        if count > 0 {
            let mean = &sums.row(c) / count as f64;
            centroids.row_mut(c).assign(&mean);
        }
    }
}

fn inertia(x: &Array2<f64>, centroids: &Array2<f64>, labels: &[usize]) -> f64 {
    x.rows()
        .into_iter()
        .zip(labels)
        .map(|(row, &label)| squared_distance(row, centroids.row(label)))
        .sum()
}
