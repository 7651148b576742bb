// Clusterer trait: swap-ready abstraction over partitioning strategies.
//
// The pipeline only depends on this trait, so tests can substitute a
// deterministic stub and other partitioning algorithms can be dropped in.

use ndarray::Array2;
use serde::Serialize;

use crate::error::Result;
use crate::features::WeightedMatrix;

/// Partitions the rows of a weighted matrix into `k` disjoint clusters.
pub trait Clusterer: Send + Sync {
    fn fit(&self, matrix: &WeightedMatrix, k: usize, seed: u64) -> Result<ClusterAssignment>;

    /// Short name for logs and reports.
    fn name(&self) -> &str;
}

/// One label per matrix row plus the final centroids.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterAssignment {
    /// Cluster label for each matrix row, in `0..k`
    pub labels: Vec<usize>,
    /// k x n_terms centroid matrix
    pub centroids: Array2<f64>,
    /// Sum of squared distances from each row to its centroid
    pub inertia: f64,
    /// Lloyd iterations run by the winning restart
    pub iterations: usize,
    /// Whether assignments stopped changing before the iteration cap
    pub converged: bool,
}

impl ClusterAssignment {
    pub fn k(&self) -> usize {
        self.centroids.nrows()
    }

    /// Number of rows assigned to each cluster.
    pub fn sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.k()];
        for &label in &self.labels {
            if let Some(size) = sizes.get_mut(label) {
                *size += 1;
            }
        }
        sizes
    }

    /// Row indices belonging to `cluster`, in matrix order.
    pub fn members(&self, cluster: usize) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, &label)| label == cluster)
            .map(|(row, _)| row)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizes_and_members() {
        let a = ClusterAssignment {
            labels: vec![1, 0, 1, 1],
            centroids: Array2::zeros((3, 2)),
            inertia: 0.0,
            iterations: 1,
            converged: true,
        };
        assert_eq!(a.k(), 3);
        assert_eq!(a.sizes(), vec![1, 3, 0]);
        assert_eq!(a.members(1), vec![0, 2, 3]);
        assert!(a.members(2).is_empty());
    }
}
