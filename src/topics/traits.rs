// Topic model trait: swap-ready abstraction over topic inference.
//
// Like the Clusterer trait, this lets the pipeline run against any model that
// turns a weighted matrix into document-topic and topic-term structure. The
// default implementation is variational LDA; tests substitute stubs.

use ndarray::Array2;
use serde::Serialize;

use crate::error::Result;
use crate::features::WeightedMatrix;

/// Infers `num_topics` latent topics over the rows of a weighted matrix.
pub trait TopicModel: Send + Sync {
    fn fit(&self, matrix: &WeightedMatrix, num_topics: usize, seed: u64) -> Result<TopicStructure>;

    /// Short name for logs and reports.
    fn name(&self) -> &str;
}

/// Document-topic probabilities and topic-term importance weights.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicStructure {
    /// rows x topics; each row is a probability distribution
    pub doc_topic: Array2<f64>,
    /// topics x terms; non-negative, only meaningful for ranking within a topic
    pub topic_term: Array2<f64>,
    /// Arg-max topic of each document row
    pub dominant: Vec<usize>,
    /// Outer inference passes run
    pub iterations: usize,
    /// Whether the convergence threshold was reached within the budget
    pub converged: bool,
}

impl TopicStructure {
    /// Assemble a structure, deriving the dominant topic of every row.
    pub fn new(doc_topic: Array2<f64>, topic_term: Array2<f64>, iterations: usize, converged: bool) -> Self {
        let dominant = doc_topic
            .rows()
            .into_iter()
            .map(|row| {
                let mut best = 0;
                for (t, &p) in row.iter().enumerate() {
                    if p > row[best] {
                        best = t;
                    }
                }
                best
            })
            .collect();
        Self {
            doc_topic,
            topic_term,
            dominant,
            iterations,
            converged,
        }
    }

    pub fn n_topics(&self) -> usize {
        self.topic_term.nrows()
    }

    /// Number of documents whose dominant topic is each topic.
    pub fn dominant_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.n_topics()];
        for &t in &self.dominant {
            if let Some(c) = counts.get_mut(t) {
                *c += 1;
            }
        }
        counts
    }

    /// Rows whose dominant topic is `topic`, in matrix order.
    pub fn members(&self, topic: usize) -> Vec<usize> {
        self.dominant
            .iter()
            .enumerate()
            .filter(|(_, &t)| t == topic)
            .map(|(row, _)| row)
            .collect()
    }

    /// The first `limit` document-topic rows rounded to `decimals` places.
    pub fn rounded_rows(&self, decimals: u32, limit: usize) -> Vec<Vec<f64>> {
        let scale = 10f64.powi(decimals as i32);
        self.doc_topic
            .rows()
            .into_iter()
            .take(limit)
            .map(|row| row.iter().map(|p| (p * scale).round() / scale).collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_dominant_ties_pick_lowest() {
        let ts = TopicStructure::new(
            array![[0.5, 0.5], [0.2, 0.8], [0.6, 0.4]],
            array![[1.0, 0.0], [0.0, 1.0]],
            1,
            true,
        );
        assert_eq!(ts.dominant, vec![0, 1, 0]);
        assert_eq!(ts.dominant_counts(), vec![2, 1]);
        assert_eq!(ts.members(0), vec![0, 2]);
    }

    #[test]
    fn test_rounded_rows() {
        let ts = TopicStructure::new(
            array![[0.123, 0.877], [0.5, 0.5]],
            array![[1.0, 0.0], [0.0, 1.0]],
            1,
            true,
        );
        assert_eq!(ts.rounded_rows(2, 1), vec![vec![0.12, 0.88]]);
    }
}
