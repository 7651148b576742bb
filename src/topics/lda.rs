// Latent Dirichlet Allocation with batch variational Bayes.
//
// Each document is a mixture over topics (variational parameter `gamma`),
// each topic a distribution over terms (variational parameter `lambda`).
// One outer pass runs the E-step over every document, fitting its `gamma`
// against the current topics, then the M-step rebuilds `lambda` from the
// accumulated sufficient statistics. TF-IDF weights stand in for term counts.
//
// The E-step is independent per document, so it runs on the rayon pool.
// Every document draws its starting `gamma` from an RNG derived from
// (seed, pass, document) and statistics are summed in document order, which
// keeps the result bit-identical across runs and thread counts.

use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Gamma};
use rayon::prelude::*;
use statrs::function::gamma::digamma;
use tracing::{debug, info};

use super::traits::{TopicModel, TopicStructure};
use crate::error::{PipelineError, Result};
use crate::features::WeightedMatrix;

/// Keeps the per-term normalizer away from zero.
const EPS: f64 = 1e-10;

/// Shape and scale of the Gamma used to initialise variational parameters.
const INIT_SHAPE: f64 = 100.0;
const INIT_SCALE: f64 = 0.01;

/// Variational LDA configuration.
#[derive(Debug, Clone)]
pub struct LatentDirichletAllocation {
    /// Document-topic prior (alpha); `None` means 1 / num_topics
    pub doc_topic_prior: Option<f64>,
    /// Topic-term prior (eta); `None` means 1 / num_topics
    pub topic_word_prior: Option<f64>,
    /// Outer pass budget
    pub max_iter: usize,
    /// Converged once no normalized topic-term probability moves more than this
    pub tol: f64,
    /// Inner update budget per document
    pub max_doc_update_iter: usize,
    /// Inner loop stops once mean |gamma change| falls below this
    pub mean_change_tol: f64,
}

impl Default for LatentDirichletAllocation {
    fn default() -> Self {
        Self {
            doc_topic_prior: None,
            topic_word_prior: None,
            max_iter: 50,
            tol: 1e-4,
            max_doc_update_iter: 100,
            mean_change_tol: 1e-3,
        }
    }
}

/// Result of the E-step over the whole corpus.
struct EStep {
    /// documents x topics
    gamma: Array2<f64>,
    /// topics x terms, not yet multiplied by exp(E[log beta])
    sstats: Array2<f64>,
}

/// One document's contribution to the E-step.
struct DocInference {
    gamma: Vec<f64>,
    /// For each non-zero term of the document: (term, per-topic weight)
    stats: Vec<(usize, Vec<f64>)>,
}

impl TopicModel for LatentDirichletAllocation {
    fn fit(&self, matrix: &WeightedMatrix, num_topics: usize, seed: u64) -> Result<TopicStructure> {
        if num_topics == 0 {
            return Err(PipelineError::InvalidTopicCount(num_topics));
        }
        let alpha = self.doc_topic_prior.unwrap_or(1.0 / num_topics as f64);
        let eta = self.topic_word_prior.unwrap_or(1.0 / num_topics as f64);
        if alpha <= 0.0 || eta <= 0.0 {
            return Err(PipelineError::InvalidParameter(format!(
                "topic priors must be positive, got alpha={alpha} eta={eta}"
            )));
        }
        if self.max_iter == 0 || self.max_doc_update_iter == 0 {
            return Err(PipelineError::InvalidParameter(
                "LDA needs at least one outer and one inner iteration".to_string(),
            ));
        }
        if matrix.n_terms() == 0 {
            return Err(PipelineError::InvalidParameter(
                "cannot fit topics over an empty vocabulary".to_string(),
            ));
        }

        let docs = sparse_rows(matrix);
        let init = Gamma::new(INIT_SHAPE, INIT_SCALE)
            .map_err(|e| PipelineError::InvalidParameter(format!("gamma init: {e}")))?;

        let mut rng = StdRng::seed_from_u64(seed);
        let mut lambda = Array2::from_shape_simple_fn((num_topics, matrix.n_terms()), || init.sample(&mut rng));
        let mut previous = row_normalized(&lambda);
        let mut iterations = 0;
        let mut converged = false;

        for pass in 1..=self.max_iter {
            iterations = pass;
            let exp_elog_beta = exp_dirichlet_expectation(&lambda);
            let estep = self.e_step(&docs, &exp_elog_beta, alpha, &init, seed, pass as u64);
            lambda = estep.sstats * &exp_elog_beta + eta;

            let current = row_normalized(&lambda);
            let change = (&current - &previous)
                .iter()
                .fold(0.0f64, |acc, d| acc.max(d.abs()));
            previous = current;
            debug!(pass, change, "LDA pass finished");

            if change < self.tol {
                converged = true;
                break;
            }
        }

        // Final inference against the fitted topics
        let exp_elog_beta = exp_dirichlet_expectation(&lambda);
        let estep = self.e_step(&docs, &exp_elog_beta, alpha, &init, seed, 0);
        let doc_topic = row_normalized(&estep.gamma);

        info!(
            topics = num_topics,
            documents = matrix.n_rows(),
            iterations,
            converged,
            "LDA topic model fitted"
        );

        Ok(TopicStructure::new(doc_topic, lambda, iterations, converged))
    }

    fn name(&self) -> &str {
        "lda"
    }
}

impl LatentDirichletAllocation {
    fn e_step(
        &self,
        docs: &[Vec<(usize, f64)>],
        exp_elog_beta: &Array2<f64>,
        alpha: f64,
        init: &Gamma<f64>,
        seed: u64,
        pass: u64,
    ) -> EStep {
        let n_topics = exp_elog_beta.nrows();
        let inferred: Vec<DocInference> = docs
            .par_iter()
            .enumerate()
            .map(|(d, entries)| {
                let mut rng = StdRng::seed_from_u64(derive_seed(seed, pass, d as u64));
                self.infer_document(entries, exp_elog_beta, alpha, init, &mut rng)
            })
            .collect();

        let mut gamma = Array2::zeros((docs.len(), n_topics));
        let mut sstats = Array2::zeros(exp_elog_beta.raw_dim());
        for (d, doc) in inferred.into_iter().enumerate() {
            gamma.row_mut(d).assign(&Array1::from(doc.gamma));
            for (term, weights) in doc.stats {
                for (t, w) in weights.into_iter().enumerate() {
                    sstats[[t, term]] += w;
                }
            }
        }
        EStep { gamma, sstats }
    }

    /// Fit one document's topic mixture against fixed topics.
    fn infer_document(
        &self,
        entries: &[(usize, f64)],
        exp_elog_beta: &Array2<f64>,
        alpha: f64,
        init: &Gamma<f64>,
        rng: &mut StdRng,
    ) -> DocInference {
        let n_topics = exp_elog_beta.nrows();
        if entries.is_empty() {
            // No evidence: the posterior is the prior
            return DocInference {
                gamma: vec![alpha; n_topics],
                stats: Vec::new(),
            };
        }

        let mut gamma: Vec<f64> = (0..n_topics).map(|_| init.sample(rng)).collect();
        let mut exp_theta = exp_dirichlet_expectation_1d(&gamma);

        for _ in 0..self.max_doc_update_iter {
            let last = gamma.clone();
            let norm_phi = phi_normalizers(entries, exp_elog_beta, &exp_theta);
            for (t, g) in gamma.iter_mut().enumerate() {
                let dot: f64 = entries
                    .iter()
                    .zip(&norm_phi)
                    .map(|(&(term, weight), norm)| weight / norm * exp_elog_beta[[t, term]])
                    .sum();
                *g = alpha + exp_theta[t] * dot;
            }
            exp_theta = exp_dirichlet_expectation_1d(&gamma);

            let mean_change =
                gamma.iter().zip(&last).map(|(a, b)| (a - b).abs()).sum::<f64>() / n_topics as f64;
            if mean_change < self.mean_change_tol {
                break;
            }
        }

        let norm_phi = phi_normalizers(entries, exp_elog_beta, &exp_theta);
        let stats = entries
            .iter()
            .zip(&norm_phi)
            .map(|(&(term, weight), norm)| {
                let scale = weight / norm;
                (term, exp_theta.iter().map(|e| e * scale).collect())
            })
            .collect();

        DocInference { gamma, stats }
    }
}

/// Per-term normalizer sum_t exp(E[log theta_t]) * exp(E[log beta_t,w]).
fn phi_normalizers(entries: &[(usize, f64)], exp_elog_beta: &Array2<f64>, exp_theta: &[f64]) -> Vec<f64> {
    entries
        .iter()
        .map(|&(term, _)| {
            exp_theta
                .iter()
                .enumerate()
                .map(|(t, e)| e * exp_elog_beta[[t, term]])
                .sum::<f64>()
                + EPS
        })
        .collect()
}

/// Non-zero `(term, weight)` pairs of every row.
fn sparse_rows(matrix: &WeightedMatrix) -> Vec<Vec<(usize, f64)>> {
    (0..matrix.n_rows())
        .map(|i| {
            matrix
                .row(i)
                .iter()
                .enumerate()
                .filter(|(_, &w)| w > 0.0)
                .map(|(j, &w)| (j, w))
                .collect()
        })
        .collect()
}

/// exp(E[log x]) for x ~ Dirichlet(row), applied to every row.
fn exp_dirichlet_expectation(params: &Array2<f64>) -> Array2<f64> {
    let mut out = params.clone();
    for mut row in out.rows_mut() {
        let psi_total = digamma(row.sum());
        row.mapv_inplace(|v| (digamma(v) - psi_total).exp());
    }
    out
}

fn exp_dirichlet_expectation_1d(params: &[f64]) -> Vec<f64> {
    let psi_total = digamma(params.iter().sum());
    params.iter().map(|&v| (digamma(v) - psi_total).exp()).collect()
}

/// Scale every row to sum to one. All-zero rows are left untouched.
fn row_normalized(values: &Array2<f64>) -> Array2<f64> {
    let mut out = values.clone();
    for mut row in out.rows_mut() {
        let total = row.sum();
        if total > 0.0 {
            row /= total;
        }
    }
    out
}

/// Seed for one document in one pass (splitmix64 finalizer over the inputs).
fn derive_seed(seed: u64, pass: u64, doc: u64) -> u64 {
    let mut z = seed
        ^ pass.wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ doc.wrapping_mul(0xC2B2_AE3D_27D4_EB4F);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn corpus() -> WeightedMatrix {
        // Two obvious term groups, {0, 1} and {2, 3}, plus an empty row.
        // Weights are count-sized so the evidence dominates the priors.
        WeightedMatrix::from_rows(array![
            [8.0, 6.0, 0.0, 0.0],
            [6.0, 8.0, 0.0, 0.0],
            [0.0, 0.0, 8.0, 6.0],
            [0.0, 0.0, 6.0, 8.0],
            [0.0, 0.0, 0.0, 0.0],
        ])
        .unwrap()
    }

    #[test]
    fn test_rows_are_distributions() {
        let ts = LatentDirichletAllocation::default().fit(&corpus(), 2, 1).unwrap();
        assert_eq!(ts.doc_topic.dim(), (5, 2));
        assert_eq!(ts.topic_term.dim(), (2, 4));
        for row in ts.doc_topic.rows() {
            assert!((row.sum() - 1.0).abs() < 1e-9);
            assert!(row.iter().all(|&p| p >= 0.0));
        }
        assert!(ts.topic_term.iter().all(|&w| w >= 0.0));
    }

    #[test]
    fn test_empty_row_gets_uniform_mixture() {
        let ts = LatentDirichletAllocation::default().fit(&corpus(), 2, 1).unwrap();
        let row = ts.doc_topic.row(4);
        assert!((row[0] - 0.5).abs() < 1e-12);
        assert!((row[1] - 0.5).abs() < 1e-12);
        assert_eq!(ts.dominant[4], 0);
    }

    #[test]
    fn test_separates_term_groups() {
        let ts = LatentDirichletAllocation::default().fit(&corpus(), 2, 3).unwrap();
        assert_eq!(ts.dominant[0], ts.dominant[1]);
        assert_eq!(ts.dominant[2], ts.dominant[3]);
        assert_ne!(ts.dominant[0], ts.dominant[2]);
    }

    #[test]
    fn test_deterministic_for_seed() {
        let m = corpus();
        let a = LatentDirichletAllocation::default().fit(&m, 3, 9).unwrap();
        let b = LatentDirichletAllocation::default().fit(&m, 3, 9).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_topics_rejected() {
        let err = LatentDirichletAllocation::default().fit(&corpus(), 0, 1).unwrap_err();
        assert_eq!(err, PipelineError::InvalidTopicCount(0));
    }

    #[test]
    fn test_iteration_budget_reports_non_convergence() {
        let lda = LatentDirichletAllocation {
            max_iter: 1,
            tol: 0.0,
            ..Default::default()
        };
        let ts = lda.fit(&corpus(), 2, 1).unwrap();
        assert_eq!(ts.iterations, 1);
        assert!(!ts.converged);
    }

    #[test]
    fn test_derive_seed_varies() {
        assert_ne!(derive_seed(1, 0, 0), derive_seed(1, 0, 1));
        assert_ne!(derive_seed(1, 0, 0), derive_seed(1, 1, 0));
        assert_eq!(derive_seed(5, 2, 3), derive_seed(5, 2, 3));
    }
}
