// Summary reporting: turning centroids and topic weights back into words.
//
// For every cluster (or topic) the vocabulary terms are ranked by the group's
// weight vector and the top ones kept, together with a few example reviews
// from that group in corpus order. Pure read-only aggregation.

use std::collections::HashMap;

use ndarray::ArrayView1;
use serde::Serialize;

use crate::clustering::ClusterAssignment;
use crate::document::Document;
use crate::error::{GroupKind, PipelineError, Result};
use crate::features::{Vocabulary, WeightedMatrix};
use crate::topics::TopicStructure;

/// Example reviews shown per group.
pub const MAX_EXAMPLES: usize = 3;

/// A vocabulary term and its weight within one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedTerm {
    pub term: String,
    pub weight: f64,
}

/// Human-readable description of one cluster or topic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub kind: GroupKind,
    pub index: usize,
    /// Member documents (cluster label, or dominant topic)
    pub size: usize,
    /// Top terms, highest weight first
    pub keywords: Vec<RankedTerm>,
    /// Up to `MAX_EXAMPLES` member reviews in corpus order
    pub examples: Vec<String>,
}

impl GroupSummary {
    pub fn keyword_terms(&self) -> Vec<&str> {
        self.keywords.iter().map(|k| k.term.as_str()).collect()
    }
}

/// Either grouping the pipeline produces.
#[derive(Debug, Clone, Copy)]
pub enum Grouping<'a> {
    Clusters(&'a ClusterAssignment),
    Topics(&'a TopicStructure),
}

/// Summarize every group of a clustering or topic model.
pub fn summarize(
    vocabulary: &Vocabulary,
    matrix: &WeightedMatrix,
    grouping: Grouping<'_>,
    documents: &[Document],
    top_n: usize,
) -> Result<Vec<GroupSummary>> {
    match grouping {
        Grouping::Clusters(assignment) => {
            summarize_clusters(vocabulary, matrix, assignment, documents, top_n)
        }
        Grouping::Topics(topics) => summarize_topics(vocabulary, matrix, topics, documents, top_n),
    }
}

/// Rank terms by the cluster centroid and collect example reviews.
///
/// Fails with `EmptyGroup` if any cluster ended up without members.
pub fn summarize_clusters(
    vocabulary: &Vocabulary,
    matrix: &WeightedMatrix,
    assignment: &ClusterAssignment,
    documents: &[Document],
    top_n: usize,
) -> Result<Vec<GroupSummary>> {
    check_rows(assignment.labels.len(), matrix)?;
    let texts = texts_by_id(documents);

    (0..assignment.k())
        .map(|c| {
            let members = assignment.members(c);
            if members.is_empty() {
                return Err(PipelineError::EmptyGroup {
                    kind: GroupKind::Cluster,
                    index: c,
                });
            }
            Ok(GroupSummary {
                kind: GroupKind::Cluster,
                index: c,
                size: members.len(),
                keywords: top_terms(vocabulary, assignment.centroids.row(c), top_n),
                examples: examples(&members, matrix, &texts),
            })
        })
        .collect()
}

/// Rank terms by each topic's term weights. Examples are documents whose
/// dominant topic it is; a topic that dominates no document has none.
pub fn summarize_topics(
    vocabulary: &Vocabulary,
    matrix: &WeightedMatrix,
    topics: &TopicStructure,
    documents: &[Document],
    top_n: usize,
) -> Result<Vec<GroupSummary>> {
    check_rows(topics.dominant.len(), matrix)?;
    let texts = texts_by_id(documents);

    Ok((0..topics.n_topics())
        .map(|t| {
            let members = topics.members(t);
            GroupSummary {
                kind: GroupKind::Topic,
                index: t,
                size: members.len(),
                keywords: top_terms(vocabulary, topics.topic_term.row(t), top_n),
                examples: examples(&members, matrix, &texts),
            }
        })
        .collect())
}

/// The `top_n` highest-weighted terms; equal weights keep vocabulary order.
pub fn top_terms(vocabulary: &Vocabulary, weights: ArrayView1<'_, f64>, top_n: usize) -> Vec<RankedTerm> {
    let mut order: Vec<usize> = (0..weights.len().min(vocabulary.len())).collect();
    order.sort_by(|&a, &b| weights[b].total_cmp(&weights[a]).then(a.cmp(&b)));
    order
        .into_iter()
        .take(top_n)
        .filter_map(|i| {
            vocabulary.term(i).map(|term| RankedTerm {
                term: term.to_string(),
                weight: weights[i],
            })
        })
        .collect()
}

fn check_rows(labelled: usize, matrix: &WeightedMatrix) -> Result<()> {
    if labelled != matrix.n_rows() {
        return Err(PipelineError::InvalidParameter(format!(
            "{labelled} labelled rows for a matrix with {} rows",
            matrix.n_rows()
        )));
    }
    Ok(())
}

fn texts_by_id(documents: &[Document]) -> HashMap<usize, &str> {
    documents.iter().map(|d| (d.id, d.text.as_str())).collect()
}

fn examples(members: &[usize], matrix: &WeightedMatrix, texts: &HashMap<usize, &str>) -> Vec<String> {
    members
        .iter()
        .filter_map(|&row| matrix.doc_ids().get(row))
        .filter_map(|id| texts.get(id))
        .take(MAX_EXAMPLES)
        .map(|t| t.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    fn vocab() -> Vocabulary {
        Vocabulary::from_terms(
            vec![
                ("band".to_string(), 2),
                ("broke".to_string(), 2),
                ("love".to_string(), 2),
            ],
            4,
        )
    }

    fn docs() -> Vec<Document> {
        Document::corpus(&["love it", "band broke", "love love", "band broke again"])
    }

    fn matrix() -> WeightedMatrix {
        WeightedMatrix::from_rows(Array2::zeros((4, 3))).unwrap()
    }

    #[test]
    fn test_top_terms_orders_by_weight_then_index() {
        let terms = top_terms(&vocab(), array![0.2, 0.5, 0.2].view(), 2);
        assert_eq!(terms[0].term, "broke");
        assert_eq!(terms[1].term, "band");
        assert_eq!(top_terms(&vocab(), array![0.2, 0.5, 0.2].view(), 10).len(), 3);
    }

    #[test]
    fn test_cluster_summaries() {
        let assignment = ClusterAssignment {
            labels: vec![1, 0, 1, 0],
            centroids: array![[0.6, 0.6, 0.0], [0.0, 0.0, 1.0]],
            inertia: 0.0,
            iterations: 2,
            converged: true,
        };
        let s = summarize(&vocab(), &matrix(), Grouping::Clusters(&assignment), &docs(), 2).unwrap();
        assert_eq!(s.len(), 2);
        assert_eq!(s[0].size, 2);
        assert_eq!(s[0].keyword_terms(), vec!["band", "broke"]);
        assert_eq!(s[0].examples, vec!["band broke", "band broke again"]);
        assert_eq!(s[1].keyword_terms()[0], "love");
        assert_eq!(s[1].examples, vec!["love it", "love love"]);
    }

    #[test]
    fn test_empty_cluster_is_an_error() {
        let assignment = ClusterAssignment {
            labels: vec![0, 0, 0, 0],
            centroids: Array2::zeros((2, 3)),
            inertia: 0.0,
            iterations: 1,
            converged: true,
        };
        let err = summarize_clusters(&vocab(), &matrix(), &assignment, &docs(), 2).unwrap_err();
        assert_eq!(
            err,
            PipelineError::EmptyGroup {
                kind: GroupKind::Cluster,
                index: 1
            }
        );
    }

    #[test]
    fn test_topic_without_documents_has_no_examples() {
        let topics = TopicStructure::new(
            array![[0.9, 0.1], [0.8, 0.2], [0.7, 0.3], [0.6, 0.4]],
            array![[1.0, 2.0, 3.0], [3.0, 2.0, 1.0]],
            5,
            true,
        );
        let s = summarize_topics(&vocab(), &matrix(), &topics, &docs(), 1).unwrap();
        assert_eq!(s[0].size, 4);
        assert_eq!(s[0].examples.len(), MAX_EXAMPLES);
        assert_eq!(s[0].keyword_terms(), vec!["love"]);
        assert_eq!(s[1].size, 0);
        assert!(s[1].examples.is_empty());
        assert_eq!(s[1].keyword_terms(), vec!["band"]);
    }

    #[test]
    fn test_row_mismatch_is_rejected() {
        let assignment = ClusterAssignment {
            labels: vec![0],
            centroids: Array2::zeros((1, 3)),
            inertia: 0.0,
            iterations: 1,
            converged: true,
        };
        assert!(summarize_clusters(&vocab(), &matrix(), &assignment, &docs(), 2).is_err());
    }
}
