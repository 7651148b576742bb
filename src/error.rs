// Pipeline error kinds.
//
// Every stage either completes its full contract or fails with one of these.
// Nothing is retried: the computation is deterministic, so the caller adjusts
// configuration and re-runs.

use thiserror::Error;

/// Errors raised at the boundary of the stage that detects them.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PipelineError {
    /// The document-frequency bounds rejected every candidate term.
    #[error("no term survived the document-frequency bounds ({documents} documents, {candidates} candidate terms)")]
    EmptyVocabulary { documents: usize, candidates: usize },

    /// Cluster count is zero or larger than the number of documents.
    #[error("cannot form {k} clusters from {documents} documents")]
    InvalidClusterCount { k: usize, documents: usize },

    /// Topic count must be positive.
    #[error("number of topics must be positive, got {0}")]
    InvalidTopicCount(usize),

    /// A cluster or topic has no associated documents at summary time.
    #[error("{kind} {index} has no member documents")]
    EmptyGroup { kind: GroupKind, index: usize },

    /// A vectorizer or engine parameter is outside its valid range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Which kind of group a summary describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupKind {
    Cluster,
    Topic,
}

impl std::fmt::Display for GroupKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GroupKind::Cluster => write!(f, "cluster"),
            GroupKind::Topic => write!(f, "topic"),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
