// Feature extraction: vocabulary selection and TF-IDF weighting.

pub mod tfidf;
pub mod vocabulary;

pub use tfidf::{build, WeightedMatrix};
pub use vocabulary::{EmptyRowPolicy, VectorizerParams, Vocabulary};
