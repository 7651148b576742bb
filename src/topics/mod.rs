// Topic modeling: latent topics over the TF-IDF matrix.

pub mod lda;
pub mod traits;

pub use lda::LatentDirichletAllocation;
pub use traits::{TopicModel, TopicStructure};
