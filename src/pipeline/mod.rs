// Pipeline orchestration: wires normalizer, vectorizer, clusterer, topic
// model and reporter into a single batch run.

pub mod analysis;

pub use analysis::{AnalysisReport, Pipeline, PipelineConfig};
