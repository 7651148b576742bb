// Review analysis pipeline: documents -> TF-IDF -> {clusters, topics} -> summaries.
//
// Stages run strictly in sequence because each needs the full output of the
// one before it. The weighted matrix is built once and shared read-only by the
// clustering and topic stages. Any stage failure aborts the whole run; no
// partial report is returned.

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Serialize, Serializer};
use tracing::info;

use crate::clustering::{ClusterAssignment, Clusterer, KMeans};
use crate::document::Document;
use crate::error::Result;
use crate::features::{self, VectorizerParams, Vocabulary, WeightedMatrix};
use crate::report::{self, GroupSummary, Grouping};
use crate::text::stemmer::SnowballNormalizer;
use crate::text::traits::Normalizer;
use crate::topics::{LatentDirichletAllocation, TopicModel, TopicStructure};

/// Number of progress steps reported by `run_with_progress`.
const STAGES: u64 = 4;

/// Everything a run needs besides the documents and the strategies.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub vectorizer: VectorizerParams,
    pub num_clusters: usize,
    pub num_topics: usize,
    /// Keywords listed per cluster
    pub cluster_keywords: usize,
    /// Keywords listed per topic
    pub topic_keywords: usize,
    pub random_seed: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            vectorizer: VectorizerParams::default(),
            num_clusters: 5,
            num_topics: 5,
            cluster_keywords: 6,
            topic_keywords: 15,
            random_seed: 42,
        }
    }
}

/// The structured result of a full run.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    /// Documents handed to the pipeline
    pub documents: usize,
    pub vocabulary: Vocabulary,
    /// Serialized as a handle (shape and row ids), not the full weights
    #[serde(serialize_with = "serialize_matrix_handle")]
    pub matrix: WeightedMatrix,
    pub clusterer: String,
    pub clusters: ClusterAssignment,
    pub topic_model: String,
    pub topics: TopicStructure,
    pub cluster_summaries: Vec<GroupSummary>,
    pub topic_summaries: Vec<GroupSummary>,
}

/// The pipeline with its three swappable strategies.
pub struct Pipeline {
    config: PipelineConfig,
    normalizer: Box<dyn Normalizer>,
    clusterer: Box<dyn Clusterer>,
    topic_model: Box<dyn TopicModel>,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        normalizer: Box<dyn Normalizer>,
        clusterer: Box<dyn Clusterer>,
        topic_model: Box<dyn TopicModel>,
    ) -> Self {
        Self {
            config,
            normalizer,
            clusterer,
            topic_model,
        }
    }

    /// Snowball English stemming, k-means and variational LDA.
    pub fn with_defaults(config: PipelineConfig) -> Self {
        Self::new(
            config,
            Box::new(SnowballNormalizer::english()),
            Box::new(KMeans::default()),
            Box::new(LatentDirichletAllocation::default()),
        )
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Stems for one piece of text under the configured stopwords.
    pub fn stems(&self, text: &str) -> Vec<String> {
        self.normalizer.normalize(text, &self.config.vectorizer.stopwords)
    }

    /// Only the vocabulary and weight stage.
    pub fn vectorize(&self, documents: &[Document]) -> Result<(Vocabulary, WeightedMatrix)> {
        features::build(documents, self.normalizer.as_ref(), &self.config.vectorizer)
    }

    pub fn run(&self, documents: &[Document]) -> Result<AnalysisReport> {
        self.run_with_progress(documents, &ProgressBar::hidden())
    }

    /// Run every stage, advancing `pb` once per stage.
    pub fn run_with_progress(&self, documents: &[Document], pb: &ProgressBar) -> Result<AnalysisReport> {
        let cfg = &self.config;
        pb.set_length(STAGES);
        if let Ok(style) = ProgressStyle::default_bar().template("  Pipeline [{bar:30}] {pos}/{len} {msg}") {
            pb.set_style(style);
        }

        pb.set_message("building vocabulary");
        let (vocabulary, matrix) = self.vectorize(documents)?;
        pb.inc(1);

        pb.set_message(format!("clustering ({})", self.clusterer.name()));
        let clusters = self.clusterer.fit(&matrix, cfg.num_clusters, cfg.random_seed)?;
        pb.inc(1);

        pb.set_message(format!("topic modeling ({})", self.topic_model.name()));
        let topics = self.topic_model.fit(&matrix, cfg.num_topics, cfg.random_seed)?;
        pb.inc(1);

        pb.set_message("summarizing");
        let cluster_summaries = report::summarize(
            &vocabulary,
            &matrix,
            Grouping::Clusters(&clusters),
            documents,
            cfg.cluster_keywords,
        )?;
        let topic_summaries = report::summarize(
            &vocabulary,
            &matrix,
            Grouping::Topics(&topics),
            documents,
            cfg.topic_keywords,
        )?;
        pb.inc(1);
        pb.finish_and_clear();

        info!(
            documents = documents.len(),
            terms = vocabulary.len(),
            clusters = clusters.k(),
            topics = topics.n_topics(),
            "Analysis complete"
        );

        Ok(AnalysisReport {
            documents: documents.len(),
            vocabulary,
            matrix,
            clusterer: self.clusterer.name().to_string(),
            clusters,
            topic_model: self.topic_model.name().to_string(),
            topics,
            cluster_summaries,
            topic_summaries,
        })
    }
}

#[derive(Serialize)]
struct MatrixHandle<'a> {
    rows: usize,
    terms: usize,
    zero_rows: usize,
    doc_ids: &'a [usize],
}

fn serialize_matrix_handle<S: Serializer>(matrix: &WeightedMatrix, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    MatrixHandle {
        rows: matrix.n_rows(),
        terms: matrix.n_terms(),
        zero_rows: matrix.zero_rows(),
        doc_ids: matrix.doc_ids(),
    }
    .serialize(serializer)
}
