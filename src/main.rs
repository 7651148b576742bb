use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::ProgressBar;
use tracing::info;

use reviewlens::config::Config;
use reviewlens::ingest;
use reviewlens::output::{self, terminal};
use reviewlens::pipeline::Pipeline;

/// ReviewLens: what are customers actually talking about?
///
/// Groups free-text reviews into clusters and latent topics, each summarized
/// by its top keywords and a few example reviews.
#[derive(Parser)]
#[command(name = "reviewlens", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Cluster and topic-model a review file, then print the summaries
    Analyze {
        #[command(flatten)]
        input: InputArgs,

        /// Number of k-means clusters (default: REVIEWLENS_CLUSTERS or 5)
        #[arg(long)]
        clusters: Option<usize>,

        /// Number of LDA topics (default: REVIEWLENS_TOPICS or 5)
        #[arg(long)]
        topics: Option<usize>,

        /// Keywords listed per cluster
        #[arg(long)]
        cluster_keywords: Option<usize>,

        /// Keywords listed per topic
        #[arg(long)]
        topic_keywords: Option<usize>,

        /// Random seed for clustering and topic initialization
        #[arg(long)]
        seed: Option<u64>,

        /// Print the full report as JSON instead of the terminal summary
        #[arg(long)]
        json: bool,
    },

    /// Show the stems a piece of text is reduced to
    Stem {
        /// The text to normalize
        text: String,
    },

    /// Build the vocabulary for a review file and show a sample of it
    Vocab {
        #[command(flatten)]
        input: InputArgs,
    },
}

#[derive(Args)]
struct InputArgs {
    /// Tab-separated review export with a header row
    #[arg(long)]
    input: PathBuf,

    /// Column holding the review text
    #[arg(long, default_value = ingest::DEFAULT_COLUMN)]
    column: String,

    /// Use only the first N reviews that have text (default: 1000)
    #[arg(long, default_value = "1000")]
    limit: usize,

    /// Upper document-frequency bound
    #[arg(long)]
    max_df: Option<f64>,

    /// Lower document-frequency bound
    #[arg(long)]
    min_df: Option<f64>,

    /// Vocabulary size cap
    #[arg(long)]
    max_features: Option<usize>,

    /// Smallest n-gram size to index
    #[arg(long)]
    ngram_min: Option<usize>,

    /// Largest n-gram size to index
    #[arg(long)]
    ngram_max: Option<usize>,
}

impl InputArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(v) = self.max_df {
            config.max_df = v;
        }
        if let Some(v) = self.min_df {
            config.min_df = v;
        }
        if let Some(v) = self.max_features {
            config.max_features = v;
        }
        if let Some(v) = self.ngram_min {
            config.ngram_min = v;
        }
        if let Some(v) = self.ngram_max {
            config.ngram_max = v;
        }
    }
}

fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("reviewlens=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            input,
            clusters,
            topics,
            cluster_keywords,
            topic_keywords,
            seed,
            json,
        } => {
            let mut config = Config::load()?;
            input.apply(&mut config);
            if let Some(v) = clusters {
                config.num_clusters = v;
            }
            if let Some(v) = topics {
                config.num_topics = v;
            }
            if let Some(v) = cluster_keywords {
                config.cluster_keywords = v;
            }
            if let Some(v) = topic_keywords {
                config.topic_keywords = v;
            }
            if let Some(v) = seed {
                config.random_seed = v;
            }
            config.validate()?;

            let documents = ingest::load_reviews(&input.input, &input.column, input.limit)?;
            if documents.is_empty() {
                anyhow::bail!(
                    "No reviews with text found in column `{}` of {}",
                    input.column,
                    input.input.display()
                );
            }

            let pipeline = Pipeline::with_defaults(config.pipeline_config());

            if json {
                let report = pipeline.run(&documents)?;
                println!("{}", output::to_json(&report)?);
            } else {
                println!("Analyzing {} reviews...", documents.len());
                let pb = ProgressBar::new(0);
                let report = pipeline.run_with_progress(&documents, &pb)?;
                terminal::display_report(&report);
            }
        }

        Commands::Stem { text } => {
            let config = Config::load()?;
            let pipeline = Pipeline::with_defaults(config.pipeline_config());
            let stems = pipeline.stems(&text);
            terminal::display_stems(&text, &stems);
        }

        Commands::Vocab { input } => {
            let mut config = Config::load()?;
            input.apply(&mut config);
            config.validate()?;

            let documents = ingest::load_reviews(&input.input, &input.column, input.limit)?;
            let stopwords = config.pipeline_config().vectorizer.stopwords.len();
            info!(stopwords, "Using English stopwords plus domain terms");

            let pipeline = Pipeline::with_defaults(config.pipeline_config());
            let (vocabulary, matrix) = pipeline.vectorize(&documents)?;
            terminal::display_vocabulary(&vocabulary, documents.len());
            if matrix.zero_rows() > 0 {
                println!(
                    "  {}",
                    format!("{} reviews kept no vocabulary term", matrix.zero_rows()).dimmed()
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ngram_range_flags_apply() {
        let cli = Cli::try_parse_from([
            "reviewlens",
            "vocab",
            "--input",
            "reviews.tsv",
            "--ngram-min",
            "2",
            "--ngram-max",
            "2",
        ])
        .unwrap();
        let Commands::Vocab { input } = cli.command else {
            panic!("expected the vocab command");
        };
        let mut config = Config::default();
        input.apply(&mut config);
        assert_eq!((config.ngram_min, config.ngram_max), (2, 2));
        assert!(config.validate().is_ok());
        assert_eq!(config.pipeline_config().vectorizer.ngram_range, (2, 2));
    }
}
