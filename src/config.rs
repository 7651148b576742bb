use std::env;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::features::{EmptyRowPolicy, VectorizerParams};
use crate::pipeline::PipelineConfig;
use crate::text::stopwords::{StopWords, DEFAULT_EXTRA_STOPWORDS};

/// Central configuration loaded from environment variables.
///
/// Every value has a default, so a bare `reviewlens analyze` works. The .env
/// file is loaded automatically at startup via dotenvy, and command-line
/// flags override whatever is loaded here.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Terms in more than this fraction of reviews are dropped
    pub max_df: f64,
    /// Terms in fewer than this fraction of reviews are dropped
    pub min_df: f64,
    pub max_features: usize,
    pub ngram_min: usize,
    pub ngram_max: usize,
    pub num_clusters: usize,
    pub num_topics: usize,
    pub cluster_keywords: usize,
    pub topic_keywords: usize,
    pub random_seed: u64,
    /// Domain noise terms added to the English stopword list
    pub extra_stopwords: Vec<String>,
    pub empty_rows: EmptyRowPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_df: 0.99,
            min_df: 0.01,
            max_features: 1000,
            ngram_min: 1,
            ngram_max: 1,
            num_clusters: 5,
            num_topics: 5,
            cluster_keywords: 6,
            topic_keywords: 15,
            random_seed: 42,
            extra_stopwords: DEFAULT_EXTRA_STOPWORDS.iter().map(|s| s.to_string()).collect(),
            empty_rows: EmptyRowPolicy::Keep,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Separated from `load` so tests don't
    /// have to mutate the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();
        let empty_rows = match lookup("REVIEWLENS_EMPTY_ROWS").as_deref().map(str::trim) {
            None | Some("") | Some("keep") => EmptyRowPolicy::Keep,
            Some("drop") => EmptyRowPolicy::Drop,
            Some(other) => anyhow::bail!(
                "REVIEWLENS_EMPTY_ROWS must be `keep` or `drop`, got `{other}`"
            ),
        };
        let extra_stopwords = match lookup("REVIEWLENS_EXTRA_STOPWORDS") {
            Some(list) => list
                .split(',')
                .map(|w| w.trim().to_string())
                .filter(|w| !w.is_empty())
                .collect(),
            None => d.extra_stopwords,
        };

        Ok(Self {
            max_df: parse_or(&lookup, "REVIEWLENS_MAX_DF", d.max_df)?,
            min_df: parse_or(&lookup, "REVIEWLENS_MIN_DF", d.min_df)?,
            max_features: parse_or(&lookup, "REVIEWLENS_MAX_FEATURES", d.max_features)?,
            ngram_min: parse_or(&lookup, "REVIEWLENS_NGRAM_MIN", d.ngram_min)?,
            ngram_max: parse_or(&lookup, "REVIEWLENS_NGRAM_MAX", d.ngram_max)?,
            num_clusters: parse_or(&lookup, "REVIEWLENS_CLUSTERS", d.num_clusters)?,
            num_topics: parse_or(&lookup, "REVIEWLENS_TOPICS", d.num_topics)?,
            cluster_keywords: parse_or(&lookup, "REVIEWLENS_CLUSTER_KEYWORDS", d.cluster_keywords)?,
            topic_keywords: parse_or(&lookup, "REVIEWLENS_TOPIC_KEYWORDS", d.topic_keywords)?,
            random_seed: parse_or(&lookup, "REVIEWLENS_SEED", d.random_seed)?,
            extra_stopwords,
            empty_rows,
        })
    }

    /// Reject values no stage could run with.
    /// Call this after command-line overrides have been applied.
    pub fn validate(&self) -> Result<()> {
        self.pipeline_config()
            .vectorizer
            .validate()
            .context("Invalid vocabulary settings")?;
        if self.num_clusters == 0 {
            anyhow::bail!("Number of clusters must be at least 1.");
        }
        if self.num_topics == 0 {
            anyhow::bail!("Number of topics must be at least 1.");
        }
        Ok(())
    }

    /// Convert into the library's pipeline configuration.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            vectorizer: VectorizerParams {
                max_df: self.max_df,
                min_df: self.min_df,
                max_features: self.max_features,
                ngram_range: (self.ngram_min, self.ngram_max),
                stopwords: StopWords::english_with(&self.extra_stopwords),
                empty_rows: self.empty_rows,
            },
            num_clusters: self.num_clusters,
            num_topics: self.num_topics,
            cluster_keywords: self.cluster_keywords,
            topic_keywords: self.topic_keywords,
            random_seed: self.random_seed,
        }
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: `{raw}`")),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("REVIEWLENS_MAX_DF", "0.8"),
            ("REVIEWLENS_CLUSTERS", "3"),
            ("REVIEWLENS_EXTRA_STOPWORDS", "br, shoe ,"),
            ("REVIEWLENS_EMPTY_ROWS", "drop"),
        ]))
        .unwrap();
        assert_eq!(config.max_df, 0.8);
        assert_eq!(config.num_clusters, 3);
        assert_eq!(config.extra_stopwords, vec!["br", "shoe"]);
        assert_eq!(config.empty_rows, EmptyRowPolicy::Drop);
    }

    #[test]
    fn test_invalid_number_is_an_error() {
        let err = Config::from_lookup(lookup(&[("REVIEWLENS_TOPICS", "-1")])).unwrap_err();
        assert!(err.to_string().contains("REVIEWLENS_TOPICS"));
    }

    #[test]
    fn test_invalid_policy_is_an_error() {
        assert!(Config::from_lookup(lookup(&[("REVIEWLENS_EMPTY_ROWS", "maybe")])).is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_bounds() {
        let config = Config {
            min_df: 0.5,
            max_df: 0.4,
            ..Config::default()
        };
        assert!(config.validate().is_err());
        let config = Config {
            ngram_min: 2,
            ngram_max: 1,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_uses_vectorizer_rules() {
        let config = Config {
            max_df: 1.5,
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("vocabulary settings"));
        assert!(format!("{err:#}").contains("max_df=1.5"));

        let config = Config {
            max_features: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
        let config = Config {
            num_topics: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_pipeline_config_includes_domain_stopwords() {
        let pc = Config::default().pipeline_config();
        assert!(pc.vectorizer.stopwords.contains("watch"));
        assert!(pc.vectorizer.stopwords.contains("the"));
        assert_eq!(pc.vectorizer.ngram_range, (1, 1));
        assert_eq!(pc.random_seed, 42);
    }
}
