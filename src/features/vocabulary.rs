// Vocabulary construction.
//
// Every document is normalized into stems, stems are joined into n-grams, and
// each candidate term is counted twice: how many documents contain it
// (document frequency) and how often it occurs overall (corpus frequency).
// Terms outside the document-frequency bounds are rejected; if more than
// `max_features` remain, the most frequent ones win. Kept terms are indexed
// in lexical order so indices never depend on hash iteration order.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::document::Document;
use crate::error::{PipelineError, Result};
use crate::text::stopwords::StopWords;
use crate::text::traits::Normalizer;

/// What to do with documents left without any vocabulary term.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyRowPolicy {
    /// Keep them as all-zero rows.
    #[default]
    Keep,
    /// Leave them out of the matrix entirely.
    Drop,
}

/// Parameters for vocabulary admission and weighting.
#[derive(Debug, Clone)]
pub struct VectorizerParams {
    /// Upper document-frequency fraction (inclusive)
    pub max_df: f64,
    /// Lower document-frequency fraction (inclusive)
    pub min_df: f64,
    /// Vocabulary size cap
    pub max_features: usize,
    /// Smallest and largest n-gram window, in stems
    pub ngram_range: (usize, usize),
    /// Tokens (and stems) that are always discarded
    pub stopwords: StopWords,
    pub empty_rows: EmptyRowPolicy,
}

impl Default for VectorizerParams {
    fn default() -> Self {
        Self {
            max_df: 1.0,
            min_df: 0.0,
            max_features: 1000,
            ngram_range: (1, 1),
            stopwords: StopWords::default_english(),
            empty_rows: EmptyRowPolicy::Keep,
        }
    }
}

impl VectorizerParams {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.min_df) || !(0.0..=1.0).contains(&self.max_df) {
            return Err(PipelineError::InvalidParameter(format!(
                "document-frequency bounds must lie in [0, 1], got min_df={} max_df={}",
                self.min_df, self.max_df
            )));
        }
        if self.min_df > self.max_df {
            return Err(PipelineError::InvalidParameter(format!(
                "min_df ({}) is greater than max_df ({})",
                self.min_df, self.max_df
            )));
        }
        if self.max_features == 0 {
            return Err(PipelineError::InvalidParameter(
                "max_features must be at least 1".to_string(),
            ));
        }
        let (lo, hi) = self.ngram_range;
        if lo == 0 || lo > hi {
            return Err(PipelineError::InvalidParameter(format!(
                "ngram_range must satisfy 1 <= min <= max, got ({lo}, {hi})"
            )));
        }
        Ok(())
    }
}

/// The accepted terms, each with a stable index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vocabulary {
    terms: Vec<String>,
    /// Number of documents containing each term, aligned with `terms`
    document_frequency: Vec<usize>,
    /// Corpus size the frequencies were measured over
    n_documents: usize,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl Vocabulary {
    /// Build from `(term, document_frequency)` pairs. Terms are sorted
    /// lexically and indexed in that order.
    pub fn from_terms(mut entries: Vec<(String, usize)>, n_documents: usize) -> Self {
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries.dedup_by(|a, b| a.0 == b.0);
        let index = entries
            .iter()
            .enumerate()
            .map(|(i, (term, _))| (term.clone(), i))
            .collect();
        let (terms, document_frequency) = entries.into_iter().unzip();
        Self {
            terms,
            document_frequency,
            n_documents,
            index,
        }
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn term(&self, index: usize) -> Option<&str> {
        self.terms.get(index).map(String::as_str)
    }

    pub fn index_of(&self, term: &str) -> Option<usize> {
        // `index` is skipped during serde, so fall back to a search after a
        // deserialize round-trip.
        if self.index.is_empty() && !self.terms.is_empty() {
            return self.terms.binary_search_by(|t| t.as_str().cmp(term)).ok();
        }
        self.index.get(term).copied()
    }

    pub fn contains(&self, term: &str) -> bool {
        self.index_of(term).is_some()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn n_documents(&self) -> usize {
        self.n_documents
    }

    /// Number of documents containing the term at `index`.
    pub fn document_frequency(&self, index: usize) -> usize {
        self.document_frequency.get(index).copied().unwrap_or(0)
    }

    /// Fraction of documents containing the term at `index`.
    pub fn document_fraction(&self, index: usize) -> f64 {
        if self.n_documents == 0 {
            0.0
        } else {
            self.document_frequency(index) as f64 / self.n_documents as f64
        }
    }

    /// Every `step`-th term among the first `limit`, for a quick look at
    /// what the vocabulary contains.
    pub fn sample(&self, step: usize, limit: usize) -> Vec<&str> {
        self.terms
            .iter()
            .take(limit)
            .step_by(step.max(1))
            .map(String::as_str)
            .collect()
    }
}

/// Normalize a document and expand its stems into n-gram terms.
///
/// Stems that are themselves stopwords are dropped before the n-grams are
/// formed, so a suffix-stripped form like "have" cannot sneak back in.
pub fn analyze(text: &str, normalizer: &dyn Normalizer, params: &VectorizerParams) -> Vec<String> {
    let stems: Vec<String> = normalizer
        .normalize(text, &params.stopwords)
        .into_iter()
        .filter(|stem| !params.stopwords.contains(stem))
        .collect();
    ngrams(&stems, params.ngram_range)
}

/// All contiguous windows of `lo..=hi` stems, joined by a single space.
/// Shorter windows come first, then by position.
pub fn ngrams(stems: &[String], (lo, hi): (usize, usize)) -> Vec<String> {
    if lo == 1 && hi == 1 {
        return stems.to_vec();
    }
    let mut out = Vec::new();
    for n in lo.max(1)..=hi {
        if n > stems.len() {
            break;
        }
        out.extend(stems.windows(n).map(|w| w.join(" ")));
    }
    out
}

/// Per-document term counts, ordered by term.
pub type TermCounts = BTreeMap<String, usize>;

/// Count terms in each analyzed document.
pub fn count_terms(analyzed: &[Vec<String>]) -> Vec<TermCounts> {
    analyzed
        .iter()
        .map(|terms| {
            let mut counts = TermCounts::new();
            for term in terms {
                *counts.entry(term.clone()).or_insert(0) += 1;
            }
            counts
        })
        .collect()
}

/// Select the vocabulary from per-document counts.
pub fn select_vocabulary(counts: &[TermCounts], params: &VectorizerParams) -> Result<Vocabulary> {
    let n_documents = counts.len();

    // term -> (document frequency, corpus frequency)
    let mut stats: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for doc in counts {
        for (term, &count) in doc {
            let entry = stats.entry(term.as_str()).or_insert((0, 0));
            entry.0 += 1;
            entry.1 += count;
        }
    }
    let candidates = stats.len();

    // Both bounds are inclusive on the document fraction itself
    let n = n_documents as f64;
    let mut admitted: Vec<(&str, usize, usize)> = stats
        .into_iter()
        .filter(|(_, (df, _))| {
            let frac = *df as f64 / n;
            frac >= params.min_df && frac <= params.max_df
        })
        .map(|(term, (df, tf))| (term, df, tf))
        .collect();

    if admitted.is_empty() {
        return Err(PipelineError::EmptyVocabulary {
            documents: n_documents,
            candidates,
        });
    }

    if admitted.len() > params.max_features {
        // Highest corpus frequency first, lexical order among equals
        admitted.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| a.0.cmp(b.0)));
        admitted.truncate(params.max_features);
    }

    debug!(
        candidates,
        admitted = admitted.len(),
        min_df = params.min_df,
        max_df = params.max_df,
        "Applied document-frequency bounds"
    );

    let entries = admitted
        .into_iter()
        .map(|(term, df, _)| (term.to_string(), df))
        .collect();
    Ok(Vocabulary::from_terms(entries, n_documents))
}

/// Analyze and count a whole corpus.
pub fn count_corpus(
    documents: &[Document],
    normalizer: &dyn Normalizer,
    params: &VectorizerParams,
) -> Vec<TermCounts> {
    let analyzed: Vec<Vec<String>> = documents
        .iter()
        .map(|doc| analyze(&doc.text, normalizer, params))
        .collect();
    count_terms(&analyzed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stems(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn counts(docs: &[&[&str]]) -> Vec<TermCounts> {
        let analyzed: Vec<Vec<String>> = docs.iter().map(|d| stems(d)).collect();
        count_terms(&analyzed)
    }

    fn params() -> VectorizerParams {
        VectorizerParams {
            stopwords: StopWords::default(),
            ..Default::default()
        }
    }

    #[test]
    fn test_ngrams_unigram_passthrough() {
        let s = stems(&["band", "broke", "again"]);
        assert_eq!(ngrams(&s, (1, 1)), s);
    }

    #[test]
    fn test_ngrams_range() {
        let s = stems(&["band", "broke", "again"]);
        assert_eq!(
            ngrams(&s, (1, 2)),
            vec!["band", "broke", "again", "band broke", "broke again"]
        );
        assert_eq!(ngrams(&s, (3, 4)), vec!["band broke again"]);
    }

    #[test]
    fn test_max_df_rejects_ubiquitous_terms() {
        let c = counts(&[&["love", "band"], &["love", "strap"], &["love"]]);
        let p = VectorizerParams {
            max_df: 0.9,
            ..params()
        };
        let vocab = select_vocabulary(&c, &p).unwrap();
        assert_eq!(vocab.terms(), &["band".to_string(), "strap".to_string()]);
    }

    #[test]
    fn test_min_df_rejects_rare_terms() {
        let c = counts(&[&["love", "band"], &["love", "strap"], &["band"]]);
        let p = VectorizerParams {
            min_df: 0.5,
            ..params()
        };
        let vocab = select_vocabulary(&c, &p).unwrap();
        assert_eq!(vocab.terms(), &["band".to_string(), "love".to_string()]);
        assert_eq!(vocab.document_frequency(0), 2);
    }

    #[test]
    fn test_max_features_keeps_most_frequent_with_lexical_ties() {
        let c = counts(&[&["b", "b", "c", "a"], &["d", "c"]]);
        let p = VectorizerParams {
            max_features: 2,
            ..params()
        };
        let vocab = select_vocabulary(&c, &p).unwrap();
        // b and c both occur twice; a and d once
        assert_eq!(vocab.terms(), &["b".to_string(), "c".to_string()]);

        let p = VectorizerParams {
            max_features: 3,
            ..params()
        };
        let vocab = select_vocabulary(&c, &p).unwrap();
        assert_eq!(vocab.terms(), &["a".to_string(), "b".to_string(), "c".to_string()]);
    }

    #[test]
    fn test_empty_vocabulary_error() {
        let c = counts(&[&["love"], &["love"]]);
        let p = VectorizerParams {
            max_df: 0.5,
            ..params()
        };
        let err = select_vocabulary(&c, &p).unwrap_err();
        assert_eq!(
            err,
            PipelineError::EmptyVocabulary {
                documents: 2,
                candidates: 1
            }
        );
    }

    #[test]
    fn test_index_of_after_serde_round_trip() {
        let vocab = Vocabulary::from_terms(
            vec![("strap".to_string(), 1), ("band".to_string(), 2)],
            3,
        );
        let json = serde_json::to_string(&vocab).unwrap();
        let back: Vocabulary = serde_json::from_str(&json).unwrap();
        assert_eq!(back.index_of("strap"), Some(1));
        assert_eq!(back.index_of("missing"), None);
    }

    #[test]
    fn test_sample_steps_through_terms() {
        let entries = (0..10).map(|i| (format!("t{i}"), 1)).collect();
        let vocab = Vocabulary::from_terms(entries, 1);
        assert_eq!(vocab.sample(5, 100), vec!["t0", "t5"]);
        assert_eq!(vocab.sample(2, 4), vec!["t0", "t2"]);
    }

    #[test]
    fn test_validate_rejects_bad_ranges() {
        assert!(VectorizerParams { min_df: 0.6, max_df: 0.5, ..params() }.validate().is_err());
        assert!(VectorizerParams { max_df: 1.5, ..params() }.validate().is_err());
        assert!(VectorizerParams { ngram_range: (2, 1), ..params() }.validate().is_err());
        assert!(VectorizerParams { ngram_range: (0, 1), ..params() }.validate().is_err());
        assert!(VectorizerParams { max_features: 0, ..params() }.validate().is_err());
        assert!(params().validate().is_ok());
    }
}
