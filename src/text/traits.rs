// Normalizer trait: swap-ready abstraction over tokenization and stemming.
//
// The vocabulary builder only sees this trait, so a different language or
// stemming algorithm can be plugged in without touching anything downstream.

use super::stopwords::StopWords;

/// Turns raw text into an ordered sequence of stems.
///
/// Implementations must be deterministic and side-effect free: the same text
/// and stopword set always produce the same output.
pub trait Normalizer: Send + Sync {
    fn normalize(&self, text: &str, stopwords: &StopWords) -> Vec<String>;
}
