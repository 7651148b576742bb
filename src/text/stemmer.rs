// Snowball normalizer: the default Normalizer implementation.
//
// Word boundaries follow the Unicode segmentation rules (UAX #29), so
// punctuation and whitespace never become tokens. Each token is lower-cased,
// checked against the stopword set, required to be purely alphabetic (numbers,
// emoji and contractions like "don't" are dropped), then reduced to its
// Snowball English stem.

use rust_stemmers::{Algorithm, Stemmer};
use unicode_segmentation::UnicodeSegmentation;

use super::stopwords::StopWords;
use super::traits::Normalizer;

/// Normalizer backed by the Snowball stemmer for one language.
pub struct SnowballNormalizer {
    stemmer: Stemmer,
}

impl SnowballNormalizer {
    pub fn new(algorithm: Algorithm) -> Self {
        Self {
            stemmer: Stemmer::create(algorithm),
        }
    }

    pub fn english() -> Self {
        Self::new(Algorithm::English)
    }
}

impl Default for SnowballNormalizer {
    fn default() -> Self {
        Self::english()
    }
}

impl Normalizer for SnowballNormalizer {
    fn normalize(&self, text: &str, stopwords: &StopWords) -> Vec<String> {
        text.unicode_words()
            .map(str::to_lowercase)
            .filter(|token| !stopwords.contains(token))
            .filter(|token| is_alphabetic(token))
            .map(|token| self.stemmer.stem(&token).into_owned())
            .collect()
    }
}

/// True when every character is a letter (and there is at least one).
fn is_alphabetic(token: &str) -> bool {
    !token.is_empty() && token.chars().all(char::is_alphabetic)
}
