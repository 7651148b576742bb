// Stopword sets.
//
// Review corpora carry two kinds of noise: generic English function words and
// domain terms that appear in nearly every review (the `br` left over from
// HTML line breaks, or the product category itself). Both are filtered out
// before stemming.

use std::collections::HashSet;

use stop_words::{get, LANGUAGE};

/// Domain noise terms added to the English list by default.
pub const DEFAULT_EXTRA_STOPWORDS: &[&str] = &["br", "watch"];

/// A set of lower-cased tokens that are always discarded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StopWords {
    words: HashSet<String>,
}

impl StopWords {
    /// Build a set from arbitrary words. Entries are lower-cased and trimmed;
    /// blank entries are ignored.
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        Self { words }
    }

    /// The English list from the `stop-words` crate plus `extra` domain terms.
    pub fn english_with<S: AsRef<str>>(extra: &[S]) -> Self {
        let mut set = Self::new(get(LANGUAGE::English));
        set.extend(extra);
        set
    }

    /// The English list plus the default domain terms.
    pub fn default_english() -> Self {
        Self::english_with(DEFAULT_EXTRA_STOPWORDS)
    }

    pub fn extend<S: AsRef<str>>(&mut self, extra: &[S]) {
        for word in extra {
            let word = word.as_ref().trim().to_lowercase();
            if !word.is_empty() {
                self.words.insert(word);
            }
        }
    }

    /// Membership test on an already lower-cased token.
    pub fn contains(&self, token: &str) -> bool {
        self.words.contains(token)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_lowercases_and_skips_blank() {
        let sw = StopWords::new(["The", " I ", ""]);
        assert_eq!(sw.len(), 2);
        assert!(sw.contains("the"));
        assert!(sw.contains("i"));
    }

    #[test]
    fn test_default_english_has_domain_terms() {
        let sw = StopWords::default_english();
        assert!(sw.contains("the"));
        assert!(sw.contains("br"));
        assert!(sw.contains("watch"));
    }
}
