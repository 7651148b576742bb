// Document: one review as handed over by the ingestion collaborator.

/// A single review. The id is its position in the corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: usize,
    pub text: String,
}

impl Document {
    pub fn new(id: usize, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
        }
    }

    /// Build a corpus from raw strings, numbering them in order.
    /// Blank strings are excluded, matching the ingestion contract.
    pub fn corpus<S: AsRef<str>>(texts: &[S]) -> Vec<Document> {
        texts
            .iter()
            .map(|t| t.as_ref())
            .filter(|t| !t.trim().is_empty())
            .enumerate()
            .map(|(id, t)| Document::new(id, t))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corpus_skips_blank_and_renumbers() {
        let docs = Document::corpus(&["first", "   ", "second"]);
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0], Document::new(0, "first"));
        assert_eq!(docs[1], Document::new(1, "second"));
    }
}
