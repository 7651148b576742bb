// TF-IDF weighting.
//
// Raw term counts over the vocabulary are scaled by the smoothed inverse
// document frequency
//
//   idf(t) = ln((1 + N) / (1 + df(t))) + 1
//
// and each row is scaled to unit Euclidean length. Rows with no vocabulary
// term stay exactly zero (or are dropped, depending on the empty-row policy).

use ndarray::{Array2, ArrayView1};
use tracing::info;

use super::vocabulary::{count_corpus, select_vocabulary, EmptyRowPolicy, VectorizerParams, Vocabulary};
use crate::document::Document;
use crate::error::{PipelineError, Result};
use crate::text::traits::Normalizer;

/// Documents x terms matrix of non-negative weights. Read-only once built.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedMatrix {
    /// Corpus id of the document behind each row
    doc_ids: Vec<usize>,
    weights: Array2<f64>,
}

impl WeightedMatrix {
    /// Wrap an existing weight matrix. `doc_ids` must have one entry per row.
    pub fn new(doc_ids: Vec<usize>, weights: Array2<f64>) -> Result<Self> {
        if doc_ids.len() != weights.nrows() {
            return Err(PipelineError::InvalidParameter(format!(
                "{} document ids for a matrix with {} rows",
                doc_ids.len(),
                weights.nrows()
            )));
        }
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(PipelineError::InvalidParameter(
                "weights must be finite and non-negative".to_string(),
            ));
        }
        Ok(Self { doc_ids, weights })
    }

    /// Matrix whose rows are numbered 0..n.
    pub fn from_rows(weights: Array2<f64>) -> Result<Self> {
        let ids = (0..weights.nrows()).collect();
        Self::new(ids, weights)
    }

    pub fn n_rows(&self) -> usize {
        self.weights.nrows()
    }

    pub fn n_terms(&self) -> usize {
        self.weights.ncols()
    }

    pub fn doc_ids(&self) -> &[usize] {
        &self.doc_ids
    }

    pub fn weights(&self) -> &Array2<f64> {
        &self.weights
    }

    pub fn row(&self, i: usize) -> ArrayView1<'_, f64> {
        self.weights.row(i)
    }

    pub fn row_norm(&self, i: usize) -> f64 {
        self.weights.row(i).dot(&self.weights.row(i)).sqrt()
    }

    pub fn is_zero_row(&self, i: usize) -> bool {
        self.weights.row(i).iter().all(|&w| w == 0.0)
    }

    /// Number of rows without any retained term.
    pub fn zero_rows(&self) -> usize {
        (0..self.n_rows()).filter(|&i| self.is_zero_row(i)).count()
    }
}

/// Smoothed inverse document frequency for every vocabulary term.
pub fn inverse_document_frequency(vocabulary: &Vocabulary) -> Vec<f64> {
    let n = vocabulary.n_documents() as f64;
    (0..vocabulary.len())
        .map(|i| ((1.0 + n) / (1.0 + vocabulary.document_frequency(i) as f64)).ln() + 1.0)
        .collect()
}

/// Build the vocabulary and the TF-IDF matrix for a corpus.
pub fn build(
    documents: &[Document],
    normalizer: &dyn Normalizer,
    params: &VectorizerParams,
) -> Result<(Vocabulary, WeightedMatrix)> {
    params.validate()?;

    let counts = count_corpus(documents, normalizer, params);
    let vocabulary = select_vocabulary(&counts, params)?;
    let idf = inverse_document_frequency(&vocabulary);

    let mut rows: Vec<(usize, Vec<f64>)> = Vec::with_capacity(documents.len());
    for (doc, doc_counts) in documents.iter().zip(&counts) {
        let mut row = vec![0.0; vocabulary.len()];
        for (term, &count) in doc_counts {
            if let Some(j) = vocabulary.index_of(term) {
                row[j] = count as f64 * idf[j];
            }
        }

        let norm = row.iter().map(|w| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            row.iter_mut().for_each(|w| *w /= norm);
        } else if params.empty_rows == EmptyRowPolicy::Drop {
            continue;
        }
        rows.push((doc.id, row));
    }

    let n_rows = rows.len();
    let n_terms = vocabulary.len();
    let mut doc_ids = Vec::with_capacity(n_rows);
    let mut flat = Vec::with_capacity(n_rows * n_terms);
    for (id, row) in rows {
        doc_ids.push(id);
        flat.extend(row);
    }
    let weights = Array2::from_shape_vec((n_rows, n_terms), flat)
        .map_err(|e| PipelineError::InvalidParameter(format!("matrix shape: {e}")))?;
    let matrix = WeightedMatrix { doc_ids, weights };

    info!(
        documents = documents.len(),
        rows = matrix.n_rows(),
        terms = matrix.n_terms(),
        zero_rows = matrix.zero_rows(),
        "Built TF-IDF matrix"
    );

    Ok((vocabulary, matrix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::stemmer::SnowballNormalizer;
    use crate::text::stopwords::StopWords;
    use ndarray::array;

    fn params() -> VectorizerParams {
        VectorizerParams {
            stopwords: StopWords::new(["i", "this", "the"]),
            max_features: 10,
            ..Default::default()
        }
    }

    #[test]
    fn test_idf_formula() {
        let vocab = Vocabulary::from_terms(vec![("a".to_string(), 1), ("b".to_string(), 4)], 4);
        let idf = inverse_document_frequency(&vocab);
        assert!((idf[0] - ((5.0f64 / 2.0).ln() + 1.0)).abs() < 1e-12);
        assert!((idf[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_rows_are_unit_or_zero() {
        let docs = Document::corpus(&["Love the band", "the, the!", "Band broke again"]);
        let (_, m) = build(&docs, &SnowballNormalizer::english(), &params()).unwrap();
        assert_eq!(m.n_rows(), 3);
        assert!((m.row_norm(0) - 1.0).abs() < 1e-9);
        assert!(m.is_zero_row(1));
        assert!((m.row_norm(2) - 1.0).abs() < 1e-9);
        assert_eq!(m.zero_rows(), 1);
    }

    #[test]
    fn test_drop_policy_removes_empty_rows() {
        let docs = Document::corpus(&["Love the band", "the, the!", "Band broke again"]);
        let p = VectorizerParams {
            empty_rows: EmptyRowPolicy::Drop,
            ..params()
        };
        let (_, m) = build(&docs, &SnowballNormalizer::english(), &p).unwrap();
        assert_eq!(m.n_rows(), 2);
        assert_eq!(m.doc_ids(), &[0, 2]);
    }

    #[test]
    fn test_weights_follow_idf() {
        // "band" is in both documents, "love" in one: love outweighs band in doc 0
        let docs = Document::corpus(&["love band", "band broke"]);
        let (vocab, m) = build(&docs, &SnowballNormalizer::english(), &params()).unwrap();
        let love = vocab.index_of("love").unwrap();
        let band = vocab.index_of("band").unwrap();
        assert!(m.row(0)[love] > m.row(0)[band]);
        assert_eq!(m.row(1)[love], 0.0);
    }

    #[test]
    fn test_new_rejects_mismatched_ids() {
        let w = array![[1.0, 0.0], [0.0, 1.0]];
        assert!(WeightedMatrix::new(vec![0], w.clone()).is_err());
        assert!(WeightedMatrix::new(vec![0, 1], w).is_ok());
        assert!(WeightedMatrix::from_rows(array![[-1.0]]).is_err());
    }
}
