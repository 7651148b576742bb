// Review ingestion: reading a tab-separated export into documents.
//
// Review dumps are large and messy: some lines have the wrong number of
// fields, some rows have no review body. Malformed rows are skipped with a
// warning, rows with a missing or blank column are dropped, and the survivors
// are numbered from 0 in file order.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::document::Document;

/// Column holding the review text in the usual export format.
pub const DEFAULT_COLUMN: &str = "review_body";

/// Load up to `limit` reviews from the `column` of a TSV file with a header row.
pub fn load_reviews(path: &Path, column: &str, limit: usize) -> Result<Vec<Document>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open review file {}", path.display()))?;
    read_reviews(file, column, limit)
        .with_context(|| format!("Failed to read reviews from {}", path.display()))
}

/// Same as `load_reviews`, over any reader.
pub fn read_reviews<R: Read>(reader: R, column: &str, limit: usize) -> Result<Vec<Document>> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .quoting(false)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers().context("Missing header row")?.clone();
    let Some(col) = headers.iter().position(|h| h == column) else {
        anyhow::bail!(
            "Column `{column}` not found. Available columns: {}",
            headers.iter().collect::<Vec<_>>().join(", ")
        );
    };

    let mut documents = Vec::new();
    let mut skipped = 0usize;
    let mut missing = 0usize;

    for (line, record) in rdr.records().enumerate() {
        if documents.len() >= limit {
            break;
        }
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                skipped += 1;
                warn!(line = line + 2, error = %e, "Skipping malformed row");
                continue;
            }
        };
        if record.len() != headers.len() {
            skipped += 1;
            warn!(
                line = line + 2,
                fields = record.len(),
                expected = headers.len(),
                "Skipping row with wrong field count"
            );
            continue;
        }
        match record.get(col).map(str::trim) {
            Some(text) if !text.is_empty() => {
                documents.push(Document::new(documents.len(), text));
            }
            _ => missing += 1,
        }
    }

    info!(
        loaded = documents.len(),
        skipped,
        missing,
        "Loaded reviews"
    );
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TSV: &str = "marketplace\treview_body\tstar_rating\n\
        US\tLove this watch\t5\n\
        US\t\t3\n\
        US\tbroken row\n\
        US\tBand broke after a week\t1\n\
        US\tGreat value\t4\n";

    #[test]
    fn test_reads_column_and_drops_missing() {
        let docs = read_reviews(TSV.as_bytes(), "review_body", 100).unwrap();
        let texts: Vec<&str> = docs.iter().map(|d| d.text.as_str()).collect();
        assert_eq!(texts, vec!["Love this watch", "Band broke after a week", "Great value"]);
        assert_eq!(docs.iter().map(|d| d.id).collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn test_limit() {
        let docs = read_reviews(TSV.as_bytes(), "review_body", 2).unwrap();
        assert_eq!(docs.len(), 2);
    }

    #[test]
    fn test_unknown_column() {
        let err = read_reviews(TSV.as_bytes(), "body", 10).unwrap_err();
        assert!(err.to_string().contains("review_body"));
    }
}
