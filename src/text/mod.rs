// Text normalization: tokenizing, filtering and stemming review text.

pub mod stemmer;
pub mod stopwords;
pub mod traits;
