// ReviewLens: clusters and topics for customer review corpora
//
// This is the library root. Each module corresponds to a stage of the
// text-to-structure pipeline, in the order data flows through them.

pub mod clustering;
pub mod config;
pub mod document;
pub mod error;
pub mod features;
pub mod ingest;
pub mod output;
pub mod pipeline;
pub mod report;
pub mod text;
pub mod topics;

pub use error::PipelineError;
