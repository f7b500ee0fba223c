//! Pridesift - PRIDE Archive dataset screener
//!
//! Retrieves and filters proteomics dataset metadata to find immunopeptidomics
//! studies on cancer samples acquired on timsTOF instruments.
//!
//! # Architecture
//!
//! Two pipelines share one classification vocabulary:
//! 1. Bulk files: format detection, tolerant loading (JSON, CSV, TSV),
//!    field normalization, classification, TSV output
//! 2. Live queries: paginated PRIDE Archive requests, classification, TSV/JSON output
//!
//! # Example
//!
//! ```no_run
//! use pridesift::classify::RelevanceClassifier;
//! use pridesift::loader::load_json;
//! use pridesift::normalize::FieldNormalizer;
//!
//! let loaded = load_json("pride_datasets.json").unwrap();
//! let normalizer = FieldNormalizer::default();
//! let classifier = RelevanceClassifier::ultra_strict();
//!
//! for raw in &loaded.records {
//!     let record = normalizer.normalize(raw);
//!     let verdict = classifier.classify_record(&record);
//!     if verdict.is_accepted() {
//!         println!("{}", record.get(pridesift::Field::Accession));
//!     }
//! }
//! ```

pub use error::Error;
pub use record::{Field, RawRecord, Record};

// Relevance classification (predicates, vocabulary, verdicts)
pub mod classify;

// Input format sniffing
pub mod format;

// Live PRIDE Archive queries
pub mod live;

// Bulk record loaders
pub mod loader;

// Source key to canonical field mapping
pub mod normalize;

// End-to-end runs used by the CLI
pub mod pipeline;

// Canonical record model
pub mod record;

// Streaming scanner for malformed JSON exports
pub mod scanner;

// TSV output
pub mod table;

mod error {
    use std::path::PathBuf;

    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum Error {
        #[error("IO error: {0}")]
        Io(#[from] std::io::Error),

        #[error("CSV error: {0}")]
        Csv(#[from] csv::Error),

        #[error("JSON error: {0}")]
        Json(#[from] serde_json::Error),

        #[error("Pattern error: {0}")]
        Pattern(#[from] regex::Error),

        #[error("Vocabulary error: {0}")]
        Vocabulary(String),

        #[error("HTTP error: {0}")]
        Http(String),

        #[error("HTTP status {0}")]
        HttpStatus(u16),

        #[error("Unknown input format for {}", path.display())]
        UnknownFormat { path: PathBuf, preview: Vec<String> },

        #[error("No datasets matched out of {total} processed")]
        NoMatches { total: usize },
    }

    impl From<ureq::Error> for Error {
        fn from(e: ureq::Error) -> Self {
            match e {
                ureq::Error::Status(code, _) => Error::HttpStatus(code),
                ureq::Error::Transport(t) => Error::Http(t.to_string()),
            }
        }
    }
}
