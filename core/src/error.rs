use thiserror::Error;

use crate::DocId;

/// Errors raised while building, writing or reading an index.
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Term {term:?} encodes to {len} bytes, dictionary entries are limited to 255")]
    TermTooLong { term: String, len: usize },

    #[error("Document {doc_id} {field} is {len} bytes, the limit is 65535")]
    FieldTooLong {
        doc_id: DocId,
        field: &'static str,
        len: usize,
    },

    #[error("{artifact} offset {offset} does not fit in 32 bits")]
    OffsetOverflow { artifact: &'static str, offset: u64 },

    #[error("Malformed {artifact}: {reason}")]
    Malformed {
        artifact: &'static str,
        reason: String,
    },

    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, IndexError>;

impl IndexError {
    pub(crate) fn malformed(artifact: &'static str, reason: impl Into<String>) -> Self {
        IndexError::Malformed {
            artifact,
            reason: reason.into(),
        }
    }
}
