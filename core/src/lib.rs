pub mod config;
pub mod discover;
pub mod error;
pub mod index;
pub mod markup;
pub mod package;
pub mod persist;
pub mod pipeline;
pub mod reader;
pub mod scoring;
pub mod terms;
pub mod tokenizer;

pub use error::{IndexError, Result};
pub use index::{Document, InvertedIndex, PostingAccumulator};

pub type DocId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Posting {
    pub doc_id: DocId,
    pub frequency: u32, // raw occurrence count of the term in the document
}
