use crate::{scoring, DocId, IndexError, Posting, Result};
use std::collections::BTreeMap;

/// Display fields of a document, as produced by markup extraction and URL mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentInput {
    pub url: String,
    pub title: Option<String>,
    pub description: String,
}

impl DocumentInput {
    /// First field whose UTF-8 length does not fit a 16-bit metadata length.
    pub fn oversized_field(&self) -> Option<(&'static str, usize)> {
        [
            ("url", self.url.len()),
            ("title", self.title.as_deref().map_or(0, str::len)),
            ("description", self.description.len()),
        ]
        .into_iter()
        .find(|&(_, len)| len > u16::MAX as usize)
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    pub id: DocId,
    pub url: String,
    pub title: Option<String>,
    pub description: String,
    pub term_counts: BTreeMap<String, u32>,
    /// TF-IDF vector length; zero until the corpus is finished.
    pub norm: f32,
}

/// Folds per-document term multisets into corpus-wide posting lists.
///
/// Terms live in a `BTreeMap`, so iteration is in byte-wise UTF-8 order.
/// Documents get ids in the order they are added and every posting list is
/// appended to in that same order, so postings are ascending by doc id.
#[derive(Debug, Default)]
pub struct PostingAccumulator {
    postings: BTreeMap<String, Vec<Posting>>,
    documents: Vec<Document>,
}

impl PostingAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the next document and its terms; returns the assigned id.
    pub fn add_document<I>(&mut self, input: DocumentInput, terms: I) -> Result<DocId>
    where
        I: IntoIterator<Item = String>,
    {
        let doc_id = DocId::try_from(self.documents.len()).map_err(|_| IndexError::OffsetOverflow {
            artifact: "document id",
            offset: self.documents.len() as u64,
        })?;

        let mut term_counts: BTreeMap<String, u32> = BTreeMap::new();
        for term in terms {
            *term_counts.entry(term).or_insert(0) += 1;
        }
        for (term, &frequency) in &term_counts {
            self.postings
                .entry(term.clone())
                .or_default()
                .push(Posting { doc_id, frequency });
        }

        self.documents.push(Document {
            id: doc_id,
            url: input.url,
            title: input.title,
            description: input.description,
            term_counts,
            norm: 0.0,
        });
        Ok(doc_id)
    }

    pub fn num_docs(&self) -> usize {
        self.documents.len()
    }

    pub fn num_terms(&self) -> usize {
        self.postings.len()
    }

    /// Freeze the corpus and compute every document norm.
    pub fn finish(self) -> InvertedIndex {
        let PostingAccumulator { postings, mut documents } = self;
        {
            let df = scoring::document_frequencies(&postings);
            scoring::assign_norms(&mut documents, &df);
        }
        InvertedIndex { postings, documents }
    }
}

/// Frozen corpus: sorted dictionary with posting lists, and scored documents.
#[derive(Debug)]
pub struct InvertedIndex {
    postings: BTreeMap<String, Vec<Posting>>,
    documents: Vec<Document>,
}

impl InvertedIndex {
    pub fn num_docs(&self) -> usize {
        self.documents.len()
    }

    pub fn num_terms(&self) -> usize {
        self.postings.len()
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Terms with their posting lists, in dictionary order.
    pub fn terms(&self) -> impl Iterator<Item = (&str, &[Posting])> {
        self.postings.iter().map(|(t, p)| (t.as_str(), p.as_slice()))
    }

    pub fn postings(&self, term: &str) -> Option<&[Posting]> {
        self.postings.get(term).map(Vec::as_slice)
    }

    pub fn document_frequency(&self, term: &str) -> u32 {
        self.postings.get(term).map_or(0, |p| p.len() as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn doc(url: &str) -> DocumentInput {
        DocumentInput { url: url.into(), ..Default::default() }
    }

    #[test]
    fn ids_are_dense_and_sequential() {
        let mut acc = PostingAccumulator::new();
        assert_eq!(acc.add_document(doc("a"), terms(&["x"])).unwrap(), 0);
        assert_eq!(acc.add_document(doc("b"), Vec::new()).unwrap(), 1);
        assert_eq!(acc.add_document(doc("c"), terms(&["x"])).unwrap(), 2);
        let index = acc.finish();
        let ids: Vec<DocId> = index.documents().iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn one_posting_per_document_with_counts() {
        let mut acc = PostingAccumulator::new();
        acc.add_document(doc("a"), terms(&["ab", "cd", "ab"])).unwrap();
        acc.add_document(doc("b"), terms(&["ab"])).unwrap();
        let index = acc.finish();
        assert_eq!(
            index.postings("ab").unwrap(),
            &[Posting { doc_id: 0, frequency: 2 }, Posting { doc_id: 1, frequency: 1 }]
        );
        assert_eq!(index.document_frequency("cd"), 1);
        assert_eq!(index.document_frequency("zz"), 0);
        assert_eq!(index.documents()[0].term_counts.get("ab"), Some(&2));
    }

    #[test]
    fn terms_iterate_in_byte_order() {
        let mut acc = PostingAccumulator::new();
        acc.add_document(doc("a"), terms(&["検索", "b", "A", "ab"])).unwrap();
        let index = acc.finish();
        let order: Vec<&str> = index.terms().map(|(t, _)| t).collect();
        assert_eq!(order, vec!["A", "ab", "b", "検索"]);
    }

    #[test]
    fn reports_fields_too_long_for_metadata() {
        let fits = DocumentInput { url: "u".repeat(65_535), title: Some("t".into()), description: String::new() };
        assert_eq!(fits.oversized_field(), None);
        let long_title = DocumentInput { title: Some("題".repeat(30_000)), ..doc("a") };
        assert_eq!(long_title.oversized_field(), Some(("title", 90_000)));
    }

    #[test]
    fn empty_corpus_finishes_cleanly() {
        let index = PostingAccumulator::new().finish();
        assert_eq!(index.num_docs(), 0);
        assert_eq!(index.num_terms(), 0);
    }
}
