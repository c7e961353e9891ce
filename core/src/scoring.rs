//! TF-IDF document norms.
//!
//! `idf(t) = ln(N / df(t))`, `norm(D) = sqrt(sum((tf(t) * idf(t))^2))` with raw
//! counts as tf. Norms need corpus-wide document frequencies, so they are only
//! computed once every document has been accumulated.

use crate::{index::Document, Posting};
use std::collections::BTreeMap;

/// Document frequency of every term: the length of its posting list.
pub fn document_frequencies(postings: &BTreeMap<String, Vec<Posting>>) -> BTreeMap<&str, u32> {
    postings.iter().map(|(t, p)| (t.as_str(), p.len() as u32)).collect()
}

pub fn idf(num_docs: u32, doc_frequency: u32) -> f64 {
    (num_docs as f64 / doc_frequency as f64).ln()
}

/// Euclidean length of a document's tf-idf vector.
pub fn document_norm(term_counts: &BTreeMap<String, u32>, num_docs: u32, df: &BTreeMap<&str, u32>) -> f32 {
    let mut norm_squared = 0.0f64;
    for (term, &tf) in term_counts {
        let Some(&df_t) = df.get(term.as_str()) else { continue };
        if df_t == 0 {
            continue;
        }
        let w = tf as f64 * idf(num_docs, df_t);
        norm_squared += w * w;
    }
    norm_squared.sqrt() as f32
}

pub fn assign_norms(documents: &mut [Document], df: &BTreeMap<&str, u32>) {
    let n = documents.len() as u32;
    for doc in documents.iter_mut() {
        doc.norm = document_norm(&doc.term_counts, n, df);
    }
}

#[cfg(test)]
mod tests {
    use crate::index::{DocumentInput, PostingAccumulator};

    fn add(acc: &mut PostingAccumulator, terms: &[&str]) {
        acc.add_document(DocumentInput::default(), terms.iter().map(|s| s.to_string()))
            .unwrap();
    }

    #[test]
    fn ubiquitous_term_has_zero_weight() {
        let mut acc = PostingAccumulator::new();
        add(&mut acc, &["ab", "ab"]);
        add(&mut acc, &["ab", "cd"]);
        let index = acc.finish();

        assert_eq!(index.document_frequency("ab"), 2);
        assert_eq!(index.document_frequency("cd"), 1);
        let docs = index.documents();
        assert_eq!(docs[0].norm, 0.0);
        assert!((docs[1].norm - std::f32::consts::LN_2).abs() < 1e-6);
    }

    #[test]
    fn term_frequency_scales_linearly() {
        let mut acc = PostingAccumulator::new();
        add(&mut acc, &["x", "x", "x", "y"]);
        add(&mut acc, &["z"]);
        let index = acc.finish();
        let ln2 = 2f64.ln();
        let expected = ((3.0 * ln2).powi(2) + ln2.powi(2)).sqrt() as f32;
        assert!((index.documents()[0].norm - expected).abs() < 1e-6);
    }

    #[test]
    fn document_without_terms_has_zero_norm() {
        let mut acc = PostingAccumulator::new();
        add(&mut acc, &[]);
        add(&mut acc, &["a"]);
        let index = acc.finish();
        assert_eq!(index.documents()[0].norm, 0.0);
        assert!(index.documents().iter().all(|d| d.norm >= 0.0));
    }
}
