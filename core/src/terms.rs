//! Term shaping: turns tagged tokens into the multiset of index terms for a document.
//!
//! Single-character and all-ASCII forms are kept whole (lower-cased). Anything
//! else is split into overlapping two-character windows, which gives scripts
//! without word-separating whitespace an approximate n-gram index.

use crate::tokenizer::TaggedToken;

/// Extract the index terms of one document. Repetitions are preserved.
pub fn extract_terms(tokens: &[TaggedToken]) -> Vec<String> {
    let mut terms = Vec::new();
    for token in tokens.iter().filter(|t| t.pos.is_indexable()) {
        shape_into(&token.surface, &mut terms);
        if let Some(lemma) = token.lemma.as_deref() {
            if lemma != token.surface {
                shape_into(lemma, &mut terms);
            }
        }
    }
    terms
}

/// Append the terms for a single surface or dictionary form.
pub fn shape_into(form: &str, out: &mut Vec<String>) {
    if form.is_empty() {
        return;
    }
    let chars: Vec<char> = form.chars().collect();
    if chars.len() == 1 || form.is_ascii() {
        out.push(form.to_lowercase());
        return;
    }
    out.extend(chars.windows(2).map(|pair| pair.iter().collect::<String>()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::PartOfSpeech;

    fn shape(form: &str) -> Vec<String> {
        let mut out = Vec::new();
        shape_into(form, &mut out);
        out
    }

    #[test]
    fn ascii_is_kept_whole_and_lowercased() {
        assert_eq!(shape("Tokio"), vec!["tokio"]);
        assert_eq!(shape("HTTP2"), vec!["http2"]);
    }

    #[test]
    fn single_non_ascii_char_is_one_term() {
        assert_eq!(shape("猫"), vec!["猫"]);
        assert_eq!(shape("Ä"), vec!["ä"]);
    }

    #[test]
    fn multibyte_forms_become_bigrams() {
        assert_eq!(shape("検索エンジン"), vec!["検索", "索エ", "エン", "ンジ", "ジン"]);
        // Mixed scripts are not ASCII, so they are windowed too.
        assert_eq!(shape("Rust製"), vec!["Ru", "us", "st", "t製"]);
    }

    #[test]
    fn empty_form_yields_nothing() {
        assert!(shape("").is_empty());
    }

    #[test]
    fn filters_by_part_of_speech() {
        let tokens = vec![
            TaggedToken::new("検索", PartOfSpeech::Noun),
            TaggedToken::new("を", PartOfSpeech::Other),
            TaggedToken::new("wow", PartOfSpeech::Interjection),
        ];
        assert_eq!(extract_terms(&tokens), vec!["検索", "wow"]);
    }

    #[test]
    fn differing_lemma_adds_its_terms() {
        let tokens = vec![TaggedToken::new("走っ", PartOfSpeech::Verb).with_lemma("走る")];
        assert_eq!(extract_terms(&tokens), vec!["走っ", "走る"]);
    }

    #[test]
    fn identical_lemma_is_not_repeated() {
        let tokens = vec![TaggedToken::new("Runs", PartOfSpeech::Verb).with_lemma("Runs")];
        assert_eq!(extract_terms(&tokens), vec!["runs"]);
    }

    #[test]
    fn repeated_tokens_repeat_terms() {
        let tokens = vec![
            TaggedToken::new("ab", PartOfSpeech::Noun),
            TaggedToken::new("AB", PartOfSpeech::Noun),
        ];
        assert_eq!(extract_terms(&tokens), vec!["ab", "ab"]);
    }
}
