use crate::{IndexError, Result};
use lazy_static::lazy_static;
use regex::Regex;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

lazy_static! {
    // ASCII word runs, or runs of non-ASCII letters/digits.
    static ref RUN_RE: Regex =
        Regex::new(r"[A-Za-z0-9][A-Za-z0-9_']*|[\p{L}\p{N}&&[^\x00-\x7F]]+").expect("valid regex");
}

/// Coarse part-of-speech class of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartOfSpeech {
    Noun,
    Verb,
    Adjective,
    Adverb,
    Interjection,
    Other,
}

impl PartOfSpeech {
    /// Map the top-level IPADIC part-of-speech tag.
    pub fn from_ipadic(tag: &str) -> Self {
        match tag {
            "名詞" => PartOfSpeech::Noun,
            "動詞" => PartOfSpeech::Verb,
            "形容詞" => PartOfSpeech::Adjective,
            "副詞" => PartOfSpeech::Adverb,
            "感動詞" => PartOfSpeech::Interjection,
            _ => PartOfSpeech::Other,
        }
    }

    /// Content-word classes contribute index terms; everything else is dropped.
    pub fn is_indexable(self) -> bool {
        !matches!(self, PartOfSpeech::Other)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedToken {
    pub surface: String,
    pub pos: PartOfSpeech,
    /// Dictionary form, when the analyzer knows one.
    pub lemma: Option<String>,
}

impl TaggedToken {
    pub fn new(surface: impl Into<String>, pos: PartOfSpeech) -> Self {
        Self { surface: surface.into(), pos, lemma: None }
    }

    pub fn with_lemma(mut self, lemma: impl Into<String>) -> Self {
        self.lemma = Some(lemma.into());
        self
    }
}

/// Morphological analysis of one document's indexable text.
///
/// Malformed text yields an empty token list, not an error. Errors are
/// reserved for the analyzer itself being unusable.
pub trait Tokenizer {
    fn tokenize(&self, text: &str) -> Result<Vec<TaggedToken>>;

    /// Fail fast when the analyzer cannot run at all, before any document is read.
    fn ensure_available(&self) -> Result<()> {
        Ok(())
    }
}

/// Dependency-free fallback: ASCII word runs and non-ASCII letter runs,
/// every run tagged as a noun without a lemma.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScriptRunTokenizer;

impl Tokenizer for ScriptRunTokenizer {
    fn tokenize(&self, text: &str) -> Result<Vec<TaggedToken>> {
        Ok(RUN_RE
            .find_iter(text)
            .map(|m| TaggedToken::new(m.as_str(), PartOfSpeech::Noun))
            .collect())
    }
}

/// Runs an external `mecab` process and parses its IPADIC-format output.
///
/// Each call to [`Tokenizer::tokenize`] starts a fresh process, so a build
/// pays one process spawn per document.
#[derive(Debug, Clone)]
pub struct MecabTokenizer {
    program: PathBuf,
    dictionary: Option<PathBuf>,
}

impl Default for MecabTokenizer {
    fn default() -> Self {
        Self { program: PathBuf::from("mecab"), dictionary: None }
    }
}

impl MecabTokenizer {
    pub fn new(dictionary: Option<PathBuf>) -> Self {
        Self { dictionary, ..Self::default() }
    }

    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }
}

impl Tokenizer for MecabTokenizer {
    fn tokenize(&self, text: &str) -> Result<Vec<TaggedToken>> {
        let mut cmd = Command::new(&self.program);
        if let Some(dic) = &self.dictionary {
            cmd.arg("-d").arg(dic);
        }
        let mut child = cmd
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| IndexError::Tokenizer(format!("failed to start {}: {e}", self.program.display())))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| IndexError::Tokenizer("mecab stdin unavailable".into()))?;
        // Feed stdin from a helper thread so a full stdout pipe cannot deadlock us.
        let input = text.to_owned();
        let writer = std::thread::spawn(move || stdin.write_all(input.as_bytes()));

        let output = child.wait_with_output()?;
        writer
            .join()
            .map_err(|_| IndexError::Tokenizer("mecab stdin writer panicked".into()))??;

        if !output.status.success() {
            return Err(IndexError::Tokenizer(format!(
                "mecab exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(parse_mecab_output(&String::from_utf8_lossy(&output.stdout)))
    }

    fn ensure_available(&self) -> Result<()> {
        self.tokenize("").map(|_| ())
    }
}

/// Parse MeCab's default output: `surface\tPOS,sub1,sub2,sub3,ctype,cform,base,...`
/// lines terminated by `EOS`. The base form (seventh feature) becomes the lemma
/// unless it is the `*` placeholder.
pub fn parse_mecab_output(output: &str) -> Vec<TaggedToken> {
    let mut tokens = Vec::new();
    for line in output.lines() {
        if line.is_empty() || line == "EOS" {
            continue;
        }
        let Some((surface, features)) = line.split_once('\t') else {
            continue;
        };
        let fields: Vec<&str> = features.split(',').collect();
        let pos = PartOfSpeech::from_ipadic(fields.first().copied().unwrap_or(""));
        let mut token = TaggedToken::new(surface, pos);
        if let Some(base) = fields.get(6).filter(|b| **b != "*" && !b.is_empty()) {
            token = token.with_lemma(*base);
        }
        tokens.push(token);
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_runs_split_ascii_from_kana() {
        let toks = ScriptRunTokenizer.tokenize("Rustで検索 engine, v2!").unwrap();
        let words: Vec<&str> = toks.iter().map(|t| t.surface.as_str()).collect();
        assert_eq!(words, vec!["Rust", "で検索", "engine", "v2"]);
        assert!(toks.iter().all(|t| t.pos == PartOfSpeech::Noun && t.lemma.is_none()));
    }

    #[test]
    fn parses_ipadic_lines() {
        let out = "走っ\t動詞,自立,*,*,五段・ラ行,連用タ接続,走る,ハシッ,ハシッ\n\
                   た\t助動詞,*,*,*,特殊・タ,基本形,た,タ,タ\n\
                   Rust\t名詞,固有名詞,組織,*,*,*,*\n\
                   EOS\n";
        let toks = parse_mecab_output(out);
        assert_eq!(toks.len(), 3);
        assert_eq!(toks[0], TaggedToken::new("走っ", PartOfSpeech::Verb).with_lemma("走る"));
        assert_eq!(toks[1].pos, PartOfSpeech::Other);
        assert_eq!(toks[2], TaggedToken::new("Rust", PartOfSpeech::Noun));
    }

    #[test]
    fn skips_lines_without_features() {
        assert!(parse_mecab_output("garbage\nEOS\n\n").is_empty());
    }

    #[test]
    fn missing_mecab_binary_is_a_tokenizer_error() {
        let t = MecabTokenizer::default().with_program("/nonexistent/mecab-binary");
        assert!(matches!(t.tokenize("テスト"), Err(IndexError::Tokenizer(_))));
        assert!(matches!(t.ensure_available(), Err(IndexError::Tokenizer(_))));
    }

    #[test]
    fn builtin_tokenizer_is_always_available() {
        assert!(ScriptRunTokenizer.ensure_available().is_ok());
    }
}
