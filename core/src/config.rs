use crate::discover::UrlMapper;
use crate::markup::DEFAULT_DESCRIPTION_CHARS;
use crate::tokenizer::{MecabTokenizer, ScriptRunTokenizer, Tokenizer};
use crate::{IndexError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenizerKind {
    #[default]
    Builtin,
    Mecab,
}

impl FromStr for TokenizerKind {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "builtin" => Ok(TokenizerKind::Builtin),
            "mecab" => Ok(TokenizerKind::Mecab),
            other => Err(IndexError::Config(format!("unknown tokenizer {other:?} (expected builtin or mecab)"))),
        }
    }
}

/// Everything a build needs. Loadable from JSON; absent fields take defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    /// File stem of every artifact, e.g. `nnz` gives `nnz.dict`, `nnz.all.idx`.
    pub name: String,
    pub exclude: Vec<String>,
    pub url_prefixes: BTreeMap<String, String>,
    pub default_url_prefix: String,
    pub tokenizer: TokenizerKind,
    pub mecab_dictionary: Option<PathBuf>,
    pub description_chars: usize,
}

impl Default for BuildConfig {
    fn default() -> Self {
        let mut url_prefixes = BTreeMap::new();
        url_prefixes.insert("www".to_string(), "https://www.digitune.org/".to_string());
        url_prefixes.insert("memo".to_string(), "https://memo.digitune.org/".to_string());
        url_prefixes.insert("other".to_string(), "https://www.digitune.org/".to_string());
        Self {
            input: PathBuf::from("public"),
            output: PathBuf::from("index"),
            name: "nnz".to_string(),
            exclude: vec!["auth/".to_string()],
            url_prefixes,
            default_url_prefix: "https://www.digitune.org/".to_string(),
            tokenizer: TokenizerKind::Builtin,
            mecab_dictionary: None,
            description_chars: DEFAULT_DESCRIPTION_CHARS,
        }
    }
}

impl BuildConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let config: BuildConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() || self.name.contains(['/', '\\']) {
            return Err(IndexError::Config(format!("invalid artifact name {:?}", self.name)));
        }
        if self.description_chars == 0 {
            return Err(IndexError::Config("description_chars must be positive".into()));
        }
        if let Some((dir, _)) = self.url_prefixes.iter().find(|(dir, _)| dir.is_empty() || dir.contains('/')) {
            return Err(IndexError::Config(format!("URL prefix key {dir:?} must be a single directory name")));
        }
        Ok(())
    }

    pub fn url_mapper(&self) -> UrlMapper {
        UrlMapper::new(self.url_prefixes.clone(), self.default_url_prefix.clone())
    }

    pub fn tokenizer(&self) -> Box<dyn Tokenizer> {
        match self.tokenizer {
            TokenizerKind::Builtin => Box::new(ScriptRunTokenizer),
            TokenizerKind::Mecab => Box::new(MecabTokenizer::new(self.mecab_dictionary.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: BuildConfig = serde_json::from_str(r#"{"input": "site", "tokenizer": "mecab"}"#).unwrap();
        assert_eq!(cfg.input, PathBuf::from("site"));
        assert_eq!(cfg.tokenizer, TokenizerKind::Mecab);
        assert_eq!(cfg.name, "nnz");
        assert_eq!(cfg.exclude, vec!["auth/"]);
        assert_eq!(cfg.description_chars, 140);
    }

    #[test]
    fn rejects_bad_values() {
        let cfg = BuildConfig { description_chars: 0, ..BuildConfig::default() };
        assert!(matches!(cfg.validate(), Err(IndexError::Config(_))));
        let cfg = BuildConfig { name: "a/b".into(), ..BuildConfig::default() };
        assert!(cfg.validate().is_err());
        assert!(BuildConfig::default().validate().is_ok());
    }

    #[test]
    fn tokenizer_kind_parses() {
        assert_eq!("mecab".parse::<TokenizerKind>().unwrap(), TokenizerKind::Mecab);
        assert!("lindera".parse::<TokenizerKind>().is_err());
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        std::fs::write(&path, r#"{"name": "site", "exclude": []}"#).unwrap();
        let cfg = BuildConfig::load(&path).unwrap();
        assert_eq!(cfg.name, "site");
        assert!(cfg.exclude.is_empty());
    }
}
