//! Build driver: discover, extract, accumulate, score, serialize, package.
//!
//! Accumulation must see every document before any norm is computed, so the
//! build runs as two phases over a single owned [`PostingAccumulator`].

use crate::config::BuildConfig;
use crate::discover::{discover, slash_path};
use crate::index::{DocumentInput, PostingAccumulator};
use crate::markup;
use crate::package::{self, PackageSummary};
use crate::persist::{self, IndexPaths, MetaFile, FORMAT_VERSION};
use crate::terms::extract_terms;
use crate::tokenizer::Tokenizer;
use crate::Result;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct BuildReport {
    pub indexed: usize,
    pub excluded: usize,
    pub hidden: usize,
    /// Files that could not be read or were not valid UTF-8.
    pub unreadable: usize,
    /// Documents the tokenizer failed on.
    pub untokenizable: usize,
    /// Documents with a url, title or description too long for a metadata record.
    pub oversized: usize,
    pub num_terms: usize,
    pub container: PathBuf,
    pub package: PackageSummary,
}

pub fn build(config: &BuildConfig) -> Result<BuildReport> {
    config.validate()?;
    let tokenizer = config.tokenizer();
    build_with(config, tokenizer.as_ref())
}

pub fn build_with(config: &BuildConfig, tokenizer: &dyn Tokenizer) -> Result<BuildReport> {
    tokenizer.ensure_available()?;
    let discovery = discover(&config.input, &config.exclude)?;
    let total = discovery.included.len();
    info!(input = %config.input.display(), files = total, "discovered documents");

    let mapper = config.url_mapper();
    let mut acc = PostingAccumulator::new();
    let mut unreadable = 0usize;
    let mut untokenizable = 0usize;
    let mut oversized = 0usize;

    for (i, rel) in discovery.included.iter().enumerate() {
        let path = config.input.join(rel);
        let bytes = match fs::read(&path) {
            Ok(b) => b,
            Err(err) => {
                warn!(path = %path.display(), %err, "skipping unreadable document");
                unreadable += 1;
                continue;
            }
        };
        let html = match String::from_utf8(bytes) {
            Ok(s) => s,
            Err(_) => {
                warn!(path = %path.display(), "skipping document that is not valid UTF-8");
                unreadable += 1;
                continue;
            }
        };

        let extracted = markup::extract(&html, config.description_chars);
        let tokens = match tokenizer.tokenize(&extracted.index_text) {
            Ok(t) => t,
            Err(err) => {
                warn!(path = %path.display(), %err, "skipping document the tokenizer rejected");
                untokenizable += 1;
                continue;
            }
        };
        let input = DocumentInput {
            url: mapper.resolve(rel),
            title: extracted.title,
            description: extracted.description,
        };
        if let Some((field, len)) = input.oversized_field() {
            warn!(path = %path.display(), field, len, "skipping document with oversized field");
            oversized += 1;
            continue;
        }
        let terms = extract_terms(&tokens);
        let doc_id = acc.add_document(input, terms)?;
        debug!(doc_id, path = %slash_path(rel), progress = i + 1, total, "indexed document");
    }
    info!(num_docs = acc.num_docs(), num_terms = acc.num_terms(), "ingested documents");

    let index = acc.finish();

    let paths = IndexPaths::new(&config.output, &config.name);
    let encoded = persist::encode_index(&index)?;
    persist::write_artifacts(&paths, &encoded)?;
    let container = paths.container();
    let package = package::assemble(&paths.package_sources(), &container)?;

    let meta = MetaFile {
        num_docs: index.num_docs() as u32,
        num_terms: index.num_terms() as u32,
        created_at: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| "".into()),
        version: FORMAT_VERSION,
    };
    persist::save_meta(&paths, &meta)?;

    info!(output = %paths.root.display(), bytes = package.total_len, "index build complete");
    Ok(BuildReport {
        indexed: index.num_docs(),
        excluded: discovery.excluded,
        hidden: discovery.hidden,
        unreadable,
        untokenizable,
        oversized,
        num_terms: index.num_terms(),
        container,
        package,
    })
}
