use anyhow::{anyhow, Context, Result};
use bigram_core::config::{BuildConfig, TokenizerKind};
use bigram_core::pipeline;
use bigram_core::reader::IndexView;
use bigram_core::terms::shape_into;
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build and inspect static bigram search indexes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from a directory of HTML files
    Build {
        /// JSON config file; flags below override its fields
        #[arg(long)]
        config: Option<PathBuf>,
        /// Input directory
        #[arg(long)]
        input: Option<PathBuf>,
        /// Output index directory
        #[arg(long)]
        output: Option<PathBuf>,
        /// Artifact file stem
        #[arg(long)]
        name: Option<String>,
        /// Relative path prefix to skip (repeatable; replaces configured list)
        #[arg(long)]
        exclude: Vec<String>,
        /// URL prefix for a top-level directory, as DIR=PREFIX (repeatable)
        #[arg(long, value_parser = parse_url_prefix)]
        url_prefix: Vec<(String, String)>,
        /// URL prefix for paths with no directory mapping
        #[arg(long)]
        default_url_prefix: Option<String>,
        /// Tokenizer: builtin or mecab
        #[arg(long)]
        tokenizer: Option<String>,
        /// MeCab dictionary directory (passed as -d)
        #[arg(long)]
        mecab_dic: Option<PathBuf>,
    },
    /// Print a summary of a packaged index, optionally looking up a query word
    Inspect {
        /// Container file (<name>.all.idx)
        path: PathBuf,
        /// Word to shape into terms and look up
        #[arg(long)]
        term: Option<String>,
    },
}

fn parse_url_prefix(s: &str) -> std::result::Result<(String, String), String> {
    s.split_once('=')
        .map(|(dir, prefix)| (dir.to_string(), prefix.to_string()))
        .ok_or_else(|| format!("expected DIR=PREFIX, got {s:?}"))
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { config, input, output, name, exclude, url_prefix, default_url_prefix, tokenizer, mecab_dic } => {
            let mut cfg = match config {
                Some(path) => BuildConfig::load(&path).with_context(|| format!("loading {}", path.display()))?,
                None => BuildConfig::default(),
            };
            if let Some(v) = input { cfg.input = v; }
            if let Some(v) = output { cfg.output = v; }
            if let Some(v) = name { cfg.name = v; }
            if !exclude.is_empty() { cfg.exclude = exclude; }
            cfg.url_prefixes.extend(url_prefix);
            if let Some(v) = default_url_prefix { cfg.default_url_prefix = v; }
            if let Some(v) = tokenizer { cfg.tokenizer = v.parse::<TokenizerKind>()?; }
            if let Some(v) = mecab_dic { cfg.mecab_dictionary = Some(v); }
            build_index(&cfg)
        }
        Commands::Inspect { path, term } => inspect(&path, term.as_deref()),
    }
}

fn build_index(cfg: &BuildConfig) -> Result<()> {
    let report = pipeline::build(cfg)?;
    tracing::info!(
        indexed = report.indexed,
        excluded = report.excluded,
        hidden = report.hidden,
        unreadable = report.unreadable,
        untokenizable = report.untokenizable,
        oversized = report.oversized,
        num_terms = report.num_terms,
        container = %report.container.display(),
        "build finished"
    );
    for missing in &report.package.missing {
        tracing::warn!(path = %missing.display(), "container is missing a member");
    }
    Ok(())
}

fn inspect(path: &Path, word: Option<&str>) -> Result<()> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let view = IndexView::from_container(&bytes)?;
    println!("documents: {}", view.num_docs());
    println!("terms:     {}", view.dictionary.len());
    println!("postings:  {}", view.postings.len() / 8);

    let Some(word) = word else { return Ok(()) };
    let mut terms = Vec::new();
    shape_into(word, &mut terms);
    if terms.is_empty() {
        return Err(anyhow!("{word:?} produces no index terms"));
    }
    for term in terms {
        match view.lookup(&term)? {
            Some(postings) => {
                println!("{term}: df={}", postings.len());
                for p in postings {
                    let doc = view.document(p.doc_id)?;
                    println!("  doc {} tf={} norm={:.4} {}", p.doc_id, p.frequency, doc.norm, doc.url);
                }
            }
            None => println!("{term}: not in dictionary"),
        }
    }
    Ok(())
}
