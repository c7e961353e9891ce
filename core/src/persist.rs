//! On-disk layout of the index artifacts.
//!
//! All integers are big-endian.
//!
//! ```text
//! <stem>.dict   u32 magic 0xDA7A | u32 term count | { u8 len | term bytes | u32 postings offset }*
//! <stem>.idx    { u32 doc id | u32 frequency }* grouped by term, dictionary order
//! <stem>.doci   u32 doc count | 26-byte record per document
//! <stem>.docd   url | title | description, per document, no separators
//! ```
//!
//! Every artifact also gets a gzip sibling (`<file>.gz`) holding the same bytes.

use crate::index::{Document, InvertedIndex};
use crate::{IndexError, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

pub const DICT_MAGIC: u32 = 0xDA7A;
pub const POSTING_SIZE: usize = 8;
pub const DOC_META_RECORD_SIZE: usize = 26;
pub const MAX_TERM_BYTES: usize = u8::MAX as usize;
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub num_terms: u32,
    pub created_at: String,
    pub version: u32,
}

pub struct IndexPaths {
    pub root: PathBuf,
    pub stem: String,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P, stem: &str) -> Self {
        Self { root: root.as_ref().to_path_buf(), stem: stem.to_string() }
    }
    fn file(&self, ext: &str) -> PathBuf { self.root.join(format!("{}.{ext}", self.stem)) }
    pub fn dictionary(&self) -> PathBuf { self.file("dict") }
    pub fn postings(&self) -> PathBuf { self.file("idx") }
    pub fn doc_meta(&self) -> PathBuf { self.file("doci") }
    pub fn doc_data(&self) -> PathBuf { self.file("docd") }
    pub fn container(&self) -> PathBuf { self.file("all.idx") }
    pub fn meta(&self) -> PathBuf { self.root.join("meta.json") }

    /// Package members, in container order.
    pub fn package_sources(&self) -> [PathBuf; 6] {
        [
            gz_path(&self.dictionary()),
            gz_path(&self.doc_meta()),
            self.dictionary(),
            self.doc_meta(),
            self.postings(),
            self.doc_data(),
        ]
    }
}

pub fn gz_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".gz");
    PathBuf::from(name)
}

/// The four encoded tables, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedIndex {
    pub dictionary: Vec<u8>,
    pub postings: Vec<u8>,
    pub doc_meta: Vec<u8>,
    pub doc_data: Vec<u8>,
}

pub fn encode_index(index: &InvertedIndex) -> Result<EncodedIndex> {
    let (postings, offsets) = encode_postings(index)?;
    let dictionary = encode_dictionary(index, &offsets)?;
    let (doc_meta, doc_data) = encode_documents(index.documents())?;
    Ok(EncodedIndex { dictionary, postings, doc_meta, doc_data })
}

fn to_u32(len: usize, artifact: &'static str) -> Result<u32> {
    u32::try_from(len).map_err(|_| IndexError::OffsetOverflow { artifact, offset: len as u64 })
}

/// Posting lists in dictionary order, plus the byte offset where each term's list starts.
pub fn encode_postings(index: &InvertedIndex) -> Result<(Vec<u8>, Vec<u32>)> {
    let total: usize = index.terms().map(|(_, p)| p.len()).sum();
    let mut buf = Vec::with_capacity(total * POSTING_SIZE);
    let mut offsets = Vec::with_capacity(index.num_terms());
    for (_, postings) in index.terms() {
        offsets.push(to_u32(buf.len(), "postings")?);
        for p in postings {
            buf.extend_from_slice(&p.doc_id.to_be_bytes());
            buf.extend_from_slice(&p.frequency.to_be_bytes());
        }
    }
    to_u32(buf.len(), "postings")?;
    Ok((buf, offsets))
}

pub fn encode_dictionary(index: &InvertedIndex, offsets: &[u32]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&DICT_MAGIC.to_be_bytes());
    buf.extend_from_slice(&to_u32(index.num_terms(), "dictionary count")?.to_be_bytes());
    for ((term, _), offset) in index.terms().zip(offsets) {
        let bytes = term.as_bytes();
        let len = u8::try_from(bytes.len())
            .map_err(|_| IndexError::TermTooLong { term: term.to_string(), len: bytes.len() })?;
        buf.push(len);
        buf.extend_from_slice(bytes);
        buf.extend_from_slice(&offset.to_be_bytes());
    }
    Ok(buf)
}

/// Metadata records and the concatenated display strings they point into.
pub fn encode_documents(documents: &[Document]) -> Result<(Vec<u8>, Vec<u8>)> {
    let mut meta = Vec::with_capacity(4 + documents.len() * DOC_META_RECORD_SIZE);
    let mut data = Vec::new();
    meta.extend_from_slice(&to_u32(documents.len(), "document count")?.to_be_bytes());

    for doc in documents {
        let fields = [
            ("url", doc.url.as_bytes()),
            ("title", doc.title.as_deref().unwrap_or("").as_bytes()),
            ("description", doc.description.as_bytes()),
        ];
        meta.extend_from_slice(&doc.id.to_be_bytes());
        for (field, bytes) in fields {
            let offset = to_u32(data.len(), "document data")?;
            let len = u16::try_from(bytes.len())
                .map_err(|_| IndexError::FieldTooLong { doc_id: doc.id, field, len: bytes.len() })?;
            meta.extend_from_slice(&offset.to_be_bytes());
            meta.extend_from_slice(&len.to_be_bytes());
            data.extend_from_slice(bytes);
        }
        meta.extend_from_slice(&doc.norm.to_be_bytes());
    }
    to_u32(data.len(), "document data")?;
    Ok((meta, data))
}

/// Write every table uncompressed and gzip-compressed.
pub fn write_artifacts(paths: &IndexPaths, encoded: &EncodedIndex) -> Result<()> {
    create_dir_all(&paths.root)?;
    let tables = [
        (paths.dictionary(), &encoded.dictionary),
        (paths.postings(), &encoded.postings),
        (paths.doc_meta(), &encoded.doc_meta),
        (paths.doc_data(), &encoded.doc_data),
    ];
    for (path, bytes) in tables {
        write_plain(&path, bytes)?;
        write_gzip(&gz_path(&path), bytes)?;
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "wrote artifact");
    }
    Ok(())
}

fn write_plain(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut f = BufWriter::new(File::create(path)?);
    f.write_all(bytes)?;
    f.flush()?;
    Ok(())
}

fn write_gzip(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut enc = GzEncoder::new(BufWriter::new(File::create(path)?), Compression::default());
    enc.write_all(bytes)?;
    enc.finish()?.flush()?;
    Ok(())
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let mut f = File::open(paths.meta())?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: MetaFile = serde_json::from_str(&buf)?;
    Ok(meta)
}
