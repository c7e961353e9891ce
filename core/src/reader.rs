//! Decoding side of the artifact formats, used for inspection and verification.
//!
//! Every read is bounds-checked; truncated or inconsistent input surfaces as
//! [`IndexError::Malformed`].

use crate::package::{header_size, CONTAINER_MAGIC};
use crate::persist::{IndexPaths, DICT_MAGIC, DOC_META_RECORD_SIZE, POSTING_SIZE};
use crate::{DocId, IndexError, Posting, Result};
use flate2::read::GzDecoder;
use std::fs;
use std::io::Read;

/// Number of members in a container.
pub const PACKAGE_MEMBERS: usize = 6;

struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
    artifact: &'static str,
}

impl<'a> ByteReader<'a> {
    fn new(buf: &'a [u8], artifact: &'static str) -> Self {
        Self { buf, pos: 0, artifact }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(n).filter(|&e| e <= self.buf.len()).ok_or_else(|| {
            IndexError::malformed(self.artifact, format!("truncated at byte {} (wanted {n} more)", self.pos))
        })?;
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn f32(&mut self) -> Result<f32> {
        Ok(f32::from_bits(self.u32()?))
    }

    fn is_empty(&self) -> bool {
        self.pos == self.buf.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryEntry {
    pub term: String,
    pub postings_offset: u32,
}

pub fn decode_dictionary(bytes: &[u8]) -> Result<Vec<DictionaryEntry>> {
    let mut r = ByteReader::new(bytes, "dictionary");
    let magic = r.u32()?;
    if magic != DICT_MAGIC {
        return Err(IndexError::malformed("dictionary", format!("bad magic {magic:#x}")));
    }
    let count = r.u32()? as usize;
    let mut entries = Vec::with_capacity(count.min(bytes.len()));
    for _ in 0..count {
        let len = r.u8()? as usize;
        let term = std::str::from_utf8(r.take(len)?)
            .map_err(|e| IndexError::malformed("dictionary", e.to_string()))?
            .to_string();
        let postings_offset = r.u32()?;
        entries.push(DictionaryEntry { term, postings_offset });
    }
    if !r.is_empty() {
        return Err(IndexError::malformed("dictionary", "trailing bytes"));
    }
    Ok(entries)
}

pub fn decode_postings(bytes: &[u8]) -> Result<Vec<Posting>> {
    if bytes.len() % POSTING_SIZE != 0 {
        return Err(IndexError::malformed("postings", format!("length {} is not a multiple of 8", bytes.len())));
    }
    let mut r = ByteReader::new(bytes, "postings");
    let mut out = Vec::with_capacity(bytes.len() / POSTING_SIZE);
    while !r.is_empty() {
        out.push(Posting { doc_id: r.u32()?, frequency: r.u32()? });
    }
    Ok(out)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DocRecord {
    pub doc_id: DocId,
    pub url: (u32, u16),
    pub title: (u32, u16),
    pub description: (u32, u16),
    pub norm: f32,
}

impl DocRecord {
    fn field<'a>(data: &'a [u8], (offset, len): (u32, u16)) -> Result<&'a str> {
        let start = offset as usize;
        let bytes = data
            .get(start..start + len as usize)
            .ok_or_else(|| IndexError::malformed("document data", format!("range {start}+{len} out of bounds")))?;
        std::str::from_utf8(bytes).map_err(|e| IndexError::malformed("document data", e.to_string()))
    }

    pub fn url<'a>(&self, data: &'a [u8]) -> Result<&'a str> {
        Self::field(data, self.url)
    }

    pub fn title<'a>(&self, data: &'a [u8]) -> Result<&'a str> {
        Self::field(data, self.title)
    }

    pub fn description<'a>(&self, data: &'a [u8]) -> Result<&'a str> {
        Self::field(data, self.description)
    }
}

pub fn decode_doc_meta(bytes: &[u8]) -> Result<Vec<DocRecord>> {
    let mut r = ByteReader::new(bytes, "document metadata");
    let count = r.u32()? as usize;
    if bytes.len() != 4 + count * DOC_META_RECORD_SIZE {
        return Err(IndexError::malformed(
            "document metadata",
            format!("{count} records need {} bytes, found {}", 4 + count * DOC_META_RECORD_SIZE, bytes.len()),
        ));
    }
    let mut records = Vec::with_capacity(count);
    for _ in 0..count {
        records.push(DocRecord {
            doc_id: r.u32()?,
            url: (r.u32()?, r.u16()?),
            title: (r.u32()?, r.u16()?),
            description: (r.u32()?, r.u16()?),
            norm: r.f32()?,
        });
    }
    Ok(records)
}

/// Member slices of a container; `None` for members recorded with offset 0.
pub fn split_container(bytes: &[u8]) -> Result<[Option<&[u8]>; PACKAGE_MEMBERS]> {
    let mut r = ByteReader::new(bytes, "container");
    let magic = r.u32()?;
    if magic != CONTAINER_MAGIC {
        return Err(IndexError::malformed("container", format!("bad magic {magic:#x}")));
    }
    let mut offsets = [0usize; PACKAGE_MEMBERS];
    for slot in offsets.iter_mut() {
        *slot = r.u32()? as usize;
    }

    let mut members: [Option<&[u8]>; PACKAGE_MEMBERS] = [None; PACKAGE_MEMBERS];
    for i in 0..PACKAGE_MEMBERS {
        let start = offsets[i];
        if start == 0 {
            continue;
        }
        // A member ends where the next present member starts.
        let end = offsets[i + 1..].iter().copied().find(|&o| o != 0).unwrap_or(bytes.len());
        if start < header_size(PACKAGE_MEMBERS) || start > end || end > bytes.len() {
            return Err(IndexError::malformed("container", format!("member {i} spans {start}..{end}")));
        }
        members[i] = Some(&bytes[start..end]);
    }
    Ok(members)
}

fn gunzip(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    GzDecoder::new(bytes).read_to_end(&mut out)?;
    Ok(out)
}

/// A fully decoded index.
#[derive(Debug, Clone)]
pub struct IndexView {
    pub dictionary: Vec<DictionaryEntry>,
    pub postings: Vec<u8>,
    pub documents: Vec<DocRecord>,
    pub doc_data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub doc_id: DocId,
    pub url: String,
    pub title: String,
    pub description: String,
    pub norm: f32,
}

impl IndexView {
    pub fn from_parts(dict: &[u8], postings: Vec<u8>, doc_meta: &[u8], doc_data: Vec<u8>) -> Result<Self> {
        let dictionary = decode_dictionary(dict)?;
        for pair in dictionary.windows(2) {
            if pair[0].postings_offset > pair[1].postings_offset {
                return Err(IndexError::malformed("dictionary", "postings offsets are not ascending"));
            }
        }
        if let Some(last) = dictionary.last() {
            if last.postings_offset as usize > postings.len() {
                return Err(IndexError::malformed("dictionary", "postings offset past end of postings"));
            }
        }
        Ok(Self { dictionary, postings, documents: decode_doc_meta(doc_meta)?, doc_data })
    }

    /// Read the uncompressed artifacts from an output directory.
    pub fn open(paths: &IndexPaths) -> Result<Self> {
        let dict = fs::read(paths.dictionary())?;
        let doc_meta = fs::read(paths.doc_meta())?;
        Self::from_parts(&dict, fs::read(paths.postings())?, &doc_meta, fs::read(paths.doc_data())?)
    }

    /// Decode a container, preferring uncompressed members and falling back to the gzip ones.
    pub fn from_container(bytes: &[u8]) -> Result<Self> {
        let [dict_gz, meta_gz, dict, meta, postings, data] = split_container(bytes)?;
        let dict = match (dict, dict_gz) {
            (Some(d), _) => d.to_vec(),
            (None, Some(gz)) => gunzip(gz)?,
            (None, None) => return Err(IndexError::malformed("container", "no dictionary member")),
        };
        let meta = match (meta, meta_gz) {
            (Some(m), _) => m.to_vec(),
            (None, Some(gz)) => gunzip(gz)?,
            (None, None) => return Err(IndexError::malformed("container", "no document metadata member")),
        };
        let postings = postings.ok_or_else(|| IndexError::malformed("container", "no postings member"))?;
        let data = data.ok_or_else(|| IndexError::malformed("container", "no document data member"))?;
        Self::from_parts(&dict, postings.to_vec(), &meta, data.to_vec())
    }

    pub fn num_docs(&self) -> usize {
        self.documents.len()
    }

    /// Postings of the `i`-th dictionary entry; the list runs to the next entry's offset.
    pub fn postings_at(&self, i: usize) -> Result<Vec<Posting>> {
        let entry = self
            .dictionary
            .get(i)
            .ok_or_else(|| IndexError::malformed("dictionary", format!("no entry {i}")))?;
        let start = entry.postings_offset as usize;
        let end = self
            .dictionary
            .get(i + 1)
            .map_or(self.postings.len(), |next| next.postings_offset as usize);
        decode_postings(&self.postings[start..end])
    }

    /// Binary search the sorted dictionary.
    pub fn lookup(&self, term: &str) -> Result<Option<Vec<Posting>>> {
        match self.dictionary.binary_search_by(|e| e.term.as_bytes().cmp(term.as_bytes())) {
            Ok(i) => self.postings_at(i).map(Some),
            Err(_) => Ok(None),
        }
    }

    pub fn document(&self, doc_id: DocId) -> Result<StoredDocument> {
        let rec = self
            .documents
            .get(doc_id as usize)
            .ok_or_else(|| IndexError::malformed("document metadata", format!("no document {doc_id}")))?;
        Ok(StoredDocument {
            doc_id: rec.doc_id,
            url: rec.url(&self.doc_data)?.to_string(),
            title: rec.title(&self.doc_data)?.to_string(),
            description: rec.description(&self.doc_data)?.to_string(),
            norm: rec.norm,
        })
    }
}
