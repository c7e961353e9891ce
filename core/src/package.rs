//! Single-file container: `u32 magic 0xDA7C | u32 offset per member | member bytes...`.
//!
//! A missing member is recorded with offset 0 and contributes no bytes. Offset 0
//! can never be a real member position since the header occupies it.

use crate::{IndexError, Result};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

pub const CONTAINER_MAGIC: u32 = 0xDA7C;

pub fn header_size(members: usize) -> usize {
    4 + 4 * members
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSummary {
    pub offsets: Vec<u32>,
    pub missing: Vec<PathBuf>,
    pub total_len: u64,
}

/// Concatenate `sources` into `dest` behind the offset header.
pub fn assemble(sources: &[PathBuf], dest: &Path) -> Result<PackageSummary> {
    let mut out = BufWriter::new(File::create(dest)?);
    let header_len = header_size(sources.len());
    out.write_all(&vec![0u8; header_len])?;

    let mut position = header_len as u64;
    let mut offsets = Vec::with_capacity(sources.len());
    let mut missing = Vec::new();
    for source in sources {
        let file = match File::open(source) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!(path = %source.display(), "package member not found, recording offset 0");
                offsets.push(0);
                missing.push(source.clone());
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        offsets.push(u32::try_from(position).map_err(|_| IndexError::OffsetOverflow {
            artifact: "container",
            offset: position,
        })?);
        position += io::copy(&mut BufReader::new(file), &mut out)?;
    }

    out.seek(SeekFrom::Start(0))?;
    out.write_all(&CONTAINER_MAGIC.to_be_bytes())?;
    for offset in &offsets {
        out.write_all(&offset.to_be_bytes())?;
    }
    out.flush()?;

    Ok(PackageSummary { offsets, missing, total_len: position })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn missing_member_gets_zero_offset() {
        let dir = tempfile::tempdir().unwrap();
        let sizes = [5usize, 3, 0, 7, 2, 4];
        let mut sources = Vec::new();
        for (i, size) in sizes.iter().enumerate() {
            let p = dir.path().join(format!("m{i}"));
            if i != 1 {
                fs::write(&p, vec![i as u8; *size]).unwrap();
            }
            sources.push(p);
        }
        let dest = dir.path().join("all.idx");
        let summary = assemble(&sources, &dest).unwrap();

        let bytes = fs::read(&dest).unwrap();
        let present: usize = sizes.iter().enumerate().filter(|(i, _)| *i != 1).map(|(_, s)| s).sum();
        assert_eq!(bytes.len(), header_size(6) + present);
        assert_eq!(summary.total_len as usize, bytes.len());
        assert_eq!(summary.missing, vec![sources[1].clone()]);

        assert_eq!(&bytes[0..4], &CONTAINER_MAGIC.to_be_bytes());
        let offsets: Vec<u32> = (0..6)
            .map(|i| u32::from_be_bytes(bytes[4 + i * 4..8 + i * 4].try_into().unwrap()))
            .collect();
        assert_eq!(offsets, vec![28, 0, 33, 33, 40, 42]);
        assert_eq!(offsets, summary.offsets);
        assert_eq!(&bytes[40..42], &[4, 4]);
    }

    #[test]
    fn all_members_present() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        fs::write(&a, b"hello").unwrap();
        fs::write(&b, b"world").unwrap();
        let dest = dir.path().join("out");
        let summary = assemble(&[a, b], &dest).unwrap();
        assert_eq!(summary.offsets, vec![12, 17]);
        assert!(summary.missing.is_empty());
        assert_eq!(&fs::read(&dest).unwrap()[12..], b"helloworld");
    }
}
