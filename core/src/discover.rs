use crate::Result;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::{DirEntry, WalkDir};

/// Source files selected for indexing, as paths relative to the input root.
#[derive(Debug, Default, Clone)]
pub struct Discovery {
    pub included: Vec<PathBuf>,
    pub excluded: usize,
    pub hidden: usize,
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_str().map_or(false, |s| s.starts_with('.'))
}

/// Forward-slash form of a relative path, independent of the platform separator.
pub fn slash_path(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Walk `root` for `*.html` files in file-name order.
///
/// Hidden directories are not descended into. Files under an excluded prefix
/// and hidden files are counted and dropped. An unreadable root is an error;
/// unreadable entries below it are logged and skipped.
pub fn discover(root: &Path, excluded_prefixes: &[String]) -> Result<Discovery> {
    let mut out = Discovery::default();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !(e.file_type().is_dir() && is_hidden(e)));
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(err) if err.depth() == 0 => return Err(err.into()),
            Err(err) => {
                warn!(%err, "skipping unreadable directory entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let p = entry.path();
        if p.extension().and_then(|s| s.to_str()) != Some("html") {
            continue;
        }
        let Ok(rel) = p.strip_prefix(root) else { continue };
        let rel_str = slash_path(rel);
        if excluded_prefixes.iter().any(|prefix| rel_str.starts_with(prefix.as_str())) {
            info!(path = %rel_str, "skipping excluded path");
            out.excluded += 1;
            continue;
        }
        if is_hidden(&entry) {
            out.hidden += 1;
            continue;
        }
        out.included.push(rel.to_path_buf());
    }
    Ok(out)
}

/// Maps a document's relative path to its public URL.
///
/// When the path has a directory and its first segment has a configured prefix,
/// that segment is replaced by the prefix; otherwise the default prefix is
/// prepended to the whole path.
#[derive(Debug, Clone)]
pub struct UrlMapper {
    prefixes: BTreeMap<String, String>,
    default_prefix: String,
}

impl UrlMapper {
    pub fn new(prefixes: BTreeMap<String, String>, default_prefix: impl Into<String>) -> Self {
        Self { prefixes, default_prefix: default_prefix.into() }
    }

    pub fn resolve(&self, rel: &Path) -> String {
        let rel_str = slash_path(rel);
        if let Some((first, rest)) = rel_str.split_once('/') {
            if let Some(prefix) = self.prefixes.get(first) {
                return format!("{prefix}{rest}");
            }
        }
        format!("{}{rel_str}", self.default_prefix)
    }
}
