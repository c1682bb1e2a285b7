//! Uniform access to zip and directory exports.

use crate::error::{ErrorKind, Result};
use exhume_storage::{fs as local, validate_path};
use exn::ResultExt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};
use zip::ZipArchive;

const ATTACHMENTS_SEGMENT: &str = "attachments/";
const DESCRIPTOR_NAME: &str = "entities.xml";
const PAGES_SEGMENT: &str = "pages/";
const PAGE_DOCUMENT_EXT: &str = ".xml";

/// Reads at most `limit` bytes, whatever the reader would go on to yield.
fn read_capped(reader: impl Read, limit: u64) -> std::io::Result<Vec<u8>> {
    let mut buffer = Vec::with_capacity(usize::try_from(limit).unwrap_or(0).min(1 << 20));
    reader.take(limit).read_to_end(&mut buffer)?;
    Ok(buffer)
}

/// An opened export.
///
/// Entry names are always `/`-separated and relative to the export root,
/// regardless of whether they came from a zip central directory or from a
/// directory walk.
pub enum Source {
    Archive { path: PathBuf, archive: ZipArchive<BufReader<File>> },
    Directory { root: PathBuf },
}

impl Source {
    /// Opens `path` as a directory export if it is a directory, otherwise as
    /// a zip archive.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.is_dir() {
            return Ok(Source::Directory { root: path.to_path_buf() });
        }
        let file = File::open(path).or_raise(|| ErrorKind::Open(path.to_path_buf()))?;
        let archive = ZipArchive::new(BufReader::new(file)).or_raise(|| ErrorKind::NotAnArchive(path.to_path_buf()))?;
        debug!(entries = archive.len(), "opened zip export");
        Ok(Source::Archive { path: path.to_path_buf(), archive })
    }

    /// The path this export was opened from.
    pub fn path(&self) -> &Path {
        match self {
            Source::Archive { path, .. } => path,
            Source::Directory { root } => root,
        }
    }

    /// Lists every file entry, sorted by name. Directory entries are omitted.
    pub fn entries(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = match self {
            Source::Archive { archive, .. } => {
                archive.file_names().filter(|n| !n.ends_with('/')).map(str::to_string).collect()
            },
            Source::Directory { root } => local::list_files(root)
                .or_raise(|| ErrorKind::List)?
                .iter()
                .filter_map(|file| file.strip_prefix(root).ok())
                .map(|relative| {
                    relative.components().map(|c| c.as_os_str().to_string_lossy()).collect::<Vec<_>>().join("/")
                })
                .collect(),
        };
        names.sort();
        Ok(names)
    }

    /// Reads one entry in full.
    pub fn read(&mut self, name: &str) -> Result<Vec<u8>> {
        match self {
            Source::Archive { archive, .. } => {
                let entry = archive.by_name(name).or_raise(|| ErrorKind::Entry(name.to_string()))?;
                // The declared size bounds the read, not the compressed stream.
                let size = entry.size();
                read_capped(entry, size).or_raise(|| ErrorKind::Entry(name.to_string()))
            },
            Source::Directory { root } => {
                let relative = validate_path(name).or_raise(|| ErrorKind::Entry(name.to_string()))?;
                local::read(root.join(relative)).or_raise(|| ErrorKind::Entry(name.to_string()))
            },
        }
    }
}

/// Where the interesting parts of an export live, as entry names.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Layout {
    /// The descriptor file, if any.
    pub descriptor: Option<String>,
    /// The attachment root prefix, always ending in `attachments/`.
    pub attachments: Option<String>,
    /// Standalone page documents under `pages/` beside the descriptor.
    pub pages: Vec<String>,
}

impl Layout {
    /// Locates the descriptor and attachment root among `entries`.
    ///
    /// The attachment root is the shortest prefix ending in an
    /// `attachments/` path segment. The descriptor is the `entities.xml`
    /// sitting beside that root, falling back to any `entities.xml` that
    /// shares the root's parent, then to the first one found at all.
    pub fn discover<S: AsRef<str>>(entries: &[S]) -> Self {
        let attachments = entries
            .iter()
            .filter_map(|name| attachment_prefix(name.as_ref()))
            .min_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)))
            .map(str::to_string);

        let candidates: Vec<&str> = entries
            .iter()
            .map(AsRef::as_ref)
            .filter(|name| name.rsplit('/').next().is_some_and(|leaf| leaf.eq_ignore_ascii_case(DESCRIPTOR_NAME)))
            .collect();
        let parent = attachments.as_deref().map(|root| &root[..root.len() - ATTACHMENTS_SEGMENT.len()]);
        let descriptor = parent
            .and_then(|parent| {
                candidates
                    .iter()
                    .find(|c| c.strip_prefix(parent).is_some_and(|rest| !rest.contains('/')))
                    .or_else(|| candidates.iter().find(|c| c.starts_with(parent)))
            })
            .or_else(|| candidates.first())
            .map(|c| c.to_string());

        let base = descriptor.as_deref().map(|d| &d[..d.rfind('/').map_or(0, |i| i + 1)]).or(parent);
        let pages = match base {
            Some(base) => {
                let dir = format!("{base}{PAGES_SEGMENT}");
                entries
                    .iter()
                    .map(AsRef::as_ref)
                    .filter(|name| name.starts_with(&dir) && name.to_ascii_lowercase().ends_with(PAGE_DOCUMENT_EXT))
                    .map(str::to_string)
                    .collect()
            },
            None => Vec::new(),
        };

        Self { descriptor, attachments, pages }
    }

    /// Entries under the attachment root, paired with their path relative
    /// to that root.
    pub fn attachment_entries<'a, S: AsRef<str>>(&self, entries: &'a [S]) -> Vec<(&'a str, &'a str)> {
        let Some(root) = self.attachments.as_deref() else {
            return Vec::new();
        };
        entries
            .iter()
            .map(AsRef::as_ref)
            .filter_map(|name| name.strip_prefix(root).filter(|rest| !rest.is_empty()).map(|rest| (name, rest)))
            .collect()
    }
}

/// The prefix of `name` up to and including its first `attachments/`
/// segment. Names like `myattachments/` do not count.
fn attachment_prefix(name: &str) -> Option<&str> {
    let mut offset = 0;
    while let Some(found) = name[offset..].find(ATTACHMENTS_SEGMENT) {
        let idx = offset + found;
        if idx == 0 || name.as_bytes()[idx - 1] == b'/' {
            return Some(&name[..idx + ATTACHMENTS_SEGMENT.len()]);
        }
        offset = idx + ATTACHMENTS_SEGMENT.len();
    }
    None
}
