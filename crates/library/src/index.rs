//! Lookup over restored attachments.
//!
//! Built from a single scan of the attachment directory, immediately before
//! pages are transformed, and never refreshed afterwards.

use crate::error::{ErrorKind, Result};
use crate::output::SITE_DIR;
use crate::restore::SIDECAR_SUFFIX;
use exhume_storage::{fs as local, sanitize, split_name};
use exn::ResultExt;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// Extensions tried in place of the requested one, in order.
fn alternates(ext: &str) -> &'static [&'static str] {
    match ext {
        ".jpg" => &[".jpeg"],
        ".jpeg" => &[".jpg"],
        ".png" => &[".jpg", ".jpeg"],
        _ => &[],
    }
}

#[derive(Debug, Clone, Default)]
pub struct AttachmentIndex {
    root: PathBuf,
    by_name: HashMap<String, PathBuf>,
    by_lower: HashMap<String, PathBuf>,
    /// Lowercased stem to every file sharing it, in scan order.
    by_stem: BTreeMap<String, Vec<PathBuf>>,
}

impl AttachmentIndex {
    /// Scans `root` once. Site assets and sidecar markers are not indexed.
    #[instrument(skip_all, fields(root = %root.as_ref().display()))]
    pub fn build(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let files = local::list_files(root).or_raise(|| ErrorKind::Index(root.to_path_buf()))?;
        let site = root.join(SITE_DIR);
        let mut index = Self { root: root.to_path_buf(), ..Self::default() };
        for path in files.into_iter().filter(|p| !p.starts_with(&site)) {
            let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
                continue;
            };
            if name.ends_with(SIDECAR_SUFFIX) {
                continue;
            }
            index.insert(name, path);
        }
        debug!(files = index.len(), "attachment index built");
        Ok(index)
    }

    fn insert(&mut self, name: String, path: PathBuf) {
        let lower = name.to_lowercase();
        let stem = split_name(&lower).0.to_string();
        self.by_stem.entry(stem).or_default().push(path.clone());
        self.by_lower.insert(lower, path.clone());
        self.by_name.insert(name, path);
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Finds the restored file for `filename`.
    ///
    /// Tiers, first hit wins: the exact name, then the name ignoring case,
    /// then the same stem with an equivalent image extension, then a file
    /// whose lowercased stem equals or starts with the requested stem.
    pub fn find(&self, filename: &str) -> Option<&Path> {
        let wanted = sanitize(filename.rsplit(['/', '\\']).next().unwrap_or(filename));
        if wanted.is_empty() {
            return None;
        }
        if let Some(path) = self.by_name.get(&wanted) {
            return Some(path.as_path());
        }
        let lower = wanted.to_lowercase();
        if let Some(path) = self.by_lower.get(&lower) {
            return Some(path.as_path());
        }

        let (stem, ext) = split_name(&lower);
        if let Some(path) = alternates(ext).iter().find_map(|alt| self.by_lower.get(&format!("{stem}{alt}"))) {
            return Some(path.as_path());
        }
        if let Some(path) = self.by_stem.get(stem).and_then(|paths| paths.first()) {
            return Some(path.as_path());
        }
        self.by_stem
            .range::<str, _>((std::ops::Bound::Included(stem), std::ops::Bound::Unbounded))
            .take_while(|(key, _)| key.starts_with(stem))
            .find_map(|(_, paths)| paths.first())
            .map(PathBuf::as_path)
    }
}
