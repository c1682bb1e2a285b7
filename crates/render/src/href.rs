use exhume_storage::relative_href;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

/// Memoized [`relative_href`] results, keyed by `(source dir, target)`.
///
/// Every page in a directory links to the same sidebar targets and usually
/// the same attachment folders, so most lookups repeat. The cache is bounded
/// and lives for one transform pass.
pub struct HrefCache {
    cache: LruCache<(PathBuf, PathBuf), String>,
    hits: u64,
}

impl HrefCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self { cache: LruCache::new(capacity), hits: 0 }
    }

    /// The `href` leading from a document in `from_dir` to `target`.
    pub fn href(&mut self, from_dir: &Path, target: &Path) -> String {
        let key = (from_dir.to_path_buf(), target.to_path_buf());
        if let Some(href) = self.cache.get(&key) {
            self.hits += 1;
            return href.clone();
        }
        let href = relative_href(from_dir, target);
        self.cache.put(key, href.clone());
        href
    }

    /// Like [`href`](Self::href), with a trailing `/` so the link reads as a
    /// directory.
    pub fn dir_href(&mut self, from_dir: &Path, target: &Path) -> String {
        let mut href = self.href(from_dir, target);
        if !href.ends_with('/') {
            href.push('/');
        }
        href
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }
}
