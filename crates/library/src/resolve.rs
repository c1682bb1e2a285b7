//! Attachment lookups for the transformer, with a diagnostic trail of misses.

use crate::index::AttachmentIndex;
use exhume_render::{AttachmentLookup, Located};
use exhume_storage::{fs as local, sanitize};
use std::cell::Cell;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use time::macros::format_description;
use tracing::{debug, warn};

/// One line of the miss log: `<timestamp>  MISS  <wanted>  (<context>)`.
pub fn miss_line(now: OffsetDateTime, wanted: &str, context: &str) -> String {
    let stamp = now
        .format(format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"))
        .unwrap_or_else(|_| now.unix_timestamp().to_string());
    format!("{stamp}  MISS  {wanted}  ({context})\n")
}

pub struct Resolver<'a> {
    index: &'a AttachmentIndex,
    /// Where misses are appended; `None` keeps them out of the file.
    miss_log: Option<PathBuf>,
    misses: Cell<usize>,
}

impl<'a> Resolver<'a> {
    pub fn new(index: &'a AttachmentIndex, miss_log: Option<PathBuf>) -> Self {
        Self { index, miss_log, misses: Cell::new(0) }
    }

    pub fn misses(&self) -> usize {
        self.misses.get()
    }

    fn record_miss(&self, wanted: &str, context: &str) {
        self.misses.set(self.misses.get() + 1);
        debug!(wanted = %wanted, context = %context, "attachment not found");
        let Some(log) = &self.miss_log else {
            return;
        };
        if let Err(err) = local::append(log, miss_line(crate::output::now(), wanted, context)) {
            warn!(log = %log.display(), error = ?err, "cannot append to miss log");
        }
    }
}

impl AttachmentLookup for Resolver<'_> {
    fn root(&self) -> &Path {
        self.index.root()
    }

    fn locate(&self, filename: &str, context: &str) -> Located {
        match self.index.find(filename) {
            Some(path) => Located::found(path),
            None => {
                self.record_miss(filename, context);
                Located::guessed(self.index.root().join(sanitize(filename)))
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_miss_line() {
        let line = miss_line(datetime!(2024-03-05 07:08:09 UTC), "x.png", "image");
        assert_eq!(line, "2024-03-05T07:08:09  MISS  x.png  (image)\n");
    }

    #[test]
    fn test_locate_swaps_extension_and_logs_each_miss_once() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("attachments");
        local::write(root.join("A/photo.jpg"), b"x").unwrap();
        let index = AttachmentIndex::build(&root).unwrap();
        let log = dir.path().join("misses.log");
        let resolver = Resolver::new(&index, Some(log.clone()));

        assert_eq!(resolver.locate("photo.jpeg", "image"), Located::found(root.join("A/photo.jpg")));
        assert!(!log.exists());

        let guessed = resolver.locate("nothing: here.bin", "file macro");
        assert_eq!(guessed, Located::guessed(root.join("nothing here.bin")));
        let logged = local::read_to_string(&log).unwrap();
        assert_eq!(logged.lines().count(), 1);
        assert!(logged.trim_end().ends_with("MISS  nothing: here.bin  (file macro)"));
        assert_eq!(resolver.misses(), 1);
    }

    #[test]
    fn test_disabled_log_still_counts() {
        let dir = tempfile::tempdir().unwrap();
        let index = AttachmentIndex::build(dir.path()).unwrap();
        let resolver = Resolver::new(&index, None);
        resolver.locate("x.png", "image");
        assert_eq!(resolver.misses(), 1);
    }
}
