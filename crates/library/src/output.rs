//! Where everything lands under the output root.

use exhume_config::Layout;
use exhume_storage::sanitize;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use time::macros::format_description;

/// Folder below the attachment directory that holds site assets.
pub const SITE_DIR: &str = "_site";
pub const INDEX_DOCUMENT: &str = "index.html";

/// Absolute output paths for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    pub root: PathBuf,
    pub attachments: PathBuf,
    pub html: PathBuf,
    pub index: PathBuf,
    pub miss_log: PathBuf,
    /// Bucket for pages and attachments with no better home.
    pub other: String,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>, layout: &Layout) -> Self {
        let root = root.into();
        Self {
            attachments: root.join(&layout.attachment_dir),
            html: root.join(&layout.html_dir),
            index: root.join(INDEX_DOCUMENT),
            miss_log: root.join(&layout.miss_log),
            other: layout.other_bucket.clone(),
            root,
        }
    }

    pub fn site_assets(&self) -> PathBuf {
        self.attachments.join(SITE_DIR)
    }

    /// The restored-attachment folder of a page, by its sanitized title.
    pub fn attachment_folder(&self, title: &str) -> PathBuf {
        self.attachments.join(title)
    }
}

/// The output root used when none is given: a timestamped sibling of the
/// input named after the space, `<parent>/<YYYYmmddHHMMSS>_<space>`.
pub fn default_root(input: &Path, space_key: &str, now: OffsetDateTime) -> PathBuf {
    let stamp = now
        .format(format_description!("[year][month][day][hour][minute][second]"))
        .unwrap_or_else(|_| now.unix_timestamp().to_string());
    let key = match sanitize(space_key) {
        key if key.is_empty() || key == "." || key == ".." => "export".to_string(),
        key => key,
    };
    let parent = input.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    parent.join(format!("{stamp}_{key}"))
}

/// The current local time, falling back to UTC where the local offset is
/// unavailable.
pub(crate) fn now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}
