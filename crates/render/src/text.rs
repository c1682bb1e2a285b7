//! Plain text from transformed bodies.

use crate::consts::{BLANK_LINES_REGEX, BREAK_REGEX, PARAGRAPH_END_REGEX, TAG_REGEX};
use crate::error::{ErrorKind, Result};
use exhume_storage::{fs as local, sanitize};
use exn::ResultExt;
use scraper::Html;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Strips markup from `html`, keeping line and paragraph breaks.
pub fn to_plain_text(html: &str) -> String {
    let text = BREAK_REGEX.replace_all(html, "\n");
    let text = PARAGRAPH_END_REGEX.replace_all(&text, "\n\n");
    let text = TAG_REGEX.replace_all(&text, "");
    BLANK_LINES_REGEX.replace_all(&text, "\n\n").trim().to_string()
}

/// Whether `html` has no visible text at all.
pub fn is_blank(html: &str) -> bool {
    Html::parse_fragment(html).root_element().text().all(|t| t.trim().is_empty())
}

/// Receives the plain text of every page.
pub trait DocumentExporter {
    /// `chain` holds the page's ancestors' titles, root first, without the
    /// page itself.
    fn export(&mut self, chain: &[String], title: &str, text: &str) -> Result<()>;
}

/// Writes each page to `<dir>/<ancestors…>/<title>.txt`.
#[derive(Debug, Clone)]
pub struct TextExporter {
    dir: PathBuf,
    written: usize,
}

impl TextExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), written: 0 }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn written(&self) -> usize {
        self.written
    }
}

impl DocumentExporter for TextExporter {
    fn export(&mut self, chain: &[String], title: &str, text: &str) -> Result<()> {
        let mut target = chain.iter().fold(self.dir.clone(), |dir, segment| dir.join(sanitize(segment)));
        target.push(format!("{}.txt", sanitize(title)));
        local::write(&target, text).or_raise(|| ErrorKind::Export(target.clone()))?;
        debug!(target = %target.display(), "exported text");
        self.written += 1;
        Ok(())
    }
}
