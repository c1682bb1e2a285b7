//! Storage markup to plain HTML.
//!
//! Page bodies mix ordinary HTML with prefixed elements (`ac:*` macros and
//! `ri:*` resource identifiers). The transformer parses a body as an HTML
//! fragment and writes it back out, replacing file macros, media, images and
//! links with elements that point at restored attachments through relative
//! hrefs. Any other prefixed element is unwrapped so only its children
//! remain.

mod elements;
pub(crate) mod escape;
mod preprocess;

use crate::href::HrefCache;
use scraper::Html;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use tracing::instrument;

/// Resolves attachment references to restored files.
pub trait AttachmentLookup {
    /// The directory that restored attachments live under.
    fn root(&self) -> &Path;

    /// Finds the restored file for `filename`. `context` describes the kind of
    /// reference, for diagnostics. On a miss the returned path is a best guess
    /// that may not exist.
    fn locate(&self, filename: &str, context: &str) -> Located;
}

/// The outcome of an attachment lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located {
    pub path: PathBuf,
    pub found: bool,
}

impl Located {
    pub fn found(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), found: true }
    }

    pub fn guessed(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), found: false }
    }
}

/// Rewrites page bodies, sharing one href cache across every page of a run.
pub struct Transformer<'a, L: AttachmentLookup + ?Sized> {
    lookup: &'a L,
    hrefs: HrefCache,
}

impl<'a, L: AttachmentLookup + ?Sized> Transformer<'a, L> {
    pub fn new(lookup: &'a L, cache_capacity: NonZeroUsize) -> Self {
        Self { lookup, hrefs: HrefCache::new(cache_capacity) }
    }

    /// The cache used for every relative link, also available to callers
    /// building navigation for the same pages.
    pub fn hrefs(&mut self) -> &mut HrefCache {
        &mut self.hrefs
    }

    pub fn lookup(&self) -> &'a L {
        self.lookup
    }

    /// Transforms one body for a document that will be written into
    /// `page_dir`.
    #[instrument(skip_all, fields(dir = %page_dir.display(), size = markup.len()))]
    pub fn transform(&mut self, markup: &str, page_dir: &Path) -> String {
        let prepared = preprocess::prepare(markup);
        let fragment = Html::parse_fragment(&prepared);
        let mut writer = elements::Writer::new(self.lookup, &mut self.hrefs, page_dir, prepared.len());
        writer.children(fragment.root_element());
        writer.finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;

    /// A lookup over a fixed set of files, recording every miss.
    pub(crate) struct FakeLookup {
        pub(crate) root: PathBuf,
        pub(crate) files: HashMap<String, PathBuf>,
        pub(crate) misses: std::cell::RefCell<Vec<(String, String)>>,
    }

    impl FakeLookup {
        pub(crate) fn new(files: &[&str]) -> Self {
            let root = PathBuf::from("/out/attachments");
            Self {
                files: files.iter().map(|f| (f.rsplit('/').next().unwrap().to_lowercase(), root.join(f))).collect(),
                root,
                misses: Default::default(),
            }
        }
    }

    impl AttachmentLookup for FakeLookup {
        fn root(&self) -> &Path {
            &self.root
        }

        fn locate(&self, filename: &str, context: &str) -> Located {
            match self.files.get(&filename.to_lowercase()) {
                Some(path) => Located::found(path),
                None => {
                    self.misses.borrow_mut().push((filename.to_string(), context.to_string()));
                    Located::guessed(self.root.join(filename))
                },
            }
        }
    }

    pub(crate) fn transform(lookup: &FakeLookup, markup: &str) -> String {
        let mut transformer = Transformer::new(lookup, NonZeroUsize::new(16).unwrap());
        transformer.transform(markup, Path::new("/out/html_pages/A"))
    }

    #[test]
    fn test_plain_html_survives() {
        let lookup = FakeLookup::new(&[]);
        let html = r#"<h1 id="top">Title</h1><p>One &amp; <b>two</b><br>three</p><table><tbody><tr><td>x</td></tr></tbody></table>"#;
        assert_eq!(transform(&lookup, html), html);
    }

    #[test]
    fn test_unknown_prefixed_elements_are_unwrapped() {
        let lookup = FakeLookup::new(&[]);
        let html = r#"<ac:structured-macro ac:name="info"><ac:rich-text-body><p>Careful</p></ac:rich-text-body></ac:structured-macro>"#;
        assert_eq!(transform(&lookup, html), "<p>Careful</p>");
    }

    #[test]
    fn test_prefixed_attributes_are_dropped() {
        let lookup = FakeLookup::new(&[]);
        assert_eq!(transform(&lookup, r#"<p ac:local-id="x1" class="c">hi</p>"#), r#"<p class="c">hi</p>"#);
    }

    #[test]
    fn test_cdata_code_becomes_text() {
        let lookup = FakeLookup::new(&[]);
        let html = r#"<ac:structured-macro ac:name="code"><ac:plain-text-body><![CDATA[if a < b { c(); }]]></ac:plain-text-body></ac:structured-macro>"#;
        assert_eq!(transform(&lookup, html), "if a &lt; b { c(); }");
    }

    #[test]
    fn test_self_closing_resource_does_not_swallow_siblings() {
        let lookup = FakeLookup::new(&["B/diagram.png"]);
        let html = r#"<ac:image><ri:attachment ri:filename="diagram.png"/></ac:image><p>after</p>"#;
        let out = transform(&lookup, html);
        assert!(out.ends_with("</figure><p>after</p>"), "{out}");
    }
}
