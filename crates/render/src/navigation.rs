//! The per-run navigation context shared by every page document.
//!
//! All pages are registered before any document is written, so each sidebar
//! lists the whole site. The context is built fresh for every transform pass
//! and passed explicitly to whoever renders documents.

use crate::href::HrefCache;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One page as the navigation sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageEntry {
    /// Sanitized titles from the root down to this page.
    pub chain: Vec<String>,
    /// Where the page document will be written.
    pub document: PathBuf,
    /// Whether the transformed body has no visible text.
    pub blank: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SidebarItem {
    pub label: String,
    pub href: String,
    pub current: bool,
    pub blank: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SidebarGroup {
    pub label: String,
    pub items: Vec<SidebarItem>,
}

/// The sidebar of one page document, with every href relative to that page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sidebar {
    pub top: String,
    pub groups: Vec<SidebarGroup>,
}

pub struct Navigation {
    index: PathBuf,
    /// `(group label, [(item label, document)])`, both levels already sorted.
    groups: Vec<(String, Vec<(String, PathBuf)>)>,
    blank: HashMap<PathBuf, bool>,
}

impl Navigation {
    /// Builds the context from every page of the run.
    ///
    /// Pages are grouped by the first title of their chain. Pages without
    /// ancestors are grouped under `other`, which always sorts last. Within a
    /// group, a title seen twice keeps its most recent document. A document
    /// path shared by several pages is blank only if all of them are.
    pub fn new(index: impl Into<PathBuf>, other: &str, entries: impl IntoIterator<Item = PageEntry>) -> Self {
        let mut latest: IndexMap<(String, String), PathBuf> = IndexMap::new();
        let mut blank: HashMap<PathBuf, bool> = HashMap::new();
        for entry in entries {
            let group = match entry.chain.as_slice() {
                [root, _, ..] => root.clone(),
                _ => other.to_string(),
            };
            let title = entry.chain.last().cloned().unwrap_or_else(|| other.to_string());
            blank.entry(entry.document.clone()).and_modify(|b| *b &= entry.blank).or_insert(entry.blank);
            latest.insert((group, title), entry.document);
        }

        let mut grouped: IndexMap<String, Vec<(String, PathBuf)>> = IndexMap::new();
        for ((group, title), document) in latest {
            grouped.entry(group).or_default().push((title, document));
        }
        let mut groups: Vec<_> = grouped.into_iter().collect();
        groups.sort_by(|(a, _), (b, _)| (a == other, a).cmp(&(b == other, b)));
        for (_, items) in &mut groups {
            items.sort_by(|(a, _), (b, _)| a.cmp(b));
        }
        debug!(groups = groups.len(), documents = blank.len(), "navigation built");

        Self { index: index.into(), groups, blank }
    }

    pub fn index(&self) -> &Path {
        &self.index
    }

    pub fn is_blank(&self, document: &Path) -> bool {
        self.blank.get(document).copied().unwrap_or(false)
    }

    /// The sidebar for the document at `current`, which lives in `page_dir`.
    pub fn sidebar(&self, page_dir: &Path, current: &Path, hrefs: &mut HrefCache) -> Sidebar {
        let groups = self
            .groups
            .iter()
            .map(|(label, items)| SidebarGroup {
                label: label.clone(),
                items: items
                    .iter()
                    .map(|(title, document)| SidebarItem {
                        label: title.clone(),
                        href: hrefs.href(page_dir, document),
                        current: document == current,
                        blank: self.is_blank(document),
                    })
                    .collect(),
            })
            .collect();
        Sidebar { top: hrefs.href(page_dir, &self.index), groups }
    }
}
