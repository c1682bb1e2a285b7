//! The navigation index at the output root.

use crate::markup::escape;
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt::Write;

/// A page in the index tree, with an href relative to the index document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexNode {
    pub title: String,
    pub href: String,
    pub blank: bool,
    pub children: Vec<IndexNode>,
}

impl IndexNode {
    pub fn new(title: impl Into<String>, href: impl Into<String>, blank: bool) -> Self {
        Self { title: title.into(), href: href.into(), blank, children: Vec::new() }
    }

    /// Replaces the children, normalized the same way as top-level pages.
    pub fn with_children(mut self, children: Vec<IndexNode>) -> Self {
        self.children = normalize(children);
        self
    }

    fn write_item(&self, out: &mut String) {
        let class = if self.blank { " class='blank'" } else { "" };
        let _ = write!(
            out,
            "<li{class}><a href='{}' target='_blank' rel='noopener'>{}</a>",
            escape::attr(&self.href).replace('\'', "&#39;"),
            escape::text(&self.title),
        );
        if !self.children.is_empty() {
            out.push_str("<ul>");
            for child in &self.children {
                child.write_item(out);
            }
            out.push_str("</ul>");
        }
        out.push_str("</li>");
    }
}

/// Collapses siblings with the same title, keeping the last one seen, then
/// sorts them case-insensitively.
fn normalize(nodes: Vec<IndexNode>) -> Vec<IndexNode> {
    let mut unique: IndexMap<String, IndexNode> = IndexMap::with_capacity(nodes.len());
    for node in nodes {
        unique.insert(node.title.clone(), node);
    }
    let mut nodes: Vec<IndexNode> = unique.into_values().collect();
    nodes.sort_by_cached_key(|node| node.title.to_lowercase());
    nodes
}

/// One collapsible section of the index, with its tree pre-rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexSection {
    pub title: String,
    pub tree: String,
}

/// Splits top-level pages into sections.
///
/// Every top-level page with children gets a section of its own holding the
/// page and its subtree. Childless top-level pages are listed together in a
/// final section titled `other`.
pub fn sections(tops: Vec<IndexNode>, other: &str) -> Vec<IndexSection> {
    let mut sections = Vec::new();
    let mut leftovers = String::new();
    for top in normalize(tops) {
        if top.children.is_empty() {
            top.write_item(&mut leftovers);
            continue;
        }
        let mut tree = String::from("<ul class='root'>");
        top.write_item(&mut tree);
        tree.push_str("</ul>");
        sections.push(IndexSection { title: top.title, tree });
    }
    if !leftovers.is_empty() {
        sections.push(IndexSection { title: other.to_string(), tree: format!("<ul class='root'>{leftovers}</ul>") });
    }
    sections
}
