//! Space selection and page ancestry.

use crate::descriptor::Descriptor;
use crate::models::Page;
use exhume_storage::sanitize;
use indexmap::{IndexMap, IndexSet};
use std::cmp::Ordering;
use std::path::PathBuf;
use tracing::{debug, warn};

/// The space key used when a descriptor declares no spaces at all.
pub const UNKNOWN_SPACE: &str = "UnknownSpace";
/// The chain given to a page that cannot be placed anywhere else.
pub const OTHER: &str = "Other";

/// Compares ids numerically when both are integers, lexically otherwise.
fn compare_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        _ => a.cmp(b),
    }
}

/// A page's sanitized ancestor titles, root first, ending with the page's
/// own title. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Chain(Vec<String>);

impl Chain {
    pub fn new(segments: Vec<String>) -> Self {
        match segments.is_empty() {
            true => Self(vec![OTHER.to_string()]),
            false => Self(segments),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// The page's own (sanitized) title.
    pub fn title(&self) -> &str {
        self.0.last().map(String::as_str).unwrap_or(OTHER)
    }

    /// The top-level ancestor, which is the page itself for a root page.
    pub fn root(&self) -> &str {
        self.0.first().map(String::as_str).unwrap_or(OTHER)
    }

    /// The ancestors, without the page itself.
    pub fn ancestors(&self) -> &[String] {
        &self.0[..self.0.len().saturating_sub(1)]
    }

    /// Whether the page has no ancestors.
    pub fn is_root(&self) -> bool {
        self.0.len() <= 1
    }

    /// The directory a page's document lives in, relative to the document
    /// root. Root pages are collected under `other`.
    pub fn dir(&self, other: &str) -> PathBuf {
        match self.is_root() {
            true => PathBuf::from(other),
            false => self.ancestors().iter().collect(),
        }
    }

    /// The document path relative to the document root.
    pub fn document(&self, other: &str) -> PathBuf {
        self.dir(other).join(format!("{}.html", self.title()))
    }
}

impl Descriptor {
    /// The key of the space this export is mostly about.
    ///
    /// A single space wins outright. Otherwise the space referenced by the
    /// most pages wins, with ties (and exports where no page references a
    /// known space) going to the lowest space id.
    pub fn space_key(&self) -> &str {
        if self.spaces.len() == 1 {
            return self.spaces.values().next().map(|s| s.key.as_str()).unwrap_or(UNKNOWN_SPACE);
        }

        let mut counts: IndexMap<&str, usize> = IndexMap::new();
        for space_id in self.pages.values().filter_map(|p| p.space_id.as_deref()) {
            if self.spaces.contains_key(space_id) {
                *counts.entry(space_id).or_default() += 1;
            }
        }
        let best = counts
            .iter()
            .max_by(|(a, a_count), (b, b_count)| a_count.cmp(b_count).then_with(|| compare_ids(b, a)))
            .map(|(id, _)| *id)
            .or_else(|| self.spaces.keys().map(String::as_str).min_by(|a, b| compare_ids(a, b)));

        match best.and_then(|id| self.spaces.get(id)) {
            Some(space) => space.key.as_str(),
            None => UNKNOWN_SPACE,
        }
    }

    /// The sanitized title used in paths for one page.
    ///
    /// Titles that sanitize to nothing, or to dots only (`.`, `..`), cannot
    /// name a directory and fall back to `page_<id>`.
    pub fn path_title(page: &Page) -> String {
        let title = sanitize(&page.title);
        match title.chars().all(|c| c == '.') {
            true => Page::fallback_title(&page.id),
            false => title,
        }
    }

    /// Builds the title chain of `page_id` by following parent pointers.
    ///
    /// The walk stops at a missing parent, at a parent id with no page
    /// behind it, and at any page it has already visited, so cyclic parent
    /// pointers still produce a finite chain.
    pub fn chain(&self, page_id: &str) -> Chain {
        let mut visited: IndexSet<&str> = IndexSet::new();
        let mut titles = Vec::new();
        let mut current = Some(page_id);
        while let Some(id) = current {
            let Some(page) = self.pages.get(id) else {
                break;
            };
            if !visited.insert(page.id.as_str()) {
                warn!(page = %page_id, at = %id, "cycle in parent pointers");
                break;
            }
            titles.push(Self::path_title(page));
            current = page.parent_id.as_deref();
        }
        titles.reverse();
        let chain = Chain::new(titles);
        debug!(page = %page_id, chain = ?chain.segments(), "resolved chain");
        chain
    }

    /// The id of the first page in `page_id`'s chain: the page reached by
    /// following parent pointers until one is missing or revisited.
    pub fn top_ancestor(&self, page_id: &str) -> Option<&str> {
        let mut visited: IndexSet<&str> = IndexSet::new();
        let mut current = self.pages.get(page_id);
        while let Some(page) = current {
            if !visited.insert(page.id.as_str()) {
                break;
            }
            current = page.parent_id.as_deref().and_then(|parent| self.pages.get(parent));
        }
        visited.last().copied()
    }

    /// Whether a page sits at the top of the tree: it has no parent, or its
    /// parent id does not name a page in this descriptor.
    pub fn is_root(&self, page: &Page) -> bool {
        page.parent_id.as_deref().is_none_or(|parent| !self.pages.contains_key(parent))
    }

    /// Child page ids per parent id, in document order.
    pub fn children(&self) -> IndexMap<&str, Vec<&str>> {
        let mut children: IndexMap<&str, Vec<&str>> = IndexMap::new();
        for page in self.pages.values().filter(|p| !self.is_root(p)) {
            if let Some(parent) = page.parent_id.as_deref() {
                children.entry(parent).or_default().push(page.id.as_str());
            }
        }
        children
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::tests::EXPORT;
    use crate::models::Space;
    use rstest::rstest;

    fn page(id: &str, title: &str, parent: Option<&str>, space: Option<&str>) -> Page {
        Page {
            id: id.into(),
            title: title.into(),
            parent_id: parent.map(Into::into),
            space_id: space.map(Into::into),
        }
    }

    fn descriptor(spaces: &[(&str, &str)], pages: Vec<Page>) -> Descriptor {
        Descriptor {
            spaces: spaces.iter().map(|(id, key)| (id.to_string(), Space { id: id.to_string(), key: key.to_string() })).collect(),
            pages: pages.into_iter().map(|p| (p.id.clone(), p)).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_space_key_single() {
        let d = Descriptor::read(EXPORT.as_bytes()).unwrap();
        assert_eq!(d.space_key(), "ENG");
    }

    #[test]
    fn test_space_key_unknown() {
        assert_eq!(Descriptor::default().space_key(), UNKNOWN_SPACE);
    }

    #[test]
    fn test_space_key_most_referenced() {
        let d = descriptor(
            &[("1", "ONE"), ("2", "TWO")],
            vec![page("a", "A", None, Some("2")), page("b", "B", None, Some("2")), page("c", "C", None, Some("1"))],
        );
        assert_eq!(d.space_key(), "TWO");
    }

    #[rstest]
    #[case(&[("10", "TEN"), ("9", "NINE")], "NINE")]
    #[case(&[("b", "BEE"), ("a", "AY")], "AY")]
    fn test_space_key_tie_goes_to_lowest_id(#[case] spaces: &[(&str, &str)], #[case] expected: &str) {
        let pages = spaces
            .iter()
            .enumerate()
            .map(|(i, (id, _))| page(&i.to_string(), "P", None, Some(id)))
            .collect();
        assert_eq!(descriptor(spaces, pages).space_key(), expected);
    }

    #[test]
    fn test_space_key_unreferenced_goes_to_lowest_id() {
        let d = descriptor(&[("20", "LATER"), ("3", "EARLY")], vec![page("a", "A", None, Some("404"))]);
        assert_eq!(d.space_key(), "EARLY");
    }

    #[test]
    fn test_chain_root_first() {
        let d = Descriptor::read(EXPORT.as_bytes()).unwrap();
        assert_eq!(d.chain("2").segments(), ["A", "B"]);
        assert_eq!(d.chain("1").segments(), ["A"]);
        assert_eq!(d.chain("2"), d.chain("2"));
    }

    #[test]
    fn test_chain_survives_cycles() {
        let d = descriptor(
            &[],
            vec![page("1", "One", Some("3"), None), page("2", "Two", Some("1"), None), page("3", "Three", Some("2"), None)],
        );
        assert_eq!(d.chain("1").segments(), ["Two", "Three", "One"]);
        let selfish = descriptor(&[], vec![page("1", "Me", Some("1"), None)]);
        assert_eq!(selfish.chain("1").segments(), ["Me"]);
    }

    #[test]
    fn test_chain_unknown_parent_is_root() {
        let d = descriptor(&[], vec![page("1", "Orphan", Some("999"), None)]);
        assert_eq!(d.chain("1").segments(), ["Orphan"]);
        assert!(d.is_root(&d.pages["1"]));
        assert!(d.children().is_empty());
    }

    #[test]
    fn test_chain_unknown_page_is_other() {
        assert_eq!(Descriptor::default().chain("42").segments(), [OTHER]);
    }

    #[test]
    fn test_chain_sanitizes_titles() {
        let d = descriptor(&[], vec![page("1", "What? / Why:", None, None), page("2", "???", Some("1"), None)]);
        assert_eq!(d.chain("2").segments(), ["What Why", "page_2"]);
    }

    #[rstest]
    #[case("..")]
    #[case(".")]
    #[case(" / .. ")]
    fn test_dot_titles_fall_back_to_id(#[case] title: &str) {
        let d = descriptor(&[], vec![page("1", title, None, None), page("2", "Child", Some("1"), None)]);
        assert_eq!(d.chain("2").segments(), ["page_1", "Child"]);
        assert_eq!(d.chain("2").document("Other"), PathBuf::from("page_1/Child.html"));
    }

    #[test]
    fn test_top_ancestor() {
        let d = descriptor(
            &[],
            vec![
                page("1", "Root", None, None),
                page("2", "Child", Some("1"), None),
                page("7", "Seven", Some("8"), None),
                page("8", "Eight", Some("7"), None),
            ],
        );
        assert_eq!(d.top_ancestor("2"), Some("1"));
        assert_eq!(d.top_ancestor("1"), Some("1"));
        assert_eq!(d.top_ancestor("7"), Some("8"));
        assert_eq!(d.top_ancestor("8"), Some("7"));
        assert_eq!(d.top_ancestor("404"), None);
    }

    #[rstest]
    #[case(&["A"], "Other", "Other/A.html")]
    #[case(&["A", "B"], "Other", "A/B.html")]
    #[case(&["A", "B", "C"], "Misc", "A/B/C.html")]
    fn test_chain_document(#[case] segments: &[&str], #[case] other: &str, #[case] expected: &str) {
        let chain = Chain::new(segments.iter().map(|s| s.to_string()).collect());
        assert_eq!(chain.document(other), PathBuf::from(expected));
    }

    #[test]
    fn test_children_in_document_order() {
        let d = descriptor(
            &[],
            vec![page("1", "Root", None, None), page("3", "Second", Some("1"), None), page("2", "First", Some("1"), None)],
        );
        assert_eq!(d.children()["1"], vec!["3", "2"]);
    }
}
