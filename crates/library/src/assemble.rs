//! Builds the offline site: one document per page plus the navigation index.
//!
//! Runs in three passes over the pages. The first settles where every
//! document goes, the second transforms every body (so blank pages are known
//! before any sidebar is rendered), the third writes the documents.

use crate::error::{ErrorKind, Result};
use crate::index::AttachmentIndex;
use crate::output::OutputLayout;
use crate::progress::{Phase, Progress};
use crate::resolve::Resolver;
use exhume_config::Config;
use exhume_descriptor::models::Page;
use exhume_descriptor::{Chain, Descriptor};
use exhume_render::{
    DocumentExporter, Documents, HrefCache, IndexNode, Installed, Navigation, PageDocument, PageEntry,
    ResourceLocator, Transformer, is_blank, sections, to_plain_text,
};
use exhume_storage::{fs as local, validate_path};
use exn::ResultExt;
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub pages: usize,
    pub blank: usize,
    /// Pages left out because their title chain could not be made into a path.
    pub skipped: usize,
    pub misses: usize,
    pub exported: usize,
}

/// A page with its place in the site settled.
struct Placed<'d> {
    page: &'d Page,
    chain: Chain,
    document: PathBuf,
    body: String,
    blank: bool,
}

pub struct Assembler<'a> {
    descriptor: &'a Descriptor,
    output: &'a OutputLayout,
    config: &'a Config,
    resources: &'a dyn ResourceLocator,
    exporter: Option<&'a mut dyn DocumentExporter>,
}

impl<'a> Assembler<'a> {
    pub fn new(
        descriptor: &'a Descriptor,
        output: &'a OutputLayout,
        config: &'a Config,
        resources: &'a dyn ResourceLocator,
    ) -> Self {
        Self { descriptor, output, config, resources, exporter: None }
    }

    pub fn with_exporter(mut self, exporter: &'a mut dyn DocumentExporter) -> Self {
        self.exporter = Some(exporter);
        self
    }

    /// Pass 1: the document path of every page, root first along its chain.
    fn place(&self) -> (Vec<Placed<'a>>, usize) {
        let other = &self.output.other;
        let mut placed = Vec::with_capacity(self.descriptor.pages.len());
        let mut skipped = 0;
        for page in self.descriptor.pages.values() {
            let chain = self.descriptor.chain(&page.id);
            match validate_path(chain.document(other)) {
                Ok(relative) => placed.push(Placed {
                    page,
                    document: self.output.html.join(relative),
                    chain,
                    body: String::new(),
                    blank: false,
                }),
                Err(err) => {
                    warn!(page = %page.id, chain = ?chain.segments(), error = ?err, "page skipped, unusable path");
                    skipped += 1;
                },
            }
        }
        (placed, skipped)
    }

    #[instrument(skip_all, fields(pages = self.descriptor.pages.len()))]
    pub fn run(mut self, progress: &mut dyn FnMut(Progress)) -> Result<Summary> {
        let assets = Installed::install(&self.output.site_assets(), self.resources).or_raise(|| ErrorKind::Transform)?;
        let index = AttachmentIndex::build(&self.output.attachments)?;
        let miss_log = self.config.transform.log_misses.then(|| self.output.miss_log.clone());
        let resolver = Resolver::new(&index, miss_log);
        let mut transformer = Transformer::new(&resolver, self.config.transform.cache_capacity());

        let (mut placed, skipped) = self.place();
        let total = placed.len();
        progress(Progress::within(Phase::Transform, 40..=45, 1, 1));

        for (done, item) in placed.iter_mut().enumerate() {
            let markup = self.descriptor.bodies.get(&item.page.id).map(String::as_str).unwrap_or_default();
            let dir = item.document.parent().unwrap_or(&self.output.html);
            item.body = transformer.transform(markup, dir);
            item.blank = is_blank(&item.body);
            progress(Progress::within(Phase::Transform, 45..=55, done + 1, total));
        }

        let navigation = Navigation::new(
            &self.output.index,
            &self.output.other,
            placed.iter().map(|p| PageEntry {
                chain: p.chain.segments().to_vec(),
                document: p.document.clone(),
                blank: p.blank,
            }),
        );
        let documents = Documents::new(assets, self.descriptor.space_key()).or_raise(|| ErrorKind::Transform)?;

        let mut summary = Summary { skipped, ..Summary::default() };
        for (done, item) in placed.iter().enumerate() {
            let attachments = self.output.attachment_folder(&Descriptor::path_title(item.page));
            let document = PageDocument {
                title: &item.page.title,
                body: &item.body,
                path: &item.document,
                attachments: &attachments,
            };
            let html = documents.page(&document, &navigation, transformer.hrefs()).or_raise(|| ErrorKind::Transform)?;
            local::write(&item.document, html).or_raise(|| ErrorKind::Write(item.document.clone()))?;
            debug!(page = %item.page.id, document = %item.document.display(), blank = item.blank, "page written");

            if let Some(exporter) = self.exporter.as_deref_mut() {
                match exporter.export(item.chain.ancestors(), item.chain.title(), &to_plain_text(&item.body)) {
                    Ok(()) => summary.exported += 1,
                    Err(err) => warn!(page = %item.page.id, error = ?err, "text export failed"),
                }
            }
            summary.pages += 1;
            summary.blank += usize::from(item.blank);
            progress(Progress::within(Phase::Transform, 55..=99, done + 1, total));
        }

        self.write_index(&documents, &placed, &navigation, transformer.hrefs())?;
        summary.misses = resolver.misses();
        info!(pages = summary.pages, blank = summary.blank, misses = summary.misses, "site assembled");
        Ok(summary)
    }

    fn write_index(
        &self,
        documents: &Documents,
        placed: &[Placed<'_>],
        navigation: &Navigation,
        hrefs: &mut HrefCache,
    ) -> Result<()> {
        let located: HashMap<&str, &PathBuf> = placed.iter().map(|p| (p.page.id.as_str(), &p.document)).collect();
        let tree = IndexTree { descriptor: self.descriptor, children: self.descriptor.children(), located, navigation };
        let mut visited = HashSet::new();
        let mut tops: Vec<IndexNode> = self
            .descriptor
            .pages
            .values()
            .filter(|page| self.descriptor.is_root(page))
            .filter_map(|page| tree.node(&page.id, &self.output.root, hrefs, &mut visited))
            .collect();
        // Pages on a parent cycle have no root above them; list each cycle
        // from the page its chain starts at.
        for item in placed {
            if visited.contains(item.page.id.as_str()) {
                continue;
            }
            let top = self.descriptor.top_ancestor(&item.page.id).unwrap_or(&item.page.id);
            tops.extend(tree.node(top, &self.output.root, hrefs, &mut visited));
        }

        let title = self.config.site.title.as_deref().unwrap_or_else(|| self.descriptor.space_key());
        let path = &self.output.index;
        let html = documents
            .index(title, &sections(tops, &self.output.other), path, hrefs)
            .or_raise(|| ErrorKind::Transform)?;
        local::write(path, html).or_raise(|| ErrorKind::Write(path.clone()))?;
        info!(index = %path.display(), "index written");
        Ok(())
    }
}

struct IndexTree<'t> {
    descriptor: &'t Descriptor,
    children: IndexMap<&'t str, Vec<&'t str>>,
    located: HashMap<&'t str, &'t PathBuf>,
    navigation: &'t Navigation,
}

impl<'t> IndexTree<'t> {
    /// The index entry for `id` and everything below it. Each page appears at
    /// most once, whatever its parent pointers claim.
    fn node(
        &self,
        id: &'t str,
        root: &Path,
        hrefs: &mut HrefCache,
        visited: &mut HashSet<&'t str>,
    ) -> Option<IndexNode> {
        if !visited.insert(id) {
            return None;
        }
        let page = self.descriptor.page(id)?;
        let document = self.located.get(id)?;
        let children = self
            .children
            .get(id)
            .map(|ids| ids.iter().filter_map(|child| self.node(*child, root, hrefs, visited)).collect())
            .unwrap_or_default();
        Some(
            IndexNode::new(&page.title, hrefs.href(root, document), self.navigation.is_blank(document))
                .with_children(children),
        )
    }
}
