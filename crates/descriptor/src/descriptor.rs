use crate::consts::{self, CLASS_ATTACHMENT, CLASS_ATTACHMENT_VERSIONS, CLASS_BODY, CLASS_PAGE, CLASS_SPACE};
use crate::error::Result;
use crate::models::{Attachment, AttachmentVersion, Body, Page, Space};
use crate::record::{self, Record};
use indexmap::IndexMap;
use std::collections::HashMap;
use tracing::debug;

/// Everything the rest of the pipeline needs from a descriptor file.
///
/// Every map is keyed by the id as written in the export and keeps document
/// order, so iteration is stable from one run to the next.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Descriptor {
    pub spaces: IndexMap<String, Space>,
    pub pages: IndexMap<String, Page>,
    /// Attachment id to its declared title.
    pub attachment_titles: IndexMap<String, String>,
    /// Attachment id to the id of the page that owns it.
    pub attachment_pages: IndexMap<String, String>,
    /// Attachment id to the filename of its winning version row.
    pub attachment_files: IndexMap<String, String>,
    /// Page id to its storage markup.
    pub bodies: IndexMap<String, String>,
}

impl Descriptor {
    pub fn is_empty(&self) -> bool {
        self.spaces.is_empty() && self.pages.is_empty() && self.attachment_files.is_empty()
    }

    pub fn page(&self, id: &str) -> Option<&Page> {
        self.pages.get(id)
    }

    /// The declared filename of an attachment, falling back to its title.
    pub fn attachment_name(&self, id: &str) -> Option<&str> {
        self.attachment_files.get(id).or_else(|| self.attachment_titles.get(id)).map(String::as_str)
    }

    pub(crate) fn read(bytes: &[u8]) -> Result<Self> {
        let mut builder = Builder::default();
        record::for_each_object(bytes, |record| builder.accept(&record))?;
        Ok(builder.descriptor)
    }

    /// Fills gaps from a standalone page document (`pages/*.xml`).
    ///
    /// The document's page object (or its root, when it has none) supplies
    /// the id, title, parent and storage body. Only what the descriptor
    /// lacks is taken: a missing page, a parent, a declared title in place
    /// of the `page_<id>` fallback, a body. Returns the page id, or `None`
    /// when the document names no page.
    pub fn merge_page_document(&mut self, bytes: &[u8]) -> Result<Option<String>> {
        let Some(root) = record::read_root(bytes)? else {
            return Ok(None);
        };
        let record = root.find_class(CLASS_PAGE).unwrap_or(&root);
        let Some(id) = record.pick(consts::ID) else {
            return Ok(None);
        };
        let title = record.pick(consts::TITLE);
        let parent_id = record.pick(consts::PAGE_PARENT);

        let page = self.pages.entry(id.clone()).or_insert_with(|| Page {
            id: id.clone(),
            title: Page::fallback_title(&id),
            space_id: None,
            parent_id: None,
        });
        if let Some(title) = title.filter(|_| page.title == Page::fallback_title(&id)) {
            page.title = title;
        }
        if page.parent_id.is_none() {
            page.parent_id = parent_id;
        }
        if let Some(markup) = record.pick(consts::PAGE_DOCUMENT_BODY) {
            let body = self.bodies.entry(id.clone()).or_default();
            if body.trim().is_empty() {
                *body = markup;
            }
        }
        debug!(page = %id, "merged page document");
        Ok(Some(id))
    }
}

#[derive(Default)]
struct Builder {
    descriptor: Descriptor,
    // Rank of the version row currently held in `attachment_files`.
    versions: HashMap<String, Option<u64>>,
}

impl Builder {
    fn accept(&mut self, record: &Record) {
        let Some(class) = record.class.as_deref() else {
            return;
        };
        let d = &mut self.descriptor;
        match class {
            CLASS_SPACE => {
                if let Some(space) = Space::from_record(record) {
                    d.spaces.insert(space.id.clone(), space);
                }
            },
            CLASS_PAGE => {
                if let Some(page) = Page::from_record(record) {
                    d.pages.insert(page.id.clone(), page);
                }
            },
            CLASS_ATTACHMENT => {
                if let Some(Attachment { id, title, page_id }) = Attachment::from_record(record) {
                    if let Some(title) = title {
                        d.attachment_titles.insert(id.clone(), title);
                    }
                    if let Some(page_id) = page_id {
                        d.attachment_pages.insert(id, page_id);
                    }
                }
            },
            CLASS_BODY => {
                if let Some(Body { page_id, markup }) = Body::from_record(record) {
                    d.bodies.insert(page_id, markup);
                }
            },
            class if CLASS_ATTACHMENT_VERSIONS.contains(&class) => {
                let Some(row) = AttachmentVersion::from_record(record) else {
                    return;
                };
                let current = self.versions.get(&row.attachment_id).copied();
                if current.is_none_or(|rank| row.supersedes(rank)) {
                    debug!(attachment = %row.attachment_id, file = %row.file_name, version = ?row.version, "version row");
                    self.versions.insert(row.attachment_id.clone(), row.version);
                    d.attachment_files.insert(row.attachment_id, row.file_name);
                }
            },
            _ => {},
        }
    }
}
