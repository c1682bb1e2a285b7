use crate::consts;
use crate::record::Record;

/// A single page.
///
/// `parent_id` comes straight from the export and is not trusted: it may be
/// missing, point at a page that does not exist, or form a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub id: String,
    /// The declared title, or `page_<id>` when the record has none.
    pub title: String,
    pub space_id: Option<String>,
    pub parent_id: Option<String>,
}

impl Page {
    pub(crate) fn from_record(record: &Record) -> Option<Self> {
        let id = record.pick(consts::ID)?;
        Some(Self {
            title: record.pick(consts::TITLE).unwrap_or_else(|| Self::fallback_title(&id)),
            space_id: record.pick(consts::PAGE_SPACE),
            parent_id: record.pick(consts::PAGE_PARENT),
            id,
        })
    }

    /// The title used for a page that never declared one.
    pub fn fallback_title(id: &str) -> String {
        format!("page_{id}")
    }
}

/// A page's storage-format markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Body {
    pub page_id: String,
    pub markup: String,
}

impl Body {
    pub(crate) fn from_record(record: &Record) -> Option<Self> {
        Some(Self { page_id: record.pick(consts::BODY_CONTENT)?, markup: record.pick(consts::BODY_TEXT)? })
    }
}
