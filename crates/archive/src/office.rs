//! Detection of office documents hiding inside zip containers.

use std::io::Cursor;
use zip::ZipArchive;

const CONTENT_TYPES: &str = "[Content_Types].xml";

/// The kind of office document packaged in a zip container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OfficeKind {
    /// Word-processing document (`word/` parts)
    Document,
    /// Spreadsheet (`xl/` parts)
    Workbook,
    /// Presentation (`ppt/` parts)
    Presentation,
}

impl OfficeKind {
    /// Inspects a zip container's entry names.
    ///
    /// A container qualifies when it has a content-types manifest and at
    /// least one part under `word/`, `xl/` or `ppt/`, checked in that order.
    /// Anything that is not a readable zip is simply not an office document.
    #[must_use]
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        let archive = ZipArchive::new(Cursor::new(bytes)).ok()?;
        Self::from_entry_names(archive.file_names())
    }

    pub(crate) fn from_entry_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Option<Self> {
        let names: Vec<&str> = names.into_iter().collect();
        if !names.iter().any(|n| n.ends_with(CONTENT_TYPES)) {
            return None;
        }
        [("word/", OfficeKind::Document), ("xl/", OfficeKind::Workbook), ("ppt/", OfficeKind::Presentation)]
            .into_iter()
            .find(|(prefix, _)| names.iter().any(|n| n.starts_with(prefix)))
            .map(|(_, kind)| kind)
    }

    /// The document extension (with its dot).
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            OfficeKind::Document => ".docx",
            OfficeKind::Workbook => ".xlsx",
            OfficeKind::Presentation => ".pptx",
        }
    }

    /// Whether `ext` (lowercase, with its dot) already names an office
    /// document, legacy binary formats included.
    #[must_use]
    pub fn is_office_extension(ext: &str) -> bool {
        matches!(ext, ".doc" | ".docx" | ".xls" | ".xlsx" | ".ppt" | ".pptx")
    }
}
