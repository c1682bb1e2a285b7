//! Attachment restoration.
//!
//! Raw attachment entries are stored as `{pageId}/{attachmentId}/{version}`
//! with no usable name. Each one is given a readable name from the
//! descriptor, an extension from the best available evidence, and a home in
//! the folder of the page that owns it.

use crate::error::{ErrorKind, Result};
use crate::output::OutputLayout;
use exhume_archive::{Mime, OfficeKind};
use exhume_descriptor::Descriptor;
use exhume_descriptor::models::Page;
use exhume_storage::{
    extension, fs as local, normalize_name, sanitize, split_name, strip_any_ext, unique_path_with, validate_path,
};
use exn::ResultExt;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Suffix of the marker file recording which page a restored file belongs to.
pub const SIDECAR_SUFFIX: &str = ".path.txt";
/// Line prefix inside a marker file.
pub const PAGE_TITLE_PREFIX: &str = "PageTitle:";
const ZIP_EXTENSION: &str = ".zip";
const DEFAULT_STEM: &str = "attachment";

/// The marker path for a restored file: `<name>.path.txt` beside it.
pub fn sidecar_for(file: &Path) -> PathBuf {
    let mut name = file.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(SIDECAR_SUFFIX);
    file.with_file_name(name)
}

/// Why an entry was not restored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skip {
    /// A bare archive, by name or by content.
    Archive,
    /// The destination could not be made into a safe path.
    UnsafePath,
}

/// What happened to one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Dry run: where the entry would have been written.
    Planned(PathBuf),
    Restored(PathBuf),
    Skipped(Skip),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub restored: usize,
    pub planned: usize,
    pub skipped: usize,
    /// Entries that could not be read or written.
    pub failed: usize,
}

impl Summary {
    pub(crate) fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Planned(_) => self.planned += 1,
            Outcome::Restored(_) => self.restored += 1,
            Outcome::Skipped(_) => self.skipped += 1,
        }
    }
}

/// Chooses the final filename for an entry, or the reason to skip it.
///
/// The stem comes from `title` (else the entry's own name) with any trailing
/// extension removed. The extension is the first of: the declared filename's
/// extension, the entry's own extension, the sniffed type's extension, each
/// only when the stem does not already end with it. A zip that turns out to
/// be an office document forces the matching office extension, unless an
/// office extension was already chosen.
pub fn final_name(
    entry_name: &str,
    title: Option<&str>,
    declared: Option<&str>,
    data: &[u8],
    skip_archives: bool,
) -> std::result::Result<String, Skip> {
    let leaf = sanitize(entry_name);
    let leaf_ext = extension(&leaf);
    let declared_ext = declared.and_then(extension);
    if skip_archives && (leaf_ext.as_deref() == Some(ZIP_EXTENSION) || declared_ext.as_deref() == Some(ZIP_EXTENSION)) {
        return Err(Skip::Archive);
    }

    let mime = Mime::sniff(data);
    let office = match mime {
        Some(mime) if mime.is_archive() => match OfficeKind::detect(data) {
            Some(kind) => Some(kind),
            None if skip_archives => return Err(Skip::Archive),
            None => None,
        },
        _ => None,
    };

    let source = title.map(sanitize).filter(|t| !t.is_empty()).unwrap_or_else(|| split_name(&leaf).0.to_string());
    let stem = match strip_any_ext(&source).trim() {
        "" => DEFAULT_STEM.to_string(),
        stem => stem.to_string(),
    };
    let lower = stem.to_lowercase();
    let missing = |ext: &str| !lower.ends_with(ext);

    let mut ext = match (declared_ext, leaf_ext) {
        (Some(declared), _) => missing(declared.as_str()).then_some(declared),
        (None, Some(own)) if missing(own.as_str()) => Some(own),
        _ => mime.map(|m| m.extension()).filter(|e| missing(*e)).map(str::to_string),
    };
    if let Some(kind) = office {
        let chosen = ext.clone().or_else(|| extension(&stem));
        if !chosen.as_deref().is_some_and(OfficeKind::is_office_extension) && missing(kind.extension()) {
            debug!(entry = %entry_name, kind = ?kind, "office container overrides extension");
            ext = Some(kind.extension().to_string());
        }
    }
    Ok(format!("{stem}{}", ext.unwrap_or_default()))
}

/// Restores entries one at a time into an output layout.
pub struct Restorer<'a> {
    descriptor: &'a Descriptor,
    output: &'a OutputLayout,
    dry_run: bool,
    sidecars: bool,
    skip_archives: bool,
    normalize_names: bool,
    /// Destinations handed out during a dry run, which never reach the disk.
    planned: HashSet<PathBuf>,
}

impl<'a> Restorer<'a> {
    pub fn new(descriptor: &'a Descriptor, output: &'a OutputLayout, dry_run: bool) -> Self {
        Self {
            descriptor,
            output,
            dry_run,
            sidecars: false,
            skip_archives: true,
            normalize_names: false,
            planned: HashSet::new(),
        }
    }

    pub fn with_sidecars(mut self, sidecars: bool) -> Self {
        self.sidecars = sidecars;
        self
    }

    pub fn with_skip_archives(mut self, skip_archives: bool) -> Self {
        self.skip_archives = skip_archives;
        self
    }

    pub fn with_normalize_names(mut self, normalize_names: bool) -> Self {
        self.normalize_names = normalize_names;
        self
    }

    /// The page owning an entry: the page named by its first path segment,
    /// else the page the descriptor assigns to its attachment id.
    fn owner(&self, page_id: Option<&str>, attachment_id: Option<&str>) -> Option<&'a Page> {
        page_id.and_then(|id| self.descriptor.page(id)).or_else(|| {
            attachment_id
                .and_then(|id| self.descriptor.attachment_pages.get(id))
                .and_then(|id| self.descriptor.page(id))
        })
    }

    /// Restores one entry. `relative` is the entry's path below the
    /// attachment root.
    pub fn restore(&mut self, relative: &str, data: &[u8]) -> Result<Outcome> {
        let segments: Vec<&str> = relative.split('/').filter(|s| !s.is_empty()).collect();
        let (page_id, attachment_id) = match segments.as_slice() {
            [page, attachment, _, ..] | [page, attachment] => (Some(*page), Some(*attachment)),
            _ => (None, None),
        };
        let entry_name = segments.last().copied().unwrap_or(relative);
        let title = attachment_id.and_then(|id| self.descriptor.attachment_titles.get(id)).map(String::as_str);
        let declared = attachment_id.and_then(|id| self.descriptor.attachment_files.get(id)).map(String::as_str);

        let name = match final_name(entry_name, title, declared, data, self.skip_archives) {
            Ok(name) => name,
            Err(skip) => {
                warn!(entry = %relative, reason = ?skip, "[SKIP] archive entry not restored");
                return Ok(Outcome::Skipped(skip));
            },
        };
        let name = match self.normalize_names {
            true => match normalize_name(&name) {
                normalized if normalized.is_empty() => name,
                normalized => normalized,
            },
            false => name,
        };
        let owner = self.owner(page_id, attachment_id);
        let folder = owner.map(Descriptor::path_title).unwrap_or_else(|| self.output.other.clone());
        let Ok(safe) = validate_path(Path::new(&folder).join(&name)) else {
            warn!(entry = %relative, folder = %folder, name = %name, "[SKIP] unsafe destination");
            return Ok(Outcome::Skipped(Skip::UnsafePath));
        };

        let candidate = self.output.attachments.join(safe);
        let destination = unique_path_with(&candidate, |p| p.exists() || self.planned.contains(p));
        let shown = destination.strip_prefix(&self.output.attachments).unwrap_or(&destination).display().to_string();

        if self.dry_run {
            info!(entry = %relative, target = %shown, "[PLAN]");
            self.planned.insert(destination.clone());
            return Ok(Outcome::Planned(destination));
        }

        local::write(&destination, data).or_raise(|| ErrorKind::Write(destination.clone()))?;
        if self.sidecars {
            // The folder name, not the raw title, so rehoming lands in the same place.
            let marker = sidecar_for(&destination);
            local::write(&marker, format!("{PAGE_TITLE_PREFIX} {folder}\n"))
                .or_raise(|| ErrorKind::Write(marker.clone()))?;
        }
        info!(entry = %relative, target = %shown, "[OK]");
        Ok(Outcome::Restored(destination))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use exhume_config::Layout;
    use exhume_descriptor::models::Page;
    use rstest::rstest;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;

    pub(crate) const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    pub(crate) fn zip_with(names: &[&str]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for name in names {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(b"<x/>").unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[rstest]
    #[case("1", Some("diagram.png"), Some("diagram.png"), PNG, "diagram.png")]
    #[case("1", Some("diagram"), None, PNG, "diagram.png")]
    #[case("notes.txt", None, None, b"", "notes.txt")]
    #[case("1", Some("Q3: plan.v2.pdf"), Some("plan.pdf"), b"%PDF-1.7", "Q3 plan.v2.pdf")]
    #[case("1", None, None, b"", "1")]
    #[case("1", Some("   "), Some("x.bin"), b"", "1.bin")]
    #[case("??", None, None, b"", "attachment")]
    fn test_final_name(
        #[case] entry: &str,
        #[case] title: Option<&str>,
        #[case] declared: Option<&str>,
        #[case] data: &[u8],
        #[case] expected: &str,
    ) {
        assert_eq!(final_name(entry, title, declared, data, true).unwrap(), expected);
    }

    #[test]
    fn test_declared_office_extension_survives_container_check() {
        let data = zip_with(&["[Content_Types].xml", "word/document.xml"]);
        assert_eq!(final_name("1", Some("Report.xlsx"), Some("Report.xlsx"), &data, true).unwrap(), "Report.xlsx");
    }

    #[test]
    fn test_office_container_names_unknown_blob() {
        let data = zip_with(&["[Content_Types].xml", "ppt/presentation.xml"]);
        assert_eq!(final_name("1", Some("Deck"), None, &data, true).unwrap(), "Deck.pptx");
    }

    #[rstest]
    #[case("bundle.zip", None)]
    #[case("1", Some("bundle.zip"))]
    fn test_zip_by_name_is_skipped(#[case] entry: &str, #[case] declared: Option<&str>) {
        assert_eq!(final_name(entry, None, declared, b"", true), Err(Skip::Archive));
    }

    #[test]
    fn test_zip_by_content_is_skipped_unless_allowed() {
        let data = zip_with(&["readme.txt"]);
        assert_eq!(final_name("1", Some("Bundle"), None, &data, true), Err(Skip::Archive));
        assert_eq!(final_name("1", Some("Bundle"), None, &data, false).unwrap(), "Bundle.zip");
    }

    pub(crate) fn descriptor() -> Descriptor {
        let mut descriptor = Descriptor::default();
        for (id, title, parent) in [("1", "A", None), ("2", "B", Some("1"))] {
            descriptor.pages.insert(
                id.into(),
                Page { id: id.into(), title: title.into(), space_id: None, parent_id: parent.map(Into::into) },
            );
        }
        descriptor.attachment_titles.insert("50".into(), "diagram.png".into());
        descriptor.attachment_files.insert("50".into(), "diagram.png".into());
        descriptor.attachment_pages.insert("50".into(), "2".into());
        descriptor
    }

    #[test]
    fn test_restore_writes_into_page_folder_with_collisions() {
        let dir = tempfile::tempdir().unwrap();
        let output = OutputLayout::new(dir.path(), &Layout::default());
        let descriptor = descriptor();
        let mut restorer = Restorer::new(&descriptor, &output, false).with_sidecars(true);

        let first = restorer.restore("2/50/1", PNG).unwrap();
        let second = restorer.restore("2/50/2", PNG).unwrap();
        assert_eq!(first, Outcome::Restored(dir.path().join("attachments/B/diagram.png")));
        assert_eq!(second, Outcome::Restored(dir.path().join("attachments/B/diagram (2).png")));
        assert_eq!(
            local::read_to_string(dir.path().join("attachments/B/diagram.png.path.txt")).unwrap(),
            "PageTitle: B\n"
        );
    }

    #[test]
    fn test_unknown_page_goes_to_other_or_attachment_owner() {
        let dir = tempfile::tempdir().unwrap();
        let output = OutputLayout::new(dir.path(), &Layout::default());
        let descriptor = descriptor();
        let mut restorer = Restorer::new(&descriptor, &output, false);

        let owned = restorer.restore("999/50/1", PNG).unwrap();
        assert_eq!(owned, Outcome::Restored(dir.path().join("attachments/B/diagram.png")));
        let stray = restorer.restore("999/77/1", b"%PDF-1.4").unwrap();
        assert_eq!(stray, Outcome::Restored(dir.path().join("attachments/Other/1.pdf")));
    }

    #[test]
    fn test_dry_run_writes_nothing_but_plans_collisions() {
        let dir = tempfile::tempdir().unwrap();
        let output = OutputLayout::new(dir.path(), &Layout::default());
        let descriptor = descriptor();
        let mut restorer = Restorer::new(&descriptor, &output, true);

        assert_eq!(restorer.restore("2/50/1", PNG).unwrap(), Outcome::Planned(dir.path().join("attachments/B/diagram.png")));
        assert_eq!(
            restorer.restore("2/50/2", PNG).unwrap(),
            Outcome::Planned(dir.path().join("attachments/B/diagram (2).png"))
        );
        assert!(!dir.path().join("attachments").exists());
    }

    #[test]
    fn test_punctuation_title_survives_rehome() {
        let dir = tempfile::tempdir().unwrap();
        let output = OutputLayout::new(dir.path(), &Layout::default());
        let mut descriptor = descriptor();
        descriptor.pages.insert(
            "3".into(),
            Page { id: "3".into(), title: "???".into(), space_id: None, parent_id: None },
        );
        descriptor.attachment_pages.insert("60".into(), "3".into());
        let mut restorer = Restorer::new(&descriptor, &output, false).with_sidecars(true);

        let placed = dir.path().join("attachments/page_3/1.png");
        assert_eq!(restorer.restore("3/60/1", PNG).unwrap(), Outcome::Restored(placed.clone()));
        assert_eq!(local::read_to_string(sidecar_for(&placed)).unwrap(), "PageTitle: page_3\n");

        let summary = crate::rehome::rehome(&output.attachments, |_, _| {}).unwrap();
        assert_eq!(summary.already_correct, 1);
        assert_eq!(summary.moved, 0);
        assert!(placed.is_file());
    }

    #[rstest]
    #[case("%E8%A8%AD%E8%A8%88.png", "設計.png")]
    #[case("ＤＩＡＧＲＡＭ.png", "diagram.png")]
    fn test_names_are_normalized_on_request(#[case] title: &str, #[case] expected: &str) {
        let dir = tempfile::tempdir().unwrap();
        let output = OutputLayout::new(dir.path(), &Layout::default());
        let mut descriptor = descriptor();
        descriptor.attachment_titles.insert("50".into(), title.into());
        descriptor.attachment_files.shift_remove("50");

        let mut plain = Restorer::new(&descriptor, &output, true);
        let Outcome::Planned(kept) = plain.restore("2/50/1", PNG).unwrap() else { panic!("not planned") };
        assert_ne!(kept.file_name().unwrap().to_str(), Some(expected));

        let mut restorer = Restorer::new(&descriptor, &output, true).with_normalize_names(true);
        assert_eq!(
            restorer.restore("2/50/1", PNG).unwrap(),
            Outcome::Planned(dir.path().join("attachments/B").join(expected))
        );
    }

    #[test]
    fn test_sidecar_for() {
        assert_eq!(sidecar_for(Path::new("/a/B/x.png")), Path::new("/a/B/x.png.path.txt"));
    }
}
