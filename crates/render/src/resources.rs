//! Optional decorative files supplied from outside the export.

use std::path::{Path, PathBuf};
use tracing::debug;

/// Folders searched below a resource base directory, before the base itself.
const CANDIDATE_DIRS: &[&str] = &["resources", "resource", "assets", "img"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    /// Shown in the index header and the page sidebar title.
    Logo,
    /// Shown before each sidebar group and index section.
    SectionIcon,
    /// Marks blank pages in the sidebar.
    EmptyPageIcon,
    /// Tiled behind every document.
    Background,
}

impl Resource {
    pub const ALL: [Resource; 4] = [Resource::Logo, Resource::SectionIcon, Resource::EmptyPageIcon, Resource::Background];

    pub fn file_name(self) -> &'static str {
        match self {
            Resource::Logo => "logo.png",
            Resource::SectionIcon => "section.png",
            Resource::EmptyPageIcon => "empty.png",
            Resource::Background => "background.png",
        }
    }
}

/// Finds decorative files. A missing resource simply leaves its decoration
/// out of the generated documents.
pub trait ResourceLocator {
    fn locate(&self, resource: Resource) -> Option<PathBuf>;
}

/// Provides nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoResources;

impl ResourceLocator for NoResources {
    fn locate(&self, _resource: Resource) -> Option<PathBuf> {
        None
    }
}

/// Looks for resources by file name under a base directory.
#[derive(Debug, Clone)]
pub struct DirectoryResources {
    base: PathBuf,
}

impl DirectoryResources {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }
}

impl ResourceLocator for DirectoryResources {
    fn locate(&self, resource: Resource) -> Option<PathBuf> {
        let found = CANDIDATE_DIRS
            .iter()
            .map(|dir| self.base.join(dir))
            .chain(std::iter::once(self.base.clone()))
            .map(|dir| dir.join(resource.file_name()))
            .find(|path| path.is_file());
        debug!(?resource, found = ?found, "resource lookup");
        found
    }
}
