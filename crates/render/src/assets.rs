//! Embedded site assets and document templates.
//!
//! Stylesheets, scripts and templates are embedded into the binary at compile
//! time using [`rust-embed`](rust_embed). The site assets are written next to
//! the restored attachments once per run, together with whatever decorative
//! resources were found, so every document can reference them relatively.

use crate::error::{ErrorKind, Result};
use crate::href::HrefCache;
use crate::resources::{Resource, ResourceLocator};
use exhume_storage::fs as local;
use exn::{OptionExt, ResultExt};
use rust_embed::Embed;
use serde::Serialize;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument, warn};

pub(crate) const STYLESHEET: &str = "site.css";
pub(crate) const PAGE_SCRIPT: &str = "page.js";
pub(crate) const INDEX_SCRIPT: &str = "index.js";

#[derive(Embed)]
#[folder = "../../assets/site/"]
pub struct SiteAssets;
impl SiteAssets {
    pub fn load(name: impl AsRef<str>) -> Result<Cow<'static, [u8]>> {
        Self::get(name.as_ref()).map(|f| f.data).ok_or_raise(|| ErrorKind::AssetNotFound(Self::identifier(name)))
    }

    pub fn exists(name: impl AsRef<str>) -> bool {
        Self::get(name.as_ref()).is_some()
    }

    pub(crate) fn identifier(name: impl AsRef<str>) -> String {
        format!("site:{}", name.as_ref().trim().trim_start_matches("site:"))
    }
}

#[derive(Embed)]
#[folder = "../../assets/templates/"]
pub(crate) struct Templates;
impl Templates {
    pub(crate) fn load(name: &'static str) -> Result<String> {
        let file = Self::get(name).ok_or_raise(|| ErrorKind::AssetNotFound(format!("template:{name}")))?;
        Ok(String::from_utf8_lossy(&file.data).into_owned())
    }
}

/// The site assets of one output tree, as written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Installed {
    stylesheet: PathBuf,
    page_script: PathBuf,
    index_script: PathBuf,
    resources: Vec<(Resource, PathBuf)>,
}

impl Installed {
    /// Writes the embedded assets into `site_dir` and copies every resource
    /// `locator` can find next to them.
    ///
    /// A resource that cannot be copied is left out with a warning.
    #[instrument(skip_all, fields(dir = %site_dir.display()))]
    pub fn install(site_dir: &Path, locator: &dyn ResourceLocator) -> Result<Self> {
        let write = |name: &str| -> Result<PathBuf> {
            let target = site_dir.join(name);
            local::write(&target, SiteAssets::load(name)?).or_raise(|| ErrorKind::Install(target.clone()))?;
            Ok(target)
        };
        let stylesheet = write(STYLESHEET)?;
        let page_script = write(PAGE_SCRIPT)?;
        let index_script = write(INDEX_SCRIPT)?;

        let mut resources = Vec::new();
        for resource in Resource::ALL {
            let Some(source) = locator.locate(resource) else {
                continue;
            };
            let target = site_dir.join(resource.file_name());
            match local::copy(&source, &target) {
                Ok(()) => resources.push((resource, target)),
                Err(err) => warn!(?resource, source = %source.display(), error = ?err, "resource not copied"),
            }
        }
        debug!(resources = resources.len(), "site assets installed");
        Ok(Self { stylesheet, page_script, index_script, resources })
    }

    pub fn resource(&self, resource: Resource) -> Option<&Path> {
        self.resources.iter().find(|(r, _)| *r == resource).map(|(_, path)| path.as_path())
    }

    /// Every asset href as seen from a document in `from_dir`.
    pub(crate) fn links(&self, from_dir: &Path, hrefs: &mut HrefCache) -> AssetLinks {
        let mut link = |resource| self.resource(resource).map(|path| hrefs.href(from_dir, path)).unwrap_or_default();
        let (logo, section_icon, empty_icon, background) = (
            link(Resource::Logo),
            link(Resource::SectionIcon),
            link(Resource::EmptyPageIcon),
            link(Resource::Background),
        );
        AssetLinks {
            stylesheet: hrefs.href(from_dir, &self.stylesheet),
            page_script: hrefs.href(from_dir, &self.page_script),
            index_script: hrefs.href(from_dir, &self.index_script),
            has_logo: !logo.is_empty(),
            has_section_icon: !section_icon.is_empty(),
            has_empty_icon: !empty_icon.is_empty(),
            has_background: !background.is_empty(),
            logo,
            section_icon,
            empty_icon,
            background,
        }
    }
}

/// Asset hrefs handed to the templates. Missing resources are empty strings
/// with their `has_*` flag unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct AssetLinks {
    pub(crate) stylesheet: String,
    pub(crate) page_script: String,
    pub(crate) index_script: String,
    pub(crate) logo: String,
    pub(crate) has_logo: bool,
    pub(crate) section_icon: String,
    pub(crate) has_section_icon: bool,
    pub(crate) empty_icon: String,
    pub(crate) has_empty_icon: bool,
    pub(crate) background: String,
    pub(crate) has_background: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{DirectoryResources, NoResources};
    use std::num::NonZeroUsize;

    #[test]
    fn test_embedded_assets_exist() {
        for name in [STYLESHEET, PAGE_SCRIPT, INDEX_SCRIPT] {
            assert!(SiteAssets::exists(name), "{name}");
            assert!(!SiteAssets::load(name).unwrap().is_empty());
        }
        assert!(SiteAssets::load("missing.css").is_err());
        assert!(Templates::load("page.html").unwrap().contains("{{"));
    }

    #[test]
    fn test_install_without_resources() {
        let dir = tempfile::tempdir().unwrap();
        let site = dir.path().join("attachments/_site");
        let installed = Installed::install(&site, &NoResources).unwrap();
        assert!(site.join(STYLESHEET).is_file());
        assert!(site.join(INDEX_SCRIPT).is_file());
        assert_eq!(installed.resource(Resource::Logo), None);

        let mut hrefs = HrefCache::new(NonZeroUsize::new(8).unwrap());
        let links = installed.links(&dir.path().join("html_pages/A"), &mut hrefs);
        assert_eq!(links.stylesheet, "../../attachments/_site/site.css");
        assert!(!links.has_logo);
        assert_eq!(links.logo, "");
    }

    #[test]
    fn test_install_copies_found_resources() {
        let dir = tempfile::tempdir().unwrap();
        local::write(dir.path().join("res/img/logo.png"), b"png").unwrap();
        let site = dir.path().join("out/_site");
        let installed = Installed::install(&site, &DirectoryResources::new(dir.path().join("res"))).unwrap();
        assert_eq!(installed.resource(Resource::Logo), Some(site.join("logo.png").as_path()));
        assert_eq!(local::read(site.join("logo.png")).unwrap(), b"png");

        let mut hrefs = HrefCache::new(NonZeroUsize::new(8).unwrap());
        let links = installed.links(&dir.path().join("out"), &mut hrefs);
        assert!(links.has_logo);
        assert_eq!(links.logo, "_site/logo.png");
    }
}
