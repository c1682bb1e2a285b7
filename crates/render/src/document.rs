//! Page and index documents.
//!
//! Both documents are [upon] templates embedded with the site assets.
//! Expressions are HTML-escaped by default; pre-rendered markup (page bodies,
//! index trees) goes through the `raw` formatter instead. The `slug`
//! formatter turns titles into anchor ids.

use crate::assets::{AssetLinks, Installed, Templates};
use crate::error::{ErrorKind, Result};
use crate::href::HrefCache;
use crate::index::IndexSection;
use crate::navigation::{Navigation, Sidebar};
use exn::ResultExt;
use serde::Serialize;
use std::path::Path;
use tracing::instrument;
use upon::{Engine, Template};

const PAGE_TEMPLATE: &str = "page.html";
const INDEX_TEMPLATE: &str = "index.html";

/// Everything a page document needs beyond the shared site context.
#[derive(Debug, Clone, Copy)]
pub struct PageDocument<'a> {
    /// The title shown as the page heading.
    pub title: &'a str,
    /// The transformed body.
    pub body: &'a str,
    /// Where the document will be written.
    pub path: &'a Path,
    /// The folder holding this page's restored attachments.
    pub attachments: &'a Path,
}

#[derive(Serialize)]
struct PageContext<'a> {
    title: &'a str,
    space: &'a str,
    body: &'a str,
    sidebar: Sidebar,
    attachments: String,
    assets: AssetLinks,
}

#[derive(Serialize)]
struct IndexContext<'a> {
    title: &'a str,
    sections: &'a [IndexSection],
    assets: AssetLinks,
}

pub struct Documents {
    engine: Engine<'static>,
    page: Template<'static>,
    index: Template<'static>,
    assets: Installed,
    space: String,
}

impl Documents {
    /// Compiles both templates. `space` labels the sidebar of every page.
    pub fn new(assets: Installed, space: impl Into<String>) -> Result<Self> {
        let mut engine = Engine::new();
        addons::configure(&mut engine);
        // Compile early so a broken template fails the run before any page is written.
        let page = engine.compile(Templates::load(PAGE_TEMPLATE)?).or_raise(|| ErrorKind::Template(PAGE_TEMPLATE))?;
        let index = engine.compile(Templates::load(INDEX_TEMPLATE)?).or_raise(|| ErrorKind::Template(INDEX_TEMPLATE))?;
        Ok(Self { engine, page, index, assets, space: space.into() })
    }

    pub fn assets(&self) -> &Installed {
        &self.assets
    }

    /// Renders one page document, with every link relative to its folder.
    #[instrument(skip_all, fields(title = document.title))]
    pub fn page(&self, document: &PageDocument<'_>, navigation: &Navigation, hrefs: &mut HrefCache) -> Result<String> {
        let dir = document.path.parent().unwrap_or(Path::new(""));
        let context = PageContext {
            title: document.title,
            space: &self.space,
            body: document.body,
            sidebar: navigation.sidebar(dir, document.path, hrefs),
            attachments: hrefs.dir_href(dir, document.attachments),
            assets: self.assets.links(dir, hrefs),
        };
        self.page.render(&self.engine, &context).to_string().or_raise(|| ErrorKind::Template(PAGE_TEMPLATE))
    }

    /// Renders the navigation index written to `path`.
    #[instrument(skip_all, fields(sections = sections.len()))]
    pub fn index(&self, title: &str, sections: &[IndexSection], path: &Path, hrefs: &mut HrefCache) -> Result<String> {
        let dir = path.parent().unwrap_or(Path::new(""));
        let context = IndexContext { title, sections, assets: self.assets.links(dir, hrefs) };
        self.index.render(&self.engine, &context).to_string().or_raise(|| ErrorKind::Template(INDEX_TEMPLATE))
    }
}

/// Custom [`upon`] formatters for document templates.
mod addons {
    use crate::markup::escape;
    use rslug::slugify;
    use std::fmt::Write;
    use upon::{Engine, Value, fmt as upon_fmt};

    /// Every `{{ }}` value is escaped unless it asks for `raw`. Attribute
    /// escaping covers both text and double-quoted attributes.
    fn escape_formatter(f: &mut upon_fmt::Formatter<'_>, value: &Value) -> upon_fmt::Result {
        match value {
            Value::String(s) => f.write_str(&escape::attr(s))?,
            v => upon_fmt::default(f, v)?,
        };
        Ok(())
    }

    /// Anchor-safe ids from titles.
    fn slug_formatter(f: &mut upon_fmt::Formatter<'_>, value: &Value) -> upon_fmt::Result {
        match value {
            Value::String(s) => write!(f, "{}", slugify!(s))?,
            v => upon_fmt::default(f, v)?,
        };
        Ok(())
    }

    pub(crate) fn configure(engine: &mut Engine<'_>) {
        engine.set_default_formatter(&escape_formatter);
        engine.add_formatter("raw", upon_fmt::default);
        engine.add_formatter("slug", slug_formatter);
    }
}
