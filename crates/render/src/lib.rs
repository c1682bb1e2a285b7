//! Page bodies and site documents.
//!
//! The [`Transformer`] turns storage markup into plain HTML that links to
//! restored attachments. [`Navigation`], [`Documents`] and the embedded
//! assets wrap transformed bodies into a browsable offline site.

mod assets;
mod consts;
mod document;
pub mod error;
mod href;
mod index;
mod markup;
mod media;
mod navigation;
mod resources;
mod text;

pub use crate::assets::{Installed, SiteAssets};
pub use crate::document::{Documents, PageDocument};
pub use crate::href::HrefCache;
pub use crate::index::{IndexNode, IndexSection, sections};
pub use crate::markup::{AttachmentLookup, Located, Transformer};
pub use crate::media::Media;
pub use crate::navigation::{Navigation, PageEntry, Sidebar, SidebarGroup, SidebarItem};
pub use crate::resources::{DirectoryResources, NoResources, Resource, ResourceLocator};
pub use crate::text::{DocumentExporter, TextExporter, is_blank, to_plain_text};
