//! Reconstruction phases for a wiki space export.
//!
//! A [`Site`] opens an export and runs three phases over it: restoring raw
//! attachment blobs under readable names, rehoming them into per-page
//! folders, and transforming every page into a linked offline document.

mod assemble;
pub mod error;
mod index;
mod output;
mod progress;
mod rehome;
mod resolve;
mod restore;
mod session;

pub use crate::assemble::{Assembler, Summary as AssembleSummary};
pub use crate::index::AttachmentIndex;
pub use crate::output::{INDEX_DOCUMENT, OutputLayout, SITE_DIR, default_root};
pub use crate::progress::{Phase, Progress};
pub use crate::rehome::{Action, Summary as RehomeSummary, UNTITLED_PAGE, read_title, rehome, rehome_marker};
pub use crate::resolve::{Resolver, miss_line};
pub use crate::restore::{
    Outcome, PAGE_TITLE_PREFIX, Restorer, SIDECAR_SUFFIX, Skip, Summary as RestoreSummary, final_name, sidecar_for,
};
pub use crate::session::Site;
