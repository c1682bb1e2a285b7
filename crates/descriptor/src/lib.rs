//! Reads a space export's descriptor file into typed maps and resolves the
//! page hierarchy they describe.
//!
//! The descriptor is a flat list of generic object records. Each field is
//! looked up through an ordered list of candidate paths, so records written
//! by different exporter versions all decode into the same [`models`].

mod consts;
mod descriptor;
pub mod error;
mod hierarchy;
pub mod models;
mod record;

pub use crate::descriptor::Descriptor;
pub use crate::hierarchy::{Chain, OTHER, UNKNOWN_SPACE};
use tracing::{instrument, warn};

/// Parses descriptor bytes, or fails on malformed input.
#[instrument(skip(bytes), fields(size = bytes.len()))]
pub fn try_parse(bytes: &[u8]) -> error::Result<Descriptor> {
    let descriptor = Descriptor::read(bytes)?;
    tracing::info!(
        spaces = descriptor.spaces.len(),
        pages = descriptor.pages.len(),
        attachments = descriptor.attachment_files.len(),
        bodies = descriptor.bodies.len(),
        "parsed descriptor"
    );
    Ok(descriptor)
}

/// Parses descriptor bytes. Malformed input yields an empty descriptor so
/// that later phases fall back to id-based naming instead of failing.
pub fn parse(bytes: &[u8]) -> Descriptor {
    try_parse(bytes).unwrap_or_else(|err| {
        warn!(error = ?err, "descriptor unreadable; continuing with id-based names");
        Descriptor::default()
    })
}
