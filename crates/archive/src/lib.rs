//! Access to a wiki space export and inspection of the blobs inside it.
//!
//! An export arrives either as a `.zip` archive or as an already extracted
//! directory; [`Source`] hides the difference. [`Layout`] locates the
//! descriptor file and the attachment root among the source's entries.
//!
//! Attachment blobs are stored without meaningful names, so this crate also
//! provides the content-based half of extension inference:
//!
//! - **Content sniffing** from magic bytes ([`Mime::sniff`]), available with
//!   the default `sniff` feature. [`SNIFFING`] reports whether it is compiled
//!   in, so callers can warn once at startup when it is not.
//! - **Office container detection** ([`OfficeKind::detect`]) for zip blobs
//!   that are really word-processing, spreadsheet or presentation documents.

pub mod error;
mod mime;
mod office;
mod sniff;
mod source;

pub use crate::office::OfficeKind;
pub use crate::sniff::SNIFFING;
pub use crate::source::{Layout, Source};

/// A content type that extension inference knows how to name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mime {
    Jpeg,
    Png,
    Gif,
    Webp,
    Tiff,
    Pdf,
    /// Legacy binary word-processing document (compound file)
    Msword,
    /// Legacy binary spreadsheet (compound file)
    MsExcel,
    /// Legacy binary presentation (compound file)
    MsPowerpoint,
    Docx,
    Xlsx,
    Pptx,
    /// Generic zip archive; may still be an office container
    Zip,
    Mp4,
    /// MPEG audio (mp3)
    Mpeg,
    /// Plain UTF-8 text
    Text,
}
