//! Archive Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// An archive error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for archive operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The input path could not be opened as an export.
    #[display("cannot open export: {}", _0.display())]
    Open(#[error(not(source))] PathBuf),
    /// The input is a file but not a readable zip archive.
    #[display("not a zip archive: {}", _0.display())]
    NotAnArchive(#[error(not(source))] PathBuf),
    /// Listing the entries of the export failed.
    #[display("cannot list export entries")]
    List,
    /// A single entry could not be read.
    #[display("cannot read entry: {_0}")]
    Entry(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // The export is read-only input; reading it again yields the same bytes.
        false
    }
}
