//! Library Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Each variant names the phase or
//! operation that failed; the lower-level cause hangs below it in the tree.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A library error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of a phase failure.
///
/// ### Setup Errors
/// - [`ErrorKind::Open`]
/// - [`ErrorKind::OutputRoot`]
///
/// ### Phase Errors
/// - [`ErrorKind::Restore`]
/// - [`ErrorKind::Rehome`]
/// - [`ErrorKind::Index`]
/// - [`ErrorKind::Transform`]
/// - [`ErrorKind::NoDescriptor`]
///
/// ### Output Errors
/// - [`ErrorKind::Write`]
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The export could not be opened or listed.
    #[display("cannot open export {}", _0.display())]
    Open(#[error(not(source))] PathBuf),
    /// The output root could not be determined or created.
    #[display("cannot prepare output root {}", _0.display())]
    OutputRoot(#[error(not(source))] PathBuf),
    /// Attachment restoration aborted.
    #[display("attachment restoration failed")]
    Restore,
    /// Moving attachments into their page folders aborted.
    #[display("rehoming attachments failed")]
    Rehome,
    /// The restored attachments could not be scanned.
    #[display("cannot index restored attachments in {}", _0.display())]
    Index(#[error(not(source))] PathBuf),
    /// Building the site aborted.
    #[display("page transformation failed")]
    Transform,
    /// There is no descriptor, so there are no pages to build.
    #[display("the export has no descriptor; no pages can be built")]
    NoDescriptor,
    /// A document or diagnostic could not be written.
    #[display("cannot write {}", _0.display())]
    Write(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
