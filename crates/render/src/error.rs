//! Render Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A render error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for render operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// A builtin template failed to compile or render.
    #[display("template {_0} could not be rendered")]
    Template(#[error(not(source))] &'static str),
    /// Asset was not loadable (either file or builtin).
    #[display("asset not found: {_0}")]
    AssetNotFound(#[error(not(source))] String),
    /// Site assets could not be written into the output tree.
    #[display("could not install site asset {}", _0.display())]
    Install(#[error(not(source))] PathBuf),
    /// A plain-text export could not be written.
    #[display("could not export {}", _0.display())]
    Export(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
