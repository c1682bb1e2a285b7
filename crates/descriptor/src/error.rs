//! Descriptor Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A descriptor error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for descriptor operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
/// Callers of [`parse`](crate::parse) never see them: a broken descriptor
/// degrades to an empty one. [`try_parse`](crate::try_parse) surfaces them.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The XML structure is too broken to process.
    #[display("malformed descriptor XML at byte {_0}")]
    MalformedXml(#[error(not(source))] u64),
    /// Text or a name could not be decoded.
    #[display("undecodable {_0} in descriptor")]
    Encoding(#[error(not(source))] &'static str),
    /// The document ended inside an open record.
    #[display("descriptor ended inside an open record")]
    Truncated,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // The descriptor is either well-formed or it is not.
        false
    }
}
