//! Configuration Error Types

use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// A source could not be read or did not match the expected shape.
    #[display("could not load configuration")]
    Load,
    /// A value was read but is not usable.
    #[display("invalid configuration value for {key}: {reason}")]
    Invalid {
        #[error(not(source))]
        key: &'static str,
        #[error(not(source))]
        reason: String,
    },
}

impl ErrorKind {
    pub fn is_retryable(&self) -> bool {
        false
    }
}
