//! Renders an error tree as a miette diagnostic.
//!
//! Every frame of the tree becomes one diagnostic; its children hang below
//! it as related diagnostics, so the report keeps the tree's shape.

use derive_more::{Display, Error};
use exhume_config::error::ErrorKind as ConfigError;
use exhume_library::error::ErrorKind as LibraryError;
use miette::Diagnostic;
use std::error::Error as StdError;

#[derive(Debug, Display, Error, Diagnostic)]
#[display("{message} (at {location})")]
pub struct Failure {
    message: String,
    location: String,
    #[help]
    help: Option<&'static str>,
    #[related]
    causes: Vec<Failure>,
}

impl Failure {
    pub fn from_exn<E: StdError + Send + Sync + 'static>(err: &exn::Exn<E>) -> Self {
        Self::from_frame(err.frame())
    }

    fn from_frame(frame: &exn::Frame) -> Self {
        let error = frame.error();
        Self {
            message: error.to_string(),
            location: frame.location().to_string(),
            help: hint(error),
            causes: frame.children().iter().map(Self::from_frame).collect(),
        }
    }
}

/// What the user can do about the errors that have a fix on their side.
fn hint(error: &(dyn StdError + Send + Sync + 'static)) -> Option<&'static str> {
    if let Some(kind) = error.downcast_ref::<LibraryError>() {
        return match kind {
            LibraryError::Open(_) => Some("pass a .zip export or the directory it was extracted into"),
            LibraryError::OutputRoot(_) => Some("choose a writable location with --output"),
            LibraryError::NoDescriptor => Some("no entities.xml was found; rerun with --no-transform to only restore"),
            _ => None,
        };
    }
    match error.downcast_ref::<ConfigError>() {
        Some(_) => Some("check the config file and any EXHUME_ environment variables"),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_shape_survives() {
        let err = exn::Exn::new(LibraryError::Index("attachments".into()))
            .raise(LibraryError::Transform)
            .raise(LibraryError::NoDescriptor);
        let failure = Failure::from_exn(&err);

        assert!(failure.message.contains("no descriptor"), "{}", failure.message);
        assert!(failure.location.contains("report.rs"), "{}", failure.location);
        assert!(failure.help.is_some());
        assert_eq!(failure.causes.len(), 1);
        let transform = &failure.causes[0];
        assert_eq!(transform.message, "page transformation failed");
        assert!(transform.help.is_none());
        assert_eq!(transform.causes.len(), 1);
        assert!(transform.causes[0].message.starts_with("cannot index restored attachments"));
        assert_eq!(failure.related().map(Iterator::count), Some(1));
    }

    #[test]
    fn test_config_errors_get_a_hint() {
        let err = exn::Exn::new(ConfigError::Load);
        assert!(Failure::from_exn(&err).help.is_some());
    }
}
