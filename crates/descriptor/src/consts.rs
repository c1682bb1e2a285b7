//! Record classes and the ordered candidate paths for every field.
//!
//! Exports from different product versions put the same value in different
//! places, so each field lists every location it has been seen in. The
//! first candidate holding non-empty text wins.

use crate::record::FieldPath;

pub(crate) const CLASS_SPACE: &str = "Space";
pub(crate) const CLASS_PAGE: &str = "Page";
pub(crate) const CLASS_ATTACHMENT: &str = "Attachment";
pub(crate) const CLASS_ATTACHMENT_VERSIONS: [&str; 2] = ["AttachmentVersion", "AttachmentData"];
pub(crate) const CLASS_BODY: &str = "BodyContent";

macro_rules! field {
    ($name:ident, [$($path:expr),+ $(,)?]) => {
        pub(crate) const $name: &[FieldPath] = &[$($path),+];
    };
}

field!(ID, [&[("id", "id")], &[("property", "id")]]);
field!(TITLE, [&[("property", "title")]]);
field!(SPACE_KEY, [&[("property", "key")], &[("property", "spaceKey")]]);
field!(PAGE_SPACE, [&[("property", "space"), ("id", "id")], &[("property", "space"), ("property", "id")]]);
field!(PAGE_PARENT, [&[("property", "parent"), ("id", "id")], &[("property", "parent"), ("property", "id")]]);
field!(
    ATTACHMENT_CONTAINER,
    [&[("property", "container"), ("id", "id")], &[("property", "container"), ("property", "id")]]
);
field!(
    VERSION_ATTACHMENT,
    [&[("property", "attachment"), ("id", "id")], &[("property", "attachment"), ("property", "id")]]
);
field!(VERSION_FILE_NAME, [&[("property", "fileName")]]);
field!(VERSION_NUMBER, [&[("property", "version")], &[("property", "attachmentVersion")]]);
field!(BODY_CONTENT, [&[("property", "content"), ("id", "id")], &[("property", "content"), ("property", "id")]]);
field!(BODY_TEXT, [&[("property", "body")]]);
field!(PAGE_DOCUMENT_BODY, [&[("property", "body"), ("property", "storage")], &[("property", "body")]]);
