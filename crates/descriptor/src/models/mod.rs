mod attachment;
mod page;
mod space;

pub use self::attachment::{Attachment, AttachmentVersion};
pub use self::page::{Body, Page};
pub use self::space::Space;
