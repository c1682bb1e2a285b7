pub mod error;
pub mod fs;
mod href;
mod name;
mod path;

pub use crate::href::{quote_segment, relative_href};
pub use crate::name::{extension, normalize_name, sanitize, split_name, strip_any_ext};
pub use crate::path::{unique_path, unique_path_with, validate as validate_path};
