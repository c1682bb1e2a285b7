//! Path validation and collision handling.
//!
//! Every relative path that is built from export data (page titles, chain
//! segments, attachment names) goes through [`validate`] before it is joined
//! onto an output root, so a title like `..` can never escape that root.

use crate::error::{ErrorKind, Result};
use crate::name::split_name;
use std::path::{Component, Path, PathBuf};

/// Validates a relative output path for security and correctness.
/// Ensures that paths don't escape the output root (no `..` traversal).
///
/// > **Note:** This does **not** normalize backslashes, non-UTF8 bytes, or
/// >           platform-specific weirdness. Null bytes are explicitly rejected.
///
/// # Returns
/// Returns the normalized path if valid, or [`InvalidPath`](crate::error::ErrorKind::InvalidPath)
/// if invalid.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use exhume_storage::validate_path;
/// assert!(validate_path("Space Home/Child.html").is_ok());
/// assert!(validate_path("a/../page.html").is_ok());
/// assert!(validate_path("../etc/passwd").is_err());
/// assert_eq!(validate_path("a/./b//c.html/").unwrap(), Path::new("a/b/c.html"));
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let mut components = Vec::new();
    for component in path.as_ref().components() {
        match component {
            Component::Normal(s) => {
                // Null bytes pass through Path::components() on Unix but cause
                // truncation in C-based syscalls.
                if s.as_encoded_bytes().contains(&0) {
                    exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf()));
                }
                components.push(s)
            },
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf())),
            Component::ParentDir => {
                if components.pop().is_none() {
                    exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf()));
                }
            },
        }
    }
    match components.is_empty() {
        true => exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf())),
        false => Ok(components.into_iter().collect()),
    }
}

/// Returns `path` if nothing exists there yet, otherwise the first free
/// sibling named `stem (2).ext`, `stem (3).ext`, and so on.
pub fn unique_path(path: impl AsRef<Path>) -> PathBuf {
    unique_path_with(path, |candidate| candidate.exists())
}

/// Same as [`unique_path`] but with a caller-supplied occupancy check, which
/// lets a dry run account for files it only pretended to write.
pub fn unique_path_with(path: impl AsRef<Path>, taken: impl Fn(&Path) -> bool) -> PathBuf {
    let path = path.as_ref();
    if !taken(path) {
        return path.to_path_buf();
    }
    let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    let (stem, ext) = split_name(&name);
    (2..)
        .map(|i| path.with_file_name(format!("{stem} ({i}){ext}")))
        .find(|candidate| !taken(candidate))
        // The range is unbounded; `find` only returns once a free name turns up.
        .unwrap_or_else(|| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::fs;

    #[test]
    fn test_valid_paths() {
        assert_eq!(validate(Path::new("Home/Child.html")).unwrap(), Path::new("Home/Child.html"));
        assert_eq!(validate(Path::new("a/b/c/file.html")).unwrap(), Path::new("a/b/c/file.html"));
        assert_eq!(validate(Path::new("simple.html")).unwrap(), Path::new("simple.html"));
    }

    #[test]
    fn test_path_normalization() {
        assert_eq!(validate(Path::new("a//b//c")).unwrap(), Path::new("a/b/c"));
        assert_eq!(validate(Path::new("a/./b/./c")).unwrap(), Path::new("a/b/c"));
        assert_eq!(validate(Path::new("a/b/..")).unwrap(), Path::new("a"));
    }

    #[test]
    fn test_traversal_attempts() {
        assert!(validate(Path::new("../etc/passwd")).is_err());
        assert!(validate(Path::new("a/../../b")).is_err());
        assert!(validate(Path::new("..")).is_err());
        // A page literally titled ".." survives sanitization.
        assert!(validate(Path::new("Home/../..")).is_err());
    }

    #[test]
    fn test_invalid_and_empty() {
        assert!(validate(Path::new("a\0b")).is_err());
        assert!(validate(Path::new("")).is_err());
        assert!(validate(Path::new("./")).is_err());
    }

    #[test]
    fn test_unique_path_counts_from_two() {
        let dir = tempfile::tempdir().unwrap();
        let first = unique_path(dir.path().join("name.ext"));
        assert_eq!(first, dir.path().join("name.ext"));
        fs::write(&first, b"one").unwrap();

        let second = unique_path(dir.path().join("name.ext"));
        assert_eq!(second, dir.path().join("name (2).ext"));
        fs::write(&second, b"two").unwrap();

        assert_eq!(unique_path(dir.path().join("name.ext")), dir.path().join("name (3).ext"));
    }

    #[test]
    fn test_unique_path_without_extension() {
        let taken: HashSet<PathBuf> = [PathBuf::from("/out/README")].into();
        assert_eq!(
            unique_path_with("/out/README", |p| taken.contains(p)),
            PathBuf::from("/out/README (2)")
        );
    }
}
