//! Local filesystem operations.
//!
//! Thin synchronous wrappers over [`std::fs`] that attach the offending path
//! to every error and create parent directories on demand. Directory listings
//! use [`walkdir`] and are sorted so that every phase processes files in the
//! same order on every run.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

fn map_io_error(e: std::io::Error, path: &Path) -> ErrorKind {
    match e.kind() {
        std::io::ErrorKind::NotFound => ErrorKind::NotFound(path.to_path_buf()),
        std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied(path.to_path_buf()),
        _ => ErrorKind::Io(e),
    }
}

pub fn read(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    Ok(fs::read(path).map_err(|e| map_io_error(e, path))?)
}

pub fn read_to_string(path: impl AsRef<Path>) -> Result<String> {
    let bytes = read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Writes `data` to `path`, creating any missing parent directories first.
pub fn write(path: impl AsRef<Path>, data: impl AsRef<[u8]>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    Ok(fs::write(path, data).map_err(|e| map_io_error(e, path))?)
}

/// Opens `path` for appending, creating it if necessary.
pub fn append(path: impl AsRef<Path>, data: impl AsRef<[u8]>) -> Result<()> {
    use std::io::Write;
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    let mut file =
        fs::OpenOptions::new().create(true).append(true).open(path).map_err(|e| map_io_error(e, path))?;
    Ok(file.write_all(data.as_ref()).map_err(|e| map_io_error(e, path))?)
}

/// Moves a file, creating the destination's parent directories first.
pub fn rename(from: impl AsRef<Path>, to: impl AsRef<Path>) -> Result<()> {
    let (from, to) = (from.as_ref(), to.as_ref());
    if let Some(parent) = to.parent() {
        create_dir_all(parent)?;
    }
    Ok(fs::rename(from, to).map_err(|e| map_io_error(e, to))?)
}

pub fn copy(from: impl AsRef<Path>, to: impl AsRef<Path>) -> Result<()> {
    let (from, to) = (from.as_ref(), to.as_ref());
    if let Some(parent) = to.parent() {
        create_dir_all(parent)?;
    }
    fs::copy(from, to).map_err(|e| map_io_error(e, from))?;
    Ok(())
}

pub fn create_dir_all(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    Ok(fs::create_dir_all(path).map_err(|e| map_io_error(e, path))?)
}

/// Lists every regular file below `root`, recursively, sorted by path.
///
/// A missing root is an empty listing rather than an error, the same as an
/// export that simply has no attachments.
pub fn list_files(root: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let root = root.as_ref();
    if !root.exists() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = entry.or_raise(|| ErrorKind::Walk(root.to_path_buf()))?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Removes every empty directory below `root`, deepest first, and returns
/// the directories that were removed. `root` itself is kept.
///
/// Directories that cannot be read or removed are skipped; pruning is a
/// cosmetic cleanup and never fails the phase that requested it.
pub fn prune_empty_dirs(root: impl AsRef<Path>) -> Vec<PathBuf> {
    let root = root.as_ref();
    let mut dirs: Vec<PathBuf> = WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_dir())
        .map(|entry| entry.into_path())
        .collect();
    // Deepest first, so a parent only gets checked after all of its children.
    dirs.sort_by_key(|dir| std::cmp::Reverse(dir.components().count()));

    let mut removed = Vec::new();
    for dir in dirs {
        let is_empty = fs::read_dir(&dir).map(|mut entries| entries.next().is_none()).unwrap_or(false);
        if is_empty && fs::remove_dir(&dir).is_ok() {
            debug!(dir = %dir.display(), "removed empty directory");
            removed.push(dir);
        }
    }
    removed
}
