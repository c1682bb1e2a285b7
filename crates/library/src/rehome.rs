//! Moves restored attachments into folders named after their pages.
//!
//! Every `<name>.path.txt` marker records the title of the page that owns
//! `<name>`. The pair is moved into `<attachments>/<sanitized title>/`,
//! after which any directory left empty is removed.

use crate::error::{ErrorKind, Result};
use crate::output::SITE_DIR;
use crate::restore::{PAGE_TITLE_PREFIX, SIDECAR_SUFFIX, sidecar_for};
use exhume_storage::{fs as local, sanitize, unique_path, validate_path};
use exn::ResultExt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// Title used when a marker has no `PageTitle:` line.
pub const UNTITLED_PAGE: &str = "Untitled Page";

/// The outcome of rehoming a single marker.
///
/// Each variant carries the relevant path: where the binary now lives, or
/// the marker that could not be paired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// The binary and its marker were moved into the title folder.
    Moved(PathBuf),
    /// The binary already sits in its title folder; nothing was done.
    AlreadyCorrect(PathBuf),
    /// No binary belongs to this marker.
    Missing(PathBuf),
    /// The recorded title cannot name a folder below the root (`.`, `..`).
    Unsafe(PathBuf),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub moved: usize,
    pub already_correct: usize,
    pub missing: usize,
    pub unsafe_titles: usize,
    pub failed: usize,
    /// Directories removed after the moves.
    pub pruned: usize,
}

/// The page title recorded in a marker's contents.
pub fn read_title(contents: &str) -> String {
    contents
        .lines()
        .find_map(|line| line.trim_start().strip_prefix(PAGE_TITLE_PREFIX))
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .unwrap_or(UNTITLED_PAGE)
        .to_string()
}

/// The binary a marker belongs to: the exact sibling name, else a sibling
/// whose name matches ignoring case.
fn paired_binary(marker: &Path) -> Option<PathBuf> {
    let name = marker.file_name()?.to_str()?;
    let wanted = name.strip_suffix(SIDECAR_SUFFIX)?;
    let exact = marker.with_file_name(wanted);
    if exact.is_file() {
        return Some(exact);
    }
    let lower = wanted.to_lowercase();
    let siblings = std::fs::read_dir(marker.parent()?).ok()?;
    siblings
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.as_path() != marker)
        .find(|path| path.file_name().and_then(|n| n.to_str()).is_some_and(|n| n.to_lowercase() == lower))
}

fn markers(root: &Path) -> Result<Vec<PathBuf>> {
    let site = root.join(SITE_DIR);
    let files = local::list_files(root).or_raise(|| ErrorKind::Index(root.to_path_buf()))?;
    Ok(files
        .into_iter()
        .filter(|path| !path.starts_with(&site))
        .filter(|path| path.file_name().and_then(|n| n.to_str()).is_some_and(|n| n.ends_with(SIDECAR_SUFFIX)))
        .collect())
}

/// Rehomes the pair behind one marker.
pub fn rehome_marker(root: &Path, marker: &Path) -> Result<Action> {
    let Some(binary) = paired_binary(marker) else {
        warn!(marker = %marker.display(), "no file for marker, left in place");
        return Ok(Action::Missing(marker.to_path_buf()));
    };
    let contents = local::read_to_string(marker).or_raise(|| ErrorKind::Rehome)?;
    let title = match sanitize(read_title(&contents)) {
        title if title.is_empty() => UNTITLED_PAGE.to_string(),
        title => title,
    };
    let folder = match validate_path(&title) {
        Ok(safe) if safe.components().count() == 1 => root.join(safe),
        _ => {
            warn!(marker = %marker.display(), title = %title, "[SKIP] title cannot name a folder");
            return Ok(Action::Unsafe(marker.to_path_buf()));
        },
    };
    if binary.parent() == Some(folder.as_path()) {
        debug!(file = %binary.display(), "already in its page folder");
        return Ok(Action::AlreadyCorrect(binary));
    }

    let Some(name) = binary.file_name() else {
        return Ok(Action::Missing(marker.to_path_buf()));
    };
    let destination = unique_path(folder.join(name));
    local::rename(&binary, &destination).or_raise(|| ErrorKind::Rehome)?;
    if let Err(err) = local::rename(marker, sidecar_for(&destination)) {
        // Keep the pair together: put the binary back beside its marker.
        if let Err(back) = local::rename(&destination, &binary) {
            warn!(file = %destination.display(), error = ?back, "could not move file back beside its marker");
        }
        return Err(err).or_raise(|| ErrorKind::Rehome);
    }
    info!(
        from = %binary.strip_prefix(root).unwrap_or(&binary).display(),
        to = %destination.strip_prefix(root).unwrap_or(&destination).display(),
        "[MOVE]"
    );
    Ok(Action::Moved(destination))
}

/// Rehomes every marker below `root`, then prunes empty directories.
///
/// `progress` receives `(done, total)` after each marker. A pair that fails
/// to move is logged and left where it is.
#[instrument(skip_all, fields(root = %root.display()))]
pub fn rehome(root: &Path, mut progress: impl FnMut(usize, usize)) -> Result<Summary> {
    let markers = markers(root)?;
    let total = markers.len();
    let mut summary = Summary::default();
    for (done, marker) in markers.iter().enumerate() {
        match rehome_marker(root, marker) {
            Ok(Action::Moved(_)) => summary.moved += 1,
            Ok(Action::AlreadyCorrect(_)) => summary.already_correct += 1,
            Ok(Action::Missing(_)) => summary.missing += 1,
            Ok(Action::Unsafe(_)) => summary.unsafe_titles += 1,
            Err(err) => {
                warn!(marker = %marker.display(), error = ?err, "could not rehome");
                summary.failed += 1;
            },
        }
        progress(done + 1, total);
    }
    summary.pruned = local::prune_empty_dirs(root).len();
    info!(moved = summary.moved, unchanged = summary.already_correct, pruned = summary.pruned, "rehome finished");
    Ok(summary)
}
