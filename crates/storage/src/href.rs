//! Relative hyperlinks between output files.

use std::fmt::Write;
use std::path::{Component, Path};

/// Characters left untouched when quoting a path segment, on top of ASCII
/// alphanumerics and `_.-~`.
const SAFE: &[u8] = b"!$&'()*+,;=:@[]-%._~";

/// Percent-encodes one path segment for use inside an `href`.
///
/// Non-ASCII characters are encoded as their UTF-8 bytes. `%` is kept as-is,
/// so a segment that is already encoded is not encoded twice.
pub fn quote_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        if byte.is_ascii_alphanumeric() || SAFE.contains(&byte) {
            out.push(byte as char);
        } else {
            // Writing to a String never fails.
            let _ = write!(out, "%{byte:02X}");
        }
    }
    out
}

/// Computes the `href` that leads from a document inside `from_dir` to
/// `target`, using `/` separators and quoted segments.
///
/// Both paths must be expressed against the same base (both absolute, or
/// both relative to the same output root). The computation is purely lexical
/// and never touches the filesystem, so the target does not need to exist.
pub fn relative_href(from_dir: impl AsRef<Path>, target: impl AsRef<Path>) -> String {
    let from: Vec<Component> = from_dir.as_ref().components().filter(|c| *c != Component::CurDir).collect();
    let to: Vec<Component> = target.as_ref().components().filter(|c| *c != Component::CurDir).collect();
    let common = from.iter().zip(to.iter()).take_while(|(a, b)| a == b).count();

    let segments: Vec<String> = std::iter::repeat_n("..".to_string(), from.len() - common)
        .chain(to[common..].iter().map(|c| quote_segment(&c.as_os_str().to_string_lossy())))
        .filter(|s| !s.is_empty())
        .collect();
    match segments.is_empty() {
        true => ".".to_string(),
        false => segments.join("/"),
    }
}
