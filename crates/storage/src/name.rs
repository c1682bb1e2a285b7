//! Naming rules for anything that ends up as a path segment.

use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

regex!(RESERVED_REGEX, r#"[\\/:*?"<>|]"#);
regex!(WHITESPACE_REGEX, r"\s+");
regex!(TRAILING_EXT_REGEX, r"\s*\.[A-Za-z0-9]{1,6}$");

/// Makes a title safe to use as a single file or directory name.
///
/// Every reserved character (`\ / : * ? " < > |`) becomes a space, runs of
/// whitespace collapse to one space, and the result is trimmed. The output
/// may be empty; callers pick their own fallback.
pub fn sanitize(s: impl AsRef<str>) -> String {
    let replaced = RESERVED_REGEX.replace_all(s.as_ref(), " ");
    WHITESPACE_REGEX.replace_all(&replaced, " ").trim().to_string()
}

/// Decodes `%XX` escapes. A malformed escape is kept as written, and the
/// decoded bytes are read as lossy UTF-8.
fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let escaped = (bytes[i] == b'%')
            .then(|| bytes.get(i + 1..i + 3))
            .flatten()
            .and_then(|hex| std::str::from_utf8(hex).ok())
            .and_then(|hex| u8::from_str_radix(hex, 16).ok());
        match escaped {
            Some(byte) => {
                out.push(byte);
                i += 3;
            },
            None => {
                out.push(bytes[i]);
                i += 1;
            },
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// The canonical spelling of a filename: percent escapes decoded,
/// compatibility forms folded (NFKC), lowercased, then [`sanitize`]d.
/// May be empty.
pub fn normalize_name(name: &str) -> String {
    let folded: String = percent_decode(name).nfkc().collect();
    sanitize(folded.to_lowercase())
}

/// Removes one trailing extension-looking suffix (a dot followed by 1-6
/// ASCII alphanumerics, plus any whitespace before the dot).
///
/// Attachment titles usually carry their extension already, and it gets
/// re-appended from a more trustworthy source afterwards.
pub fn strip_any_ext(name: &str) -> Cow<'_, str> {
    let name = name.trim();
    TRAILING_EXT_REGEX.replace(name, "")
}

/// Splits a filename into stem and extension (the extension keeps its dot).
///
/// Leading dots belong to the stem, so `.bashrc` has no extension.
pub fn split_name(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < name.len() && !name[..idx].chars().all(|c| c == '.') => {
            name.split_at(idx)
        },
        _ => (name, ""),
    }
}

/// Lowercased extension of a filename, including the dot.
pub fn extension(name: &str) -> Option<String> {
    match split_name(name) {
        (_, "") => None,
        (_, ext) => Some(ext.to_lowercase()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Plain Title", "Plain Title")]
    #[case("a/b\\c", "a b c")]
    #[case("What? Why: \"this\" <that> | *", "What Why this that")]
    #[case("  lots   of\t\nspace  ", "lots of space")]
    #[case("???", "")]
    #[case("", "")]
    fn test_sanitize(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(sanitize(input), expected);
    }

    #[test]
    fn test_sanitize_strips_every_reserved_character() {
        let out = sanitize(r#"\/:*?"<>|"#);
        assert!(out.is_empty());
        for reserved in ['\\', '/', ':', '*', '?', '"', '<', '>', '|'] {
            assert!(!sanitize(format!("x{reserved}y")).contains(reserved));
        }
    }

    #[rstest]
    #[case("%E5%A0%B1%E5%91%8A.pdf", "報告.pdf")]
    #[case("ＲＥＰＯＲＴ１.PDF", "report1.pdf")]
    #[case("ｶﾀｶﾅ%20notes.txt", "カタカナ notes.txt")]
    #[case("a%2Fb.txt", "a b.txt")]
    #[case("100%.txt", "100%.txt")]
    #[case("bad%zzescape%4", "bad%zzescape%4")]
    #[case("  Plain.PNG ", "plain.png")]
    fn test_normalize_name(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_name(input), expected);
    }

    #[rstest]
    #[case("report.pdf", "report")]
    #[case("report .pdf", "report")]
    #[case("archive.tar.gz", "archive.tar")]
    #[case("no extension", "no extension")]
    #[case("too.longextension", "too.longextension")]
    #[case("  padded.docx  ", "padded")]
    #[case(".png", "")]
    fn test_strip_any_ext(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(strip_any_ext(input), expected);
    }

    #[rstest]
    #[case("photo.JPG", ("photo", ".JPG"))]
    #[case("archive.tar.gz", ("archive.tar", ".gz"))]
    #[case(".bashrc", (".bashrc", ""))]
    #[case("trailing.", ("trailing.", ""))]
    #[case("none", ("none", ""))]
    fn test_split_name(#[case] input: &str, #[case] expected: (&str, &str)) {
        assert_eq!(split_name(input), expected);
    }

    #[test]
    fn test_extension_is_lowercased() {
        assert_eq!(extension("Photo.JPEG").as_deref(), Some(".jpeg"));
        assert_eq!(extension("1"), None);
    }
}
