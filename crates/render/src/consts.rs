use regex::Regex;
use std::sync::LazyLock;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

// `<ri:attachment ri:filename="a.png"/>`. An HTML parser would treat the
// unknown element as an open tag and swallow every following sibling.
regex!(
    SELF_CLOSING_PREFIXED_REGEX,
    r#"<([A-Za-z][\w.-]*:[\w.-]+)((?:\s+[^\s=/>]+(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s"'>]+))?)*)\s*/>"#
);
regex!(CDATA_REGEX, r"(?s)<!\[CDATA\[(.*?)\]\]>");

// Plain-text extraction.
regex!(BREAK_REGEX, r"(?i)<\s*br\s*/?\s*>");
regex!(PARAGRAPH_END_REGEX, r"(?i)</p\s*>");
regex!(TAG_REGEX, r"<[^>]+>");
regex!(BLANK_LINES_REGEX, r"\n{3,}");

// Macro and element names, as the HTML parser reports them (lowercased).
pub(crate) const STRUCTURED_MACRO: &str = "ac:structured-macro";
pub(crate) const MULTIMEDIA: &str = "ac:multimedia";
pub(crate) const IMAGE: &str = "ac:image";
pub(crate) const LINK: &str = "ac:link";
pub(crate) const PARAMETER: &str = "ac:parameter";
pub(crate) const ATTACHMENT: &str = "ri:attachment";
pub(crate) const PAGE: &str = "ri:page";
pub(crate) const URL: &str = "ri:url";

pub(crate) const MACRO_NAME_ATTR: &str = "ac:name";
pub(crate) const FILENAME_ATTR: &str = "ri:filename";
pub(crate) const CONTENT_TITLE_ATTR: &str = "ri:content-title";
pub(crate) const URL_VALUE_ATTR: &str = "ri:value";

pub(crate) const VIEW_FILE_MACRO: &str = "view-file";
pub(crate) const MULTIMEDIA_MACRO: &str = "multimedia";

/// Elements that never have a closing tag.
pub(crate) const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source", "track", "wbr",
];
/// Elements whose text content is emitted verbatim.
pub(crate) const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];
