//! Text-level fixes applied before the markup reaches the HTML parser.

use super::escape;
use crate::consts::{CDATA_REGEX, SELF_CLOSING_PREFIXED_REGEX};
use regex::Captures;

/// Turns CDATA sections into escaped text and expands self-closing prefixed
/// elements into explicit open and close tags.
pub(crate) fn prepare(markup: &str) -> String {
    let unwrapped = CDATA_REGEX.replace_all(markup, |caps: &Captures<'_>| escape::text(&caps[1]).into_owned());
    SELF_CLOSING_PREFIXED_REGEX.replace_all(&unwrapped, "<${1}${2}></${1}>").into_owned()
}
