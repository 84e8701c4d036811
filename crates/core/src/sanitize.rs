//! Removal of characters that cannot appear in an XML document.
//!
//! Presentation text may carry ASCII control codes (vertical tabs from soft
//! line breaks, stray form feeds, NULs from broken exporters). XML 1.0 only
//! allows tab, line feed and carriage return below 0x20, so everything else in
//! that range is dropped before text reaches the output document.

use regex::Regex;
use std::sync::LazyLock;

/// Control characters that are not legal in XML 1.0 character data.
static XML_INVALID_CONTROL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F]").unwrap());

/// Strip ASCII control characters other than tab, newline and carriage return.
pub fn sanitize_text(text: &str) -> String {
    XML_INVALID_CONTROL_REGEX.replace_all(text, "").into_owned()
}
