//! Markup removal for chunk text.
//!
//! Scheme descriptions arrive with inline HTML fragments (`<br>`, `<b>`, ...).
//! Two cleaners exist because the two call sites differ: upsert keeps line
//! breaks, while search-hit normalization only drops tags.

use regex::Regex;
use std::sync::LazyLock;

/// Any `<...>` run on a single line, matched lazily.
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<.*?>").expect("valid regex"));

static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("valid regex"));

/// Remove every HTML-like tag, leaving the surrounding text untouched.
pub fn strip_tags(text: &str) -> String {
    TAG.replace_all(text, "").into_owned()
}

/// Prepare chunk text for indexing: `<br>` variants become newlines, all
/// other tags are removed, and the result is trimmed.
pub fn clean_chunk_text(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    let with_breaks = LINE_BREAK.replace_all(raw, "\n");
    strip_tags(&with_breaks).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_tags() {
        assert_eq!(strip_tags("<b>PM</b> Kisan"), "PM Kisan");
        assert_eq!(strip_tags("no tags"), "no tags");
        assert_eq!(strip_tags("a < b and c > d"), "a  d");
    }

    #[test]
    fn test_strip_tags_does_not_cross_lines() {
        assert_eq!(strip_tags("a <\n b > c"), "a <\n b > c");
    }

    #[test]
    fn test_clean_chunk_text_breaks() {
        assert_eq!(
            clean_chunk_text("Line one<br>Line two<BR/>Line three<br />end"),
            "Line one\nLine two\nLine three\nend"
        );
    }

    #[test]
    fn test_clean_chunk_text_trims_and_strips() {
        assert_eq!(clean_chunk_text("  <p>₹6,000/year</p>  "), "₹6,000/year");
        assert_eq!(clean_chunk_text(""), "");
    }
}
