//! Compiled text patterns shared by the processors.
//!
//! All of these are deliberately loose. The inputs are chat prose and pages
//! we only skim, so nothing here validates structure.

// The patterns are literals; failing to compile one is a programming error.
#![allow(clippy::expect_used)]

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Candidate links in chat text: `http://` up to the next space.
    pub static ref URL_RE: Regex = Regex::new(r"http://[^ ]*").expect("valid URL pattern");

    /// `name.html` anchors in the cgit tree listing of the docs directory.
    pub static ref DOC_LINK_RE: Regex =
        Regex::new(r"href='[^']*'>([^<]*)\.html").expect("valid doc link pattern");

    /// `>name` or `>name#fragment` references in chat text. Classes and the
    /// word boundary are ASCII-only, so `>userguideé` still ends at `e`.
    pub static ref DOC_REF_RE: regex::bytes::Regex =
        regex::bytes::Regex::new(r"(?-u)\s*>([a-zA-Z0-9-]*)(#[a-zA-Z0-9_-]+)?\b")
            .expect("valid doc reference pattern");

    /// `<title>` element on a single line of raw response bytes.
    pub static ref TITLE_RE: regex::bytes::Regex =
        regex::bytes::Regex::new(r"(?-u)<title>(.*)</title>").expect("valid title pattern");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_pattern_stops_at_space() {
        let found: Vec<_> = URL_RE
            .find_iter("see http://a.example/x, and http://b.example/(y) now")
            .map(|m| m.as_str())
            .collect();
        assert_eq!(found, vec!["http://a.example/x,", "http://b.example/(y)"]);
    }

    #[test]
    fn test_url_pattern_ignores_https() {
        assert!(URL_RE.find("https://secure.example/").is_none());
    }

    #[test]
    fn test_doc_ref_pattern_captures_fragment() {
        let caps = DOC_REF_RE.captures(b"read >userguide#starting").unwrap();
        assert_eq!(&caps[1], b"userguide");
        assert_eq!(&caps[2], b"#starting");
    }

    #[test]
    fn test_doc_ref_boundary_is_ascii() {
        let caps = DOC_REF_RE.captures(">userguide\u{e9}".as_bytes()).unwrap();
        assert_eq!(&caps[1], b"userguide");
    }

    #[test]
    fn test_title_pattern_matches_bytes() {
        let caps = TITLE_RE.captures(b"  <title>i3 - improved</title>").unwrap();
        assert_eq!(&caps[1], b"i3 - improved");
    }
}
