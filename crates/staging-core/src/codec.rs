//! # Identifier Codec
//!
//! Stored names (content file names, technical-metadata names) may contain
//! reserved characters, path separators included. To appear as a single URL
//! path segment they are percent-encoded with an empty safe set: only the
//! RFC 3986 unreserved characters `A-Z a-z 0-9 - . _ ~` pass through.
//!
//! Lookups compare in one direction only: the stored name is escaped and
//! compared with the escaped request identifier. A stored name that
//! happens to contain a literal `%` is therefore never mis-decoded.
//!
//! Presform lookup compares raw names instead. That asymmetry is carried
//! as an explicit [`MatchPolicy`] so every lookup site names the policy it
//! applies.

use std::borrow::Cow;
use std::str::Utf8Error;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Everything except the RFC 3986 unreserved set.
const IDENTIFIER_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encode `text` so it forms exactly one URL path segment.
pub fn escape(text: &str) -> String {
    utf8_percent_encode(text, IDENTIFIER_ENCODE_SET).to_string()
}

/// Percent-decode `text`. Exact inverse of [`escape`].
///
/// # Errors
///
/// [`Utf8Error`] when the decoded bytes are not UTF-8, e.g. `%FF`. Such
/// text is never produced by `escape` and names nothing.
pub fn unescape(text: &str) -> Result<String, Utf8Error> {
    percent_decode_str(text).decode_utf8().map(Cow::into_owned)
}

/// How a requested identifier is compared against a stored name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPolicy {
    /// `escape(stored) == requested`; `requested` is already escaped.
    Escaped,
    /// `stored == requested`; both are raw names.
    Raw,
}

impl MatchPolicy {
    /// Whether `stored` is identified by `requested` under this policy.
    pub fn matches(&self, stored: &str, requested: &str) -> bool {
        match self {
            Self::Escaped => escape(stored) == requested,
            Self::Raw => stored == requested,
        }
    }

    /// The identifier under which `stored` is listed to clients.
    pub fn present(&self, stored: &str) -> String {
        match self {
            Self::Escaped => escape(stored),
            Self::Raw => stored.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn escapes_space_and_separator() {
        assert_eq!(escape("file one.txt"), "file%20one.txt");
        assert_eq!(escape("a/b/c"), "a%2Fb%2Fc");
        assert_eq!(escape("100%"), "100%25");
    }

    #[test]
    fn unreserved_pass_through() {
        assert_eq!(escape("AZaz09-._~"), "AZaz09-._~");
        assert_eq!(escape(""), "");
    }

    #[test]
    fn unicode_is_utf8_encoded() {
        assert_eq!(escape("é"), "%C3%A9");
        assert_eq!(unescape("%C3%A9").unwrap(), "é");
    }

    #[test]
    fn invalid_utf8_escapes_are_rejected() {
        assert!(unescape("%FF.txt").is_err());
        assert!(unescape("%C3").is_err());
        assert_eq!(unescape("%EF%BF%BD.txt").unwrap(), "\u{FFFD}.txt");
    }

    #[test]
    fn literal_percent_in_stored_name_is_not_decoded() {
        // "a%20b" stored literally must only match its own escaped form.
        assert!(MatchPolicy::Escaped.matches("a%20b", "a%2520b"));
        assert!(!MatchPolicy::Escaped.matches("a%20b", "a%20b"));
    }

    #[test]
    fn raw_policy_compares_verbatim() {
        assert!(MatchPolicy::Raw.matches("a b", "a b"));
        assert!(!MatchPolicy::Raw.matches("a b", "a%20b"));
        assert_eq!(MatchPolicy::Raw.present("a b"), "a b");
        assert_eq!(MatchPolicy::Escaped.present("a b"), "a%20b");
    }

    proptest! {
        #[test]
        fn unescape_inverts_escape(text in any::<String>()) {
            prop_assert_eq!(unescape(&escape(&text)).unwrap(), text);
        }

        #[test]
        fn escaped_text_has_no_separator(text in ".*/.*") {
            let escaped = escape(&text);
            prop_assert!(!escaped.contains('/'));
        }

        #[test]
        fn both_comparison_directions_agree(text in any::<String>()) {
            let requested = escape(&text);
            prop_assert!(MatchPolicy::Escaped.matches(&text, &requested));
            prop_assert!(MatchPolicy::Raw.matches(&text, &unescape(&requested).unwrap()));
        }
    }
}
