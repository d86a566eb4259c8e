//! Route pattern parsing and path matching
//!
//! - `pattern`: classify segments into literals and `$N` tokens
//! - `match_path`: compare a concrete path against a pattern
pub mod pattern;

use crate::Bindings;
use pattern::{parse_pattern, PatternSegment};

/// Matches a concrete path against a route pattern (pure function)
///
/// Both strings are split on `/` and compared position by position. A token
/// segment binds whatever the path carries at that position; any other
/// segment must be byte-for-byte equal. Paths with a different number of
/// segments never match.
///
/// # Examples
///
/// ```
/// use reparto_router::match_path;
///
/// let bindings = match_path("/api/hospital/42", "/api/hospital/$1").unwrap();
/// assert_eq!(bindings.get("$1"), Some("42"));
///
/// assert!(match_path("/api/hospital/42/beds", "/api/hospital/$1").is_none());
/// assert!(match_path("/api/clinic/42", "/api/hospital/$1").is_none());
/// ```
pub fn match_path(path: &str, pattern: &str) -> Option<Bindings> {
    match_segments(path, &parse_pattern(pattern))
}

/// Matches a path against pre-parsed pattern segments
///
/// Used by `Route`, which parses its pattern once at registration.
pub(crate) fn match_segments(path: &str, segments: &[PatternSegment]) -> Option<Bindings> {
    if path.split('/').count() != segments.len() {
        return None;
    }

    path.split('/')
        .zip(segments)
        .try_fold(Bindings::new(), |mut bindings, (actual, expected)| match expected {
            PatternSegment::Token(token) => {
                bindings.insert(token.clone(), actual.to_string());
                Some(bindings)
            }
            PatternSegment::Literal(literal) if literal.as_str() == actual => Some(bindings),
            PatternSegment::Literal(_) => None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_only_match_has_no_bindings() {
        let bindings = match_path("/example", "/example").unwrap();
        assert!(bindings.is_empty());
    }

    #[test]
    fn test_literal_mismatch() {
        assert!(match_path("/examples", "/example").is_none());
    }

    #[test]
    fn test_literal_comparison_is_case_sensitive() {
        assert!(match_path("/Example", "/example").is_none());
    }

    #[test]
    fn test_segment_count_mismatch() {
        assert!(match_path("/a/b", "/a/b/c").is_none());
        assert!(match_path("/a/b/c", "/a/$1").is_none());
    }

    #[test]
    fn test_trailing_slash_changes_segment_count() {
        assert!(match_path("/example/", "/example").is_none());
    }

    #[test]
    fn test_multiple_tokens() {
        let bindings = match_path("/api/hospital/7/beds/3", "/api/hospital/$1/beds/$2").unwrap();
        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings.get("$1"), Some("7"));
        assert_eq!(bindings.get("$2"), Some("3"));
    }

    #[test]
    fn test_token_binds_empty_segment() {
        let bindings = match_path("/api/", "/api/$1").unwrap();
        assert_eq!(bindings.get("$1"), Some(""));
    }

    #[test]
    fn test_token_equal_to_path_segment_is_still_bound() {
        let bindings = match_path("/api/$1", "/api/$1").unwrap();
        assert_eq!(bindings.get("$1"), Some("$1"));
    }

    #[test]
    fn test_pseudo_token_is_literal() {
        assert!(match_path("/api/42", "/api/$1a").is_none());
        assert!(match_path("/api/$1a", "/api/$1a").unwrap().is_empty());
    }

    #[test]
    fn test_repeated_token_keeps_last_value() {
        let bindings = match_path("/a/1/2", "/a/$1/$1").unwrap();
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings.get("$1"), Some("2"));
    }
}
