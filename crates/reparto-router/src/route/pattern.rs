//! Pattern parsing for route segments
//!
//! Pure functional parsing of `/`-delimited route patterns into typed segments.
//! All functions are **pure**: same input → same output, no side effects.

/// A single segment of a route pattern
///
/// # Examples
///
/// ```
/// use reparto_router::route::pattern::{classify_segment, PatternSegment};
///
/// assert_eq!(classify_segment("$1"), PatternSegment::Token("$1".to_string()));
/// assert_eq!(classify_segment("hospital"), PatternSegment::Literal("hospital".to_string()));
///
/// // Only a whole-segment `$<digits>` is a token
/// assert_eq!(classify_segment("$1a"), PatternSegment::Literal("$1a".to_string()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternSegment {
    /// Positional token (`$1`, `$2`, ...) standing for any path segment
    Token(String),
    /// Literal text compared byte-for-byte
    Literal(String),
}

impl PatternSegment {
    /// Numeric index of a token segment (`$12` → 12)
    pub fn token_index(&self) -> Option<usize> {
        match self {
            PatternSegment::Token(token) => token_index(token),
            PatternSegment::Literal(_) => None,
        }
    }
}

/// Returns true if the segment is a positional token
///
/// The grammar is anchored to the whole segment: a `$` followed by one or
/// more ASCII digits and nothing else.
///
/// # Examples
///
/// ```
/// use reparto_router::route::pattern::is_token;
///
/// assert!(is_token("$1"));
/// assert!(is_token("$042"));
///
/// assert!(!is_token("$"));
/// assert!(!is_token("$id"));
/// assert!(!is_token("$1a"));
/// assert!(!is_token("x$1"));
/// ```
pub fn is_token(segment: &str) -> bool {
    segment
        .strip_prefix('$')
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

/// Parses the number following `$` in a token
///
/// Returns `None` for literals and for tokens too large for `usize`.
pub fn token_index(segment: &str) -> Option<usize> {
    if !is_token(segment) {
        return None;
    }
    segment[1..].parse().ok()
}

/// Classifies one pattern segment (pure function)
pub fn classify_segment(segment: &str) -> PatternSegment {
    if is_token(segment) {
        PatternSegment::Token(segment.to_string())
    } else {
        PatternSegment::Literal(segment.to_string())
    }
}

/// Splits a pattern on `/` and classifies every segment
///
/// Empty segments are kept: `/a/` has three segments (`""`, `"a"`, `""`), so
/// a trailing slash is significant when matching.
///
/// # Examples
///
/// ```
/// use reparto_router::route::pattern::{parse_pattern, PatternSegment};
///
/// let segments = parse_pattern("/api/hospital/$1");
/// assert_eq!(segments.len(), 4);
/// assert_eq!(segments[3], PatternSegment::Token("$1".to_string()));
/// ```
pub fn parse_pattern(pattern: &str) -> Vec<PatternSegment> {
    pattern.split('/').map(classify_segment).collect()
}
