//! # Reparto Router
//!
//! A zero-dependency REST route table with:
//! - Literal segments (`/api/items`)
//! - Positional tokens (`/api/hospital/$1/beds/$2`)
//! - Case-insensitive verb scoping (`get` == `GET`)
//! - First-registered-wins dispatch
//!
//! ## Matching Rules
//!
//! Paths and patterns are split on `/` and compared segment by segment:
//! - Segment counts must be equal (no wildcards, no optional segments)
//! - A `$<digits>` segment binds the path segment at that position
//! - Every other segment must be byte-for-byte equal
//!
//! ## Dispatch Order
//!
//! Routes are tried in the order they were registered. The first route whose
//! verb and pattern both match wins, even when a later route would be more
//! specific. Registration order is part of the contract.
//!
//! ## Example
//!
//! ```
//! use reparto_router::Router;
//!
//! let mut router = Router::new();
//! router.register("GET", "/api/hospital/$1", "show_hospital").unwrap();
//!
//! let route_match = router.dispatch("GET", "/api/hospital/42").unwrap();
//! assert_eq!(*route_match.handler(), "show_hospital");
//! assert_eq!(route_match.bindings.get("$1"), Some("42"));
//!
//! assert!(router.dispatch("GET", "/api/hospital/42/beds").is_none());
//! assert!(router.dispatch("POST", "/api/hospital/42").is_none());
//! ```

use std::fmt;

// ============================================================================
// Module Declarations
// ============================================================================

mod bindings;
pub mod route;

pub use bindings::Bindings;
pub use route::match_path;
pub use route::pattern::{classify_segment, is_token, parse_pattern, PatternSegment};

// ============================================================================
// Errors
// ============================================================================

/// Configuration error raised while registering a route
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// The verb was empty
    EmptyVerb,
    /// The verb contained something other than ASCII letters
    InvalidVerb(String),
    /// The pattern was empty
    EmptyPattern,
    /// The pattern contained whitespace
    InvalidPattern(String),
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteError::EmptyVerb => write!(f, "route verb must not be empty"),
            RouteError::InvalidVerb(verb) => {
                write!(f, "route verb {verb:?} must only contain ASCII letters")
            }
            RouteError::EmptyPattern => write!(f, "route pattern must not be empty"),
            RouteError::InvalidPattern(pattern) => {
                write!(f, "route pattern {pattern:?} must not contain whitespace")
            }
        }
    }
}

impl std::error::Error for RouteError {}

// ============================================================================
// Core Types
// ============================================================================

/// A single (verb, pattern, handler) registration
///
/// Immutable once built. The pattern is parsed once, here, so dispatch never
/// re-parses it.
#[derive(Clone)]
pub struct Route<H> {
    verb: String,
    pattern: String,
    segments: Vec<PatternSegment>,
    handler: H,
}

impl<H> fmt::Debug for Route<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("verb", &self.verb)
            .field("pattern", &self.pattern)
            .finish_non_exhaustive()
    }
}

impl<H> Route<H> {
    /// Validates and builds a route
    ///
    /// The verb is stored upper-cased.
    ///
    /// # Examples
    ///
    /// ```
    /// use reparto_router::{Route, RouteError};
    ///
    /// let route = Route::new("delete", "/api/items/$1", ()).unwrap();
    /// assert_eq!(route.verb(), "DELETE");
    ///
    /// assert_eq!(Route::new("", "/x", ()).unwrap_err(), RouteError::EmptyVerb);
    /// assert_eq!(Route::new("GET", "", ()).unwrap_err(), RouteError::EmptyPattern);
    /// ```
    pub fn new(
        verb: impl Into<String>,
        pattern: impl Into<String>,
        handler: H,
    ) -> Result<Self, RouteError> {
        let verb = verb.into();
        let pattern = pattern.into();

        if verb.is_empty() {
            return Err(RouteError::EmptyVerb);
        }
        if !verb.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(RouteError::InvalidVerb(verb));
        }
        if pattern.is_empty() {
            return Err(RouteError::EmptyPattern);
        }
        if pattern.chars().any(char::is_whitespace) {
            return Err(RouteError::InvalidPattern(pattern));
        }

        let segments = parse_pattern(&pattern);
        Ok(Self {
            verb: verb.to_ascii_uppercase(),
            pattern,
            segments,
            handler,
        })
    }

    /// Upper-cased verb
    pub fn verb(&self) -> &str {
        &self.verb
    }

    /// Pattern as registered
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Parsed pattern segments
    pub fn segments(&self) -> &[PatternSegment] {
        &self.segments
    }

    /// The registered handler
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// True if this route answers the given verb (case-insensitive)
    pub fn accepts(&self, verb: &str) -> bool {
        self.verb.eq_ignore_ascii_case(verb)
    }

    /// Matches this route's pattern against a path, ignoring the verb
    pub fn matches(&self, path: &str) -> Option<Bindings> {
        route::match_segments(path, &self.segments)
    }
}

/// Result of a successful dispatch
///
/// Carries the bindings by value, so concurrent dispatches on one router never
/// share state.
#[derive(Debug)]
pub struct RouteMatch<'a, H> {
    /// The matched route
    pub route: &'a Route<H>,
    /// Token values extracted from the path
    pub bindings: Bindings,
}

impl<'a, H> RouteMatch<'a, H> {
    /// The matched route's handler
    pub fn handler(&self) -> &'a H {
        &self.route.handler
    }
}

// ============================================================================
// Router
// ============================================================================

/// Ordered route table and dispatcher
///
/// Generic over the handler type so the HTTP layer decides what a handler is.
#[derive(Clone)]
pub struct Router<H> {
    routes: Vec<Route<H>>,
}

impl<H> fmt::Debug for Router<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.routes).finish()
    }
}

impl<H> Default for Router<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> Router<H> {
    /// Creates an empty router
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Appends a route; it is tried after every route registered before it
    pub fn register(
        &mut self,
        verb: impl Into<String>,
        pattern: impl Into<String>,
        handler: H,
    ) -> Result<(), RouteError> {
        self.routes.push(Route::new(verb, pattern, handler)?);
        Ok(())
    }

    /// Adds a route (functional builder)
    ///
    /// # Examples
    ///
    /// ```
    /// use reparto_router::Router;
    ///
    /// let router = Router::new()
    ///     .with_route("GET", "/api/items", 1)?
    ///     .with_route("POST", "/api/items", 2)?;
    ///
    /// assert_eq!(router.len(), 2);
    /// assert_eq!(*router.dispatch("post", "/api/items").unwrap().handler(), 2);
    /// # Ok::<(), reparto_router::RouteError>(())
    /// ```
    pub fn with_route(
        mut self,
        verb: impl Into<String>,
        pattern: impl Into<String>,
        handler: H,
    ) -> Result<Self, RouteError> {
        self.register(verb, pattern, handler)?;
        Ok(self)
    }

    /// Finds the first route, in registration order, matching verb and path
    ///
    /// `None` means nothing matched. That is a normal outcome; the caller
    /// decides how to answer it (usually 404).
    pub fn dispatch(&self, verb: &str, path: &str) -> Option<RouteMatch<'_, H>> {
        self.routes
            .iter()
            .filter(|route| route.accepts(verb))
            .find_map(|route| {
                route
                    .matches(path)
                    .map(|bindings| RouteMatch { route, bindings })
            })
    }

    /// Registered routes in dispatch order
    pub fn routes(&self) -> &[Route<H>] {
        &self.routes
    }

    /// Number of registered routes
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// True if no route has been registered
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
