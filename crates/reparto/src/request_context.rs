// File: src/request_context.rs
// Purpose: What a handler sees of a dispatched request

use axum::body::Bytes;
use axum::http::{header, HeaderMap, Method};
use reparto_router::Bindings;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;

use crate::dao::Dao;

/// Request context passed to every handler
#[derive(Clone)]
pub struct RequestContext {
    /// HTTP method (GET, POST, PUT, DELETE, etc.)
    pub method: Method,

    /// Request path without the query string
    pub path: String,

    /// Token bindings produced by the dispatch (`$1` -> segment)
    pub bindings: Bindings,

    /// Request headers
    pub headers: HeaderMap,

    /// Parsed cookies
    pub cookies: HashMap<String, String>,

    /// Raw request body
    pub body: Bytes,

    /// Shared data access
    pub dao: Arc<Dao>,
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("bindings", &self.bindings)
            .finish()
    }
}

impl RequestContext {
    pub fn new(
        method: Method,
        path: String,
        bindings: Bindings,
        headers: HeaderMap,
        body: Bytes,
        dao: Arc<Dao>,
    ) -> Self {
        let cookies = Self::parse_cookies(&headers);

        Self {
            method,
            path,
            bindings,
            headers,
            cookies,
            body,
            dao,
        }
    }

    /// Parse cookies from Cookie header
    fn parse_cookies(headers: &HeaderMap) -> HashMap<String, String> {
        let mut cookies = HashMap::new();

        for value in headers.get_all(header::COOKIE) {
            if let Ok(cookie_str) = value.to_str() {
                for cookie in cookie_str.split(';') {
                    if let Some((key, value)) = cookie.trim().split_once('=') {
                        cookies.insert(key.to_string(), value.to_string());
                    }
                }
            }
        }

        cookies
    }

    /// Value bound to a token, e.g. `ctx.param("$1")`
    pub fn param(&self, token: &str) -> Option<&str> {
        self.bindings.get(token)
    }

    /// Value bound to `$<index>`
    pub fn param_index(&self, index: usize) -> Option<&str> {
        self.bindings.get_index(index)
    }

    /// Bound value parsed into `T`
    pub fn param_as<T: std::str::FromStr>(&self, token: &str) -> Option<T> {
        self.param(token)?.parse().ok()
    }

    pub fn get_cookie(&self, name: &str) -> Option<&String> {
        self.cookies.get(name)
    }

    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    /// Media type of the body, without parameters such as `charset`
    pub fn content_type(&self) -> Option<&str> {
        self.get_header(header::CONTENT_TYPE.as_str())
            .map(|value| value.split(';').next().unwrap_or(value).trim())
    }

    /// True when the body is declared as `application/json` or `*+json`
    pub fn is_json(&self) -> bool {
        self.content_type().is_some_and(|media| {
            media.eq_ignore_ascii_case("application/json") || media.ends_with("+json")
        })
    }

    /// Decodes the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}
