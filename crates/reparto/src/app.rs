// File: src/app.rs
// Purpose: Glue between the route table, the DAO and axum

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use reparto_router::{RouteError, RouteMatch, Router};
use std::sync::Arc;
use tracing::debug;

use crate::config::Config;
use crate::dao::Dao;
use crate::middleware::{compose, HandlerFn, Middleware};
use crate::request_context::RequestContext;

/// Body of the answer to an unmatched request
pub const NOT_FOUND_MESSAGE: &str = "Resource not found";

/// Ordered routes plus the shared DAO every handler receives
#[derive(Clone)]
pub struct App {
    router: Router<HandlerFn>,
    dao: Arc<Dao>,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("router", &self.router)
            .field("dao", &self.dao)
            .finish()
    }
}

impl App {
    pub fn new(dao: Arc<Dao>) -> Self {
        Self {
            router: Router::new(),
            dao,
        }
    }

    /// App backed by the store and allow-list from `config`
    pub fn from_config(config: &Config) -> Self {
        Self::new(Arc::new(Dao::from_config(&config.database)))
    }

    /// Registers `handler` wrapped in `middlewares` (first listed runs first)
    pub fn register(
        &mut self,
        verb: &str,
        pattern: &str,
        handler: HandlerFn,
        middlewares: &[Middleware],
    ) -> Result<(), RouteError> {
        self.router
            .register(verb, pattern, compose(handler, middlewares))?;
        debug!(verb, pattern, middlewares = middlewares.len(), "registered route");
        Ok(())
    }

    /// Builder form of [`App::register`]
    pub fn route(
        mut self,
        verb: &str,
        pattern: &str,
        handler: HandlerFn,
        middlewares: &[Middleware],
    ) -> Result<Self, RouteError> {
        self.register(verb, pattern, handler, middlewares)?;
        Ok(self)
    }

    pub fn router(&self) -> &Router<HandlerFn> {
        &self.router
    }

    pub fn dao(&self) -> &Arc<Dao> {
        &self.dao
    }

    /// Dispatches one request and runs the matched handler
    ///
    /// `path` must not include the query string. Nothing matched answers
    /// `404 Not Found`.
    pub async fn handle(&self, method: Method, path: &str, headers: HeaderMap, body: Bytes) -> Response {
        let Some(RouteMatch { route, bindings }) = self.router.dispatch(method.as_str(), path) else {
            debug!(method = %method, path, "no route matched");
            return (StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE).into_response();
        };

        debug!(method = %method, path, pattern = route.pattern(), "dispatching");
        let handler = route.handler().clone();
        let ctx = RequestContext::new(
            method,
            path.to_string(),
            bindings,
            headers,
            body,
            self.dao.clone(),
        );
        handler(ctx).await
    }

    /// Converts the app into an axum router answering every path
    ///
    /// Every method reaches the dispatcher, so any registered verb is
    /// reachable and anything unmatched answers 404 rather than 405.
    pub fn into_axum_router(self) -> axum::Router {
        let state = Arc::new(self);
        axum::Router::new()
            .route("/", any(dispatch_request))
            .route("/*path", any(dispatch_request))
            .with_state(state)
    }
}

async fn dispatch_request(
    State(app): State<Arc<App>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    app.handle(method, uri.path(), headers, body).await
}
