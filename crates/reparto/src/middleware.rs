// File: src/middleware.rs
// Purpose: Handler type and the wrappers composed around handlers at registration
//
// A middleware is a plain function from handler to handler. `compose` applies a
// list of them so that the first one listed is the outermost.

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

use crate::request_context::RequestContext;
use crate::store::BoxFuture;

/// A dispatched request handler
pub type HandlerFn = Arc<dyn Fn(RequestContext) -> BoxFuture<'static, Response> + Send + Sync>;

/// Wraps a handler into another handler
pub type Middleware = Arc<dyn Fn(HandlerFn) -> HandlerFn + Send + Sync>;

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=UTF-8";
pub const HTML_CONTENT_TYPE: &str = "text/html; charset=UTF-8";

/// Turns an async function into a [`HandlerFn`]
pub fn handler<F, Fut>(f: F) -> HandlerFn
where
    F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    Arc::new(move |ctx: RequestContext| -> BoxFuture<'static, Response> {
        Box::pin(f(ctx))
    })
}

/// Turns a function from handler to handler into a [`Middleware`]
pub fn middleware<F>(f: F) -> Middleware
where
    F: Fn(HandlerFn) -> HandlerFn + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Applies `middlewares` around `inner`; `middlewares[0]` runs first
pub fn compose(inner: HandlerFn, middlewares: &[Middleware]) -> HandlerFn {
    middlewares
        .iter()
        .rev()
        .fold(inner, |wrapped, middleware| middleware(wrapped))
}

/// Serializes `body` as a JSON response with the given status
pub fn json<T: Serialize>(status: StatusCode, body: &T) -> Response {
    match serde_json::to_vec(body) {
        Ok(bytes) => (
            status,
            [(header::CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE))],
            Body::from(bytes),
        )
            .into_response(),
        Err(err) => {
            debug!(error = %err, "failed to serialize response body");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Response with no body
pub fn status(status: StatusCode) -> Response {
    status.into_response()
}

fn with_content_type(inner: HandlerFn, content_type: &'static str) -> HandlerFn {
    Arc::new(move |ctx: RequestContext| -> BoxFuture<'static, Response> {
        let inner = inner.clone();
        Box::pin(async move {
            let mut response = inner(ctx).await;
            response
                .headers_mut()
                .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
            response
        })
    })
}

/// Marks the response as UTF-8 JSON
pub fn json_response() -> Middleware {
    middleware(|inner| with_content_type(inner, JSON_CONTENT_TYPE))
}

/// Marks the response as UTF-8 HTML
pub fn html_response() -> Middleware {
    middleware(|inner| with_content_type(inner, HTML_CONTENT_TYPE))
}

/// Answers `400 Bad Request` unless the body is declared as JSON
pub fn require_json() -> Middleware {
    middleware(|inner| {
        Arc::new(move |ctx: RequestContext| -> BoxFuture<'static, Response> {
            let inner = inner.clone();
            Box::pin(async move {
                if !ctx.is_json() {
                    debug!(
                        path = %ctx.path,
                        content_type = ?ctx.content_type(),
                        "rejecting non-JSON body"
                    );
                    return status(StatusCode::BAD_REQUEST);
                }
                inner(ctx).await
            })
        })
    })
}

/// Answers `401 Unauthorized` unless `check` accepts the request
///
/// The check sees the whole context, cookies included; what counts as
/// authenticated is up to the application.
pub fn require_auth<C>(check: C) -> Middleware
where
    C: Fn(&RequestContext) -> bool + Send + Sync + 'static,
{
    let check = Arc::new(check);
    middleware(move |inner| {
        let check = check.clone();
        Arc::new(move |ctx: RequestContext| -> BoxFuture<'static, Response> {
            let inner = inner.clone();
            let allowed = check(&ctx);
            Box::pin(async move {
                if !allowed {
                    debug!(path = %ctx.path, "rejecting unauthenticated request");
                    return status(StatusCode::UNAUTHORIZED);
                }
                inner(ctx).await
            })
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::Dao;
    use crate::store::Store;
    use axum::body::Bytes;
    use axum::http::{HeaderMap, Method};
    use reparto_router::Bindings;
    use std::sync::Mutex;

    fn context(headers: HeaderMap) -> RequestContext {
        let dao = Arc::new(Dao::new(Arc::new(Store::new("/nonexistent", "unused"))));
        RequestContext::new(
            Method::GET,
            "/".to_string(),
            Bindings::new(),
            headers,
            Bytes::new(),
            dao,
        )
    }

    fn ok_handler() -> HandlerFn {
        handler(|_ctx| async { status(StatusCode::OK) })
    }

    fn tracing_middleware(name: &'static str, log: Arc<Mutex<Vec<&'static str>>>) -> Middleware {
        middleware(move |inner| {
            let log = log.clone();
            Arc::new(move |ctx: RequestContext| {
                log.lock().unwrap().push(name);
                inner(ctx)
            })
        })
    }

    #[tokio::test]
    async fn test_compose_runs_first_listed_outermost() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let wrapped = compose(
            ok_handler(),
            &[
                tracing_middleware("outer", log.clone()),
                tracing_middleware("inner", log.clone()),
            ],
        );

        let response = wrapped(context(HeaderMap::new())).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(*log.lock().unwrap(), vec!["outer", "inner"]);
    }

    #[tokio::test]
    async fn test_compose_without_middleware_is_identity() {
        let response = compose(ok_handler(), &[])(context(HeaderMap::new())).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_json_response_sets_content_type() {
        let wrapped = compose(ok_handler(), &[json_response()]);
        let response = wrapped(context(HeaderMap::new())).await;
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            JSON_CONTENT_TYPE
        );
    }

    #[tokio::test]
    async fn test_html_response_sets_content_type() {
        let wrapped = compose(ok_handler(), &[html_response()]);
        let response = wrapped(context(HeaderMap::new())).await;
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            HTML_CONTENT_TYPE
        );
    }

    #[tokio::test]
    async fn test_require_json() {
        let wrapped = compose(ok_handler(), &[require_json()]);

        let response = wrapped(context(HeaderMap::new())).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let response = wrapped(context(headers)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_require_auth() {
        let wrapped = compose(
            ok_handler(),
            &[require_auth(|ctx| ctx.get_cookie("session").is_some())],
        );

        let response = wrapped(context(HeaderMap::new())).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("session=abc"));
        let response = wrapped(context(headers)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_json_helper() {
        let response = json(StatusCode::CREATED, &serde_json::json!({"status": 1}));
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            JSON_CONTENT_TYPE
        );
    }
}
