// File: src/handlers.rs
// Purpose: Example routes: hello endpoint plus CRUD over the `items` table

use axum::http::StatusCode;
use axum::response::Response;
use reparto::middleware::{json, status};
use reparto::{handler, json_response, require_json, App, DaoError, RequestContext, RouteError, Value};
use serde::Deserialize;
use serde_json::{json as json_value, Value as JsonValue};
use tracing::error;

const ITEMS: &str = "items";

/// Registers every example route, in dispatch order
pub fn register(app: App) -> Result<App, RouteError> {
    app.route("GET", "/example", handler(hello_rest), &[json_response()])?
        .route("GET", "/api/items", handler(list_items), &[json_response()])?
        .route("GET", "/api/items/$1", handler(get_item), &[json_response()])?
        .route(
            "POST",
            "/api/items",
            handler(create_item),
            &[require_json(), json_response()],
        )?
        .route("DELETE", "/api/items/$1", handler(delete_item), &[json_response()])
}

#[derive(Debug, Deserialize)]
struct NewItem {
    name: String,
}

fn dao_error(err: DaoError) -> Response {
    if err.is_caller_error() {
        return json(StatusCode::BAD_REQUEST, &json_value!({"status": 0, "msg": err.to_string()}));
    }
    error!(error = %err, "data access failed");
    json(
        StatusCode::INTERNAL_SERVER_ERROR,
        &json_value!({"status": 0, "msg": "internal error"}),
    )
}

/// `$1` as an item id, or a 400 response
fn item_id(ctx: &RequestContext) -> Result<i64, Response> {
    ctx.param_as::<i64>("$1").ok_or_else(|| {
        json(
            StatusCode::BAD_REQUEST,
            &json_value!({"status": 0, "msg": "item id must be an integer"}),
        )
    })
}

async fn hello_rest(_ctx: RequestContext) -> Response {
    json(StatusCode::OK, &json_value!({"status": 1, "msg": "Hello REST!"}))
}

async fn list_items(ctx: RequestContext) -> Response {
    match ctx.dao.read_all(ITEMS).await {
        Ok(rows) => {
            let items: Vec<JsonValue> = rows.iter().map(|row| row.to_json()).collect();
            json(StatusCode::OK, &items)
        }
        Err(err) => dao_error(err),
    }
}

async fn get_item(ctx: RequestContext) -> Response {
    let id = match item_id(&ctx) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match ctx.dao.read(ITEMS, &["id"], &[Value::from(id)]).await {
        Ok(rows) => match rows.first() {
            Some(row) => json(StatusCode::OK, &row.to_json()),
            None => status(StatusCode::NOT_FOUND),
        },
        Err(err) => dao_error(err),
    }
}

async fn create_item(ctx: RequestContext) -> Response {
    let item: NewItem = match ctx.json() {
        Ok(item) => item,
        Err(err) => {
            return json(
                StatusCode::BAD_REQUEST,
                &json_value!({"status": 0, "msg": err.to_string()}),
            )
        }
    };

    match ctx.dao.insert(ITEMS, &["name"], &[Value::from(item.name)]).await {
        Ok(()) => json(StatusCode::CREATED, &json_value!({"status": 1})),
        Err(err) => dao_error(err),
    }
}

async fn delete_item(ctx: RequestContext) -> Response {
    let id = match item_id(&ctx) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match ctx.dao.delete(ITEMS, &["id"], &[Value::from(id)]).await {
        Ok(()) => json(StatusCode::OK, &json_value!({"status": 1})),
        Err(err) => dao_error(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Bytes};
    use axum::http::{header, HeaderMap, HeaderValue, Method};
    use pretty_assertions::assert_eq;
    use reparto::Config;
    use tempfile::TempDir;

    fn app(tmp: &TempDir) -> App {
        let mut config = Config::default();
        config.database.output_dir = tmp.path().to_path_buf();
        register(App::from_config(&config)).unwrap()
    }

    fn json_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }

    async fn call(app: &App, method: Method, path: &str, headers: HeaderMap, body: &'static str) -> (StatusCode, JsonValue) {
        let response = app
            .handle(method, path, headers, Bytes::from_static(body.as_bytes()))
            .await;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            JsonValue::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    #[tokio::test]
    async fn test_routes_in_order() {
        let tmp = TempDir::new().unwrap();
        let app = app(&tmp);
        let routes: Vec<_> = app
            .router()
            .routes()
            .iter()
            .map(|route| (route.verb().to_string(), route.pattern().to_string()))
            .collect();

        assert_eq!(
            routes,
            vec![
                ("GET".to_string(), "/example".to_string()),
                ("GET".to_string(), "/api/items".to_string()),
                ("GET".to_string(), "/api/items/$1".to_string()),
                ("POST".to_string(), "/api/items".to_string()),
                ("DELETE".to_string(), "/api/items/$1".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_hello_rest() {
        let tmp = TempDir::new().unwrap();
        let (status, body) = call(&app(&tmp), Method::GET, "/example", HeaderMap::new(), "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json_value!({"status": 1, "msg": "Hello REST!"}));
    }

    #[tokio::test]
    async fn test_item_lifecycle() {
        let tmp = TempDir::new().unwrap();
        let app = app(&tmp);

        let (status, _) = call(&app, Method::POST, "/api/items", json_headers(), r#"{"name":"mask"}"#).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, item) = call(&app, Method::GET, "/api/items/1", HeaderMap::new(), "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(item["id"], json_value!(1));
        assert_eq!(item["name"], json_value!("mask"));
        assert!(item["scanned_at"].is_string());

        let (status, _) = call(&app, Method::DELETE, "/api/items/1", HeaderMap::new(), "").await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = call(&app, Method::GET, "/api/items/1", HeaderMap::new(), "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, items) = call(&app, Method::GET, "/api/items", HeaderMap::new(), "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(items, json_value!([]));
    }

    #[tokio::test]
    async fn test_bad_requests() {
        let tmp = TempDir::new().unwrap();
        let app = app(&tmp);

        let (status, _) = call(&app, Method::GET, "/api/items/abc", HeaderMap::new(), "").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(&app, Method::POST, "/api/items", HeaderMap::new(), r#"{"name":"mask"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(&app, Method::POST, "/api/items", json_headers(), r#"{"label":"mask"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
