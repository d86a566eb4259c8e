// Reparto - minimal REST backend
// Ordered $N-token routing plus a generic SQLite CRUD layer

pub mod value;
pub mod error;
pub mod config;

// Data access
pub mod store;
pub mod dao;

// HTTP layer
pub mod request_context;
pub mod middleware;
pub mod app;

// Re-export the router crate and its core types
pub use reparto_router;
pub use reparto_router::{Bindings, RouteError, Router};

// Re-export framework types
pub use app::App;
pub use config::Config;
pub use dao::Dao;
pub use error::{DaoError, StoreError};
pub use middleware::{
    compose, handler, html_response, json_response, middleware, require_auth, require_json,
    HandlerFn, Middleware,
};
pub use request_context::RequestContext;
pub use store::{CommitPolicy, Handle, Store};
pub use value::{Row, Value};

// Re-export commonly used types from dependencies
pub use axum;
pub use axum::http::StatusCode;
