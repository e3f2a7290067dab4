//! HTTP surface: routing, bearer auth and JSON envelopes.

pub mod auth;
pub mod error;
pub mod handlers;

use axum::http::{HeaderName, Method, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Router, middleware};
use std::any::Any;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::service::RateService;
use auth::AuthToken;
use error::ApiError;

/// Builds the application router. Every `/api` route requires the bearer token.
pub fn router(service: Arc<RateService>, token: String) -> Router {
    let api = Router::new()
        .route("/health", get(handlers::health))
        .route("/currencies", get(handlers::currencies))
        .route("/rates", get(handlers::rates))
        .route("/convert", post(handlers::convert))
        .layer(middleware::from_fn(auth::require_auth))
        .layer(Extension(AuthToken(token)));

    Router::new()
        .nest("/api", api)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(cors())
        .with_state(service)
}

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::HEAD,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([
            HeaderName::from_static("origin"),
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
        ])
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = detail, "Handler panicked");
    ApiError::Internal("Internal server error".to_string()).into_response()
}
