use axum::extract::Request;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use super::error::ApiError;

/// Extension type injected into every request so the middleware can read the token.
#[derive(Clone)]
pub struct AuthToken(pub String);

/// Axum middleware: require `Authorization: Bearer <token>` matching the configured token.
pub async fn require_auth(request: Request, next: Next) -> Response {
    let expected = request
        .extensions()
        .get::<AuthToken>()
        .map(|t| t.0.clone())
        .unwrap_or_default();

    let header = request
        .headers()
        .get(AUTHORIZATION)
        .map(|v| v.to_str().unwrap_or(""));

    match check_bearer(header, &expected) {
        Ok(()) => next.run(request).await,
        Err(e) => e.into_response(),
    }
}

fn check_bearer(header: Option<&str>, expected: &str) -> Result<(), ApiError> {
    let header = match header {
        Some(h) if !h.is_empty() => h,
        _ => return Err(ApiError::Unauthorized("Authorization header is required")),
    };

    let token = header.strip_prefix("Bearer ").ok_or(ApiError::Unauthorized(
        "Authorization header must start with 'Bearer '",
    ))?;

    // An unset token never authenticates anyone
    if expected.is_empty() || !constant_time_eq(token.as_bytes(), expected.as_bytes()) {
        return Err(ApiError::Unauthorized("Invalid authorization token"));
    }
    Ok(())
}

/// Constant-time comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
