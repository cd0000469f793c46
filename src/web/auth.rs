//! Optional HTTP basic auth for the API.
//!
//! Enabled by setting `FBWATCH_WEB_PASS`; `FBWATCH_WEB_USER` defaults to
//! "admin". With no password configured every request passes through.

use axum::{extract::Request, http::StatusCode, middleware::Next, response::Response};
use base64::Engine;
use tracing::warn;

/// Credentials the server expects, or `None` when auth is disabled.
fn expected_credentials() -> Option<(String, String)> {
    let pass = std::env::var("FBWATCH_WEB_PASS").ok().filter(|p| !p.is_empty())?;
    let user = std::env::var("FBWATCH_WEB_USER").unwrap_or_else(|_| "admin".to_string());
    Some((user, pass))
}

/// Decode a `Basic <base64(user:pass)>` header value into its parts.
fn decode_basic(header: &str) -> Option<(String, String)> {
    let encoded = header.strip_prefix("Basic ")?;
    let decoded = base64::engine::general_purpose::STANDARD.decode(encoded).ok()?;
    let credentials = String::from_utf8(decoded).ok()?;
    let (user, pass) = credentials.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}

pub async fn basic_auth_middleware(request: Request, next: Next) -> Result<Response, StatusCode> {
    let Some((expected_user, expected_pass)) = expected_credentials() else {
        return Ok(next.run(request).await);
    };

    let header = request
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok());

    match header.and_then(decode_basic) {
        Some((user, pass)) if user == expected_user && pass == expected_pass => {
            Ok(next.run(request).await)
        }
        Some((user, _)) => {
            warn!("[Auth] Invalid credentials for user: {}", user);
            Err(StatusCode::UNAUTHORIZED)
        }
        None => {
            warn!("[Auth] Missing or malformed Authorization header");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}
