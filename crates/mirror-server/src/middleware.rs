//! Basic-auth gate for the webhook route

use std::sync::Arc;

use axum::extract::Request;
use axum::http::{HeaderMap, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

/// Expected credentials for the gated route.
pub struct BasicAuthCredentials {
    pub username: String,
    pub password: String,
}

pub async fn basic_auth(
    credentials: Arc<BasicAuthCredentials>,
    request: Request,
    next: Next,
) -> Response {
    if authorized(request.headers(), &credentials) {
        next.run(request).await
    } else {
        (StatusCode::UNAUTHORIZED, "Unauthorized").into_response()
    }
}

fn authorized(headers: &HeaderMap, credentials: &BasicAuthCredentials) -> bool {
    let Some(value) = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
    else {
        return false;
    };
    let Some(encoded) = value.strip_prefix("Basic ") else {
        return false;
    };
    let Ok(decoded) = BASE64.decode(encoded) else {
        return false;
    };
    let Ok(decoded) = String::from_utf8(decoded) else {
        return false;
    };
    let Some((username, password)) = decoded.split_once(':') else {
        return false;
    };
    username == credentials.username && password == credentials.password
}
