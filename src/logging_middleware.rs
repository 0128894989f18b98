// src/logging_middleware.rs
//! Middleware for logging request and response bodies in debug mode.
//! Credential fields are masked before anything is written.

use axum::body::to_bytes;
use axum::{
    body::Body,
    extract::Request,
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use serde_json::Value;
use tracing::{debug, enabled, Level};
use uuid::Uuid;

/// JSON keys whose values never reach the logs
const REDACTED_KEYS: &[&str] = &[
    "password",
    "newPassword",
    "otpCode",
    "code",
    "authCode",
    "accessToken",
    "refreshToken",
];

/// Replaces the value of every credential key, at any depth, with "[REDACTED]"
pub fn redact(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, field) in map.iter_mut() {
                if REDACTED_KEYS.contains(&key.as_str()) {
                    *field = Value::String("[REDACTED]".to_string());
                } else {
                    redact(field);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact),
        _ => {}
    }
}

/// Renders a body for the log; non-JSON bodies are reported by size only
fn loggable_body(bytes: &[u8]) -> String {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(mut json) => {
            redact(&mut json);
            json.to_string()
        }
        Err(_) => format!("<{} bytes>", bytes.len()),
    }
}

/// Tags each request with an `x-request-id` and logs bodies at debug level
pub async fn log_request_response(request: Request, next: Next) -> Result<Response, StatusCode> {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    if !enabled!(Level::DEBUG) {
        let mut response = next.run(request).await;
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert("x-request-id", value);
        }
        return Ok(response);
    }

    let (parts, body) = request.into_parts();
    let bytes = to_bytes(body, usize::MAX)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if !bytes.is_empty() {
        debug!(
            request_id = %request_id,
            method = %parts.method,
            uri = %parts.uri,
            request_body = %loggable_body(&bytes),
            "📥 Request"
        );
    }

    let request = Request::from_parts(parts, Body::from(bytes));
    let response = next.run(request).await;

    let (mut parts, body) = response.into_parts();
    let bytes = to_bytes(body, usize::MAX)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if !bytes.is_empty() {
        debug!(
            request_id = %request_id,
            status = %parts.status,
            response_body = %loggable_body(&bytes),
            "📤 Response"
        );
    }

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        parts.headers.insert("x-request-id", value);
    }

    Ok(Response::from_parts(parts, Body::from(bytes)))
}
