// rate_limit_middleware.rs
use crate::services::rate_limit::{RateLimitResult, RateLimitService};
use axum::{
    extract::{ConnectInfo, Extension, Request},
    http::{HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Serialize)]
struct RateLimitErrorResponse {
    success: bool,
    error: String,
    code: String,
    retry_after: u32,
}

/// Client address for rate limiting.
///
/// Forwarding headers are only read when the direct peer is a trusted proxy.
/// `X-Forwarded-For` is walked right to left so hops the client wrote itself
/// are ignored.
fn extract_ip_address(
    headers: &HeaderMap,
    connect_info: Option<&ConnectInfo<SocketAddr>>,
    is_trusted_proxy: impl Fn(&str) -> bool,
) -> Option<String> {
    let peer = connect_info.map(|info| info.0.ip().to_string())?;
    if !is_trusted_proxy(&peer) {
        return Some(peer);
    }

    if let Some(forwarded) = headers.get("x-forwarded-for") {
        if let Ok(forwarded_str) = forwarded.to_str() {
            let client = forwarded_str
                .rsplit(',')
                .map(str::trim)
                .find(|hop| !hop.is_empty() && !is_trusted_proxy(hop));
            if let Some(client) = client {
                return Some(client.to_string());
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(ip_str) = real_ip.to_str() {
            let ip_str = ip_str.trim();
            if !ip_str.is_empty() {
                return Some(ip_str.to_string());
            }
        }
    }

    Some(peer)
}

fn too_many_requests(retry_after: u32) -> Response {
    let error_response = RateLimitErrorResponse {
        success: false,
        error: "Too many requests from this IP, please try again later.".to_string(),
        code: "RATE_LIMIT_EXCEEDED".to_string(),
        retry_after,
    };

    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(error_response)).into_response();

    if let Ok(retry_header) = HeaderValue::from_str(&retry_after.to_string()) {
        response.headers_mut().insert("retry-after", retry_header);
    }

    response
}

/// Per-IP limiter for the credential endpoints (signup, signin, OTP)
pub async fn rate_limit_middleware(
    Extension(rate_limit_service): Extension<Arc<RateLimitService>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    let ip_address = extract_ip_address(request.headers(), connect_info.as_ref(), |ip| {
        rate_limit_service.is_trusted_proxy(ip)
    })
    .unwrap_or_else(|| "unknown".to_string());
    let path = request.uri().path().to_string();

    match rate_limit_service.check_rate_limit(&ip_address).await {
        RateLimitResult::Allowed => {
            debug!(ip = %ip_address, path = %path, "Request allowed by rate limiter");
            Ok(next.run(request).await)
        }
        RateLimitResult::Limited { retry_after } => {
            warn!(
                ip = %ip_address,
                path = %path,
                retry_after = retry_after,
                "Request blocked by rate limiter"
            );
            rate_limit_service.log_violation(&ip_address, &path);

            Err(too_many_requests(retry_after))
        }
    }
}
