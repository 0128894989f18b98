// Shared fixtures for database-backed and HTTP-level tests

use axum::{body::Body, extract::Extension, http::Request, http::StatusCode, Router};
use axum::{body::to_bytes, http::HeaderMap};
use reqwest::Client;
use serde_json::Value;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::ServiceExt;

use super::migrations::run_migrations;
use super::{AppConfig, AppState};
use crate::services::credentials::{NewApplicant, NewEmployer, Role};
use crate::services::mailer::CapturingMailer;
use crate::services::oauth::{FakeIdentityProvider, OAuthProvider};
use crate::services::rate_limit::{RateLimitConfig, RateLimitService};
use crate::services::tokens::TokenSubject;

/// In-memory SQLite pool with the full schema.
/// A single connection keeps every query on the same in-memory database.
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("failed to open in-memory sqlite");

    run_migrations(&pool).await.expect("migrations failed");
    pool
}

/// State with fake OAuth providers, a capturing mailer and no rate limiting.
///
/// Google accepts the code `google-ok` and LinkedIn the code `linkedin-ok`,
/// both for `oauth.user@mail.io`. LinkedIn also resolves `linkedin-unverified`
/// to `victim@mail.io` without the provider having verified that email.
pub fn test_state(pool: SqlitePool) -> (AppState, Arc<CapturingMailer>) {
    test_state_with_limits(pool, RateLimitConfig::disabled())
}

pub fn test_state_with_limits(
    pool: SqlitePool,
    limits: RateLimitConfig,
) -> (AppState, Arc<CapturingMailer>) {
    let mailer = Arc::new(CapturingMailer::default());
    let google = FakeIdentityProvider::new(OAuthProvider::Google).with_profile(
        "google-ok",
        "google-sub-1",
        "oauth.user@mail.io",
    );
    let linkedin = FakeIdentityProvider::new(OAuthProvider::LinkedIn)
        .with_profile("linkedin-ok", "linkedin-sub-1", "oauth.user@mail.io")
        .with_unverified_profile("linkedin-unverified", "linkedin-sub-2", "victim@mail.io");

    let state = AppState::with_providers(
        pool,
        Client::new(),
        AppConfig::for_tests(),
        mailer.clone(),
        Arc::new(google),
        Arc::new(linkedin),
        Arc::new(RateLimitService::new(limits)),
    );
    (state, mailer)
}

/// Every router of the API with the same extensions `main` installs
pub fn test_app(state: AppState) -> Router {
    let rate_limit_service = state.rate_limit_service.clone();
    Router::new()
        .merge(crate::auth::auth_routes())
        .merge(crate::profile::profile_routes())
        .merge(crate::jobs::jobs_routes())
        .merge(crate::decals::decal_routes())
        .layer(Extension(rate_limit_service))
        .layer(Extension(Arc::new(RwLock::new(state))))
}

/// Drives one request through the router and decodes the JSON body
/// (`Value::Null` for an empty body).
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = app.clone().oneshot(request).await.expect("router failed");
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("body is not JSON")
    };
    (status, headers, body)
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("invalid request")
}

pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::empty()).expect("invalid request")
}

pub fn acme_employer(email: &str, phone: &str) -> NewEmployer {
    NewEmployer {
        company_name: "Acme".to_string(),
        full_name: "Jane Doe".to_string(),
        address: "1 Main St".to_string(),
        location: Some([151.2093, -33.8688]),
        email: email.to_string(),
        phone: phone.to_string(),
        password: "hunter22".to_string(),
    }
}

/// Creates a verified employer and returns its id and an access token
pub async fn seed_employer(state: &AppState, email: &str, phone: &str) -> (String, String) {
    let store = state.auth.credentials();
    let record = store
        .create_employer(&acme_employer(email, phone))
        .await
        .expect("failed to create employer");

    let mut conn = state.db.acquire().await.expect("no connection");
    store
        .set_verified(&mut conn, Role::Employer, email)
        .await
        .expect("failed to verify employer");
    drop(conn);

    let token = access_token(state, &record.id, email, Role::Employer);
    (record.id, token)
}

/// Creates a verified applicant with a password and returns its id and an access token
pub async fn seed_applicant(state: &AppState, email: &str) -> (String, String) {
    let record = state
        .auth
        .credentials()
        .create_applicant(&NewApplicant {
            email: email.to_string(),
            name: Some("Sam Seeker".to_string()),
            password: Some("secret1".to_string()),
            is_verified: true,
            ..Default::default()
        })
        .await
        .expect("failed to create applicant");

    let token = access_token(state, &record.id, email, Role::Applicant);
    (record.id, token)
}

pub fn access_token(state: &AppState, id: &str, email: &str, role: Role) -> String {
    state
        .auth
        .tokens()
        .issue_access_token(&TokenSubject {
            id: id.to_string(),
            email: email.to_string(),
            role,
        })
        .expect("failed to issue token")
}
