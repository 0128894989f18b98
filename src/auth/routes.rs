//! Authentication routes

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use super::handlers;
use crate::rate_limit_middleware::rate_limit_middleware;

/// Creates and returns the authentication router
///
/// # Routes
/// - `GET /api/auth/google` - Redirect to Google consent
/// - `GET /api/auth/google/callback` - Google login, redirects to the frontend with an auth code
/// - `GET /api/auth/linkedin` - Redirect to LinkedIn consent
/// - `POST /api/auth/linkedin/callback` - LinkedIn login, returns an auth code
/// - `POST /api/auth/token` - Exchange an auth code for tokens
/// - `POST /api/auth/refresh-token` - New access token from the refresh cookie
/// - `POST /api/auth/logout` - Clear the refresh cookie
/// - `GET /api/auth/me` - Current account
/// - `GET /api/auth/employer/:id` - Employer public profile
/// - `GET /api/auth/` - All accounts
///
/// Rate limited per client IP:
/// - `POST /api/auth/employer/signup`, `POST /api/auth/applicant/signup`
/// - `POST /api/auth/applicant/link-password`
/// - `POST /api/auth/employer/signin`, `POST /api/auth/applicant/signin`
/// - `POST /api/auth/send-otp`, `POST /api/auth/verify-otp`
pub fn auth_routes() -> Router {
    let credential_routes = Router::new()
        .route("/api/auth/employer/signup", post(handlers::employer_signup))
        .route("/api/auth/applicant/signup", post(handlers::applicant_signup))
        .route("/api/auth/applicant/link-password", post(handlers::link_password))
        .route("/api/auth/employer/signin", post(handlers::employer_signin))
        .route("/api/auth/applicant/signin", post(handlers::applicant_signin))
        .route("/api/auth/send-otp", post(handlers::send_otp))
        .route("/api/auth/verify-otp", post(handlers::verify_otp))
        .route_layer(middleware::from_fn(rate_limit_middleware));

    Router::new()
        .route("/api/auth/google", get(handlers::google_auth_start))
        .route("/api/auth/google/callback", get(handlers::google_auth_callback))
        .route("/api/auth/linkedin", get(handlers::linkedin_auth_start))
        .route("/api/auth/linkedin/callback", post(handlers::linkedin_auth_callback))
        .route("/api/auth/token", post(handlers::exchange_auth_code))
        .route("/api/auth/refresh-token", post(handlers::refresh_token))
        .route("/api/auth/logout", post(handlers::logout))
        .route("/api/auth/me", get(handlers::me_handler))
        .route("/api/auth/employer/:id", get(handlers::get_employer))
        .route("/api/auth/", get(handlers::list_users))
        .merge(credential_routes)
}
