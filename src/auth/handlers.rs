//! Authentication handlers

use axum::{
    extract::{Extension, Path, Query},
    http::{header::SET_COOKIE, HeaderMap},
    response::{IntoResponse, Redirect},
    Json,
};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use super::cookies::{clear_refresh_cookie, read_refresh_cookie, refresh_cookie};
use super::extractors::AuthedUser;
use super::models::*;
use super::validators::*;
use crate::common::{safe_email_log, ApiError, AppState, JsonBody, Validator};
use crate::services::auth::{AuthError, OtpVerification, SignedIn};
use crate::services::credentials::NewEmployer;
use crate::services::oauth::{IdentityProvider, OAuthError};

/// Maps an orchestration failure to the HTTP error envelope, prefixed with
/// the action that failed ("Signup failed: ...").
pub fn auth_failure(action: &str, err: AuthError) -> ApiError {
    let message = format!("{}: {}", action, err);
    match err {
        AuthError::Validation(_) => ApiError::ValidationError(message),
        AuthError::DuplicateRole(_) | AuthError::AlreadyRegistered(_) => {
            ApiError::BadRequest(message)
        }
        AuthError::InvalidCredentials
        | AuthError::NotVerified
        | AuthError::InvalidOrExpiredCode
        | AuthError::InvalidOrExpiredOtp
        | AuthError::InvalidOrExpiredRefreshToken => ApiError::Unauthorized(message),
        AuthError::ContextNotAllowed(_) => ApiError::Forbidden(message),
        AuthError::NotFound(_) => ApiError::NotFound(message),
        AuthError::Provider(OAuthError::NotConfigured(_)) => {
            ApiError::ServiceUnavailable(message)
        }
        AuthError::Provider(
            OAuthError::OAuthFailed(_) | OAuthError::MissingEmail | OAuthError::UnverifiedEmail,
        ) => {
            ApiError::Unauthorized(message)
        }
        AuthError::Provider(_) | AuthError::Unexpected(_) => {
            error!(action = action, error = %message, "Unexpected auth failure");
            ApiError::InternalServer(message)
        }
        AuthError::Database(e) => ApiError::DatabaseError(e),
    }
}

/// Body + `Set-Cookie` for a successful signin or code exchange.
/// The account is keyed by role: `"employer"` or `"applicant"`.
fn signed_in_response(
    signed_in: SignedIn,
    cookie_secure: bool,
) -> Result<impl IntoResponse, ApiError> {
    let account = serde_json::to_value(&signed_in.account)
        .map_err(|e| ApiError::InternalServer(format!("Failed to serialize account: {}", e)))?;

    let mut body = Map::new();
    body.insert("success".to_string(), Value::Bool(true));
    body.insert(
        "accessToken".to_string(),
        Value::String(signed_in.tokens.access_token),
    );
    body.insert(signed_in.account.role().as_str().to_string(), account);

    Ok((
        [(SET_COOKIE, refresh_cookie(&signed_in.tokens.refresh_token, cookie_secure))],
        Json(Value::Object(body)),
    ))
}

fn message_response(message: String) -> Json<Value> {
    Json(json!({ "success": true, "message": message }))
}

// ============================================================================
// OAuth
// ============================================================================

fn consent_redirect(provider: &dyn IdentityProvider) -> Result<Redirect, ApiError> {
    let url = provider.authorization_url(None).map_err(|e| {
        warn!(provider = provider.provider().as_str(), error = %e, "Cannot start OAuth flow");
        ApiError::ServiceUnavailable(e.to_string())
    })?;
    info!(provider = provider.provider().as_str(), "Redirecting to OAuth consent screen");
    Ok(Redirect::to(&url))
}

/// GET /api/auth/google
/// Redirects the browser to Google's consent screen
pub async fn google_auth_start(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
) -> Result<Redirect, ApiError> {
    let state = state_lock.read().await.clone();
    consent_redirect(state.google.as_ref())
}

/// GET /api/auth/google/callback?code=...
/// Completes the Google login and redirects to
/// `{FRONTEND_URL}/auth-success?provider=google&code=<authCode>`
pub async fn google_auth_callback(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    Query(params): Query<OAuthCallbackQuery>,
) -> Result<Redirect, ApiError> {
    let state = state_lock.read().await.clone();

    if let Some(oauth_error) = params.error {
        warn!(oauth_error = %oauth_error, "Google OAuth returned error");
        return Err(ApiError::Unauthorized("Authentication failed".to_string()));
    }
    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Authentication failed".to_string()))?;

    let profile = state
        .google
        .fetch_profile(&code)
        .await
        .map_err(|e| auth_failure("Google authentication failed", e.into()))?;

    let auth_code = state
        .auth
        .oauth_login(&profile)
        .await
        .map_err(|e| auth_failure("Google authentication failed", e))?;

    Ok(Redirect::to(&format!(
        "{}/auth-success?provider=google&code={}",
        state.config.frontend_url, auth_code
    )))
}

/// GET /api/auth/linkedin
/// Redirects the browser to LinkedIn's consent screen
pub async fn linkedin_auth_start(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
) -> Result<Redirect, ApiError> {
    let state = state_lock.read().await.clone();
    consent_redirect(state.linkedin.as_ref())
}

/// POST /api/auth/linkedin/callback
/// Exchanges the LinkedIn authorization code the frontend received
///
/// # Request Body
/// ```json
/// { "code": "<linkedin authorization code>" }
/// ```
///
/// # Response
/// ```json
/// { "success": true, "authCode": "<one-time code for /api/auth/token>" }
/// ```
pub async fn linkedin_auth_callback(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    JsonBody(payload): JsonBody<CodeRequest>,
) -> Result<Json<Value>, ApiError> {
    CodeValidator.validate(&payload).into_api_result()?;
    let state = state_lock.read().await.clone();

    let profile = state
        .linkedin
        .fetch_profile(payload.code.trim())
        .await
        .map_err(|e| auth_failure("Failed to handle LinkedIn authentication", e.into()))?;

    let auth_code = state
        .auth
        .oauth_login(&profile)
        .await
        .map_err(|e| auth_failure("Failed to handle LinkedIn authentication", e))?;

    Ok(Json(json!({ "success": true, "authCode": auth_code })))
}

/// POST /api/auth/token
/// Exchanges a one-time auth code for tokens
///
/// # Request Body
/// ```json
/// { "code": "<authCode>" }
/// ```
///
/// # Response
/// `Set-Cookie: refreshToken=...`
/// ```json
/// { "success": true, "accessToken": "<jwt>", "applicant": { ... } }
/// ```
pub async fn exchange_auth_code(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    JsonBody(payload): JsonBody<CodeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    CodeValidator.validate(&payload).into_api_result()?;
    let state = state_lock.read().await.clone();

    let signed_in = state
        .auth
        .exchange_auth_code(payload.code.trim())
        .await
        .map_err(|e| auth_failure("Failed to exchange auth code", e))?;

    signed_in_response(signed_in, state.config.cookie_secure)
}

// ============================================================================
// Signup
// ============================================================================

/// POST /api/auth/employer/signup
///
/// # Request Body
/// ```json
/// {
///   "company_name": "Acme",
///   "full_name": "Jane Doe",
///   "address": "1 Main St",
///   "location": [151.2093, -33.8688],
///   "email": "jane@acme.io",
///   "phone": "+61400000000",
///   "password": "hunter22"
/// }
/// ```
///
/// # Response
/// ```json
/// { "success": true, "message": "OTP resent for signup successfully" }
/// ```
pub async fn employer_signup(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    JsonBody(payload): JsonBody<EmployerSignupRequest>,
) -> Result<Json<Value>, ApiError> {
    EmployerSignupValidator.validate(&payload).into_api_result()?;
    let state = state_lock.read().await.clone();

    info!(email = %safe_email_log(&payload.email), "Employer signup requested");

    let message = state
        .auth
        .employer_signup(NewEmployer {
            company_name: payload.company_name,
            full_name: payload.full_name,
            address: payload.address,
            location: payload.location,
            email: payload.email,
            phone: payload.phone,
            password: payload.password,
        })
        .await
        .map_err(|e| auth_failure("Signup failed", e))?;

    Ok(message_response(message))
}

/// POST /api/auth/applicant/signup
///
/// # Request Body
/// ```json
/// { "email": "sam@mail.io", "password": "secret1", "name": "Sam" }
/// ```
pub async fn applicant_signup(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    JsonBody(payload): JsonBody<ApplicantSignupRequest>,
) -> Result<Json<Value>, ApiError> {
    ApplicantSignupValidator.validate(&payload).into_api_result()?;
    let state = state_lock.read().await.clone();

    info!(email = %safe_email_log(&payload.email), "Applicant signup requested");

    let message = state
        .auth
        .applicant_signup(&payload.email, &payload.password, payload.name)
        .await
        .map_err(|e| auth_failure("Signup failed", e))?;

    Ok(message_response(message))
}

/// POST /api/auth/applicant/link-password
/// Adds a password to an account created through Google or LinkedIn
pub async fn link_password(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    JsonBody(payload): JsonBody<ApplicantSignupRequest>,
) -> Result<Json<Value>, ApiError> {
    ApplicantSignupValidator.validate(&payload).into_api_result()?;
    let state = state_lock.read().await.clone();

    let message = state
        .auth
        .link_password(&payload.email, &payload.password)
        .await
        .map_err(|e| auth_failure("Signup failed", e))?;

    Ok(message_response(message))
}

// ============================================================================
// OTP
// ============================================================================

/// POST /api/auth/send-otp
///
/// # Request Body
/// ```json
/// { "email": "jane@acme.io", "context": "signup | forgot-password", "userType": "employer | applicant" }
/// ```
pub async fn send_otp(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    JsonBody(payload): JsonBody<SendOtpRequest>,
) -> Result<Json<Value>, ApiError> {
    OtpValidator.validate(&payload).into_api_result()?;
    let state = state_lock.read().await.clone();

    let message = state
        .auth
        .send_otp(&payload.email, payload.context, payload.user_type)
        .await
        .map_err(|e| auth_failure("Failed to send OTP", e))?;

    Ok(message_response(message))
}

/// POST /api/auth/verify-otp
///
/// # Request Body
/// ```json
/// {
///   "email": "jane@acme.io",
///   "otpCode": "042117",
///   "context": "signup",
///   "userType": "employer",
///   "newPassword": "required for forgot-password"
/// }
/// ```
///
/// # Response
/// ```json
/// { "success": true, "message": "OTP Verified successfully" }
/// ```
pub async fn verify_otp(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    JsonBody(payload): JsonBody<VerifyOtpRequest>,
) -> Result<Json<Value>, ApiError> {
    OtpValidator.validate(&payload).into_api_result()?;
    let state = state_lock.read().await.clone();

    let message = state
        .auth
        .verify_otp(&OtpVerification {
            email: payload.email,
            otp_code: payload.otp_code.trim().to_string(),
            context: payload.context,
            role: payload.user_type,
            new_password: payload.new_password,
        })
        .await
        .map_err(|e| auth_failure("OTP verification failed", e))?;

    Ok(message_response(message))
}

// ============================================================================
// Signin
// ============================================================================

/// POST /api/auth/employer/signin
///
/// # Request Body
/// ```json
/// { "email": "jane@acme.io", "phone": null, "password": "hunter22" }
/// ```
///
/// # Response
/// `Set-Cookie: refreshToken=...`
/// ```json
/// { "success": true, "accessToken": "<jwt>", "employer": { ... } }
/// ```
pub async fn employer_signin(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    JsonBody(payload): JsonBody<EmployerSigninRequest>,
) -> Result<impl IntoResponse, ApiError> {
    SigninValidator.validate(&payload).into_api_result()?;
    let state = state_lock.read().await.clone();

    let email = payload.email.as_deref().map(str::trim).filter(|e| !e.is_empty());
    let phone = payload.phone.as_deref().map(str::trim).filter(|p| !p.is_empty());

    let signed_in = state
        .auth
        .employer_signin(email, phone, &payload.password)
        .await
        .map_err(|e| auth_failure("Signin failed", e))?;

    signed_in_response(signed_in, state.config.cookie_secure)
}

/// POST /api/auth/applicant/signin
///
/// # Request Body
/// ```json
/// { "email": "sam@mail.io", "password": "secret1" }
/// ```
pub async fn applicant_signin(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    JsonBody(payload): JsonBody<ApplicantSigninRequest>,
) -> Result<impl IntoResponse, ApiError> {
    SigninValidator.validate(&payload).into_api_result()?;
    let state = state_lock.read().await.clone();

    let signed_in = state
        .auth
        .applicant_signin(&payload.email, &payload.password)
        .await
        .map_err(|e| auth_failure("Signin failed", e))?;

    signed_in_response(signed_in, state.config.cookie_secure)
}

// ============================================================================
// Session
// ============================================================================

/// POST /api/auth/refresh-token
/// Issues a new access token from the `refreshToken` cookie
pub async fn refresh_token(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let state = state_lock.read().await.clone();

    let cookie = read_refresh_cookie(&headers);
    let access_token = state
        .auth
        .refresh(cookie.as_deref())
        .map_err(|e| auth_failure("Failed to refresh token", e))?;

    Ok(Json(json!({ "success": true, "accessToken": access_token })))
}

/// POST /api/auth/logout
/// Clears the refresh cookie. Access tokens stay valid until they expire.
pub async fn logout(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
) -> impl IntoResponse {
    let state = state_lock.read().await.clone();
    (
        [(SET_COOKIE, clear_refresh_cookie(state.config.cookie_secure))],
        message_response("Logged out successfully".to_string()),
    )
}

// ============================================================================
// Accounts
// ============================================================================

/// GET /api/auth/me
/// Returns the authenticated account
///
/// # Response
/// ```json
/// { "success": true, "userType": "employer", "user": { ... } }
/// ```
pub async fn me_handler(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<Value>, ApiError> {
    let state = state_lock.read().await.clone();

    let account = state
        .auth
        .account_details(&authed.id, authed.role)
        .await
        .map_err(|e| auth_failure("Failed to fetch user details", e))?;

    Ok(Json(json!({
        "success": true,
        "userType": authed.role,
        "user": account,
    })))
}

/// GET /api/auth/employer/{id}
/// Public employer profile
pub async fn get_employer(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    _authed: AuthedUser,
    Path(employer_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let state = state_lock.read().await.clone();

    let employer = state
        .auth
        .employer_public(&employer_id)
        .await
        .map_err(|e| auth_failure("Failed to fetch employer details", e))?;

    Ok(Json(json!({ "success": true, "employer": employer })))
}

/// GET /api/auth/
/// Every employer and applicant account, without credentials
///
/// # Response
/// ```json
/// { "success": true, "employers": [ ... ], "applicants": [ ... ] }
/// ```
pub async fn list_users(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<Value>, ApiError> {
    let state = state_lock.read().await.clone();

    let (employers, applicants) = state
        .auth
        .all_accounts()
        .await
        .map_err(|e| auth_failure("Failed to fetch applicants", e))?;

    debug!(
        user_id = %authed.id,
        employers = employers.len(),
        applicants = applicants.len(),
        "Listed accounts"
    );

    Ok(Json(json!({
        "success": true,
        "employers": employers,
        "applicants": applicants,
    })))
}
